// 💾 Record Model - Disputes, transactions, and batch outputs
// Core fields are immutable once loaded; classification attaches new fields
// instead of mutating existing ones

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;
use std::fs;
use std::path::Path;

// ============================================================================
// CATEGORY
// ============================================================================

/// Classification outcome for a dispute. Always exactly one of five values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Category {
    DuplicateCharge,
    FailedTransaction,
    Fraud,
    RefundPending,
    Others,
}

impl Category {
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::DuplicateCharge => "DUPLICATE_CHARGE",
            Category::FailedTransaction => "FAILED_TRANSACTION",
            Category::Fraud => "FRAUD",
            Category::RefundPending => "REFUND_PENDING",
            Category::Others => "OTHERS",
        }
    }

    /// Parse a wire name; unknown values collapse to OTHERS so re-read
    /// output files never abort the batch
    pub fn from_wire(raw: &str) -> Category {
        match raw.trim().to_uppercase().as_str() {
            "DUPLICATE_CHARGE" => Category::DuplicateCharge,
            "FAILED_TRANSACTION" => Category::FailedTransaction,
            "FRAUD" => Category::Fraud,
            "REFUND_PENDING" => Category::RefundPending,
            _ => Category::Others,
        }
    }
}

impl<'de> Deserialize<'de> for Category {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Ok(Category::from_wire(&raw))
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// SUGGESTED ACTION
// ============================================================================

/// Recommended next operational step for a classified dispute
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SuggestedAction {
    #[serde(rename = "Auto-refund")]
    AutoRefund,
    #[serde(rename = "Manual review")]
    ManualReview,
    #[serde(rename = "Escalate to bank")]
    EscalateToBank,
    #[serde(rename = "Mark as potential fraud")]
    MarkPotentialFraud,
    #[serde(rename = "Ask for more info")]
    AskForMoreInfo,
}

impl SuggestedAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            SuggestedAction::AutoRefund => "Auto-refund",
            SuggestedAction::ManualReview => "Manual review",
            SuggestedAction::EscalateToBank => "Escalate to bank",
            SuggestedAction::MarkPotentialFraud => "Mark as potential fraud",
            SuggestedAction::AskForMoreInfo => "Ask for more info",
        }
    }
}

impl fmt::Display for SuggestedAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// INPUT RECORDS
// ============================================================================

/// Customer-raised claim about a financial transaction
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Dispute {
    pub dispute_id: String,

    #[serde(default)]
    pub description: String,

    /// Referenced transaction; may be empty or not present in the index
    #[serde(default)]
    pub txn_id: String,

    /// Disputed amount; 0 when missing or non-numeric
    #[serde(default, with = "lenient_amount")]
    pub amount: f64,

    /// Carried through for downstream date-filtered reporting
    #[serde(default)]
    pub created_at: String,
}

/// Read-only reference record of a payment or transfer
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Transaction {
    pub txn_id: String,

    #[serde(default, with = "lenient_amount")]
    pub amount: f64,

    #[serde(default)]
    pub merchant: String,

    /// Payer identifier; backs the payer-keyed duplicate confirmation
    #[serde(default)]
    pub customer_id: String,

    /// ISO-parseable timestamp string, parsed lazily by the index
    #[serde(default)]
    pub timestamp: String,

    /// Open string enumeration: COMPLETED, FAILED, CANCELLED, PENDING, ...
    #[serde(default)]
    pub status: String,

    /// Mobile, Web, POS, QR, ...
    #[serde(default)]
    pub channel: String,
}

impl Transaction {
    /// SHA-256 fingerprint over the identifying fields.
    /// Used at index build to skip exact re-imported rows, NOT as identity.
    pub fn fingerprint(&self) -> String {
        let mut hasher = Sha256::new();
        hasher.update(format!(
            "{}|{}|{}|{}|{}",
            self.txn_id, self.amount, self.merchant, self.customer_id, self.timestamp
        ));
        format!("{:x}", hasher.finalize())
    }

    /// Status normalized for comparison (open enumeration, case-insensitive)
    pub fn status_upper(&self) -> String {
        self.status.trim().to_uppercase()
    }
}

// ============================================================================
// OUTPUT RECORDS
// ============================================================================

/// A dispute extended with its classification and transaction context
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ClassifiedDispute {
    pub dispute_id: String,

    #[serde(default)]
    pub txn_id: String,

    #[serde(default, with = "lenient_amount")]
    pub amount: f64,

    /// Copied from the matched transaction; empty when unresolved
    #[serde(default)]
    pub merchant: String,

    #[serde(default)]
    pub channel: String,

    pub predicted_category: Category,

    pub confidence: f64,

    #[serde(default)]
    pub explanation: String,
}

/// Suggested action for one classified dispute
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Resolution {
    pub dispute_id: String,
    pub suggested_action: SuggestedAction,
    pub justification: String,
}

// ============================================================================
// LENIENT AMOUNT PARSING
// Malformed amounts degrade to 0 instead of aborting the batch
// ============================================================================

mod lenient_amount {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(amount: &f64, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_f64(*amount)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
        let raw = Option::<String>::deserialize(deserializer)?;
        Ok(raw
            .and_then(|s| s.trim().parse::<f64>().ok())
            .unwrap_or(0.0))
    }
}

// ============================================================================
// CSV IMPORT / EXPORT
// ============================================================================

pub fn load_disputes(path: &Path) -> Result<Vec<Dispute>> {
    let mut rdr = csv::Reader::from_path(path)
        .with_context(|| format!("Failed to open disputes file: {}", path.display()))?;

    let mut disputes = Vec::new();
    for result in rdr.deserialize() {
        let dispute: Dispute = result.context("Failed to deserialize dispute row")?;
        disputes.push(dispute);
    }

    Ok(disputes)
}

pub fn load_transactions(path: &Path) -> Result<Vec<Transaction>> {
    let mut rdr = csv::Reader::from_path(path)
        .with_context(|| format!("Failed to open transactions file: {}", path.display()))?;

    let mut transactions = Vec::new();
    for result in rdr.deserialize() {
        let transaction: Transaction = result.context("Failed to deserialize transaction row")?;
        transactions.push(transaction);
    }

    Ok(transactions)
}

/// Read back a previously written classified disputes file (two-step flow)
pub fn load_classified_disputes(path: &Path) -> Result<Vec<ClassifiedDispute>> {
    let mut rdr = csv::Reader::from_path(path)
        .with_context(|| format!("Failed to open classified disputes file: {}", path.display()))?;

    let mut classified = Vec::new();
    for result in rdr.deserialize() {
        let record: ClassifiedDispute =
            result.context("Failed to deserialize classified dispute row")?;
        classified.push(record);
    }

    Ok(classified)
}

/// Write any record batch to CSV, creating parent directories as needed
pub fn write_csv<T: Serialize>(path: &Path, records: &[T]) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create output directory: {}", parent.display()))?;
        }
    }

    let mut wtr = csv::Writer::from_path(path)
        .with_context(|| format!("Failed to create output file: {}", path.display()))?;

    for record in records {
        wtr.serialize(record).context("Failed to serialize record")?;
    }

    wtr.flush().context("Failed to flush output file")?;
    Ok(())
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lenient_amount_non_numeric() {
        let data = "dispute_id,description,txn_id,amount\nD1,charged twice,T1,abc\n";
        let mut rdr = csv::Reader::from_reader(data.as_bytes());
        let dispute: Dispute = rdr.deserialize().next().unwrap().unwrap();

        assert_eq!(dispute.amount, 0.0);
        assert_eq!(dispute.dispute_id, "D1");
    }

    #[test]
    fn test_lenient_amount_missing_column() {
        let data = "dispute_id,description,txn_id\nD1,payment failed,T1\n";
        let mut rdr = csv::Reader::from_reader(data.as_bytes());
        let dispute: Dispute = rdr.deserialize().next().unwrap().unwrap();

        assert_eq!(dispute.amount, 0.0);
    }

    #[test]
    fn test_lenient_amount_valid() {
        let data = "txn_id,amount,merchant,timestamp\nT1,1500.50,Zomato,2024-01-15 10:30:00\n";
        let mut rdr = csv::Reader::from_reader(data.as_bytes());
        let txn: Transaction = rdr.deserialize().next().unwrap().unwrap();

        assert_eq!(txn.amount, 1500.50);
        assert_eq!(txn.merchant, "Zomato");
        assert_eq!(txn.status, "");
    }

    #[test]
    fn test_category_serializes_to_wire_name() {
        assert_eq!(Category::DuplicateCharge.to_string(), "DUPLICATE_CHARGE");
        assert_eq!(Category::Others.to_string(), "OTHERS");

        let json = serde_json::to_string(&Category::RefundPending).unwrap();
        assert_eq!(json, "\"REFUND_PENDING\"");
    }

    #[test]
    fn test_unknown_category_falls_back_to_others() {
        let parsed: Category = serde_json::from_str("\"SOMETHING_NEW\"").unwrap();
        assert_eq!(parsed, Category::Others);
    }

    #[test]
    fn test_action_wire_names() {
        let json = serde_json::to_string(&SuggestedAction::AutoRefund).unwrap();
        assert_eq!(json, "\"Auto-refund\"");
        assert_eq!(SuggestedAction::MarkPotentialFraud.to_string(), "Mark as potential fraud");
    }

    #[test]
    fn test_fingerprint_detects_identical_rows() {
        let txn = Transaction {
            txn_id: "T1".to_string(),
            amount: 500.0,
            merchant: "Swiggy".to_string(),
            customer_id: "C1".to_string(),
            timestamp: "2024-01-15 10:30:00".to_string(),
            status: "COMPLETED".to_string(),
            channel: "Mobile".to_string(),
        };
        let same = txn.clone();
        let mut other = txn.clone();
        other.amount = 501.0;

        assert_eq!(txn.fingerprint(), same.fingerprint());
        assert_ne!(txn.fingerprint(), other.fingerprint());
    }

    #[test]
    fn test_status_upper_normalizes() {
        let mut txn = Transaction {
            txn_id: "T1".to_string(),
            amount: 100.0,
            merchant: "".to_string(),
            customer_id: "".to_string(),
            timestamp: "".to_string(),
            status: " failed ".to_string(),
            channel: "".to_string(),
        };
        assert_eq!(txn.status_upper(), "FAILED");

        txn.status = "Cancelled".to_string();
        assert_eq!(txn.status_upper(), "CANCELLED");
    }
}
