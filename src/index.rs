// 🔍 Transaction Index - Point lookups and time-window duplicate search
// Built once per batch, read-only afterwards; safe to share across readers

use crate::records::Transaction;
use chrono::{NaiveDate, NaiveDateTime};
use std::collections::{HashMap, HashSet};

/// Amount tolerance for floating-point equality
const AMOUNT_EPSILON: f64 = 0.001;

// ============================================================================
// TIMESTAMP PARSING
// ============================================================================

/// Parse a transaction timestamp.
/// Supports "YYYY-MM-DD HH:MM:SS", ISO-8601 "T" form, and date-only.
/// Malformed input is None, never an error for the batch.
pub fn parse_timestamp(raw: &str) -> Option<NaiveDateTime> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    if let Ok(ts) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S") {
        return Some(ts);
    }

    if let Ok(ts) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S") {
        return Some(ts);
    }

    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return date.and_hms_opt(0, 0, 0);
    }

    None
}

// ============================================================================
// TRANSACTION INDEX
// ============================================================================

pub struct TransactionIndex {
    /// Input order preserved; window searches scan this
    transactions: Vec<Transaction>,

    /// txn_id -> position; first occurrence wins
    by_id: HashMap<String, usize>,

    /// Exact re-imported rows skipped during the build
    skipped_rows: usize,
}

impl TransactionIndex {
    /// Build the index, skipping rows whose fingerprint was already seen
    pub fn build(rows: Vec<Transaction>) -> Self {
        let mut transactions: Vec<Transaction> = Vec::with_capacity(rows.len());
        let mut by_id = HashMap::new();
        let mut seen = HashSet::new();
        let mut skipped_rows = 0;

        for txn in rows {
            if !seen.insert(txn.fingerprint()) {
                skipped_rows += 1;
                continue;
            }

            let position = transactions.len();
            if !txn.txn_id.is_empty() {
                by_id.entry(txn.txn_id.clone()).or_insert(position);
            }
            transactions.push(txn);
        }

        TransactionIndex {
            transactions,
            by_id,
            skipped_rows,
        }
    }

    pub fn len(&self) -> usize {
        self.transactions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.transactions.is_empty()
    }

    pub fn skipped_rows(&self) -> usize {
        self.skipped_rows
    }

    pub fn transactions(&self) -> &[Transaction] {
        &self.transactions
    }

    /// Exact lookup by transaction id.
    /// Empty, missing, or unknown ids are an expected outcome, not an error.
    pub fn lookup(&self, txn_id: &str) -> Option<&Transaction> {
        let txn_id = txn_id.trim();
        if txn_id.is_empty() {
            return None;
        }
        self.by_id.get(txn_id).map(|&i| &self.transactions[i])
    }

    /// All *other* transactions with the same merchant and amount whose
    /// timestamp lies within `window_seconds` of `txn` (inclusive).
    /// Missing merchant, zero amount, or unparseable timestamp yield empty.
    pub fn near_duplicates(&self, txn: &Transaction, window_seconds: i64) -> Vec<&Transaction> {
        if txn.merchant.is_empty() || txn.amount == 0.0 {
            return Vec::new();
        }
        self.window_matches(txn, window_seconds, |other| other.merchant == txn.merchant)
    }

    /// Same contract as `near_duplicates`, keyed on payer instead of merchant.
    /// Backs the resolution engine's duplicate confirmation.
    pub fn payer_duplicates(&self, txn: &Transaction, window_seconds: i64) -> Vec<&Transaction> {
        if txn.customer_id.is_empty() || txn.amount == 0.0 {
            return Vec::new();
        }
        self.window_matches(txn, window_seconds, |other| {
            other.customer_id == txn.customer_id
        })
    }

    fn window_matches<F>(
        &self,
        txn: &Transaction,
        window_seconds: i64,
        same_party: F,
    ) -> Vec<&Transaction>
    where
        F: Fn(&Transaction) -> bool,
    {
        let anchor = match parse_timestamp(&txn.timestamp) {
            Some(ts) => ts,
            None => return Vec::new(),
        };

        let mut matches = Vec::new();
        for other in &self.transactions {
            if other.txn_id == txn.txn_id {
                continue;
            }
            if !same_party(other) {
                continue;
            }
            if (other.amount - txn.amount).abs() > AMOUNT_EPSILON {
                continue;
            }

            // Malformed timestamps are non-matching
            let other_ts = match parse_timestamp(&other.timestamp) {
                Some(ts) => ts,
                None => continue,
            };

            if (anchor - other_ts).num_seconds().abs() <= window_seconds {
                matches.push(other);
            }
        }

        matches
    }
}

// ============================================================================
// TESTS
// ============================================================================
