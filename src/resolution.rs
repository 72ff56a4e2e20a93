// ⚖️ Resolution Engine - Decision table from category to suggested action
// Pure function of (category, transaction status, amount); no state persists
// across calls

use crate::index::TransactionIndex;
use crate::records::{Category, ClassifiedDispute, Resolution, SuggestedAction};

/// Window for confirming a duplicate against the payer's history (seconds).
/// Deliberately tighter than the classifier's corroboration window.
pub const CONFIRMATION_WINDOW_SECS: i64 = 30;

/// Fraud amount above which the dispute is escalated to the bank
pub const ESCALATION_THRESHOLD: f64 = 5000.0;

/// Fraud amount above which the dispute is flagged as potential fraud
pub const POTENTIAL_FRAUD_THRESHOLD: f64 = 1000.0;

// ============================================================================
// RESOLUTION ENGINE
// ============================================================================

pub struct ResolutionEngine {
    /// Seconds for the payer-keyed duplicate confirmation
    pub confirmation_window_secs: i64,

    /// Amount threshold for bank escalation
    pub escalation_threshold: f64,

    /// Amount threshold for the potential-fraud flag
    pub potential_fraud_threshold: f64,
}

impl ResolutionEngine {
    pub fn new() -> Self {
        ResolutionEngine {
            confirmation_window_secs: CONFIRMATION_WINDOW_SECS,
            escalation_threshold: ESCALATION_THRESHOLD,
            potential_fraud_threshold: POTENTIAL_FRAUD_THRESHOLD,
        }
    }

    /// Suggest an action for one classified dispute.
    /// Every branch assigns both an action and a non-empty justification.
    pub fn resolve(&self, dispute: &ClassifiedDispute, index: &TransactionIndex) -> Resolution {
        let (suggested_action, justification) = match dispute.predicted_category {
            Category::DuplicateCharge => self.resolve_duplicate(dispute, index),
            Category::FailedTransaction => self.resolve_failed(dispute, index),
            Category::Fraud => self.resolve_fraud(dispute),
            Category::RefundPending => self.resolve_refund(dispute, index),
            Category::Others => (
                SuggestedAction::AskForMoreInfo,
                "Dispute unclear, requires customer clarification.".to_string(),
            ),
        };

        Resolution {
            dispute_id: dispute.dispute_id.clone(),
            suggested_action,
            justification,
        }
    }

    /// Auto-refund only when the payer shows another transaction with the
    /// same amount inside the confirmation window
    fn resolve_duplicate(
        &self,
        dispute: &ClassifiedDispute,
        index: &TransactionIndex,
    ) -> (SuggestedAction, String) {
        let confirmed = index
            .lookup(&dispute.txn_id)
            .map(|txn| !index.payer_duplicates(txn, self.confirmation_window_secs).is_empty())
            .unwrap_or(false);

        if confirmed {
            (
                SuggestedAction::AutoRefund,
                "Duplicate transaction confirmed in system.".to_string(),
            )
        } else {
            (
                SuggestedAction::ManualReview,
                "Potential duplicate but not confirmed in system.".to_string(),
            )
        }
    }

    fn resolve_failed(
        &self,
        dispute: &ClassifiedDispute,
        index: &TransactionIndex,
    ) -> (SuggestedAction, String) {
        match index.lookup(&dispute.txn_id) {
            Some(txn) => {
                let status = txn.status_upper();
                if status == "FAILED" || status == "CANCELLED" {
                    (
                        SuggestedAction::AutoRefund,
                        format!(
                            "Transaction {} in records; refund applicable.",
                            status.to_lowercase()
                        ),
                    )
                } else if status == "PENDING" {
                    (
                        SuggestedAction::ManualReview,
                        "Transaction pending; needs manual verification.".to_string(),
                    )
                } else {
                    (
                        SuggestedAction::AskForMoreInfo,
                        "Transaction successful in records; needs clarification.".to_string(),
                    )
                }
            }
            None => (
                SuggestedAction::AskForMoreInfo,
                "Transaction not found in system.".to_string(),
            ),
        }
    }

    fn resolve_fraud(&self, dispute: &ClassifiedDispute) -> (SuggestedAction, String) {
        if dispute.amount > self.escalation_threshold {
            (
                SuggestedAction::EscalateToBank,
                "High-value fraud dispute requires bank escalation.".to_string(),
            )
        } else if dispute.amount > self.potential_fraud_threshold {
            (
                SuggestedAction::MarkPotentialFraud,
                "Medium-value suspicious activity detected.".to_string(),
            )
        } else {
            (
                SuggestedAction::ManualReview,
                "Low-value fraud claim needs verification.".to_string(),
            )
        }
    }

    fn resolve_refund(
        &self,
        dispute: &ClassifiedDispute,
        index: &TransactionIndex,
    ) -> (SuggestedAction, String) {
        match index.lookup(&dispute.txn_id) {
            Some(txn) => {
                let status = txn.status_upper();
                if status == "CANCELLED" || status == "FAILED" {
                    (
                        SuggestedAction::AutoRefund,
                        "Transaction cancelled/failed; refund overdue.".to_string(),
                    )
                } else {
                    (
                        SuggestedAction::ManualReview,
                        "Refund process needs manual verification.".to_string(),
                    )
                }
            }
            None => (
                SuggestedAction::ManualReview,
                "Transaction not found; manual investigation needed.".to_string(),
            ),
        }
    }
}

impl Default for ResolutionEngine {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// TESTS
// ============================================================================
