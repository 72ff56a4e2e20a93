// 🚀 Batch Pipeline - classify every dispute, then suggest resolutions
// One output record per input dispute, input order preserved

use crate::index::TransactionIndex;
use crate::records::{ClassifiedDispute, Dispute, Resolution};
use crate::resolution::ResolutionEngine;
use crate::rules::DisputeClassifier;
use std::collections::BTreeMap;

// ============================================================================
// CLASSIFICATION DRIVER
// ============================================================================

/// Classify all disputes in input order.
/// Merchant and channel are merged in from the matched transaction; both are
/// empty strings when the reference does not resolve.
pub fn classify_disputes(
    disputes: &[Dispute],
    index: Option<&TransactionIndex>,
    classifier: &DisputeClassifier,
) -> Vec<ClassifiedDispute> {
    disputes
        .iter()
        .map(|dispute| {
            let outcome = classifier.classify(dispute, index);

            let (merchant, channel) = index
                .and_then(|ix| ix.lookup(&dispute.txn_id))
                .map(|txn| (txn.merchant.clone(), txn.channel.clone()))
                .unwrap_or_default();

            ClassifiedDispute {
                dispute_id: dispute.dispute_id.clone(),
                txn_id: dispute.txn_id.clone(),
                amount: dispute.amount,
                merchant,
                channel,
                predicted_category: outcome.category,
                confidence: outcome.confidence,
                explanation: outcome.explanation,
            }
        })
        .collect()
}

// ============================================================================
// RESOLUTION DRIVER
// ============================================================================

/// Exactly one resolution per classified dispute, order preserved
pub fn generate_resolutions(
    classified: &[ClassifiedDispute],
    index: &TransactionIndex,
    engine: &ResolutionEngine,
) -> Vec<Resolution> {
    classified
        .iter()
        .map(|dispute| engine.resolve(dispute, index))
        .collect()
}

// ============================================================================
// FULL PIPELINE
// ============================================================================

pub struct PipelineOutput {
    pub classified: Vec<ClassifiedDispute>,
    pub resolutions: Vec<Resolution>,
}

/// Run classification and resolution as one in-memory pass
pub fn run_pipeline(
    disputes: &[Dispute],
    index: &TransactionIndex,
    classifier: &DisputeClassifier,
    engine: &ResolutionEngine,
) -> PipelineOutput {
    let classified = classify_disputes(disputes, Some(index), classifier);
    let resolutions = generate_resolutions(&classified, index, engine);

    PipelineOutput {
        classified,
        resolutions,
    }
}

// ============================================================================
// BATCH SUMMARY
// ============================================================================

/// Counts per category and per action for end-of-run reporting
pub struct BatchSummary {
    pub total_disputes: usize,
    pub category_counts: BTreeMap<String, usize>,
    pub action_counts: BTreeMap<String, usize>,
}

pub fn summarize(classified: &[ClassifiedDispute], resolutions: &[Resolution]) -> BatchSummary {
    let mut category_counts: BTreeMap<String, usize> = BTreeMap::new();
    for dispute in classified {
        *category_counts
            .entry(dispute.predicted_category.to_string())
            .or_insert(0) += 1;
    }

    let mut action_counts: BTreeMap<String, usize> = BTreeMap::new();
    for resolution in resolutions {
        *action_counts
            .entry(resolution.suggested_action.to_string())
            .or_insert(0) += 1;
    }

    BatchSummary {
        total_disputes: classified.len(),
        category_counts,
        action_counts,
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::records::{Category, SuggestedAction, Transaction};

    fn create_test_dispute(id: &str, description: &str, txn_id: &str, amount: f64) -> Dispute {
        Dispute {
            dispute_id: id.to_string(),
            description: description.to_string(),
            txn_id: txn_id.to_string(),
            amount,
            created_at: "2024-01-15 12:00:00".to_string(),
        }
    }

    fn create_test_transaction(
        txn_id: &str,
        amount: f64,
        merchant: &str,
        customer_id: &str,
        timestamp: &str,
        status: &str,
        channel: &str,
    ) -> Transaction {
        Transaction {
            txn_id: txn_id.to_string(),
            amount,
            merchant: merchant.to_string(),
            customer_id: customer_id.to_string(),
            timestamp: timestamp.to_string(),
            status: status.to_string(),
            channel: channel.to_string(),
        }
    }

    #[test]
    fn test_one_output_per_input_in_order() {
        let classifier = DisputeClassifier::new();
        let engine = ResolutionEngine::new();
        let index = TransactionIndex::build(Vec::new());

        let disputes = vec![
            create_test_dispute("D1", "payment failed", "T1", 100.0),
            create_test_dispute("D2", "", "", 0.0),
            create_test_dispute("D3", "this is fraud", "T9", 7000.0),
        ];

        let output = run_pipeline(&disputes, &index, &classifier, &engine);

        assert_eq!(output.classified.len(), 3);
        assert_eq!(output.resolutions.len(), 3);
        for (i, expected) in ["D1", "D2", "D3"].iter().enumerate() {
            assert_eq!(output.classified[i].dispute_id, *expected);
            assert_eq!(output.resolutions[i].dispute_id, *expected);
        }
    }

    #[test]
    fn test_merchant_and_channel_merged_in() {
        let classifier = DisputeClassifier::new();
        let index = TransactionIndex::build(vec![create_test_transaction(
            "T1",
            450.0,
            "Zomato",
            "C1",
            "2024-01-15 10:30:00",
            "COMPLETED",
            "Mobile",
        )]);

        let disputes = vec![
            create_test_dispute("D1", "payment failed", "T1", 450.0),
            create_test_dispute("D2", "payment failed", "T404", 450.0),
        ];
        let classified = classify_disputes(&disputes, Some(&index), &classifier);

        assert_eq!(classified[0].merchant, "Zomato");
        assert_eq!(classified[0].channel, "Mobile");
        assert_eq!(classified[1].merchant, "");
        assert_eq!(classified[1].channel, "");
    }

    #[test]
    fn test_classification_without_transaction_table() {
        let classifier = DisputeClassifier::new();
        let disputes = vec![create_test_dispute("D1", "charged twice", "T1", 100.0)];

        let classified = classify_disputes(&disputes, None, &classifier);

        assert_eq!(classified[0].predicted_category, Category::DuplicateCharge);
        assert_eq!(classified[0].merchant, "");
    }

    // Duplicate pair 120 seconds apart: the classifier corroborates
    // (300-second window), the resolver does not confirm (30-second window)
    #[test]
    fn test_end_to_end_duplicate_windows_disagree() {
        let classifier = DisputeClassifier::new();
        let engine = ResolutionEngine::new();
        let index = TransactionIndex::build(vec![
            create_test_transaction(
                "T1",
                1500.0,
                "M1",
                "C1",
                "2024-01-15 10:30:00",
                "COMPLETED",
                "Web",
            ),
            create_test_transaction(
                "T2",
                1500.0,
                "M1",
                "C1",
                "2024-01-15 10:32:00",
                "COMPLETED",
                "Web",
            ),
        ]);

        let disputes = vec![create_test_dispute("D1", "I was charged twice", "T1", 1500.0)];
        let output = run_pipeline(&disputes, &index, &classifier, &engine);

        let classified = &output.classified[0];
        assert_eq!(classified.predicted_category, Category::DuplicateCharge);
        assert_eq!(classified.confidence, 1.0);
        assert!(classified.explanation.contains("Found 1 duplicate transaction(s)"));

        let resolution = &output.resolutions[0];
        assert_eq!(resolution.suggested_action, SuggestedAction::ManualReview);
    }

    // Same scenario, 20 seconds apart: both windows agree
    #[test]
    fn test_end_to_end_duplicate_confirmed() {
        let classifier = DisputeClassifier::new();
        let engine = ResolutionEngine::new();
        let index = TransactionIndex::build(vec![
            create_test_transaction(
                "T1",
                1500.0,
                "M1",
                "C1",
                "2024-01-15 10:30:00",
                "COMPLETED",
                "Web",
            ),
            create_test_transaction(
                "T2",
                1500.0,
                "M1",
                "C1",
                "2024-01-15 10:30:20",
                "COMPLETED",
                "Web",
            ),
        ]);

        let disputes = vec![create_test_dispute("D1", "I was charged twice", "T1", 1500.0)];
        let output = run_pipeline(&disputes, &index, &classifier, &engine);

        assert_eq!(
            output.resolutions[0].suggested_action,
            SuggestedAction::AutoRefund
        );
    }

    #[test]
    fn test_invariants_hold_for_mixed_batch() {
        let classifier = DisputeClassifier::new();
        let engine = ResolutionEngine::new();
        let index = TransactionIndex::build(vec![create_test_transaction(
            "T1",
            900.0,
            "IRCTC",
            "C1",
            "2024-01-15 10:30:00",
            "FAILED",
            "Web",
        )]);

        let disputes = vec![
            create_test_dispute("D1", "duplicate payment to grocer", "", 200.0),
            create_test_dispute("D2", "payment failed", "T1", 900.0),
            create_test_dispute("D3", "unauthorized charge", "", 3000.0),
            create_test_dispute("D4", "waiting for refund", "T404", 600.0),
            create_test_dispute("D5", "hello", "", 0.0),
        ];

        let output = run_pipeline(&disputes, &index, &classifier, &engine);

        assert_eq!(output.resolutions.len(), disputes.len());
        for classified in &output.classified {
            assert!((0.0..=1.0).contains(&classified.confidence));
        }
        for resolution in &output.resolutions {
            assert!(!resolution.justification.is_empty());
        }
    }

    #[test]
    fn test_summary_counts() {
        let classifier = DisputeClassifier::new();
        let engine = ResolutionEngine::new();
        let index = TransactionIndex::build(Vec::new());

        let disputes = vec![
            create_test_dispute("D1", "charged twice", "", 100.0),
            create_test_dispute("D2", "duplicate charge", "", 100.0),
            create_test_dispute("D3", "scam", "", 200.0),
        ];

        let output = run_pipeline(&disputes, &index, &classifier, &engine);
        let summary = summarize(&output.classified, &output.resolutions);

        assert_eq!(summary.total_disputes, 3);
        assert_eq!(summary.category_counts["DUPLICATE_CHARGE"], 2);
        assert_eq!(summary.category_counts["FRAUD"], 1);
        assert_eq!(summary.action_counts["Manual review"], 3);
    }
}
