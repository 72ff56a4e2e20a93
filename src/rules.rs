// 🏷️ Classification Rules - Rules as Data
// Ordered keyword rules over the dispute description; first matching rule
// wins outright, later rules are never evaluated

use crate::index::TransactionIndex;
use crate::records::{Category, Dispute, Transaction};
use anyhow::{Context as AnyhowContext, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Window for corroborating a duplicate charge against the index (seconds).
/// Independent from the resolution engine's confirmation window.
pub const CORROBORATION_WINDOW_SECS: i64 = 300;

/// Amount above which a fraud claim carries a high-value note
pub const HIGH_AMOUNT_THRESHOLD: f64 = 5000.0;

// ============================================================================
// RULE DEFINITION
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KeywordRule {
    /// Category assigned when this rule fires
    pub category: Category,

    /// Rule fires on substring containment of ANY keyword
    pub keywords: Vec<String>,

    /// Confidence before refinement (0.0 - 1.0)
    pub base_confidence: f64,
}

impl KeywordRule {
    /// First keyword contained in the lowercased description, if any.
    /// How many keywords hit does not matter; one is enough.
    pub fn first_hit<'a>(&'a self, desc: &str) -> Option<&'a str> {
        self.keywords
            .iter()
            .map(String::as_str)
            .find(|kw| desc.contains(kw))
    }
}

/// Built-in rule table, in precedence order
pub fn default_rules() -> Vec<KeywordRule> {
    vec![
        KeywordRule {
            category: Category::DuplicateCharge,
            base_confidence: 1.0,
            keywords: vec![
                "charged twice".to_string(),
                "duplicate charge".to_string(),
                "double charge".to_string(),
                "two debit messages".to_string(),
                "duplicate transfer".to_string(),
                "same merchant within minutes".to_string(),
                "charged twice at".to_string(),
                "duplicate upi".to_string(),
                "same vpa".to_string(),
                "minutes apart".to_string(),
                "two upi debit".to_string(),
                "got two".to_string(),
                "same payment".to_string(),
                "duplicate payment".to_string(),
            ],
        },
        KeywordRule {
            category: Category::FailedTransaction,
            base_confidence: 0.9,
            keywords: vec![
                "failed".to_string(),
                "not refunded".to_string(),
                "not received".to_string(),
                "payment stuck".to_string(),
                "pending".to_string(),
            ],
        },
        KeywordRule {
            category: Category::Fraud,
            base_confidence: 1.0,
            keywords: vec![
                "fraud".to_string(),
                "unauthorized".to_string(),
                "not made this payment".to_string(),
                "scam".to_string(),
                "did not make".to_string(),
                "didn't authorize".to_string(),
                "suspicious".to_string(),
                "don't recognize".to_string(),
            ],
        },
        KeywordRule {
            category: Category::RefundPending,
            base_confidence: 0.8,
            keywords: vec![
                "waiting for refund".to_string(),
                "refund pending".to_string(),
                "still not refunded".to_string(),
                "refund not received".to_string(),
                "still waiting".to_string(),
                "refund for canceled".to_string(),
            ],
        },
    ]
}

// ============================================================================
// CLASSIFICATION OUTCOME
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
pub struct ClassificationOutcome {
    pub category: Category,
    pub confidence: f64,
    pub explanation: String,
}

// ============================================================================
// DISPUTE CLASSIFIER
// ============================================================================

pub struct DisputeClassifier {
    rules: Vec<KeywordRule>,

    /// Seconds for the duplicate-charge corroboration search
    pub corroboration_window_secs: i64,

    /// Amount threshold for the high-value fraud note
    pub high_amount_threshold: f64,
}

impl DisputeClassifier {
    /// Classifier with the built-in rule table and default thresholds
    pub fn new() -> Self {
        DisputeClassifier {
            rules: default_rules(),
            corroboration_window_secs: CORROBORATION_WINDOW_SECS,
            high_amount_threshold: HIGH_AMOUNT_THRESHOLD,
        }
    }

    /// Load a custom keyword table from JSON; file order is precedence order
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read rules file: {:?}", path.as_ref()))?;

        let rules: Vec<KeywordRule> =
            serde_json::from_str(&content).context("Failed to parse rules JSON")?;

        Ok(DisputeClassifier::from_rules(rules))
    }

    /// Classifier over an explicit rule list (kept in the given order)
    pub fn from_rules(rules: Vec<KeywordRule>) -> Self {
        DisputeClassifier {
            rules,
            corroboration_window_secs: CORROBORATION_WINDOW_SECS,
            high_amount_threshold: HIGH_AMOUNT_THRESHOLD,
        }
    }

    pub fn rule_count(&self) -> usize {
        self.rules.len()
    }

    /// Classify one dispute.
    /// Unresolvable transactions or unparseable context never fail the call;
    /// they only reduce the available evidence.
    pub fn classify(
        &self,
        dispute: &Dispute,
        index: Option<&TransactionIndex>,
    ) -> ClassificationOutcome {
        let desc = dispute.description.to_lowercase();
        let txn = index.and_then(|ix| ix.lookup(&dispute.txn_id));

        for rule in &self.rules {
            if let Some(keyword) = rule.first_hit(&desc) {
                return self.refine(rule, keyword, dispute, txn, index);
            }
        }

        // No rule fired
        let mut explanation = String::from("No strong keyword match");
        if let Some(txn) = txn {
            explanation.push_str(&format!(
                " (Merchant: {}, Channel: {})",
                txn.merchant, txn.channel
            ));
        }

        ClassificationOutcome {
            category: Category::Others,
            confidence: 0.5,
            explanation,
        }
    }

    /// Adjust confidence and explanation after a rule fired.
    /// Never changes the category.
    fn refine(
        &self,
        rule: &KeywordRule,
        keyword: &str,
        dispute: &Dispute,
        txn: Option<&Transaction>,
        index: Option<&TransactionIndex>,
    ) -> ClassificationOutcome {
        let mut confidence = rule.base_confidence;
        let mut explanation = format!("Keyword match: '{}'", keyword);

        match rule.category {
            Category::DuplicateCharge => {
                if let (Some(txn), Some(index)) = (txn, index) {
                    let duplicates = index.near_duplicates(txn, self.corroboration_window_secs);
                    if !duplicates.is_empty() {
                        confidence = 1.0;
                        explanation.push_str(&format!(
                            " + Found {} duplicate transaction(s)",
                            duplicates.len()
                        ));
                    }
                }
            }
            Category::FailedTransaction => {
                if let Some(txn) = txn {
                    let status = txn.status_upper();
                    if status == "FAILED" || status == "CANCELLED" {
                        confidence = 1.0;
                        explanation.push_str(&format!(" + Transaction status: {}", status));
                    }
                }
            }
            Category::Fraud => {
                if dispute.amount > self.high_amount_threshold {
                    confidence = 1.0;
                    explanation.push_str(&format!(" + High amount: ₹{}", dispute.amount));
                }
            }
            Category::RefundPending => {
                if let Some(txn) = txn {
                    let status = txn.status_upper();
                    if status == "CANCELLED" {
                        confidence = 1.0;
                        explanation.push_str(&format!(" + Transaction status: {}", status));
                    }
                }
            }
            Category::Others => {}
        }

        ClassificationOutcome {
            category: rule.category,
            confidence,
            explanation,
        }
    }
}

impl Default for DisputeClassifier {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// TESTS
// ============================================================================
