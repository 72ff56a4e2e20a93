// Dispute Assistant - Core Library
// Classifies financial dispute records and suggests resolution actions.
// Exposes all modules for use in the CLI and tests

pub mod index;      // Transaction Index - lookups + time-window duplicate search
pub mod pipeline;   // Batch driver - classify all, resolve all
pub mod records;    // Record model + CSV import/export
pub mod resolution; // Resolution Engine - category -> suggested action
pub mod rules;      // Classification Rules - ordered keyword rules

// Re-export commonly used types
pub use index::{parse_timestamp, TransactionIndex};
pub use pipeline::{
    classify_disputes, generate_resolutions, run_pipeline, summarize, BatchSummary,
    PipelineOutput,
};
pub use records::{
    load_classified_disputes, load_disputes, load_transactions, write_csv, Category,
    ClassifiedDispute, Dispute, Resolution, SuggestedAction, Transaction,
};
pub use resolution::ResolutionEngine;
pub use rules::{default_rules, ClassificationOutcome, DisputeClassifier, KeywordRule};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
