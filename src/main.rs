use anyhow::Result;
use std::env;
use std::path::{Path, PathBuf};

use dispute_assistant::{
    classify_disputes, generate_resolutions, load_classified_disputes, load_disputes,
    load_transactions, summarize, write_csv, DisputeClassifier, ResolutionEngine,
    TransactionIndex,
};

fn main() -> Result<()> {
    let args: Vec<String> = env::args().collect();
    let mode = args.get(1).map(String::as_str).unwrap_or("pipeline");

    let data_dir = PathBuf::from(args.get(2).map(String::as_str).unwrap_or("data"));
    let output_dir = PathBuf::from(args.get(3).map(String::as_str).unwrap_or("output"));

    match mode {
        "classify" => run_classify(&data_dir, &output_dir),
        "resolve" => run_resolve(&data_dir, &output_dir),
        "pipeline" => run_pipeline_mode(&data_dir, &output_dir),
        _ => {
            eprintln!("Usage: dispute-assistant [classify|resolve|pipeline] [data_dir] [output_dir]");
            eprintln!("  classify  - classify disputes, write classified_disputes.csv");
            eprintln!("  resolve   - suggest resolutions for a classified file, write resolutions.csv");
            eprintln!("  pipeline  - run both steps in memory (default)");
            std::process::exit(1);
        }
    }
}

/// Step 1 only. Transactions are optional here; without them the classifier
/// runs on descriptions alone.
fn run_classify(data_dir: &Path, output_dir: &Path) -> Result<()> {
    let disputes = load_disputes(&data_dir.join("disputes.csv"))?;
    println!("📂 Loaded {} disputes", disputes.len());

    let index = match load_transactions(&data_dir.join("transactions.csv")) {
        Ok(transactions) => {
            let index = TransactionIndex::build(transactions);
            report_index(&index);
            Some(index)
        }
        Err(_) => {
            println!("⚠️  transactions.csv not found. Using basic classification.");
            None
        }
    };

    let classifier = DisputeClassifier::new();
    let classified = classify_disputes(&disputes, index.as_ref(), &classifier);

    let out_path = output_dir.join("classified_disputes.csv");
    write_csv(&out_path, &classified)?;
    println!("✅ Results saved to {}", out_path.display());

    Ok(())
}

/// Step 2 only, reading the classified file written by step 1
fn run_resolve(data_dir: &Path, output_dir: &Path) -> Result<()> {
    let classified = load_classified_disputes(&output_dir.join("classified_disputes.csv"))?;
    let transactions = load_transactions(&data_dir.join("transactions.csv"))?;

    let index = TransactionIndex::build(transactions);
    report_index(&index);

    let engine = ResolutionEngine::new();
    let resolutions = generate_resolutions(&classified, &index, &engine);

    let out_path = output_dir.join("resolutions.csv");
    write_csv(&out_path, &resolutions)?;
    println!("✅ Resolutions saved to {}", out_path.display());

    Ok(())
}

/// Both steps in one in-memory pass
fn run_pipeline_mode(data_dir: &Path, output_dir: &Path) -> Result<()> {
    println!("🚀 Starting dispute assistant pipeline...");

    let disputes = load_disputes(&data_dir.join("disputes.csv"))?;
    let transactions = load_transactions(&data_dir.join("transactions.csv"))?;

    let index = TransactionIndex::build(transactions);
    report_index(&index);

    println!("🔹 Step 1: Classifying disputes...");
    let classifier = DisputeClassifier::new();
    let classified = classify_disputes(&disputes, Some(&index), &classifier);
    let classified_path = output_dir.join("classified_disputes.csv");
    write_csv(&classified_path, &classified)?;
    println!("✅ Results saved to {}", classified_path.display());

    println!("🔹 Step 2: Suggesting resolutions...");
    let engine = ResolutionEngine::new();
    let resolutions = generate_resolutions(&classified, &index, &engine);
    let resolutions_path = output_dir.join("resolutions.csv");
    write_csv(&resolutions_path, &resolutions)?;
    println!("✅ Resolutions saved to {}", resolutions_path.display());

    let summary = summarize(&classified, &resolutions);
    println!("\n📊 {} disputes processed", summary.total_disputes);
    for (category, count) in &summary.category_counts {
        println!("   {}: {}", category, count);
    }
    println!("📋 Suggested actions:");
    for (action, count) in &summary.action_counts {
        println!("   {}: {}", action, count);
    }

    println!("\n✅ Pipeline completed successfully!");

    Ok(())
}

fn report_index(index: &TransactionIndex) {
    println!("✓ Indexed {} transactions", index.len());
    if index.skipped_rows() > 0 {
        println!("✓ Skipped {} re-imported duplicate rows", index.skipped_rows());
    }
}
