use statement_normalizer::{Pipeline, PipelineConfig, StatementOutcome};
use std::path::Path;

fn main() -> anyhow::Result<()> {
    env_logger::init();

    let config = match std::env::args().nth(1) {
        Some(path) => PipelineConfig::from_json_file(Path::new(&path))?,
        None => PipelineConfig::default(),
    };

    let pipeline = Pipeline::new(config)?;
    let report = pipeline.run()?;

    for outcome in &report.outcomes {
        match outcome {
            StatementOutcome::Completed { statement, rows } => {
                println!("{:<18} ok      {} line items", statement.label(), rows)
            }
            StatementOutcome::Failed {
                statement,
                operation,
                error,
            } => println!("{:<18} FAILED  {} ({})", statement.label(), operation, error),
        }
    }

    println!(
        "\nArchived {} files, pruned {}; {} combined rows",
        report.archive.archived.len(),
        report.prune.removed(),
        report.combined_rows
    );
    println!("\n{:<45} {:<20} {:>14}", "Category", "Statement", "Baseline");
    for baseline in &report.baselines {
        println!(
            "{:<45} {:<20} {:>14.2}",
            baseline.category,
            baseline.statement_type.label(),
            baseline.amount
        );
    }

    Ok(())
}
