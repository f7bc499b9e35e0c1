//! # Statement Normalizer
//!
//! Normalizes raw financial-statement extracts (balance sheet, income
//! statement, cash flow) into a canonical, analyzable form.
//!
//! ## Core Concepts
//!
//! - **Canonicalization**: free-text line-item labels ("COGS", "Cost of Sales")
//!   are fuzzy-matched onto a fixed dictionary of canonical categories
//! - **Statement Transformer**: a per-statement state machine
//!   (load, validate, transform, tag, save)
//! - **Combination**: the three tagged statements are melted into one long-form table
//! - **Baselines**: mean across periods for flow statements, latest period for the balance sheet
//! - **Archive**: processed artifacts rotate into `archive/` with a timestamp suffix
//!   and are pruned by age and version count
//!
//! ## Example
//!
//! ```rust,no_run
//! use statement_normalizer::*;
//!
//! let config = PipelineConfig::with_project_root("/srv/financial-model");
//! let report = run_pipeline(&config).unwrap();
//! for baseline in &report.baselines {
//!     println!("{} ({}): {}", baseline.category, baseline.statement_type.label(), baseline.amount);
//! }
//! ```

pub mod archive;
pub mod baseline;
pub mod canonicalizer;
pub mod combiner;
pub mod config;
pub mod dictionary;
pub mod error;
pub mod fuzz;
pub mod schema;
pub mod table;
pub mod transformer;
pub mod utils;

pub use archive::{archive, prune, ArchiveReport, PruneReport, RetentionPolicy};
pub use baseline::{compute_baselines, BaselineCalculator};
pub use canonicalizer::{Canonicalizer, MatchCandidate};
pub use combiner::{combine, TaggedStatements};
pub use config::{DataPaths, PipelineConfig};
pub use dictionary::{CanonicalCategory, CanonicalDictionary};
pub use error::{PipelineError, Result};
pub use schema::*;
pub use table::{Cell, Table};
pub use transformer::{StatementOutcome, StatementTransformer, TransformState};

use log::{debug, error, info, warn};

/// Everything one [`Pipeline::run`] produced.
#[derive(Debug)]
pub struct PipelineReport {
    /// One outcome per statement, in [`StatementType::ALL`] order.
    pub outcomes: Vec<StatementOutcome>,
    pub archive: ArchiveReport,
    pub combined_rows: usize,
    pub baselines: Vec<Baseline>,
    pub prune: PruneReport,
}

impl PipelineReport {
    pub fn failed_statements(&self) -> Vec<StatementType> {
        self.outcomes
            .iter()
            .filter(|o| !o.is_completed())
            .map(StatementOutcome::statement)
            .collect()
    }
}

pub struct Pipeline {
    config: PipelineConfig,
    paths: DataPaths,
    canonicalizer: Canonicalizer,
}

impl Pipeline {
    pub fn new(config: PipelineConfig) -> Result<Self> {
        config.validate()?;
        let canonicalizer = config.canonicalizer()?;
        let paths = config.paths();
        Ok(Self {
            config,
            paths,
            canonicalizer,
        })
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn paths(&self) -> &DataPaths {
        &self.paths
    }

    /// Runs all three statements, then combination and baselines.
    ///
    /// A failed statement is recorded in the report, but its missing tagged
    /// file halts the run with [`PipelineError::MissingFile`] before any
    /// combined or baseline output is written.
    pub fn run(&self) -> Result<PipelineReport> {
        info!(
            "Running statement pipeline under {}",
            self.config.project_root.display()
        );
        self.paths.ensure()?;

        let outcomes = self.transform_statements();

        let tagged = TaggedStatements::load(&self.paths)?;

        let archive = self.archive_processed();

        let records = tagged.combine()?;
        combiner::write_combined(&records, &self.paths.combined_file())?;

        let baselines = compute_baselines(&records);
        baseline::write_baselines(&baselines, &self.paths.baseline_file())?;

        let prune = self.prune_archive();

        info!(
            "Pipeline finished: {} combined rows, {} baselines",
            records.len(),
            baselines.len()
        );

        Ok(PipelineReport {
            outcomes,
            archive,
            combined_rows: records.len(),
            baselines,
            prune,
        })
    }

    pub fn transform_statements(&self) -> Vec<StatementOutcome> {
        StatementType::ALL
            .into_iter()
            .map(|statement| {
                info!("[{}] starting transformation", statement);
                let mut transformer = StatementTransformer::new(statement, self.paths.clone());
                let outcome = transformer.run(&self.canonicalizer);
                match &outcome {
                    StatementOutcome::Completed { rows, .. } => {
                        debug!("[{}] completed with {} line items", statement, rows);
                    }
                    StatementOutcome::Failed { error, .. } if !error.is_statement_local() => {
                        warn!("[{}] failed outside input validation: {}", statement, error);
                    }
                    StatementOutcome::Failed { .. } => {}
                }
                outcome
            })
            .collect()
    }

    fn archive_processed(&self) -> ArchiveReport {
        match archive(&self.paths.processed_dir, &self.paths.processed_archive_dir) {
            Ok(report) => {
                if !report.failures.is_empty() {
                    warn!("{} files could not be archived", report.failures.len());
                }
                report
            }
            Err(e) => {
                error!("Archiving processed files failed: {}", e);
                ArchiveReport {
                    failures: vec![e],
                    ..ArchiveReport::default()
                }
            }
        }
    }

    fn prune_archive(&self) -> PruneReport {
        let policy = self.config.retention_policy();
        match prune(&self.paths.processed_archive_dir, &policy) {
            Ok(report) => {
                debug!("Pruned {} archived files", report.removed());
                report
            }
            Err(e) => {
                error!("Pruning the processed archive failed: {}", e);
                PruneReport {
                    failures: vec![e],
                    ..PruneReport::default()
                }
            }
        }
    }
}

pub fn run_pipeline(config: &PipelineConfig) -> Result<PipelineReport> {
    Pipeline::new(config.clone())?.run()
}
