//! Per-statement load, validate, transform, tag and save pipeline.
//!
//! One [`StatementTransformer`] handles exactly one statement type and walks
//! the states `Unloaded -> Loaded -> Validated -> Transformed -> Tagged -> Saved`
//! in order. Calling an operation out of order is an
//! [`PipelineError::InvalidState`] error.

use crate::canonicalizer::Canonicalizer;
use crate::config::DataPaths;
use crate::error::{PipelineError, Result};
use crate::schema::StatementType;
use crate::table::{Cell, Table};
use crate::utils::compare_periods;
use log::{debug, error, info, warn};

pub const CATEGORY_COLUMN: &str = "Category";
pub const STANDARDIZED_COLUMN: &str = "Standardized Category";
const UNNAMED_INDEX_COLUMN: &str = "Unnamed: 0";

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum TransformState {
    Unloaded,
    Loaded,
    Validated,
    Transformed,
    Tagged,
    Saved,
}

impl TransformState {
    pub fn name(&self) -> &'static str {
        match self {
            TransformState::Unloaded => "Unloaded",
            TransformState::Loaded => "Loaded",
            TransformState::Validated => "Validated",
            TransformState::Transformed => "Transformed",
            TransformState::Tagged => "Tagged",
            TransformState::Saved => "Saved",
        }
    }
}

/// Result of a full [`StatementTransformer::run`].
#[derive(Debug)]
pub enum StatementOutcome {
    Completed {
        statement: StatementType,
        rows: usize,
    },
    Failed {
        statement: StatementType,
        operation: &'static str,
        error: PipelineError,
    },
}

impl StatementOutcome {
    pub fn statement(&self) -> StatementType {
        match self {
            StatementOutcome::Completed { statement, .. } => *statement,
            StatementOutcome::Failed { statement, .. } => *statement,
        }
    }

    pub fn is_completed(&self) -> bool {
        matches!(self, StatementOutcome::Completed { .. })
    }

    pub fn error(&self) -> Option<&PipelineError> {
        match self {
            StatementOutcome::Completed { .. } => None,
            StatementOutcome::Failed { error, .. } => Some(error),
        }
    }
}

pub struct StatementTransformer {
    statement: StatementType,
    paths: DataPaths,
    state: TransformState,
    operation: &'static str,
    table: Option<Table>,
    processed: Option<Table>,
}

impl StatementTransformer {
    pub fn new(statement: StatementType, paths: DataPaths) -> Self {
        Self {
            statement,
            paths,
            state: TransformState::Unloaded,
            operation: "load",
            table: None,
            processed: None,
        }
    }

    pub fn statement(&self) -> StatementType {
        self.statement
    }

    pub fn state(&self) -> TransformState {
        self.state
    }

    /// Current working table: raw after load, tagged after tag.
    pub fn table(&self) -> Option<&Table> {
        self.table.as_ref()
    }

    /// Snapshot taken at the end of [`transform`](Self::transform), before tagging.
    pub fn processed(&self) -> Option<&Table> {
        self.processed.as_ref()
    }

    fn begin(&mut self, operation: &'static str, expected: TransformState) -> Result<()> {
        self.operation = operation;
        if self.state != expected {
            return Err(PipelineError::InvalidState {
                statement: self.statement.slug().to_string(),
                operation,
                expected: expected.name(),
                actual: self.state.name(),
            });
        }
        Ok(())
    }

    fn working_table(&mut self) -> Result<&mut Table> {
        let statement = self.statement.slug().to_string();
        let operation = self.operation;
        let actual = self.state.name();
        self.table.as_mut().ok_or(PipelineError::InvalidState {
            statement,
            operation,
            expected: TransformState::Loaded.name(),
            actual,
        })
    }

    pub fn load(&mut self) -> Result<()> {
        self.begin("load", TransformState::Unloaded)?;
        let path = self.paths.raw_file(self.statement);
        let table = Table::read_csv(&path)?;
        info!(
            "[{}] load: {} rows x {} columns from {}",
            self.statement,
            table.len(),
            table.columns.len(),
            path.display()
        );
        self.table = Some(table);
        self.state = TransformState::Loaded;
        Ok(())
    }

    /// Loads an already-read raw table instead of the file on disk.
    pub fn load_table(&mut self, table: Table) -> Result<()> {
        self.begin("load", TransformState::Unloaded)?;
        self.table = Some(table);
        self.state = TransformState::Loaded;
        Ok(())
    }

    pub fn validate(&mut self) -> Result<()> {
        self.begin("validate", TransformState::Loaded)?;
        let statement = self.statement.slug().to_string();
        let table = self.working_table()?;

        if table.is_empty() {
            return Err(PipelineError::EmptyData { statement });
        }

        let first_is_blank = table.columns.first().map_or(true, |c| c.trim().is_empty());
        if first_is_blank && table.column(0).all(Cell::is_missing) {
            return Err(PipelineError::BlankFirstColumn { statement });
        }

        if !table.has_numeric_column() {
            return Err(PipelineError::NoNumericColumn { statement });
        }

        info!("[{}] validate: passed validation checks", self.statement);
        self.state = TransformState::Validated;
        Ok(())
    }

    pub fn transform(&mut self) -> Result<()> {
        self.begin("transform", TransformState::Validated)?;
        let reverse = self.statement.reverses_rows();
        let table = self.working_table()?;

        let category_index = table.column_index(UNNAMED_INDEX_COLUMN).unwrap_or(0);

        let mut periods: Vec<(String, usize)> = table
            .columns
            .iter()
            .enumerate()
            .filter(|(index, _)| *index != category_index)
            .map(|(index, name)| (name.clone(), index))
            .collect();
        periods.sort_by(|a, b| compare_periods(&b.0, &a.0));

        let mut columns = Vec::with_capacity(periods.len() + 1);
        columns.push(CATEGORY_COLUMN.to_string());
        columns.extend(periods.iter().map(|(name, _)| name.clone()));

        let mut rows: Vec<Vec<Cell>> = table
            .rows
            .iter()
            .filter(|row| !row[category_index].is_missing())
            .map(|row| {
                let mut out = Vec::with_capacity(columns.len());
                out.push(row[category_index].clone());
                for (_, index) in &periods {
                    out.push(match &row[*index] {
                        Cell::Null => Cell::Blank,
                        other => other.clone(),
                    });
                }
                out
            })
            .collect();

        let dropped = table.rows.len() - rows.len();
        if reverse {
            rows.reverse();
        }

        *table = Table::new(columns, rows);
        let transformed = table.clone();

        info!(
            "[{}] transform: {} line items across {} periods ({} blank categories dropped)",
            self.statement,
            transformed.len(),
            transformed.columns.len() - 1,
            dropped
        );
        self.processed = Some(transformed);
        self.state = TransformState::Transformed;
        Ok(())
    }

    /// Adds the `Standardized Category` column, or overwrites an existing one.
    ///
    /// `transform` always produces a `Category` column, so the warn-and-skip
    /// branch for a table without one is only reachable by driving the
    /// transformer out of its normal sequence.
    pub fn tag(&mut self, canonicalizer: &Canonicalizer) -> Result<()> {
        self.begin("tag", TransformState::Transformed)?;
        let statement = self.statement;
        let table = self.working_table()?;

        match table.column_index(CATEGORY_COLUMN) {
            None => {
                warn!(
                    "[{}] tag: column '{}' not found, leaving table untagged",
                    statement, CATEGORY_COLUMN
                );
            }
            Some(index) => {
                let standardized: Vec<Cell> = table
                    .column(index)
                    .map(|cell| canonicalizer.canonicalize_cell(cell))
                    .collect();

                let remapped = table
                    .column(index)
                    .zip(&standardized)
                    .filter(|(raw, tagged)| raw != tagged)
                    .count();

                if let Some(existing) = table.column_index(STANDARDIZED_COLUMN) {
                    for (row, cell) in table.rows.iter_mut().zip(standardized) {
                        row[existing] = cell;
                    }
                } else {
                    table.push_column(STANDARDIZED_COLUMN, standardized);
                }

                debug!("[{}] tag: {} labels remapped", statement, remapped);
                info!("[{}] tag: tagged {} line items", statement, table.len());
            }
        }

        self.state = TransformState::Tagged;
        Ok(())
    }

    /// Writes the pre-tag snapshot to `processed_{statement}.csv`.
    pub fn save_processed(&mut self) -> Result<()> {
        self.operation = "save processed";
        let processed = match (&self.processed, self.state) {
            (Some(table), TransformState::Transformed | TransformState::Tagged) => table,
            _ => {
                return Err(PipelineError::InvalidState {
                    statement: self.statement.slug().to_string(),
                    operation: "save processed",
                    expected: TransformState::Transformed.name(),
                    actual: self.state.name(),
                })
            }
        };
        let path = self.paths.processed_file(self.statement);
        processed.write_csv(&path)?;
        info!("[{}] save: wrote {}", self.statement, path.display());
        Ok(())
    }

    /// Writes the tagged table to `tagged_{statement}.csv`.
    pub fn save_tagged(&mut self) -> Result<()> {
        self.begin("save tagged", TransformState::Tagged)?;
        let path = self.paths.tagged_file(self.statement);
        let table = self.working_table()?;
        table.write_csv(&path)?;
        info!("[{}] save: wrote {}", self.statement, path.display());
        self.state = TransformState::Saved;
        Ok(())
    }

    /// Writes both artifacts from the `Tagged` state.
    pub fn save(&mut self) -> Result<()> {
        self.save_processed()?;
        self.save_tagged()
    }

    fn run_stages(&mut self, canonicalizer: &Canonicalizer) -> Result<()> {
        self.load()?;
        self.validate()?;
        self.transform()?;
        self.save_processed()?;
        self.tag(canonicalizer)?;
        self.save_tagged()
    }

    /// Runs every stage; a failure is logged and returned as an outcome,
    /// never propagated.
    pub fn run(&mut self, canonicalizer: &Canonicalizer) -> StatementOutcome {
        match self.run_stages(canonicalizer) {
            Ok(()) => StatementOutcome::Completed {
                statement: self.statement,
                rows: self.table.as_ref().map_or(0, Table::len),
            },
            Err(error) => {
                error!(
                    "[{}] {} failed: {}",
                    self.statement, self.operation, error
                );
                StatementOutcome::Failed {
                    statement: self.statement,
                    operation: self.operation,
                    error,
                }
            }
        }
    }
}
