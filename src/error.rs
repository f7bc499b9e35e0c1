use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("Source file not found: {}", path.display())]
    MissingFile { path: PathBuf },

    #[error("The raw data for {statement} is empty")]
    EmptyData { statement: String },

    #[error("No numeric columns found in {statement} data")]
    NoNumericColumn { statement: String },

    #[error("The first column in the {statement} data is unnamed and holds no labels")]
    BlankFirstColumn { statement: String },

    #[error("Column '{column}' not found ({context})")]
    MissingColumn { column: String, context: String },

    #[error("Archive operation failed on {}: {source}", path.display())]
    ArchiveIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Cannot {operation} {statement}: expected state {expected}, found {actual}")]
    InvalidState {
        statement: String,
        operation: &'static str,
        expected: &'static str,
        actual: &'static str,
    },

    #[error("Duplicate canonical category: {0}")]
    DuplicateCategory(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl PipelineError {
    /// True for failures that end one statement's run without touching its siblings.
    pub fn is_statement_local(&self) -> bool {
        matches!(
            self,
            PipelineError::MissingFile { .. }
                | PipelineError::EmptyData { .. }
                | PipelineError::NoNumericColumn { .. }
                | PipelineError::BlankFirstColumn { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, PipelineError>;
