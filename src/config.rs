use crate::archive::RetentionPolicy;
use crate::canonicalizer::{Canonicalizer, DEFAULT_MATCH_THRESHOLD, DEFAULT_UNKNOWN_LABEL};
use crate::dictionary::CanonicalDictionary;
use crate::error::{PipelineError, Result};
use crate::schema::StatementType;
use log::info;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

pub const COMBINED_FILE: &str = "combined_statements.csv";
pub const BASELINE_FILE: &str = "baseline_values.csv";
pub const MAX_RETENTION_DAYS: i64 = 36_500;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct PipelineConfig {
    #[schemars(description = "Directory containing the data/ tree. Relative paths resolve against the working directory.")]
    pub project_root: PathBuf,

    #[schemars(description = "Minimum fuzzy score (0-100) for a label to be replaced by its canonical category")]
    pub match_threshold: u8,

    #[schemars(description = "Sentinel label that is never canonicalized")]
    pub unknown_label: String,

    #[schemars(description = "Archived artifacts older than this many days are pruned")]
    pub retention_days: i64,

    #[schemars(description = "Maximum archived versions kept per artifact; null keeps every version inside the retention window")]
    pub max_versions: Option<usize>,

    #[schemars(description = "Optional JSON file replacing the built-in canonical dictionary")]
    pub dictionary: Option<PathBuf>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            project_root: PathBuf::from("."),
            match_threshold: DEFAULT_MATCH_THRESHOLD,
            unknown_label: DEFAULT_UNKNOWN_LABEL.to_string(),
            retention_days: 30,
            max_versions: Some(5),
            dictionary: None,
        }
    }
}

impl PipelineConfig {
    pub fn with_project_root(project_root: impl Into<PathBuf>) -> Self {
        Self {
            project_root: project_root.into(),
            ..Self::default()
        }
    }

    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: PipelineConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_json_file(path: &Path) -> Result<Self> {
        if !path.is_file() {
            return Err(PipelineError::MissingFile {
                path: path.to_path_buf(),
            });
        }
        let json = fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }

    pub fn validate(&self) -> Result<()> {
        if self.match_threshold > 100 {
            return Err(PipelineError::InvalidConfig(format!(
                "match_threshold {} must be between 0 and 100",
                self.match_threshold
            )));
        }
        if !(0..=MAX_RETENTION_DAYS).contains(&self.retention_days) {
            return Err(PipelineError::InvalidConfig(format!(
                "retention_days {} must be between 0 and {}",
                self.retention_days, MAX_RETENTION_DAYS
            )));
        }
        if self.max_versions == Some(0) {
            return Err(PipelineError::InvalidConfig(
                "max_versions must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    pub fn schema_as_json() -> std::result::Result<String, serde_json::Error> {
        let schema = schemars::schema_for!(PipelineConfig);
        serde_json::to_string_pretty(&schema)
    }

    pub fn paths(&self) -> DataPaths {
        DataPaths::new(&self.project_root)
    }

    pub fn retention_policy(&self) -> RetentionPolicy {
        RetentionPolicy {
            retention_days: self.retention_days,
            max_versions: self.max_versions,
        }
    }

    /// Dictionary relative paths resolve against `project_root`.
    pub fn load_dictionary(&self) -> Result<CanonicalDictionary> {
        match &self.dictionary {
            Some(path) => CanonicalDictionary::from_json_file(&self.project_root.join(path)),
            None => Ok(CanonicalDictionary::builtin()),
        }
    }

    pub fn canonicalizer(&self) -> Result<Canonicalizer> {
        let dictionary = self.load_dictionary()?;
        Ok(Canonicalizer::new(dictionary, self.match_threshold)
            .with_unknown_label(self.unknown_label.clone()))
    }
}

/// Fixed directory layout below the project root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataPaths {
    pub raw_dir: PathBuf,
    pub processed_dir: PathBuf,
    pub raw_archive_dir: PathBuf,
    pub processed_archive_dir: PathBuf,
}

impl DataPaths {
    pub fn new(project_root: &Path) -> Self {
        let data_dir = project_root.join("data");
        let raw_dir = data_dir.join("raw");
        let processed_dir = data_dir.join("processed");
        Self {
            raw_archive_dir: raw_dir.join("archive"),
            processed_archive_dir: processed_dir.join("archive"),
            raw_dir,
            processed_dir,
        }
    }

    pub fn ensure(&self) -> Result<()> {
        for dir in [
            &self.raw_dir,
            &self.processed_dir,
            &self.raw_archive_dir,
            &self.processed_archive_dir,
        ] {
            fs::create_dir_all(dir)?;
            info!("Validated or created directory: {}", dir.display());
        }
        Ok(())
    }

    pub fn raw_file(&self, statement: StatementType) -> PathBuf {
        self.raw_dir.join(format!("{}.csv", statement.slug()))
    }

    pub fn processed_file(&self, statement: StatementType) -> PathBuf {
        self.processed_dir
            .join(format!("processed_{}.csv", statement.slug()))
    }

    pub fn tagged_file(&self, statement: StatementType) -> PathBuf {
        self.processed_dir
            .join(format!("tagged_{}.csv", statement.slug()))
    }

    pub fn combined_file(&self) -> PathBuf {
        self.processed_dir.join(COMBINED_FILE)
    }

    pub fn baseline_file(&self) -> PathBuf {
        self.processed_dir.join(BASELINE_FILE)
    }
}
