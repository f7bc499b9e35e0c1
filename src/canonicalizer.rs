use crate::dictionary::CanonicalDictionary;
use crate::fuzz::weighted_ratio;
use crate::table::Cell;

pub const DEFAULT_MATCH_THRESHOLD: u8 = 80;
pub const DEFAULT_UNKNOWN_LABEL: &str = "Unknown";

/// Winning (category, alias, score) triple for a label.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MatchCandidate<'a> {
    pub category: &'a str,
    pub alias: &'a str,
    pub score: u8,
}

/// Maps raw line-item labels onto canonical categories.
///
/// The result depends only on the label, the dictionary and the threshold.
#[derive(Debug, Clone)]
pub struct Canonicalizer {
    dictionary: CanonicalDictionary,
    threshold: u8,
    unknown_label: String,
}

impl Canonicalizer {
    pub fn new(dictionary: CanonicalDictionary, threshold: u8) -> Self {
        Self {
            dictionary,
            threshold,
            unknown_label: DEFAULT_UNKNOWN_LABEL.to_string(),
        }
    }

    pub fn with_unknown_label(mut self, unknown_label: impl Into<String>) -> Self {
        self.unknown_label = unknown_label.into();
        self
    }

    pub fn dictionary(&self) -> &CanonicalDictionary {
        &self.dictionary
    }

    pub fn threshold(&self) -> u8 {
        self.threshold
    }

    /// Scores `label` against every alias of every category.
    ///
    /// Ties keep the earliest alias within a category and the earliest
    /// category across the dictionary.
    pub fn best_match(&self, label: &str) -> Option<MatchCandidate<'_>> {
        let mut best: Option<MatchCandidate<'_>> = None;

        for category in self.dictionary.categories() {
            for alias in &category.aliases {
                let score = weighted_ratio(label, alias);
                if best.map_or(true, |b| score > b.score) {
                    best = Some(MatchCandidate {
                        category: &category.name,
                        alias,
                        score,
                    });
                }
            }
        }

        best
    }

    pub fn canonicalize(&self, label: &str) -> String {
        if label == self.unknown_label {
            return label.to_string();
        }

        match self.best_match(label) {
            Some(candidate) if candidate.score >= self.threshold => candidate.category.to_string(),
            _ => label.to_string(),
        }
    }

    /// Non-text cells pass through untouched.
    pub fn canonicalize_cell(&self, cell: &Cell) -> Cell {
        match cell {
            Cell::Text(label) => Cell::Text(self.canonicalize(label)),
            other => other.clone(),
        }
    }
}

impl Default for Canonicalizer {
    fn default() -> Self {
        Self::new(CanonicalDictionary::builtin(), DEFAULT_MATCH_THRESHOLD)
    }
}
