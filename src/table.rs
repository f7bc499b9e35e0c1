//! In-memory representation of the CSV artifacts exchanged between stages.
//!
//! Tables are read verbatim: every header is kept as written (including a
//! blank first header) and every field is classified once into a [`Cell`].

use crate::error::{PipelineError, Result};
use csv::{ReaderBuilder, WriterBuilder};
use std::fmt;
use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;

/// Fields read as missing, matching the pandas default NA spellings.
const NULL_TOKENS: &[&str] = &[
    "", "#N/A", "#N/A N/A", "#NA", "-1.#IND", "-1.#QNAN", "-NaN", "-nan", "1.#IND", "1.#QNAN",
    "<NA>", "N/A", "NA", "NULL", "NaN", "None", "n/a", "nan", "null",
];

#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    /// Missing in the source (empty field or a null token).
    Null,
    /// Explicit empty marker written in place of a missing value.
    Blank,
    Number(f64),
    Text(String),
}

impl Cell {
    pub fn parse(raw: &str) -> Cell {
        let trimmed = raw.trim();
        if NULL_TOKENS.contains(&trimmed) {
            return Cell::Null;
        }
        match trimmed.parse::<f64>() {
            // Any other NaN spelling the float parser accepts ("NAN", "-NaN").
            Ok(value) if value.is_nan() => Cell::Null,
            Ok(value) => Cell::Number(value),
            Err(_) => Cell::Text(raw.to_string()),
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            Cell::Number(value) => Some(*value),
            _ => None,
        }
    }

    pub fn is_missing(&self) -> bool {
        match self {
            Cell::Null | Cell::Blank => true,
            Cell::Text(text) => text.is_empty(),
            Cell::Number(_) => false,
        }
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Cell::Null | Cell::Blank => Ok(()),
            Cell::Number(value) => write!(f, "{}", value),
            Cell::Text(text) => f.write_str(text),
        }
    }
}


#[derive(Debug, Clone, PartialEq, Default)]
pub struct Table {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Cell>>,
}

impl Table {
    pub fn new(columns: Vec<String>, rows: Vec<Vec<Cell>>) -> Self {
        Self { columns, rows }
    }

    pub fn read_csv(path: &Path) -> Result<Self> {
        if !path.is_file() {
            return Err(PipelineError::MissingFile {
                path: path.to_path_buf(),
            });
        }
        let file = File::open(path)?;
        Self::from_reader(file)
    }

    /// Short records are padded with [`Cell::Null`], long ones truncated to the header width.
    pub fn from_reader<R: Read>(reader: R) -> Result<Self> {
        let mut reader = ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_reader(reader);

        let columns: Vec<String> = reader.headers()?.iter().map(|h| h.to_string()).collect();
        let width = columns.len();

        let mut rows = Vec::new();
        for record in reader.records() {
            let record = record?;
            let mut row: Vec<Cell> = record.iter().take(width).map(Cell::parse).collect();
            row.resize(width, Cell::Null);
            rows.push(row);
        }

        Ok(Self { columns, rows })
    }

    pub fn write_csv(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let file = File::create(path)?;
        self.to_writer(file)
    }

    pub fn to_writer<W: Write>(&self, writer: W) -> Result<()> {
        let mut writer = WriterBuilder::new().from_writer(writer);
        writer.write_record(&self.columns)?;
        for row in &self.rows {
            writer.write_record(row.iter().map(|cell| cell.to_string()))?;
        }
        writer.flush()?;
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    pub fn column(&self, index: usize) -> impl Iterator<Item = &Cell> + '_ {
        self.rows.iter().filter_map(move |row| row.get(index))
    }

    /// Numeric-typed means every cell is a number or missing; an all-missing
    /// column counts as numeric.
    pub fn is_numeric_column(&self, index: usize) -> bool {
        self.column(index)
            .all(|cell| matches!(cell, Cell::Null | Cell::Number(_)))
    }

    pub fn has_numeric_column(&self) -> bool {
        (0..self.columns.len()).any(|index| self.is_numeric_column(index))
    }

    pub fn push_column(&mut self, name: impl Into<String>, cells: Vec<Cell>) {
        self.columns.push(name.into());
        for (row, cell) in self.rows.iter_mut().zip(cells) {
            row.push(cell);
        }
    }
}
