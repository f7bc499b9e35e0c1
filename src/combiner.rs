use crate::config::DataPaths;
use crate::error::{PipelineError, Result};
use crate::schema::{LongFormRecord, StatementType};
use crate::table::{Cell, Table};
use crate::transformer::{CATEGORY_COLUMN, STANDARDIZED_COLUMN};
use log::info;
use std::path::Path;

pub const STATEMENT_TYPE_COLUMN: &str = "Statement Type";
pub const PERIOD_COLUMN: &str = "Period";
pub const AMOUNT_COLUMN: &str = "Amount";

/// The three tagged statements the combiner depends on.
#[derive(Debug, Clone)]
pub struct TaggedStatements {
    pub balance_sheet: Table,
    pub income_statement: Table,
    pub cash_flow: Table,
}

impl TaggedStatements {
    /// Every file is required; a statement that failed upstream surfaces here
    /// as [`PipelineError::MissingFile`].
    pub fn load(paths: &DataPaths) -> Result<Self> {
        info!("Loading tagged financial statements...");
        let statements = Self {
            balance_sheet: Table::read_csv(&paths.tagged_file(StatementType::BalanceSheet))?,
            income_statement: Table::read_csv(&paths.tagged_file(StatementType::IncomeStatement))?,
            cash_flow: Table::read_csv(&paths.tagged_file(StatementType::CashFlow))?,
        };
        info!("Tagged financial statements loaded successfully");
        Ok(statements)
    }

    pub fn combine(&self) -> Result<Vec<LongFormRecord>> {
        combine(&self.balance_sheet, &self.income_statement, &self.cash_flow)
    }
}

/// Melts one wide statement into long rows, period-major like a column-wise melt.
fn melt(statement: StatementType, table: &Table) -> Result<Vec<LongFormRecord>> {
    let category_index =
        table
            .column_index(CATEGORY_COLUMN)
            .ok_or_else(|| PipelineError::MissingColumn {
                column: CATEGORY_COLUMN.to_string(),
                context: format!("combining {}", statement),
            })?;

    let label_index = table
        .column_index(STANDARDIZED_COLUMN)
        .unwrap_or(category_index);

    let periods: Vec<(usize, &String)> = table
        .columns
        .iter()
        .enumerate()
        .filter(|(_, name)| {
            !matches!(
                name.as_str(),
                CATEGORY_COLUMN | STANDARDIZED_COLUMN | STATEMENT_TYPE_COLUMN
            )
        })
        .collect();

    let mut records = Vec::with_capacity(periods.len() * table.len());
    for (period_index, period) in periods {
        for row in &table.rows {
            records.push(LongFormRecord {
                category: row[label_index].to_string(),
                statement_type: statement,
                period: period.clone(),
                amount: row[period_index].clone(),
            });
        }
    }

    Ok(records)
}

/// Unions the three statements: balance sheet rows, then income statement, then cash flow.
pub fn combine(
    balance_sheet: &Table,
    income_statement: &Table,
    cash_flow: &Table,
) -> Result<Vec<LongFormRecord>> {
    let mut combined = melt(StatementType::BalanceSheet, balance_sheet)?;
    combined.extend(melt(StatementType::IncomeStatement, income_statement)?);
    combined.extend(melt(StatementType::CashFlow, cash_flow)?);

    info!(
        "Financial statements combined successfully: {} long-form rows",
        combined.len()
    );
    Ok(combined)
}

pub fn to_table(records: &[LongFormRecord]) -> Table {
    let columns = vec![
        CATEGORY_COLUMN.to_string(),
        STATEMENT_TYPE_COLUMN.to_string(),
        PERIOD_COLUMN.to_string(),
        AMOUNT_COLUMN.to_string(),
    ];
    let rows = records
        .iter()
        .map(|record| {
            vec![
                Cell::Text(record.category.clone()),
                Cell::Text(record.statement_type.label().to_string()),
                Cell::Text(record.period.clone()),
                record.amount.clone(),
            ]
        })
        .collect();
    Table::new(columns, rows)
}

pub fn write_combined(records: &[LongFormRecord], path: &Path) -> Result<()> {
    to_table(records).write_csv(path)?;
    info!("Combined statements saved to {}", path.display());
    Ok(())
}
