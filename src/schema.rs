use crate::table::Cell;
use chrono::{DateTime, Local};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum StatementType {
    #[schemars(description = "Point-in-time snapshot of assets, liabilities and equity")]
    BalanceSheet,

    #[schemars(description = "Revenue and expense activity over each reporting period")]
    IncomeStatement,

    #[schemars(description = "Operating, investing and financing cash activity over each reporting period")]
    CashFlow,
}

/// How a statement's reference value is derived from its periods.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BaselineMethod {
    /// Flow statements: arithmetic mean across all periods.
    Mean,
    /// Point-in-time statements: the amount at the latest period label.
    Latest,
}

const INCOME_STATEMENT_BASELINES: &[&str] = &[
    "Revenue",
    "Cost of Goods Sold",
    "Gross Profit",
    "Operating Expenses",
    "Operating Income",
    "Net Income",
];

const CASH_FLOW_BASELINES: &[&str] = &[
    "Net Cash Provided by Operating Activities",
    "Net Cash Used in Investing Activities",
    "Net Cash Provided by Financing Activities",
    "Free Cash Flow",
];

const BALANCE_SHEET_BASELINES: &[&str] = &[
    "Total Assets",
    "Total Liabilities",
    "Total Equity",
    "Cash and Cash Equivalents",
    "Accounts Receivable",
    "Inventory",
    "Accounts Payable",
    "Allowance for Doubtful Accounts",
    "Deferred Tax Assets",
    "Deferred Tax Liabilities",
];

impl StatementType {
    /// Pipeline order: balance sheet, income statement, cash flow.
    pub const ALL: [StatementType; 3] = [
        StatementType::BalanceSheet,
        StatementType::IncomeStatement,
        StatementType::CashFlow,
    ];

    /// File-name stem used for raw, processed and tagged artifacts.
    pub fn slug(&self) -> &'static str {
        match self {
            StatementType::BalanceSheet => "balance_sheet",
            StatementType::IncomeStatement => "income_statement",
            StatementType::CashFlow => "cash_flow",
        }
    }

    /// Literal stamped into the `Statement Type` column of long-form output.
    pub fn label(&self) -> &'static str {
        match self {
            StatementType::BalanceSheet => "Balance Sheet",
            StatementType::IncomeStatement => "Income Statement",
            StatementType::CashFlow => "Cash Flow Statement",
        }
    }

    pub fn from_label(label: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|s| s.label() == label)
    }

    pub fn baseline_method(&self) -> BaselineMethod {
        match self {
            StatementType::BalanceSheet => BaselineMethod::Latest,
            StatementType::IncomeStatement | StatementType::CashFlow => BaselineMethod::Mean,
        }
    }

    /// Canonical categories that receive a baseline for this statement.
    pub fn baseline_categories(&self) -> &'static [&'static str] {
        match self {
            StatementType::BalanceSheet => BALANCE_SHEET_BASELINES,
            StatementType::IncomeStatement => INCOME_STATEMENT_BASELINES,
            StatementType::CashFlow => CASH_FLOW_BASELINES,
        }
    }

    /// Raw extracts list line items bottom-up; every statement is flipped back
    /// to top-down presentation.
    pub fn reverses_rows(&self) -> bool {
        match self {
            StatementType::BalanceSheet => true,
            StatementType::IncomeStatement => true,
            StatementType::CashFlow => true,
        }
    }
}

impl fmt::Display for StatementType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.slug())
    }
}

/// One (line item, period) observation of the combined table.
#[derive(Debug, Clone, PartialEq)]
pub struct LongFormRecord {
    pub category: String,
    pub statement_type: StatementType,
    pub period: String,
    pub amount: Cell,
}

/// Reference value of one canonical category within one statement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Baseline {
    #[schemars(description = "Canonical category name")]
    pub category: String,

    pub statement_type: StatementType,

    #[schemars(description = "Mean across periods for flow statements, latest period value for the balance sheet")]
    pub amount: f64,
}

/// A processed artifact that was renamed into the archive directory.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ArchiveEntry {
    pub original_path: PathBuf,

    #[schemars(description = "New location: {stem}_{YYYYMMDD_HHMMSS}.csv inside the archive directory")]
    pub archived_path: PathBuf,

    #[schemars(description = "Modification time of the file when it was archived")]
    pub modified: DateTime<Local>,
}
