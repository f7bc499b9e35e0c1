use crate::error::{PipelineError, Result};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct CanonicalCategory {
    #[schemars(description = "Normalized line-item name written to the 'Standardized Category' column")]
    pub name: String,

    #[schemars(description = "Known raw labels for this line item, in priority order")]
    pub aliases: Vec<String>,
}

impl CanonicalCategory {
    pub fn new(name: &str, aliases: &[&str]) -> Self {
        Self {
            name: name.to_string(),
            aliases: aliases.iter().map(|a| a.to_string()).collect(),
        }
    }
}

/// Ordered, immutable mapping of canonical category to aliases.
///
/// Iteration order is significant: when two categories score the same
/// against a label, the one listed first wins.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, JsonSchema)]
#[serde(transparent)]
pub struct CanonicalDictionary {
    categories: Vec<CanonicalCategory>,
}

impl CanonicalDictionary {
    pub fn new(categories: Vec<CanonicalCategory>) -> Result<Self> {
        let mut seen = HashSet::new();
        for category in &categories {
            if !seen.insert(category.name.as_str()) {
                return Err(PipelineError::DuplicateCategory(category.name.clone()));
            }
        }
        Ok(Self { categories })
    }

    pub fn builtin() -> Self {
        Self {
            categories: builtin_categories(),
        }
    }

    pub fn from_json_str(json: &str) -> Result<Self> {
        let categories: Vec<CanonicalCategory> = serde_json::from_str(json)?;
        Self::new(categories)
    }

    pub fn from_json_file(path: &Path) -> Result<Self> {
        if !path.is_file() {
            return Err(PipelineError::MissingFile {
                path: path.to_path_buf(),
            });
        }
        let json = std::fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }

    pub fn to_json(&self) -> std::result::Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    pub fn schema_as_json() -> std::result::Result<String, serde_json::Error> {
        let schema = schemars::schema_for!(CanonicalDictionary);
        serde_json::to_string_pretty(&schema)
    }

    pub fn categories(&self) -> &[CanonicalCategory] {
        &self.categories
    }

    pub fn get(&self, name: &str) -> Option<&CanonicalCategory> {
        self.categories.iter().find(|c| c.name == name)
    }

    pub fn len(&self) -> usize {
        self.categories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.categories.is_empty()
    }
}

impl Default for CanonicalDictionary {
    fn default() -> Self {
        Self::builtin()
    }
}

fn builtin_categories() -> Vec<CanonicalCategory> {
    vec![
        CanonicalCategory::new("Revenue", &["Revenue", "Total Revenue", "Net Revenue", "Sales"]),
        CanonicalCategory::new(
            "Cost of Goods Sold",
            &["Cost of Goods Sold", "COGS", "Cost of Sales", "Cost of Revenue"],
        ),
        CanonicalCategory::new("Gross Profit", &["Gross Profit", "Gross Income", "Gross Margin"]),
        CanonicalCategory::new(
            "Operating Expenses",
            &["Operating Expenses", "OPEX", "Total Operating Expenses"],
        ),
        CanonicalCategory::new(
            "Operating Income",
            &["Operating Income", "Operating Profit", "EBIT"],
        ),
        CanonicalCategory::new(
            "Net Income",
            &["Net Income", "Net Profit", "Income After Tax", "Earnings"],
        ),
        CanonicalCategory::new(
            "Research and Development",
            &["Research and Development", "R&D Expenses", "Research & Development"],
        ),
        CanonicalCategory::new(
            "Selling General and Administrative",
            &[
                "Selling General and Administrative",
                "SG&A",
                "Selling, General & Administrative",
            ],
        ),
        CanonicalCategory::new(
            "Interest Expense",
            &["Interest Expense", "Finance Costs", "Interest and Other Expenses"],
        ),
        CanonicalCategory::new(
            "Income Tax Expense",
            &["Income Tax Expense", "Taxes", "Provision for Income Taxes"],
        ),
        CanonicalCategory::new(
            "Other Income/Expense",
            &["Other Income/Expense", "Other Income", "Other Expense"],
        ),
        CanonicalCategory::new(
            "Total Operating Income",
            &["Total Operating Income", "Income from Operations"],
        ),
        CanonicalCategory::new("Total Assets", &["Total Assets", "Assets"]),
        CanonicalCategory::new("Total Liabilities", &["Total Liabilities", "Liabilities"]),
        CanonicalCategory::new(
            "Total Equity",
            &["Total Equity", "Shareholders' Equity", "Stockholders' Equity"],
        ),
        CanonicalCategory::new(
            "Cash and Cash Equivalents",
            &["Cash and Cash Equivalents", "Cash", "Cash Equivalents"],
        ),
        CanonicalCategory::new(
            "Short-Term Investments",
            &["Short-Term Investments", "Marketable Securities"],
        ),
        CanonicalCategory::new(
            "Accounts Receivable",
            &["Accounts Receivable", "Receivables", "Trade Receivables"],
        ),
        CanonicalCategory::new("Inventory", &["Inventory", "Inventories"]),
        CanonicalCategory::new(
            "Other Current Assets",
            &["Other Current Assets", "Prepaid Expenses"],
        ),
        CanonicalCategory::new(
            "Long-Term Investments",
            &["Long-Term Investments", "Non-Current Investments"],
        ),
        CanonicalCategory::new(
            "Property Plant and Equipment",
            &["Property, Plant & Equipment", "PP&E", "Fixed Assets"],
        ),
        CanonicalCategory::new("Goodwill", &["Goodwill"]),
        CanonicalCategory::new("Intangible Assets", &["Intangible Assets", "Intangibles"]),
        CanonicalCategory::new("Other Assets", &["Other Assets", "Miscellaneous Assets"]),
        CanonicalCategory::new(
            "Accounts Payable",
            &["Accounts Payable", "Payables", "Trade Payables"],
        ),
        CanonicalCategory::new(
            "Short-Term Debt",
            &["Short-Term Debt", "Current Portion of Long-Term Debt"],
        ),
        CanonicalCategory::new(
            "Other Current Liabilities",
            &["Other Current Liabilities", "Accrued Liabilities"],
        ),
        CanonicalCategory::new("Long-Term Debt", &["Long-Term Debt", "Non-Current Debt"]),
        CanonicalCategory::new("Deferred Tax Liabilities", &["Deferred Tax Liabilities", "DTL"]),
        CanonicalCategory::new("Deferred Tax Assets", &["Deferred Tax Assets", "DTA"]),
        CanonicalCategory::new(
            "Other Liabilities",
            &["Other Liabilities", "Miscellaneous Liabilities"],
        ),
        CanonicalCategory::new("Common Stock", &["Common Stock", "Ordinary Shares"]),
        CanonicalCategory::new(
            "Retained Earnings",
            &["Retained Earnings", "Accumulated Earnings"],
        ),
        CanonicalCategory::new(
            "Accumulated Other Comprehensive Income",
            &["Accumulated Other Comprehensive Income", "AOCI"],
        ),
        CanonicalCategory::new("Treasury Stock", &["Treasury Stock", "Treasury Shares"]),
        CanonicalCategory::new(
            "Allowance for Doubtful Accounts",
            &[
                "Allowance for Doubtful Accounts",
                "Bad Debt Allowance",
                "Provision for Credit Losses",
            ],
        ),
        CanonicalCategory::new(
            "Net Cash Provided by Operating Activities",
            &[
                "Net Cash Provided by Operating Activities",
                "Cash from Operating Activities",
                "Operating Cash Flow",
                "Net Cash from Operating Activities",
            ],
        ),
        CanonicalCategory::new(
            "Net Cash Used in Investing Activities",
            &[
                "Net Cash Used in Investing Activities",
                "Cash from Investing Activities",
                "Investing Cash Flow",
                "Net Cash from Investing Activities",
            ],
        ),
        CanonicalCategory::new(
            "Net Cash Provided by Financing Activities",
            &[
                "Net Cash Provided by Financing Activities",
                "Cash from Financing Activities",
                "Financing Cash Flow",
                "Net Cash from Financing Activities",
            ],
        ),
        CanonicalCategory::new(
            "Net Change in Cash",
            &["Net Change in Cash", "Change in Cash and Cash Equivalents"],
        ),
        CanonicalCategory::new(
            "Capital Expenditure",
            &[
                "Capital Expenditure",
                "CapEx",
                "Purchases of Property, Plant & Equipment",
            ],
        ),
        CanonicalCategory::new(
            "Depreciation and Amortization",
            &["Depreciation & Amortization", "D&A", "Depreciation", "Amortization"],
        ),
        CanonicalCategory::new("Free Cash Flow", &["Free Cash Flow", "FCF"]),
        CanonicalCategory::new("Dividends Paid", &["Dividends Paid", "Dividends"]),
        CanonicalCategory::new(
            "Stock Based Compensation",
            &["Stock-Based Compensation", "Share-Based Compensation"],
        ),
        CanonicalCategory::new(
            "Change in Working Capital",
            &["Change in Working Capital", "Working Capital Changes"],
        ),
        CanonicalCategory::new(
            "Other Non-Cash Items",
            &["Other Non-Cash Items", "Non-Cash Adjustments"],
        ),
    ]
}
