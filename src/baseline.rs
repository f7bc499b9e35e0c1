use crate::combiner::{AMOUNT_COLUMN, STATEMENT_TYPE_COLUMN};
use crate::error::Result;
use crate::schema::{Baseline, BaselineMethod, LongFormRecord, StatementType};
use crate::table::{Cell, Table};
use crate::transformer::CATEGORY_COLUMN;
use crate::utils::{compare_periods, mean};
use log::{debug, info};
use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::path::Path;

/// Output order of the baseline table.
const BASELINE_ORDER: [StatementType; 3] = [
    StatementType::IncomeStatement,
    StatementType::CashFlow,
    StatementType::BalanceSheet,
];

/// Long-form row whose amount survived numeric coercion.
struct NumericRow<'a> {
    category: &'a str,
    period: &'a str,
    amount: f64,
}

pub struct BaselineCalculator;

impl BaselineCalculator {
    pub fn compute(records: &[LongFormRecord]) -> Vec<Baseline> {
        info!("Calculating baseline values for selected line items...");

        let mut baselines = Vec::new();
        for statement in BASELINE_ORDER {
            let allowed = statement.baseline_categories();
            let rows: Vec<NumericRow<'_>> = records
                .iter()
                .filter(|r| r.statement_type == statement)
                .filter(|r| allowed.contains(&r.category.as_str()))
                .filter_map(|r| {
                    r.amount.as_number().map(|amount| NumericRow {
                        category: &r.category,
                        period: &r.period,
                        amount,
                    })
                })
                .collect();

            let before = baselines.len();
            match statement.baseline_method() {
                BaselineMethod::Mean => Self::mean_by_category(statement, &rows, &mut baselines),
                BaselineMethod::Latest => Self::latest_by_category(statement, &rows, &mut baselines),
            }
            debug!(
                "[{}] baseline: {} values from {} numeric rows",
                statement,
                baselines.len() - before,
                rows.len()
            );
        }

        info!("Baseline calculated successfully: {} values", baselines.len());
        baselines
    }

    /// One row per category, sorted by category name.
    fn mean_by_category(statement: StatementType, rows: &[NumericRow<'_>], out: &mut Vec<Baseline>) {
        let mut grouped: BTreeMap<&str, Vec<f64>> = BTreeMap::new();
        for row in rows {
            grouped.entry(row.category).or_default().push(row.amount);
        }

        for (category, amounts) in grouped {
            if let Some(amount) = mean(&amounts) {
                out.push(Baseline {
                    category: category.to_string(),
                    statement_type: statement,
                    amount,
                });
            }
        }
    }

    /// Every row recorded at its category's latest period, in input order.
    fn latest_by_category(statement: StatementType, rows: &[NumericRow<'_>], out: &mut Vec<Baseline>) {
        let mut latest: BTreeMap<&str, &str> = BTreeMap::new();
        for row in rows {
            latest
                .entry(row.category)
                .and_modify(|period| {
                    if compare_periods(row.period, *period) == Ordering::Greater {
                        *period = row.period;
                    }
                })
                .or_insert(row.period);
        }

        for row in rows {
            if latest.get(row.category) == Some(&row.period) {
                out.push(Baseline {
                    category: row.category.to_string(),
                    statement_type: statement,
                    amount: row.amount,
                });
            }
        }
    }
}

pub fn compute_baselines(records: &[LongFormRecord]) -> Vec<Baseline> {
    BaselineCalculator::compute(records)
}

pub fn to_table(baselines: &[Baseline]) -> Table {
    let columns = vec![
        CATEGORY_COLUMN.to_string(),
        STATEMENT_TYPE_COLUMN.to_string(),
        AMOUNT_COLUMN.to_string(),
    ];
    let rows = baselines
        .iter()
        .map(|b| {
            vec![
                Cell::Text(b.category.clone()),
                Cell::Text(b.statement_type.label().to_string()),
                Cell::Number(b.amount),
            ]
        })
        .collect();
    Table::new(columns, rows)
}

pub fn write_baselines(baselines: &[Baseline], path: &Path) -> Result<()> {
    to_table(baselines).write_csv(path)?;
    info!("Baseline saved to {}", path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(statement: StatementType, category: &str, period: &str, amount: Cell) -> LongFormRecord {
        LongFormRecord {
            category: category.to_string(),
            statement_type: statement,
            period: period.to_string(),
            amount,
        }
    }

    #[test]
    fn test_flow_baseline_is_mean() {
        let records = vec![
            record(StatementType::IncomeStatement, "Revenue", "2023", Cell::Number(100.0)),
            record(StatementType::IncomeStatement, "Revenue", "2024", Cell::Number(110.0)),
            record(StatementType::IncomeStatement, "Cost of Goods Sold", "2023", Cell::Number(40.0)),
            record(StatementType::IncomeStatement, "Cost of Goods Sold", "2024", Cell::Number(42.0)),
            record(StatementType::CashFlow, "Free Cash Flow", "2023", Cell::Number(-3.0)),
            record(StatementType::CashFlow, "Free Cash Flow", "2024", Cell::Number(4.5)),
            record(StatementType::CashFlow, "Free Cash Flow", "2022", Cell::Number(1.5)),
        ];

        let baselines = compute_baselines(&records);
        assert_eq!(baselines.len(), 3);
        assert_eq!(baselines[0].category, "Cost of Goods Sold");
        assert!((baselines[0].amount - 41.0).abs() < 1e-9);
        assert_eq!(baselines[1].category, "Revenue");
        assert!((baselines[1].amount - 105.0).abs() < 1e-9);
        assert_eq!(baselines[2].statement_type, StatementType::CashFlow);
        assert!((baselines[2].amount - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_balance_sheet_takes_latest_period() {
        let records = vec![
            record(StatementType::BalanceSheet, "Total Assets", "2023-12-31", Cell::Number(500.0)),
            record(StatementType::BalanceSheet, "Total Assets", "2024-12-31", Cell::Number(650.0)),
            record(StatementType::BalanceSheet, "Inventory", "2022-12-31", Cell::Number(30.0)),
            record(StatementType::BalanceSheet, "Inventory", "2024-12-31", Cell::Blank),
        ];

        let baselines = compute_baselines(&records);
        assert_eq!(baselines.len(), 2);
        assert_eq!(baselines[0].category, "Total Assets");
        assert_eq!(baselines[0].amount, 650.0);
        // Non-numeric amounts are dropped before the latest period is chosen.
        assert_eq!(baselines[1].category, "Inventory");
        assert_eq!(baselines[1].amount, 30.0);
    }

    #[test]
    fn test_nan_spelled_amount_is_dropped_from_mean() {
        let records = vec![
            record(StatementType::IncomeStatement, "Revenue", "2023", Cell::parse("100")),
            record(StatementType::IncomeStatement, "Revenue", "2024", Cell::parse("-nan")),
            record(StatementType::IncomeStatement, "Revenue", "2022", Cell::parse("NAN")),
        ];
        let baselines = compute_baselines(&records);
        assert_eq!(baselines.len(), 1);
        assert_eq!(baselines[0].amount, 100.0);
    }

    #[test]
    fn test_allow_list_filters_categories() {
        let records = vec![
            record(StatementType::IncomeStatement, "Widget Royalties", "2024", Cell::Number(1.0)),
            record(StatementType::BalanceSheet, "Revenue", "2024", Cell::Number(1.0)),
            record(StatementType::CashFlow, "Net Income", "2024", Cell::Number(1.0)),
            record(StatementType::IncomeStatement, "Net Income", "2024", Cell::Text("n/m".into())),
        ];
        assert!(compute_baselines(&records).is_empty());
    }

    #[test]
    fn test_table_layout() {
        let baselines = vec![Baseline {
            category: "Revenue".into(),
            statement_type: StatementType::IncomeStatement,
            amount: 105.0,
        }];
        let table = to_table(&baselines);
        assert_eq!(table.columns, vec!["Category", "Statement Type", "Amount"]);
        assert_eq!(table.rows[0][2], Cell::Number(105.0));
    }
}
