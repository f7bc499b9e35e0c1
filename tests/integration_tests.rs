use filetime::FileTime;
use statement_normalizer::*;
use std::fs;
use std::path::Path;
use std::time::{Duration, SystemTime};
use tempfile::TempDir;

const BALANCE_SHEET: &str = "\
,2022-12-31,2023-12-31,2024-12-31
Total Equity,250,260,300
Total Liabilities,150,240,350
Cash,80,90,120
Total Assets,400,500,650
";

// Raw extracts list line items bottom-up.
const INCOME_STATEMENT: &str = "\
,2023,2024
COGS,40,42
Sales,100,110
";

const CASH_FLOW: &str = "\
Line Item,2023,2024
Free Cash Flow,12,18
Net Cash Used in Investing Activities,-30,-10
Net Cash Provided by Operating Activities,42,28
";

fn project() -> (TempDir, PipelineConfig) {
    let temp = TempDir::new().unwrap();
    let config = PipelineConfig::with_project_root(temp.path());
    (temp, config)
}

fn write_raw(config: &PipelineConfig, statement: StatementType, csv: &str) {
    let paths = config.paths();
    fs::create_dir_all(&paths.raw_dir).unwrap();
    fs::write(paths.raw_file(statement), csv).unwrap();
}

fn write_all_raw(config: &PipelineConfig) {
    write_raw(config, StatementType::BalanceSheet, BALANCE_SHEET);
    write_raw(config, StatementType::IncomeStatement, INCOME_STATEMENT);
    write_raw(config, StatementType::CashFlow, CASH_FLOW);
}

fn file_names(dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = fs::read_dir(dir)
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    names
}

fn baseline<'a>(report: &'a PipelineReport, statement: StatementType, category: &str) -> Vec<&'a Baseline> {
    report
        .baselines
        .iter()
        .filter(|b| b.statement_type == statement && b.category == category)
        .collect()
}

#[test]
fn test_end_to_end_pipeline() {
    let (_temp, config) = project();
    write_all_raw(&config);

    let report = run_pipeline(&config).expect("pipeline should complete");

    assert!(report.failed_statements().is_empty());
    assert_eq!(report.combined_rows, 4 * 3 + 2 * 2 + 3 * 2);

    let revenue = baseline(&report, StatementType::IncomeStatement, "Revenue");
    assert_eq!(revenue.len(), 1);
    assert!((revenue[0].amount - 105.0).abs() < 1e-9);

    let cogs = baseline(&report, StatementType::IncomeStatement, "Cost of Goods Sold");
    assert_eq!(cogs.len(), 1);
    assert!((cogs[0].amount - 41.0).abs() < 1e-9);

    let operating = baseline(
        &report,
        StatementType::CashFlow,
        "Net Cash Provided by Operating Activities",
    );
    assert!((operating[0].amount - 35.0).abs() < 1e-9);

    let cash = baseline(&report, StatementType::BalanceSheet, "Cash and Cash Equivalents");
    assert_eq!(cash.len(), 1);
    assert_eq!(cash[0].amount, 120.0);

    let assets = baseline(&report, StatementType::BalanceSheet, "Total Assets");
    assert_eq!(assets[0].amount, 650.0);

    // Income first, then cash flow, then balance sheet.
    assert_eq!(report.baselines[0].statement_type, StatementType::IncomeStatement);
    assert_eq!(
        report.baselines.last().unwrap().statement_type,
        StatementType::BalanceSheet
    );
}

#[test]
fn test_combined_output_file() {
    let (_temp, config) = project();
    write_all_raw(&config);
    run_pipeline(&config).unwrap();

    let combined = Table::read_csv(&config.paths().combined_file()).unwrap();
    assert_eq!(combined.columns, vec!["Category", "Statement Type", "Period", "Amount"]);
    assert_eq!(combined.len(), 22);

    let income: Vec<(String, String, f64)> = combined
        .rows
        .iter()
        .filter(|row| row[1] == Cell::Text("Income Statement".into()))
        .map(|row| (row[0].to_string(), row[2].to_string(), row[3].as_number().unwrap()))
        .collect();

    assert_eq!(
        income,
        vec![
            ("Revenue".to_string(), "2024".to_string(), 110.0),
            ("Cost of Goods Sold".to_string(), "2024".to_string(), 42.0),
            ("Revenue".to_string(), "2023".to_string(), 100.0),
            ("Cost of Goods Sold".to_string(), "2023".to_string(), 40.0),
        ]
    );

    let baselines = Table::read_csv(&config.paths().baseline_file()).unwrap();
    assert_eq!(baselines.columns, vec!["Category", "Statement Type", "Amount"]);
}

#[test]
fn test_processed_artifacts_are_archived() {
    let (_temp, config) = project();
    write_all_raw(&config);
    let paths = config.paths();

    let report = run_pipeline(&config).unwrap();

    assert_eq!(report.archive.archived.len(), 6);
    assert!(report.archive.failures.is_empty());
    assert_eq!(report.prune.removed(), 0);

    assert_eq!(
        file_names(&paths.processed_dir),
        vec!["archive", "baseline_values.csv", "combined_statements.csv"]
    );

    let archived = file_names(&paths.processed_archive_dir);
    assert_eq!(archived.len(), 6);
    assert!(archived.iter().all(|name| name.ends_with(".csv")));
    assert!(archived.iter().any(|name| name.starts_with("tagged_income_statement_")));
    assert!(archived.iter().any(|name| name.starts_with("processed_balance_sheet_")));

    // Raw inputs are left in place.
    assert_eq!(file_names(&paths.raw_dir).len(), 4);
}

#[test]
fn test_second_run_archives_previous_outputs() {
    let (_temp, config) = project();
    write_all_raw(&config);
    let paths = config.paths();

    run_pipeline(&config).unwrap();
    let report = run_pipeline(&config).unwrap();

    let originals: Vec<String> = report
        .archive
        .archived
        .iter()
        .map(|e| e.original_path.file_name().unwrap().to_string_lossy().into_owned())
        .collect();
    assert_eq!(originals.len(), 8);
    assert!(originals.contains(&"combined_statements.csv".to_string()));
    assert!(originals.contains(&"baseline_values.csv".to_string()));

    assert!(file_names(&paths.processed_archive_dir)
        .iter()
        .any(|name| name.starts_with("combined_statements_")));
    assert!(paths.combined_file().is_file());
}

#[test]
fn test_stale_archive_files_are_pruned() {
    let (_temp, config) = project();
    write_all_raw(&config);
    let paths = config.paths();
    paths.ensure().unwrap();

    let stale = paths
        .processed_archive_dir
        .join("tagged_cash_flow_20240101_000000.csv");
    fs::write(&stale, "Category,2023\n").unwrap();
    let forty_days_ago = SystemTime::now() - Duration::from_secs(40 * 24 * 60 * 60);
    filetime::set_file_mtime(&stale, FileTime::from_system_time(forty_days_ago)).unwrap();

    let report = run_pipeline(&config).unwrap();

    assert_eq!(report.prune.expired, vec![stale.clone()]);
    assert!(!stale.exists());
}

#[test]
fn test_failed_statement_halts_before_combination() {
    let (_temp, config) = project();
    write_raw(&config, StatementType::BalanceSheet, BALANCE_SHEET);
    write_raw(&config, StatementType::IncomeStatement, INCOME_STATEMENT);
    write_raw(&config, StatementType::CashFlow, ",2023,2024\n,,\n");
    let paths = config.paths();

    let err = run_pipeline(&config).unwrap_err();
    match err {
        PipelineError::MissingFile { path } => {
            assert_eq!(path, paths.tagged_file(StatementType::CashFlow))
        }
        other => panic!("expected MissingFile, got {other:?}"),
    }

    // Siblings still produced their artifacts.
    assert!(paths.tagged_file(StatementType::BalanceSheet).is_file());
    assert!(paths.tagged_file(StatementType::IncomeStatement).is_file());
    assert!(!paths.combined_file().exists());
    assert!(!paths.baseline_file().exists());
}

#[test]
fn test_statement_outcomes_name_the_failure() {
    let (_temp, config) = project();
    write_raw(&config, StatementType::BalanceSheet, BALANCE_SHEET);
    write_raw(&config, StatementType::CashFlow, ",2024\nFree Cash Flow,pending\n");

    let pipeline = Pipeline::new(config).unwrap();
    pipeline.paths().ensure().unwrap();
    let outcomes = pipeline.transform_statements();

    assert!(outcomes[0].is_completed());
    match &outcomes[1] {
        StatementOutcome::Failed {
            statement,
            operation,
            error,
        } => {
            assert_eq!(*statement, StatementType::IncomeStatement);
            assert_eq!(*operation, "load");
            assert!(matches!(error, PipelineError::MissingFile { .. }));
        }
        other => panic!("expected a failed income statement, got {other:?}"),
    }
    match &outcomes[2] {
        StatementOutcome::Failed {
            operation, error, ..
        } => {
            assert_eq!(*operation, "validate");
            assert!(matches!(error, PipelineError::NoNumericColumn { .. }));
        }
        other => panic!("expected a failed cash flow, got {other:?}"),
    }
}

#[test]
fn test_custom_dictionary_from_config() {
    let temp = TempDir::new().unwrap();
    fs::write(
        temp.path().join("dictionary.json"),
        r#"[{"name": "Turnover Total", "aliases": ["Turnover"]}]"#,
    )
    .unwrap();
    let config = PipelineConfig::from_json_str(&format!(
        r#"{{"project_root": {}, "dictionary": "dictionary.json"}}"#,
        serde_json::to_string(&temp.path()).unwrap()
    ))
    .unwrap();

    write_raw(&config, StatementType::BalanceSheet, BALANCE_SHEET);
    write_raw(&config, StatementType::IncomeStatement, ",2024\nTurnover,900\nZzyzx Qwv,1\n");
    write_raw(&config, StatementType::CashFlow, CASH_FLOW);

    let pipeline = Pipeline::new(config).unwrap();
    pipeline.paths().ensure().unwrap();
    pipeline.transform_statements();

    let tagged = Table::read_csv(&pipeline.paths().tagged_file(StatementType::IncomeStatement)).unwrap();
    let standardized = tagged.column_index("Standardized Category").unwrap();
    let labels: Vec<String> = tagged.column(standardized).map(Cell::to_string).collect();
    assert_eq!(labels, vec!["Zzyzx Qwv", "Turnover Total"]);
}
