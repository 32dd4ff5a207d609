//! CLI integration tests for the backtest command orchestration.
//!
//! Tests cover:
//! - Config parsing (build_strategy_config, build_backtest_config, backtest_dates)
//! - Full pipeline with MockDataPort and a recording report port
//! - End-to-end with INI and CSV files on disk

mod common;

use common::*;
use sigtrader::adapters::csv_adapter::CsvAdapter;
use sigtrader::adapters::file_config_adapter::FileConfigAdapter;
use sigtrader::adapters::text_report_adapter::TextReportAdapter;
use sigtrader::cli::{self, Cli, PipelineRequest};
use sigtrader::domain::backtest::{BacktestConfig, BacktestResult};
use sigtrader::domain::config_validation::validate_backtest_config;
use sigtrader::domain::error::SigtraderError;
use sigtrader::domain::strategy::StrategyConfig;
use sigtrader::ports::report_port::ReportPort;
use std::cell::RefCell;
use std::io::Write;
use std::path::{Path, PathBuf};

fn write_temp_ini(content: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(content.as_bytes()).unwrap();
    file.flush().unwrap();
    file
}

const VALID_INI: &str = r#"
[backtest]
symbol = ACME
initial_value = 10000.0
start_date = 2024-01-01
end_date = 2024-12-31

[strategy]
use_sma = true
use_ema = false
use_rsi = false
use_macd = false
short_window = 2
long_window = 3
use_stop_loss = false
stop_loss_pct = 1.0

[report]
output = report.txt
"#;

struct RecordingReportPort {
    written: RefCell<Vec<(String, PathBuf, usize)>>,
}

impl RecordingReportPort {
    fn new() -> Self {
        Self {
            written: RefCell::new(Vec::new()),
        }
    }
}

impl ReportPort for RecordingReportPort {
    fn write(
        &self,
        symbol: &str,
        result: &BacktestResult,
        _strategy: &StrategyConfig,
        output_path: &Path,
    ) -> Result<(), SigtraderError> {
        self.written.borrow_mut().push((
            symbol.to_string(),
            output_path.to_path_buf(),
            result.ledger.completed_trades(),
        ));
        Ok(())
    }
}

mod config_loading {
    use super::*;

    #[test]
    fn valid_ini_builds_both_configs() {
        let file = write_temp_ini(VALID_INI);
        let adapter = FileConfigAdapter::from_file(file.path()).unwrap();

        validate_backtest_config(&adapter).unwrap();
        let strategy = cli::build_strategy_config(&adapter).unwrap();
        let bt = cli::build_backtest_config(&adapter).unwrap();
        let (start, end) = cli::backtest_dates(&adapter).unwrap();

        assert_eq!(strategy.enabled().len(), 1);
        assert_eq!(strategy.params().short_window, 2);
        assert_eq!(strategy.params().long_window, 3);
        assert_eq!(strategy.stop_loss_pct(), None);
        assert_eq!(bt.initial_value, 10000.0);
        assert_eq!(start, date(2024, 1, 1));
        assert_eq!(end, date(2024, 12, 31));
        assert_eq!(cli::resolve_symbol(None, &adapter), "ACME");
    }

    #[test]
    fn inverted_rsi_thresholds_rejected() {
        let adapter = FileConfigAdapter::from_string(
            "[strategy]\nrsi_oversold = 80\nrsi_overbought = 20\n",
        )
        .unwrap();
        let err = cli::build_strategy_config(&adapter).unwrap_err();
        assert!(matches!(err, SigtraderError::InvalidConfiguration { .. }));
    }

    #[test]
    fn missing_dates_reported_as_missing_keys() {
        let adapter = FileConfigAdapter::from_string("[backtest]\nsymbol = ACME\n").unwrap();
        let err = cli::backtest_dates(&adapter).unwrap_err();
        assert!(matches!(err, SigtraderError::ConfigMissing { key, .. } if key == "start_date"));
    }

    #[test]
    fn load_config_missing_file_returns_exit_code() {
        let result = cli::load_config(Path::new("/nonexistent/sigtrader.ini"));
        assert!(result.is_err());
    }
}

mod pipeline {
    use super::*;

    fn request<'a>(
        strategy: &'a StrategyConfig,
        bt_config: &'a BacktestConfig,
        output: Option<&'a Path>,
    ) -> PipelineRequest<'a> {
        PipelineRequest {
            symbol: "ACME",
            start_date: date(2024, 1, 1),
            end_date: date(2024, 1, 31),
            strategy,
            bt_config,
            output,
        }
    }

    #[test]
    fn pipeline_runs_and_writes_report() {
        let port = MockDataPort::new()
            .with_bars("ACME", bars_from_closes(&[10.0, 11.0, 12.0, 9.0, 8.0, 13.0, 14.0]));
        let reporter = RecordingReportPort::new();
        let strategy = sma_only(2, 3);
        let bt = BacktestConfig::default();
        let out = PathBuf::from("out.txt");

        let req = request(&strategy, &bt, Some(out.as_path()));
        let result =
            cli::run_backtest_pipeline(&port, Some(&reporter as &dyn ReportPort), &req).unwrap();

        assert_eq!(result.bars_processed, 7);
        assert_eq!(result.ledger.completed_trades(), 1);
        let written = reporter.written.borrow();
        assert_eq!(written.len(), 1);
        assert_eq!(written[0], ("ACME".to_string(), out.clone(), 1));
    }

    #[test]
    fn pipeline_without_output_skips_report() {
        let port = MockDataPort::new().with_bars("ACME", bars_from_closes(&[1.0, 2.0, 3.0]));
        let reporter = RecordingReportPort::new();
        let strategy = sma_only(2, 3);
        let bt = BacktestConfig::default();

        let req = request(&strategy, &bt, None);
        cli::run_backtest_pipeline(&port, Some(&reporter as &dyn ReportPort), &req).unwrap();
        assert!(reporter.written.borrow().is_empty());
    }

    #[test]
    fn pipeline_rejects_empty_range() {
        let port = MockDataPort::new();
        let strategy = sma_only(2, 3);
        let bt = BacktestConfig::default();

        let req = request(&strategy, &bt, None);
        let err = cli::run_backtest_pipeline(&port, None, &req).unwrap_err();
        assert!(matches!(err, SigtraderError::EmptyInputData));
    }

    #[test]
    fn pipeline_propagates_data_errors() {
        let port = MockDataPort::new().with_error("ACME", "disk on fire");
        let strategy = sma_only(2, 3);
        let bt = BacktestConfig::default();

        let req = request(&strategy, &bt, None);
        let err = cli::run_backtest_pipeline(&port, None, &req).unwrap_err();
        assert!(matches!(err, SigtraderError::Data { .. }));
    }
}

mod end_to_end {
    use super::*;
    use clap::Parser;

    #[test]
    fn csv_and_text_report_on_disk() {
        let dir = tempfile::TempDir::new().unwrap();
        write_csv(
            dir.path(),
            "ACME",
            &bars_from_closes(&[10.0, 11.0, 12.0, 9.0, 8.0, 13.0, 14.0]),
        );

        let data_port = CsvAdapter::new(dir.path().to_path_buf());
        let reporter = TextReportAdapter::new();
        let strategy = sma_only(2, 3);
        let bt = BacktestConfig::default();
        let out = dir.path().join("report.txt");

        let request = PipelineRequest {
            symbol: "ACME",
            start_date: date(2024, 1, 1),
            end_date: date(2024, 12, 31),
            strategy: &strategy,
            bt_config: &bt,
            output: Some(out.as_path()),
        };
        let result =
            cli::run_backtest_pipeline(&data_port, Some(&reporter as &dyn ReportPort), &request)
                .unwrap();
        assert_eq!(result.ledger.total_buy_trades(), 2);

        let report = std::fs::read_to_string(&out).unwrap();
        assert!(report.contains("Backtest report: ACME"));
        assert!(report.contains("2024-01-04, SELL EXECUTED, 9.00"));
        assert!(report.contains("2024-01-07, Maximum Drawdown: 0.00"));
    }

    #[test]
    fn backtest_command_exits_successfully() {
        let dir = tempfile::TempDir::new().unwrap();
        write_csv(
            dir.path(),
            "ACME",
            &bars_from_closes(&[10.0, 11.0, 12.0, 9.0, 8.0, 13.0, 14.0]),
        );
        let ini = write_temp_ini(VALID_INI);
        let out = dir.path().join("cli_report.txt");

        let cli_args = Cli::try_parse_from([
            "sigtrader".to_string(),
            "backtest".to_string(),
            "-c".to_string(),
            ini.path().display().to_string(),
            "--data-dir".to_string(),
            dir.path().display().to_string(),
            "-o".to_string(),
            out.display().to_string(),
        ])
        .unwrap();

        let code = cli::run(cli_args);
        assert_eq!(
            format!("{code:?}"),
            format!("{:?}", std::process::ExitCode::SUCCESS)
        );
        assert!(out.exists());
    }

    #[test]
    fn backtest_command_with_unknown_symbol_fails_with_data_code() {
        let dir = tempfile::TempDir::new().unwrap();
        let ini = write_temp_ini(VALID_INI);

        let cli_args = Cli::try_parse_from([
            "sigtrader".to_string(),
            "backtest".to_string(),
            "-c".to_string(),
            ini.path().display().to_string(),
            "--data-dir".to_string(),
            dir.path().display().to_string(),
            "--symbol".to_string(),
            "NOPE".to_string(),
        ])
        .unwrap();

        let code = cli::run(cli_args);
        assert_eq!(
            format!("{code:?}"),
            format!("{:?}", std::process::ExitCode::from(3))
        );
    }

    #[test]
    fn csv_with_non_positive_closes_is_rejected() {
        let dir = tempfile::TempDir::new().unwrap();
        std::fs::write(
            dir.path().join("ACME.csv"),
            "Date,Open,High,Low,Close,Volume\n\
             2024-01-01,1,1,1,-1,10\n\
             2024-01-02,1,1,1,0,10\n\
             2024-01-03,1,1,1,-1,10\n",
        )
        .unwrap();

        let data_port = CsvAdapter::new(dir.path().to_path_buf());
        let strategy = sma_only(1, 2);
        let bt = BacktestConfig::default();
        let request = PipelineRequest {
            symbol: "ACME",
            start_date: date(2024, 1, 1),
            end_date: date(2024, 12, 31),
            strategy: &strategy,
            bt_config: &bt,
            output: None,
        };
        let err = cli::run_backtest_pipeline(&data_port, None, &request).unwrap_err();
        assert!(matches!(err, SigtraderError::InvalidPrice { index: 0, .. }));

        let ini = write_temp_ini(VALID_INI);
        let cli_args = Cli::try_parse_from([
            "sigtrader".to_string(),
            "backtest".to_string(),
            "-c".to_string(),
            ini.path().display().to_string(),
            "--data-dir".to_string(),
            dir.path().display().to_string(),
        ])
        .unwrap();
        let code = cli::run(cli_args);
        assert_eq!(
            format!("{code:?}"),
            format!("{:?}", std::process::ExitCode::from(3))
        );
    }

    #[test]
    fn csv_with_nan_close_fails_to_load() {
        let dir = tempfile::TempDir::new().unwrap();
        std::fs::write(
            dir.path().join("ACME.csv"),
            "Date,Open,High,Low,Close,Volume\n2024-01-01,1,1,1,NaN,10\n",
        )
        .unwrap();

        let data_port = CsvAdapter::new(dir.path().to_path_buf());
        let strategy = sma_only(1, 2);
        let bt = BacktestConfig::default();
        let request = PipelineRequest {
            symbol: "ACME",
            start_date: date(2024, 1, 1),
            end_date: date(2024, 12, 31),
            strategy: &strategy,
            bt_config: &bt,
            output: None,
        };
        let err = cli::run_backtest_pipeline(&data_port, None, &request).unwrap_err();
        assert!(matches!(err, SigtraderError::Data { .. }));
    }

    #[test]
    fn validate_command_accepts_valid_ini() {
        let ini = write_temp_ini(VALID_INI);
        let cli_args = Cli::try_parse_from([
            "sigtrader".to_string(),
            "validate".to_string(),
            "-c".to_string(),
            ini.path().display().to_string(),
        ])
        .unwrap();
        let code = cli::run(cli_args);
        assert_eq!(
            format!("{code:?}"),
            format!("{:?}", std::process::ExitCode::SUCCESS)
        );
    }
}
