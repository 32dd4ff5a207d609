//! CLI definition and dispatch.

use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::warn;

use crate::adapters::csv_adapter::CsvAdapter;
use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::adapters::text_report_adapter::TextReportAdapter;
use crate::domain::backtest::{self as backtest_engine, BacktestConfig, BacktestResult};
pub use crate::domain::config_validation::backtest_dates;
use crate::domain::config_validation::{initial_value, validate_backtest_config};
use crate::domain::error::SigtraderError;
use crate::domain::strategy::{StrategyConfig, StrategyParams};
use crate::ports::config_port::ConfigPort;
use crate::ports::data_port::DataPort;
use crate::ports::report_port::ReportPort;

const DEFAULT_DATA_DIR: &str = "data";

#[derive(Parser, Debug)]
#[command(name = "sigtrader", about = "Indicator-driven single-symbol backtester")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run a backtest
    Backtest {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(long)]
        symbol: Option<String>,
        #[arg(long)]
        data_dir: Option<PathBuf>,
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Validate a configuration file
    Validate {
        #[arg(short, long)]
        config: PathBuf,
    },
    /// List symbols available in a data directory
    ListSymbols {
        #[arg(long)]
        data_dir: PathBuf,
    },
}

pub fn run(cli: Cli) -> ExitCode {
    match cli.command {
        Command::Backtest {
            config,
            symbol,
            data_dir,
            output,
        } => run_backtest(&config, symbol.as_deref(), data_dir.as_ref(), output.as_ref()),
        Command::Validate { config } => run_validate(&config),
        Command::ListSymbols { data_dir } => run_list_symbols(&data_dir),
    }
}

pub fn load_config(path: &Path) -> Result<FileConfigAdapter, ExitCode> {
    FileConfigAdapter::from_file(path).map_err(|err| {
        eprintln!("error: {err}");
        ExitCode::from(&err)
    })
}

fn fail(err: SigtraderError) -> ExitCode {
    eprintln!("error: {err}");
    (&err).into()
}

fn run_backtest(
    config_path: &Path,
    symbol_override: Option<&str>,
    data_dir_override: Option<&PathBuf>,
    output_override: Option<&PathBuf>,
) -> ExitCode {
    eprintln!("Loading config from {}", config_path.display());
    let adapter = match load_config(config_path) {
        Ok(a) => a,
        Err(code) => return code,
    };

    if let Err(e) = validate_backtest_config(&adapter) {
        return fail(e);
    }

    let strategy = match build_strategy_config(&adapter) {
        Ok(s) => s,
        Err(e) => return fail(e),
    };
    let bt_config = match build_backtest_config(&adapter) {
        Ok(c) => c,
        Err(e) => return fail(e),
    };
    let (start_date, end_date) = match backtest_dates(&adapter) {
        Ok(range) => range,
        Err(e) => return fail(e),
    };

    let symbol = resolve_symbol(symbol_override, &adapter);
    if symbol.is_empty() {
        eprintln!("error: no symbol configured");
        return ExitCode::from(2);
    }

    let data_dir = data_dir_override.cloned().unwrap_or_else(|| {
        adapter
            .get_string("backtest", "data_dir")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_DATA_DIR))
    });
    let output = output_override
        .cloned()
        .or_else(|| adapter.get_string("report", "output").map(PathBuf::from));

    let data_port = CsvAdapter::new(data_dir);
    let report_port = TextReportAdapter::new();

    let request = PipelineRequest {
        symbol: &symbol,
        start_date,
        end_date,
        strategy: &strategy,
        bt_config: &bt_config,
        output: output.as_deref(),
    };

    match run_backtest_pipeline(&data_port, Some(&report_port as &dyn ReportPort), &request) {
        Ok(result) => {
            print_summary(&symbol, &result);
            if let Some(path) = &output {
                eprintln!("\nReport written to: {}", path.display());
            }
            ExitCode::SUCCESS
        }
        Err(e) => fail(e),
    }
}

/// Read the `[strategy]` section into a validated [`StrategyConfig`].
/// Missing keys fall back to the defaults of [`StrategyParams`].
pub fn build_strategy_config(adapter: &dyn ConfigPort) -> Result<StrategyConfig, SigtraderError> {
    let d = StrategyParams::default();
    let period = |key: &str, default: usize| -> Result<usize, SigtraderError> {
        let raw = adapter.get_int("strategy", key, default as i64);
        usize::try_from(raw).map_err(|_| {
            SigtraderError::invalid(key, format!("period must be at least 1, got {raw}"))
        })
    };

    let params = StrategyParams {
        use_sma: adapter.get_bool("strategy", "use_sma", d.use_sma),
        use_ema: adapter.get_bool("strategy", "use_ema", d.use_ema),
        use_rsi: adapter.get_bool("strategy", "use_rsi", d.use_rsi),
        use_macd: adapter.get_bool("strategy", "use_macd", d.use_macd),
        short_window: period("short_window", d.short_window)?,
        long_window: period("long_window", d.long_window)?,
        rsi_period: period("rsi_period", d.rsi_period)?,
        rsi_overbought: adapter.get_double("strategy", "rsi_overbought", d.rsi_overbought),
        rsi_oversold: adapter.get_double("strategy", "rsi_oversold", d.rsi_oversold),
        use_stop_loss: adapter.get_bool("strategy", "use_stop_loss", d.use_stop_loss),
        stop_loss_pct: adapter.get_double("strategy", "stop_loss_pct", d.stop_loss_pct),
        macd_short: period("macd_short", d.macd_short)?,
        macd_long: period("macd_long", d.macd_long)?,
        macd_signal: period("macd_signal", d.macd_signal)?,
    };

    StrategyConfig::new(params)
}

pub fn build_backtest_config(adapter: &dyn ConfigPort) -> Result<BacktestConfig, SigtraderError> {
    Ok(BacktestConfig {
        initial_value: initial_value(adapter)?,
    })
}

pub fn resolve_symbol(symbol_override: Option<&str>, config: &dyn ConfigPort) -> String {
    symbol_override
        .map(str::to_string)
        .or_else(|| config.get_string("backtest", "symbol"))
        .map(|s| s.trim().to_string())
        .unwrap_or_default()
}

/// Everything the pipeline needs besides its ports.
pub struct PipelineRequest<'a> {
    pub symbol: &'a str,
    pub start_date: chrono::NaiveDate,
    pub end_date: chrono::NaiveDate,
    pub strategy: &'a StrategyConfig,
    pub bt_config: &'a BacktestConfig,
    pub output: Option<&'a Path>,
}

/// Fetch bars, run the backtest and, when both a report port and an output
/// path are given, write the report.
pub fn run_backtest_pipeline(
    data_port: &dyn DataPort,
    report_port: Option<&dyn ReportPort>,
    request: &PipelineRequest<'_>,
) -> Result<BacktestResult, SigtraderError> {
    let bars = data_port.fetch_bars(request.symbol, request.start_date, request.end_date)?;
    if bars.is_empty() {
        warn!(
            symbol = request.symbol,
            start = %request.start_date,
            end = %request.end_date,
            "no bars in range"
        );
    }

    eprintln!(
        "Running backtest: {} ({} bars, {} to {})",
        request.symbol,
        bars.len(),
        request.start_date,
        request.end_date
    );

    let result = backtest_engine::run_backtest(&bars, request.strategy, request.bt_config)?;

    if let (Some(port), Some(path)) = (report_port, request.output) {
        port.write(request.symbol, &result, request.strategy, path)?;
    }

    Ok(result)
}

fn print_summary(symbol: &str, result: &BacktestResult) {
    eprintln!("\n=== Results: {} ===", symbol);
    eprintln!("Initial Value:    {:.2}", result.account.initial_value);
    eprintln!("Final Value:      {:.2}", result.account.final_value);
    eprintln!("Net P/L:          {:.2}", result.account.net_profit_loss);
    eprintln!("Buy Executions:   {}", result.ledger.total_buy_trades());
    eprintln!("Sell Executions:  {}", result.ledger.total_sell_trades());
    eprintln!("Win Rate:         {:.2}%", result.report.win_rate);
    eprintln!("Sharpe Ratio:     {:.2}", result.report.sharpe_ratio);
    eprintln!("Max Drawdown:     {:.2}", result.report.max_drawdown);
    if let Some(pos) = &result.open_position {
        eprintln!(
            "Open Position:    entered {} at {:.2}",
            pos.entry_date, pos.entry_price
        );
    }
}

fn run_validate(config_path: &Path) -> ExitCode {
    eprintln!("Validating config: {}", config_path.display());
    let adapter = match load_config(config_path) {
        Ok(a) => a,
        Err(code) => return code,
    };

    if let Err(e) = validate_backtest_config(&adapter) {
        return fail(e);
    }
    let strategy = match build_strategy_config(&adapter) {
        Ok(s) => s,
        Err(e) => return fail(e),
    };

    let families: Vec<String> = strategy.enabled().iter().map(|f| f.to_string()).collect();
    eprintln!("\nSymbol:     {}", resolve_symbol(None, &adapter));
    if families.is_empty() {
        eprintln!("Indicators: none (no signals will fire)");
    } else {
        eprintln!("Indicators: {}", families.join(", "));
    }
    match strategy.stop_loss_pct() {
        Some(pct) => eprintln!("Stop-loss:  {:.2}%", pct),
        None => eprintln!("Stop-loss:  off"),
    }

    eprintln!("\nConfiguration is valid.");
    ExitCode::SUCCESS
}

fn run_list_symbols(data_dir: &Path) -> ExitCode {
    let adapter = CsvAdapter::new(data_dir.to_path_buf());

    let symbols = match adapter.list_symbols() {
        Ok(s) => s,
        Err(e) => return fail(e),
    };

    if symbols.is_empty() {
        eprintln!("No symbols found in {}", data_dir.display());
        return ExitCode::SUCCESS;
    }

    for symbol in &symbols {
        match adapter.get_data_range(symbol) {
            Ok(Some((first, last, count))) => {
                println!("{}: {} bars, {} to {}", symbol, count, first, last);
            }
            Ok(None) => println!("{}: no data", symbol),
            Err(e) => eprintln!("error reading {}: {}", symbol, e),
        }
    }
    eprintln!("{} symbols found", symbols.len());
    ExitCode::SUCCESS
}
