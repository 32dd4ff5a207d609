//! Backtest driver: a single synchronous pass over the bars.
//!
//! Each bar flows through the indicator set, then the position machine. The
//! ledger is handed to the metrics once the last bar is processed. A position
//! still open at the end is not closed and contributes no trade.

use tracing::info;

use crate::domain::error::SigtraderError;
use crate::domain::indicator::IndicatorSet;
use crate::domain::ledger::TradeLedger;
use crate::domain::metrics::{AccountSummary, PerformanceReport, TradeStats};
use crate::domain::ohlcv::{check_bar_order, OhlcvBar};
use crate::domain::position::{Position, PositionMachine};
use crate::domain::strategy::StrategyConfig;

pub const DEFAULT_INITIAL_VALUE: f64 = 1_000_000.0;

#[derive(Debug, Clone, PartialEq)]
pub struct BacktestConfig {
    pub initial_value: f64,
}

impl Default for BacktestConfig {
    fn default() -> Self {
        BacktestConfig {
            initial_value: DEFAULT_INITIAL_VALUE,
        }
    }
}

#[derive(Debug, Clone)]
pub struct BacktestResult {
    pub ledger: TradeLedger,
    pub report: PerformanceReport,
    pub stats: TradeStats,
    pub account: AccountSummary,
    pub open_position: Option<Position>,
    pub bars_processed: usize,
}

impl BacktestResult {
    pub fn log_lines(&self) -> &[String] {
        self.ledger.log_lines()
    }
}

/// Run with the default account settings.
pub fn run(bars: &[OhlcvBar], strategy: &StrategyConfig) -> Result<BacktestResult, SigtraderError> {
    run_backtest(bars, strategy, &BacktestConfig::default())
}

pub fn run_backtest(
    bars: &[OhlcvBar],
    strategy: &StrategyConfig,
    config: &BacktestConfig,
) -> Result<BacktestResult, SigtraderError> {
    check_bar_order(bars)?;

    info!(
        bars = bars.len(),
        families = strategy.enabled().len(),
        "starting backtest"
    );

    let mut indicators = IndicatorSet::new(strategy);
    let mut machine = PositionMachine::new(strategy);
    let mut ledger = TradeLedger::new();

    for bar in bars {
        ledger.log(bar.date, format!("Close, {:.2}", bar.close));
        let snapshot = indicators.update(bar);
        machine.on_bar(bar, &snapshot, strategy, &mut ledger)?;
    }

    let report = PerformanceReport::compute(&ledger);
    let stats = TradeStats::compute(&ledger);
    let account = AccountSummary::from_ledger(&ledger, config.initial_value);

    let last_date = bars[bars.len() - 1].date;
    ledger.log(last_date, format!("Win Rate: {:.2}%", report.win_rate));
    ledger.log(last_date, format!("Sharpe Ratio: {:.2}", report.sharpe_ratio));
    ledger.log(last_date, format!("Maximum Drawdown: {:.2}", report.max_drawdown));

    info!(
        buys = ledger.total_buy_trades(),
        sells = ledger.total_sell_trades(),
        win_rate = report.win_rate,
        "backtest complete"
    );

    Ok(BacktestResult {
        ledger,
        report,
        stats,
        account,
        open_position: machine.into_position(),
        bars_processed: bars.len(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::strategy::StrategyParams;
    use chrono::NaiveDate;

    fn make_bars(prices: &[f64]) -> Vec<OhlcvBar> {
        let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        prices
            .iter()
            .enumerate()
            .map(|(i, &close)| OhlcvBar::flat(start + chrono::Duration::days(i as i64), close))
            .collect()
    }

    fn sma_2_3() -> StrategyConfig {
        StrategyConfig::new(StrategyParams {
            use_sma: true,
            short_window: 2,
            long_window: 3,
            ..StrategyParams::none_enabled()
        })
        .unwrap()
    }

    #[test]
    fn config_default_initial_value() {
        assert_eq!(BacktestConfig::default().initial_value, 1_000_000.0);
    }

    #[test]
    fn empty_bars_rejected() {
        let err = run(&[], &sma_2_3()).unwrap_err();
        assert!(matches!(err, SigtraderError::EmptyInputData));
    }

    #[test]
    fn unordered_bars_rejected() {
        let mut bars = make_bars(&[1.0, 2.0, 3.0]);
        bars.swap(0, 2);
        let err = run(&bars, &sma_2_3()).unwrap_err();
        assert!(matches!(err, SigtraderError::UnorderedBars { .. }));
    }

    #[test]
    fn one_close_line_per_bar_plus_summary() {
        let result = run(&make_bars(&[5.0, 5.0, 5.0, 5.0]), &sma_2_3()).unwrap();
        let lines = result.log_lines();
        assert_eq!(lines.len(), 4 + 3);
        assert_eq!(lines[0], "2024-01-01, Close, 5.00");
        assert_eq!(lines[4], "2024-01-04, Win Rate: 0.00%");
        assert_eq!(lines[5], "2024-01-04, Sharpe Ratio: 0.00");
        assert_eq!(lines[6], "2024-01-04, Maximum Drawdown: 0.00");
        assert_eq!(result.bars_processed, 4);
    }

    #[test]
    fn crossover_sequence_trades_at_closes() {
        let bars = make_bars(&[10.0, 11.0, 12.0, 9.0, 8.0, 13.0, 14.0]);
        let result = run(&bars, &sma_2_3()).unwrap();

        let trades = result.ledger.trades();
        assert_eq!(trades.len(), 1);
        assert_eq!(trades[0].entry_price, 12.0);
        assert_eq!(trades[0].exit_price, 9.0);

        // re-entered on 13.0 and still open at the end
        assert_eq!(result.ledger.total_buy_trades(), 2);
        assert_eq!(result.ledger.total_sell_trades(), 1);
        assert_eq!(result.open_position.as_ref().unwrap().entry_price, 13.0);
    }

    #[test]
    fn open_position_excluded_from_account() {
        let result = run(&make_bars(&[10.0, 11.0, 12.0, 13.0]), &sma_2_3()).unwrap();
        assert_eq!(result.ledger.completed_trades(), 0);
        assert!(result.open_position.is_some());
        assert_eq!(result.account.final_value, DEFAULT_INITIAL_VALUE);
    }

    #[test]
    fn custom_initial_value() {
        let result = run_backtest(
            &make_bars(&[10.0, 11.0, 12.0, 9.0]),
            &sma_2_3(),
            &BacktestConfig {
                initial_value: 500.0,
            },
        )
        .unwrap();
        assert!((result.account.final_value - 497.0).abs() < 1e-9);
        assert!((result.account.net_profit_loss + 3.0).abs() < 1e-9);
    }
}
