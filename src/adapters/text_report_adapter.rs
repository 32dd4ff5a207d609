//! Plain-text report adapter implementing ReportPort.
//!
//! Sections, in order: strategy parameters, account summary, execution
//! counters, performance, trade statistics, the trade table and the run's
//! event log.

use std::fmt::Write as _;
use std::fs;
use std::path::Path;

use tracing::info;

use crate::domain::backtest::BacktestResult;
use crate::domain::error::SigtraderError;
use crate::domain::strategy::StrategyConfig;
use crate::ports::report_port::ReportPort;

pub struct TextReportAdapter;

impl TextReportAdapter {
    pub fn new() -> Self {
        Self
    }

    /// Render the whole report as a string.
    pub fn render(
        &self,
        symbol: &str,
        result: &BacktestResult,
        strategy: &StrategyConfig,
    ) -> String {
        let mut out = String::new();
        render_into(&mut out, symbol, result, strategy)
            .expect("writing to a String is infallible");
        out
    }
}

impl Default for TextReportAdapter {
    fn default() -> Self {
        Self::new()
    }
}

fn on_off(flag: bool) -> &'static str {
    if flag { "on" } else { "off" }
}

fn render_into(
    out: &mut String,
    symbol: &str,
    result: &BacktestResult,
    strategy: &StrategyConfig,
) -> std::fmt::Result {
    let p = strategy.params();

    writeln!(out, "Backtest report: {}", symbol)?;
    writeln!(out, "Bars processed: {}", result.bars_processed)?;

    writeln!(out, "\n== Strategy ==")?;
    writeln!(
        out,
        "SMA  {:<4} short={} long={}",
        on_off(p.use_sma),
        p.short_window,
        p.long_window
    )?;
    writeln!(
        out,
        "EMA  {:<4} short={} long={}",
        on_off(p.use_ema),
        p.short_window,
        p.long_window
    )?;
    writeln!(
        out,
        "RSI  {:<4} period={} oversold={:.2} overbought={:.2}",
        on_off(p.use_rsi),
        p.rsi_period,
        p.rsi_oversold,
        p.rsi_overbought
    )?;
    writeln!(
        out,
        "MACD {:<4} fast={} slow={} signal={}",
        on_off(p.use_macd),
        p.macd_short,
        p.macd_long,
        p.macd_signal
    )?;
    match strategy.stop_loss_pct() {
        Some(pct) => writeln!(out, "Stop-loss: {:.2}%", pct)?,
        None => writeln!(out, "Stop-loss: off")?,
    }

    writeln!(out, "\n== Account ==")?;
    writeln!(out, "Initial value:   {:.2}", result.account.initial_value)?;
    writeln!(out, "Final value:     {:.2}", result.account.final_value)?;
    writeln!(out, "Net profit/loss: {:.2}", result.account.net_profit_loss)?;
    if let Some(pos) = &result.open_position {
        writeln!(
            out,
            "Open position:   entered {} at {:.2}",
            pos.entry_date, pos.entry_price
        )?;
    }

    let ledger = &result.ledger;
    writeln!(out, "\n== Executions ==")?;
    writeln!(out, "Buys:       {}", ledger.total_buy_trades())?;
    writeln!(out, "Sells:      {}", ledger.total_sell_trades())?;
    writeln!(out, "Profitable: {}", ledger.profitable_trades())?;

    writeln!(out, "\n== Performance ==")?;
    writeln!(out, "Win Rate:         {:.2}%", result.report.win_rate)?;
    writeln!(out, "Sharpe Ratio:     {:.2}", result.report.sharpe_ratio)?;
    writeln!(out, "Maximum Drawdown: {:.2}", result.report.max_drawdown)?;

    let s = &result.stats;
    writeln!(out, "\n== Trade Statistics ==")?;
    writeln!(
        out,
        "Won/Lost/Even: {}/{}/{}",
        s.trades_won, s.trades_lost, s.trades_breakeven
    )?;
    writeln!(out, "Average win:   {:.2}", s.avg_win)?;
    writeln!(out, "Average loss:  {:.2}", s.avg_loss)?;
    writeln!(out, "Largest win:   {:.2}", s.largest_win)?;
    writeln!(out, "Largest loss:  {:.2}", s.largest_loss)?;
    if s.profit_factor.is_infinite() {
        writeln!(out, "Profit factor: inf")?;
    } else {
        writeln!(out, "Profit factor: {:.2}", s.profit_factor)?;
    }

    writeln!(out, "\n== Trades ==")?;
    if ledger.trades().is_empty() {
        writeln!(out, "(none)")?;
    } else {
        writeln!(
            out,
            "{:>4}  {:>12}  {:>12}  {:>12}  {:>9}",
            "#", "Entry", "Exit", "P/L", "Return"
        )?;
        for (i, t) in ledger.trades().iter().enumerate() {
            writeln!(
                out,
                "{:>4}  {:>12.2}  {:>12.2}  {:>12.2}  {:>8.2}%",
                i + 1,
                t.entry_price,
                t.exit_price,
                t.profit_loss,
                t.return_fraction * 100.0
            )?;
        }
    }

    writeln!(out, "\n== Log ==")?;
    for line in result.log_lines() {
        writeln!(out, "{}", line)?;
    }
    Ok(())
}

impl ReportPort for TextReportAdapter {
    fn write(
        &self,
        symbol: &str,
        result: &BacktestResult,
        strategy: &StrategyConfig,
        output_path: &Path,
    ) -> Result<(), SigtraderError> {
        let content = self.render(symbol, result, strategy);
        fs::write(output_path, content)?;
        info!(path = %output_path.display(), "report written");
        Ok(())
    }
}
