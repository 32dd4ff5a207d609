//! Performance metrics computed once at the end of a run.
//!
//! All metrics work on the ledger's per-trade returns, not on a time-based
//! equity curve: the Sharpe ratio is raw (no risk-free rate, no annualization)
//! and the drawdown runs over the *summed* cumulative return series.

use crate::domain::ledger::TradeLedger;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PerformanceReport {
    pub win_rate: f64,
    pub sharpe_ratio: f64,
    pub max_drawdown: f64,
}

impl PerformanceReport {
    pub fn compute(ledger: &TradeLedger) -> Self {
        let returns = ledger.returns();
        PerformanceReport {
            win_rate: win_rate(
                ledger.profitable_trades(),
                ledger.total_buy_trades(),
                ledger.total_sell_trades(),
            ),
            sharpe_ratio: sharpe_ratio(&returns),
            max_drawdown: max_drawdown(&returns),
        }
    }
}

/// Profitable trades as a percentage of buy + sell executions combined.
pub fn win_rate(profitable: usize, buys: usize, sells: usize) -> f64 {
    let executions = buys + sells;
    if executions == 0 {
        return 0.0;
    }
    profitable as f64 / executions as f64 * 100.0
}

/// mean / population standard deviation of `returns`; 0 when undefined.
pub fn sharpe_ratio(returns: &[f64]) -> f64 {
    if returns.is_empty() {
        return 0.0;
    }
    let n = returns.len() as f64;
    let mean = returns.iter().sum::<f64>() / n;
    let variance = returns.iter().map(|r| (r - mean).powi(2)).sum::<f64>() / n;
    let stddev = variance.sqrt();
    if stddev == 0.0 { 0.0 } else { mean / stddev }
}

/// Largest fractional fall from a running peak of the cumulative *sum* of
/// `returns`. Points where the peak is not positive contribute nothing.
pub fn max_drawdown(returns: &[f64]) -> f64 {
    let mut cumulative = 0.0;
    let mut peak: Option<f64> = None;
    let mut max_dd = 0.0_f64;

    for r in returns {
        cumulative += r;
        let p = match peak {
            Some(p) if p >= cumulative => p,
            _ => cumulative,
        };
        peak = Some(p);
        if p > 0.0 {
            max_dd = max_dd.max((p - cumulative) / p);
        }
    }

    max_dd
}

/// Win/loss breakdown of the completed trades, in price units per share.
#[derive(Debug, Clone, PartialEq)]
pub struct TradeStats {
    pub trades_won: usize,
    pub trades_lost: usize,
    pub trades_breakeven: usize,
    pub avg_win: f64,
    pub avg_loss: f64,
    pub largest_win: f64,
    pub largest_loss: f64,
    pub profit_factor: f64,
}

impl TradeStats {
    pub fn compute(ledger: &TradeLedger) -> Self {
        let mut trades_won = 0usize;
        let mut trades_lost = 0usize;
        let mut trades_breakeven = 0usize;
        let mut total_wins = 0.0_f64;
        let mut total_losses = 0.0_f64;
        let mut largest_win = 0.0_f64;
        let mut largest_loss = 0.0_f64;

        for trade in ledger.trades() {
            let pnl = trade.profit_loss;
            if pnl > 0.0 {
                trades_won += 1;
                total_wins += pnl;
                largest_win = largest_win.max(pnl);
            } else if pnl < 0.0 {
                trades_lost += 1;
                total_losses += pnl.abs();
                largest_loss = largest_loss.max(pnl.abs());
            } else {
                trades_breakeven += 1;
            }
        }

        let profit_factor = if total_losses > 0.0 {
            total_wins / total_losses
        } else if total_wins > 0.0 {
            f64::INFINITY
        } else {
            0.0
        };

        let avg_win = if trades_won > 0 {
            total_wins / trades_won as f64
        } else {
            0.0
        };

        let avg_loss = if trades_lost > 0 {
            total_losses / trades_lost as f64
        } else {
            0.0
        };

        TradeStats {
            trades_won,
            trades_lost,
            trades_breakeven,
            avg_win,
            avg_loss,
            largest_win,
            largest_loss,
            profit_factor,
        }
    }
}

/// Account value assuming one unit traded per round trip.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AccountSummary {
    pub initial_value: f64,
    pub final_value: f64,
    pub net_profit_loss: f64,
}

impl AccountSummary {
    pub fn from_ledger(ledger: &TradeLedger, initial_value: f64) -> Self {
        let net_profit_loss = ledger.total_profit_loss();
        AccountSummary {
            initial_value,
            final_value: initial_value + net_profit_loss,
            net_profit_loss,
        }
    }
}
