//! Trade ledger: completed trades, execution counters, and the run's event log.
//!
//! Append-only. Trades are never modified once recorded.

use chrono::NaiveDate;

#[derive(Debug, Clone, PartialEq)]
pub struct Trade {
    pub entry_price: f64,
    pub exit_price: f64,
    pub profit_loss: f64,
    pub return_fraction: f64,
}

impl Trade {
    pub fn new(entry_price: f64, exit_price: f64) -> Self {
        let profit_loss = exit_price - entry_price;
        Trade {
            entry_price,
            exit_price,
            profit_loss,
            return_fraction: profit_loss / entry_price,
        }
    }

    pub fn is_profitable(&self) -> bool {
        self.profit_loss > 0.0
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct TradeLedger {
    trades: Vec<Trade>,
    total_buy_trades: usize,
    total_sell_trades: usize,
    profitable_trades: usize,
    log: Vec<String>,
}

impl TradeLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Count a filled buy. The matching trade is recorded on exit.
    pub fn record_buy(&mut self) {
        self.total_buy_trades += 1;
    }

    /// Record a completed round trip (one filled sell).
    pub fn record_trade(&mut self, entry_price: f64, exit_price: f64) -> &Trade {
        let trade = Trade::new(entry_price, exit_price);
        self.total_sell_trades += 1;
        if trade.is_profitable() {
            self.profitable_trades += 1;
        }
        self.trades.push(trade);
        &self.trades[self.trades.len() - 1]
    }

    pub fn log(&mut self, date: NaiveDate, text: impl AsRef<str>) {
        self.log.push(format!("{}, {}", date.format("%Y-%m-%d"), text.as_ref()));
    }

    pub fn log_lines(&self) -> &[String] {
        &self.log
    }

    pub fn trades(&self) -> &[Trade] {
        &self.trades
    }

    pub fn total_buy_trades(&self) -> usize {
        self.total_buy_trades
    }

    pub fn total_sell_trades(&self) -> usize {
        self.total_sell_trades
    }

    pub fn profitable_trades(&self) -> usize {
        self.profitable_trades
    }

    pub fn completed_trades(&self) -> usize {
        self.trades.len()
    }

    /// Per-trade return fractions, in completion order.
    pub fn returns(&self) -> Vec<f64> {
        self.trades.iter().map(|t| t.return_fraction).collect()
    }

    pub fn total_profit_loss(&self) -> f64 {
        self.trades.iter().map(|t| t.profit_loss).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn new_ledger_is_empty() {
        let ledger = TradeLedger::new();
        assert_eq!(ledger.total_buy_trades(), 0);
        assert_eq!(ledger.total_sell_trades(), 0);
        assert_eq!(ledger.profitable_trades(), 0);
        assert!(ledger.trades().is_empty());
        assert!(ledger.returns().is_empty());
        assert!(ledger.log_lines().is_empty());
    }

    #[test]
    fn trade_fields_derive_from_prices() {
        let trade = Trade::new(100.0, 110.0);
        assert_relative_eq!(trade.profit_loss, 10.0);
        assert_relative_eq!(trade.return_fraction, 0.10);
        assert!(trade.is_profitable());
    }

    #[test]
    fn breakeven_is_not_profitable() {
        assert!(!Trade::new(50.0, 50.0).is_profitable());
    }

    #[test]
    fn record_trade_updates_counters() {
        let mut ledger = TradeLedger::new();
        ledger.record_buy();
        let trade = ledger.record_trade(12.0, 9.0).clone();
        assert_relative_eq!(trade.profit_loss, -3.0);
        assert_relative_eq!(trade.return_fraction, -0.25);

        ledger.record_buy();
        ledger.record_trade(100.0, 110.0);

        assert_eq!(ledger.total_buy_trades(), 2);
        assert_eq!(ledger.total_sell_trades(), 2);
        assert_eq!(ledger.profitable_trades(), 1);
        assert_eq!(ledger.completed_trades(), 2);
        assert_relative_eq!(ledger.total_profit_loss(), 7.0);

        let returns = ledger.returns();
        assert_relative_eq!(returns[0], -0.25);
        assert_relative_eq!(returns[1], 0.10);
    }

    #[test]
    fn record_trade_appends_in_order() {
        let mut ledger = TradeLedger::new();
        ledger.record_trade(10.0, 11.0);
        ledger.record_trade(20.0, 19.0);
        let exits: Vec<f64> = ledger.trades().iter().map(|t| t.exit_price).collect();
        assert_eq!(exits, vec![11.0, 19.0]);
    }

    #[test]
    fn log_prefixes_iso_date() {
        let mut ledger = TradeLedger::new();
        let date = NaiveDate::from_ymd_opt(2024, 3, 7).unwrap();
        ledger.log(date, "Close, 101.50");
        assert_eq!(ledger.log_lines(), &["2024-03-07, Close, 101.50".to_string()]);
    }
}
