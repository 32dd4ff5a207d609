#![allow(dead_code)]

use chrono::NaiveDate;
use sigtrader::domain::error::SigtraderError;
pub use sigtrader::domain::ohlcv::OhlcvBar;
use sigtrader::domain::strategy::{StrategyConfig, StrategyParams};
use sigtrader::ports::data_port::DataPort;
use std::collections::HashMap;

pub struct MockDataPort {
    pub data: HashMap<String, Vec<OhlcvBar>>,
    pub errors: HashMap<String, String>,
}

impl MockDataPort {
    pub fn new() -> Self {
        Self {
            data: HashMap::new(),
            errors: HashMap::new(),
        }
    }

    pub fn with_bars(mut self, symbol: &str, bars: Vec<OhlcvBar>) -> Self {
        self.data.insert(symbol.to_string(), bars);
        self
    }

    pub fn with_error(mut self, symbol: &str, reason: &str) -> Self {
        self.errors.insert(symbol.to_string(), reason.to_string());
        self
    }
}

impl DataPort for MockDataPort {
    fn fetch_bars(
        &self,
        symbol: &str,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<Vec<OhlcvBar>, SigtraderError> {
        if let Some(reason) = self.errors.get(symbol) {
            return Err(SigtraderError::Data {
                reason: reason.clone(),
            });
        }
        Ok(self
            .data
            .get(symbol)
            .map(|bars| {
                bars.iter()
                    .filter(|b| b.date >= start_date && b.date <= end_date)
                    .cloned()
                    .collect()
            })
            .unwrap_or_default())
    }

    fn list_symbols(&self) -> Result<Vec<String>, SigtraderError> {
        let mut symbols: Vec<String> = self.data.keys().cloned().collect();
        symbols.sort();
        Ok(symbols)
    }

    fn get_data_range(
        &self,
        symbol: &str,
    ) -> Result<Option<(NaiveDate, NaiveDate, usize)>, SigtraderError> {
        match self.data.get(symbol) {
            Some(bars) if !bars.is_empty() => {
                let min = bars.iter().map(|b| b.date).min().unwrap();
                let max = bars.iter().map(|b| b.date).max().unwrap();
                Ok(Some((min, max, bars.len())))
            }
            _ => Ok(None),
        }
    }
}

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

pub fn parse_date(s: &str) -> NaiveDate {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
}

pub fn make_bar(date_str: &str, close: f64) -> OhlcvBar {
    OhlcvBar {
        date: parse_date(date_str),
        open: close,
        high: close + 1.0,
        low: close - 1.0,
        close,
        volume: 1000,
    }
}

/// One bar per calendar day starting at 2024-01-01.
pub fn bars_from_closes(closes: &[f64]) -> Vec<OhlcvBar> {
    let start = date(2024, 1, 1);
    closes
        .iter()
        .enumerate()
        .map(|(i, &c)| OhlcvBar::flat(start + chrono::Duration::days(i as i64), c))
        .collect()
}

pub fn sma_only(short: usize, long: usize) -> StrategyConfig {
    StrategyConfig::new(StrategyParams {
        use_sma: true,
        short_window: short,
        long_window: long,
        ..StrategyParams::none_enabled()
    })
    .unwrap()
}

pub fn no_indicators() -> StrategyConfig {
    StrategyConfig::new(StrategyParams::none_enabled()).unwrap()
}

pub fn write_csv(dir: &std::path::Path, symbol: &str, bars: &[OhlcvBar]) {
    let mut content = String::from("Date,Open,High,Low,Close,Adj Close,Volume\n");
    for b in bars {
        content.push_str(&format!(
            "{},{},{},{},{},{},{}\n",
            b.date, b.open, b.high, b.low, b.close, b.close, b.volume
        ));
    }
    std::fs::write(dir.join(format!("{symbol}.csv")), content).unwrap();
}
