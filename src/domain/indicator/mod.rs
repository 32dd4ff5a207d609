//! Technical indicators, updated incrementally one bar at a time.
//!
//! This module provides:
//! - `IndicatorFamily`: capability tag for a group of indicators a strategy can enable
//! - `IndicatorKind`: key for one value inside a snapshot
//! - `IndicatorSnapshot`: the close and every defined indicator value for one bar
//! - `IndicatorSet`: the rolling state of the enabled indicators

pub mod ema;
pub mod macd;
pub mod rsi;
pub mod sma;

use std::collections::BTreeMap;
use std::fmt;

use crate::domain::error::SigtraderError;
use crate::domain::ohlcv::OhlcvBar;
use crate::domain::strategy::StrategyConfig;

use ema::Ema;
use macd::Macd;
use rsi::Rsi;
use sma::Sma;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IndicatorFamily {
    Sma,
    Ema,
    Rsi,
    Macd,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum IndicatorKind {
    ShortSma,
    LongSma,
    ShortEma,
    LongEma,
    Rsi,
    MacdLine,
    MacdSignal,
    MacdHistogram,
}

impl fmt::Display for IndicatorFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            IndicatorFamily::Sma => "SMA",
            IndicatorFamily::Ema => "EMA",
            IndicatorFamily::Rsi => "RSI",
            IndicatorFamily::Macd => "MACD",
        };
        f.write_str(name)
    }
}

impl fmt::Display for IndicatorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            IndicatorKind::ShortSma => "short_sma",
            IndicatorKind::LongSma => "long_sma",
            IndicatorKind::ShortEma => "short_ema",
            IndicatorKind::LongEma => "long_ema",
            IndicatorKind::Rsi => "rsi",
            IndicatorKind::MacdLine => "macd_line",
            IndicatorKind::MacdSignal => "macd_signal",
            IndicatorKind::MacdHistogram => "macd_histogram",
        };
        f.write_str(name)
    }
}

/// Indicator values as of one bar. A kind that is absent is undefined: either
/// its family is disabled or it has not finished warming up.
#[derive(Debug, Clone, PartialEq)]
pub struct IndicatorSnapshot {
    close: f64,
    values: BTreeMap<IndicatorKind, f64>,
}

impl IndicatorSnapshot {
    pub fn new(close: f64) -> Self {
        IndicatorSnapshot {
            close,
            values: BTreeMap::new(),
        }
    }

    pub fn close(&self) -> f64 {
        self.close
    }

    pub fn get(&self, kind: IndicatorKind) -> Option<f64> {
        self.values.get(&kind).copied()
    }

    pub fn value(&self, kind: IndicatorKind) -> Result<f64, SigtraderError> {
        self.get(kind)
            .ok_or(SigtraderError::InsufficientHistory { indicator: kind })
    }

    pub fn set(&mut self, kind: IndicatorKind, value: f64) {
        self.values.insert(kind, value);
    }

    fn set_opt(&mut self, kind: IndicatorKind, value: Option<f64>) {
        if let Some(v) = value {
            self.set(kind, v);
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (IndicatorKind, f64)> + '_ {
        self.values.iter().map(|(k, v)| (*k, *v))
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

#[derive(Debug, Clone)]
enum IndicatorState {
    Sma { short: Sma, long: Sma },
    Ema { short: Ema, long: Ema },
    Rsi(Rsi),
    Macd(Macd),
}

impl IndicatorState {
    fn for_family(family: IndicatorFamily, config: &StrategyConfig) -> Self {
        let p = config.params();
        match family {
            IndicatorFamily::Sma => IndicatorState::Sma {
                short: Sma::new(p.short_window),
                long: Sma::new(p.long_window),
            },
            IndicatorFamily::Ema => IndicatorState::Ema {
                short: Ema::new(p.short_window),
                long: Ema::new(p.long_window),
            },
            IndicatorFamily::Rsi => IndicatorState::Rsi(Rsi::new(p.rsi_period)),
            IndicatorFamily::Macd => {
                IndicatorState::Macd(Macd::new(p.macd_short, p.macd_long, p.macd_signal))
            }
        }
    }

    fn update(&mut self, close: f64, snapshot: &mut IndicatorSnapshot) {
        match self {
            IndicatorState::Sma { short, long } => {
                snapshot.set_opt(IndicatorKind::ShortSma, short.update(close));
                snapshot.set_opt(IndicatorKind::LongSma, long.update(close));
            }
            IndicatorState::Ema { short, long } => {
                snapshot.set(IndicatorKind::ShortEma, short.update(close));
                snapshot.set(IndicatorKind::LongEma, long.update(close));
            }
            IndicatorState::Rsi(rsi) => {
                snapshot.set_opt(IndicatorKind::Rsi, rsi.update(close));
            }
            IndicatorState::Macd(macd) => {
                let v = macd.update(close);
                snapshot.set(IndicatorKind::MacdLine, v.line);
                snapshot.set(IndicatorKind::MacdSignal, v.signal);
                snapshot.set(IndicatorKind::MacdHistogram, v.histogram);
            }
        }
    }
}

/// Rolling state for the indicator families a strategy enabled. Disabled
/// families hold no state and are never computed.
#[derive(Debug, Clone)]
pub struct IndicatorSet {
    states: Vec<IndicatorState>,
}

impl IndicatorSet {
    pub fn new(config: &StrategyConfig) -> Self {
        IndicatorSet {
            states: config
                .enabled()
                .iter()
                .map(|&family| IndicatorState::for_family(family, config))
                .collect(),
        }
    }

    /// Feed the next bar. Must be called once per bar, in date order.
    pub fn update(&mut self, bar: &OhlcvBar) -> IndicatorSnapshot {
        let mut snapshot = IndicatorSnapshot::new(bar.close);
        for state in &mut self.states {
            state.update(bar.close, &mut snapshot);
        }
        snapshot
    }

    pub fn len(&self) -> usize {
        self.states.len()
    }

    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }
}
