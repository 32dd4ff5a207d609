//! MACD (Moving Average Convergence Divergence) indicator.
//!
//! MACD Line = EMA(fast) - EMA(slow)
//! Signal Line = EMA(signal) of MACD Line
//! Histogram = MACD Line - Signal Line
//!
//! All three EMAs seed from their first input, so MACD is defined from the first bar.

use crate::domain::indicator::ema::Ema;

pub const DEFAULT_FAST: usize = 12;
pub const DEFAULT_SLOW: usize = 26;
pub const DEFAULT_SIGNAL: usize = 9;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MacdValue {
    pub line: f64,
    pub signal: f64,
    pub histogram: f64,
}

#[derive(Debug, Clone)]
pub struct Macd {
    fast: Ema,
    slow: Ema,
    signal: Ema,
}

impl Macd {
    pub fn new(fast: usize, slow: usize, signal: usize) -> Self {
        Macd {
            fast: Ema::new(fast),
            slow: Ema::new(slow),
            signal: Ema::new(signal),
        }
    }

    pub fn update(&mut self, close: f64) -> MacdValue {
        let line = self.fast.update(close) - self.slow.update(close);
        let signal = self.signal.update(line);
        MacdValue {
            line,
            signal,
            histogram: line - signal,
        }
    }
}

impl Default for Macd {
    fn default() -> Self {
        Macd::new(DEFAULT_FAST, DEFAULT_SLOW, DEFAULT_SIGNAL)
    }
}
