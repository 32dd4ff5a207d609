//! Simple Moving Average over a sliding window of closes.
//!
//! Undefined until `period` closes have been observed.

use std::collections::VecDeque;

#[derive(Debug, Clone)]
pub struct Sma {
    period: usize,
    window: VecDeque<f64>,
}

impl Sma {
    pub fn new(period: usize) -> Self {
        Sma {
            period,
            window: VecDeque::with_capacity(period),
        }
    }

    pub fn update(&mut self, close: f64) -> Option<f64> {
        self.window.push_back(close);
        if self.window.len() > self.period {
            self.window.pop_front();
        }
        self.value()
    }

    pub fn value(&self) -> Option<f64> {
        if self.period == 0 || self.window.len() < self.period {
            return None;
        }
        Some(self.window.iter().sum::<f64>() / self.period as f64)
    }
}
