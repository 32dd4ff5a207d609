//! Exponential Moving Average indicator.
//!
//! k = 2/(n+1), seeded with the first close, then EMA[i] = C[i]*k + EMA[i-1]*(1-k).
//! Defined from the first bar onward.

#[derive(Debug, Clone)]
pub struct Ema {
    k: f64,
    value: Option<f64>,
}

impl Ema {
    pub fn new(period: usize) -> Self {
        Ema {
            k: 2.0 / (period as f64 + 1.0),
            value: None,
        }
    }

    pub fn update(&mut self, close: f64) -> f64 {
        let next = match self.value {
            None => close,
            Some(prev) => close * self.k + prev * (1.0 - self.k),
        };
        self.value = Some(next);
        next
    }

    pub fn value(&self) -> Option<f64> {
        self.value
    }
}
