//! RSI (Relative Strength Index) with Wilder's smoothing.
//!
//! - First average: simple mean of gains/losses over the first n price changes
//! - Subsequent: avg = (prev_avg * (n-1) + current) / n
//!
//! Formula: RSI = 100 - (100 / (1 + avg_gain / avg_loss))
//! If avg_loss == 0: RSI = 100 (or 50 when there were no gains either)
//!
//! Warmup: the first n bars are undefined (n changes need n+1 closes).

#[derive(Debug, Clone)]
pub struct Rsi {
    period: usize,
    prev_close: Option<f64>,
    changes: usize,
    avg_gain: f64,
    avg_loss: f64,
    value: Option<f64>,
}

impl Rsi {
    pub fn new(period: usize) -> Self {
        Rsi {
            period,
            prev_close: None,
            changes: 0,
            avg_gain: 0.0,
            avg_loss: 0.0,
            value: None,
        }
    }

    pub fn update(&mut self, close: f64) -> Option<f64> {
        let prev = self.prev_close.replace(close)?;
        if self.period == 0 {
            return None;
        }

        let change = close - prev;
        let gain = change.max(0.0);
        let loss = (-change).max(0.0);
        let n = self.period as f64;
        self.changes += 1;

        if self.changes <= self.period {
            // Accumulate the seed sums in place until the first full window.
            self.avg_gain += gain;
            self.avg_loss += loss;
            if self.changes < self.period {
                return None;
            }
            self.avg_gain /= n;
            self.avg_loss /= n;
        } else {
            self.avg_gain = (self.avg_gain * (n - 1.0) + gain) / n;
            self.avg_loss = (self.avg_loss * (n - 1.0) + loss) / n;
        }

        let rsi = rsi_from_averages(self.avg_gain, self.avg_loss);
        self.value = Some(rsi);
        self.value
    }

    pub fn value(&self) -> Option<f64> {
        self.value
    }
}

fn rsi_from_averages(avg_gain: f64, avg_loss: f64) -> f64 {
    if avg_loss == 0.0 {
        if avg_gain == 0.0 { 50.0 } else { 100.0 }
    } else {
        100.0 - (100.0 / (1.0 + avg_gain / avg_loss))
    }
}
