//! OHLCV bar representation.

use chrono::NaiveDate;

use crate::domain::error::SigtraderError;

#[derive(Debug, Clone, PartialEq)]
pub struct OhlcvBar {
    pub date: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: i64,
}

impl OhlcvBar {
    /// A bar whose open/high/low all sit on the close.
    pub fn flat(date: NaiveDate, close: f64) -> Self {
        OhlcvBar {
            date,
            open: close,
            high: close,
            low: close,
            close,
            volume: 0,
        }
    }
}

/// Reject an empty series, one whose dates are not strictly increasing, or
/// any bar whose close is not a finite positive price.
pub fn check_bar_order(bars: &[OhlcvBar]) -> Result<(), SigtraderError> {
    if bars.is_empty() {
        return Err(SigtraderError::EmptyInputData);
    }
    if let Some((index, bar)) = bars
        .iter()
        .enumerate()
        .find(|(_, b)| !b.close.is_finite() || b.close <= 0.0)
    {
        return Err(SigtraderError::InvalidPrice {
            index,
            date: bar.date,
            close: bar.close,
        });
    }
    for (i, pair) in bars.windows(2).enumerate() {
        if pair[1].date <= pair[0].date {
            return Err(SigtraderError::UnorderedBars {
                index: i + 1,
                date: pair[1].date,
            });
        }
    }
    Ok(())
}
