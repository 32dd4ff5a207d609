//! Market data port trait.

use crate::domain::error::SigtraderError;
use crate::domain::ohlcv::OhlcvBar;
use chrono::NaiveDate;

pub trait DataPort {
    /// Bars for `symbol` dated within `[start_date, end_date]`, oldest first.
    /// An empty vector is a valid answer; the backtest rejects it later.
    fn fetch_bars(
        &self,
        symbol: &str,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<Vec<OhlcvBar>, SigtraderError>;

    fn list_symbols(&self) -> Result<Vec<String>, SigtraderError>;

    /// First date, last date and bar count, or `None` when the symbol has no data.
    fn get_data_range(
        &self,
        symbol: &str,
    ) -> Result<Option<(NaiveDate, NaiveDate, usize)>, SigtraderError>;
}
