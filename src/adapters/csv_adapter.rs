//! CSV file data adapter.
//!
//! One file per symbol, `<base_path>/<SYMBOL>.csv`, with a header row naming
//! `date, open, high, low, close, volume` in any order (case-insensitive).
//! Extra columns such as `Adj Close` are ignored.

use crate::domain::error::SigtraderError;
use crate::domain::ohlcv::OhlcvBar;
use crate::ports::data_port::DataPort;
use chrono::NaiveDate;
use std::fs;
use std::path::PathBuf;
use tracing::debug;

pub struct CsvAdapter {
    base_path: PathBuf,
}

struct Columns {
    date: usize,
    open: usize,
    high: usize,
    low: usize,
    close: usize,
    volume: usize,
}

impl Columns {
    fn from_headers(headers: &csv::StringRecord) -> Result<Self, SigtraderError> {
        let find = |name: &str| {
            headers
                .iter()
                .position(|h| h.trim().eq_ignore_ascii_case(name))
                .ok_or_else(|| SigtraderError::Data {
                    reason: format!("missing {} column", name),
                })
        };
        Ok(Columns {
            date: find("date")?,
            open: find("open")?,
            high: find("high")?,
            low: find("low")?,
            close: find("close")?,
            volume: find("volume")?,
        })
    }
}

impl CsvAdapter {
    pub fn new(base_path: PathBuf) -> Self {
        Self { base_path }
    }

    fn csv_path(&self, symbol: &str) -> PathBuf {
        self.base_path.join(format!("{}.csv", symbol))
    }

    fn read_all(&self, symbol: &str) -> Result<Vec<OhlcvBar>, SigtraderError> {
        let path = self.csv_path(symbol);
        let content = fs::read_to_string(&path).map_err(|e| SigtraderError::Data {
            reason: format!("failed to read {}: {}", path.display(), e),
        })?;

        let mut rdr = csv::Reader::from_reader(content.as_bytes());
        let headers = rdr.headers().map_err(|e| SigtraderError::Data {
            reason: format!("CSV header error: {}", e),
        })?;
        let cols = Columns::from_headers(headers)?;

        let mut bars = Vec::new();
        for result in rdr.records() {
            let record = result.map_err(|e| SigtraderError::Data {
                reason: format!("CSV parse error: {}", e),
            })?;

            let date_str = field(&record, cols.date, "date")?;
            let date = NaiveDate::parse_from_str(date_str, "%Y-%m-%d").map_err(|e| {
                SigtraderError::Data {
                    reason: format!("invalid date {:?}: {}", date_str, e),
                }
            })?;

            bars.push(OhlcvBar {
                date,
                open: parse_price(&record, cols.open, "open")?,
                high: parse_price(&record, cols.high, "high")?,
                low: parse_price(&record, cols.low, "low")?,
                close: parse_price(&record, cols.close, "close")?,
                volume: parse_volume(&record, cols.volume)?,
            });
        }

        bars.sort_by_key(|b| b.date);
        Ok(bars)
    }
}

fn field<'r>(
    record: &'r csv::StringRecord,
    idx: usize,
    name: &str,
) -> Result<&'r str, SigtraderError> {
    record
        .get(idx)
        .map(str::trim)
        .ok_or_else(|| SigtraderError::Data {
            reason: format!("missing {} value", name),
        })
}

fn parse_price(record: &csv::StringRecord, idx: usize, name: &str) -> Result<f64, SigtraderError> {
    let value: f64 = field(record, idx, name)?
        .parse()
        .map_err(|e| SigtraderError::Data {
            reason: format!("invalid {} value: {}", name, e),
        })?;
    if !value.is_finite() {
        return Err(SigtraderError::Data {
            reason: format!("invalid {} value: {} is not a finite number", name, value),
        });
    }
    Ok(value)
}

/// Volume may be written as an integer or a float (`1200.0`).
fn parse_volume(record: &csv::StringRecord, idx: usize) -> Result<i64, SigtraderError> {
    let raw = field(record, idx, "volume")?;
    raw.parse::<i64>()
        .or_else(|_| raw.parse::<f64>().map(|v| v.round() as i64))
        .map_err(|e| SigtraderError::Data {
            reason: format!("invalid volume value: {}", e),
        })
}

impl DataPort for CsvAdapter {
    fn fetch_bars(
        &self,
        symbol: &str,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<Vec<OhlcvBar>, SigtraderError> {
        let bars: Vec<OhlcvBar> = self
            .read_all(symbol)?
            .into_iter()
            .filter(|b| b.date >= start_date && b.date <= end_date)
            .collect();
        debug!(symbol, bars = bars.len(), %start_date, %end_date, "loaded bars from csv");
        Ok(bars)
    }

    fn list_symbols(&self) -> Result<Vec<String>, SigtraderError> {
        let entries = fs::read_dir(&self.base_path).map_err(|e| SigtraderError::Data {
            reason: format!(
                "failed to read directory {}: {}",
                self.base_path.display(),
                e
            ),
        })?;

        let mut symbols = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| SigtraderError::Data {
                reason: format!("directory entry error: {}", e),
            })?;
            let name = entry.file_name();
            if let Some(symbol) = name.to_string_lossy().strip_suffix(".csv") {
                symbols.push(symbol.to_string());
            }
        }

        symbols.sort();
        Ok(symbols)
    }

    fn get_data_range(
        &self,
        symbol: &str,
    ) -> Result<Option<(NaiveDate, NaiveDate, usize)>, SigtraderError> {
        let bars = self.read_all(symbol)?;
        Ok(match (bars.first(), bars.last()) {
            (Some(first), Some(last)) => Some((first.date, last.date, bars.len())),
            _ => None,
        })
    }
}
