//! Domain error types.

use chrono::NaiveDate;

use crate::domain::indicator::IndicatorKind;

/// Top-level error type for sigtrader.
#[derive(Debug, thiserror::Error)]
pub enum SigtraderError {
    #[error("config parse error in {file}: {reason}")]
    ConfigParse { file: String, reason: String },

    #[error("missing config key [{section}] {key}")]
    ConfigMissing { section: String, key: String },

    #[error("invalid configuration for {field}: {reason}")]
    InvalidConfiguration { field: String, reason: String },

    #[error("no bars supplied; a backtest needs at least one bar")]
    EmptyInputData,

    #[error("bars out of order at index {index} ({date}); dates must be strictly increasing")]
    UnorderedBars { index: usize, date: NaiveDate },

    #[error("invalid close {close} at index {index} ({date}); closes must be finite and positive")]
    InvalidPrice {
        index: usize,
        date: NaiveDate,
        close: f64,
    },

    #[error("{indicator} is still warming up")]
    InsufficientHistory { indicator: IndicatorKind },

    #[error("order rejected: {reason}")]
    OrderRejected { reason: String },

    #[error("data source error: {reason}")]
    Data { reason: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl SigtraderError {
    pub(crate) fn invalid(field: &str, reason: impl Into<String>) -> Self {
        SigtraderError::InvalidConfiguration {
            field: field.to_string(),
            reason: reason.into(),
        }
    }
}

impl From<&SigtraderError> for std::process::ExitCode {
    fn from(err: &SigtraderError) -> Self {
        let code: u8 = match err {
            SigtraderError::Io(_) => 1,
            SigtraderError::ConfigParse { .. }
            | SigtraderError::ConfigMissing { .. }
            | SigtraderError::InvalidConfiguration { .. } => 2,
            SigtraderError::Data { .. } | SigtraderError::InvalidPrice { .. } => 3,
            SigtraderError::OrderRejected { .. } | SigtraderError::InsufficientHistory { .. } => 4,
            SigtraderError::EmptyInputData | SigtraderError::UnorderedBars { .. } => 5,
        };
        std::process::ExitCode::from(code)
    }
}
