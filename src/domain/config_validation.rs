//! Configuration validation.
//!
//! Strategy parameters are checked once when a [`StrategyConfig`] is built;
//! the `[backtest]` INI section is checked before any data is fetched.
//!
//! [`StrategyConfig`]: crate::domain::strategy::StrategyConfig

use crate::domain::backtest::DEFAULT_INITIAL_VALUE;
use crate::domain::error::SigtraderError;
use crate::domain::strategy::StrategyParams;
use crate::ports::config_port::ConfigPort;
use chrono::NaiveDate;

pub fn validate_strategy_params(params: &StrategyParams) -> Result<(), SigtraderError> {
    validate_periods(params)?;
    validate_rsi_thresholds(params)?;
    validate_stop_loss(params)?;
    Ok(())
}

pub fn validate_backtest_config(config: &dyn ConfigPort) -> Result<(), SigtraderError> {
    validate_initial_value(config)?;
    validate_dates(config)?;
    validate_symbol(config)?;
    Ok(())
}

fn validate_periods(params: &StrategyParams) -> Result<(), SigtraderError> {
    let periods = [
        ("short_window", params.short_window),
        ("long_window", params.long_window),
        ("rsi_period", params.rsi_period),
        ("macd_short", params.macd_short),
        ("macd_long", params.macd_long),
        ("macd_signal", params.macd_signal),
    ];
    for (field, period) in periods {
        if period < 1 {
            return Err(SigtraderError::invalid(field, "period must be at least 1"));
        }
    }
    Ok(())
}

fn validate_rsi_thresholds(params: &StrategyParams) -> Result<(), SigtraderError> {
    for (field, value) in [
        ("rsi_oversold", params.rsi_oversold),
        ("rsi_overbought", params.rsi_overbought),
    ] {
        if !value.is_finite() || !(0.0..=100.0).contains(&value) {
            return Err(SigtraderError::invalid(
                field,
                "threshold must be between 0 and 100",
            ));
        }
    }
    if params.rsi_oversold >= params.rsi_overbought {
        return Err(SigtraderError::invalid(
            "rsi_oversold",
            "oversold threshold must be below the overbought threshold",
        ));
    }
    Ok(())
}

fn validate_stop_loss(params: &StrategyParams) -> Result<(), SigtraderError> {
    if !params.stop_loss_pct.is_finite() || params.stop_loss_pct < 0.0 {
        return Err(SigtraderError::invalid(
            "stop_loss_pct",
            "stop_loss_pct must be non-negative",
        ));
    }
    Ok(())
}

fn validate_initial_value(config: &dyn ConfigPort) -> Result<(), SigtraderError> {
    initial_value(config).map(|_| ())
}

fn validate_dates(config: &dyn ConfigPort) -> Result<(), SigtraderError> {
    backtest_dates(config).map(|_| ())
}

/// `[backtest] initial_value`, defaulting to [`DEFAULT_INITIAL_VALUE`]; must be positive.
pub fn initial_value(config: &dyn ConfigPort) -> Result<f64, SigtraderError> {
    let value = config.get_double("backtest", "initial_value", DEFAULT_INITIAL_VALUE);
    if !value.is_finite() || value <= 0.0 {
        return Err(SigtraderError::invalid(
            "initial_value",
            "initial_value must be positive",
        ));
    }
    Ok(value)
}

/// `[backtest] start_date` and `end_date`, with start ≤ end.
pub fn backtest_dates(config: &dyn ConfigPort) -> Result<(NaiveDate, NaiveDate), SigtraderError> {
    let start_str = config.get_string("backtest", "start_date");
    let end_str = config.get_string("backtest", "end_date");

    let start_date = parse_date(start_str.as_deref(), "start_date")?;
    let end_date = parse_date(end_str.as_deref(), "end_date")?;

    if start_date > end_date {
        return Err(SigtraderError::invalid(
            "start_date",
            "start_date cannot be after end_date",
        ));
    }
    Ok((start_date, end_date))
}

fn parse_date(value: Option<&str>, field: &str) -> Result<NaiveDate, SigtraderError> {
    match value {
        None => Err(SigtraderError::ConfigMissing {
            section: "backtest".to_string(),
            key: field.to_string(),
        }),
        Some(s) => NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d").map_err(|_| {
            SigtraderError::invalid(field, format!("invalid {field} format, expected YYYY-MM-DD"))
        }),
    }
}

fn validate_symbol(config: &dyn ConfigPort) -> Result<(), SigtraderError> {
    match config.get_string("backtest", "symbol") {
        Some(s) if !s.trim().is_empty() => Ok(()),
        _ => Err(SigtraderError::ConfigMissing {
            section: "backtest".to_string(),
            key: "symbol".to_string(),
        }),
    }
}
