//! Strategy configuration.
//!
//! [`StrategyParams`] is the raw, editable parameter record; [`StrategyConfig`]
//! is the validated, immutable value handed to every component of a run.

use crate::domain::config_validation::validate_strategy_params;
use crate::domain::error::SigtraderError;
use crate::domain::indicator::IndicatorFamily;

#[derive(Debug, Clone, PartialEq)]
pub struct StrategyParams {
    pub use_sma: bool,
    pub use_ema: bool,
    pub use_rsi: bool,
    pub use_macd: bool,
    pub short_window: usize,
    pub long_window: usize,
    pub rsi_period: usize,
    pub rsi_overbought: f64,
    pub rsi_oversold: f64,
    pub use_stop_loss: bool,
    pub stop_loss_pct: f64,
    pub macd_short: usize,
    pub macd_long: usize,
    pub macd_signal: usize,
}

impl Default for StrategyParams {
    fn default() -> Self {
        StrategyParams {
            use_sma: true,
            use_ema: true,
            use_rsi: true,
            use_macd: true,
            short_window: 10,
            long_window: 30,
            rsi_period: 14,
            rsi_overbought: 70.0,
            rsi_oversold: 30.0,
            use_stop_loss: false,
            stop_loss_pct: 1.0,
            macd_short: 12,
            macd_long: 26,
            macd_signal: 9,
        }
    }
}

impl StrategyParams {
    /// Parameters with every indicator family switched off.
    pub fn none_enabled() -> Self {
        StrategyParams {
            use_sma: false,
            use_ema: false,
            use_rsi: false,
            use_macd: false,
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct StrategyConfig {
    params: StrategyParams,
    enabled: Vec<IndicatorFamily>,
}

impl StrategyConfig {
    pub fn new(params: StrategyParams) -> Result<Self, SigtraderError> {
        validate_strategy_params(&params)?;

        let enabled = [
            (params.use_sma, IndicatorFamily::Sma),
            (params.use_ema, IndicatorFamily::Ema),
            (params.use_rsi, IndicatorFamily::Rsi),
            (params.use_macd, IndicatorFamily::Macd),
        ]
        .into_iter()
        .filter_map(|(on, family)| on.then_some(family))
        .collect();

        Ok(StrategyConfig { params, enabled })
    }

    pub fn params(&self) -> &StrategyParams {
        &self.params
    }

    /// Enabled indicator families, in evaluation order.
    pub fn enabled(&self) -> &[IndicatorFamily] {
        &self.enabled
    }

    /// Stop-loss percentage, or `None` when the stop is switched off.
    pub fn stop_loss_pct(&self) -> Option<f64> {
        self.params
            .use_stop_loss
            .then_some(self.params.stop_loss_pct)
    }
}
