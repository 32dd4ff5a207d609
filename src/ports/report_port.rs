//! Report generation port trait.

use std::path::Path;

use crate::domain::backtest::BacktestResult;
use crate::domain::error::SigtraderError;
use crate::domain::strategy::StrategyConfig;

/// Port for writing backtest reports.
pub trait ReportPort {
    fn write(
        &self,
        symbol: &str,
        result: &BacktestResult,
        strategy: &StrategyConfig,
        output_path: &Path,
    ) -> Result<(), SigtraderError>;
}
