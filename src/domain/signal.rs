//! Entry and exit signal evaluation.
//!
//! Each enabled indicator family contributes one entry rule and one exit rule;
//! the signal fires if any of them fires. Rules whose inputs are still warming
//! up cannot fire. A stop-loss breach forces an exit and skips the indicator
//! rules for that bar.

use crate::domain::indicator::{IndicatorFamily, IndicatorKind, IndicatorSnapshot};
use crate::domain::position::Position;
use crate::domain::strategy::StrategyConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitReason {
    StopLoss,
    Indicator,
}

pub fn entry_signal(snapshot: &IndicatorSnapshot, config: &StrategyConfig) -> bool {
    config
        .enabled()
        .iter()
        .any(|&family| entry_rule_fires(family, snapshot, config))
}

pub fn exit_reason(
    snapshot: &IndicatorSnapshot,
    config: &StrategyConfig,
    position: &Position,
) -> Option<ExitReason> {
    if position.should_stop_loss(snapshot.close()) {
        return Some(ExitReason::StopLoss);
    }
    config
        .enabled()
        .iter()
        .any(|&family| exit_rule_fires(family, snapshot, config))
        .then_some(ExitReason::Indicator)
}

pub fn exit_signal(
    snapshot: &IndicatorSnapshot,
    config: &StrategyConfig,
    position: &Position,
) -> bool {
    exit_reason(snapshot, config, position).is_some()
}

fn entry_rule_fires(
    family: IndicatorFamily,
    snapshot: &IndicatorSnapshot,
    config: &StrategyConfig,
) -> bool {
    match family {
        IndicatorFamily::Sma => above(snapshot, IndicatorKind::ShortSma, IndicatorKind::LongSma),
        IndicatorFamily::Ema => above(snapshot, IndicatorKind::ShortEma, IndicatorKind::LongEma),
        IndicatorFamily::Rsi => matches!(
            snapshot.value(IndicatorKind::Rsi),
            Ok(rsi) if rsi < config.params().rsi_oversold
        ),
        IndicatorFamily::Macd => above(
            snapshot,
            IndicatorKind::MacdLine,
            IndicatorKind::MacdSignal,
        ),
    }
}

fn exit_rule_fires(
    family: IndicatorFamily,
    snapshot: &IndicatorSnapshot,
    config: &StrategyConfig,
) -> bool {
    match family {
        IndicatorFamily::Sma => above(snapshot, IndicatorKind::LongSma, IndicatorKind::ShortSma),
        IndicatorFamily::Ema => above(snapshot, IndicatorKind::LongEma, IndicatorKind::ShortEma),
        IndicatorFamily::Rsi => matches!(
            snapshot.value(IndicatorKind::Rsi),
            Ok(rsi) if rsi > config.params().rsi_overbought
        ),
        IndicatorFamily::Macd => above(
            snapshot,
            IndicatorKind::MacdSignal,
            IndicatorKind::MacdLine,
        ),
    }
}

/// `left > right`, false when either side is undefined.
fn above(snapshot: &IndicatorSnapshot, left: IndicatorKind, right: IndicatorKind) -> bool {
    match (snapshot.value(left), snapshot.value(right)) {
        (Ok(l), Ok(r)) => l > r,
        _ => false,
    }
}
