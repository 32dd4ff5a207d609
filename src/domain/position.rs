//! Single-position lifecycle: FLAT -> (pending buy) -> LONG -> (pending sell) -> FLAT.
//!
//! Orders fill at the bar's close in the same bar they are submitted, so the
//! pending states never survive a bar boundary. They still gate submission:
//! only one order may be outstanding at a time.

use chrono::NaiveDate;
use tracing::debug;

use crate::domain::error::SigtraderError;
use crate::domain::indicator::IndicatorSnapshot;
use crate::domain::ledger::{Trade, TradeLedger};
use crate::domain::ohlcv::OhlcvBar;
use crate::domain::signal::{entry_signal, exit_reason, ExitReason};
use crate::domain::strategy::StrategyConfig;

#[derive(Debug, Clone, PartialEq)]
pub struct Position {
    pub entry_price: f64,
    pub entry_date: NaiveDate,
    pub stop_price: Option<f64>,
}

impl Position {
    /// True when `price` closes strictly below the stop.
    pub fn should_stop_loss(&self, price: f64) -> bool {
        matches!(self.stop_price, Some(stop) if price < stop)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum PositionState {
    Flat,
    Long(Position),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderSide {
    Buy,
    Sell,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PendingOrder {
    pub side: OrderSide,
    pub price: f64,
    pub exit_reason: Option<ExitReason>,
}

/// A state change produced by a fill.
#[derive(Debug, Clone, PartialEq)]
pub enum Transition {
    Bought {
        date: NaiveDate,
        price: f64,
    },
    Sold {
        date: NaiveDate,
        trade: Trade,
        reason: ExitReason,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct PositionMachine {
    state: PositionState,
    pending: Option<PendingOrder>,
    stop_loss_pct: Option<f64>,
}

impl PositionMachine {
    pub fn new(config: &StrategyConfig) -> Self {
        PositionMachine {
            state: PositionState::Flat,
            pending: None,
            stop_loss_pct: config.stop_loss_pct(),
        }
    }

    pub fn state(&self) -> &PositionState {
        &self.state
    }

    pub fn is_flat(&self) -> bool {
        matches!(self.state, PositionState::Flat)
    }

    pub fn position(&self) -> Option<&Position> {
        match &self.state {
            PositionState::Long(pos) => Some(pos),
            PositionState::Flat => None,
        }
    }

    pub fn pending_order(&self) -> Option<&PendingOrder> {
        self.pending.as_ref()
    }

    pub fn into_position(self) -> Option<Position> {
        match self.state {
            PositionState::Long(pos) => Some(pos),
            PositionState::Flat => None,
        }
    }

    /// Queue an order. Rejects a second outstanding order, a buy while long,
    /// and a sell while flat.
    pub fn submit(
        &mut self,
        side: OrderSide,
        price: f64,
        exit_reason: Option<ExitReason>,
    ) -> Result<(), SigtraderError> {
        if self.pending.is_some() {
            return Err(SigtraderError::OrderRejected {
                reason: "an order is already pending".into(),
            });
        }
        match (side, &self.state) {
            (OrderSide::Buy, PositionState::Long(_)) => {
                return Err(SigtraderError::OrderRejected {
                    reason: "already long; exit before buying again".into(),
                });
            }
            (OrderSide::Sell, PositionState::Flat) => {
                return Err(SigtraderError::OrderRejected {
                    reason: "no open position to sell".into(),
                });
            }
            _ => {}
        }
        self.pending = Some(PendingOrder {
            side,
            price,
            exit_reason,
        });
        Ok(())
    }

    /// Fill the pending order, if any, updating `ledger`.
    pub fn fill(&mut self, date: NaiveDate, ledger: &mut TradeLedger) -> Option<Transition> {
        let order = self.pending.take()?;
        match order.side {
            OrderSide::Buy => {
                let stop_price = self
                    .stop_loss_pct
                    .map(|pct| order.price * (1.0 - pct / 100.0));
                self.state = PositionState::Long(Position {
                    entry_price: order.price,
                    entry_date: date,
                    stop_price,
                });
                ledger.record_buy();
                ledger.log(date, format!("BUY EXECUTED, {:.2}", order.price));
                debug!(%date, price = order.price, "buy filled");
                Some(Transition::Bought {
                    date,
                    price: order.price,
                })
            }
            OrderSide::Sell => {
                let PositionState::Long(pos) =
                    std::mem::replace(&mut self.state, PositionState::Flat)
                else {
                    return None;
                };
                let reason = order.exit_reason.unwrap_or(ExitReason::Indicator);
                let trade = ledger.record_trade(pos.entry_price, order.price).clone();
                let text = match reason {
                    ExitReason::StopLoss => {
                        format!("STOP-LOSS TRIGGERED, SELL EXECUTED, {:.2}", order.price)
                    }
                    ExitReason::Indicator => format!("SELL EXECUTED, {:.2}", order.price),
                };
                ledger.log(date, text);
                debug!(%date, price = order.price, pnl = trade.profit_loss, ?reason, "sell filled");
                Some(Transition::Sold {
                    date,
                    trade,
                    reason,
                })
            }
        }
    }

    /// Evaluate the bar's signals and fill at most one order at its close.
    pub fn on_bar(
        &mut self,
        bar: &OhlcvBar,
        snapshot: &IndicatorSnapshot,
        config: &StrategyConfig,
        ledger: &mut TradeLedger,
    ) -> Result<Option<Transition>, SigtraderError> {
        if self.pending.is_some() {
            return Ok(None);
        }

        let order = match &self.state {
            PositionState::Flat => {
                entry_signal(snapshot, config).then_some((OrderSide::Buy, None))
            }
            PositionState::Long(pos) => {
                exit_reason(snapshot, config, pos).map(|r| (OrderSide::Sell, Some(r)))
            }
        };

        match order {
            Some((side, reason)) => {
                self.submit(side, bar.close, reason)?;
                Ok(self.fill(bar.date, ledger))
            }
            None => Ok(None),
        }
    }
}
