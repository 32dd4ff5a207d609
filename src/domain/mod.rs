//! Core domain types and logic.

pub mod ohlcv;
pub mod strategy;
pub mod config_validation;
pub mod indicator;
pub mod signal;
pub mod position;
pub mod ledger;
pub mod metrics;
pub mod backtest;
pub mod error;
