//! Livengine Core — domain types, rolling indicators, the entropy regime
//! guard, strategies, and the execution ledger.
//!
//! This crate contains the decision engine and nothing that touches a file:
//! - Domain types (bars, orders, trades, capsules)
//! - Validated, immutable strategy parameters
//! - Bounded rolling indicators (SMA, EMA, ATR, return-volatility entropy)
//! - Regime classification and the collapse guard
//! - The `Strategy` contract with the ImmCore and EmaCross variants
//! - The ledger and the bar loop that ties them together

pub mod domain;
pub mod engine;
pub mod error;
pub mod indicators;
pub mod params;
pub mod regime;
pub mod strategy;

pub use engine::{run_strategy, CapsuleSink, EngineError, ExecutionLedger, NullSink, RunOutput};
pub use error::{DataError, LedgerError};
pub use params::{ParamsBuilder, ParamsError, StrategyKind, StrategyParams};
pub use strategy::{build_strategy, BarDecision, Strategy};
