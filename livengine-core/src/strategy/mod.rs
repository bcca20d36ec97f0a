//! Strategy contract and the concrete decision engines.
//!
//! A strategy sees one bar at a time and answers with at most one order and
//! at most one diagnostic capsule. It owns its rolling state exclusively and
//! never sees cash or equity: the ledger applies whatever it emits.

pub mod ema_cross;
pub mod imm_core;

pub use ema_cross::EmaCross;
pub use imm_core::ImmCore;

use crate::domain::{Bar, Capsule, Order};
use crate::params::{StrategyKind, StrategyParams};

/// Output of one `process_bar` call.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BarDecision {
    pub order: Option<Order>,
    pub capsule: Option<Capsule>,
}

impl BarDecision {
    pub fn none() -> Self {
        Self::default()
    }
}

/// Lifecycle: `initialize` once, `process_bar` per bar in order, `finalize` once.
pub trait Strategy: Send {
    fn name(&self) -> &str;

    /// Clear all rolling state so the instance can start a fresh run.
    fn initialize(&mut self);

    fn process_bar(&mut self, bar: &Bar) -> BarDecision;

    fn finalize(&mut self);

    /// Position the strategy believes it holds (0 or the unit size).
    fn position(&self) -> f64;
}

/// Build the strategy selected by `params.strategy`.
pub fn build_strategy(params: &StrategyParams) -> Box<dyn Strategy> {
    match params.strategy {
        StrategyKind::ImmCore => Box::new(ImmCore::new(params)),
        StrategyKind::EmaCross => Box::new(EmaCross::new(params)),
    }
}
