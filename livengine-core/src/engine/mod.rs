//! Execution: the ledger and the bar loop that drives a strategy through it.

pub mod ledger;
pub mod loop_runner;

pub use ledger::ExecutionLedger;
pub use loop_runner::{run_strategy, CapsuleSink, EngineError, NullSink, RunOutput, SinkError};
