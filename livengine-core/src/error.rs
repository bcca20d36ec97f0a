//! Error types shared across the engine.

use thiserror::Error;

/// Input that cannot be processed. Aborts the run before any partial result.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DataError {
    #[error("bar sequence is empty")]
    EmptyBars,

    #[error("equity curve is empty")]
    EmptyEquity,

    #[error("bar {index} at {timestamp}: field '{field}' is not finite")]
    NonFinite {
        index: usize,
        timestamp: String,
        field: &'static str,
    },

    #[error("bar {index} at {timestamp} precedes the previous bar at {previous}")]
    TimestampOrder {
        index: usize,
        timestamp: String,
        previous: String,
    },
}

/// An order that contradicts the ledger's position state.
///
/// Strategies only emit `long` when flat and `flat` when holding, so these
/// indicate a broken strategy rather than bad input.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum LedgerError {
    #[error("entry order while already holding {position}")]
    EntryWhileHolding { position: f64 },

    #[error("exit order while flat")]
    ExitWhileFlat,

    #[error("order size must be positive and finite, got {0}")]
    InvalidSize(f64),

    #[error("order price must be finite, got {0}")]
    InvalidPrice(f64),
}
