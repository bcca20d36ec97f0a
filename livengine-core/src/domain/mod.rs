//! Domain types for the living engine.

pub mod bar;
pub mod capsule;
pub mod order;
pub mod trade;

pub use bar::{validate_bars, Bar};
pub use capsule::{Capsule, CapsuleRecord, EntropySource, Glyph, Regime, Verdict};
pub use order::{Order, OrderSide};
pub use trade::{Trade, TradeAction};
