//! Capsule — per-bar diagnostic snapshot.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Two-valued marker: entropy at or under the entry threshold vs above it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Glyph {
    #[serde(rename = "⧖")]
    Calm,
    #[serde(rename = "⌛")]
    Restless,
}

impl Glyph {
    pub fn for_entropy(entropy: f64, entropy_threshold: f64) -> Self {
        if entropy <= entropy_threshold {
            Glyph::Calm
        } else {
            Glyph::Restless
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Glyph::Calm => "⧖",
            Glyph::Restless => "⌛",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntropySource {
    /// Taken from the bar's own `entropy` field.
    Market,
    /// Estimated from recent closes.
    Derived,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Verdict {
    Long,
    Flat,
}

impl Verdict {
    pub fn as_str(&self) -> &'static str {
        match self {
            Verdict::Long => "LONG",
            Verdict::Flat => "FLAT",
        }
    }
}

/// Entropy band, ordered from calmest to most unstable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Regime {
    #[serde(rename = "P")]
    P,
    #[serde(rename = "NP")]
    Np,
    #[serde(rename = "DRIFT")]
    Drift,
    #[serde(rename = "COLLAPSE")]
    Collapse,
}

impl Regime {
    pub fn as_str(&self) -> &'static str {
        match self {
            Regime::P => "P",
            Regime::Np => "NP",
            Regime::Drift => "DRIFT",
            Regime::Collapse => "COLLAPSE",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Capsule {
    pub glyph: Glyph,
    pub entropy: f64,
    pub entropy_source: EntropySource,
    pub atr: f64,
    pub fast_ma: f64,
    pub slow_ma: f64,
    pub verdict: Verdict,
    pub regime: Regime,
    pub collapse_guard: bool,
    pub recovery_count: u32,
}

/// A capsule stamped with the timestamp of the bar that produced it.
///
/// Serializes flat (`{"ts": ..., "glyph": ..., ...}`), one per JSONL line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CapsuleRecord {
    pub ts: DateTime<Utc>,
    #[serde(flatten)]
    pub capsule: Capsule,
}
