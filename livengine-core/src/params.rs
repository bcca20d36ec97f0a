//! Validated, immutable strategy parameters.
//!
//! `ParamsBuilder` collects whatever the configuration source supplied;
//! `build()` fills defaults, validates, and produces the single
//! `StrategyParams` value a run holds by reference.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Configuration problems. Aborts the run before any bar is read.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ParamsError {
    #[error("required parameter '{key}' is missing")]
    Missing { key: &'static str },

    #[error("parameter '{key}' is not numeric: {value}")]
    NotNumeric { key: String, value: String },

    #[error("parameter '{key}' must be a non-negative integer, got {value}")]
    NotInteger { key: String, value: f64 },

    #[error("parameter '{key}' must be finite, got {value}")]
    NonFinite { key: &'static str, value: f64 },

    #[error("window '{key}' must be at least 1")]
    ZeroWindow { key: &'static str },

    #[error(
        "entropy thresholds must satisfy entropy_threshold < np_threshold < entropy_exit \
         (got {entropy_threshold} / {np_threshold} / {entropy_exit})"
    )]
    ThresholdOrder {
        entropy_threshold: f64,
        np_threshold: f64,
        entropy_exit: f64,
    },

    #[error("ma_buffer must be in [0, 1), got {0}")]
    InvalidMaBuffer(f64),

    #[error("unit_size must be positive, got {0}")]
    InvalidUnitSize(f64),

    #[error("unknown strategy '{0}' (expected imm_core or ema_cross)")]
    UnknownStrategy(String),
}

/// Which decision logic drives the run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StrategyKind {
    /// SMA crossover gated by entropy, with the collapse guard.
    #[default]
    ImmCore,
    /// EMA crossover gated by market entropy only.
    EmaCross,
}

impl StrategyKind {
    pub fn parse(name: &str) -> Result<Self, ParamsError> {
        match name.trim().to_ascii_lowercase().as_str() {
            "imm_core" | "imm_core_v11" | "immcorev11" => Ok(StrategyKind::ImmCore),
            "ema_cross" | "ema" => Ok(StrategyKind::EmaCross),
            other => Err(ParamsError::UnknownStrategy(other.to_string())),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            StrategyKind::ImmCore => "imm_core",
            StrategyKind::EmaCross => "ema_cross",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StrategyParams {
    pub strategy: StrategyKind,
    pub lookback_fast: usize,
    pub lookback_slow: usize,
    pub atr_period: usize,
    pub entropy_window: usize,
    pub entropy_threshold: f64,
    pub np_threshold: f64,
    pub entropy_exit: f64,
    pub recovery_window: u32,
    pub ma_buffer: f64,
    pub unit_size: f64,
    pub starting_cash: f64,
}

impl StrategyParams {
    pub const DEFAULT_LOOKBACK_FAST: usize = 12;
    pub const DEFAULT_LOOKBACK_SLOW: usize = 48;
    pub const DEFAULT_ATR_PERIOD: usize = 14;
    pub const DEFAULT_ENTROPY_WINDOW: usize = 20;
    pub const DEFAULT_ENTROPY_THRESHOLD: f64 = 0.02;
    pub const DEFAULT_UNIT_SIZE: f64 = 1.0;
    pub const DEFAULT_STARTING_CASH: f64 = 50_000.0;

    pub fn builder() -> ParamsBuilder {
        ParamsBuilder::default()
    }

    /// Capacity of the close/high/low buffers.
    pub fn price_buffer_capacity(&self) -> usize {
        self.lookback_slow
            .max(self.entropy_window)
            .max(self.atr_period)
            + 1
    }
}

impl Default for StrategyParams {
    fn default() -> Self {
        let entropy_threshold = Self::DEFAULT_ENTROPY_THRESHOLD;
        let entropy_exit = entropy_threshold * 1.5;
        Self {
            strategy: StrategyKind::ImmCore,
            lookback_fast: Self::DEFAULT_LOOKBACK_FAST,
            lookback_slow: Self::DEFAULT_LOOKBACK_SLOW,
            atr_period: Self::DEFAULT_ATR_PERIOD,
            entropy_window: Self::DEFAULT_ENTROPY_WINDOW,
            entropy_threshold,
            np_threshold: (entropy_threshold + entropy_exit) / 2.0,
            entropy_exit,
            recovery_window: 0,
            ma_buffer: 0.0,
            unit_size: Self::DEFAULT_UNIT_SIZE,
            starting_cash: Self::DEFAULT_STARTING_CASH,
        }
    }
}

/// Partially specified parameters, as read from a configuration source.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParamsBuilder {
    pub strategy: Option<StrategyKind>,
    pub lookback_fast: Option<usize>,
    pub lookback_slow: Option<usize>,
    pub atr_period: Option<usize>,
    pub entropy_window: Option<usize>,
    pub entropy_threshold: Option<f64>,
    pub np_threshold: Option<f64>,
    pub entropy_exit: Option<f64>,
    pub recovery_window: Option<u32>,
    pub ma_buffer: Option<f64>,
    pub unit_size: Option<f64>,
    pub starting_cash: Option<f64>,
}

impl ParamsBuilder {
    pub fn strategy(mut self, kind: StrategyKind) -> Self {
        self.strategy = Some(kind);
        self
    }

    pub fn lookbacks(mut self, fast: usize, slow: usize) -> Self {
        self.lookback_fast = Some(fast);
        self.lookback_slow = Some(slow);
        self
    }

    pub fn atr_period(mut self, period: usize) -> Self {
        self.atr_period = Some(period);
        self
    }

    pub fn entropy_window(mut self, window: usize) -> Self {
        self.entropy_window = Some(window);
        self
    }

    pub fn thresholds(mut self, entropy_threshold: f64, np_threshold: f64, entropy_exit: f64) -> Self {
        self.entropy_threshold = Some(entropy_threshold);
        self.np_threshold = Some(np_threshold);
        self.entropy_exit = Some(entropy_exit);
        self
    }

    pub fn recovery_window(mut self, window: u32) -> Self {
        self.recovery_window = Some(window);
        self
    }

    pub fn ma_buffer(mut self, buffer: f64) -> Self {
        self.ma_buffer = Some(buffer);
        self
    }

    pub fn unit_size(mut self, size: f64) -> Self {
        self.unit_size = Some(size);
        self
    }

    pub fn starting_cash(mut self, cash: f64) -> Self {
        self.starting_cash = Some(cash);
        self
    }

    /// Apply defaults and validate.
    ///
    /// The EMA variant has no defaults for its three entropy thresholds; they
    /// must be supplied explicitly.
    pub fn build(self) -> Result<StrategyParams, ParamsError> {
        let strategy = self.strategy.unwrap_or_default();

        if strategy == StrategyKind::EmaCross {
            if self.entropy_threshold.is_none() {
                return Err(ParamsError::Missing {
                    key: "entropy_threshold",
                });
            }
            if self.np_threshold.is_none() {
                return Err(ParamsError::Missing { key: "np_threshold" });
            }
            if self.entropy_exit.is_none() {
                return Err(ParamsError::Missing { key: "entropy_exit" });
            }
        }

        let entropy_threshold = self
            .entropy_threshold
            .unwrap_or(StrategyParams::DEFAULT_ENTROPY_THRESHOLD);
        let entropy_exit = self.entropy_exit.unwrap_or(entropy_threshold * 1.5);
        let np_threshold = self
            .np_threshold
            .unwrap_or((entropy_threshold + entropy_exit) / 2.0);

        let params = StrategyParams {
            strategy,
            lookback_fast: self
                .lookback_fast
                .unwrap_or(StrategyParams::DEFAULT_LOOKBACK_FAST),
            lookback_slow: self
                .lookback_slow
                .unwrap_or(StrategyParams::DEFAULT_LOOKBACK_SLOW),
            atr_period: self.atr_period.unwrap_or(StrategyParams::DEFAULT_ATR_PERIOD),
            entropy_window: self
                .entropy_window
                .unwrap_or(StrategyParams::DEFAULT_ENTROPY_WINDOW),
            entropy_threshold,
            np_threshold,
            entropy_exit,
            recovery_window: self.recovery_window.unwrap_or(0),
            ma_buffer: self.ma_buffer.unwrap_or(0.0),
            unit_size: self.unit_size.unwrap_or(StrategyParams::DEFAULT_UNIT_SIZE),
            starting_cash: self
                .starting_cash
                .unwrap_or(StrategyParams::DEFAULT_STARTING_CASH),
        };

        validate(&params)?;
        Ok(params)
    }
}

fn validate(p: &StrategyParams) -> Result<(), ParamsError> {
    for (key, window) in [
        ("lookback_fast", p.lookback_fast),
        ("lookback_slow", p.lookback_slow),
        ("atr_period", p.atr_period),
        ("entropy_window", p.entropy_window),
    ] {
        if window == 0 {
            return Err(ParamsError::ZeroWindow { key });
        }
    }

    for (key, value) in [
        ("entropy_threshold", p.entropy_threshold),
        ("np_threshold", p.np_threshold),
        ("entropy_exit", p.entropy_exit),
        ("ma_buffer", p.ma_buffer),
        ("unit_size", p.unit_size),
        ("starting_cash", p.starting_cash),
    ] {
        if !value.is_finite() {
            return Err(ParamsError::NonFinite { key, value });
        }
    }

    if !(p.entropy_threshold < p.np_threshold && p.np_threshold < p.entropy_exit) {
        return Err(ParamsError::ThresholdOrder {
            entropy_threshold: p.entropy_threshold,
            np_threshold: p.np_threshold,
            entropy_exit: p.entropy_exit,
        });
    }

    if !(0.0..1.0).contains(&p.ma_buffer) {
        return Err(ParamsError::InvalidMaBuffer(p.ma_buffer));
    }

    if p.unit_size <= 0.0 {
        return Err(ParamsError::InvalidUnitSize(p.unit_size));
    }

    Ok(())
}
