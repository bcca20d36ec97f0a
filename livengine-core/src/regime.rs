//! Entropy regime classification and the collapse guard.
//!
//! Bands (with `entropy_threshold < np_threshold < entropy_exit`):
//!
//! | entropy                              | regime   |
//! |--------------------------------------|----------|
//! | `< entropy_threshold`                | P        |
//! | `< np_threshold`                     | NP       |
//! | `< entropy_exit`                     | DRIFT    |
//! | `>= entropy_exit`                    | COLLAPSE |
//!
//! The collapse guard is a sticky flag: it sets on any COLLAPSE reading and
//! clears only after `recovery_window` consecutive readings below
//! `np_threshold`. A reading in `[np_threshold, entropy_exit)` while
//! collapsed restarts the count.

use crate::domain::Regime;
use crate::params::StrategyParams;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RegimeThresholds {
    pub entropy_threshold: f64,
    pub np_threshold: f64,
    pub entropy_exit: f64,
}

impl RegimeThresholds {
    pub fn from_params(params: &StrategyParams) -> Self {
        Self {
            entropy_threshold: params.entropy_threshold,
            np_threshold: params.np_threshold,
            entropy_exit: params.entropy_exit,
        }
    }

    pub fn classify(&self, entropy: f64) -> Regime {
        if entropy >= self.entropy_exit {
            Regime::Collapse
        } else if entropy < self.entropy_threshold {
            Regime::P
        } else if entropy < self.np_threshold {
            Regime::Np
        } else {
            Regime::Drift
        }
    }
}

/// What a single guard update did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuardTransition {
    /// Nothing changed state-wise (the counter may still have moved).
    Unchanged,
    /// Flag went from clear to set.
    Entered,
    /// Already set; a fresh collapse reading reset recovery progress.
    Retriggered,
    /// Recovery window satisfied; flag cleared.
    Recovered,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollapseGuard {
    recovery_window: u32,
    in_collapse: bool,
    recovery_count: u32,
}

impl CollapseGuard {
    /// A `recovery_window` of 0 disables the guard entirely.
    pub fn new(recovery_window: u32) -> Self {
        Self {
            recovery_window,
            in_collapse: false,
            recovery_count: 0,
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.recovery_window > 0
    }

    pub fn in_collapse(&self) -> bool {
        self.in_collapse
    }

    pub fn recovery_count(&self) -> u32 {
        self.recovery_count
    }

    pub fn update(&mut self, entropy: f64, thresholds: &RegimeThresholds) -> GuardTransition {
        if !self.is_enabled() {
            return GuardTransition::Unchanged;
        }

        if entropy >= thresholds.entropy_exit {
            let was_collapsed = self.in_collapse;
            self.in_collapse = true;
            self.recovery_count = 0;
            return if was_collapsed {
                GuardTransition::Retriggered
            } else {
                GuardTransition::Entered
            };
        }

        if !self.in_collapse {
            return GuardTransition::Unchanged;
        }

        if entropy < thresholds.np_threshold {
            self.recovery_count += 1;
            if self.recovery_count >= self.recovery_window {
                self.in_collapse = false;
                self.recovery_count = 0;
                return GuardTransition::Recovered;
            }
        } else {
            self.recovery_count = 0;
        }

        GuardTransition::Unchanged
    }

    pub fn reset(&mut self) {
        self.in_collapse = false;
        self.recovery_count = 0;
    }
}
