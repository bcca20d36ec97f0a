//! Plain-text day summary for `summary.txt`.

use serde::Serialize;

use crate::metrics::Metrics;

/// Drawdown above which the summary turns cautious.
pub const CAUTIOUS_DRAWDOWN: f64 = 0.15;

/// Run-level label: `P≠NP (claim)` once any bar classified as COLLAPSE.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum RunVerdict {
    #[serde(rename = "OPEN")]
    Open,
    #[serde(rename = "P≠NP (claim)")]
    Claim,
}

impl RunVerdict {
    pub fn from_collapse_hits(collapse_hits: usize) -> Self {
        if collapse_hits > 0 {
            RunVerdict::Claim
        } else {
            RunVerdict::Open
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RunVerdict::Open => "OPEN",
            RunVerdict::Claim => "P≠NP (claim)",
        }
    }
}

pub fn make_day_summary(
    metrics: &Metrics,
    capsules_written: usize,
    verdict: RunVerdict,
    collapse_hits: usize,
) -> String {
    let cautious = metrics.max_drawdown > CAUTIOUS_DRAWDOWN;
    let mood = if cautious { "cautious" } else { "confident" };
    let posture = if cautious {
        "complexity spikes were frequent; risk posture remained measured"
    } else {
        "complexity spikes were not frequent; risk posture opened selectively"
    };

    format!(
        "Day Summary: the engine felt {mood}.\n\
         CAGR(est): {:.2}%, Sharpe: {:.2}, MaxDD: {:.2}%\n\
         Capsules generated: {capsules_written}.\n\
         Verdict: {} ({collapse_hits} collapse hits).\n\
         Translation: {posture}.\n",
        metrics.cagr_est * 100.0,
        metrics.sharpe,
        metrics.max_drawdown * 100.0,
        verdict.as_str(),
    )
}
