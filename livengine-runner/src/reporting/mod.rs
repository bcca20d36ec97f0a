//! Reporting and artifact export pipeline.

pub mod artifacts;
pub mod narrative;
pub mod proof_bridge;

pub use artifacts::{ArtifactManager, ArtifactPaths, RunManifest};
pub use narrative::{make_day_summary, RunVerdict};
pub use proof_bridge::{ProofBridge, ProofStats};
