//! Reporting and artifact export pipeline.

pub mod artifacts;

pub use artifacts::{ArtifactManager, ArtifactPaths, RunManifest};
