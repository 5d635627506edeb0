//! Data models for ongi-artifacts

pub mod artifact;
pub mod changes;
pub mod feed;

pub use artifact::{
    Artifact, ArtifactDetail, ArtifactStatus, ArtifactSummary, NewArtifact, DEFAULT_MODEL_VERSION,
};
pub use changes::{ArtifactChanges, FieldErrors};
pub use feed::{Feed, NewFeed};
