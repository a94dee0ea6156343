//! Typed adapters over the shared transport
//!
//! - [`registry`]: registered models, versions, artifacts, experiments, runs
//! - [`catalog`]: read-only catalog browsing and source preview
//! - [`tracking`]: experiment-tracking store backed by the registry

pub mod catalog;
pub mod registry;
pub mod tracking;

pub use catalog::ModelCatalogClient;
pub use registry::{ArtifactListQuery, ModelRegistryClient, RegisterModelRequest, RegisteredModelVersion};
pub use tracking::{RegistryTrackingStore, TrackingStore, ViewType};
