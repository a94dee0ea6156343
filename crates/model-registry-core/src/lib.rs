//! Core wire model for the Model Registry and Model Catalog REST APIs
//!
//! This crate holds everything that can be expressed without I/O:
//! - Entities mirrored from the registry (registered models, versions,
//!   artifacts, experiments, runs) and the catalog
//! - The custom-property codec that maps plain values to tagged
//!   `{<type>_value, metadataType}` envelopes and back
//! - The filter-query builder used for `filterQuery` parameters
//! - Pagination envelopes and list options

pub mod catalog;
pub mod entities;
pub mod error;
pub mod filter;
pub mod pagination;
pub mod properties;
pub mod wire;

pub use catalog::{
    CatalogArtifact, CatalogArtifactQuery, CatalogModel, CatalogModelQuery, CatalogOrderBy,
    CatalogSource, FilterOption, FilterOptions, FilterRange, PreviewFilter, PreviewModel,
    PreviewSummary, SourcePreviewRequest, SourcePreviewResult,
};
pub use entities::{
    Artifact, ArtifactState, ArtifactType, ArtifactUpdate, DataSet, DocArtifact, Experiment,
    ExperimentRun, ExperimentRunState, ExperimentRunStatus, ExperimentRunUpdate, ExperimentState,
    ExperimentUpdate, Metric, ModelArtifact, ModelVersion, ModelVersionState, ModelVersionUpdate,
    Parameter, ParameterType, RegisteredModel, RegisteredModelState, RegisteredModelUpdate,
};
pub use error::{CodecError, CodecResult};
pub use filter::{Condition, FieldRef, FilterQuery, Literal, Operator, ValueType};
pub use pagination::{ListOptions, OrderBy, Page, PageCursor, SortOrder};
pub use properties::{
    CustomProperties, DecodeMode, EncodeMode, MetadataValue, Properties, PropertyCodec,
    PropertyValue,
};
