//! Registry entities
//!
//! Client-side mirrors of the server's resources. Server-assigned fields
//! (`id`, timestamps, usually `state`) are optional and omitted from request
//! bodies when unset. `custom_properties` always holds plain values; the
//! transport converts them to and from wire envelopes.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::properties::{Properties, PropertyValue};
use crate::wire::{from_epoch_millis, opt_int64_string};

// ============================================================================
// Lifecycle enums
// ============================================================================

/// Lifecycle state of a registered model
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RegisteredModelState {
    #[default]
    Live,
    Archived,
}

/// Lifecycle state of a model version
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ModelVersionState {
    #[default]
    Live,
    Archived,
}

/// Lifecycle state of an experiment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ExperimentState {
    #[default]
    Live,
    Archived,
}

/// Lifecycle state of an experiment run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ExperimentRunState {
    #[default]
    Live,
    Archived,
}

/// Execution status of an experiment run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ExperimentRunStatus {
    Scheduled,
    Running,
    Finished,
    Failed,
    Killed,
}

impl ExperimentRunStatus {
    /// Whether the run can no longer change status
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            ExperimentRunStatus::Finished | ExperimentRunStatus::Failed | ExperimentRunStatus::Killed
        )
    }
}

/// Artifact lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ArtifactState {
    Unknown,
    Pending,
    Live,
    MarkedForDeletion,
    Deleted,
    Abandoned,
    Reference,
}

/// Declared type of a parameter value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParameterType {
    String,
    Number,
    Boolean,
    Object,
}

/// Artifact discriminator (`artifactType`)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ArtifactType {
    #[serde(rename = "model-artifact")]
    ModelArtifact,
    #[serde(rename = "doc-artifact")]
    DocArtifact,
    #[serde(rename = "dataset-artifact")]
    DatasetArtifact,
    #[serde(rename = "metric")]
    Metric,
    #[serde(rename = "parameter")]
    Parameter,
}

impl ArtifactType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ArtifactType::ModelArtifact => "model-artifact",
            ArtifactType::DocArtifact => "doc-artifact",
            ArtifactType::DatasetArtifact => "dataset-artifact",
            ArtifactType::Metric => "metric",
            ArtifactType::Parameter => "parameter",
        }
    }
}

impl std::fmt::Display for ArtifactType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// Models and versions
// ============================================================================

/// A named model in the registry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct RegisteredModel {
    /// Server-assigned identifier
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// Client-assigned name, immutable once created
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub external_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<RegisteredModelState>,
    #[serde(default, with = "opt_int64_string", skip_serializing_if = "Option::is_none")]
    pub create_time_since_epoch: Option<i64>,
    #[serde(default, with = "opt_int64_string", skip_serializing_if = "Option::is_none")]
    pub last_update_time_since_epoch: Option<i64>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub custom_properties: Properties,
}

impl RegisteredModel {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_owner(mut self, owner: impl Into<String>) -> Self {
        self.owner = Some(owner.into());
        self
    }

    pub fn with_property(mut self, key: impl Into<String>, value: impl Into<PropertyValue>) -> Self {
        self.custom_properties.insert(key.into(), value.into());
        self
    }
}

/// Fields that may change on a registered model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct RegisteredModelUpdate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub external_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<RegisteredModelState>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom_properties: Option<Properties>,
}

/// A version of a registered model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct ModelVersion {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub name: String,
    /// Owning registered model
    pub registered_model_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub external_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<ModelVersionState>,
    #[serde(default, with = "opt_int64_string", skip_serializing_if = "Option::is_none")]
    pub create_time_since_epoch: Option<i64>,
    #[serde(default, with = "opt_int64_string", skip_serializing_if = "Option::is_none")]
    pub last_update_time_since_epoch: Option<i64>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub custom_properties: Properties,
}

impl ModelVersion {
    pub fn new(name: impl Into<String>, registered_model_id: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            registered_model_id: registered_model_id.into(),
            ..Default::default()
        }
    }

    pub fn with_author(mut self, author: impl Into<String>) -> Self {
        self.author = Some(author.into());
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_property(mut self, key: impl Into<String>, value: impl Into<PropertyValue>) -> Self {
        self.custom_properties.insert(key.into(), value.into());
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct ModelVersionUpdate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub external_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<ModelVersionState>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom_properties: Option<Properties>,
}

// ============================================================================
// Artifacts
// ============================================================================

/// Stored model weights and where to find them
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct ModelArtifact {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub external_id: Option<String>,
    /// Storage location (`s3://...`, `oci://...`)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uri: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<ArtifactState>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model_format_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model_format_version: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub storage_key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub storage_path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub service_account_name: Option<String>,
    /// Set when the artifact was logged from an experiment
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub experiment_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub experiment_run_id: Option<String>,
    #[serde(default, with = "opt_int64_string", skip_serializing_if = "Option::is_none")]
    pub create_time_since_epoch: Option<i64>,
    #[serde(default, with = "opt_int64_string", skip_serializing_if = "Option::is_none")]
    pub last_update_time_since_epoch: Option<i64>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub custom_properties: Properties,
}

impl ModelArtifact {
    pub fn new(name: impl Into<String>, uri: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            uri: Some(uri.into()),
            ..Default::default()
        }
    }

    pub fn with_format(mut self, name: impl Into<String>, version: Option<String>) -> Self {
        self.model_format_name = Some(name.into());
        self.model_format_version = version;
        self
    }

    pub fn with_property(mut self, key: impl Into<String>, value: impl Into<PropertyValue>) -> Self {
        self.custom_properties.insert(key.into(), value.into());
        self
    }
}

/// Documentation attached to a version or run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct DocArtifact {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub external_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uri: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<ArtifactState>,
    #[serde(default, with = "opt_int64_string", skip_serializing_if = "Option::is_none")]
    pub create_time_since_epoch: Option<i64>,
    #[serde(default, with = "opt_int64_string", skip_serializing_if = "Option::is_none")]
    pub last_update_time_since_epoch: Option<i64>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub custom_properties: Properties,
}

/// Dataset used as a run input
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct DataSet {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub external_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uri: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<ArtifactState>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub digest: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schema: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub profile: Option<String>,
    #[serde(default, with = "opt_int64_string", skip_serializing_if = "Option::is_none")]
    pub create_time_since_epoch: Option<i64>,
    #[serde(default, with = "opt_int64_string", skip_serializing_if = "Option::is_none")]
    pub last_update_time_since_epoch: Option<i64>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub custom_properties: Properties,
}

/// A single metric observation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct Metric {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub external_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<f64>,
    /// Epoch milliseconds of the observation
    #[serde(default, with = "opt_int64_string", skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<i64>,
    #[serde(default, with = "opt_int64_string", skip_serializing_if = "Option::is_none")]
    pub step: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<ArtifactState>,
    #[serde(default, with = "opt_int64_string", skip_serializing_if = "Option::is_none")]
    pub create_time_since_epoch: Option<i64>,
    #[serde(default, with = "opt_int64_string", skip_serializing_if = "Option::is_none")]
    pub last_update_time_since_epoch: Option<i64>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub custom_properties: Properties,
}

impl Metric {
    pub fn new(name: impl Into<String>, value: f64, timestamp: i64, step: i64) -> Self {
        Self {
            name: Some(name.into()),
            value: Some(value),
            timestamp: Some(timestamp),
            step: Some(step),
            ..Default::default()
        }
    }
}

/// A run parameter
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct Parameter {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub external_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parameter_type: Option<ParameterType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<ArtifactState>,
    #[serde(default, with = "opt_int64_string", skip_serializing_if = "Option::is_none")]
    pub create_time_since_epoch: Option<i64>,
    #[serde(default, with = "opt_int64_string", skip_serializing_if = "Option::is_none")]
    pub last_update_time_since_epoch: Option<i64>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub custom_properties: Properties,
}

impl Parameter {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            value: Some(value.into()),
            parameter_type: Some(ParameterType::String),
            ..Default::default()
        }
    }
}

/// Any artifact, discriminated by `artifactType`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "artifactType")]
pub enum Artifact {
    #[serde(rename = "model-artifact")]
    Model(ModelArtifact),
    #[serde(rename = "doc-artifact")]
    Doc(DocArtifact),
    #[serde(rename = "dataset-artifact")]
    DataSet(DataSet),
    #[serde(rename = "metric")]
    Metric(Metric),
    #[serde(rename = "parameter")]
    Parameter(Parameter),
}

impl Artifact {
    pub fn artifact_type(&self) -> ArtifactType {
        match self {
            Artifact::Model(_) => ArtifactType::ModelArtifact,
            Artifact::Doc(_) => ArtifactType::DocArtifact,
            Artifact::DataSet(_) => ArtifactType::DatasetArtifact,
            Artifact::Metric(_) => ArtifactType::Metric,
            Artifact::Parameter(_) => ArtifactType::Parameter,
        }
    }

    pub fn id(&self) -> Option<&str> {
        match self {
            Artifact::Model(a) => a.id.as_deref(),
            Artifact::Doc(a) => a.id.as_deref(),
            Artifact::DataSet(a) => a.id.as_deref(),
            Artifact::Metric(a) => a.id.as_deref(),
            Artifact::Parameter(a) => a.id.as_deref(),
        }
    }

    pub fn name(&self) -> Option<&str> {
        match self {
            Artifact::Model(a) => a.name.as_deref(),
            Artifact::Doc(a) => a.name.as_deref(),
            Artifact::DataSet(a) => a.name.as_deref(),
            Artifact::Metric(a) => a.name.as_deref(),
            Artifact::Parameter(a) => a.name.as_deref(),
        }
    }

    pub fn state(&self) -> Option<ArtifactState> {
        match self {
            Artifact::Model(a) => a.state,
            Artifact::Doc(a) => a.state,
            Artifact::DataSet(a) => a.state,
            Artifact::Metric(a) => a.state,
            Artifact::Parameter(a) => a.state,
        }
    }

    pub fn custom_properties(&self) -> &Properties {
        match self {
            Artifact::Model(a) => &a.custom_properties,
            Artifact::Doc(a) => &a.custom_properties,
            Artifact::DataSet(a) => &a.custom_properties,
            Artifact::Metric(a) => &a.custom_properties,
            Artifact::Parameter(a) => &a.custom_properties,
        }
    }

    /// Decode one entry of an artifact listing.
    ///
    /// Entries whose `artifactType` is missing or not one of the kinds above
    /// yield `Ok(None)`, so a page survives kinds added on the server.
    pub fn from_listed(value: serde_json::Value) -> serde_json::Result<Option<Artifact>> {
        let known = value
            .get("artifactType")
            .cloned()
            .map(serde_json::from_value::<ArtifactType>)
            .is_some_and(|kind| kind.is_ok());
        if !known {
            return Ok(None);
        }
        serde_json::from_value(value).map(Some)
    }

    pub fn into_model(self) -> Option<ModelArtifact> {
        match self {
            Artifact::Model(a) => Some(a),
            _ => None,
        }
    }

    pub fn into_metric(self) -> Option<Metric> {
        match self {
            Artifact::Metric(a) => Some(a),
            _ => None,
        }
    }

    pub fn into_parameter(self) -> Option<Parameter> {
        match self {
            Artifact::Parameter(a) => Some(a),
            _ => None,
        }
    }
}

/// Partial update for any artifact kind
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArtifactUpdate {
    pub artifact_type: ArtifactType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub external_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uri: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<ArtifactState>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom_properties: Option<Properties>,
}

impl ArtifactUpdate {
    pub fn new(artifact_type: ArtifactType) -> Self {
        Self {
            artifact_type,
            description: None,
            external_id: None,
            uri: None,
            state: None,
            custom_properties: None,
        }
    }

    pub fn with_state(mut self, state: ArtifactState) -> Self {
        self.state = Some(state);
        self
    }
}

// ============================================================================
// Experiments and runs
// ============================================================================

/// A group of experiment runs
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct Experiment {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub external_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<ExperimentState>,
    #[serde(default, with = "opt_int64_string", skip_serializing_if = "Option::is_none")]
    pub create_time_since_epoch: Option<i64>,
    #[serde(default, with = "opt_int64_string", skip_serializing_if = "Option::is_none")]
    pub last_update_time_since_epoch: Option<i64>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub custom_properties: Properties,
}

impl Experiment {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn created_at(&self) -> Option<DateTime<Utc>> {
        self.create_time_since_epoch.and_then(from_epoch_millis)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct ExperimentUpdate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub external_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<ExperimentState>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom_properties: Option<Properties>,
}

/// One execution within an experiment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct ExperimentRun {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Owning experiment
    pub experiment_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub external_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<ExperimentRunState>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<ExperimentRunStatus>,
    #[serde(default, with = "opt_int64_string", skip_serializing_if = "Option::is_none")]
    pub start_time_since_epoch: Option<i64>,
    #[serde(default, with = "opt_int64_string", skip_serializing_if = "Option::is_none")]
    pub end_time_since_epoch: Option<i64>,
    #[serde(default, with = "opt_int64_string", skip_serializing_if = "Option::is_none")]
    pub create_time_since_epoch: Option<i64>,
    #[serde(default, with = "opt_int64_string", skip_serializing_if = "Option::is_none")]
    pub last_update_time_since_epoch: Option<i64>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub custom_properties: Properties,
}

impl ExperimentRun {
    pub fn new(experiment_id: impl Into<String>) -> Self {
        Self {
            experiment_id: experiment_id.into(),
            ..Default::default()
        }
    }

    pub fn started_at(&self) -> Option<DateTime<Utc>> {
        self.start_time_since_epoch.and_then(from_epoch_millis)
    }

    pub fn ended_at(&self) -> Option<DateTime<Utc>> {
        self.end_time_since_epoch.and_then(from_epoch_millis)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct ExperimentRunUpdate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<ExperimentRunState>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<ExperimentRunStatus>,
    #[serde(default, with = "opt_int64_string", skip_serializing_if = "Option::is_none")]
    pub end_time_since_epoch: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom_properties: Option<Properties>,
}
