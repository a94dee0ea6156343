//! Model Registry Adapter
//!
//! Typed operations over the registry REST API: registered models, versions,
//! model artifacts, experiments, runs and their artifacts. Every call goes
//! through the shared [`Transport`], so custom properties on request and
//! response bodies are plain values here.

use model_registry_core::{
    Artifact, ArtifactState, ArtifactType, ArtifactUpdate, Experiment, ExperimentRun,
    ExperimentRunUpdate, ExperimentUpdate, ListOptions, Metric, ModelArtifact, ModelVersion,
    ModelVersionUpdate, Page, PageCursor, Properties, RegisteredModel, RegisteredModelState,
    RegisteredModelUpdate,
};
use reqwest::Method;
use serde_json::{json, Map, Value};
use tracing::{debug, info, instrument, warn};

use crate::config::ClientConfig;
use crate::error::{ClientError, ClientResult};
use crate::pages::collect_all;
use crate::transport::Transport;

/// Filters for artifact listings
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ArtifactListQuery {
    /// Restrict to one artifact kind
    pub artifact_type: Option<ArtifactType>,
    /// Restrict metrics to these steps
    pub step_ids: Vec<i64>,
    pub options: ListOptions,
}

impl ArtifactListQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn of_type(artifact_type: ArtifactType) -> Self {
        Self {
            artifact_type: Some(artifact_type),
            ..Self::default()
        }
    }

    pub fn with_steps(mut self, steps: impl IntoIterator<Item = i64>) -> Self {
        self.step_ids = steps.into_iter().collect();
        self
    }

    pub fn with_options(mut self, options: ListOptions) -> Self {
        self.options = options;
        self
    }

    pub fn to_query(&self) -> Vec<(&'static str, String)> {
        let mut query = self.options.to_query();
        if let Some(kind) = self.artifact_type {
            query.push(("artifactType", kind.as_str().to_string()));
        }
        if !self.step_ids.is_empty() {
            let steps: Vec<String> = self.step_ids.iter().map(i64::to_string).collect();
            query.push(("stepIds", steps.join(",")));
        }
        query
    }
}

impl PageCursor for ArtifactListQuery {
    fn set_page_token(&mut self, token: String) {
        self.options.set_page_token(token);
    }
}

/// Inputs for registering a stored model in one step
///
/// Mirrors the model-sync job: the model is looked up by name (or id) and
/// created if missing, then a version and its model artifact are created.
/// When `artifact_id` is set the existing artifact's URI is updated instead.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RegisterModelRequest {
    pub model_name: String,
    pub version_name: String,
    /// Where the weights live (`s3://...`, `oci://...`)
    pub uri: String,
    pub model_format_name: Option<String>,
    pub model_format_version: Option<String>,
    pub description: Option<String>,
    pub author: Option<String>,
    pub owner: Option<String>,
    /// Attached to the new version
    pub version_properties: Properties,
    pub model_id: Option<String>,
    pub version_id: Option<String>,
    pub artifact_id: Option<String>,
}

impl RegisterModelRequest {
    pub fn new(
        model_name: impl Into<String>,
        version_name: impl Into<String>,
        uri: impl Into<String>,
    ) -> Self {
        Self {
            model_name: model_name.into(),
            version_name: version_name.into(),
            uri: uri.into(),
            ..Self::default()
        }
    }

    pub fn with_format(mut self, name: impl Into<String>, version: Option<String>) -> Self {
        self.model_format_name = Some(name.into());
        self.model_format_version = version;
        self
    }

    pub fn with_author(mut self, author: impl Into<String>) -> Self {
        self.author = Some(author.into());
        self
    }
}

/// Result of [`ModelRegistryClient::register_model`]
#[derive(Debug, Clone, PartialEq)]
pub struct RegisteredModelVersion {
    pub model: RegisteredModel,
    pub version: ModelVersion,
    pub artifact: ModelArtifact,
}

/// Client for the Model Registry REST API
#[derive(Debug, Clone)]
pub struct ModelRegistryClient {
    transport: Transport,
}

impl ModelRegistryClient {
    pub fn new(config: ClientConfig) -> ClientResult<Self> {
        Ok(Self::from_transport(Transport::new(config)?))
    }

    pub fn from_transport(transport: Transport) -> Self {
        Self { transport }
    }

    pub fn transport(&self) -> &Transport {
        &self.transport
    }

    // ------------------------------------------------------------------
    // Registered models
    // ------------------------------------------------------------------

    #[instrument(skip(self, model), fields(name = %model.name))]
    pub async fn create_registered_model(&self, model: &RegisteredModel) -> ClientResult<RegisteredModel> {
        let created: RegisteredModel = self.transport.post(&["registered_models"], &[], model).await?;
        debug!(id = ?created.id, "Registered model created");
        Ok(created)
    }

    #[instrument(skip(self))]
    pub async fn get_registered_model(&self, id: &str) -> ClientResult<RegisteredModel> {
        self.transport.get(&["registered_models", id], &[]).await
    }

    /// Look up by name; `None` when the registry has no such model
    #[instrument(skip(self))]
    pub async fn find_registered_model(&self, name: &str) -> ClientResult<Option<RegisteredModel>> {
        not_found_as_none(
            self.transport
                .get(&["registered_model"], &[("name", name.to_string())])
                .await,
        )
    }

    #[instrument(skip(self))]
    pub async fn list_registered_models(
        &self,
        options: &ListOptions,
    ) -> ClientResult<Page<RegisteredModel>> {
        self.transport
            .get(&["registered_models"], &options.to_query())
            .await
    }

    /// Every registered model matching `options`, across all pages
    pub async fn all_registered_models(&self, options: ListOptions) -> ClientResult<Vec<RegisteredModel>> {
        collect_all(options, move |o: ListOptions| async move {
            self.list_registered_models(&o).await
        })
        .await
    }

    #[instrument(skip(self, update))]
    pub async fn update_registered_model(
        &self,
        id: &str,
        update: &RegisteredModelUpdate,
    ) -> ClientResult<RegisteredModel> {
        self.transport.patch(&["registered_models", id], update).await
    }

    /// Soft delete: the model stays in the registry with state `ARCHIVED`
    #[instrument(skip(self))]
    pub async fn archive_registered_model(&self, id: &str) -> ClientResult<RegisteredModel> {
        let update = RegisteredModelUpdate {
            state: Some(RegisteredModelState::Archived),
            ..Default::default()
        };
        self.update_registered_model(id, &update).await
    }

    // ------------------------------------------------------------------
    // Model versions
    // ------------------------------------------------------------------

    #[instrument(skip(self, version), fields(name = %version.name, model = %version.registered_model_id))]
    pub async fn create_model_version(&self, version: &ModelVersion) -> ClientResult<ModelVersion> {
        self.transport.post(&["model_versions"], &[], version).await
    }

    #[instrument(skip(self))]
    pub async fn get_model_version(&self, id: &str) -> ClientResult<ModelVersion> {
        self.transport.get(&["model_versions", id], &[]).await
    }

    #[instrument(skip(self))]
    pub async fn find_model_version(
        &self,
        name: &str,
        registered_model_id: &str,
    ) -> ClientResult<Option<ModelVersion>> {
        not_found_as_none(
            self.transport
                .get(
                    &["model_version"],
                    &[
                        ("name", name.to_string()),
                        ("parentResourceId", registered_model_id.to_string()),
                    ],
                )
                .await,
        )
    }

    #[instrument(skip(self))]
    pub async fn list_model_versions(
        &self,
        registered_model_id: &str,
        options: &ListOptions,
    ) -> ClientResult<Page<ModelVersion>> {
        self.transport
            .get(
                &["registered_models", registered_model_id, "versions"],
                &options.to_query(),
            )
            .await
    }

    #[instrument(skip(self, update))]
    pub async fn update_model_version(
        &self,
        id: &str,
        update: &ModelVersionUpdate,
    ) -> ClientResult<ModelVersion> {
        self.transport.patch(&["model_versions", id], update).await
    }

    // ------------------------------------------------------------------
    // Model artifacts
    // ------------------------------------------------------------------

    /// Create a model artifact attached to a version
    #[instrument(skip(self, artifact))]
    pub async fn create_model_artifact(
        &self,
        version_id: &str,
        artifact: &ModelArtifact,
    ) -> ClientResult<ModelArtifact> {
        let body = Artifact::Model(artifact.clone());
        let created: Artifact = self
            .transport
            .post(&["model_versions", version_id, "artifacts"], &[], &body)
            .await?;
        expect_model(created, self.transport.base_url().as_str())
    }

    #[instrument(skip(self))]
    pub async fn get_model_artifact(&self, id: &str) -> ClientResult<ModelArtifact> {
        self.transport.get(&["model_artifacts", id], &[]).await
    }

    /// Model artifacts of a version; other artifact kinds are skipped
    #[instrument(skip(self))]
    pub async fn list_model_artifacts(
        &self,
        version_id: &str,
        options: &ListOptions,
    ) -> ClientResult<Page<ModelArtifact>> {
        let mut query = options.to_query();
        query.push(("artifactType", ArtifactType::ModelArtifact.as_str().to_string()));
        let page: Page<Value> = self
            .transport
            .get(&["model_versions", version_id, "artifacts"], &query)
            .await?;
        Ok(filter_page(known_artifacts(page)?, Artifact::into_model))
    }

    #[instrument(skip(self, update))]
    pub async fn update_model_artifact(
        &self,
        id: &str,
        update: &ArtifactUpdate,
    ) -> ClientResult<ModelArtifact> {
        self.transport.patch(&["model_artifacts", id], update).await
    }

    /// Find-or-create the model, then create the version and its artifact
    #[instrument(skip(self, request), fields(model = %request.model_name, version = %request.version_name))]
    pub async fn register_model(
        &self,
        request: &RegisterModelRequest,
    ) -> ClientResult<RegisteredModelVersion> {
        let model = match &request.model_id {
            Some(id) => self.get_registered_model(id).await?,
            None => self.find_or_create_model(request).await?,
        };
        let model_id = require_id(&model.id, "registered model")?.to_string();

        let version = match &request.version_id {
            Some(id) => self.get_model_version(id).await?,
            None => {
                let mut version = ModelVersion::new(&request.version_name, &model_id);
                version.author = request.author.clone();
                version.description = request.description.clone();
                version.custom_properties = request.version_properties.clone();
                self.create_model_version(&version).await?
            }
        };
        let version_id = require_id(&version.id, "model version")?.to_string();

        let artifact = match &request.artifact_id {
            Some(id) => {
                let update = ArtifactUpdate {
                    uri: Some(request.uri.clone()),
                    state: Some(ArtifactState::Live),
                    ..ArtifactUpdate::new(ArtifactType::ModelArtifact)
                };
                self.update_model_artifact(id, &update).await?
            }
            None => {
                let mut artifact = ModelArtifact::new(&request.version_name, &request.uri);
                artifact.model_format_name = request.model_format_name.clone();
                artifact.model_format_version = request.model_format_version.clone();
                artifact.state = Some(ArtifactState::Live);
                self.create_model_artifact(&version_id, &artifact).await?
            }
        };

        info!(model_id = %model_id, version_id = %version_id, uri = %request.uri, "Model registered");
        Ok(RegisteredModelVersion {
            model,
            version,
            artifact,
        })
    }

    async fn find_or_create_model(&self, request: &RegisterModelRequest) -> ClientResult<RegisteredModel> {
        if let Some(existing) = self.find_registered_model(&request.model_name).await? {
            debug!(id = ?existing.id, "Reusing registered model");
            return Ok(existing);
        }

        let mut model = RegisteredModel::new(&request.model_name);
        model.owner = request.owner.clone();
        match self.create_registered_model(&model).await {
            Ok(created) => Ok(created),
            Err(e) if e.is_conflict() => {
                warn!(name = %request.model_name, "Registered model created concurrently, re-reading");
                self.find_registered_model(&request.model_name)
                    .await?
                    .ok_or(e)
            }
            Err(e) => Err(e),
        }
    }

    // ------------------------------------------------------------------
    // Experiments
    // ------------------------------------------------------------------

    #[instrument(skip(self, experiment), fields(name = %experiment.name))]
    pub async fn create_experiment(&self, experiment: &Experiment) -> ClientResult<Experiment> {
        self.transport.post(&["experiments"], &[], experiment).await
    }

    #[instrument(skip(self))]
    pub async fn get_experiment(&self, id: &str) -> ClientResult<Experiment> {
        self.transport.get(&["experiments", id], &[]).await
    }

    #[instrument(skip(self))]
    pub async fn find_experiment(&self, name: &str) -> ClientResult<Option<Experiment>> {
        not_found_as_none(
            self.transport
                .get(&["experiment"], &[("name", name.to_string())])
                .await,
        )
    }

    #[instrument(skip(self))]
    pub async fn list_experiments(&self, options: &ListOptions) -> ClientResult<Page<Experiment>> {
        self.transport.get(&["experiments"], &options.to_query()).await
    }

    #[instrument(skip(self, update))]
    pub async fn update_experiment(
        &self,
        id: &str,
        update: &ExperimentUpdate,
    ) -> ClientResult<Experiment> {
        self.transport.patch(&["experiments", id], update).await
    }

    // ------------------------------------------------------------------
    // Experiment runs
    // ------------------------------------------------------------------

    #[instrument(skip(self, run), fields(experiment = %run.experiment_id))]
    pub async fn create_experiment_run(&self, run: &ExperimentRun) -> ClientResult<ExperimentRun> {
        self.transport.post(&["experiment_runs"], &[], run).await
    }

    #[instrument(skip(self))]
    pub async fn get_experiment_run(&self, id: &str) -> ClientResult<ExperimentRun> {
        self.transport.get(&["experiment_runs", id], &[]).await
    }

    #[instrument(skip(self))]
    pub async fn list_experiment_runs(
        &self,
        experiment_id: &str,
        options: &ListOptions,
    ) -> ClientResult<Page<ExperimentRun>> {
        self.transport
            .get(
                &["experiments", experiment_id, "experiment_runs"],
                &options.to_query(),
            )
            .await
    }

    #[instrument(skip(self, update))]
    pub async fn update_experiment_run(
        &self,
        id: &str,
        update: &ExperimentRunUpdate,
    ) -> ClientResult<ExperimentRun> {
        self.transport.patch(&["experiment_runs", id], update).await
    }

    /// A run's `customProperties` exactly as stored, envelopes undecoded
    #[instrument(skip(self))]
    pub async fn get_experiment_run_wire_properties(&self, id: &str) -> ClientResult<Map<String, Value>> {
        let run = self
            .transport
            .send_raw(Method::GET, &["experiment_runs", id], &[], None)
            .await?;
        match run.get("customProperties") {
            Some(Value::Object(wire)) => Ok(wire.clone()),
            _ => Ok(Map::new()),
        }
    }

    /// Replace a run's `customProperties` with already-encoded envelopes
    #[instrument(skip(self, wire), fields(properties = wire.len()))]
    pub async fn replace_experiment_run_wire_properties(
        &self,
        id: &str,
        wire: Map<String, Value>,
    ) -> ClientResult<()> {
        self.transport
            .send_raw(
                Method::PATCH,
                &["experiment_runs", id],
                &[],
                Some(json!({ "customProperties": wire })),
            )
            .await?;
        Ok(())
    }

    /// Create or update (matched by name) an artifact of a run
    #[instrument(skip(self, artifact), fields(kind = %artifact.artifact_type()))]
    pub async fn upsert_run_artifact(&self, run_id: &str, artifact: &Artifact) -> ClientResult<Artifact> {
        self.transport
            .post(&["experiment_runs", run_id, "artifacts"], &[], artifact)
            .await
    }

    #[instrument(skip(self))]
    pub async fn list_run_artifacts(
        &self,
        run_id: &str,
        query: &ArtifactListQuery,
    ) -> ClientResult<Page<Artifact>> {
        let page = self
            .transport
            .get(&["experiment_runs", run_id, "artifacts"], &query.to_query())
            .await?;
        known_artifacts(page)
    }

    /// Every recorded value of one metric, across all pages
    #[instrument(skip(self))]
    pub async fn get_metric_history(&self, run_id: &str, metric: &str) -> ClientResult<Vec<Metric>> {
        let fetch = move |options: ListOptions| async move {
            let mut query = options.to_query();
            query.push(("name", metric.to_string()));
            let page: Page<Value> = self
                .transport
                .get(&["experiment_runs", run_id, "metric_history"], &query)
                .await?;
            Ok::<_, ClientError>(filter_page(known_artifacts(page)?, Artifact::into_metric))
        };
        collect_all(ListOptions::new(), fetch).await
    }

    // ------------------------------------------------------------------
    // Artifacts
    // ------------------------------------------------------------------

    #[instrument(skip(self))]
    pub async fn get_artifact(&self, id: &str) -> ClientResult<Artifact> {
        self.transport.get(&["artifacts", id], &[]).await
    }

    #[instrument(skip(self, update))]
    pub async fn update_artifact(&self, id: &str, update: &ArtifactUpdate) -> ClientResult<Artifact> {
        self.transport.patch(&["artifacts", id], update).await
    }

    #[instrument(skip(self))]
    pub async fn list_artifacts(&self, query: &ArtifactListQuery) -> ClientResult<Page<Artifact>> {
        let page = self.transport.get(&["artifacts"], &query.to_query()).await?;
        known_artifacts(page)
    }

    /// Mark an artifact for deletion; nothing is physically removed
    #[instrument(skip(self))]
    pub async fn soft_delete_artifact(&self, id: &str) -> ClientResult<Artifact> {
        let current = self.get_artifact(id).await?;
        let update = ArtifactUpdate::new(current.artifact_type())
            .with_state(ArtifactState::MarkedForDeletion);
        self.update_artifact(id, &update).await
    }
}

/// Map a 404 to `Ok(None)` for lookups by name
pub(crate) fn not_found_as_none<T>(result: ClientResult<T>) -> ClientResult<Option<T>> {
    match result {
        Ok(value) => Ok(Some(value)),
        Err(e) if e.is_not_found() => Ok(None),
        Err(e) => Err(e),
    }
}

/// Keep only items of one artifact kind, preserving the page cursor
/// Decode a listing, dropping kinds this client does not model
fn known_artifacts(page: Page<Value>) -> ClientResult<Page<Artifact>> {
    let mut items = Vec::with_capacity(page.items.len());
    for item in page.items {
        let kind = item
            .get("artifactType")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();
        match Artifact::from_listed(item) {
            Ok(Some(artifact)) => items.push(artifact),
            Ok(None) => warn!(kind = %kind, "Skipping artifact of unknown kind"),
            Err(e) => {
                return Err(ClientError::Decode {
                    url: String::new(),
                    message: format!("{} artifact: {}", kind, e),
                })
            }
        }
    }
    Ok(Page {
        size: items.len() as i64,
        items,
        page_size: page.page_size,
        next_page_token: page.next_page_token,
    })
}

pub(crate) fn filter_page<T>(page: Page<Artifact>, pick: fn(Artifact) -> Option<T>) -> Page<T> {
    let items: Vec<T> = page.items.into_iter().filter_map(pick).collect();
    Page {
        size: items.len() as i64,
        items,
        page_size: page.page_size,
        next_page_token: page.next_page_token,
    }
}

fn require_id<'a>(id: &'a Option<String>, kind: &str) -> ClientResult<&'a str> {
    id.as_deref().ok_or_else(|| ClientError::Decode {
        url: String::new(),
        message: format!("{} returned without an id", kind),
    })
}

fn expect_model(artifact: Artifact, url: &str) -> ClientResult<ModelArtifact> {
    let kind = artifact.artifact_type();
    artifact.into_model().ok_or_else(|| ClientError::Decode {
        url: url.to_string(),
        message: format!("expected a model-artifact, got {}", kind),
    })
}
