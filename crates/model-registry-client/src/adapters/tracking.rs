//! Experiment-tracking store
//!
//! Bridges a tracking-framework style store (experiments, runs, metrics,
//! params, inputs, logged models) onto the registry. Deletion is soft: the
//! entity's state becomes `ARCHIVED`. Tags are stored as custom properties.

use async_trait::async_trait;
use model_registry_core::wire::now_epoch_millis;
use model_registry_core::{
    Artifact, ArtifactType, DataSet, Experiment, ExperimentRun, ExperimentRunState,
    ExperimentRunStatus, ExperimentRunUpdate, ExperimentState, ExperimentUpdate, FilterQuery,
    ListOptions, Metric, ModelArtifact, Page, Parameter, Properties,
};
use tracing::{debug, instrument, warn};

use crate::adapters::registry::{ArtifactListQuery, ModelRegistryClient};
use crate::error::{ClientError, ClientResult};
use crate::pages::collect_all;

/// Which lifecycle states a search returns
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ViewType {
    #[default]
    ActiveOnly,
    DeletedOnly,
    All,
}

impl ViewType {
    /// Server-side filter selecting this view, if any
    pub fn state_filter(&self) -> Option<FilterQuery> {
        match self {
            ViewType::ActiveOnly => Some(FilterQuery::field("state").eq("LIVE")),
            ViewType::DeletedOnly => Some(FilterQuery::field("state").eq("ARCHIVED")),
            ViewType::All => None,
        }
    }

    fn apply(&self, mut options: ListOptions) -> ListOptions {
        if let Some(state) = self.state_filter() {
            options.filter_query = Some(match options.filter_query.take() {
                Some(existing) => state.and(existing),
                None => state,
            });
        }
        options
    }
}

/// Storage interface of an experiment-tracking framework
#[async_trait]
pub trait TrackingStore: Send + Sync {
    /// Create an experiment and return its id
    async fn create_experiment(&self, name: &str, tags: Properties) -> ClientResult<String>;

    async fn get_experiment(&self, experiment_id: &str) -> ClientResult<Experiment>;

    async fn get_experiment_by_name(&self, name: &str) -> ClientResult<Option<Experiment>>;

    async fn search_experiments(
        &self,
        view: ViewType,
        options: ListOptions,
    ) -> ClientResult<Page<Experiment>>;

    async fn delete_experiment(&self, experiment_id: &str) -> ClientResult<()>;

    async fn restore_experiment(&self, experiment_id: &str) -> ClientResult<()>;

    async fn create_run(
        &self,
        experiment_id: &str,
        run_name: Option<&str>,
        start_time: i64,
        tags: Properties,
    ) -> ClientResult<ExperimentRun>;

    async fn get_run(&self, run_id: &str) -> ClientResult<ExperimentRun>;

    async fn update_run_info(
        &self,
        run_id: &str,
        status: ExperimentRunStatus,
        end_time: Option<i64>,
        run_name: Option<&str>,
    ) -> ClientResult<ExperimentRun>;

    async fn delete_run(&self, run_id: &str) -> ClientResult<()>;

    async fn log_metric(&self, run_id: &str, metric: Metric) -> ClientResult<()>;

    async fn log_param(&self, run_id: &str, param: Parameter) -> ClientResult<()>;

    /// Metrics, params and tags in one call; tags are merged into the run
    async fn log_batch(
        &self,
        run_id: &str,
        metrics: Vec<Metric>,
        params: Vec<Parameter>,
        tags: Properties,
    ) -> ClientResult<()>;

    async fn get_metric_history(&self, run_id: &str, key: &str) -> ClientResult<Vec<Metric>>;

    async fn log_inputs(&self, run_id: &str, datasets: Vec<DataSet>) -> ClientResult<()>;

    async fn create_logged_model(
        &self,
        run_id: &str,
        model: ModelArtifact,
    ) -> ClientResult<ModelArtifact>;

    async fn search_logged_models(&self, run_id: &str) -> ClientResult<Vec<ModelArtifact>>;
}

/// [`TrackingStore`] backed by the Model Registry
#[derive(Debug, Clone)]
pub struct RegistryTrackingStore {
    registry: ModelRegistryClient,
}

impl RegistryTrackingStore {
    pub fn new(registry: ModelRegistryClient) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &ModelRegistryClient {
        &self.registry
    }

    async fn set_experiment_state(&self, id: &str, state: ExperimentState) -> ClientResult<()> {
        let update = ExperimentUpdate {
            state: Some(state),
            ..Default::default()
        };
        self.registry.update_experiment(id, &update).await?;
        Ok(())
    }

    /// Merge tags into the run's custom properties.
    ///
    /// The PATCH replaces `customProperties` wholesale, so the stored map is
    /// read as raw envelopes and only the new tags are encoded on top.
    /// Entries this client cannot decode are written back untouched.
    async fn merge_run_tags(&self, run_id: &str, tags: Properties) -> ClientResult<()> {
        if tags.is_empty() {
            return Ok(());
        }
        let mut wire = self.registry.get_experiment_run_wire_properties(run_id).await?;
        let encoded = self.registry.transport().codec().encode_envelopes(&tags)?;
        debug!(run_id, existing = wire.len(), tags = encoded.len(), "Merging run tags");
        wire.extend(encoded);
        self.registry
            .replace_experiment_run_wire_properties(run_id, wire)
            .await
    }
}

#[async_trait]
impl TrackingStore for RegistryTrackingStore {
    #[instrument(skip(self, tags))]
    async fn create_experiment(&self, name: &str, tags: Properties) -> ClientResult<String> {
        let mut experiment = Experiment::new(name);
        experiment.custom_properties = tags;
        let created = self.registry.create_experiment(&experiment).await?;
        created.id.ok_or_else(|| ClientError::Decode {
            url: self.registry.transport().base_url().to_string(),
            message: "experiment returned without an id".to_string(),
        })
    }

    async fn get_experiment(&self, experiment_id: &str) -> ClientResult<Experiment> {
        self.registry.get_experiment(experiment_id).await
    }

    async fn get_experiment_by_name(&self, name: &str) -> ClientResult<Option<Experiment>> {
        self.registry.find_experiment(name).await
    }

    #[instrument(skip(self))]
    async fn search_experiments(
        &self,
        view: ViewType,
        options: ListOptions,
    ) -> ClientResult<Page<Experiment>> {
        self.registry.list_experiments(&view.apply(options)).await
    }

    #[instrument(skip(self))]
    async fn delete_experiment(&self, experiment_id: &str) -> ClientResult<()> {
        self.set_experiment_state(experiment_id, ExperimentState::Archived)
            .await
    }

    #[instrument(skip(self))]
    async fn restore_experiment(&self, experiment_id: &str) -> ClientResult<()> {
        self.set_experiment_state(experiment_id, ExperimentState::Live)
            .await
    }

    #[instrument(skip(self, tags))]
    async fn create_run(
        &self,
        experiment_id: &str,
        run_name: Option<&str>,
        start_time: i64,
        tags: Properties,
    ) -> ClientResult<ExperimentRun> {
        let mut run = ExperimentRun::new(experiment_id);
        run.name = run_name.map(str::to_string);
        run.status = Some(ExperimentRunStatus::Running);
        run.start_time_since_epoch = Some(start_time);
        run.custom_properties = tags;
        self.registry.create_experiment_run(&run).await
    }

    async fn get_run(&self, run_id: &str) -> ClientResult<ExperimentRun> {
        self.registry.get_experiment_run(run_id).await
    }

    #[instrument(skip(self))]
    async fn update_run_info(
        &self,
        run_id: &str,
        status: ExperimentRunStatus,
        end_time: Option<i64>,
        run_name: Option<&str>,
    ) -> ClientResult<ExperimentRun> {
        let end_time = match end_time {
            Some(t) => Some(t),
            None if status.is_terminal() => Some(now_epoch_millis()),
            None => None,
        };
        let update = ExperimentRunUpdate {
            name: run_name.map(str::to_string),
            status: Some(status),
            end_time_since_epoch: end_time,
            ..Default::default()
        };
        self.registry.update_experiment_run(run_id, &update).await
    }

    #[instrument(skip(self))]
    async fn delete_run(&self, run_id: &str) -> ClientResult<()> {
        let update = ExperimentRunUpdate {
            state: Some(ExperimentRunState::Archived),
            ..Default::default()
        };
        self.registry.update_experiment_run(run_id, &update).await?;
        Ok(())
    }

    #[instrument(skip(self, metric), fields(name = ?metric.name))]
    async fn log_metric(&self, run_id: &str, mut metric: Metric) -> ClientResult<()> {
        if metric.timestamp.is_none() {
            metric.timestamp = Some(now_epoch_millis());
        }
        if metric.step.is_none() {
            metric.step = Some(0);
        }
        self.registry
            .upsert_run_artifact(run_id, &Artifact::Metric(metric))
            .await?;
        Ok(())
    }

    #[instrument(skip(self, param), fields(name = ?param.name))]
    async fn log_param(&self, run_id: &str, param: Parameter) -> ClientResult<()> {
        self.registry
            .upsert_run_artifact(run_id, &Artifact::Parameter(param))
            .await?;
        Ok(())
    }

    #[instrument(skip(self, metrics, params, tags), fields(metrics = metrics.len(), params = params.len()))]
    async fn log_batch(
        &self,
        run_id: &str,
        metrics: Vec<Metric>,
        params: Vec<Parameter>,
        tags: Properties,
    ) -> ClientResult<()> {
        for param in params {
            self.log_param(run_id, param).await?;
        }
        for metric in metrics {
            self.log_metric(run_id, metric).await?;
        }
        self.merge_run_tags(run_id, tags).await
    }

    async fn get_metric_history(&self, run_id: &str, key: &str) -> ClientResult<Vec<Metric>> {
        self.registry.get_metric_history(run_id, key).await
    }

    #[instrument(skip(self, datasets), fields(count = datasets.len()))]
    async fn log_inputs(&self, run_id: &str, datasets: Vec<DataSet>) -> ClientResult<()> {
        for dataset in datasets {
            self.registry
                .upsert_run_artifact(run_id, &Artifact::DataSet(dataset))
                .await?;
        }
        Ok(())
    }

    #[instrument(skip(self, model))]
    async fn create_logged_model(
        &self,
        run_id: &str,
        mut model: ModelArtifact,
    ) -> ClientResult<ModelArtifact> {
        let run = self.registry.get_experiment_run(run_id).await?;
        model.experiment_run_id = Some(run_id.to_string());
        model.experiment_id = Some(run.experiment_id);

        let created = self
            .registry
            .upsert_run_artifact(run_id, &Artifact::Model(model))
            .await?;
        match created {
            Artifact::Model(model) => {
                debug!(id = ?model.id, "Logged model created");
                Ok(model)
            }
            other => Err(ClientError::Decode {
                url: self.registry.transport().base_url().to_string(),
                message: format!("expected a model-artifact, got {}", other.artifact_type()),
            }),
        }
    }

    #[instrument(skip(self))]
    async fn search_logged_models(&self, run_id: &str) -> ClientResult<Vec<ModelArtifact>> {
        let registry = &self.registry;
        let artifacts = collect_all(
            ArtifactListQuery::of_type(ArtifactType::ModelArtifact),
            move |q: ArtifactListQuery| async move { registry.list_run_artifacts(run_id, &q).await },
        )
        .await?;

        let mut models = Vec::with_capacity(artifacts.len());
        for artifact in artifacts {
            match artifact {
                Artifact::Model(model) => models.push(model),
                other => warn!(kind = %other.artifact_type(), "Skipping non-model artifact"),
            }
        }
        Ok(models)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ClientConfig;
    use crate::retry::RetryPolicy;
    use model_registry_core::PropertyValue;
    use serde_json::json;
    use wiremock::matchers::{body_json, body_partial_json, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const PREFIX: &str = "/api/model_registry/v1alpha3";

    fn store(server: &MockServer) -> RegistryTrackingStore {
        let config = ClientConfig::registry(&server.uri())
            .unwrap()
            .with_token_path(None)
            .with_retry(RetryPolicy::none());
        RegistryTrackingStore::new(ModelRegistryClient::new(config).unwrap())
    }

    #[test]
    fn test_view_filter_combines_with_caller_filter() {
        let options = ListOptions::new().with_filter(FilterQuery::field("owner").eq("alice"));
        let applied = ViewType::ActiveOnly.apply(options);
        assert_eq!(
            applied.filter_query.unwrap().to_string(),
            r#"state = "LIVE" AND owner = "alice""#
        );
        assert!(ViewType::All.apply(ListOptions::new()).filter_query.is_none());
    }

    #[tokio::test]
    async fn test_create_experiment_with_tags() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(format!("{}/experiments", PREFIX)))
            .and(body_json(json!({
                "name": "churn",
                "customProperties": {
                    "team": {"string_value": "growth", "metadataType": "MetadataStringValue"}
                }
            })))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!({"id": "3", "name": "churn"})))
            .expect(1)
            .mount(&server)
            .await;

        let mut tags = Properties::new();
        tags.insert("team".into(), PropertyValue::from("growth"));
        let id = store(&server).create_experiment("churn", tags).await.unwrap();
        assert_eq!(id, "3");
    }

    #[tokio::test]
    async fn test_delete_experiment_archives() {
        let server = MockServer::start().await;
        Mock::given(method("PATCH"))
            .and(path(format!("{}/experiments/3", PREFIX)))
            .and(body_json(json!({"state": "ARCHIVED"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "id": "3", "name": "churn", "state": "ARCHIVED"
            })))
            .expect(1)
            .mount(&server)
            .await;

        store(&server).delete_experiment("3").await.unwrap();
    }

    #[tokio::test]
    async fn test_log_metric_fills_step() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(format!("{}/experiment_runs/11/artifacts", PREFIX)))
            .and(body_partial_json(json!({
                "artifactType": "metric",
                "name": "loss",
                "value": 0.5,
                "timestamp": "1700000000000",
                "step": "0"
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "artifactType": "metric", "id": "90", "name": "loss", "value": 0.5
            })))
            .expect(1)
            .mount(&server)
            .await;

        let metric = Metric {
            name: Some("loss".into()),
            value: Some(0.5),
            timestamp: Some(1_700_000_000_000),
            ..Default::default()
        };
        store(&server).log_metric("11", metric).await.unwrap();
    }

    #[tokio::test]
    async fn test_search_active_experiments_sends_state_filter() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(format!("{}/experiments", PREFIX)))
            .and(query_param("filterQuery", r#"state = "LIVE""#))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "items": [{"id": "1", "name": "a", "state": "LIVE"}],
                "nextPageToken": ""
            })))
            .expect(1)
            .mount(&server)
            .await;

        let page = store(&server)
            .search_experiments(ViewType::ActiveOnly, ListOptions::new())
            .await
            .unwrap();
        assert_eq!(page.items.len(), 1);
    }

    #[tokio::test]
    async fn test_tag_merge_keeps_undecodable_properties() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(format!("{}/experiment_runs/11", PREFIX)))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "id": "11",
                "experimentId": "3",
                "customProperties": {
                    "blob": {"metadataType": "MetadataStructValue", "struct_value": "eyJrIjoxfQ=="},
                    "bad": {"metadataType": "MetadataIntValue", "int_value": "notanint"},
                    "owner": {"metadataType": "MetadataStringValue", "string_value": "alice"}
                }
            })))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("PATCH"))
            .and(path(format!("{}/experiment_runs/11", PREFIX)))
            .and(body_json(json!({
                "customProperties": {
                    "blob": {"metadataType": "MetadataStructValue", "struct_value": "eyJrIjoxfQ=="},
                    "bad": {"metadataType": "MetadataIntValue", "int_value": "notanint"},
                    "owner": {"metadataType": "MetadataStringValue", "string_value": "alice"},
                    "stage": {"metadataType": "MetadataStringValue", "string_value": "tuning"}
                }
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "id": "11", "experimentId": "3"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let mut tags = Properties::new();
        tags.insert("stage".into(), PropertyValue::from("tuning"));
        store(&server)
            .log_batch("11", vec![], vec![], tags)
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_empty_tags_skip_run_update() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(format!("{}/experiment_runs/11", PREFIX)))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": "11"})))
            .expect(0)
            .mount(&server)
            .await;

        store(&server)
            .log_batch("11", vec![], vec![], Properties::new())
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_logged_model_links_run() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(format!("{}/experiment_runs/11", PREFIX)))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "id": "11", "experimentId": "3"
            })))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path(format!("{}/experiment_runs/11/artifacts", PREFIX)))
            .and(body_partial_json(json!({
                "artifactType": "model-artifact",
                "experimentId": "3",
                "experimentRunId": "11"
            })))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!({
                "artifactType": "model-artifact",
                "id": "500",
                "experimentId": "3",
                "experimentRunId": "11"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let model = store(&server)
            .create_logged_model("11", ModelArtifact::new("model", "s3://bucket/run-11"))
            .await
            .unwrap();
        assert_eq!(model.id.as_deref(), Some("500"));
    }
}
