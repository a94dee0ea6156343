//! Command handlers; each returns the JSON document `main` prints

use anyhow::{bail, Context as _, Result};
use serde::Serialize;
use serde_json::{json, Value};
use std::time::Duration;
use tracing::{debug, info};
use url::Url;

use model_registry_client::{
    ClientConfig, EnvSettings, ModelCatalogClient, ModelRegistryClient, ReadinessProbe,
    RegisterModelRequest, RegistryTrackingStore, ServiceKind, TlsSettings, TrackingStore,
    ViewType,
};
use model_registry_core::{
    CatalogArtifactQuery, CatalogModelQuery, FilterQuery, ListOptions, SourcePreviewRequest,
};

use crate::{
    CatalogCommands, CatalogModelsArgs, Cli, Commands, ExperimentCommands, RegisterArgs,
    RegistryCommands, View, WaitReadyArgs,
};

/// Resolved settings shared by every command
pub struct Context {
    settings: EnvSettings,
    registry_url: Option<String>,
    catalog_url: Option<String>,
}

impl Context {
    pub fn from_env(cli: &Cli) -> Result<Self> {
        let settings = EnvSettings::load().context("failed to read environment settings")?;
        Ok(Self {
            settings,
            registry_url: cli.registry_url.clone(),
            catalog_url: cli.catalog_url.clone(),
        })
    }

    fn registry(&self) -> Result<ModelRegistryClient> {
        let config = ClientConfig::from_settings(
            ServiceKind::Registry,
            &self.settings,
            self.registry_url.as_deref(),
        )?;
        Ok(ModelRegistryClient::new(config)?)
    }

    fn catalog(&self) -> Result<ModelCatalogClient> {
        let config = ClientConfig::from_settings(
            ServiceKind::Catalog,
            &self.settings,
            self.catalog_url.as_deref(),
        )?;
        Ok(ModelCatalogClient::new(config)?)
    }

    fn tls(&self) -> TlsSettings {
        let mut tls = TlsSettings::new();
        if let Some(verify) = self.settings.verify_ssl {
            tls = tls.with_verify(verify);
        }
        if let Some(path) = self
            .settings
            .modelregistry_ca_cert_path
            .as_deref()
            .filter(|p| !p.trim().is_empty())
        {
            tls = tls.with_ca_bundle(path);
        }
        tls
    }

    pub async fn run(&self, command: Commands) -> Result<Value> {
        match command {
            Commands::WaitReady(args) => self.wait_ready(args).await,
            Commands::Catalog { command } => self.catalog_command(command).await,
            Commands::Registry { command } => self.registry_command(command).await,
            Commands::Experiments { command } => self.experiment_command(command).await,
        }
    }

    async fn wait_ready(&self, args: WaitReadyArgs) -> Result<Value> {
        let target = args
            .url
            .or_else(|| self.catalog_url.clone())
            .context("no URL to probe: pass one or set CATALOG_URL")?;
        let url = Url::parse(&target).with_context(|| format!("invalid URL: {}", target))?;

        let mut probe = ReadinessProbe::from_settings(url, &self.settings)?.with_tls(&self.tls())?;
        if let Some(status) = args.expected_status {
            probe = probe.with_expected_status(status);
        }
        if let Some(secs) = args.timeout {
            if !secs.is_finite() || secs < 0.0 {
                bail!("--timeout must be a non-negative number of seconds");
            }
            probe = probe.with_timeout(Duration::from_secs_f64(secs));
        }

        let status = probe.wait_ready().await?;
        Ok(json!({ "url": target, "status": status }))
    }

    // ------------------------------------------------------------------
    // Catalog
    // ------------------------------------------------------------------

    async fn catalog_command(&self, command: CatalogCommands) -> Result<Value> {
        let catalog = self.catalog()?;
        match command {
            CatalogCommands::Sources { page_size } => {
                let mut options = ListOptions::new();
                options.page_size = page_size;
                to_json(&catalog.list_sources(&options).await?)
            }
            CatalogCommands::Models(args) => {
                let all = args.all;
                let query = model_query(args);
                if all {
                    let models = catalog.all_models(query).await?;
                    debug!(count = models.len(), "Fetched all catalog models");
                    Ok(json!({ "items": models, "size": models.len() }))
                } else {
                    to_json(&catalog.list_models(&query).await?)
                }
            }
            CatalogCommands::Model { source, name } => {
                to_json(&catalog.get_model(&source, &name).await?)
            }
            CatalogCommands::Artifacts {
                source,
                name,
                filter,
                artifact_type,
            } => {
                let mut query = CatalogArtifactQuery::new();
                if let Some(filter) = filter {
                    query = query.with_filter(FilterQuery::raw(filter));
                }
                if let Some(kind) = artifact_type {
                    query = query.with_artifact_type(kind);
                }
                to_json(&catalog.list_model_artifacts(&source, &name, &query).await?)
            }
            CatalogCommands::FilterOptions => to_json(&catalog.filter_options().await?),
            CatalogCommands::Preview {
                config_file,
                filter_status,
                page_size,
            } => {
                let text = std::fs::read_to_string(&config_file)
                    .with_context(|| format!("cannot read {}", config_file.display()))?;
                let config: Value = serde_json::from_str(&text)
                    .with_context(|| format!("{} is not valid JSON", config_file.display()))?;

                let mut request = SourcePreviewRequest::new(config);
                if let Some(filter) = filter_status {
                    request = request.with_filter_status(filter);
                }
                if let Some(size) = page_size {
                    request = request.with_page_size(size);
                }
                to_json(&catalog.preview_source(&request).await?)
            }
        }
    }

    // ------------------------------------------------------------------
    // Registry
    // ------------------------------------------------------------------

    async fn registry_command(&self, command: RegistryCommands) -> Result<Value> {
        let registry = self.registry()?;
        match command {
            RegistryCommands::Models {
                filter,
                order_by,
                sort_order,
                page_size,
                all,
            } => {
                let mut options = ListOptions::new();
                options.page_size = page_size;
                if let Some(order_by) = order_by {
                    options = options.with_order(order_by, sort_order);
                }
                if let Some(filter) = filter {
                    options = options.with_filter(FilterQuery::raw(filter));
                }
                if all {
                    let models = registry.all_registered_models(options).await?;
                    Ok(json!({ "items": models, "size": models.len() }))
                } else {
                    to_json(&registry.list_registered_models(&options).await?)
                }
            }
            RegistryCommands::Versions {
                model_id,
                page_size,
            } => {
                let mut options = ListOptions::new();
                options.page_size = page_size;
                to_json(&registry.list_model_versions(&model_id, &options).await?)
            }
            RegistryCommands::Register(args) => {
                let request = register_request(args);
                let registered = registry.register_model(&request).await?;
                info!(
                    model = ?registered.model.id,
                    version = ?registered.version.id,
                    "Registration complete"
                );
                Ok(json!({
                    "registeredModel": registered.model,
                    "modelVersion": registered.version,
                    "modelArtifact": registered.artifact,
                }))
            }
        }
    }

    // ------------------------------------------------------------------
    // Experiments
    // ------------------------------------------------------------------

    async fn experiment_command(&self, command: ExperimentCommands) -> Result<Value> {
        let store = RegistryTrackingStore::new(self.registry()?);
        match command {
            ExperimentCommands::List { view, page_size } => {
                let mut options = ListOptions::new();
                options.page_size = page_size;
                to_json(&store.search_experiments(view.into(), options).await?)
            }
            ExperimentCommands::Runs {
                experiment_id,
                page_size,
            } => {
                let mut options = ListOptions::new();
                options.page_size = page_size;
                to_json(
                    &store
                        .registry()
                        .list_experiment_runs(&experiment_id, &options)
                        .await?,
                )
            }
            ExperimentCommands::MetricHistory { run_id, metric } => {
                let history = store.get_metric_history(&run_id, &metric).await?;
                Ok(json!({ "items": history, "size": history.len() }))
            }
        }
    }
}

impl From<View> for ViewType {
    fn from(view: View) -> Self {
        match view {
            View::Active => ViewType::ActiveOnly,
            View::Deleted => ViewType::DeletedOnly,
            View::All => ViewType::All,
        }
    }
}

fn model_query(args: CatalogModelsArgs) -> CatalogModelQuery {
    let mut query = CatalogModelQuery::new();
    if let Some(q) = args.query {
        query = query.search(q);
    }
    if let Some(source) = args.source {
        query = query.in_source(source);
    }
    if let Some(order_by) = args.order_by {
        query = query.with_order(order_by, args.sort_order);
    }
    if let Some(filter) = args.filter {
        query = query.with_filter(FilterQuery::raw(filter));
    }
    if let Some(size) = args.page_size {
        query = query.with_page_size(size);
    }
    query
}

fn register_request(args: RegisterArgs) -> RegisterModelRequest {
    let mut request = RegisterModelRequest::new(args.model_name, args.version, args.uri);
    if let Some(format) = args.format_name {
        request = request.with_format(format, args.format_version);
    }
    if let Some(author) = args.author {
        request = request.with_author(author);
    }
    request.description = args.description;
    request.model_id = args.model_id;
    request.version_id = args.version_id;
    request.artifact_id = args.artifact_id;
    request
}

fn to_json<T: Serialize>(value: &T) -> Result<Value> {
    Ok(serde_json::to_value(value)?)
}
