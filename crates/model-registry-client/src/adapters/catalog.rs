//! Model Catalog Adapter
//!
//! Read-only browsing of catalog sources and their models, plus the
//! dry-run source preview.

use model_registry_core::{
    CatalogArtifact, CatalogArtifactQuery, CatalogModel, CatalogModelQuery, CatalogSource,
    FilterOptions, ListOptions, Page, SourcePreviewRequest, SourcePreviewResult,
};
use tracing::{debug, instrument};

use crate::config::ClientConfig;
use crate::error::ClientResult;
use crate::pages::collect_all;
use crate::transport::Transport;

/// Client for the Model Catalog REST API
#[derive(Debug, Clone)]
pub struct ModelCatalogClient {
    transport: Transport,
}

impl ModelCatalogClient {
    pub fn new(config: ClientConfig) -> ClientResult<Self> {
        Ok(Self::from_transport(Transport::new(config)?))
    }

    pub fn from_transport(transport: Transport) -> Self {
        Self { transport }
    }

    pub fn transport(&self) -> &Transport {
        &self.transport
    }

    #[instrument(skip(self))]
    pub async fn list_sources(&self, options: &ListOptions) -> ClientResult<Page<CatalogSource>> {
        self.transport
            .get(&["sources"], &options.to_catalog_query())
            .await
    }

    #[instrument(skip(self))]
    pub async fn list_models(&self, query: &CatalogModelQuery) -> ClientResult<Page<CatalogModel>> {
        let page: Page<CatalogModel> = self.transport.get(&["models"], &query.to_query()).await?;
        debug!(count = page.items.len(), more = page.has_more(), "Listed catalog models");
        Ok(page)
    }

    /// Every model matching `query`, across all pages
    pub async fn all_models(&self, query: CatalogModelQuery) -> ClientResult<Vec<CatalogModel>> {
        collect_all(query, move |q: CatalogModelQuery| async move {
            self.list_models(&q).await
        })
        .await
    }

    #[instrument(skip(self))]
    pub async fn get_model(&self, source_id: &str, name: &str) -> ClientResult<CatalogModel> {
        self.transport
            .get(&["sources", source_id, "models", name], &[])
            .await
    }

    #[instrument(skip(self))]
    pub async fn list_model_artifacts(
        &self,
        source_id: &str,
        name: &str,
        query: &CatalogArtifactQuery,
    ) -> ClientResult<Page<CatalogArtifact>> {
        self.transport
            .get(
                &["sources", source_id, "models", name, "artifacts"],
                &query.to_query(),
            )
            .await
    }

    /// Artifacts across all sources, typically narrowed by a filter query
    #[instrument(skip(self))]
    pub async fn list_artifacts(
        &self,
        query: &CatalogArtifactQuery,
    ) -> ClientResult<Page<CatalogArtifact>> {
        self.transport.get(&["artifacts"], &query.to_query()).await
    }

    /// Filterable fields with their types and allowed values or ranges
    #[instrument(skip(self))]
    pub async fn filter_options(&self) -> ClientResult<FilterOptions> {
        self.transport.get(&["filter_options"], &[]).await
    }

    /// Evaluate an inline source config without persisting it
    #[instrument(skip(self, request))]
    pub async fn preview_source(
        &self,
        request: &SourcePreviewRequest,
    ) -> ClientResult<SourcePreviewResult> {
        self.transport
            .post(&["preview"], &request.to_query(), request)
            .await
    }
}
