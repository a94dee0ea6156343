//! Model Catalog types
//!
//! The catalog is read-mostly: sources are configured server-side and models
//! are browsed with free-text search, ordering and filter queries. Query
//! parameters use snake_case names (`page_size`, `next_page_token`), unlike
//! the registry.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use crate::filter::FilterQuery;
use crate::pagination::{PageCursor, SortOrder};
use crate::properties::Properties;
use crate::wire::opt_int64_string;

/// A configured catalog source
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct CatalogSource {
    pub id: String,
    pub name: String,
    /// Disabled sources are listed but not served
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enabled: Option<bool>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub labels: Vec<String>,
}

/// A model as published by a catalog source
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct CatalogModel {
    pub name: String,
    #[serde(default, alias = "source_id", skip_serializing_if = "Option::is_none")]
    pub source_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub readme: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub maturity: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub language: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tasks: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provider: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub logo: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub license: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub license_link: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub library_name: Option<String>,
    #[serde(default, with = "opt_int64_string", skip_serializing_if = "Option::is_none")]
    pub create_time_since_epoch: Option<i64>,
    #[serde(default, with = "opt_int64_string", skip_serializing_if = "Option::is_none")]
    pub last_update_time_since_epoch: Option<i64>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub custom_properties: Properties,
}

/// An artifact attached to a catalog model
///
/// Catalog artifact kinds are open-ended (`model-artifact`,
/// `metrics-artifact`, ...), so the discriminator is kept as text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct CatalogArtifact {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub artifact_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uri: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metrics_type: Option<String>,
    #[serde(default, with = "opt_int64_string", skip_serializing_if = "Option::is_none")]
    pub create_time_since_epoch: Option<i64>,
    #[serde(default, with = "opt_int64_string", skip_serializing_if = "Option::is_none")]
    pub last_update_time_since_epoch: Option<i64>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub custom_properties: Properties,
}

/// Numeric bounds of a filterable field
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
pub struct FilterRange {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max: Option<f64>,
}

/// Schema of one filterable field
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilterOption {
    /// Field type as reported by the server (`string`, `number`, ...)
    #[serde(rename = "type")]
    pub kind: String,
    /// Allowed values, for enumerable fields
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub values: Option<Vec<Value>>,
    /// Bounds, for numeric fields
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub range: Option<FilterRange>,
}

/// `GET /filter_options` response
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct FilterOptions {
    #[serde(default)]
    pub filters: BTreeMap<String, FilterOption>,
}

impl FilterOptions {
    pub fn get(&self, field: &str) -> Option<&FilterOption> {
        self.filters.get(field)
    }
}

/// Catalog sort field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CatalogOrderBy {
    Name,
    Accuracy,
    CreateTime,
    LastUpdateTime,
}

impl CatalogOrderBy {
    pub fn as_str(&self) -> &'static str {
        match self {
            CatalogOrderBy::Name => "NAME",
            CatalogOrderBy::Accuracy => "ACCURACY",
            CatalogOrderBy::CreateTime => "CREATE_TIME",
            CatalogOrderBy::LastUpdateTime => "LAST_UPDATE_TIME",
        }
    }
}

impl fmt::Display for CatalogOrderBy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CatalogOrderBy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().replace('-', "_").as_str() {
            "NAME" => Ok(CatalogOrderBy::Name),
            "ACCURACY" => Ok(CatalogOrderBy::Accuracy),
            "CREATE_TIME" => Ok(CatalogOrderBy::CreateTime),
            "LAST_UPDATE_TIME" => Ok(CatalogOrderBy::LastUpdateTime),
            other => Err(format!("unknown catalog order field: {}", other)),
        }
    }
}

/// Parameters for `GET /models`
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CatalogModelQuery {
    /// Free-text search
    pub q: Option<String>,
    /// Restrict to one source id
    pub source: Option<String>,
    pub order_by: Option<CatalogOrderBy>,
    pub sort_order: Option<SortOrder>,
    pub page_size: Option<u32>,
    pub next_page_token: Option<String>,
    pub filter_query: Option<FilterQuery>,
}

impl CatalogModelQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn search(mut self, q: impl Into<String>) -> Self {
        self.q = Some(q.into());
        self
    }

    pub fn in_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }

    pub fn with_order(mut self, order_by: CatalogOrderBy, sort_order: SortOrder) -> Self {
        self.order_by = Some(order_by);
        self.sort_order = Some(sort_order);
        self
    }

    pub fn with_page_size(mut self, size: u32) -> Self {
        self.page_size = Some(size);
        self
    }

    pub fn with_filter(mut self, filter: impl Into<FilterQuery>) -> Self {
        self.filter_query = Some(filter.into());
        self
    }

    pub fn to_query(&self) -> Vec<(&'static str, String)> {
        let mut query = Vec::new();
        if let Some(q) = &self.q {
            query.push(("q", q.clone()));
        }
        if let Some(source) = &self.source {
            query.push(("source", source.clone()));
        }
        if let Some(order_by) = self.order_by {
            query.push(("order_by", order_by.to_string()));
        }
        if let Some(sort_order) = self.sort_order {
            query.push(("sort_order", sort_order.to_string()));
        }
        if let Some(size) = self.page_size {
            query.push(("page_size", size.to_string()));
        }
        if let Some(token) = self.next_page_token.as_ref().filter(|t| !t.is_empty()) {
            query.push(("next_page_token", token.clone()));
        }
        if let Some(filter) = &self.filter_query {
            query.push(("filterQuery", filter.to_query_string()));
        }
        query
    }
}

impl PageCursor for CatalogModelQuery {
    fn set_page_token(&mut self, token: String) {
        self.next_page_token = Some(token);
    }
}

/// Parameters for artifact listings (`GET /artifacts` and per-model)
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CatalogArtifactQuery {
    pub artifact_type: Option<String>,
    pub filter_query: Option<FilterQuery>,
    pub page_size: Option<u32>,
    pub next_page_token: Option<String>,
}

impl CatalogArtifactQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_filter(mut self, filter: impl Into<FilterQuery>) -> Self {
        self.filter_query = Some(filter.into());
        self
    }

    pub fn with_artifact_type(mut self, artifact_type: impl Into<String>) -> Self {
        self.artifact_type = Some(artifact_type.into());
        self
    }

    pub fn with_page_size(mut self, size: u32) -> Self {
        self.page_size = Some(size);
        self
    }

    pub fn to_query(&self) -> Vec<(&'static str, String)> {
        let mut query = Vec::new();
        if let Some(kind) = &self.artifact_type {
            query.push(("artifact_type", kind.clone()));
        }
        if let Some(filter) = &self.filter_query {
            query.push(("filterQuery", filter.to_query_string()));
        }
        if let Some(size) = self.page_size {
            query.push(("page_size", size.to_string()));
        }
        if let Some(token) = self.next_page_token.as_ref().filter(|t| !t.is_empty()) {
            query.push(("next_page_token", token.clone()));
        }
        query
    }
}

impl PageCursor for CatalogArtifactQuery {
    fn set_page_token(&mut self, token: String) {
        self.next_page_token = Some(token);
    }
}

/// Which preview rows to return
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PreviewFilter {
    All,
    Included,
    Excluded,
}

impl PreviewFilter {
    pub fn as_str(&self) -> &'static str {
        match self {
            PreviewFilter::All => "all",
            PreviewFilter::Included => "included",
            PreviewFilter::Excluded => "excluded",
        }
    }
}

impl FromStr for PreviewFilter {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "all" => Ok(PreviewFilter::All),
            "included" => Ok(PreviewFilter::Included),
            "excluded" => Ok(PreviewFilter::Excluded),
            other => Err(format!("unknown preview filter: {}", other)),
        }
    }
}

/// Dry-run ingestion of an inline source config
///
/// Only `config` travels in the body; the rest are query parameters.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SourcePreviewRequest {
    /// Source configuration as the server would read it from its config file
    pub config: Value,
    #[serde(skip)]
    pub filter_status: Option<PreviewFilter>,
    #[serde(skip)]
    pub page_size: Option<u32>,
    #[serde(skip)]
    pub next_page_token: Option<String>,
}

impl SourcePreviewRequest {
    pub fn new(config: Value) -> Self {
        Self {
            config,
            filter_status: None,
            page_size: None,
            next_page_token: None,
        }
    }

    pub fn with_filter_status(mut self, filter: PreviewFilter) -> Self {
        self.filter_status = Some(filter);
        self
    }

    pub fn with_page_size(mut self, size: u32) -> Self {
        self.page_size = Some(size);
        self
    }

    pub fn to_query(&self) -> Vec<(&'static str, String)> {
        let mut query = Vec::new();
        if let Some(filter) = self.filter_status {
            query.push(("filterStatus", filter.as_str().to_string()));
        }
        if let Some(size) = self.page_size {
            query.push(("page_size", size.to_string()));
        }
        if let Some(token) = self.next_page_token.as_ref().filter(|t| !t.is_empty()) {
            query.push(("next_page_token", token.clone()));
        }
        query
    }
}

/// One model evaluated by a preview
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PreviewModel {
    pub name: String,
    /// Whether the source's include/exclude rules admit this model
    pub included: bool,
}

/// Counts across the whole preview, not just the current page
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct PreviewSummary {
    #[serde(default)]
    pub total_models: u64,
    #[serde(default)]
    pub included_models: u64,
    #[serde(default)]
    pub excluded_models: u64,
}

/// `POST /preview` response
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct SourcePreviewResult {
    #[serde(default)]
    pub items: Vec<PreviewModel>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<PreviewSummary>,
    #[serde(default, alias = "next_page_token")]
    pub next_page_token: String,
    #[serde(default)]
    pub size: i64,
    #[serde(default, alias = "page_size")]
    pub page_size: i64,
}

impl SourcePreviewResult {
    pub fn included(&self) -> impl Iterator<Item = &PreviewModel> {
        self.items.iter().filter(|m| m.included)
    }
}
