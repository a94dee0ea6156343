//! Fixtures shared by the cross-crate integration tests
//!
//! Every client built here talks to a `wiremock` server, never reads the
//! service-account token file, and retries with millisecond backoff so
//! retry tests stay fast.

use std::time::Duration;

use model_registry_client::config::{CATALOG_API_PREFIX, REGISTRY_API_PREFIX};
use model_registry_client::{
    ClientConfig, ModelCatalogClient, ModelRegistryClient, RegistryTrackingStore, RetryPolicy,
};
use serde_json::{json, Value};
use wiremock::MockServer;

/// Retry policy with the default statuses and attempts but tiny delays
pub fn fast_retry() -> RetryPolicy {
    RetryPolicy::new().with_backoff(Duration::from_millis(1), Duration::from_millis(5))
}

pub fn registry_config(server: &MockServer) -> ClientConfig {
    ClientConfig::registry(&server.uri())
        .expect("mock server URI is valid")
        .with_token_path(None)
        .with_retry(fast_retry())
}

pub fn catalog_config(server: &MockServer) -> ClientConfig {
    ClientConfig::catalog(&server.uri())
        .expect("mock server URI is valid")
        .with_token_path(None)
        .with_retry(fast_retry())
}

pub fn registry_client(server: &MockServer) -> ModelRegistryClient {
    ModelRegistryClient::new(registry_config(server)).expect("registry client builds")
}

pub fn catalog_client(server: &MockServer) -> ModelCatalogClient {
    ModelCatalogClient::new(catalog_config(server)).expect("catalog client builds")
}

pub fn tracking_store(server: &MockServer) -> RegistryTrackingStore {
    RegistryTrackingStore::new(registry_client(server))
}

/// Full request path of a registry endpoint
pub fn registry_path(endpoint: &str) -> String {
    format!("{}/{}", REGISTRY_API_PREFIX, endpoint.trim_start_matches('/'))
}

/// Full request path of a catalog endpoint
pub fn catalog_path(endpoint: &str) -> String {
    format!("{}/{}", CATALOG_API_PREFIX, endpoint.trim_start_matches('/'))
}

/// `MetadataStringValue` envelope as the server sends it
pub fn string_property(value: &str) -> Value {
    json!({"string_value": value, "metadataType": "MetadataStringValue"})
}

/// `MetadataIntValue` envelope; the int travels as a string
pub fn int_property(value: i64) -> Value {
    json!({"int_value": value.to_string(), "metadataType": "MetadataIntValue"})
}

/// Registry list envelope
pub fn page(items: Vec<Value>, next_page_token: &str) -> Value {
    json!({
        "items": items,
        "size": items.len(),
        "pageSize": items.len(),
        "nextPageToken": next_page_token,
    })
}
