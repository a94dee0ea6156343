//! Catalog browsing through the public paging helpers

use futures::StreamExt;
use model_registry_client::{page_stream, ClientError};
use model_registry_core::{CatalogModelQuery, FilterQuery, ListOptions, ValueType};
use model_registry_integration_tests::{catalog_client, catalog_path};
use serde_json::json;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn models_page(names: &[&str], token: &str) -> serde_json::Value {
    let items: Vec<_> = names.iter().map(|n| json!({"name": n, "source_id": "hf"})).collect();
    json!({
        "items": items,
        "size": names.len(),
        "pageSize": 2,
        "nextPageToken": token,
    })
}

#[tokio::test]
async fn test_page_stream_yields_each_page_once() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(catalog_path("models")))
        .and(query_param("next_page_token", "b"))
        .respond_with(ResponseTemplate::new(200).set_body_json(models_page(&["e"], "")))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(catalog_path("models")))
        .and(query_param("next_page_token", "a"))
        .respond_with(ResponseTemplate::new(200).set_body_json(models_page(&["c", "d"], "b")))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(catalog_path("models")))
        .respond_with(ResponseTemplate::new(200).set_body_json(models_page(&["a", "b"], "a")))
        .expect(1)
        .mount(&server)
        .await;

    let catalog = catalog_client(&server);
    let pages: Vec<_> = page_stream(
        CatalogModelQuery::new().in_source("hf").with_page_size(2),
        |q: CatalogModelQuery| {
            let catalog = catalog.clone();
            async move { catalog.list_models(&q).await }
        },
    )
    .collect()
    .await;

    let sizes: Vec<_> = pages
        .into_iter()
        .map(|p| p.unwrap().items.len())
        .collect();
    assert_eq!(sizes, vec![2, 2, 1]);
}

#[tokio::test]
async fn test_repeated_token_stops_all_models() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(catalog_path("models")))
        .respond_with(ResponseTemplate::new(200).set_body_json(models_page(&["x"], "loop")))
        .mount(&server)
        .await;

    let err = catalog_client(&server)
        .all_models(CatalogModelQuery::new())
        .await
        .unwrap_err();
    assert!(matches!(err, ClientError::Pagination(_)));
}

#[tokio::test]
async fn test_get_retries_transient_errors() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(catalog_path("sources")))
        .respond_with(ResponseTemplate::new(502))
        .up_to_n_times(2)
        .expect(2)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(catalog_path("sources")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "items": [{"id": "hf", "name": "Hugging Face", "enabled": true}],
            "size": 1,
            "next_page_token": ""
        })))
        .expect(1)
        .mount(&server)
        .await;

    let sources = catalog_client(&server)
        .list_sources(&ListOptions::new())
        .await
        .unwrap();
    assert_eq!(sources.items[0].id, "hf");
}

#[tokio::test]
async fn test_exhausted_retries_surface_last_status() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(catalog_path("filter_options")))
        .respond_with(ResponseTemplate::new(503).set_body_string("upstream unavailable"))
        .expect(3)
        .mount(&server)
        .await;

    let err = catalog_client(&server).filter_options().await.unwrap_err();
    match err {
        ClientError::Http { status, message, .. } => {
            assert_eq!(status, 503);
            assert_eq!(message, "upstream unavailable");
        }
        other => panic!("expected an HTTP error, got {:?}", other),
    }
}

#[tokio::test]
async fn test_typed_property_filter_on_the_wire() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(catalog_path("models")))
        .and(query_param(
            "filterQuery",
            r#"license = "apache-2.0" AND accuracy.float_value > 0.8"#,
        ))
        .respond_with(ResponseTemplate::new(200).set_body_json(models_page(&["granite"], "")))
        .expect(1)
        .mount(&server)
        .await;

    let filter = FilterQuery::field("license")
        .eq("apache-2.0")
        .and(FilterQuery::property("accuracy", ValueType::Float).gt(0.8));
    let page = catalog_client(&server)
        .list_models(&CatalogModelQuery::new().with_filter(filter))
        .await
        .unwrap();
    assert_eq!(page.items.len(), 1);
}
