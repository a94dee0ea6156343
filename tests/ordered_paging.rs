//! Ordering parameters must ride along on every follow-up page

use model_registry_core::{CatalogModelQuery, CatalogOrderBy, ListOptions, OrderBy, SortOrder};
use model_registry_integration_tests::{catalog_client, catalog_path, page, registry_client, registry_path};
use serde_json::json;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn models(names: &[&str]) -> Vec<serde_json::Value> {
    names
        .iter()
        .enumerate()
        .map(|(i, n)| json!({"id": i.to_string(), "name": n}))
        .collect()
}

fn assert_descending_and_unique(names: &[String]) {
    let mut sorted = names.to_vec();
    sorted.sort_by(|a, b| b.cmp(a));
    sorted.dedup();
    assert_eq!(sorted, names);
}

#[tokio::test]
async fn test_registry_pages_keep_declared_order() {
    let server = MockServer::start().await;

    // Later pages first: a mock without a token matcher would also match them
    Mock::given(method("GET"))
        .and(path(registry_path("registered_models")))
        .and(query_param("orderBy", "NAME"))
        .and(query_param("sortOrder", "DESC"))
        .and(query_param("pageSize", "2"))
        .and(query_param("pageToken", "t2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(page(models(&["alpha"]), "")))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(registry_path("registered_models")))
        .and(query_param("orderBy", "NAME"))
        .and(query_param("sortOrder", "DESC"))
        .and(query_param("pageSize", "2"))
        .and(query_param("pageToken", "t1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(page(models(&["sigma", "beta"]), "t2")))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(registry_path("registered_models")))
        .and(query_param("orderBy", "NAME"))
        .and(query_param("sortOrder", "DESC"))
        .and(query_param("pageSize", "2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(page(models(&["zeta", "theta"]), "t1")))
        .expect(1)
        .mount(&server)
        .await;

    let options = ListOptions::new()
        .with_page_size(2)
        .with_order(OrderBy::Name, SortOrder::Desc);
    let names: Vec<String> = registry_client(&server)
        .all_registered_models(options)
        .await
        .unwrap()
        .into_iter()
        .map(|m| m.name)
        .collect();

    assert_eq!(names, vec!["zeta", "theta", "sigma", "beta", "alpha"]);
    assert_descending_and_unique(&names);
}

#[tokio::test]
async fn test_catalog_pages_keep_declared_order() {
    let server = MockServer::start().await;
    let catalog_page = |names: &[&str], token: &str| {
        json!({
            "items": names.iter().map(|n| json!({"name": n, "source_id": "hf"})).collect::<Vec<_>>(),
            "size": names.len(),
            "page_size": 2,
            "next_page_token": token,
        })
    };

    Mock::given(method("GET"))
        .and(path(catalog_path("models")))
        .and(query_param("source", "hf"))
        .and(query_param("order_by", "ACCURACY"))
        .and(query_param("sort_order", "DESC"))
        .and(query_param("next_page_token", "n1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(catalog_page(&["llama", "granite"], "")))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(catalog_path("models")))
        .and(query_param("source", "hf"))
        .and(query_param("order_by", "ACCURACY"))
        .and(query_param("sort_order", "DESC"))
        .respond_with(ResponseTemplate::new(200).set_body_json(catalog_page(&["qwen", "mistral"], "n1")))
        .expect(1)
        .mount(&server)
        .await;

    let query = CatalogModelQuery::new()
        .in_source("hf")
        .with_page_size(2)
        .with_order(CatalogOrderBy::Accuracy, SortOrder::Desc);
    let names: Vec<String> = catalog_client(&server)
        .all_models(query)
        .await
        .unwrap()
        .into_iter()
        .map(|m| m.name)
        .collect();

    assert_eq!(names, vec!["qwen", "mistral", "llama", "granite"]);
    assert_descending_and_unique(&names);
}
