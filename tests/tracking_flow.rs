//! Experiment-tracking store driving the registry end to end

use model_registry_client::{TrackingStore, ViewType};
use model_registry_core::{
    DataSet, ExperimentRunStatus, ListOptions, Metric, Parameter, Properties, PropertyValue,
};
use model_registry_integration_tests::{
    int_property, page, registry_path, string_property, tracking_store,
};
use serde_json::json;
use wiremock::matchers::{body_json, body_partial_json, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[tokio::test]
async fn test_run_lifecycle() {
    let server = MockServer::start().await;
    let store = tracking_store(&server);

    Mock::given(method("POST"))
        .and(path(registry_path("experiment_runs")))
        .and(body_partial_json(json!({
            "experimentId": "3",
            "name": "baseline",
            "status": "RUNNING",
            "startTimeSinceEpoch": "1700000000000",
            "customProperties": {"git_sha": string_property("abc123")}
        })))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "id": "11",
            "experimentId": "3",
            "name": "baseline",
            "status": "RUNNING"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let mut tags = Properties::new();
    tags.insert("git_sha".into(), PropertyValue::from("abc123"));
    let run = store
        .create_run("3", Some("baseline"), 1_700_000_000_000, tags)
        .await
        .unwrap();
    assert_eq!(run.id.as_deref(), Some("11"));
    assert_eq!(run.status, Some(ExperimentRunStatus::Running));

    Mock::given(method("PATCH"))
        .and(path(registry_path("experiment_runs/11")))
        .and(body_json(json!({
            "status": "FINISHED",
            "endTimeSinceEpoch": "1700000360000"
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "11",
            "experimentId": "3",
            "status": "FINISHED",
            "endTimeSinceEpoch": "1700000360000"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let finished = store
        .update_run_info("11", ExperimentRunStatus::Finished, Some(1_700_000_360_000), None)
        .await
        .unwrap();
    assert_eq!(finished.end_time_since_epoch, Some(1_700_000_360_000));
}

#[tokio::test]
async fn test_log_batch_writes_params_metrics_and_tags() {
    let server = MockServer::start().await;
    let store = tracking_store(&server);

    Mock::given(method("POST"))
        .and(path(registry_path("experiment_runs/11/artifacts")))
        .and(body_partial_json(json!({"artifactType": "parameter", "name": "lr"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "artifactType": "parameter", "id": "80", "name": "lr", "value": "0.01"
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path(registry_path("experiment_runs/11/artifacts")))
        .and(body_partial_json(json!({"artifactType": "metric", "name": "loss"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "artifactType": "metric", "id": "81", "name": "loss", "value": 0.25
        })))
        .expect(2)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(registry_path("experiment_runs/11")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "11",
            "experimentId": "3",
            "customProperties": {"owner": string_property("alice")}
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("PATCH"))
        .and(path(registry_path("experiment_runs/11")))
        .and(body_json(json!({
            "customProperties": {
                "owner": string_property("alice"),
                "stage": string_property("tuning")
            }
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "11", "experimentId": "3"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let metrics = vec![
        Metric::new("loss", 0.5, 1_700_000_000_000, 1),
        Metric::new("loss", 0.25, 1_700_000_060_000, 2),
    ];
    let params = vec![Parameter::new("lr", "0.01")];
    let mut tags = Properties::new();
    tags.insert("stage".into(), PropertyValue::from("tuning"));

    store.log_batch("11", metrics, params, tags).await.unwrap();
}

#[tokio::test]
async fn test_tag_merge_preserves_every_stored_kind() {
    let server = MockServer::start().await;
    let stored = json!({
        "epochs": int_property(12),
        "lr": {"double_value": 0.01, "metadataType": "MetadataDoubleValue"},
        "tuned": {"bool_value": true, "metadataType": "MetadataBoolValue"},
        "config": {"struct_value": "eyJsYXllcnMiOjR9", "metadataType": "MetadataStructValue"},
        "stage": string_property("draft")
    });

    Mock::given(method("GET"))
        .and(path(registry_path("experiment_runs/11")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "11",
            "experimentId": "3",
            "customProperties": stored
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("PATCH"))
        .and(path(registry_path("experiment_runs/11")))
        .and(body_json(json!({
            "customProperties": {
                "epochs": int_property(12),
                "lr": {"double_value": 0.01, "metadataType": "MetadataDoubleValue"},
                "tuned": {"bool_value": true, "metadataType": "MetadataBoolValue"},
                "config": {"struct_value": "eyJsYXllcnMiOjR9", "metadataType": "MetadataStructValue"},
                "stage": string_property("tuning"),
                "retries": int_property(3)
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
    tags.insert("retries".into(), PropertyValue::Int(3));

    tracking_store(&server)
        .log_batch("11", vec![], vec![], tags)
        .await
        .unwrap();
}

#[tokio::test]
async fn test_metric_history_across_pages() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(registry_path("experiment_runs/11/metric_history")))
        .and(query_param("name", "loss"))
        .and(query_param("pageToken", "p2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(page(
            vec![json!({
                "artifactType": "metric", "name": "loss", "value": 0.1, "step": "3"
            })],
            "",
        )))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(registry_path("experiment_runs/11/metric_history")))
        .and(query_param("name", "loss"))
        .respond_with(ResponseTemplate::new(200).set_body_json(page(
            vec![
                json!({"artifactType": "metric", "name": "loss", "value": 0.5, "step": "1"}),
                json!({"artifactType": "metric", "name": "loss", "value": 0.3, "step": "2"}),
            ],
            "p2",
        )))
        .mount(&server)
        .await;

    let history = tracking_store(&server)
        .get_metric_history("11", "loss")
        .await
        .unwrap();
    let steps: Vec<_> = history.iter().filter_map(|m| m.step).collect();
    assert_eq!(steps, vec![1, 2, 3]);
}

#[tokio::test]
async fn test_experiment_soft_delete_and_restore() {
    let server = MockServer::start().await;
    let store = tracking_store(&server);

    Mock::given(method("PATCH"))
        .and(path(registry_path("experiments/3")))
        .and(body_json(json!({"state": "ARCHIVED"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "3", "name": "churn", "state": "ARCHIVED"
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("PATCH"))
        .and(path(registry_path("experiments/3")))
        .and(body_json(json!({"state": "LIVE"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "3", "name": "churn", "state": "LIVE"
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(registry_path("experiments")))
        .and(query_param("filterQuery", r#"state = "ARCHIVED""#))
        .respond_with(ResponseTemplate::new(200).set_body_json(page(vec![], "")))
        .expect(1)
        .mount(&server)
        .await;

    store.delete_experiment("3").await.unwrap();
    store.restore_experiment("3").await.unwrap();

    let deleted = store
        .search_experiments(ViewType::DeletedOnly, ListOptions::new())
        .await
        .unwrap();
    assert!(deleted.items.is_empty());
}

#[tokio::test]
async fn test_log_inputs_and_lookup_by_name() {
    let server = MockServer::start().await;
    let store = tracking_store(&server);

    Mock::given(method("POST"))
        .and(path(registry_path("experiment_runs/11/artifacts")))
        .and(body_partial_json(json!({
            "artifactType": "dataset-artifact",
            "name": "train",
            "digest": "sha256:1f2e"
        })))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "artifactType": "dataset-artifact", "id": "60", "name": "train"
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(registry_path("experiment")))
        .and(query_param("name", "missing"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({
            "code": "RESOURCE_DOES_NOT_EXIST", "message": "experiment not found"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let dataset = DataSet {
        name: Some("train".into()),
        digest: Some("sha256:1f2e".into()),
        uri: Some("s3://data/train.parquet".into()),
        ..Default::default()
    };
    store.log_inputs("11", vec![dataset]).await.unwrap();

    assert!(store.get_experiment_by_name("missing").await.unwrap().is_none());
}
