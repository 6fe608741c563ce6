use std::sync::{Arc, Mutex};

use optimistic_resource::http::header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE};
use optimistic_resource::{
    ConfigError, ManagedData, ModelConfig, ModelError, ResourceModel, ResourceModelBuilder,
};
use serde_json::json;
use tokio::sync::Notify;

use crate::support::{record_data, record_loading, users_model, MockExecutor, BASE_URL};

#[test]
fn build_reports_the_first_missing_setting() {
    let executor = MockExecutor::ok(json!([]));

    let err = ResourceModel::builder()
        .resource("users")
        .executor(executor.clone())
        .build()
        .err();
    assert_eq!(err, Some(ConfigError::MissingBaseUrl));

    let err = ResourceModel::builder()
        .base_url(BASE_URL)
        .resource("   ")
        .executor(executor)
        .build()
        .err();
    assert_eq!(err, Some(ConfigError::MissingResource));

    let err = ResourceModel::builder()
        .base_url(BASE_URL)
        .resource("users")
        .build()
        .err();
    assert_eq!(err, Some(ConfigError::MissingExecutor));
}

#[tokio::test]
async fn slashes_are_normalized_between_base_and_resource() {
    let executor = MockExecutor::ok(json!([]));
    let model = ResourceModel::builder()
        .base_url("https://api.test/v1/")
        .resource("/users")
        .executor(executor.clone())
        .build()
        .unwrap();

    model.fetch_all().await.unwrap();

    assert_eq!(executor.calls()[0].url, "https://api.test/v1/users");
}

#[tokio::test]
async fn every_request_carries_json_and_configured_headers() {
    let executor = MockExecutor::ok(json!({ "id": "1" }));
    let model = ResourceModel::builder()
        .base_url(BASE_URL)
        .resource("users")
        .executor(executor.clone())
        .header("Authorization", "Bearer secret")
        .initial_data(json!([]))
        .build()
        .unwrap();

    model.create(json!({ "name": "A" })).await.unwrap();

    let headers = &executor.calls()[0].headers;
    assert_eq!(headers[CONTENT_TYPE], "application/json");
    assert_eq!(headers[ACCEPT], "application/json");
    assert_eq!(headers[AUTHORIZATION], "Bearer secret");
}

#[tokio::test]
async fn builder_accepts_a_deserialized_config() {
    let config: ModelConfig = serde_json::from_value(json!({
        "base_url": "https://api.test/v2",
        "resource": "teams",
        "headers": { "X-Tenant": "acme" }
    }))
    .unwrap();
    let executor = MockExecutor::ok(json!([]));

    let model = ResourceModelBuilder::from_config(config)
        .executor(executor.clone())
        .build()
        .unwrap();
    model.fetch_all().await.unwrap();

    let call = &executor.calls()[0];
    assert_eq!(call.url, "https://api.test/v2/teams");
    assert_eq!(call.headers["x-tenant"], "acme");
}

#[test]
fn invalid_header_fails_construction() {
    let err = ResourceModel::builder()
        .base_url(BASE_URL)
        .resource("users")
        .executor(MockExecutor::ok(json!([])))
        .header("bad header", "x")
        .build()
        .err();

    assert!(matches!(err, Some(ConfigError::InvalidHeader { .. })));
}

#[test]
fn initial_state_is_visible_immediately() {
    let executor = MockExecutor::ok(json!([]));
    let model = users_model(&executor, json!([{ "id": 1, "name": "Numeric" }]));

    assert_eq!(model.find("1"), Some(json!({ "id": 1, "name": "Numeric" })));
    assert!(!model.loading());
    assert!(model.error().is_none());
    assert_eq!(executor.call_count(), 0);
}

#[tokio::test]
async fn loading_is_true_only_while_a_request_is_outstanding() {
    let gate = Arc::new(Notify::new());
    let executor = MockExecutor::ok(json!([])).gated(Arc::clone(&gate));
    let model = users_model(&executor, json!([]));
    let (loading, _sub) = record_loading(&model);

    let (result, _) = tokio::join!(model.fetch_all(), async {
        tokio::task::yield_now().await;
        assert!(model.loading());
        gate.notify_one();
    });

    result.unwrap();
    assert_eq!(*loading.lock().unwrap(), vec![false, true, false]);
}

#[test]
fn unsubscribed_handlers_stop_receiving() {
    let executor = MockExecutor::ok(json!([]));
    let model = users_model(&executor, json!([]));
    let (seen, subscription) = record_data(&model);

    model.state().set_data(json!([{ "id": "1" }]));
    subscription.unsubscribe();
    model.state().set_data(json!([{ "id": "2" }]));

    assert_eq!(seen.lock().unwrap().len(), 2);
    assert_eq!(model.find("2"), Some(json!({ "id": "2" })));
}

#[tokio::test]
async fn operations_after_dispose_are_refused() {
    let executor = MockExecutor::ok(json!({ "id": "1" }));
    let model = users_model(&executor, json!([{ "id": "1" }]));
    let (seen, _sub) = record_data(&model);

    model.dispose();
    model.dispose();

    assert!(model.is_disposed());
    assert_eq!(model.fetch_all().await.unwrap_err(), ModelError::Disposed);
    assert_eq!(
        model.create(json!({ "name": "A" })).await.unwrap_err(),
        ModelError::Disposed
    );
    assert_eq!(
        model.update("1", json!({ "name": "B" })).await.unwrap_err(),
        ModelError::Disposed
    );
    assert_eq!(model.delete("1").await.unwrap_err(), ModelError::Disposed);

    assert_eq!(executor.call_count(), 0);
    assert_eq!(seen.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn dispose_during_a_request_silences_the_settle() {
    let gate = Arc::new(Notify::new());
    let executor = MockExecutor::ok(json!({ "id": "srv-1", "name": "A" })).gated(Arc::clone(&gate));
    let model = users_model(&executor, json!([]));
    let notified = Arc::new(Mutex::new(0));
    let counter = Arc::clone(&notified);
    let _sub = model.subscribe_data(move |_| *counter.lock().unwrap() += 1);

    let (result, _) = tokio::join!(model.create(json!({ "name": "A" })), async {
        tokio::task::yield_now().await;
        model.dispose();
        gate.notify_one();
    });

    result.unwrap();
    // Replay and the optimistic write; the reconcile after dispose is dropped.
    assert_eq!(*notified.lock().unwrap(), 2);
    assert_ne!(model.data(), ManagedData::from_value(json!([{ "id": "srv-1", "name": "A" }])));
}
