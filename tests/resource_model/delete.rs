use optimistic_resource::http::Method;
use optimistic_resource::{ExecutorResponse, ManagedData, ModelError, TransportError};
use serde_json::json;

use crate::support::{record_data, users_model, MockExecutor};

#[tokio::test]
async fn delete_removes_item_and_calls_item_address() {
    let executor = MockExecutor::new(|_| Ok(ExecutorResponse::no_content()));
    let model = users_model(&executor, json!([{ "id": "1" }, { "id": "2" }]));

    model.delete("1").await.unwrap();

    assert_eq!(model.data(), ManagedData::from_value(json!([{ "id": "2" }])));
    let calls = executor.calls();
    assert_eq!(calls[0].method, Method::DELETE);
    assert_eq!(calls[0].url, "https://api.test/v1/users/1");
    assert!(calls[0].body.is_none());
}

#[tokio::test]
async fn deleting_the_last_item_leaves_an_empty_collection() {
    let executor = MockExecutor::new(|_| Ok(ExecutorResponse::no_content()));
    let model = users_model(&executor, json!([{ "id": "1" }]));

    model.delete("1").await.unwrap();

    assert_eq!(model.data(), ManagedData::Many(vec![]));
}

#[tokio::test]
async fn deleting_the_single_item_empties_the_model() {
    let executor = MockExecutor::ok(json!({ "deleted": true }));
    let model = users_model(&executor, json!({ "id": "me" }));

    model.delete("me").await.unwrap();

    assert!(model.data().is_empty());
}

#[tokio::test]
async fn deleting_an_absent_item_is_a_silent_no_op() {
    let executor = MockExecutor::failing("should not be called");
    let model = users_model(&executor, json!([{ "id": "1" }]));
    let (seen, _sub) = record_data(&model);

    model.delete("nope").await.unwrap();

    assert_eq!(executor.call_count(), 0);
    assert_eq!(seen.lock().unwrap().len(), 1);
    assert!(model.error().is_none());
    assert!(!model.loading());
}

#[tokio::test]
async fn deleting_from_a_mismatched_single_item_is_a_no_op() {
    let executor = MockExecutor::failing("should not be called");
    let model = users_model(&executor, json!({ "id": "me" }));

    model.delete("someone-else").await.unwrap();

    assert_eq!(model.data(), ManagedData::Single(json!({ "id": "me" })));
    assert_eq!(executor.call_count(), 0);
}

#[tokio::test]
async fn failure_restores_the_removed_item_in_place() {
    let executor = MockExecutor::new(|_| Ok(ExecutorResponse::text(409, "in use")));
    let initial = json!([{ "id": "1" }, { "id": "2" }, { "id": "3" }]);
    let model = users_model(&executor, initial.clone());

    let err = model.delete("2").await.unwrap_err();

    assert!(matches!(
        err,
        ModelError::Transport(TransportError::Status { status: 409, .. })
    ));
    assert_eq!(model.data(), ManagedData::from_value(initial));
    assert_eq!(model.error(), Some(err));
    assert!(!model.loading());
}

#[tokio::test]
async fn executor_failure_restores_the_snapshot() {
    let executor = MockExecutor::failing("connection reset");
    let initial = json!([{ "id": "1" }, { "id": "2" }]);
    let model = users_model(&executor, initial.clone());
    let (seen, _sub) = record_data(&model);

    let err = model.delete("1").await.unwrap_err();

    assert_eq!(err, ModelError::Transport(TransportError::failed("connection reset")));
    assert_eq!(model.data(), ManagedData::from_value(initial.clone()));
    assert_eq!(model.error(), Some(err));
    assert!(!model.loading());
    // Replay, optimistic removal, restore.
    let seen = seen.lock().unwrap();
    assert_eq!(seen.len(), 3);
    assert_eq!(seen[1], ManagedData::from_value(json!([{ "id": "2" }])));
    assert_eq!(seen[2], ManagedData::from_value(initial));
}
