use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

use optimistic_resource::events::{CREATED, DELETED, FETCHED, UPDATED};
use optimistic_resource::{ExecutorResponse, ResourceModel};
use serde_json::{json, Value};

use crate::support::{users_model, MockExecutor};

fn record(model: &ResourceModel, event: &str) -> Arc<Mutex<Vec<Value>>> {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&seen);
    model.on_event(event, move |payload: String| {
        let value = serde_json::from_str(&payload).unwrap_or(Value::Null);
        sink.lock().unwrap().push(value);
    });
    seen
}

#[tokio::test]
async fn confirmed_operations_emit_lifecycle_events() {
    let executor = MockExecutor::new(|call| match call.method.as_str() {
        "GET" => Ok(ExecutorResponse::Parsed(json!([{ "id": "1", "name": "Alice" }]))),
        "POST" => Ok(ExecutorResponse::Parsed(json!({ "id": "2", "name": "Bob" }))),
        "PUT" => Ok(ExecutorResponse::Parsed(json!({ "id": "2", "name": "Robert" }))),
        _ => Ok(ExecutorResponse::no_content()),
    });
    let model = users_model(&executor, json!([]));
    let fetched = record(&model, FETCHED);
    let created = record(&model, CREATED);
    let updated = record(&model, UPDATED);
    let deleted = record(&model, DELETED);

    model.fetch_all().await.unwrap();
    model.create(json!({ "name": "Bob" })).await.unwrap();
    model.update("2", json!({ "name": "Robert" })).await.unwrap();
    model.delete("1").await.unwrap();

    // Listeners run on their own threads.
    thread::sleep(Duration::from_millis(100));

    assert_eq!(
        *fetched.lock().unwrap(),
        vec![json!([{ "id": "1", "name": "Alice" }])]
    );
    assert_eq!(*created.lock().unwrap(), vec![json!({ "id": "2", "name": "Bob" })]);
    assert_eq!(
        *updated.lock().unwrap(),
        vec![json!({ "id": "2", "name": "Robert" })]
    );
    assert_eq!(*deleted.lock().unwrap(), vec![json!({ "id": "1" })]);
}

#[tokio::test]
async fn failed_operations_emit_nothing() {
    let executor = MockExecutor::failing("offline");
    let model = users_model(&executor, json!([{ "id": "1" }]));
    let created = record(&model, CREATED);
    let deleted = record(&model, DELETED);

    assert!(model.create(json!({ "name": "A" })).await.is_err());
    assert!(model.delete("1").await.is_err());

    thread::sleep(Duration::from_millis(100));

    assert!(created.lock().unwrap().is_empty());
    assert!(deleted.lock().unwrap().is_empty());
}
