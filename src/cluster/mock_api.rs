//! In-process API server for adapter tests
//!
//! Requests are answered by a routing closure and recorded as
//! `METHOD path?query` so tests can assert on what was sent.

use std::sync::{Arc, Mutex};

use http::{Method, Request, Response};
use kube::Client;
use kube::client::Body;
use serde_json::{Value, json};

pub type Recorded = Arc<Mutex<Vec<String>>>;

/// Client whose requests are answered by `route(method, path)`
pub fn mock_client<F>(route: F) -> (Client, Recorded)
where
    F: Fn(&Method, &str) -> (u16, Value) + Send + 'static,
{
    let (service, mut handle) = tower_test::mock::pair::<Request<Body>, Response<Body>>();
    let recorded: Recorded = Arc::default();
    let seen = recorded.clone();

    tokio::spawn(async move {
        while let Some((request, send)) = handle.next_request().await {
            seen.lock()
                .unwrap()
                .push(format!("{} {}", request.method(), request.uri()));
            let (status, body) = route(request.method(), request.uri().path());
            let response = Response::builder()
                .status(status)
                .body(Body::from(serde_json::to_vec(&body).unwrap()))
                .unwrap();
            send.send_response(response);
        }
    });

    (Client::new(service, "default"), recorded)
}

/// `metav1.Status` failure body
pub fn status(code: u16, reason: &str, message: &str) -> Value {
    json!({
        "kind": "Status",
        "apiVersion": "v1",
        "metadata": {},
        "status": "Failure",
        "message": message,
        "reason": reason,
        "code": code,
    })
}

pub fn not_found(path: &str) -> (u16, Value) {
    (404, status(404, "NotFound", &format!("{} not found", path)))
}
