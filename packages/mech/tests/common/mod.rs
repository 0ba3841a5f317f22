#![allow(dead_code)]

use async_trait::async_trait;
use hypermap::{BehaviorRegistry, Config, FetchResponse, Transport, TransportError, Value};
use mech::{LocalLauncher, Mech, TabConfig};
use serde_json::json;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use url::Url;

pub const BASE: &str = "http://localhost/";

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
}

/// In-memory todo application served over the `Transport` seam
pub struct TodoServer {
    todos: Mutex<Vec<serde_json::Value>>,
    counter: AtomicUsize,
}

impl TodoServer {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            todos: Mutex::new(vec![json!({
                "@": {"href": "1/"},
                "title": "Buy milk",
                "completed": false
            })]),
            counter: AtomicUsize::new(0),
        })
    }

    fn index(&self) -> serde_json::Value {
        let todos = self.todos.lock().unwrap().clone();
        json!({
            "completed": 0,
            "todos": todos,
            "newTodo": {"@": {"href": "", "method": "POST"}, "title": "String"},
            "broken": {"@": {"href": "/broken/", "method": "post"}}
        })
    }

    fn get(&self, path: &str) -> Option<serde_json::Value> {
        match path {
            "/" => Some(self.index()),
            "/1/" => Some(json!({"title": "Buy milk", "completed": false})),
            "/transclude/" => Some(json!({
                "label": "Counter",
                "counter": {"@": {"href": "/counter/", "rels": ["transclude"]}}
            })),
            "/counter/" => Some(json!({"count": self.counter.fetch_add(1, Ordering::SeqCst)})),
            "/scripts/" => Some(json!({
                "@": {"script": "/assets/foo.js"},
                "echo": {"@": {"script": "/assets/echo.js"}, "input": null, "output": null},
                "broken": {"@": {"script": "/assets/missing.js"}}
            })),
            _ => None,
        }
    }

    fn post(&self, url: &Url, body: &str) -> FetchResponse {
        if url.path() != "/" {
            return FetchResponse::status(url.clone(), http::StatusCode::INTERNAL_SERVER_ERROR);
        }
        let fields: serde_json::Value = serde_json::from_str(body).unwrap_or_else(|_| json!({}));
        {
            let mut todos = self.todos.lock().unwrap();
            let href = format!("{}/", todos.len() + 1);
            todos.push(json!({
                "@": {"href": href},
                "title": fields.get("title").cloned().unwrap_or(serde_json::Value::Null),
                "completed": false
            }));
        }
        FetchResponse::redirected_to(url.clone(), self.index().to_string())
    }
}

#[async_trait]
impl Transport for TodoServer {
    async fn fetch(&self, request: http::Request<String>) -> Result<FetchResponse, TransportError> {
        let url = Url::parse(&request.uri().to_string()).map_err(|e| TransportError::Network(e.to_string()))?;

        if request.method() == http::Method::GET {
            Ok(match self.get(url.path()) {
                Some(body) => FetchResponse::json(url, &body),
                None => FetchResponse::status(url, http::StatusCode::NOT_FOUND),
            })
        } else {
            Ok(self.post(&url, request.body()))
        }
    }
}

pub fn behaviors() -> Arc<BehaviorRegistry> {
    let mut registry = BehaviorRegistry::new();
    registry
        .register("/assets/foo.js", |doc, node| {
            doc.set(node, "foo", "bar")?;
            Ok(())
        })
        .register("/assets/echo.js", |doc, node| {
            doc.on_changed(node, |doc, event| {
                if event.key.as_name() == Some("input") {
                    if let Some(Value::Scalar(input)) = &event.value {
                        let input = input.clone();
                        let _ = doc.set(event.current_target, "output", input);
                    }
                }
            })?;
            Ok(())
        });
    Arc::new(registry)
}

pub fn new_mech(server: Arc<TodoServer>) -> Mech {
    init_tracing();
    let launcher = LocalLauncher::new(server, behaviors(), Arc::new(Config::default()));
    Mech::new(Arc::new(launcher), TabConfig::default())
}

pub fn url(path: &str) -> String {
    format!("http://localhost{}", path)
}
