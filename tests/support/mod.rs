//! In-memory `ContentApi` that records every request and answers from a closure.

#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use multimart_content::cms::{CmsResult, ContentApi, RequestOptions};
use reqwest::Method;
use serde_json::{json, Value};
use url::form_urlencoded;

#[derive(Debug, Clone)]
pub struct Call {
    pub method: Method,
    pub path: String,
    pub params: Vec<(String, String)>,
    pub body: Option<Value>,
    pub headers: Vec<(String, String)>,
}

impl Call {
    pub fn param(&self, key: &str) -> Option<&str> {
        self.params
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Decoded `query` parameter, if any.
    pub fn query(&self) -> Option<Value> {
        self.param("query")
            .and_then(|raw| serde_json::from_str(raw).ok())
    }

    pub fn is_search(&self) -> bool {
        self.param("query").is_some()
    }
}

type Responder = dyn Fn(&Call) -> CmsResult<Value> + Send + Sync;

#[derive(Clone)]
pub struct RecordingApi {
    calls: Arc<Mutex<Vec<Call>>>,
    respond: Arc<Responder>,
}

impl RecordingApi {
    pub fn new(respond: impl Fn(&Call) -> CmsResult<Value> + Send + Sync + 'static) -> Self {
        Self {
            calls: Arc::new(Mutex::new(Vec::new())),
            respond: Arc::new(respond),
        }
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl ContentApi for RecordingApi {
    async fn request(&self, endpoint: &str, options: RequestOptions) -> CmsResult<Value> {
        let (path, qs) = endpoint.split_once('?').unwrap_or((endpoint, ""));
        let call = Call {
            method: options.method,
            path: path.to_string(),
            params: form_urlencoded::parse(qs.as_bytes()).into_owned().collect(),
            body: options.body,
            headers: options.headers,
        };
        self.calls.lock().unwrap().push(call.clone());
        (self.respond)(&call)
    }
}

pub fn entries(items: Value) -> Value {
    json!({ "entries": items })
}

pub fn product(uid: &str, name: &str, category: &str) -> Value {
    json!({
        "uid": uid,
        "product_name": name,
        "category": category,
        "price": 100,
    })
}
