use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, CONTENT_TYPE};
use reqwest::{Client, Method, StatusCode};
use serde_json::Value;
use tracing::{debug, error};
use url::Url;

use crate::cms::error::{CmsError, CmsResult};
use crate::config::CmsConfig;

/// Error-body fields checked, in order, for a human readable message.
const ERROR_MESSAGE_FIELDS: [&str; 3] = ["error_message", "error", "message"];

const LOGGED_QUERY_LEN: usize = 200;

/// Per-request knobs; mirrors what a `fetch` init object would carry.
#[derive(Debug, Clone)]
pub struct RequestOptions {
    pub method: Method,
    /// Extra headers; these win over the defaults.
    pub headers: Vec<(String, String)>,
    pub body: Option<Value>,
}

impl Default for RequestOptions {
    fn default() -> Self {
        Self::get()
    }
}

impl RequestOptions {
    pub fn get() -> Self {
        Self {
            method: Method::GET,
            headers: Vec::new(),
            body: None,
        }
    }

    pub fn post(body: Value) -> Self {
        Self {
            method: Method::POST,
            headers: Vec::new(),
            body: Some(body),
        }
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }
}

/// The single seam between the content layer and the network.
#[async_trait]
pub trait ContentApi: Send + Sync {
    /// Issue `options.method` against `endpoint` (relative to the API base,
    /// optionally carrying its own query string) and return the JSON body.
    async fn request(&self, endpoint: &str, options: RequestOptions) -> CmsResult<Value>;
}

#[async_trait]
impl<T: ContentApi + ?Sized> ContentApi for Arc<T> {
    async fn request(&self, endpoint: &str, options: RequestOptions) -> CmsResult<Value> {
        (**self).request(endpoint, options).await
    }
}

/// reqwest-backed Contentstack client.
///
/// Attaches `api_key`/`authorization` on every call and merges the configured
/// branch into the query string. No retries, no caching.
#[derive(Clone)]
pub struct CmsClient {
    http: Client,
    base_url: String,
    api_key: String,
    token: String,
    branch: Option<String>,
}

impl std::fmt::Debug for CmsClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CmsClient")
            .field("base_url", &self.base_url)
            .field("branch", &self.branch)
            .finish_non_exhaustive()
    }
}

impl CmsClient {
    /// Fails with [`CmsError::Configuration`] when either credential is missing.
    pub fn new(config: &CmsConfig) -> CmsResult<Self> {
        config.validate()?;
        let (Some(api_key), Some(token)) =
            (config.api_key.clone(), config.management_token.clone())
        else {
            return Err(CmsError::Configuration(
                "Contentstack API key and management token are required".into(),
            ));
        };
        let http = Client::builder()
            .user_agent(concat!("multimart-content/", env!("CARGO_PKG_VERSION")))
            .timeout(Duration::from_secs(config.timeout_secs.max(1)))
            .build()?;

        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key,
            token,
            branch: config.branch.clone(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Full request URL for `endpoint`, with `branch` merged into any existing query.
    pub fn build_url(&self, endpoint: &str) -> CmsResult<Url> {
        let sep = if endpoint.starts_with('/') { "" } else { "/" };
        let raw = format!("{}{}{}", self.base_url, sep, endpoint);
        let mut url = Url::parse(&raw)
            .map_err(|e| CmsError::InvalidInput(format!("invalid endpoint '{endpoint}': {e}")))?;
        if let Some(branch) = self.branch.as_deref() {
            merge_query_param(&mut url, "branch", branch);
        }
        Ok(url)
    }

    fn headers(&self, extra: &[(String, String)]) -> CmsResult<HeaderMap> {
        let mut headers = HeaderMap::new();
        headers.insert("api_key", header_value(&self.api_key)?);
        headers.insert("authorization", header_value(&self.token)?);
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        for (name, value) in extra {
            let name = HeaderName::from_bytes(name.as_bytes())
                .map_err(|e| CmsError::InvalidInput(format!("invalid header name '{name}': {e}")))?;
            headers.insert(name, header_value(value)?);
        }
        Ok(headers)
    }
}

#[async_trait]
impl ContentApi for CmsClient {
    async fn request(&self, endpoint: &str, options: RequestOptions) -> CmsResult<Value> {
        let url = self.build_url(endpoint)?;
        let headers = self.headers(&options.headers)?;

        debug!(
            method = %options.method,
            url = %loggable_url(&url),
            "cms: request"
        );

        let mut req = self
            .http
            .request(options.method.clone(), url.clone())
            .headers(headers);
        if let Some(body) = options.body.as_ref() {
            req = req.body(serde_json::to_vec(body)?);
        }

        let resp = req.send().await?;
        let status = resp.status();
        debug!(status = status.as_u16(), "cms: response");

        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            let message = error_message(status, &body);
            error!(
                status = status.as_u16(),
                url = %loggable_url(&url),
                %message,
                "cms: request failed"
            );
            return Err(CmsError::api(Some(status.as_u16()), message));
        }

        let text = resp.text().await?;
        if text.trim().is_empty() {
            return Ok(Value::Null);
        }
        Ok(serde_json::from_str(&text)?)
    }
}

fn header_value(v: &str) -> CmsResult<HeaderValue> {
    HeaderValue::from_str(v)
        .map_err(|e| CmsError::Configuration(format!("invalid header value: {e}")))
}

/// Append `key=value` unless the query already carries `key`; existing pairs
/// are left byte-for-byte untouched.
pub fn merge_query_param(url: &mut Url, key: &str, value: &str) {
    if url.query_pairs().any(|(k, _)| k == key) {
        return;
    }
    url.query_pairs_mut().append_pair(key, value);
}

/// Message for a non-2xx response: the first non-empty alias field of a JSON
/// error body, else `"Contentstack API error: <status> <reason>"`.
pub fn error_message(status: StatusCode, body: &str) -> String {
    let parsed: Option<Value> = serde_json::from_str(body).ok();
    parsed
        .as_ref()
        .and_then(|v| {
            ERROR_MESSAGE_FIELDS.iter().find_map(|field| {
                v.get(*field)
                    .and_then(|m| m.as_str())
                    .map(str::trim)
                    .filter(|m| !m.is_empty())
                    .map(str::to_string)
            })
        })
        .unwrap_or_else(|| {
            format!(
                "Contentstack API error: {} {}",
                status.as_u16(),
                status.canonical_reason().unwrap_or("")
            )
            .trim_end()
            .to_string()
        })
}

fn loggable_url(url: &Url) -> String {
    let base = format!(
        "{}://{}{}",
        url.scheme(),
        url.host_str().unwrap_or_default(),
        url.path()
    );
    match url.query() {
        Some(q) if q.len() > LOGGED_QUERY_LEN => {
            let head: String = q.chars().take(LOGGED_QUERY_LEN).collect();
            format!("{base}?{head}...")
        }
        Some(q) => format!("{base}?{q}"),
        None => base,
    }
}
