//! NIOS WAPI Client for Terraform Provider

use crate::config::{ClientConfig, RetryPolicy};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION, CONTENT_TYPE};
use serde::Deserialize;
use serde_json::{Map, Value};
use thiserror::Error;
use tracing::debug;

/// Client errors
#[derive(Error, Debug)]
pub enum WapiError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("WAPI error: {status} {code}: {text}")]
    Api {
        status: u16,
        code: String,
        text: String,
    },
    #[error("Authentication failed: {0}")]
    AuthFailed(String),
    #[error("Object not found: {0}")]
    NotFound(String),
    #[error("Unexpected WAPI response: {0}")]
    Decode(String),
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl WapiError {
    pub fn is_not_found(&self) -> bool {
        match self {
            WapiError::NotFound(_) => true,
            WapiError::Api { status, code, .. } => *status == 404 || code.ends_with("Data.NotFound"),
            _ => false,
        }
    }

    /// The object is still referenced or locked by another operation
    pub fn is_conflict(&self) -> bool {
        match self {
            WapiError::Api { status, code, text } => {
                let text = text.to_ascii_lowercase();
                *status == 409
                    || code.contains("Conflict")
                    || text.contains("in use")
                    || text.contains("is referenced")
            }
            _ => false,
        }
    }
}

pub type Result<T> = std::result::Result<T, WapiError>;

/// Error document returned by the WAPI on failure
#[derive(Debug, Deserialize)]
struct WapiErrorBody {
    #[serde(rename = "Error", default)]
    error: String,
    #[serde(default)]
    code: String,
    #[serde(default)]
    text: String,
}

/// `GET /?_schema` result
#[derive(Debug, Clone, Deserialize)]
pub struct WapiSchemaInfo {
    #[serde(default)]
    pub requested_version: Option<String>,
    #[serde(default)]
    pub supported_versions: Vec<String>,
}

/// One page of a paged search
#[derive(Debug, Deserialize)]
struct SearchPage {
    #[serde(default)]
    result: Vec<Value>,
    #[serde(default)]
    next_page_id: Option<String>,
}

/// Parameters for a WAPI search
#[derive(Debug, Clone, Default)]
pub struct SearchRequest {
    pub params: Vec<(String, String)>,
    pub return_fields: Vec<String>,
    pub page_size: u32,
    /// Stop after the first page
    pub single_page: bool,
    pub max_results: Option<usize>,
}

pub const DEFAULT_PAGE_SIZE: u32 = 1000;

/// NIOS WAPI Client
#[derive(Clone)]
pub struct WapiClient {
    client: reqwest::Client,
    base_url: String,
    authorization: String,
    delete_retry: RetryPolicy,
}

impl std::fmt::Debug for WapiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WapiClient")
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

impl WapiClient {
    /// Create a new client
    pub fn new(config: &ClientConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .danger_accept_invalid_certs(config.insecure)
            .build()?;

        let credentials = STANDARD.encode(format!("{}:{}", config.username, config.password));

        Ok(Self {
            client,
            base_url: config.base_url(),
            authorization: format!("Basic {}", credentials),
            delete_retry: config.delete_retry,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn delete_retry(&self) -> RetryPolicy {
        self.delete_retry
    }

    /// Build headers for requests
    fn headers(&self) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        if let Ok(value) = HeaderValue::from_str(&self.authorization) {
            headers.insert(AUTHORIZATION, value);
        }

        headers
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    fn object_query(return_fields: &[String]) -> Vec<(String, String)> {
        let mut query = vec![("_return_as_object".to_string(), "1".to_string())];
        if !return_fields.is_empty() {
            query.push(("_return_fields+".to_string(), return_fields.join(",")));
        }
        query
    }

    /// Create an object and return it with the requested fields
    pub async fn create(
        &self,
        object_type: &str,
        body: &Value,
        return_fields: &[String],
    ) -> Result<Map<String, Value>> {
        let url = self.url(object_type);
        debug!("POST {} body={}", url, body);

        let response = self
            .client
            .post(&url)
            .headers(self.headers())
            .query(&Self::object_query(return_fields))
            .json(body)
            .send()
            .await?;

        let value = self.handle_response(object_type, response).await?;
        single_object(value)
    }

    /// Fetch a single object by reference
    pub async fn get(&self, reference: &str, return_fields: &[String]) -> Result<Map<String, Value>> {
        let url = self.url(reference);
        debug!("GET {}", url);

        let response = self
            .client
            .get(&url)
            .headers(self.headers())
            .query(&Self::object_query(return_fields))
            .send()
            .await?;

        let value = self.handle_response(reference, response).await?;
        single_object(value)
    }

    /// Update an object by reference
    pub async fn update(
        &self,
        reference: &str,
        body: &Value,
        return_fields: &[String],
    ) -> Result<Map<String, Value>> {
        let url = self.url(reference);
        debug!("PUT {} body={}", url, body);

        let response = self
            .client
            .put(&url)
            .headers(self.headers())
            .query(&Self::object_query(return_fields))
            .json(body)
            .send()
            .await?;

        let value = self.handle_response(reference, response).await?;
        single_object(value)
    }

    /// Delete an object by reference
    pub async fn delete(&self, reference: &str) -> Result<()> {
        let url = self.url(reference);
        debug!("DELETE {}", url);

        let response = self
            .client
            .delete(&url)
            .headers(self.headers())
            .send()
            .await?;

        self.handle_response(reference, response).await.map(|_| ())
    }

    /// Search objects of one type, following `next_page_id`
    pub async fn search(&self, object_type: &str, request: &SearchRequest) -> Result<Vec<Value>> {
        let url = self.url(object_type);
        let page_size = if request.page_size == 0 {
            DEFAULT_PAGE_SIZE
        } else {
            request.page_size
        };

        let mut first_query = request.params.clone();
        first_query.extend(Self::object_query(&request.return_fields));
        first_query.push(("_paging".to_string(), "1".to_string()));
        first_query.push(("_max_results".to_string(), page_size.to_string()));

        let mut results = Vec::new();
        let mut query = first_query;

        loop {
            debug!("GET {} query={:?}", url, query);

            let response = self
                .client
                .get(&url)
                .headers(self.headers())
                .query(&query)
                .send()
                .await?;

            let value = self.handle_response(object_type, response).await?;
            let page: SearchPage = serde_json::from_value(value)?;
            results.extend(page.result);

            if let Some(max) = request.max_results {
                if results.len() >= max {
                    results.truncate(max);
                    break;
                }
            }

            match page.next_page_id {
                Some(page_id) if !request.single_page && !page_id.is_empty() => {
                    query = vec![("_page_id".to_string(), page_id)];
                }
                _ => break,
            }
        }

        Ok(results)
    }

    /// Fetch the WAPI schema summary; used as a connectivity check
    pub async fn schema(&self) -> Result<WapiSchemaInfo> {
        let url = self.url("");
        debug!("GET {}?_schema", url);

        let response = self
            .client
            .get(&url)
            .headers(self.headers())
            .query(&[("_schema", "1")])
            .send()
            .await?;

        let value = self.handle_response("_schema", response).await?;
        Ok(serde_json::from_value(value)?)
    }

    /// Handle API response
    async fn handle_response(&self, target: &str, response: reqwest::Response) -> Result<Value> {
        let status = response.status();

        if status.is_success() {
            let body = response.text().await?;
            if body.trim().is_empty() {
                return Ok(Value::Null);
            }
            return Ok(serde_json::from_str(&body)?);
        }

        let body = response.text().await.unwrap_or_default();
        let parsed: Option<WapiErrorBody> = serde_json::from_str(&body).ok();

        match status.as_u16() {
            401 | 403 => Err(WapiError::AuthFailed(
                parsed.map(|e| e.text).unwrap_or(body),
            )),
            404 => Err(WapiError::NotFound(target.to_string())),
            code => {
                let (code_str, text) = match parsed {
                    Some(e) => {
                        let text = if e.text.is_empty() { e.error } else { e.text };
                        (e.code, text)
                    }
                    None => (String::new(), body),
                };
                Err(WapiError::Api {
                    status: code,
                    code: code_str,
                    text,
                })
            }
        }
    }
}

/// Unwrap `{"result": ...}` and accept a one-element array
fn single_object(value: Value) -> Result<Map<String, Value>> {
    let inner = match value {
        Value::Object(mut map) if map.contains_key("result") => {
            map.remove("result").unwrap_or(Value::Null)
        }
        other => other,
    };

    match inner {
        Value::Object(map) => Ok(map),
        Value::Array(mut items) if items.len() == 1 => match items.remove(0) {
            Value::Object(map) => Ok(map),
            other => Err(WapiError::Decode(format!("expected an object, got {}", other))),
        },
        // POST/PUT without return fields answer with the bare reference
        Value::String(reference) => {
            let mut map = Map::new();
            map.insert("_ref".to_string(), Value::String(reference));
            Ok(map)
        }
        other => Err(WapiError::Decode(format!("expected an object, got {}", other))),
    }
}
