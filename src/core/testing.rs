//! In-memory doubles shared by the unit tests.

use crate::domain::model::ApiResponse;
use crate::domain::ports::{Storage, Transport};
use crate::utils::error::{NuldcError, Result};
use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

#[derive(Clone)]
struct Route {
    url: String,
    param: Option<(String, String)>,
    status: u16,
    body: Value,
}

/// Answers GETs from a fixed route table and records every request.
///
/// Routes can be narrowed to one query parameter value so a IIIF page and its
/// opensearch count request can live at the same URL.
#[derive(Clone, Default)]
pub struct MockTransport {
    routes: Vec<Route>,
    requests: Arc<Mutex<Vec<(String, Vec<(String, String)>)>>>,
    posts: Arc<Mutex<Vec<(String, Value)>>>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn route(self, url: &str, body: Value) -> Self {
        self.status(url, 200, body)
    }

    pub fn route_as(self, url: &str, format: &str, body: Value) -> Self {
        self.route_param(url, "as", format, body)
    }

    /// Matches only requests whose query has `key=value`.
    pub fn route_param(mut self, url: &str, key: &str, value: &str, body: Value) -> Self {
        self.routes.push(Route {
            url: url.to_string(),
            param: Some((key.to_string(), value.to_string())),
            status: 200,
            body,
        });
        self
    }

    pub fn status(mut self, url: &str, status: u16, body: Value) -> Self {
        self.routes.push(Route {
            url: url.to_string(),
            param: None,
            status,
            body,
        });
        self
    }

    /// URLs requested with GET, in order.
    pub fn requested(&self) -> Vec<String> {
        self.requests
            .lock()
            .map(|r| r.iter().map(|(url, _)| url.clone()).collect())
            .unwrap_or_default()
    }

    pub fn queries(&self) -> Vec<HashMap<String, Vec<String>>> {
        self.requests
            .lock()
            .map(|r| {
                r.iter()
                    .map(|(_, query)| {
                        let mut params: HashMap<String, Vec<String>> = HashMap::new();
                        for (k, v) in query {
                            params.entry(k.clone()).or_default().push(v.clone());
                        }
                        params
                    })
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn posted(&self) -> Vec<(String, Value)> {
        self.posts.lock().map(|p| p.clone()).unwrap_or_default()
    }

    fn find(&self, url: &str, query: &[(String, String)]) -> Option<&Route> {
        self.routes.iter().find(|route| {
            route.url == url
                && match &route.param {
                    Some((key, value)) => query.iter().any(|(k, v)| k == key && v == value),
                    None => true,
                }
        })
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn get(&self, url: &str, query: &[(String, String)]) -> Result<ApiResponse> {
        if let Ok(mut requests) = self.requests.lock() {
            requests.push((url.to_string(), query.to_vec()));
        }

        match self.find(url, query) {
            Some(route) => Ok(ApiResponse {
                url: url.to_string(),
                status: route.status,
                body: route.body.clone(),
            }),
            None => Err(NuldcError::HttpStatusError {
                url: url.to_string(),
                status: 404,
            }),
        }
    }

    async fn post_json(&self, url: &str, body: &Value) -> Result<ApiResponse> {
        if let Ok(mut posts) = self.posts.lock() {
            posts.push((url.to_string(), body.clone()));
        }
        self.get(url, &[]).await
    }
}

#[derive(Clone, Default)]
pub struct MockStorage {
    files: Arc<Mutex<HashMap<String, Vec<u8>>>>,
}

impl MockStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_file(self, path: &str, data: &[u8]) -> Self {
        if let Ok(mut files) = self.files.lock() {
            files.insert(path.to_string(), data.to_vec());
        }
        self
    }

    pub fn get_file(&self, path: &str) -> Option<Vec<u8>> {
        self.files.lock().ok().and_then(|files| files.get(path).cloned())
    }

    pub fn get_text(&self, path: &str) -> Option<String> {
        self.get_file(path).map(|data| String::from_utf8_lossy(&data).into_owned())
    }
}

impl Storage for MockStorage {
    async fn read_file(&self, path: &str) -> Result<Vec<u8>> {
        self.get_file(path).ok_or_else(|| {
            NuldcError::IoError(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("File not found: {}", path),
            ))
        })
    }

    async fn write_file(&self, path: &str, data: &[u8]) -> Result<()> {
        if let Ok(mut files) = self.files.lock() {
            files.insert(path.to_string(), data.to_vec());
        }
        Ok(())
    }
}
