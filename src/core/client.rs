//! Endpoint-level access to the digital collections API.

use crate::core::driver::PaginationDriver;
use crate::core::params::SearchParams;
use crate::core::walk::{WalkOptions, Walked};
use crate::domain::model::ResponseFormat;
use crate::domain::ports::Transport;
use crate::utils::error::{NuldcError, Result};
use serde_json::{json, Map, Value};
use std::sync::Arc;

pub const DEFAULT_BASE_URL: &str = "https://api.dc.library.northwestern.edu/api/v2";

#[derive(Debug, Clone)]
pub struct ClientSettings {
    pub base_url: String,
    pub page_size: u32,
    pub walk: WalkOptions,
}

impl Default for ClientSettings {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            page_size: 200,
            walk: WalkOptions::default(),
        }
    }
}

pub struct DcClient<T: Transport> {
    transport: Arc<T>,
    settings: ClientSettings,
}

impl<T: Transport> Clone for DcClient<T> {
    fn clone(&self) -> Self {
        Self {
            transport: Arc::clone(&self.transport),
            settings: self.settings.clone(),
        }
    }
}

impl<T: Transport> DcClient<T> {
    pub fn new(transport: T, settings: ClientSettings) -> Self {
        Self {
            transport: Arc::new(transport),
            settings,
        }
    }

    pub fn settings(&self) -> &ClientSettings {
        &self.settings
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Parameters sized to the configured page size.
    pub fn params(&self, format: ResponseFormat) -> SearchParams {
        SearchParams::new(format, self.settings.page_size)
    }

    pub fn endpoint(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.settings.base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }

    /// Single work. Error bodies from the API are returned as they are.
    pub async fn get_work(&self, id: &str, format: ResponseFormat) -> Result<Value> {
        let url = self.endpoint(&format!("works/{}", id));
        let query = vec![("as".to_string(), format.as_str().to_string())];
        let response = self.transport.get(&url, &query).await?;
        if !response.is_success() {
            tracing::warn!("⚠️ Work {} answered HTTP {}", id, response.status);
        }
        Ok(response.body)
    }

    /// Works in a collection. With `all` set every page is fetched in id order.
    pub async fn get_collection(&self, id: &str, params: SearchParams, all: bool) -> Result<Walked<Value>> {
        let url = self.endpoint(&format!("collections/{}", id));
        let params = if all { params.sorted_by_id() } else { params };
        tracing::info!("📚 Fetching collection {} as {}", id, params.format);
        self.driver().fetch(&url, &params, all).await
    }

    /// Search over one model (`works`, `collections`, `file-sets`).
    pub async fn search(&self, model: &str, params: SearchParams, all: bool) -> Result<Walked<Value>> {
        let url = self.endpoint(&format!("search/{}", model));
        let params = if all { params.sorted_by_id() } else { params };
        tracing::info!(
            "🔎 Searching {} for {:?} as {}",
            model,
            params.query.as_deref().unwrap_or("*"),
            params.format
        );
        self.driver().fetch(&url, &params, all).await
    }

    /// Terms aggregation over `field` for every record matching `query`.
    pub async fn aggregate_by(&self, query: &str, field: &str, size: u32) -> Result<Value> {
        let url = self.endpoint("search");
        let mut aggs = Map::new();
        aggs.insert(
            field.to_string(),
            json!({"terms": {"field": field, "size": size}}),
        );
        let body = json!({
            "size": 0,
            "query": {"query_string": {"query": query}},
            "aggs": aggs,
        });

        tracing::debug!("📊 Aggregating {} over {:?}", field, query);
        let response = self.transport.post_json(&url, &body).await?;
        if !response.is_success() {
            return Err(NuldcError::HttpStatusError {
                url,
                status: response.status,
            });
        }
        Ok(response.body)
    }

    /// Bucket keys of a terms aggregation over `field`.
    pub async fn bucket_keys(&self, query: &str, field: &str, size: u32) -> Result<Vec<String>> {
        let body = self.aggregate_by(query, field, size).await?;
        let buckets = body
            .pointer(&format!("/aggregations/{}/buckets", field.replace('/', "~1")))
            .and_then(Value::as_array)
            .ok_or_else(|| NuldcError::ProcessingError {
                message: format!("aggregation response has no buckets for {}", field),
            })?;

        Ok(buckets
            .iter()
            .filter_map(|bucket| match bucket.get("key") {
                Some(Value::String(key)) => Some(key.clone()),
                Some(Value::Number(key)) => Some(key.to_string()),
                _ => None,
            })
            .collect())
    }

    fn driver(&self) -> PaginationDriver<'_, T> {
        PaginationDriver::new(self.transport.as_ref(), self.settings.walk)
    }
}
