//! Picks the right walker for a request.

use crate::core::cursor::walk_cursor;
use crate::core::params::SearchParams;
use crate::core::tree::walk_tree;
use crate::core::walk::{decode, WalkOptions, WalkStatus, Walked};
use crate::domain::model::{Manifest, PageTotals, ResponseFormat, ResultSet};
use crate::domain::ports::Transport;
use crate::utils::error::{NuldcError, Result};
use serde_json::Value;

pub struct PaginationDriver<'a, T: Transport + ?Sized> {
    transport: &'a T,
    options: WalkOptions,
}

impl<'a, T: Transport + ?Sized> PaginationDriver<'a, T> {
    pub fn new(transport: &'a T, options: WalkOptions) -> Self {
        Self { transport, options }
    }

    /// GETs `url` with `params`. With `all` unset the first page comes back
    /// as-is whatever its format; with `all` set every page is fetched and
    /// merged.
    ///
    /// IIIF pages carry no totals, so aggregating them costs one extra
    /// request: the same query in opensearch format, read only for
    /// `total_pages` and `total_hits`.
    pub async fn fetch(&self, url: &str, params: &SearchParams, all: bool) -> Result<Walked<Value>> {
        if !all {
            return self.first_page(url, params).await;
        }

        match params.format {
            ResponseFormat::Opensearch => self.fetch_all_flat(url, params).await,
            ResponseFormat::Iiif => self.fetch_all_tree(url, params).await,
        }
    }

    async fn first_page(&self, url: &str, params: &SearchParams) -> Result<Walked<Value>> {
        let response = self.transport.get(url, &params.to_query()).await?;
        if !response.is_success() {
            tracing::warn!("⚠️ {} answered HTTP {}", url, response.status);
        }
        Ok(Walked {
            value: response.body,
            status: WalkStatus::Complete,
        })
    }

    async fn fetch_all_flat(&self, url: &str, params: &SearchParams) -> Result<Walked<Value>> {
        let response = self.transport.get(url, &params.to_query()).await?;
        if !response.is_success() {
            return Ok(error_page(url, response.status, response.body));
        }

        let first: ResultSet = decode(url, response.body)?;
        let walked = walk_cursor(self.transport, first, &self.options).await?;
        Ok(Walked {
            value: serde_json::to_value(&walked.value)?,
            status: walked.status,
        })
    }

    async fn fetch_all_tree(&self, url: &str, params: &SearchParams) -> Result<Walked<Value>> {
        let totals = self.count(url, params).await;
        if let Some(total) = totals.total_hits {
            if total > self.options.max_records {
                return Err(NuldcError::CeilingExceeded {
                    total,
                    limit: self.options.max_records,
                });
            }
        }

        let response = self.transport.get(url, &params.to_query()).await?;
        if !response.is_success() {
            return Ok(error_page(url, response.status, response.body));
        }

        let first: Manifest = decode(url, response.body)?;
        let walked = walk_tree(self.transport, first, totals, &self.options).await?;
        Ok(Walked {
            value: serde_json::to_value(&walked.value)?,
            status: walked.status,
        })
    }

    /// Totals for `params` read from an opensearch-format copy of the request.
    /// Any failure degrades to unknown totals.
    async fn count(&self, url: &str, params: &SearchParams) -> PageTotals {
        let count_params = params.with_format(ResponseFormat::Opensearch);
        tracing::debug!("🔢 Counting results for {} before the IIIF walk", url);

        let response = match self.transport.get(url, &count_params.to_query()).await {
            Ok(response) if response.is_success() => response,
            Ok(response) => {
                tracing::warn!("⚠️ Count request to {} answered HTTP {}", url, response.status);
                return PageTotals::default();
            }
            Err(e) => {
                tracing::warn!("⚠️ Count request to {} failed: {}", url, e);
                return PageTotals::default();
            }
        };

        match decode::<ResultSet>(url, response.body) {
            Ok(page) => PageTotals::from(&page),
            Err(e) => {
                tracing::warn!("⚠️ Could not read totals from count response: {}", e);
                PageTotals::default()
            }
        }
    }
}

fn error_page(url: &str, status: u16, body: Value) -> Walked<Value> {
    tracing::error!("❌ {} answered HTTP {}; nothing to page through", url, status);
    Walked {
        value: body,
        status: WalkStatus::Truncated {
            url: url.to_string(),
            reason: format!("HTTP {}", status),
        },
    }
}
