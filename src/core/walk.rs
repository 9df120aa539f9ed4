use crate::domain::ports::Transport;
use crate::utils::error::{NuldcError, Result};
use serde::de::DeserializeOwned;
use serde_json::Value;

/// Default client-side ceiling: the API cannot return more than this many
/// records for one logical request.
pub const DEFAULT_MAX_RECORDS: u64 = 100_000;

#[derive(Debug, Clone, Copy)]
pub struct WalkOptions {
    pub max_records: u64,
    pub show_progress: bool,
}

impl Default for WalkOptions {
    fn default() -> Self {
        Self {
            max_records: DEFAULT_MAX_RECORDS,
            show_progress: true,
        }
    }
}

/// How a walk ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WalkStatus {
    /// Every page was fetched.
    Complete,
    /// Fetching `url` failed; the value holds the pages before it.
    Truncated { url: String, reason: String },
}

/// Result of a pagination walk plus how it ended.
#[derive(Debug, Clone)]
pub struct Walked<T> {
    pub value: T,
    pub status: WalkStatus,
}

impl<T> Walked<T> {
    pub fn is_complete(&self) -> bool {
        self.status == WalkStatus::Complete
    }
}

/// Fails with `CeilingExceeded` when the declared total is above `limit`.
///
/// A missing total is logged and counted as zero so paging can go ahead.
pub(crate) fn check_ceiling(total_hits: Option<u64>, limit: u64, identifier: &str) -> Result<()> {
    let total = total_hits.unwrap_or_else(|| {
        tracing::warn!(
            "⚠️ Response for {} has no total_hits; cannot enforce the {} record limit up front",
            identifier,
            limit
        );
        0
    });

    if total > limit {
        tracing::error!(
            "❌ {} matched {} records, above the {} record limit",
            identifier,
            total,
            limit
        );
        return Err(NuldcError::CeilingExceeded { total, limit });
    }
    Ok(())
}

/// GETs one continuation page and decodes it.
pub(crate) async fn fetch_page<T, P>(transport: &T, url: &str) -> Result<P>
where
    T: Transport + ?Sized,
    P: DeserializeOwned,
{
    let response = transport.get(url, &[]).await?;
    if !response.is_success() {
        return Err(NuldcError::HttpStatusError {
            url: url.to_string(),
            status: response.status,
        });
    }
    decode(url, response.body)
}

pub(crate) fn decode<P: DeserializeOwned>(url: &str, body: Value) -> Result<P> {
    serde_json::from_value(body).map_err(|e| NuldcError::decode(url, e))
}

/// Short label telling network and decode problems apart in walk logs.
pub(crate) fn failure_kind(error: &NuldcError) -> &'static str {
    if error.is_decode() {
        "Decode error"
    } else if error.is_transport() {
        "Network error"
    } else {
        "Error"
    }
}

pub(crate) fn log_page_failure(url: &str, error: &NuldcError, kept: usize) {
    tracing::error!(
        "❌ {} on page {}: {}. Stopping with the {} records fetched so far",
        failure_kind(error),
        url,
        error,
        kept
    );
}
