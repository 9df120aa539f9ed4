//! Incremental dump of the whole catalog, one set of files per collection.
//!
//! A marker file holds the date of the last complete run. When it exists only
//! collections with works indexed since that date are dumped again.

use crate::core::client::DcClient;
use crate::core::flatten::{flatten, records_of};
use crate::core::walk::WalkStatus;
use crate::domain::model::{OutputFormat, ResponseFormat};
use crate::domain::ports::{Storage, Transport};
use crate::export::{to_csv_bytes, to_xml_bytes};
use crate::utils::error::{NuldcError, Result};
use chrono::NaiveDate;
use serde_json::Value;
use std::io::ErrorKind;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;

pub const COLLECTION_FIELD: &str = "collection.id";

#[derive(Debug, Clone)]
pub struct DumpSettings {
    pub workers: usize,
    pub marker_file: String,
    pub aggregation_size: u32,
}

impl Default for DumpSettings {
    fn default() -> Self {
        Self {
            workers: 10,
            marker_file: "_updated_at.txt".to_string(),
            aggregation_size: 1000,
        }
    }
}

/// How one collection's dump ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CollectionOutcome {
    Saved { basename: String, records: usize },
    /// Files were written, but paging stopped early at `stopped_at`.
    Partial {
        basename: String,
        records: usize,
        stopped_at: String,
    },
    /// The collection search returned no records; nothing was written.
    Empty,
}

#[derive(Debug, Clone, Default)]
pub struct DumpSummary {
    pub query: String,
    pub saved: Vec<String>,
    pub partial: Vec<String>,
    pub empty: Vec<String>,
    pub failed: Vec<(String, String)>,
    pub marker_updated: bool,
}

impl DumpSummary {
    pub fn is_complete(&self) -> bool {
        self.partial.is_empty() && self.failed.is_empty()
    }
}

pub struct CatalogDump<T: Transport, S: Storage> {
    client: DcClient<T>,
    storage: S,
    settings: DumpSettings,
}

impl<T: Transport, S: Storage + Clone> Clone for CatalogDump<T, S> {
    fn clone(&self) -> Self {
        Self {
            client: self.client.clone(),
            storage: self.storage.clone(),
            settings: self.settings.clone(),
        }
    }
}

impl<T, S> CatalogDump<T, S>
where
    T: Transport + 'static,
    S: Storage + Clone + 'static,
{
    pub fn new(client: DcClient<T>, storage: S, settings: DumpSettings) -> Self {
        Self {
            client,
            storage,
            settings,
        }
    }

    /// Dumps every collection touched since the marker date, then moves the
    /// marker to `today` if nothing failed.
    pub async fn run(&self, today: NaiveDate) -> Result<DumpSummary> {
        let query = self.marker_query().await?;
        let ids = self
            .client
            .bucket_keys(&query, COLLECTION_FIELD, self.settings.aggregation_size)
            .await?;
        tracing::info!("📚 {} collections to dump for {}", ids.len(), query);

        let mut summary = DumpSummary {
            query,
            ..DumpSummary::default()
        };

        let semaphore = Arc::new(Semaphore::new(self.settings.workers.max(1)));
        let mut tasks = JoinSet::new();

        for id in ids {
            let permit = semaphore
                .clone()
                .acquire_owned()
                .await
                .map_err(|e| NuldcError::ProcessingError {
                    message: format!("Worker pool closed: {}", e),
                })?;
            let dump = self.clone();

            tasks.spawn(async move {
                let _permit = permit;
                let outcome = dump.dump_collection(&id).await;
                (id, outcome)
            });
        }

        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((id, Ok(CollectionOutcome::Saved { basename, records }))) => {
                    tracing::info!("💾 Saved {} ({} records)", basename, records);
                    summary.saved.push(id);
                }
                Ok((id, Ok(CollectionOutcome::Partial { basename, records, stopped_at }))) => {
                    tracing::warn!(
                        "⚠️ Saved partial {} ({} records, stopped at {})",
                        basename,
                        records,
                        stopped_at
                    );
                    summary.partial.push(id);
                }
                Ok((id, Ok(CollectionOutcome::Empty))) => {
                    tracing::warn!("⚠️ Collection {} returned no records", id);
                    summary.empty.push(id);
                }
                Ok((id, Err(e))) => {
                    tracing::error!("❌ Collection {} failed: {}", id, e);
                    summary.failed.push((id, e.to_string()));
                }
                Err(e) => {
                    tracing::error!("❌ Dump worker stopped unexpectedly: {}", e);
                    summary.failed.push(("<unknown>".to_string(), e.to_string()));
                }
            }
        }

        if summary.is_complete() {
            let stamp = today.format("%Y-%m-%d").to_string();
            self.storage
                .write_file(&self.settings.marker_file, stamp.as_bytes())
                .await?;
            summary.marker_updated = true;
            tracing::info!("📅 Marker moved to {}", stamp);
        } else {
            tracing::warn!(
                "⚠️ {} collections failed and {} are partial; marker left unchanged",
                summary.failed.len(),
                summary.partial.len()
            );
        }

        Ok(summary)
    }

    /// `indexed_at:>=<date>` from the marker file, or `*` when there is none.
    /// Any other read failure is returned rather than triggering a full rebuild.
    pub async fn marker_query(&self) -> Result<String> {
        match self.storage.read_file(&self.settings.marker_file).await {
            Ok(bytes) => {
                let query = since_query(Some(&String::from_utf8_lossy(&bytes)));
                tracing::info!("🔎 Looking for collections with works updated since {}", query);
                Ok(query)
            }
            Err(NuldcError::IoError(e)) if e.kind() == ErrorKind::NotFound => {
                tracing::info!("🆕 No {} found, rebuilding all collections", self.settings.marker_file);
                Ok(since_query(None))
            }
            Err(e) => {
                tracing::error!("❌ Cannot read {}: {}", self.settings.marker_file, e);
                Err(e)
            }
        }
    }

    /// Fetches every work in `collection_id` and writes its json, xml and csv files.
    pub async fn dump_collection(&self, collection_id: &str) -> Result<CollectionOutcome> {
        let params = self
            .client
            .params(ResponseFormat::Opensearch)
            .with_query(format!("{}:{}", COLLECTION_FIELD, collection_id));
        let walked = self.client.search("works", params, true).await?;

        let records = records_of(&walked.value).unwrap_or_default();
        if records.is_empty() {
            return match walked.status {
                WalkStatus::Complete => Ok(CollectionOutcome::Empty),
                WalkStatus::Truncated { url, reason } => Err(NuldcError::ProcessingError {
                    message: format!("no records fetched, stopped at {}: {}", url, reason),
                }),
            };
        }

        let title = records[0]
            .pointer("/collection/title")
            .and_then(Value::as_str)
            .unwrap_or("untitled");
        let basename = collection_basename(title, collection_id);

        self.save(OutputFormat::Json, &basename, &serde_json::to_vec(&records)?)
            .await?;
        self.save(OutputFormat::Xml, &basename, &to_xml_bytes(&walked.value)?)
            .await?;
        self.save(OutputFormat::Csv, &basename, &to_csv_bytes(&flatten(&records, None))?)
            .await?;

        let count = records.len();
        Ok(match walked.status {
            WalkStatus::Complete => CollectionOutcome::Saved {
                basename,
                records: count,
            },
            WalkStatus::Truncated { url, .. } => CollectionOutcome::Partial {
                basename,
                records: count,
                stopped_at: url,
            },
        })
    }

    async fn save(&self, format: OutputFormat, basename: &str, bytes: &[u8]) -> Result<()> {
        let ext = format.extension();
        let path = format!("{}/{}.{}", ext, basename, ext);
        self.storage.write_file(&path, bytes).await
    }
}

pub fn since_query(marker: Option<&str>) -> String {
    match marker.and_then(|m| m.lines().next()).map(str::trim) {
        Some(date) if !date.is_empty() => format!("indexed_at:>={}", date),
        _ => "*".to_string(),
    }
}

/// `<slug>-<id>`, or just the id when the title slugifies to nothing.
pub fn collection_basename(title: &str, collection_id: &str) -> String {
    let slug = slugify(title);
    if slug.is_empty() {
        collection_id.to_string()
    } else {
        format!("{}-{}", slug, collection_id)
    }
}

/// Lowercases, drops anything but word characters, whitespace and `-`, then
/// joins the words with single dashes.
pub fn slugify(s: &str) -> String {
    let lowered = s.to_lowercase();
    let kept = lowered
        .trim()
        .chars()
        .filter(|c| c.is_alphanumeric() || c.is_whitespace() || *c == '_' || *c == '-');

    let mut slug = String::with_capacity(s.len());
    let mut pending_dash = false;
    for c in kept {
        if c.is_whitespace() || c == '_' || c == '-' {
            pending_dash = true;
            continue;
        }
        if pending_dash && !slug.is_empty() {
            slug.push('-');
        }
        pending_dash = false;
        slug.push(c);
    }
    slug
}
