//! Walks the `pagination.next_url` chain of flat search responses.

use crate::core::progress::PageProgress;
use crate::core::walk::{check_ceiling, fetch_page, log_page_failure, WalkOptions, WalkStatus, Walked};
use crate::domain::model::ResultSet;
use crate::domain::ports::Transport;
use crate::utils::error::Result;

/// Follows `next_url` from `first` until the chain ends, appending every page's
/// records to whichever slot (`data` or `hits.hits`) the first page used.
///
/// The ceiling is checked once, against the first page's `total_hits`, before
/// any further request. A failing page ends the walk early: the pages before it
/// are returned and `pagination.next_url` keeps the failing URL. On a full walk
/// `pagination.next_url` is set to `""`.
pub async fn walk_cursor<T>(
    transport: &T,
    first: ResultSet,
    options: &WalkOptions,
) -> Result<Walked<ResultSet>>
where
    T: Transport + ?Sized,
{
    let identifier = first
        .pagination
        .as_ref()
        .and_then(|p| p.query_url())
        .unwrap_or("search results")
        .to_string();

    check_ceiling(first.total_hits(), options.max_records, &identifier)?;

    let mut next = first.next_url().map(str::to_string);
    if next.is_some() && first.total_pages().is_none() {
        tracing::warn!(
            "⚠️ Response for {} has no total_pages; progress will be indeterminate",
            identifier
        );
    }

    let mut progress = PageProgress::new(first.total_pages(), options.show_progress);
    progress.advance();

    let mut aggregate = first;
    let mut status = WalkStatus::Complete;

    if aggregate.slot().is_none() {
        if let Some(url) = next.take() {
            tracing::error!(
                "❌ Response for {} has neither data nor hits; not following {}",
                identifier,
                url
            );
            status = WalkStatus::Truncated {
                url,
                reason: "first page carries no records slot".to_string(),
            };
        }
    }

    while let Some(url) = next.take() {
        tracing::debug!("📡 Fetching page {}: {}", progress.pages() + 1, url);

        let page: ResultSet = match fetch_page(transport, &url).await {
            Ok(page) => page,
            Err(e) => {
                log_page_failure(&url, &e, aggregate.len());
                status = WalkStatus::Truncated {
                    url,
                    reason: e.to_string(),
                };
                break;
            }
        };

        let following = page.next_url().map(str::to_string);
        match aggregate.append_page(page) {
            Some(count) => {
                tracing::debug!("📥 Appended {} records ({} total)", count, aggregate.len())
            }
            None => {
                tracing::error!(
                    "❌ Decode error on page {}: records are not in the same slot as the first page. Stopping with the {} records fetched so far",
                    url,
                    aggregate.len()
                );
                status = WalkStatus::Truncated {
                    url,
                    reason: "page records are not in the expected slot".to_string(),
                };
                break;
            }
        }

        progress.advance();
        next = following;
    }

    progress.finish();

    match &status {
        WalkStatus::Complete => {
            aggregate.set_next_url("");
            tracing::info!("📊 Collected {} records", aggregate.len());
        }
        WalkStatus::Truncated { url, .. } => {
            aggregate.set_next_url(url.clone());
            tracing::warn!(
                "⚠️ Result is partial: {} records, stopped at {}",
                aggregate.len(),
                url
            );
        }
    }

    Ok(Walked {
        value: aggregate,
        status,
    })
}
