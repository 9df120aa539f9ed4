//! Walks IIIF collection pages, where the next page is a trailing `Collection`
//! item inside `items`.

use crate::core::progress::PageProgress;
use crate::core::walk::{check_ceiling, fetch_page, log_page_failure, WalkOptions, WalkStatus, Walked};
use crate::domain::model::{Manifest, ManifestItem, PageTotals};
use crate::domain::ports::Transport;
use crate::utils::error::Result;

/// Splits one page's items into its leaf items and the id of the next page.
///
/// Only a trailing `Collection` item counts as the pointer to the next page.
/// Continuation items found anywhere else are dropped from the leaves.
pub fn split_page(items: Vec<ManifestItem>) -> (Vec<ManifestItem>, Option<String>) {
    let next = items
        .last()
        .filter(|item| item.is_continuation())
        .map(|item| item.id.clone())
        .filter(|id| !id.is_empty());

    let total = items.len();
    let leaves: Vec<ManifestItem> = items.into_iter().filter(|item| !item.is_continuation()).collect();

    let stray = total - leaves.len() - usize::from(next.is_some());
    if stray > 0 {
        tracing::warn!("⚠️ Ignoring {} Collection items that are not a trailing next-page pointer", stray);
    }

    (leaves, next)
}

/// Follows next-page pointers from `first`, collecting every leaf item.
///
/// IIIF pages carry no totals, so `totals` must come from an equivalent count
/// request. The ceiling is checked against them before any page is fetched.
/// A page that cannot be fetched or decoded ends the walk with the items
/// gathered so far.
pub async fn walk_tree<T>(
    transport: &T,
    first: Manifest,
    totals: PageTotals,
    options: &WalkOptions,
) -> Result<Walked<Manifest>>
where
    T: Transport + ?Sized,
{
    let identifier = if first.id.is_empty() {
        "IIIF collection".to_string()
    } else {
        first.id.clone()
    };

    check_ceiling(totals.total_hits, options.max_records, &identifier)?;
    if totals.total_pages.is_none() {
        tracing::warn!(
            "⚠️ No total_pages for {}; progress will be indeterminate",
            identifier
        );
    }

    let mut progress = PageProgress::new(totals.total_pages, options.show_progress);
    progress.advance();

    let Manifest { id, items, extra } = first;
    let (mut leaves, mut next) = split_page(items);
    let mut status = WalkStatus::Complete;

    while let Some(url) = next.take() {
        tracing::debug!("📡 Fetching IIIF page {}: {}", progress.pages() + 1, url);

        let page: Manifest = match fetch_page(transport, &url).await {
            Ok(page) => page,
            Err(e) => {
                log_page_failure(&url, &e, leaves.len());
                status = WalkStatus::Truncated {
                    url,
                    reason: e.to_string(),
                };
                break;
            }
        };

        let (page_leaves, following) = split_page(page.items);
        tracing::debug!("📥 Appended {} items ({} total)", page_leaves.len(), leaves.len() + page_leaves.len());
        leaves.extend(page_leaves);

        progress.advance();
        next = following;
    }

    progress.finish();

    match &status {
        WalkStatus::Complete => tracing::info!("📊 Collected {} IIIF items", leaves.len()),
        WalkStatus::Truncated { url, .. } => tracing::warn!(
            "⚠️ IIIF result is partial: {} items, stopped at {}",
            leaves.len(),
            url
        ),
    }

    Ok(Walked {
        value: Manifest {
            id,
            items: leaves,
            extra,
        },
        status,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::testing::MockTransport;
    use crate::utils::error::NuldcError;
    use serde_json::{json, Value};

    const PAGE_2: &str = "https://example.org/iiif/paged-2.json";
    const PAGE_3: &str = "https://example.org/iiif/paged-3.json";

    fn page(id: &str, results: &[&str], next: Option<&str>) -> Value {
        let mut items: Vec<Value> = results
            .iter()
            .map(|r| {
                json!({
                    "id": format!("https://example.org/iiif/{}.json", r),
                    "type": "Manifest",
                    "label": {"none": [r]}
                })
            })
            .collect();
        if let Some(next) = next {
            items.push(json!({"id": next, "type": "Collection", "label": {"none": ["next"]}}));
        }
        json!({
            "@context": "http://iiif.io/api/presentation/3/context.json",
            "id": id,
            "type": "Collection",
            "items": items
        })
    }

    fn totals(hits: u64) -> PageTotals {
        PageTotals {
            total_pages: Some(2),
            total_hits: Some(hits),
        }
    }

    fn options() -> WalkOptions {
        WalkOptions {
            max_records: 100,
            show_progress: false,
        }
    }

    #[tokio::test]
    async fn test_walk_tree_splices_leaf_items_and_drops_pointers() {
        let transport = MockTransport::new().route(PAGE_2, page(PAGE_2, &["result-3", "result-4"], None));
        let first: Manifest =
            serde_json::from_value(page("paged-1", &["result-1", "result-2"], Some(PAGE_2))).unwrap();

        let walked = walk_tree(&transport, first, totals(4), &options()).await.unwrap();

        assert!(walked.is_complete());
        let ids: Vec<&str> = walked.value.items.iter().map(|i| i.id.as_str()).collect();
        assert_eq!(
            ids,
            vec![
                "https://example.org/iiif/result-1.json",
                "https://example.org/iiif/result-2.json",
                "https://example.org/iiif/result-3.json",
                "https://example.org/iiif/result-4.json",
            ]
        );
        assert!(walked.value.items.iter().all(|i| !i.is_continuation()));
        assert_eq!(walked.value.id, "paged-1");
        assert!(walked.value.extra.contains_key("@context"));
    }

    #[tokio::test]
    async fn test_walk_tree_follows_multiple_pages() {
        let transport = MockTransport::new()
            .route(PAGE_2, page(PAGE_2, &["b"], Some(PAGE_3)))
            .route(PAGE_3, page(PAGE_3, &["c"], None));
        let first: Manifest = serde_json::from_value(page("p1", &["a"], Some(PAGE_2))).unwrap();

        let walked = walk_tree(&transport, first, totals(3), &options()).await.unwrap();
        assert_eq!(walked.value.items.len(), 3);
        assert_eq!(transport.requested(), vec![PAGE_2, PAGE_3]);
    }

    #[tokio::test]
    async fn test_walk_tree_ceiling_aborts_before_any_request() {
        let transport = MockTransport::new().route(PAGE_2, page(PAGE_2, &["b"], None));
        let first: Manifest = serde_json::from_value(page("p1", &["a"], Some(PAGE_2))).unwrap();

        let err = walk_tree(&transport, first, totals(101), &options()).await.unwrap_err();
        assert!(matches!(err, NuldcError::CeilingExceeded { total: 101, limit: 100 }));
        assert!(transport.requested().is_empty());
    }

    #[tokio::test]
    async fn test_walk_tree_returns_prefix_on_failure() {
        let transport = MockTransport::new()
            .route(PAGE_2, page(PAGE_2, &["b"], Some(PAGE_3)))
            .status(PAGE_3, 503, json!({"error": "unavailable"}));
        let first: Manifest = serde_json::from_value(page("p1", &["a"], Some(PAGE_2))).unwrap();

        let walked = walk_tree(&transport, first, totals(3), &options()).await.unwrap();

        assert!(matches!(&walked.status, WalkStatus::Truncated { url, .. } if url == PAGE_3));
        assert_eq!(walked.value.items.len(), 2);
        assert!(walked.value.items.iter().all(|i| !i.is_continuation()));
    }

    #[tokio::test]
    async fn test_walk_tree_single_page() {
        let transport = MockTransport::new();
        let first: Manifest = serde_json::from_value(page("p1", &["a", "b"], None)).unwrap();

        let walked = walk_tree(&transport, first, PageTotals::default(), &options()).await.unwrap();
        assert!(walked.is_complete());
        assert_eq!(walked.value.items.len(), 2);
        assert!(transport.requested().is_empty());
    }

    #[test]
    fn test_split_page_only_trailing_collection_is_a_pointer() {
        let items: Vec<ManifestItem> = serde_json::from_value(json!([
            {"id": "stray", "type": "Collection"},
            {"id": "m1", "type": "Manifest"},
            {"id": "next", "type": "Collection"}
        ]))
        .unwrap();

        let (leaves, next) = split_page(items);
        assert_eq!(next.as_deref(), Some("next"));
        assert_eq!(leaves.len(), 1);
        assert_eq!(leaves[0].id, "m1");

        let (leaves, next) = split_page(Vec::new());
        assert!(leaves.is_empty());
        assert!(next.is_none());
    }
}
