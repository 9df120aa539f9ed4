use anyhow::Result;
use httpmock::prelude::*;
use nuldc::{
    ClientSettings, DcClient, HttpTransport, NuldcError, ResponseFormat, RetryPolicy, WalkOptions,
    WalkStatus,
};
use serde_json::{json, Value};
use std::time::Duration;

fn client(server: &MockServer, max_records: u64) -> DcClient<HttpTransport> {
    let transport = HttpTransport::new(Duration::from_secs(5), RetryPolicy::new(1, Duration::ZERO))
        .expect("client builds");
    DcClient::new(
        transport,
        ClientSettings {
            base_url: server.url("/api/v2"),
            page_size: 2,
            walk: WalkOptions {
                max_records,
                show_progress: false,
            },
        },
    )
}

fn ids(records: &Value) -> Vec<String> {
    records
        .as_array()
        .unwrap()
        .iter()
        .map(|r| r["id"].as_str().unwrap().to_string())
        .collect()
}

#[tokio::test]
async fn test_search_all_concatenates_cursor_pages() -> Result<()> {
    let server = MockServer::start_async().await;

    let first = server
        .mock_async(|when, then| {
            when.method(GET)
                .path("/api/v2/search/works")
                .query_param("query", "architecture")
                .query_param("as", "opensearch")
                .query_param("size", "2")
                .query_param("sort", "id:asc");
            then.status(200).json_body(json!({
                "data": [{"id": "1"}, {"id": "2"}],
                "pagination": {
                    "next_url": server.url("/next/page-2"),
                    "total_hits": 4,
                    "total_pages": 2,
                    "query_url": server.url("/api/v2/search/works?query=architecture")
                },
                "info": {"name": "search"}
            }));
        })
        .await;
    let second = server
        .mock_async(|when, then| {
            when.method(GET).path("/next/page-2");
            then.status(200).json_body(json!({
                "data": [{"id": "3"}, {"id": "4"}],
                "pagination": {"next_url": "", "total_hits": 4, "total_pages": 2}
            }));
        })
        .await;

    let client = client(&server, 100);
    let params = client
        .params(ResponseFormat::Opensearch)
        .with_query("architecture")
        .with_source_filter(&[], &[]);
    let walked = client.search("works", params, true).await?;

    first.assert_async().await;
    second.assert_async().await;
    assert!(walked.is_complete());
    assert_eq!(ids(&walked.value["data"]), vec!["1", "2", "3", "4"]);
    assert_eq!(walked.value["pagination"]["next_url"], json!(""));
    assert_eq!(walked.value["info"]["name"], json!("search"));
    Ok(())
}

#[tokio::test]
async fn test_ceiling_aborts_before_second_request() -> Result<()> {
    let server = MockServer::start_async().await;

    server
        .mock_async(|when, then| {
            when.method(GET).path("/api/v2/search/works");
            then.status(200).json_body(json!({
                "data": [{"id": "1"}],
                "pagination": {"next_url": server.url("/next/page-2"), "total_hits": 11, "total_pages": 11}
            }));
        })
        .await;
    let second = server
        .mock_async(|when, then| {
            when.method(GET).path("/next/page-2");
            then.status(200).json_body(json!({"data": [], "pagination": {"next_url": ""}}));
        })
        .await;

    let client = client(&server, 10);
    let params = client.params(ResponseFormat::Opensearch).with_query("*");
    let err = client.search("works", params, true).await.unwrap_err();

    assert!(matches!(err, NuldcError::CeilingExceeded { total: 11, limit: 10 }));
    assert!(err.user_friendly_message().contains("10"));
    second.assert_hits_async(0).await;
    Ok(())
}

#[tokio::test]
async fn test_failing_page_returns_partial_result() -> Result<()> {
    let server = MockServer::start_async().await;

    server
        .mock_async(|when, then| {
            when.method(GET).path("/api/v2/collections/abc");
            then.status(200).json_body(json!({
                "data": [{"id": "1"}, {"id": "2"}],
                "pagination": {"next_url": server.url("/next/page-2"), "total_hits": 6, "total_pages": 3}
            }));
        })
        .await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/next/page-2");
            then.status(200).json_body(json!({
                "data": [{"id": "3"}, {"id": "4"}],
                "pagination": {"next_url": server.url("/next/page-3"), "total_hits": 6, "total_pages": 3}
            }));
        })
        .await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/next/page-3");
            then.status(502).json_body(json!({"error": "bad gateway"}));
        })
        .await;

    let client = client(&server, 100);
    let walked = client
        .get_collection("abc", client.params(ResponseFormat::Opensearch), true)
        .await?;

    let page_3 = server.url("/next/page-3");
    assert!(matches!(&walked.status, WalkStatus::Truncated { url, .. } if *url == page_3));
    assert_eq!(ids(&walked.value["data"]), vec!["1", "2", "3", "4"]);
    assert_eq!(walked.value["pagination"]["next_url"], json!(page_3));
    Ok(())
}

#[tokio::test]
async fn test_iiif_all_uses_count_request_and_splices_pages() -> Result<()> {
    let server = MockServer::start_async().await;

    let count = server
        .mock_async(|when, then| {
            when.method(GET)
                .path("/api/v2/search/works")
                .query_param("as", "opensearch")
                .query_param("query", "colonialism")
                .query_param("sort", "id:asc");
            then.status(200).json_body(json!({
                "data": [{"id": "1"}, {"id": "2"}],
                "pagination": {"next_url": server.url("/unused"), "total_hits": 3, "total_pages": 2}
            }));
        })
        .await;
    let first = server
        .mock_async(|when, then| {
            when.method(GET)
                .path("/api/v2/search/works")
                .query_param("as", "iiif")
                .query_param("query", "colonialism")
                .query_param("sort", "id:asc");
            then.status(200).json_body(json!({
                "@context": "http://iiif.io/api/presentation/3/context.json",
                "id": server.url("/api/v2/search/works?as=iiif"),
                "type": "Collection",
                "label": {"none": ["Search results"]},
                "items": [
                    {"id": "https://example.org/iiif/result-1.json", "type": "Manifest"},
                    {"id": "https://example.org/iiif/result-2.json", "type": "Manifest"},
                    {"id": server.url("/iiif/page-2"), "type": "Collection", "label": {"none": ["Next page"]}}
                ]
            }));
        })
        .await;
    let second = server
        .mock_async(|when, then| {
            when.method(GET).path("/iiif/page-2");
            then.status(200).json_body(json!({
                "id": server.url("/iiif/page-2"),
                "type": "Collection",
                "items": [{"id": "https://example.org/iiif/result-3.json", "type": "Manifest"}]
            }));
        })
        .await;

    let client = client(&server, 100);
    let params = client.params(ResponseFormat::Iiif).with_query("colonialism");
    let walked = client.search("works", params, true).await?;

    count.assert_async().await;
    first.assert_async().await;
    second.assert_async().await;
    assert!(walked.is_complete());

    let items = walked.value["items"].as_array().unwrap();
    assert_eq!(items.len(), 3);
    assert!(items.iter().all(|item| item["type"] == json!("Manifest")));
    assert_eq!(items[2]["id"], json!("https://example.org/iiif/result-3.json"));
    assert_eq!(walked.value["label"], json!({"none": ["Search results"]}));
    Ok(())
}

#[tokio::test]
async fn test_single_page_is_returned_as_served() -> Result<()> {
    let server = MockServer::start_async().await;
    let body = json!({
        "data": [{"id": "1"}],
        "pagination": {"next_url": server.url("/next/page-2"), "total_hits": 5}
    });

    let page = server
        .mock_async(|when, then| {
            when.method(GET).path("/api/v2/search/works");
            then.status(200).json_body(body.clone());
        })
        .await;

    let client = client(&server, 100);
    let params = client.params(ResponseFormat::Opensearch).with_query("q");
    let walked = client.search("works", params, false).await?;

    page.assert_async().await;
    assert_eq!(walked.value, body);
    Ok(())
}

#[tokio::test]
async fn test_work_error_body_is_returned() -> Result<()> {
    let server = MockServer::start_async().await;

    server
        .mock_async(|when, then| {
            when.method(GET)
                .path("/api/v2/works/missing")
                .query_param("as", "iiif");
            then.status(404).json_body(json!({"status": 404, "error": "Not Found"}));
        })
        .await;

    let client = client(&server, 100);
    let work = client.get_work("missing", ResponseFormat::Iiif).await?;

    assert_eq!(work, json!({"status": 404, "error": "Not Found"}));
    Ok(())
}
