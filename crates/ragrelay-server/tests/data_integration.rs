//! Vector store ingest integration tests.

mod common;

use anyhow::Result;
use ragrelay_llm::MockBackend;
use serde_json::json;

#[tokio::test]
async fn test_add_data_stores_documents() -> Result<()> {
    let server = common::TestServer::start().await?;

    let resp = server
        .post("/addData", json!({ "dataList": ["one", "two", "three"] }))
        .send()
        .await?;

    assert_eq!(resp.status().as_u16(), 200);
    let body: serde_json::Value = resp.json().await?;
    assert_eq!(body, json!({ "data": "ok", "code": 200 }));

    assert_eq!(server.store.document_count("rag"), Some(3));
    let prompts: Vec<String> = server
        .backend
        .embed_requests()
        .into_iter()
        .map(|r| r.prompt)
        .collect();
    assert_eq!(prompts, vec!["one", "two", "three"]);

    Ok(())
}

#[tokio::test]
async fn test_add_data_empty_list_rejected() -> Result<()> {
    let server = common::TestServer::start().await?;

    let resp = server
        .post("/addData", json!({ "dataList": [] }))
        .send()
        .await?;

    assert_eq!(resp.status().as_u16(), 400);
    assert!(server.backend.embed_requests().is_empty());

    Ok(())
}

#[tokio::test]
async fn test_add_data_embedding_failure_stores_nothing() -> Result<()> {
    let backend = MockBackend::new(vec![]).with_embed_failure("embedder offline");
    let server = common::TestServer::start_with_backend(backend).await?;

    let resp = server
        .post("/addData", json!({ "dataList": ["one"] }))
        .send()
        .await?;

    assert_eq!(resp.status().as_u16(), 502);
    let body: serde_json::Value = resp.json().await?;
    assert_eq!(body["error"], "embedding_error");
    assert_eq!(server.store.document_count("rag"), Some(0));

    Ok(())
}

#[tokio::test]
async fn test_delete_collection() -> Result<()> {
    let server = common::TestServer::start().await?;

    server
        .post("/addData", json!({ "dataList": ["one"] }))
        .send()
        .await?;
    assert_eq!(server.store.document_count("rag"), Some(1));

    let resp = server.post("/deleteCollection", json!({})).send().await?;
    assert_eq!(resp.status().as_u16(), 200);
    let body: serde_json::Value = resp.json().await?;
    assert_eq!(body, json!({ "data": null, "code": 200 }));
    assert_eq!(server.store.document_count("rag"), None);

    Ok(())
}

#[tokio::test]
async fn test_delete_missing_collection_is_404() -> Result<()> {
    let server = common::TestServer::start().await?;

    let resp = server.post("/deleteCollection", json!({})).send().await?;

    assert_eq!(resp.status().as_u16(), 404);
    let body: serde_json::Value = resp.json().await?;
    assert_eq!(body["error"], "collection_not_found");

    Ok(())
}

#[tokio::test]
async fn test_vector_store_down_is_503() -> Result<()> {
    let server = common::TestServer::start().await?;
    server.store.set_unavailable(true);

    let resp = server
        .post("/addData", json!({ "dataList": ["one"] }))
        .send()
        .await?;

    assert_eq!(resp.status().as_u16(), 503);

    Ok(())
}
