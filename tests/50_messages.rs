mod common;

use std::time::Duration;

use anyhow::Result;
use axum::http::StatusCode;
use common::{TestApp, GUEST, OWNER};
use serde_json::json;

async fn annotation(app: &TestApp) -> Result<(i64, i64, String)> {
    let image_id = app.upload_image(OWNER).await?;
    let token = app.share_token(image_id, OWNER).await?;
    let res = app.annotate(image_id, OWNER, None).await?;
    let annotation_id = res.body["data"]["id"].as_i64().unwrap();
    Ok((image_id, annotation_id, token))
}

#[tokio::test]
async fn messages_are_listed_oldest_first() -> Result<()> {
    let app = TestApp::new();
    let (_, annotation_id, token) = annotation(&app).await?;
    let uri = format!("/annotations/{}/messages", annotation_id);

    let res = app.post(&uri, OWNER, json!({ "message": "  first  " })).await?;
    assert_eq!(res.status, StatusCode::CREATED);
    assert_eq!(res.body["data"]["message"], "first");
    assert_eq!(res.body["data"]["annotationId"], annotation_id);

    app.clock.advance(Duration::from_secs(1));
    let res = app
        .post(&uri, GUEST, json!({ "message": "second", "shareToken": token }))
        .await?;
    assert_eq!(res.status, StatusCode::CREATED);

    let list = app.get(&format!("{}?shareToken={}", uri, token), GUEST).await?;
    assert_eq!(list.status, StatusCode::OK);
    let messages: Vec<&str> = list.body["data"]["messages"]
        .as_array()
        .unwrap()
        .iter()
        .filter_map(|m| m["message"].as_str())
        .collect();
    assert_eq!(messages, vec!["first", "second"]);
    Ok(())
}

#[tokio::test]
async fn message_length_is_bounded() -> Result<()> {
    let app = TestApp::new();
    let (_, annotation_id, _) = annotation(&app).await?;
    let uri = format!("/annotations/{}/messages", annotation_id);

    let ok = app.post(&uri, OWNER, json!({ "message": "a".repeat(1000) })).await?;
    assert_eq!(ok.status, StatusCode::CREATED);

    let too_long = app.post(&uri, OWNER, json!({ "message": "a".repeat(1001) })).await?;
    assert_eq!(too_long.status, StatusCode::BAD_REQUEST);
    assert!(too_long.body["field_errors"]["message"].is_string());

    let blank = app.post(&uri, OWNER, json!({ "message": "   " })).await?;
    assert_eq!(blank.status, StatusCode::BAD_REQUEST);

    assert_eq!(app.store.message_count().await, 1);
    Ok(())
}

#[tokio::test]
async fn guests_without_token_cannot_chat() -> Result<()> {
    let app = TestApp::new();
    let (_, annotation_id, _) = annotation(&app).await?;
    let uri = format!("/annotations/{}/messages", annotation_id);

    let post = app.post(&uri, GUEST, json!({ "message": "hi" })).await?;
    assert_eq!(post.status, StatusCode::FORBIDDEN);

    let wrong = app
        .post(&uri, GUEST, json!({ "message": "hi", "shareToken": "nope" }))
        .await?;
    assert_eq!(wrong.status, StatusCode::FORBIDDEN);

    let list = app.get(&uri, GUEST).await?;
    assert_eq!(list.status, StatusCode::FORBIDDEN);

    assert_eq!(app.store.message_count().await, 0);
    Ok(())
}

#[tokio::test]
async fn messages_on_missing_annotation_are_not_found() -> Result<()> {
    let app = TestApp::new();
    let res = app
        .post("/annotations/555/messages", OWNER, json!({ "message": "hi" }))
        .await?;
    assert_eq!(res.status, StatusCode::NOT_FOUND);

    let res = app.get("/annotations/555/messages", OWNER).await?;
    assert_eq!(res.status, StatusCode::NOT_FOUND);
    Ok(())
}
