mod common;

use anyhow::Result;
use axum::http::StatusCode;
use common::{TestApp, OWNER};

#[tokio::test]
async fn health_endpoint_responds() -> Result<()> {
    let app = TestApp::new();
    let res = app.get("/health", OWNER).await?;

    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.body["success"], true);
    assert_eq!(res.body["data"]["database"], "ok");
    Ok(())
}

#[tokio::test]
async fn root_lists_endpoints() -> Result<()> {
    let app = TestApp::new();
    let res = app.get("/", OWNER).await?;

    assert_eq!(res.status, StatusCode::OK);
    assert!(res.body["data"]["endpoints"]["annotations"].is_string());
    Ok(())
}

#[tokio::test]
async fn unknown_route_is_404() -> Result<()> {
    let app = TestApp::new();
    let res = app.get("/nope", OWNER).await?;
    assert_eq!(res.status, StatusCode::NOT_FOUND);
    Ok(())
}
