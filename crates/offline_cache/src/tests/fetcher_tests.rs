use super::*;
use anyhow::Result;
use axum::{
    http::{header, StatusCode},
    routing::get,
    Router,
};
use tokio::net::TcpListener;
use url::Url;

async fn spawn_static_server() -> Result<Url> {
    std::env::set_var("NO_PROXY", "127.0.0.1,localhost");
    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;
    let app = Router::new()
        .route(
            "/style.css",
            get(|| async { ([(header::CONTENT_TYPE, "text/css")], "body { margin: 0 }") }),
        )
        .route(
            "/gone.png",
            get(|| async { (StatusCode::GONE, "gone") }),
        );
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    Ok(Url::parse(&format!("http://{addr}/"))?)
}

#[tokio::test]
async fn http_fetcher_returns_status_headers_and_body() {
    let base = spawn_static_server().await.expect("server");
    let fetcher = HttpFetcher::new();

    let response = fetcher
        .fetch(&FetchRequest::get(base.join("style.css").expect("url")))
        .await
        .expect("fetch");
    assert!(response.is_ok());
    assert_eq!(response.text(), "body { margin: 0 }");
    assert_eq!(
        response
            .headers
            .get(header::CONTENT_TYPE)
            .and_then(|value| value.to_str().ok()),
        Some("text/css")
    );
}

#[tokio::test]
async fn http_fetcher_reports_error_statuses_as_responses() {
    let base = spawn_static_server().await.expect("server");
    let response = HttpFetcher::new()
        .fetch(&FetchRequest::get(base.join("gone.png").expect("url")))
        .await
        .expect("fetch");
    assert_eq!(response.status, StatusCode::GONE);
    assert!(!response.is_ok());
}

#[tokio::test]
async fn http_fetcher_maps_connection_failures_to_network_errors() {
    std::env::set_var("NO_PROXY", "127.0.0.1,localhost");
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("addr");
    drop(listener);

    let url = Url::parse(&format!("http://{addr}/index.html")).expect("url");
    let err = HttpFetcher::new()
        .fetch(&FetchRequest::get(url.clone()))
        .await
        .expect_err("refused");
    assert!(matches!(err, FetchError::Network { .. }));
    assert_eq!(err.url(), url.as_str());
}

#[tokio::test]
async fn offline_fetcher_always_fails() {
    let url = Url::parse("https://portfolio.test/").expect("url");
    let err = OfflineFetcher
        .fetch(&FetchRequest::navigate(url))
        .await
        .expect_err("offline");
    assert_eq!(
        err,
        FetchError::Offline {
            url: "https://portfolio.test/".to_string()
        }
    );
}
