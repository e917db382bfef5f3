use super::*;

use std::{
    env, fs,
    time::{SystemTime, UNIX_EPOCH},
};

use axum::{routing::get, Router};
use tokio::net::TcpListener;

async fn spawn_site() -> Url {
    std::env::set_var("NO_PROXY", "127.0.0.1,localhost");
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("addr");
    let app = Router::new()
        .route("/", get(|| async { "<html>home</html>" }))
        .route("/index.html", get(|| async { "<html>home</html>" }))
        .route("/style.css", get(|| async { "body{}" }))
        .route("/script.js", get(|| async { "init()" }))
        .route("/slideshow.js", get(|| async { "slides()" }))
        .route("/certificate-renderer.js", get(|| async { "render()" }))
        .route("/certificates-data.json", get(|| async { r#"{"certificates":{}}"# }))
        .route("/icons/portfolio-logo.svg", get(|| async { "<svg/>" }));
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    Url::parse(&format!("http://{addr}/")).expect("base url")
}

fn temp_settings(label: &str) -> (std::path::PathBuf, Settings) {
    let suffix = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("clock")
        .as_nanos();
    let temp_root = env::temp_dir().join(format!("folio_cli_{label}_{suffix}"));
    let db_path = temp_root.join("data").join("folio.db");
    let settings = Settings {
        database_url: format!("sqlite://{}", db_path.to_string_lossy().replace('\\', "/")),
        ..Settings::default()
    };
    (temp_root, settings)
}

#[tokio::test]
async fn precached_site_answers_navigation_offline() {
    let base = spawn_site().await;
    let (temp_root, mut settings) = temp_settings("precache");
    settings.origin = Some(base.to_string());

    let report = precache(&settings).await.expect("precache");
    assert_eq!(report.bucket, "pd-portfolio-v3");
    assert_eq!(report.entries, 8);
    assert_eq!(report.buckets, vec!["pd-portfolio-v3".to_string()]);

    let page = fetch(
        &settings,
        base.join("projects/folio").expect("url").as_str(),
        &FetchOptions {
            navigate: true,
            offline: true,
            ..FetchOptions::default()
        },
    )
    .await
    .expect("offline fallback");
    assert_eq!(page.text(), "<html>home</html>");

    let summaries = buckets(&settings).await.expect("buckets");
    assert_eq!(summaries.len(), 1);
    assert_eq!(summaries[0].entries, 8);

    fs::remove_dir_all(temp_root).expect("cleanup");
}

#[tokio::test]
async fn offline_fetch_of_uncached_asset_fails() {
    let (temp_root, settings) = temp_settings("miss");
    let err = fetch(
        &settings,
        "https://portfolio.test/img/new.png",
        &FetchOptions {
            offline: true,
            ..FetchOptions::default()
        },
    )
    .await
    .expect_err("nothing cached");
    assert!(err.to_string().contains("network unavailable"));

    fs::remove_dir_all(temp_root).expect("cleanup");
}

#[tokio::test]
async fn precache_requires_an_origin() {
    let (_, settings) = temp_settings("no_origin");
    let err = precache(&settings).await.expect_err("no origin");
    assert!(err.to_string().contains("no origin configured"));
}

#[tokio::test(start_paused = true)]
async fn carousel_demo_reports_autoplay_changes() {
    let changes = carousel_demo(3, 4, Duration::from_millis(1000))
        .await
        .expect("demo");
    let moves: Vec<(usize, usize)> = changes
        .iter()
        .map(|change| (change.previous_slide, change.current_slide))
        .collect();
    assert_eq!(moves, vec![(0, 1), (1, 2), (2, 0), (0, 1)]);
    assert!(changes.iter().all(|change| change.total_slides == 3));
}

#[tokio::test]
async fn single_slide_demo_returns_immediately() {
    let changes = carousel_demo(1, 3, Duration::from_millis(10))
        .await
        .expect("demo");
    assert!(changes.is_empty());
}

#[test]
fn missing_certificate_data_renders_nothing() {
    assert_eq!(certificates(Path::new("/nonexistent/certificates-data.json")), None);
}
