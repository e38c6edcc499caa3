//! End-to-end tests for the fetch, cache and render pipeline against a local HTTP responder.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use jobfeed::app::{App, Notice};
use jobfeed::cache::{CachePaths, LogKind, read_text, write_text};
use jobfeed::config::Config;
use jobfeed::error::FeedError;
use jobfeed::feed::{FeedCache, FeedClient};
use jobfeed::settings::{MemorySettingsStore, SettingsGroup};
use serde_json::json;
use tempfile::TempDir;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

/// Canned response served for every request.
struct Responder {
    url: String,
    hits: Arc<AtomicUsize>,
}

async fn serve(status: &str, content_type: Option<&str>, body: &str) -> Responder {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let url = format!("http://{}/feed", listener.local_addr().unwrap());
    let hits = Arc::new(AtomicUsize::new(0));

    let mut head = format!("HTTP/1.1 {}\r\n", status);
    if let Some(content_type) = content_type {
        head.push_str(&format!("Content-Type: {}\r\n", content_type));
    }
    head.push_str(&format!(
        "Content-Length: {}\r\nConnection: close\r\n\r\n",
        body.len()
    ));
    let response = format!("{}{}", head, body);

    let counter = Arc::clone(&hits);
    tokio::spawn(async move {
        loop {
            let Ok((mut socket, _)) = listener.accept().await else {
                break;
            };
            counter.fetch_add(1, Ordering::SeqCst);
            let response = response.clone();
            tokio::spawn(async move {
                let mut request = Vec::new();
                let mut buf = [0u8; 1024];
                while !request.windows(4).any(|w| w == b"\r\n\r\n") {
                    match socket.read(&mut buf).await {
                        Ok(0) | Err(_) => return,
                        Ok(n) => request.extend_from_slice(&buf[..n]),
                    }
                }
                let _ = socket.write_all(response.as_bytes()).await;
                let _ = socket.shutdown().await;
            });
        }
    });

    Responder { url, hits }
}

const FEED: &str = r#"[{"title":"Engineer","location":"Remote"}]"#;

fn cache_in(dir: &TempDir) -> FeedCache {
    FeedCache::new(
        FeedClient::new().unwrap(),
        CachePaths::new(dir.path().join("recright-feed")),
        5,
    )
}

fn app_in(dir: &TempDir, feed_url: &str) -> App {
    let mut config = Config::default();
    config
        .general
        .insert("feed_url".to_string(), json!(feed_url));
    config
        .general
        .insert("template_loop".to_string(), json!("[title] - [location]"));
    config
        .advanced
        .insert("template_container".to_string(), json!("[feed]"));
    App::new(
        config,
        Arc::new(MemorySettingsStore::new()),
        dir.path().join("recright-feed"),
    )
    .unwrap()
}

#[tokio::test]
async fn test_fetch_writes_pretty_cache_and_logs() {
    let server = serve("200 OK", Some("application/json; charset=utf-8"), FEED).await;
    let temp_dir = TempDir::new().unwrap();
    let cache = cache_in(&temp_dir);

    cache.fetch(&server.url, "manually").await.unwrap();

    let cached = read_text(&cache.paths().feed_file()).unwrap().unwrap();
    let expected =
        serde_json::to_string_pretty(&serde_json::from_str::<serde_json::Value>(FEED).unwrap())
            .unwrap();
    assert_eq!(cached, expected);

    let feed_log = cache.log(LogKind::Feed).recent(5).unwrap();
    assert_eq!(feed_log.len(), 1);
    assert!(feed_log[0].ends_with("] Feed cache updated manually"));
    assert!(cache.log(LogKind::Error).recent(5).unwrap().is_empty());
}

#[tokio::test]
async fn test_fetch_replaces_previous_cache() {
    let server = serve("200 OK", Some("application/json"), FEED).await;
    let temp_dir = TempDir::new().unwrap();
    let cache = cache_in(&temp_dir);
    write_text(&cache.paths().feed_file(), r#"[{"title":"Old"},{"title":"Older"}]"#).unwrap();

    cache.fetch(&server.url, "").await.unwrap();

    let records = cache.read_cached().unwrap().unwrap();
    assert_eq!(records.len(), 1);
    let feed_log = cache.log(LogKind::Feed).recent(5).unwrap();
    assert!(feed_log[0].ends_with("] Feed cache updated"));
}

#[tokio::test]
async fn test_fetch_succeeds_when_feed_log_unwritable() {
    let server = serve("200 OK", Some("application/json"), FEED).await;
    let temp_dir = TempDir::new().unwrap();
    let cache = cache_in(&temp_dir);
    // A directory where the feed log should be makes appends fail
    std::fs::create_dir_all(cache.log(LogKind::Feed).path()).unwrap();

    cache.fetch(&server.url, "manually").await.unwrap();

    let records = cache.read_cached().unwrap().unwrap();
    assert_eq!(records.len(), 1);
    assert!(cache.log(LogKind::Error).recent(5).unwrap().is_empty());
}

#[tokio::test]
async fn test_non_200_leaves_cache_untouched() {
    let server = serve("404 Not Found", Some("application/json"), "{}").await;
    let temp_dir = TempDir::new().unwrap();
    let cache = cache_in(&temp_dir);
    let original = "[\n  {\n    \"title\": \"Keep me\"\n  }\n]";
    write_text(&cache.paths().feed_file(), original).unwrap();

    let result = cache.fetch(&server.url, "").await;
    assert!(matches!(result, Err(FeedError::Status(404))));

    assert_eq!(
        read_text(&cache.paths().feed_file()).unwrap().as_deref(),
        Some(original)
    );
    let errors = cache.log(LogKind::Error).recent(10).unwrap();
    assert_eq!(errors.len(), 1);
    assert!(errors[0].ends_with("] Error retrieving feed. Status: 404"));
    assert!(cache.log(LogKind::Feed).recent(5).unwrap().is_empty());
}

#[tokio::test]
async fn test_wrong_content_type_rejected() {
    let server = serve("200 OK", Some("text/html; charset=utf-8"), FEED).await;
    let temp_dir = TempDir::new().unwrap();
    let cache = cache_in(&temp_dir);

    let result = cache.fetch(&server.url, "").await;
    assert!(matches!(result, Err(FeedError::ContentType(ref t)) if t == "text/html"));
    assert!(!cache.is_cached());

    let errors = cache.log(LogKind::Error).recent(10).unwrap();
    assert!(errors[0].ends_with("] Invalid feed content type: text/html"));
}

#[tokio::test]
async fn test_missing_content_type_rejected() {
    let server = serve("200 OK", None, FEED).await;
    let temp_dir = TempDir::new().unwrap();
    let cache = cache_in(&temp_dir);

    let result = cache.fetch(&server.url, "").await;
    assert!(matches!(result, Err(FeedError::ContentType(ref t)) if t.is_empty()));
    assert!(!cache.is_cached());
}

#[tokio::test]
async fn test_invalid_json_body_not_cached() {
    let server = serve("200 OK", Some("application/json"), "<html>oops</html>").await;
    let temp_dir = TempDir::new().unwrap();
    let cache = cache_in(&temp_dir);

    let result = cache.fetch(&server.url, "").await;
    assert!(matches!(result, Err(FeedError::Parse(_))));
    assert!(!cache.is_cached());
    assert_eq!(cache.log(LogKind::Error).recent(10).unwrap().len(), 1);
}

#[tokio::test]
async fn test_transport_error_logged() {
    // Bind and drop to get a port nothing listens on
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let url = format!("http://{}/feed", listener.local_addr().unwrap());
    drop(listener);

    let temp_dir = TempDir::new().unwrap();
    let cache = cache_in(&temp_dir);

    let result = cache.fetch(&url, "").await;
    assert!(matches!(result, Err(FeedError::Transport(_))));
    assert!(!cache.is_cached());
    assert!(!cache.log(LogKind::Error).recent(10).unwrap().is_empty());
}

#[tokio::test]
async fn test_display_feed_fetches_when_uncached() {
    let server = serve("200 OK", Some("application/json"), FEED).await;
    let temp_dir = TempDir::new().unwrap();
    let app = app_in(&temp_dir, &server.url);

    assert_eq!(app.display_feed().await, "Engineer - Remote");
    assert_eq!(server.hits.load(Ordering::SeqCst), 1);

    // Served from cache afterwards
    assert_eq!(app.display_feed().await, "Engineer - Remote");
    assert_eq!(server.hits.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_display_feed_html_filter() {
    let server = serve(
        "200 OK",
        Some("application/json"),
        r#"[{"title":"<b>X</b>","location":"Remote"}]"#,
    )
    .await;
    let temp_dir = TempDir::new().unwrap();
    let app = app_in(&temp_dir, &server.url);

    app.update_setting(SettingsGroup::General, "template_loop", json!("[title:html]|[title]"))
        .await
        .unwrap();

    assert_eq!(app.display_feed().await, "<b>X</b>|&lt;b&gt;X&lt;/b&gt;");
}

#[tokio::test]
async fn test_display_feed_default_templates() {
    let server = serve(
        "200 OK",
        Some("application/json"),
        r#"[{"title":"Engineer","location":"Remote","adUrl":"https://jobs.example/1","publishTime":"2024-03-05T10:00:00Z","endTime":null}]"#,
    )
    .await;
    let temp_dir = TempDir::new().unwrap();
    let app = App::new(
        {
            let mut config = Config::default();
            config.general.insert("feed_url".to_string(), json!(server.url));
            config
        },
        Arc::new(MemorySettingsStore::new()),
        temp_dir.path().join("recright-feed"),
    )
    .unwrap();

    let html = app.display_feed().await;
    assert!(html.starts_with("<div class=\"recright-feed\">\n  <div class=\"recright-feed-item\">"));
    assert!(html.contains("<a href=\"https://jobs.example/1\" target=\"_blank\">Engineer</a>"));
    assert!(html.contains("<time>5.3.2024</time>"));
    assert!(html.contains("<time></time>"));
}

#[tokio::test]
async fn test_display_feed_empty_array() {
    let server = serve("200 OK", Some("application/json"), "[]").await;
    let temp_dir = TempDir::new().unwrap();
    let app = app_in(&temp_dir, &server.url);

    assert_eq!(app.display_feed().await, "");
    assert!(app.cache().is_cached());
}

#[tokio::test]
async fn test_feed_url_change_triggers_fetch() {
    let server = serve("200 OK", Some("application/json"), FEED).await;
    let temp_dir = TempDir::new().unwrap();
    let app = app_in(&temp_dir, "http://127.0.0.1:9/unused");

    let notices = app
        .update_setting(SettingsGroup::General, "feed_url", json!(server.url))
        .await
        .unwrap();
    assert_eq!(
        notices,
        vec![Notice::Updated("Feed successfully updated".to_string())]
    );
    assert_eq!(server.hits.load(Ordering::SeqCst), 1);

    // Saving the same URL again does not refetch
    let notices = app
        .update_setting(SettingsGroup::General, "feed_url", json!(server.url))
        .await
        .unwrap();
    assert!(notices.is_empty());
    assert_eq!(server.hits.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_manual_and_scheduled_suffixes() {
    let server = serve("200 OK", Some("application/json"), FEED).await;
    let temp_dir = TempDir::new().unwrap();
    let app = app_in(&temp_dir, &server.url);

    let notices = app.refresh().await;
    assert!(!notices.iter().any(Notice::is_error));
    app.update_feed().await;

    let lines = app.logs(LogKind::Feed).unwrap();
    assert!(lines[0].ends_with("] Feed cache updated via cron"));
    assert!(lines[1].ends_with("] Feed cache updated manually"));
}

#[tokio::test]
async fn test_error_log_rotation_through_fetches() {
    let server = serve("500 Internal Server Error", Some("application/json"), "{}").await;
    let temp_dir = TempDir::new().unwrap();
    let cache = cache_in(&temp_dir);

    for _ in 0..11 {
        let _ = cache.fetch(&server.url, "").await;
    }

    let path = cache.log(LogKind::Error).path().to_path_buf();
    let text = std::fs::read_to_string(path).unwrap();
    assert_eq!(text.lines().count(), 5);
}
