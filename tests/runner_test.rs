//! End-to-end runner tests over the in-memory store.

mod common;

use std::io::Write;

use common::{item, now, secs_ago, seed, StaticFeedSource};
use feedsync::store::MemoryStore;
use feedsync::{Command, Config, Feed, SyncRunner};
use tempfile::NamedTempFile;

const CONFIG_YAML: &str = r#"
expires: 86400
clean:
  status:
    - Done
    - Archived
feeds:
  - url: https://a.example.com/feed.xml
    tags: [rust]
  - url: https://broken.example.com/feed.xml
  - url: https://b.example.com/feed.xml
    title: Blog B
    expires: 3600
notion:
  token: secret_abc
  database_id: db-1
"#;

fn write_config(content: &str, suffix: &str) -> NamedTempFile {
    let mut file = tempfile::Builder::new().suffix(suffix).tempfile().unwrap();
    file.write_all(content.as_bytes()).unwrap();
    file
}

fn source() -> StaticFeedSource {
    StaticFeedSource::new()
        .with_feed(
            "https://a.example.com/feed.xml",
            Feed::new("Blog A")
                .with_item(item("https://a/1", secs_ago(60)))
                .with_item(item("https://a/2", secs_ago(2 * 86400))),
        )
        .with_feed(
            "https://b.example.com/feed.xml",
            Feed::new("Fetched B")
                .with_item(item("https://b/1", secs_ago(60)))
                .with_item(item("https://b/2", secs_ago(7200))),
        )
}

#[tokio::test]
async fn test_pull_continues_past_failing_feed() {
    let file = write_config(CONFIG_YAML, ".yml");
    let config = Config::load(file.path()).unwrap();
    let source = source();
    let store = MemoryStore::new();
    let runner = SyncRunner::new(&source, &store, &config);

    let summary = runner.run(Command::Pull, now()).await;

    assert_eq!(summary.outcomes.len(), 3);
    assert!(summary.outcomes[0].error.is_none());
    assert!(summary.outcomes[1].error.is_some());
    assert!(summary.outcomes[2].error.is_none());
    assert_eq!(summary.feeds_failed(), 1);
    assert!(!summary.is_clean());

    // Feed A uses the global day window; feed B its own hour.
    assert_eq!(summary.outcomes[0].writes_ok, 1);
    assert_eq!(summary.outcomes[2].writes_ok, 1);

    let names: Vec<String> = store
        .records()
        .iter()
        .filter_map(|r| r.name().map(str::to_string))
        .collect();
    assert_eq!(names, vec!["Post 1 | Blog A", "Post 1 | Blog B"]);

    assert_eq!(
        source.fetches(),
        vec![
            "https://a.example.com/feed.xml",
            "https://broken.example.com/feed.xml",
            "https://b.example.com/feed.xml",
        ]
    );
}

#[tokio::test]
async fn test_pull_reports_write_failures() {
    let file = write_config(CONFIG_YAML, ".yml");
    let mut config = Config::load(file.path()).unwrap();
    config.feeds.retain(|f| !f.url.contains("broken"));
    let source = source();
    let store = MemoryStore::new();
    store.fail_writes_for_url("https://a/1");
    let runner = SyncRunner::new(&source, &store, &config);

    let summary = runner.run(Command::Pull, now()).await;

    assert_eq!(summary.feeds_failed(), 0);
    assert_eq!(summary.writes_ok(), 1);
    assert_eq!(summary.writes_failed(), 1);
    assert!(!summary.is_clean());
}

#[tokio::test]
async fn test_clean_uses_configured_statuses() {
    let file = write_config(CONFIG_YAML, ".yml");
    let mut config = Config::load(file.path()).unwrap();
    config.feeds.retain(|f| !f.url.contains("broken"));
    let source = source();
    let store = MemoryStore::new();
    let done = seed(&store, "Blog A", "https://a/old", Some(secs_ago(3 * 86400)), Some("Done"));
    let parked = seed(&store, "Blog A", "https://a/older", Some(secs_ago(5 * 86400)), Some("Archived"));
    let todo = seed(&store, "Blog A", "https://a/todo", Some(secs_ago(3 * 86400)), Some("Todo"));
    // Two hours old: stale for feed B's hour window, fresh for the global day.
    let b_done = seed(&store, "Blog B", "https://b/old", Some(secs_ago(7200)), Some("Done"));
    let runner = SyncRunner::new(&source, &store, &config);

    let summary = runner.run(Command::Clean, now()).await;

    assert!(summary.is_clean(), "{:?}", summary);
    assert_eq!(summary.writes_ok(), 3);
    assert!(store.get(&done).unwrap().archived);
    assert!(store.get(&parked).unwrap().archived);
    assert!(!store.get(&todo).unwrap().archived);
    assert!(store.get(&b_done).unwrap().archived);
}

#[tokio::test]
async fn test_toml_config_runs_the_same() {
    let toml = r#"
expires = 86400

[clean]
status = ["Done"]

[[feeds]]
url = "https://a.example.com/feed.xml"

[notion]
token = "secret_abc"
database_id = "db-1"
"#;
    let file = write_config(toml, ".toml");
    let config = Config::load(file.path()).unwrap();
    let source = source();
    let store = MemoryStore::new();
    let runner = SyncRunner::new(&source, &store, &config);

    let summary = runner.run(Command::Pull, now()).await;

    assert!(summary.is_clean(), "{:?}", summary);
    assert_eq!(summary.writes_ok(), 1);
    assert_eq!(config.feeds[0].expires, 86400);
}

#[tokio::test]
async fn test_empty_feed_list() {
    let file = write_config("", ".yml");
    let config = Config::load(file.path()).unwrap();
    let source = StaticFeedSource::new();
    let store = MemoryStore::new();
    let runner = SyncRunner::new(&source, &store, &config);

    for command in [Command::Pull, Command::Clean] {
        let summary = runner.run(command, now()).await;
        assert!(summary.outcomes.is_empty());
        assert!(summary.is_clean());
    }
    assert!(store.writes().is_empty());
}
