use beholder::config::WatchConfig;
use beholder::store::PathStore;
use beholder::types::Category;
use beholder::watch::WatchRuntime;
use std::fs;
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;
use tokio_util::sync::CancellationToken;

async fn wait_for(store: &PathStore, category: Category, path: &str) -> bool {
    for _ in 0..100 {
        if store.exists(category, path) {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(50)).await;
    }
    false
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn written_file_lands_in_both_categories() {
    let dir = TempDir::new().unwrap();
    let root = dunce::canonicalize(dir.path()).unwrap();
    let config = WatchConfig {
        directory: root.clone(),
        trim_start: root.to_string_lossy().into_owned(),
        exclude_extensions: vec![".tmp".to_string()],
        preload_enabled: true,
        ..WatchConfig::default()
    };

    let store = Arc::new(PathStore::new());
    let cancel = CancellationToken::new();
    let runtime = WatchRuntime::new(config, Arc::clone(&store));
    let handle = tokio::spawn(runtime.run(cancel.clone()));
    tokio::time::sleep(Duration::from_millis(200)).await;

    fs::write(root.join("page.html"), "<h1>hi</h1>").unwrap();
    fs::write(root.join("scratch.tmp"), "ignored").unwrap();

    assert!(wait_for(&store, Category::Refresh, "/page.html").await);
    assert!(wait_for(&store, Category::Preload, "/page.html").await);
    assert!(!store.exists(Category::Refresh, "/scratch.tmp"));

    cancel.cancel();
    tokio::time::timeout(Duration::from_secs(5), handle)
        .await
        .unwrap()
        .unwrap()
        .unwrap();
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn non_canonical_directory_still_trims_event_paths() {
    let dir = TempDir::new().unwrap();
    fs::create_dir_all(dir.path().join("www/assets")).unwrap();
    let configured = dir.path().join("www").join("assets").join("..");
    let config = WatchConfig {
        directory: configured.clone(),
        trim_start: configured.to_string_lossy().into_owned(),
        ..WatchConfig::default()
    };

    let store = Arc::new(PathStore::new());
    let cancel = CancellationToken::new();
    let handle = tokio::spawn(WatchRuntime::new(config, Arc::clone(&store)).run(cancel.clone()));
    tokio::time::sleep(Duration::from_millis(200)).await;

    fs::write(dir.path().join("www/index.html"), "<h1>home</h1>").unwrap();

    assert!(wait_for(&store, Category::Refresh, "/index.html").await);

    cancel.cancel();
    tokio::time::timeout(Duration::from_secs(5), handle)
        .await
        .unwrap()
        .unwrap()
        .unwrap();
}
