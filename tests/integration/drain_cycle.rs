use crate::integration::support::RecordingHandler;
use beholder::config::DispatchConfig;
use beholder::dispatch::DispatchWorker;
use beholder::pruning::SimplePruning;
use beholder::store::PathStore;
use beholder::types::Category;
use std::fs;
use std::sync::Arc;
use tempfile::TempDir;
use tokio_util::sync::CancellationToken;

fn worker(
    store: &Arc<PathStore>,
    handler: &Arc<RecordingHandler>,
    pruner: SimplePruning,
    dispatch: DispatchConfig,
) -> DispatchWorker {
    DispatchWorker::new(
        Arc::clone(store),
        dispatch,
        Box::new(pruner),
        Arc::clone(handler) as Arc<dyn beholder::provider::CacheHandler>,
    )
}

#[tokio::test]
async fn busy_directory_collapses_into_one_forced_refresh() {
    let store = Arc::new(PathStore::new());
    for i in 0..12 {
        store.add_path(Category::Refresh, &format!("/assets/img/{i}.png"), false, false, false);
    }
    store.add_path(Category::Refresh, "/assets/app.js", false, false, false);

    let handler = Arc::new(RecordingHandler::default());
    let report = worker(
        &store,
        &handler,
        SimplePruning::new(10, None),
        DispatchConfig::default(),
    )
    .run_cycle(&CancellationToken::new())
    .await;

    assert!(!report.failed);
    let batches = handler.refreshed.lock().clone();
    assert_eq!(batches.len(), 1);
    let forced: Vec<_> = batches[0]
        .iter()
        .filter(|e| e.will_force_update)
        .map(|e| e.path.as_str())
        .collect();
    assert_eq!(forced, vec!["/assets/img"]);
    assert!(batches[0].iter().any(|e| e.path == "/assets/app.js"));
    assert!(!batches[0].iter().any(|e| e.path.starts_with("/assets/img/")));
    assert!(store.is_empty(Category::Refresh));
}

#[tokio::test]
async fn take_window_leaves_the_rest_for_the_next_cycle() {
    let store = Arc::new(PathStore::new());
    for name in ["a", "b", "c", "d"] {
        store.add_path(Category::Refresh, &format!("/{name}.css"), false, false, false);
    }

    let handler = Arc::new(RecordingHandler::default());
    let dispatch = DispatchConfig {
        refresh_take_count: 2,
        ..DispatchConfig::default()
    };
    let worker = worker(&store, &handler, SimplePruning::new(10, None), dispatch);
    let cancel = CancellationToken::new();

    let first = worker.run_cycle(&cancel).await;
    assert_eq!(first.refresh_taken, 2);
    assert_eq!(store.len(Category::Refresh), 2);
    assert!(store.exists(Category::Refresh, "/c.css"));

    worker.run_cycle(&cancel).await;
    assert!(store.is_empty(Category::Refresh));
    assert_eq!(
        handler.refreshed_paths(),
        vec![
            vec!["/a.css".to_string(), "/b.css".to_string()],
            vec!["/c.css".to_string(), "/d.css".to_string()],
        ]
    );
}

#[tokio::test]
async fn preload_check_drops_vanished_files_and_twins() {
    let root = TempDir::new().unwrap();
    fs::create_dir_all(root.path().join("docs")).unwrap();
    fs::write(root.path().join("docs/new.html"), "<p>new</p>").unwrap();

    let store = Arc::new(PathStore::new());
    store.add_path(Category::Refresh, "/docs/new.html", false, false, false);
    store.add_path(Category::Refresh, "/docs/old.html", false, false, false);
    store.add_path(Category::Preload, "/docs/new.html", false, false, true);
    store.add_path(Category::Preload, "/docs/gone.html", false, false, false);

    let handler = Arc::new(RecordingHandler::default());
    let report = worker(
        &store,
        &handler,
        SimplePruning::new(10, Some(root.path().to_path_buf())),
        DispatchConfig::default(),
    )
    .run_cycle(&CancellationToken::new())
    .await;

    assert!(!report.failed);
    let refreshed = handler.refreshed_paths();
    assert_eq!(refreshed.len(), 1);
    assert!(refreshed[0].contains(&"/docs/old.html".to_string()));
    assert!(!refreshed[0].contains(&"/docs/new.html".to_string()));

    let preloaded = handler.preloaded_paths();
    assert_eq!(preloaded.len(), 1);
    assert!(preloaded[0].contains(&"/docs/new.html".to_string()));
    assert!(!preloaded[0].contains(&"/docs/gone.html".to_string()));
}

#[tokio::test]
async fn cycle_from_config_uses_console_handler() {
    let store = Arc::new(PathStore::new());
    store.add_path(Category::Refresh, "/index.html", false, false, false);

    let config = beholder::BeholderConfig::default();
    let worker = DispatchWorker::from_config(Arc::clone(&store), &config).unwrap();
    let report = worker.run_cycle(&CancellationToken::new()).await;

    assert_eq!(report.refresh_ok, Some(true));
    assert_eq!(report.preload_ok, None);
    assert!(store.is_empty(Category::Refresh));
}
