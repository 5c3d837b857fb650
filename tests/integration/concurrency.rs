use crate::integration::support::RecordingHandler;
use beholder::config::DispatchConfig;
use beholder::dispatch::DispatchWorker;
use beholder::pruning::SimplePruning;
use beholder::store::PathStore;
use beholder::types::Category;
use futures::future::join_all;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn blocked_gate_holds_producers_until_release() {
    let store = Arc::new(PathStore::new());
    let cancel = CancellationToken::new();

    let guard = store.block();
    let producer = {
        let store = Arc::clone(&store);
        let cancel = cancel.clone();
        tokio::spawn(async move {
            store
                .add_path_gated(Category::Refresh, "/late.txt", false, false, false, &cancel)
                .await
        })
    };

    tokio::time::sleep(Duration::from_millis(50)).await;
    assert!(!store.exists(Category::Refresh, "/late.txt"));

    guard.release();
    tokio::time::timeout(Duration::from_secs(5), producer)
        .await
        .unwrap()
        .unwrap()
        .unwrap();
    assert!(store.exists(Category::Refresh, "/late.txt"));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn every_file_is_dispatched_exactly_once_under_contention() {
    const PRODUCERS: usize = 4;
    const FILES: usize = 50;

    let store = Arc::new(PathStore::new());
    let handler = Arc::new(RecordingHandler::default());
    let worker = DispatchWorker::new(
        Arc::clone(&store),
        DispatchConfig {
            refresh_take_count: 16,
            ..DispatchConfig::default()
        },
        Box::new(SimplePruning::new(usize::MAX, None)),
        Arc::clone(&handler) as Arc<dyn beholder::provider::CacheHandler>,
    );
    let cancel = CancellationToken::new();

    let producers = (0..PRODUCERS).map(|p| {
        let store = Arc::clone(&store);
        let cancel = cancel.clone();
        tokio::spawn(async move {
            for i in 0..FILES {
                store
                    .add_path_gated(
                        Category::Refresh,
                        &format!("/p{p}/dir{}/f{i}.txt", i % 5),
                        false,
                        false,
                        false,
                        &cancel,
                    )
                    .await
                    .unwrap();
                tokio::task::yield_now().await;
            }
        })
    });
    let producers = tokio::spawn(join_all(producers));

    for _ in 0..20 {
        worker.run_cycle(&cancel).await;
        tokio::task::yield_now().await;
    }
    for joined in producers.await.unwrap() {
        joined.unwrap();
    }
    while !store.is_empty(Category::Refresh) {
        worker.run_cycle(&cancel).await;
    }

    let delivered: Vec<String> = handler
        .refreshed
        .lock()
        .iter()
        .flatten()
        .filter(|e| !e.is_directory)
        .map(|e| e.path.clone())
        .collect();
    let unique: HashSet<_> = delivered.iter().cloned().collect();
    assert_eq!(delivered.len(), PRODUCERS * FILES);
    assert_eq!(unique.len(), PRODUCERS * FILES);
    assert!(store.gate().is_open());
}

#[tokio::test]
async fn cancelled_producer_records_nothing() {
    let store = Arc::new(PathStore::new());
    let cancel = CancellationToken::new();
    let _guard = store.block();

    let pending = store.add_path_gated(Category::Preload, "/x.js", false, false, false, &cancel);
    cancel.cancel();
    assert!(pending.await.unwrap_err().is_cancelled());
    assert!(store.is_empty(Category::Preload));
}
