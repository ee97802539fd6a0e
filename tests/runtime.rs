use std::future;
use std::path::{Path, PathBuf};
use std::time::Duration;

use configd::engine::{Dispatcher, Runtime};
use configd::watch::{MockWatchBackend, RawEventKind};

mod common;
use crate::common::{init_tracing, mock_manager, mock_roots, with_timeout, Change, RecordingHandler, SOURCE};

fn p(rel: &str) -> PathBuf {
    Path::new(SOURCE).join(rel)
}

fn runtime(poll_ms: u64) -> (Runtime<MockWatchBackend, RecordingHandler>, MockWatchBackend, RecordingHandler) {
    let fs = mock_roots();
    let (manager, backend) = mock_manager(&fs);
    let handler = RecordingHandler::new();
    let mut dispatcher = Dispatcher::new(manager, handler.clone());
    dispatcher.watch_root(Path::new(SOURCE), false);
    (
        Runtime::new(dispatcher, Duration::from_millis(poll_ms)),
        backend,
        handler,
    )
}

#[tokio::test]
async fn pending_events_are_processed_before_shutdown() {
    init_tracing();
    let (runtime, backend, handler) = runtime(5);
    backend.push_path(RawEventKind::Created, p("a.yml"), false);
    backend.push_path(RawEventKind::Deleted, p("b.yml"), false);

    let dispatcher = with_timeout(runtime.run(tokio::time::sleep(Duration::from_millis(100))))
        .await
        .unwrap();

    assert_eq!(
        handler.changes(),
        vec![Change::Updated(p("a.yml")), Change::Deleted(p("b.yml"))]
    );
    assert!(dispatcher.watches().is_watched(Path::new(SOURCE)));
}

#[tokio::test]
async fn events_arriving_while_running_are_picked_up() {
    let (runtime, backend, handler) = runtime(5);

    let producer = async {
        tokio::time::sleep(Duration::from_millis(30)).await;
        backend.push_path(RawEventKind::ContentWritten, p("late.xslt"), false);
    };
    let (result, ()) = with_timeout(async {
        tokio::join!(
            runtime.run(tokio::time::sleep(Duration::from_millis(200))),
            producer
        )
    })
    .await;

    result.unwrap();
    assert_eq!(handler.updated(), vec![p("late.xslt")]);
}

#[tokio::test]
async fn immediate_shutdown_wins_over_polling() {
    let (runtime, backend, handler) = runtime(5);
    backend.push_path(RawEventKind::Created, p("never.yml"), false);

    let mut dispatcher = with_timeout(runtime.run(future::ready(()))).await.unwrap();
    assert!(handler.changes().is_empty());

    // The event is still queued for whoever polls next.
    assert_eq!(dispatcher.poll().unwrap(), 1);
    assert_eq!(handler.updated(), vec![p("never.yml")]);
}
