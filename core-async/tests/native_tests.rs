//! Integration tests for the core-async facade.
//!
//! These cover the primitives the cache and player actors are built from.

use core_async::{runtime, sync, task, time};

#[tokio::test]
async fn test_task_spawn() {
    let handle = task::spawn(async { 42 });
    let result = handle.await.unwrap();
    assert_eq!(result, 42);
}

#[tokio::test]
async fn test_spawn_blocking_returns_value() {
    let handle = task::spawn_blocking(|| {
        std::thread::sleep(std::time::Duration::from_millis(10));
        100
    });
    assert_eq!(handle.await.unwrap(), 100);
}

#[tokio::test]
async fn test_timeout_success() {
    let result = time::timeout(time::Duration::from_millis(200), async {
        time::sleep(time::Duration::from_millis(10)).await;
        42
    })
    .await;

    assert_eq!(result.unwrap(), 42);
}

#[tokio::test]
async fn test_timeout_failure() {
    let result = time::timeout(time::Duration::from_millis(10), async {
        time::sleep(time::Duration::from_millis(200)).await;
        42
    })
    .await;

    assert!(result.is_err());
}

#[tokio::test]
async fn test_fresh_interval_skips_immediate_tick() {
    let mut ticker = time::fresh_interval(time::Duration::from_millis(20));
    let start = time::Instant::now();

    ticker.tick().await;

    // tokio::time::interval would have returned immediately
    assert!(start.elapsed() >= time::Duration::from_millis(15));
}

#[tokio::test]
async fn test_unbounded_channel_preserves_order() {
    let (tx, mut rx) = sync::mpsc::unbounded_channel();

    for i in 0..5 {
        tx.send(i).unwrap();
    }
    drop(tx);

    let mut received = vec![];
    while let Some(value) = rx.recv().await {
        received.push(value);
    }

    assert_eq!(received, vec![0, 1, 2, 3, 4]);
}

#[tokio::test]
async fn test_oneshot_channel() {
    let (tx, rx) = sync::oneshot::channel();

    task::spawn(async move {
        time::sleep(time::Duration::from_millis(10)).await;
        tx.send(42).unwrap();
    });

    assert_eq!(rx.await.unwrap(), 42);
}

#[tokio::test]
async fn test_watch_channel_observes_latest() {
    let (tx, mut rx) = sync::watch::channel(0);

    task::spawn(async move {
        for i in 1..=5 {
            time::sleep(time::Duration::from_millis(5)).await;
            tx.send(i).unwrap();
        }
    });

    let mut last_value = 0;
    while rx.changed().await.is_ok() {
        last_value = *rx.borrow();
        if last_value >= 5 {
            break;
        }
    }

    assert_eq!(last_value, 5);
}

#[tokio::test]
async fn test_cancellation_token_stops_loop() {
    let token = sync::CancellationToken::new();
    let child = token.child_token();

    let handle = task::spawn(async move {
        let mut ticks = 0u32;
        loop {
            core_async::select! {
                _ = child.cancelled() => break ticks,
                _ = time::sleep(time::Duration::from_millis(5)) => ticks += 1,
            }
        }
    });

    time::sleep(time::Duration::from_millis(20)).await;
    token.cancel();

    let ticks = handle.await.unwrap();
    assert!(ticks >= 1);
}

#[test]
fn test_block_on_runs_future() {
    let value = runtime::block_on(async { 7 }).unwrap();
    assert_eq!(value, 7);
}

#[test]
fn test_current_handle_outside_runtime() {
    assert!(runtime::current().is_none());
}

#[tokio::test]
async fn test_now_millis_is_positive() {
    assert!(time::now_millis() > 0);
}
