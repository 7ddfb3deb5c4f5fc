//! Integration tests against a real Redis. Requires Docker.

use queue_worker::{JobQueue, RedisListQueue};
use std::time::Duration;
use test_utils::TestRedis;

#[tokio::test]
#[ignore = "requires Docker"]
async fn test_push_pop_roundtrip_preserves_fifo() {
    let redis = TestRedis::new().await;
    let manager = RedisListQueue::connect(redis.connection_string(), Duration::from_secs(2))
        .await
        .unwrap();
    let queue = RedisListQueue::new(manager, "recordings:test");

    queue.push(r#"{"id":"1"}"#).await.unwrap();
    queue.push(r#"{"id":"2"}"#).await.unwrap();
    assert_eq!(queue.len().await.unwrap(), 2);

    let first = queue.pop(Duration::from_secs(1)).await.unwrap();
    let second = queue.pop(Duration::from_secs(1)).await.unwrap();
    assert_eq!(first.as_deref(), Some(r#"{"id":"1"}"#));
    assert_eq!(second.as_deref(), Some(r#"{"id":"2"}"#));
}

#[tokio::test]
#[ignore = "requires Docker"]
async fn test_blocking_pop_returns_none_after_timeout() {
    let redis = TestRedis::new().await;
    let manager = RedisListQueue::connect(redis.connection_string(), Duration::from_secs(2))
        .await
        .unwrap();
    let queue = RedisListQueue::new(manager, "recordings:empty");

    let started = std::time::Instant::now();
    let popped = queue.pop(Duration::from_secs(1)).await.unwrap();
    assert!(popped.is_none());
    assert!(started.elapsed() >= Duration::from_millis(900));
}

#[tokio::test]
#[ignore = "requires Docker"]
async fn test_sibling_queue_is_independent() {
    let redis = TestRedis::new().await;
    let manager = RedisListQueue::connect(redis.connection_string(), Duration::from_secs(2))
        .await
        .unwrap();
    let queue = RedisListQueue::new(manager, "recordings:main");
    let dlq = queue.sibling("recordings:dlq");

    dlq.push("dead").await.unwrap();
    assert_eq!(queue.len().await.unwrap(), 0);
    assert_eq!(dlq.len().await.unwrap(), 1);
    queue.ping().await.unwrap();
}
