//! Integration tests against a real Redis backend.
//!
//! Tests use testcontainers for portability - no external docker-compose
//! required.
//!
//! # Running Tests
//! ```bash
//! # Requires Docker
//! cargo test --test integration -- --ignored
//! ```

use std::sync::Arc;

use serde_json::json;

use hybrid_cache::{
    CacheConfig, HybridCache, RedisKv, RemoteStore, WarmEntry, WritePolicy,
};

use testcontainers::{clients::Cli, core::WaitFor, Container, GenericImage};

/// Create a Redis container with health check
fn redis_container(docker: &Cli) -> Container<'_, GenericImage> {
    let image = GenericImage::new("redis", "7-alpine")
        .with_exposed_port(6379)
        .with_wait_for(WaitFor::message_on_stdout("Ready to accept connections"));
    docker.run(image)
}

fn redis_config(port: u16, policy: WritePolicy) -> CacheConfig {
    CacheConfig {
        redis_url: Some(format!("redis://127.0.0.1:{port}")),
        redis_prefix: Some("brand:".into()),
        write_policy: policy,
        ..Default::default()
    }
}

#[tokio::test]
#[ignore] // Requires Docker
async fn write_through_roundtrip_and_health() {
    let docker = Cli::default();
    let redis = redis_container(&docker);
    let port = redis.get_host_port_ipv4(6379);

    let cache = HybridCache::connect(redis_config(port, WritePolicy::WriteThrough))
        .await
        .expect("Failed to connect");

    let health = cache.health_check().await;
    assert!(health.memory);
    assert!(health.redis);

    cache
        .set("logo.acme", &json!({"format": "svg", "url": "https://cdn/acme.svg"}), None)
        .await
        .expect("Failed to set");

    let logo: Option<serde_json::Value> = cache.get("logo.acme").await.expect("Failed to get");
    assert_eq!(logo.unwrap()["format"], "svg");

    // Fresh coordinator over the same Redis sees the write (shared namespace)
    let other = HybridCache::connect(redis_config(port, WritePolicy::WriteThrough))
        .await
        .expect("Failed to connect");
    let logo: Option<serde_json::Value> = other.get("logo.acme").await.expect("Failed to get");
    assert_eq!(logo.unwrap()["format"], "svg");
    assert_eq!(other.metrics().redis_hits, 1);
}

#[tokio::test]
#[ignore] // Requires Docker
async fn namespacing_isolates_and_strips_prefix() {
    let docker = Cli::default();
    let redis = redis_container(&docker);
    let port = redis.get_host_port_ipv4(6379);
    let url = format!("redis://127.0.0.1:{port}");

    let brand = RedisKv::with_prefix(&url, Some("brand:")).await.expect("connect");
    let other = RedisKv::with_prefix(&url, Some("other:")).await.expect("connect");

    brand.set("logo.acme", "\"a\"", None).await.expect("set");
    brand.set("logo.globex", "\"b\"", None).await.expect("set");
    other.set("logo.acme", "\"x\"", None).await.expect("set");

    // Key listings are logical (prefix stripped) and namespace-scoped
    let mut keys = brand.keys("logo.*").await.expect("keys");
    keys.sort();
    assert_eq!(keys, vec!["logo.acme", "logo.globex"]);

    // Pattern flush only touches this namespace
    let removed = brand.flush(Some("logo.*")).await.expect("flush");
    assert_eq!(removed, 2);
    assert!(other.exists("logo.acme").await.expect("exists"));
}

#[tokio::test]
#[ignore] // Requires Docker
async fn ttl_expires_remote_records() {
    let docker = Cli::default();
    let redis = redis_container(&docker);
    let port = redis.get_host_port_ipv4(6379);
    let url = format!("redis://127.0.0.1:{port}");

    let store = RedisKv::with_prefix(&url, Some("ttl:")).await.expect("connect");
    store.set("short", "\"v\"", Some(1)).await.expect("set");
    assert!(store.exists("short").await.expect("exists"));

    tokio::time::sleep(std::time::Duration::from_millis(1500)).await;
    assert!(!store.exists("short").await.expect("exists"));
    assert!(store.get("short").await.expect("get").is_none());
}

#[tokio::test]
#[ignore] // Requires Docker
async fn write_behind_lands_in_redis() {
    let docker = Cli::default();
    let redis = redis_container(&docker);
    let port = redis.get_host_port_ipv4(6379);

    let cache = HybridCache::connect(redis_config(port, WritePolicy::WriteBehind))
        .await
        .expect("Failed to connect");

    cache.set("stats.daily", &json!({"downloads": 42}), None).await.expect("set");

    // Caller sees the write locally right away
    assert!(cache.peek_memory("stats.daily"));

    // Detached write reaches Redis eventually
    let probe = RedisKv::with_prefix(&format!("redis://127.0.0.1:{port}"), Some("brand:"))
        .await
        .expect("connect");
    let mut landed = false;
    for _ in 0..100 {
        if probe.exists("stats.daily").await.expect("exists") {
            landed = true;
            break;
        }
        tokio::time::sleep(std::time::Duration::from_millis(10)).await;
    }
    assert!(landed, "detached write never reached Redis");
}

#[tokio::test]
#[ignore] // Requires Docker
async fn warm_then_invalidate_pattern() {
    let docker = Cli::default();
    let redis = redis_container(&docker);
    let port = redis.get_host_port_ipv4(6379);

    let cache = HybridCache::connect(redis_config(port, WritePolicy::WriteThrough))
        .await
        .expect("Failed to connect");

    cache
        .warm_cache(vec![
            WarmEntry::new("logo.acme", json!({"format": "svg"})),
            WarmEntry::new("logo.globex", json!({"format": "png"})),
            WarmEntry::new("card.smith", json!({"color": "navy"})),
        ])
        .await
        .expect("warm");

    cache.invalidate_pattern("logo.*").await.expect("invalidate");

    // Local tier fully cleared; remote keeps only non-matching keys
    assert!(!cache.peek_memory("card.smith"));
    let logo: Option<serde_json::Value> = cache.get("logo.acme").await.expect("get");
    assert!(logo.is_none());
    let card: Option<serde_json::Value> = cache.get("card.smith").await.expect("get");
    assert_eq!(card.unwrap()["color"], "navy");
}

#[tokio::test]
#[ignore] // Requires Docker
async fn remote_store_contract_against_redis() {
    let docker = Cli::default();
    let redis = redis_container(&docker);
    let port = redis.get_host_port_ipv4(6379);
    let url = format!("redis://127.0.0.1:{port}");

    let store: Arc<dyn RemoteStore> =
        Arc::new(RedisKv::with_prefix(&url, Some("contract:")).await.expect("connect"));

    assert!(store.get("missing").await.expect("get").is_none());
    assert!(!store.exists("missing").await.expect("exists"));

    store.set("k", "{\"n\":1}", None).await.expect("set");
    assert_eq!(store.get("k").await.expect("get").as_deref(), Some("{\"n\":1}"));

    store.del("k").await.expect("del");
    assert!(!store.exists("k").await.expect("exists"));

    // Full-namespace flush
    store.set("a", "\"1\"", None).await.expect("set");
    store.set("b", "\"2\"", None).await.expect("set");
    let removed = store.flush(None).await.expect("flush");
    assert_eq!(removed, 2);
    assert!(store.keys("*").await.expect("keys").is_empty());
}
