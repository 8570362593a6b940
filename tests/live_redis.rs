//! Runs against a real Redis when `MENU_CACHE_TEST_REDIS_URL` is set:
//! `cargo test --test live_redis -- --ignored`.

use std::time::Duration;

use menu_cache::cache::CacheStore;
use menu_cache::infra::redis::RedisCacheStore;
use uuid::Uuid;

async fn connect() -> Option<RedisCacheStore> {
    let url = std::env::var("MENU_CACHE_TEST_REDIS_URL").ok()?;
    let prefix = format!("menu-cache-test:{}:", Uuid::new_v4());
    Some(
        RedisCacheStore::connect(&url, prefix)
            .await
            .expect("connect to redis"),
    )
}

#[tokio::test]
#[ignore = "requires MENU_CACHE_TEST_REDIS_URL"]
async fn set_get_and_delete_round_trip() {
    let Some(store) = connect().await else {
        return;
    };
    store.ping().await.expect("ping");

    store
        .set("rule:1", b"{\"name\":\"x\"}".to_vec(), Duration::from_secs(30))
        .await
        .expect("set");
    assert_eq!(
        store.get("rule:1").await.expect("get").as_deref(),
        Some(&b"{\"name\":\"x\"}"[..])
    );

    assert!(store.delete("rule:1").await.expect("delete"));
    assert!(!store.delete("rule:1").await.expect("delete"));
    assert!(store.get("rule:1").await.expect("get").is_none());
}

#[tokio::test]
#[ignore = "requires MENU_CACHE_TEST_REDIS_URL"]
async fn prefix_delete_only_touches_matching_keys() {
    let Some(store) = connect().await else {
        return;
    };
    let ttl = Duration::from_secs(30);
    let org = Uuid::new_v4();

    store
        .set(&format!("items:o.{org}"), b"[]".to_vec(), ttl)
        .await
        .expect("set");
    store
        .set(&format!("items:o.{org}:q.0123456789abcdef"), b"[]".to_vec(), ttl)
        .await
        .expect("set");
    store.set("item:1", b"{}".to_vec(), ttl).await.expect("set");

    let removed = store
        .delete_prefix(&format!("items:o.{org}"))
        .await
        .expect("delete prefix");
    assert_eq!(removed, 2);
    assert!(store.get("item:1").await.expect("get").is_some());

    store.delete("item:1").await.expect("cleanup");
}
