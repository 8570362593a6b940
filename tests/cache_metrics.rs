use std::collections::HashSet;
use std::sync::Arc;

use menu_cache::application::catalog::MenuServices;
use menu_cache::application::inputs::{CreateRuleInput, CreateUserInput};
use menu_cache::application::repos::ListParams;
use menu_cache::cache::{CacheConfig, MemoryCacheStore};
use menu_cache::domain::types::Scope;
use menu_cache::infra::memory::MemoryStores;
use metrics_util::debugging::DebuggingRecorder;

#[tokio::test]
async fn cache_paths_emit_expected_metric_keys() {
    let recorder = DebuggingRecorder::new();
    let snapshotter = recorder.snapshotter();
    recorder
        .install()
        .expect("debug metrics recorder should install in this test process");

    let stores = MemoryStores::new();
    let cache = MemoryCacheStore::new();
    let services = MenuServices::new(
        stores.stores(),
        Arc::new(cache.clone()),
        &CacheConfig::default(),
    );

    // miss then hit on the collection, purge on create
    let params = ListParams::default();
    services.rules.get_all(Scope::Global, &params).await.expect("list");
    services.rules.get_all(Scope::Global, &params).await.expect("list");
    let rule_id = services
        .rules
        .create(
            Scope::Global,
            CreateRuleInput {
                name: "No pets".to_string(),
                description: None,
                enabled: true,
            },
        )
        .await
        .expect("create");

    // failed collection write
    cache.fail_writes(true);
    services.rules.get_all(Scope::Global, &params).await.expect("list");
    cache.fail_writes(false);
    services.rules.get_one(Scope::Global, rule_id).await.expect("get");

    // role miss then hit
    let user_id = services
        .users
        .create(
            Scope::Global,
            CreateUserInput {
                email: "bo@example.com".to_string(),
                display_name: "Bo".to_string(),
                role: "waiter".to_string(),
                organization_id: None,
            },
        )
        .await
        .expect("create user");
    services.authz.role_for(user_id).await.expect("role");
    services.authz.role_for(user_id).await.expect("role");

    let names: HashSet<String> = snapshotter
        .snapshot()
        .into_vec()
        .into_iter()
        .map(|(composite_key, _, _, _)| composite_key.key().name().to_string())
        .collect();

    let expected = [
        "menu_cache_hit_total",
        "menu_cache_miss_total",
        "menu_cache_error_total",
        "menu_cache_purged_keys_total",
        "menu_cache_purge_ms",
        "menu_cache_role_hit_total",
        "menu_cache_role_miss_total",
    ];

    for metric in expected {
        assert!(names.contains(metric), "missing metric: {metric}");
    }
}
