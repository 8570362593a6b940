use super::*;

#[test]
fn defaults_are_valid() {
    let settings = Settings::from_raw(RawSettings::default()).expect("valid settings");

    assert!(settings.cache.enabled);
    assert_eq!(settings.cache.backend, CacheBackend::Redis);
    assert_eq!(settings.cache.default_ttl, Duration::from_secs(300));
    assert_eq!(settings.cache.role_ttl, Duration::from_secs(600));
    assert_eq!(settings.cache.call_timeout, Duration::from_millis(2_000));
    assert_eq!(settings.redis.url, DEFAULT_REDIS_URL);
    assert_eq!(settings.database.max_connections.get(), 8);
    assert!(settings.database.url.is_none());
    assert_eq!(settings.logging.level, LevelFilter::INFO);
}

#[test]
fn cli_overrides_take_highest_precedence() {
    let mut raw = RawSettings::default();
    raw.logging.level = Some("info".to_string());
    raw.cache.enabled = Some(true);
    raw.redis.url = Some("redis://cache-a:6379".to_string());

    let overrides = RuntimeOverrides {
        log_level: Some("debug".to_string()),
        cache_enabled: Some(false),
        redis_url: Some("redis://cache-b:6379".to_string()),
        ..Default::default()
    };

    raw.apply_runtime_overrides(&overrides);
    let settings = Settings::from_raw(raw).expect("valid settings");

    assert_eq!(settings.logging.level, LevelFilter::DEBUG);
    assert!(!settings.cache.enabled);
    assert_eq!(settings.redis.url, "redis://cache-b:6379");
}

#[test]
fn cli_json_logging_enforces_format() {
    let mut raw = RawSettings::default();
    raw.apply_runtime_overrides(&RuntimeOverrides {
        log_json: Some(true),
        ..Default::default()
    });

    let settings = Settings::from_raw(raw).expect("valid settings");
    assert!(matches!(settings.logging.format, LogFormat::Json));
}

#[test]
fn per_entity_ttls_accept_singular_and_table_names() {
    let mut raw = RawSettings::default();
    raw.cache.ttl_seconds.insert("item".to_string(), 30);
    raw.cache.ttl_seconds.insert("categories".to_string(), 900);

    let settings = Settings::from_raw(raw).expect("valid settings");

    assert_eq!(
        settings.cache.entity_ttl.get(&EntityKind::Item),
        Some(&Duration::from_secs(30))
    );
    assert_eq!(
        settings.cache.entity_ttl.get(&EntityKind::Category),
        Some(&Duration::from_secs(900))
    );
}

#[test]
fn unknown_entity_ttl_is_rejected() {
    let mut raw = RawSettings::default();
    raw.cache.ttl_seconds.insert("favorite".to_string(), 30);

    let err = Settings::from_raw(raw).expect_err("unknown kind");
    assert!(matches!(
        err,
        LoadError::Invalid {
            key: "cache.ttl_seconds",
            ..
        }
    ));
}

#[test]
fn zero_ttl_and_timeout_are_rejected() {
    let mut raw = RawSettings::default();
    raw.cache.default_ttl_seconds = Some(0);
    assert!(matches!(
        Settings::from_raw(raw),
        Err(LoadError::Invalid {
            key: "cache.default_ttl_seconds",
            ..
        })
    ));

    let mut raw = RawSettings::default();
    raw.cache.call_timeout_ms = Some(0);
    assert!(matches!(
        Settings::from_raw(raw),
        Err(LoadError::Invalid {
            key: "cache.call_timeout_ms",
            ..
        })
    ));
}

#[test]
fn backend_is_parsed_case_insensitively() {
    let mut raw = RawSettings::default();
    raw.cache.backend = Some("Memory".to_string());
    let settings = Settings::from_raw(raw).expect("valid settings");
    assert_eq!(settings.cache.backend, CacheBackend::Memory);

    let mut raw = RawSettings::default();
    raw.cache.backend = Some("memcached".to_string());
    assert!(matches!(
        Settings::from_raw(raw),
        Err(LoadError::Invalid {
            key: "cache.backend",
            ..
        })
    ));
}

#[test]
fn non_redis_url_is_rejected() {
    let mut raw = RawSettings::default();
    raw.redis.url = Some("http://localhost:6379".to_string());
    assert!(matches!(
        Settings::from_raw(raw),
        Err(LoadError::Invalid {
            key: "redis.url",
            ..
        })
    ));
}

#[test]
fn blank_database_url_is_treated_as_missing() {
    let mut raw = RawSettings::default();
    raw.database.url = Some("   ".to_string());
    let settings = Settings::from_raw(raw).expect("valid settings");
    assert!(settings.database.url.is_none());
}

#[test]
fn parse_invalidate_arguments() {
    let org = uuid::Uuid::new_v4();
    let org_arg = org.to_string();
    let args = CliArgs::parse_from([
        "menu-cache",
        "invalidate",
        "--entity",
        "items",
        "--organization",
        org_arg.as_str(),
        "--cache-backend",
        "memory",
    ]);

    match args.command {
        Command::Invalidate(invalidate) => {
            assert_eq!(invalidate.entity, EntityKind::Item);
            assert_eq!(invalidate.organization, Some(org));
            assert_eq!(
                invalidate.overrides.cache_backend.as_deref(),
                Some("memory")
            );
        }
        other => panic!("expected invalidate command, got {other:?}"),
    }
}

#[test]
fn parse_role_and_migrate_arguments() {
    let user = uuid::Uuid::new_v4();
    let user_arg = user.to_string();
    let args = CliArgs::parse_from(["menu-cache", "role", user_arg.as_str()]);
    assert!(matches!(args.command, Command::Role(RoleArgs { user_id, .. }) if user_id == user));

    let args = CliArgs::parse_from([
        "menu-cache",
        "migrate",
        "--database-url",
        "postgres://example",
    ]);
    match args.command {
        Command::Migrate(migrate) => assert_eq!(
            migrate.database.database_url.as_deref(),
            Some("postgres://example")
        ),
        other => panic!("expected migrate command, got {other:?}"),
    }
}

#[test]
fn invalidate_accepts_collection_name() {
    let args = CliArgs::parse_from(["menu-cache", "invalidate", "--entity", "tables"]);
    match args.command {
        Command::Invalidate(invalidate) => assert_eq!(invalidate.entity, EntityKind::Table),
        other => panic!("expected invalidate command, got {other:?}"),
    }
}

#[test]
fn unknown_entity_argument_fails_to_parse() {
    let result = CliArgs::try_parse_from(["menu-cache", "invalidate", "--entity", "favorite"]);
    assert!(result.is_err());
}
