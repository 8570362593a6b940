use std::{process, sync::Arc};

use menu_cache::{
    application::{
        catalog::{MenuServices, Stores},
        error::{AppError, ErrorReport},
    },
    cache::{CacheConfig, CacheStore, MemoryCacheStore},
    config::{self, CacheBackend, Command, Settings},
    domain::types::Scope,
    infra::{
        db::PostgresStores, error::InfraError, memory::MemoryStores, redis::RedisCacheStore,
        telemetry,
    },
};
use tracing::{Dispatch, Level, dispatcher, error, info, warn};
use tracing_subscriber::fmt as tracing_fmt;

#[tokio::main]
async fn main() {
    if let Err(error) = run().await {
        report_application_error(&error);
        process::exit(1);
    }
}

fn report_application_error(error: &AppError) {
    let report = ErrorReport::from_error("menu-cache", error).render();
    if dispatcher::has_been_set() {
        error!(error = %report, "application error");
        return;
    }

    let subscriber = tracing_fmt().with_max_level(Level::ERROR).finish();
    let dispatch = Dispatch::new(subscriber);
    dispatcher::with_default(&dispatch, || {
        error!(error = %report, "application error");
    });
}

async fn run() -> Result<(), AppError> {
    let (cli_args, settings) = config::load_with_cli()
        .map_err(|err| AppError::unexpected(format!("failed to load configuration: {err}")))?;

    telemetry::init(&settings.logging).map_err(AppError::from)?;

    match cli_args.command {
        Command::Check(_) => run_check(&settings).await,
        Command::Migrate(_) => run_migrate(&settings).await,
        Command::Invalidate(args) => {
            let services = build_services(&settings).await?;
            let scope = args.organization.map_or(Scope::Global, Scope::Organization);
            let purged = services.invalidate(args.entity, scope).await?;
            info!(entity = %args.entity, ?scope, purged, "Cache namespace invalidated");
            Ok(())
        }
        Command::Role(args) => {
            let services = build_services(&settings).await?;
            let role = services.authz.role_for(args.user_id).await?;
            println!("{role}");
            Ok(())
        }
    }
}

async fn run_check(settings: &Settings) -> Result<(), AppError> {
    if settings.cache.enabled && settings.cache.backend == CacheBackend::Redis {
        let redis = RedisCacheStore::connect(&settings.redis.url, settings.cache.key_prefix.clone())
            .await?;
        redis.ping().await?;
        info!("Redis reachable");
    } else {
        info!(enabled = settings.cache.enabled, backend = ?settings.cache.backend, "Skipping redis check");
    }

    let url = database_url(settings)?;
    let pool = PostgresStores::connect(url, settings.database.max_connections.get())
        .await
        .map_err(|err| InfraError::database(err.to_string()))?;
    PostgresStores::new(pool)
        .health_check()
        .await
        .map_err(|err| InfraError::database(err.to_string()))?;
    info!("Database reachable");
    Ok(())
}

async fn run_migrate(settings: &Settings) -> Result<(), AppError> {
    let url = database_url(settings)?;
    let pool = PostgresStores::connect(url, settings.database.max_connections.get())
        .await
        .map_err(|err| InfraError::database(err.to_string()))?;
    PostgresStores::run_migrations(&pool)
        .await
        .map_err(|err| InfraError::database(format!("failed to run migrations: {err}")))?;
    info!("Migrations applied");
    Ok(())
}

async fn build_services(settings: &Settings) -> Result<MenuServices, AppError> {
    let stores = init_stores(settings)?;
    let cache_store = build_cache_store(settings).await?;
    let config = CacheConfig::from(&settings.cache);
    Ok(MenuServices::new(stores, cache_store, &config))
}

fn init_stores(settings: &Settings) -> Result<Stores, AppError> {
    match settings.database.url.as_deref() {
        Some(url) => {
            let pool = PostgresStores::connect_lazy(url, settings.database.max_connections.get())
                .map_err(|err| InfraError::database(err.to_string()))?;
            Ok(PostgresStores::new(pool).stores())
        }
        None if settings.cache.backend == CacheBackend::Memory => {
            warn!("Database url is not configured; using empty in-memory stores");
            Ok(MemoryStores::new().stores())
        }
        None => Err(InfraError::configuration("database url is not configured").into()),
    }
}

async fn build_cache_store(settings: &Settings) -> Result<Arc<dyn CacheStore>, AppError> {
    if !settings.cache.enabled {
        return Ok(Arc::new(MemoryCacheStore::new()));
    }
    match settings.cache.backend {
        CacheBackend::Redis => {
            let store =
                RedisCacheStore::connect(&settings.redis.url, settings.cache.key_prefix.clone())
                    .await?;
            Ok(Arc::new(store))
        }
        CacheBackend::Memory => Ok(Arc::new(MemoryCacheStore::new())),
    }
}

fn database_url(settings: &Settings) -> Result<&str, AppError> {
    settings
        .database
        .url
        .as_deref()
        .ok_or_else(|| InfraError::configuration("database url is not configured").into())
}
