use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueHint, builder::BoolishValueParser};
use uuid::Uuid;

use crate::domain::types::EntityKind;

/// Command-line arguments for the menu-cache binary.
#[derive(Debug, Parser)]
#[command(
    name = "menu-cache",
    version,
    about = "Cache-aside maintenance for the menu backend"
)]
pub struct CliArgs {
    /// Optional path to a configuration file.
    #[arg(
        long = "config-file",
        env = "MENU_CACHE_CONFIG_FILE",
        value_name = "PATH",
        value_hint = ValueHint::FilePath
    )]
    pub config_file: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand, Clone)]
pub enum Command {
    /// Ping the cache store and the database.
    Check(RuntimeArgs),
    /// Apply pending database migrations.
    Migrate(MigrateArgs),
    /// Purge every cached entry of one entity kind.
    Invalidate(InvalidateArgs),
    /// Resolve a user's role through the role cache.
    Role(RoleArgs),
}

#[derive(Debug, Args, Default, Clone)]
pub struct DatabaseOverride {
    /// Override the database connection URL.
    #[arg(long = "database-url", value_name = "URL", value_hint = ValueHint::Url)]
    pub database_url: Option<String>,
}

#[derive(Debug, Args, Default, Clone)]
pub struct RuntimeOverrides {
    #[command(flatten)]
    pub database: DatabaseOverride,

    /// Override the base log level (trace|debug|info|warn|error).
    #[arg(long = "log-level", value_name = "LEVEL")]
    pub log_level: Option<String>,

    /// Toggle JSON logging.
    #[arg(
        long = "log-json",
        value_name = "BOOL",
        value_parser = BoolishValueParser::new()
    )]
    pub log_json: Option<bool>,

    /// Override the Redis connection URL.
    #[arg(long = "redis-url", value_name = "URL", value_hint = ValueHint::Url)]
    pub redis_url: Option<String>,

    /// Enable or disable the cache.
    #[arg(
        long = "cache-enabled",
        value_name = "BOOL",
        value_parser = BoolishValueParser::new()
    )]
    pub cache_enabled: Option<bool>,

    /// Override the cache backend (redis|memory).
    #[arg(long = "cache-backend", value_name = "BACKEND")]
    pub cache_backend: Option<String>,
}

#[derive(Debug, Args, Default, Clone)]
pub struct RuntimeArgs {
    #[command(flatten)]
    pub overrides: RuntimeOverrides,
}

#[derive(Debug, Args, Default, Clone)]
pub struct MigrateArgs {
    #[command(flatten)]
    pub database: DatabaseOverride,
}

#[derive(Debug, Args, Clone)]
pub struct InvalidateArgs {
    #[command(flatten)]
    pub overrides: RuntimeOverrides,

    /// Entity kind to purge: singular, plural or table name
    /// (e.g. `item`, `tables`, `dining_tables`).
    #[arg(long, value_name = "KIND")]
    pub entity: EntityKind,

    /// Restrict the purge of organization-scoped kinds to one organization.
    #[arg(long, value_name = "UUID")]
    pub organization: Option<Uuid>,
}

#[derive(Debug, Args, Clone)]
pub struct RoleArgs {
    #[command(flatten)]
    pub overrides: RuntimeOverrides,

    /// User whose role to resolve.
    #[arg(value_name = "USER_ID")]
    pub user_id: Uuid,
}
