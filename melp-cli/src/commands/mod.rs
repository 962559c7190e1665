//! Command implementations for the melp CLI

pub mod import;
pub mod migrate;
pub mod serve;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use melp_core::ServiceConfig;
use melp_server::db::migrations;
use sqlx::PgPool;

pub use import::{run_import, ImportArgs};
pub use migrate::{run_migrate, MigrateArgs};
pub use serve::{run_serve, ServeArgs};

/// Options shared by every command that touches the database
#[derive(Args, Debug, Clone)]
pub struct ConfigArgs {
    /// TOML configuration file (defaults plus environment when omitted)
    #[arg(long, short = 'c', env = "MELP_CONFIG", value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Database URL (overrides config file and DATABASE_* parts)
    #[arg(long, value_name = "URL")]
    pub database_url: Option<String>,
}

impl ConfigArgs {
    /// Resolve configuration: file, then environment, then flags.
    pub fn load(&self) -> Result<ServiceConfig> {
        let mut config = ServiceConfig::load(self.config.as_deref())
            .context("Failed to load configuration")?;
        if let Some(url) = &self.database_url {
            config.database.url = Some(url.clone());
        }
        Ok(config)
    }
}

/// Connect and bring the schema up to date.
pub(crate) async fn connect(config: &ServiceConfig) -> Result<PgPool> {
    let pool = melp_server::create_pool(&config.database)
        .await
        .context("Failed to create database pool")?;
    migrations::run(&pool)
        .await
        .context("Failed to run migrations")?;
    Ok(pool)
}
