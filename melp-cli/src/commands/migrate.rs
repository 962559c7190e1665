//! Schema migration command

use anyhow::Result;
use clap::Parser;

use super::{connect, ConfigArgs};

/// Arguments for the migrate command
#[derive(Parser, Debug)]
pub struct MigrateArgs {
    #[command(flatten)]
    pub config: ConfigArgs,
}

pub async fn run_migrate(args: MigrateArgs) -> Result<()> {
    let config = args.config.load()?;
    let pool = connect(&config).await?;
    pool.close().await;
    println!("Schema is up to date");
    Ok(())
}
