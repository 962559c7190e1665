//! melp CLI - restaurant records service
//!
//! - `serve`: run the HTTP API
//! - `migrate`: create the PostGIS schema
//! - `import`: bulk-load restaurants from a JSON file

use anyhow::{anyhow, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod commands;

use commands::{ImportArgs, MigrateArgs, ServeArgs};

#[derive(Parser, Debug)]
#[command(
    name = "melp",
    author,
    version,
    about = "Restaurant records with radius rating statistics over PostGIS"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the HTTP server
    Serve(ServeArgs),
    /// Create the restaurants table, PostGIS extension and spatial index
    Migrate(MigrateArgs),
    /// Bulk-create restaurants from a JSON array file
    Import(ImportArgs),
}

fn init_tracing() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .compact()
        .try_init()
        .map_err(|err| anyhow!(err))
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    init_tracing().ok();
    let cli = Cli::parse();

    match cli.command {
        Commands::Serve(args) => commands::run_serve(args).await?,
        Commands::Migrate(args) => commands::run_migrate(args).await?,
        Commands::Import(args) => commands::run_import(args).await?,
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_serve_flags() {
        let cli = Cli::try_parse_from([
            "melp",
            "serve",
            "--bind",
            "0.0.0.0:9000",
            "--cors-permissive",
        ])
        .unwrap();
        match cli.command {
            Commands::Serve(args) => {
                assert_eq!(args.bind, Some("0.0.0.0:9000".parse().unwrap()));
                assert!(args.cors_permissive);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn import_requires_file() {
        assert!(Cli::try_parse_from(["melp", "import"]).is_err());
    }
}
