//! Bulk import command
//!
//! Reads a JSON array of restaurants and creates them in one transaction:
//! every row is validated first, and nothing is written if any row fails.

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::Parser;
use melp_core::NewRestaurant;
use melp_server::{ErrorKind, RestaurantService};

use super::{connect, ConfigArgs};

/// Arguments for the import command
#[derive(Parser, Debug)]
pub struct ImportArgs {
    /// JSON file holding an array of restaurants
    #[arg(value_name = "FILE")]
    pub file: PathBuf,

    #[command(flatten)]
    pub config: ConfigArgs,
}

pub async fn run_import(args: ImportArgs) -> Result<()> {
    let content = tokio::fs::read_to_string(&args.file)
        .await
        .with_context(|| format!("Failed to read {}", args.file.display()))?;
    let rows = parse_restaurants(&content)
        .with_context(|| format!("Failed to parse {}", args.file.display()))?;

    let config = args.config.load()?;
    let pool = connect(&config).await?;

    let result = RestaurantService::new(&pool).bulk_create(rows).await;
    pool.close().await;

    match result {
        Ok(created) => {
            println!("Imported {} restaurants", created);
            Ok(())
        }
        Err(e) if e.kind() == ErrorKind::Validation => {
            bail!("{} rejected, nothing imported: {}", args.file.display(), e)
        }
        Err(e) => Err(e).context("Import failed, nothing imported"),
    }
}

fn parse_restaurants(content: &str) -> Result<Vec<NewRestaurant>> {
    let rows: Vec<NewRestaurant> =
        serde_json::from_str(content).context("expected a JSON array of restaurants")?;
    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const ROW: &str = r#"{
        "rating": 2, "name": "Taqueria", "site": "https://taq.example",
        "email": "hola@taq.example", "phone": "555-0101", "street": "5 Calle",
        "city": "Oaxaca", "state": "OAX", "lat": 17.0732, "lng": -96.7266
    }"#;

    #[test]
    fn parses_array_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "[{ROW}, {ROW}]").unwrap();

        let content = std::fs::read_to_string(file.path()).unwrap();
        let rows = parse_restaurants(&content).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].city, "Oaxaca");
    }

    #[test]
    fn single_object_is_rejected() {
        assert!(parse_restaurants(ROW).is_err());
    }

    #[test]
    fn missing_field_is_rejected() {
        assert!(parse_restaurants(r#"[{"rating": 1}]"#).is_err());
    }
}
