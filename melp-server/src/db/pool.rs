//! Database connection pool management
//!
//! Uses sqlx PgPool with explicit connection limits taken from
//! [`DatabaseConfig`].

use melp_core::DatabaseConfig;
use sqlx::postgres::{PgConnectOptions, PgPoolOptions};
use sqlx::PgPool;

/// Create a PostgreSQL connection pool.
///
/// # Errors
///
/// Returns an error if the URL is malformed or the first connection fails.
///
/// # Example
///
/// ```ignore
/// let config = ServiceConfig::load(None)?;
/// let pool = create_pool(&config.database).await?;
/// ```
pub async fn create_pool(config: &DatabaseConfig) -> Result<PgPool, sqlx::Error> {
    let options = connect_options(config)?;
    PgPoolOptions::new()
        .max_connections(config.max_connections)
        .connect_with(options)
        .await
}

/// Build connect options from an explicit URL, or from the individual
/// parts when no URL is configured.
pub fn connect_options(config: &DatabaseConfig) -> Result<PgConnectOptions, sqlx::Error> {
    match &config.url {
        Some(url) => url.parse(),
        None => Ok(PgConnectOptions::new()
            .host(&config.host)
            .port(config.port)
            .username(&config.user)
            .password(&config.password)
            .database(&config.name)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn options_from_parts() {
        let config = DatabaseConfig {
            host: "db.internal".to_string(),
            port: 6543,
            user: "melp".to_string(),
            name: "restaurants".to_string(),
            ..Default::default()
        };
        let options = connect_options(&config).unwrap();
        assert_eq!(options.get_host(), "db.internal");
        assert_eq!(options.get_port(), 6543);
        assert_eq!(options.get_username(), "melp");
        assert_eq!(options.get_database(), Some("restaurants"));
    }

    #[test]
    fn url_wins_over_parts() {
        let config = DatabaseConfig {
            url: Some("postgres://alice:pw@example.org:5433/melp_test".to_string()),
            host: "ignored".to_string(),
            ..Default::default()
        };
        let options = connect_options(&config).unwrap();
        assert_eq!(options.get_host(), "example.org");
        assert_eq!(options.get_port(), 5433);
        assert_eq!(options.get_database(), Some("melp_test"));
    }

    #[test]
    fn malformed_url_is_error() {
        let config = DatabaseConfig {
            url: Some("not a url".to_string()),
            ..Default::default()
        };
        assert!(connect_options(&config).is_err());
    }

    // Integration tests require a real database
    // Run with: DATABASE_URL=postgres://... cargo test -p melp-server -- --ignored

    #[tokio::test]
    #[ignore = "requires database"]
    async fn pool_acquires_connection() {
        let config = DatabaseConfig {
            url: Some(std::env::var("DATABASE_URL").expect("DATABASE_URL required")),
            ..Default::default()
        };
        let pool = create_pool(&config).await.expect("pool creation failed");

        let result: (i32,) = sqlx::query_as("SELECT 1")
            .fetch_one(&pool)
            .await
            .expect("query failed");

        assert_eq!(result.0, 1);
    }
}
