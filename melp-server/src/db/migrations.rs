//! Schema migrations for the restaurants table
//!
//! Idempotent: every statement uses `IF NOT EXISTS`, so this runs on each
//! startup.

use melp_core::restaurant::EMAIL_PATTERN;
use melp_core::{MAX_RATING, MIN_RATING};
use sqlx::PgPool;

use super::repos::restaurants::PROJECTED_POSITION;
use super::DbError;

const OPERATION: &str = "run migrations";

/// Run all migrations
pub async fn run(pool: &PgPool) -> Result<(), DbError> {
    tracing::info!("Running restaurant migrations...");

    for statement in statements() {
        sqlx::query(&statement)
            .execute(pool)
            .await
            .map_err(|e| DbError::data_source(OPERATION, None, e))?;
    }

    tracing::info!("Migrations complete");
    Ok(())
}

fn statements() -> Vec<String> {
    vec![
        "CREATE EXTENSION IF NOT EXISTS postgis".to_string(),
        format!(
            r#"
            CREATE TABLE IF NOT EXISTS restaurants (
                id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
                rating INTEGER NOT NULL,
                name TEXT NOT NULL,
                site TEXT NOT NULL,
                email TEXT NOT NULL,
                phone TEXT NOT NULL,
                street TEXT NOT NULL,
                city TEXT NOT NULL,
                state TEXT NOT NULL,
                lat DOUBLE PRECISION NOT NULL,
                lng DOUBLE PRECISION NOT NULL,
                created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
                updated_at TIMESTAMPTZ,
                CONSTRAINT valid_email CHECK (email ~* '{email}'),
                CONSTRAINT valid_rating CHECK (rating BETWEEN {min} AND {max})
            )
            "#,
            email = EMAIL_PATTERN,
            min = MIN_RATING,
            max = MAX_RATING,
        ),
        // Same expression the radius query filters on, so ST_DWithin can use it
        format!(
            "CREATE INDEX IF NOT EXISTS restaurants_position_3857_idx \
             ON restaurants USING GIST (({}))",
            PROJECTED_POSITION
        ),
    ]
}
