//! Restaurant repository
//!
//! Sole owner of access to the `restaurants` table:
//! - reads are single statements on the pool
//! - writes each run in one transaction, committed on success and
//!   rolled back on any failure
//! - the radius search reprojects into EPSG:3857 inside PostGIS

use chrono::{DateTime, Utc};
use melp_core::{Coordinates, NewRestaurant, RadiusStats, Restaurant};
use once_cell::sync::Lazy;
use sqlx::{FromRow, PgConnection, PgPool, Postgres, QueryBuilder, Transaction};
use uuid::Uuid;

use crate::db::DbError;

/// A stored point projected to Web Mercator. Shared with the GiST index
/// created by the migrations; the two must stay identical.
pub const PROJECTED_POSITION: &str = "ST_Transform(ST_SetSRID(ST_MakePoint(lng, lat), 4326), 3857)";

/// Rows per multi-row INSERT; 11 binds per row keeps this well under the
/// 65535 bind-parameter limit.
const BULK_CHUNK_ROWS: usize = 1_000;

const RETURNING: &str =
    "id, rating, name, site, email, phone, street, city, state, lat, lng, created_at, updated_at";

static SELECT_ONE: Lazy<String> =
    Lazy::new(|| format!("SELECT {RETURNING} FROM restaurants WHERE id = $1"));

static SELECT_ALL: Lazy<String> =
    Lazy::new(|| format!("SELECT {RETURNING} FROM restaurants ORDER BY created_at, id"));

static INSERT_ONE: Lazy<String> = Lazy::new(|| {
    format!(
        r#"
        INSERT INTO restaurants (rating, name, site, email, phone, street, city, state, lat, lng)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
        RETURNING {RETURNING}
        "#
    )
});

static UPDATE_ONE: Lazy<String> = Lazy::new(|| {
    format!(
        r#"
        UPDATE restaurants
        SET rating = $2, name = $3, site = $4, email = $5, phone = $6,
            street = $7, city = $8, state = $9, lat = $10, lng = $11,
            updated_at = NOW()
        WHERE id = $1
        RETURNING {RETURNING}
        "#
    )
});

// $1 = lng, $2 = lat, $3 = radius in projected meters.
// AVG/STDDEV of an integer column are NUMERIC; cast so they decode as f64.
static COUNT_NEARBY: Lazy<String> = Lazy::new(|| {
    format!(
        r#"
        SELECT
            COUNT(id) AS count,
            AVG(rating)::float8 AS avg,
            STDDEV(rating)::float8 AS std
        FROM restaurants
        WHERE ST_DWithin(
            {PROJECTED_POSITION},
            ST_Transform(ST_SetSRID(ST_MakePoint($1, $2), 4326), 3857),
            $3
        )
        "#
    )
});

/// Restaurant record from database
#[derive(Debug, Clone, FromRow)]
struct RestaurantRow {
    id: Uuid,
    rating: i32,
    name: String,
    site: String,
    email: String,
    phone: String,
    street: String,
    city: String,
    state: String,
    lat: f64,
    lng: f64,
    created_at: DateTime<Utc>,
    updated_at: Option<DateTime<Utc>>,
}

impl From<RestaurantRow> for Restaurant {
    fn from(r: RestaurantRow) -> Self {
        Self {
            id: r.id,
            rating: r.rating,
            name: r.name,
            site: r.site,
            email: r.email,
            phone: r.phone,
            street: r.street,
            city: r.city,
            state: r.state,
            lat: r.lat,
            lng: r.lng,
            created_at: r.created_at,
            updated_at: r.updated_at,
        }
    }
}

/// Aggregate row of the radius query
#[derive(Debug, FromRow)]
struct NearbyRow {
    count: i64,
    avg: Option<f64>,
    std: Option<f64>,
}

/// Restaurant repository
pub struct RestaurantRepo<'a> {
    pool: &'a PgPool,
}

impl<'a> RestaurantRepo<'a> {
    pub fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Get a single restaurant by id.
    pub async fn get(&self, id: Uuid) -> Result<Restaurant, DbError> {
        let row: Option<RestaurantRow> = sqlx::query_as(SELECT_ONE.as_str())
            .bind(id)
            .fetch_optional(self.pool)
            .await
            .map_err(|e| DbError::data_source("fetch restaurant", Some(id), e))?;

        row.map(Restaurant::from)
            .ok_or_else(|| DbError::restaurant_not_found(id))
    }

    /// List every restaurant, oldest first. Unpaginated.
    pub async fn list(&self) -> Result<Vec<Restaurant>, DbError> {
        let rows: Vec<RestaurantRow> = sqlx::query_as(SELECT_ALL.as_str())
            .fetch_all(self.pool)
            .await
            .map_err(|e| DbError::data_source("list restaurants", None, e))?;

        Ok(rows.into_iter().map(Restaurant::from).collect())
    }

    /// Insert one restaurant. `id` and `created_at` are assigned by the store.
    pub async fn create(&self, new: &NewRestaurant) -> Result<Restaurant, DbError> {
        const OP: &str = "create restaurant";
        let mut tx = self.begin(OP, None).await?;

        let result = sqlx::query_as::<_, RestaurantRow>(INSERT_ONE.as_str())
            .bind(new.rating)
            .bind(&new.name)
            .bind(&new.site)
            .bind(&new.email)
            .bind(&new.phone)
            .bind(&new.street)
            .bind(&new.city)
            .bind(&new.state)
            .bind(new.lat)
            .bind(new.lng)
            .fetch_one(&mut *tx)
            .await
            .map(Restaurant::from)
            .map_err(|e| DbError::data_source(OP, None, e));

        finish(tx, result, OP, None).await
    }

    /// Insert many restaurants atomically: either every row persists or
    /// none does. Returns the number of rows inserted.
    pub async fn bulk_create(&self, rows: &[NewRestaurant]) -> Result<u64, DbError> {
        const OP: &str = "bulk create restaurants";
        if rows.is_empty() {
            return Ok(0);
        }

        let mut tx = self.begin(OP, None).await?;
        let result = insert_chunks(&mut tx, rows).await;
        finish(tx, result, OP, None).await
    }

    /// Persist a fully merged restaurant and stamp `updated_at`.
    ///
    /// Returns `NotFound` if the row disappeared since it was read.
    pub async fn update(&self, restaurant: &Restaurant) -> Result<Restaurant, DbError> {
        const OP: &str = "update restaurant";
        let id = restaurant.id;
        let mut tx = self.begin(OP, Some(id)).await?;

        let result = sqlx::query_as::<_, RestaurantRow>(UPDATE_ONE.as_str())
            .bind(id)
            .bind(restaurant.rating)
            .bind(&restaurant.name)
            .bind(&restaurant.site)
            .bind(&restaurant.email)
            .bind(&restaurant.phone)
            .bind(&restaurant.street)
            .bind(&restaurant.city)
            .bind(&restaurant.state)
            .bind(restaurant.lat)
            .bind(restaurant.lng)
            .fetch_optional(&mut *tx)
            .await
            .map_err(|e| DbError::data_source(OP, Some(id), e))
            .and_then(|row| {
                row.map(Restaurant::from)
                    .ok_or_else(|| DbError::restaurant_not_found(id))
            });

        finish(tx, result, OP, Some(id)).await
    }

    /// Delete a restaurant previously read from the store.
    pub async fn delete(&self, restaurant: &Restaurant) -> Result<(), DbError> {
        const OP: &str = "delete restaurant";
        let id = restaurant.id;
        let mut tx = self.begin(OP, Some(id)).await?;

        let result = sqlx::query("DELETE FROM restaurants WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await
            .map_err(|e| DbError::data_source(OP, Some(id), e))
            .and_then(|done| match done.rows_affected() {
                0 => Err(DbError::restaurant_not_found(id)),
                _ => Ok(()),
            });

        finish(tx, result, OP, Some(id)).await
    }

    /// Count restaurants within `radius_m` of `origin`, with the mean and
    /// sample standard deviation of their ratings.
    ///
    /// Both the stored points and the origin are reprojected to EPSG:3857
    /// before measuring, so `radius_m` is in Web Mercator meters. An empty
    /// match yields all-zero statistics.
    pub async fn count_nearby(&self, origin: Coordinates, radius_m: f64) -> Result<RadiusStats, DbError> {
        let row: NearbyRow = sqlx::query_as(COUNT_NEARBY.as_str())
            .bind(origin.lng)
            .bind(origin.lat)
            .bind(radius_m)
            .fetch_one(self.pool)
            .await
            .map_err(|e| DbError::data_source("count restaurants within radius", None, e))?;

        Ok(RadiusStats::from_aggregates(row.count, row.avg, row.std))
    }

    async fn begin(&self, operation: &'static str, id: Option<Uuid>) -> Result<Transaction<'static, Postgres>, DbError> {
        self.pool
            .begin()
            .await
            .map_err(|e| DbError::data_source(operation, id, e))
    }
}

async fn insert_chunks(conn: &mut PgConnection, rows: &[NewRestaurant]) -> Result<u64, DbError> {
    let mut inserted = 0;
    for chunk in rows.chunks(BULK_CHUNK_ROWS) {
        let mut builder: QueryBuilder<Postgres> = QueryBuilder::new(
            "INSERT INTO restaurants (rating, name, site, email, phone, street, city, state, lat, lng) ",
        );
        builder.push_values(chunk, |mut b, r| {
            b.push_bind(r.rating)
                .push_bind(r.name.as_str())
                .push_bind(r.site.as_str())
                .push_bind(r.email.as_str())
                .push_bind(r.phone.as_str())
                .push_bind(r.street.as_str())
                .push_bind(r.city.as_str())
                .push_bind(r.state.as_str())
                .push_bind(r.lat)
                .push_bind(r.lng);
        });

        let done = builder
            .build()
            .execute(&mut *conn)
            .await
            .map_err(|e| DbError::data_source("bulk create restaurants", None, e))?;
        inserted += done.rows_affected();
    }
    Ok(inserted)
}

/// Commit on success, roll back on failure. The connection goes back to
/// the pool either way.
async fn finish<T>(
    tx: Transaction<'_, Postgres>,
    result: Result<T, DbError>,
    operation: &'static str,
    id: Option<Uuid>,
) -> Result<T, DbError> {
    match result {
        Ok(value) => {
            tx.commit()
                .await
                .map_err(|e| DbError::data_source(operation, id, e))?;
            Ok(value)
        }
        Err(err) => {
            if let Err(e) = tx.rollback().await {
                tracing::warn!(operation, id = ?id, error = %e, "rollback failed");
            }
            Err(err)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nearby_query_reprojects_both_points() {
        let sql = COUNT_NEARBY.as_str();
        assert_eq!(sql.matches("3857").count(), 2);
        assert!(sql.contains("ST_DWithin"));
        assert!(sql.contains(PROJECTED_POSITION));
    }

    #[test]
    fn statements_return_every_column() {
        for sql in [INSERT_ONE.as_str(), UPDATE_ONE.as_str()] {
            assert!(sql.contains(RETURNING));
        }
        assert!(UPDATE_ONE.contains("updated_at = NOW()"));
    }
}
