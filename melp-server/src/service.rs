//! Restaurant use-case service.
//!
//! # Responsibility
//! - Validate input before any store access.
//! - Detect missing records and short-circuit with `NotFound`.
//! - Merge partial updates onto the stored record before persisting.
//!
//! # Invariants
//! - Every public method returns `Result<_, ServiceError>`; nothing panics.
//! - Store failures were already logged by the repository and are not
//!   logged again here.

use melp_core::{NewRestaurant, RadiusQuery, RadiusStats, Restaurant, RestaurantPatch, ValidationError};
use sqlx::PgPool;
use uuid::Uuid;

use crate::db::{DbError, RestaurantRepo};

/// Coarse error classification, enough to pick a transport status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    NotFound,
    Validation,
    DataSource,
    Internal,
}

/// Service error for restaurant use-cases.
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    /// Target restaurant does not exist.
    #[error("restaurant '{id}' not found")]
    NotFound { id: String },

    /// Input rejected before reaching the store.
    #[error("{0}")]
    Validation(#[from] ValidationError),

    /// Persistence-layer failure.
    #[error(transparent)]
    DataSource(DbError),

    /// Internal consistency mismatch.
    #[error("internal error: {message}")]
    Internal { message: String },
}

impl ServiceError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::NotFound { .. } => ErrorKind::NotFound,
            Self::Validation(_) => ErrorKind::Validation,
            Self::DataSource(_) => ErrorKind::DataSource,
            Self::Internal { .. } => ErrorKind::Internal,
        }
    }
}

impl From<DbError> for ServiceError {
    fn from(value: DbError) -> Self {
        match value {
            DbError::NotFound { id, .. } => Self::NotFound { id },
            other => Self::DataSource(other),
        }
    }
}

pub type ServiceResult<T> = Result<T, ServiceError>;

/// Restaurant service facade over the repository.
pub struct RestaurantService<'a> {
    repo: RestaurantRepo<'a>,
}

impl<'a> RestaurantService<'a> {
    pub fn new(pool: &'a PgPool) -> Self {
        Self {
            repo: RestaurantRepo::new(pool),
        }
    }

    pub async fn get(&self, id: Uuid) -> ServiceResult<Restaurant> {
        Ok(self.repo.get(id).await?)
    }

    pub async fn list(&self) -> ServiceResult<Vec<Restaurant>> {
        Ok(self.repo.list().await?)
    }

    pub async fn create(&self, new: NewRestaurant) -> ServiceResult<Restaurant> {
        new.validate()?;
        let restaurant = self.repo.create(&new).await?;
        tracing::info!(id = %restaurant.id, "restaurant created");
        Ok(restaurant)
    }

    /// Validate every row, then insert all of them in one transaction.
    /// Returns the number of rows created; an empty batch creates nothing.
    pub async fn bulk_create(&self, rows: Vec<NewRestaurant>) -> ServiceResult<u64> {
        for (index, row) in rows.iter().enumerate() {
            row.validate().map_err(|e| e.at_row(index))?;
        }

        let inserted = self.repo.bulk_create(&rows).await?;
        if inserted != rows.len() as u64 {
            tracing::error!(expected = rows.len(), inserted, "bulk insert row count mismatch");
            return Err(ServiceError::Internal {
                message: format!("expected {} inserted rows, store reported {}", rows.len(), inserted),
            });
        }

        tracing::info!(count = inserted, "restaurants bulk created");
        Ok(inserted)
    }

    /// Apply a partial update. Fields absent from `patch` keep their stored
    /// value; a patch with no fields returns the record unchanged without
    /// writing.
    pub async fn update(&self, id: Uuid, patch: RestaurantPatch) -> ServiceResult<Restaurant> {
        let mut restaurant = self.repo.get(id).await?;
        if patch.is_empty() {
            return Ok(restaurant);
        }

        let applied = patch.apply(&mut restaurant)?;
        tracing::debug!(%id, fields = ?applied, "merging restaurant update");

        Ok(self.repo.update(&restaurant).await?)
    }

    pub async fn delete(&self, id: Uuid) -> ServiceResult<()> {
        let restaurant = self.repo.get(id).await?;
        self.repo.delete(&restaurant).await?;
        tracing::info!(%id, "restaurant deleted");
        Ok(())
    }

    /// Rating statistics for restaurants within `query.radius` meters
    /// (EPSG:3857) of the query point.
    pub async fn statistics(&self, query: RadiusQuery) -> ServiceResult<RadiusStats> {
        let (origin, radius) = query.validate()?;
        Ok(self.repo.count_nearby(origin, radius).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlx::postgres::{PgConnectOptions, PgPoolOptions};
    use std::time::Duration;

    /// A pool that never connects; anything reaching the store fails fast.
    fn unreachable_pool() -> PgPool {
        PgPoolOptions::new()
            .acquire_timeout(Duration::from_millis(200))
            .connect_lazy_with(PgConnectOptions::new().host("127.0.0.1").port(1))
    }

    fn valid() -> NewRestaurant {
        NewRestaurant {
            rating: 1,
            name: "Cafe".into(),
            site: "https://cafe.example".into(),
            email: "info@cafe.example".into(),
            phone: "555".into(),
            street: "1 Road".into(),
            city: "Lima".into(),
            state: "Lima".into(),
            lat: -12.0464,
            lng: -77.0428,
        }
    }

    #[test]
    fn db_not_found_maps_to_not_found() {
        let err: ServiceError = DbError::NotFound {
            resource: "restaurant",
            id: "abc".into(),
        }
        .into();
        assert_eq!(err.kind(), ErrorKind::NotFound);
        assert_eq!(err.to_string(), "restaurant 'abc' not found");
    }

    #[test]
    fn db_failure_maps_to_data_source() {
        let err: ServiceError = DbError::DataSource {
            operation: "list restaurants",
            source: sqlx::Error::PoolTimedOut,
        }
        .into();
        assert_eq!(err.kind(), ErrorKind::DataSource);
    }

    #[tokio::test]
    async fn create_validates_before_store() {
        let pool = unreachable_pool();
        let service = RestaurantService::new(&pool);
        let bad = NewRestaurant {
            email: "not-an-email".into(),
            ..valid()
        };

        let err = service.create(bad).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
    }

    #[tokio::test]
    async fn bulk_create_accepts_empty_batch() {
        // Never touches the store, so the unreachable pool is fine.
        let pool = unreachable_pool();
        let created = RestaurantService::new(&pool)
            .bulk_create(vec![])
            .await
            .unwrap();
        assert_eq!(created, 0);
    }

    #[tokio::test]
    async fn bulk_create_reports_offending_row() {
        let pool = unreachable_pool();
        let rows = vec![valid(), valid(), NewRestaurant { rating: 9, ..valid() }];

        let err = RestaurantService::new(&pool)
            .bulk_create(rows)
            .await
            .unwrap_err();

        match err {
            ServiceError::Validation(ValidationError::Row { index, source }) => {
                assert_eq!(index, 2);
                assert!(matches!(*source, ValidationError::OutOfRange { field: "rating", .. }));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn statistics_validates_before_store() {
        let pool = unreachable_pool();
        let query = RadiusQuery {
            latitude: 40.0,
            longitude: -74.0,
            radius: f64::NAN,
        };
        let err = RestaurantService::new(&pool)
            .statistics(query)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
    }

    #[tokio::test]
    async fn unreachable_store_is_data_source_error() {
        let pool = unreachable_pool();
        let err = RestaurantService::new(&pool).list().await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::DataSource);
    }
}
