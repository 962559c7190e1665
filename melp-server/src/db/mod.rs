//! Database layer - connection pool, migrations and repositories
//!
//! - One shared `PgPool`; no connection is held across requests
//! - Every write runs in its own transaction, rolled back on failure
//! - Store failures are logged once here and surface as `DbError`

pub mod error;
pub mod migrations;
pub mod pool;
pub mod repos;

pub use error::DbError;
pub use pool::{connect_options, create_pool};
pub use repos::RestaurantRepo;
