//! melp-server: restaurant records over PostgreSQL/PostGIS
//!
//! Layers, outermost first:
//! - `http`: axum routes, extractors and JSON error mapping
//! - `service`: validation, not-found detection and update merging
//! - `db`: connection pool, migrations and the restaurant repository

pub mod db;
pub mod http;
pub mod service;

pub use db::{create_pool, DbError, RestaurantRepo};
pub use http::{build_router, run_server, AppState};
pub use service::{ErrorKind, RestaurantService, ServiceError};
