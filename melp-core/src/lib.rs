//! melp-core: restaurant domain model
//!
//! Everything here is store-agnostic: validated input shapes, the
//! partial-update merger, Web Mercator helpers used by the radius search,
//! and the service configuration.

pub mod config;
pub mod geo;
pub mod patch;
pub mod restaurant;
pub mod validation;

pub use config::{ConfigError, DatabaseConfig, ServiceConfig};
pub use geo::{Coordinates, RadiusQuery, RadiusStats};
pub use patch::{Patch, RestaurantPatch};
pub use restaurant::{NewRestaurant, Restaurant, MAX_RATING, MIN_RATING};
pub use validation::ValidationError;
