//! Repository implementations for database access
//!
//! Repositories borrow the pool, log store failures once with operation
//! context, and return `DbError` instead of raw sqlx errors.

pub mod restaurants;

pub use restaurants::RestaurantRepo;
