//! Restaurant records and creation input

use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use regex::{Regex, RegexBuilder};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::geo::{validate_lat, validate_lng, Coordinates};
use crate::validation::{require_range, require_text, ValidationError};

/// Lowest allowed rating
pub const MIN_RATING: i32 = 0;

/// Highest allowed rating
pub const MAX_RATING: i32 = 4;

/// Email pattern, applied case-insensitively over ASCII only, the way
/// PostgreSQL's `~*` in the `valid_email` CHECK constraint applies it.
pub const EMAIL_PATTERN: &str = r"^[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Z|a-z]{2,}$";

static EMAIL_RE: Lazy<Regex> = Lazy::new(|| {
    RegexBuilder::new(EMAIL_PATTERN)
        .case_insensitive(true)
        .unicode(false)
        .build()
        .expect("invalid email regex")
});

/// A persisted restaurant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Restaurant {
    pub id: Uuid,
    pub rating: i32,
    pub name: String,
    pub site: String,
    pub email: String,
    pub phone: String,
    pub street: String,
    pub city: String,
    pub state: String,
    pub lat: f64,
    pub lng: f64,
    pub created_at: DateTime<Utc>,
    /// `None` until the first update
    pub updated_at: Option<DateTime<Utc>>,
}

impl Restaurant {
    pub fn coordinates(&self) -> Coordinates {
        Coordinates {
            lat: self.lat,
            lng: self.lng,
        }
    }
}

/// Input for creating a restaurant. Every field is required.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewRestaurant {
    pub rating: i32,
    pub name: String,
    pub site: String,
    pub email: String,
    pub phone: String,
    pub street: String,
    pub city: String,
    pub state: String,
    pub lat: f64,
    pub lng: f64,
}

impl NewRestaurant {
    /// Check every field against the restaurant rules.
    ///
    /// # Example
    /// ```
    /// use melp_core::NewRestaurant;
    ///
    /// let mut r = NewRestaurant {
    ///     rating: 3,
    ///     name: "Taqueria".into(),
    ///     site: "https://taqueria.example".into(),
    ///     email: "hola@taqueria.example".into(),
    ///     phone: "555-0100".into(),
    ///     street: "1 Main St".into(),
    ///     city: "Austin".into(),
    ///     state: "TX".into(),
    ///     lat: 30.2672,
    ///     lng: -97.7431,
    /// };
    /// assert!(r.validate().is_ok());
    ///
    /// r.rating = 5;
    /// assert!(r.validate().is_err());
    /// ```
    pub fn validate(&self) -> Result<(), ValidationError> {
        validate_rating(self.rating)?;
        require_text("name", &self.name)?;
        require_text("site", &self.site)?;
        validate_email(&self.email)?;
        require_text("phone", &self.phone)?;
        require_text("street", &self.street)?;
        require_text("city", &self.city)?;
        require_text("state", &self.state)?;
        validate_lat("lat", self.lat)?;
        validate_lng("lng", self.lng)?;
        Ok(())
    }
}

pub fn validate_rating(rating: i32) -> Result<(), ValidationError> {
    require_range(
        "rating",
        f64::from(rating),
        f64::from(MIN_RATING),
        f64::from(MAX_RATING),
    )
}

pub fn validate_email(email: &str) -> Result<(), ValidationError> {
    require_text("email", email)?;
    if !EMAIL_RE.is_match(email) {
        return Err(ValidationError::InvalidFormat {
            field: "email",
            reason: "must be a valid email address",
        });
    }
    Ok(())
}
