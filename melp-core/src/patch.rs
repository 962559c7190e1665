//! Partial updates with presence tracking
//!
//! A JSON update body may leave a key out, send it as `null`, or send a
//! value. Those are three different requests, so every patchable field is a
//! [`Patch`] instead of an `Option`.

use serde::{Deserialize, Deserializer};

use crate::geo::{validate_lat, validate_lng};
use crate::restaurant::{validate_email, validate_rating, Restaurant};
use crate::validation::{require_text, ValidationError};

/// Restaurant fields a patch may touch, in column order.
pub const MUTABLE_FIELDS: [&str; 10] = [
    "rating", "name", "site", "email", "phone", "street", "city", "state", "lat", "lng",
];

/// Presence-tracked field value
#[derive(Debug, Clone, PartialEq)]
pub enum Patch<T> {
    /// Key not present in the payload
    Absent,
    /// Key present with an explicit `null`
    Null,
    /// Key present with a value
    Value(T),
}

impl<T> Default for Patch<T> {
    fn default() -> Self {
        Self::Absent
    }
}

impl<T> Patch<T> {
    pub fn is_absent(&self) -> bool {
        matches!(self, Self::Absent)
    }

    /// View the value of a NOT NULL column: absent is fine, null is not.
    pub fn required(&self, field: &'static str) -> Result<Option<&T>, ValidationError> {
        match self {
            Self::Absent => Ok(None),
            Self::Null => Err(ValidationError::Null { field }),
            Self::Value(v) => Ok(Some(v)),
        }
    }
}

// Only called when the key is present; missing keys fall back to
// `Default` through `#[serde(default)]`.
impl<'de, T> Deserialize<'de> for Patch<T>
where
    T: Deserialize<'de>,
{
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(match Option::<T>::deserialize(deserializer)? {
            Some(value) => Self::Value(value),
            None => Self::Null,
        })
    }
}

/// Update payload for a restaurant.
///
/// `id`, `created_at` and `updated_at` are not patchable; such keys in the
/// payload are ignored.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct RestaurantPatch {
    pub rating: Patch<i32>,
    pub name: Patch<String>,
    pub site: Patch<String>,
    pub email: Patch<String>,
    pub phone: Patch<String>,
    pub street: Patch<String>,
    pub city: Patch<String>,
    pub state: Patch<String>,
    pub lat: Patch<f64>,
    pub lng: Patch<f64>,
}

impl RestaurantPatch {
    /// True if the payload provided no field at all.
    pub fn is_empty(&self) -> bool {
        self.provided_fields().is_empty()
    }

    /// Names of the fields present in the payload, in column order.
    pub fn provided_fields(&self) -> Vec<&'static str> {
        let present = [
            !self.rating.is_absent(),
            !self.name.is_absent(),
            !self.site.is_absent(),
            !self.email.is_absent(),
            !self.phone.is_absent(),
            !self.street.is_absent(),
            !self.city.is_absent(),
            !self.state.is_absent(),
            !self.lat.is_absent(),
            !self.lng.is_absent(),
        ];
        MUTABLE_FIELDS
            .iter()
            .zip(present)
            .filter_map(|(field, present)| present.then_some(*field))
            .collect()
    }

    /// Check provided values with the creation rules. Nulls are rejected
    /// because every restaurant column is NOT NULL.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if let Some(rating) = self.rating.required("rating")? {
            validate_rating(*rating)?;
        }
        for (field, value) in self.text_fields() {
            if let Some(text) = value.required(field)? {
                require_text(field, text)?;
            }
        }
        if let Some(email) = self.email.required("email")? {
            validate_email(email)?;
        }
        if let Some(lat) = self.lat.required("lat")? {
            validate_lat("lat", *lat)?;
        }
        if let Some(lng) = self.lng.required("lng")? {
            validate_lng("lng", *lng)?;
        }
        Ok(())
    }

    /// Merge into `current`, overwriting exactly the provided fields.
    ///
    /// Validation runs first, so on error `current` is untouched. Returns
    /// the names of the overwritten fields.
    pub fn apply(self, current: &mut Restaurant) -> Result<Vec<&'static str>, ValidationError> {
        self.validate()?;

        let mut applied = Vec::new();
        merge("rating", self.rating, &mut current.rating, &mut applied);
        merge("name", self.name, &mut current.name, &mut applied);
        merge("site", self.site, &mut current.site, &mut applied);
        merge("email", self.email, &mut current.email, &mut applied);
        merge("phone", self.phone, &mut current.phone, &mut applied);
        merge("street", self.street, &mut current.street, &mut applied);
        merge("city", self.city, &mut current.city, &mut applied);
        merge("state", self.state, &mut current.state, &mut applied);
        merge("lat", self.lat, &mut current.lat, &mut applied);
        merge("lng", self.lng, &mut current.lng, &mut applied);
        Ok(applied)
    }

    fn text_fields(&self) -> [(&'static str, &Patch<String>); 6] {
        [
            ("name", &self.name),
            ("site", &self.site),
            ("phone", &self.phone),
            ("street", &self.street),
            ("city", &self.city),
            ("state", &self.state),
        ]
    }
}

fn merge<T>(field: &'static str, patch: Patch<T>, slot: &mut T, applied: &mut Vec<&'static str>) {
    if let Patch::Value(value) = patch {
        *slot = value;
        applied.push(field);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use uuid::Uuid;

    use crate::restaurant::tests::sample;

    fn stored() -> Restaurant {
        let new = sample();
        Restaurant {
            id: Uuid::new_v4(),
            rating: 3,
            name: "A".into(),
            site: new.site,
            email: new.email,
            phone: new.phone,
            street: new.street,
            city: new.city,
            state: new.state,
            lat: new.lat,
            lng: new.lng,
            created_at: Utc::now(),
            updated_at: None,
        }
    }

    #[test]
    fn deserialize_tracks_presence() {
        let patch: RestaurantPatch =
            serde_json::from_str(r#"{"rating": 4, "name": null}"#).unwrap();
        assert_eq!(patch.rating, Patch::Value(4));
        assert_eq!(patch.name, Patch::Null);
        assert_eq!(patch.site, Patch::Absent);
        assert_eq!(patch.provided_fields(), vec!["rating", "name"]);
    }

    #[test]
    fn empty_body_is_empty_patch() {
        let patch: RestaurantPatch = serde_json::from_str("{}").unwrap();
        assert!(patch.is_empty());
        assert_eq!(patch, RestaurantPatch::default());
    }

    #[test]
    fn immutable_keys_are_ignored() {
        let patch: RestaurantPatch = serde_json::from_str(
            r#"{"id": "not-a-uuid", "created_at": "2020-01-01T00:00:00Z", "city": "Lima"}"#,
        )
        .unwrap();
        assert_eq!(patch.provided_fields(), vec!["city"]);
    }

    #[test]
    fn apply_preserves_untouched_fields() {
        let before = stored();
        let mut after = before.clone();
        let patch = RestaurantPatch {
            rating: Patch::Value(4),
            ..Default::default()
        };

        let applied = patch.apply(&mut after).unwrap();

        assert_eq!(applied, vec!["rating"]);
        assert_eq!(after.rating, 4);
        assert_eq!(Restaurant { rating: 3, ..after }, before);
    }

    #[test]
    fn apply_overwrites_every_provided_field() {
        let mut current = stored();
        let patch: RestaurantPatch = serde_json::from_str(
            r#"{"name": "B", "email": "b@b.io", "lat": 1.0, "lng": 2.0}"#,
        )
        .unwrap();

        let applied = patch.apply(&mut current).unwrap();

        assert_eq!(applied, vec!["name", "email", "lat", "lng"]);
        assert_eq!(current.name, "B");
        assert_eq!(current.email, "b@b.io");
        assert_eq!((current.lat, current.lng), (1.0, 2.0));
        assert_eq!(current.rating, 3);
    }

    #[test]
    fn null_is_rejected_without_touching_record() {
        let before = stored();
        let mut current = before.clone();
        let patch: RestaurantPatch =
            serde_json::from_str(r#"{"rating": 1, "phone": null}"#).unwrap();

        let err = patch.apply(&mut current).unwrap_err();

        assert_eq!(err, ValidationError::Null { field: "phone" });
        assert_eq!(current, before);
    }

    #[test]
    fn invalid_values_are_rejected() {
        let cases = [
            r#"{"rating": 7}"#,
            r#"{"email": "nope"}"#,
            r#"{"city": ""}"#,
            r#"{"lat": 89.9}"#,
            r#"{"lng": 181}"#,
        ];
        for body in cases {
            let patch: RestaurantPatch = serde_json::from_str(body).unwrap();
            assert!(patch.validate().is_err(), "{body} should be rejected");
        }
    }

    #[test]
    fn wrong_types_fail_deserialization() {
        assert!(serde_json::from_str::<RestaurantPatch>(r#"{"rating": "four"}"#).is_err());
    }
}
