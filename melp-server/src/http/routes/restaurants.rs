//! Restaurant endpoints

use std::sync::Arc;

use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use melp_core::{NewRestaurant, RadiusQuery, RadiusStats, Restaurant, RestaurantPatch};
use serde::Serialize;

use crate::http::error::ApiError;
use crate::http::extractors::{ApiJson, ValidQuery, ValidUuid};
use crate::http::server::AppState;
use crate::service::RestaurantService;

/// Acknowledgement body for writes that return no record
#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub data: &'static str,
}

/// Bulk create response
#[derive(Debug, Serialize)]
pub struct BulkCreateResponse {
    pub data: &'static str,
    pub created: u64,
}

/// GET /restaurants - list every restaurant
async fn list_restaurants(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<Restaurant>>, ApiError> {
    let restaurants = RestaurantService::new(&state.pool).list().await?;
    Ok(Json(restaurants))
}

/// POST /restaurants - create one restaurant
async fn create_restaurant(
    State(state): State<Arc<AppState>>,
    ApiJson(new): ApiJson<NewRestaurant>,
) -> Result<(StatusCode, Json<Restaurant>), ApiError> {
    let restaurant = RestaurantService::new(&state.pool).create(new).await?;
    Ok((StatusCode::CREATED, Json(restaurant)))
}

/// POST /restaurants/bulk_create - create many restaurants atomically
async fn bulk_create_restaurants(
    State(state): State<Arc<AppState>>,
    ApiJson(rows): ApiJson<Vec<NewRestaurant>>,
) -> Result<(StatusCode, Json<BulkCreateResponse>), ApiError> {
    let created = RestaurantService::new(&state.pool).bulk_create(rows).await?;
    Ok((
        StatusCode::CREATED,
        Json(BulkCreateResponse {
            data: "Restaurants created successfully",
            created,
        }),
    ))
}

/// GET /restaurants/statistics?latitude=..&longitude=..&radius=..
///
/// `radius` is in meters (EPSG:3857).
async fn restaurant_statistics(
    State(state): State<Arc<AppState>>,
    ValidQuery(query): ValidQuery<RadiusQuery>,
) -> Result<Json<RadiusStats>, ApiError> {
    let stats = RestaurantService::new(&state.pool).statistics(query).await?;
    Ok(Json(stats))
}

/// GET /restaurants/{id}
async fn get_restaurant(
    State(state): State<Arc<AppState>>,
    ValidUuid(id): ValidUuid,
) -> Result<Json<Restaurant>, ApiError> {
    let restaurant = RestaurantService::new(&state.pool).get(id).await?;
    Ok(Json(restaurant))
}

/// PUT|PATCH /restaurants/{id} - partial update, absent fields untouched
async fn update_restaurant(
    State(state): State<Arc<AppState>>,
    ValidUuid(id): ValidUuid,
    ApiJson(patch): ApiJson<RestaurantPatch>,
) -> Result<Json<Restaurant>, ApiError> {
    let restaurant = RestaurantService::new(&state.pool).update(id, patch).await?;
    Ok(Json(restaurant))
}

/// DELETE /restaurants/{id}
async fn delete_restaurant(
    State(state): State<Arc<AppState>>,
    ValidUuid(id): ValidUuid,
) -> Result<Json<MessageResponse>, ApiError> {
    RestaurantService::new(&state.pool).delete(id).await?;
    Ok(Json(MessageResponse {
        data: "Restaurant deleted successfully",
    }))
}

/// Restaurant routes
pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/restaurants", get(list_restaurants).post(create_restaurant))
        .route("/restaurants/bulk_create", post(bulk_create_restaurants))
        .route("/restaurants/statistics", get(restaurant_statistics))
        .route(
            "/restaurants/{id}",
            get(get_restaurant)
                .put(update_restaurant)
                .patch(update_restaurant)
                .delete(delete_restaurant),
        )
}
