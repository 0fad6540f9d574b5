use axum::{
    extract::{Query, State},
    Json,
};

use crate::api::errors::ApiError;
use crate::api::middleware::auth::JwtAuth;
use crate::api::pagination::PageParams;
use crate::api::AppState;
use crate::domain::reference::{Country, Language, Unit};

/// List countries
///
/// GET /api/countries
pub async fn list_countries(
    JwtAuth(_caller_id): JwtAuth,
    State(state): State<AppState>,
    Query(params): Query<PageParams>,
) -> Result<Json<Vec<Country>>, ApiError> {
    let countries = state
        .reference
        .list_countries(params.limit(), params.offset())
        .await?;
    Ok(Json(countries))
}

/// List languages
///
/// GET /api/languages
pub async fn list_languages(
    JwtAuth(_caller_id): JwtAuth,
    State(state): State<AppState>,
    Query(params): Query<PageParams>,
) -> Result<Json<Vec<Language>>, ApiError> {
    let languages = state
        .reference
        .list_languages(params.limit(), params.offset())
        .await?;
    Ok(Json(languages))
}

/// List units of measure
///
/// GET /api/units
pub async fn list_units(
    JwtAuth(_caller_id): JwtAuth,
    State(state): State<AppState>,
    Query(params): Query<PageParams>,
) -> Result<Json<Vec<Unit>>, ApiError> {
    let units = state
        .reference
        .list_units(params.limit(), params.offset())
        .await?;
    Ok(Json(units))
}
