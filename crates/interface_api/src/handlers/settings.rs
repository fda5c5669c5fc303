//! Settings handlers

use axum::{
    extract::{Path, State},
    Json,
};
use validator::Validate;

use domain_billing::{DocumentType, GeneralSettings, NumberingSettings};

use crate::dto::settings::*;
use crate::{error::ApiError, AppState};

fn document_type(raw: &str) -> Result<DocumentType, ApiError> {
    raw.parse()
        .map_err(|_| ApiError::NotFound(format!("Unknown document type: {raw}")))
}

pub async fn get_numbering(
    State(state): State<AppState>,
    Path(raw): Path<String>,
) -> Result<Json<NumberingSettings>, ApiError> {
    let document_type = document_type(&raw)?;
    Ok(Json(state.service.numbering().get(document_type).await))
}

pub async fn put_numbering(
    State(state): State<AppState>,
    Path(raw): Path<String>,
    Json(request): Json<NumberingSettingsRequest>,
) -> Result<Json<NumberingSettings>, ApiError> {
    let document_type = document_type(&raw)?;
    request.validate()?;
    let settings: NumberingSettings = request.into();
    state
        .service
        .numbering()
        .set(document_type, settings.clone())
        .await?;
    Ok(Json(settings))
}

/// Previews the number the next document of this type would get
pub async fn preview_next_number(
    State(state): State<AppState>,
    Path(raw): Path<String>,
) -> Result<Json<NextNumberResponse>, ApiError> {
    let document_type = document_type(&raw)?;
    let next_number = state.service.numbers().next_for(document_type).await?;
    Ok(Json(NextNumberResponse {
        document_type,
        next_number,
    }))
}

pub async fn get_general(State(state): State<AppState>) -> Json<GeneralSettings> {
    Json(state.service.general_settings().get().await)
}

pub async fn put_general(
    State(state): State<AppState>,
    Json(settings): Json<GeneralSettings>,
) -> Result<Json<GeneralSettings>, ApiError> {
    state.service.general_settings().set(settings.clone()).await?;
    Ok(Json(settings))
}
