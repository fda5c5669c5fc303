//! Recurring template handlers

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use uuid::Uuid;
use validator::Validate;

use core_kernel::TemplateId;

use crate::dto::template::*;
use crate::{error::ApiError, AppState};

/// Creates a template in the configured currency
pub async fn create_template(
    State(state): State<AppState>,
    Json(request): Json<CreateTemplateRequest>,
) -> Result<(StatusCode, Json<TemplateResponse>), ApiError> {
    request.validate()?;
    let general = state.service.general_settings().get().await;
    let template = state
        .service
        .create_template(request.into_new_template(general.currency, general.default_payment_terms))
        .await?;
    Ok((StatusCode::CREATED, Json(template.into())))
}

pub async fn list_templates(
    State(state): State<AppState>,
) -> Result<Json<Vec<TemplateResponse>>, ApiError> {
    let templates = state.service.list_templates().await?;
    Ok(Json(templates.into_iter().map(Into::into).collect()))
}

pub async fn get_template(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<TemplateResponse>, ApiError> {
    let template = state.service.get_template(TemplateId::from_uuid(id)).await?;
    Ok(Json(template.into()))
}

/// Edits a template; amounts keep the template's currency
pub async fn update_template(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<UpdateTemplateRequest>,
) -> Result<Json<TemplateResponse>, ApiError> {
    request.validate_all()?;
    let id = TemplateId::from_uuid(id);
    let current = state.service.get_template(id).await?;
    let template = state
        .service
        .update_template(id, request.into_patch(current.amount.currency()))
        .await?;
    Ok(Json(template.into()))
}

/// Pauses or resumes a template
pub async fn set_template_active(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<SetActiveRequest>,
) -> Result<Json<TemplateResponse>, ApiError> {
    let template = state
        .service
        .set_template_active(TemplateId::from_uuid(id), request.is_active)
        .await?;
    Ok(Json(template.into()))
}
