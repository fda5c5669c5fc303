//! Client handlers

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use uuid::Uuid;
use validator::Validate;

use core_kernel::ClientId;

use crate::dto::client::*;
use crate::{error::ApiError, AppState};

/// Creates a client
pub async fn create_client(
    State(state): State<AppState>,
    Json(request): Json<CreateClientRequest>,
) -> Result<(StatusCode, Json<ClientResponse>), ApiError> {
    request.validate()?;
    let client = state.service.create_client(request.into()).await?;
    Ok((StatusCode::CREATED, Json(client.into())))
}

/// Lists clients, oldest first
pub async fn list_clients(
    State(state): State<AppState>,
) -> Result<Json<Vec<ClientResponse>>, ApiError> {
    let clients = state.service.list_clients().await?;
    Ok(Json(clients.into_iter().map(Into::into).collect()))
}

pub async fn get_client(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ClientResponse>, ApiError> {
    let client = state.service.get_client(ClientId::from_uuid(id)).await?;
    Ok(Json(client.into()))
}

pub async fn update_client(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<UpdateClientRequest>,
) -> Result<Json<ClientResponse>, ApiError> {
    request.validate()?;
    let client = state
        .service
        .update_client(ClientId::from_uuid(id), request.into())
        .await?;
    Ok(Json(client.into()))
}

/// Deactivates a client; its invoices are kept
pub async fn deactivate_client(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ClientResponse>, ApiError> {
    let client = state.service.deactivate_client(ClientId::from_uuid(id)).await?;
    Ok(Json(client.into()))
}
