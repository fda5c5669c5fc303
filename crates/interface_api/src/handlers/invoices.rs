//! Invoice and payment handlers

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use uuid::Uuid;
use validator::Validate;

use core_kernel::InvoiceId;

use crate::dto::invoice::*;
use crate::{error::ApiError, AppState};

/// Issues a one-time draft invoice
pub async fn create_invoice(
    State(state): State<AppState>,
    Json(request): Json<CreateInvoiceRequest>,
) -> Result<(StatusCode, Json<InvoiceResponse>), ApiError> {
    request.validate()?;
    let currency = state.service.general_settings().get().await.currency;
    let invoice = state
        .service
        .create_invoice(request.into_command(currency))
        .await?;
    Ok((StatusCode::CREATED, Json(invoice.into())))
}

/// Lists invoices, optionally filtered by `?status=`
pub async fn list_invoices(
    State(state): State<AppState>,
    Query(query): Query<InvoiceListQuery>,
) -> Result<Json<Vec<InvoiceResponse>>, ApiError> {
    let invoices = match query.status {
        Some(status) => state.service.list_invoices_by_status(status).await?,
        None => state.service.list_invoices().await?,
    };
    Ok(Json(invoices.into_iter().map(Into::into).collect()))
}

pub async fn get_invoice(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<InvoiceResponse>, ApiError> {
    let invoice = state.service.get_invoice(InvoiceId::from_uuid(id)).await?;
    Ok(Json(invoice.into()))
}

/// Moves a draft invoice to sent
pub async fn send_invoice(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<InvoiceResponse>, ApiError> {
    let invoice = state.service.mark_sent(InvoiceId::from_uuid(id)).await?;
    Ok(Json(invoice.into()))
}

/// Records a payment in the invoice's currency
pub async fn record_payment(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<RecordPaymentRequest>,
) -> Result<(StatusCode, Json<PaymentResponse>), ApiError> {
    request.validate()?;
    let invoice_id = InvoiceId::from_uuid(id);
    let invoice = state.service.get_invoice(invoice_id).await?;
    let payment = state
        .service
        .record_payment(request.into_command(invoice_id, invoice.currency()))
        .await?;
    Ok((StatusCode::CREATED, Json(payment.into())))
}

pub async fn list_payments(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Vec<PaymentResponse>>, ApiError> {
    let payments = state.service.list_payments(InvoiceId::from_uuid(id)).await?;
    Ok(Json(payments.into_iter().map(Into::into).collect()))
}

/// Marks sent invoices past their due date as overdue
pub async fn refresh_overdue(
    State(state): State<AppState>,
) -> Result<Json<OverdueRefreshResponse>, ApiError> {
    let updated = state.service.refresh_overdue().await?;
    Ok(Json(OverdueRefreshResponse { updated }))
}
