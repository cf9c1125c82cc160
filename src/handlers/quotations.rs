// src/handlers/quotations.rs

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::{
    common::{db_utils::get_tenant_connection, error::AppError},
    config::AppState,
    middleware::{auth::AuthenticatedUser, tenancy::TenantContext},
    models::{
        documents::{PaymentDecision, Quotation, QuotationItem},
        sales::Sale,
    },
    services::document_service::DocumentLine,
};

// Serialize es obligatorio: validator serializa el campo al armar los
// parámetros del error de `length`.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DocumentLinePayload {
    pub product_id: Uuid,
    pub quantity: Decimal,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateQuotationPayload {
    pub customer_id: Option<Uuid>,

    #[validate(length(min = 1, message = "La cotización necesita al menos un renglón."))]
    pub items: Vec<DocumentLinePayload>,

    // Sin fecha: vigencia por omisión (15 días)
    pub valid_until: Option<DateTime<Utc>>,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct QuotationResponse {
    #[serde(flatten)]
    pub quotation: Quotation,
    pub items: Vec<QuotationItem>,
}

#[utoipa::path(
    post,
    path = "/api/quotations",
    request_body = CreateQuotationPayload,
    responses(
        (status = 201, description = "Cotización creada", body = QuotationResponse),
        (status = 404, description = "Producto o cliente no encontrado"),
    ),
    security(("api_jwt" = [])),
    tag = "Documents"
)]
pub async fn create_quotation(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
    tenant: TenantContext,
    Json(payload): Json<CreateQuotationPayload>,
) -> Result<(StatusCode, Json<QuotationResponse>), AppError> {
    payload.validate().map_err(AppError::ValidationError)?;

    let lines: Vec<DocumentLine> = payload
        .items
        .iter()
        .map(|i| DocumentLine {
            product_id: i.product_id,
            quantity: i.quantity,
        })
        .collect();

    let mut conn = get_tenant_connection(&app_state, &tenant, &user).await?;

    let (quotation, items) = app_state
        .document_service
        .create_quotation(
            &mut *conn,
            tenant.0,
            payload.customer_id,
            &lines,
            payload.valid_until,
        )
        .await?;

    Ok((StatusCode::CREATED, Json(QuotationResponse { quotation, items })))
}

#[utoipa::path(
    post,
    path = "/api/quotations/{id}/convert",
    params(("id" = Uuid, Path, description = "ID de la cotización")),
    request_body = PaymentDecision,
    responses(
        (status = 201, description = "Venta creada", body = Sale),
        (status = 409, description = "Ya convertida, vencida o sin stock"),
        (status = 404, description = "Cotización no encontrada"),
    ),
    security(("api_jwt" = [])),
    tag = "Documents"
)]
pub async fn convert_quotation(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
    tenant: TenantContext,
    Path(quotation_id): Path<Uuid>,
    Json(decision): Json<PaymentDecision>,
) -> Result<(StatusCode, Json<Sale>), AppError> {
    let mut conn = get_tenant_connection(&app_state, &tenant, &user).await?;

    let sale = app_state
        .fulfillment_service
        .convert_quotation(&mut *conn, tenant.0, quotation_id, &decision)
        .await?;

    Ok((StatusCode::CREATED, Json(sale)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn una_cotizacion_sin_renglones_no_pasa_la_validacion() {
        let payload = CreateQuotationPayload {
            customer_id: None,
            items: vec![],
            valid_until: None,
        };
        let err = payload.validate().unwrap_err();
        assert!(err.field_errors().contains_key("items"));
    }

    #[test]
    fn una_cotizacion_con_renglones_pasa_la_validacion() {
        let payload = CreateQuotationPayload {
            customer_id: None,
            items: vec![DocumentLinePayload {
                product_id: Uuid::new_v4(),
                quantity: Decimal::ONE,
            }],
            valid_until: None,
        };
        assert!(payload.validate().is_ok());
    }
}
