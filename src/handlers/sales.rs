// src/handlers/sales.rs

use axum::{
    Json,
    extract::{Path, State},
};
use rust_decimal::Decimal;
use serde::Deserialize;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::{
    common::{db_utils::get_tenant_connection, error::AppError},
    config::AppState,
    middleware::{auth::AuthenticatedUser, tenancy::TenantContext},
    models::sales::{CancellationType, SaleCancellation, SaleDetail},
    services::cancellation_service::RestockItem,
};

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RestockItemPayload {
    pub product_id: Uuid,
    pub quantity: Decimal,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CancelSalePayload {
    pub cancellation_type: CancellationType,

    #[validate(length(min = 1, message = "La razón de la cancelación es obligatoria."))]
    pub reason: String,

    #[serde(default)]
    pub refund_amount: Decimal,

    // Solo para cancelaciones parciales: qué renglones regresan al stock
    pub restock_items: Option<Vec<RestockItemPayload>>,
}

#[utoipa::path(
    get,
    path = "/api/sales/{id}",
    params(("id" = Uuid, Path, description = "ID de la venta")),
    responses(
        (status = 200, description = "Detalle de la venta", body = SaleDetail),
        (status = 404, description = "Venta no encontrada"),
    ),
    security(("api_jwt" = [])),
    tag = "Sales"
)]
pub async fn get_sale(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
    tenant: TenantContext,
    Path(sale_id): Path<Uuid>,
) -> Result<Json<SaleDetail>, AppError> {
    let mut conn = get_tenant_connection(&app_state, &tenant, &user).await?;

    let sale = app_state
        .sale_repo
        .get_by_id(&mut *conn, tenant.0, sale_id)
        .await?
        .ok_or(AppError::NotFound)?;

    let items = app_state.sale_repo.get_items(&mut *conn, sale_id).await?;

    Ok(Json(SaleDetail { sale, items }))
}

#[utoipa::path(
    post,
    path = "/api/sales/{id}/cancel",
    params(("id" = Uuid, Path, description = "ID de la venta")),
    request_body = CancelSalePayload,
    responses(
        (status = 200, description = "Venta cancelada", body = SaleCancellation),
        (status = 409, description = "La venta ya estaba cancelada"),
        (status = 400, description = "Monto de reembolso inválido"),
        (status = 404, description = "Venta no encontrada"),
    ),
    security(("api_jwt" = [])),
    tag = "Sales"
)]
pub async fn cancel_sale(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
    tenant: TenantContext,
    Path(sale_id): Path<Uuid>,
    Json(payload): Json<CancelSalePayload>,
) -> Result<Json<SaleCancellation>, AppError> {
    payload.validate().map_err(AppError::ValidationError)?;

    let restock: Option<Vec<RestockItem>> = payload.restock_items.as_ref().map(|items| {
        items
            .iter()
            .map(|i| RestockItem {
                product_id: i.product_id,
                quantity: i.quantity,
            })
            .collect()
    });

    let mut conn = get_tenant_connection(&app_state, &tenant, &user).await?;

    let cancellation = app_state
        .cancellation_service
        .cancel_sale(
            &mut *conn,
            tenant.0,
            sale_id,
            payload.cancellation_type,
            &payload.reason,
            payload.refund_amount,
            restock.as_deref(),
        )
        .await?;

    Ok(Json(cancellation))
}
