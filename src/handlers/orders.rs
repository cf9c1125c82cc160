// src/handlers/orders.rs

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::{
    common::{db_utils::get_tenant_connection, error::AppError},
    config::AppState,
    middleware::{auth::AuthenticatedUser, tenancy::TenantContext},
    models::{
        documents::{GatewaySettlement, OnlineOrder, OnlineOrderItem, OrderType, PaymentDecision},
        sales::{PaymentMethod, Sale},
    },
    services::document_service::DocumentLine,
};

use super::quotations::DocumentLinePayload;

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateOrderPayload {
    pub order_type: OrderType,

    #[validate(length(min = 1, message = "El nombre del cliente es obligatorio."))]
    pub customer_name: String,

    #[validate(email(message = "El correo electrónico no es válido."))]
    pub customer_email: Option<String>,

    pub customer_phone: Option<String>,

    #[validate(length(min = 1, message = "El pedido necesita al menos un renglón."))]
    pub items: Vec<DocumentLinePayload>,
}

// La decisión de pago más, si aplica, la liquidación de la pasarela
#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SettleOrderPayload {
    pub payment_method: PaymentMethod,
    pub due_date: Option<DateTime<Utc>>,
    pub settlement: Option<GatewaySettlement>,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct OrderResponse {
    #[serde(flatten)]
    pub order: OnlineOrder,
    pub items: Vec<OnlineOrderItem>,
}

#[utoipa::path(
    post,
    path = "/api/orders",
    request_body = CreateOrderPayload,
    responses(
        (status = 201, description = "Pedido registrado", body = OrderResponse),
        (status = 404, description = "Producto no encontrado"),
    ),
    security(("api_jwt" = [])),
    tag = "Documents"
)]
pub async fn create_order(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
    tenant: TenantContext,
    Json(payload): Json<CreateOrderPayload>,
) -> Result<(StatusCode, Json<OrderResponse>), AppError> {
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

    let (order, items) = app_state
        .document_service
        .create_order(
            &mut *conn,
            tenant.0,
            payload.order_type,
            &payload.customer_name,
            payload.customer_email.as_deref(),
            payload.customer_phone.as_deref(),
            &lines,
        )
        .await?;

    Ok((StatusCode::CREATED, Json(OrderResponse { order, items })))
}

#[utoipa::path(
    post,
    path = "/api/orders/{id}/settle",
    params(("id" = Uuid, Path, description = "ID del pedido")),
    request_body = SettleOrderPayload,
    responses(
        (status = 201, description = "Pedido convertido a venta", body = Sale),
        (status = 409, description = "Ya convertido, tipo no soportado, pago rechazado o sin stock"),
        (status = 404, description = "Pedido no encontrado"),
    ),
    security(("api_jwt" = [])),
    tag = "Documents"
)]
pub async fn settle_order(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
    tenant: TenantContext,
    Path(order_id): Path<Uuid>,
    Json(payload): Json<SettleOrderPayload>,
) -> Result<(StatusCode, Json<Sale>), AppError> {
    let decision = PaymentDecision {
        payment_method: payload.payment_method,
        due_date: payload.due_date,
    };

    let mut conn = get_tenant_connection(&app_state, &tenant, &user).await?;

    let sale = app_state
        .fulfillment_service
        .convert_online_order(
            &mut *conn,
            tenant.0,
            order_id,
            &decision,
            payload.settlement.as_ref(),
        )
        .await?;

    Ok((StatusCode::CREATED, Json(sale)))
}
