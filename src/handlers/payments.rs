// src/handlers/payments.rs

use axum::{Json, extract::State, http::StatusCode};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::{Validate, ValidationError};

use crate::{
    common::{db_utils::get_tenant_connection, error::AppError},
    config::AppState,
    middleware::{auth::AuthenticatedUser, tenancy::TenantContext},
    models::{
        crm::{Customer, CustomerPayment},
        sales::{PaymentMethod, Sale},
    },
};

fn validate_positive(val: &Decimal) -> Result<(), ValidationError> {
    if *val <= Decimal::ZERO {
        let mut err = ValidationError::new("range");
        err.message = Some("El monto debe ser mayor a cero.".into());
        return Err(err);
    }
    Ok(())
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreatePaymentPayload {
    pub customer_id: Uuid,

    #[validate(custom(function = "validate_positive"))]
    pub amount: Decimal,

    pub payment_method: PaymentMethod,

    // None = abono al saldo general del cliente
    pub sale_id: Option<Uuid>,

    pub reference: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PaymentResponse {
    pub payment: CustomerPayment,
    pub sale: Option<Sale>,
    pub customer: Customer,
}

#[utoipa::path(
    post,
    path = "/api/payments",
    request_body = CreatePaymentPayload,
    responses(
        (status = 201, description = "Pago aplicado", body = PaymentResponse),
        (status = 409, description = "El monto excede el saldo de la venta"),
        (status = 404, description = "Cliente o venta no encontrados"),
    ),
    security(("api_jwt" = [])),
    tag = "Payments"
)]
pub async fn create_payment(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
    tenant: TenantContext,
    Json(payload): Json<CreatePaymentPayload>,
) -> Result<(StatusCode, Json<PaymentResponse>), AppError> {
    payload.validate().map_err(AppError::ValidationError)?;

    let mut conn = get_tenant_connection(&app_state, &tenant, &user).await?;

    let outcome = app_state
        .payment_service
        .apply_payment(
            &mut *conn,
            tenant.0,
            payload.customer_id,
            payload.amount,
            payload.payment_method,
            payload.sale_id,
            payload.reference.as_deref(),
        )
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(PaymentResponse {
            payment: outcome.payment,
            sale: outcome.sale,
            customer: outcome.customer,
        }),
    ))
}
