// src/handlers/customers.rs

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use rust_decimal::Decimal;
use serde::Deserialize;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::{Validate, ValidationError};

use crate::{
    common::{db_utils::get_tenant_connection, error::AppError},
    config::AppState,
    middleware::{auth::AuthenticatedUser, tenancy::TenantContext},
    models::{
        crm::{Customer, CustomerPayment},
        sales::Sale,
    },
};

fn validate_not_negative(val: &Decimal) -> Result<(), ValidationError> {
    if val.is_sign_negative() {
        let mut err = ValidationError::new("range");
        err.message = Some("El límite de crédito no puede ser negativo.".into());
        return Err(err);
    }
    Ok(())
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateCustomerPayload {
    #[validate(length(min = 1, message = "El nombre es obligatorio."))]
    pub name: String,

    #[validate(email(message = "El correo electrónico no es válido."))]
    pub email: Option<String>,

    pub phone: Option<String>,

    // Cero = sin crédito autorizado (queda fuera de las alertas de utilización)
    #[validate(custom(function = "validate_not_negative"))]
    #[serde(default)]
    pub credit_limit: Decimal,
}

#[utoipa::path(
    post,
    path = "/api/customers",
    request_body = CreateCustomerPayload,
    responses((status = 201, description = "Cliente creado", body = Customer)),
    security(("api_jwt" = [])),
    tag = "CRM"
)]
pub async fn create_customer(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
    tenant: TenantContext,
    Json(payload): Json<CreateCustomerPayload>,
) -> Result<(StatusCode, Json<Customer>), AppError> {
    payload.validate().map_err(AppError::ValidationError)?;

    let mut conn = get_tenant_connection(&app_state, &tenant, &user).await?;

    let customer = app_state
        .customer_repo
        .create(
            &mut *conn,
            tenant.0,
            &payload.name,
            payload.email.as_deref(),
            payload.phone.as_deref(),
            payload.credit_limit,
        )
        .await?;

    Ok((StatusCode::CREATED, Json(customer)))
}

#[utoipa::path(
    get,
    path = "/api/customers",
    responses((status = 200, description = "Clientes del tenant", body = [Customer])),
    security(("api_jwt" = [])),
    tag = "CRM"
)]
pub async fn list_customers(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
    tenant: TenantContext,
) -> Result<Json<Vec<Customer>>, AppError> {
    let mut conn = get_tenant_connection(&app_state, &tenant, &user).await?;
    let customers = app_state.customer_repo.get_all(&mut *conn, tenant.0).await?;
    Ok(Json(customers))
}

#[utoipa::path(
    get,
    path = "/api/customers/{id}/payments",
    params(("id" = Uuid, Path, description = "ID del cliente")),
    responses(
        (status = 200, description = "Historial de pagos", body = [CustomerPayment]),
        (status = 404, description = "Cliente no encontrado"),
    ),
    security(("api_jwt" = [])),
    tag = "CRM"
)]
pub async fn list_customer_payments(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
    tenant: TenantContext,
    Path(customer_id): Path<Uuid>,
) -> Result<Json<Vec<CustomerPayment>>, AppError> {
    let mut conn = get_tenant_connection(&app_state, &tenant, &user).await?;

    // Primero se confirma que el cliente es de este tenant
    app_state
        .customer_repo
        .find_by_id(&mut *conn, tenant.0, customer_id)
        .await?
        .ok_or(AppError::NotFound)?;

    let payments = app_state
        .customer_repo
        .list_payments(&mut *conn, tenant.0, customer_id)
        .await?;
    Ok(Json(payments))
}

#[utoipa::path(
    get,
    path = "/api/customers/{id}/sales",
    params(("id" = Uuid, Path, description = "ID del cliente")),
    responses(
        (status = 200, description = "Ventas abiertas del cliente", body = [Sale]),
        (status = 404, description = "Cliente no encontrado"),
    ),
    security(("api_jwt" = [])),
    tag = "CRM"
)]
pub async fn list_customer_open_sales(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
    tenant: TenantContext,
    Path(customer_id): Path<Uuid>,
) -> Result<Json<Vec<Sale>>, AppError> {
    let mut conn = get_tenant_connection(&app_state, &tenant, &user).await?;

    app_state
        .customer_repo
        .find_by_id(&mut *conn, tenant.0, customer_id)
        .await?
        .ok_or(AppError::NotFound)?;

    let sales = app_state
        .sale_repo
        .get_open_sales_for_customer(&mut *conn, tenant.0, customer_id)
        .await?;
    Ok(Json(sales))
}
