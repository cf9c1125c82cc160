// src/handlers/products.rs

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
        catalog::Product,
        inventory::{InventoryMovement, MovementType},
    },
};

fn validate_not_negative(val: &Decimal) -> Result<(), ValidationError> {
    if val.is_sign_negative() {
        let mut err = ValidationError::new("range");
        err.message = Some("El valor no puede ser negativo.".into());
        return Err(err);
    }
    Ok(())
}

fn validate_positive(val: &Decimal) -> Result<(), ValidationError> {
    if *val <= Decimal::ZERO {
        let mut err = ValidationError::new("range");
        err.message = Some("El valor debe ser mayor a cero.".into());
        return Err(err);
    }
    Ok(())
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateProductPayload {
    #[validate(length(min = 1, message = "El SKU es obligatorio."))]
    pub sku: String,

    #[validate(length(min = 1, message = "El nombre es obligatorio."))]
    pub name: String,

    #[validate(custom(function = "validate_not_negative"))]
    pub price: Decimal,

    #[validate(custom(function = "validate_not_negative"))]
    #[serde(default)]
    pub cost: Decimal,

    #[validate(custom(function = "validate_not_negative"))]
    #[serde(default)]
    pub min_stock: Decimal,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct StockEntryPayload {
    pub product_id: Uuid,

    #[validate(custom(function = "validate_positive"))]
    pub quantity: Decimal,

    #[validate(length(min = 1, message = "La razón del movimiento es obligatoria."))]
    pub reason: String,
}

#[utoipa::path(
    post,
    path = "/api/products",
    request_body = CreateProductPayload,
    responses(
        (status = 201, description = "Producto creado", body = Product),
        (status = 409, description = "El SKU ya existe"),
    ),
    security(("api_jwt" = [])),
    tag = "Catalog"
)]
pub async fn create_product(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
    tenant: TenantContext,
    Json(payload): Json<CreateProductPayload>,
) -> Result<(StatusCode, Json<Product>), AppError> {
    payload.validate().map_err(AppError::ValidationError)?;

    let mut conn = get_tenant_connection(&app_state, &tenant, &user).await?;

    // El producto nace con stock cero; el inventario inicial entra después
    // como ENTRADA por el Stock Ledger, con su renglón de auditoría.
    let product = app_state
        .product_repo
        .create(
            &mut *conn,
            tenant.0,
            &payload.sku,
            &payload.name,
            payload.price,
            payload.cost,
            payload.min_stock,
        )
        .await?;

    Ok((StatusCode::CREATED, Json(product)))
}

#[utoipa::path(
    get,
    path = "/api/products",
    responses((status = 200, description = "Catálogo del tenant", body = [Product])),
    security(("api_jwt" = [])),
    tag = "Catalog"
)]
pub async fn get_all_products(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
    tenant: TenantContext,
) -> Result<Json<Vec<Product>>, AppError> {
    let mut conn = get_tenant_connection(&app_state, &tenant, &user).await?;
    let products = app_state.product_repo.get_all(&mut *conn, tenant.0).await?;
    Ok(Json(products))
}

#[utoipa::path(
    get,
    path = "/api/products/low-stock",
    responses((status = 200, description = "Productos en o bajo su mínimo", body = [Product])),
    security(("api_jwt" = [])),
    tag = "Catalog"
)]
pub async fn get_low_stock(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
    tenant: TenantContext,
) -> Result<Json<Vec<Product>>, AppError> {
    let mut conn = get_tenant_connection(&app_state, &tenant, &user).await?;
    let products = app_state.product_repo.get_low_stock(&mut *conn, tenant.0).await?;
    Ok(Json(products))
}

#[utoipa::path(
    post,
    path = "/api/products/stock-entry",
    request_body = StockEntryPayload,
    responses(
        (status = 201, description = "Entrada de stock aplicada", body = InventoryMovement),
        (status = 404, description = "Producto no encontrado"),
    ),
    security(("api_jwt" = [])),
    tag = "Catalog"
)]
pub async fn stock_entry(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
    tenant: TenantContext,
    Json(payload): Json<StockEntryPayload>,
) -> Result<(StatusCode, Json<InventoryMovement>), AppError> {
    payload.validate().map_err(AppError::ValidationError)?;

    let mut conn = get_tenant_connection(&app_state, &tenant, &user).await?;

    let movement = app_state
        .stock_service
        .apply_movement(
            &mut *conn,
            tenant.0,
            payload.product_id,
            MovementType::Entrada,
            payload.quantity,
            &payload.reason,
            None,
        )
        .await?;

    Ok((StatusCode::CREATED, Json(movement)))
}

#[utoipa::path(
    get,
    path = "/api/products/{id}/movements",
    params(("id" = Uuid, Path, description = "ID del producto")),
    responses(
        (status = 200, description = "Libro de movimientos del producto", body = [InventoryMovement]),
        (status = 404, description = "Producto no encontrado"),
    ),
    security(("api_jwt" = [])),
    tag = "Catalog"
)]
pub async fn list_movements(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
    tenant: TenantContext,
    Path(product_id): Path<Uuid>,
) -> Result<Json<Vec<InventoryMovement>>, AppError> {
    let mut conn = get_tenant_connection(&app_state, &tenant, &user).await?;

    app_state
        .product_repo
        .get_by_id(&mut *conn, tenant.0, product_id)
        .await?
        .ok_or(AppError::NotFound)?;

    let movements = app_state
        .product_repo
        .list_movements(&mut *conn, tenant.0, product_id)
        .await?;
    Ok(Json(movements))
}
