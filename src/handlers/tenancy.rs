// src/handlers/tenancy.rs

use axum::{Json, extract::State, http::StatusCode};
use serde::Deserialize;
use utoipa::ToSchema;
use validator::Validate;

use crate::{
    common::error::AppError,
    config::AppState,
    middleware::auth::AuthenticatedUser,
    models::tenancy::Tenant,
};

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateTenantPayload {
    #[validate(length(min = 1, message = "El nombre de la empresa es obligatorio."))]
    pub name: String,
}

#[utoipa::path(
    post,
    path = "/api/tenants",
    request_body = CreateTenantPayload,
    responses((status = 201, description = "Empresa creada", body = Tenant)),
    security(("api_jwt" = [])),
    tag = "Tenancy"
)]
pub async fn create_tenant(
    State(app_state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    Json(payload): Json<CreateTenantPayload>,
) -> Result<(StatusCode, Json<Tenant>), AppError> {
    payload.validate().map_err(AppError::ValidationError)?;

    // Tenant y membresía del creador, o todo o nada
    let mut tx = app_state.db_pool.begin().await?;

    let tenant = app_state
        .tenant_repo
        .create_tenant(&mut *tx, &payload.name)
        .await?;
    app_state
        .tenant_repo
        .add_member(&mut *tx, tenant.id, user.id, "owner")
        .await?;

    tx.commit().await?;

    tracing::info!(tenant = %tenant.id, usuario = %user.id, "empresa creada");
    Ok((StatusCode::CREATED, Json(tenant)))
}

#[utoipa::path(
    get,
    path = "/api/tenants",
    responses((status = 200, description = "Empresas del usuario", body = [Tenant])),
    security(("api_jwt" = [])),
    tag = "Tenancy"
)]
pub async fn list_my_tenants(
    State(app_state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
) -> Result<Json<Vec<Tenant>>, AppError> {
    let tenants = app_state.tenant_repo.list_for_user(user.id).await?;
    Ok(Json(tenants))
}
