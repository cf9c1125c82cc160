// src/handlers/collections.rs

use axum::{Json, extract::State};

use crate::{
    common::{db_utils::get_tenant_connection, error::AppError},
    config::AppState,
    middleware::{auth::AuthenticatedUser, tenancy::TenantContext},
    models::collections::{AgingReport, CreditAlert},
};

#[utoipa::path(
    get,
    path = "/api/collections/aging",
    responses((status = 200, description = "Reporte de antigüedad de saldos", body = AgingReport)),
    security(("api_jwt" = [])),
    tag = "Collections"
)]
pub async fn aging_report(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
    tenant: TenantContext,
) -> Result<Json<AgingReport>, AppError> {
    let mut conn = get_tenant_connection(&app_state, &tenant, &user).await?;

    let report = app_state
        .collections_service
        .aging_report(&mut *conn, tenant.0)
        .await?;
    Ok(Json(report))
}

#[utoipa::path(
    get,
    path = "/api/collections/alerts",
    responses((status = 200, description = "Clientes sobre el umbral de crédito", body = [CreditAlert])),
    security(("api_jwt" = [])),
    tag = "Collections"
)]
pub async fn credit_alerts(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
    tenant: TenantContext,
) -> Result<Json<Vec<CreditAlert>>, AppError> {
    let mut conn = get_tenant_connection(&app_state, &tenant, &user).await?;

    let alerts = app_state
        .collections_service
        .credit_alerts(&mut *conn, tenant.0)
        .await?;
    Ok(Json(alerts))
}
