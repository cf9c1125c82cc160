// src/common/db_utils.rs

use crate::common::error::AppError;
use crate::config::AppState;
use crate::middleware::auth::AuthenticatedUser;
use crate::middleware::tenancy::TenantContext;

// ---
// Helper de conexión "con llave": fija tenant y usuario en la sesión
// ---
/// Adquiere una conexión de la pool y fija las variables de sesión
/// (`app.tenant_id`, `app.user_id`). Los triggers de auditoría y las
/// políticas RLS las leen con current_setting.
pub(crate) async fn get_tenant_connection(
    app_state: &AppState,
    tenant_ctx: &TenantContext,
    user: &AuthenticatedUser,
) -> Result<sqlx::pool::PoolConnection<sqlx::Postgres>, AppError> {
    // 1. Adquiere conexión ('?' convierte sqlx::Error -> AppError::DatabaseError)
    let mut conn = app_state.db_pool.acquire().await?;

    // 2. Fija el tenant
    sqlx::query("SELECT set_config('app.tenant_id', $1, true)")
        .bind(tenant_ctx.0.to_string())
        .execute(&mut *conn)
        .await?;

    // 3. Fija el usuario
    sqlx::query("SELECT set_config('app.user_id', $1, true)")
        .bind(user.0.id.to_string())
        .execute(&mut *conn)
        .await?;

    Ok(conn)
}
