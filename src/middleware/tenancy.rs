// src/middleware/tenancy.rs

use axum::{
    extract::{FromRequestParts, State},
    http::request::Parts,
    middleware::Next,
    response::Response,
};
use uuid::Uuid;

use crate::{common::error::AppError, config::AppState, models::auth::User};

// El encabezado con el tenant al que la request quiere entrar
const TENANT_ID_HEADER: &str = "x-tenant-id";

/// El tenant activo de la request, ya validado como miembro.
#[derive(Debug, Clone, Copy)]
pub struct TenantContext(pub Uuid);

impl<S> FromRequestParts<S> for TenantContext
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        // El guard ya lo dejó en las extensions; si no está, la ruta se montó
        // fuera del tenant_guard y eso es un error de armado del router.
        parts
            .extensions
            .get::<TenantContext>()
            .copied()
            .ok_or_else(|| {
                AppError::BadTenantHeader("El encabezado x-tenant-id es obligatorio.".to_string())
            })
    }
}

/// Corre DESPUÉS del auth_guard: lee x-tenant-id, verifica la membresía del
/// usuario autenticado y deja el TenantContext en las extensions.
pub async fn tenant_guard(
    State(app_state): State<AppState>,
    mut request: axum::http::Request<axum::body::Body>,
    next: Next,
) -> Result<Response, AppError> {
    let tenant_id = parse_tenant_header(
        request
            .headers()
            .get(TENANT_ID_HEADER)
            .and_then(|v| v.to_str().ok()),
    )?;

    let user = request
        .extensions()
        .get::<User>()
        .cloned()
        .ok_or(AppError::InvalidToken)?;

    let is_member = app_state
        .tenant_repo
        .is_member(tenant_id, user.id)
        .await?;

    if !is_member {
        return Err(AppError::NotATenantMember);
    }

    request.extensions_mut().insert(TenantContext(tenant_id));
    Ok(next.run(request).await)
}

fn parse_tenant_header(value: Option<&str>) -> Result<Uuid, AppError> {
    let value = value.ok_or_else(|| {
        AppError::BadTenantHeader("El encabezado x-tenant-id es obligatorio.".to_string())
    })?;
    Uuid::parse_str(value).map_err(|_| {
        AppError::BadTenantHeader("El encabezado x-tenant-id no es un UUID válido.".to_string())
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn el_encabezado_es_obligatorio() {
        assert!(parse_tenant_header(None).is_err());
    }

    #[test]
    fn el_encabezado_debe_ser_uuid() {
        assert!(parse_tenant_header(Some("no-es-uuid")).is_err());
        let id = Uuid::new_v4();
        assert_eq!(parse_tenant_header(Some(&id.to_string())).unwrap(), id);
    }
}
