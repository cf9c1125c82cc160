// src/common/error.rs

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

use crate::models::inventory::StockShortage;

// Taxonomía de errores del núcleo:
//   - validación: entrada mal formada, sin cambio de estado
//   - conflicto de estado: ya convertida / cancelada / expirada
//   - conflicto de recurso: stock insuficiente, pago mayor al saldo
//   - not-found: id inexistente O de otro tenant (nunca revelamos cuál)
//   - interno: la transacción completa se revierte y sale un error genérico
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Error de validación")]
    ValidationError(#[from] validator::ValidationErrors),

    // --- Auth (ambiente) ---
    #[error("El correo ya existe")]
    EmailAlreadyExists,

    #[error("Credenciales inválidas")]
    InvalidCredentials,

    #[error("Token inválido")]
    InvalidToken,

    #[error("No eres miembro de esta empresa")]
    NotATenantMember,

    #[error("Encabezado de tenant inválido: {0}")]
    BadTenantHeader(String),

    // --- Núcleo: not-found (incluye accesos cruzados entre tenants) ---
    #[error("Recurso no encontrado")]
    NotFound,

    // --- Núcleo: conflictos de estado ---
    #[error("El documento ya fue convertido a venta")]
    AlreadyConverted,

    #[error("Estado inválido para la operación: {0}")]
    InvalidState(String),

    #[error("La cotización ya venció")]
    QuotationExpired,

    #[error("Este tipo de documento no se convierte en venta")]
    UnsupportedType,

    #[error("La venta ya está cancelada")]
    AlreadyCancelled,

    // --- Núcleo: conflictos de recurso ---
    #[error("Stock insuficiente en {} renglón(es)", .0.len())]
    InsufficientStock(Vec<StockShortage>),

    #[error("El monto excede el saldo pendiente de la venta")]
    AmountExceedsBalance,

    #[error("Monto de reembolso inválido")]
    InvalidRefundAmount,

    #[error("Pago rechazado por la pasarela: {0}")]
    PaymentDeclined(String),

    #[error("El SKU ya existe en esta empresa")]
    SkuAlreadyExists,

    // --- Infraestructura ---
    #[error("Error de base de datos")]
    DatabaseError(#[from] sqlx::Error),

    #[error("Error interno del servidor")]
    InternalServerError(#[from] anyhow::Error),

    #[error("Error de Bcrypt: {0}")]
    BcryptError(#[from] bcrypt::BcryptError),

    #[error("Error de JWT: {0}")]
    JwtError(#[from] jsonwebtoken::errors::Error),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message) = match self {
            // Devolvemos todos los detalles de la validación, campo por campo.
            AppError::ValidationError(errors) => {
                let mut details = std::collections::HashMap::new();
                for (field, field_errors) in errors.field_errors() {
                    let messages: Vec<String> = field_errors
                        .iter()
                        .filter_map(|e| e.message.as_ref().map(|m| m.to_string()))
                        .collect();
                    details.insert(field.to_string(), messages);
                }
                let body = Json(json!({
                    "error": "Uno o más campos son inválidos.",
                    "details": details,
                }));
                return (StatusCode::BAD_REQUEST, body).into_response();
            }

            // STOCK_ERROR: se enumera CADA renglón que falló, no solo el primero.
            AppError::InsufficientStock(lines) => {
                let body = Json(json!({
                    "error": "Stock insuficiente para completar la operación.",
                    "lines": lines,
                }));
                return (StatusCode::CONFLICT, body).into_response();
            }

            AppError::EmailAlreadyExists => (StatusCode::CONFLICT, "Este correo ya está en uso."),
            AppError::InvalidCredentials => (StatusCode::UNAUTHORIZED, "Correo o contraseña inválidos."),
            AppError::InvalidToken => (StatusCode::UNAUTHORIZED, "Token de autenticación inválido o ausente."),
            AppError::NotATenantMember => (StatusCode::UNAUTHORIZED, "No tienes acceso a esta empresa."),

            // Cross-tenant == not-found, nunca "forbidden": no confirmamos
            // la existencia de filas ajenas.
            AppError::NotFound => (StatusCode::NOT_FOUND, "Recurso no encontrado."),

            AppError::AlreadyConverted => (StatusCode::CONFLICT, "El documento ya fue convertido a venta."),
            AppError::QuotationExpired => (StatusCode::CONFLICT, "La cotización ya venció."),
            AppError::UnsupportedType => (StatusCode::CONFLICT, "Este tipo de documento no se convierte en venta."),
            AppError::AlreadyCancelled => (StatusCode::CONFLICT, "La venta ya está cancelada."),
            AppError::AmountExceedsBalance => (StatusCode::CONFLICT, "El monto excede el saldo pendiente."),
            AppError::InvalidRefundAmount => (StatusCode::BAD_REQUEST, "El monto de reembolso es inválido."),
            AppError::SkuAlreadyExists => (StatusCode::CONFLICT, "El SKU ya existe en esta empresa."),

            AppError::BadTenantHeader(ref msg) => {
                let body = Json(json!({ "error": msg }));
                return (StatusCode::BAD_REQUEST, body).into_response();
            }
            AppError::InvalidState(ref msg) => {
                let body = Json(json!({ "error": format!("Estado inválido: {msg}") }));
                return (StatusCode::CONFLICT, body).into_response();
            }
            AppError::PaymentDeclined(ref reason) => {
                let body = Json(json!({ "error": format!("Pago rechazado: {reason}") }));
                return (StatusCode::CONFLICT, body).into_response();
            }

            // Todo lo demás (DatabaseError, InternalServerError) se vuelve 500.
            // El tracing registra el detalle; el cliente recibe un mensaje genérico.
            ref e => {
                tracing::error!("Error interno del servidor: {}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, "Ocurrió un error inesperado.")
            }
        };

        let body = Json(json!({ "error": error_message }));
        (status, body).into_response()
    }
}
