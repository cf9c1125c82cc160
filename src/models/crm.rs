// src/models/crm.rs

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::models::sales::PaymentMethod;

// --- CLIENTE ---

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Customer {
    pub id: Uuid,

    #[schema(ignore)]
    pub tenant_id: Uuid,

    pub name: String,
    pub email: Option<String>,
    pub phone: Option<String>,

    // Límite de crédito autorizado y deuda viva. La deuda es un agregado
    // desnormalizado: lo escribe el Payment Ledger (y la conversión a crédito),
    // nadie más.
    #[schema(example = "10000.00")]
    pub credit_limit: Decimal,
    #[schema(example = "406.00")]
    pub current_debt: Decimal,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// --- PAGO DE CLIENTE ---
// Inmutable: un pago nunca se edita, solo se supera con otro pago
// o con una cancelación a nivel de venta.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CustomerPayment {
    pub id: Uuid,

    #[schema(ignore)]
    pub tenant_id: Uuid,

    pub customer_id: Uuid,
    // None = abono al saldo general del cliente, sin venta específica
    pub sale_id: Option<Uuid>,

    #[schema(example = "400.00")]
    pub amount: Decimal,
    pub payment_method: PaymentMethod,
    pub reference: Option<String>,

    pub payment_date: DateTime<Utc>,
}
