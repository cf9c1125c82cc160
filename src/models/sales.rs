// src/models/sales.rs

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

// --- ENUMS (mapean los tipos de Postgres) ---

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "payment_method", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentMethod {
    Efectivo,
    Tarjeta,
    Transferencia,
    Credito, // Pago diferido: activa el libro de crédito
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "sale_status", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SaleStatus {
    Completed,
    Cancelled,
    Refunded,
    PartialRefund,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "payment_status", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentStatus {
    Paid,
    Pending,
    Partial,
    Overdue,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "cancellation_type", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CancellationType {
    Full,
    Partial,
}

// --- VENTA ---
// Invariante de dinero: amount_paid + remaining_balance == total, siempre
// (con tolerancia de 0.01 por redondeo).
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Sale {
    pub id: Uuid,

    #[schema(ignore)]
    pub tenant_id: Uuid,

    #[schema(example = "VTA-000042")]
    pub folio: String,
    pub customer_id: Option<Uuid>,

    pub subtotal: Decimal,
    pub tax: Decimal,
    pub total: Decimal,

    pub payment_method: PaymentMethod,
    pub status: SaleStatus,

    pub amount_paid: Decimal,
    pub remaining_balance: Decimal,
    // Solo tiene significado real cuando payment_method == CREDITO
    pub payment_status: PaymentStatus,
    pub due_date: Option<DateTime<Utc>>,

    pub source_quotation_id: Option<Uuid>,
    pub source_order_id: Option<Uuid>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SaleItem {
    pub id: Uuid,
    pub sale_id: Uuid,
    pub product_id: Uuid,
    pub quantity: Decimal,
    pub unit_price: Decimal,
    // total == quantity * unit_price (el descuento ya viene neteado)
    pub total: Decimal,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SaleCancellation {
    pub id: Uuid,

    #[schema(ignore)]
    pub tenant_id: Uuid,

    pub sale_id: Uuid,
    pub cancellation_type: CancellationType,
    pub reason: String,
    pub refund_amount: Decimal,
    pub cancelled_at: DateTime<Utc>,
}

// Venta con sus renglones, para el detalle
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SaleDetail {
    #[serde(flatten)]
    pub sale: Sale,
    pub items: Vec<SaleItem>,
}
