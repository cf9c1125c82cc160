// src/models/documents.rs
//
// Documentos "fuente" de una venta: cotizaciones y pedidos en línea.
// Ambos alimentan el mismo camino de conversión del orquestador.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::models::sales::PaymentMethod;

// --- ENUMS ---

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "quotation_status", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum QuotationStatus {
    Draft,
    Sent,
    Converted, // terminal
    Expired,   // terminal
    Cancelled, // terminal
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "order_type", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderType {
    Quote, // nunca produce una venta automáticamente
    Sale,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "order_status", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatus {
    Pending,
    Completed,
    Failed,
}

// --- COTIZACIÓN ---

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Quotation {
    pub id: Uuid,

    #[schema(ignore)]
    pub tenant_id: Uuid,

    #[schema(example = "COT-2508-0001")]
    pub folio: String,
    pub customer_id: Option<Uuid>,

    pub subtotal: Decimal,
    pub tax: Decimal,
    pub total: Decimal,

    pub status: QuotationStatus,
    pub valid_until: DateTime<Utc>,

    // Una vez fijado, es inmutable: la cotización quedó consumida
    pub converted_to_sale_id: Option<Uuid>,
    pub converted_at: Option<DateTime<Utc>>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct QuotationItem {
    pub id: Uuid,
    pub quotation_id: Uuid,
    pub product_id: Uuid,
    pub quantity: Decimal,
    pub unit_price: Decimal,
    pub total: Decimal,
}

// --- PEDIDO EN LÍNEA ---

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct OnlineOrder {
    pub id: Uuid,

    #[schema(ignore)]
    pub tenant_id: Uuid,

    #[schema(example = "PED-000017")]
    pub order_number: String,
    pub order_type: OrderType,

    // Contacto tal cual lo capturó la tienda en línea; el orquestador
    // lo usa para resolver (o crear) el Customer
    pub customer_name: String,
    pub customer_email: Option<String>,
    pub customer_phone: Option<String>,

    pub subtotal: Decimal,
    pub tax: Decimal,
    pub total: Decimal,

    pub status: OrderStatus,
    pub payment_status: Option<String>,
    pub gateway_transaction_id: Option<String>,
    pub sale_id: Option<Uuid>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct OnlineOrderItem {
    pub id: Uuid,
    pub order_id: Uuid,
    pub product_id: Uuid,
    pub quantity: Decimal,
    pub unit_price: Decimal,
    pub total: Decimal,
}

// --- CONTRATOS DE CONVERSIÓN ---

// Lo que decide el cajero al convertir: cómo se paga y, si es crédito,
// para cuándo vence.
#[derive(Debug, Clone, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PaymentDecision {
    pub payment_method: PaymentMethod,
    pub due_date: Option<DateTime<Utc>>,
}

// Resultado de liquidación de una pasarela externa (real o mock).
// Un success == true es el disparador de la conversión inmediata.
#[derive(Debug, Clone, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct GatewaySettlement {
    pub success: bool,
    pub transaction_id: Option<String>,
    pub error: Option<String>,
}
