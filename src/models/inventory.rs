// src/models/inventory.rs

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "movement_type", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MovementType {
    Entrada,
    Salida,
    CancelSale,
}

// --- MOVIMIENTO DE INVENTARIO (auditoría) ---
// Solo se inserta. Invariante: new_stock == previous_stock ± quantity según
// el tipo, y new_stock es el stock real del producto en el instante de la
// escritura (misma transacción, mismo executor).
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct InventoryMovement {
    pub id: Uuid,

    #[schema(ignore)]
    pub tenant_id: Uuid,

    pub product_id: Uuid,
    pub movement_type: MovementType,
    pub quantity: Decimal,
    pub previous_stock: Decimal,
    pub new_stock: Decimal,
    pub sale_id: Option<Uuid>,
    pub reason: String,
    pub created_at: DateTime<Utc>,
}

// Un renglón que no alcanzó stock en la pre-validación de una conversión.
// El error STOCK_ERROR enumera TODOS los renglones que fallan, no solo el primero.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct StockShortage {
    pub product_id: Uuid,
    pub product_name: String,
    pub requested: Decimal,
    pub available: Decimal,
}
