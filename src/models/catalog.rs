// src/models/catalog.rs

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

// El catálogo de productos. El campo `stock` es propiedad exclusiva del
// Stock Ledger: nadie más lo escribe por asignación directa.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: Uuid,

    #[schema(ignore)]
    pub tenant_id: Uuid,

    pub sku: String,
    pub name: String,

    #[schema(example = "150.00")]
    pub price: Decimal,
    #[schema(example = "90.00")]
    pub cost: Decimal,

    pub stock: Decimal,
    pub min_stock: Decimal,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
