// src/models/collections.rs
//
// Vistas de cobranza (solo lectura): antigüedad de saldos, deudores
// principales y alertas de utilización de crédito.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

// Bandas de antigüedad. Exhaustivas y disjuntas para cualquier days_old >= 0.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AgingBucket {
    Current,    // 0–30 días
    Days31To60,
    Days61To90,
    Days90Plus,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AgingBucketSummary {
    pub bucket: AgingBucket,
    pub count: i64,
    pub total: Decimal,
}

// Una venta abierta dentro del reporte, con su banda y bandera de vencida
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AgingSaleEntry {
    pub sale_id: Uuid,
    pub folio: String,
    pub customer_id: Option<Uuid>,
    pub customer_name: Option<String>,
    pub remaining_balance: Decimal,
    pub days_old: i64,
    pub bucket: AgingBucket,
    pub overdue: bool,
    pub due_date: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DebtorSummary {
    pub customer_id: Uuid,
    pub name: String,
    pub current_debt: Decimal,
    pub credit_limit: Decimal,
    // None cuando credit_limit == 0 (sin límite no hay porcentaje que calcular)
    pub utilization_pct: Option<Decimal>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AgingReport {
    pub buckets: Vec<AgingBucketSummary>,
    pub sales: Vec<AgingSaleEntry>,
    pub top_debtors: Vec<DebtorSummary>,
    pub generated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreditAlert {
    pub customer_id: Uuid,
    pub name: String,
    pub current_debt: Decimal,
    pub credit_limit: Decimal,
    pub utilization_pct: Decimal,
}
