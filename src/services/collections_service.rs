// src/services/collections_service.rs
//
// La vista de cobranza. Solo lectura: nada aquí escribe; la consistencia de
// current_debt y de los saldos la garantizan el Payment Ledger y el
// orquestador.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{Acquire, Executor, Postgres};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::{CustomerRepository, SaleRepository},
    models::collections::{
        AgingBucket, AgingBucketSummary, AgingReport, AgingSaleEntry, CreditAlert, DebtorSummary,
    },
};

// Umbral de alerta de utilización de crédito (%)
const ALERT_THRESHOLD: Decimal = Decimal::from_parts(80, 0, 0, false, 0);

const TOP_DEBTORS_LIMIT: i64 = 10;

#[derive(Clone)]
pub struct CollectionsService {
    sale_repo: SaleRepository,
    customer_repo: CustomerRepository,
}

impl CollectionsService {
    pub fn new(sale_repo: SaleRepository, customer_repo: CustomerRepository) -> Self {
        Self {
            sale_repo,
            customer_repo,
        }
    }

    /// Reporte de antigüedad de saldos: cada venta abierta cae en exactamente
    /// una banda según sus días desde created_at.
    pub async fn aging_report<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
    ) -> Result<AgingReport, AppError>
    where
        E: Executor<'e, Database = Postgres> + Acquire<'e, Database = Postgres>,
    {
        // Transacción de solo lectura: las dos consultas ven la misma foto
        let mut tx = executor.begin().await?;

        let now = Utc::now();
        let open_sales = self.sale_repo.get_open_credit_sales(&mut *tx, tenant_id).await?;

        let mut counts = [0i64; 4];
        let mut totals = [Decimal::ZERO; 4];
        let mut sales = Vec::with_capacity(open_sales.len());

        for row in open_sales {
            let days_old = (now - row.created_at).num_days().max(0);
            let bucket = aging_bucket(days_old);
            let overdue = is_overdue(row.due_date, row.remaining_balance, now);

            let idx = bucket_index(bucket);
            counts[idx] += 1;
            totals[idx] += row.remaining_balance;

            sales.push(AgingSaleEntry {
                sale_id: row.id,
                folio: row.folio,
                customer_id: row.customer_id,
                customer_name: row.customer_name,
                remaining_balance: row.remaining_balance,
                days_old,
                bucket,
                overdue,
                due_date: row.due_date,
            });
        }

        // Las cuatro bandas siempre aparecen, aunque estén en cero
        let buckets = ALL_BUCKETS
            .iter()
            .map(|&bucket| {
                let idx = bucket_index(bucket);
                AgingBucketSummary {
                    bucket,
                    count: counts[idx],
                    total: totals[idx],
                }
            })
            .collect();

        let top_debtors = self
            .customer_repo
            .top_debtors(&mut *tx, tenant_id, TOP_DEBTORS_LIMIT)
            .await?
            .into_iter()
            .map(|c| DebtorSummary {
                customer_id: c.id,
                name: c.name,
                current_debt: c.current_debt,
                credit_limit: c.credit_limit,
                utilization_pct: utilization_pct(c.current_debt, c.credit_limit),
            })
            .collect();

        tx.commit().await?;

        Ok(AgingReport {
            buckets,
            sales,
            top_debtors,
            generated_at: now,
        })
    }

    /// Clientes con utilización de crédito por encima del umbral del 80%.
    /// Los de límite cero no entran: el repo ya los filtra.
    pub async fn credit_alerts<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
    ) -> Result<Vec<CreditAlert>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let exposed = self.customer_repo.with_credit_exposure(executor, tenant_id).await?;

        let alerts = exposed
            .into_iter()
            .filter_map(|c| {
                let pct = utilization_pct(c.current_debt, c.credit_limit)?;
                if pct >= ALERT_THRESHOLD {
                    Some(CreditAlert {
                        customer_id: c.id,
                        name: c.name,
                        current_debt: c.current_debt,
                        credit_limit: c.credit_limit,
                        utilization_pct: pct,
                    })
                } else {
                    None
                }
            })
            .collect();

        Ok(alerts)
    }
}

const ALL_BUCKETS: [AgingBucket; 4] = [
    AgingBucket::Current,
    AgingBucket::Days31To60,
    AgingBucket::Days61To90,
    AgingBucket::Days90Plus,
];

fn bucket_index(bucket: AgingBucket) -> usize {
    match bucket {
        AgingBucket::Current => 0,
        AgingBucket::Days31To60 => 1,
        AgingBucket::Days61To90 => 2,
        AgingBucket::Days90Plus => 3,
    }
}

/// Banda de antigüedad. Un solo match: exhaustivo y disjunto para todo
/// days_old >= 0.
fn aging_bucket(days_old: i64) -> AgingBucket {
    match days_old {
        0..=30 => AgingBucket::Current,
        31..=60 => AgingBucket::Days31To60,
        61..=90 => AgingBucket::Days61To90,
        _ => AgingBucket::Days90Plus,
    }
}

/// Porcentaje de utilización del crédito. None con límite cero: ahí no hay
/// porcentaje que tenga sentido.
fn utilization_pct(current_debt: Decimal, credit_limit: Decimal) -> Option<Decimal> {
    if credit_limit <= Decimal::ZERO {
        return None;
    }
    Some((current_debt / credit_limit * Decimal::ONE_HUNDRED).round_dp(2))
}

/// Vencida: tiene fecha de vencimiento, ya pasó y aún debe algo.
fn is_overdue(due_date: Option<DateTime<Utc>>, remaining: Decimal, now: DateTime<Utc>) -> bool {
    match due_date {
        Some(due) => now > due && remaining > Decimal::ZERO,
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn d(s: &str) -> Decimal {
        s.parse().unwrap()
    }

    #[test]
    fn las_bandas_cubren_todo_dia_sin_traslape() {
        // Cada día cae en exactamente una banda
        for days in 0..=400 {
            let bucket = aging_bucket(days);
            let expected = if days <= 30 {
                AgingBucket::Current
            } else if days <= 60 {
                AgingBucket::Days31To60
            } else if days <= 90 {
                AgingBucket::Days61To90
            } else {
                AgingBucket::Days90Plus
            };
            assert_eq!(bucket, expected, "día {days}");
        }
    }

    #[test]
    fn los_limites_de_banda_caen_del_lado_correcto() {
        assert_eq!(aging_bucket(0), AgingBucket::Current);
        assert_eq!(aging_bucket(30), AgingBucket::Current);
        assert_eq!(aging_bucket(31), AgingBucket::Days31To60);
        assert_eq!(aging_bucket(60), AgingBucket::Days31To60);
        assert_eq!(aging_bucket(61), AgingBucket::Days61To90);
        assert_eq!(aging_bucket(90), AgingBucket::Days61To90);
        assert_eq!(aging_bucket(91), AgingBucket::Days90Plus);
    }

    #[test]
    fn utilizacion_con_limite_cero_es_none() {
        assert_eq!(utilization_pct(d("500"), Decimal::ZERO), None);
    }

    #[test]
    fn utilizacion_se_calcula_en_porcentaje() {
        assert_eq!(utilization_pct(d("4000"), d("5000")), Some(d("80.00")));
        assert_eq!(utilization_pct(d("1"), d("3")), Some(d("33.33")));
        // Puede pasar del 100: el límite se rebasó
        assert_eq!(utilization_pct(d("6000"), d("5000")), Some(d("120.00")));
    }

    #[test]
    fn vencida_requiere_fecha_pasada_y_saldo() {
        let now = Utc::now();
        let ayer = Some(now - Duration::days(1));
        let manana = Some(now + Duration::days(1));

        assert!(is_overdue(ayer, d("100"), now));
        assert!(!is_overdue(manana, d("100"), now));
        assert!(!is_overdue(ayer, Decimal::ZERO, now));
        assert!(!is_overdue(None, d("100"), now));
    }

    #[test]
    fn el_umbral_de_alerta_es_ochenta_por_ciento() {
        let justo = utilization_pct(d("4000"), d("5000")).unwrap();
        let debajo = utilization_pct(d("3999"), d("5000")).unwrap();
        assert!(justo >= ALERT_THRESHOLD);
        assert!(debajo < ALERT_THRESHOLD);
    }
}
