// src/services/folio_service.rs
//
// El secuenciador de folios. En lugar de leer el último documento y parsear
// el sufijo (que pierde bajo concurrencia), cada tenant lleva un contador
// atómico por serie: un UPSERT con ON CONFLICT que incrementa y devuelve.
// El UNIQUE (tenant_id, folio) de la tabla de ventas queda como segunda
// defensa: una colisión residual revienta como conflicto, no como duplicado.

use chrono::{Datelike, Utc};
use sqlx::{Executor, Postgres};
use uuid::Uuid;

use crate::common::error::AppError;

/// Series de documento. Cada una define su prefijo y ancho de relleno.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FolioSeries {
    /// VTA-###### — ventas
    Sale,
    /// COT-YYMM-#### — cotizaciones, el contador reinicia cada mes
    Quotation,
    /// PED-###### — pedidos en línea
    OnlineOrder,
}

#[derive(Clone)]
pub struct FolioService;

impl FolioService {
    pub fn new() -> Self {
        Self
    }

    pub async fn next_folio<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        series: FolioSeries,
    ) -> Result<String, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let key = series_key(series, Utc::now().date_naive());

        // UPSERT atómico: o crea el contador en 1 o lo incrementa. El RETURNING
        // entrega el valor ya reservado para este llamador.
        let (next,): (i64,) = sqlx::query_as(
            r#"
            INSERT INTO folio_counters (tenant_id, series, last_value)
            VALUES ($1, $2, 1)
            ON CONFLICT (tenant_id, series)
            DO UPDATE SET last_value = folio_counters.last_value + 1
            RETURNING last_value
            "#,
        )
        .bind(tenant_id)
        .bind(&key)
        .fetch_one(executor)
        .await?;

        Ok(format_folio(series, &key, next))
    }
}

/// Llave del contador. Para COT incluye el periodo YYMM: el primer folio de
/// cada mes arranca en 0001.
fn series_key(series: FolioSeries, today: chrono::NaiveDate) -> String {
    match series {
        FolioSeries::Sale => "VTA".to_string(),
        FolioSeries::OnlineOrder => "PED".to_string(),
        FolioSeries::Quotation => {
            format!("COT-{:02}{:02}", today.year() % 100, today.month())
        }
    }
}

fn format_folio(series: FolioSeries, key: &str, seq: i64) -> String {
    match series {
        FolioSeries::Sale | FolioSeries::OnlineOrder => format!("{key}-{seq:06}"),
        FolioSeries::Quotation => format!("{key}-{seq:04}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn folio_de_venta_rellena_a_seis_digitos() {
        assert_eq!(format_folio(FolioSeries::Sale, "VTA", 1), "VTA-000001");
        assert_eq!(format_folio(FolioSeries::Sale, "VTA", 42), "VTA-000042");
        assert_eq!(format_folio(FolioSeries::Sale, "VTA", 999_999), "VTA-999999");
    }

    #[test]
    fn folio_de_cotizacion_lleva_periodo_y_cuatro_digitos() {
        let today = NaiveDate::from_ymd_opt(2025, 8, 23).unwrap();
        let key = series_key(FolioSeries::Quotation, today);
        assert_eq!(key, "COT-2508");
        assert_eq!(format_folio(FolioSeries::Quotation, &key, 1), "COT-2508-0001");
        assert_eq!(format_folio(FolioSeries::Quotation, &key, 123), "COT-2508-0123");
    }

    #[test]
    fn la_llave_de_pedidos_no_depende_de_la_fecha() {
        let a = series_key(FolioSeries::OnlineOrder, NaiveDate::from_ymd_opt(2025, 1, 1).unwrap());
        let b = series_key(FolioSeries::OnlineOrder, NaiveDate::from_ymd_opt(2026, 12, 31).unwrap());
        assert_eq!(a, b);
    }

    #[test]
    fn el_periodo_de_cotizacion_cambia_con_el_mes() {
        let enero = series_key(FolioSeries::Quotation, NaiveDate::from_ymd_opt(2026, 1, 5).unwrap());
        let febrero = series_key(FolioSeries::Quotation, NaiveDate::from_ymd_opt(2026, 2, 5).unwrap());
        assert_eq!(enero, "COT-2601");
        assert_ne!(enero, febrero);
    }
}
