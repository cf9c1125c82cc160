// src/services/document_service.rs
//
// Alta de los documentos fuente: cotizaciones y pedidos en línea. Los
// precios salen SIEMPRE del catálogo (nunca del payload) y los totales se
// calculan aquí, de modo que la conversión posterior solo copia números que
// ya cuadran.

use chrono::{DateTime, Duration, Utc};
use rust_decimal::Decimal;
use sqlx::{Acquire, Executor, Postgres};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::{CustomerRepository, DocumentRepository, ProductRepository, document_repo::NewDocumentItem},
    models::documents::{OnlineOrder, OnlineOrderItem, OrderType, Quotation, QuotationItem},
    services::folio_service::{FolioSeries, FolioService},
};

// IVA estándar (16%)
const TAX_RATE: Decimal = Decimal::from_parts(16, 0, 0, false, 2);

// Vigencia por omisión de una cotización
const DEFAULT_VALIDITY_DAYS: i64 = 15;

/// Renglón capturado: el precio lo pone el catálogo.
#[derive(Debug, Clone)]
pub struct DocumentLine {
    pub product_id: Uuid,
    pub quantity: Decimal,
}

#[derive(Clone)]
pub struct DocumentService {
    document_repo: DocumentRepository,
    customer_repo: CustomerRepository,
    product_repo: ProductRepository,
    folio_service: FolioService,
}

impl DocumentService {
    pub fn new(
        document_repo: DocumentRepository,
        customer_repo: CustomerRepository,
        product_repo: ProductRepository,
        folio_service: FolioService,
    ) -> Self {
        Self {
            document_repo,
            customer_repo,
            product_repo,
            folio_service,
        }
    }

    pub async fn create_quotation<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        customer_id: Option<Uuid>,
        lines: &[DocumentLine],
        valid_until: Option<DateTime<Utc>>,
    ) -> Result<(Quotation, Vec<QuotationItem>), AppError>
    where
        E: Executor<'e, Database = Postgres> + Acquire<'e, Database = Postgres>,
    {
        if lines.is_empty() {
            return Err(AppError::InvalidState("la cotización necesita al menos un renglón".into()));
        }

        let mut tx = executor.begin().await?;

        if let Some(customer_id) = customer_id {
            self.customer_repo
                .find_by_id(&mut *tx, tenant_id, customer_id)
                .await?
                .ok_or(AppError::NotFound)?;
        }

        let priced = self.price_lines(&mut tx, tenant_id, lines).await?;
        let (subtotal, tax, total) = compute_totals(priced.iter().map(|i| i.total));

        let folio = self
            .folio_service
            .next_folio(&mut *tx, tenant_id, FolioSeries::Quotation)
            .await?;

        let valid_until =
            valid_until.unwrap_or_else(|| Utc::now() + Duration::days(DEFAULT_VALIDITY_DAYS));

        let quotation = self
            .document_repo
            .insert_quotation(&mut *tx, tenant_id, &folio, customer_id, subtotal, tax, total, valid_until)
            .await?;

        let mut items = Vec::with_capacity(priced.len());
        for item in &priced {
            items.push(
                self.document_repo
                    .insert_quotation_item(&mut *tx, quotation.id, item)
                    .await?,
            );
        }

        tx.commit().await?;

        tracing::info!(%tenant_id, folio = %quotation.folio, "cotización creada");
        Ok((quotation, items))
    }

    pub async fn create_order<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        order_type: OrderType,
        customer_name: &str,
        customer_email: Option<&str>,
        customer_phone: Option<&str>,
        lines: &[DocumentLine],
    ) -> Result<(OnlineOrder, Vec<OnlineOrderItem>), AppError>
    where
        E: Executor<'e, Database = Postgres> + Acquire<'e, Database = Postgres>,
    {
        if lines.is_empty() {
            return Err(AppError::InvalidState("el pedido necesita al menos un renglón".into()));
        }

        let mut tx = executor.begin().await?;

        let priced = self.price_lines(&mut tx, tenant_id, lines).await?;
        let (subtotal, tax, total) = compute_totals(priced.iter().map(|i| i.total));

        let order_number = self
            .folio_service
            .next_folio(&mut *tx, tenant_id, FolioSeries::OnlineOrder)
            .await?;

        let order = self
            .document_repo
            .insert_order(
                &mut *tx,
                tenant_id,
                &order_number,
                order_type,
                customer_name,
                customer_email,
                customer_phone,
                subtotal,
                tax,
                total,
            )
            .await?;

        let mut items = Vec::with_capacity(priced.len());
        for item in &priced {
            items.push(
                self.document_repo
                    .insert_order_item(&mut *tx, order.id, item)
                    .await?,
            );
        }

        tx.commit().await?;

        tracing::info!(%tenant_id, pedido = %order.order_number, "pedido en línea registrado");
        Ok((order, items))
    }

    /// Valida cada producto contra el catálogo del tenant y fija su precio.
    async fn price_lines(
        &self,
        tx: &mut sqlx::Transaction<'_, Postgres>,
        tenant_id: Uuid,
        lines: &[DocumentLine],
    ) -> Result<Vec<NewDocumentItem>, AppError> {
        let mut priced = Vec::with_capacity(lines.len());
        for line in lines {
            if line.quantity <= Decimal::ZERO {
                return Err(AppError::InvalidState(
                    "la cantidad de cada renglón debe ser positiva".into(),
                ));
            }
            let product = self
                .product_repo
                .get_by_id(&mut **tx, tenant_id, line.product_id)
                .await?
                .ok_or(AppError::NotFound)?;

            priced.push(NewDocumentItem {
                product_id: product.id,
                quantity: line.quantity,
                unit_price: product.price,
                total: (line.quantity * product.price).round_dp(2),
            });
        }
        Ok(priced)
    }
}

/// Subtotal, impuesto (IVA 16%, redondeado a centavos) y total.
fn compute_totals(line_totals: impl Iterator<Item = Decimal>) -> (Decimal, Decimal, Decimal) {
    let subtotal: Decimal = line_totals.sum();
    let tax = (subtotal * TAX_RATE).round_dp(2);
    (subtotal, tax, subtotal + tax)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(s: &str) -> Decimal {
        s.parse().unwrap()
    }

    // 2 piezas de $100 y 3 de $50: subtotal 350, IVA 56, total 406
    #[test]
    fn totales_de_cotizacion_con_iva() {
        let (subtotal, tax, total) = compute_totals(vec![d("200.00"), d("150.00")].into_iter());
        assert_eq!(subtotal, d("350.00"));
        assert_eq!(tax, d("56.00"));
        assert_eq!(total, d("406.00"));
    }

    #[test]
    fn el_impuesto_se_redondea_a_centavos() {
        // 33.33 * 0.16 = 5.3328 → 5.33
        let (subtotal, tax, total) = compute_totals(vec![d("33.33")].into_iter());
        assert_eq!(subtotal, d("33.33"));
        assert_eq!(tax, d("5.33"));
        assert_eq!(total, d("38.66"));
    }

    #[test]
    fn sin_renglones_todo_es_cero() {
        let (subtotal, tax, total) = compute_totals(std::iter::empty());
        assert_eq!(subtotal, Decimal::ZERO);
        assert_eq!(tax, Decimal::ZERO);
        assert_eq!(total, Decimal::ZERO);
    }
}
