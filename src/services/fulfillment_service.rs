// src/services/fulfillment_service.rs
//
// El orquestador de conversión: toma una cotización o un pedido en línea y
// lo vuelve una venta comprometida. Valida estado, pre-valida stock (listando
// TODOS los renglones que fallan), pide folio, crea venta + renglones, baja
// stock vía el Stock Ledger, sube la deuda si es crédito y consume la fuente.
// Todo dentro de UNA transacción: una venta parcial jamás es observable.

use std::collections::HashMap;

use chrono::Utc;
use rust_decimal::Decimal;
use sqlx::{Acquire, Executor, PgConnection, Postgres};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::{
        CustomerRepository, DocumentRepository, ProductRepository, SaleRepository,
        sale_repo::NewSale,
    },
    models::{
        crm::Customer,
        documents::{GatewaySettlement, OrderStatus, OrderType, PaymentDecision, QuotationStatus},
        inventory::{MovementType, StockShortage},
        sales::{PaymentMethod, PaymentStatus, Sale},
    },
    services::{
        folio_service::{FolioSeries, FolioService},
        stock_service::StockService,
    },
};

// Un renglón normalizado, venga de donde venga la fuente
#[derive(Debug, Clone)]
struct SourceLine {
    product_id: Uuid,
    quantity: Decimal,
    unit_price: Decimal,
    total: Decimal,
}

// Cómo identifica la fuente a su cliente
enum CustomerRef<'a> {
    Existing(Uuid),
    Contact {
        name: &'a str,
        email: Option<&'a str>,
        phone: Option<&'a str>,
    },
    Anonymous,
}

// La interfaz mínima compartida entre ambas fuentes: renglones, totales,
// referencia de cliente y los ids para ligar la venta con su origen.
struct SourceDoc<'a> {
    doc_number: &'a str,
    customer: CustomerRef<'a>,
    lines: Vec<SourceLine>,
    subtotal: Decimal,
    tax: Decimal,
    total: Decimal,
    source_quotation_id: Option<Uuid>,
    source_order_id: Option<Uuid>,
}

#[derive(Clone)]
pub struct FulfillmentService {
    document_repo: DocumentRepository,
    customer_repo: CustomerRepository,
    sale_repo: SaleRepository,
    product_repo: ProductRepository,
    stock_service: StockService,
    folio_service: FolioService,
}

impl FulfillmentService {
    pub fn new(
        document_repo: DocumentRepository,
        customer_repo: CustomerRepository,
        sale_repo: SaleRepository,
        product_repo: ProductRepository,
        stock_service: StockService,
        folio_service: FolioService,
    ) -> Self {
        Self {
            document_repo,
            customer_repo,
            sale_repo,
            product_repo,
            stock_service,
            folio_service,
        }
    }

    // =========================================================================
    //  COTIZACIÓN → VENTA
    // =========================================================================

    pub async fn convert_quotation<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        quotation_id: Uuid,
        decision: &PaymentDecision,
    ) -> Result<Sale, AppError>
    where
        E: Executor<'e, Database = Postgres> + Acquire<'e, Database = Postgres>,
    {
        let mut tx = executor.begin().await?;

        // 1. Candado sobre la fuente: la segunda conversión concurrente espera
        //    aquí y al releer encuentra converted_to_sale_id ya puesto.
        let quotation = self
            .document_repo
            .get_quotation_for_update(&mut *tx, tenant_id, quotation_id)
            .await?
            .ok_or(AppError::NotFound)?;

        // 2. Validación de estado, ANTES de cualquier mutación
        if quotation.converted_to_sale_id.is_some()
            || quotation.status == QuotationStatus::Converted
        {
            return Err(AppError::AlreadyConverted);
        }
        if quotation.status == QuotationStatus::Cancelled {
            return Err(AppError::InvalidState("la cotización está cancelada".into()));
        }
        if quotation.status == QuotationStatus::Expired {
            return Err(AppError::QuotationExpired);
        }
        if quotation.valid_until < Utc::now() {
            // Vencida por fecha: se marca EXPIRED de una vez (expiración
            // perezosa) y la conversión no procede.
            self.document_repo
                .expire_quotation(&mut *tx, tenant_id, quotation_id)
                .await?;
            tx.commit().await?;
            return Err(AppError::QuotationExpired);
        }

        let items = self
            .document_repo
            .get_quotation_items(&mut *tx, quotation_id)
            .await?;
        if items.is_empty() {
            return Err(AppError::InvalidState("la cotización no tiene renglones".into()));
        }

        let source = SourceDoc {
            doc_number: &quotation.folio,
            customer: match quotation.customer_id {
                Some(id) => CustomerRef::Existing(id),
                None => CustomerRef::Anonymous,
            },
            lines: items
                .iter()
                .map(|i| SourceLine {
                    product_id: i.product_id,
                    quantity: i.quantity,
                    unit_price: i.unit_price,
                    total: i.total,
                })
                .collect(),
            subtotal: quotation.subtotal,
            tax: quotation.tax,
            total: quotation.total,
            source_quotation_id: Some(quotation.id),
            source_order_id: None,
        };

        let sale = self
            .create_sale_from_source(&mut tx, tenant_id, &source, decision)
            .await?;

        // 6. Consume la fuente (escritura condicionada: cero filas = conflicto)
        self.document_repo
            .mark_quotation_converted(&mut *tx, tenant_id, quotation_id, sale.id)
            .await?;

        tx.commit().await?;

        tracing::info!(%tenant_id, folio = %sale.folio, origen = %quotation.folio, "cotización convertida a venta");
        Ok(sale)
    }

    // =========================================================================
    //  PEDIDO EN LÍNEA → VENTA
    // =========================================================================

    /// Convierte un pedido en línea. Si viene `settlement` (cobro con tarjeta
    /// por pasarela), un success == true dispara la conversión inmediata; un
    /// rechazo marca el pedido como FAILED y no convierte nada.
    pub async fn convert_online_order<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        order_id: Uuid,
        decision: &PaymentDecision,
        settlement: Option<&GatewaySettlement>,
    ) -> Result<Sale, AppError>
    where
        E: Executor<'e, Database = Postgres> + Acquire<'e, Database = Postgres>,
    {
        let mut tx = executor.begin().await?;

        let order = self
            .document_repo
            .get_order_for_update(&mut *tx, tenant_id, order_id)
            .await?
            .ok_or(AppError::NotFound)?;

        if order.sale_id.is_some() || order.status == OrderStatus::Completed {
            return Err(AppError::AlreadyConverted);
        }
        if order.status == OrderStatus::Failed {
            return Err(AppError::InvalidState("el pedido está marcado como fallido".into()));
        }
        // Un pedido tipo QUOTE nunca produce una venta
        if order.order_type == OrderType::Quote {
            return Err(AppError::UnsupportedType);
        }

        // Liquidación de pasarela: el rechazo sí cambia estado (pedido FAILED),
        // y se reporta como conflicto; nada se convierte.
        if let Some(settlement) = settlement {
            if !settlement.success {
                let reason = settlement.error.clone().unwrap_or_else(|| "sin detalle".into());
                self.document_repo
                    .mark_order_failed(&mut *tx, tenant_id, order_id, Some("FAILED"))
                    .await?;
                tx.commit().await?;
                tracing::warn!(%tenant_id, %order_id, %reason, "pasarela rechazó el cobro");
                return Err(AppError::PaymentDeclined(reason));
            }
        }

        let items = self
            .document_repo
            .get_order_items(&mut *tx, order_id)
            .await?;
        if items.is_empty() {
            return Err(AppError::InvalidState("el pedido no tiene renglones".into()));
        }

        let source = SourceDoc {
            doc_number: &order.order_number,
            customer: CustomerRef::Contact {
                name: &order.customer_name,
                email: order.customer_email.as_deref(),
                phone: order.customer_phone.as_deref(),
            },
            lines: items
                .iter()
                .map(|i| SourceLine {
                    product_id: i.product_id,
                    quantity: i.quantity,
                    unit_price: i.unit_price,
                    total: i.total,
                })
                .collect(),
            subtotal: order.subtotal,
            tax: order.tax,
            total: order.total,
            source_quotation_id: None,
            source_order_id: Some(order.id),
        };

        let sale = self
            .create_sale_from_source(&mut tx, tenant_id, &source, decision)
            .await?;

        let gateway_txn = settlement.and_then(|s| s.transaction_id.as_deref());
        self.document_repo
            .mark_order_converted(&mut *tx, tenant_id, order_id, sale.id, gateway_txn)
            .await?;

        tx.commit().await?;

        tracing::info!(%tenant_id, folio = %sale.folio, origen = %order.order_number, "pedido convertido a venta");
        Ok(sale)
    }

    // =========================================================================
    //  CAMINO COMPARTIDO (pasos 1–5 de la conversión)
    // =========================================================================

    async fn create_sale_from_source(
        &self,
        tx: &mut sqlx::Transaction<'_, Postgres>,
        tenant_id: Uuid,
        source: &SourceDoc<'_>,
        decision: &PaymentDecision,
    ) -> Result<Sale, AppError> {
        let conn: &mut PgConnection = &mut *tx;

        // Pre-validación de stock, solo lectura. Se reporta CADA renglón que
        // falla; la garantía dura la da después el decremento condicionado.
        let product_ids: Vec<Uuid> = source.lines.iter().map(|l| l.product_id).collect();
        let stocks = self
            .product_repo
            .get_stock_levels(&mut *conn, tenant_id, &product_ids)
            .await?;

        let available: HashMap<Uuid, (String, Decimal)> = stocks
            .into_iter()
            .map(|r| (r.id, (r.name, r.stock)))
            .collect();

        // Un producto que no apareció no es de este tenant: not-found
        if source.lines.iter().any(|l| !available.contains_key(&l.product_id)) {
            return Err(AppError::NotFound);
        }

        let requested = aggregate_requested(source.lines.iter().map(|l| (l.product_id, l.quantity)));
        let shortages = collect_shortages(&requested, &available);
        if !shortages.is_empty() {
            return Err(AppError::InsufficientStock(shortages));
        }

        // 1. Resuelve (o crea) el cliente
        let customer = self.resolve_customer(&mut *conn, tenant_id, &source.customer).await?;

        if decision.payment_method == PaymentMethod::Credito && customer.is_none() {
            return Err(AppError::InvalidState(
                "una venta a crédito necesita un cliente identificado".into(),
            ));
        }

        // 2. Folio de la serie de ventas
        let folio = self
            .folio_service
            .next_folio(&mut *conn, tenant_id, FolioSeries::Sale)
            .await?;

        // 3. Crea la venta con los totales copiados de la fuente
        let (amount_paid, remaining_balance, payment_status) =
            initial_payment_fields(decision.payment_method, source.total);

        let sale = self
            .sale_repo
            .insert(
                &mut *conn,
                tenant_id,
                NewSale {
                    folio: &folio,
                    customer_id: customer.as_ref().map(|c| c.id),
                    subtotal: source.subtotal,
                    tax: source.tax,
                    total: source.total,
                    payment_method: decision.payment_method,
                    amount_paid,
                    remaining_balance,
                    payment_status,
                    due_date: if decision.payment_method == PaymentMethod::Credito {
                        decision.due_date
                    } else {
                        None
                    },
                    source_quotation_id: source.source_quotation_id,
                    source_order_id: source.source_order_id,
                },
            )
            .await?;

        // 4. Renglones + salidas de stock, con razón legible que liga folio y fuente
        let reason = format!("Venta {} ({})", folio, source.doc_number);
        for line in &source.lines {
            self.sale_repo
                .insert_item(
                    &mut *conn,
                    sale.id,
                    line.product_id,
                    line.quantity,
                    line.unit_price,
                    line.total,
                )
                .await?;

            self.stock_service
                .apply_movement(
                    &mut *conn,
                    tenant_id,
                    line.product_id,
                    MovementType::Salida,
                    line.quantity,
                    &reason,
                    Some(sale.id),
                )
                .await?;
        }

        // 5. Si es crédito, la deuda viva del cliente sube por el total
        if decision.payment_method == PaymentMethod::Credito {
            if let Some(customer) = &customer {
                self.customer_repo
                    .increase_debt(&mut *conn, tenant_id, customer.id, source.total)
                    .await?;
            }
        }

        Ok(sale)
    }

    /// Resolución de cliente: id explícito, o match por email+teléfono, luego
    /// solo email, y si no hay nada se crea. Los datos de contacto se
    /// refrescan desde la fuente.
    async fn resolve_customer(
        &self,
        conn: &mut PgConnection,
        tenant_id: Uuid,
        customer_ref: &CustomerRef<'_>,
    ) -> Result<Option<Customer>, AppError> {
        match customer_ref {
            CustomerRef::Existing(id) => {
                let customer = self
                    .customer_repo
                    .find_by_id(&mut *conn, tenant_id, *id)
                    .await?
                    .ok_or(AppError::NotFound)?;
                Ok(Some(customer))
            }
            CustomerRef::Contact { name, email, phone } => {
                let found = match (email, phone) {
                    (Some(e), Some(p)) => {
                        match self
                            .customer_repo
                            .find_by_email_and_phone(&mut *conn, tenant_id, e, p)
                            .await?
                        {
                            Some(c) => Some(c),
                            None => self.customer_repo.find_by_email(&mut *conn, tenant_id, e).await?,
                        }
                    }
                    (Some(e), None) => {
                        self.customer_repo.find_by_email(&mut *conn, tenant_id, e).await?
                    }
                    _ => None,
                };

                let customer = match found {
                    Some(existing) => {
                        self.customer_repo
                            .update_contact(&mut *conn, tenant_id, existing.id, name, *email, *phone)
                            .await?
                    }
                    None => {
                        self.customer_repo
                            .create(&mut *conn, tenant_id, name, *email, *phone, Decimal::ZERO)
                            .await?
                    }
                };
                Ok(Some(customer))
            }
            CustomerRef::Anonymous => Ok(None),
        }
    }
}

/// Suma las cantidades pedidas por producto (una fuente puede repetir el
/// mismo producto en dos renglones; la validación debe verlos juntos).
fn aggregate_requested(lines: impl Iterator<Item = (Uuid, Decimal)>) -> HashMap<Uuid, Decimal> {
    let mut requested: HashMap<Uuid, Decimal> = HashMap::new();
    for (product_id, quantity) in lines {
        *requested.entry(product_id).or_insert(Decimal::ZERO) += quantity;
    }
    requested
}

/// Compara lo pedido contra lo disponible y devuelve TODOS los faltantes.
fn collect_shortages(
    requested: &HashMap<Uuid, Decimal>,
    available: &HashMap<Uuid, (String, Decimal)>,
) -> Vec<StockShortage> {
    let mut shortages: Vec<StockShortage> = requested
        .iter()
        .filter_map(|(product_id, qty)| {
            let (name, stock) = available.get(product_id)?;
            if stock < qty {
                Some(StockShortage {
                    product_id: *product_id,
                    product_name: name.clone(),
                    requested: *qty,
                    available: *stock,
                })
            } else {
                None
            }
        })
        .collect();
    // Orden estable para que la respuesta no baile entre requests
    shortages.sort_by(|a, b| a.product_id.cmp(&b.product_id));
    shortages
}

/// Campos de dinero iniciales de la venta según el método de pago.
/// Crédito nace debiendo todo; cualquier otro método nace liquidado.
fn initial_payment_fields(method: PaymentMethod, total: Decimal) -> (Decimal, Decimal, PaymentStatus) {
    if method == PaymentMethod::Credito {
        (Decimal::ZERO, total, PaymentStatus::Pending)
    } else {
        (total, Decimal::ZERO, PaymentStatus::Paid)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(s: &str) -> Decimal {
        s.parse().unwrap()
    }

    #[test]
    fn la_prevalidacion_lista_todos_los_faltantes() {
        let p1 = Uuid::new_v4();
        let p2 = Uuid::new_v4();
        let p3 = Uuid::new_v4();

        let requested = aggregate_requested(
            vec![(p1, d("5")), (p2, d("2")), (p3, d("1"))].into_iter(),
        );
        let mut available = HashMap::new();
        available.insert(p1, ("Martillo".to_string(), d("3")));
        available.insert(p2, ("Clavos".to_string(), d("0")));
        available.insert(p3, ("Brocha".to_string(), d("10")));

        let shortages = collect_shortages(&requested, &available);
        // Fallan dos renglones y los dos deben venir en el error
        assert_eq!(shortages.len(), 2);
        assert!(shortages.iter().any(|s| s.product_id == p1 && s.available == d("3")));
        assert!(shortages.iter().any(|s| s.product_id == p2 && s.available == d("0")));
    }

    #[test]
    fn renglones_repetidos_del_mismo_producto_se_suman() {
        let p1 = Uuid::new_v4();
        // Dos renglones de 3 con stock de 5: individualmente pasan, juntos no
        let requested = aggregate_requested(vec![(p1, d("3")), (p1, d("3"))].into_iter());
        let mut available = HashMap::new();
        available.insert(p1, ("Cemento".to_string(), d("5")));

        let shortages = collect_shortages(&requested, &available);
        assert_eq!(shortages.len(), 1);
        assert_eq!(shortages[0].requested, d("6"));
    }

    #[test]
    fn con_stock_suficiente_no_hay_faltantes() {
        let p1 = Uuid::new_v4();
        let requested = aggregate_requested(vec![(p1, d("3"))].into_iter());
        let mut available = HashMap::new();
        available.insert(p1, ("Taladro".to_string(), d("3")));

        assert!(collect_shortages(&requested, &available).is_empty());
    }

    // Una conversión a crédito de $406 nace debiendo los $406 completos
    #[test]
    fn venta_a_credito_nace_pendiente_por_el_total() {
        let (paid, remaining, status) = initial_payment_fields(PaymentMethod::Credito, d("406.00"));
        assert_eq!(paid, Decimal::ZERO);
        assert_eq!(remaining, d("406.00"));
        assert_eq!(status, PaymentStatus::Pending);
    }

    #[test]
    fn venta_de_contado_nace_liquidada() {
        for method in [
            PaymentMethod::Efectivo,
            PaymentMethod::Tarjeta,
            PaymentMethod::Transferencia,
        ] {
            let (paid, remaining, status) = initial_payment_fields(method, d("406.00"));
            assert_eq!(paid, d("406.00"));
            assert_eq!(remaining, Decimal::ZERO);
            assert_eq!(status, PaymentStatus::Paid);
        }
    }
}
