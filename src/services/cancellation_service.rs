// src/services/cancellation_service.rs
//
// Cancelación de ventas. La total devuelve todo el stock y libera la deuda
// abierta; la parcial NO repone stock por sí sola: el caller decide qué
// regresa mandando restock_items explícitos. Siempre queda el renglón de
// auditoría en sale_cancellations.

use rust_decimal::Decimal;
use sqlx::{Acquire, Executor, Postgres};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::{CustomerRepository, SaleRepository},
    models::{
        inventory::MovementType,
        sales::{CancellationType, PaymentMethod, SaleCancellation, SaleStatus},
    },
    services::stock_service::StockService,
};

/// Reposición explícita de un renglón en una cancelación parcial.
#[derive(Debug, Clone)]
pub struct RestockItem {
    pub product_id: Uuid,
    pub quantity: Decimal,
}

#[derive(Clone)]
pub struct CancellationService {
    sale_repo: SaleRepository,
    customer_repo: CustomerRepository,
    stock_service: StockService,
}

impl CancellationService {
    pub fn new(
        sale_repo: SaleRepository,
        customer_repo: CustomerRepository,
        stock_service: StockService,
    ) -> Self {
        Self {
            sale_repo,
            customer_repo,
            stock_service,
        }
    }

    pub async fn cancel_sale<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        sale_id: Uuid,
        cancellation_type: CancellationType,
        reason: &str,
        refund_amount: Decimal,
        restock_items: Option<&[RestockItem]>,
    ) -> Result<SaleCancellation, AppError>
    where
        E: Executor<'e, Database = Postgres> + Acquire<'e, Database = Postgres>,
    {
        let mut tx = executor.begin().await?;

        // Candado de fila: dos cancelaciones concurrentes se serializan y la
        // segunda ve el estatus ya terminal.
        let sale = self
            .sale_repo
            .get_for_update(&mut *tx, tenant_id, sale_id)
            .await?
            .ok_or(AppError::NotFound)?;

        if matches!(sale.status, SaleStatus::Cancelled | SaleStatus::Refunded) {
            return Err(AppError::AlreadyCancelled);
        }

        validate_refund_amount(refund_amount, sale.total)?;

        let movement_reason = format!("Cancelación de venta {}", sale.folio);

        match cancellation_type {
            CancellationType::Full => {
                // Todo el stock de la venta regresa, renglón por renglón
                let items = self.sale_repo.get_items(&mut *tx, sale_id).await?;
                for item in &items {
                    self.stock_service
                        .apply_movement(
                            &mut *tx,
                            tenant_id,
                            item.product_id,
                            MovementType::CancelSale,
                            item.quantity,
                            &movement_reason,
                            Some(sale_id),
                        )
                        .await?;
                }

                // La deuda abierta de una venta a crédito deja de existir:
                // el saldo pendiente se libera del cliente.
                if sale.payment_method == PaymentMethod::Credito
                    && sale.remaining_balance > Decimal::ZERO
                {
                    if let Some(customer_id) = sale.customer_id {
                        self.customer_repo
                            .decrease_debt(&mut *tx, tenant_id, customer_id, sale.remaining_balance)
                            .await?;
                    }
                }
            }
            CancellationType::Partial => {
                // Solo lo que el caller pida explícitamente regresa al stock
                if let Some(restock) = restock_items {
                    for item in restock {
                        self.stock_service
                            .apply_movement(
                                &mut *tx,
                                tenant_id,
                                item.product_id,
                                MovementType::CancelSale,
                                item.quantity,
                                &movement_reason,
                                Some(sale_id),
                            )
                            .await?;
                    }
                }
            }
        }

        let new_status = status_after_cancellation(cancellation_type, refund_amount);
        self.sale_repo
            .update_status(&mut *tx, tenant_id, sale_id, new_status)
            .await?;

        let cancellation = self
            .sale_repo
            .insert_cancellation(&mut *tx, tenant_id, sale_id, cancellation_type, reason, refund_amount)
            .await?;

        tx.commit().await?;

        tracing::info!(
            %tenant_id, folio = %sale.folio, ?cancellation_type, %refund_amount,
            "venta cancelada"
        );

        Ok(cancellation)
    }
}

/// El reembolso solo puede ir de cero al total de la venta.
fn validate_refund_amount(refund_amount: Decimal, total: Decimal) -> Result<(), AppError> {
    if refund_amount < Decimal::ZERO || refund_amount > total {
        return Err(AppError::InvalidRefundAmount);
    }
    Ok(())
}

/// Estatus terminal de la venta según tipo de cancelación y reembolso.
fn status_after_cancellation(
    cancellation_type: CancellationType,
    refund_amount: Decimal,
) -> SaleStatus {
    match cancellation_type {
        CancellationType::Full => {
            if refund_amount > Decimal::ZERO {
                SaleStatus::Refunded
            } else {
                SaleStatus::Cancelled
            }
        }
        CancellationType::Partial => SaleStatus::PartialRefund,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(s: &str) -> Decimal {
        s.parse().unwrap()
    }

    #[test]
    fn el_reembolso_no_puede_ser_negativo_ni_exceder_el_total() {
        assert!(validate_refund_amount(d("-0.01"), d("500")).is_err());
        assert!(validate_refund_amount(d("500.01"), d("500")).is_err());
        assert!(validate_refund_amount(Decimal::ZERO, d("500")).is_ok());
        assert!(validate_refund_amount(d("500"), d("500")).is_ok());
        assert!(validate_refund_amount(d("250"), d("500")).is_ok());
    }

    // Cancelación total con reembolso deja la venta REFUNDED
    #[test]
    fn cancelacion_total_con_reembolso_queda_refunded() {
        assert_eq!(
            status_after_cancellation(CancellationType::Full, d("406.00")),
            SaleStatus::Refunded
        );
    }

    #[test]
    fn cancelacion_total_sin_reembolso_queda_cancelled() {
        assert_eq!(
            status_after_cancellation(CancellationType::Full, Decimal::ZERO),
            SaleStatus::Cancelled
        );
    }

    #[test]
    fn cancelacion_parcial_siempre_queda_partial_refund() {
        assert_eq!(
            status_after_cancellation(CancellationType::Partial, d("100")),
            SaleStatus::PartialRefund
        );
        assert_eq!(
            status_after_cancellation(CancellationType::Partial, Decimal::ZERO),
            SaleStatus::PartialRefund
        );
    }
}
