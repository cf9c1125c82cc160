// src/services/payment_service.rs
//
// El Payment Ledger: único escritor de customers.current_debt. Aplica un
// abono contra una venta (o contra el saldo general del cliente), recalcula
// pagado/saldo/estatus y deja el renglón inmutable del pago. Todo en una
// transacción: o entra completo o no entra nada.

use rust_decimal::Decimal;
use sqlx::{Acquire, Executor, Postgres};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::{CustomerRepository, SaleRepository},
    models::{
        crm::{Customer, CustomerPayment},
        sales::{PaymentMethod, PaymentStatus, Sale, SaleStatus},
    },
};

// Tolerancia para "quedó pagada": evita falsos negativos por redondeo
const PAID_EPSILON: Decimal = Decimal::from_parts(1, 0, 0, false, 2); // 0.01

#[derive(Debug)]
pub struct PaymentOutcome {
    pub payment: CustomerPayment,
    pub sale: Option<Sale>,
    pub customer: Customer,
}

#[derive(Clone)]
pub struct PaymentService {
    customer_repo: CustomerRepository,
    sale_repo: SaleRepository,
}

impl PaymentService {
    pub fn new(customer_repo: CustomerRepository, sale_repo: SaleRepository) -> Self {
        Self {
            customer_repo,
            sale_repo,
        }
    }

    pub async fn apply_payment<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        customer_id: Uuid,
        amount: Decimal,
        method: PaymentMethod,
        sale_id: Option<Uuid>,
        reference: Option<&str>,
    ) -> Result<PaymentOutcome, AppError>
    where
        E: Executor<'e, Database = Postgres> + Acquire<'e, Database = Postgres>,
    {
        if amount <= Decimal::ZERO {
            return Err(AppError::InvalidState("el monto del pago debe ser positivo".into()));
        }

        let mut tx = executor.begin().await?;

        // 1. Candado sobre el cliente: dos abonos concurrentes se serializan aquí
        let customer = self
            .customer_repo
            .find_by_id_for_update(&mut *tx, tenant_id, customer_id)
            .await?
            .ok_or(AppError::NotFound)?;

        // 2. Si el abono va contra una venta específica, recalcula su saldo
        let updated_sale = match sale_id {
            Some(sale_id) => {
                let sale = self
                    .sale_repo
                    .get_for_update(&mut *tx, tenant_id, sale_id)
                    .await?
                    .ok_or(AppError::NotFound)?;

                ensure_sale_payable(&sale, customer_id)?;

                // No se acepta pagar de más: el excedente no tiene a dónde ir
                if amount > sale.remaining_balance {
                    return Err(AppError::AmountExceedsBalance);
                }

                let (amount_paid, remaining, status) =
                    recompute_balance(sale.total, sale.amount_paid, amount);

                let sale = self
                    .sale_repo
                    .update_payment_fields(&mut *tx, tenant_id, sale_id, amount_paid, remaining, status)
                    .await?;
                Some(sale)
            }
            // Sin venta: abono al saldo general, ninguna venta se toca
            None => None,
        };

        // 3. Renglón inmutable del pago
        let payment = self
            .customer_repo
            .record_payment(&mut *tx, tenant_id, customer_id, sale_id, amount, method, reference)
            .await?;

        // 4. Baja la deuda viva del cliente (nunca debajo de cero)
        let customer = self
            .customer_repo
            .decrease_debt(&mut *tx, tenant_id, customer.id, amount)
            .await?;

        tx.commit().await?;

        tracing::info!(
            %tenant_id, %customer_id, %amount, sale = ?sale_id,
            "pago aplicado"
        );

        Ok(PaymentOutcome {
            payment,
            sale: updated_sale,
            customer,
        })
    }
}

/// Una venta solo acepta abonos de su propio cliente y mientras siga viva.
/// La venta de otro cliente se trata como inexistente (igual que el acceso
/// cruzado entre tenants); una cancelada o reembolsada ya liberó su saldo de
/// la deuda del cliente y abonarle la descontaría dos veces.
fn ensure_sale_payable(sale: &Sale, customer_id: Uuid) -> Result<(), AppError> {
    if sale.customer_id != Some(customer_id) {
        return Err(AppError::NotFound);
    }
    if matches!(sale.status, SaleStatus::Cancelled | SaleStatus::Refunded) {
        return Err(AppError::InvalidState(
            "la venta está cancelada; su saldo ya no es cobrable".into(),
        ));
    }
    Ok(())
}

/// Recalcula pagado/saldo/estatus tras un abono. El saldo se fija en
/// total - pagado (con clamp a cero contra el redondeo) y la venta queda
/// PAID cuando el saldo cae dentro de la tolerancia de 0.01.
fn recompute_balance(
    total: Decimal,
    amount_paid: Decimal,
    payment: Decimal,
) -> (Decimal, Decimal, PaymentStatus) {
    let new_paid = amount_paid + payment;
    let remaining = (total - new_paid).max(Decimal::ZERO);
    let status = if remaining <= PAID_EPSILON {
        PaymentStatus::Paid
    } else {
        PaymentStatus::Partial
    };
    (new_paid, remaining, status)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(s: &str) -> Decimal {
        s.parse().unwrap()
    }

    fn venta_a_credito(customer_id: Option<Uuid>, status: SaleStatus) -> Sale {
        let now = chrono::Utc::now();
        Sale {
            id: Uuid::new_v4(),
            tenant_id: Uuid::new_v4(),
            folio: "VTA-000001".into(),
            customer_id,
            subtotal: d("350.00"),
            tax: d("56.00"),
            total: d("406.00"),
            payment_method: PaymentMethod::Credito,
            status,
            amount_paid: Decimal::ZERO,
            remaining_balance: d("406.00"),
            payment_status: PaymentStatus::Pending,
            due_date: None,
            source_quotation_id: None,
            source_order_id: None,
            created_at: now,
            updated_at: now,
        }
    }

    // La venta de un cliente no recibe abonos a nombre de otro
    #[test]
    fn abono_contra_venta_de_otro_cliente_se_trata_como_inexistente() {
        let duenio = Uuid::new_v4();
        let sale = venta_a_credito(Some(duenio), SaleStatus::Completed);
        let otro = Uuid::new_v4();
        assert!(matches!(
            ensure_sale_payable(&sale, otro),
            Err(AppError::NotFound)
        ));
    }

    #[test]
    fn venta_de_mostrador_sin_cliente_no_acepta_abonos_dirigidos() {
        let sale = venta_a_credito(None, SaleStatus::Completed);
        assert!(matches!(
            ensure_sale_payable(&sale, Uuid::new_v4()),
            Err(AppError::NotFound)
        ));
    }

    // Una venta cancelada ya liberó su saldo de la deuda: abonarle lo
    // descontaría por segunda vez
    #[test]
    fn abono_contra_venta_cancelada_o_reembolsada_se_rechaza() {
        let cliente = Uuid::new_v4();
        for status in [SaleStatus::Cancelled, SaleStatus::Refunded] {
            let sale = venta_a_credito(Some(cliente), status);
            assert!(matches!(
                ensure_sale_payable(&sale, cliente),
                Err(AppError::InvalidState(_))
            ));
        }
    }

    #[test]
    fn venta_viva_del_propio_cliente_acepta_abonos() {
        let cliente = Uuid::new_v4();
        for status in [SaleStatus::Completed, SaleStatus::PartialRefund] {
            let sale = venta_a_credito(Some(cliente), status);
            assert!(ensure_sale_payable(&sale, cliente).is_ok());
        }
    }

    // Venta de $1000 con abono de $400
    #[test]
    fn abono_parcial_deja_saldo_y_estatus_partial() {
        let (paid, remaining, status) = recompute_balance(d("1000"), d("0"), d("400"));
        assert_eq!(paid, d("400"));
        assert_eq!(remaining, d("600"));
        assert_eq!(status, PaymentStatus::Partial);
    }

    // El segundo abono de $600 liquida la venta anterior
    #[test]
    fn abono_final_liquida_la_venta() {
        let (paid, remaining, status) = recompute_balance(d("1000"), d("400"), d("600"));
        assert_eq!(paid, d("1000"));
        assert_eq!(remaining, d("0"));
        assert_eq!(status, PaymentStatus::Paid);
    }

    #[test]
    fn residuo_dentro_de_la_tolerancia_cuenta_como_pagada() {
        // Queda un centavo de residuo: dentro del epsilon de 0.01
        let (_, remaining, status) = recompute_balance(d("100.00"), d("0"), d("99.99"));
        assert_eq!(remaining, d("0.01"));
        assert_eq!(status, PaymentStatus::Paid);
    }

    #[test]
    fn residuo_mayor_a_la_tolerancia_sigue_parcial() {
        let (_, remaining, status) = recompute_balance(d("100.00"), d("0"), d("99.98"));
        assert_eq!(remaining, d("0.02"));
        assert_eq!(status, PaymentStatus::Partial);
    }

    #[test]
    fn el_saldo_nunca_baja_de_cero() {
        // Redondeos acumulados podrían empujar el saldo a negativo: clamp
        let (paid, remaining, _) = recompute_balance(d("100.00"), d("50.005"), d("50.005"));
        assert_eq!(paid, d("100.010"));
        assert_eq!(remaining, Decimal::ZERO);
    }

    // Después de cada abono: pagado + saldo == total (tolerancia 0.01)
    #[test]
    fn invariante_de_dinero_se_conserva() {
        let total = d("406.00");
        let mut paid = Decimal::ZERO;
        for abono in ["100.00", "200.00", "106.00"] {
            let (new_paid, remaining, _) = recompute_balance(total, paid, d(abono));
            assert!((new_paid + remaining - total).abs() <= d("0.01"));
            paid = new_paid;
        }
        assert_eq!(paid, total);
    }
}
