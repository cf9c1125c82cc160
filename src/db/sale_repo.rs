// src/db/sale_repo.rs

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{Executor, Postgres};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    models::sales::{
        CancellationType, PaymentMethod, PaymentStatus, Sale, SaleCancellation, SaleItem,
        SaleStatus,
    },
};

// Venta abierta con el nombre del cliente, para el reporte de antigüedad
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct OpenCreditSaleRow {
    pub id: Uuid,
    pub folio: String,
    pub customer_id: Option<Uuid>,
    pub customer_name: Option<String>,
    pub remaining_balance: Decimal,
    pub due_date: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

pub struct NewSale<'a> {
    pub folio: &'a str,
    pub customer_id: Option<Uuid>,
    pub subtotal: Decimal,
    pub tax: Decimal,
    pub total: Decimal,
    pub payment_method: PaymentMethod,
    pub amount_paid: Decimal,
    pub remaining_balance: Decimal,
    pub payment_status: PaymentStatus,
    pub due_date: Option<DateTime<Utc>>,
    pub source_quotation_id: Option<Uuid>,
    pub source_order_id: Option<Uuid>,
}

#[derive(Clone)]
pub struct SaleRepository;

impl SaleRepository {
    pub fn new() -> Self {
        Self
    }

    pub async fn insert<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        sale: NewSale<'_>,
    ) -> Result<Sale, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let created = sqlx::query_as::<_, Sale>(
            r#"
            INSERT INTO sales
                (tenant_id, folio, customer_id, subtotal, tax, total,
                 payment_method, status, amount_paid, remaining_balance,
                 payment_status, due_date, source_quotation_id, source_order_id)
            VALUES ($1, $2, $3, $4, $5, $6, $7, 'COMPLETED', $8, $9, $10, $11, $12, $13)
            RETURNING *
            "#,
        )
        .bind(tenant_id)
        .bind(sale.folio)
        .bind(sale.customer_id)
        .bind(sale.subtotal)
        .bind(sale.tax)
        .bind(sale.total)
        .bind(sale.payment_method)
        .bind(sale.amount_paid)
        .bind(sale.remaining_balance)
        .bind(sale.payment_status)
        .bind(sale.due_date)
        .bind(sale.source_quotation_id)
        .bind(sale.source_order_id)
        .fetch_one(executor)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(db_err) = &e {
                // UNIQUE (source_quotation_id) / (source_order_id): una fuente,
                // una sola venta, también bajo concurrencia
                if db_err.is_unique_violation() {
                    return AppError::AlreadyConverted;
                }
            }
            e.into()
        })?;
        Ok(created)
    }

    pub async fn insert_item<'e, E>(
        &self,
        executor: E,
        sale_id: Uuid,
        product_id: Uuid,
        quantity: Decimal,
        unit_price: Decimal,
        total: Decimal,
    ) -> Result<SaleItem, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let item = sqlx::query_as::<_, SaleItem>(
            r#"
            INSERT INTO sale_items (sale_id, product_id, quantity, unit_price, total)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *
            "#,
        )
        .bind(sale_id)
        .bind(product_id)
        .bind(quantity)
        .bind(unit_price)
        .bind(total)
        .fetch_one(executor)
        .await?;
        Ok(item)
    }

    pub async fn get_by_id<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        sale_id: Uuid,
    ) -> Result<Option<Sale>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let sale = sqlx::query_as::<_, Sale>(
            "SELECT * FROM sales WHERE id = $1 AND tenant_id = $2",
        )
        .bind(sale_id)
        .bind(tenant_id)
        .fetch_optional(executor)
        .await?;
        Ok(sale)
    }

    /// Con candado de fila: pagos y cancelaciones releen el estado bajo
    /// FOR UPDATE para que la segunda operación concurrente vea la primera.
    pub async fn get_for_update<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        sale_id: Uuid,
    ) -> Result<Option<Sale>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let sale = sqlx::query_as::<_, Sale>(
            "SELECT * FROM sales WHERE id = $1 AND tenant_id = $2 FOR UPDATE",
        )
        .bind(sale_id)
        .bind(tenant_id)
        .fetch_optional(executor)
        .await?;
        Ok(sale)
    }

    /// Renglones de una venta ya verificada como del tenant (sale_items no
    /// carga tenant_id propio; la propiedad se valida en la venta).
    pub async fn get_items<'e, E>(
        &self,
        executor: E,
        sale_id: Uuid,
    ) -> Result<Vec<SaleItem>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let items = sqlx::query_as::<_, SaleItem>(
            "SELECT * FROM sale_items WHERE sale_id = $1",
        )
        .bind(sale_id)
        .fetch_all(executor)
        .await?;
        Ok(items)
    }

    pub async fn update_payment_fields<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        sale_id: Uuid,
        amount_paid: Decimal,
        remaining_balance: Decimal,
        payment_status: PaymentStatus,
    ) -> Result<Sale, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let sale = sqlx::query_as::<_, Sale>(
            r#"
            UPDATE sales
            SET amount_paid = $3, remaining_balance = $4, payment_status = $5, updated_at = now()
            WHERE id = $1 AND tenant_id = $2
            RETURNING *
            "#,
        )
        .bind(sale_id)
        .bind(tenant_id)
        .bind(amount_paid)
        .bind(remaining_balance)
        .bind(payment_status)
        .fetch_one(executor)
        .await?;
        Ok(sale)
    }

    pub async fn update_status<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        sale_id: Uuid,
        status: SaleStatus,
    ) -> Result<Sale, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let sale = sqlx::query_as::<_, Sale>(
            r#"
            UPDATE sales
            SET status = $3, updated_at = now()
            WHERE id = $1 AND tenant_id = $2
            RETURNING *
            "#,
        )
        .bind(sale_id)
        .bind(tenant_id)
        .bind(status)
        .fetch_one(executor)
        .await?;
        Ok(sale)
    }

    pub async fn insert_cancellation<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        sale_id: Uuid,
        cancellation_type: CancellationType,
        reason: &str,
        refund_amount: Decimal,
    ) -> Result<SaleCancellation, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let cancellation = sqlx::query_as::<_, SaleCancellation>(
            r#"
            INSERT INTO sale_cancellations
                (tenant_id, sale_id, cancellation_type, reason, refund_amount)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *
            "#,
        )
        .bind(tenant_id)
        .bind(sale_id)
        .bind(cancellation_type)
        .bind(reason)
        .bind(refund_amount)
        .fetch_one(executor)
        .await?;
        Ok(cancellation)
    }

    /// Ventas con saldo pendiente, base del reporte de antigüedad. Solo
    /// cuentan las que siguen "abiertas": canceladas y reembolsadas no deben.
    pub async fn get_open_credit_sales<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
    ) -> Result<Vec<OpenCreditSaleRow>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let rows = sqlx::query_as::<_, OpenCreditSaleRow>(
            r#"
            SELECT s.id, s.folio, s.customer_id, c.name AS customer_name,
                   s.remaining_balance, s.due_date, s.created_at
            FROM sales s
            LEFT JOIN customers c ON c.id = s.customer_id
            WHERE s.tenant_id = $1
              AND s.remaining_balance > 0
              AND s.status IN ('COMPLETED', 'PARTIAL_REFUND')
            ORDER BY s.created_at ASC
            "#,
        )
        .bind(tenant_id)
        .fetch_all(executor)
        .await?;
        Ok(rows)
    }

    /// Ventas abiertas de UN cliente (estado de cuenta).
    pub async fn get_open_sales_for_customer<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        customer_id: Uuid,
    ) -> Result<Vec<Sale>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let sales = sqlx::query_as::<_, Sale>(
            r#"
            SELECT * FROM sales
            WHERE tenant_id = $1
              AND customer_id = $2
              AND remaining_balance > 0
              AND status IN ('COMPLETED', 'PARTIAL_REFUND')
            ORDER BY created_at ASC
            "#,
        )
        .bind(tenant_id)
        .bind(customer_id)
        .fetch_all(executor)
        .await?;
        Ok(sales)
    }
}
