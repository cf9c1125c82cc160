// src/db/document_repo.rs
//
// Cotizaciones y pedidos en línea: los documentos fuente que el orquestador
// consume al convertir.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{Executor, Postgres};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    models::documents::{OnlineOrder, OnlineOrderItem, OrderType, Quotation, QuotationItem},
};

pub struct NewDocumentItem {
    pub product_id: Uuid,
    pub quantity: Decimal,
    pub unit_price: Decimal,
    pub total: Decimal,
}

#[derive(Clone)]
pub struct DocumentRepository;

impl DocumentRepository {
    pub fn new() -> Self {
        Self
    }

    // =========================================================================
    //  COTIZACIONES
    // =========================================================================

    pub async fn insert_quotation<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        folio: &str,
        customer_id: Option<Uuid>,
        subtotal: Decimal,
        tax: Decimal,
        total: Decimal,
        valid_until: DateTime<Utc>,
    ) -> Result<Quotation, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let quotation = sqlx::query_as::<_, Quotation>(
            r#"
            INSERT INTO quotations
                (tenant_id, folio, customer_id, subtotal, tax, total, status, valid_until)
            VALUES ($1, $2, $3, $4, $5, $6, 'SENT', $7)
            RETURNING *
            "#,
        )
        .bind(tenant_id)
        .bind(folio)
        .bind(customer_id)
        .bind(subtotal)
        .bind(tax)
        .bind(total)
        .bind(valid_until)
        .fetch_one(executor)
        .await?;
        Ok(quotation)
    }

    pub async fn insert_quotation_item<'e, E>(
        &self,
        executor: E,
        quotation_id: Uuid,
        item: &NewDocumentItem,
    ) -> Result<QuotationItem, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let created = sqlx::query_as::<_, QuotationItem>(
            r#"
            INSERT INTO quotation_items (quotation_id, product_id, quantity, unit_price, total)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *
            "#,
        )
        .bind(quotation_id)
        .bind(item.product_id)
        .bind(item.quantity)
        .bind(item.unit_price)
        .bind(item.total)
        .fetch_one(executor)
        .await?;
        Ok(created)
    }

    /// Candado de fila sobre la fuente: la segunda conversión concurrente se
    /// queda esperando aquí y al despertar ve converted_to_sale_id ya puesto.
    pub async fn get_quotation_for_update<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        quotation_id: Uuid,
    ) -> Result<Option<Quotation>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let quotation = sqlx::query_as::<_, Quotation>(
            "SELECT * FROM quotations WHERE id = $1 AND tenant_id = $2 FOR UPDATE",
        )
        .bind(quotation_id)
        .bind(tenant_id)
        .fetch_optional(executor)
        .await?;
        Ok(quotation)
    }

    pub async fn get_quotation_items<'e, E>(
        &self,
        executor: E,
        quotation_id: Uuid,
    ) -> Result<Vec<QuotationItem>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let items = sqlx::query_as::<_, QuotationItem>(
            "SELECT * FROM quotation_items WHERE quotation_id = $1",
        )
        .bind(quotation_id)
        .fetch_all(executor)
        .await?;
        Ok(items)
    }

    /// Marca la cotización como consumida. El guard converted_to_sale_id IS NULL
    /// hace la escritura condicionada: cero filas = alguien se nos adelantó.
    pub async fn mark_quotation_converted<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        quotation_id: Uuid,
        sale_id: Uuid,
    ) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let result = sqlx::query(
            r#"
            UPDATE quotations
            SET status = 'CONVERTED', converted_to_sale_id = $3,
                converted_at = now(), updated_at = now()
            WHERE id = $1 AND tenant_id = $2 AND converted_to_sale_id IS NULL
            "#,
        )
        .bind(quotation_id)
        .bind(tenant_id)
        .bind(sale_id)
        .execute(executor)
        .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::AlreadyConverted);
        }
        Ok(())
    }

    pub async fn expire_quotation<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        quotation_id: Uuid,
    ) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query(
            r#"
            UPDATE quotations
            SET status = 'EXPIRED', updated_at = now()
            WHERE id = $1 AND tenant_id = $2 AND status IN ('DRAFT', 'SENT')
            "#,
        )
        .bind(quotation_id)
        .bind(tenant_id)
        .execute(executor)
        .await?;
        Ok(())
    }

    // =========================================================================
    //  PEDIDOS EN LÍNEA
    // =========================================================================

    pub async fn insert_order<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        order_number: &str,
        order_type: OrderType,
        customer_name: &str,
        customer_email: Option<&str>,
        customer_phone: Option<&str>,
        subtotal: Decimal,
        tax: Decimal,
        total: Decimal,
    ) -> Result<OnlineOrder, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let order = sqlx::query_as::<_, OnlineOrder>(
            r#"
            INSERT INTO online_orders
                (tenant_id, order_number, order_type, customer_name,
                 customer_email, customer_phone, subtotal, tax, total, status)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, 'PENDING')
            RETURNING *
            "#,
        )
        .bind(tenant_id)
        .bind(order_number)
        .bind(order_type)
        .bind(customer_name)
        .bind(customer_email)
        .bind(customer_phone)
        .bind(subtotal)
        .bind(tax)
        .bind(total)
        .fetch_one(executor)
        .await?;
        Ok(order)
    }

    pub async fn insert_order_item<'e, E>(
        &self,
        executor: E,
        order_id: Uuid,
        item: &NewDocumentItem,
    ) -> Result<OnlineOrderItem, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let created = sqlx::query_as::<_, OnlineOrderItem>(
            r#"
            INSERT INTO online_order_items (order_id, product_id, quantity, unit_price, total)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *
            "#,
        )
        .bind(order_id)
        .bind(item.product_id)
        .bind(item.quantity)
        .bind(item.unit_price)
        .bind(item.total)
        .fetch_one(executor)
        .await?;
        Ok(created)
    }

    pub async fn get_order_for_update<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        order_id: Uuid,
    ) -> Result<Option<OnlineOrder>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let order = sqlx::query_as::<_, OnlineOrder>(
            "SELECT * FROM online_orders WHERE id = $1 AND tenant_id = $2 FOR UPDATE",
        )
        .bind(order_id)
        .bind(tenant_id)
        .fetch_optional(executor)
        .await?;
        Ok(order)
    }

    pub async fn get_order_items<'e, E>(
        &self,
        executor: E,
        order_id: Uuid,
    ) -> Result<Vec<OnlineOrderItem>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let items = sqlx::query_as::<_, OnlineOrderItem>(
            "SELECT * FROM online_order_items WHERE order_id = $1",
        )
        .bind(order_id)
        .fetch_all(executor)
        .await?;
        Ok(items)
    }

    pub async fn mark_order_converted<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        order_id: Uuid,
        sale_id: Uuid,
        gateway_transaction_id: Option<&str>,
    ) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let result = sqlx::query(
            r#"
            UPDATE online_orders
            SET status = 'COMPLETED', sale_id = $3, payment_status = 'PAID',
                gateway_transaction_id = COALESCE($4, gateway_transaction_id),
                updated_at = now()
            WHERE id = $1 AND tenant_id = $2 AND sale_id IS NULL
            "#,
        )
        .bind(order_id)
        .bind(tenant_id)
        .bind(sale_id)
        .bind(gateway_transaction_id)
        .execute(executor)
        .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::AlreadyConverted);
        }
        Ok(())
    }

    /// La pasarela rechazó el cobro: el pedido queda FAILED y no se convierte.
    pub async fn mark_order_failed<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        order_id: Uuid,
        error: Option<&str>,
    ) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query(
            r#"
            UPDATE online_orders
            SET status = 'FAILED', payment_status = COALESCE($3, 'FAILED'), updated_at = now()
            WHERE id = $1 AND tenant_id = $2
            "#,
        )
        .bind(order_id)
        .bind(tenant_id)
        .bind(error)
        .execute(executor)
        .await?;
        Ok(())
    }
}
