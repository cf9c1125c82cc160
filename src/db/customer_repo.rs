// src/db/customer_repo.rs

use rust_decimal::Decimal;
use sqlx::{Executor, Postgres};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    models::{
        crm::{Customer, CustomerPayment},
        sales::PaymentMethod,
    },
};

#[derive(Clone)]
pub struct CustomerRepository;

impl CustomerRepository {
    pub fn new() -> Self {
        Self
    }

    // ---
    // Lecturas
    // ---

    pub async fn get_all<'e, E>(&self, executor: E, tenant_id: Uuid) -> Result<Vec<Customer>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let customers = sqlx::query_as::<_, Customer>(
            "SELECT * FROM customers WHERE tenant_id = $1 ORDER BY name ASC",
        )
        .bind(tenant_id)
        .fetch_all(executor)
        .await?;
        Ok(customers)
    }

    pub async fn find_by_id<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        customer_id: Uuid,
    ) -> Result<Option<Customer>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let customer = sqlx::query_as::<_, Customer>(
            "SELECT * FROM customers WHERE id = $1 AND tenant_id = $2",
        )
        .bind(customer_id)
        .bind(tenant_id)
        .fetch_optional(executor)
        .await?;
        Ok(customer)
    }

    /// Igual que find_by_id pero con candado de fila: el Payment Ledger la usa
    /// para que dos pagos concurrentes no pisen la misma deuda.
    pub async fn find_by_id_for_update<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        customer_id: Uuid,
    ) -> Result<Option<Customer>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let customer = sqlx::query_as::<_, Customer>(
            "SELECT * FROM customers WHERE id = $1 AND tenant_id = $2 FOR UPDATE",
        )
        .bind(customer_id)
        .bind(tenant_id)
        .fetch_optional(executor)
        .await?;
        Ok(customer)
    }

    pub async fn find_by_email_and_phone<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        email: &str,
        phone: &str,
    ) -> Result<Option<Customer>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let customer = sqlx::query_as::<_, Customer>(
            "SELECT * FROM customers WHERE tenant_id = $1 AND email = $2 AND phone = $3",
        )
        .bind(tenant_id)
        .bind(email)
        .bind(phone)
        .fetch_optional(executor)
        .await?;
        Ok(customer)
    }

    pub async fn find_by_email<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        email: &str,
    ) -> Result<Option<Customer>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let customer = sqlx::query_as::<_, Customer>(
            "SELECT * FROM customers WHERE tenant_id = $1 AND email = $2",
        )
        .bind(tenant_id)
        .bind(email)
        .fetch_optional(executor)
        .await?;
        Ok(customer)
    }

    // ---
    // Escrituras
    // ---

    pub async fn create<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        name: &str,
        email: Option<&str>,
        phone: Option<&str>,
        credit_limit: Decimal,
    ) -> Result<Customer, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let customer = sqlx::query_as::<_, Customer>(
            r#"
            INSERT INTO customers (tenant_id, name, email, phone, credit_limit)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *
            "#,
        )
        .bind(tenant_id)
        .bind(name)
        .bind(email)
        .bind(phone)
        .bind(credit_limit)
        .fetch_one(executor)
        .await?;
        Ok(customer)
    }

    /// Refresca los datos de contacto desde el documento fuente.
    pub async fn update_contact<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        customer_id: Uuid,
        name: &str,
        email: Option<&str>,
        phone: Option<&str>,
    ) -> Result<Customer, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let customer = sqlx::query_as::<_, Customer>(
            r#"
            UPDATE customers
            SET name = $3,
                email = COALESCE($4, email),
                phone = COALESCE($5, phone),
                updated_at = now()
            WHERE id = $1 AND tenant_id = $2
            RETURNING *
            "#,
        )
        .bind(customer_id)
        .bind(tenant_id)
        .bind(name)
        .bind(email)
        .bind(phone)
        .fetch_one(executor)
        .await?;
        Ok(customer)
    }

    /// Suma a la deuda viva (venta a crédito recién convertida).
    pub async fn increase_debt<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        customer_id: Uuid,
        amount: Decimal,
    ) -> Result<Customer, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let customer = sqlx::query_as::<_, Customer>(
            r#"
            UPDATE customers
            SET current_debt = current_debt + $3, updated_at = now()
            WHERE id = $1 AND tenant_id = $2
            RETURNING *
            "#,
        )
        .bind(customer_id)
        .bind(tenant_id)
        .bind(amount)
        .fetch_one(executor)
        .await?;
        Ok(customer)
    }

    /// Resta de la deuda viva, sin bajar nunca de cero (GREATEST hace el clamp).
    pub async fn decrease_debt<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        customer_id: Uuid,
        amount: Decimal,
    ) -> Result<Customer, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let customer = sqlx::query_as::<_, Customer>(
            r#"
            UPDATE customers
            SET current_debt = GREATEST(current_debt - $3, 0), updated_at = now()
            WHERE id = $1 AND tenant_id = $2
            RETURNING *
            "#,
        )
        .bind(customer_id)
        .bind(tenant_id)
        .bind(amount)
        .fetch_one(executor)
        .await?;
        Ok(customer)
    }

    /// Inserta el renglón inmutable del pago.
    pub async fn record_payment<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        customer_id: Uuid,
        sale_id: Option<Uuid>,
        amount: Decimal,
        payment_method: PaymentMethod,
        reference: Option<&str>,
    ) -> Result<CustomerPayment, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let payment = sqlx::query_as::<_, CustomerPayment>(
            r#"
            INSERT INTO customer_payments
                (tenant_id, customer_id, sale_id, amount, payment_method, reference)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING *
            "#,
        )
        .bind(tenant_id)
        .bind(customer_id)
        .bind(sale_id)
        .bind(amount)
        .bind(payment_method)
        .bind(reference)
        .fetch_one(executor)
        .await?;
        Ok(payment)
    }

    pub async fn list_payments<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        customer_id: Uuid,
    ) -> Result<Vec<CustomerPayment>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let payments = sqlx::query_as::<_, CustomerPayment>(
            r#"
            SELECT * FROM customer_payments
            WHERE tenant_id = $1 AND customer_id = $2
            ORDER BY payment_date DESC
            "#,
        )
        .bind(tenant_id)
        .bind(customer_id)
        .fetch_all(executor)
        .await?;
        Ok(payments)
    }

    /// Clientes con deuda viva, ordenados de mayor a menor (top deudores).
    pub async fn top_debtors<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        limit: i64,
    ) -> Result<Vec<Customer>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let customers = sqlx::query_as::<_, Customer>(
            r#"
            SELECT * FROM customers
            WHERE tenant_id = $1 AND current_debt > 0
            ORDER BY current_debt DESC
            LIMIT $2
            "#,
        )
        .bind(tenant_id)
        .bind(limit)
        .fetch_all(executor)
        .await?;
        Ok(customers)
    }

    /// Clientes con límite de crédito definido y algo de deuda: la base
    /// de las alertas de utilización. El límite cero queda fuera aquí mismo
    /// para que nadie divida entre cero más adelante.
    pub async fn with_credit_exposure<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
    ) -> Result<Vec<Customer>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let customers = sqlx::query_as::<_, Customer>(
            r#"
            SELECT * FROM customers
            WHERE tenant_id = $1 AND credit_limit > 0 AND current_debt > 0
            ORDER BY current_debt DESC
            "#,
        )
        .bind(tenant_id)
        .fetch_all(executor)
        .await?;
        Ok(customers)
    }
}
