// src/db/product_repo.rs

use rust_decimal::Decimal;
use sqlx::{Executor, Postgres};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    models::{
        catalog::Product,
        inventory::{InventoryMovement, MovementType},
    },
};

// Nivel de stock de un producto, para la pre-validación de conversiones
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ProductStockRow {
    pub id: Uuid,
    pub name: String,
    pub stock: Decimal,
}

// Sin estado: toda consulta corre sobre el executor que pasa el caller
#[derive(Clone)]
pub struct ProductRepository;

impl ProductRepository {
    pub fn new() -> Self {
        Self
    }

    // ---
    // Lecturas
    // ---

    pub async fn get_all<'e, E>(&self, executor: E, tenant_id: Uuid) -> Result<Vec<Product>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let products = sqlx::query_as::<_, Product>(
            "SELECT * FROM products WHERE tenant_id = $1 ORDER BY name ASC",
        )
        .bind(tenant_id)
        .fetch_all(executor)
        .await?;
        Ok(products)
    }

    pub async fn get_by_id<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        product_id: Uuid,
    ) -> Result<Option<Product>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let product = sqlx::query_as::<_, Product>(
            "SELECT * FROM products WHERE id = $1 AND tenant_id = $2",
        )
        .bind(product_id)
        .bind(tenant_id)
        .fetch_optional(executor)
        .await?;
        Ok(product)
    }

    /// Productos en o bajo su mínimo (para la alerta de reabastecimiento).
    pub async fn get_low_stock<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
    ) -> Result<Vec<Product>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let products = sqlx::query_as::<_, Product>(
            "SELECT * FROM products WHERE tenant_id = $1 AND stock <= min_stock ORDER BY name ASC",
        )
        .bind(tenant_id)
        .fetch_all(executor)
        .await?;
        Ok(products)
    }

    /// Stock actual de un conjunto de productos. Solo lectura: es la
    /// pre-validación; la garantía real vive en el decremento condicionado.
    pub async fn get_stock_levels<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        product_ids: &[Uuid],
    ) -> Result<Vec<ProductStockRow>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let rows = sqlx::query_as::<_, ProductStockRow>(
            "SELECT id, name, stock FROM products WHERE tenant_id = $1 AND id = ANY($2)",
        )
        .bind(tenant_id)
        .bind(product_ids)
        .fetch_all(executor)
        .await?;
        Ok(rows)
    }

    // ---
    // Escrituras
    // ---

    /// Alta de catálogo. Nace con stock cero: el stock inicial entra después
    /// como movimiento ENTRADA por el Stock Ledger.
    pub async fn create<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        sku: &str,
        name: &str,
        price: Decimal,
        cost: Decimal,
        min_stock: Decimal,
    ) -> Result<Product, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query_as::<_, Product>(
            r#"
            INSERT INTO products (tenant_id, sku, name, price, cost, stock, min_stock)
            VALUES ($1, $2, $3, $4, $5, 0, $6)
            RETURNING *
            "#,
        )
        .bind(tenant_id)
        .bind(sku)
        .bind(name)
        .bind(price)
        .bind(cost)
        .bind(min_stock)
        .fetch_one(executor)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(db_err) = &e {
                if db_err.is_unique_violation() {
                    return AppError::SkuAlreadyExists;
                }
            }
            e.into()
        })
    }

    /// Decremento CONDICIONADO (SALIDA). El WHERE stock >= $3 es la guardia:
    /// dos decrementos concurrentes jamás pasan ambos por debajo de cero.
    /// Devuelve el stock resultante, o None si la guardia no dejó pasar.
    pub async fn deduct_stock_guarded<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        product_id: Uuid,
        quantity: Decimal,
    ) -> Result<Option<Decimal>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let new_stock: Option<(Decimal,)> = sqlx::query_as(
            r#"
            UPDATE products
            SET stock = stock - $3, updated_at = now()
            WHERE id = $1 AND tenant_id = $2 AND stock >= $3
            RETURNING stock
            "#,
        )
        .bind(product_id)
        .bind(tenant_id)
        .bind(quantity)
        .fetch_optional(executor)
        .await?;
        Ok(new_stock.map(|r| r.0))
    }

    /// Incremento (ENTRADA / CANCEL_SALE). Devuelve el stock resultante,
    /// o None si el producto no existe para este tenant.
    pub async fn add_stock<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        product_id: Uuid,
        quantity: Decimal,
    ) -> Result<Option<Decimal>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let new_stock: Option<(Decimal,)> = sqlx::query_as(
            r#"
            UPDATE products
            SET stock = stock + $3, updated_at = now()
            WHERE id = $1 AND tenant_id = $2
            RETURNING stock
            "#,
        )
        .bind(product_id)
        .bind(tenant_id)
        .bind(quantity)
        .fetch_optional(executor)
        .await?;
        Ok(new_stock.map(|r| r.0))
    }

    /// Registra el renglón de auditoría del movimiento. Debe correr con el
    /// mismo executor (misma transacción) que la actualización de stock.
    pub async fn record_movement<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        product_id: Uuid,
        movement_type: MovementType,
        quantity: Decimal,
        previous_stock: Decimal,
        new_stock: Decimal,
        sale_id: Option<Uuid>,
        reason: &str,
    ) -> Result<InventoryMovement, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let movement = sqlx::query_as::<_, InventoryMovement>(
            r#"
            INSERT INTO inventory_movements
                (tenant_id, product_id, movement_type, quantity, previous_stock, new_stock, sale_id, reason)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING *
            "#,
        )
        .bind(tenant_id)
        .bind(product_id)
        .bind(movement_type)
        .bind(quantity)
        .bind(previous_stock)
        .bind(new_stock)
        .bind(sale_id)
        .bind(reason)
        .fetch_one(executor)
        .await?;
        Ok(movement)
    }

    pub async fn list_movements<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        product_id: Uuid,
    ) -> Result<Vec<InventoryMovement>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let movements = sqlx::query_as::<_, InventoryMovement>(
            r#"
            SELECT * FROM inventory_movements
            WHERE tenant_id = $1 AND product_id = $2
            ORDER BY created_at DESC
            "#,
        )
        .bind(tenant_id)
        .bind(product_id)
        .fetch_all(executor)
        .await?;
        Ok(movements)
    }
}
