// src/services/stock_service.rs
//
// El Stock Ledger: dueño único del campo products.stock y del libro de
// movimientos. Nadie más escribe stock por asignación directa.

use rust_decimal::Decimal;
use sqlx::{Acquire, Executor, Postgres};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::ProductRepository,
    models::inventory::{InventoryMovement, MovementType, StockShortage},
};

#[derive(Clone)]
pub struct StockService {
    product_repo: ProductRepository,
}

impl StockService {
    pub fn new(product_repo: ProductRepository) -> Self {
        Self { product_repo }
    }

    /// Aplica un movimiento de stock y deja su renglón de auditoría como una
    /// sola unidad atómica. Si el caller ya trae una transacción, el begin()
    /// de aquí se vuelve un savepoint dentro de ella: nadie observa el stock
    /// actualizado sin su movimiento, ni al revés.
    ///
    /// SALIDA con stock insuficiente devuelve InsufficientStock; el caller
    /// debe abortar la transacción completa, no solo este paso.
    pub async fn apply_movement<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        product_id: Uuid,
        movement_type: MovementType,
        quantity: Decimal,
        reason: &str,
        sale_id: Option<Uuid>,
    ) -> Result<InventoryMovement, AppError>
    where
        E: Executor<'e, Database = Postgres> + Acquire<'e, Database = Postgres>,
    {
        if quantity <= Decimal::ZERO {
            return Err(AppError::InvalidState(
                "la cantidad del movimiento debe ser positiva".into(),
            ));
        }

        let mut tx = executor.begin().await?;

        // 1. Actualiza el stock. El previous/new se derivan del RETURNING,
        //    nunca de una lectura previa que pudo quedar vieja.
        let new_stock = match movement_type {
            MovementType::Salida => {
                // Decremento CONDICIONADO: WHERE stock >= cantidad. Dos salidas
                // concurrentes jamás pasan ambas por debajo de cero.
                let updated = self
                    .product_repo
                    .deduct_stock_guarded(&mut *tx, tenant_id, product_id, quantity)
                    .await?;

                match updated {
                    Some(stock) => stock,
                    None => {
                        // Cero filas afectadas: o el producto no es del tenant
                        // (not-found) o la guardia de stock no dejó pasar.
                        let current = self
                            .product_repo
                            .get_by_id(&mut *tx, tenant_id, product_id)
                            .await?
                            .ok_or(AppError::NotFound)?;

                        return Err(AppError::InsufficientStock(vec![StockShortage {
                            product_id,
                            product_name: current.name,
                            requested: quantity,
                            available: current.stock,
                        }]));
                    }
                }
            }
            MovementType::Entrada | MovementType::CancelSale => self
                .product_repo
                .add_stock(&mut *tx, tenant_id, product_id, quantity)
                .await?
                .ok_or(AppError::NotFound)?,
        };

        let previous_stock = match movement_type {
            MovementType::Salida => new_stock + quantity,
            MovementType::Entrada | MovementType::CancelSale => new_stock - quantity,
        };

        // 2. Renglón de auditoría (misma transacción)
        let movement = self
            .product_repo
            .record_movement(
                &mut *tx,
                tenant_id,
                product_id,
                movement_type,
                quantity,
                previous_stock,
                new_stock,
                sale_id,
                reason,
            )
            .await?;

        tx.commit().await?;

        tracing::debug!(
            %tenant_id, %product_id, ?movement_type, %quantity,
            "movimiento de stock aplicado"
        );

        Ok(movement)
    }
}
