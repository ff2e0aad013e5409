//! Stock movement ledger service
//!
//! The ledger is append-only in spirit: rows may be edited or deleted only
//! while the owning stocktake is still editable, and every mutation
//! recomputes the owning line inside the same transaction. A reader never
//! sees a movement whose line aggregate has not caught up.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Deserialize;
use sqlx::{FromRow, PgPool, Postgres, Transaction};
use uuid::Uuid;

use shared::models::{MovementSums, MovementType, StockMovement, StocktakeLine};
use shared::validation;

use crate::error::{AppError, AppResult};
use crate::services::catalog::{item_from_row, ItemRow};
use crate::services::notification::{DomainEvent, NotificationService};
use crate::services::stocktake;

/// Movement ledger service
#[derive(Clone)]
pub struct MovementService {
    db: PgPool,
    notifier: NotificationService,
}

/// Database row for a movement
#[derive(Debug, FromRow)]
pub struct MovementRow {
    pub id: Uuid,
    pub item_id: Uuid,
    pub period_id: Uuid,
    pub movement_type: String,
    pub quantity: Decimal,
    pub unit_cost: Option<Decimal>,
    pub reference: Option<String>,
    pub notes: Option<String>,
    pub moved_at: DateTime<Utc>,
    pub recorded_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

pub fn movement_from_row(row: MovementRow) -> AppResult<StockMovement> {
    let movement_type = MovementType::parse(&row.movement_type)
        .ok_or_else(|| AppError::Internal(format!("unknown movement type: {}", row.movement_type)))?;
    Ok(StockMovement {
        id: row.id,
        item_id: row.item_id,
        period_id: row.period_id,
        movement_type,
        quantity: row.quantity,
        unit_cost: row.unit_cost,
        reference: row.reference,
        notes: row.notes,
        moved_at: row.moved_at,
        recorded_by: row.recorded_by,
        created_at: row.created_at,
    })
}

const MOVEMENT_COLUMNS: &str = "id, item_id, period_id, movement_type, quantity, unit_cost, \
     reference, notes, moved_at, recorded_by, created_at";

/// Input for recording a movement
#[derive(Debug, Deserialize)]
pub struct RecordMovementInput {
    pub item_id: Uuid,
    pub period_id: Uuid,
    pub movement_type: MovementType,
    pub quantity: Decimal,
    pub unit_cost: Option<Decimal>,
    pub reference: Option<String>,
    pub notes: Option<String>,
    pub moved_at: Option<DateTime<Utc>>,
    pub recorded_by: Option<Uuid>,
}

/// Input for updating a movement; unset fields keep their value
#[derive(Debug, Deserialize)]
pub struct UpdateMovementInput {
    pub movement_type: Option<MovementType>,
    pub quantity: Option<Decimal>,
    pub unit_cost: Option<Decimal>,
    pub reference: Option<String>,
    pub notes: Option<String>,
    pub moved_at: Option<DateTime<Utc>>,
}

/// Sum ledger quantities by type for one (item, period) inside a transaction
pub(crate) async fn sum_movements_in_tx(
    tx: &mut Transaction<'_, Postgres>,
    item_id: Uuid,
    period_id: Uuid,
) -> AppResult<MovementSums> {
    let rows = sqlx::query_as::<_, (String, Decimal)>(
        r#"
        SELECT movement_type, COALESCE(SUM(quantity), 0)
        FROM stock_movements
        WHERE item_id = $1 AND period_id = $2
        GROUP BY movement_type
        "#,
    )
    .bind(item_id)
    .bind(period_id)
    .fetch_all(&mut **tx)
    .await?;

    fold_sums(rows)
}

/// Reject mutations once the period's stocktake is approved or locked.
///
/// Runs on the row-locked stocktake inside the mutating transaction, so a
/// concurrent approval either commits first (and this gate sees it) or waits
/// for this mutation's recompute to land.
async fn ensure_period_unlocked(
    tx: &mut Transaction<'_, Postgres>,
    period_id: Uuid,
) -> AppResult<()> {
    if let Some(stocktake) = stocktake::lock_stocktake_by_period(tx, period_id).await? {
        if !stocktake.is_editable() {
            return Err(AppError::LockedPeriod(
                "The stocktake for this period is approved; movements are frozen".to_string(),
            ));
        }
    }
    Ok(())
}

fn fold_sums(rows: Vec<(String, Decimal)>) -> AppResult<MovementSums> {
    let mut sums = MovementSums::default();
    for (type_str, total) in rows {
        let movement_type = MovementType::parse(&type_str)
            .ok_or_else(|| AppError::Internal(format!("unknown movement type: {}", type_str)))?;
        sums.add(movement_type, total);
    }
    Ok(sums)
}

impl MovementService {
    /// Create a new MovementService instance
    pub fn new(db: PgPool, notifier: NotificationService) -> Self {
        Self { db, notifier }
    }

    /// Record a stock movement and synchronously recompute the owning line
    pub async fn record(&self, input: RecordMovementInput) -> AppResult<StockMovement> {
        validation::validate_movement_quantity(input.quantity)?;

        let item_exists =
            sqlx::query_scalar::<_, bool>("SELECT EXISTS(SELECT 1 FROM items WHERE id = $1)")
                .bind(input.item_id)
                .fetch_one(&self.db)
                .await?;
        if !item_exists {
            return Err(AppError::NotFound("Item".to_string()));
        }

        let period_exists =
            sqlx::query_scalar::<_, bool>("SELECT EXISTS(SELECT 1 FROM periods WHERE id = $1)")
                .bind(input.period_id)
                .fetch_one(&self.db)
                .await?;
        if !period_exists {
            return Err(AppError::NotFound("Period".to_string()));
        }

        let mut tx = self.db.begin().await?;
        ensure_period_unlocked(&mut tx, input.period_id).await?;

        let row = sqlx::query_as::<_, MovementRow>(&format!(
            r#"
            INSERT INTO stock_movements (
                item_id, period_id, movement_type, quantity, unit_cost,
                reference, notes, moved_at, recorded_by
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, COALESCE($8, NOW()), $9)
            RETURNING {MOVEMENT_COLUMNS}
            "#
        ))
        .bind(input.item_id)
        .bind(input.period_id)
        .bind(input.movement_type.as_str())
        .bind(input.quantity)
        .bind(input.unit_cost)
        .bind(&input.reference)
        .bind(&input.notes)
        .bind(input.moved_at)
        .bind(input.recorded_by)
        .fetch_one(&mut *tx)
        .await?;

        let recomputed = self
            .recompute_owning_line(&mut tx, input.item_id, input.period_id)
            .await?;

        tx.commit().await?;

        self.emit_recompute(recomputed);
        movement_from_row(row)
    }

    /// Update a movement and synchronously recompute the owning line
    pub async fn update(
        &self,
        movement_id: Uuid,
        input: UpdateMovementInput,
    ) -> AppResult<StockMovement> {
        let existing = self.get_movement(movement_id).await?;

        let movement_type = input.movement_type.unwrap_or(existing.movement_type);
        let quantity = input.quantity.unwrap_or(existing.quantity);
        validation::validate_movement_quantity(quantity)?;

        let mut tx = self.db.begin().await?;
        ensure_period_unlocked(&mut tx, existing.period_id).await?;

        let row = sqlx::query_as::<_, MovementRow>(&format!(
            r#"
            UPDATE stock_movements
            SET movement_type = $1, quantity = $2,
                unit_cost = COALESCE($3, unit_cost),
                reference = COALESCE($4, reference),
                notes = COALESCE($5, notes),
                moved_at = COALESCE($6, moved_at)
            WHERE id = $7
            RETURNING {MOVEMENT_COLUMNS}
            "#
        ))
        .bind(movement_type.as_str())
        .bind(quantity)
        .bind(input.unit_cost)
        .bind(&input.reference)
        .bind(&input.notes)
        .bind(input.moved_at)
        .bind(movement_id)
        .fetch_one(&mut *tx)
        .await?;

        let recomputed = self
            .recompute_owning_line(&mut tx, existing.item_id, existing.period_id)
            .await?;

        tx.commit().await?;

        self.emit_recompute(recomputed);
        movement_from_row(row)
    }

    /// Delete a movement and synchronously recompute the owning line
    pub async fn delete(&self, movement_id: Uuid) -> AppResult<()> {
        let existing = self.get_movement(movement_id).await?;

        let mut tx = self.db.begin().await?;
        ensure_period_unlocked(&mut tx, existing.period_id).await?;

        sqlx::query("DELETE FROM stock_movements WHERE id = $1")
            .bind(movement_id)
            .execute(&mut *tx)
            .await?;

        let recomputed = self
            .recompute_owning_line(&mut tx, existing.item_id, existing.period_id)
            .await?;

        tx.commit().await?;

        self.emit_recompute(recomputed);
        Ok(())
    }

    /// Get a movement by id
    pub async fn get_movement(&self, movement_id: Uuid) -> AppResult<StockMovement> {
        let row = sqlx::query_as::<_, MovementRow>(&format!(
            "SELECT {MOVEMENT_COLUMNS} FROM stock_movements WHERE id = $1"
        ))
        .bind(movement_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Movement".to_string()))?;

        movement_from_row(row)
    }

    /// List movements for a period, optionally narrowed to one item
    pub async fn list_movements(
        &self,
        period_id: Uuid,
        item_id: Option<Uuid>,
    ) -> AppResult<Vec<StockMovement>> {
        let rows = match item_id {
            Some(item_id) => {
                sqlx::query_as::<_, MovementRow>(&format!(
                    r#"
                    SELECT {MOVEMENT_COLUMNS}
                    FROM stock_movements
                    WHERE period_id = $1 AND item_id = $2
                    ORDER BY moved_at DESC, created_at DESC
                    "#
                ))
                .bind(period_id)
                .bind(item_id)
                .fetch_all(&self.db)
                .await?
            }
            None => {
                sqlx::query_as::<_, MovementRow>(&format!(
                    r#"
                    SELECT {MOVEMENT_COLUMNS}
                    FROM stock_movements
                    WHERE period_id = $1
                    ORDER BY moved_at DESC, created_at DESC
                    "#
                ))
                .bind(period_id)
                .fetch_all(&self.db)
                .await?
            }
        };

        rows.into_iter().map(movement_from_row).collect()
    }

    /// Per-type movement totals for one item in one period
    pub async fn sum_by_type(&self, item_id: Uuid, period_id: Uuid) -> AppResult<MovementSums> {
        let rows = sqlx::query_as::<_, (String, Decimal)>(
            r#"
            SELECT movement_type, COALESCE(SUM(quantity), 0)
            FROM stock_movements
            WHERE item_id = $1 AND period_id = $2
            GROUP BY movement_type
            "#,
        )
        .bind(item_id)
        .bind(period_id)
        .fetch_all(&self.db)
        .await?;

        fold_sums(rows)
    }

    /// Row-lock and recompute the line owning (item, period), if the
    /// stocktake has been populated yet.
    async fn recompute_owning_line(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        item_id: Uuid,
        period_id: Uuid,
    ) -> AppResult<Option<(StocktakeLine, StocktakeLine)>> {
        let stocktake_id =
            sqlx::query_scalar::<_, Uuid>("SELECT id FROM stocktakes WHERE period_id = $1")
                .bind(period_id)
                .fetch_optional(&mut **tx)
                .await?;

        let Some(stocktake_id) = stocktake_id else {
            return Ok(None);
        };

        let Some(line) = stocktake::lock_line(tx, stocktake_id, item_id).await? else {
            return Ok(None);
        };

        let item_row = sqlx::query_as::<_, ItemRow>(
            r#"
            SELECT id, sku, name, category, size, uom, unit_cost, menu_price,
                   is_active, created_at
            FROM items
            WHERE id = $1
            "#,
        )
        .bind(item_id)
        .fetch_one(&mut **tx)
        .await?;
        let item = item_from_row(item_row)?;

        let pair = stocktake::refresh_line(tx, &item, line, period_id).await?;
        Ok(Some(pair))
    }

    fn emit_recompute(&self, recomputed: Option<(StocktakeLine, StocktakeLine)>) {
        if let Some((old, new)) = recomputed {
            self.notifier.emit(DomainEvent::LineRecomputed {
                line_id: new.id,
                old: Box::new(old),
                new: Box::new(new),
            });
        }
    }
}
