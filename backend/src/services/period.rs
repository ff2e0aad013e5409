//! Period and snapshot store service
//!
//! Periods are the stable calendar anchor of the system. A period's
//! year/month/name are recomputed from its date range on every write and
//! never accepted as input. Snapshots are written only by stocktake
//! approval; opening stock is always read live from the chronologically
//! preceding period's closing snapshot.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::Deserialize;
use sqlx::{FromRow, PgPool, Postgres, Transaction};
use uuid::Uuid;

use shared::models::{derive_identifiers, Period, StockSnapshot};
use shared::types::DateRange;

use crate::error::{AppError, AppResult};

/// Period and snapshot store
#[derive(Clone)]
pub struct PeriodService {
    db: PgPool,
}

/// Database row for a period
#[derive(Debug, FromRow)]
pub struct PeriodRow {
    pub id: Uuid,
    pub name: String,
    pub year: i32,
    pub month: i32,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub is_closed: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<PeriodRow> for Period {
    fn from(row: PeriodRow) -> Self {
        Period {
            id: row.id,
            name: row.name,
            year: row.year,
            month: row.month as u32,
            start_date: row.start_date,
            end_date: row.end_date,
            is_closed: row.is_closed,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

/// Database row for a snapshot
#[derive(Debug, FromRow)]
pub struct SnapshotRow {
    pub id: Uuid,
    pub period_id: Uuid,
    pub item_id: Uuid,
    pub closing_full_units: i64,
    pub closing_partial_units: Decimal,
    pub closing_qty: Decimal,
    pub closing_stock_value: Decimal,
    pub created_at: DateTime<Utc>,
}

impl From<SnapshotRow> for StockSnapshot {
    fn from(row: SnapshotRow) -> Self {
        StockSnapshot {
            id: row.id,
            period_id: row.period_id,
            item_id: row.item_id,
            closing_full_units: row.closing_full_units,
            closing_partial_units: row.closing_partial_units,
            closing_qty: row.closing_qty,
            closing_stock_value: row.closing_stock_value,
            created_at: row.created_at,
        }
    }
}

/// Input for creating a period. Only the date range is accepted; the
/// identifiers are derived server-side.
#[derive(Debug, Deserialize)]
pub struct CreatePeriodInput {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
}

impl PeriodService {
    /// Create a new PeriodService instance
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// Create a period for a date range
    pub async fn create_period(&self, input: CreatePeriodInput) -> AppResult<Period> {
        let range = DateRange::new(input.start_date, input.end_date)?;

        let overlapping = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM periods WHERE start_date <= $1 AND end_date >= $2)",
        )
        .bind(range.end_date)
        .bind(range.start_date)
        .fetch_one(&self.db)
        .await?;

        if overlapping {
            return Err(AppError::Validation {
                field: "start_date".to_string(),
                message: format!(
                    "Period {} to {} overlaps an existing period",
                    range.start_date, range.end_date
                ),
            });
        }

        let ids = derive_identifiers(range.start_date);

        let row = sqlx::query_as::<_, PeriodRow>(
            r#"
            INSERT INTO periods (name, year, month, start_date, end_date)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, name, year, month, start_date, end_date, is_closed,
                      created_at, updated_at
            "#,
        )
        .bind(&ids.name)
        .bind(ids.year)
        .bind(ids.month as i32)
        .bind(range.start_date)
        .bind(range.end_date)
        .fetch_one(&self.db)
        .await?;

        Ok(row.into())
    }

    /// Get a period by id
    pub async fn get_period(&self, period_id: Uuid) -> AppResult<Period> {
        let row = sqlx::query_as::<_, PeriodRow>(
            r#"
            SELECT id, name, year, month, start_date, end_date, is_closed,
                   created_at, updated_at
            FROM periods
            WHERE id = $1
            "#,
        )
        .bind(period_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Period".to_string()))?;

        Ok(row.into())
    }

    /// List periods, newest first
    pub async fn list_periods(&self) -> AppResult<Vec<Period>> {
        let rows = sqlx::query_as::<_, PeriodRow>(
            r#"
            SELECT id, name, year, month, start_date, end_date, is_closed,
                   created_at, updated_at
            FROM periods
            ORDER BY start_date DESC
            "#,
        )
        .fetch_all(&self.db)
        .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    /// Get an item's closing snapshot for a period, if one exists
    pub async fn get_closing_snapshot(
        &self,
        period_id: Uuid,
        item_id: Uuid,
    ) -> AppResult<Option<StockSnapshot>> {
        let row = sqlx::query_as::<_, SnapshotRow>(
            r#"
            SELECT id, period_id, item_id, closing_full_units, closing_partial_units,
                   closing_qty, closing_stock_value, created_at
            FROM stock_snapshots
            WHERE period_id = $1 AND item_id = $2
            "#,
        )
        .bind(period_id)
        .bind(item_id)
        .fetch_optional(&self.db)
        .await?;

        Ok(row.map(Into::into))
    }

    /// Opening stock for an item in a period starting on `start_date`:
    /// the closing snapshot of the latest period ending strictly before
    /// that date. A missing predecessor means zero opening stock by policy,
    /// not by accident.
    pub async fn get_opening_for(&self, item_id: Uuid, start_date: NaiveDate) -> AppResult<Decimal> {
        let opening = sqlx::query_scalar::<_, Decimal>(
            r#"
            SELECT s.closing_qty
            FROM stock_snapshots s
            JOIN periods p ON p.id = s.period_id
            WHERE s.item_id = $1 AND p.end_date < $2
            ORDER BY p.end_date DESC
            LIMIT 1
            "#,
        )
        .bind(item_id)
        .bind(start_date)
        .fetch_optional(&self.db)
        .await?;

        Ok(opening.unwrap_or(Decimal::ZERO))
    }

    /// Whether any period ending before `start_date` is still open
    pub async fn has_open_prior_period(&self, start_date: NaiveDate) -> AppResult<bool> {
        let open = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM periods WHERE end_date < $1 AND NOT is_closed)",
        )
        .bind(start_date)
        .fetch_one(&self.db)
        .await?;

        Ok(open)
    }

    /// Upsert an item's closing snapshot inside the approval transaction.
    ///
    /// Idempotent per (period, item). Fails with `PeriodClosed` once the
    /// period has been closed, so history cannot be rewritten.
    pub async fn commit_closing(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        period: &Period,
        item_id: Uuid,
        closing_full_units: i64,
        closing_partial_units: Decimal,
        closing_qty: Decimal,
        closing_stock_value: Decimal,
    ) -> AppResult<StockSnapshot> {
        // Re-check inside the transaction; the caller's copy may be stale.
        let is_closed = sqlx::query_scalar::<_, bool>(
            "SELECT is_closed FROM periods WHERE id = $1 FOR UPDATE",
        )
        .bind(period.id)
        .fetch_optional(&mut **tx)
        .await?
        .ok_or_else(|| AppError::NotFound("Period".to_string()))?;

        if is_closed {
            return Err(AppError::PeriodClosed(format!(
                "Period {} is closed; its snapshots are read-only",
                period.name
            )));
        }

        let row = sqlx::query_as::<_, SnapshotRow>(
            r#"
            INSERT INTO stock_snapshots (
                period_id, item_id, closing_full_units, closing_partial_units,
                closing_qty, closing_stock_value
            )
            VALUES ($1, $2, $3, $4, $5, $6)
            ON CONFLICT (period_id, item_id) DO UPDATE
            SET closing_full_units = EXCLUDED.closing_full_units,
                closing_partial_units = EXCLUDED.closing_partial_units,
                closing_qty = EXCLUDED.closing_qty,
                closing_stock_value = EXCLUDED.closing_stock_value
            RETURNING id, period_id, item_id, closing_full_units, closing_partial_units,
                      closing_qty, closing_stock_value, created_at
            "#,
        )
        .bind(period.id)
        .bind(item_id)
        .bind(closing_full_units)
        .bind(closing_partial_units)
        .bind(closing_qty)
        .bind(closing_stock_value)
        .fetch_one(&mut **tx)
        .await?;

        Ok(row.into())
    }
}
