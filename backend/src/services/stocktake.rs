//! Stocktake aggregation and lifecycle service
//!
//! A stocktake is the editable working view of one period's count. Lines
//! carry opening stock, ledger aggregates, counted input and derived
//! variance values; every derived field is recomputed through the pure
//! engine in `shared::recompute`, never patched by hand. Approval is the
//! only path that writes snapshots, and it is all-or-nothing.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool, Postgres, Transaction};
use uuid::Uuid;

use shared::models::{
    check_ready_for_approval, ApprovalGap, CountedUnits, Item, LineDisplay, MovementSums,
    Stocktake, StocktakeLine, StocktakeStatus,
};
use shared::recompute::{self, DerivedLine, StocktakeTotals};
use shared::validation;

use crate::error::{AppError, AppResult};
use crate::services::catalog::{item_from_row, CatalogService, ItemRow};
use crate::services::movement;
use crate::services::notification::{DomainEvent, NotificationService};
use crate::services::period::PeriodService;

/// Stocktake service covering line aggregation and the approval lifecycle
#[derive(Clone)]
pub struct StocktakeService {
    db: PgPool,
    notifier: NotificationService,
}

/// Database row for a stocktake
#[derive(Debug, FromRow)]
pub struct StocktakeRow {
    pub id: Uuid,
    pub period_id: Uuid,
    pub status: String,
    pub is_locked: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

pub fn stocktake_from_row(row: StocktakeRow) -> AppResult<Stocktake> {
    let status = StocktakeStatus::parse(&row.status)
        .ok_or_else(|| AppError::Internal(format!("unknown stocktake status: {}", row.status)))?;
    Ok(Stocktake {
        id: row.id,
        period_id: row.period_id,
        status,
        is_locked: row.is_locked,
        created_at: row.created_at,
        updated_at: row.updated_at,
    })
}

/// Database row for a stocktake line
#[derive(Debug, FromRow)]
pub struct LineRow {
    pub id: Uuid,
    pub stocktake_id: Uuid,
    pub item_id: Uuid,
    pub opening_qty: Decimal,
    pub purchases: Decimal,
    pub sales: Decimal,
    pub waste: Decimal,
    pub transfers_in: Decimal,
    pub transfers_out: Decimal,
    pub adjustments: Decimal,
    pub counted_full_units: Option<i64>,
    pub counted_partial_units: Option<Decimal>,
    pub expected_qty: Decimal,
    pub expected_value: Decimal,
    pub counted_qty: Option<Decimal>,
    pub counted_value: Option<Decimal>,
    pub variance_qty: Option<Decimal>,
    pub variance_value: Option<Decimal>,
    pub updated_at: DateTime<Utc>,
}

impl From<LineRow> for StocktakeLine {
    fn from(row: LineRow) -> Self {
        StocktakeLine {
            id: row.id,
            stocktake_id: row.stocktake_id,
            item_id: row.item_id,
            opening_qty: row.opening_qty,
            purchases: row.purchases,
            sales: row.sales,
            waste: row.waste,
            transfers_in: row.transfers_in,
            transfers_out: row.transfers_out,
            adjustments: row.adjustments,
            counted_full_units: row.counted_full_units,
            counted_partial_units: row.counted_partial_units,
            expected_qty: row.expected_qty,
            expected_value: row.expected_value,
            counted_qty: row.counted_qty,
            counted_value: row.counted_value,
            variance_qty: row.variance_qty,
            variance_value: row.variance_value,
            updated_at: row.updated_at,
        }
    }
}

/// Input for creating a stocktake
#[derive(Debug, Deserialize)]
pub struct CreateStocktakeInput {
    pub period_id: Uuid,
}

/// Input for setting a line's counted units
#[derive(Debug, Deserialize)]
pub struct SetCountedUnitsInput {
    pub counted_full_units: i64,
    pub counted_partial_units: Decimal,
}

/// Result of populating opening stock
#[derive(Debug, Serialize)]
pub struct PopulateResult {
    pub lines_created: usize,
}

/// A line together with its display decomposition
#[derive(Debug, Serialize)]
pub struct LineDetail {
    pub line: StocktakeLine,
    pub display: LineDisplay,
}

const LINE_COLUMNS: &str = "id, stocktake_id, item_id, opening_qty, purchases, sales, waste, \
     transfers_in, transfers_out, adjustments, counted_full_units, counted_partial_units, \
     expected_qty, expected_value, counted_qty, counted_value, variance_qty, variance_value, \
     updated_at";

/// Fetch and row-lock a stocktake inside a transaction. Editability gates
/// must be re-checked on this locked row, not a pool read: an approval may
/// commit between a pool-side check and the mutation's own commit.
pub(crate) async fn lock_stocktake(
    tx: &mut Transaction<'_, Postgres>,
    stocktake_id: Uuid,
) -> AppResult<Option<Stocktake>> {
    let row = sqlx::query_as::<_, StocktakeRow>(
        r#"
        SELECT id, period_id, status, is_locked, created_at, updated_at
        FROM stocktakes
        WHERE id = $1
        FOR UPDATE
        "#,
    )
    .bind(stocktake_id)
    .fetch_optional(&mut **tx)
    .await?;

    row.map(stocktake_from_row).transpose()
}

/// Row-lock a period's stocktake, if one exists
pub(crate) async fn lock_stocktake_by_period(
    tx: &mut Transaction<'_, Postgres>,
    period_id: Uuid,
) -> AppResult<Option<Stocktake>> {
    let row = sqlx::query_as::<_, StocktakeRow>(
        r#"
        SELECT id, period_id, status, is_locked, created_at, updated_at
        FROM stocktakes
        WHERE period_id = $1
        FOR UPDATE
        "#,
    )
    .bind(period_id)
    .fetch_optional(&mut **tx)
    .await?;

    row.map(stocktake_from_row).transpose()
}

/// Fetch and row-lock one line inside a transaction. Serializes concurrent
/// recomputes of the same line.
pub(crate) async fn lock_line(
    tx: &mut Transaction<'_, Postgres>,
    stocktake_id: Uuid,
    item_id: Uuid,
) -> AppResult<Option<LineRow>> {
    let row = sqlx::query_as::<_, LineRow>(&format!(
        "SELECT {LINE_COLUMNS} FROM stocktake_lines \
         WHERE stocktake_id = $1 AND item_id = $2 FOR UPDATE"
    ))
    .bind(stocktake_id)
    .bind(item_id)
    .fetch_optional(&mut **tx)
    .await?;

    Ok(row)
}

pub(crate) async fn lock_line_by_id(
    tx: &mut Transaction<'_, Postgres>,
    line_id: Uuid,
) -> AppResult<Option<LineRow>> {
    let row = sqlx::query_as::<_, LineRow>(&format!(
        "SELECT {LINE_COLUMNS} FROM stocktake_lines WHERE id = $1 FOR UPDATE"
    ))
    .bind(line_id)
    .fetch_optional(&mut **tx)
    .await?;

    Ok(row)
}

/// Persist a line's aggregates and derived values after a recompute
pub(crate) async fn store_line(
    tx: &mut Transaction<'_, Postgres>,
    line_id: Uuid,
    sums: &MovementSums,
    counted: Option<CountedUnits>,
    derived: &DerivedLine,
) -> AppResult<LineRow> {
    let row = sqlx::query_as::<_, LineRow>(&format!(
        r#"
        UPDATE stocktake_lines
        SET purchases = $1, sales = $2, waste = $3, transfers_in = $4,
            transfers_out = $5, adjustments = $6,
            counted_full_units = $7, counted_partial_units = $8,
            expected_qty = $9, expected_value = $10,
            counted_qty = $11, counted_value = $12,
            variance_qty = $13, variance_value = $14,
            updated_at = NOW()
        WHERE id = $15
        RETURNING {LINE_COLUMNS}
        "#
    ))
    .bind(sums.purchases)
    .bind(sums.sales)
    .bind(sums.waste)
    .bind(sums.transfers_in)
    .bind(sums.transfers_out)
    .bind(sums.adjustments)
    .bind(counted.map(|c| c.full))
    .bind(counted.map(|c| c.partial))
    .bind(derived.expected_qty)
    .bind(derived.expected_value)
    .bind(derived.counted_qty)
    .bind(derived.counted_value)
    .bind(derived.variance_qty)
    .bind(derived.variance_value)
    .bind(line_id)
    .fetch_one(&mut **tx)
    .await?;

    Ok(row)
}

/// Recompute a locked line from current ledger sums and its own counted
/// input, persisting the result. Returns (old, new) for event emission.
pub(crate) async fn refresh_line(
    tx: &mut Transaction<'_, Postgres>,
    item: &Item,
    row: LineRow,
    period_id: Uuid,
) -> AppResult<(StocktakeLine, StocktakeLine)> {
    let sums = movement::sum_movements_in_tx(tx, item.id, period_id).await?;
    let old: StocktakeLine = row.into();
    let derived = recompute::recompute_line(item, old.opening_qty, &sums, old.counted_units())?;
    let updated = store_line(tx, old.id, &sums, old.counted_units(), &derived).await?;
    Ok((old, updated.into()))
}

impl StocktakeService {
    /// Create a new StocktakeService instance
    pub fn new(db: PgPool, notifier: NotificationService) -> Self {
        Self { db, notifier }
    }

    /// Create a stocktake for a period. One per period; the period must
    /// still be open.
    pub async fn create_stocktake(&self, input: CreateStocktakeInput) -> AppResult<Stocktake> {
        let periods = PeriodService::new(self.db.clone());
        let period = periods.get_period(input.period_id).await?;

        if period.is_closed {
            return Err(AppError::PeriodClosed(format!(
                "Period {} is closed; create a new period to count again",
                period.name
            )));
        }

        let exists = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM stocktakes WHERE period_id = $1)",
        )
        .bind(period.id)
        .fetch_one(&self.db)
        .await?;

        if exists {
            return Err(AppError::DuplicateEntry("period_id".to_string()));
        }

        let row = sqlx::query_as::<_, StocktakeRow>(
            r#"
            INSERT INTO stocktakes (period_id)
            VALUES ($1)
            RETURNING id, period_id, status, is_locked, created_at, updated_at
            "#,
        )
        .bind(period.id)
        .fetch_one(&self.db)
        .await?;

        stocktake_from_row(row)
    }

    /// Get a stocktake by id
    pub async fn get_stocktake(&self, stocktake_id: Uuid) -> AppResult<Stocktake> {
        let row = sqlx::query_as::<_, StocktakeRow>(
            r#"
            SELECT id, period_id, status, is_locked, created_at, updated_at
            FROM stocktakes
            WHERE id = $1
            "#,
        )
        .bind(stocktake_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Stocktake".to_string()))?;

        stocktake_from_row(row)
    }

    /// Populate one line per active item with opening stock carried forward
    /// from the previous period's closing snapshot.
    pub async fn populate_opening_stock(&self, stocktake_id: Uuid) -> AppResult<PopulateResult> {
        let stocktake = self.get_stocktake(stocktake_id).await?;
        if !stocktake.is_editable() {
            return Err(AppError::LockedPeriod(format!(
                "Stocktake {} is approved; its lines are frozen",
                stocktake.id
            )));
        }

        let periods = PeriodService::new(self.db.clone());
        let period = periods.get_period(stocktake.period_id).await?;

        let line_count = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM stocktake_lines WHERE stocktake_id = $1",
        )
        .bind(stocktake.id)
        .fetch_one(&self.db)
        .await?;

        if line_count > 0 {
            return Err(AppError::AlreadyPopulated(format!(
                "Stocktake {} already has {} lines; clear them before repopulating",
                stocktake.id, line_count
            )));
        }

        if periods.has_open_prior_period(period.start_date).await? {
            return Err(AppError::PreviousPeriodNotClosed(format!(
                "A period before {} is still open; close it before carrying stock forward",
                period.name
            )));
        }

        let catalog = CatalogService::new(self.db.clone());
        let items = catalog.list_active_items().await?;

        let mut tx = self.db.begin().await?;

        // Re-check on the locked row; the pool-side gate above can go stale
        // under a racing approval.
        let stocktake = lock_stocktake(&mut tx, stocktake.id)
            .await?
            .ok_or_else(|| AppError::NotFound("Stocktake".to_string()))?;
        if !stocktake.is_editable() {
            return Err(AppError::LockedPeriod(format!(
                "Stocktake {} is approved; its lines are frozen",
                stocktake.id
            )));
        }

        let mut lines_created = 0usize;

        for item in &items {
            let opening_qty = periods.get_opening_for(item.id, period.start_date).await?;
            // Aggregates start at zero; ledger mutations during the period
            // drive every later recompute.
            let sums = MovementSums::default();
            let derived = recompute::recompute_line(item, opening_qty, &sums, None)?;

            sqlx::query(
                r#"
                INSERT INTO stocktake_lines (
                    stocktake_id, item_id, opening_qty, expected_qty, expected_value
                )
                VALUES ($1, $2, $3, $4, $5)
                "#,
            )
            .bind(stocktake.id)
            .bind(item.id)
            .bind(opening_qty)
            .bind(derived.expected_qty)
            .bind(derived.expected_value)
            .execute(&mut *tx)
            .await?;

            lines_created += 1;
        }

        tx.commit().await?;

        tracing::info!(
            "Populated stocktake {} with {} lines for period {}",
            stocktake.id,
            lines_created,
            period.name
        );

        Ok(PopulateResult { lines_created })
    }

    /// Delete all lines of a draft stocktake so it can be repopulated
    pub async fn clear_lines(&self, stocktake_id: Uuid) -> AppResult<()> {
        let mut tx = self.db.begin().await?;

        let stocktake = lock_stocktake(&mut tx, stocktake_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Stocktake".to_string()))?;
        if !stocktake.is_editable() {
            return Err(AppError::LockedPeriod(format!(
                "Stocktake {} is approved; its lines are frozen",
                stocktake.id
            )));
        }

        sqlx::query("DELETE FROM stocktake_lines WHERE stocktake_id = $1")
            .bind(stocktake.id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(())
    }

    /// Record the counted physical units for a line and recompute it
    pub async fn set_counted_units(
        &self,
        line_id: Uuid,
        input: SetCountedUnitsInput,
    ) -> AppResult<StocktakeLine> {
        let stocktake_id = sqlx::query_scalar::<_, Uuid>(
            "SELECT stocktake_id FROM stocktake_lines WHERE id = $1",
        )
        .bind(line_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Stocktake line".to_string()))?;

        let mut tx = self.db.begin().await?;

        // Gate on the locked row; a pool-side check could pass just before a
        // racing approval commits.
        let stocktake = lock_stocktake(&mut tx, stocktake_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Stocktake".to_string()))?;
        if !stocktake.is_editable() {
            return Err(AppError::LockedPeriod(format!(
                "Stocktake {} is approved; counted values can no longer change",
                stocktake.id
            )));
        }

        let row = lock_line_by_id(&mut tx, line_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Stocktake line".to_string()))?;

        let item_row = sqlx::query_as::<_, ItemRow>(
            r#"
            SELECT id, sku, name, category, size, uom, unit_cost, menu_price,
                   is_active, created_at
            FROM items
            WHERE id = $1
            "#,
        )
        .bind(row.item_id)
        .fetch_one(&mut *tx)
        .await?;
        let item = item_from_row(item_row)?;

        let counted = CountedUnits {
            full: input.counted_full_units,
            partial: input.counted_partial_units,
        };
        validation::validate_counted_units(&item, counted.full, counted.partial)?;

        let sums = movement::sum_movements_in_tx(&mut tx, item.id, stocktake.period_id).await?;
        let old: StocktakeLine = row.into();
        let derived =
            recompute::recompute_line(&item, old.opening_qty, &sums, Some(counted))?;
        let updated = store_line(&mut tx, old.id, &sums, Some(counted), &derived).await?;

        tx.commit().await?;

        let new: StocktakeLine = updated.into();
        self.notifier.emit(DomainEvent::LineRecomputed {
            line_id: new.id,
            old: Box::new(old),
            new: Box::new(new.clone()),
        });

        Ok(new)
    }

    /// Get one line with its display decomposition
    pub async fn get_line(&self, stocktake_id: Uuid, item_id: Uuid) -> AppResult<LineDetail> {
        let row = sqlx::query_as::<_, LineRow>(&format!(
            "SELECT {LINE_COLUMNS} FROM stocktake_lines \
             WHERE stocktake_id = $1 AND item_id = $2"
        ))
        .bind(stocktake_id)
        .bind(item_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Stocktake line".to_string()))?;

        let catalog = CatalogService::new(self.db.clone());
        let item = catalog.get_item(item_id).await?;

        let line: StocktakeLine = row.into();
        let derived = DerivedLine {
            expected_qty: line.expected_qty,
            expected_value: line.expected_value,
            counted_qty: line.counted_qty,
            counted_value: line.counted_value,
            variance_qty: line.variance_qty,
            variance_value: line.variance_value,
        };
        let display = recompute::line_display(&item, line.opening_qty, &derived)?;

        Ok(LineDetail { line, display })
    }

    /// List all lines of a stocktake
    pub async fn list_lines(&self, stocktake_id: Uuid) -> AppResult<Vec<StocktakeLine>> {
        let rows = sqlx::query_as::<_, LineRow>(
            "SELECT l.* FROM stocktake_lines l \
             JOIN items i ON i.id = l.item_id \
             WHERE l.stocktake_id = $1 \
             ORDER BY i.sku",
        )
        .bind(stocktake_id)
        .fetch_all(&self.db)
        .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    /// Value totals across a stocktake's lines
    pub async fn totals(&self, stocktake_id: Uuid) -> AppResult<StocktakeTotals> {
        let lines = self.list_lines(stocktake_id).await?;
        let derived: Vec<DerivedLine> = lines
            .iter()
            .map(|line| DerivedLine {
                expected_qty: line.expected_qty,
                expected_value: line.expected_value,
                counted_qty: line.counted_qty,
                counted_value: line.counted_value,
                variance_qty: line.variance_qty,
                variance_value: line.variance_value,
            })
            .collect();
        Ok(recompute::total_values(&derived))
    }

    /// Approve a stocktake: commit every line's count as the period's
    /// closing snapshot and close the period. All-or-nothing; on any
    /// failure the stocktake stays a draft.
    pub async fn approve(&self, stocktake_id: Uuid) -> AppResult<Stocktake> {
        let periods = PeriodService::new(self.db.clone());

        let mut tx = self.db.begin().await?;

        // Compare-and-set inside the transaction guards against a racing
        // second approval.
        let approved = sqlx::query_as::<_, StocktakeRow>(
            r#"
            UPDATE stocktakes
            SET status = 'approved', is_locked = TRUE, updated_at = NOW()
            WHERE id = $1 AND status = 'draft'
            RETURNING id, period_id, status, is_locked, created_at, updated_at
            "#,
        )
        .bind(stocktake_id)
        .fetch_optional(&mut *tx)
        .await?;

        let Some(approved) = approved else {
            // Distinguish a missing stocktake from a double approval.
            let exists = sqlx::query_scalar::<_, bool>(
                "SELECT EXISTS(SELECT 1 FROM stocktakes WHERE id = $1)",
            )
            .bind(stocktake_id)
            .fetch_one(&mut *tx)
            .await?;
            return Err(if exists {
                AppError::InvalidStateTransition(format!(
                    "Stocktake {} is already approved",
                    stocktake_id
                ))
            } else {
                AppError::NotFound("Stocktake".to_string())
            });
        };
        let stocktake = stocktake_from_row(approved)?;

        let period = periods.get_period(stocktake.period_id).await?;

        // Lock every line so in-flight movement recomputes serialize with
        // the approval.
        let rows = sqlx::query_as::<_, LineRow>(&format!(
            "SELECT {LINE_COLUMNS} FROM stocktake_lines WHERE stocktake_id = $1 FOR UPDATE"
        ))
        .bind(stocktake.id)
        .fetch_all(&mut *tx)
        .await?;

        let lines: Vec<StocktakeLine> = rows.into_iter().map(Into::into).collect();

        match check_ready_for_approval(&lines) {
            Ok(()) => {}
            Err(ApprovalGap::NoLines) => {
                return Err(AppError::IncompleteCount(format!(
                    "Stocktake for period {} has no lines; populate it before approving",
                    period.name
                )));
            }
            Err(ApprovalGap::Uncounted(items)) => {
                return Err(AppError::IncompleteCount(format!(
                    "{} of {} items in period {} have no counted units",
                    items.len(),
                    lines.len(),
                    period.name
                )));
            }
        }

        for line in &lines {
            let (counted, counted_qty, counted_value) = line.counted_snapshot().ok_or_else(|| {
                AppError::Internal(format!(
                    "line {} has a counted pair but missing derived values",
                    line.id
                ))
            })?;

            periods
                .commit_closing(
                    &mut tx,
                    &period,
                    line.item_id,
                    counted.full,
                    counted.partial,
                    counted_qty,
                    counted_value,
                )
                .await?;
        }

        sqlx::query("UPDATE periods SET is_closed = TRUE, updated_at = NOW() WHERE id = $1")
            .bind(period.id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        let total_variance_value = lines
            .iter()
            .map(|line| line.variance_value.unwrap_or(Decimal::ZERO))
            .sum::<Decimal>();

        tracing::info!(
            "Approved stocktake {} for period {} (variance value {})",
            stocktake.id,
            period.name,
            total_variance_value
        );

        self.notifier.emit(DomainEvent::StocktakeApproved {
            stocktake_id: stocktake.id,
            period_id: period.id,
            total_variance_value,
        });

        Ok(stocktake)
    }
}
