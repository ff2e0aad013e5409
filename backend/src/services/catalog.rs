//! Item catalog service
//!
//! Items are reference data: created and maintained here, read-only to the
//! reconciliation core. Conversion rules reject items whose uom would make
//! the converter misbehave, so the engine never has to re-check.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Deserialize;
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use shared::models::{Category, Item};
use shared::validation;

use crate::error::{AppError, AppResult};

/// Catalog service for stock items
#[derive(Clone)]
pub struct CatalogService {
    db: PgPool,
}

/// Database row for an item
#[derive(Debug, FromRow)]
pub struct ItemRow {
    pub id: Uuid,
    pub sku: String,
    pub name: String,
    pub category: String,
    pub size: Option<String>,
    pub uom: Decimal,
    pub unit_cost: Decimal,
    pub menu_price: Decimal,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

pub fn item_from_row(row: ItemRow) -> AppResult<Item> {
    let category = Category::parse(&row.category)
        .ok_or_else(|| AppError::Internal(format!("unknown item category: {}", row.category)))?;
    Ok(Item {
        id: row.id,
        sku: row.sku,
        name: row.name,
        category,
        size: row.size,
        uom: row.uom,
        unit_cost: row.unit_cost,
        menu_price: row.menu_price,
        is_active: row.is_active,
        created_at: row.created_at,
    })
}

/// Input for creating a catalog item
#[derive(Debug, Deserialize)]
pub struct CreateItemInput {
    pub sku: String,
    pub name: String,
    pub category: Category,
    pub size: Option<String>,
    pub uom: Decimal,
    pub unit_cost: Decimal,
    pub menu_price: Option<Decimal>,
}

impl CatalogService {
    /// Create a new CatalogService instance
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// Create a catalog item
    pub async fn create_item(&self, input: CreateItemInput) -> AppResult<Item> {
        validation::validate_item_uom(&input.sku, input.uom)?;
        validation::validate_item_cost(input.unit_cost)?;
        if input.sku.trim().is_empty() {
            return Err(AppError::Validation {
                field: "sku".to_string(),
                message: "SKU must not be empty".to_string(),
            });
        }

        let exists = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM items WHERE sku = $1)",
        )
        .bind(&input.sku)
        .fetch_one(&self.db)
        .await?;

        if exists {
            return Err(AppError::DuplicateEntry("sku".to_string()));
        }

        let row = sqlx::query_as::<_, ItemRow>(
            r#"
            INSERT INTO items (sku, name, category, size, uom, unit_cost, menu_price)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING id, sku, name, category, size, uom, unit_cost, menu_price,
                      is_active, created_at
            "#,
        )
        .bind(&input.sku)
        .bind(&input.name)
        .bind(input.category.as_str())
        .bind(&input.size)
        .bind(input.uom)
        .bind(input.unit_cost)
        .bind(input.menu_price.unwrap_or(Decimal::ZERO))
        .fetch_one(&self.db)
        .await?;

        item_from_row(row)
    }

    /// Get an item by id
    pub async fn get_item(&self, item_id: Uuid) -> AppResult<Item> {
        let row = sqlx::query_as::<_, ItemRow>(
            "SELECT id, sku, name, category, size, uom, unit_cost, menu_price, is_active, created_at FROM items WHERE id = $1",
        )
        .bind(item_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Item".to_string()))?;

        item_from_row(row)
    }

    /// List catalog items, most recent first
    pub async fn list_items(&self) -> AppResult<Vec<Item>> {
        let rows = sqlx::query_as::<_, ItemRow>(
            "SELECT id, sku, name, category, size, uom, unit_cost, menu_price, is_active, created_at FROM items ORDER BY sku",
        )
        .fetch_all(&self.db)
        .await?;

        rows.into_iter().map(item_from_row).collect()
    }

    /// List active items (the population of a new stocktake)
    pub async fn list_active_items(&self) -> AppResult<Vec<Item>> {
        let rows = sqlx::query_as::<_, ItemRow>(
            "SELECT id, sku, name, category, size, uom, unit_cost, menu_price, is_active, created_at FROM items WHERE is_active ORDER BY sku",
        )
        .fetch_all(&self.db)
        .await?;

        rows.into_iter().map(item_from_row).collect()
    }
}
