//! Shop listing operations

use chrono::Utc;
use sqlx::Row;

use crate::error::DbError;
use crate::models::{NewShop, Shop, UpdateShop};
use crate::repository::Database;

/// Filters for listing shops
#[derive(Debug, Clone, Default)]
pub struct ShopQuery {
    /// Exact category match
    pub category: Option<String>,
    /// Substring match against the shop name
    pub search: Option<String>,
}

impl Database {
    // ==================== Shop Operations ====================

    /// Insert a new shop listing
    pub async fn insert_shop(&self, shop: NewShop) -> Result<Shop, DbError> {
        let now = Utc::now();

        let result = sqlx::query(
            r#"
            INSERT INTO shops (name, description, category, address, phone, owner_id,
                               created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            RETURNING id
            "#,
        )
        .bind(&shop.name)
        .bind(&shop.description)
        .bind(&shop.category)
        .bind(&shop.address)
        .bind(&shop.phone)
        .bind(shop.owner_id)
        .bind(now.to_rfc3339())
        .bind(now.to_rfc3339())
        .fetch_one(&self.pool)
        .await?;

        let id: i64 = result.get("id");

        Ok(Shop {
            id,
            name: shop.name,
            description: shop.description,
            category: shop.category,
            address: shop.address,
            phone: shop.phone,
            owner_id: shop.owner_id,
            created_at: now,
            updated_at: now,
        })
    }

    /// Get a shop by ID
    pub async fn get_shop_by_id(&self, id: i64) -> Result<Option<Shop>, DbError> {
        let result = sqlx::query(
            r#"
            SELECT id, name, description, category, address, phone, owner_id,
                   created_at, updated_at
            FROM shops
            WHERE id = ?
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        result.map(|row| Shop::try_from(&row).map_err(DbError::from)).transpose()
    }

    /// List shops matching the query, ordered by name
    pub async fn list_shops(&self, query: ShopQuery) -> Result<Vec<Shop>, DbError> {
        let mut conditions = Vec::new();
        let mut binds = Vec::new();

        if let Some(category) = query.category {
            conditions.push("category = ?");
            binds.push(category);
        }
        if let Some(search) = query.search {
            conditions.push("name LIKE ?");
            binds.push(format!("%{}%", search));
        }

        let where_clause = if conditions.is_empty() {
            String::new()
        } else {
            format!("WHERE {}", conditions.join(" AND "))
        };

        let sql = format!(
            r#"
            SELECT id, name, description, category, address, phone, owner_id,
                   created_at, updated_at
            FROM shops
            {}
            ORDER BY name
            "#,
            where_clause
        );

        let mut q = sqlx::query(&sql);
        for bind in &binds {
            q = q.bind(bind);
        }

        let rows = q.fetch_all(&self.pool).await?;

        rows.iter()
            .map(|row| Shop::try_from(row).map_err(DbError::from))
            .collect()
    }

    /// Update a shop listing
    ///
    /// Absent fields keep their stored value. Returns `None` when the id
    /// does not exist.
    pub async fn update_shop(&self, id: i64, update: UpdateShop) -> Result<Option<Shop>, DbError> {
        let existing = match self.get_shop_by_id(id).await? {
            Some(shop) => shop,
            None => return Ok(None),
        };

        let now = Utc::now();
        let merged = Shop {
            id,
            name: update.name.unwrap_or(existing.name),
            description: update.description.or(existing.description),
            category: update.category.unwrap_or(existing.category),
            address: update.address.unwrap_or(existing.address),
            phone: update.phone.or(existing.phone),
            owner_id: existing.owner_id,
            created_at: existing.created_at,
            updated_at: now,
        };

        sqlx::query(
            r#"
            UPDATE shops
            SET name = ?, description = ?, category = ?, address = ?, phone = ?, updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(&merged.name)
        .bind(&merged.description)
        .bind(&merged.category)
        .bind(&merged.address)
        .bind(&merged.phone)
        .bind(now.to_rfc3339())
        .bind(id)
        .execute(&self.pool)
        .await?;

        Ok(Some(merged))
    }

    /// Delete a shop listing
    pub async fn delete_shop(&self, id: i64) -> Result<bool, DbError> {
        let result = sqlx::query("DELETE FROM shops WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Count all shop listings
    pub async fn count_shops(&self) -> Result<i64, DbError> {
        let result = sqlx::query("SELECT COUNT(*) as count FROM shops")
            .fetch_one(&self.pool)
            .await?;
        Ok(result.get("count"))
    }
}
