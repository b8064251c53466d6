use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use crate::products::repo_types::{CatalogError, NewProduct, Product, ProductChanges};

#[async_trait]
pub trait CatalogStore: Send + Sync {
    async fn list(&self) -> Result<Vec<Product>, CatalogError>;
    async fn find(&self, id: Uuid) -> Result<Option<Product>, CatalogError>;
    async fn create(&self, new: NewProduct) -> Result<Product, CatalogError>;
    /// `Ok(None)` when the product does not exist.
    async fn update(&self, id: Uuid, changes: ProductChanges)
        -> Result<Option<Product>, CatalogError>;
    /// `Ok(false)` when there was nothing to delete.
    async fn delete(&self, id: Uuid) -> Result<bool, CatalogError>;
    async fn clear(&self) -> Result<u64, CatalogError>;
}

#[derive(Clone)]
pub struct PgCatalogStore {
    db: PgPool,
}

impl PgCatalogStore {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl CatalogStore for PgCatalogStore {
    async fn list(&self) -> Result<Vec<Product>, CatalogError> {
        let rows = sqlx::query_as::<_, Product>(
            r#"
            SELECT id, name, price, description, category, image_url, stock,
                   created_at, updated_at
              FROM products
             ORDER BY created_at ASC
            "#,
        )
        .fetch_all(&self.db)
        .await?;
        Ok(rows)
    }

    async fn find(&self, id: Uuid) -> Result<Option<Product>, CatalogError> {
        let row = sqlx::query_as::<_, Product>(
            r#"
            SELECT id, name, price, description, category, image_url, stock,
                   created_at, updated_at
              FROM products
             WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.db)
        .await?;
        Ok(row)
    }

    async fn create(&self, new: NewProduct) -> Result<Product, CatalogError> {
        let row = sqlx::query_as::<_, Product>(
            r#"
            INSERT INTO products (id, name, price, description, category, image_url, stock)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING id, name, price, description, category, image_url, stock,
                      created_at, updated_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(new.name)
        .bind(new.price)
        .bind(new.description)
        .bind(new.category)
        .bind(new.image_url)
        .bind(new.stock)
        .fetch_one(&self.db)
        .await?;
        Ok(row)
    }

    async fn update(
        &self,
        id: Uuid,
        changes: ProductChanges,
    ) -> Result<Option<Product>, CatalogError> {
        let row = sqlx::query_as::<_, Product>(
            r#"
            UPDATE products
               SET name = COALESCE($2, name),
                   price = COALESCE($3, price),
                   description = COALESCE($4, description),
                   category = COALESCE($5, category),
                   image_url = COALESCE($6, image_url),
                   stock = COALESCE($7, stock),
                   updated_at = now()
             WHERE id = $1
            RETURNING id, name, price, description, category, image_url, stock,
                      created_at, updated_at
            "#,
        )
        .bind(id)
        .bind(changes.name)
        .bind(changes.price)
        .bind(changes.description)
        .bind(changes.category)
        .bind(changes.image_url)
        .bind(changes.stock)
        .fetch_optional(&self.db)
        .await?;
        Ok(row)
    }

    async fn delete(&self, id: Uuid) -> Result<bool, CatalogError> {
        let res = sqlx::query("DELETE FROM products WHERE id = $1")
            .bind(id)
            .execute(&self.db)
            .await?;
        Ok(res.rows_affected() > 0)
    }

    async fn clear(&self) -> Result<u64, CatalogError> {
        let res = sqlx::query("DELETE FROM products").execute(&self.db).await?;
        Ok(res.rows_affected())
    }
}
