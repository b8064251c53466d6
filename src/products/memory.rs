use async_trait::async_trait;
use time::OffsetDateTime;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::products::repo::CatalogStore;
use crate::products::repo_types::{CatalogError, NewProduct, Product, ProductChanges};

/// Insertion-ordered in-process catalog.
#[derive(Default)]
pub struct MemoryCatalogStore {
    products: RwLock<Vec<Product>>,
}

impl MemoryCatalogStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CatalogStore for MemoryCatalogStore {
    async fn list(&self) -> Result<Vec<Product>, CatalogError> {
        Ok(self.products.read().await.clone())
    }

    async fn find(&self, id: Uuid) -> Result<Option<Product>, CatalogError> {
        Ok(self.products.read().await.iter().find(|p| p.id == id).cloned())
    }

    async fn create(&self, new: NewProduct) -> Result<Product, CatalogError> {
        let now = OffsetDateTime::now_utc();
        let product = Product {
            id: Uuid::new_v4(),
            name: new.name,
            price: new.price,
            description: new.description,
            category: new.category,
            image_url: new.image_url,
            stock: new.stock,
            created_at: now,
            updated_at: now,
        };
        self.products.write().await.push(product.clone());
        Ok(product)
    }

    async fn update(
        &self,
        id: Uuid,
        changes: ProductChanges,
    ) -> Result<Option<Product>, CatalogError> {
        let mut guard = self.products.write().await;
        let Some(product) = guard.iter_mut().find(|p| p.id == id) else {
            return Ok(None);
        };
        changes.apply(product);
        product.updated_at = OffsetDateTime::now_utc();
        Ok(Some(product.clone()))
    }

    async fn delete(&self, id: Uuid) -> Result<bool, CatalogError> {
        let mut guard = self.products.write().await;
        let before = guard.len();
        guard.retain(|p| p.id != id);
        Ok(guard.len() != before)
    }

    async fn clear(&self) -> Result<u64, CatalogError> {
        let mut guard = self.products.write().await;
        let n = guard.len() as u64;
        guard.clear();
        Ok(n)
    }
}
