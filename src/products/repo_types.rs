use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use time::OffsetDateTime;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: Uuid,
    pub name: String,
    pub price: f64,
    pub description: String,
    pub category: String,
    #[serde(rename = "imageURL")]
    pub image_url: String,
    pub stock: i32,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

#[derive(Debug, Clone)]
pub struct NewProduct {
    pub name: String,
    pub price: f64,
    pub description: String,
    pub category: String,
    pub image_url: String,
    pub stock: i32,
}

/// Partial overwrite; `None` keeps the stored value, `Some(0)` stock is a real zero.
#[derive(Debug, Clone, Default)]
pub struct ProductChanges {
    pub name: Option<String>,
    pub price: Option<f64>,
    pub description: Option<String>,
    pub category: Option<String>,
    pub image_url: Option<String>,
    pub stock: Option<i32>,
}

impl ProductChanges {
    pub fn apply(self, p: &mut Product) {
        if let Some(v) = self.name {
            p.name = v;
        }
        if let Some(v) = self.price {
            p.price = v;
        }
        if let Some(v) = self.description {
            p.description = v;
        }
        if let Some(v) = self.category {
            p.category = v;
        }
        if let Some(v) = self.image_url {
            p.image_url = v;
        }
        if let Some(v) = self.stock {
            p.stock = v;
        }
    }
}

#[derive(Debug, Clone, thiserror::Error)]
pub enum CatalogError {
    #[error("database error: {0}")]
    Database(String),
}

impl From<sqlx::Error> for CatalogError {
    fn from(e: sqlx::Error) -> Self {
        CatalogError::Database(e.to_string())
    }
}
