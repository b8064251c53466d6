use serde::Deserialize;

use crate::error::ApiError;
use crate::products::repo_types::{NewProduct, ProductChanges};

#[derive(Debug, Default, Deserialize)]
pub struct CreateProductRequest {
    pub name: Option<String>,
    pub price: Option<f64>,
    pub description: Option<String>,
    pub category: Option<String>,
    #[serde(rename = "imageURL")]
    pub image_url: Option<String>,
    pub stock: Option<i32>,
}

#[derive(Debug, Default, Deserialize)]
pub struct UpdateProductRequest {
    pub name: Option<String>,
    pub price: Option<f64>,
    pub description: Option<String>,
    pub category: Option<String>,
    #[serde(rename = "imageURL")]
    pub image_url: Option<String>,
    pub stock: Option<i32>,
}

fn non_blank(v: Option<String>) -> Option<String> {
    v.map(|s| s.trim().to_string()).filter(|s| !s.is_empty())
}

impl TryFrom<CreateProductRequest> for NewProduct {
    type Error = ApiError;

    fn try_from(req: CreateProductRequest) -> Result<Self, Self::Error> {
        let missing = || ApiError::BadRequest("Please provide all required product fields".into());
        let price = req.price.ok_or_else(missing)?;
        if !price.is_finite() || price < 0.0 {
            return Err(ApiError::BadRequest("Price must be a non-negative number".into()));
        }
        let stock = req.stock.unwrap_or(0);
        if stock < 0 {
            return Err(ApiError::BadRequest("Stock cannot be negative".into()));
        }
        Ok(NewProduct {
            name: non_blank(req.name).ok_or_else(missing)?,
            price,
            description: non_blank(req.description).ok_or_else(missing)?,
            category: non_blank(req.category).ok_or_else(missing)?,
            image_url: non_blank(req.image_url).ok_or_else(missing)?,
            stock,
        })
    }
}

impl TryFrom<UpdateProductRequest> for ProductChanges {
    type Error = ApiError;

    fn try_from(req: UpdateProductRequest) -> Result<Self, Self::Error> {
        if let Some(price) = req.price {
            if !price.is_finite() || price < 0.0 {
                return Err(ApiError::BadRequest("Price must be a non-negative number".into()));
            }
        }
        if matches!(req.stock, Some(s) if s < 0) {
            return Err(ApiError::BadRequest("Stock cannot be negative".into()));
        }
        Ok(ProductChanges {
            name: non_blank(req.name),
            // zero price means "not provided"; only stock distinguishes an explicit zero
            price: req.price.filter(|p| *p != 0.0),
            description: non_blank(req.description),
            category: non_blank(req.category),
            image_url: non_blank(req.image_url),
            stock: req.stock,
        })
    }
}
