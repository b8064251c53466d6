//! Demo data: two users, one admin and a small catalog. Running it wipes all three tables.

use axum::{extract::State, Json};
use serde::Serialize;
use tracing::{info, instrument};

use crate::auth::{
    password::hash_password_blocking,
    repo_types::{NewPrincipal, PrincipalKind},
};
use crate::error::ApiError;
use crate::products::repo_types::NewProduct;
use crate::state::AppState;

pub const USER_PASSWORD: &str = "password123";
pub const ADMIN_PASSWORD: &str = "admin123";

const USERS: &[(&str, &str)] = &[
    ("John Doe", "john@example.com"),
    ("Jane Smith", "jane@example.com"),
];

const ADMINS: &[(&str, &str)] = &[("Admin User", "admin@example.com")];

// name, price, description, category, image, stock
const PRODUCTS: &[(&str, f64, &str, &str, &str, i32)] = &[
    (
        "iPhone 15 Pro",
        999.0,
        "The latest iPhone with A17 Pro chip, titanium design, and advanced camera system.",
        "Electronics",
        "https://images.unsplash.com/photo-1695048133142-1a20484d2569?w=500",
        50,
    ),
    (
        "MacBook Pro 14\"",
        1999.0,
        "Powerful laptop with M3 Pro chip, stunning Liquid Retina XDR display.",
        "Electronics",
        "https://images.unsplash.com/photo-1517336714731-489689fd1ca8?w=500",
        25,
    ),
    (
        "Nike Air Jordan 1",
        180.0,
        "Classic basketball shoes with premium leather and iconic design.",
        "Clothing",
        "https://images.unsplash.com/photo-1556906781-9a412961c28c?w=500",
        100,
    ),
    (
        "Sony WH-1000XM5",
        349.0,
        "Industry-leading noise canceling wireless headphones.",
        "Electronics",
        "https://images.unsplash.com/photo-1618366712010-f4ae9c647dcb?w=500",
        75,
    ),
    (
        "Yoga Mat Premium",
        45.0,
        "Non-slip yoga mat with extra cushioning for comfortable workouts.",
        "Sports",
        "https://images.unsplash.com/photo-1601925260368-ae2f83cf8b7f?w=500",
        200,
    ),
    (
        "Coffee Maker Deluxe",
        129.0,
        "Programmable coffee maker with built-in grinder and thermal carafe.",
        "Home",
        "https://images.unsplash.com/photo-1495474472287-4d71bcdd2085?w=500",
        60,
    ),
    (
        "The Great Gatsby",
        15.0,
        "Classic American novel by F. Scott Fitzgerald.",
        "Books",
        "https://images.unsplash.com/photo-1544947950-fa07a98d237f?w=500",
        500,
    ),
    (
        "Running Shoes Pro",
        120.0,
        "Lightweight running shoes with advanced cushioning technology.",
        "Sports",
        "https://images.unsplash.com/photo-1542291026-7eec264c27ff?w=500",
        150,
    ),
];

#[derive(Debug, Clone, Serialize)]
pub struct Credential {
    pub email: &'static str,
    pub password: &'static str,
}

#[derive(Debug, Clone, Serialize)]
pub struct DemoCredentials {
    pub admin: Credential,
    pub user: Credential,
}

#[derive(Debug, Clone, Serialize)]
pub struct SeedReport {
    pub users: usize,
    pub admins: usize,
    pub products: usize,
    pub credentials: DemoCredentials,
}

async fn insert_principals(
    state: &AppState,
    kind: PrincipalKind,
    rows: &[(&str, &str)],
    password: &str,
) -> Result<usize, ApiError> {
    for (name, email) in rows {
        let password_hash = hash_password_blocking(password.to_string()).await?;
        state
            .credentials
            .create(
                kind,
                NewPrincipal {
                    name: (*name).to_string(),
                    email: (*email).to_string(),
                    password_hash,
                },
            )
            .await?;
    }
    Ok(rows.len())
}

pub async fn run(state: &AppState) -> Result<SeedReport, ApiError> {
    let cleared_users = state.credentials.clear(PrincipalKind::User).await?;
    let cleared_admins = state.credentials.clear(PrincipalKind::Admin).await?;
    let cleared_products = state.catalog.clear().await?;
    info!(cleared_users, cleared_admins, cleared_products, "cleared existing data");

    let users = insert_principals(state, PrincipalKind::User, USERS, USER_PASSWORD).await?;
    let admins = insert_principals(state, PrincipalKind::Admin, ADMINS, ADMIN_PASSWORD).await?;

    for &(name, price, description, category, image_url, stock) in PRODUCTS {
        state
            .catalog
            .create(NewProduct {
                name: name.into(),
                price,
                description: description.into(),
                category: category.into(),
                image_url: image_url.into(),
                stock,
            })
            .await?;
    }

    let report = SeedReport {
        users,
        admins,
        products: PRODUCTS.len(),
        credentials: DemoCredentials {
            admin: Credential {
                email: ADMINS[0].1,
                password: ADMIN_PASSWORD,
            },
            user: Credential {
                email: USERS[0].1,
                password: USER_PASSWORD,
            },
        },
    };
    info!(users, admins, products = report.products, "database seeded");
    Ok(report)
}

#[derive(Debug, Serialize)]
pub struct SeedResponse {
    pub message: &'static str,
    pub credentials: DemoCredentials,
}

/// `POST /api/seed`; only mounted when the seed endpoint is enabled.
#[instrument(skip(state))]
pub async fn seed_handler(State(state): State<AppState>) -> Result<Json<SeedResponse>, ApiError> {
    let report = run(&state).await?;
    Ok(Json(SeedResponse {
        message: "Database seeded successfully!",
        credentials: report.credentials,
    }))
}
