use storefront::{seed, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    storefront::init_tracing();

    let state = AppState::init().await?;
    let report = seed::run(&state).await?;

    tracing::info!(
        users = report.users,
        admins = report.admins,
        products = report.products,
        "seed complete"
    );
    tracing::info!(
        user = %report.credentials.user.email,
        admin = %report.credentials.admin.email,
        "demo accounts ready"
    );
    Ok(())
}
