use storefront::{app, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    storefront::init_tracing();

    let state = AppState::init().await?;
    let config = state.config.clone();
    let app = app::build_app(state)?;

    app::serve(app, &config).await
}
