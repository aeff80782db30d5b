use salesvoice_api::{build_router, state::AppState};
use salesvoice_config::Settings;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let settings = Settings::load()?;

    let db = salesvoice_db::connect(&settings.mongo).await?;
    // Without the unique index on call_summaries.session_id there is no
    // cross-process finalize guard, so index bootstrap failure is fatal.
    salesvoice_db::indexes::ensure_indexes(&db).await?;

    let addr = format!("{}:{}", settings.server.host, settings.server.port);
    let state = AppState::new(&settings, db);
    let router = build_router(state);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(%addr, "Salesvoice API listening");
    axum::serve(listener, router).await?;

    Ok(())
}
