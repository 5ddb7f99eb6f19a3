//! Tamiz: breast-cancer screening service.
//! Entry point for the server binary.

use anyhow::Context;
use tamiz_common::Config;
use tamiz_llm::RecommendationGenerator;
use tamiz_pipeline::dataset::ReferenceDataset;
use tamiz_pipeline::ModelContext;
use tamiz_web::state::AppState;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // A missing .env is normal outside development.
    let dotenv = dotenvy::dotenv();

    // Initialise structured logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("tamiz=debug,info")),
        )
        .init();

    info!("Tamiz starting up...");
    info!("Version: {}", env!("CARGO_PKG_VERSION"));
    if let Ok(path) = dotenv {
        info!("Loaded environment from {}", path.display());
    }

    let config = Config::load().context("loading configuration")?;

    // Artifacts are fatal: never serve without a complete model context.
    let model = ModelContext::load(&config.artifacts).with_context(|| {
        format!("loading model artifacts from {}", config.artifacts.dir.display())
    })?;
    info!("✅ Model context ready: {} input columns.", model.required_columns().len());

    let generator = RecommendationGenerator::from_config(&config.llm, &config.recommendation);
    match generator.model_id() {
        Some(model_id) => info!("✅ Generative recommendations enabled ({model_id})."),
        None => warn!("GEMINI_API_KEY not configured; recommendations use fixed templates."),
    }

    let mut state = AppState::new(model, generator)
        .with_fill_missing_with_zero(config.web.fill_missing_with_zero);

    if let Some(path) = &config.dataset.path {
        match ReferenceDataset::load(path, &config.dataset.id_column, config.dataset.delimiter) {
            Ok(dataset) => state = state.with_dataset(dataset),
            Err(e) => warn!("Reference dataset unavailable, demo lookups disabled: {e}"),
        }
    }

    let app = tamiz_web::router::build_router(state);
    let listener = tokio::net::TcpListener::bind(&config.web.bind)
        .await
        .with_context(|| format!("binding {}", config.web.bind))?;
    info!("🚀 Server listening on http://{}", config.web.bind);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Tamiz stopped.");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for shutdown signal: {e}");
        std::future::pending::<()>().await;
    }
}
