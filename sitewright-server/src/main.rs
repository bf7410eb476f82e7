use anyhow::Context;
use sitewright_runner::{BuildLogReader, Config, Orchestrator, WebhookNotifier};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

pub mod api;
pub mod state;

use state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // A missing .env is fine; the process environment still applies
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "sitewright_server=info,sitewright_runner=info,tower_http=debug".into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting Sitewright server...");

    let config = Config::from_env();
    config.validate().context("Invalid configuration")?;

    tracing::info!("Work directory: {}", config.work_dir.display());
    tracing::info!(
        "Build timeout: {}s, callback timeout: {}s",
        config.build_timeout.as_secs(),
        config.callback_timeout.as_secs()
    );

    let notifier = WebhookNotifier::from_config(&config).context("Failed to create HTTP client")?;
    let logs = BuildLogReader::from_config(&config);
    let orchestrator = Arc::new(Orchestrator::new(Arc::new(config), Arc::new(notifier)));

    report_startup_checks(&orchestrator);

    let app = api::create_router(AppState::new(orchestrator, logs));

    let addr =
        std::env::var("SITEWRIGHT_BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:8000".to_string());

    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;

    axum::serve(listener, app)
        .await
        .context("Server terminated unexpectedly")?;

    Ok(())
}

/// Logs problems an operator should fix; the server starts regardless and
/// refuses builds until the build program is in place
fn report_startup_checks(orchestrator: &Orchestrator) {
    let config = orchestrator.config();

    match orchestrator.check_build_script() {
        Ok(()) => tracing::info!("Build program: {}", config.script_path().display()),
        Err(e) => tracing::warn!("Build program unusable, builds will be refused: {}", e),
    }

    match &config.remote_site_url {
        Some(url) => tracing::info!("Public site base: {}", url),
        None => tracing::warn!("REMOTE_SITE_URL not set; callbacks will carry site slugs only"),
    }
}
