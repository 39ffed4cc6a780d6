// Main entry point - settings, gateway wiring and console startup
use funnel_console::application::dashboard::DashboardController;
use funnel_console::infrastructure::http_gateway::HttpFunnelGateway;
use funnel_console::infrastructure::settings::load_console_settings;
use funnel_console::presentation::tui;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Log to a file; the terminal belongs to the console UI
    let log_file = std::fs::File::create("funnel-console.log")?;
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(Arc::new(log_file))
        .with_ansi(false)
        .init();

    let settings = load_console_settings()?;
    let gateway = Arc::new(HttpFunnelGateway::new(
        &settings.funnel.endpoint,
        settings.funnel.request_timeout(),
    )?);

    // Configuration must be loaded and every per-line controller built
    // before any polling starts; a failure here aborts startup instead
    // of rendering a partial dashboard.
    let dashboard = DashboardController::start(gateway).await?;

    tui::run(dashboard, settings.funnel.poll_cadence()).await
}
