use anyhow::Result;
use spline::config::Config;
use spline::environment::load_environment;
use spline::scheduler::start_scheduler;
use spline::server::{self, App};
use std::sync::Arc;
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file (ignored in production)
    let _ = dotenvy::dotenv();

    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env().add_directive("spline=info".parse()?))
        .init();

    info!("Starting spline");

    // Load configuration from environment
    let config = Config::from_env()?;
    if config.debug {
        info!("Debug mode enabled");
    }

    // Plugins, languages, catalogs and templates
    let env = load_environment(config, Vec::new())?;

    // Route table and controllers
    let app = Arc::new(App::new(env)?);
    info!("Mapped {} routes", app.map().len());

    // Keep the scheduler alive for as long as the server runs
    let _scheduler = match app.environment().config.cron_schedule.clone() {
        Some(schedule) => Some(start_scheduler(&schedule, app.cron_runner()).await?),
        None => {
            info!("No cron schedule configured; cron runs only via /cron");
            None
        }
    };

    server::serve(app).await
}
