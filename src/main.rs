use anyhow::{Context, Result};
use danfe_proxy::config::Settings;
use danfe_proxy::infrastructure::init_tracing;
use danfe_proxy::Application;
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    let settings = Settings::new().context("failed to load settings")?;
    init_tracing(&settings.logging).context("failed to initialize tracing")?;

    info!("Starting Danfe Proxy application");

    let app = Application::build(settings).await?;
    app.run().await?;

    Ok(())
}
