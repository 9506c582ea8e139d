use crate::config::Settings;
use crate::proxy::ProxyService;
use crate::Result;
use axum::Router;
use std::net::SocketAddr;
use tokio::net::TcpListener;
use tracing::{info, instrument};

/// Main application struct that coordinates all components
pub struct Application {
    settings: Settings,
    listener: TcpListener,
    router: Router,
}

impl Application {
    /// Load settings from files and the environment, then build
    #[instrument]
    pub async fn new() -> Result<Self> {
        Self::build(Settings::new()?).await
    }

    /// Bind the listener and assemble the router for `settings`
    #[instrument(skip_all)]
    pub async fn build(settings: Settings) -> Result<Self> {
        Self::build_with_service(ProxyService::new(&settings)?, settings).await
    }

    /// Like [`Application::build`], with a preconfigured service
    pub async fn build_with_service(service: ProxyService, settings: Settings) -> Result<Self> {
        let router = service.into_router(&settings.application)?;
        let address = format!(
            "{}:{}",
            settings.application.host, settings.application.port
        );
        let listener = TcpListener::bind(&address).await?;

        Ok(Self {
            settings,
            listener,
            router,
        })
    }

    pub fn local_addr(&self) -> Result<SocketAddr> {
        Ok(self.listener.local_addr()?)
    }

    #[instrument(skip(self))]
    pub async fn run(self) -> Result<()> {
        info!(
            address = %self.local_addr()?,
            environment = %self.settings.application.environment,
            allowed_origin = %self.settings.application.allowed_origin,
            "Starting Danfe Proxy server"
        );

        axum::serve(self.listener, self.router)
            .with_graceful_shutdown(shutdown_signal())
            .await?;

        info!("Server stopped");
        Ok(())
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::warn!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::warn!(error = %e, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    info!("Shutdown signal received");
}
