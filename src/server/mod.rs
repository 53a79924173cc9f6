pub mod assets;
pub mod auth;
pub mod error;
pub mod routes;
pub mod shutdown;

use std::future::IntoFuture;
use std::io;
use std::net::SocketAddr;
use std::sync::Arc;

use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

use crate::server::routes::{build_router, AppState};
use crate::server::shutdown::ShutdownManager;

pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_level(true)
        .with_timer(tracing_subscriber::fmt::time::UtcTime::rfc_3339())
        .init();
}

pub struct ApiServer {
    pub addr: SocketAddr,
    /// The bound listener, kept alive so nothing can claim the port
    /// between try_bind() and run(). Populated by try_bind(), consumed
    /// by run().
    listener: Option<TcpListener>,
    state: AppState,
    shutdown: Arc<ShutdownManager>,
}

impl ApiServer {
    pub fn new(state: AppState, addr: SocketAddr) -> Self {
        Self {
            addr,
            listener: None,
            state,
            shutdown: Arc::new(ShutdownManager::new()),
        }
    }

    /// Bind the configured address, updating `addr` with what the OS
    /// actually assigned (relevant when the port was 0).
    pub async fn try_bind(&mut self) -> io::Result<SocketAddr> {
        let listener = TcpListener::bind(self.addr).await?;
        let actual = listener.local_addr()?;
        self.addr = actual;
        self.listener = Some(listener);
        tracing::info!("API server bound to {}", actual);
        Ok(actual)
    }

    pub fn shutdown_handle(&self) -> Arc<ShutdownManager> {
        self.shutdown.clone()
    }

    /// Serve until a shutdown signal arrives.
    ///
    /// Consumes self to take ownership of the pre-bound listener.
    /// Call try_bind() before run().
    pub async fn run(self) -> Result<(), Box<dyn std::error::Error>> {
        let listener = self
            .listener
            .ok_or("try_bind() must be called before run()")?;

        tracing::info!("Starting API server on {}", self.addr);

        let app = build_router(self.state);

        let shutdown = self.shutdown.clone();
        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                let _ = shutdown.wait_for_shutdown().await;
            })
            .into_future()
            .await?;

        tracing::info!("Shutting down gracefully");

        Ok(())
    }
}
