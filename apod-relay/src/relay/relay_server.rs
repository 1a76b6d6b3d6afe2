use crate::relay::{RelayConfig, RelayError, RelayService, save_handler, ws_handler};
use crate::storage::{SaveDirPicker, lan_ip};
use axum::Router;
use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use std::future::Future;
use std::io;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::info;

pub fn router(service: RelayService, config: &RelayConfig) -> Router {
    Router::new()
        .route("/ws", get(ws_handler))
        .route("/save/{track}", post(save_handler))
        .layer(DefaultBodyLimit::max(config.max_fragment_bytes))
        .with_state(service)
}

/// A bound, not yet serving relay.
pub struct Relay {
    listener: TcpListener,
    service: RelayService,
    router: Router,
}

impl Relay {
    pub async fn bind(config: RelayConfig, picker: Arc<dyn SaveDirPicker>) -> Result<Self, RelayError> {
        let listener = TcpListener::bind(config.bind)
            .await
            .map_err(|source| RelayError::Bind {
                addr: config.bind,
                source,
            })?;

        let service = RelayService::new(&config, lan_ip(), picker);
        let router = router(service.clone(), &config);

        Ok(Self {
            listener,
            service,
            router,
        })
    }

    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    pub fn service(&self) -> &RelayService {
        &self.service
    }

    pub async fn run<F>(self, shutdown: F) -> Result<(), RelayError>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        if let Ok(addr) = self.local_addr() {
            info!(
                "Relay listening on {} (LAN address {}), saving to {}",
                addr,
                self.service.lan_ip(),
                self.service.store().save_dir().display()
            );
        }

        axum::serve(self.listener, self.router)
            .with_graceful_shutdown(shutdown)
            .await
            .map_err(RelayError::Serve)?;

        info!("Relay stopped");
        Ok(())
    }
}
