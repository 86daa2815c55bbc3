//! Replica host lifecycle and REST listener for diptod

use crate::api::{create_router, AppState};
use crate::config::{DaemonConfig, ServerConfig, StoreConfig};
use crate::error::{DaemonError, DaemonResult};
use dipto_copywriter::{CopyError, DescriptionWriter, GeminiWriter};
use dipto_replica::{HostView, ReplicaHost};
use dipto_store::memory::{InMemoryDocumentStore, InMemoryIdentityProvider};
use dipto_store::{DocumentStore, IdentityProvider};
use std::future::{Future, IntoFuture};
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::oneshot;

/// Owns the backends, the replica host and the REST listener.
pub struct Server {
    config: ServerConfig,
    host: Arc<ReplicaHost>,
    writer: Option<Arc<dyn DescriptionWriter>>,
}

impl Server {
    pub fn new(config: &DaemonConfig) -> DaemonResult<Self> {
        let store: Arc<dyn DocumentStore> = match config.store {
            StoreConfig::Memory => Arc::new(InMemoryDocumentStore::new()),
        };

        let provider = InMemoryIdentityProvider::new();
        for account in &config.identity.accounts {
            provider.add_account(&account.label, &account.secret).map_err(|e| {
                DaemonError::Config(format!("identity account {}: {}", account.label, e))
            })?;
        }
        tracing::info!(
            accounts = config.identity.accounts.len(),
            "Identity provider ready"
        );
        let provider: Arc<dyn IdentityProvider> = Arc::new(provider);

        let writer: Option<Arc<dyn DescriptionWriter>> = match GeminiWriter::new(&config.copywriter) {
            Ok(writer) => Some(Arc::new(writer)),
            Err(CopyError::MissingApiKey) => {
                tracing::info!("No copywriter API key, description drafts disabled");
                None
            }
            Err(e) => return Err(e.into()),
        };

        Ok(Self {
            config: config.server.clone(),
            host: Arc::new(ReplicaHost::new(store, provider)),
            writer,
        })
    }

    pub fn host(&self) -> &ReplicaHost {
        &self.host
    }

    /// Run until Ctrl+C or SIGTERM.
    pub async fn run(self) -> DaemonResult<()> {
        self.run_until(shutdown_signal()).await
    }

    /// Bind the configured address and serve until `shutdown` resolves.
    pub async fn run_until(self, shutdown: impl Future<Output = ()>) -> DaemonResult<()> {
        let listener = TcpListener::bind(self.config.listen_addr)
            .await
            .map_err(|e| DaemonError::Server(format!("bind {}: {}", self.config.listen_addr, e)))?;
        self.serve(listener, shutdown).await
    }

    /// Start the host, serve the REST API on `listener` and log every state
    /// change until `shutdown` resolves, then stop both.
    pub async fn serve(
        self,
        listener: TcpListener,
        shutdown: impl Future<Output = ()>,
    ) -> DaemonResult<()> {
        let mut state = self.host.start()?;

        let addr = listener
            .local_addr()
            .map_err(|e| DaemonError::Server(e.to_string()))?;
        let app = create_router(
            AppState::new(self.host.clone(), self.writer.clone()),
            self.config.enable_cors,
        );
        let (stop_http, http_stopped) = oneshot::channel::<()>();
        let http = tokio::spawn(
            axum::serve(listener, app)
                .with_graceful_shutdown(async move {
                    let _ = http_stopped.await;
                })
                .into_future(),
        );
        tracing::info!("DIPTO daemon listening on {}", addr);

        tokio::pin!(shutdown);
        let mut banner_shown = false;
        loop {
            tokio::select! {
                _ = &mut shutdown => break,
                changed = state.changed() => {
                    if changed.is_err() {
                        break;
                    }
                    state.borrow_and_update();
                    let view = self.host.view();
                    if !banner_shown {
                        if let Some(banner) = view.banner.as_deref() {
                            tracing::warn!("{}", banner);
                            banner_shown = true;
                        }
                    }
                    log_view(&view);
                }
            }
        }

        tracing::info!("DIPTO daemon shutting down");
        let _ = stop_http.send(());
        let served = match http.await {
            Ok(result) => result.map_err(|e| DaemonError::Server(e.to_string())),
            Err(e) => Err(DaemonError::Server(e.to_string())),
        };
        self.host.stop().await;
        served
    }
}

fn log_view(view: &HostView) {
    let state = &view.state;
    tracing::info!(
        identity = state.identity.as_ref().map(|identity| identity.display_label()),
        view_mode = ?view.view_mode,
        maintenance = state.maintenance_flag,
        maintenance_blocks_access = view.maintenance_blocks_access,
        config_error = ?state.config_error,
        site = %state.configuration.display_name,
        catalog = state.catalog.len(),
        active_courses = view.stats.active_courses,
        initializing = state.initializing,
        "Replica state changed"
    );
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl+C handler");
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
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C, initiating graceful shutdown");
        }
        _ = terminate => {
            tracing::info!("Received terminate signal, initiating graceful shutdown");
        }
    }
}
