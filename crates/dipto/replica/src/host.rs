//! Replica host: subscription lifecycle and the composed state
//!
//! The host owns a single driver task. The driver holds the three replica
//! feeds and a command channel for optimistic echoes, applies every delivery
//! to its private [`ReplicaState`] and publishes the result on a `watch`
//! channel. Nothing else ever writes the state.

use crate::catalog::CatalogReplica;
use crate::config::{ConfigEvent, ConfigReplica};
use crate::error::{ReplicaError, ReplicaResult};
use crate::identity::IdentityWatcher;
use crate::reconcile::Reconciled;
use crate::subscription::Feed;
use dipto_gate::{active_view_mode, decide, maintenance_blocks_access, GateInputs, Route, RouteDecision};
use dipto_store::{DocumentStore, IdentityProvider};
use dipto_types::{
    CatalogDraft, CatalogItem, CatalogStats, ConfigErrorKind, Identity, ItemId, PublishStatus, ReplicaState,
    SiteConfiguration, ViewMode,
};
use serde::Serialize;
use std::sync::{Arc, Mutex, PoisonError};
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{debug, info, instrument, warn};

/// Operator-facing message raised when the configuration channel refuses access.
pub const PERMISSION_BANNER: &str =
    "The document store refused access to the site configuration. Built-in settings are shown and changes may only be saved locally.";

/// Render-ready view derived from the current state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HostView {
    pub state: ReplicaState,
    pub view_mode: ViewMode,
    pub maintenance_blocks_access: bool,
    pub banner: Option<String>,
    /// Dashboard figures over the current catalog.
    pub stats: CatalogStats,
}

impl HostView {
    fn derive(state: ReplicaState) -> Self {
        let view_mode = active_view_mode(state.identity.as_ref());
        let maintenance_blocks_access =
            maintenance_blocks_access(state.maintenance_flag, state.identity.as_ref());
        let banner = (state.config_error == ConfigErrorKind::PermissionDenied)
            .then(|| PERMISSION_BANNER.to_string());
        let stats = CatalogStats::compute(&state.catalog);
        Self {
            state,
            view_mode,
            maintenance_blocks_access,
            banner,
            stats,
        }
    }
}

/// Local change applied before the remote snapshot confirms it.
#[derive(Debug)]
enum Echo {
    Configuration(SiteConfiguration),
    Upsert(CatalogItem),
    Status(ItemId, PublishStatus),
    Remove(ItemId),
}

struct Running {
    cancel: watch::Sender<bool>,
    echoes: mpsc::UnboundedSender<Echo>,
    driver: JoinHandle<()>,
}

/// Owns the replica subscriptions and the composed [`ReplicaState`].
pub struct ReplicaHost {
    identity: IdentityWatcher,
    config: ConfigReplica,
    catalog: CatalogReplica,
    state: watch::Sender<ReplicaState>,
    running: Mutex<Option<Running>>,
}

impl ReplicaHost {
    pub fn new(store: Arc<dyn DocumentStore>, provider: Arc<dyn IdentityProvider>) -> Self {
        let (state, _) = watch::channel(ReplicaState::default());
        Self {
            identity: IdentityWatcher::new(provider),
            config: ConfigReplica::new(store.clone()),
            catalog: CatalogReplica::new(store),
            state,
            running: Mutex::new(None),
        }
    }

    /// Start all three subscriptions and return the state stream.
    ///
    /// Every run starts from [`ReplicaState::default`], so nothing from a
    /// previous run carries over. Must be called from within a tokio runtime.
    pub fn start(&self) -> ReplicaResult<watch::Receiver<ReplicaState>> {
        let mut running = self.running.lock().unwrap_or_else(PoisonError::into_inner);
        if running.is_some() {
            return Err(ReplicaError::AlreadyRunning);
        }

        let (cancel, cancel_rx) = watch::channel(false);
        let (echoes, echo_rx) = mpsc::unbounded_channel();
        let initial = ReplicaState::default();
        self.state.send_replace(initial.clone());
        let driver = Driver {
            configuration: Reconciled::new(initial.configuration.clone()),
            catalog: Reconciled::new(initial.catalog.clone()),
            config_degraded: false,
            state: initial,
            publish: self.state.clone(),
        };
        let feeds = Feeds {
            identity: self.identity.subscribe(),
            config: self.config.subscribe(),
            catalog: self.catalog.subscribe(),
        };

        let driver = tokio::spawn(driver.run(feeds, echo_rx, cancel_rx));
        *running = Some(Running {
            cancel,
            echoes,
            driver,
        });
        info!("Replica host started");
        Ok(self.state.subscribe())
    }

    /// Unsubscribe everything and wait for the driver to finish.
    ///
    /// No state change is published after this returns. Calling it again is a no-op.
    pub async fn stop(&self) {
        let running = self
            .running
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        let Some(running) = running else {
            return;
        };

        running.cancel.send_replace(true);
        if let Err(e) = running.driver.await {
            warn!(error = %e, "Replica driver ended abnormally");
        }
        info!("Replica host stopped");
    }

    pub fn is_running(&self) -> bool {
        self.running
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }

    /// A new receiver for the composed state.
    pub fn watch(&self) -> watch::Receiver<ReplicaState> {
        self.state.subscribe()
    }

    pub fn state(&self) -> ReplicaState {
        self.state.borrow().clone()
    }

    pub fn view(&self) -> HostView {
        HostView::derive(self.state())
    }

    /// Run the access gate for `path` against the current state.
    pub fn decide(&self, path: &str) -> RouteDecision {
        let state = self.state.borrow();
        decide(&Route::classify(path), GateInputs::from_state(&state))
    }

    pub fn identity(&self) -> &IdentityWatcher {
        &self.identity
    }

    pub fn config_replica(&self) -> &ConfigReplica {
        &self.config
    }

    pub fn catalog_replica(&self) -> &CatalogReplica {
        &self.catalog
    }

    fn echo(&self, echo: Echo) {
        let running = self.running.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(running) = running.as_ref() {
            if running.echoes.send(echo).is_err() {
                debug!("Replica driver gone, echo dropped");
            }
        }
    }

    /// Save the configuration. The new value is shown locally even if the write fails.
    #[instrument(skip_all)]
    pub async fn update_configuration(&self, config: SiteConfiguration) -> ReplicaResult<()> {
        self.echo(Echo::Configuration(config.clone()));
        self.config.update(&config).await
    }

    #[instrument(skip_all, fields(id = %item.id))]
    pub async fn create_item(&self, item: CatalogItem) -> ReplicaResult<()> {
        self.catalog.create(&item).await?;
        self.echo(Echo::Upsert(item));
        Ok(())
    }

    #[instrument(skip_all, fields(id = %item.id))]
    pub async fn update_item(&self, item: CatalogItem) -> ReplicaResult<()> {
        self.catalog.update(&item).await?;
        self.echo(Echo::Upsert(item));
        Ok(())
    }

    #[instrument(skip(self))]
    pub async fn set_item_status(&self, id: &ItemId, status: PublishStatus) -> ReplicaResult<CatalogItem> {
        let item = self.catalog.set_status(id, status).await?;
        self.echo(Echo::Status(id.clone(), status));
        Ok(item)
    }

    pub async fn toggle_item_status(&self, item: &CatalogItem) -> ReplicaResult<CatalogItem> {
        self.set_item_status(&item.id, item.status.toggled()).await
    }

    #[instrument(skip(self))]
    pub async fn delete_item(&self, id: &ItemId) -> ReplicaResult<()> {
        self.catalog.delete(id).await?;
        self.echo(Echo::Remove(id.clone()));
        Ok(())
    }

    pub async fn save_draft(
        &self,
        draft: CatalogDraft,
        existing: Option<&CatalogItem>,
    ) -> ReplicaResult<CatalogItem> {
        let item = self.catalog.save_draft(draft, existing).await?;
        self.echo(Echo::Upsert(item.clone()));
        Ok(item)
    }

    pub async fn sign_in(&self, label: &str, secret: &str) -> ReplicaResult<Identity> {
        self.identity.sign_in(label, secret).await
    }

    pub async fn register(&self, label: &str, secret: &str) -> ReplicaResult<Identity> {
        self.identity.register(label, secret).await
    }

    /// Best effort; the identity feed clears the state.
    pub async fn sign_out(&self) {
        self.identity.sign_out().await;
    }
}

struct Feeds {
    identity: Feed<Option<Identity>>,
    config: Feed<ConfigEvent>,
    catalog: Feed<Vec<CatalogItem>>,
}

impl Feeds {
    fn unsubscribe(&mut self) {
        self.identity.unsubscribe();
        self.config.unsubscribe();
        self.catalog.unsubscribe();
    }
}

async fn cancelled(cancel: &mut watch::Receiver<bool>) {
    let _ = cancel.wait_for(|cancelled| *cancelled).await;
}

struct Driver {
    state: ReplicaState,
    configuration: Reconciled<SiteConfiguration>,
    catalog: Reconciled<Vec<CatalogItem>>,
    /// Set once the configuration channel failed; later values are fallbacks.
    config_degraded: bool,
    publish: watch::Sender<ReplicaState>,
}

impl Driver {
    async fn run(
        mut self,
        mut feeds: Feeds,
        mut echoes: mpsc::UnboundedReceiver<Echo>,
        mut cancel: watch::Receiver<bool>,
    ) {
        loop {
            tokio::select! {
                biased;
                _ = cancelled(&mut cancel) => break,
                Some(echo) = echoes.recv() => self.apply_echo(echo),
                Some(identity) = feeds.identity.next() => self.apply_identity(identity),
                Some(event) = feeds.config.next() => self.apply_config(event),
                Some(items) = feeds.catalog.next() => {
                    debug!(items = items.len(), "Catalog delivered");
                    self.catalog.confirm(items);
                }
                else => break,
            }

            if *cancel.borrow() {
                break;
            }
            self.publish();
        }

        feeds.unsubscribe();
        debug!("Replica driver finished");
    }

    fn apply_identity(&mut self, identity: Option<Identity>) {
        if self.state.initializing {
            debug!("First identity notification received");
        }
        self.state.identity = identity;
        self.state.initializing = false;
    }

    fn apply_config(&mut self, event: ConfigEvent) {
        match event {
            ConfigEvent::Updated(config) => {
                if !self.config_degraded {
                    self.state.config_error = ConfigErrorKind::None;
                }
                self.configuration.confirm(config);
            }
            ConfigEvent::Failed(kind) => {
                warn!(?kind, "Configuration channel degraded");
                self.config_degraded = true;
                self.state.config_error = kind;
            }
        }
    }

    fn apply_echo(&mut self, echo: Echo) {
        debug!(?echo, "Applying optimistic echo");
        match echo {
            Echo::Configuration(config) => self.configuration.propose(config),
            Echo::Upsert(item) => self.catalog.propose_with(|items| {
                match items.iter_mut().find(|existing| existing.id == item.id) {
                    Some(existing) => *existing = item,
                    None => items.push(item),
                }
            }),
            Echo::Status(id, status) => self.catalog.propose_with(|items| {
                if let Some(existing) = items.iter_mut().find(|existing| existing.id == id) {
                    existing.status = status;
                }
            }),
            Echo::Remove(id) => self
                .catalog
                .propose_with(|items| items.retain(|existing| existing.id != id)),
        }
    }

    fn publish(&mut self) {
        self.state.set_configuration(self.configuration.effective().clone());
        self.state.catalog = self.catalog.effective().clone();

        let next = self.state.clone();
        self.publish.send_if_modified(|current| {
            if *current == next {
                false
            } else {
                *current = next;
                true
            }
        });
    }
}
