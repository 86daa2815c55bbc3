//! Single-document replica of the site configuration

use crate::error::{ReplicaError, ReplicaResult};
use crate::subscription::{spawn_feed, Feed};
use dipto_store::{DocumentPath, DocumentStore};
use dipto_types::{ConfigErrorKind, SiteConfiguration};
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

pub const SETTINGS_COLLECTION: &str = "settings";
pub const SETTINGS_DOCUMENT: &str = "global";

/// Address of the singleton configuration document.
pub fn settings_path() -> DocumentPath {
    DocumentPath::new(SETTINGS_COLLECTION, SETTINGS_DOCUMENT)
}

/// One delivery of the configuration feed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigEvent {
    Updated(SiteConfiguration),
    /// The channel failed. Always followed by `Updated` with the built-in default.
    Failed(ConfigErrorKind),
}

#[derive(Clone)]
pub struct ConfigReplica {
    store: Arc<dyn DocumentStore>,
    path: DocumentPath,
}

impl ConfigReplica {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self {
            store,
            path: settings_path(),
        }
    }

    /// Attach to the configuration document.
    ///
    /// A document missing on the first snapshot is created from the built-in
    /// default, once, without waiting for the write. A transport error ends the
    /// feed after reporting its kind and the default.
    pub fn subscribe(&self) -> Feed<ConfigEvent> {
        let store = self.store.clone();
        let path = self.path.clone();

        spawn_feed(move |publisher| async move {
            let mut listener = store.listen_document(&path).await;
            let mut first = true;

            loop {
                let delivery = tokio::select! {
                    _ = publisher.cancelled() => break,
                    delivery = listener.next() => delivery,
                };

                match delivery {
                    None => {
                        debug!(path = %path, "Configuration listener closed");
                        break;
                    }
                    Some(Ok(snapshot)) => {
                        let event = match snapshot.data {
                            Some(value) => match SiteConfiguration::decode(value) {
                                Ok(config) => Some(ConfigEvent::Updated(config)),
                                Err(e) => {
                                    warn!(path = %path, error = %e, "Malformed configuration ignored");
                                    None
                                }
                            },
                            None if first => {
                                info!(path = %path, "Configuration missing, seeding built-in default");
                                seed_default(store.clone(), path.clone());
                                Some(ConfigEvent::Updated(SiteConfiguration::default()))
                            }
                            None => {
                                debug!(path = %path, "Configuration removed, using built-in default");
                                Some(ConfigEvent::Updated(SiteConfiguration::default()))
                            }
                        };
                        first = false;

                        if let Some(event) = event {
                            if !publisher.publish(event) {
                                break;
                            }
                        }
                    }
                    Some(Err(e)) => {
                        let kind = if e.is_permission_denied() {
                            warn!(path = %path, error = %e, "Configuration access denied, using built-in default");
                            ConfigErrorKind::PermissionDenied
                        } else {
                            warn!(path = %path, error = %e, "Configuration channel failed, using built-in default");
                            ConfigErrorKind::Unknown
                        };
                        publisher.publish(ConfigEvent::Failed(kind));
                        publisher.publish(ConfigEvent::Updated(SiteConfiguration::default()));
                        break;
                    }
                }
            }
        })
    }

    /// Write the full configuration record.
    #[instrument(skip(self, config), fields(path = %self.path))]
    pub async fn update(&self, config: &SiteConfiguration) -> ReplicaResult<()> {
        let data = config.encode()?;
        self.store
            .set_document(&self.path, data)
            .await
            .map_err(|e| {
                warn!(error = %e, "Configuration write failed");
                ReplicaError::write_failed(&self.path, e)
            })?;
        info!("Configuration saved");
        Ok(())
    }
}

fn seed_default(store: Arc<dyn DocumentStore>, path: DocumentPath) {
    tokio::spawn(async move {
        let seeded = match SiteConfiguration::default().encode() {
            Ok(data) => store.set_document(&path, data).await,
            Err(e) => {
                warn!(error = %e, "Built-in configuration failed to encode");
                return;
            }
        };
        if let Err(e) = seeded {
            warn!(path = %path, error = %e, "Seeding configuration failed");
        }
    });
}
