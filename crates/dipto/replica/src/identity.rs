//! Identity watcher over the external identity provider

use crate::error::ReplicaResult;
use crate::subscription::{spawn_feed, Feed};
use dipto_store::{IdentityProvider, ProviderUser};
use dipto_types::{Identity, SubjectId};
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

fn to_identity(user: &ProviderUser) -> Identity {
    Identity::new(SubjectId::new(user.subject_id.clone()), user.label.clone())
}

fn same_subject(a: Option<&Identity>, b: Option<&Identity>) -> bool {
    a.map(Identity::subject_id) == b.map(Identity::subject_id)
}

/// Exposes the signed-in identity, or none.
#[derive(Clone)]
pub struct IdentityWatcher {
    provider: Arc<dyn IdentityProvider>,
}

impl IdentityWatcher {
    pub fn new(provider: Arc<dyn IdentityProvider>) -> Self {
        Self { provider }
    }

    pub fn current(&self) -> Option<Identity> {
        let changes = self.provider.watch();
        let user = changes.borrow().clone();
        user.as_ref().map(to_identity)
    }

    /// Deliver the current identity now, then once per change of subject.
    pub fn subscribe(&self) -> Feed<Option<Identity>> {
        let mut changes = self.provider.watch();

        spawn_feed(move |publisher| async move {
            let initial = changes.borrow_and_update().clone();
            let mut last = initial.as_ref().map(to_identity);
            if !publisher.publish(last.clone()) {
                return;
            }

            loop {
                tokio::select! {
                    _ = publisher.cancelled() => break,
                    changed = changes.changed() => {
                        let next = match changed {
                            Ok(()) => {
                                let user = changes.borrow_and_update().clone();
                                user.as_ref().map(to_identity)
                            }
                            Err(_) => {
                                warn!("Identity provider went away, treating as signed out");
                                if last.is_some() {
                                    publisher.publish(None);
                                }
                                break;
                            }
                        };

                        if same_subject(last.as_ref(), next.as_ref()) {
                            debug!("Identity notification for the same subject ignored");
                            continue;
                        }

                        debug!(
                            subject = ?next.as_ref().map(|identity| identity.subject_id().to_string()),
                            "Identity changed"
                        );
                        last = next;
                        if !publisher.publish(last.clone()) {
                            break;
                        }
                    }
                }
            }
        })
    }

    #[instrument(skip(self, secret))]
    pub async fn sign_in(&self, label: &str, secret: &str) -> ReplicaResult<Identity> {
        let user = self.provider.sign_in(label, secret).await?;
        Ok(to_identity(&user))
    }

    /// Create an account; the new account is signed in.
    #[instrument(skip(self, secret))]
    pub async fn register(&self, label: &str, secret: &str) -> ReplicaResult<Identity> {
        let user = self.provider.register(label, secret).await?;
        Ok(to_identity(&user))
    }

    /// Best effort. The watcher's own notification is what clears local state.
    #[instrument(skip(self))]
    pub async fn sign_out(&self) {
        match self.provider.sign_out().await {
            Ok(()) => info!("Signed out"),
            Err(e) => warn!(error = %e, "Sign-out failed"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dipto_store::memory::InMemoryIdentityProvider;
    use dipto_store::AuthError;
    use crate::ReplicaError;
    use std::time::Duration;
    use tokio::time::timeout;

    async fn next<T>(feed: &mut Feed<T>) -> Option<T> {
        timeout(Duration::from_secs(1), feed.next())
            .await
            .expect("feed stalled")
    }

    #[tokio::test]
    async fn test_initial_delivery_is_none() {
        let watcher = IdentityWatcher::new(Arc::new(InMemoryIdentityProvider::new()));
        let mut feed = watcher.subscribe();
        assert_eq!(next(&mut feed).await, Some(None));
    }

    #[tokio::test]
    async fn test_sign_in_and_out_are_delivered() {
        let provider = Arc::new(InMemoryIdentityProvider::new().with_account("a@x.io", "secret1"));
        let watcher = IdentityWatcher::new(provider);
        let mut feed = watcher.subscribe();
        assert_eq!(next(&mut feed).await, Some(None));

        let identity = watcher.sign_in("a@x.io", "secret1").await.unwrap();
        assert_eq!(next(&mut feed).await, Some(Some(identity)));

        watcher.sign_out().await;
        assert_eq!(next(&mut feed).await, Some(None));
        assert!(watcher.current().is_none());
    }

    #[tokio::test]
    async fn test_refresh_for_same_subject_is_not_redelivered() {
        let provider = Arc::new(InMemoryIdentityProvider::new().with_account("a@x.io", "secret1"));
        let watcher = IdentityWatcher::new(provider.clone());
        watcher.sign_in("a@x.io", "secret1").await.unwrap();

        let mut feed = watcher.subscribe();
        let first = next(&mut feed).await.unwrap();
        assert_eq!(first.as_ref().map(Identity::display_label), Some("a@x.io"));

        provider.refresh();
        provider.refresh();
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(feed.try_next().is_none());
    }

    #[tokio::test]
    async fn test_sign_in_errors_pass_through() {
        let watcher = IdentityWatcher::new(Arc::new(InMemoryIdentityProvider::new()));
        let err = watcher.sign_in("nobody@x.io", "whatever").await.unwrap_err();
        assert!(matches!(err, ReplicaError::Auth(AuthError::InvalidCredentials)));
    }

    #[tokio::test]
    async fn test_register_signs_in() {
        let watcher = IdentityWatcher::new(Arc::new(InMemoryIdentityProvider::new()));
        let identity = watcher.register("new@x.io", "longenough").await.unwrap();
        assert_eq!(watcher.current(), Some(identity));
    }
}
