use crate::error::{AuthError, AuthResult};
use crate::traits::{IdentityProvider, ProviderUser};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::RwLock;
use tokio::sync::watch;
use tracing::info;
use uuid::Uuid;

/// Shortest secret accepted on registration.
pub const MIN_SECRET_LEN: usize = 6;

struct Account {
    subject_id: String,
    secret: String,
}

/// In-memory identity provider with email/secret accounts.
pub struct InMemoryIdentityProvider {
    accounts: RwLock<HashMap<String, Account>>,
    current: watch::Sender<Option<ProviderUser>>,
}

impl Default for InMemoryIdentityProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryIdentityProvider {
    pub fn new() -> Self {
        let (current, _) = watch::channel(None);
        Self {
            accounts: RwLock::new(HashMap::new()),
            current,
        }
    }

    /// Builder-style account registration that does not sign in.
    pub fn with_account(mut self, label: &str, secret: &str) -> Self {
        if let Ok(accounts) = self.accounts.get_mut() {
            accounts.insert(label.to_string(), new_account(secret));
        }
        self
    }

    /// Register an account without signing it in.
    pub fn add_account(&self, label: &str, secret: &str) -> AuthResult<()> {
        let mut accounts = self.accounts_mut()?;
        if accounts.contains_key(label) {
            return Err(AuthError::AccountExists(label.to_string()));
        }
        accounts.insert(label.to_string(), new_account(secret));
        Ok(())
    }

    pub fn current(&self) -> Option<ProviderUser> {
        self.current.borrow().clone()
    }

    /// Re-announce the current account, as a token refresh does.
    pub fn refresh(&self) {
        self.current.send_modify(|_| {});
    }

    fn accounts_mut(&self) -> AuthResult<std::sync::RwLockWriteGuard<'_, HashMap<String, Account>>> {
        self.accounts
            .write()
            .map_err(|_| AuthError::Provider("account table lock poisoned".to_string()))
    }

    fn announce(&self, user: Option<ProviderUser>) {
        self.current.send_replace(user);
    }
}

fn new_account(secret: &str) -> Account {
    Account {
        subject_id: Uuid::new_v4().to_string(),
        secret: secret.to_string(),
    }
}

#[async_trait]
impl IdentityProvider for InMemoryIdentityProvider {
    fn watch(&self) -> watch::Receiver<Option<ProviderUser>> {
        self.current.subscribe()
    }

    async fn sign_in(&self, label: &str, secret: &str) -> AuthResult<ProviderUser> {
        let user = {
            let accounts = self
                .accounts
                .read()
                .map_err(|_| AuthError::Provider("account table lock poisoned".to_string()))?;
            match accounts.get(label) {
                Some(account) if account.secret == secret => ProviderUser {
                    subject_id: account.subject_id.clone(),
                    label: label.to_string(),
                },
                _ => return Err(AuthError::InvalidCredentials),
            }
        };

        info!(label, "Account signed in");
        self.announce(Some(user.clone()));
        Ok(user)
    }

    async fn register(&self, label: &str, secret: &str) -> AuthResult<ProviderUser> {
        let user = {
            let mut accounts = self.accounts_mut()?;
            if accounts.contains_key(label) {
                return Err(AuthError::AccountExists(label.to_string()));
            }
            if secret.chars().count() < MIN_SECRET_LEN {
                return Err(AuthError::WeakSecret {
                    min_len: MIN_SECRET_LEN,
                });
            }
            let account = new_account(secret);
            let user = ProviderUser {
                subject_id: account.subject_id.clone(),
                label: label.to_string(),
            };
            accounts.insert(label.to_string(), account);
            user
        };

        info!(label, "Account registered");
        self.announce(Some(user.clone()));
        Ok(user)
    }

    async fn sign_out(&self) -> AuthResult<()> {
        self.announce(None);
        Ok(())
    }
}
