use thiserror::Error;

/// Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Result type for identity provider operations.
pub type AuthResult<T> = Result<T, AuthError>;

/// Remote document channel errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    #[error("permission denied: {0}")]
    PermissionDenied(String),

    #[error("store unavailable: {0}")]
    Unavailable(String),

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("backend error: {0}")]
    Backend(String),
}

impl StoreError {
    pub fn is_permission_denied(&self) -> bool {
        matches!(self, StoreError::PermissionDenied(_))
    }
}

/// Identity provider errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthError {
    /// Unknown account or wrong secret; the two are never distinguished.
    #[error("invalid credentials")]
    InvalidCredentials,

    #[error("account already exists: {0}")]
    AccountExists(String),

    #[error("secret must be at least {min_len} characters")]
    WeakSecret { min_len: usize },

    #[error("identity provider error: {0}")]
    Provider(String),
}
