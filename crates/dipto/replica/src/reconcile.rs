//! Optimistic values awaiting remote confirmation

/// A remotely confirmed value plus an optional local proposal.
///
/// The proposal wins until the next confirmed value arrives, which always
/// replaces both.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Reconciled<T> {
    confirmed: T,
    pending: Option<T>,
}

impl<T> Reconciled<T> {
    pub fn new(confirmed: T) -> Self {
        Self {
            confirmed,
            pending: None,
        }
    }

    /// Apply a remote snapshot. Drops any pending proposal.
    pub fn confirm(&mut self, value: T) {
        self.confirmed = value;
        self.pending = None;
    }

    pub fn propose(&mut self, value: T) {
        self.pending = Some(value);
    }

    /// The value to render.
    pub fn effective(&self) -> &T {
        self.pending.as_ref().unwrap_or(&self.confirmed)
    }

    pub fn confirmed(&self) -> &T {
        &self.confirmed
    }

    pub fn pending(&self) -> Option<&T> {
        self.pending.as_ref()
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }
}

impl<T: Clone> Reconciled<T> {
    /// Propose a change derived from the current effective value.
    pub fn propose_with(&mut self, f: impl FnOnce(&mut T)) {
        let mut next = self.effective().clone();
        f(&mut next);
        self.pending = Some(next);
    }
}
