//! Shared transfer form state.

use parking_lot::RwLock;
use std::sync::Arc;

use crate::core::domain::{Asset, Direction};

/// The single mutable state a mounted form owns.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TransferFormState {
    /// Typed amount, human units.
    pub bridge_from_amount: String,
    pub recipient: String,
    pub direction: Direction,
    pub selected_asset: Option<Asset>,
}

/// State owner handed to every consumer of the form.
///
/// Clones share the same state. Readers take snapshots; only the orchestrator
/// writes.
#[derive(Debug, Clone, Default)]
pub struct FormContainer {
    inner: Arc<RwLock<TransferFormState>>,
}

impl FormContainer {
    pub fn new(direction: Direction) -> Self {
        Self {
            inner: Arc::new(RwLock::new(TransferFormState { direction, ..Default::default() })),
        }
    }

    pub fn snapshot(&self) -> TransferFormState {
        self.inner.read().clone()
    }

    pub fn bridge_from_amount(&self) -> String {
        self.inner.read().bridge_from_amount.clone()
    }

    pub fn recipient(&self) -> String {
        self.inner.read().recipient.clone()
    }

    pub fn direction(&self) -> Direction {
        self.inner.read().direction
    }

    pub fn selected_asset(&self) -> Option<Asset> {
        self.inner.read().selected_asset.clone()
    }

    pub(crate) fn update<R>(&self, f: impl FnOnce(&mut TransferFormState) -> R) -> R {
        f(&mut self.inner.write())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clones_share_state() {
        let form = FormContainer::new(Direction::Out);
        let reader = form.clone();
        form.update(|s| s.recipient = "0xabc".to_string());
        assert_eq!(reader.recipient(), "0xabc");
        assert_eq!(reader.direction(), Direction::Out);
    }

    #[test]
    fn snapshot_is_detached() {
        let form = FormContainer::new(Direction::In);
        let snap = form.snapshot();
        form.update(|s| s.bridge_from_amount = "1".to_string());
        assert_eq!(snap.bridge_from_amount, "");
        assert_eq!(form.bridge_from_amount(), "1");
    }
}
