//! Helpers that turn a missing required value into a logged precondition failure
//! instead of a panic.

use crate::core::errors::BridgeError;

/// Extension for values that must be present by the time they are used.
pub trait OptionExt<T> {
    /// Fail fast with [`BridgeError::Precondition`] when the value is absent.
    fn boom(self, context: &str) -> Result<T, BridgeError>;
}

impl<T> OptionExt<T> for Option<T> {
    fn boom(self, context: &str) -> Result<T, BridgeError> {
        self.ok_or_else(|| boom(context))
    }
}

/// Build a precondition failure and log it as a defect.
pub fn boom(context: &str) -> BridgeError {
    tracing::error!("precondition failed: {}", context);
    BridgeError::Precondition(context.to_string())
}
