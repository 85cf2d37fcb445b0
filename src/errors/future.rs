use thiserror::Error;

/// Errors surfaced by [`crate::sync::OneShotFuture`] and its readers.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FutureError {
    /// The producer canceled the future instead of resolving it.
    ///
    /// Always caused by a failure upstream of the reader, never by the
    /// future itself.
    #[error("future canceled")]
    Canceled,

    /// A second `resolve` or `cancel` was attempted on a future that had
    /// already left the pending state. The first outcome is kept.
    #[error("cannot {attempted} future '{name}': already {state}")]
    AlreadyCompleted {
        name: String,
        attempted: &'static str,
        state: &'static str,
    },
}

impl FutureError {
    pub fn is_canceled(&self) -> bool {
        matches!(self, FutureError::Canceled)
    }
}
