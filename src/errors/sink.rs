use thiserror::Error;

/// Failures reported by a [`crate::traits::DataSink`].
///
/// The core never inspects partial success: a rejected batch is rejected as
/// a whole.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SinkError {
    #[error("insert into '{kind}' rejected: {reason}")]
    InsertRejected { kind: String, reason: String },

    #[error("select ids from '{kind}' failed: {reason}")]
    SelectFailed { kind: String, reason: String },

    #[error("data sink unavailable: {reason}")]
    Unavailable { reason: String },
}

/// Errors raised by a seeding node's unit of work.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SeedError {
    /// Passed through unchanged from the sink.
    #[error(transparent)]
    Sink(#[from] SinkError),

    #[error("cannot reference '{dependency}' from '{kind}': no ids were published")]
    NoReferences { kind: String, dependency: String },

    #[error("'{kind}' needs {wanted} unique values for '{field}' but only {available} exist")]
    UniqueValuesExhausted {
        kind: String,
        field: String,
        wanted: usize,
        available: usize,
    },
}
