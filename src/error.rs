//! Unified error handling for pullseq.
//!
//! The crate draws a line between its own failure taxonomy and user-code
//! failures: bridge and driver errors are concrete [`SequenceError`] variants,
//! while production routines and per-item actions report through
//! `anyhow::Result`, with their errors carried inside [`SequenceError::Fault`]
//! and recoverable by downcast.

use std::sync::Arc;

use thiserror::Error;

/// Errors produced by the producer/consumer bridge and the driver loop.
#[derive(Debug, Error)]
pub enum SequenceError {
    /// The consumer disposed the sequence while the producer was parked in
    /// `yield_value`.
    ///
    /// This is the cooperative cancellation signal: production routines are
    /// expected to let it propagate (plain `?`) so their cleanup runs on the
    /// way out. The disposal protocol treats it as a clean outcome and never
    /// surfaces it to the consumer.
    #[error("enumeration was abandoned by the consumer")]
    Abandoned,

    /// `yield_value` was called again after the enumeration had already been
    /// abandoned.
    ///
    /// This is a bug in the production routine, classically caused by a
    /// catch-all around the yield that swallows [`SequenceError::Abandoned`]
    /// and keeps going. Gate any cleanup yield on
    /// [`Producer::is_cancelled`][crate::Producer::is_cancelled].
    #[error(
        "yield was called after the consumer abandoned the enumeration; \
         gate cleanup yields on Producer::is_cancelled and propagate the \
         abandonment error instead of swallowing it"
    )]
    YieldAfterAbandonment,

    /// The production routine failed with an error other than abandonment.
    ///
    /// Surfaced from the `move_next` call that would have produced the next
    /// item, or from `dispose` if the consumer never advanced that far. The
    /// original error is shared here and can be inspected with
    /// `anyhow::Error::downcast_ref` through the `Arc`.
    #[error("production routine failed: {0}")]
    Fault(Arc<anyhow::Error>),

    /// Both the enumeration and the subsequent iterator disposal failed.
    ///
    /// Neither error is dropped: `primary` is the enumeration-time failure,
    /// `disposal` is what `dispose` reported afterwards.
    #[error("enumeration failed: {primary}; disposing the iterator also failed: {disposal}")]
    Aggregate {
        /// The error captured while items were still being delivered.
        primary: anyhow::Error,
        /// The error raised while tearing the iterator down.
        disposal: Box<SequenceError>,
    },
}

impl SequenceError {
    /// Wrap a user error as a sequence fault.
    pub fn fault(error: anyhow::Error) -> Self {
        Self::Fault(Arc::new(error))
    }

    /// True if this error is (or is rooted in) the cooperative abandonment
    /// signal rather than a real failure.
    pub fn is_abandonment(&self) -> bool {
        match self {
            Self::Abandoned => true,
            Self::YieldAfterAbandonment => false,
            Self::Fault(inner) => is_abandonment(inner),
            Self::Aggregate { primary, .. } => is_abandonment(primary),
        }
    }
}

/// True if any cause in `error`'s chain is the abandonment signal.
///
/// Production routines that intercept errors can use this to re-raise the
/// cancellation unwind by convention instead of swallowing it.
pub fn is_abandonment(error: &anyhow::Error) -> bool {
    error.chain().any(|cause| {
        cause
            .downcast_ref::<SequenceError>()
            .is_some_and(SequenceError::is_abandonment)
    })
}
