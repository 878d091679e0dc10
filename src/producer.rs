//! The capability handle passed to production routines.

use std::sync::Weak;

use tokio_util::sync::CancellationToken;

use crate::bridge::BridgeShared;
use crate::error::SequenceError;

/// Push-side handle for one run of a production routine.
///
/// A `Producer` can do exactly one thing with the sequence: deposit the next
/// item with [`yield_value`](Self::yield_value) and suspend until the consumer
/// asks for more. It also exposes the run's cancellation signal so routines
/// can participate cooperatively when the consumer abandons the enumeration.
///
/// # Cancellation contract
///
/// When the consumer disposes the iterator, the pending (or next) call to
/// `yield_value` returns [`SequenceError::Abandoned`]. Routines must let that
/// error propagate (a plain `?` is enough) so their cleanup runs on the way
/// out; swallowing it and yielding again is reported as
/// [`SequenceError::YieldAfterAbandonment`]. Cleanup code that wants to emit
/// a final item must gate it on [`is_cancelled`](Self::is_cancelled).
///
/// A routine that ignores its cancellation signal and never yields again will
/// hang the disposing consumer; the bridge never forcibly aborts user code.
///
/// The handle holds only a weak reference back to the bridge, so an
/// abandoned, still-looping routine cannot keep the consumer's dropped
/// sequence state alive.
pub struct Producer<T> {
    shared: Weak<BridgeShared<T>>,
    cancel: CancellationToken,
}

impl<T> Clone for Producer<T> {
    fn clone(&self) -> Self {
        Self {
            shared: Weak::clone(&self.shared),
            cancel: self.cancel.clone(),
        }
    }
}

impl<T: Send + 'static> Producer<T> {
    pub(crate) fn new(shared: Weak<BridgeShared<T>>, cancel: CancellationToken) -> Self {
        Self { shared, cancel }
    }

    /// Deposit the next item and suspend until the consumer requests another.
    ///
    /// Returns [`SequenceError::Abandoned`] if the consumer disposed the
    /// sequence while this call was parked (or dropped it entirely), and
    /// [`SequenceError::YieldAfterAbandonment`] if the routine yields again
    /// after that.
    pub async fn yield_value(&self, value: T) -> Result<(), SequenceError> {
        match self.shared.upgrade() {
            Some(shared) => shared.yield_item(value).await,
            None => Err(SequenceError::Abandoned),
        }
    }

    /// The cancellation token for this run.
    ///
    /// Cancelled exactly once, when the consumer begins disposal. Routines
    /// doing slow work between yields can race it with `tokio::select!`.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// True once the consumer has abandoned the enumeration.
    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }
}
