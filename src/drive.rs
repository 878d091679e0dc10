//! The driver loop: generic pull-side iteration engine.
//!
//! [`drive`] is the one place in the crate that walks an iterator, and it
//! owns the load-bearing guarantee that makes early abandonment leak-free:
//! the iterator is disposed on *every* exit path (clean completion, an
//! action error, an explicit break, or a bridge fault), and no error from
//! either phase is ever dropped.

use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::error::SequenceError;
use crate::sequence::Sequence;

/// Per-item view handed to the driver loop's action.
pub struct LoopContext<T> {
    /// The delivered item.
    pub item: T,
    /// Dense 0-based position of the item; no gaps, no reordering.
    pub index: u64,
    brake: BreakSignal,
}

impl<T> LoopContext<T> {
    /// Request that iteration stops after the current item, with no error.
    pub fn break_loop(&self) {
        self.brake.set();
    }
}

#[derive(Clone, Default)]
struct BreakSignal(Arc<AtomicBool>);

impl BreakSignal {
    fn set(&self) {
        self.0.store(true, Ordering::Release);
    }

    fn is_set(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}

/// Drive a sequence to completion, invoking `action` for each item.
///
/// The action may fail (iteration stops and the error is surfaced after
/// disposal) or call [`LoopContext::break_loop`] to stop early without an
/// error. If disposal itself fails after an action error, both are kept and
/// raised together as [`SequenceError::Aggregate`].
pub async fn drive<T, S, F, Fut>(sequence: &S, mut action: F) -> anyhow::Result<()>
where
    T: Send + 'static,
    S: Sequence<T> + ?Sized,
    F: FnMut(LoopContext<T>) -> Fut,
    Fut: Future<Output = anyhow::Result<()>>,
{
    let mut iterator = sequence.create_iterator();
    let brake = BreakSignal::default();
    let mut index: u64 = 0;
    let mut captured: Option<anyhow::Error> = None;

    loop {
        match iterator.move_next().await {
            Ok(true) => {
                let Some(item) = iterator.current() else {
                    break;
                };
                let context = LoopContext {
                    item,
                    index,
                    brake: brake.clone(),
                };
                if let Err(error) = action(context).await {
                    captured = Some(error);
                    break;
                }
                if brake.is_set() {
                    break;
                }
                index += 1;
            }
            Ok(false) => break,
            Err(error) => {
                captured = Some(error.into());
                break;
            }
        }
    }

    let outcome = match captured {
        Some(error) => Err(error),
        None => Ok(()),
    };
    merge_with_disposal(outcome, iterator.dispose().await)
}

/// Combine an enumeration outcome with a disposal outcome, preserving both
/// errors when both failed.
pub(crate) fn merge_with_disposal(
    outcome: anyhow::Result<()>,
    disposal: Result<(), SequenceError>,
) -> anyhow::Result<()> {
    match (outcome, disposal) {
        (Ok(()), Ok(())) => Ok(()),
        (Err(error), Ok(())) => Err(error),
        (Ok(()), Err(disposal)) => Err(disposal.into()),
        (Err(error), Err(disposal)) => Err(SequenceError::Aggregate {
            primary: error,
            disposal: Box::new(disposal),
        }
        .into()),
    }
}
