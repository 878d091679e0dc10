//! Push-to-pull sequence bridging for async Rust.
//!
//! `pullseq` lets you write a data source as straight-line push-style code
//! (a routine that calls `yield` in a loop) and consume it as a pull-style
//! async iterator, one item at a time, with backpressure. The two sides run
//! as coroutines handing a baton back and forth over a rendezvous bridge:
//! the producer parks until the consumer asks for the next item, the
//! consumer parks until the producer delivers one, and at most one item is
//! ever in flight. Producer and consumer user code never run concurrently.
//!
//! On top of the bridge sit a driver loop ([`drive`]), a set of chainable
//! operators and reducers ([`SequenceExt`]), and adapters to and from other
//! sequence forms ([`from_iter`], [`from_receiver`], [`into_stream`]).
//!
//! # Quick start
//!
//! ```rust
//! use pullseq::{SequenceExt, create};
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> anyhow::Result<()> {
//! // Push side: plain sequential code with `?` on every yield.
//! let fibonacci = create(|producer| async move {
//!     let (mut a, mut b) = (0u64, 1);
//!     loop {
//!         producer.yield_value(a).await?;
//!         (a, b) = (b, a + b);
//!     }
//! });
//!
//! // Pull side: compose operators, then reduce. `take` abandons the
//! // (infinite) producer once it has what it needs.
//! let even_fibs = fibonacci
//!     .filter(|n| n % 2 == 0)
//!     .take(4)
//!     .to_vec()
//!     .await?;
//! assert_eq!(even_fibs, vec![0, 2, 8, 34]);
//! # Ok(())
//! # }
//! ```
//!
//! # Cancellation and cleanup
//!
//! When the consumer stops early, the bridge cancels the run's
//! [`CancellationToken`](tokio_util::sync::CancellationToken) and makes the
//! producer's pending `yield_value` return [`SequenceError::Abandoned`].
//! Propagating that error with `?` unwinds the routine through its normal
//! drop path, so `Drop` guards and deferred cleanup run exactly as they
//! would on success. Disposal then waits for the producer task to finish,
//! which is what makes abandonment deterministic rather than fire-and-forget.
//!
//! Sequences are lazy recipes: nothing runs until an iterator is created and
//! advanced, and every iterator is an independent run.

#![warn(missing_docs)]

mod bridge;
mod convert;
mod drive;
mod error;
mod ops;
mod producer;
mod rendezvous;
mod sequence;

pub use bridge::BridgeIterator;
pub use convert::{from_iter, from_receiver, into_stream};
pub use drive::{LoopContext, drive};
pub use error::{SequenceError, is_abandonment};
pub use ops::SequenceExt;
pub use producer::Producer;
pub use sequence::{
    EmptySequence, ErasedIterator, PullIterator, PushSequence, Sequence, create, empty,
};
