//! How producer failures and panics reach the consumer.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use parking_lot::Mutex;
use pullseq::{PullIterator, Sequence, SequenceError, SequenceExt, create, drive, from_iter};

fn two_then_boom() -> pullseq::PushSequence<u32> {
    create(|producer| async move {
        producer.yield_value(1).await?;
        producer.yield_value(2).await?;
        anyhow::bail!("boom");
    })
}

#[tokio::test]
async fn fault_surfaces_from_the_failing_advance() {
    let mut iterator = two_then_boom().create_iterator();

    assert!(iterator.move_next().await.expect("item 1"));
    assert_eq!(iterator.current(), Some(1));
    assert!(iterator.move_next().await.expect("item 2"));
    assert_eq!(iterator.current(), Some(2));

    let error = iterator.move_next().await.expect_err("third advance faults");
    assert!(matches!(error, SequenceError::Fault(_)));
    assert!(error.to_string().contains("boom"));

    // The fault was already delivered; disposal does not raise it again, and
    // the iterator is fused.
    assert!(!iterator.move_next().await.expect("fused after fault"));
    iterator.dispose().await.expect("dispose after fault");
}

#[tokio::test]
async fn fault_aborts_a_reducer() {
    let error = two_then_boom().to_vec().await.expect_err("faulting run");
    assert!(error.to_string().contains("boom"));
}

#[tokio::test]
async fn breaking_before_the_fault_point_sees_no_error() {
    let head = two_then_boom().take(2).to_vec().await.expect("clean prefix");
    assert_eq!(head, vec![1, 2]);
}

#[tokio::test]
async fn break_at_the_second_item_never_reaches_the_third_yield() {
    let reached_three = Arc::new(AtomicBool::new(false));
    let probe = Arc::clone(&reached_three);
    let sequence = create(move |producer| {
        let probe = Arc::clone(&probe);
        async move {
            producer.yield_value(1u32).await?;
            producer.yield_value(2).await?;
            probe.store(true, Ordering::SeqCst);
            producer.yield_value(3).await?;
            anyhow::bail!("never observed");
        }
    });

    let seen: Arc<Mutex<Vec<u32>>> = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&seen);
    drive(&sequence, move |ctx| {
        let sink = Arc::clone(&sink);
        async move {
            sink.lock().push(ctx.item);
            if ctx.item == 2 {
                ctx.break_loop();
            }
            Ok(())
        }
    })
    .await
    .expect("break preempts the fault");

    assert_eq!(&*seen.lock(), &[1, 2]);
    assert!(
        !reached_three.load(Ordering::SeqCst),
        "the producer unwound before its third yield"
    );
}

#[tokio::test]
async fn panic_in_the_routine_becomes_a_fault() {
    let sequence = create(|producer| async move {
        producer.yield_value(1u32).await?;
        panic!("routine exploded");
    });

    let mut iterator = sequence.create_iterator();
    assert!(iterator.move_next().await.expect("item 1"));
    let _ = iterator.current();

    let error = iterator.move_next().await.expect_err("panic surfaces");
    assert!(matches!(error, SequenceError::Fault(_)));
    assert!(error.to_string().contains("routine exploded"));
    iterator.dispose().await.expect("dispose after panic");
}

#[tokio::test]
async fn action_error_stops_iteration_and_still_disposes() {
    let sequence = create(|producer| async move {
        let mut n = 0u32;
        loop {
            producer.yield_value(n).await?;
            n += 1;
        }
    });

    let error = drive(&sequence, |ctx| async move {
        if ctx.item == 2 {
            anyhow::bail!("consumer gave up");
        }
        Ok(())
    })
    .await
    .expect_err("action error");
    assert!(error.to_string().contains("consumer gave up"));
}

#[tokio::test]
async fn action_and_disposal_errors_are_both_preserved() {
    // The routine swallows its abandonment error and yields again, so the
    // disposal triggered by the action error fails too.
    let sequence = create(|producer| async move {
        let _ = producer.yield_value(1u32).await;
        producer.yield_value(2).await?;
        Ok(())
    });

    let error = drive(&sequence, |_ctx| async move {
        anyhow::bail!("action failed");
    })
    .await
    .expect_err("both phases fail");

    let Some(SequenceError::Aggregate { primary, disposal }) =
        error.downcast_ref::<SequenceError>()
    else {
        panic!("expected an aggregate error, got: {error}");
    };
    assert!(primary.to_string().contains("action failed"));
    assert!(disposal.to_string().contains("yield was called after"));
}

#[tokio::test]
async fn user_error_is_recoverable_by_downcast() {
    #[derive(Debug, thiserror::Error)]
    #[error("quota exhausted at {0}")]
    struct Quota(u32);

    let sequence = create(|producer| async move {
        producer.yield_value(1u32).await?;
        Err(Quota(7).into())
    });

    let error = sequence.to_vec().await.expect_err("faulting run");
    let sequence_error = error
        .downcast_ref::<SequenceError>()
        .expect("bridge error type");
    let SequenceError::Fault(inner) = sequence_error else {
        panic!("expected a fault, got: {sequence_error}");
    };
    let quota = inner.downcast_ref::<Quota>().expect("original user error");
    assert_eq!(quota.0, 7);
}

#[tokio::test]
async fn upstream_fault_propagates_through_an_operator_chain() {
    let error = two_then_boom()
        .map(|n| n * 10)
        .filter(|_| true)
        .to_vec()
        .await
        .expect_err("fault crosses operator bridges");
    assert!(error.to_string().contains("boom"));
}

#[tokio::test]
async fn clean_sequences_do_not_fault() {
    let total = from_iter(0u32..10).count().await.expect("count");
    assert_eq!(total, 10);
}
