//! Operator composition and the boundary adapters.

use futures_util::StreamExt;
use pullseq::{
    ErasedIterator, PullIterator, Sequence, SequenceExt, create, from_iter, from_receiver,
    into_stream,
};

#[tokio::test]
async fn a_long_chain_behaves_like_its_iterator_equivalent() {
    let expected: Vec<u64> = (0..1000u64)
        .map(|n| n * 3)
        .filter(|n| n % 2 == 0)
        .skip(5)
        .take(10)
        .collect();

    let actual = from_iter(0..1000u64)
        .map(|n| n * 3)
        .filter(|n| n % 2 == 0)
        .skip(5)
        .take(10)
        .to_vec()
        .await
        .expect("to_vec");
    assert_eq!(actual, expected);
}

#[tokio::test]
async fn chains_compose_across_operator_families() {
    let evens = from_iter(vec![4u32, 2, 4, 8]).distinct();
    let odds = from_iter(vec![1u32, 3]);
    let zipped = evens
        .concat(odds)
        .reverse()
        .zip(from_iter(0u32..100))
        .to_vec()
        .await
        .expect("to_vec");
    assert_eq!(zipped, vec![(3, 0), (1, 1), (8, 2), (2, 3), (4, 4)]);
}

#[tokio::test]
async fn into_stream_yields_items_then_ends() {
    let stream = into_stream(from_iter(vec![1u32, 2, 3]).map(|n| n + 10));
    let items: Vec<_> = stream.collect().await;
    let items: Result<Vec<u32>, _> = items.into_iter().collect();
    assert_eq!(items.expect("clean stream"), vec![11, 12, 13]);
}

#[tokio::test]
async fn into_stream_ends_with_the_fault() {
    let sequence = create(|producer| async move {
        producer.yield_value(1u32).await?;
        anyhow::bail!("boom");
    });

    let mut stream = Box::pin(into_stream(sequence));
    assert_eq!(stream.next().await.map(Result::unwrap), Some(1));
    let fault = stream.next().await.expect("fault item").expect_err("fault");
    assert!(fault.to_string().contains("boom"));
    assert!(stream.next().await.is_none(), "stream is fused after a fault");
}

#[tokio::test]
async fn from_receiver_bridges_a_channel() {
    let (tx, rx) = tokio::sync::mpsc::channel(2);
    tokio::spawn(async move {
        for n in 0..5u32 {
            if tx.send(n).await.is_err() {
                return;
            }
        }
    });

    let doubled = from_receiver(rx)
        .map(|n| n * 2)
        .to_vec()
        .await
        .expect("to_vec");
    assert_eq!(doubled, vec![0, 2, 4, 6, 8]);
}

#[tokio::test]
async fn from_receiver_supports_only_one_run() {
    let (tx, rx) = tokio::sync::mpsc::channel::<u32>(1);
    drop(tx);
    let sequence = from_receiver(rx);

    assert_eq!(sequence.clone().to_vec().await.expect("first run"), Vec::<u32>::new());
    let error = sequence.to_vec().await.expect_err("second run");
    assert!(error.to_string().contains("single iteration"));
}

#[tokio::test]
async fn erased_iterator_round_trips_through_any() {
    let sequence = from_iter(vec!["a".to_string(), "b".to_string()]);
    let mut erased = ErasedIterator::new(sequence.create_iterator());

    let mut seen = Vec::new();
    while erased.move_next().await.expect("advance") {
        let boxed = erased.current().expect("item");
        let item = boxed.downcast::<String>().expect("element type is String");
        seen.push(*item);
    }
    erased.dispose().await.expect("dispose");
    assert_eq!(seen, vec!["a", "b"]);
}

#[tokio::test]
async fn reducers_agree_with_their_std_counterparts() {
    let words = from_iter(vec![
        "pull".to_string(),
        "push".to_string(),
        "bridge".to_string(),
        "pull".to_string(),
    ]);

    assert_eq!(words.clone().count().await.expect("count"), 4);
    assert_eq!(
        words.clone().first().await.expect("first").as_deref(),
        Some("pull")
    );
    assert_eq!(
        words.clone().last().await.expect("last").as_deref(),
        Some("pull")
    );
    assert_eq!(
        words.clone().min().await.expect("min").as_deref(),
        Some("bridge")
    );
    assert_eq!(
        words.clone().max().await.expect("max").as_deref(),
        Some("push")
    );
    assert!(words.clone().contains("bridge".to_string()).await.expect("contains"));

    let lengths = words
        .clone()
        .distinct()
        .to_map(|word| word.len())
        .await
        .expect("to_map");
    assert_eq!(lengths[&4].as_str(), "push");
    assert_eq!(lengths[&6].as_str(), "bridge");

    let total_len = words
        .fold(0usize, |acc, word| acc + word.len())
        .await
        .expect("fold");
    assert_eq!(total_len, 18);
}

#[tokio::test]
async fn flat_map_abandons_cleanly_when_truncated() {
    let nested = from_iter(0u64..)
        .flat_map(|n| from_iter(vec![n, n]))
        .take(5)
        .to_vec()
        .await
        .expect("to_vec");
    assert_eq!(nested, vec![0, 0, 1, 1, 2]);
}
