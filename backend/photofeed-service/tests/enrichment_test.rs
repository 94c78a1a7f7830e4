//! Cache-aside enrichment behavior of the comment aggregator and feed
//! assembler, exercised against in-memory fakes.

mod common;

use cache_store::{CacheStore, MemoryCacheStore};
use common::*;
use photofeed_service::metrics::cache::CACHE_EVENTS;
use photofeed_service::services::{CommentAggregator, FeedAssembler};
use std::sync::Arc;
use std::time::Duration;

const TTL: Duration = Duration::from_secs(300);

fn aggregator(
    cache: Arc<dyn CacheStore>,
    store: Arc<FakeCommentStore>,
) -> CommentAggregator {
    CommentAggregator::new(cache, store, TTL)
}

/// Post 42 has comments at T1<T2<T3<T4; empty cache, preview mode returns
/// the 3 most recent in ascending display order and the true total count.
#[tokio::test]
async fn scenario_a_miss_path_returns_latest_three_ascending() {
    let cache = Arc::new(CountingCache::new());
    let store = Arc::new(FakeCommentStore::new());
    store.insert(
        42,
        vec![
            comment(1, 42, 10),
            comment(2, 42, 20),
            comment(3, 42, 30),
            comment(4, 42, 40),
        ],
    );

    let agg = aggregator(cache.clone(), store.clone());
    let items = agg.enrich(vec![post_row(42, 1, 100)], false).await.unwrap();

    assert_eq!(items.len(), 1);
    let item = &items[0];
    assert_eq!(item.comment_count, 4);
    let ids: Vec<i64> = item.comments.iter().map(|c| c.id).collect();
    assert_eq!(ids, vec![2, 3, 4]);
    assert!(item
        .comments
        .windows(2)
        .all(|w| w[0].created_at <= w[1].created_at));
    assert_eq!(store.count_queries(), 1);
    assert_eq!(store.list_queries(), 1);
}

/// Repeating scenario A with a warm cache yields identical output and zero
/// additional store queries.
#[tokio::test]
async fn scenario_b_second_call_is_a_pure_cache_hit() {
    let cache = Arc::new(CountingCache::new());
    let store = Arc::new(FakeCommentStore::new());
    store.insert(
        42,
        vec![
            comment(1, 42, 10),
            comment(2, 42, 20),
            comment(3, 42, 30),
            comment(4, 42, 40),
        ],
    );

    let agg = aggregator(cache.clone(), store.clone());
    let first = agg.enrich(vec![post_row(42, 1, 100)], false).await.unwrap();
    let second = agg.enrich(vec![post_row(42, 1, 100)], false).await.unwrap();

    assert_eq!(first[0].comment_count, second[0].comment_count);
    assert_eq!(first[0].comments, second[0].comments);
    assert_eq!(store.count_queries(), 1);
    assert_eq!(store.list_queries(), 1);
    assert_eq!(cache.get_multi_calls(), 2);
}

/// A batch of 5 posts with mixed hits and misses issues exactly one
/// multi-key cache read, and output order matches input order.
#[tokio::test]
async fn scenario_d_one_batch_read_and_order_preserved() {
    let cache = Arc::new(CountingCache::new());
    let store = Arc::new(FakeCommentStore::new());
    for post_id in 1..=5 {
        store.insert(post_id, vec![comment(post_id * 10, post_id, post_id)]);
    }

    let agg = aggregator(cache.clone(), store.clone());

    // Warm only posts 2 and 4.
    agg.enrich(vec![post_row(2, 1, 2), post_row(4, 1, 4)], false)
        .await
        .unwrap();
    assert_eq!(cache.get_multi_calls(), 1);

    let input: Vec<i64> = vec![5, 2, 3, 4, 1];
    let rows = input.iter().map(|&id| post_row(id, 1, id)).collect();
    let items = agg.enrich(rows, false).await.unwrap();

    assert_eq!(cache.get_multi_calls(), 2);
    let output: Vec<i64> = items.iter().map(|i| i.id).collect();
    assert_eq!(output, input);
    for item in &items {
        assert!(item.comments.iter().all(|c| c.post_id == item.id));
    }
}

/// Posts with no comments report count 0 and an empty list from both the
/// miss path and the subsequent hit path.
#[tokio::test]
async fn zero_comments_from_both_paths() {
    let cache = Arc::new(MemoryCacheStore::new());
    let store = Arc::new(FakeCommentStore::new());

    let agg = aggregator(cache.clone(), store.clone());
    for _ in 0..2 {
        let items = agg.enrich(vec![post_row(7, 1, 1)], false).await.unwrap();
        assert_eq!(items[0].comment_count, 0);
        assert!(items[0].comments.is_empty());
    }
    // Second pass hit the cache.
    assert_eq!(store.count_queries(), 1);
    assert_eq!(store.list_queries(), 1);
}

/// Detail mode returns every comment, still ascending.
#[tokio::test]
async fn full_mode_returns_all_comments() {
    let cache = Arc::new(MemoryCacheStore::new());
    let store = Arc::new(FakeCommentStore::new());
    store.insert(
        42,
        vec![
            comment(1, 42, 10),
            comment(2, 42, 20),
            comment(3, 42, 30),
            comment(4, 42, 40),
        ],
    );

    let agg = aggregator(cache, store);
    let items = agg.enrich(vec![post_row(42, 1, 100)], true).await.unwrap();

    let ids: Vec<i64> = items[0].comments.iter().map(|c| c.id).collect();
    assert_eq!(ids, vec![1, 2, 3, 4]);
    assert_eq!(items[0].comment_count, 4);
}

/// The bytes written on a miss decode to the same ascending sequence a hit
/// returns.
#[tokio::test]
async fn cached_bytes_round_trip_in_display_order() {
    let cache = Arc::new(MemoryCacheStore::new());
    let store = Arc::new(FakeCommentStore::new());
    store.insert(
        42,
        vec![comment(1, 42, 10), comment(2, 42, 20), comment(3, 42, 30)],
    );

    let agg = aggregator(cache.clone(), store);
    let items = agg.enrich(vec![post_row(42, 1, 100)], false).await.unwrap();

    let raw = cache.get("post:42:comments").await.unwrap().unwrap();
    let cached: Vec<photofeed_service::models::CommentView> =
        serde_json::from_slice(&raw).unwrap();
    assert_eq!(cached, items[0].comments);

    let raw_count = cache.get("post:42:comment_count").await.unwrap().unwrap();
    assert_eq!(String::from_utf8(raw_count).unwrap(), "3");
}

/// A malformed cached count is a hard error for the whole batch, never a
/// silent zero.
#[tokio::test]
async fn malformed_cached_count_aborts_enrichment() {
    let cache = Arc::new(MemoryCacheStore::new());
    cache
        .set("post:42:comment_count", b"not a number", TTL)
        .await
        .unwrap();

    let agg = aggregator(cache, Arc::new(FakeCommentStore::new()));
    let err = agg
        .enrich(vec![post_row(42, 1, 100)], false)
        .await
        .unwrap_err();
    assert!(err.to_string().contains("comment count"));
}

/// A negative cached count violates the count invariant and aborts.
#[tokio::test]
async fn negative_cached_count_aborts_enrichment() {
    let cache = Arc::new(MemoryCacheStore::new());
    cache.set("post:42:comment_count", b"-3", TTL).await.unwrap();

    let agg = aggregator(cache, Arc::new(FakeCommentStore::new()));
    assert!(agg.enrich(vec![post_row(42, 1, 100)], false).await.is_err());
}

/// Malformed cached comment lists abort the batch as well.
#[tokio::test]
async fn malformed_cached_comments_abort_enrichment() {
    let cache = Arc::new(MemoryCacheStore::new());
    cache.set("post:42:comment_count", b"1", TTL).await.unwrap();
    cache
        .set("post:42:comments", b"{not json", TTL)
        .await
        .unwrap();

    let agg = aggregator(cache, Arc::new(FakeCommentStore::new()));
    assert!(agg.enrich(vec![post_row(42, 1, 100)], false).await.is_err());
}

/// Cache unavailability on the batch read fails the whole enrichment and is
/// counted under its own metric kind, not under the per-key series.
#[tokio::test]
async fn cache_outage_fails_enrichment() {
    let batch_errors_before = CACHE_EVENTS.with_label_values(&["batch", "error"]).get();

    let agg = aggregator(Arc::new(BrokenCache), Arc::new(FakeCommentStore::new()));
    assert!(agg.enrich(vec![post_row(42, 1, 100)], false).await.is_err());

    assert_eq!(
        CACHE_EVENTS.with_label_values(&["batch", "error"]).get(),
        batch_errors_before + 1
    );
}

/// A store failure on any miss aborts the batch; no partial feed.
#[tokio::test]
async fn store_failure_aborts_batch() {
    let cache: Arc<dyn CacheStore> = Arc::new(MemoryCacheStore::new());
    let agg = CommentAggregator::new(cache, Arc::new(BrokenCommentStore), TTL);
    assert!(agg.enrich(vec![post_row(1, 1, 1)], false).await.is_err());
}

/// Write-back failures are non-fatal: the enrichment still succeeds with
/// store-derived values.
#[tokio::test]
async fn write_back_failure_is_non_fatal() {
    let store = Arc::new(FakeCommentStore::new());
    store.insert(42, vec![comment(1, 42, 10)]);

    let agg = aggregator(Arc::new(ReadOnlyCache::default()), store);
    let items = agg.enrich(vec![post_row(42, 1, 100)], false).await.unwrap();
    assert_eq!(items[0].comment_count, 1);
    assert_eq!(items[0].comments.len(), 1);
}

/// An empty batch performs no cache round trip at all.
#[tokio::test]
async fn empty_batch_skips_the_cache() {
    let cache = Arc::new(CountingCache::new());
    let agg = aggregator(cache.clone(), Arc::new(FakeCommentStore::new()));

    let items = agg.enrich(Vec::new(), false).await.unwrap();
    assert!(items.is_empty());
    assert_eq!(cache.get_multi_calls(), 0);
}

/// The assembler stamps the caller's CSRF token on every item and changes
/// nothing else.
#[tokio::test]
async fn assembler_stamps_csrf_token() {
    let cache = Arc::new(MemoryCacheStore::new());
    let store = Arc::new(FakeCommentStore::new());
    store.insert(1, vec![comment(1, 1, 10)]);

    let assembler = FeedAssembler::new(Arc::new(aggregator(cache, store)));
    let rows = vec![post_row(1, 1, 1), post_row(2, 1, 2)];
    let items = assembler.assemble(rows, "token-abc", false).await.unwrap();

    assert_eq!(items.len(), 2);
    assert!(items.iter().all(|i| i.csrf_token == "token-abc"));
    assert_eq!(items[0].id, 1);
    assert_eq!(items[1].id, 2);
}
