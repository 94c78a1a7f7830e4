use lazy_static::lazy_static;
use prometheus::{register_int_counter_vec, IntCounterVec};

lazy_static! {
    /// Cache read outcomes (hit/miss/error) segmented by entry kind
    /// (user, comment_count, comments).
    pub static ref CACHE_EVENTS: IntCounterVec = register_int_counter_vec!(
        "cache_events_total",
        "Cache read outcomes segmented by entry kind",
        &["kind", "event"]
    )
    .expect("failed to register cache_events_total");

    /// Cache write-back results (success/error) segmented by entry kind.
    pub static ref CACHE_WRITE_TOTAL: IntCounterVec = register_int_counter_vec!(
        "cache_write_total",
        "Cache write-back attempts segmented by entry kind",
        &["kind", "result"]
    )
    .expect("failed to register cache_write_total");
}
