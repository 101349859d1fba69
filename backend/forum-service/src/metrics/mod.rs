//! Prometheus metrics for forum-service.
//!
//! Collectors are registered in the default registry on first use and
//! rendered by the `/metrics` handler.

use actix_web::HttpResponse;
use lazy_static::lazy_static;
use prometheus::{register_int_counter_vec, Encoder, IntCounterVec, TextEncoder};

lazy_static! {
    /// Applied votes by target kind (post/comment) and transition (create/remove/switch).
    pub static ref VOTES_TOTAL: IntCounterVec = register_int_counter_vec!(
        "forum_votes_total",
        "Applied votes segmented by target kind and transition",
        &["target", "transition"]
    )
    .expect("failed to register forum_votes_total");

    /// Post cache events (hit/miss/write/invalidate/error).
    pub static ref POST_CACHE_EVENTS: IntCounterVec = register_int_counter_vec!(
        "forum_post_cache_events_total",
        "Post cache events segmented by outcome",
        &["event"]
    )
    .expect("failed to register forum_post_cache_events_total");

    /// Feed requests by scope (community/subscribed/all) and sort order.
    pub static ref FEED_REQUEST_TOTAL: IntCounterVec = register_int_counter_vec!(
        "forum_feed_requests_total",
        "Feed requests segmented by scope and sort order",
        &["scope", "sort"]
    )
    .expect("failed to register forum_feed_requests_total");
}

/// Actix handler that renders Prometheus metrics in text format.
pub async fn serve_metrics() -> HttpResponse {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();

    let mut buffer = Vec::new();
    if let Err(err) = encoder.encode(&metric_families, &mut buffer) {
        return HttpResponse::InternalServerError().body(err.to_string());
    }

    HttpResponse::Ok()
        .content_type(encoder.format_type())
        .body(buffer)
}
