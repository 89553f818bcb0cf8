//! Business metrics for the Campus server.
//!
//! # Exported Metrics
//!
//! ## Counters
//! - `campus_orders_total{outcome}` - Order validations by outcome
//! - `campus_order_compensations_total` - Orders rolled back after a partial write
//! - `campus_rate_limit_rejections_total{route}` - Requests refused by the rate limiter
//! - `campus_rate_limit_purged_total` - Expired `rate_limits` rows deleted
//! - `campus_video_uploads_total{outcome}` - Video uploads by outcome
//!
//! ## Histograms
//! - `campus_order_duration_seconds` - Time to validate and place an order
//! - `campus_video_upload_bytes` - Size of accepted uploads

use metrics::{describe_counter, describe_histogram};

/// Initialize and register all business metrics descriptions.
///
/// This should be called once at application startup, before any metrics are recorded.
pub fn register_business_metrics() {
    // Order metrics
    describe_counter!(
        "campus_orders_total",
        "Total number of order validations by outcome (placed, invalid, unavailable, out_of_stock, error)"
    );
    describe_counter!(
        "campus_order_compensations_total",
        "Orders whose reservations were released and row deleted after a failure"
    );
    describe_histogram!(
        "campus_order_duration_seconds",
        "Time taken to validate, price and persist an order"
    );

    // Rate limiting metrics
    describe_counter!(
        "campus_rate_limit_rejections_total",
        "Requests rejected because the caller exceeded the rate limit"
    );
    describe_counter!(
        "campus_rate_limit_purged_total",
        "Expired rate limit windows removed from PostgreSQL"
    );

    // Upload metrics
    describe_counter!(
        "campus_video_uploads_total",
        "Total number of video uploads by outcome (uploaded, invalid, forbidden, too_large, platform_error)"
    );
    describe_histogram!(
        "campus_video_upload_bytes",
        "Size in bytes of video files forwarded to the platform"
    );
}
