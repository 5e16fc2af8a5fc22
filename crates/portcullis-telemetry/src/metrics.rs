//! Request counters emitted through the `metrics` facade.
//!
//! No exporter is installed here; whichever recorder the embedding process
//! installs receives these. Without one every call is a no-op.
//!
//! | Metric | Type | Labels | Description |
//! |--------|------|--------|-------------|
//! | `portcullis_requests_total` | Counter | `method` | Requests entering the chain |
//! | `portcullis_csrf_rejections_total` | Counter | `reason` | Requests refused by the CSRF guard |
//! | `portcullis_panics_recovered_total` | Counter | - | Panics turned into 500s |

use metrics::{counter, describe_counter};

/// Requests entering the chain.
pub const REQUESTS_TOTAL: &str = "portcullis_requests_total";

/// Requests refused by the CSRF guard.
pub const CSRF_REJECTIONS_TOTAL: &str = "portcullis_csrf_rejections_total";

/// Panics caught by the recovery stage.
pub const PANICS_RECOVERED_TOTAL: &str = "portcullis_panics_recovered_total";

/// Registers descriptions with the installed recorder.
pub fn describe_metrics() {
    describe_counter!(REQUESTS_TOTAL, "Total number of requests entering the chain");
    describe_counter!(
        CSRF_REJECTIONS_TOTAL,
        "Requests rejected for a missing or mismatched CSRF token"
    );
    describe_counter!(
        PANICS_RECOVERED_TOTAL,
        "Panics raised downstream and converted to 500 responses"
    );
}

/// Counts a request by method.
pub fn record_request(method: &str) {
    counter!(REQUESTS_TOTAL, "method" => method.to_string()).increment(1);
}

/// Counts a CSRF rejection by reason.
pub fn record_csrf_rejection(reason: &'static str) {
    counter!(CSRF_REJECTIONS_TOTAL, "reason" => reason).increment(1);
}

/// Counts a recovered panic.
pub fn record_panic_recovered() {
    counter!(PANICS_RECOVERED_TOTAL).increment(1);
}
