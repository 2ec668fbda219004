//! Prometheus metrics for the registry
//!
//! Registered in the default registry so the hosting transport exposes them
//! alongside its own.

use prometheus::{register_int_counter, register_int_counter_vec, IntCounter, IntCounterVec};

lazy_static::lazy_static! {
    /// Successful registrations
    static ref REGISTRATIONS: IntCounter = register_int_counter!(
        "video_registry_registrations_total",
        "Videos registered under a new payload id"
    ).expect("Prometheus metrics registration should succeed at startup");

    /// Payload id collisions by stage (probe = allocator pre-check, insert = store constraint)
    static ref COLLISIONS: IntCounterVec = register_int_counter_vec!(
        "video_registry_allocation_collisions_total",
        "Payload id candidates rejected because they were already taken",
        &["stage"]
    ).expect("Prometheus metrics registration should succeed at startup");

    /// Resolutions by outcome (found/not_found/invalid)
    static ref RESOLUTIONS: IntCounterVec = register_int_counter_vec!(
        "video_registry_resolutions_total",
        "Deep link resolutions by outcome",
        &["outcome"]
    ).expect("Prometheus metrics registration should succeed at startup");

    static ref ACCESS_LOG_FAILURES: IntCounter = register_int_counter!(
        "video_registry_access_log_failures_total",
        "Access log writes that failed after a successful lookup"
    ).expect("Prometheus metrics registration should succeed at startup");
}

pub(crate) fn record_registration() {
    REGISTRATIONS.inc();
}

pub(crate) fn record_collision(stage: &str) {
    COLLISIONS.with_label_values(&[stage]).inc();
}

pub(crate) fn record_resolution(outcome: &str) {
    RESOLUTIONS.with_label_values(&[outcome]).inc();
}

pub(crate) fn record_access_log_failure() {
    ACCESS_LOG_FAILURES.inc();
}

/// Current access-log failure count
pub fn access_log_failures() -> u64 {
    ACCESS_LOG_FAILURES.get()
}

/// Current resolution count for an outcome label
pub fn resolutions(outcome: &str) -> u64 {
    RESOLUTIONS.with_label_values(&[outcome]).get()
}
