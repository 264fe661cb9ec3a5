use prometheus_exporter::prometheus::{
    IntCounterVec, IntGaugeVec, default_registry, register_int_counter_vec_with_registry,
    register_int_gauge_vec_with_registry,
};

pub const HIT: &str = "hit";
pub const MISS: &str = "miss";
pub const WAIT: &str = "wait";

pub const SUCCESS: &str = "success";
pub const FAILURE: &str = "failure";

// Provisioning each metrics
lazy_static::lazy_static! {
    pub static ref ATTESTATION_DATA_CACHE_REQUESTS: IntCounterVec = create_int_counter_vec(
        "attestation_data_cache_requests",
        "Attestation data requests by cache outcome",
        &["outcome"]
    );

    pub static ref OPERATION_POOL_ITEMS: IntGaugeVec = create_int_gauge_vec(
        "operation_pool_items",
        "The number of items held in each operation pool",
        &["pool"]
    );

    pub static ref AGGREGATION_SUBMISSIONS: IntCounterVec = create_int_counter_vec(
        "aggregation_submissions",
        "Submissions handled by the aggregation coordinator",
        &["kind", "outcome"]
    );
}

/// Create a new gauge metric
pub fn create_int_gauge_vec(name: &str, help: &str, label_names: &[&str]) -> IntGaugeVec {
    let registry = default_registry();
    register_int_gauge_vec_with_registry!(name, help, label_names, registry)
        .expect("failed to create int gauge vec")
}

/// Create a new counter metric
pub fn create_int_counter_vec(name: &str, help: &str, label_names: &[&str]) -> IntCounterVec {
    let registry = default_registry();
    register_int_counter_vec_with_registry!(name, help, label_names, registry)
        .expect("failed to create int counter vec")
}

/// Set the value of a gauge metric
pub fn set_int_gauge_vec(gauge_vec: &IntGaugeVec, value: i64, label_values: &[&str]) {
    gauge_vec.with_label_values(label_values).set(value);
}

/// Increment a counter metric
pub fn inc_int_counter_vec(counter_vec: &IntCounterVec, label_values: &[&str]) {
    counter_vec.with_label_values(label_values).inc();
}
