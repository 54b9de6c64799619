//! Shared metrics recording for storage operations.

use std::time::Instant;

/// Records count and latency metrics for one storage operation.
///
/// Two metrics are emitted per call: `storage_operations_total` (counter)
/// and `storage_operation_duration_ms` (histogram), both labeled with the
/// backend, the operation, and its final status ("success" or "error").
pub fn record_operation_metrics(
    backend: &'static str,
    operation: &'static str,
    start: Instant,
    status: &'static str,
) {
    metrics::counter!(
        "storage_operations_total",
        "backend" => backend,
        "operation" => operation,
        "status" => status
    )
    .increment(1);
    metrics::histogram!(
        "storage_operation_duration_ms",
        "backend" => backend,
        "operation" => operation,
        "status" => status
    )
    .record(start.elapsed().as_secs_f64() * 1000.0);
}
