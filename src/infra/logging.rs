pub fn init() {
    // Initialize tracing subscriber once, honoring RUST_LOG if set.
    // Logs go to stderr: stdout carries MCP frames in stdio mode.
    let env_filter = std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string());
    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}

/// Count and time one Drive API call. `status` is 0 when no response arrived.
pub fn record_api_call(method: &str, status: u16, elapsed_ms: f64) {
    metrics::counter!(
        "drive_api_requests_total",
        "method" => method.to_owned(),
        "status" => status.to_string()
    )
    .increment(1);
    metrics::histogram!("drive_api_latency_ms", "method" => method.to_owned()).record(elapsed_ms);
    tracing::info!(method, status, elapsed_ms, "metric drive_api_call");
}

#[cfg(test)]
mod tests {
    #[test]
    fn init_is_idempotent() {
        super::init();
        super::init();
    }

    #[test]
    fn recording_without_exporter_is_a_noop() {
        super::record_api_call("GET", 200, 1.5);
        super::record_api_call("DELETE", 0, 0.0);
    }
}
