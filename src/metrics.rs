//! Daemon metrics collection for the external dashboard.
//!
//! The dashboard asks for metrics under short names; each maps to a
//! Prometheus series exposed by the running daemon. Collection is
//! best-effort: unknown names, an unreachable endpoint and missing series
//! all produce an empty string.

use tracing::debug;

const METRICS_URL: &str = "http://127.0.0.1/metrics";

/// Dashboard metric names and the Prometheus series they map to.
const METRIC_NAMES: [(&str, &str); 7] = [
    ("requests_in_flight", "jujushell_requests_in_flight"),
    ("requests_count", "jujushell_requests_count"),
    ("requests_duration", "jujushell_requests_duration_sum"),
    ("errors_count", "jujushell_errors_count"),
    ("containers_in_flight", "jujushell_containers_in_flight"),
    (
        "containers_duration_create_container",
        "jujushell_containers_duration_sum{operation=\"create-container\"}",
    ),
    (
        "containers_duration_get_all_containers",
        "jujushell_containers_duration_sum{operation=\"get-all-containers\"}",
    ),
];

/// Fetch the value of a single named metric from the daemon.
pub async fn collect(name: &str) -> String {
    let Some(series) = prometheus_name(name) else {
        debug!("unknown metric name {:?}", name);
        return String::new();
    };
    let payload = match fetch_metrics().await {
        Ok(payload) => payload,
        Err(err) => {
            debug!("cannot fetch metrics: {}", err);
            return String::new();
        }
    };
    extract(&payload, series).unwrap_or_default()
}

fn prometheus_name(name: &str) -> Option<&'static str> {
    METRIC_NAMES
        .iter()
        .find(|(short, _)| *short == name)
        .map(|(_, series)| *series)
}

async fn fetch_metrics() -> reqwest::Result<String> {
    reqwest::get(METRICS_URL)
        .await?
        .error_for_status()?
        .text()
        .await
}

/// The last space-separated token of the first line carrying the series.
///
/// Label sets count as part of the prefix, so a series selector like
/// `name{operation="create-container"}` skips the histogram buckets.
fn extract(payload: &str, series: &str) -> Option<String> {
    payload
        .lines()
        .find(|line| line.starts_with(series))
        .and_then(|line| line.split(' ').next_back())
        .map(str::to_string)
}
