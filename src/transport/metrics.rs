use crate::ErrorKind;
use http::{Method, StatusCode};
use std::time::Duration;

pub(crate) struct InFlightGuard {
    gauge: metrics::Gauge,
}

impl InFlightGuard {
    pub(crate) fn new() -> Self {
        let gauge = metrics::gauge!("jenkins_adapter_inflight");
        gauge.increment(1.0);
        Self { gauge }
    }
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        self.gauge.decrement(1.0);
    }
}

fn status_class(status: StatusCode) -> &'static str {
    if status.is_success() {
        "2xx"
    } else if status.is_client_error() {
        "4xx"
    } else if status.is_server_error() {
        "5xx"
    } else {
        "other"
    }
}

fn error_kind_label(kind: ErrorKind) -> &'static str {
    match kind {
        ErrorKind::Auth => "auth",
        ErrorKind::NotFound => "not_found",
        ErrorKind::Conflict => "conflict",
        ErrorKind::RateLimited => "rate_limited",
        ErrorKind::Api => "api",
        ErrorKind::Transport => "transport",
        ErrorKind::Decode => "decode",
        ErrorKind::PropertyFile => "property_file",
        ErrorKind::InvalidJobParameter => "invalid_job_parameter",
        ErrorKind::InvalidConfig => "invalid_config",
    }
}

fn method_label(method: &Method) -> metrics::SharedString {
    match *method {
        Method::GET => "GET".into(),
        Method::POST => "POST".into(),
        ref other => other.to_string().into(),
    }
}

pub(crate) fn record_outcome(
    method: &Method,
    status: Option<StatusCode>,
    latency: Duration,
    error_kind: Option<ErrorKind>,
) {
    let method = method_label(method);
    let status_class = status.map(status_class).unwrap_or("transport");

    metrics::counter!(
        "jenkins_adapter_requests_total",
        "method" => method.clone(),
        "status_class" => status_class
    )
    .increment(1);
    metrics::histogram!(
        "jenkins_adapter_request_duration_seconds",
        "method" => method.clone(),
        "status_class" => status_class
    )
    .record(latency);

    if status == Some(StatusCode::TOO_MANY_REQUESTS) {
        metrics::counter!("jenkins_adapter_rate_limited_total", "method" => method.clone())
            .increment(1);
    }

    if let Some(kind) = error_kind {
        metrics::counter!(
            "jenkins_adapter_errors_total",
            "method" => method,
            "kind" => error_kind_label(kind)
        )
        .increment(1);
    }
}

/// A property-file fetch outcome, labelled by how it ended.
pub(crate) fn record_property_fetch(outcome: &'static str, attempts: usize) {
    metrics::counter!("jenkins_adapter_property_fetch_total", "outcome" => outcome).increment(1);
    if attempts > 1 {
        metrics::counter!("jenkins_adapter_retries_total").increment((attempts - 1) as u64);
    }
}

/// A crumb fetched ahead of a mutating call.
pub(crate) fn record_crumb_fetch() {
    metrics::counter!("jenkins_adapter_crumb_fetch_total").increment(1);
}
