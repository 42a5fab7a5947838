//! Bounded retry of remote calls.

use crate::Error;
use http::HeaderMap;
use std::{
    thread::sleep,
    time::{Duration, SystemTime, UNIX_EPOCH},
};

/// Decides whether a failed call may be attempted again.
pub type Classifier = fn(&Error) -> bool;

/// Retry configuration for remote calls.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Total attempts, including the first one.
    pub max_attempts: usize,
    /// Base delay used for exponential backoff (`base * 2^n`).
    pub base_delay: Duration,
    /// Maximum delay cap for exponential backoff.
    pub max_delay: Duration,
    /// Add jitter to backoff delays to avoid retry storms.
    pub jitter: bool,
    /// Prefer the server-provided `Retry-After` header when present.
    pub respect_retry_after: bool,
    pub classifier: Classifier,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 2,
            base_delay: Duration::from_millis(200),
            max_delay: Duration::from_secs(10),
            jitter: true,
            respect_retry_after: true,
            classifier: is_transient,
        }
    }
}

impl RetryPolicy {
    #[must_use]
    pub fn new(max_attempts: usize, base_delay: Duration) -> Self {
        Self {
            max_attempts,
            base_delay,
            ..Self::default()
        }
    }

    /// Swap the transient/terminal predicate.
    #[must_use]
    pub fn with_classifier(mut self, classifier: Classifier) -> Self {
        self.classifier = classifier;
        self
    }

    #[must_use]
    pub fn is_retryable(&self, err: &Error) -> bool {
        (self.classifier)(err)
    }

    /// Run `call` until it succeeds, fails terminally, or the attempt budget is spent.
    pub fn run<T, F>(&self, mut call: F) -> Result<T, Error>
    where
        F: FnMut(usize) -> Result<T, Error>,
    {
        let attempts = self.max_attempts.max(1);
        let mut attempt = 0usize;
        loop {
            attempt += 1;
            match call(attempt) {
                Ok(value) => return Ok(value),
                Err(err) if attempt < attempts && self.is_retryable(&err) => {
                    let delay = self.delay_for(attempt, &err);
                    #[cfg(feature = "tracing")]
                    tracing::debug!(
                        attempt,
                        max_attempts = attempts,
                        delay_ms = delay.as_millis() as u64,
                        error = %err,
                        "retrying transient failure"
                    );
                    if !delay.is_zero() {
                        sleep(delay);
                    }
                }
                Err(err) => return Err(err),
            }
        }
    }

    fn delay_for(&self, attempt: usize, err: &Error) -> Duration {
        if self.respect_retry_after
            && let Some(hint) = err.retry_after()
        {
            return hint.min(self.max_delay);
        }
        let cap = backoff_delay(self, attempt);
        if self.jitter { jitter_delay(cap) } else { cap }
    }
}

/// Default classification: only server-side (5xx) statuses are transient.
///
/// Transport failures carry no status and are terminal, timeouts included; a policy that should
/// retry them can swap in its own predicate with [`RetryPolicy::with_classifier`].
#[must_use]
pub fn is_transient(err: &Error) -> bool {
    match err {
        Error::Transport { .. } | Error::Decode { .. } => false,
        other => other.status().is_some_and(|s| s.is_server_error()),
    }
}

pub(crate) fn backoff_delay(policy: &RetryPolicy, attempt: usize) -> Duration {
    if attempt == 0 {
        return Duration::ZERO;
    }

    let exp = 2u32.saturating_pow((attempt - 1).min(31) as u32);
    let scaled = policy.base_delay.saturating_mul(exp);
    scaled.min(policy.max_delay)
}

pub(crate) fn parse_retry_after(headers: &HeaderMap, now: SystemTime) -> Option<Duration> {
    let value = headers.get(http::header::RETRY_AFTER)?;
    let text = value.to_str().ok()?.trim();
    if text.is_empty() {
        return None;
    }

    if let Ok(secs) = text.parse::<u64>() {
        return Some(Duration::from_secs(secs));
    }

    let at = httpdate::parse_http_date(text).ok()?;
    let delay = at.duration_since(now).unwrap_or(Duration::ZERO);
    Some(delay)
}

pub(crate) fn jitter_delay(cap: Duration) -> Duration {
    if cap.is_zero() {
        return cap;
    }

    let max_ms = cap.as_millis().min(u128::from(u64::MAX)) as u64;
    if max_ms == 0 {
        return cap;
    }

    // Full jitter: random delay in [0, cap].
    let mut x = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or(Duration::ZERO)
        .as_nanos() as u64;
    x ^= x << 13;
    x ^= x >> 7;
    x ^= x << 17;
    let ms = x % (max_ms + 1);
    Duration::from_millis(ms)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{HttpError, TransportErrorKind};
    use http::{HeaderValue, Method, StatusCode};
    use url::Url;

    fn status_error(status: u16) -> Error {
        Error::from(HttpError::new(
            StatusCode::from_u16(status).unwrap(),
            Method::GET,
            Url::parse("https://ci.example.com/job/a/1/artifact/b.properties").unwrap(),
        ))
    }

    fn quick() -> RetryPolicy {
        RetryPolicy {
            base_delay: Duration::ZERO,
            jitter: false,
            ..RetryPolicy::default()
        }
    }

    #[test]
    fn classifies_5xx_as_transient_and_4xx_as_terminal() {
        assert!(is_transient(&status_error(500)));
        assert!(is_transient(&status_error(502)));
        assert!(is_transient(&status_error(503)));
        assert!(!is_transient(&status_error(404)));
        assert!(!is_transient(&status_error(400)));
        assert!(!is_transient(&status_error(429)));
    }

    #[test]
    fn retries_once_then_succeeds() {
        let mut calls = 0;
        let result = quick().run(|_| {
            calls += 1;
            if calls == 1 {
                Err(status_error(502))
            } else {
                Ok("done")
            }
        });
        assert_eq!(result.unwrap(), "done");
        assert_eq!(calls, 2);
    }

    #[test]
    fn gives_up_after_two_attempts() {
        let mut calls = 0;
        let result: Result<(), Error> = quick().run(|_| {
            calls += 1;
            Err(status_error(503))
        });
        assert_eq!(result.unwrap_err().status(), Some(StatusCode::SERVICE_UNAVAILABLE));
        assert_eq!(calls, 2);
    }

    #[test]
    fn terminal_failure_is_not_retried() {
        let mut calls = 0;
        let result: Result<(), Error> = quick().run(|_| {
            calls += 1;
            Err(status_error(404))
        });
        assert!(result.unwrap_err().is_not_found());
        assert_eq!(calls, 1);
    }

    fn timeout_error() -> Error {
        Error::Transport {
            method: Method::GET,
            path: "/job/a/1/artifact/b.properties".into(),
            kind: TransportErrorKind::Timeout,
            source: Box::new(std::io::Error::from(std::io::ErrorKind::TimedOut)),
        }
    }

    #[test]
    fn transport_timeout_is_attempted_once() {
        assert!(!is_transient(&timeout_error()));

        let mut calls = 0;
        let result: Result<(), Error> = quick().run(|_| {
            calls += 1;
            Err(timeout_error())
        });
        assert!(matches!(
            result.unwrap_err(),
            Error::Transport {
                kind: TransportErrorKind::Timeout,
                ..
            }
        ));
        assert_eq!(calls, 1);
    }

    #[test]
    fn timeouts_can_opt_in_through_a_classifier() {
        fn timeouts_too(err: &Error) -> bool {
            is_transient(err)
                || matches!(
                    err,
                    Error::Transport {
                        kind: TransportErrorKind::Timeout,
                        ..
                    }
                )
        }
        let mut calls = 0;
        let _ = quick().with_classifier(timeouts_too).run(|_| -> Result<(), Error> {
            calls += 1;
            Err(timeout_error())
        });
        assert_eq!(calls, 2);
    }

    #[test]
    fn swapped_classifier_changes_the_threshold() {
        fn only_502(err: &Error) -> bool {
            err.status() == Some(StatusCode::BAD_GATEWAY)
        }
        let policy = quick().with_classifier(only_502);
        assert!(policy.is_retryable(&status_error(502)));
        assert!(!policy.is_retryable(&status_error(500)));
    }

    #[test]
    fn backoff_is_exponential_and_capped() {
        let policy = RetryPolicy {
            base_delay: Duration::from_millis(100),
            max_delay: Duration::from_millis(300),
            ..RetryPolicy::default()
        };
        assert_eq!(backoff_delay(&policy, 1), Duration::from_millis(100));
        assert_eq!(backoff_delay(&policy, 2), Duration::from_millis(200));
        assert_eq!(backoff_delay(&policy, 3), Duration::from_millis(300));
    }

    #[test]
    fn retry_after_seconds() {
        let mut headers = HeaderMap::new();
        headers.insert(http::header::RETRY_AFTER, HeaderValue::from_static("7"));
        let delay = parse_retry_after(&headers, UNIX_EPOCH).unwrap();
        assert_eq!(delay, Duration::from_secs(7));
    }

    #[test]
    fn retry_after_http_date() {
        let mut headers = HeaderMap::new();
        let now = UNIX_EPOCH + Duration::from_secs(100);
        let at = UNIX_EPOCH + Duration::from_secs(130);
        let value = httpdate::fmt_http_date(at);
        headers.insert(
            http::header::RETRY_AFTER,
            HeaderValue::from_str(&value).unwrap(),
        );
        let delay = parse_retry_after(&headers, now).unwrap();
        assert_eq!(delay, Duration::from_secs(30));
    }
}
