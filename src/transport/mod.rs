//! Blocking HTTP plumbing underneath [`crate::HttpCiClient`].
//!
//! * `UreqBlocking` keeps a cookie store so the session cookie issued together with a CSRF
//!   crumb is replayed on the mutating request that carries it.

pub mod blocking_transport;
#[cfg(feature = "metrics")]
pub(crate) mod metrics;
pub mod request;

use http::{HeaderMap, Method, StatusCode};
use std::time::Duration;
use url::Url;

/// Fully resolved request handed to a [`blocking_transport::BlockingTransport`].
#[derive(Clone, Debug)]
pub struct TransportRequest {
    pub method: Method,
    pub url: Url,
    pub headers: HeaderMap,
    pub query: Vec<(String, String)>,
    pub form: Vec<(String, String)>,
    pub timeout: Duration,
}

/// Raw response; status classification happens in the client.
#[derive(Clone, Debug)]
pub struct TransportResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Vec<u8>,
}
