use crate::property_file::PropertyFormat;
use http::{Method, StatusCode};
use std::{error::Error as StdError, fmt, time::Duration};
use thiserror::Error;
use url::Url;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Clone, Copy)]
pub struct BodySnippetConfig {
    pub enabled: bool,
    pub max_bytes: usize,
}

impl Default for BodySnippetConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            max_bytes: 4096,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum ErrorKind {
    Auth,
    NotFound,
    Conflict,
    RateLimited,
    Api,
    Transport,
    Decode,
    PropertyFile,
    InvalidJobParameter,
    InvalidConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum TransportErrorKind {
    Timeout,
    Connect,
    Other,
}

#[derive(Debug, Clone)]
pub struct HttpError {
    pub status: StatusCode,
    pub method: Method,
    /// Sanitized URL: no query/fragment/userinfo.
    pub url: Box<Url>,
    pub message: Option<Box<str>>,
    pub request_id: Option<Box<str>>,
    pub body_snippet: Option<Box<str>>,
    /// Server-provided `Retry-After` hint, when present.
    pub retry_after: Option<Duration>,
}

impl HttpError {
    /// Minimal error for a status code, without response diagnostics.
    #[must_use]
    pub fn new(status: StatusCode, method: Method, url: Url) -> Self {
        Self {
            status,
            method,
            url: Box::new(url),
            message: None,
            request_id: None,
            body_snippet: None,
            retry_after: None,
        }
    }

    #[must_use]
    pub fn path(&self) -> &str {
        self.url.path()
    }
}

/// All errors returned by the adapter.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    #[error("{0}")]
    Auth(HttpError),

    #[error("{0}")]
    NotFound(HttpError),

    #[error("{0}")]
    Conflict(HttpError),

    #[error("{0}")]
    RateLimited(HttpError),

    #[error("{0}")]
    Api(HttpError),

    #[error("Transport error during {method} {path}: {source}")]
    Transport {
        method: Method,
        path: Box<str>,
        kind: TransportErrorKind,
        #[source]
        source: Box<dyn StdError + Send + Sync>,
    },

    #[error("Decode error (HTTP {status}) during {method} {path}: {source}")]
    Decode {
        status: StatusCode,
        method: Method,
        path: Box<str>,
        request_id: Option<Box<str>>,
        body_snippet: Option<Box<str>>,
        #[source]
        source: Box<dyn StdError + Send + Sync>,
    },

    #[error("Malformed {format} property file `{file_name}`: {source}")]
    PropertyFile {
        file_name: Box<str>,
        format: PropertyFormat,
        #[source]
        source: Box<dyn StdError + Send + Sync>,
    },

    #[error("Invalid job parameter `{name}`: `{value}` is not one of {choices:?}")]
    InvalidJobParameter {
        name: Box<str>,
        value: Box<str>,
        choices: Vec<String>,
    },

    #[error("Invalid configuration: {message}")]
    InvalidConfig {
        message: Box<str>,
        #[source]
        source: Option<Box<dyn StdError + Send + Sync>>,
    },
}

impl Error {
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Auth(_) => ErrorKind::Auth,
            Self::NotFound(_) => ErrorKind::NotFound,
            Self::Conflict(_) => ErrorKind::Conflict,
            Self::RateLimited(_) => ErrorKind::RateLimited,
            Self::Api(_) => ErrorKind::Api,
            Self::Transport { .. } => ErrorKind::Transport,
            Self::Decode { .. } => ErrorKind::Decode,
            Self::PropertyFile { .. } => ErrorKind::PropertyFile,
            Self::InvalidJobParameter { .. } => ErrorKind::InvalidJobParameter,
            Self::InvalidConfig { .. } => ErrorKind::InvalidConfig,
        }
    }

    #[must_use]
    pub fn http(&self) -> Option<&HttpError> {
        match self {
            Self::Auth(e) | Self::NotFound(e) | Self::Conflict(e) | Self::RateLimited(e) => {
                Some(e)
            }
            Self::Api(e) => Some(e),
            _ => None,
        }
    }

    #[must_use]
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            Self::Decode { status, .. } => Some(*status),
            other => other.http().map(|e| e.status),
        }
    }

    #[must_use]
    pub fn request_id(&self) -> Option<&str> {
        match self {
            Self::Decode { request_id, .. } => request_id.as_deref(),
            other => other.http().and_then(|e| e.request_id.as_deref()),
        }
    }

    #[must_use]
    pub fn retry_after(&self) -> Option<Duration> {
        self.http().and_then(|e| e.retry_after)
    }

    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }

    pub(crate) fn from_http(error: HttpError) -> Self {
        match error.status {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Self::Auth(error),
            StatusCode::NOT_FOUND => Self::NotFound(error),
            StatusCode::CONFLICT | StatusCode::PRECONDITION_FAILED => Self::Conflict(error),
            StatusCode::TOO_MANY_REQUESTS => Self::RateLimited(error),
            _ => Self::Api(error),
        }
    }
}

impl From<HttpError> for Error {
    fn from(error: HttpError) -> Self {
        Self::from_http(error)
    }
}

impl fmt::Display for HttpError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "HTTP {} ({} {})", self.status, self.method, self.path())?;
        if let Some(message) = self.message.as_deref() {
            write!(f, ": {message}")?;
        }
        if let Some(request_id) = self.request_id.as_deref() {
            write!(f, " [request-id: {request_id}]")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn http_error(status: u16) -> HttpError {
        HttpError::new(
            StatusCode::from_u16(status).unwrap(),
            Method::GET,
            Url::parse("https://ci.example.com/job/demo/api/json").unwrap(),
        )
    }

    #[test]
    fn from_http_maps_status_to_kind() {
        assert_eq!(Error::from(http_error(404)).kind(), ErrorKind::NotFound);
        assert_eq!(Error::from(http_error(403)).kind(), ErrorKind::Auth);
        assert_eq!(Error::from(http_error(429)).kind(), ErrorKind::RateLimited);
        assert_eq!(Error::from(http_error(502)).kind(), ErrorKind::Api);
        assert_eq!(
            Error::from(http_error(502)).status(),
            Some(StatusCode::BAD_GATEWAY)
        );
    }

    #[test]
    fn invalid_job_parameter_names_the_parameter() {
        let err = Error::InvalidJobParameter {
            name: "flavor".into(),
            value: "you".into(),
            choices: vec!["why".to_owned(), "not".to_owned()],
        };
        let text = err.to_string();
        assert!(text.contains("`flavor`"));
        assert!(text.contains("you"));
        assert_eq!(err.status(), None);
    }
}
