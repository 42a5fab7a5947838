use crate::Error;
use base64::{Engine, engine::general_purpose::STANDARD as B64};
use http::{HeaderMap, HeaderValue, header::AUTHORIZATION};
use std::fmt;

/// A credential that never shows up in `Debug`/`Display` output.
#[derive(Clone, Default, Eq, PartialEq)]
pub struct SecretString(String);

impl SecretString {
    #[must_use]
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    #[must_use]
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for SecretString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("<redacted>")
    }
}

impl fmt::Display for SecretString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("<redacted>")
    }
}

/// Identity the adapter presents to the CI server.
#[derive(Clone, Debug)]
#[non_exhaustive]
pub enum Auth {
    /// User name plus password or API token.
    Basic { user: String, token: SecretString },
    Bearer { token: SecretString },
}

impl Auth {
    #[must_use]
    pub fn basic(user: impl Into<String>, token: impl Into<String>) -> Self {
        Self::Basic {
            user: user.into(),
            token: SecretString::new(token),
        }
    }

    #[must_use]
    pub fn bearer(token: impl Into<String>) -> Self {
        Self::Bearer {
            token: SecretString::new(token),
        }
    }

    pub(crate) fn secret(&self) -> &str {
        match self {
            Self::Basic { token, .. } | Self::Bearer { token } => token.expose(),
        }
    }

    fn header_value(&self) -> String {
        match self {
            Self::Basic { user, token } => {
                format!("Basic {}", B64.encode(format!("{user}:{}", token.expose())))
            }
            Self::Bearer { token } => format!("Bearer {}", token.expose()),
        }
    }

    pub(crate) fn apply(&self, headers: &mut HeaderMap) -> Result<(), Error> {
        let mut value =
            HeaderValue::from_str(&self.header_value()).map_err(|err| Error::InvalidConfig {
                message: "invalid Authorization header value".into(),
                source: Some(Box::new(err)),
            })?;
        value.set_sensitive(true);
        headers.insert(AUTHORIZATION, value);
        Ok(())
    }
}
