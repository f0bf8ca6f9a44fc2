use std::env;
use std::fmt;

use thiserror::Error;
use url::Url;

pub const API_URL_ENV: &str = "TASKBOARD_API_URL";
pub const API_TOKEN_ENV: &str = "TASKBOARD_API_TOKEN";

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum RemoteConfigError {
    #[error("{0} is not set")]
    Missing(&'static str),
    #[error("invalid api url: {0}")]
    InvalidUrl(#[from] url::ParseError),
    #[error("unsupported api url scheme: {0}")]
    UnsupportedScheme(String),
}

/// Where the REST backend lives and how to authenticate against it.
#[derive(Clone)]
pub struct RemoteConfig {
    base_url: Url,
    token: Option<String>,
}

impl fmt::Debug for RemoteConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RemoteConfig")
            .field("base_url", &self.base_url.as_str())
            .field("token", &self.token.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

impl RemoteConfig {
    /// # Errors
    ///
    /// Returns `RemoteConfigError` if the URL does not parse or is not http(s).
    pub fn new(base_url: &str) -> Result<Self, RemoteConfigError> {
        let base_url = Url::parse(base_url.trim())?;
        match base_url.scheme() {
            "http" | "https" => {}
            other => return Err(RemoteConfigError::UnsupportedScheme(other.to_owned())),
        }
        Ok(Self {
            base_url,
            token: None,
        })
    }

    /// Reads `TASKBOARD_API_URL` and the optional `TASKBOARD_API_TOKEN`.
    ///
    /// # Errors
    ///
    /// Returns `RemoteConfigError::Missing` when no URL is configured.
    pub fn from_env() -> Result<Self, RemoteConfigError> {
        let raw = env::var(API_URL_ENV)
            .ok()
            .filter(|v| !v.trim().is_empty())
            .ok_or(RemoteConfigError::Missing(API_URL_ENV))?;
        let config = Self::new(&raw)?;
        Ok(match env::var(API_TOKEN_ENV) {
            Ok(token) => config.with_token(token),
            Err(_) => config,
        })
    }

    /// Attaches a bearer token; blank tokens are ignored.
    #[must_use]
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        let token = token.into();
        self.token = (!token.trim().is_empty()).then_some(token);
        self
    }

    #[must_use]
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    #[must_use]
    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    /// Appends path segments to the base URL. Segments are percent-encoded.
    #[must_use]
    pub fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }
}
