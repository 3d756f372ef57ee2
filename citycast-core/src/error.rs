use reqwest::StatusCode;

use crate::provider::ProviderId;

/// Why a single weather lookup failed. The `Display` text is what users see.
#[derive(Debug, thiserror::Error)]
pub enum LookupError {
    #[error("City \"{query}\" not found. Please check the spelling and try again.")]
    NotFound { query: String },

    #[error("Invalid API key. Please check your API key configuration.")]
    Unauthorized,

    #[error("API access forbidden. Please check your API key permissions.")]
    Forbidden,

    #[error("Network error: {0}")]
    Network(String),

    #[error(
        "Weather API key is not configured for provider '{provider}'.\n\
         Hint: run `citycast configure {provider}` and enter your API key."
    )]
    ConfigurationMissing { provider: ProviderId },

    #[error("{0}")]
    GeolocationUnavailable(#[from] LocationError),

    #[error("API Error ({status}): {body}")]
    Api { status: u16, body: String },

    #[error("Failed to parse weather data: {0}")]
    Parse(String),

    #[error("Failed to update saved cities: {0}")]
    Storage(String),
}

/// Coarse classification of a [`LookupError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    NotFound,
    Network,
    Configuration,
    Location,
    Provider,
    Storage,
}

impl LookupError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            LookupError::NotFound { .. } => ErrorKind::NotFound,
            LookupError::Network(_) => ErrorKind::Network,
            LookupError::Unauthorized
            | LookupError::Forbidden
            | LookupError::ConfigurationMissing { .. } => ErrorKind::Configuration,
            LookupError::GeolocationUnavailable(_) => ErrorKind::Location,
            LookupError::Api { .. } | LookupError::Parse(_) => ErrorKind::Provider,
            LookupError::Storage(_) => ErrorKind::Storage,
        }
    }

    /// Map a non-success HTTP status to the matching variant.
    pub fn from_status(status: StatusCode, query: &str, body: &str) -> Self {
        match status.as_u16() {
            400 | 404 => LookupError::NotFound { query: query.to_string() },
            401 => LookupError::Unauthorized,
            403 => LookupError::Forbidden,
            code => LookupError::Api { status: code, body: truncate_body(body) },
        }
    }
}

impl From<reqwest::Error> for LookupError {
    fn from(err: reqwest::Error) -> Self {
        LookupError::Network(err.to_string())
    }
}

/// Failure of the one-shot position request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum LocationError {
    #[error("Location access denied.")]
    PermissionDenied,
    #[error("Location information unavailable.")]
    PositionUnavailable,
    #[error("Location request timed out.")]
    Timeout,
    #[error("Geolocation is not supported on this system.")]
    Unsupported,
}

pub(crate) fn truncate_body(body: &str) -> String {
    const MAX: usize = 200;
    if body.len() <= MAX {
        return body.to_string();
    }
    let mut end = MAX;
    while !body.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}...", &body[..end])
}
