//! CMS error types.

use thiserror::Error;

/// Result type for CMS operations.
pub type CmsResult<T> = Result<T, CmsError>;

#[derive(Debug, Error)]
pub enum CmsError {
    /// Missing credentials; raised before any network call.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// Non-success response from the CMS.
    #[error("{message}")]
    Api { status: Option<u16>, message: String },

    #[error("{content_type} entry '{uid}' not found")]
    NotFound { content_type: String, uid: String },

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl CmsError {
    pub fn api(status: Option<u16>, message: impl Into<String>) -> Self {
        CmsError::Api {
            status,
            message: message.into(),
        }
    }

    pub fn not_found(content_type: &str, uid: &str) -> Self {
        CmsError::NotFound {
            content_type: content_type.to_string(),
            uid: uid.to_string(),
        }
    }

    /// "Not found" as opposed to "service unavailable".
    pub fn is_not_found(&self) -> bool {
        match self {
            CmsError::NotFound { .. } => true,
            CmsError::Api { status, .. } => *status == Some(404),
            CmsError::Http(e) => e.status().is_some_and(|s| s.as_u16() == 404),
            _ => false,
        }
    }

    /// HTTP status carried by the error, when there was a response at all.
    pub fn status(&self) -> Option<u16> {
        match self {
            CmsError::Api { status, .. } => *status,
            CmsError::NotFound { .. } => Some(404),
            CmsError::Http(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }

    /// Rewrite a 404 API error on a single-entry fetch into `NotFound`.
    pub(crate) fn into_not_found(self, content_type: &str, uid: &str) -> Self {
        if self.is_not_found() {
            CmsError::not_found(content_type, uid)
        } else {
            self
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn api_error_displays_message_verbatim() {
        let err = CmsError::api(Some(422), "Entry title is required");
        assert_eq!(err.to_string(), "Entry title is required");
        assert_eq!(err.status(), Some(422));
        assert!(!err.is_not_found());
    }

    #[test]
    fn api_404_maps_to_not_found() {
        let err = CmsError::api(Some(404), "The requested object doesn't exist.")
            .into_not_found("home", "blt1");
        assert!(matches!(err, CmsError::NotFound { .. }));
        assert_eq!(err.to_string(), "home entry 'blt1' not found");
    }

    #[test]
    fn other_errors_survive_not_found_mapping() {
        let err = CmsError::api(Some(500), "boom").into_not_found("home", "blt1");
        assert!(matches!(err, CmsError::Api { status: Some(500), .. }));
    }
}
