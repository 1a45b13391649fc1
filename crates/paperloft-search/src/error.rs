//! Search client errors.

use thiserror::Error;

/// Failures of the metadata search client.
#[derive(Error, Debug)]
pub enum SearchError {
    /// The provider answered with a non-success status.
    #[error("OpenAlex request failed: {status}")]
    Status { status: u16 },

    /// The request never produced a response.
    #[error("OpenAlex request error: {0}")]
    Network(String),

    /// The response body could not be decoded.
    #[error("Failed to parse OpenAlex response: {0}")]
    Decode(String),

    /// A page load is already in flight for this session.
    #[error("A page is already loading")]
    Busy,

    /// Neither a query nor any filter was given.
    #[error("Enter a keyword or use advanced filters")]
    NoInput,
}

impl SearchError {
    /// Short message suitable for showing to the user.
    pub fn user_message(&self) -> &'static str {
        match self {
            Self::Busy => "Results are still loading.",
            Self::NoInput => "Enter a keyword or use Advanced filters.",
            _ => "Error loading results.",
        }
    }
}

impl From<reqwest::Error> for SearchError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_decode() {
            Self::Decode(e.to_string())
        } else {
            Self::Network(e.to_string())
        }
    }
}

impl From<SearchError> for paperloft_core::Error {
    fn from(e: SearchError) -> Self {
        match e {
            SearchError::Busy => paperloft_core::Error::Busy(e.to_string()),
            SearchError::NoInput => paperloft_core::Error::InvalidInput(e.to_string()),
            other => paperloft_core::Error::Search(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_display() {
        let err = SearchError::Status { status: 503 };
        assert_eq!(err.to_string(), "OpenAlex request failed: 503");
        assert_eq!(err.user_message(), "Error loading results.");
    }

    #[test]
    fn test_into_core_error() {
        let core: paperloft_core::Error = SearchError::Busy.into();
        assert!(matches!(core, paperloft_core::Error::Busy(_)));

        let core: paperloft_core::Error = SearchError::NoInput.into();
        assert!(matches!(core, paperloft_core::Error::InvalidInput(_)));

        let core: paperloft_core::Error = SearchError::Status { status: 500 }.into();
        assert!(matches!(core, paperloft_core::Error::Search(_)));
    }
}
