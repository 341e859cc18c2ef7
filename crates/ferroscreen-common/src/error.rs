use thiserror::Error;

#[derive(Debug, Error)]
pub enum ScreenError {
    /// Malformed caller input. Never retried.
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("No target found for identifier: {0}")]
    TargetNotFound(String),

    /// A registry stayed unreachable or returned nothing usable after all retries.
    #[error("Retrieval error: {0}")]
    Retrieval(String),

    #[error("Cleaning error: {0}")]
    Cleaning(String),

    #[error("Invalid potency input: {0}")]
    InvalidPotencyInput(String),

    #[error("Invalid structure: {0}")]
    InvalidStructure(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Security error: {0}")]
    Security(String),

    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl ScreenError {
    /// Whether a collaborator call that failed with this error may be retried.
    pub fn is_transient(&self) -> bool {
        match self {
            ScreenError::Http(e) => {
                e.is_timeout()
                    || e.is_connect()
                    || e.is_request()
                    || e.status().map(|s| s.is_server_error() || s.as_u16() == 429).unwrap_or(false)
            }
            ScreenError::Retrieval(_) | ScreenError::Io(_) => true,
            _ => false,
        }
    }
}

pub type Result<T> = std::result::Result<T, ScreenError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_is_not_transient() {
        assert!(!ScreenError::Validation("empty identifier".into()).is_transient());
        assert!(!ScreenError::TargetNotFound("P00000".into()).is_transient());
    }

    #[test]
    fn test_retrieval_is_transient() {
        assert!(ScreenError::Retrieval("503".into()).is_transient());
    }

    #[test]
    fn test_display_messages() {
        let e = ScreenError::InvalidPotencyInput("IC50 value must be a positive number.".into());
        assert_eq!(e.to_string(), "Invalid potency input: IC50 value must be a positive number.");
    }
}
