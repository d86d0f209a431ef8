use thiserror::Error;

/// Domain failures raised by the store and surfaced by the API layer.
///
/// The message of each variant is the user-facing detail string.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MarketplaceError {
    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Conflict(String),

    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    Unauthorized(String),

    #[error("{0}")]
    Forbidden(String),
}

impl MarketplaceError {
    pub fn not_found(what: &str) -> Self {
        MarketplaceError::NotFound(format!("{} not found", what))
    }
}

pub type MarketplaceResult<T> = Result<T, MarketplaceError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_message() {
        assert_eq!(
            MarketplaceError::not_found("Product").to_string(),
            "Product not found"
        );
    }

    #[test]
    fn test_message_is_detail() {
        let err = MarketplaceError::Conflict("Email already registered".to_string());
        assert_eq!(err.to_string(), "Email already registered");
    }
}
