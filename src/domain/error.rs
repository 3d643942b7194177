use thiserror::Error;

/// Core domain errors
#[derive(Debug, Error)]
pub enum DomainError {
    #[error("Store error: {message}")]
    Store { message: String },

    #[error("Wrong type: key '{key}' holds a value of another type")]
    WrongType { key: String },

    #[error("Configuration error: {message}")]
    Configuration { message: String },

    #[error("Internal error: {message}")]
    Internal { message: String },
}

impl DomainError {
    pub fn store(message: impl Into<String>) -> Self {
        Self::Store {
            message: message.into(),
        }
    }

    pub fn wrong_type(key: impl Into<String>) -> Self {
        Self::WrongType { key: key.into() }
    }

    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_store_error() {
        let error = DomainError::store("connection refused");
        assert_eq!(error.to_string(), "Store error: connection refused");
    }

    #[test]
    fn test_wrong_type_error() {
        let error = DomainError::wrong_type("user:1");
        assert_eq!(
            error.to_string(),
            "Wrong type: key 'user:1' holds a value of another type"
        );
    }

    #[test]
    fn test_configuration_error() {
        let error = DomainError::configuration("Redis URL is required");
        assert_eq!(
            error.to_string(),
            "Configuration error: Redis URL is required"
        );
    }

    #[test]
    fn test_internal_error() {
        let error = DomainError::internal("Failed to acquire lock");
        assert_eq!(error.to_string(), "Internal error: Failed to acquire lock");
    }
}
