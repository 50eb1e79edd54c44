//! Error types for the application

use thiserror::Error;

/// Application-wide error type
#[derive(Error, Debug)]
pub enum Error {
    /// Negative or non-numeric units, rates or percentages
    #[error("Invalid tariff input: {0}")]
    InvalidTariffInput(String),

    /// Malformed slab table or time-of-use schedule
    #[error("Tariff configuration error: {0}")]
    TariffConfiguration(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl Error {
    /// Whether the error was caused by the caller's data rather than a fault
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            Error::InvalidTariffInput(_) | Error::TariffConfiguration(_) | Error::NotFound(_)
        )
    }

    /// HTTP-style status for handlers that surface these errors
    pub fn status_code(&self) -> u16 {
        match self {
            Error::InvalidTariffInput(_) => 400,
            Error::NotFound(_) => 404,
            Error::TariffConfiguration(_) => 422,
            _ => 500,
        }
    }

    /// Translation key of the operator-facing message
    pub fn message_key(&self) -> &'static str {
        match self {
            Error::InvalidTariffInput(_) => "error.invalid_input",
            Error::TariffConfiguration(_) => "error.tariff_configuration",
            Error::NotFound(_) => "error.not_found",
            _ => "error.internal",
        }
    }

    /// The detail carried by the error, without the kind prefix
    pub fn detail(&self) -> String {
        match self {
            Error::InvalidTariffInput(msg)
            | Error::TariffConfiguration(msg)
            | Error::NotFound(msg)
            | Error::Config(msg)
            | Error::Serialization(msg) => msg.clone(),
            Error::Database(e) => e.to_string(),
            Error::Io(e) => e.to_string(),
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Serialization(e.to_string())
    }
}

/// Result type alias using our Error
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_domain_errors_are_client_errors() {
        assert!(Error::InvalidTariffInput("units".into()).is_client_error());
        assert!(Error::TariffConfiguration("gap".into()).is_client_error());
        assert!(Error::NotFound("tariff".into()).is_client_error());
        assert!(!Error::Config("bad".into()).is_client_error());
    }

    #[test]
    fn test_status_codes() {
        assert_eq!(Error::InvalidTariffInput(String::new()).status_code(), 400);
        assert_eq!(Error::NotFound(String::new()).status_code(), 404);
        assert_eq!(Error::TariffConfiguration(String::new()).status_code(), 422);
        assert_eq!(Error::Serialization(String::new()).status_code(), 500);
    }
}
