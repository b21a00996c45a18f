//! Error types for the Figma data cache

use std::fmt;

#[derive(Debug)]
pub enum CacheError {
    /// Missing or invalid startup configuration
    Config(String),
    /// Upstream request could not be built, sent, or read
    Http(Box<reqwest::Error>),
    Io(Box<std::io::Error>),
}

impl fmt::Display for CacheError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CacheError::Config(msg) => write!(f, "Configuration error: {}", msg),
            CacheError::Http(err) => write!(f, "Upstream request error: {}", err),
            CacheError::Io(err) => write!(f, "IO error: {}", err),
        }
    }
}

impl std::error::Error for CacheError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CacheError::Http(err) => Some(err.as_ref()),
            CacheError::Io(err) => Some(err.as_ref()),
            CacheError::Config(_) => None,
        }
    }
}

impl From<reqwest::Error> for CacheError {
    fn from(err: reqwest::Error) -> Self {
        CacheError::Http(Box::new(err))
    }
}

impl From<std::io::Error> for CacheError {
    fn from(err: std::io::Error) -> Self {
        CacheError::Io(Box::new(err))
    }
}

impl From<tracing_subscriber::filter::ParseError> for CacheError {
    fn from(err: tracing_subscriber::filter::ParseError) -> Self {
        CacheError::Config(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, CacheError>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error;

    #[test]
    fn test_config_error_display() {
        let err = CacheError::Config("FIGMA_API_TOKEN is not set".to_string());
        assert_eq!(
            format!("{}", err),
            "Configuration error: FIGMA_API_TOKEN is not set"
        );
        assert!(err.source().is_none());
    }

    #[test]
    fn test_http_error_has_source() {
        let err: CacheError = reqwest::Client::new()
            .get("not a url")
            .build()
            .unwrap_err()
            .into();
        assert!(format!("{}", err).starts_with("Upstream request error"));
        assert!(err.source().is_some());
    }

    #[test]
    fn test_io_error_display() {
        let err: CacheError =
            std::io::Error::new(std::io::ErrorKind::AddrInUse, "port taken").into();
        assert_eq!(format!("{}", err), "IO error: port taken");
    }

    #[test]
    fn test_error_is_debug() {
        let err = CacheError::Config("test".to_string());
        let debug_str = format!("{:?}", err);
        assert!(debug_str.contains("Config"));
    }
}
