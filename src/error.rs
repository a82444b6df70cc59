use std::{error::Error, fmt, io};

/// The crate's result type.
pub type Result<T> = std::result::Result<T, NexusError>;

/// Failures of the crate's I/O surfaces (export artifacts and configuration files).
///
/// The in-memory store and simulator never fail; only reading or writing files does.
#[derive(Debug)]
pub enum NexusError {
    /// Reading or writing a file failed.
    Io(io::Error),
    /// A document could not be encoded or decoded as JSON.
    Json(serde_json::Error),
    /// A configuration was parsed but holds unusable values.
    InvalidConfig(String),
}

impl fmt::Display for NexusError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io(e) => write!(f, "io error: {e}"),
            Self::Json(e) => write!(f, "json error: {e}"),
            Self::InvalidConfig(msg) => write!(f, "invalid config: {msg}"),
        }
    }
}

impl Error for NexusError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io(e) => Some(e),
            Self::Json(e) => Some(e),
            Self::InvalidConfig(_) => None,
        }
    }
}

impl From<io::Error> for NexusError {
    fn from(value: io::Error) -> Self {
        Self::Io(value)
    }
}

impl From<serde_json::Error> for NexusError {
    fn from(value: serde_json::Error) -> Self {
        Self::Json(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn io_errors_keep_their_source() {
        let err = NexusError::from(io::Error::new(io::ErrorKind::NotFound, "missing"));
        assert!(err.to_string().starts_with("io error"));
        assert!(err.source().is_some());
    }

    #[test]
    fn invalid_config_has_no_source() {
        let err = NexusError::InvalidConfig("tick_interval_ms must be greater than 0".into());
        assert_eq!(
            err.to_string(),
            "invalid config: tick_interval_ms must be greater than 0"
        );
        assert!(err.source().is_none());
    }
}
