use thiserror::Error;

/// Top-level error type for the CuraMind service.
///
/// Subsystem crates define their own error types; this one covers the
/// cross-cutting concerns (configuration, I/O, serialization, server startup).
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum CuramindError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("API error: {0}")]
    Api(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl From<toml::de::Error> for CuramindError {
    fn from(err: toml::de::Error) -> Self {
        CuramindError::Config(err.to_string())
    }
}

impl From<toml::ser::Error> for CuramindError {
    fn from(err: toml::ser::Error) -> Self {
        CuramindError::Config(err.to_string())
    }
}

impl From<serde_json::Error> for CuramindError {
    fn from(err: serde_json::Error) -> Self {
        CuramindError::Serialization(err.to_string())
    }
}

/// A specialized `Result` type for CuraMind operations.
pub type Result<T> = std::result::Result<T, CuramindError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display_all_variants() {
        let cases: Vec<(CuramindError, &str)> = vec![
            (
                CuramindError::Config("bad key".to_string()),
                "Configuration error: bad key",
            ),
            (
                CuramindError::Api("bind failed".to_string()),
                "API error: bind failed",
            ),
            (
                CuramindError::Serialization("invalid json".to_string()),
                "Serialization error: invalid json",
            ),
        ];

        for (error, expected) in cases {
            assert_eq!(error.to_string(), expected);
        }
    }

    #[test]
    fn test_error_from_io() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "missing file");
        let err: CuramindError = io_err.into();
        match &err {
            CuramindError::Io(e) => assert_eq!(e.kind(), std::io::ErrorKind::NotFound),
            _ => panic!("Expected Io variant"),
        }
        assert!(err.to_string().starts_with("I/O error:"));
    }

    #[test]
    fn test_error_from_toml_de() {
        let err: std::result::Result<toml::Value, _> = toml::from_str("invalid = [[[");
        let err: CuramindError = err.unwrap_err().into();
        assert!(matches!(err, CuramindError::Config(_)));
    }

    #[test]
    fn test_error_from_serde_json() {
        let err: std::result::Result<serde_json::Value, _> = serde_json::from_str("{ nope }");
        let err: CuramindError = err.unwrap_err().into();
        assert!(matches!(err, CuramindError::Serialization(_)));
    }

    #[test]
    fn test_result_type_with_question_mark() {
        fn inner() -> Result<String> {
            let io_result: std::result::Result<i32, std::io::Error> = Ok(42);
            let value = io_result?;
            Ok(value.to_string())
        }

        assert_eq!(inner().unwrap(), "42");
    }
}
