// ⚠️ Error Taxonomy - FetchError / ParseError
// Every remote read either yields a normalized entity or one of these.

use thiserror::Error;

/// Malformed or unexpected JSON coming back from the API.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum ParseError {
    /// Body is not valid JSON, or does not match the expected record shape
    #[error("unexpected response shape: {0}")]
    Shape(String),

    /// Shape was fine but a value breaks an entity invariant
    #[error("invalid field `{field}`: {message}")]
    InvalidField { field: &'static str, message: String },
}

impl From<serde_json::Error> for ParseError {
    fn from(err: serde_json::Error) -> Self {
        ParseError::Shape(err.to_string())
    }
}

/// Network or HTTP-level failure below the parse step.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum TransportError {
    #[error("request to {url} failed: {message}")]
    Network { url: String, message: String },

    #[error("{url} returned HTTP {status}")]
    Status { url: String, status: u16 },
}

#[derive(Debug, Clone, Error, PartialEq)]
pub enum FetchError {
    #[error("fetching {id}: {source}")]
    Transport {
        id: String,
        #[source]
        source: TransportError,
    },

    #[error("parsing {id}: {source}")]
    Parse {
        id: String,
        #[source]
        source: ParseError,
    },

    #[error("invalid identifier {0:?}")]
    InvalidId(String),
}

/// Category tag outside the 18-tag vocabulary.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unknown type {0:?}")]
pub struct UnknownType(pub String);

impl FetchError {
    pub fn transport(id: impl ToString, source: TransportError) -> Self {
        FetchError::Transport {
            id: id.to_string(),
            source,
        }
    }

    pub fn parse(id: impl ToString, source: ParseError) -> Self {
        FetchError::Parse {
            id: id.to_string(),
            source,
        }
    }

    /// Identifier (or URL) the failed read was for
    pub fn subject(&self) -> &str {
        match self {
            FetchError::Transport { id, .. } | FetchError::Parse { id, .. } => id,
            FetchError::InvalidId(raw) => raw,
        }
    }

    pub fn is_parse(&self) -> bool {
        matches!(self, FetchError::Parse { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fetch_error_carries_identifier() {
        let err = FetchError::transport(
            "25",
            TransportError::Status {
                url: "http://x/pokemon/25".to_string(),
                status: 404,
            },
        );

        assert_eq!(err.subject(), "25");
        assert!(!err.is_parse());
        assert_eq!(
            err.to_string(),
            "fetching 25: http://x/pokemon/25 returned HTTP 404"
        );
    }

    #[test]
    fn test_parse_error_from_serde() {
        let raw = serde_json::from_str::<serde_json::Value>("{not json");
        let err: ParseError = raw.unwrap_err().into();

        assert!(matches!(err, ParseError::Shape(_)));
        assert!(FetchError::parse("1", err).is_parse());
    }

    #[test]
    fn test_unknown_type_message() {
        let err = UnknownType("stellar".to_string());

        assert_eq!(err.to_string(), "unknown type \"stellar\"");
    }
}
