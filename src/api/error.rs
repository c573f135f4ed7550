use reqwest::StatusCode;
use thiserror::Error;

/// Failure of a single Record Client round trip
#[derive(Debug, Error)]
pub enum ApiError {
    /// The request never produced a response (connect, DNS, body read)
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// The API answered with a non-success status.
    /// Display is exactly the message so pages can show it verbatim.
    #[error("{message}")]
    Status { status: StatusCode, message: String },

    /// A success response whose body was not the expected JSON
    #[error("invalid response body: {0}")]
    Decode(#[from] serde_json::Error),
}

impl ApiError {
    /// Build a status error from a failed response body.
    ///
    /// Uses the body's `message` field when it is a non-empty string,
    /// otherwise falls back to `HTTP <status>`.
    pub fn from_status(status: StatusCode, body: &[u8]) -> Self {
        let message = serde_json::from_slice::<serde_json::Value>(body)
            .ok()
            .and_then(|json| {
                json.get("message")
                    .and_then(|m| m.as_str())
                    .filter(|m| !m.is_empty())
                    .map(str::to_string)
            })
            .unwrap_or_else(|| format!("HTTP {}", status.as_u16()));

        ApiError::Status { status, message }
    }

    pub fn status(&self) -> Option<StatusCode> {
        match self {
            ApiError::Status { status, .. } => Some(*status),
            ApiError::Transport(e) => e.status(),
            ApiError::Decode(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_message_from_body() {
        let err = ApiError::from_status(StatusCode::NOT_FOUND, br#"{"message":"not found"}"#);
        assert_eq!(err.to_string(), "not found");
        assert_eq!(err.status(), Some(StatusCode::NOT_FOUND));
    }

    #[test]
    fn test_unparseable_body_falls_back() {
        let err = ApiError::from_status(StatusCode::INTERNAL_SERVER_ERROR, b"<html>oops</html>");
        assert_eq!(err.to_string(), "HTTP 500");
    }

    #[test]
    fn test_empty_or_non_string_message_falls_back() {
        let err = ApiError::from_status(StatusCode::BAD_REQUEST, br#"{"message":""}"#);
        assert_eq!(err.to_string(), "HTTP 400");

        let err = ApiError::from_status(StatusCode::BAD_REQUEST, br#"{"message":42}"#);
        assert_eq!(err.to_string(), "HTTP 400");

        let err = ApiError::from_status(StatusCode::BAD_GATEWAY, b"");
        assert_eq!(err.to_string(), "HTTP 502");
    }
}
