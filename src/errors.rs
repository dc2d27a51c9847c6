use serde::Serialize;

/// All engine errors, categorized by domain. The simulation itself is total;
/// these only arise while decoding a strategy payload or talking to the
/// upstream data feed, before a run starts.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    // ── Strategy decoding ──
    #[error("Invalid rule: {0}")]
    InvalidRule(String),

    #[error("Unknown operator: {0}")]
    UnknownOperator(String),

    #[error("Unknown rule action: {0}")]
    UnknownAction(String),

    // ── Data feed ──
    #[error("Data feed error for {symbol}: {message}")]
    Feed { symbol: String, message: String },

    // ── Serialization ──
    #[error("Serialization error: {0}")]
    Serialization(String),
}

/// Serializable error shape for the transport layer, which publishes a
/// FAILED result when a job is rejected before reaching the engine.
#[derive(Debug, Serialize, Clone)]
pub struct ErrorResponse {
    pub code: String,
    pub message: String,
}

impl From<&EngineError> for ErrorResponse {
    fn from(err: &EngineError) -> Self {
        let code = match err {
            EngineError::InvalidRule(_) => "INVALID_RULE",
            EngineError::UnknownOperator(_) => "UNKNOWN_OPERATOR",
            EngineError::UnknownAction(_) => "UNKNOWN_ACTION",
            EngineError::Feed { .. } => "DATA_FEED",
            EngineError::Serialization(_) => "SERIALIZATION",
        };
        ErrorResponse {
            code: code.to_string(),
            message: err.to_string(),
        }
    }
}

impl From<serde_json::Error> for EngineError {
    fn from(err: serde_json::Error) -> Self {
        EngineError::Serialization(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_response_carries_code_and_message() {
        let err = EngineError::UnknownOperator(">=".into());
        let resp = ErrorResponse::from(&err);
        assert_eq!(resp.code, "UNKNOWN_OPERATOR");
        assert!(resp.message.contains(">="));
    }
}
