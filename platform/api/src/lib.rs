use std::sync::Arc;

use async_graphql::{Error, ErrorExtensions};
use thiserror::Error;

/// Shared GraphQL result type.
pub type ApiResult<T> = Result<T, ApiError>;

#[derive(Debug, Error, Clone)]
pub enum ApiError {
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    PreconditionFailed(String),
    #[error("bad request: {0}")]
    InvalidInput(String),
    #[error("service unavailable")]
    Unavailable,
    #[error("internal server error")]
    Internal(Arc<anyhow::Error>),
}

impl ApiError {
    pub fn code(&self) -> &'static str {
        match self {
            ApiError::NotFound(_) => "NOT_FOUND",
            ApiError::PreconditionFailed(_) => "PRECONDITION_FAILED",
            ApiError::InvalidInput(_) => "INVALID_INPUT",
            ApiError::Unavailable => "UNAVAILABLE",
            ApiError::Internal(_) => "INTERNAL",
        }
    }

    pub fn internal(err: anyhow::Error) -> Self {
        Self::Internal(Arc::new(err))
    }
}

impl From<anyhow::Error> for ApiError {
    fn from(value: anyhow::Error) -> Self {
        Self::internal(value)
    }
}

impl ErrorExtensions for ApiError {
    fn extend(&self) -> Error {
        let mut err = Error::new(self.to_string());
        err = err.extend_with(|_err, e| {
            e.set("code", self.code());
        });
        if let ApiError::InvalidInput(_) = self {
            err = err.extend_with(|_err, e| {
                e.set("type", "BAD_REQUEST");
            });
        }
        err
    }
}

/// Convert any error into a GraphQL error payload while hiding internals.
pub fn internal_error(err: impl Into<anyhow::Error>) -> Error {
    ApiError::internal(err.into()).extend()
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_graphql::Value;

    fn code_of(err: &Error) -> Option<Value> {
        err.extensions
            .as_ref()
            .and_then(|map| map.get("code"))
            .cloned()
    }

    #[test]
    fn internal_errors_are_masked() {
        let err = internal_error(anyhow::anyhow!("boom"));
        assert_eq!(err.message, "internal server error");
        assert_eq!(code_of(&err), Some(Value::from("INTERNAL")));
    }

    #[test]
    fn board_errors_keep_their_message_and_code() {
        let err = ApiError::NotFound("deal d9 not found".into()).extend();
        assert_eq!(err.message, "deal d9 not found");
        assert_eq!(code_of(&err), Some(Value::from("NOT_FOUND")));

        let err = ApiError::PreconditionFailed("stage 1 still holds 2 deal(s)".into()).extend();
        assert_eq!(code_of(&err), Some(Value::from("PRECONDITION_FAILED")));
    }

    #[test]
    fn invalid_input_is_tagged_as_bad_request() {
        let err = ApiError::InvalidInput("empty name".into()).extend();
        assert_eq!(err.message, "bad request: empty name");
        let kind = err.extensions.as_ref().and_then(|map| map.get("type")).cloned();
        assert_eq!(kind, Some(Value::from("BAD_REQUEST")));
    }
}
