//! HTTP handlers
//!
//! `GET /` serves the landing page, `POST /run` runs one prompt through the model.

use axum::body::Bytes;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Response};
use axum::Json;
use thiserror::Error;

use crate::app::AppState;
use crate::inference::{sanitize, InvocationError, InvocationSpec};
use crate::types::{InferenceRequest, InferenceResponse};

/// Errors surfaced to HTTP clients as plain text
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),
    #[error(transparent)]
    Invocation(#[from] InvocationError),
    #[error("Cannot read landing page: {0}")]
    Template(std::io::Error),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Invocation(_) | ApiError::Template(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status(), self.to_string()).into_response()
    }
}

/// Landing page, read from disk on every request
pub async fn index(State(state): State<AppState>) -> Result<Html<String>, ApiError> {
    let path = state.config.index_path();
    match tokio::fs::read_to_string(&path).await {
        Ok(page) => Ok(Html(page)),
        Err(e) => {
            tracing::error!("Cannot read {}: {}", path.display(), e);
            Err(ApiError::Template(e))
        }
    }
}

/// Run one prompt through the model
///
/// The body is decoded as JSON whatever its content type.
pub async fn run(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<InferenceResponse>, ApiError> {
    let request = decode_request(&body)?;

    let spec = InvocationSpec::build(&state.config, &request.input);

    let completion = state.runner.run(&spec).await.map_err(|e| {
        tracing::error!("Cannot get completion: {}", e);
        ApiError::from(e)
    })?;

    Ok(Json(InferenceResponse {
        response: sanitize(&completion, &request.input),
        input: request.input,
    }))
}

/// Decode the first JSON value of the body; anything after it is ignored
fn decode_request(body: &[u8]) -> Result<InferenceRequest, ApiError> {
    match serde_json::Deserializer::from_slice(body)
        .into_iter::<InferenceRequest>()
        .next()
    {
        Some(Ok(request)) => Ok(request),
        Some(Err(e)) => Err(ApiError::BadRequest(e.to_string())),
        None => Err(ApiError::BadRequest("empty request body".to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(
            ApiError::BadRequest("expected value".into()).status(),
            StatusCode::BAD_REQUEST
        );
        let exit = InvocationError::Exit {
            code: Some(1),
            stderr: "boom".into(),
        };
        assert_eq!(
            ApiError::from(exit).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_decode_reads_first_value_only() {
        let request = decode_request(b"{\"input\":\"X\"} trailing garbage").unwrap();
        assert_eq!(request.input, "X");

        assert!(matches!(
            decode_request(b"not-json"),
            Err(ApiError::BadRequest(_))
        ));
        assert!(matches!(
            decode_request(b"   "),
            Err(ApiError::BadRequest(msg)) if msg == "empty request body"
        ));
        assert!(matches!(
            decode_request(b"{\"prompt\":\"X\"}"),
            Err(ApiError::BadRequest(msg)) if msg.contains("input")
        ));
    }

    #[test]
    fn test_invocation_message_passed_through() {
        let err = ApiError::from(InvocationError::Timeout(std::time::Duration::from_secs(5)));
        assert_eq!(err.to_string(), "Model process timed out after 5s");
    }
}
