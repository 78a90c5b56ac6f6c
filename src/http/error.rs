//! Request-level error mapping.
//!
//! Every failure stays local to the request that triggered it; this
//! module only translates the taxonomy into client-facing statuses.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;

use crate::origin::FetchError;
use crate::routing::RouteError;

/// A request that could not be served.
#[derive(Debug, Error)]
pub enum GatewayError {
    #[error(transparent)]
    Route(#[from] RouteError),

    #[error(transparent)]
    Fetch(#[from] FetchError),
}

impl GatewayError {
    pub fn status(&self) -> StatusCode {
        match self {
            GatewayError::Route(RouteError::NotFound) => StatusCode::NOT_FOUND,
            GatewayError::Route(RouteError::MethodNotAllowed) => StatusCode::METHOD_NOT_ALLOWED,
            GatewayError::Fetch(FetchError::Timeout { .. }) => StatusCode::GATEWAY_TIMEOUT,
            GatewayError::Fetch(FetchError::Transport { .. }) => StatusCode::BAD_GATEWAY,
        }
    }
}

impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = match &self {
            GatewayError::Route(RouteError::NotFound) => "No matching route found".to_string(),
            GatewayError::Route(RouteError::MethodNotAllowed) => {
                "Method not allowed on this route".to_string()
            }
            GatewayError::Fetch(_) => "Origin request failed".to_string(),
        };
        (status, message).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn maps_taxonomy_to_statuses() {
        assert_eq!(
            GatewayError::from(RouteError::NotFound).status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            GatewayError::from(RouteError::MethodNotAllowed).status(),
            StatusCode::METHOD_NOT_ALLOWED
        );
        assert_eq!(
            GatewayError::from(FetchError::Timeout {
                origin: "a".into(),
                timeout: Duration::from_secs(1),
            })
            .status(),
            StatusCode::GATEWAY_TIMEOUT
        );
        assert_eq!(
            GatewayError::from(FetchError::Transport {
                origin: "a".into(),
                message: "connection refused".into(),
            })
            .status(),
            StatusCode::BAD_GATEWAY
        );
    }
}
