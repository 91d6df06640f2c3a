//! Error types for the metrics adapter.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use thiserror::Error;

/// Errors that can occur while serving an external-metrics request.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Kubernetes API error (reading the owning target, resolving auth).
    #[error("Kubernetes API error: {0}")]
    Kube(#[from] kube::Error),

    /// The `{namespace}/{labelSelector}` pair names no known `ScalingTarget`.
    #[error("scaled object not found")]
    TargetNotFound,

    /// The request's `labelSelector` query parameter is missing the
    /// `scaledObjectName` key this adapter requires to disambiguate targets.
    #[error("labelSelector must set scaledObjectName")]
    MissingScaledObjectName,

    /// No trigger on the target publishes the requested metric name.
    #[error("metric not registered")]
    MetricNotFound,

    /// Every scaler for this target is currently in fallback and the target
    /// declares no fallback policy (spec.md §4.3: "the adapter returns an
    /// error and the autoscaler retains its current value").
    #[error("all scalers in fallback with no fallback policy defined")]
    FallbackExhausted,
}

/// Error response body, matching the cluster-standard external-metrics API
/// error shape closely enough for an autoscaler to surface it verbatim.
#[derive(Serialize)]
struct ErrorResponse {
    error: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self {
            Self::Kube(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::TargetNotFound | Self::MetricNotFound => StatusCode::NOT_FOUND,
            Self::MissingScaledObjectName => StatusCode::BAD_REQUEST,
            Self::FallbackExhausted => StatusCode::SERVICE_UNAVAILABLE,
        };
        (status, Json(ErrorResponse { error: self.to_string() })).into_response()
    }
}

/// Result type alias for adapter request handlers.
pub type Result<T> = std::result::Result<T, ApiError>;
