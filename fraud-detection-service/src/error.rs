use axum::{
    http::StatusCode,
    response::{Html, IntoResponse, Response},
};
use claim_flow::FlowError;
use thiserror::Error;
use tracing::error;

use crate::auth::AuthError;
use crate::models::ValidationError;
use crate::pages;
use crate::report::ReportError;
use crate::workflow::SubmitError;

/// Everything a request handler can fail with.
#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Report(#[from] ReportError),

    #[error(transparent)]
    Flow(#[from] FlowError),
}

impl From<SubmitError> for AppError {
    fn from(err: SubmitError) -> Self {
        match err {
            SubmitError::Validation(e) => AppError::Validation(e),
            SubmitError::Flow(e) => AppError::Flow(e),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        match self {
            AppError::Auth(e) => (StatusCode::UNAUTHORIZED, e.to_string()).into_response(),
            AppError::Validation(e) => (
                StatusCode::BAD_REQUEST,
                Html(pages::user_dashboard(None, Some(&e.to_string()))),
            )
                .into_response(),
            AppError::Report(e) => {
                error!(error = %e, "failed to build report");
                internal_error()
            }
            AppError::Flow(e) => {
                error!(error = %e, "prediction flow failed");
                internal_error()
            }
        }
    }
}

fn internal_error() -> Response {
    (StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error").into_response()
}
