use crate::client::ApiError;
use crate::ui::render_error;
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Redirect, Response};
use tracing::{error, info};

#[derive(Debug)]
pub struct AppError {
    pub status: StatusCode,
    pub message: String,
    pub redirect: Option<String>,
}

impl AppError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
            redirect: None,
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, message)
    }

    pub fn method_not_allowed() -> Self {
        Self::new(StatusCode::METHOD_NOT_ALLOWED, "this page has no form to submit")
    }

    pub fn redirect(to: impl Into<String>) -> Self {
        Self {
            status: StatusCode::SEE_OTHER,
            message: String::new(),
            redirect: Some(to.into()),
        }
    }

    /// Maps a backend failure to what the browser sees. An unauthenticated
    /// session becomes a single redirect to the login page.
    pub fn from_api(err: ApiError, login_path: &str) -> Self {
        match err {
            ApiError::Unauthenticated => {
                info!("redirecting to {login_path}");
                Self::redirect(login_path)
            }
            ApiError::Status { status, message } => {
                let message = if message.is_empty() {
                    status.canonical_reason().unwrap_or("request failed").to_string()
                } else {
                    message
                };
                Self::new(status, message)
            }
            err @ (ApiError::Transport(_) | ApiError::InvalidUrl(_) | ApiError::UnexpectedBody(_)) => {
                error!("backend call failed: {err}");
                Self::new(StatusCode::BAD_GATEWAY, err.to_string())
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        match self.redirect {
            Some(to) => Redirect::to(&to).into_response(),
            None => (self.status, Html(render_error(self.status, &self.message))).into_response(),
        }
    }
}
