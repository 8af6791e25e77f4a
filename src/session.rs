use crate::client::Guard;
use crate::cookies::Cookies;
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};

/// Whether the browser is logged in, as far as this request has learned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoginState {
    Unknown,
    LoggedIn,
    LoggedOut,
}

/// Per-request session: the browser's cookies and the login state derived from
/// backend answers seen so far.
#[derive(Debug, Clone)]
pub struct Session {
    pub cookies: Cookies,
    state: LoginState,
}

impl Session {
    pub fn new(cookies: Cookies) -> Self {
        let state = if cookies.session_token().is_some() {
            LoginState::Unknown
        } else {
            LoginState::LoggedOut
        };
        Self { cookies, state }
    }

    pub fn from_headers(headers: &HeaderMap) -> Self {
        Self::new(Cookies::from_headers(headers))
    }

    pub fn state(&self) -> LoginState {
        self.state
    }

    pub fn set_state(&mut self, state: LoginState) {
        self.state = state;
    }

    /// Only answers through the session-guarded client say anything about the login.
    pub fn observe(&mut self, guard: Guard, status: StatusCode) {
        if guard != Guard::Session {
            return;
        }
        if status.is_success() {
            self.state = LoginState::LoggedIn;
        } else if status == StatusCode::UNAUTHORIZED {
            self.state = LoginState::LoggedOut;
        }
    }

    /// Attaches the cookies the backend issued to a browser response.
    pub fn respond(&self, response: impl IntoResponse) -> Response {
        let mut response = response.into_response();
        self.cookies.apply(response.headers_mut());
        response
    }
}
