use crate::models::{Credentials, DocumentId, Note, NoteDraft};
use crate::session::Session;
use reqwest::{Method, RequestBuilder, Response, StatusCode, Url, header};
use thiserror::Error;
use tracing::{debug, warn};

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("session is no longer authenticated")]
    Unauthenticated,
    #[error("backend answered {status}: {message}")]
    Status { status: StatusCode, message: String },
    #[error("backend request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("invalid backend url: {0}")]
    InvalidUrl(#[from] url::ParseError),
    #[error("unexpected backend response: {0}")]
    UnexpectedBody(String),
}

impl ApiError {
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            ApiError::Unauthenticated => Some(StatusCode::UNAUTHORIZED),
            ApiError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// How a client treats rejected responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Guard {
    /// Every failure is reported with its status.
    Direct,
    /// An unauthorized status is reported as [`ApiError::Unauthenticated`].
    Session,
}

impl Guard {
    /// Classifies a non-success response.
    pub fn reject(self, status: StatusCode, message: String) -> ApiError {
        if self == Guard::Session && status == StatusCode::UNAUTHORIZED {
            warn!("backend rejected session");
            return ApiError::Unauthenticated;
        }
        ApiError::Status { status, message }
    }
}

/// Client for the note backend. Holds a handle to a shared connection pool.
#[derive(Debug)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: Url,
    guard: Guard,
}

impl ApiClient {
    pub fn new(http: reqwest::Client, base_url: Url, guard: Guard) -> Self {
        Self {
            http,
            base_url,
            guard,
        }
    }

    pub fn guard(&self) -> Guard {
        self.guard
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn request(
        &self,
        method: Method,
        path: &str,
        session: &Session,
    ) -> Result<RequestBuilder, ApiError> {
        let url = self.base_url.join(path.trim_start_matches('/'))?;
        debug!(%method, %url, "backend request");
        let mut builder = self.http.request(method, url);
        if let Some(cookie) = session.cookies.header_value() {
            builder = builder.header(header::COOKIE, cookie);
        }
        Ok(builder)
    }

    /// Sends a request, relays cookies the backend set and rejects non-success statuses.
    pub async fn send(
        &self,
        request: RequestBuilder,
        session: &mut Session,
    ) -> Result<Response, ApiError> {
        let response = request.send().await?;
        for value in response.headers().get_all(header::SET_COOKIE) {
            match value.to_str() {
                Ok(raw) => session.cookies.record_set_cookie(raw),
                Err(_) => warn!("backend sent a non-ascii set-cookie"),
            }
        }

        let status = response.status();
        session.observe(self.guard, status);
        if status.is_success() {
            return Ok(response);
        }
        let message = match response.text().await {
            Ok(message) => message,
            Err(err) => {
                warn!("could not read backend error body for {status}: {err}");
                String::new()
            }
        };
        Err(self.guard.reject(status, message))
    }

    pub async fn login(
        &self,
        session: &mut Session,
        username: &str,
        password: &str,
    ) -> Result<(), ApiError> {
        let request = self
            .request(Method::POST, "api/auth/login", session)?
            .form(&Credentials { username, password });
        self.send(request, session).await?;
        Ok(())
    }

    pub async fn register(
        &self,
        session: &mut Session,
        username: &str,
        password: &str,
    ) -> Result<(), ApiError> {
        let request = self
            .request(Method::POST, "api/auth/register", session)?
            .form(&Credentials { username, password });
        self.send(request, session).await?;
        Ok(())
    }

    pub async fn verify(&self, session: &mut Session) -> Result<(), ApiError> {
        let request = self.request(Method::GET, "api/auth/verify", session)?;
        self.send(request, session).await?;
        Ok(())
    }

    pub async fn logout(&self, session: &mut Session) -> Result<(), ApiError> {
        let request = self.request(Method::GET, "api/auth/logout", session)?;
        self.send(request, session).await?;
        Ok(())
    }

    pub async fn create_note(
        &self,
        session: &mut Session,
        draft: &NoteDraft,
    ) -> Result<DocumentId, ApiError> {
        let request = self
            .request(Method::POST, "api/note/new", session)?
            .json(draft);
        let response = self.send(request, session).await?;
        parse_id(response).await
    }

    pub async fn get_note(&self, session: &mut Session, id: DocumentId) -> Result<Note, ApiError> {
        let request = self.request(Method::GET, &format!("api/note/{id}"), session)?;
        let response = self.send(request, session).await?;
        Ok(response.json().await?)
    }

    pub async fn update_note(
        &self,
        session: &mut Session,
        id: DocumentId,
        draft: &NoteDraft,
    ) -> Result<DocumentId, ApiError> {
        let request = self
            .request(Method::POST, &format!("api/note/{id}/update"), session)?
            .json(draft);
        let response = self.send(request, session).await?;
        parse_id(response).await
    }

    pub async fn delete_note(&self, session: &mut Session, id: DocumentId) -> Result<(), ApiError> {
        let request = self.request(Method::DELETE, &format!("api/note/{id}"), session)?;
        self.send(request, session).await?;
        Ok(())
    }

    pub async fn search_notes(
        &self,
        session: &mut Session,
        query: &str,
        count: usize,
    ) -> Result<Vec<Note>, ApiError> {
        let request = self
            .request(Method::GET, "api/note/search", session)?
            .query(&[("query", query.to_string()), ("count", count.to_string())]);
        let response = self.send(request, session).await?;
        Ok(response.json().await?)
    }

    pub async fn similar_notes(
        &self,
        session: &mut Session,
        id: DocumentId,
        count: usize,
    ) -> Result<Vec<Note>, ApiError> {
        let request = self
            .request(Method::GET, &format!("api/note/{id}/similar"), session)?
            .query(&[("count", count)]);
        let response = self.send(request, session).await?;
        Ok(response.json().await?)
    }
}

async fn parse_id(response: Response) -> Result<DocumentId, ApiError> {
    let text = response.text().await?;
    text.trim()
        .parse()
        .map_err(|_| ApiError::UnexpectedBody(format!("expected a note id, got {text:?}")))
}
