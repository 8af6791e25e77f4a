use crate::client::ApiError;
use crate::errors::AppError;
use crate::models::{DocumentId, NoteDraft, SubmitForm, ViewQuery};
use crate::routes::{ResolvedRoute, View};
use crate::session::{LoginState, Session};
use crate::state::AppState;
use crate::ui::{self, Frame};
use axum::{
    extract::{Query, State},
    http::{HeaderMap, StatusCode, Uri},
    response::{Html, IntoResponse, Redirect, Response},
    Form,
};
use tracing::{debug, warn};

/// Renders whichever view the route table resolves for the path.
pub async fn show(
    State(state): State<AppState>,
    uri: Uri,
    headers: HeaderMap,
    query: Option<Query<ViewQuery>>,
) -> Response {
    let route = state.routes().resolve(uri.path());
    debug!(path = uri.path(), view = ?route.view, "show");
    let mut session = Session::from_headers(&headers);
    let query = match query {
        Some(Query(query)) => query,
        None => {
            debug!("ignoring unparseable query string");
            ViewQuery::default()
        }
    };

    let result = match route.view {
        View::Landing => Ok(page(&state, &session, "Welcome", ui::render_landing(state.routes()))),
        View::Login => Ok(page(&state, &session, "Log in", ui::render_credentials_form("Log in", None))),
        View::Register => Ok(page(
            &state,
            &session,
            "Register",
            ui::render_credentials_form("Create account", None),
        )),
        View::Search => show_search(&state, &mut session, query.query.as_deref()).await,
        View::NewNote => show_new_note(&state, &mut session).await,
        View::SingleNote => show_note(&state, &mut session, &route).await,
        View::EditNote => show_edit_note(&state, &mut session, &route).await,
    };
    finish(&session, result)
}

/// Handles a form posted to a view's path.
pub async fn submit(
    State(state): State<AppState>,
    uri: Uri,
    headers: HeaderMap,
    form: Option<Form<SubmitForm>>,
) -> Response {
    let route = state.routes().resolve(uri.path());
    debug!(path = uri.path(), view = ?route.view, "submit");
    let mut session = Session::from_headers(&headers);
    let form = match form {
        Some(Form(form)) => form,
        None => {
            debug!("ignoring body that is not a form");
            SubmitForm::default()
        }
    };

    let result = match route.view {
        View::Login => submit_login(&state, &mut session, &form).await,
        View::Register => submit_register(&state, &mut session, &form).await,
        View::NewNote => submit_new_note(&state, &mut session, &form).await,
        View::EditNote => submit_edit_note(&state, &mut session, &route, &form).await,
        View::SingleNote => submit_delete_note(&state, &mut session, &route).await,
        View::Landing | View::Search => Err(AppError::method_not_allowed()),
    };
    finish(&session, result)
}

fn finish(session: &Session, result: Result<Response, AppError>) -> Response {
    match result {
        Ok(response) => session.respond(response),
        Err(err) => session.respond(err),
    }
}

fn page(state: &AppState, session: &Session, title: &str, content: String) -> Response {
    let frame = Frame {
        site: state.config().flavor.title(),
        routes: state.routes(),
        login: session.state(),
    };
    Html(ui::render_page(&frame, title, &content)).into_response()
}

fn recover(state: &AppState, err: ApiError) -> AppError {
    AppError::from_api(err, &state.routes().login_path())
}

fn note_id(route: &ResolvedRoute) -> Result<DocumentId, AppError> {
    let raw = route.param("id").unwrap_or_default();
    raw.parse()
        .map_err(|_| AppError::not_found(format!("no note with id {raw:?}")))
}

fn redirect_to(state: &AppState, name: &str, params: &[(&str, &str)]) -> Result<Response, AppError> {
    let path = state
        .routes()
        .path_for(name, params)
        .unwrap_or_else(|| state.routes().login_path());
    Ok(Redirect::to(&path).into_response())
}

async fn show_search(
    state: &AppState,
    session: &mut Session,
    query: Option<&str>,
) -> Result<Response, AppError> {
    let client = state.guarded_client();
    let query = query.map(str::trim).unwrap_or_default();
    let results = if query.is_empty() {
        client.verify(session).await.map_err(|err| recover(state, err))?;
        Vec::new()
    } else {
        client
            .search_notes(session, query, state.config().search_count)
            .await
            .map_err(|err| recover(state, err))?
    };
    let content = ui::render_search(state.routes(), query, &results);
    Ok(page(state, session, "Search", content))
}

async fn show_new_note(state: &AppState, session: &mut Session) -> Result<Response, AppError> {
    state
        .guarded_client()
        .verify(session)
        .await
        .map_err(|err| recover(state, err))?;
    let content = ui::render_note_form(&NoteDraft::default(), "Create");
    Ok(page(state, session, "New note", content))
}

async fn show_note(
    state: &AppState,
    session: &mut Session,
    route: &ResolvedRoute,
) -> Result<Response, AppError> {
    let id = note_id(route)?;
    let client = state.guarded_client();
    let note = client
        .get_note(session, id)
        .await
        .map_err(|err| recover(state, err))?;

    let similar = match client
        .similar_notes(session, id, state.config().similar_count)
        .await
    {
        Ok(notes) => notes,
        Err(ApiError::Unauthenticated) => return Err(recover(state, ApiError::Unauthenticated)),
        Err(err) => {
            warn!("similar notes unavailable for {id}: {err}");
            Vec::new()
        }
    };
    let similar: Vec<_> = similar.into_iter().filter(|other| other.id != id).collect();

    let body_html = match state.markdown() {
        Some(converter) => converter.make_html(&note.body),
        None => ui::render_plain_body(&note.body),
    };
    let content = ui::render_note(state.routes(), &note, &body_html, &similar);
    Ok(page(state, session, &note.title, content))
}

async fn show_edit_note(
    state: &AppState,
    session: &mut Session,
    route: &ResolvedRoute,
) -> Result<Response, AppError> {
    let id = note_id(route)?;
    let note = state
        .guarded_client()
        .get_note(session, id)
        .await
        .map_err(|err| recover(state, err))?;
    let draft = NoteDraft {
        title: note.title,
        body: note.body,
    };
    let content = ui::render_note_form(&draft, "Save");
    Ok(page(state, session, "Edit note", content))
}

async fn submit_login(
    state: &AppState,
    session: &mut Session,
    form: &SubmitForm,
) -> Result<Response, AppError> {
    let client = state.direct_client();

    if form.action.as_deref() == Some("logout") {
        if let Err(err) = client.logout(session).await {
            warn!("logout failed: {err}");
        }
        session.set_state(LoginState::LoggedOut);
        let content = ui::render_credentials_form("Log in", Some("You have been logged out."));
        return Ok(page(state, session, "Log in", content));
    }

    let username = form.username.as_deref().unwrap_or_default();
    let password = form.password.as_deref().unwrap_or_default();
    match client.login(session, username, password).await {
        Ok(()) => {
            session.set_state(LoginState::LoggedIn);
            redirect_to(state, "search", &[])
        }
        Err(ApiError::Status {
            status: StatusCode::UNAUTHORIZED,
            ..
        }) => {
            session.set_state(LoginState::LoggedOut);
            let content =
                ui::render_credentials_form("Log in", Some("Incorrect username or password."));
            Ok((StatusCode::UNAUTHORIZED, page(state, session, "Log in", content)).into_response())
        }
        Err(err) => Err(recover(state, err)),
    }
}

async fn submit_register(
    state: &AppState,
    session: &mut Session,
    form: &SubmitForm,
) -> Result<Response, AppError> {
    let username = form.username.as_deref().unwrap_or_default();
    let password = form.password.as_deref().unwrap_or_default();
    match state
        .direct_client()
        .register(session, username, password)
        .await
    {
        Ok(()) => redirect_to(state, "login", &[]),
        Err(ApiError::Status { status, message }) if status.is_client_error() => {
            let notice = if message.is_empty() {
                "That username is not available.".to_string()
            } else {
                message
            };
            let content = ui::render_credentials_form("Create account", Some(&notice));
            Ok((status, page(state, session, "Register", content)).into_response())
        }
        Err(err) => Err(recover(state, err)),
    }
}

async fn submit_new_note(
    state: &AppState,
    session: &mut Session,
    form: &SubmitForm,
) -> Result<Response, AppError> {
    let id = state
        .guarded_client()
        .create_note(session, &form.draft())
        .await
        .map_err(|err| recover(state, err))?;
    redirect_to(state, "single-note", &[("id", id.to_string().as_str())])
}

async fn submit_edit_note(
    state: &AppState,
    session: &mut Session,
    route: &ResolvedRoute,
    form: &SubmitForm,
) -> Result<Response, AppError> {
    let id = note_id(route)?;
    let new_id = state
        .guarded_client()
        .update_note(session, id, &form.draft())
        .await
        .map_err(|err| recover(state, err))?;
    redirect_to(state, "single-note", &[("id", new_id.to_string().as_str())])
}

async fn submit_delete_note(
    state: &AppState,
    session: &mut Session,
    route: &ResolvedRoute,
) -> Result<Response, AppError> {
    let id = note_id(route)?;
    state
        .guarded_client()
        .delete_note(session, id)
        .await
        .map_err(|err| recover(state, err))?;
    redirect_to(state, "search", &[])
}
