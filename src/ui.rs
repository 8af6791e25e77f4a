use crate::models::{Note, NoteDraft};
use crate::routes::RouteTable;
use crate::session::LoginState;
use axum::http::StatusCode;

/// Everything the page frame needs besides the view's own markup.
pub struct Frame<'a> {
    pub site: &'a str,
    pub routes: &'a RouteTable,
    pub login: LoginState,
}

pub fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(ch),
        }
    }
    out
}

pub fn render_page(frame: &Frame<'_>, title: &str, content: &str) -> String {
    let site = escape(frame.site);
    let title = escape(title);
    let nav = render_nav(frame);
    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="UTF-8" />
  <meta name="viewport" content="width=device-width, initial-scale=1.0" />
  <title>{title} · {site}</title>
  <style>{STYLE}</style>
</head>
<body>
  <header><strong>{site}</strong>{nav}</header>
  <main>
    <h1>{title}</h1>
{content}
  </main>
</body>
</html>
"#
    )
}

fn render_nav(frame: &Frame<'_>) -> String {
    let routes = frame.routes;
    let mut links = Vec::new();
    let mut push = |name: &str, label: &str| {
        if let Some(path) = routes.path_for(name, &[]) {
            links.push(format!(r#"<a href="{}">{label}</a>"#, escape(&path)));
        }
    };

    push("landing", "Home");
    if frame.login != LoginState::LoggedOut {
        push("search", "Search");
        push("new-note", "New note");
    }
    if frame.login != LoginState::LoggedIn {
        push("login", "Log in");
        push("register", "Register");
    }
    if frame.login != LoginState::LoggedOut {
        links.push(format!(
            r#"<form method="post" action="{}"><input type="hidden" name="action" value="logout" /><button type="submit">Log out</button></form>"#,
            escape(&routes.login_path())
        ));
    }

    format!("<nav>{}</nav>", links.join(""))
}

pub fn render_landing(routes: &RouteTable) -> String {
    let link = |name: &str, label: &str| {
        routes
            .path_for(name, &[])
            .map(|path| format!(r#"<li><a href="{}">{label}</a></li>"#, escape(&path)))
            .unwrap_or_default()
    };
    format!(
        "    <p>Take notes, find them again.</p>\n    <ul>{}{}{}</ul>\n",
        link("login", "Log in"),
        link("register", "Create an account"),
        link("search", "Search your notes"),
    )
}

pub fn render_credentials_form(submit: &str, notice: Option<&str>) -> String {
    let notice = notice
        .map(|text| format!(r#"    <p class="notice">{}</p>"#, escape(text)))
        .unwrap_or_default();
    format!(
        r#"{notice}
    <form method="post">
      <label>Username <input name="username" autocomplete="username" required /></label>
      <label>Password <input name="password" type="password" required /></label>
      <button type="submit">{submit}</button>
    </form>
"#
    )
}

pub fn render_search(routes: &RouteTable, query: &str, results: &[Note]) -> String {
    let mut out = format!(
        r#"    <form method="get">
      <input name="query" value="{}" placeholder="Search notes" autofocus />
      <button type="submit">Search</button>
    </form>
"#,
        escape(query)
    );

    if !query.is_empty() {
        if results.is_empty() {
            out.push_str("    <p>No notes matched.</p>\n");
        } else {
            out.push_str(&render_note_list(routes, results));
        }
    }
    out
}

fn render_note_list(routes: &RouteTable, notes: &[Note]) -> String {
    let items: String = notes
        .iter()
        .map(|note| {
            let id = note.id.to_string();
            let title = if note.title.trim().is_empty() {
                "(untitled)"
            } else {
                note.title.as_str()
            };
            match routes.path_for("single-note", &[("id", id.as_str())]) {
                Some(path) => format!(
                    r#"<li><a href="{}">{}</a></li>"#,
                    escape(&path),
                    escape(title)
                ),
                None => format!("<li>{}</li>", escape(title)),
            }
        })
        .collect();
    format!("    <ul class=\"notes\">{items}</ul>\n")
}

pub fn render_note_form(draft: &NoteDraft, submit: &str) -> String {
    format!(
        r#"    <form method="post">
      <label>Title <input name="title" value="{}" required /></label>
      <label>Body <textarea name="body" rows="16">{}</textarea></label>
      <button type="submit">{submit}</button>
    </form>
"#,
        escape(&draft.title),
        escape(&draft.body)
    )
}

/// `body_html` is already safe markup.
pub fn render_note(routes: &RouteTable, note: &Note, body_html: &str, similar: &[Note]) -> String {
    let id = note.id.to_string();
    let mut out = format!("    <article>{body_html}</article>\n");

    if let Some(path) = routes.path_for("edit-note", &[("id", id.as_str())]) {
        out.push_str(&format!(
            "    <p><a href=\"{}\">Edit</a></p>\n",
            escape(&path)
        ));
    }
    out.push_str(
        r#"    <form method="post"><button type="submit">Delete</button></form>
"#,
    );

    if !similar.is_empty() {
        out.push_str("    <h2>Similar notes</h2>\n");
        out.push_str(&render_note_list(routes, similar));
    }
    out
}

pub fn render_plain_body(body: &str) -> String {
    format!("<pre>{}</pre>", escape(body))
}

pub fn render_error(status: StatusCode, message: &str) -> String {
    let reason = status.canonical_reason().unwrap_or("Error");
    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="UTF-8" />
  <title>{code} {reason}</title>
  <style>{STYLE}</style>
</head>
<body>
  <main>
    <h1>{code} {reason}</h1>
    <p>{message}</p>
    <p><a href="javascript:history.back()">Go back</a></p>
  </main>
</body>
</html>
"#,
        code = status.as_u16(),
        message = escape(message),
    )
}

const STYLE: &str = r#"
    :root { --ink: #2b2a28; --accent: #2f4858; --card: #fffdf8; }
    * { box-sizing: border-box; }
    body { margin: 0; font-family: "Trebuchet MS", sans-serif; color: var(--ink); background: #f8f3e6; }
    header { display: flex; gap: 16px; align-items: center; padding: 12px 24px; background: var(--accent); color: #fff; }
    nav { display: flex; gap: 12px; align-items: center; }
    nav a { color: #fff; }
    nav form { margin: 0; }
    main { max-width: 760px; margin: 24px auto; padding: 24px; background: var(--card); border-radius: 12px; }
    label { display: block; margin-bottom: 12px; }
    input, textarea { width: 100%; padding: 8px; font: inherit; }
    .notice { color: #b23a2b; }
"#;
