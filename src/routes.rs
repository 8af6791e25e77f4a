use std::collections::BTreeMap;
use thiserror::Error;

/// The page a route renders.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum View {
    Landing,
    Search,
    Login,
    Register,
    NewNote,
    SingleNote,
    EditNote,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Static(String),
    Param(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Pattern {
    Segments(Vec<Segment>),
    CatchAll,
}

impl Pattern {
    fn parse(path: &str) -> Self {
        if path == "*" {
            return Pattern::CatchAll;
        }
        let segments = split_path(path)
            .map(|segment| match segment.strip_prefix(':') {
                Some(name) => Segment::Param(name.to_string()),
                None => Segment::Static(segment.to_string()),
            })
            .collect();
        Pattern::Segments(segments)
    }

    fn matches(&self, path: &str) -> Option<BTreeMap<String, String>> {
        let segments = match self {
            Pattern::CatchAll => return Some(BTreeMap::new()),
            Pattern::Segments(segments) => segments,
        };

        let parts: Vec<&str> = split_path(path).collect();
        if parts.len() != segments.len() {
            return None;
        }

        let mut params = BTreeMap::new();
        for (segment, part) in segments.iter().zip(parts) {
            match segment {
                Segment::Static(text) => {
                    if !text.eq_ignore_ascii_case(part) {
                        return None;
                    }
                }
                Segment::Param(name) => {
                    if part.is_empty() {
                        return None;
                    }
                    let value = urlencoding::decode(part).ok()?;
                    params.insert(name.clone(), value.into_owned());
                }
            }
        }
        Some(params)
    }
}

/// One leading and one trailing slash are optional; any other empty segment is kept
/// so that paths such as `//search` do not match.
fn split_path(path: &str) -> impl Iterator<Item = &str> {
    let path = path.strip_prefix('/').unwrap_or(path);
    let path = path.strip_suffix('/').unwrap_or(path);
    (!path.is_empty())
        .then(|| path.split('/'))
        .into_iter()
        .flatten()
}

#[derive(Debug, Clone)]
pub struct Route {
    pub name: Option<&'static str>,
    pub path: &'static str,
    pub view: View,
    pattern: Pattern,
}

impl Route {
    pub fn named(name: &'static str, path: &'static str, view: View) -> Self {
        Self {
            name: Some(name),
            path,
            view,
            pattern: Pattern::parse(path),
        }
    }

    pub fn fallback(view: View) -> Self {
        Self {
            name: None,
            path: "*",
            view,
            pattern: Pattern::CatchAll,
        }
    }

    fn is_catch_all(&self) -> bool {
        self.pattern == Pattern::CatchAll
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RouteTableError {
    #[error("route name `{0}` is declared more than once")]
    DuplicateName(&'static str),
    #[error("the catch-all route must be the last entry")]
    CatchAllNotLast,
    #[error("a catch-all route is required")]
    MissingCatchAll,
    #[error("no route is named `{0}`")]
    MissingRoute(&'static str),
}

/// The outcome of resolving a browser path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedRoute {
    pub name: Option<&'static str>,
    pub view: View,
    pub params: BTreeMap<String, String>,
}

impl ResolvedRoute {
    pub fn param(&self, name: &str) -> Option<&str> {
        self.params.get(name).map(String::as_str)
    }
}

/// Ordered, immutable mapping from paths to views.
#[derive(Debug, Clone)]
pub struct RouteTable {
    base: String,
    routes: Vec<Route>,
}

impl RouteTable {
    /// Validates the table: names are unique and exactly one catch-all closes it.
    /// A `login` route is required since every guard redirect targets it.
    pub fn new(base: &str, routes: Vec<Route>) -> Result<Self, RouteTableError> {
        let mut seen = Vec::new();
        for (index, route) in routes.iter().enumerate() {
            if let Some(name) = route.name {
                if seen.contains(&name) {
                    return Err(RouteTableError::DuplicateName(name));
                }
                seen.push(name);
            }
            if route.is_catch_all() && index + 1 != routes.len() {
                return Err(RouteTableError::CatchAllNotLast);
            }
        }
        if !routes.last().is_some_and(Route::is_catch_all) {
            return Err(RouteTableError::MissingCatchAll);
        }
        if !seen.contains(&"login") {
            return Err(RouteTableError::MissingRoute("login"));
        }

        Ok(Self {
            base: normalize_base(base),
            routes,
        })
    }

    pub fn notable(base: &str) -> Result<Self, RouteTableError> {
        Self::new(
            base,
            vec![
                Route::named("search", "/search", View::Search),
                Route::named("login", "/login", View::Login),
                Route::named("new-note", "/note/new", View::NewNote),
                Route::named("single-note", "/note/:id", View::SingleNote),
                Route::fallback(View::Login),
            ],
        )
    }

    pub fn soash(base: &str) -> Result<Self, RouteTableError> {
        Self::new(
            base,
            vec![
                Route::named("landing", "/", View::Landing),
                Route::named("search", "/search", View::Search),
                Route::named("login", "/login", View::Login),
                Route::named("register", "/register", View::Register),
                Route::named("new-note", "/note/new", View::NewNote),
                Route::named("edit-note", "/note/:id/edit", View::EditNote),
                Route::named("single-note", "/note/:id", View::SingleNote),
                Route::fallback(View::Login),
            ],
        )
    }

    pub fn routes(&self) -> &[Route] {
        &self.routes
    }

    pub fn has(&self, name: &str) -> bool {
        self.routes.iter().any(|route| route.name == Some(name))
    }

    /// Resolves a request path (query string allowed) to the first matching route.
    pub fn resolve(&self, path: &str) -> ResolvedRoute {
        let path = path.split(['?', '#']).next().unwrap_or_default();
        if let Some(relative) = self.strip_base(path) {
            for route in self.routes.iter().filter(|route| !route.is_catch_all()) {
                if let Some(params) = route.pattern.matches(relative) {
                    return ResolvedRoute {
                        name: route.name,
                        view: route.view,
                        params,
                    };
                }
            }
        }

        let fallback = self.routes.last().map_or(View::Login, |route| route.view);
        ResolvedRoute {
            name: None,
            view: fallback,
            params: BTreeMap::new(),
        }
    }

    /// Builds the browser path of a named route, percent-encoding parameters.
    pub fn path_for(&self, name: &str, params: &[(&str, &str)]) -> Option<String> {
        let route = self.routes.iter().find(|route| route.name == Some(name))?;
        let Pattern::Segments(segments) = &route.pattern else {
            return None;
        };

        let mut path = self.base.trim_end_matches('/').to_string();
        for segment in segments {
            path.push('/');
            match segment {
                Segment::Static(text) => path.push_str(text),
                Segment::Param(param) => {
                    let (_, value) = params.iter().find(|(key, _)| key == param)?;
                    path.push_str(&urlencoding::encode(value));
                }
            }
        }
        if path.is_empty() {
            path.push('/');
        }
        Some(path)
    }

    /// Path of the login route; the table constructor guarantees it exists.
    pub fn login_path(&self) -> String {
        self.path_for("login", &[])
            .unwrap_or_else(|| format!("{}login", self.base))
    }

    fn strip_base<'a>(&self, path: &'a str) -> Option<&'a str> {
        if self.base == "/" {
            return Some(path);
        }
        let trimmed = self.base.trim_end_matches('/');
        let rest = path.strip_prefix(trimmed)?;
        if rest.is_empty() || rest.starts_with('/') {
            Some(rest)
        } else {
            None
        }
    }
}

fn normalize_base(base: &str) -> String {
    let trimmed = base.trim().trim_matches('/');
    if trimmed.is_empty() {
        "/".to_string()
    } else {
        format!("/{trimmed}/")
    }
}
