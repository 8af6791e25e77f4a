use axum::http::{HeaderMap, HeaderValue, header};
use std::collections::BTreeMap;
use tracing::warn;

pub const SESSION_COOKIE_NAME: &str = "session-token";

/// Cookies of one browser request, plus the `Set-Cookie` values the backend
/// issued while the request was being served.
#[derive(Debug, Clone, Default)]
pub struct Cookies {
    values: BTreeMap<String, String>,
    issued: Vec<String>,
}

impl Cookies {
    pub fn from_headers(headers: &HeaderMap) -> Self {
        let mut values = BTreeMap::new();
        for raw in headers.get_all(header::COOKIE) {
            let Ok(raw) = raw.to_str() else {
                continue;
            };
            for pair in raw.split(';') {
                if let Some((name, value)) = split_pair(pair) {
                    values.insert(name.to_string(), value.to_string());
                }
            }
        }
        Self {
            values,
            issued: Vec::new(),
        }
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.values.get(name).map(String::as_str)
    }

    pub fn session_token(&self) -> Option<&str> {
        self.get(SESSION_COOKIE_NAME).filter(|token| !token.is_empty())
    }

    /// `Cookie` header to forward to the backend.
    pub fn header_value(&self) -> Option<String> {
        if self.values.is_empty() {
            return None;
        }
        let joined = self
            .values
            .iter()
            .map(|(name, value)| format!("{name}={value}"))
            .collect::<Vec<_>>()
            .join("; ");
        Some(joined)
    }

    /// Applies a backend `Set-Cookie` to later backend calls and queues it for the browser.
    pub fn record_set_cookie(&mut self, raw: &str) {
        let mut parts = raw.split(';');
        let Some((name, value)) = parts.next().and_then(split_pair) else {
            warn!("ignoring malformed set-cookie from backend");
            return;
        };
        let expired = value.is_empty()
            || parts.any(|attr| {
                attr.trim()
                    .split_once('=')
                    .is_some_and(|(key, val)| key.eq_ignore_ascii_case("max-age") && val.trim() == "0")
            });
        if expired {
            self.values.remove(name);
        } else {
            self.values.insert(name.to_string(), value.to_string());
        }
        self.issued.push(raw.to_string());
    }

    pub fn issued(&self) -> &[String] {
        &self.issued
    }

    /// Relays every issued cookie to the browser.
    pub fn apply(&self, headers: &mut HeaderMap) {
        for raw in &self.issued {
            match HeaderValue::from_str(raw) {
                Ok(value) => {
                    headers.append(header::SET_COOKIE, value);
                }
                Err(err) => warn!("dropping unrelayable set-cookie: {err}"),
            }
        }
    }
}

fn split_pair(pair: &str) -> Option<(&str, &str)> {
    let (name, value) = pair.trim().split_once('=')?;
    let name = name.trim();
    if name.is_empty() {
        return None;
    }
    Some((name, value.trim().trim_matches('"')))
}
