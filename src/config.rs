use crate::routes::{RouteTable, RouteTableError};
use reqwest::Url;
use std::{env, str::FromStr};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{name} has an invalid value `{value}`")]
    Invalid { name: &'static str, value: String },
    #[error("NOTABLE_API_URL is not a usable base url: {0}")]
    ApiUrl(#[from] url::ParseError),
    #[error(transparent)]
    Routes(#[from] RouteTableError),
    #[error("could not build the backend http client: {0}")]
    HttpClient(#[from] reqwest::Error),
}

/// Which of the two client shells to serve.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flavor {
    Notable,
    Soash,
}

impl Flavor {
    pub fn route_table(self, base: &str) -> Result<RouteTable, RouteTableError> {
        match self {
            Flavor::Notable => RouteTable::notable(base),
            Flavor::Soash => RouteTable::soash(base),
        }
    }

    /// Only the notable shell ships a markdown converter.
    pub fn renders_markdown(self) -> bool {
        self == Flavor::Notable
    }

    pub fn title(self) -> &'static str {
        match self {
            Flavor::Notable => "Notable",
            Flavor::Soash => "Soash",
        }
    }
}

impl FromStr for Flavor {
    type Err = ();

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "notable" => Ok(Flavor::Notable),
            "soash" => Ok(Flavor::Soash),
            _ => Err(()),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub api_url: Url,
    pub flavor: Flavor,
    pub base_path: String,
    pub search_count: usize,
    pub similar_count: usize,
}

const DEFAULT_API_URL: &str = "http://127.0.0.1:8000/";

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let api_url = lookup("NOTABLE_API_URL").unwrap_or_else(|| DEFAULT_API_URL.to_string());

        Ok(Self {
            port: parse_or("PORT", &lookup, 8080)?,
            api_url: parse_base_url(&api_url)?,
            flavor: parse_or("NOTABLE_FLAVOR", &lookup, Flavor::Soash)?,
            base_path: lookup("NOTABLE_BASE_PATH").unwrap_or_else(|| "/".to_string()),
            search_count: parse_or("NOTABLE_SEARCH_COUNT", &lookup, 10)?,
            similar_count: parse_or("NOTABLE_SIMILAR_COUNT", &lookup, 5)?,
        })
    }
}

fn parse_or<T: FromStr>(
    name: &'static str,
    lookup: &impl Fn(&str) -> Option<String>,
    default: T,
) -> Result<T, ConfigError> {
    match lookup(name) {
        None => Ok(default),
        Some(value) => value
            .trim()
            .parse()
            .map_err(|_| ConfigError::Invalid { name, value }),
    }
}

/// Joins resolve relative to the last `/`, so the base always ends with one.
fn parse_base_url(raw: &str) -> Result<Url, url::ParseError> {
    let raw = raw.trim();
    if raw.ends_with('/') {
        Url::parse(raw)
    } else {
        Url::parse(&format!("{raw}/"))
    }
}
