use crate::client::{ApiClient, Guard};
use crate::config::{Config, ConfigError};
use crate::markdown::MarkdownConverter;
use crate::routes::RouteTable;
use std::sync::Arc;

/// Collaborators shared by every view, built once at startup.
#[derive(Debug)]
struct Shell {
    config: Config,
    routes: RouteTable,
    direct: Arc<ApiClient>,
    guarded: Arc<ApiClient>,
    markdown: Option<Arc<MarkdownConverter>>,
}

#[derive(Clone, Debug)]
pub struct AppState {
    shell: Arc<Shell>,
}

impl AppState {
    pub fn new(config: Config) -> Result<Self, ConfigError> {
        let http = reqwest::Client::builder()
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .build()?;
        let routes = config.flavor.route_table(&config.base_path)?;
        let direct = Arc::new(ApiClient::new(http.clone(), config.api_url.clone(), Guard::Direct));
        let guarded = Arc::new(ApiClient::new(http, config.api_url.clone(), Guard::Session));
        let markdown = config
            .flavor
            .renders_markdown()
            .then(|| Arc::new(MarkdownConverter::new()));

        Ok(Self {
            shell: Arc::new(Shell {
                config,
                routes,
                direct,
                guarded,
                markdown,
            }),
        })
    }

    pub fn config(&self) -> &Config {
        &self.shell.config
    }

    pub fn routes(&self) -> &RouteTable {
        &self.shell.routes
    }

    /// Client whose failures never trigger a login redirect.
    pub fn direct_client(&self) -> &Arc<ApiClient> {
        &self.shell.direct
    }

    /// Client that reports an unauthorized backend as [`crate::client::ApiError::Unauthenticated`].
    pub fn guarded_client(&self) -> &Arc<ApiClient> {
        &self.shell.guarded
    }

    pub fn markdown(&self) -> Option<&Arc<MarkdownConverter>> {
        self.shell.markdown.as_ref()
    }
}
