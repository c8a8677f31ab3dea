use reqwest::Client;
use reqwest::header::CONTENT_TYPE;
use reqwest::header::HeaderValue;
use thiserror::Error;
use url::Url;

use crate::config::Config;
use crate::config::ConfigError;
use crate::request::Body;
use crate::request::RequestSpec;
use crate::response::CapturedResponse;

#[derive(Error, Debug)]
pub enum HarnessError {
    #[error("request to {url} could not complete: {source}")]
    Network {
        url: Url,
        #[source]
        source: reqwest::Error,
    },

    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl HarnessError {
    pub fn is_network(&self) -> bool {
        matches!(self, HarnessError::Network { .. })
    }
}

/// Sends single requests against one configured base URL.
///
/// The base URL is fixed when the harness is built. Cloning a harness shares
/// the underlying connection pool.
#[derive(Debug, Clone)]
pub struct Harness {
    config: Config,
    client: Client,
}

impl Harness {
    pub fn configure(base_url: &str) -> Result<Self, ConfigError> {
        Ok(Self::with_config(Config::new(base_url)?))
    }

    pub fn with_config(config: Config) -> Self {
        Self {
            config,
            client: Client::new(),
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// The absolute URL `spec` will be sent to.
    pub fn target(&self, spec: &RequestSpec) -> Result<Url, ConfigError> {
        let mut url = self.config.resolve(&spec.path)?;

        if !spec.query.is_empty() {
            url.query_pairs_mut().extend_pairs(&spec.query);
        }

        Ok(url)
    }

    /// Sends `spec` and reads the whole response.
    ///
    /// A structured body is serialized as JSON. When a body is sent and no
    /// `Content-Type` was given, `application/json` is used.
    ///
    /// # Errors
    /// `HarnessError::Network` when the exchange could not complete, including
    /// a body that could not be read. Status codes are never errors here.
    pub async fn send(&self, spec: &RequestSpec) -> Result<CapturedResponse, HarnessError> {
        let url = self.target(spec)?;

        let request = self
            .client
            .request(spec.method.into(), url.clone())
            .headers(spec.headers.clone());

        let request = match &spec.body {
            Some(Body::Json(body)) => request.json(body),
            Some(Body::Raw(body)) if !spec.headers.contains_key(CONTENT_TYPE) => request
                .header(CONTENT_TYPE, HeaderValue::from_static("application/json"))
                .body(body.clone()),
            Some(Body::Raw(body)) => request.body(body.clone()),
            None => request,
        };

        let network = |source| HarnessError::Network {
            url: url.clone(),
            source,
        };

        let resp = request.send().await.map_err(network)?;
        CapturedResponse::from_response(resp)
            .await
            .map_err(network)
    }
}
