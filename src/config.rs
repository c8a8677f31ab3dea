use thiserror::Error;
use url::Url;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid base URL `{url}`: {reason}")]
    InvalidBaseUrl { url: String, reason: String },

    #[error("could not resolve `{path}` against `{base}`: {reason}")]
    InvalidTarget {
        base: String,
        path: String,
        reason: String,
    },
}

/// The base URL every request is resolved against.
///
/// Set once when the harness is built and never changed afterwards. The stored
/// value never ends with a `/`, so joining it with a path that always starts
/// with one yields exactly one separator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    base_url: String,
}

impl Config {
    pub fn new(base_url: &str) -> Result<Self, ConfigError> {
        let invalid = |reason: &str| ConfigError::InvalidBaseUrl {
            url: base_url.to_string(),
            reason: reason.to_string(),
        };

        let trimmed = base_url.trim();
        let parsed = Url::parse(trimmed).map_err(|e| invalid(&e.to_string()))?;

        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(invalid("scheme must be http or https"));
        }
        if parsed.host_str().is_none() {
            return Err(invalid("missing host"));
        }
        if parsed.query().is_some() || parsed.fragment().is_some() {
            return Err(invalid("base URL can't carry a query or fragment"));
        }

        Ok(Self {
            base_url: trimmed.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Joins the base URL and `path` into the absolute request target.
    pub fn resolve(&self, path: &str) -> Result<Url, ConfigError> {
        let path = path.trim();
        let joined = format!("{}/{}", self.base_url, path.trim_start_matches('/'));

        Url::parse(&joined).map_err(|e| ConfigError::InvalidTarget {
            base: self.base_url.clone(),
            path: path.to_string(),
            reason: e.to_string(),
        })
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn joins_without_double_or_missing_slashes() {
        let cases = [
            ("https://reqres.in", "/api/users"),
            ("https://reqres.in/", "/api/users"),
            ("https://reqres.in", "api/users"),
            ("https://reqres.in/", "api/users"),
            ("https://reqres.in///", "/api/users"),
            ("https://reqres.in", "//api/users"),
            ("https://reqres.in/", "///api/users"),
        ];

        for (base, path) in cases {
            let config = Config::new(base).unwrap();
            let url = config.resolve(path).unwrap();
            assert_eq!(url.as_str(), "https://reqres.in/api/users", "{base} + {path}");
        }
    }

    #[test]
    fn keeps_base_path_prefix() {
        let config = Config::new("http://localhost:8080/v1/").unwrap();
        let url = config.resolve("/users/2").unwrap();

        assert_eq!(url.as_str(), "http://localhost:8080/v1/users/2");
        assert_eq!(config.base_url(), "http://localhost:8080/v1");
    }

    #[test]
    fn path_query_is_preserved() {
        let config = Config::new("https://reqres.in").unwrap();
        let url = config.resolve("/api/users?page=2").unwrap();

        assert_eq!(url.path(), "/api/users");
        assert_eq!(url.query(), Some("page=2"));
    }

    #[test]
    fn rejects_bad_base_urls() {
        for base in ["reqres.in", "ftp://reqres.in", "https://reqres.in?x=1", ""] {
            assert!(
                matches!(Config::new(base), Err(ConfigError::InvalidBaseUrl { .. })),
                "{base} should be rejected"
            );
        }
    }
}
