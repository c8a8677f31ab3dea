use std::collections::HashSet;

use miette::Diagnostic;
use miette::NamedSource;
use miette::SourceSpan;
use reqwest::header::HeaderMap;
use thiserror::Error;

mod parser_assertion;

use crate::asserter::Assertion;
use crate::config::Config;
use crate::parser;
use crate::parser::Suite;
use crate::request::Body;
use crate::request::HttpMethod;
use crate::request::RequestSpec;

pub struct Validator {
    suite: Suite,
    toml_src: String,
    file_name: String,
}

/// The validated suite, ready to run.
#[derive(Debug)]
pub struct IR {
    pub tests: Vec<ValidatedTest>,
}

#[derive(Debug, Clone)]
pub struct ValidatedTest {
    pub name: String,
    pub request: RequestSpec,
    pub assertions: Vec<Assertion>,
}

#[derive(Debug, Error, Diagnostic)]
#[error("Invalid field `{field}`: {message}")]
pub struct ValidationError {
    field: String,
    message: String,
    #[source_code]
    src: Option<NamedSource<String>>,
    #[label("invalid value here")]
    span: Option<SourceSpan>,
}

impl ValidationError {
    pub fn field(&self) -> &str {
        &self.field
    }
}

macro_rules! validation_err {
    ($field:expr, $msg:expr, $self:expr, $snippet:expr) => {
        ValidationError {
            field: $field.to_string(),
            message: $msg.to_string(),
            src: Some(NamedSource::new(
                $self.file_name.clone(),
                $self.toml_src.clone(),
            )),
            span: find_span($snippet, &$self.toml_src),
        }
    };
}

impl Validator {
    pub fn new(suite: &Suite, toml_src: &str, file_name: &str) -> Self {
        Self {
            suite: suite.clone(),
            toml_src: toml_src.into(),
            file_name: file_name.into(),
        }
    }

    /// Replaces the suite's base URL, e.g. to point it at a local server.
    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.suite.setup.base_url = base_url.to_string();
        self
    }

    pub fn validate(&mut self) -> miette::Result<(IR, Config), ValidationError> {
        let config = self.validate_setup()?;
        let tests = self.validate_tests(&config)?;

        Ok((tests, config))
    }

    fn validate_setup(&self) -> Result<Config, ValidationError> {
        let base_url = &self.suite.setup.base_url;

        Config::new(base_url)
            .map_err(|e| validation_err!("setup.base_url", e, self, base_url.as_str()))
    }

    fn validate_tests(&self, config: &Config) -> Result<IR, ValidationError> {
        let mut seen = HashSet::new();
        for test in &self.suite.tests {
            if !seen.insert(test.name.as_str()) {
                return Err(validation_err!(
                    format!("{} - name", test.name),
                    "Test names must be unique",
                    self,
                    &test.name
                ));
            }
        }

        let src = (self.file_name.clone(), self.toml_src.clone());

        // Start with the global headers if defined. The headers from the
        // individual test are merged on top, the test header wins.
        let global_headers = match self.suite.global.as_ref().and_then(|g| g.headers.as_ref()) {
            Some(value) => parser_assertion::parse_header_map(value, Some(&src))?,
            None => HeaderMap::new(),
        };

        let tests = self
            .suite
            .tests
            .iter()
            .map(|test| self.create_test(test, &src, config, &global_headers))
            .collect::<Result<Vec<_>, ValidationError>>()?;

        Ok(IR { tests })
    }

    fn create_test(
        &self,
        test: &parser::Test,
        src: &(String, String),
        config: &Config,
        global_headers: &HeaderMap,
    ) -> Result<ValidatedTest, ValidationError> {
        let method = test.method.parse::<HttpMethod>().map_err(|e| {
            validation_err!(format!("{} - method", test.name), e, self, &test.method)
        })?;

        config.resolve(&test.url).map_err(|e| {
            validation_err!(format!("{} - url", test.name), e, self, &test.url)
        })?;

        let mut request = RequestSpec::new(method, test.url.clone()).headers(global_headers.clone());

        if let Some(header_value) = &test.headers {
            let test_headers = parser_assertion::parse_header_map(header_value, Some(src))?;
            request = request.headers(test_headers);
        }

        if let Some(query) = &test.query {
            request.query = parser_assertion::parse_query(query, Some(src))?;
        }

        request.body = test.body.clone().map(|body| match body {
            serde_json::Value::String(raw) => Body::Raw(raw),
            json => Body::Json(json),
        });

        let assertions = parser_assertion::parse_assertions(
            &test.assert_status,
            &test.assert_headers,
            &test.assert_fields,
            &test.assert_empty_body,
            Some((src.0.as_str(), src.1.as_str())),
        )?;

        Ok(ValidatedTest {
            name: test.name.clone(),
            request,
            assertions,
        })
    }
}

fn find_span(needle: &str, toml_src: &str) -> Option<SourceSpan> {
    let pattern = format!("\"{}\"", needle);
    toml_src
        .find(&pattern)
        .map(|start| SourceSpan::new(start.into(), pattern.len()))
}
