use core::fmt;
use std::fmt::Display;
use std::sync::Arc;

use reqwest::header::HeaderMap;
use reqwest::header::HeaderName;
use serde_json::Value;
use thiserror::Error;

use crate::json_path::JsonPath;
use crate::json_path::PathSyntaxError;
use crate::json_path::string_form;
use crate::response::CapturedResponse;
use crate::runner::RunnerResult;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum AssertionError {
    #[error("expected status {expected}, got {actual}")]
    StatusMismatch { expected: u16, actual: u16 },

    #[error("field `{path}`: expected {expected}, got {actual}")]
    FieldMismatch {
        path: String,
        expected: Value,
        actual: Value,
    },

    #[error("field `{path}` is not present in the response body")]
    PathUnresolved { path: String },

    #[error(transparent)]
    PathSyntax(#[from] PathSyntaxError),

    #[error("header `{name}`: expected {expected:?}, got {actual:?}")]
    HeaderMismatch {
        name: String,
        expected: String,
        actual: Option<String>,
    },

    #[error("expected an empty body, got {body:?}")]
    BodyNotEmpty { body: String },
}

impl AssertionError {
    /// True when the failure is about a field that could not be found rather
    /// than a value that differs.
    pub fn is_unresolved(&self) -> bool {
        matches!(self, AssertionError::PathUnresolved { .. })
    }
}

/// Fails unless the response carries `expected` as its status code.
pub fn assert_status(response: &CapturedResponse, expected: u16) -> Result<(), AssertionError> {
    let actual = response.status_code();
    if actual != expected {
        return Err(AssertionError::StatusMismatch { expected, actual });
    }

    Ok(())
}

/// Resolves `path` in the JSON body and fails unless it equals `expected`.
///
/// Scalars also match when their string forms are the same, so
/// `assert_field(&resp, "id", "4")` passes for `{"id": 4}` and
/// `assert_field(&resp, "id", 4)` passes for `{"id": "4"}`.
pub fn assert_field(
    response: &CapturedResponse,
    path: &str,
    expected: impl Into<Value>,
) -> Result<(), AssertionError> {
    let path = JsonPath::parse(path)?;
    assert_json_path(response, &path, &expected.into())
}

pub fn assert_json_path(
    response: &CapturedResponse,
    path: &JsonPath,
    expected: &Value,
) -> Result<(), AssertionError> {
    let unresolved = || AssertionError::PathUnresolved {
        path: path.to_string(),
    };

    let body = response.body_json.as_ref().ok_or_else(unresolved)?;
    let actual = path.resolve(body).ok_or_else(unresolved)?;

    if !field_matches(expected, &actual) {
        return Err(AssertionError::FieldMismatch {
            path: path.to_string(),
            expected: expected.clone(),
            actual,
        });
    }

    Ok(())
}

fn field_matches(expected: &Value, actual: &Value) -> bool {
    if expected == actual {
        return true;
    }

    is_scalar(expected) && is_scalar(actual) && string_form(expected) == string_form(actual)
}

fn is_scalar(value: &Value) -> bool {
    matches!(value, Value::String(_) | Value::Number(_) | Value::Bool(_))
}

pub fn assert_header(
    response: &CapturedResponse,
    name: &str,
    expected: &str,
) -> Result<(), AssertionError> {
    let actual = HeaderName::from_bytes(name.as_bytes())
        .ok()
        .and_then(|key| response.headers.get(key))
        .map(|v| v.to_str().unwrap_or("<invalid utf8>").to_string());

    if actual.as_deref() != Some(expected) {
        return Err(AssertionError::HeaderMismatch {
            name: name.to_string(),
            expected: expected.to_string(),
            actual,
        });
    }

    Ok(())
}

fn assert_headers(response: &CapturedResponse, expected: &HeaderMap) -> Result<(), AssertionError> {
    for (key, value) in expected {
        assert_header(
            response,
            key.as_str(),
            value.to_str().unwrap_or("<invalid utf8>"),
        )?;
    }

    Ok(())
}

pub fn assert_empty_body(response: &CapturedResponse) -> Result<(), AssertionError> {
    if !response.body_text.trim().is_empty() {
        return Err(AssertionError::BodyNotEmpty {
            body: response.body_text.clone(),
        });
    }

    Ok(())
}

/// A validated expectation attached to a test case.
#[derive(Debug, Clone)]
pub enum Assertion {
    Status(u16),
    Headers(HeaderMap),
    Field { path: JsonPath, expected: Value },
    EmptyBody,
}

impl Assertion {
    pub fn check(&self, response: &CapturedResponse) -> Result<(), AssertionError> {
        match self {
            Assertion::Status(expected) => assert_status(response, *expected),
            Assertion::Headers(expected) => assert_headers(response, expected),
            Assertion::Field { path, expected } => assert_json_path(response, path, expected),
            Assertion::EmptyBody => assert_empty_body(response),
        }
    }
}

#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum TestResult {
    Pass,
    Fail,
    Error,
}

#[derive(Debug, Clone)]
pub struct AssertResult {
    pub status: TestResult,
    pub expected: Assertion,
    pub failure: Option<AssertionError>,
}

/// Everything the outputter needs to know about one finished test.
#[derive(Debug, Clone)]
pub struct TestReport {
    pub name: String,
    pub method: String,
    pub path: String,
    pub status: TestResult,
    pub results: Arc<[AssertResult]>,
    pub error: Option<String>,
}

pub trait Assert {
    fn assert(&self) -> TestReport;
}

impl Assert for RunnerResult {
    fn assert(&self) -> TestReport {
        let path = match self.url.query() {
            Some(query) => format!("{}?{}", self.url.path(), query),
            None => self.url.path().to_string(),
        };

        let response = match &self.response {
            Ok(response) => response,
            Err(error) => {
                return TestReport {
                    name: self.name.clone(),
                    method: self.method.clone(),
                    path,
                    status: TestResult::Error,
                    results: Arc::from([]),
                    error: Some(error.to_string()),
                };
            }
        };

        let results: Arc<[AssertResult]> = self
            .assertions
            .iter()
            .map(|a| match a.check(response) {
                Ok(()) => AssertResult {
                    status: TestResult::Pass,
                    expected: a.clone(),
                    failure: None,
                },
                Err(failure) => AssertResult {
                    status: TestResult::Fail,
                    expected: a.clone(),
                    failure: Some(failure),
                },
            })
            .collect();

        let status = if results.iter().all(|r| r.status == TestResult::Pass) {
            TestResult::Pass
        } else {
            TestResult::Fail
        };

        TestReport {
            name: self.name.clone(),
            method: self.method.clone(),
            path,
            status,
            results,
            error: None,
        }
    }
}

impl Display for AssertResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (&self.status, &self.failure) {
            (TestResult::Pass, _) | (_, None) => {
                write!(
                    f,
                    "{} {} {}",
                    console::style("✔").green().bold(),
                    console::style("PASS!").green().bold(),
                    self.expected
                )
            }

            (_, Some(AssertionError::StatusMismatch { expected, actual })) => {
                write!(
                    f,
                    "{} {}\n  Expected: {}\n  Actual:   {}",
                    console::style("✘").red().bold(),
                    console::style("FAIL!").red().bold(),
                    console::style(format!("Expected status {}", expected)).green(),
                    console::style(format!("Got status {}", actual)).red(),
                )
            }

            (
                _,
                Some(AssertionError::FieldMismatch {
                    path,
                    expected,
                    actual,
                }),
            ) => {
                writeln!(
                    f,
                    "{} {}",
                    console::style("✘").red().bold(),
                    console::style("FAIL!").red().bold(),
                )?;
                writeln!(
                    f,
                    "  {} {}",
                    console::style("Field:").yellow().bold(),
                    console::style(path).dim()
                )?;
                writeln!(
                    f,
                    "  {} {}",
                    console::style("Expected:").green(),
                    console::style(expected).green().bold()
                )?;
                write!(
                    f,
                    "  {} {}",
                    console::style("Got:").red(),
                    console::style(actual).red().bold()
                )
            }

            (_, Some(AssertionError::PathUnresolved { path })) => {
                write!(
                    f,
                    "{} {}\n  {} {}",
                    console::style("✘").red().bold(),
                    console::style("FAIL!").red().bold(),
                    console::style("No value at").red(),
                    console::style(path).red().bold()
                )
            }

            (
                _,
                Some(AssertionError::HeaderMismatch {
                    name,
                    expected,
                    actual,
                }),
            ) => {
                writeln!(
                    f,
                    "{} {}",
                    console::style("✘").red().bold(),
                    console::style("FAIL!").red().bold(),
                )?;
                writeln!(
                    f,
                    "  {}\n    {}: {}",
                    console::style("Expected header:").green(),
                    console::style(name).yellow().bold(),
                    console::style(expected).green()
                )?;
                write!(
                    f,
                    "  {}\n    {}: {}",
                    console::style("Actual header:").red(),
                    console::style(name).yellow().bold(),
                    console::style(actual.as_deref().unwrap_or("<missing>")).red()
                )
            }

            (_, Some(other)) => {
                write!(
                    f,
                    "{} {}\n  {}",
                    console::style("✘").red().bold(),
                    console::style("FAIL!").red().bold(),
                    console::style(other).red()
                )
            }
        }
    }
}

impl Display for Assertion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Assertion::Status(status) => write!(f, "Status {status}"),
            Assertion::Headers(_) => write!(f, "Header test"),
            Assertion::Field { path, expected } => write!(f, "{path} == {expected}"),
            Assertion::EmptyBody => write!(f, "Empty body"),
        }
    }
}

#[cfg(test)]
mod test {
    use reqwest::StatusCode;
    use reqwest::header::CONTENT_TYPE;
    use reqwest::header::HeaderMap;
    use serde_json::json;
    use url::Url;

    use super::*;
    use crate::harness::HarnessError;
    use crate::runner::RunnerResult;

    fn response(status: u16, body: &str) -> CapturedResponse {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, "application/json".parse().unwrap());

        CapturedResponse::from_parts(
            StatusCode::from_u16(status).unwrap(),
            headers,
            body.to_string(),
        )
    }

    fn users_page() -> CapturedResponse {
        response(
            200,
            r#"{
                "page": 2,
                "total": 12,
                "data": [
                    { "id": 7, "email": "michael.lawson@reqres.in" },
                    { "id": 8, "email": "lindsay.ferguson@reqres.in" }
                ]
            }"#,
        )
    }

    #[test]
    fn assert_status_test() {
        let resp = response(201, "{}");

        assert_eq!(assert_status(&resp, 201), Ok(()));
        assert_eq!(
            assert_status(&resp, 200),
            Err(AssertionError::StatusMismatch {
                expected: 200,
                actual: 201
            })
        );
    }

    #[test]
    fn matching_field_passes() {
        let resp = users_page();

        assert_eq!(assert_field(&resp, "data.email[0]", "michael.lawson@reqres.in"), Ok(()));
        assert_eq!(assert_field(&resp, "data[1].id", 8), Ok(()));
    }

    #[test]
    fn string_expectation_matches_scalar_string_form() {
        let resp = response(200, r#"{ "id": 4, "token": "QpwL5tke4Pnpja7X4", "ok": true }"#);

        assert_eq!(assert_field(&resp, "id", "4"), Ok(()));
        assert_eq!(assert_field(&resp, "ok", "true"), Ok(()));
        assert!(assert_field(&resp, "token", 4).is_err());
    }

    #[test]
    fn scalar_expectation_matches_string_field() {
        let resp = response(200, r#"{ "id": "4", "total": "12", "ok": "true", "data": ["4"] }"#);

        assert_eq!(assert_field(&resp, "id", 4), Ok(()));
        assert_eq!(assert_field(&resp, "total", 12), Ok(()));
        assert_eq!(assert_field(&resp, "ok", true), Ok(()));
        assert!(assert_field(&resp, "id", 5).is_err());
        // Arrays never compare by string form
        assert!(assert_field(&resp, "data", r#"["4"]"#).is_err());
    }

    #[test]
    fn mismatch_reports_both_values() {
        let resp = users_page();
        let err = assert_field(&resp, "total", "13").unwrap_err();

        assert_eq!(
            err,
            AssertionError::FieldMismatch {
                path: "total".into(),
                expected: json!("13"),
                actual: json!(12),
            }
        );
        let message = err.to_string();
        assert!(message.contains("\"13\""), "{message}");
        assert!(message.contains("12"), "{message}");
    }

    #[test]
    fn missing_path_never_passes() {
        let resp = users_page();

        let err = assert_field(&resp, "token", "anything").unwrap_err();
        assert!(err.is_unresolved());

        let err = assert_field(&resp, "data.email[9]", serde_json::Value::Null).unwrap_err();
        assert!(err.is_unresolved());
    }

    #[test]
    fn non_json_body_is_unresolved() {
        let resp = response(204, "");

        assert!(assert_field(&resp, "job", "leader").unwrap_err().is_unresolved());
        assert_eq!(assert_empty_body(&resp), Ok(()));
    }

    #[test]
    fn malformed_path_is_a_syntax_error() {
        let resp = users_page();

        assert!(matches!(
            assert_field(&resp, "data..email", "x"),
            Err(AssertionError::PathSyntax(_))
        ));
    }

    #[test]
    fn header_assertions() {
        let resp = users_page();

        assert_eq!(assert_header(&resp, "content-type", "application/json"), Ok(()));
        assert_eq!(
            assert_header(&resp, "x-missing", "1"),
            Err(AssertionError::HeaderMismatch {
                name: "x-missing".into(),
                expected: "1".into(),
                actual: None,
            })
        );
    }

    #[test]
    fn non_empty_body_fails_empty_body_check() {
        assert!(matches!(
            assert_empty_body(&users_page()),
            Err(AssertionError::BodyNotEmpty { .. })
        ));
    }

    #[test]
    fn report_fails_when_any_assertion_fails() {
        let result = RunnerResult {
            name: "list users".into(),
            method: "GET".into(),
            url: Url::parse("https://reqres.in/api/users?page=2").unwrap(),
            response: Ok(users_page()),
            assertions: vec![
                Assertion::Status(200),
                Assertion::Field {
                    path: JsonPath::parse("total").unwrap(),
                    expected: json!("12"),
                },
                Assertion::Field {
                    path: JsonPath::parse("data.email[0]").unwrap(),
                    expected: json!("someone.else@reqres.in"),
                },
            ],
        };

        let report = result.assert();

        assert_eq!(report.name, "list users");
        assert_eq!(report.path, "/api/users?page=2");
        assert_eq!(report.status, TestResult::Fail);
        let statuses: Vec<TestResult> = report.results.iter().map(|r| r.status).collect();
        assert_eq!(
            statuses,
            vec![TestResult::Pass, TestResult::Pass, TestResult::Fail]
        );
    }

    #[test]
    fn request_error_is_reported_as_error_not_failure() {
        let result = RunnerResult {
            name: "delete user".into(),
            method: "DELETE".into(),
            url: Url::parse("https://reqres.in/api/users/2").unwrap(),
            response: Err(HarnessError::Config(crate::config::ConfigError::InvalidTarget {
                base: "https://reqres.in".into(),
                path: "/api/users/2".into(),
                reason: "relative URL without a base".into(),
            })),
            assertions: vec![Assertion::Status(204)],
        };

        let report = result.assert();

        assert_eq!(report.status, TestResult::Error);
        assert!(report.results.is_empty());
        assert!(report.error.unwrap().contains("relative URL without a base"));
    }
}
