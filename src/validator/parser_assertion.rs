use miette::NamedSource;
use miette::SourceSpan;
use reqwest::header::HeaderMap;
use reqwest::header::HeaderName;
use reqwest::header::HeaderValue;
use toml::Value;

use crate::asserter::Assertion;
use crate::json_path::JsonPath;
use crate::validator::ValidationError;

/// Helper function to find the span of a key in the source contents.
fn find_key_span(src: Option<&(String, String)>, key: &str) -> Option<SourceSpan> {
    let (_, content) = src?;
    // This simple find assumes the key is unique and finds its first occurrence.
    let start = content.find(key)?;
    Some(SourceSpan::new(start.into(), key.len()))
}

/// Helper function to find the span of a value in the source contents.
fn find_value_span(src: Option<&(String, String)>, value: &str) -> Option<SourceSpan> {
    let (_, content) = src?;
    let start = content.find(value)?;
    Some(SourceSpan::new(start.into(), value.len()))
}

/// Macro to simplify the creation of a ValidationError with source context.
macro_rules! validation_err {
    ($src:expr, $field:expr, $message:expr, $span_fn:expr) => {
        ValidationError {
            field: $field.to_string(),
            message: $message,
            src: $src
                .as_ref()
                .map(|(name, content)| NamedSource::new(name.clone(), content.clone())),
            span: $span_fn,
        }
    };
}

/// Parses a single header key-value pair and adds it to the HeaderMap.
fn parse_single_header(
    header_map: &mut HeaderMap,
    key: &str,
    value: &Value,
    src: Option<&(String, String)>,
) -> Result<(), ValidationError> {
    let v_str = value.as_str().ok_or_else(|| {
        validation_err!(
            src,
            key,
            format!("Header value must be a string, got {value}"),
            find_key_span(src, key)
        )
    })?;

    let name = HeaderName::from_bytes(key.as_bytes()).map_err(|e| {
        validation_err!(
            src,
            key,
            format!("Invalid header name `{key}`: {e}"),
            find_key_span(src, key)
        )
    })?;

    let h_value = HeaderValue::from_str(v_str).map_err(|e| {
        validation_err!(
            src,
            key,
            format!("Invalid header value for `{key}`: {e}"),
            find_value_span(src, v_str)
        )
    })?;

    header_map.insert(name, h_value);
    Ok(())
}

/// Parses a TOML table of headers into a HeaderMap.
pub fn parse_header_map(
    value: &Value,
    src: Option<&(String, String)>,
) -> Result<HeaderMap, ValidationError> {
    let map = value.as_table().ok_or_else(|| {
        validation_err!(
            src,
            "headers",
            format!("Expected a table for headers, got {value}"),
            None
        )
    })?;

    let mut header_map = HeaderMap::new();

    for (k, v) in map {
        parse_single_header(&mut header_map, k, v, src)?;
    }

    Ok(header_map)
}

/// Parses a TOML table of query parameters. Scalars are sent in their string
/// form.
pub fn parse_query(
    value: &Value,
    src: Option<&(String, String)>,
) -> Result<Vec<(String, String)>, ValidationError> {
    let map = value.as_table().ok_or_else(|| {
        validation_err!(
            src,
            "query",
            format!("Expected a table for query, got {value}"),
            None
        )
    })?;

    map.iter()
        .map(|(k, v)| {
            let v = match v {
                Value::String(s) => s.clone(),
                Value::Integer(i) => i.to_string(),
                Value::Float(f) => f.to_string(),
                Value::Boolean(b) => b.to_string(),
                other => {
                    return Err(validation_err!(
                        src,
                        k,
                        format!("Query value must be a string, number or boolean, got {other}"),
                        find_key_span(src, k)
                    ));
                }
            };
            Ok((k.clone(), v))
        })
        .collect()
}

/// Parses all available assertion configurations (status, headers, fields,
/// empty body) into a Vec<Assertion>.
pub fn parse_assertions(
    assert_status: &Option<i32>,
    assert_headers: &Option<Value>,
    assert_fields: &Option<serde_json::Value>,
    assert_empty_body: &Option<bool>,
    src: Option<(&str, &str)>,
) -> Result<Vec<Assertion>, ValidationError> {
    let mut assert_vec = vec![];
    let src_ref = src.as_ref().map(|(n, c)| (n.to_string(), c.to_string()));
    let src_ref = src_ref.as_ref();

    if let Some(status) = assert_status {
        let status = u16::try_from(*status)
            .ok()
            .filter(|s| (100..=599).contains(s))
            .ok_or_else(|| {
                validation_err!(
                    src_ref,
                    "assert_status",
                    format!("Status must be between 100 and 599, got {status}"),
                    find_value_span(src_ref, &status.to_string())
                )
            })?;
        assert_vec.push(Assertion::Status(status));
    }

    if let Some(value) = assert_headers {
        let header_map = parse_header_map(value, src_ref)?;
        assert_vec.push(Assertion::Headers(header_map));
    }

    if let Some(fields) = assert_fields {
        let map = fields.as_object().ok_or_else(|| {
            validation_err!(
                src_ref,
                "assert_fields",
                format!("Expected a table of field paths, got {fields}"),
                find_key_span(src_ref, "assert_fields")
            )
        })?;

        for (path, expected) in map {
            let path = JsonPath::parse(path).map_err(|e| {
                validation_err!(src_ref, path, e.to_string(), find_key_span(src_ref, path))
            })?;

            assert_vec.push(Assertion::Field {
                path,
                expected: expected.clone(),
            });
        }
    }

    if assert_empty_body.is_some_and(|b| b) {
        assert_vec.push(Assertion::EmptyBody);
    }

    Ok(assert_vec)
}

#[cfg(test)]
mod test {
    use serde_json::json;

    use super::*;

    fn table(src: &str) -> Value {
        Value::Table(toml::from_str::<toml::Table>(src).unwrap())
    }

    #[test]
    fn header_table_becomes_header_map() {
        let value = table(r#"Content-Type = "application/json""#);
        let headers = parse_header_map(&value, None).unwrap();

        assert_eq!(headers.get("content-type").unwrap(), "application/json");
    }

    #[test]
    fn non_string_header_value_is_rejected() {
        let value = table("x-retries = 3");
        let err = parse_header_map(&value, None).unwrap_err();

        assert!(err.to_string().contains("x-retries"), "{err}");
    }

    #[test]
    fn query_scalars_are_stringified() {
        let value = table("page = 2\npostId = \"2\"");
        let mut query = parse_query(&value, None).unwrap();
        query.sort();

        assert_eq!(
            query,
            vec![
                ("page".to_string(), "2".to_string()),
                ("postId".to_string(), "2".to_string())
            ]
        );
    }

    #[test]
    fn assertions_in_order() {
        let assertions = parse_assertions(
            &Some(200),
            &None,
            &Some(json!({ "total": "12", "data.email[0]": "michael.lawson@reqres.in" })),
            &Some(true),
            None,
        )
        .unwrap();

        assert_eq!(assertions.len(), 4);
        assert!(matches!(assertions[0], Assertion::Status(200)));
        assert!(matches!(assertions[3], Assertion::EmptyBody));
    }

    #[test]
    fn bad_status_and_path_are_rejected() {
        assert!(parse_assertions(&Some(42), &None, &None, &None, None).is_err());
        assert!(parse_assertions(&Some(-1), &None, &None, &None, None).is_err());
        assert!(
            parse_assertions(&None, &None, &Some(json!({ "data[": "x" })), &None, None).is_err()
        );
        assert!(parse_assertions(&None, &None, &Some(json!("total")), &None, None).is_err());
    }
}
