//! Field paths into a JSON body.
//!
//! Paths use dot and bracket notation: `token`, `data.email[0]`,
//! `data[0].email`, `data.name[-1]`. A field applied to an array collects that
//! field from every element that has it, so `data.email` on a list of users is
//! the list of their emails and `data.email[0]` is the first of them. Negative
//! indices count from the end.

use std::fmt;
use std::str::FromStr;

use serde_json::Value;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("Invalid field path `{path}`: {message}")]
pub struct PathSyntaxError {
    pub path: String,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    Field(String),
    Index(i64),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JsonPath {
    raw: String,
    segments: Vec<Segment>,
}

impl JsonPath {
    pub fn parse(path: &str) -> Result<Self, PathSyntaxError> {
        let err = |message: &str| PathSyntaxError {
            path: path.to_string(),
            message: message.to_string(),
        };

        if path.trim().is_empty() {
            return Err(err("path is empty"));
        }

        let mut segments = vec![];
        let mut chars = path.chars().peekable();
        let mut field = String::new();
        // Set after a `]`, where only `.`, `[` or the end may follow.
        let mut after_index = false;

        while let Some(c) = chars.next() {
            match c {
                '.' => {
                    if field.is_empty() && !after_index {
                        return Err(err("empty field name"));
                    }
                    if !field.is_empty() {
                        segments.push(Segment::Field(std::mem::take(&mut field)));
                    }
                    after_index = false;
                    if chars.peek().is_none() {
                        return Err(err("path ends with `.`"));
                    }
                }
                '[' => {
                    if !field.is_empty() {
                        segments.push(Segment::Field(std::mem::take(&mut field)));
                    }

                    let mut digits = String::new();
                    loop {
                        match chars.next() {
                            Some(']') => break,
                            Some(d) => digits.push(d),
                            None => return Err(err("unclosed `[`")),
                        }
                    }
                    let index = digits
                        .trim()
                        .parse::<i64>()
                        .map_err(|_| err(&format!("`{digits}` is not an array index")))?;

                    segments.push(Segment::Index(index));
                    after_index = true;
                }
                ']' => return Err(err("unexpected `]`")),
                c if after_index => {
                    return Err(err(&format!("unexpected `{c}` after index")));
                }
                c => field.push(c),
            }
        }

        if !field.is_empty() {
            segments.push(Segment::Field(field));
        }

        Ok(Self {
            raw: path.to_string(),
            segments,
        })
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// Resolves the path in `root`. `None` when any step does not resolve.
    pub fn resolve(&self, root: &Value) -> Option<Value> {
        let mut current = root.clone();

        for segment in &self.segments {
            current = match (segment, current) {
                (Segment::Field(name), Value::Object(mut map)) => map.remove(name)?,
                (Segment::Field(name), Value::Array(items)) => {
                    let collected: Vec<Value> = items
                        .into_iter()
                        .filter_map(|item| match item {
                            Value::Object(mut map) => map.remove(name),
                            _ => None,
                        })
                        .collect();

                    if collected.is_empty() {
                        return None;
                    }
                    Value::Array(collected)
                }
                (Segment::Index(index), Value::Array(mut items)) => {
                    let len = items.len() as i64;
                    let position = if *index < 0 { len + index } else { *index };
                    if position < 0 || position >= len {
                        return None;
                    }
                    items.swap_remove(position as usize)
                }
                _ => return None,
            };
        }

        Some(current)
    }
}

impl FromStr for JsonPath {
    type Err = PathSyntaxError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        JsonPath::parse(s)
    }
}

impl fmt::Display for JsonPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

/// The string a value reads as, the way a field is compared against a
/// string expectation: strings unquoted, scalars in their JSON form.
pub fn string_form(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
