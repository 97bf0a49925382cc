use serde::Serialize;
use serde_json::{Number, Value};

use crate::error::TranscodingError;
use crate::model::{ConfigValue, Mapping, Scalar};

mod keywords;

pub use keywords::*;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct KeyValueRow {
    pub key: String,
    pub text: String,
}

impl KeyValueRow {
    pub fn new(key: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            text: text.into(),
        }
    }
}

pub fn encode_tag_list(tags: &[String]) -> Vec<String> {
    tags.to_vec()
}

/// Appends `candidate` (trimmed) unless it is blank or already present.
pub fn insert_tag(tags: &mut Vec<String>, candidate: &str) -> bool {
    let trimmed = candidate.trim();
    if trimmed.is_empty() || tags.iter().any(|tag| tag == trimmed) {
        return false;
    }

    tags.push(trimmed.to_string());
    true
}

pub fn decode_tag_list(candidate: &str, existing: &[String]) -> Vec<String> {
    let mut tags = existing.to_vec();
    insert_tag(&mut tags, candidate);
    tags
}

pub fn encode_value_text(value: &ConfigValue) -> String {
    match value {
        ConfigValue::Scalar(scalar) => scalar.to_text(),
        composite => composite.to_json().to_string(),
    }
}

pub fn encode_key_value(mapping: &Mapping) -> Vec<KeyValueRow> {
    mapping
        .iter()
        .map(|(key, value)| KeyValueRow::new(key.clone(), encode_value_text(value)))
        .collect()
}

// Never fails: a malformed literal degrades to its trimmed text.
pub fn decode_value_text(text: &str) -> ConfigValue {
    let trimmed = text.trim();

    if looks_structured(trimmed) {
        if let Ok(value) = serde_json::from_str::<Value>(trimmed) {
            return ConfigValue::from(value);
        }
    }

    if let Some(number) = parse_number(trimmed) {
        return ConfigValue::Scalar(Scalar::Number(number));
    }

    ConfigValue::text(trimmed)
}

pub fn decode_key_value_row(key: &str, text: &str) -> Option<ConfigValue> {
    if key.trim().is_empty() {
        return None;
    }

    Some(decode_value_text(text))
}

pub fn decode_key_value(rows: &[KeyValueRow]) -> Mapping {
    let mut mapping = Mapping::new();
    for row in rows {
        if let Some(value) = decode_key_value_row(&row.key, &row.text) {
            mapping.insert(row.key.clone(), value);
        }
    }
    mapping
}

pub fn encode_block(mapping: &Mapping) -> String {
    format!("{:#}", ConfigValue::Mapping(mapping.clone()).to_json())
}

pub fn decode_block(text: &str) -> Result<Mapping, TranscodingError> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Ok(Mapping::new());
    }

    match ConfigValue::from(serde_json::from_str::<Value>(trimmed)?) {
        ConfigValue::Mapping(mapping) => Ok(mapping),
        other => Err(TranscodingError::NotAnObject {
            found: other.kind(),
        }),
    }
}

fn looks_structured(trimmed: &str) -> bool {
    (trimmed.starts_with('{') && trimmed.ends_with('}'))
        || (trimmed.starts_with('[') && trimmed.ends_with(']'))
}

fn parse_number(trimmed: &str) -> Option<Number> {
    let has_digit = trimmed.chars().any(|character| character.is_ascii_digit());
    let numeric_charset = trimmed.chars().all(|character| {
        character.is_ascii_digit() || matches!(character, '+' | '-' | '.' | 'e' | 'E')
    });
    if !has_digit || !numeric_charset {
        return None;
    }

    if let Ok(value) = trimmed.parse::<i64>() {
        return Some(Number::from(value));
    }
    if let Ok(value) = trimmed.parse::<u64>() {
        return Some(Number::from(value));
    }

    trimmed
        .parse::<f64>()
        .ok()
        .filter(|value| value.is_finite())
        .and_then(Number::from_f64)
}
