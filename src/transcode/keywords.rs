use std::collections::BTreeMap;
use std::fmt;

use serde::de::{Deserialize, Deserializer, MapAccess, Visitor};
use serde_json::Value;
use tracing::warn;

use super::insert_tag;
use crate::error::{FieldErrorCause, TranscodingError, ValidationError};
use crate::model::{ConfigValue, Mapping, Scalar};

pub type KeywordCategories = BTreeMap<String, Vec<String>>;

pub fn encode_keyword_categories(mapping: &Mapping) -> KeywordCategories {
    mapping
        .iter()
        .map(|(category, value)| (category.clone(), keyword_list(category, value)))
        .collect()
}

fn keyword_list(category: &str, value: &ConfigValue) -> Vec<String> {
    let mut keywords = Vec::new();
    match value {
        ConfigValue::Sequence(items) => {
            for item in items {
                match item {
                    ConfigValue::Scalar(Scalar::Null) => {}
                    ConfigValue::Scalar(scalar) => {
                        insert_tag(&mut keywords, &scalar.to_text());
                    }
                    composite => warn!(
                        category,
                        kind = composite.kind(),
                        "skipping non-scalar keyword entry"
                    ),
                }
            }
        }
        ConfigValue::Scalar(Scalar::Null) => {}
        ConfigValue::Scalar(scalar) => {
            insert_tag(&mut keywords, &scalar.to_text());
        }
        ConfigValue::Mapping(_) => {
            warn!(category, "keyword category is an object; rendering it empty")
        }
    }
    keywords
}

pub fn decode_keyword_categories(categories: &KeywordCategories) -> Mapping {
    categories
        .iter()
        .map(|(category, keywords)| {
            let items = keywords.iter().map(ConfigValue::text).collect();
            (category.clone(), ConfigValue::Sequence(items))
        })
        .collect()
}

pub fn add_category(
    categories: &mut KeywordCategories,
    name: &str,
) -> Result<bool, ValidationError> {
    if name.trim().is_empty() {
        return Err(ValidationError::BlankCategory);
    }
    if categories.contains_key(name) {
        return Ok(false);
    }

    categories.insert(name.to_string(), Vec::new());
    Ok(true)
}

pub fn remove_category(categories: &mut KeywordCategories, name: &str) -> bool {
    categories.remove(name).is_some()
}

pub fn add_keyword(
    categories: &mut KeywordCategories,
    category: &str,
    keyword: &str,
) -> Result<bool, ValidationError> {
    let keywords = categories
        .get_mut(category)
        .ok_or_else(|| ValidationError::UnknownCategory(category.to_string()))?;
    Ok(insert_tag(keywords, keyword))
}

pub fn remove_keyword(categories: &mut KeywordCategories, category: &str, keyword: &str) -> bool {
    let Some(keywords) = categories.get_mut(category) else {
        return false;
    };

    let target = keyword.trim();
    let before = keywords.len();
    keywords.retain(|value| value != target);
    keywords.len() != before
}

pub fn decode_keyword_block(text: &str) -> Result<KeywordCategories, FieldErrorCause> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Ok(KeywordCategories::new());
    }

    let value = serde_json::from_str::<Value>(trimmed).map_err(TranscodingError::from)?;
    if !value.is_object() {
        return Err(TranscodingError::NotAnObject {
            found: ConfigValue::from(value).kind(),
        }
        .into());
    }

    let OrderedEntries(entries) =
        serde_json::from_str(trimmed).map_err(TranscodingError::from)?;

    let mut categories = KeywordCategories::new();
    for (category, value) in entries {
        if categories.contains_key(&category) {
            return Err(ValidationError::DuplicateCategory(category).into());
        }

        let Value::Array(items) = value else {
            return Err(ValidationError::KeywordShape(category).into());
        };

        let mut keywords = Vec::<String>::with_capacity(items.len());
        for item in items {
            let Value::String(keyword) = item else {
                return Err(ValidationError::KeywordShape(category).into());
            };
            let keyword = keyword.trim();
            if keyword.is_empty() {
                return Err(ValidationError::BlankKeyword(category).into());
            }
            if keywords.iter().any(|existing| existing == keyword) {
                return Err(ValidationError::DuplicateKeyword {
                    category,
                    keyword: keyword.to_string(),
                }
                .into());
            }
            keywords.push(keyword.to_string());
        }

        categories.insert(category, keywords);
    }

    Ok(categories)
}

// Object entries in source order, duplicates kept so they can be reported.
struct OrderedEntries(Vec<(String, Value)>);

impl<'de> Deserialize<'de> for OrderedEntries {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct EntriesVisitor;

        impl<'de> Visitor<'de> for EntriesVisitor {
            type Value = OrderedEntries;

            fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
                formatter.write_str("an object literal")
            }

            fn visit_map<A>(self, mut access: A) -> Result<Self::Value, A::Error>
            where
                A: MapAccess<'de>,
            {
                let mut entries = Vec::new();
                while let Some(entry) = access.next_entry::<String, Value>()? {
                    entries.push(entry);
                }
                Ok(OrderedEntries(entries))
            }
        }

        deserializer.deserialize_map(EntriesVisitor)
    }
}
