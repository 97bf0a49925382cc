use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Number, Value};

pub type Mapping = BTreeMap<String, ConfigValue>;

#[derive(Debug, Clone, PartialEq)]
pub enum Scalar {
    Null,
    Bool(bool),
    Number(Number),
    Text(String),
}

impl Scalar {
    pub fn to_text(&self) -> String {
        match self {
            Self::Null => "null".to_string(),
            Self::Bool(value) => value.to_string(),
            Self::Number(value) => value.to_string(),
            Self::Text(value) => value.clone(),
        }
    }
}

/// Configuration value of arbitrary depth, convertible to and from JSON without loss.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "Value", into = "Value")]
pub enum ConfigValue {
    Scalar(Scalar),
    Sequence(Vec<ConfigValue>),
    Mapping(Mapping),
}

impl ConfigValue {
    pub fn text(value: impl Into<String>) -> Self {
        Self::Scalar(Scalar::Text(value.into()))
    }

    pub fn number(value: impl Into<Number>) -> Self {
        Self::Scalar(Scalar::Number(value.into()))
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Self::Scalar(Scalar::Null) => "null",
            Self::Scalar(Scalar::Bool(_)) => "boolean",
            Self::Scalar(Scalar::Number(_)) => "number",
            Self::Scalar(Scalar::Text(_)) => "string",
            Self::Sequence(_) => "array",
            Self::Mapping(_) => "object",
        }
    }

    pub fn to_json(&self) -> Value {
        Value::from(self.clone())
    }
}

impl From<Value> for ConfigValue {
    fn from(value: Value) -> Self {
        match value {
            Value::Null => Self::Scalar(Scalar::Null),
            Value::Bool(value) => Self::Scalar(Scalar::Bool(value)),
            Value::Number(value) => Self::Scalar(Scalar::Number(value)),
            Value::String(value) => Self::Scalar(Scalar::Text(value)),
            Value::Array(items) => Self::Sequence(items.into_iter().map(Self::from).collect()),
            Value::Object(entries) => Self::Mapping(
                entries
                    .into_iter()
                    .map(|(key, value)| (key, Self::from(value)))
                    .collect(),
            ),
        }
    }
}

impl From<ConfigValue> for Value {
    fn from(value: ConfigValue) -> Self {
        match value {
            ConfigValue::Scalar(Scalar::Null) => Value::Null,
            ConfigValue::Scalar(Scalar::Bool(value)) => Value::Bool(value),
            ConfigValue::Scalar(Scalar::Number(value)) => Value::Number(value),
            ConfigValue::Scalar(Scalar::Text(value)) => Value::String(value),
            ConfigValue::Sequence(items) => {
                Value::Array(items.into_iter().map(Value::from).collect())
            }
            ConfigValue::Mapping(entries) => Value::Object(
                entries
                    .into_iter()
                    .map(|(key, value)| (key, Value::from(value)))
                    .collect(),
            ),
        }
    }
}

#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ConfigSource {
    Persisted,
    #[default]
    Fallback,
}

impl ConfigSource {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Persisted => "persisted",
            Self::Fallback => "fallback",
        }
    }
}

impl From<String> for ConfigSource {
    fn from(value: String) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "db" | "persisted" => Self::Persisted,
            _ => Self::Fallback,
        }
    }
}

impl From<ConfigSource> for String {
    fn from(value: ConfigSource) -> Self {
        value.as_str().to_string()
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum FieldShape {
    TagList,
    KeyValue,
    KeywordCategories,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub enum ConfigField {
    Steps,
    LineFilter,
    SemanticTemplates,
    KeywordsTech,
    IndexRules,
    ClassifierForeigner,
}

impl ConfigField {
    pub const ALL: [ConfigField; 6] = [
        Self::Steps,
        Self::LineFilter,
        Self::SemanticTemplates,
        Self::KeywordsTech,
        Self::IndexRules,
        Self::ClassifierForeigner,
    ];

    pub const KEY_VALUE: [ConfigField; 4] = [
        Self::LineFilter,
        Self::SemanticTemplates,
        Self::IndexRules,
        Self::ClassifierForeigner,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Steps => "steps",
            Self::LineFilter => "line_filter",
            Self::SemanticTemplates => "semantic_templates",
            Self::KeywordsTech => "keywords_tech",
            Self::IndexRules => "index_rules",
            Self::ClassifierForeigner => "classifier_foreigner",
        }
    }

    pub fn shape(self) -> FieldShape {
        match self {
            Self::Steps => FieldShape::TagList,
            Self::KeywordsTech => FieldShape::KeywordCategories,
            _ => FieldShape::KeyValue,
        }
    }
}

impl fmt::Display for ConfigField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ConfigField {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let normalized = value.trim().to_ascii_lowercase().replace('-', "_");
        Self::ALL
            .into_iter()
            .find(|field| field.as_str() == normalized)
            .ok_or_else(|| format!("unknown configuration field: {value}"))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineConfig {
    #[serde(default, deserialize_with = "mapping_or_null")]
    pub summary: Mapping,
    #[serde(default)]
    pub steps: Vec<String>,
    #[serde(default, deserialize_with = "mapping_or_null")]
    pub line_filter: Mapping,
    #[serde(default, deserialize_with = "mapping_or_null")]
    pub semantic_templates: Mapping,
    #[serde(default, deserialize_with = "mapping_or_null")]
    pub keywords_tech: Mapping,
    #[serde(default, deserialize_with = "mapping_or_null")]
    pub index_rules: Mapping,
    #[serde(default, deserialize_with = "mapping_or_null")]
    pub classifier_foreigner: Mapping,
    #[serde(default)]
    pub source: ConfigSource,
}

impl PipelineConfig {
    pub fn to_payload(&self) -> SavePayload {
        SavePayload {
            steps: persistable_steps(&self.steps),
            line_filter: self.line_filter.clone(),
            semantic_templates: self.semantic_templates.clone(),
            keywords_tech: self.keywords_tech.clone(),
            index_rules: self.index_rules.clone(),
            classifier_foreigner: self.classifier_foreigner.clone(),
        }
    }
}

pub fn persistable_steps(steps: &[String]) -> Vec<String> {
    steps
        .iter()
        .map(|step| step.trim())
        .filter(|step| !step.is_empty())
        .map(ToOwned::to_owned)
        .collect()
}

fn mapping_or_null<'de, D>(deserializer: D) -> Result<Mapping, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Mapping>::deserialize(deserializer)?.unwrap_or_default())
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SavePayload {
    pub steps: Vec<String>,
    pub line_filter: Mapping,
    pub semantic_templates: Mapping,
    pub keywords_tech: Mapping,
    pub index_rules: Mapping,
    pub classifier_foreigner: Mapping,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeywordStat {
    pub keyword: String,
    pub count: u64,
    pub ratio: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassStat {
    pub count: u64,
    pub ratio: f64,
}

pub type KeywordSummary = BTreeMap<String, Vec<KeywordStat>>;
pub type ClassSummary = BTreeMap<String, ClassStat>;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Aggregation {
    #[serde(default)]
    pub block_count: u64,
    #[serde(default)]
    pub keyword_summary: KeywordSummary,
    #[serde(default)]
    pub class_summary: ClassSummary,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SemanticResult {
    #[serde(default)]
    pub text: String,
    pub score: f64,
    pub start_line: u64,
    pub end_line: u64,
    pub matched: bool,
    #[serde(default)]
    pub line_scores: Vec<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MailResult {
    pub source_path: String,
    #[serde(default)]
    pub subject: String,
    #[serde(default)]
    pub semantic: Option<SemanticResult>,
    #[serde(default)]
    pub aggregation: Aggregation,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RunSummary {
    #[serde(default)]
    pub message_count: u64,
    #[serde(default)]
    pub block_count: u64,
    #[serde(default)]
    pub keyword_summary: KeywordSummary,
    #[serde(default)]
    pub class_summary: ClassSummary,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunResponse {
    #[serde(default)]
    pub results: Vec<MailResult>,
    #[serde(default)]
    pub summary: RunSummary,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileEntry {
    pub filename: String,
    pub size: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeleteResponse {
    pub deleted: u64,
    pub skipped: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InsightRequest {
    pub keyword: String,
    pub count: u64,
    pub ratio: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InsightResponse {
    pub keyword: String,
    pub insight: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pipeline_config_deserializes_wire_shape_with_nulls_and_unknown_keys() {
        let raw = r#"
        {
          "summary": {"env": "development", "line_filter_job_keywords": 4},
          "steps": ["cleaner", "line_filter", "semantic"],
          "line_filter": {"decoration_chars": "-=*", "extra": {"nested": [1, null, true]}},
          "semantic_templates": null,
          "keywords_tech": {"lang": ["rust", "go"]},
          "index_rules": {},
          "classifier_foreigner": {"classes": {"foreigner": ["visa"]}},
          "source": "db"
        }
        "#;

        let config: PipelineConfig =
            serde_json::from_str(raw).expect("wire config should deserialize");
        assert_eq!(config.source, ConfigSource::Persisted);
        assert!(config.semantic_templates.is_empty());
        assert_eq!(config.steps.len(), 3);

        let extra = config.line_filter.get("extra").expect("unknown key retained");
        let ConfigValue::Mapping(extra) = extra else {
            panic!("extra should stay a mapping");
        };
        assert_eq!(
            extra.get("nested"),
            Some(&ConfigValue::Sequence(vec![
                ConfigValue::number(1),
                ConfigValue::Scalar(Scalar::Null),
                ConfigValue::Scalar(Scalar::Bool(true)),
            ]))
        );
    }

    #[test]
    fn missing_or_unknown_source_is_fallback() {
        let config: PipelineConfig = serde_json::from_str(r#"{"steps": []}"#).expect("parse");
        assert_eq!(config.source, ConfigSource::Fallback);

        let config: PipelineConfig =
            serde_json::from_str(r#"{"source": "file"}"#).expect("parse");
        assert_eq!(config.source, ConfigSource::Fallback);
    }

    #[test]
    fn payload_drops_blank_steps_and_excludes_summary() {
        let config = PipelineConfig {
            summary: Mapping::from([("env".to_string(), ConfigValue::text("dev"))]),
            steps: vec!["cleaner".to_string(), "  ".to_string(), " splitter ".to_string()],
            line_filter: Mapping::new(),
            semantic_templates: Mapping::new(),
            keywords_tech: Mapping::new(),
            index_rules: Mapping::new(),
            classifier_foreigner: Mapping::new(),
            source: ConfigSource::Persisted,
        };

        let payload = config.to_payload();
        assert_eq!(payload.steps, vec!["cleaner", "splitter"]);

        let json = serde_json::to_value(&payload).expect("serialize");
        assert!(json.get("summary").is_none());
        assert!(json.get("source").is_none());
    }

    #[test]
    fn config_field_parses_snake_and_kebab_names() {
        assert_eq!("line-filter".parse(), Ok(ConfigField::LineFilter));
        assert_eq!("KEYWORDS_TECH".parse(), Ok(ConfigField::KeywordsTech));
        assert!("summary".parse::<ConfigField>().is_err());
    }

    #[test]
    fn insight_request_omits_missing_category() {
        let request = InsightRequest {
            keyword: "rust".to_string(),
            count: 3,
            ratio: 0.5,
            category: None,
        };
        let json = serde_json::to_value(&request).expect("serialize");
        assert!(json.get("category").is_none());
    }
}
