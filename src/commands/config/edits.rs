use std::path::PathBuf;

use anyhow::{Context, Result, anyhow, bail};
use regex::Regex;

use crate::cli::ConfigEditArgs;
use crate::model::ConfigField;
use crate::session::FieldEdit;
use crate::transcode::KeyValueRow;
use crate::util::read_text;

pub(super) struct EditPatterns {
    move_step: Regex,
    row: Regex,
    field_key: Regex,
    field_path: Regex,
    keyword: Regex,
}

impl EditPatterns {
    pub(super) fn compile() -> Result<Self> {
        Ok(Self {
            move_step: Regex::new(r"^\s*(?P<from>\d+)\s*:\s*(?P<to>\d+)\s*$")
                .context("failed to compile move-step regex")?,
            row: Regex::new(r"(?s)^(?P<field>[A-Za-z_-]+):(?P<key>[^=]+)=(?P<value>.*)$")
                .context("failed to compile row regex")?,
            field_key: Regex::new(r"(?s)^(?P<field>[A-Za-z_-]+):(?P<key>.+)$")
                .context("failed to compile remove-row regex")?,
            field_path: Regex::new(r"^(?P<field>[A-Za-z_-]+)=(?P<path>.+)$")
                .context("failed to compile block regex")?,
            keyword: Regex::new(r"^(?P<category>[^=]+)=(?P<keyword>.+)$")
                .context("failed to compile keyword regex")?,
        })
    }

    fn move_step(&self, raw: &str) -> Result<FieldEdit> {
        let caps = self
            .move_step
            .captures(raw)
            .ok_or_else(|| anyhow!("expected FROM:TO, got `{raw}`"))?;
        let from = caps["from"]
            .parse::<usize>()
            .with_context(|| format!("invalid step position in `{raw}`"))?;
        let to = caps["to"]
            .parse::<usize>()
            .with_context(|| format!("invalid step position in `{raw}`"))?;
        Ok(FieldEdit::MoveTag { from, to })
    }

    fn row(&self, raw: &str) -> Result<(ConfigField, FieldEdit)> {
        let caps = self
            .row
            .captures(raw)
            .ok_or_else(|| anyhow!("expected FIELD:KEY=VALUE, got `{raw}`"))?;
        let field = mapping_field(&caps["field"])?;
        Ok((
            field,
            FieldEdit::SetRow {
                key: caps["key"].to_string(),
                text: caps["value"].to_string(),
            },
        ))
    }

    fn remove_row(&self, raw: &str) -> Result<(ConfigField, FieldEdit)> {
        let caps = self
            .field_key
            .captures(raw)
            .ok_or_else(|| anyhow!("expected FIELD:KEY, got `{raw}`"))?;
        let field = mapping_field(&caps["field"])?;
        Ok((field, FieldEdit::RemoveRow(caps["key"].to_string())))
    }

    fn block(&self, raw: &str) -> Result<(ConfigField, PathBuf)> {
        let caps = self
            .field_path
            .captures(raw)
            .ok_or_else(|| anyhow!("expected FIELD=PATH, got `{raw}`"))?;
        let field = parse_field(&caps["field"])?;
        if field == ConfigField::Steps {
            bail!("steps cannot be replaced from a block");
        }
        Ok((field, PathBuf::from(&caps["path"])))
    }

    fn rows_file(&self, raw: &str) -> Result<(ConfigField, PathBuf)> {
        let caps = self
            .field_path
            .captures(raw)
            .ok_or_else(|| anyhow!("expected FIELD=PATH, got `{raw}`"))?;
        let field = mapping_field(&caps["field"])?;
        Ok((field, PathBuf::from(&caps["path"])))
    }

    fn keyword(&self, raw: &str) -> Result<(String, String)> {
        let caps = self
            .keyword
            .captures(raw)
            .ok_or_else(|| anyhow!("expected CATEGORY=KEYWORD, got `{raw}`"))?;
        Ok((caps["category"].to_string(), caps["keyword"].to_string()))
    }
}

fn parse_rows(text: &str) -> Result<Vec<KeyValueRow>> {
    text.lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(index, line)| {
            line.split_once('=')
                .map(|(key, value)| KeyValueRow::new(key, value))
                .ok_or_else(|| anyhow!("line {} is not KEY=VALUE: `{line}`", index + 1))
        })
        .collect()
}

fn parse_field(raw: &str) -> Result<ConfigField> {
    raw.parse::<ConfigField>().map_err(|message| anyhow!(message))
}

fn mapping_field(raw: &str) -> Result<ConfigField> {
    let field = parse_field(raw)?;
    if !ConfigField::KEY_VALUE.contains(&field) {
        bail!("{field} is not a key/value field");
    }
    Ok(field)
}

/// Edits in application order: blocks, row files, steps, rows, then keyword
/// edits with category removals last.
pub(super) fn collect_edits(
    args: &ConfigEditArgs,
    patterns: &EditPatterns,
) -> Result<Vec<(ConfigField, FieldEdit)>> {
    let mut edits = Vec::new();

    for raw in &args.blocks {
        let (field, path) = patterns.block(raw)?;
        edits.push((field, FieldEdit::Block(read_text(&path)?)));
    }
    for raw in &args.rows_files {
        let (field, path) = patterns.rows_file(raw)?;
        let rows = parse_rows(&read_text(&path)?)
            .with_context(|| format!("failed to parse rows in {}", path.display()))?;
        edits.push((field, FieldEdit::ReplaceRows(rows)));
    }

    for step in &args.add_steps {
        edits.push((ConfigField::Steps, FieldEdit::AddTag(step.clone())));
    }
    for step in &args.remove_steps {
        edits.push((ConfigField::Steps, FieldEdit::RemoveTag(step.clone())));
    }
    for raw in &args.move_steps {
        edits.push((ConfigField::Steps, patterns.move_step(raw)?));
    }

    for raw in &args.rows {
        edits.push(patterns.row(raw)?);
    }
    for raw in &args.remove_rows {
        edits.push(patterns.remove_row(raw)?);
    }

    for category in &args.add_categories {
        edits.push((ConfigField::KeywordsTech, FieldEdit::AddCategory(category.clone())));
    }
    for raw in &args.add_keywords {
        let (category, keyword) = patterns.keyword(raw)?;
        edits.push((ConfigField::KeywordsTech, FieldEdit::AddKeyword { category, keyword }));
    }
    for raw in &args.remove_keywords {
        let (category, keyword) = patterns.keyword(raw)?;
        edits.push((
            ConfigField::KeywordsTech,
            FieldEdit::RemoveKeyword { category, keyword },
        ));
    }
    for category in &args.remove_categories {
        edits.push((
            ConfigField::KeywordsTech,
            FieldEdit::RemoveCategory(category.clone()),
        ));
    }

    Ok(edits)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn patterns() -> EditPatterns {
        EditPatterns::compile().expect("patterns compile")
    }

    #[test]
    fn row_flag_splits_on_first_colon_and_equals() {
        let (field, edit) = patterns()
            .row("line-filter:decoration_chars=a=b:c")
            .expect("row parses");
        assert_eq!(field, ConfigField::LineFilter);
        assert_eq!(
            edit,
            FieldEdit::SetRow {
                key: "decoration_chars".to_string(),
                text: "a=b:c".to_string(),
            }
        );
    }

    #[test]
    fn row_flag_allows_empty_value_and_rejects_non_mapping_fields() {
        let (_, edit) = patterns().row("index_rules:mode=").expect("empty value");
        assert_eq!(
            edit,
            FieldEdit::SetRow {
                key: "mode".to_string(),
                text: String::new(),
            }
        );

        assert!(patterns().row("steps:x=1").is_err());
        assert!(patterns().row("keywords_tech:cloud=aws").is_err());
        assert!(patterns().row("line_filter=1").is_err());
    }

    #[test]
    fn move_step_requires_two_positions() {
        assert_eq!(
            patterns().move_step("2:0").expect("move parses"),
            FieldEdit::MoveTag { from: 2, to: 0 }
        );
        assert!(patterns().move_step("2").is_err());
        assert!(patterns().move_step("a:b").is_err());
    }

    #[test]
    fn keyword_and_block_flags_parse() {
        assert_eq!(
            patterns().keyword("cloud=aws").expect("keyword"),
            ("cloud".to_string(), "aws".to_string())
        );
        assert!(patterns().keyword("cloud").is_err());

        let (field, path) = patterns().block("semantic_templates=tpl.json").expect("block");
        assert_eq!(field, ConfigField::SemanticTemplates);
        assert_eq!(path, PathBuf::from("tpl.json"));
        assert!(patterns().block("steps=tpl.json").is_err());
    }

    #[test]
    fn rows_file_lines_split_on_first_equals() {
        let rows = parse_rows("max_len=80\n\nrules={\"a\": 1}\ndecoration=-=\n").expect("rows");
        assert_eq!(
            rows,
            vec![
                KeyValueRow::new("max_len", "80"),
                KeyValueRow::new("rules", r#"{"a": 1}"#),
                KeyValueRow::new("decoration", "-="),
            ]
        );

        let err = parse_rows("ok=1\nbroken\n").expect_err("missing equals");
        assert!(err.to_string().contains("line 2"));

        assert!(patterns().rows_file("steps=rows.txt").is_err());
        assert_eq!(
            patterns().rows_file("index-rules=rows.txt").expect("rows file").0,
            ConfigField::IndexRules
        );
    }

    #[test]
    fn edits_are_ordered_for_application() {
        let args = ConfigEditArgs {
            add_steps: vec!["splitter".to_string()],
            remove_categories: vec!["cloud".to_string()],
            add_keywords: vec!["cloud=gcp".to_string()],
            rows: vec!["line_filter:max_len=80".to_string()],
            ..ConfigEditArgs::default()
        };

        let kinds = collect_edits(&args, &patterns())
            .expect("edits collect")
            .iter()
            .map(|(_, edit)| edit.kind())
            .collect::<Vec<&str>>();
        assert_eq!(
            kinds,
            vec!["add-tag", "set-row", "add-keyword", "remove-category"]
        );
    }
}
