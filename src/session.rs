use tracing::debug;

use crate::error::{FieldError, FieldErrorCause, ValidationError};
use crate::model::{
    ConfigField, ConfigSource, FieldShape, Mapping, PipelineConfig, SavePayload, persistable_steps,
};
use crate::transcode::{
    KeyValueRow, KeywordCategories, add_category, add_keyword, decode_block,
    decode_key_value, decode_key_value_row, decode_keyword_block, decode_keyword_categories,
    decode_tag_list, encode_block, encode_key_value, encode_keyword_categories, remove_category,
    remove_keyword,
};

#[derive(Debug, Clone, PartialEq)]
pub enum FieldEdit {
    AddTag(String),
    RemoveTag(String),
    MoveTag { from: usize, to: usize },
    ReplaceRows(Vec<KeyValueRow>),
    SetRow { key: String, text: String },
    RemoveRow(String),
    Block(String),
    AddCategory(String),
    RemoveCategory(String),
    AddKeyword { category: String, keyword: String },
    RemoveKeyword { category: String, keyword: String },
}

impl FieldEdit {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::AddTag(_) => "add-tag",
            Self::RemoveTag(_) => "remove-tag",
            Self::MoveTag { .. } => "move-tag",
            Self::ReplaceRows(_) => "replace-rows",
            Self::SetRow { .. } => "set-row",
            Self::RemoveRow(_) => "remove-row",
            Self::Block(_) => "block",
            Self::AddCategory(_) => "add-category",
            Self::RemoveCategory(_) => "remove-category",
            Self::AddKeyword { .. } => "add-keyword",
            Self::RemoveKeyword { .. } => "remove-keyword",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
struct MappingDraft {
    value: Mapping,
    pending_block: Option<String>,
}

impl MappingDraft {
    fn new(value: &Mapping) -> Self {
        Self {
            value: value.clone(),
            pending_block: None,
        }
    }

    fn resolved(&self) -> Result<Mapping, FieldErrorCause> {
        match &self.pending_block {
            Some(text) => Ok(decode_block(text)?),
            None => Ok(self.value.clone()),
        }
    }

    // Row edits start from the block text if one is pending, so it must decode first.
    fn settle(&mut self) -> Result<(), FieldErrorCause> {
        if self.pending_block.is_some() {
            self.value = self.resolved()?;
            self.pending_block = None;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq)]
struct KeywordDraft {
    categories: KeywordCategories,
    pending_block: Option<String>,
}

impl KeywordDraft {
    fn resolved(&self) -> Result<KeywordCategories, FieldErrorCause> {
        match &self.pending_block {
            Some(text) => decode_keyword_block(text),
            None => Ok(self.categories.clone()),
        }
    }

    fn settle(&mut self) -> Result<(), FieldErrorCause> {
        if self.pending_block.is_some() {
            self.categories = self.resolved()?;
            self.pending_block = None;
        }
        Ok(())
    }
}

/// Working draft of a [`PipelineConfig`]. The value it was started from is
/// never modified; a successful save replaces it through a new session.
#[derive(Debug, Clone)]
pub struct EditingSession {
    baseline: PipelineConfig,
    steps: Vec<String>,
    line_filter: MappingDraft,
    semantic_templates: MappingDraft,
    index_rules: MappingDraft,
    classifier_foreigner: MappingDraft,
    keywords: KeywordDraft,
    // What a save of the untouched drafts would send; keyword categories are
    // normalized on load, so this can differ from `baseline.to_payload()`.
    pristine: SavePayload,
}

impl EditingSession {
    pub fn begin_edit(config: &PipelineConfig) -> Self {
        let mut session = Self {
            baseline: config.clone(),
            steps: config.steps.clone(),
            line_filter: MappingDraft::new(&config.line_filter),
            semantic_templates: MappingDraft::new(&config.semantic_templates),
            index_rules: MappingDraft::new(&config.index_rules),
            classifier_foreigner: MappingDraft::new(&config.classifier_foreigner),
            keywords: KeywordDraft {
                categories: encode_keyword_categories(&config.keywords_tech),
                pending_block: None,
            },
            pristine: config.to_payload(),
        };
        if let Ok(payload) = session.build_save_payload() {
            session.pristine = payload;
        }
        session
    }

    pub fn summary(&self) -> &Mapping {
        &self.baseline.summary
    }

    pub fn source(&self) -> ConfigSource {
        self.baseline.source
    }

    pub fn steps(&self) -> &[String] {
        &self.steps
    }

    pub fn keyword_categories(&self) -> &KeywordCategories {
        &self.keywords.categories
    }

    pub fn rows(&self, field: ConfigField) -> Option<Vec<KeyValueRow>> {
        self.mapping_draft(field)
            .map(|draft| encode_key_value(&draft.value))
    }

    pub fn block_text(&self, field: ConfigField) -> Option<String> {
        if field == ConfigField::KeywordsTech {
            return Some(self.keywords.pending_block.clone().unwrap_or_else(|| {
                encode_block(&decode_keyword_categories(&self.keywords.categories))
            }));
        }

        self.mapping_draft(field).map(|draft| {
            draft
                .pending_block
                .clone()
                .unwrap_or_else(|| encode_block(&draft.value))
        })
    }

    pub fn apply_field_edit(&mut self, field: ConfigField, edit: FieldEdit) -> Result<(), FieldError> {
        debug!(field = %field, edit = edit.kind(), "applying field edit");

        let outcome = match field.shape() {
            FieldShape::TagList => self.apply_tag_edit(edit),
            FieldShape::KeyValue => match self.mapping_draft_mut(field) {
                Some(draft) => apply_mapping_edit(draft, edit),
                None => Err(unsupported(&edit)),
            },
            FieldShape::KeywordCategories => apply_keyword_edit(&mut self.keywords, edit),
        };

        outcome.map_err(|cause| FieldError::new(field, cause))
    }

    pub fn build_save_payload(&self) -> Result<SavePayload, Vec<FieldError>> {
        let mut errors = Vec::new();

        let mut resolve = |field: ConfigField, draft: &MappingDraft| match draft.resolved() {
            Ok(mapping) => mapping,
            Err(cause) => {
                errors.push(FieldError::new(field, cause));
                Mapping::new()
            }
        };
        let line_filter = resolve(ConfigField::LineFilter, &self.line_filter);
        let semantic_templates = resolve(ConfigField::SemanticTemplates, &self.semantic_templates);
        let index_rules = resolve(ConfigField::IndexRules, &self.index_rules);
        let classifier_foreigner =
            resolve(ConfigField::ClassifierForeigner, &self.classifier_foreigner);

        let keywords_tech = match self.keywords.resolved() {
            Ok(categories) => decode_keyword_categories(&categories),
            Err(cause) => {
                errors.push(FieldError::new(ConfigField::KeywordsTech, cause));
                Mapping::new()
            }
        };

        if !errors.is_empty() {
            errors.sort_by_key(|error| error.field);
            return Err(errors);
        }

        Ok(SavePayload {
            steps: persistable_steps(&self.steps),
            line_filter,
            semantic_templates,
            keywords_tech,
            index_rules,
            classifier_foreigner,
        })
    }

    pub fn is_dirty(&self) -> bool {
        match self.build_save_payload() {
            Ok(payload) => payload != self.pristine,
            Err(_) => true,
        }
    }

    fn mapping_draft(&self, field: ConfigField) -> Option<&MappingDraft> {
        match field {
            ConfigField::LineFilter => Some(&self.line_filter),
            ConfigField::SemanticTemplates => Some(&self.semantic_templates),
            ConfigField::IndexRules => Some(&self.index_rules),
            ConfigField::ClassifierForeigner => Some(&self.classifier_foreigner),
            ConfigField::Steps | ConfigField::KeywordsTech => None,
        }
    }

    fn mapping_draft_mut(&mut self, field: ConfigField) -> Option<&mut MappingDraft> {
        match field {
            ConfigField::LineFilter => Some(&mut self.line_filter),
            ConfigField::SemanticTemplates => Some(&mut self.semantic_templates),
            ConfigField::IndexRules => Some(&mut self.index_rules),
            ConfigField::ClassifierForeigner => Some(&mut self.classifier_foreigner),
            ConfigField::Steps | ConfigField::KeywordsTech => None,
        }
    }

    fn apply_tag_edit(&mut self, edit: FieldEdit) -> Result<(), FieldErrorCause> {
        match edit {
            FieldEdit::AddTag(candidate) => {
                self.steps = decode_tag_list(&candidate, &self.steps);
            }
            FieldEdit::RemoveTag(tag) => {
                let target = tag.trim();
                self.steps.retain(|step| step != target);
            }
            FieldEdit::MoveTag { from, to } => {
                let len = self.steps.len();
                for index in [from, to] {
                    if index >= len {
                        return Err(ValidationError::OutOfRange { index, len }.into());
                    }
                }
                let step = self.steps.remove(from);
                self.steps.insert(to, step);
            }
            other => return Err(unsupported(&other)),
        }
        Ok(())
    }
}

fn apply_mapping_edit(draft: &mut MappingDraft, edit: FieldEdit) -> Result<(), FieldErrorCause> {
    match edit {
        FieldEdit::ReplaceRows(rows) => {
            draft.value = decode_key_value(&rows);
            draft.pending_block = None;
        }
        FieldEdit::SetRow { key, text } => {
            draft.settle()?;
            if let Some(value) = decode_key_value_row(&key, &text) {
                draft.value.insert(key, value);
            }
        }
        FieldEdit::RemoveRow(key) => {
            draft.settle()?;
            draft.value.remove(&key);
        }
        FieldEdit::Block(text) => {
            draft.pending_block = Some(text);
        }
        other => return Err(unsupported(&other)),
    }
    Ok(())
}

fn apply_keyword_edit(draft: &mut KeywordDraft, edit: FieldEdit) -> Result<(), FieldErrorCause> {
    match edit {
        FieldEdit::Block(text) => {
            draft.pending_block = Some(text);
        }
        FieldEdit::AddCategory(name) => {
            draft.settle()?;
            add_category(&mut draft.categories, &name)?;
        }
        FieldEdit::RemoveCategory(name) => {
            draft.settle()?;
            remove_category(&mut draft.categories, &name);
        }
        FieldEdit::AddKeyword { category, keyword } => {
            draft.settle()?;
            add_keyword(&mut draft.categories, &category, &keyword)?;
        }
        FieldEdit::RemoveKeyword { category, keyword } => {
            draft.settle()?;
            remove_keyword(&mut draft.categories, &category, &keyword);
        }
        other => return Err(unsupported(&other)),
    }
    Ok(())
}

fn unsupported(edit: &FieldEdit) -> FieldErrorCause {
    ValidationError::UnsupportedEdit { edit: edit.kind() }.into()
}
