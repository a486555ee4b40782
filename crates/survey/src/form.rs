//! Survey form definition as delivered by the CMS.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use storefront_core::{DomainError, DomainResult};

/// How a field is answered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldKind {
    /// One button per choice token.
    Choice,
    /// A single text input.
    FreeText,
}

/// One survey step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FormField {
    pub name: String,
    #[serde(default)]
    pub help_text: String,
    /// Raw comma-separated choice list (e.g. `"Mild, Kräftig, Sehr kräftig"`).
    #[serde(default)]
    pub choices: Option<String>,
    #[serde(default = "required_default")]
    pub required: bool,
}

fn required_default() -> bool {
    true
}

impl FormField {
    pub fn free_text(name: impl Into<String>, help_text: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            help_text: help_text.into(),
            choices: None,
            required: true,
        }
    }

    pub fn choice(
        name: impl Into<String>,
        help_text: impl Into<String>,
        choices: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            help_text: help_text.into(),
            choices: Some(choices.into()),
            required: true,
        }
    }

    /// Trimmed, non-empty choice tokens in their original order.
    pub fn choices(&self) -> Vec<&str> {
        self.choices
            .as_deref()
            .map(|raw| {
                raw.split(',')
                    .map(str::trim)
                    .filter(|c| !c.is_empty())
                    .collect()
            })
            .unwrap_or_default()
    }

    /// A field without any usable choice token is answered by free text.
    pub fn kind(&self) -> FieldKind {
        if self.choices().is_empty() {
            FieldKind::FreeText
        } else {
            FieldKind::Choice
        }
    }

    /// Whether `value` is an acceptable answer for this field.
    pub fn accepts(&self, value: &str) -> bool {
        match self.kind() {
            FieldKind::Choice => self.choices().contains(&value),
            FieldKind::FreeText => !value.trim().is_empty(),
        }
    }
}

/// The whole questionnaire plus its surrounding copy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", try_from = "SurveyFormRecord")]
pub struct SurveyForm {
    #[serde(rename = "surveyHead")]
    head: String,
    #[serde(rename = "surveySubhead")]
    subhead_html: String,
    #[serde(rename = "thankYouText")]
    thank_you_html: String,
    #[serde(rename = "formFields")]
    fields: Vec<FormField>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct SurveyFormRecord {
    #[serde(default)]
    survey_head: String,
    #[serde(default)]
    survey_subhead: String,
    #[serde(default)]
    thank_you_text: String,
    #[serde(default)]
    form_fields: Vec<FormField>,
}

impl TryFrom<SurveyFormRecord> for SurveyForm {
    type Error = DomainError;

    fn try_from(r: SurveyFormRecord) -> Result<Self, Self::Error> {
        SurveyForm::new(r.survey_head, r.survey_subhead, r.thank_you_text, r.form_fields)
    }
}

impl SurveyForm {
    /// Field names are answer keys, so they must be non-empty and unique.
    pub fn new(
        head: impl Into<String>,
        subhead_html: impl Into<String>,
        thank_you_html: impl Into<String>,
        fields: Vec<FormField>,
    ) -> DomainResult<Self> {
        let mut seen = HashSet::new();
        for field in &fields {
            if field.name.trim().is_empty() {
                return Err(DomainError::validation("form field without a name"));
            }
            if !seen.insert(field.name.as_str()) {
                return Err(DomainError::validation(format!(
                    "duplicate form field name: {}",
                    field.name
                )));
            }
        }

        Ok(Self {
            head: head.into(),
            subhead_html: subhead_html.into(),
            thank_you_html: thank_you_html.into(),
            fields,
        })
    }

    pub fn head(&self) -> &str {
        &self.head
    }

    pub fn subhead_html(&self) -> &str {
        &self.subhead_html
    }

    pub fn thank_you_html(&self) -> &str {
        &self.thank_you_html
    }

    pub fn fields(&self) -> &[FormField] {
        &self.fields
    }

    pub fn field(&self, index: usize) -> Option<&FormField> {
        self.fields.get(index)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}
