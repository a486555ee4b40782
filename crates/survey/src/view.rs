//! Progressive-reveal view model of the survey section.
//!
//! While answering, fields up to and including the first unanswered one are
//! listed; later fields are absent, not disabled.

use serde::Serialize;

use crate::form::{FieldKind, FormField};
use crate::progression::{Survey, SurveyPhase};

pub const FINISH_LABEL: &str = "Jetzt individuelle Röstung finden";
pub const RESULT_HEADING: &str = "Ihr persönlicher Black Wolf";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChoiceButton {
    pub label: String,
    pub selected: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase", tag = "kind")]
pub enum FieldInput {
    Choices { buttons: Vec<ChoiceButton> },
    Text { value: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldView {
    pub index: usize,
    pub name: String,
    pub help_text: String,
    pub input: FieldInput,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase", tag = "state")]
pub enum SurveyBody {
    Questions {
        fields: Vec<FieldView>,
        /// `Some(label)` once every field is answered.
        finish: Option<&'static str>,
    },
    /// Shown as soon as the survey is finished, whether or not the intake has
    /// answered yet.
    Result {
        heading: &'static str,
        thank_you_html: String,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SurveyView {
    pub head: String,
    pub subhead_html: String,
    pub body: SurveyBody,
}

/// Build the view model for the survey's current state.
pub fn render(survey: &Survey) -> SurveyView {
    let form = survey.form();

    let body = match survey.phase() {
        SurveyPhase::InProgress { completed } => SurveyBody::Questions {
            fields: form
                .fields()
                .iter()
                .enumerate()
                .take_while(|(index, _)| *index <= completed)
                .map(|(index, field)| field_view(index, field, survey.answer(&field.name)))
                .collect(),
            finish: survey.can_finish().then_some(FINISH_LABEL),
        },
        SurveyPhase::Submitting { .. } | SurveyPhase::Result => SurveyBody::Result {
            heading: RESULT_HEADING,
            thank_you_html: form.thank_you_html().to_string(),
        },
    };

    SurveyView {
        head: form.head().to_string(),
        subhead_html: form.subhead_html().to_string(),
        body,
    }
}

fn field_view(index: usize, field: &FormField, answer: Option<&str>) -> FieldView {
    let input = match field.kind() {
        FieldKind::Choice => FieldInput::Choices {
            buttons: field
                .choices()
                .into_iter()
                .map(|choice| ChoiceButton {
                    label: choice.to_string(),
                    selected: answer == Some(choice),
                })
                .collect(),
        },
        FieldKind::FreeText => FieldInput::Text {
            value: answer.unwrap_or_default().to_string(),
        },
    };

    FieldView {
        index,
        name: field.name.clone(),
        help_text: field.help_text.clone(),
        input,
    }
}
