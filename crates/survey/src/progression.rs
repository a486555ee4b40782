use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use storefront_core::{Aggregate, AggregateId, AggregateRoot, CorrelationId, DomainError};
use storefront_events::Event;

use crate::form::{FieldKind, SurveyForm};
use crate::intake::{FieldErrors, IntakeError, IntakeResponse, SessionToken, SurveySubmission};

/// Survey lifecycle. `Result` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", tag = "phase")]
pub enum SurveyPhase {
    /// Answers exist for fields `[0, completed)`.
    InProgress { completed: usize },
    /// The answer set has been handed to the intake. The recommendation is
    /// already revealed; the intake's outcome is recorded when it settles.
    Submitting { submission_id: CorrelationId },
    /// The intake call ended.
    Result,
}

/// How the intake call ended. Every outcome leads to `Result`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", tag = "outcome")]
pub enum SubmissionOutcome {
    Accepted { result: Option<String> },
    Rejected { errors: Vec<FieldErrors> },
    Failed { reason: String },
}

impl From<Result<IntakeResponse, IntakeError>> for SubmissionOutcome {
    fn from(value: Result<IntakeResponse, IntakeError>) -> Self {
        match value {
            Ok(resp) if resp.is_accepted() => SubmissionOutcome::Accepted { result: resp.result },
            Ok(resp) => SubmissionOutcome::Rejected {
                errors: resp.errors.unwrap_or_default(),
            },
            Err(err) => SubmissionOutcome::Failed {
                reason: err.to_string(),
            },
        }
    }
}

/// Aggregate root: one visitor's pass through the survey.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Survey {
    id: AggregateId,
    form: SurveyForm,
    answers: BTreeMap<String, String>,
    phase: SurveyPhase,
    last_outcome: Option<SubmissionOutcome>,
    version: u64,
}

impl Survey {
    pub fn start(form: SurveyForm) -> Self {
        Self::start_with_id(AggregateId::new(), form)
    }

    pub fn start_with_id(id: AggregateId, form: SurveyForm) -> Self {
        Self {
            id,
            form,
            answers: BTreeMap::new(),
            phase: SurveyPhase::InProgress { completed: 0 },
            last_outcome: None,
            version: 0,
        }
    }

    pub fn form(&self) -> &SurveyForm {
        &self.form
    }

    pub fn phase(&self) -> SurveyPhase {
        self.phase
    }

    /// Number of answered fields; the cursor never moves backwards.
    pub fn completed_count(&self) -> usize {
        match self.phase {
            SurveyPhase::InProgress { completed } => completed,
            SurveyPhase::Submitting { .. } | SurveyPhase::Result => self.form.len(),
        }
    }

    /// Every field has an answer.
    pub fn is_complete(&self) -> bool {
        self.completed_count() == self.form.len()
    }

    /// The "finish" action is offered only while answering and once complete.
    pub fn can_finish(&self) -> bool {
        matches!(self.phase, SurveyPhase::InProgress { .. }) && self.is_complete()
    }

    pub fn is_result(&self) -> bool {
        self.phase == SurveyPhase::Result
    }

    /// The recommendation is shown from the moment the survey is finished,
    /// without waiting for the intake.
    pub fn is_revealed(&self) -> bool {
        !matches!(self.phase, SurveyPhase::InProgress { .. })
    }

    /// Id of the submission still awaiting its outcome, if any.
    pub fn pending_submission(&self) -> Option<CorrelationId> {
        match self.phase {
            SurveyPhase::Submitting { submission_id } => Some(submission_id),
            _ => None,
        }
    }

    pub fn answer(&self, field_name: &str) -> Option<&str> {
        self.answers.get(field_name).map(String::as_str)
    }

    pub fn answers(&self) -> &BTreeMap<String, String> {
        &self.answers
    }

    pub fn last_outcome(&self) -> Option<&SubmissionOutcome> {
        self.last_outcome.as_ref()
    }
}

impl AggregateRoot for Survey {
    type Id = AggregateId;

    fn id(&self) -> &Self::Id {
        &self.id
    }

    fn version(&self) -> u64 {
        self.version
    }
}

/// Command: AnswerField (the currently revealed field gets its answer).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnswerField {
    pub index: usize,
    pub name: String,
    pub value: String,
    pub occurred_at: DateTime<Utc>,
}

/// Command: ReviseAnswer (change an already answered field).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReviseAnswer {
    pub index: usize,
    pub value: String,
    pub occurred_at: DateTime<Utc>,
}

/// Command: Finish (hand the answers to the intake).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Finish {
    pub submission_id: CorrelationId,
    pub token: Option<SessionToken>,
    pub occurred_at: DateTime<Utc>,
}

/// Command: SettleSubmission (the intake call ended, one way or another).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SettleSubmission {
    pub submission_id: CorrelationId,
    pub outcome: SubmissionOutcome,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum SurveyCommand {
    AnswerField(AnswerField),
    ReviseAnswer(ReviseAnswer),
    Finish(Finish),
    SettleSubmission(SettleSubmission),
}

/// Event: FieldAnswered.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldAnswered {
    pub survey_id: AggregateId,
    pub index: usize,
    pub name: String,
    pub value: String,
    pub occurred_at: DateTime<Utc>,
}

/// Event: AnswerRevised.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnswerRevised {
    pub survey_id: AggregateId,
    pub index: usize,
    pub name: String,
    pub value: String,
    pub occurred_at: DateTime<Utc>,
}

/// Event: SubmissionStarted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmissionStarted {
    pub survey_id: AggregateId,
    pub submission_id: CorrelationId,
    pub submission: SurveySubmission,
    pub occurred_at: DateTime<Utc>,
}

/// Event: SubmissionSettled.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmissionSettled {
    pub survey_id: AggregateId,
    pub submission_id: CorrelationId,
    pub outcome: SubmissionOutcome,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum SurveyEvent {
    FieldAnswered(FieldAnswered),
    AnswerRevised(AnswerRevised),
    SubmissionStarted(SubmissionStarted),
    SubmissionSettled(SubmissionSettled),
}

impl Event for SurveyEvent {
    fn event_type(&self) -> &'static str {
        match self {
            SurveyEvent::FieldAnswered(_) => "survey.field.answered",
            SurveyEvent::AnswerRevised(_) => "survey.answer.revised",
            SurveyEvent::SubmissionStarted(_) => "survey.submission.started",
            SurveyEvent::SubmissionSettled(_) => "survey.submission.settled",
        }
    }

    fn version(&self) -> u32 {
        1
    }

    fn occurred_at(&self) -> DateTime<Utc> {
        match self {
            SurveyEvent::FieldAnswered(e) => e.occurred_at,
            SurveyEvent::AnswerRevised(e) => e.occurred_at,
            SurveyEvent::SubmissionStarted(e) => e.occurred_at,
            SurveyEvent::SubmissionSettled(e) => e.occurred_at,
        }
    }
}

impl Aggregate for Survey {
    type Command = SurveyCommand;
    type Event = SurveyEvent;
    type Error = DomainError;

    fn apply(&mut self, event: &Self::Event) {
        match event {
            SurveyEvent::FieldAnswered(e) => {
                self.answers.insert(e.name.clone(), e.value.clone());
                self.phase = SurveyPhase::InProgress { completed: e.index + 1 };
            }
            SurveyEvent::AnswerRevised(e) => {
                self.answers.insert(e.name.clone(), e.value.clone());
            }
            SurveyEvent::SubmissionStarted(e) => {
                self.phase = SurveyPhase::Submitting {
                    submission_id: e.submission_id,
                };
            }
            SurveyEvent::SubmissionSettled(e) => {
                self.last_outcome = Some(e.outcome.clone());
                self.phase = SurveyPhase::Result;
            }
        }

        self.version += 1;
    }

    fn handle(&self, command: &Self::Command) -> Result<Vec<Self::Event>, Self::Error> {
        match command {
            SurveyCommand::AnswerField(cmd) => self.handle_answer(cmd),
            SurveyCommand::ReviseAnswer(cmd) => self.handle_revise(cmd),
            SurveyCommand::Finish(cmd) => self.handle_finish(cmd),
            SurveyCommand::SettleSubmission(cmd) => self.handle_settle(cmd),
        }
    }
}

impl Survey {
    fn ensure_in_progress(&self) -> Result<usize, DomainError> {
        match self.phase {
            SurveyPhase::InProgress { completed } => Ok(completed),
            _ => Err(DomainError::invariant("survey is no longer accepting answers")),
        }
    }

    fn ensure_acceptable(&self, index: usize, value: &str) -> Result<(), DomainError> {
        let field = self.form.field(index).ok_or_else(DomainError::not_found)?;
        if field.accepts(value) {
            return Ok(());
        }
        Err(match field.kind() {
            FieldKind::Choice => DomainError::validation(format!(
                "{value:?} is not a choice of field {}",
                field.name
            )),
            FieldKind::FreeText => {
                DomainError::validation(format!("field {} needs a non-blank answer", field.name))
            }
        })
    }

    fn handle_answer(&self, cmd: &AnswerField) -> Result<Vec<SurveyEvent>, DomainError> {
        let completed = self.ensure_in_progress()?;

        if completed == self.form.len() {
            return Err(DomainError::invariant("all fields are already answered"));
        }
        if cmd.index != completed {
            return Err(DomainError::invariant(format!(
                "answers must follow field order: expected field {completed}, got {}",
                cmd.index
            )));
        }

        let field = self.form.field(cmd.index).ok_or_else(DomainError::not_found)?;
        if field.name != cmd.name {
            return Err(DomainError::validation(format!(
                "field {} is named {}, not {}",
                cmd.index, field.name, cmd.name
            )));
        }
        self.ensure_acceptable(cmd.index, &cmd.value)?;

        Ok(vec![SurveyEvent::FieldAnswered(FieldAnswered {
            survey_id: self.id,
            index: cmd.index,
            name: cmd.name.clone(),
            value: cmd.value.clone(),
            occurred_at: cmd.occurred_at,
        })])
    }

    fn handle_revise(&self, cmd: &ReviseAnswer) -> Result<Vec<SurveyEvent>, DomainError> {
        let completed = self.ensure_in_progress()?;

        if cmd.index >= completed {
            return Err(DomainError::invariant(format!(
                "field {} has not been answered yet",
                cmd.index
            )));
        }
        self.ensure_acceptable(cmd.index, &cmd.value)?;

        let field = self.form.field(cmd.index).ok_or_else(DomainError::not_found)?;
        if self.answer(&field.name) == Some(cmd.value.as_str()) {
            return Ok(vec![]);
        }

        Ok(vec![SurveyEvent::AnswerRevised(AnswerRevised {
            survey_id: self.id,
            index: cmd.index,
            name: field.name.clone(),
            value: cmd.value.clone(),
            occurred_at: cmd.occurred_at,
        })])
    }

    fn handle_finish(&self, cmd: &Finish) -> Result<Vec<SurveyEvent>, DomainError> {
        let completed = self.ensure_in_progress()?;

        if completed != self.form.len() {
            return Err(DomainError::invariant(format!(
                "survey incomplete: {completed} of {} fields answered",
                self.form.len()
            )));
        }

        Ok(vec![SurveyEvent::SubmissionStarted(SubmissionStarted {
            survey_id: self.id,
            submission_id: cmd.submission_id,
            submission: SurveySubmission {
                token: cmd.token.clone(),
                values: self.answers.clone(),
            },
            occurred_at: cmd.occurred_at,
        })])
    }

    fn handle_settle(&self, cmd: &SettleSubmission) -> Result<Vec<SurveyEvent>, DomainError> {
        match self.phase {
            SurveyPhase::Submitting { submission_id } if submission_id == cmd.submission_id => {
                Ok(vec![SurveyEvent::SubmissionSettled(SubmissionSettled {
                    survey_id: self.id,
                    submission_id,
                    outcome: cmd.outcome.clone(),
                    occurred_at: cmd.occurred_at,
                })])
            }
            SurveyPhase::Submitting { .. } => {
                Err(DomainError::invariant("settlement for an unknown submission"))
            }
            _ => Err(DomainError::invariant("no submission in flight")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use storefront_events::execute;

    use crate::form::FormField;

    fn test_time() -> DateTime<Utc> {
        Utc::now()
    }

    fn test_form() -> SurveyForm {
        SurveyForm::new(
            "Finde deinen Black Wolf",
            "",
            "<p>Danke</p>",
            vec![
                FormField::choice("method", "Wie brühst du?", "Filter, Espresso, French Press"),
                FormField::choice("strength", "Wie stark?", "Mild, Kräftig"),
                FormField::free_text("name", "Wie heißt du?"),
            ],
        )
        .unwrap()
    }

    fn answer(index: usize, name: &str, value: &str) -> SurveyCommand {
        SurveyCommand::AnswerField(AnswerField {
            index,
            name: name.to_string(),
            value: value.to_string(),
            occurred_at: test_time(),
        })
    }

    fn finish(submission_id: CorrelationId) -> SurveyCommand {
        SurveyCommand::Finish(Finish {
            submission_id,
            token: Some(SessionToken::new("fp-1")),
            occurred_at: test_time(),
        })
    }

    fn settle(submission_id: CorrelationId, outcome: SubmissionOutcome) -> SurveyCommand {
        SurveyCommand::SettleSubmission(SettleSubmission {
            submission_id,
            outcome,
            occurred_at: test_time(),
        })
    }

    fn answered_survey() -> Survey {
        let mut survey = Survey::start(test_form());
        execute(&mut survey, &answer(0, "method", "Espresso")).unwrap();
        execute(&mut survey, &answer(1, "strength", "Kräftig")).unwrap();
        execute(&mut survey, &answer(2, "name", "Ada")).unwrap();
        survey
    }

    #[test]
    fn starts_in_progress_with_nothing_answered() {
        let survey = Survey::start(test_form());
        assert_eq!(survey.phase(), SurveyPhase::InProgress { completed: 0 });
        assert!(!survey.is_revealed());
        assert!(!survey.can_finish());
        assert!(survey.answers().is_empty());
    }

    #[test]
    fn answer_emits_field_answered_and_advances_cursor() {
        let mut survey = Survey::start(test_form());
        let events = execute(&mut survey, &answer(0, "method", "Filter")).unwrap();
        assert_eq!(events.len(), 1);

        match &events[0] {
            SurveyEvent::FieldAnswered(e) => {
                assert_eq!(e.index, 0);
                assert_eq!(e.name, "method");
                assert_eq!(e.value, "Filter");
            }
            _ => panic!("Expected FieldAnswered event"),
        }
        assert_eq!(survey.completed_count(), 1);
        assert_eq!(survey.answer("method"), Some("Filter"));
    }

    #[test]
    fn out_of_order_answer_is_rejected_without_state_change() {
        let mut survey = Survey::start(test_form());
        let before = survey.clone();

        let err = execute(&mut survey, &answer(1, "strength", "Mild")).unwrap_err();
        assert!(matches!(err, DomainError::InvariantViolation(_)));
        assert_eq!(survey, before);
    }

    #[test]
    fn answer_validates_name_and_choice() {
        let mut survey = Survey::start(test_form());

        let err = execute(&mut survey, &answer(0, "strength", "Filter")).unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));

        let err = execute(&mut survey, &answer(0, "method", "Aeropress")).unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));

        execute(&mut survey, &answer(0, "method", "Filter")).unwrap();
        execute(&mut survey, &answer(1, "strength", "Mild")).unwrap();
        let err = execute(&mut survey, &answer(2, "name", "  ")).unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
        assert_eq!(survey.completed_count(), 2);
    }

    #[test]
    fn cursor_stops_at_field_count() {
        let mut survey = answered_survey();
        assert_eq!(survey.completed_count(), 3);
        assert!(survey.can_finish());

        let err = execute(&mut survey, &answer(3, "extra", "x")).unwrap_err();
        assert!(matches!(err, DomainError::InvariantViolation(_)));
        assert_eq!(survey.completed_count(), 3);
    }

    #[test]
    fn revise_changes_value_but_not_cursor() {
        let mut survey = Survey::start(test_form());
        execute(&mut survey, &answer(0, "method", "Filter")).unwrap();

        let revise = |index: usize, value: &str| {
            SurveyCommand::ReviseAnswer(ReviseAnswer {
                index,
                value: value.to_string(),
                occurred_at: test_time(),
            })
        };

        let events = execute(&mut survey, &revise(0, "Espresso")).unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(survey.answer("method"), Some("Espresso"));
        assert_eq!(survey.completed_count(), 1);

        // same value again: nothing happens
        assert!(execute(&mut survey, &revise(0, "Espresso")).unwrap().is_empty());

        // not yet answered
        let err = execute(&mut survey, &revise(1, "Mild")).unwrap_err();
        assert!(matches!(err, DomainError::InvariantViolation(_)));
    }

    #[test]
    fn finish_requires_all_answers() {
        let mut survey = Survey::start(test_form());
        execute(&mut survey, &answer(0, "method", "Filter")).unwrap();

        let err = execute(&mut survey, &finish(CorrelationId::new())).unwrap_err();
        assert!(matches!(err, DomainError::InvariantViolation(_)));
    }

    #[test]
    fn finish_carries_token_and_answers() {
        let mut survey = answered_survey();
        let submission_id = CorrelationId::new();
        let events = execute(&mut survey, &finish(submission_id)).unwrap();
        assert_eq!(events[0].event_type(), "survey.submission.started");

        match &events[0] {
            SurveyEvent::SubmissionStarted(e) => {
                assert_eq!(e.submission_id, submission_id);
                assert_eq!(e.submission.token.as_ref().unwrap().as_str(), "fp-1");
                assert_eq!(e.submission.values.len(), 3);
                assert_eq!(e.submission.values["strength"], "Kräftig");
            }
            _ => panic!("Expected SubmissionStarted event"),
        }
        assert_eq!(survey.phase(), SurveyPhase::Submitting { submission_id });
        assert_eq!(survey.pending_submission(), Some(submission_id));
        assert!(survey.is_revealed());
        assert!(!survey.is_result());
        assert!(!survey.can_finish());

        // answers are frozen while submitting
        let err = execute(&mut survey, &answer(0, "method", "Filter")).unwrap_err();
        assert!(matches!(err, DomainError::InvariantViolation(_)));
    }

    #[test]
    fn failed_submission_still_reaches_result() {
        let mut survey = answered_survey();
        let submission_id = CorrelationId::new();
        execute(&mut survey, &finish(submission_id)).unwrap();

        let outcome = SubmissionOutcome::from(Err(IntakeError::Transport("offline".into())));
        let events = execute(&mut survey, &settle(submission_id, outcome)).unwrap();

        assert_eq!(events[0].event_type(), "survey.submission.settled");
        assert!(survey.is_result());
        assert!(matches!(
            survey.last_outcome(),
            Some(SubmissionOutcome::Failed { .. })
        ));
    }

    #[test]
    fn settle_is_only_valid_for_the_submission_in_flight() {
        let mut survey = answered_survey();
        let accepted = SubmissionOutcome::Accepted { result: None };

        let err = execute(&mut survey, &settle(CorrelationId::new(), accepted.clone())).unwrap_err();
        assert!(matches!(err, DomainError::InvariantViolation(_)));

        let submission_id = CorrelationId::new();
        execute(&mut survey, &finish(submission_id)).unwrap();
        let err = execute(&mut survey, &settle(CorrelationId::new(), accepted.clone())).unwrap_err();
        assert!(matches!(err, DomainError::InvariantViolation(_)));

        execute(&mut survey, &settle(submission_id, accepted.clone())).unwrap();

        // Result is terminal
        let err = execute(&mut survey, &settle(submission_id, accepted)).unwrap_err();
        assert!(matches!(err, DomainError::InvariantViolation(_)));
        let err = execute(&mut survey, &finish(CorrelationId::new())).unwrap_err();
        assert!(matches!(err, DomainError::InvariantViolation(_)));
        assert!(survey.is_result());
    }

    #[test]
    fn empty_form_can_finish_immediately() {
        let mut survey = Survey::start(SurveyForm::new("", "", "", vec![]).unwrap());
        assert!(survey.can_finish());
        let events = execute(&mut survey, &finish(CorrelationId::new())).unwrap();
        assert_eq!(events.len(), 1);
    }

    #[test]
    fn outcome_classifies_intake_responses() {
        let accepted = SubmissionOutcome::from(Ok(IntakeResponse {
            result: Some("ok".into()),
            errors: Some(vec![]),
        }));
        assert_eq!(accepted, SubmissionOutcome::Accepted { result: Some("ok".into()) });

        let rejected = SubmissionOutcome::from(Ok(IntakeResponse {
            result: None,
            errors: Some(vec![FieldErrors {
                name: "name".into(),
                errors: vec!["too short".into()],
            }]),
        }));
        assert!(matches!(rejected, SubmissionOutcome::Rejected { ref errors } if errors.len() == 1));
    }

    mod proptest_tests {
        use super::*;
        use proptest::prelude::*;

        fn free_text_form(n: usize) -> SurveyForm {
            let fields = (0..n)
                .map(|i| FormField::free_text(format!("q{i}"), format!("Frage {i}")))
                .collect();
            SurveyForm::new("", "", "", fields).unwrap()
        }

        proptest! {
            #![proptest_config(ProptestConfig {
                cases: 500,
                ..ProptestConfig::default()
            })]

            /// Property: only the answer for field `completed` is ever accepted,
            /// and the cursor never exceeds the number of fields.
            #[test]
            fn only_in_order_answers_move_the_cursor(
                n in 1usize..8,
                attempts in prop::collection::vec(0usize..10, 0..40),
            ) {
                let form = free_text_form(n);
                let mut survey = Survey::start(form);

                for index in attempts {
                    let before = survey.completed_count();
                    let result = execute(
                        &mut survey,
                        &answer(index, &format!("q{index}"), "ja"),
                    );

                    if index == before && before < n {
                        prop_assert!(result.is_ok());
                        prop_assert_eq!(survey.completed_count(), before + 1);
                    } else {
                        prop_assert!(result.is_err());
                        prop_assert_eq!(survey.completed_count(), before);
                    }
                    prop_assert!(survey.completed_count() <= n);
                }
            }
        }
    }
}
