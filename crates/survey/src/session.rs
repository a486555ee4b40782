//! Drives one survey from first answer to revealed recommendation.

use std::sync::Arc;

use chrono::Utc;
use tokio::task::JoinHandle;

use storefront_cart::ProductCard;
use storefront_catalog::Product;
use storefront_core::{AggregateRoot, CorrelationId, DomainError, DomainResult};
use storefront_events::{Event, execute};

use crate::form::SurveyForm;
use crate::intake::{SessionToken, SurveyIntake, SurveySubmission};
use crate::progression::{
    AnswerField, Finish, ReviseAnswer, SettleSubmission, SubmissionOutcome, Survey,
    SurveyCommand, SurveyEvent,
};
use crate::recommendation::RecommendationFilter;
use crate::view::{SurveyView, render};

/// Survey state plus the collaborators it talks to.
pub struct SurveySession {
    survey: Survey,
    intake: Arc<dyn SurveyIntake>,
    recommendation: RecommendationFilter,
}

impl SurveySession {
    pub fn new(form: SurveyForm, intake: Arc<dyn SurveyIntake>) -> Self {
        Self {
            survey: Survey::start(form),
            intake,
            recommendation: RecommendationFilter::default(),
        }
    }

    pub fn with_recommendation(mut self, recommendation: RecommendationFilter) -> Self {
        self.recommendation = recommendation;
        self
    }

    pub fn survey(&self) -> &Survey {
        &self.survey
    }

    pub fn view(&self) -> SurveyView {
        render(&self.survey)
    }

    /// Answer field `index` (a choice click or committed text).
    pub fn answer(&mut self, index: usize, value: impl Into<String>) -> DomainResult<()> {
        let name = self
            .survey
            .form()
            .field(index)
            .map(|f| f.name.clone())
            .ok_or_else(DomainError::not_found)?;

        let cmd = SurveyCommand::AnswerField(AnswerField {
            index,
            name,
            value: value.into(),
            occurred_at: Utc::now(),
        });
        self.run(&cmd)
    }

    /// Change the answer of an already answered field.
    pub fn revise(&mut self, index: usize, value: impl Into<String>) -> DomainResult<()> {
        let cmd = SurveyCommand::ReviseAnswer(ReviseAnswer {
            index,
            value: value.into(),
            occurred_at: Utc::now(),
        });
        self.run(&cmd)
    }

    /// Reveal the result and hand back the one submission to send.
    ///
    /// The survey is revealed as soon as this returns; nothing here waits on
    /// the intake. Send the returned [`PendingSubmission`] (or spawn it) and
    /// pass its receipt to [`SurveySession::settle`] to record the outcome.
    pub fn finish(&mut self, token: Option<SessionToken>) -> DomainResult<PendingSubmission> {
        let submission_id = CorrelationId::new();
        let started = execute(
            &mut self.survey,
            &SurveyCommand::Finish(Finish {
                submission_id,
                token,
                occurred_at: Utc::now(),
            }),
        )?;
        self.log_events(&started);

        let submission = started
            .into_iter()
            .find_map(|ev| match ev {
                SurveyEvent::SubmissionStarted(e) => Some(e.submission),
                _ => None,
            })
            .ok_or_else(|| DomainError::invariant("finish produced no submission"))?;

        Ok(PendingSubmission {
            submission_id,
            submission,
            intake: Arc::clone(&self.intake),
        })
    }

    /// Record how the intake call ended. The visitor never sees the outcome.
    pub fn settle(&mut self, receipt: SubmissionReceipt) -> DomainResult<()> {
        self.run(&SurveyCommand::SettleSubmission(SettleSubmission {
            submission_id: receipt.submission_id,
            outcome: receipt.outcome,
            occurred_at: Utc::now(),
        }))
    }

    /// The recommended product, once the result is revealed.
    pub fn recommendation<'a>(&self, candidates: &'a [Product]) -> Option<&'a Product> {
        if !self.survey.is_revealed() {
            return None;
        }
        self.recommendation.select(candidates)
    }

    /// A freshly mounted card for the recommended product.
    pub fn recommended_card(&self, candidates: &[Product]) -> Option<ProductCard> {
        self.recommendation(candidates)
            .map(|product| ProductCard::mount(product.clone()))
    }

    fn run(&mut self, cmd: &SurveyCommand) -> DomainResult<()> {
        match execute(&mut self.survey, cmd) {
            Ok(events) => {
                self.log_events(&events);
                Ok(())
            }
            Err(err) => {
                tracing::debug!(survey_id = %self.survey.id(), error = %err, "survey command rejected");
                Err(err)
            }
        }
    }

    fn log_events(&self, events: &[SurveyEvent]) {
        for ev in events {
            tracing::debug!(
                survey_id = %self.survey.id(),
                event_type = ev.event_type(),
                occurred_at = %ev.occurred_at(),
                "survey transition"
            );
        }
    }
}

/// How one submission ended, ready for [`SurveySession::settle`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmissionReceipt {
    pub submission_id: CorrelationId,
    pub outcome: SubmissionOutcome,
}

/// The answer set of a finished survey, not yet sent.
///
/// Sent exactly once: no retry, no timeout, no cancellation beyond dropping it.
pub struct PendingSubmission {
    submission_id: CorrelationId,
    submission: SurveySubmission,
    intake: Arc<dyn SurveyIntake>,
}

impl PendingSubmission {
    pub fn submission_id(&self) -> CorrelationId {
        self.submission_id
    }

    pub fn submission(&self) -> &SurveySubmission {
        &self.submission
    }

    /// Hand the answers to the intake and log how that went.
    pub async fn send(self) -> SubmissionReceipt {
        let submission_id = self.submission_id;
        tracing::debug!(
            %submission_id,
            fields = self.submission.values.len(),
            has_token = self.submission.token.is_some(),
            "submitting survey"
        );

        let outcome = SubmissionOutcome::from(self.intake.submit(&self.submission).await);
        match &outcome {
            SubmissionOutcome::Accepted { result } => {
                tracing::info!(%submission_id, ?result, "survey submission accepted");
            }
            SubmissionOutcome::Rejected { errors } => {
                tracing::warn!(%submission_id, ?errors, "survey submission rejected by intake");
            }
            SubmissionOutcome::Failed { reason } => {
                tracing::warn!(%submission_id, %reason, "survey submission failed");
            }
        }

        SubmissionReceipt {
            submission_id,
            outcome,
        }
    }

    /// Send on the current tokio runtime without waiting for it.
    pub fn spawn(self) -> JoinHandle<SubmissionReceipt> {
        tokio::spawn(self.send())
    }
}
