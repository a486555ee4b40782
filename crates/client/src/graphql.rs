//! Survey intake over the storefront's GraphQL endpoint.

use anyhow::Context;
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;

use storefront_survey::{IntakeError, IntakeResponse, SurveyIntake, SurveySubmission};

use crate::config::ClientConfig;

/// The `setSurvey` mutation targeting the survey page at `survey_path`.
pub fn mutation_document(survey_path: &str) -> String {
    // A JSON string literal is also a valid GraphQL string literal.
    let url = serde_json::Value::String(survey_path.to_string());
    format!(
        "mutation setSurvey($token: String!, $values: GenericScalar!) {{ \
         surveySurveyFormPage(token: $token, url: {url}, values: $values) {{ \
         result errors {{ name errors }} }} }}"
    )
}

/// Full request body: query plus `{ token, values }` variables.
pub fn request_body(survey_path: &str, submission: &SurveySubmission) -> serde_json::Value {
    json!({
        "query": mutation_document(survey_path),
        "variables": {
            "token": submission.token,
            "values": submission.values,
        },
    })
}

#[derive(Debug, Deserialize)]
struct GraphqlEnvelope {
    #[serde(default)]
    data: Option<MutationData>,
    #[serde(default)]
    errors: Option<Vec<GraphqlError>>,
}

#[derive(Debug, Deserialize)]
struct MutationData {
    #[serde(rename = "surveySurveyFormPage", default)]
    survey_form_page: Option<IntakeResponse>,
}

#[derive(Debug, Deserialize)]
struct GraphqlError {
    message: String,
}

/// Decode a GraphQL response body into the intake's answer.
pub fn decode_response(body: &str) -> Result<IntakeResponse, IntakeError> {
    let envelope: GraphqlEnvelope =
        serde_json::from_str(body).map_err(|e| IntakeError::Decode(e.to_string()))?;

    if let Some(errors) = envelope.errors.filter(|e| !e.is_empty()) {
        return Err(IntakeError::Remote(
            errors.into_iter().map(|e| e.message).collect(),
        ));
    }

    envelope
        .data
        .and_then(|d| d.survey_form_page)
        .ok_or_else(|| IntakeError::Decode("missing surveySurveyFormPage payload".to_string()))
}

/// [`SurveyIntake`] posting the `setSurvey` mutation. One request per call.
#[derive(Debug, Clone)]
pub struct GraphqlSurveyIntake {
    client: reqwest::Client,
    endpoint: String,
    survey_path: String,
}

impl GraphqlSurveyIntake {
    pub fn new(endpoint: impl Into<String>, survey_path: impl Into<String>) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .build()
            .context("failed to build HTTP client for survey intake")?;

        Ok(Self {
            client,
            endpoint: endpoint.into(),
            survey_path: survey_path.into(),
        })
    }

    pub fn from_config(config: &ClientConfig) -> anyhow::Result<Self> {
        Self::new(config.graphql_url.clone(), config.survey_path.clone())
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl SurveyIntake for GraphqlSurveyIntake {
    async fn submit(&self, submission: &SurveySubmission) -> Result<IntakeResponse, IntakeError> {
        let body = request_body(&self.survey_path, submission);

        let resp = self
            .client
            .post(&self.endpoint)
            .json(&body)
            .send()
            .await
            .map_err(|e| IntakeError::Transport(e.to_string()))?;

        let status = resp.status();
        if !status.is_success() {
            tracing::debug!(endpoint = %self.endpoint, status = status.as_u16(), "survey intake returned error status");
            return Err(IntakeError::Status(status.as_u16()));
        }

        let text = resp
            .text()
            .await
            .map_err(|e| IntakeError::Transport(e.to_string()))?;

        decode_response(&text)
    }
}
