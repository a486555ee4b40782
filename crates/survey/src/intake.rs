//! Survey-intake collaborator and the session token it is keyed by.

use std::collections::{BTreeMap, HashMap};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Client-storage key under which the browser fingerprint token is kept.
pub const SESSION_TOKEN_KEY: &str = "fprint";

/// Opaque per-visitor token sent along with a submission.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionToken(String);

impl SessionToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Where the session token comes from at submission time.
pub trait SessionTokenSource {
    /// `None` when no token has been stored; the submission goes out without one.
    fn session_token(&self) -> Option<SessionToken>;
}

/// Key/value client storage (the browser's local storage, or a test double).
#[derive(Debug, Clone, Default)]
pub struct ClientStorage {
    entries: HashMap<String, String>,
    token_key: Option<String>,
}

impl ClientStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Read the session token from `key` instead of [`SESSION_TOKEN_KEY`].
    pub fn with_token_key(mut self, key: impl Into<String>) -> Self {
        self.token_key = Some(key.into());
        self
    }

    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.entries.insert(key.into(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }

    pub fn token_key(&self) -> &str {
        self.token_key.as_deref().unwrap_or(SESSION_TOKEN_KEY)
    }
}

impl SessionTokenSource for ClientStorage {
    fn session_token(&self) -> Option<SessionToken> {
        self.get(self.token_key()).map(SessionToken::new)
    }
}

/// Payload handed to the intake: the token plus every answer by field name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SurveySubmission {
    pub token: Option<SessionToken>,
    pub values: BTreeMap<String, String>,
}

/// Per-field validation errors reported by the intake.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldErrors {
    pub name: String,
    #[serde(default)]
    pub errors: Vec<String>,
}

/// What the intake answered.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct IntakeResponse {
    #[serde(default)]
    pub result: Option<String>,
    #[serde(default)]
    pub errors: Option<Vec<FieldErrors>>,
}

impl IntakeResponse {
    pub fn field_errors(&self) -> &[FieldErrors] {
        self.errors.as_deref().unwrap_or_default()
    }

    pub fn is_accepted(&self) -> bool {
        self.field_errors().is_empty()
    }
}

/// Failure to get an answer from the intake at all.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum IntakeError {
    #[error("transport error: {0}")]
    Transport(String),

    #[error("unexpected HTTP status {0}")]
    Status(u16),

    #[error("malformed intake response: {0}")]
    Decode(String),

    #[error("intake reported errors: {}", .0.join("; "))]
    Remote(Vec<String>),
}

/// Accepts finished surveys. Implementations must not retry on their own.
#[async_trait]
pub trait SurveyIntake: Send + Sync {
    async fn submit(&self, submission: &SurveySubmission) -> Result<IntakeResponse, IntakeError>;
}
