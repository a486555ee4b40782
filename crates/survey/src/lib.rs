//! "Black Wolf" product finder survey.
//!
//! A strictly ordered questionnaire: one field at a time is revealed, the
//! finished answer set is handed to an intake collaborator exactly once, and the
//! recommended product is shown right away, without waiting on the intake.

pub mod animation;
pub mod form;
pub mod intake;
pub mod progression;
pub mod recommendation;
pub mod session;
pub mod view;

pub use animation::{FRAME_COUNT, FRAME_PERIOD, FrameCycle, FrameTicker, FrameTransition};
pub use form::{FieldKind, FormField, SurveyForm};
pub use intake::{
    ClientStorage, FieldErrors, IntakeError, IntakeResponse, SESSION_TOKEN_KEY, SessionToken,
    SessionTokenSource, SurveyIntake, SurveySubmission,
};
pub use progression::{
    AnswerField, AnswerRevised, FieldAnswered, Finish, ReviseAnswer, SettleSubmission,
    SubmissionOutcome, SubmissionSettled, SubmissionStarted, Survey, SurveyCommand, SurveyEvent,
    SurveyPhase,
};
pub use recommendation::{RECOMMENDED_PRODUCT_TITLE, RecommendationFilter};
pub use session::{PendingSubmission, SubmissionReceipt, SurveySession};
pub use view::{ChoiceButton, FieldInput, FieldView, SurveyBody, SurveyView, render};
