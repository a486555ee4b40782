//! Runtime wiring for the storefront: environment configuration and the
//! GraphQL survey-intake client.

pub mod config;
pub mod graphql;

pub use config::{ClientConfig, ConfigError};
pub use graphql::{GraphqlSurveyIntake, decode_response, mutation_document, request_body};
