//! Environment-driven configuration.

use std::time::Duration;

use thiserror::Error;

use storefront_survey::{
    ClientStorage, FRAME_PERIOD, RECOMMENDED_PRODUCT_TITLE, RecommendationFilter,
    SESSION_TOKEN_KEY,
};

pub const GRAPHQL_URL_VAR: &str = "STOREFRONT_GRAPHQL_URL";
pub const SURVEY_PATH_VAR: &str = "STOREFRONT_SURVEY_PATH";
pub const SESSION_TOKEN_KEY_VAR: &str = "STOREFRONT_SESSION_TOKEN_KEY";
pub const RECOMMENDED_PRODUCT_VAR: &str = "STOREFRONT_RECOMMENDED_PRODUCT";
pub const ANIMATION_FRAME_MS_VAR: &str = "STOREFRONT_ANIMATION_FRAME_MS";

const DEFAULT_GRAPHQL_URL: &str = "http://localhost:8000/api/graphql";
const DEFAULT_SURVEY_PATH: &str = "/survey";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{key} is invalid ({value:?}): {reason}")]
    Invalid {
        key: &'static str,
        value: String,
        reason: &'static str,
    },
}

impl ConfigError {
    fn invalid(key: &'static str, value: impl Into<String>, reason: &'static str) -> Self {
        Self::Invalid {
            key,
            value: value.into(),
            reason,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    pub graphql_url: String,
    pub survey_path: String,
    pub session_token_key: String,
    pub recommended_product: String,
    pub animation_frame: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            graphql_url: DEFAULT_GRAPHQL_URL.to_string(),
            survey_path: DEFAULT_SURVEY_PATH.to_string(),
            session_token_key: SESSION_TOKEN_KEY.to_string(),
            recommended_product: RECOMMENDED_PRODUCT_TITLE.to_string(),
            animation_frame: FRAME_PERIOD,
        }
    }
}

impl ClientConfig {
    /// Read the process environment; unset variables fall back to defaults.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let graphql_url = lookup(GRAPHQL_URL_VAR).unwrap_or(defaults.graphql_url);
        if !(graphql_url.starts_with("http://") || graphql_url.starts_with("https://")) {
            return Err(ConfigError::invalid(
                GRAPHQL_URL_VAR,
                graphql_url,
                "expected an http(s) URL",
            ));
        }

        let survey_path = lookup(SURVEY_PATH_VAR).unwrap_or(defaults.survey_path);
        if !survey_path.starts_with('/') {
            return Err(ConfigError::invalid(
                SURVEY_PATH_VAR,
                survey_path,
                "expected an absolute path",
            ));
        }

        let session_token_key =
            lookup(SESSION_TOKEN_KEY_VAR).unwrap_or(defaults.session_token_key);
        if session_token_key.trim().is_empty() {
            return Err(ConfigError::invalid(
                SESSION_TOKEN_KEY_VAR,
                session_token_key,
                "must not be blank",
            ));
        }

        let recommended_product =
            lookup(RECOMMENDED_PRODUCT_VAR).unwrap_or(defaults.recommended_product);

        let animation_frame = match lookup(ANIMATION_FRAME_MS_VAR) {
            None => defaults.animation_frame,
            Some(raw) => match raw.trim().parse::<u64>() {
                Ok(ms) if ms > 0 => Duration::from_millis(ms),
                Ok(_) => {
                    return Err(ConfigError::invalid(
                        ANIMATION_FRAME_MS_VAR,
                        raw,
                        "must be greater than zero",
                    ));
                }
                Err(_) => {
                    return Err(ConfigError::invalid(
                        ANIMATION_FRAME_MS_VAR,
                        raw,
                        "expected milliseconds as an integer",
                    ));
                }
            },
        };

        Ok(Self {
            graphql_url,
            survey_path,
            session_token_key,
            recommended_product,
            animation_frame,
        })
    }

    pub fn recommendation_filter(&self) -> RecommendationFilter {
        RecommendationFilter::new(self.recommended_product.clone())
    }

    /// Empty client storage reading the session token from the configured key.
    pub fn client_storage(&self) -> ClientStorage {
        ClientStorage::new().with_token_key(self.session_token_key.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    use storefront_survey::SessionTokenSource;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn empty_environment_yields_defaults() {
        let config = ClientConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config, ClientConfig::default());
        assert_eq!(config.survey_path, "/survey");
        assert_eq!(config.session_token_key, "fprint");
        assert_eq!(config.animation_frame, Duration::from_millis(75));
        assert_eq!(config.recommendation_filter().title(), "Personal Black Wolf");
    }

    #[test]
    fn overrides_are_applied() {
        let config = ClientConfig::from_lookup(lookup(&[
            (GRAPHQL_URL_VAR, "https://shop.example.org/graphql"),
            (SURVEY_PATH_VAR, "/umfrage"),
            (SESSION_TOKEN_KEY_VAR, "visitor"),
            (RECOMMENDED_PRODUCT_VAR, "Black Wolf Espresso"),
            (ANIMATION_FRAME_MS_VAR, "120"),
        ]))
        .unwrap();

        assert_eq!(config.graphql_url, "https://shop.example.org/graphql");
        assert_eq!(config.survey_path, "/umfrage");
        assert_eq!(config.animation_frame, Duration::from_millis(120));
        assert_eq!(config.recommendation_filter().title(), "Black Wolf Espresso");

        let mut storage = config.client_storage();
        storage.set("visitor", "v-9");
        assert_eq!(storage.session_token().unwrap().as_str(), "v-9");
    }

    #[test]
    fn zero_or_garbage_frame_period_is_rejected() {
        let err = ClientConfig::from_lookup(lookup(&[(ANIMATION_FRAME_MS_VAR, "0")])).unwrap_err();
        assert!(err.to_string().contains("greater than zero"));

        let err = ClientConfig::from_lookup(lookup(&[(ANIMATION_FRAME_MS_VAR, "fast")])).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { key: ANIMATION_FRAME_MS_VAR, .. }));
    }

    #[test]
    fn malformed_url_and_path_are_rejected() {
        assert!(ClientConfig::from_lookup(lookup(&[(GRAPHQL_URL_VAR, "localhost:8000")])).is_err());
        assert!(ClientConfig::from_lookup(lookup(&[(SURVEY_PATH_VAR, "survey")])).is_err());
        assert!(ClientConfig::from_lookup(lookup(&[(SESSION_TOKEN_KEY_VAR, " ")])).is_err());
    }
}
