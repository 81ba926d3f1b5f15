//! Model configuration and backend selection.

use std::sync::Arc;

use tracing::{info, warn};

use super::{LanguageModel, MockLanguageModel, ModelError};

/// Model used when `QUILL_MODEL` is unset.
pub const DEFAULT_MODEL: &str = "claude-haiku-4-5";

/// Step limit used when `QUILL_MAX_STEPS` is unset.
pub const DEFAULT_MAX_STEPS: usize = 10;

const API_KEY_VAR: &str = "ANTHROPIC_API_KEY";
const MODEL_VAR: &str = "QUILL_MODEL";
const MAX_STEPS_VAR: &str = "QUILL_MAX_STEPS";

/// Settings for the model backend and the agent loop.
#[derive(Clone, PartialEq, Eq)]
pub struct ProviderConfig {
    /// API key for the hosted model. `None` selects the offline mock.
    pub api_key: Option<String>,
    /// Hosted model identifier.
    pub model: String,
    /// Maximum model steps per user message.
    pub max_steps: usize,
}

impl std::fmt::Debug for ProviderConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderConfig")
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("model", &self.model)
            .field("max_steps", &self.max_steps)
            .finish()
    }
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            model: DEFAULT_MODEL.to_string(),
            max_steps: DEFAULT_MAX_STEPS,
        }
    }
}

impl ProviderConfig {
    /// Read the configuration from the process environment.
    pub fn from_env() -> Result<Self, ModelError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Read the configuration through `lookup`, which maps a variable name to its value.
    ///
    /// A blank API key counts as absent.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ModelError> {
        let api_key = lookup(API_KEY_VAR).filter(|key| !key.trim().is_empty());
        let model = lookup(MODEL_VAR)
            .filter(|model| !model.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_MODEL.to_string());
        let max_steps = match lookup(MAX_STEPS_VAR) {
            Some(raw) => raw
                .trim()
                .parse::<usize>()
                .ok()
                .filter(|&steps| steps > 0)
                .ok_or_else(|| {
                    ModelError::Config(format!(
                        "{MAX_STEPS_VAR} must be a positive integer, got {raw:?}"
                    ))
                })?,
            None => DEFAULT_MAX_STEPS,
        };
        Ok(Self {
            api_key,
            model,
            max_steps,
        })
    }

    /// Override the step limit.
    pub fn with_max_steps(mut self, max_steps: usize) -> Self {
        self.max_steps = max_steps;
        self
    }

    /// Returns true if an API key is configured.
    pub fn has_api_key(&self) -> bool {
        self.api_key.is_some()
    }
}

/// Pick the model backend once at startup.
///
/// The hosted client is used only when an API key is configured and the
/// embedding application supplied one; every other combination falls back to
/// [`MockLanguageModel`].
pub fn select_model(
    config: &ProviderConfig,
    hosted: Option<Arc<dyn LanguageModel>>,
) -> Arc<dyn LanguageModel> {
    match (config.has_api_key(), hosted) {
        (true, Some(hosted)) => {
            info!(model = %hosted.model_id(), "using hosted model");
            hosted
        }
        (true, None) => {
            warn!(
                model = %config.model,
                "{API_KEY_VAR} is set but no hosted client is available, using mock provider"
            );
            Arc::new(MockLanguageModel::new(format!("mock-{}", config.model)))
        }
        (false, _) => {
            warn!("no {API_KEY_VAR} found, using mock provider");
            Arc::new(MockLanguageModel::new(format!("mock-{}", config.model)))
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::collections::HashMap;

    use super::*;
    use crate::model::ScriptedLanguageModel;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| vars.get(name).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = ProviderConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config, ProviderConfig::default());
        assert!(!config.has_api_key());
    }

    #[test]
    fn test_blank_key_is_absent() {
        let config = ProviderConfig::from_lookup(lookup(&[(API_KEY_VAR, "   ")])).unwrap();
        assert!(config.api_key.is_none());
    }

    #[test]
    fn test_overrides() {
        let config = ProviderConfig::from_lookup(lookup(&[
            (API_KEY_VAR, "sk-test"),
            (MODEL_VAR, "claude-sonnet"),
            (MAX_STEPS_VAR, " 4 "),
        ]))
        .unwrap();
        assert_eq!(config.api_key.as_deref(), Some("sk-test"));
        assert_eq!(config.model, "claude-sonnet");
        assert_eq!(config.max_steps, 4);
        assert!(!format!("{config:?}").contains("sk-test"));
    }

    #[test]
    fn test_invalid_max_steps() {
        for raw in ["zero", "0", "-1"] {
            let err = ProviderConfig::from_lookup(lookup(&[(MAX_STEPS_VAR, raw)])).unwrap_err();
            assert!(matches!(err, ModelError::Config(_)), "{raw}");
        }
    }

    #[test]
    fn test_select_model() {
        let hosted: Arc<dyn LanguageModel> = Arc::new(ScriptedLanguageModel::default());

        let without_key = ProviderConfig::default();
        let model = select_model(&without_key, Some(Arc::clone(&hosted)));
        assert_eq!(model.model_id(), "mock-claude-haiku-4-5");

        let with_key = ProviderConfig {
            api_key: Some("sk".to_string()),
            ..ProviderConfig::default()
        };
        assert_eq!(select_model(&with_key, Some(hosted)).model_id(), "scripted");
        assert_eq!(
            select_model(&with_key, None).model_id(),
            "mock-claude-haiku-4-5"
        );
    }
}
