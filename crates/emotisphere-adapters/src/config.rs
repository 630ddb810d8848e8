//! Adapter configuration loaded from the environment.
//!
//! Keys are optional at load time. The server still boots without them;
//! the pipeline refuses to start until both are present.

/// Environment variable holding the news source API key.
pub const NEWSDATA_API_KEY: &str = "NEWSDATA_API_KEY";
/// Environment variable holding the inference API key.
pub const HUGGINGFACE_API_KEY: &str = "HUGGINGFACE_API_KEY";
/// Environment variable selecting the inference model.
pub const HUGGINGFACE_MODEL: &str = "HUGGINGFACE_MODEL";

/// Model used when `HUGGINGFACE_MODEL` is unset or blank.
pub const DEFAULT_MODEL: &str = "j-hartmann/emotion-english-distilroberta-base";

/// Invalid or missing configuration.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    /// One or more required credentials are absent.
    #[error("missing credentials: {}", .0.join(", "))]
    MissingCredentials(Vec<&'static str>),

    /// A variable is set but cannot be parsed.
    #[error("invalid {var}: {reason}")]
    Invalid {
        /// Variable name.
        var: &'static str,
        /// What was wrong with it.
        reason: String,
    },
}

/// Credentials and model selection for the upstream APIs.
#[derive(Clone, Default)]
pub struct AdapterConfig {
    /// newsdata.io key.
    pub newsdata_api_key: Option<String>,
    /// Hugging Face inference key.
    pub huggingface_api_key: Option<String>,
    /// Hugging Face model id.
    pub huggingface_model: String,
}

impl std::fmt::Debug for AdapterConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AdapterConfig")
            .field("newsdata_api_key", &self.newsdata_api_key.as_ref().map(|_| "<redacted>"))
            .field(
                "huggingface_api_key",
                &self.huggingface_api_key.as_ref().map(|_| "<redacted>"),
            )
            .field("huggingface_model", &self.huggingface_model)
            .finish()
    }
}

impl AdapterConfig {
    /// Load from the process environment.
    ///
    /// - `NEWSDATA_API_KEY` -- news source key
    /// - `HUGGINGFACE_API_KEY` -- inference key
    /// - `HUGGINGFACE_MODEL` -- model id (default [`DEFAULT_MODEL`])
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load through an arbitrary variable lookup. Blank values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let non_blank = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());
        Self {
            newsdata_api_key: non_blank(NEWSDATA_API_KEY),
            huggingface_api_key: non_blank(HUGGINGFACE_API_KEY),
            huggingface_model: non_blank(HUGGINGFACE_MODEL)
                .unwrap_or_else(|| DEFAULT_MODEL.to_owned()),
        }
    }

    /// Names of required credentials that are not set.
    pub fn missing_credentials(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if self.newsdata_api_key.is_none() {
            missing.push(NEWSDATA_API_KEY);
        }
        if self.huggingface_api_key.is_none() {
            missing.push(HUGGINGFACE_API_KEY);
        }
        missing
    }

    /// Fail unless both API keys are present.
    pub fn require_credentials(&self) -> Result<(), ConfigError> {
        let missing = self.missing_credentials();
        if missing.is_empty() {
            Ok(())
        } else {
            Err(ConfigError::MissingCredentials(missing))
        }
    }
}
