//! Gemini client settings.
//!
//! The client is built at startup when `GEMINI_API_KEY` is present and
//! held in the application state; no handler generates content with it.

use crate::config::GenaiConfig;
use secrecy::{ExposeSecret, Secret};

/// Gemini API base URL.
const GEMINI_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta";

pub struct GeminiClient {
    api_key: Secret<String>,
    model: String,
}

impl GeminiClient {
    /// `None` when no API key is configured.
    pub fn from_config(config: &GenaiConfig) -> Option<Self> {
        let api_key = config.api_key.as_ref()?;
        Some(Self {
            api_key: Secret::new(api_key.expose_secret().clone()),
            model: config.model.clone(),
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// Endpoint for `method` on the configured model, e.g. `generateContent`.
    pub fn api_url(&self, method: &str) -> String {
        format!(
            "{}/models/{}:{}?key={}",
            GEMINI_API_BASE,
            self.model,
            method,
            self.api_key.expose_secret()
        )
    }
}
