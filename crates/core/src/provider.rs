use async_trait::async_trait;

use crate::{
    error::{Error, Result},
    services::TextGenerator,
};

#[derive(Clone, Debug, Default)]
pub enum Provider {
    #[default]
    Grok,
    Openai,
    Gemini,
}

pub struct ProviderConfig {
    pub api_url: &'static str,
    pub model: &'static str,
    pub env_var: &'static str,
}

impl Provider {
    pub fn config(&self) -> ProviderConfig {
        match self {
            Provider::Grok => ProviderConfig {
                api_url: "https://api.x.ai/v1/chat/completions",
                model: "grok-4-fast",
                env_var: "XAI_API_KEY",
            },
            Provider::Openai => ProviderConfig {
                api_url: "https://api.openai.com/v1/chat/completions",
                model: "gpt-4o-mini",
                env_var: "OPENAI_API_KEY",
            },
            Provider::Gemini => ProviderConfig {
                api_url: "https://generativelanguage.googleapis.com/v1beta/openai/chat/completions",
                model: "gemini-2.5-flash",
                env_var: "GEMINI_API_KEY",
            },
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Provider::Grok => "Grok",
            Provider::Openai => "OpenAI",
            Provider::Gemini => "Gemini",
        }
    }

    /// Validate that the API key is set for this provider
    pub fn validate_api_key(&self) -> Result<String> {
        let config = self.config();
        std::env::var(config.env_var).map_err(|_| Error::MissingApiKey {
            env_var: config.env_var.to_string(),
        })
    }
}

/// Prompt sent to the text generator for a subject.
pub fn narration_prompt(subject: &str) -> String {
    format!(
        "Write a narration of 60 to 70 words with surprising, accurate facts about {subject}. \
         Output only the narration text, no title, no lists, no stage directions."
    )
}

/// OpenAI-compatible chat completions client.
pub struct ChatCompletions {
    provider: Provider,
    api_key: String,
    client: reqwest::Client,
}

impl ChatCompletions {
    pub fn new(provider: Provider, client: reqwest::Client) -> Result<Self> {
        let api_key = provider.validate_api_key()?;
        Ok(Self {
            provider,
            api_key,
            client,
        })
    }
}

#[async_trait]
impl TextGenerator for ChatCompletions {
    async fn generate(&self, prompt: &str) -> Result<String> {
        let config = self.provider.config();

        let response = self
            .client
            .post(config.api_url)
            .header("Content-Type", "application/json")
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(&serde_json::json!({
                "model": config.model,
                "messages": [
                    {
                        "role": "system",
                        "content": "You write short, factual voice-over scripts.",
                    },
                    {
                        "role": "user",
                        "content": prompt,
                    },
                ],
                "temperature": 0.7,
            }))
            .send()
            .await?
            .error_for_status()?
            .json::<serde_json::Value>()
            .await?;

        let content = response["choices"][0]["message"]["content"]
            .as_str()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .ok_or_else(|| Error::ScriptFailed {
                reason: format!("Invalid API response from {}: {:?}", self.provider.name(), response),
            })?;

        Ok(content.to_string())
    }
}
