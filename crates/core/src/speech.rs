use async_trait::async_trait;

use crate::{
    error::{Error, Result},
    services::{AudioFormat, SpeechSynthesizer},
};

const SPEECH_URL: &str = "https://api.openai.com/v1/audio/speech";
const SPEECH_MODEL: &str = "tts-1";
const API_KEY_ENV: &str = "OPENAI_API_KEY";

/// Text-to-speech over the OpenAI audio API.
pub struct OpenAiSpeech {
    api_key: String,
    client: reqwest::Client,
}

impl OpenAiSpeech {
    pub fn new(client: reqwest::Client) -> Result<Self> {
        let api_key = std::env::var(API_KEY_ENV).map_err(|_| Error::MissingApiKey {
            env_var: API_KEY_ENV.to_string(),
        })?;
        Ok(Self { api_key, client })
    }
}

#[async_trait]
impl SpeechSynthesizer for OpenAiSpeech {
    async fn synthesize(&self, text: &str, voice: &str, format: AudioFormat) -> Result<Vec<u8>> {
        let response = self
            .client
            .post(SPEECH_URL)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(&serde_json::json!({
                "model": SPEECH_MODEL,
                "voice": voice,
                "input": text,
                "response_format": format.extension(),
            }))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Error::SynthesisFailed {
                reason: format!("{status}: {body}"),
            });
        }

        let bytes = response.bytes().await?;
        if bytes.is_empty() {
            return Err(Error::SynthesisFailed {
                reason: "empty audio response".to_string(),
            });
        }

        Ok(bytes.to_vec())
    }
}
