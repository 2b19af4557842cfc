use std::env;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use study_core::model::{ArtifactKind, Quiz, StudyPlan};
use tracing::{debug, info};

use super::ArtifactGenerator;
use super::parse::{parse_plan, parse_quiz};
use super::prompt::{plan_prompt, quiz_prompt};
use crate::error::GenerationError;

#[derive(Clone, Debug)]
pub struct GeneratorConfig {
    pub base_url: String,
    pub api_key: String,
    pub model: String,
}

impl GeneratorConfig {
    /// Read `STUDY_AI_API_KEY`, `STUDY_AI_BASE_URL` and `STUDY_AI_MODEL`.
    ///
    /// Returns `None` when no API key is set.
    #[must_use]
    pub fn from_env() -> Option<Self> {
        let api_key = env::var("STUDY_AI_API_KEY").ok()?;
        if api_key.trim().is_empty() {
            return None;
        }
        let base_url =
            env::var("STUDY_AI_BASE_URL").unwrap_or_else(|_| "https://api.openai.com/v1".into());
        let model = env::var("STUDY_AI_MODEL").unwrap_or_else(|_| "gpt-4o-mini".into());
        Some(Self {
            base_url,
            api_key,
            model,
        })
    }
}

/// Generator backed by an OpenAI-compatible chat completions endpoint.
#[derive(Clone)]
pub struct ChatGenerator {
    client: Client,
    config: Option<GeneratorConfig>,
}

impl ChatGenerator {
    #[must_use]
    pub fn from_env() -> Self {
        Self::new(GeneratorConfig::from_env())
    }

    #[must_use]
    pub fn new(config: Option<GeneratorConfig>) -> Self {
        Self {
            client: Client::new(),
            config,
        }
    }

    #[must_use]
    pub fn enabled(&self) -> bool {
        self.config.is_some()
    }

    /// Send a prompt and return the trimmed completion text.
    ///
    /// # Errors
    ///
    /// Returns `GenerationError` when the generator is disabled, the request fails,
    /// or the response is empty.
    pub async fn complete(&self, prompt: &str) -> Result<String, GenerationError> {
        let config = self.config.as_ref().ok_or(GenerationError::Disabled)?;

        let url = format!(
            "{}/chat/completions",
            config.base_url.trim_end_matches('/')
        );
        let payload = ChatRequest {
            model: config.model.clone(),
            messages: vec![ChatMessage {
                role: "user",
                content: prompt.to_string(),
            }],
            temperature: 0.2,
        };

        let response = self
            .client
            .post(url)
            .bearer_auth(&config.api_key)
            .json(&payload)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(GenerationError::HttpStatus(response.status()));
        }

        let body: ChatResponse = response.json().await?;
        let content = body
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .filter(|content| !content.trim().is_empty())
            .ok_or(GenerationError::EmptyResponse)?;

        Ok(content.trim().to_string())
    }

    async fn request(&self, kind: ArtifactKind, prompt: &str) -> Result<String, GenerationError> {
        info!(%kind, "requesting generation");
        let text = self.complete(prompt).await?;
        debug!(%kind, chars = text.len(), "generation response received");
        Ok(text)
    }
}

#[async_trait]
impl ArtifactGenerator for ChatGenerator {
    async fn generate_plan(&self, content: &str, days: u32) -> Result<StudyPlan, GenerationError> {
        let text = self
            .request(ArtifactKind::Plan, &plan_prompt(content, days))
            .await?;
        parse_plan(&text)
    }

    async fn generate_quiz(
        &self,
        content: &str,
        num_questions: u32,
    ) -> Result<Quiz, GenerationError> {
        let text = self
            .request(ArtifactKind::Quiz, &quiz_prompt(content, num_questions))
            .await?;
        parse_quiz(&text)
    }
}

#[derive(Debug, Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    temperature: f32,
}

#[derive(Debug, Serialize)]
struct ChatMessage {
    role: &'static str,
    content: String,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessageResponse,
}

#[derive(Debug, Deserialize)]
struct ChatMessageResponse {
    content: Option<String>,
}
