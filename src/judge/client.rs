//! Calls to the text-generation judge
//!
//! Each prompt is asked on its own. A failed call becomes an answer record
//! with a null answer and the error message, so every prompt yields exactly
//! one record.

use crate::data::{AnswerRecord, PromptRecord};
use crate::{JudgeConfig, OffenseError, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Anything that answers a prompt with free text
pub trait Judge {
    fn ask(&self, prompt: &str) -> Result<String>;
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
    max_tokens: u32,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatReply,
}

#[derive(Debug, Deserialize)]
struct ChatReply {
    content: Option<String>,
}

/// OpenAI-compatible chat-completion judge
pub struct ChatJudge {
    client: reqwest::blocking::Client,
    api_key: String,
    config: JudgeConfig,
}

impl ChatJudge {
    pub fn new(config: JudgeConfig, api_key: impl Into<String>) -> Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .user_agent("offense-judge/0.1")
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| {
                OffenseError::ExternalService(format!("Failed to create HTTP client: {}", e))
            })?;

        Ok(ChatJudge {
            client,
            api_key: api_key.into(),
            config,
        })
    }

    /// Read the key from the environment variable named in the config
    pub fn from_env(config: JudgeConfig) -> Result<Self> {
        let api_key = std::env::var(&config.api_key_env).map_err(|_| {
            OffenseError::Configuration(format!(
                "Environment variable {} is not set",
                config.api_key_env
            ))
        })?;
        Self::new(config, api_key)
    }

    fn chat_url(&self) -> String {
        format!(
            "{}/chat/completions",
            self.config.base_url.trim_end_matches('/')
        )
    }
}

impl Judge for ChatJudge {
    fn ask(&self, prompt: &str) -> Result<String> {
        let request = ChatRequest {
            model: &self.config.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: &self.config.system_prompt,
                },
                ChatMessage {
                    role: "user",
                    content: prompt,
                },
            ],
            temperature: self.config.temperature,
            max_tokens: self.config.max_tokens,
        };

        let response = self
            .client
            .post(self.chat_url())
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .map_err(|e| OffenseError::ExternalService(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(OffenseError::ExternalService(format!(
                "HTTP {}: {}",
                status, body
            )));
        }

        let parsed: ChatResponse = response
            .json()
            .map_err(|e| OffenseError::ExternalService(format!("bad response body: {}", e)))?;

        parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| OffenseError::ExternalService("response had no content".to_string()))
    }
}

/// Asks every prompt in order with a fixed pause between calls
pub struct JudgeRunner<'a, J: Judge> {
    judge: &'a J,
    delay: Duration,
}

impl<'a, J: Judge> JudgeRunner<'a, J> {
    pub fn new(judge: &'a J, delay: Duration) -> Self {
        JudgeRunner { judge, delay }
    }

    /// One answer record per prompt; judge failures are recorded, never raised.
    ///
    /// `record` sees each answer as soon as it exists. An error from it stops
    /// the batch.
    pub fn ask_all<F>(&self, prompts: &[PromptRecord], mut record: F) -> Result<Vec<AnswerRecord>>
    where
        F: FnMut(&AnswerRecord) -> Result<()>,
    {
        let total = prompts.len();
        log::info!("Found {} prompts to send to the judge", total);

        let mut answers = Vec::with_capacity(total);
        let mut failures = 0;
        for (i, prompt) in prompts.iter().enumerate() {
            if i > 0 && !self.delay.is_zero() {
                std::thread::sleep(self.delay);
            }

            log::info!(
                "Asking prompt {}/{} (pair_id={}, type={})",
                i + 1,
                total,
                prompt.pair_id,
                prompt.prompt_type
            );
            let outcome = self.judge.ask(&prompt.prompt);
            if let Err(e) = &outcome {
                failures += 1;
                log::warn!("Error on prompt {}: {}", i + 1, e);
            }
            let answer = AnswerRecord::from_outcome(prompt, outcome);
            record(&answer)?;
            answers.push(answer);
        }

        log::info!(
            "Collected {} answers ({} failed)",
            answers.len(),
            failures
        );
        Ok(answers)
    }
}
