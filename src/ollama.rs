//! [`Translator`] and [`Analyzer`] backed by an Ollama chat endpoint.

use std::time::Duration;

use async_trait::async_trait;
use log::debug;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::aggregate::Distribution;
use crate::config::OllamaConfig;
use crate::error::{ReportError, Result};
use crate::services::{Analyzer, TextBatch, Translator};

const TRANSLATE_TEXT_PROMPT: &str = "You are a professional translator. \
Input will be a single string to translate. \
Translate the string to the target language. \
IMPORTANT: Return ONLY the translated string, no quotes, no JSON, no extra text. \
Just the translated text.";

const TRANSLATE_BATCH_PROMPT: &str = "You are a professional translator. \
Input will be an object where keys are category names and values are arrays of strings to translate. \
Translate EACH string to the target language. \
IMPORTANT: Return ONLY valid JSON object with the SAME keys and structure as the input. \
Each key should map to an array of translated strings in the same order. \
No comments, no extra text.";

const ANALYSIS_PROMPT: &str = "You are a professional analyst. \
Input will be a data with users and their percentages. \
Analyze the data and return a analysis in one sentence. \
IMPORTANT: Return ONLY the analysis, no quotes, no JSON, no extra text. \
Just the analysis. Return in the English language.";

const CONTEXT_TOKENS: u32 = 2048;

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Serialize)]
struct ChatOptions {
    temperature: f32,
    num_ctx: u32,
    num_predict: u32,
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    stream: bool,
    options: ChatOptions,
    keep_alive: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    format: Option<&'static str>,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    content: String,
}

/// Ollama client speaking the non-streaming `/api/chat` protocol.
#[derive(Clone, Debug)]
pub struct OllamaClient {
    client: Client,
    endpoint: String,
    model: String,
    keep_alive: String,
}

impl OllamaClient {
    pub fn new(config: &OllamaConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|err| ReportError::InvalidArgument(format!("ollama client: {err}")))?;
        Ok(Self {
            client,
            endpoint: format!("{}/api/chat", config.url.trim_end_matches('/')),
            model: config.model.clone(),
            keep_alive: config.keep_alive.clone(),
        })
    }

    fn request<'a>(
        &'a self,
        system: &'a str,
        user: &'a str,
        format: Option<&'static str>,
    ) -> ChatRequest<'a> {
        ChatRequest {
            model: &self.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: system,
                },
                ChatMessage {
                    role: "user",
                    content: user,
                },
            ],
            stream: false,
            options: ChatOptions {
                temperature: 0.0,
                num_ctx: CONTEXT_TOKENS,
                num_predict: CONTEXT_TOKENS,
            },
            keep_alive: &self.keep_alive,
            format,
        }
    }

    async fn chat(&self, request: &ChatRequest<'_>) -> std::result::Result<String, reqwest::Error> {
        let response = self
            .client
            .post(&self.endpoint)
            .json(request)
            .send()
            .await?
            .error_for_status()?;
        let body: ChatResponse = response.json().await?;
        Ok(body.message.content)
    }
}

/// Parses a batch reply; anything but an object of string arrays is rejected.
fn parse_batch(content: &str) -> Result<TextBatch> {
    serde_json::from_str(content).map_err(|err| {
        ReportError::TranslationUnavailable(format!("malformed batch translation: {err}"))
    })
}

#[async_trait]
impl Translator for OllamaClient {
    async fn translate(&self, text: &str, language: &str) -> Result<String> {
        let prompt = format!("Target language: {language}\nText to translate: {text}");
        let content = self
            .chat(&self.request(TRANSLATE_TEXT_PROMPT, &prompt, None))
            .await
            .map_err(|err| ReportError::TranslationUnavailable(err.to_string()))?;
        Ok(content.trim().to_owned())
    }

    async fn translate_batch(&self, batch: &TextBatch, language: &str) -> Result<TextBatch> {
        let payload = serde_json::to_string(batch)
            .map_err(|err| ReportError::TranslationUnavailable(err.to_string()))?;
        let prompt = format!(
            "Target language: {language}\nJSON to translate (return JSON only, same structure):\n{payload}"
        );
        let content = self
            .chat(&self.request(TRANSLATE_BATCH_PROMPT, &prompt, Some("json")))
            .await
            .map_err(|err| ReportError::TranslationUnavailable(err.to_string()))?;
        debug!("batch translation to {language} returned {} bytes", content.len());
        parse_batch(&content)
    }
}

#[async_trait]
impl Analyzer for OllamaClient {
    async fn analyze(&self, distribution: &Distribution) -> Result<String> {
        let data = serde_json::to_string(distribution)
            .map_err(|err| ReportError::AnalysisUnavailable(err.to_string()))?;
        let prompt = format!("Data to analyze: {data}");
        self.chat(&self.request(ANALYSIS_PROMPT, &prompt, None))
            .await
            .map_err(|err| ReportError::AnalysisUnavailable(err.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client() -> OllamaClient {
        OllamaClient::new(&OllamaConfig {
            url: "http://ollama.test:11434/".into(),
            ..OllamaConfig::default()
        })
        .unwrap()
    }

    #[test]
    fn endpoint_joins_chat_path() {
        assert_eq!(client().endpoint, "http://ollama.test:11434/api/chat");
    }

    #[test]
    fn batch_requests_ask_for_json() {
        let client = client();
        let body = serde_json::to_value(client.request("sys", "user", Some("json"))).unwrap();
        assert_eq!(body["model"], "llama3:8b");
        assert_eq!(body["stream"], false);
        assert_eq!(body["keep_alive"], "15m");
        assert_eq!(body["format"], "json");
        assert_eq!(body["options"]["num_ctx"], 2048);
        assert_eq!(body["messages"][0]["role"], "system");
        assert_eq!(body["messages"][1]["content"], "user");
    }

    #[test]
    fn text_requests_omit_format() {
        let client = client();
        let body = serde_json::to_value(client.request("sys", "user", None)).unwrap();
        assert!(body.get("format").is_none());
    }

    #[test]
    fn malformed_batches_are_translation_failures() {
        assert!(parse_batch(r#"{"age":["un","deux"]}"#).is_ok());
        for reply in [r#"["a"]"#, r#"{"age":"un"}"#, "not json"] {
            assert!(matches!(
                parse_batch(reply),
                Err(ReportError::TranslationUnavailable(_))
            ));
        }
    }
}
