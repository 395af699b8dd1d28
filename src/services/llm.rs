//! 大模型推理服务模块
//! 对接 OpenAI 兼容的 chat/completions 接口，并在其上提供出题用的内容生成器

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Instant;

use crate::config::LlmConfig;
use crate::error::{QuizError, Result};
use crate::models::GenerationRequest;
use crate::services::prompt::QuizPrompt;

/// 推理请求
#[derive(Debug, Clone, PartialEq)]
pub struct InferenceRequest {
    pub model: String,
    pub prompt: String,
    pub max_tokens: u32,
    pub temperature: f32,
    pub top_p: f32,
}

/// 推理响应
#[derive(Debug, Clone)]
pub struct InferenceResponse {
    pub text: String,
    pub tokens_generated: u32,
    pub inference_time_ms: u64,
}

/// 聊天消息
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String, // "system", "user", "assistant"
    pub content: String,
}

/// 文本补全能力
#[async_trait]
pub trait CompletionClient: Send + Sync {
    async fn complete(&self, request: InferenceRequest) -> Result<InferenceResponse>;
}

/// 出题内容生成：给定生成请求，返回模型原始文本
#[async_trait]
pub trait ContentGenerator: Send + Sync {
    async fn generate(&self, request: &GenerationRequest) -> Result<String>;
}

/// Completion 请求
#[derive(Debug, Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage>,
    temperature: f32,
    top_p: f32,
    max_tokens: u32,
}

/// Completion 响应
#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<Choice>,
    usage: Option<Usage>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChatMessage,
}

#[derive(Debug, Deserialize)]
struct Usage {
    completion_tokens: u32,
}

/// OpenAI 兼容接口客户端
#[derive(Clone)]
pub struct ChatClient {
    base_url: String,
    api_key: String,
    http_client: Arc<reqwest::Client>,
}

impl ChatClient {
    pub fn new(config: &LlmConfig) -> Self {
        Self {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
            http_client: Arc::new(reqwest::Client::new()),
        }
    }

    pub fn server_url(&self) -> &str {
        &self.base_url
    }
}

#[async_trait]
impl CompletionClient for ChatClient {
    /// 单次推理，不重试
    async fn complete(&self, request: InferenceRequest) -> Result<InferenceResponse> {
        let start_time = Instant::now();
        let url = format!("{}/chat/completions", self.base_url);

        let body = ChatCompletionRequest {
            model: &request.model,
            messages: vec![ChatMessage {
                role: "user".to_string(),
                content: request.prompt,
            }],
            temperature: request.temperature,
            top_p: request.top_p,
            max_tokens: request.max_tokens,
        };

        let mut builder = self.http_client.post(&url).json(&body);
        if !self.api_key.is_empty() {
            builder = builder.bearer_auth(&self.api_key);
        }

        let response = builder.send().await?;
        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            return Err(QuizError::Generation(format!(
                "model endpoint returned {}: {}",
                status, detail
            )));
        }

        let response = response.json::<ChatCompletionResponse>().await?;
        let text = response
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content.trim().to_string())
            .ok_or_else(|| QuizError::Generation("model returned no choices".to_string()))?;

        let inference_time_ms = start_time.elapsed().as_millis() as u64;
        log::debug!(
            "Completion from {} took {} ms ({} chars)",
            request.model,
            inference_time_ms,
            text.len()
        );

        Ok(InferenceResponse {
            text,
            tokens_generated: response.usage.map(|u| u.completion_tokens).unwrap_or(0),
            inference_time_ms,
        })
    }
}

/// 用出题提示词驱动补全接口的内容生成器
pub struct PromptedGenerator {
    client: Arc<dyn CompletionClient>,
    model: String,
    temperature: f32,
    top_p: f32,
    max_tokens: u32,
    question_count: usize,
}

impl PromptedGenerator {
    pub fn new(client: Arc<dyn CompletionClient>, config: &LlmConfig, question_count: usize) -> Self {
        Self {
            client,
            model: config.quiz_model.clone(),
            temperature: config.temperature,
            top_p: config.top_p,
            max_tokens: config.max_tokens,
            question_count,
        }
    }
}

#[async_trait]
impl ContentGenerator for PromptedGenerator {
    async fn generate(&self, request: &GenerationRequest) -> Result<String> {
        let persona = QuizPrompt::random_persona(request.difficulty);
        let prompt = QuizPrompt::quiz(request, persona, self.question_count);
        log::debug!("Quiz prompt for '{}':\n{}", request.topic, prompt);

        let response = self
            .client
            .complete(InferenceRequest {
                model: self.model.clone(),
                prompt,
                max_tokens: self.max_tokens,
                temperature: self.temperature,
                top_p: self.top_p,
            })
            .await?;

        log::info!(
            "Generated quiz text for '{}' in {} ms",
            request.topic,
            response.inference_time_ms
        );
        Ok(response.text)
    }
}
