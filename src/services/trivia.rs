//! 趣味知识、主题表情、答案解析

use chrono::Utc;
use std::sync::Arc;
use std::time::Duration;

use crate::config::LlmConfig;
use crate::error::{QuizError, Result};
use crate::models::Language;
use crate::services::llm::{CompletionClient, InferenceRequest};
use crate::services::parser;
use crate::services::prompt::QuizPrompt;
use crate::services::reference::ReferenceFetcher;
use crate::utils::with_timeout;

pub struct TriviaService {
    client: Arc<dyn CompletionClient>,
    reference: Arc<dyn ReferenceFetcher>,
    config: LlmConfig,
    timeout: Duration,
}

impl TriviaService {
    pub fn new(
        client: Arc<dyn CompletionClient>,
        reference: Arc<dyn ReferenceFetcher>,
        config: LlmConfig,
        timeout: Duration,
    ) -> Self {
        Self {
            client,
            reference,
            config,
            timeout,
        }
    }

    async fn ask(&self, model: &str, prompt: String, temperature: f32) -> Result<String> {
        let request = InferenceRequest {
            model: model.to_string(),
            prompt,
            max_tokens: self.config.max_tokens,
            temperature,
            top_p: self.config.top_p,
        };
        let response = with_timeout("content generation", self.timeout, self.client.complete(request)).await?;
        Ok(response.text.trim().to_string())
    }

    /// 围绕主题生成趣味知识
    pub async fn fun_facts(&self, topic: &str, language_code: &str) -> Result<Vec<String>> {
        let reference = self.reference.fetch(topic, language_code).await;
        let prompt = QuizPrompt::fun_facts(
            topic,
            Language::from_code(language_code),
            &reference,
            Utc::now().timestamp_millis(),
        );

        let text = self
            .ask(&self.config.fact_model, prompt, self.config.temperature)
            .await?;
        let facts = parser::parse_string_list(&text)?;
        log::info!("Got {} fun facts for '{}'", facts.len(), topic);
        Ok(facts)
    }

    /// 主题对应的表情
    pub async fn emoji(&self, topic: &str) -> Result<String> {
        let emoji = self
            .ask(&self.config.fact_model, QuizPrompt::emoji(topic), self.config.temperature)
            .await?;
        if emoji.is_empty() {
            return Err(QuizError::Parse(format!("empty emoji reply for '{}'", topic)));
        }
        Ok(emoji)
    }

    /// 解释为什么正确答案是对的
    pub async fn explain(
        &self,
        question: &str,
        answer: &str,
        user_answer: &str,
        language_code: &str,
    ) -> Result<String> {
        let prompt = QuizPrompt::explanation(
            question,
            answer,
            user_answer,
            Language::from_code(language_code),
        );
        let explanation = self
            .ask(&self.config.quiz_model, prompt, self.config.temperature)
            .await?;
        if explanation.is_empty() {
            return Err(QuizError::Parse("empty explanation".to_string()));
        }
        Ok(explanation)
    }
}
