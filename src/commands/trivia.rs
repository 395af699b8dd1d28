// 趣味知识相关命令

use serde::{Deserialize, Serialize};

use super::AppState;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FunFactsDto {
    pub topic: String,
    pub facts: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExplanationDto {
    pub question: String,
    pub explanation: String,
}

/// 主题趣味知识
pub async fn fun_facts(state: &AppState, topic: &str, language: &str) -> Result<FunFactsDto, String> {
    let facts = state
        .trivia
        .fun_facts(topic, language)
        .await
        .map_err(|e| e.to_string())?;

    Ok(FunFactsDto {
        topic: topic.to_string(),
        facts,
    })
}

/// 主题表情
pub async fn emoji(state: &AppState, topic: &str) -> Result<String, String> {
    state.trivia.emoji(topic).await.map_err(|e| e.to_string())
}

/// 答案解析
pub async fn explain(
    state: &AppState,
    question: &str,
    answer: &str,
    user_answer: &str,
    language: &str,
) -> Result<ExplanationDto, String> {
    let explanation = state
        .trivia
        .explain(question, answer, user_answer, language)
        .await
        .map_err(|e| e.to_string())?;

    Ok(ExplanationDto {
        question: question.to_string(),
        explanation,
    })
}
