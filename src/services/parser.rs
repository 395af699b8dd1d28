//! 模型输出解析
//! 把模型返回的文本解析为题目列表或字符串列表，结构不符即报 `QuizError::Parse`

use regex::Regex;
use serde::de::DeserializeOwned;
use std::sync::LazyLock;

use crate::error::{QuizError, Result};
use crate::models::Question;
use crate::services::codec::{self, ANSWER_COUNT};

static OPENING_FENCE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^```[A-Za-z]*[ \t]*\r?\n?").expect("opening fence pattern"));

static CLOSING_FENCE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s*```$").expect("closing fence pattern"));

/// 去掉模型偶尔包在外面的 markdown 代码块
/// 开头和结尾的围栏各自独立去除，只有一侧时也能解析
pub fn strip_code_fences(raw: &str) -> &str {
    let trimmed = raw.trim();
    let start = OPENING_FENCE.find(trimmed).map_or(0, |m| m.end());
    let body = &trimmed[start..];
    let end = CLOSING_FENCE.find(body).map_or(body.len(), |m| m.start());
    body[..end].trim()
}

fn parse_json<T: DeserializeOwned>(raw: &str) -> Result<T> {
    let cleaned = strip_code_fences(raw);
    serde_json::from_str(cleaned).map_err(|e| {
        log::error!("Response could not be parsed: {}", e);
        QuizError::Parse(format!("response could not be parsed: {}", e))
    })
}

/// 解析一批生成的题目
///
/// 要求恰好 `expected` 道题、每题四个选项；返回的题目不带 id，正确标记已按存储语义规整。
pub fn parse_generated_batch(raw: &str, expected: usize) -> Result<Vec<Question>> {
    let parsed: Vec<Question> = parse_json(raw)?;

    if parsed.len() != expected {
        return Err(QuizError::Parse(format!(
            "expected {} questions, got {}",
            expected,
            parsed.len()
        )));
    }

    parsed
        .into_iter()
        .enumerate()
        .map(|(index, mut question)| {
            if question.text.trim().is_empty() {
                return Err(QuizError::Parse(format!("question {} has no text", index)));
            }
            if question.answers.len() != ANSWER_COUNT {
                return Err(QuizError::Parse(format!(
                    "question {} has {} answers, expected {}",
                    index,
                    question.answers.len(),
                    ANSWER_COUNT
                )));
            }
            if question.correct_count() != 1 {
                log::warn!(
                    "Question {} has {} correct answers, keeping the first (or position 0)",
                    index,
                    question.correct_count()
                );
            }
            question.id = None;
            codec::normalize(&question)
        })
        .collect()
}

/// 解析字符串数组（趣味知识）
pub fn parse_string_list(raw: &str) -> Result<Vec<String>> {
    let items: Vec<String> = parse_json(raw)?;
    Ok(items
        .into_iter()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn batch_json(count: usize) -> String {
        let items: Vec<String> = (0..count)
            .map(|i| {
                format!(
                    r#"{{"question": "Q{i}?", "answers": [
                        {{"text": "a", "correct": false}},
                        {{"text": "b", "correct": true}},
                        {{"text": "c", "correct": false}},
                        {{"text": "d", "correct": false}}]}}"#
                )
            })
            .collect();
        format!("[{}]", items.join(","))
    }

    #[test]
    fn test_strip_code_fences() {
        assert_eq!(strip_code_fences("```json\n[1, 2]\n```"), "[1, 2]");
        assert_eq!(strip_code_fences("```\n[1]```"), "[1]");
        assert_eq!(strip_code_fences("  [1]  "), "[1]");
    }

    #[test]
    fn test_strip_one_sided_fences() {
        assert_eq!(strip_code_fences("```json\n[1, 2]"), "[1, 2]");
        assert_eq!(strip_code_fences("[1, 2]\n```"), "[1, 2]");
        assert_eq!(strip_code_fences("```\n[1]\n"), "[1]");
    }

    #[test]
    fn test_parse_batch_with_only_opening_fence() {
        let raw = format!("```json\n{}", batch_json(10));
        assert_eq!(parse_generated_batch(&raw, 10).unwrap().len(), 10);
    }

    #[test]
    fn test_parse_batch_with_only_closing_fence() {
        let raw = format!("{}\n```\n", batch_json(10));
        assert_eq!(parse_generated_batch(&raw, 10).unwrap().len(), 10);
    }

    #[test]
    fn test_parse_string_list_with_only_opening_fence() {
        let facts = parse_string_list("```json\n[\"one\"]").unwrap();
        assert_eq!(facts, vec!["one".to_string()]);
    }

    #[test]
    fn test_parse_generated_batch() {
        let questions = parse_generated_batch(&batch_json(10), 10).unwrap();

        assert_eq!(questions.len(), 10);
        assert_eq!(questions[3].text, "Q3?");
        assert!(questions.iter().all(|q| q.id.is_none()));
        assert!(questions.iter().all(|q| q.answers[1].correct));
    }

    #[test]
    fn test_parse_fenced_batch() {
        let raw = format!("```json\n{}\n```", batch_json(10));
        assert_eq!(parse_generated_batch(&raw, 10).unwrap().len(), 10);
    }

    #[test]
    fn test_wrong_count_is_parse_error() {
        let err = parse_generated_batch(&batch_json(9), 10).unwrap_err();
        assert!(matches!(err, QuizError::Parse(_)));
    }

    #[test]
    fn test_three_answers_is_parse_error() {
        let raw = r#"[{"question": "Q?", "answers": [
            {"text": "a", "correct": true},
            {"text": "b", "correct": false},
            {"text": "c", "correct": false}]}]"#;
        let err = parse_generated_batch(raw, 1).unwrap_err();
        assert!(matches!(err, QuizError::Parse(_)));
    }

    #[test]
    fn test_prose_is_parse_error() {
        let err = parse_generated_batch("Sure! Here are your questions:", 10).unwrap_err();
        assert!(matches!(err, QuizError::Parse(_)));
    }

    #[test]
    fn test_no_correct_answer_is_normalized_to_first() {
        let raw = r#"[{"question": "Q?", "answers": [
            {"text": "a", "correct": false},
            {"text": "b", "correct": false},
            {"text": "c", "correct": false},
            {"text": "d", "correct": false}]}]"#;
        let questions = parse_generated_batch(raw, 1).unwrap();
        assert!(questions[0].answers[0].correct);
        assert_eq!(questions[0].correct_count(), 1);
    }

    #[test]
    fn test_parse_string_list() {
        let facts = parse_string_list("```json\n[\"one\", \" \", \"two \"]\n```").unwrap();
        assert_eq!(facts, vec!["one".to_string(), "two".to_string()]);
    }
}
