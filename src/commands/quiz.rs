// 出题命令

use serde::{Deserialize, Serialize};

use super::AppState;
use crate::models::Question;

/// 选项传输对象
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnswerDto {
    pub text: String,
    pub correct: bool,
}

/// 题目传输对象
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuizDto {
    pub id: Option<i64>,
    pub question: String,
    pub answers: Vec<AnswerDto>,
}

impl From<Question> for QuizDto {
    fn from(question: Question) -> Self {
        Self {
            id: question.id,
            question: question.text,
            answers: question
                .answers
                .into_iter()
                .map(|a| AnswerDto {
                    text: a.text,
                    correct: a.correct,
                })
                .collect(),
        }
    }
}

/// 获取一组题目：调用者邮箱先解析为用户 id
pub async fn quiz(
    state: &AppState,
    email: &str,
    topic: &str,
    difficulty: i64,
    language: &str,
) -> Result<Vec<QuizDto>, String> {
    let user_id = state
        .store
        .user_id_for_email(email)
        .await
        .map_err(|e| e.to_string())?;

    let questions = state
        .pipeline
        .acquire_quiz(user_id, topic, difficulty, language)
        .await
        .map_err(|e| e.to_string())?;

    Ok(questions.into_iter().map(QuizDto::from).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Answer;

    #[test]
    fn test_dto_keeps_question_shape() {
        let question = Question::new(
            "Which planet is largest?",
            vec![
                Answer::new("Jupiter", true),
                Answer::new("Mars", false),
                Answer::new("Venus", false),
                Answer::new("Earth", false),
            ],
        )
        .with_id(7);

        let dto = QuizDto::from(question);
        let json = serde_json::to_value(&dto).unwrap();

        assert_eq!(json["id"], 7);
        assert_eq!(json["question"], "Which planet is largest?");
        assert_eq!(json["answers"][0]["correct"], true);
        assert_eq!(json["answers"].as_array().unwrap().len(), 4);
    }
}
