//! 错误类型
//! 出题流水线和各外部协作方（模型服务、题库、百科）共用的错误分类

use std::time::Duration;
use thiserror::Error;

/// 出题服务错误
#[derive(Debug, Error)]
pub enum QuizError {
    /// 模型服务不可达或返回异常
    #[error("Generation failed: {0}")]
    Generation(String),

    /// 模型返回内容无法解析为预期结构
    #[error("Parse failed: {0}")]
    Parse(String),

    /// 题库读写失败
    #[error("Store error: {0}")]
    Store(String),

    /// 主题 get-or-create 两次查询后仍未找到
    #[error("Topic '{0}' could not be resolved")]
    TopicResolution(String),

    /// 题目不满足四选项结构
    #[error("Malformed question: {0}")]
    MalformedQuestion(String),

    /// 外部调用超时
    #[error("{operation} timed out after {after:?}")]
    Timeout {
        operation: &'static str,
        after: Duration,
    },

    #[error("User with email {0} not found")]
    UserNotFound(String),

    /// 用户已经点过赞/踩
    #[error("User {user_id} already {vote} quiz {quiz_id}")]
    AlreadyVoted {
        user_id: i64,
        quiz_id: i64,
        vote: &'static str,
    },

    #[error("Config error: {0}")]
    Config(String),
}

pub type Result<T, E = QuizError> = std::result::Result<T, E>;

impl From<rusqlite::Error> for QuizError {
    fn from(err: rusqlite::Error) -> Self {
        QuizError::Store(err.to_string())
    }
}

impl From<reqwest::Error> for QuizError {
    fn from(err: reqwest::Error) -> Self {
        QuizError::Generation(err.to_string())
    }
}

impl From<tokio::task::JoinError> for QuizError {
    fn from(err: tokio::task::JoinError) -> Self {
        QuizError::Store(format!("blocking task failed: {}", err))
    }
}

impl From<figment::Error> for QuizError {
    fn from(err: figment::Error) -> Self {
        QuizError::Config(err.to_string())
    }
}
