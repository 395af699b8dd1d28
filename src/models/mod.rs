use serde::{Deserialize, Serialize};

/// 选项，顺序即存储列位置
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Answer {
    pub text: String,
    pub correct: bool,
}

impl Answer {
    pub fn new(text: impl Into<String>, correct: bool) -> Self {
        Self {
            text: text.into(),
            correct,
        }
    }
}

/// 题目（生成结果 / 对外返回的形态）
///
/// `id` 为空表示尚未入库；入库后由题库分配。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Question {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    #[serde(rename = "question")]
    pub text: String,
    pub answers: Vec<Answer>,
}

impl Question {
    pub fn new(text: impl Into<String>, answers: Vec<Answer>) -> Self {
        Self {
            id: None,
            text: text.into(),
            answers,
        }
    }

    pub fn with_id(mut self, id: i64) -> Self {
        self.id = Some(id);
        self
    }

    pub fn correct_count(&self) -> usize {
        self.answers.iter().filter(|a| a.correct).count()
    }
}

/// 题目的存储列形态：四个选项列 + 正确项下标
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageAnswerFields {
    pub text: String,
    pub answer_0: String,
    pub answer_1: String,
    pub answer_2: String,
    pub answer_3: String,
    pub correct_index: i64,
}

/// quizzes 表中的一行
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredQuestionRow {
    pub id: i64,
    pub text: String,
    pub answer_0: String,
    pub answer_1: String,
    pub answer_2: String,
    pub answer_3: String,
    pub correct_index: i64,
    pub topic_id: i64,
    pub difficulty: i64,
    pub language: String,
    pub likes: i64,
    pub dislikes: i64,
}

/// 主题（categories 表）
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Topic {
    pub id: i64,
    pub title: String,
    pub language: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub name: String,
    pub email: String,
}

/// 难度档位：0 入门、1 进阶、2 高阶，其余取值按入门处理
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Difficulty {
    Beginner,
    Intermediate,
    Advanced,
}

impl Difficulty {
    pub fn from_tier(tier: i64) -> Self {
        match tier {
            1 => Difficulty::Intermediate,
            2 => Difficulty::Advanced,
            _ => Difficulty::Beginner,
        }
    }

    pub fn tier(self) -> i64 {
        match self {
            Difficulty::Beginner => 0,
            Difficulty::Intermediate => 1,
            Difficulty::Advanced => 2,
        }
    }
}

/// 提示词使用的语言名称
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Language {
    English,
    German,
    Russian,
    French,
    Bavarian,
}

impl Language {
    /// 未支持的语言代码回落到英语
    pub fn from_code(code: &str) -> Self {
        match code {
            "en" => Language::English,
            "de" => Language::German,
            "ru" => Language::Russian,
            "fr" => Language::French,
            "bar" => Language::Bavarian,
            _ => Language::English,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Language::English => "English",
            Language::German => "German",
            Language::Russian => "Russian",
            Language::French => "French",
            Language::Bavarian => "Bavarian",
        }
    }
}

/// 一次生成请求，每次调用现建，不落库
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationRequest {
    pub topic: String,
    pub difficulty: Difficulty,
    pub language_code: String,
    /// 空串表示没有去重约束
    pub avoid_directive: String,
    pub reference_text: String,
    pub variety_seed: i64,
}

impl GenerationRequest {
    pub fn language(&self) -> Language {
        Language::from_code(&self.language_code)
    }
}
