// 命令模块
// 对外暴露的命令接口，错误统一转为 String 返回给调用方

pub mod database;
pub mod quiz;
pub mod trivia;

use std::sync::Arc;

use crate::config::AppConfig;
use crate::error::Result;
use crate::services::{
    ChatClient, CompletionClient, PromptedGenerator, QuestionStore, QuizAcquisitionPipeline,
    ReferenceFetcher, SqliteQuestionStore, TriviaService, WikipediaFetcher,
};

pub use database::{dislike, like, register, solve, UserDto, VoteCountsDto};
pub use quiz::{quiz, AnswerDto, QuizDto};
pub use trivia::{emoji, explain, fun_facts, ExplanationDto, FunFactsDto};

/// 应用状态，所有命令共享
pub struct AppState {
    pub store: Arc<SqliteQuestionStore>,
    pub pipeline: QuizAcquisitionPipeline,
    pub trivia: TriviaService,
}

impl AppState {
    /// 按配置组装题库、模型客户端和百科客户端
    pub fn from_config(config: &AppConfig) -> Result<Self> {
        let store = Arc::new(SqliteQuestionStore::open(&config.store.database_path)?);
        Ok(Self::with_store(store, config))
    }

    pub fn with_store(store: Arc<SqliteQuestionStore>, config: &AppConfig) -> Self {
        let client: Arc<dyn CompletionClient> = Arc::new(ChatClient::new(&config.llm));
        let reference: Arc<dyn ReferenceFetcher> = Arc::new(WikipediaFetcher::new(&config.reference));
        let generator = Arc::new(PromptedGenerator::new(
            Arc::clone(&client),
            &config.llm,
            config.pipeline.expected_questions,
        ));

        let question_store: Arc<dyn QuestionStore> = store.clone();
        let pipeline = QuizAcquisitionPipeline::new(
            question_store,
            generator,
            Arc::clone(&reference),
            &config.pipeline,
        );
        let trivia = TriviaService::new(
            client,
            reference,
            config.llm.clone(),
            config.pipeline.generation_timeout(),
        );

        Self {
            store,
            pipeline,
            trivia,
        }
    }
}
