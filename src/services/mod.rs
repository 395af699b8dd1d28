// 服务模块
// 提供出题、去重、存储等核心业务逻辑

pub mod codec;
pub mod database;
pub mod dedup;
pub mod llm;
pub mod parser;
pub mod pipeline;
pub mod prompt;
pub mod reference;
pub mod store;
pub mod trivia;

pub use database::{SqliteQuestionStore, Vote};
pub use dedup::DeduplicationAdvisor;
pub use llm::{
    ChatClient,
    ChatMessage,
    CompletionClient,
    ContentGenerator,
    InferenceRequest,
    InferenceResponse,
    PromptedGenerator,
};
pub use pipeline::QuizAcquisitionPipeline;
pub use prompt::QuizPrompt;
pub use reference::{ReferenceFetcher, WikipediaFetcher, FETCH_FAILED, NO_EXTRACT};
pub use store::QuestionStore;
pub use trivia::TriviaService;
