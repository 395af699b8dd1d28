//! 题库接口
//! 出题流水线只通过这里的三个操作读写题库，连接生命周期由调用方负责

use async_trait::async_trait;

use crate::error::Result;
use crate::models::{Difficulty, Question};

#[async_trait]
pub trait QuestionStore: Send + Sync {
    /// 该用户在 (语言, 主题, 难度) 下尚未解答的题目；没有时返回空列表
    async fn get_unsolved(
        &self,
        user_id: i64,
        language_code: &str,
        topic: &str,
        difficulty: Difficulty,
    ) -> Result<Vec<Question>>;

    /// 同一主题、同一语言下已存的全部题目
    async fn get_by_topic(&self, topic: &str, language_code: &str) -> Result<Vec<Question>>;

    /// 批量入库，返回的 id 与输入顺序、数量一致
    async fn insert_batch(
        &self,
        questions: &[Question],
        topic: &str,
        difficulty: Difficulty,
        language_code: &str,
    ) -> Result<Vec<i64>>;
}
