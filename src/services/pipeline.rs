//! 出题流水线
//!
//! 单次请求、单次遍历、不重试：
//! 1. 先查该用户未解答的存量题目，有则直接返回，不调用模型
//! 2. 否则拉取参考资料和去重提示，组装生成请求，调用一次模型
//! 3. 解析校验模型输出，不合格直接报错，不落库
//! 4. 整批入库，拿回按顺序分配的 id
//! 5. 按位置回填 id；数量对不上时返回空列表，不返回部分带 id 的结果

use chrono::Utc;
use std::sync::Arc;
use std::time::Duration;

use crate::config::PipelineConfig;
use crate::error::Result;
use crate::models::{Difficulty, GenerationRequest, Question};
use crate::services::dedup::DeduplicationAdvisor;
use crate::services::llm::ContentGenerator;
use crate::services::parser;
use crate::services::reference::ReferenceFetcher;
use crate::services::store::QuestionStore;
use crate::utils::with_timeout;

pub struct QuizAcquisitionPipeline {
    store: Arc<dyn QuestionStore>,
    generator: Arc<dyn ContentGenerator>,
    reference: Arc<dyn ReferenceFetcher>,
    advisor: DeduplicationAdvisor,
    expected_questions: usize,
    generation_timeout: Duration,
    store_timeout: Duration,
}

impl QuizAcquisitionPipeline {
    pub fn new(
        store: Arc<dyn QuestionStore>,
        generator: Arc<dyn ContentGenerator>,
        reference: Arc<dyn ReferenceFetcher>,
        config: &PipelineConfig,
    ) -> Self {
        let advisor = DeduplicationAdvisor::new(Arc::clone(&store), config.store_timeout());
        Self {
            store,
            generator,
            reference,
            advisor,
            expected_questions: config.expected_questions,
            generation_timeout: config.generation_timeout(),
            store_timeout: config.store_timeout(),
        }
    }

    /// 为用户获取一组题目：优先返回未解答的存量题，否则现场生成
    ///
    /// 入库超时只放弃等待，不会取消已经在阻塞线程上执行的事务：
    /// 返回 `QuizError::Timeout { operation: "batch insert", .. }` 时这批题目可能已经提交。
    /// 调用方不要单独重试入库这一步，否则会写入重复题目。
    pub async fn acquire_quiz(
        &self,
        user_id: i64,
        topic: &str,
        difficulty: i64,
        language_code: &str,
    ) -> Result<Vec<Question>> {
        let difficulty = Difficulty::from_tier(difficulty);

        let unsolved = with_timeout(
            "unsolved lookup",
            self.store_timeout,
            self.store
                .get_unsolved(user_id, language_code, topic, difficulty),
        )
        .await?;
        if !unsolved.is_empty() {
            log::info!(
                "Found {} unsolved quizzes for user {} on '{}'",
                unsolved.len(),
                user_id,
                topic
            );
            return Ok(unsolved);
        }

        let request = self
            .build_request(topic, difficulty, language_code)
            .await;

        let raw = with_timeout(
            "content generation",
            self.generation_timeout,
            self.generator.generate(&request),
        )
        .await?;

        let questions = parser::parse_generated_batch(&raw, self.expected_questions)?;

        let ids = with_timeout(
            "batch insert",
            self.store_timeout,
            self.store
                .insert_batch(&questions, topic, difficulty, language_code),
        )
        .await?;

        Ok(reconcile(questions, ids))
    }

    async fn build_request(
        &self,
        topic: &str,
        difficulty: Difficulty,
        language_code: &str,
    ) -> GenerationRequest {
        let reference_text = self.reference.fetch(topic, language_code).await;
        let avoid_directive = self
            .advisor
            .build_avoid_directive(topic, language_code)
            .await;

        GenerationRequest {
            topic: topic.to_string(),
            difficulty,
            language_code: language_code.to_string(),
            avoid_directive,
            reference_text,
            variety_seed: Utc::now().timestamp_millis(),
        }
    }
}

/// 按位置回填 id；数量不一致时整批放弃，返回空列表
pub fn reconcile(questions: Vec<Question>, ids: Vec<i64>) -> Vec<Question> {
    if ids.len() != questions.len() {
        log::error!(
            "Inserted id count {} does not match question count {}, dropping batch",
            ids.len(),
            questions.len()
        );
        return Vec::new();
    }

    questions
        .into_iter()
        .zip(ids)
        .map(|(question, id)| question.with_id(id))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Answer;

    fn questions(n: usize) -> Vec<Question> {
        (0..n)
            .map(|i| {
                Question::new(
                    format!("Q{}", i),
                    vec![
                        Answer::new("a", true),
                        Answer::new("b", false),
                        Answer::new("c", false),
                        Answer::new("d", false),
                    ],
                )
            })
            .collect()
    }

    #[test]
    fn test_reconcile_attaches_ids_in_order() {
        let result = reconcile(questions(3), vec![10, 11, 12]);
        let ids: Vec<_> = result.iter().map(|q| q.id).collect();
        assert_eq!(ids, vec![Some(10), Some(11), Some(12)]);
        assert_eq!(result[2].text, "Q2");
    }

    #[test]
    fn test_reconcile_drops_batch_on_count_mismatch() {
        assert!(reconcile(questions(3), vec![10, 11]).is_empty());
        assert!(reconcile(questions(2), vec![10, 11, 12]).is_empty());
    }

    #[test]
    fn test_reconcile_empty_batch() {
        assert!(reconcile(Vec::new(), Vec::new()).is_empty());
    }
}
