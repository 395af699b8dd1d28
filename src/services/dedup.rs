//! 去重提示
//! 把同主题、同语言下已有的题目列进提示词，减少重复出题

use std::sync::Arc;
use std::time::Duration;

use crate::services::store::QuestionStore;
use crate::utils::with_timeout;

const AVOID_HEADER: &str =
    "Avoid all of the following questions and questions that are related or sound similar:";

pub struct DeduplicationAdvisor {
    store: Arc<dyn QuestionStore>,
    store_timeout: Duration,
}

impl DeduplicationAdvisor {
    pub fn new(store: Arc<dyn QuestionStore>, store_timeout: Duration) -> Self {
        Self {
            store,
            store_timeout,
        }
    }

    /// 返回空串表示没有约束；查询失败同样返回空串
    pub async fn build_avoid_directive(&self, topic: &str, language_code: &str) -> String {
        let lookup = with_timeout(
            "topic history lookup",
            self.store_timeout,
            self.store.get_by_topic(topic, language_code),
        )
        .await;

        let questions = match lookup {
            Ok(questions) => questions,
            Err(e) => {
                log::warn!(
                    "Skipping avoid list for '{}' ({}): {}",
                    topic,
                    language_code,
                    e
                );
                return String::new();
            }
        };

        let prior: Vec<&str> = questions
            .iter()
            .map(|q| q.text.trim())
            .filter(|text| !text.is_empty())
            .collect();

        if prior.is_empty() {
            return String::new();
        }

        log::debug!("Avoid list for '{}' has {} entries", topic, prior.len());
        format!("{}\n{}", AVOID_HEADER, prior.join("\n"))
    }
}
