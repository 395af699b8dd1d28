// 数据库服务模块
// 提供 SQLite 题库操作，支持主题管理、题目批量入库和用户解题/点赞状态

use async_trait::async_trait;
use chrono::Utc;
use rusqlite::{Connection, OptionalExtension, Row};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use crate::error::{QuizError, Result};
use crate::models::{Difficulty, Question, StoredQuestionRow, Topic};
use crate::services::codec;
use crate::services::store::QuestionStore;

/// 未解题目每次最多返回的数量
const UNSOLVED_LIMIT: i64 = 10;

/// 去重参考题目的上限
const TOPIC_HISTORY_LIMIT: i64 = 100;

const QUESTION_COLUMNS: &str = "q.id, q.question, q.answer_0, q.answer_1, q.answer_2, q.answer_3,
     q.correct, q.category_id, q.difficulty, q.language, q.likes, q.dislikes";

/// 点赞 / 点踩
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Vote {
    Like,
    Dislike,
}

impl Vote {
    fn table(self) -> &'static str {
        match self {
            Vote::Like => "user_likes",
            Vote::Dislike => "user_dislikes",
        }
    }

    fn counter(self) -> &'static str {
        match self {
            Vote::Like => "likes",
            Vote::Dislike => "dislikes",
        }
    }

    fn opposite(self) -> Vote {
        match self {
            Vote::Like => Vote::Dislike,
            Vote::Dislike => Vote::Like,
        }
    }

    fn past_tense(self) -> &'static str {
        match self {
            Vote::Like => "liked",
            Vote::Dislike => "disliked",
        }
    }
}

/// 数据库服务
pub struct SqliteQuestionStore {
    pool: Arc<Mutex<Connection>>,
    db_path: Option<PathBuf>,
}

impl SqliteQuestionStore {
    /// 打开（必要时创建）数据库文件
    pub fn open(db_path: &Path) -> Result<Self> {
        // 确保数据目录存在
        if let Some(parent) = db_path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                fs::create_dir_all(parent)
                    .map_err(|e| QuizError::Store(format!("Failed to create data dir: {}", e)))?;
            }
        }

        let conn = Connection::open(db_path)?;
        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
        ",
        )?;

        let service = Self {
            pool: Arc::new(Mutex::new(conn)),
            db_path: Some(db_path.to_path_buf()),
        };
        service.initialize()?;
        log::info!("Opened question store at {}", db_path.display());
        Ok(service)
    }

    /// 内存数据库，测试用
    pub fn open_in_memory() -> Result<Self> {
        let service = Self {
            pool: Arc::new(Mutex::new(Connection::open_in_memory()?)),
            db_path: None,
        };
        service.initialize()?;
        Ok(service)
    }

    pub fn db_path(&self) -> Option<&Path> {
        self.db_path.as_deref()
    }

    /// 初始化数据库表结构
    pub fn initialize(&self) -> Result<()> {
        let conn = self.lock()?;

        conn.execute_batch(
            "
            PRAGMA foreign_keys = ON;

            CREATE TABLE IF NOT EXISTS categories (
                category_id INTEGER PRIMARY KEY AUTOINCREMENT,
                title TEXT NOT NULL UNIQUE,
                language TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS quizzes (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                question TEXT NOT NULL,
                difficulty INTEGER NOT NULL,
                language TEXT NOT NULL,
                category_id INTEGER NOT NULL,
                answer_0 TEXT NOT NULL,
                answer_1 TEXT NOT NULL,
                answer_2 TEXT NOT NULL,
                answer_3 TEXT NOT NULL,
                correct INTEGER NOT NULL CHECK(correct BETWEEN 0 AND 3),
                likes INTEGER NOT NULL DEFAULT 0,
                dislikes INTEGER NOT NULL DEFAULT 0,
                created_at TEXT NOT NULL,
                FOREIGN KEY (category_id) REFERENCES categories(category_id)
            );

            CREATE INDEX IF NOT EXISTS idx_quizzes_category ON quizzes(category_id);
            CREATE INDEX IF NOT EXISTS idx_quizzes_difficulty ON quizzes(difficulty);

            CREATE TABLE IF NOT EXISTS users (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                name TEXT NOT NULL,
                email TEXT NOT NULL UNIQUE,
                xp INTEGER NOT NULL DEFAULT 0,
                created_at TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS user_quiz (
                user_id INTEGER NOT NULL,
                quiz_id INTEGER NOT NULL,
                PRIMARY KEY (user_id, quiz_id),
                FOREIGN KEY (user_id) REFERENCES users(id) ON DELETE CASCADE,
                FOREIGN KEY (quiz_id) REFERENCES quizzes(id) ON DELETE CASCADE
            );

            CREATE TABLE IF NOT EXISTS user_likes (
                user_id INTEGER NOT NULL,
                quiz_id INTEGER NOT NULL,
                PRIMARY KEY (user_id, quiz_id),
                FOREIGN KEY (user_id) REFERENCES users(id) ON DELETE CASCADE,
                FOREIGN KEY (quiz_id) REFERENCES quizzes(id) ON DELETE CASCADE
            );

            CREATE TABLE IF NOT EXISTS user_dislikes (
                user_id INTEGER NOT NULL,
                quiz_id INTEGER NOT NULL,
                PRIMARY KEY (user_id, quiz_id),
                FOREIGN KEY (user_id) REFERENCES users(id) ON DELETE CASCADE,
                FOREIGN KEY (quiz_id) REFERENCES quizzes(id) ON DELETE CASCADE
            );
        ",
        )?;

        Ok(())
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, Connection>> {
        self.pool
            .lock()
            .map_err(|e| QuizError::Store(format!("connection lock poisoned: {}", e)))
    }

    /// 在阻塞线程池上执行一次数据库往返
    async fn run<T, F>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&mut Connection) -> Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let pool = Arc::clone(&self.pool);
        tokio::task::spawn_blocking(move || {
            let mut conn = pool
                .lock()
                .map_err(|e| QuizError::Store(format!("connection lock poisoned: {}", e)))?;
            f(&mut *conn)
        })
        .await?
    }

    // ==================== 主题管理 ====================

    /// 按标题查主题
    pub async fn topic_by_title(&self, title: &str) -> Result<Option<Topic>> {
        let title = title.to_string();
        self.run(move |conn| {
            conn.query_row(
                "SELECT category_id, title, language FROM categories WHERE title = ?1",
                rusqlite::params![title],
                |row| {
                    Ok(Topic {
                        id: row.get(0)?,
                        title: row.get(1)?,
                        language: row.get(2)?,
                    })
                },
            )
            .optional()
            .map_err(QuizError::from)
        })
        .await
    }

    /// 查找或创建主题，返回主题 id
    pub async fn get_or_add_topic(&self, title: &str, language_code: &str) -> Result<i64> {
        let title = title.to_string();
        let language_code = language_code.to_string();
        self.run(move |conn| get_or_add_topic(conn, &title, &language_code))
            .await
    }

    // ==================== 用户 ====================

    /// 注册用户，返回用户 id
    pub async fn register_user(&self, name: &str, email: &str) -> Result<i64> {
        let name = name.to_string();
        let email = email.to_string();
        self.run(move |conn| {
            conn.execute(
                "INSERT INTO users (name, email, xp, created_at) VALUES (?1, ?2, 0, ?3)",
                rusqlite::params![name, email, Utc::now().to_rfc3339()],
            )?;
            Ok(conn.last_insert_rowid())
        })
        .await
    }

    pub async fn user_id_for_email(&self, email: &str) -> Result<i64> {
        let email = email.to_string();
        self.run(move |conn| {
            conn.query_row(
                "SELECT id FROM users WHERE email = ?1",
                rusqlite::params![email],
                |row| row.get(0),
            )
            .optional()?
            .ok_or(QuizError::UserNotFound(email))
        })
        .await
    }

    // ==================== 解题与评价 ====================

    /// 记录用户已解答某题，重复记录忽略
    pub async fn solve(&self, user_id: i64, quiz_id: i64) -> Result<()> {
        self.run(move |conn| {
            conn.execute(
                "INSERT OR IGNORE INTO user_quiz (user_id, quiz_id) VALUES (?1, ?2)",
                rusqlite::params![user_id, quiz_id],
            )?;
            Ok(())
        })
        .await
    }

    pub async fn like(&self, user_id: i64, quiz_id: i64) -> Result<()> {
        self.run(move |conn| vote(conn, user_id, quiz_id, Vote::Like))
            .await
    }

    pub async fn dislike(&self, user_id: i64, quiz_id: i64) -> Result<()> {
        self.run(move |conn| vote(conn, user_id, quiz_id, Vote::Dislike))
            .await
    }

    pub async fn likes(&self, quiz_id: i64) -> Result<i64> {
        self.run(move |conn| counter(conn, quiz_id, Vote::Like))
            .await
    }

    pub async fn dislikes(&self, quiz_id: i64) -> Result<i64> {
        self.run(move |conn| counter(conn, quiz_id, Vote::Dislike))
            .await
    }

    /// 按 id 取单行
    pub async fn get_row(&self, quiz_id: i64) -> Result<Option<StoredQuestionRow>> {
        self.run(move |conn| {
            let sql = format!("SELECT {} FROM quizzes q WHERE q.id = ?1", QUESTION_COLUMNS);
            conn.query_row(&sql, rusqlite::params![quiz_id], row_to_stored)
                .optional()
                .map_err(QuizError::from)
        })
        .await
    }
}

#[async_trait]
impl QuestionStore for SqliteQuestionStore {
    async fn get_unsolved(
        &self,
        user_id: i64,
        language_code: &str,
        topic: &str,
        difficulty: Difficulty,
    ) -> Result<Vec<Question>> {
        let topic = topic.to_string();
        let language_code = language_code.to_string();
        let tier = difficulty.tier();

        let rows = self
            .run(move |conn| {
                let sql = format!(
                    "SELECT {}
                     FROM quizzes q
                     JOIN categories c ON q.category_id = c.category_id
                     LEFT JOIN user_quiz uq ON uq.quiz_id = q.id AND uq.user_id = ?1
                     WHERE c.title = ?2 AND q.difficulty = ?3 AND c.language = ?4
                       AND uq.user_id IS NULL
                     ORDER BY q.likes DESC, q.id
                     LIMIT ?5",
                    QUESTION_COLUMNS
                );
                query_rows(
                    conn,
                    &sql,
                    rusqlite::params![user_id, topic, tier, language_code, UNSOLVED_LIMIT],
                )
            })
            .await?;

        Ok(rows.iter().map(codec::from_storage_row).collect())
    }

    async fn get_by_topic(&self, topic: &str, language_code: &str) -> Result<Vec<Question>> {
        let topic = topic.to_string();
        let language_code = language_code.to_string();

        let rows = self
            .run(move |conn| {
                let sql = format!(
                    "SELECT {}
                     FROM quizzes q
                     JOIN categories c ON q.category_id = c.category_id
                     WHERE c.title = ?1 AND q.language = ?2
                     ORDER BY q.likes, q.id
                     LIMIT ?3",
                    QUESTION_COLUMNS
                );
                query_rows(
                    conn,
                    &sql,
                    rusqlite::params![topic, language_code, TOPIC_HISTORY_LIMIT],
                )
            })
            .await?;

        Ok(rows.iter().map(codec::from_storage_row).collect())
    }

    async fn insert_batch(
        &self,
        questions: &[Question],
        topic: &str,
        difficulty: Difficulty,
        language_code: &str,
    ) -> Result<Vec<i64>> {
        let questions = questions.to_vec();
        let topic = topic.to_string();
        let language_code = language_code.to_string();
        let tier = difficulty.tier();

        self.run(move |conn| {
            let topic_id = get_or_add_topic(conn, &topic, &language_code)?;
            if questions.is_empty() {
                return Ok(Vec::new());
            }

            let now = Utc::now().to_rfc3339();
            let tx = conn.transaction()?;
            let mut ids = Vec::with_capacity(questions.len());
            {
                let mut stmt = tx.prepare(
                    "INSERT INTO quizzes
                     (question, difficulty, language, category_id,
                      answer_0, answer_1, answer_2, answer_3, correct, created_at)
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
                )?;

                for question in &questions {
                    let fields = codec::to_storage_row(question)?;
                    stmt.execute(rusqlite::params![
                        fields.text,
                        tier,
                        language_code,
                        topic_id,
                        fields.answer_0,
                        fields.answer_1,
                        fields.answer_2,
                        fields.answer_3,
                        fields.correct_index,
                        now,
                    ])?;
                    ids.push(tx.last_insert_rowid());
                }
            }
            tx.commit()?;

            log::debug!(
                "Inserted {} questions for topic {} (#{})",
                ids.len(),
                topic,
                topic_id
            );
            Ok(ids)
        })
        .await
    }
}

// ==================== 辅助方法 ====================

fn find_topic_id(conn: &Connection, title: &str) -> Result<Option<i64>> {
    conn.query_row(
        "SELECT category_id FROM categories WHERE title = ?1",
        rusqlite::params![title],
        |row| row.get(0),
    )
    .optional()
    .map_err(QuizError::from)
}

/// 先查后建；建表时 title 唯一，并发创建冲突时 INSERT OR IGNORE 落空，再查一次即可
fn get_or_add_topic(conn: &Connection, title: &str, language_code: &str) -> Result<i64> {
    if let Some(id) = find_topic_id(conn, title)? {
        return Ok(id);
    }

    conn.execute(
        "INSERT OR IGNORE INTO categories (title, language) VALUES (?1, ?2)",
        rusqlite::params![title, language_code],
    )?;
    log::info!("Created topic '{}' ({})", title, language_code);

    find_topic_id(conn, title)?.ok_or_else(|| QuizError::TopicResolution(title.to_string()))
}

fn vote(conn: &mut Connection, user_id: i64, quiz_id: i64, vote: Vote) -> Result<()> {
    let tx = conn.transaction()?;

    let existing: Option<i64> = tx
        .query_row(
            &format!(
                "SELECT 1 FROM {} WHERE user_id = ?1 AND quiz_id = ?2",
                vote.table()
            ),
            rusqlite::params![user_id, quiz_id],
            |row| row.get(0),
        )
        .optional()?;
    if existing.is_some() {
        return Err(QuizError::AlreadyVoted {
            user_id,
            quiz_id,
            vote: vote.past_tense(),
        });
    }

    let updated = tx.execute(
        &format!(
            "UPDATE quizzes SET {0} = {0} + 1 WHERE id = ?1",
            vote.counter()
        ),
        rusqlite::params![quiz_id],
    )?;
    if updated == 0 {
        return Err(QuizError::Store(format!("Quiz {} not found", quiz_id)));
    }

    tx.execute(
        &format!(
            "INSERT INTO {} (user_id, quiz_id) VALUES (?1, ?2)",
            vote.table()
        ),
        rusqlite::params![user_id, quiz_id],
    )?;

    // 撤销相反的评价
    let opposite = vote.opposite();
    let removed = tx.execute(
        &format!(
            "DELETE FROM {} WHERE user_id = ?1 AND quiz_id = ?2",
            opposite.table()
        ),
        rusqlite::params![user_id, quiz_id],
    )?;
    if removed > 0 {
        tx.execute(
            &format!(
                "UPDATE quizzes SET {0} = {0} - 1 WHERE id = ?1 AND {0} > 0",
                opposite.counter()
            ),
            rusqlite::params![quiz_id],
        )?;
    }

    tx.commit()?;
    Ok(())
}

fn counter(conn: &mut Connection, quiz_id: i64, vote: Vote) -> Result<i64> {
    conn.query_row(
        &format!("SELECT {} FROM quizzes WHERE id = ?1", vote.counter()),
        rusqlite::params![quiz_id],
        |row| row.get(0),
    )
    .optional()?
    .ok_or_else(|| QuizError::Store(format!("Couldn't get {} for quiz {}", vote.counter(), quiz_id)))
}

fn query_rows(
    conn: &Connection,
    sql: &str,
    params: impl rusqlite::Params,
) -> Result<Vec<StoredQuestionRow>> {
    let mut stmt = conn.prepare(sql)?;
    let rows = stmt.query_map(params, row_to_stored)?;

    let mut result = Vec::new();
    for row in rows {
        result.push(row?);
    }
    Ok(result)
}

/// 从数据库行转换为 StoredQuestionRow
fn row_to_stored(row: &Row) -> rusqlite::Result<StoredQuestionRow> {
    Ok(StoredQuestionRow {
        id: row.get(0)?,
        text: row.get(1)?,
        answer_0: row.get(2)?,
        answer_1: row.get(3)?,
        answer_2: row.get(4)?,
        answer_3: row.get(5)?,
        correct_index: row.get(6)?,
        topic_id: row.get(7)?,
        difficulty: row.get(8)?,
        language: row.get(9)?,
        likes: row.get(10)?,
        dislikes: row.get(11)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Answer;
    use pretty_assertions::assert_eq;

    fn sample(text: &str, correct: usize) -> Question {
        let answers = (0..4)
            .map(|i| Answer::new(format!("{} {}", text, i), i == correct))
            .collect();
        Question::new(text, answers)
    }

    #[tokio::test]
    async fn test_get_or_add_topic_is_idempotent() {
        let store = SqliteQuestionStore::open_in_memory().unwrap();

        let first = store.get_or_add_topic("Volcanoes", "en").await.unwrap();
        let second = store.get_or_add_topic("Volcanoes", "en").await.unwrap();

        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn test_topic_lookup_ignores_language() {
        let store = SqliteQuestionStore::open_in_memory().unwrap();

        let en = store.get_or_add_topic("Volcanoes", "en").await.unwrap();
        let de = store.get_or_add_topic("Volcanoes", "de").await.unwrap();

        assert_eq!(en, de);
        let topic = store.topic_by_title("Volcanoes").await.unwrap().unwrap();
        assert_eq!(topic.language, "en");
    }

    #[tokio::test]
    async fn test_insert_batch_returns_ids_in_order() {
        let store = SqliteQuestionStore::open_in_memory().unwrap();
        let batch = vec![sample("first", 0), sample("second", 3)];

        let ids = store
            .insert_batch(&batch, "Volcanoes", Difficulty::Beginner, "en")
            .await
            .unwrap();

        assert_eq!(ids.len(), 2);
        let second = store.get_row(ids[1]).await.unwrap().unwrap();
        assert_eq!(second.text, "second");
        assert_eq!(second.correct_index, 3);
        assert_eq!(second.difficulty, 0);
    }

    #[tokio::test]
    async fn test_insert_batch_rolls_back_malformed_batch() {
        let store = SqliteQuestionStore::open_in_memory().unwrap();
        let mut broken = sample("broken", 0);
        broken.answers.pop();
        let batch = vec![sample("ok", 1), broken];

        let err = store
            .insert_batch(&batch, "Volcanoes", Difficulty::Beginner, "en")
            .await
            .unwrap_err();

        assert!(matches!(err, QuizError::MalformedQuestion(_)));
        let stored = store.get_by_topic("Volcanoes", "en").await.unwrap();
        assert!(stored.is_empty());
    }

    #[tokio::test]
    async fn test_vote_counters() {
        let store = SqliteQuestionStore::open_in_memory().unwrap();
        let user = store.register_user("Roman", "roman@example.com").await.unwrap();
        let ids = store
            .insert_batch(&[sample("q", 0)], "Volcanoes", Difficulty::Beginner, "en")
            .await
            .unwrap();

        store.dislike(user, ids[0]).await.unwrap();
        assert_eq!(store.dislikes(ids[0]).await.unwrap(), 1);

        store.like(user, ids[0]).await.unwrap();
        assert_eq!(store.likes(ids[0]).await.unwrap(), 1);
        assert_eq!(store.dislikes(ids[0]).await.unwrap(), 0);

        let err = store.like(user, ids[0]).await.unwrap_err();
        assert!(matches!(err, QuizError::AlreadyVoted { .. }));
    }

    #[tokio::test]
    async fn test_like_unknown_quiz_fails() {
        let store = SqliteQuestionStore::open_in_memory().unwrap();
        let user = store.register_user("Roman", "roman@example.com").await.unwrap();

        let err = store.like(user, 404).await.unwrap_err();
        assert!(matches!(err, QuizError::Store(_)));
    }

    #[tokio::test]
    async fn test_unknown_email() {
        let store = SqliteQuestionStore::open_in_memory().unwrap();
        let err = store.user_id_for_email("nobody@example.com").await.unwrap_err();
        assert!(matches!(err, QuizError::UserNotFound(_)));
    }
}
