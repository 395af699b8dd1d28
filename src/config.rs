//! 分层配置
//!
//! 优先级（高者覆盖低者）：
//! 1. 环境变量 `QUIZ_*`，`__` 分隔层级，如 `QUIZ_LLM__QUIZ_MODEL`
//! 2. `OPENAI_API_KEY`（仅映射到 `llm.api_key`）
//! 3. TOML 配置文件（`QUIZ_CONFIG` 指定的路径，或当前目录的 `quiz.toml`）
//! 4. 内置默认值

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::Result;
use crate::utils;

const DEFAULT_CONFIG_FILE: &str = "quiz.toml";

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AppConfig {
    #[serde(default)]
    pub llm: LlmConfig,
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(default)]
    pub reference: ReferenceConfig,
    #[serde(default)]
    pub pipeline: PipelineConfig,
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

/// 模型服务配置
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LlmConfig {
    pub base_url: String,
    pub api_key: String,
    /// 出题和答案解析用的模型
    pub quiz_model: String,
    /// 趣味知识和表情用的模型
    pub fact_model: String,
    pub temperature: f32,
    pub top_p: f32,
    pub max_tokens: u32,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.openai.com/v1".to_string(),
            api_key: String::new(),
            quiz_model: "gpt-4o".to_string(),
            fact_model: "gpt-3.5-turbo".to_string(),
            temperature: 0.8,
            top_p: 1.0,
            max_tokens: 2048,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct StoreConfig {
    pub database_path: PathBuf,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            database_path: utils::get_database_path(),
        }
    }
}

/// 参考资料配置
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ReferenceConfig {
    pub enabled: bool,
    /// `{lang}` 会替换为语言代码
    pub endpoint_template: String,
    pub timeout_secs: u64,
}

impl Default for ReferenceConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            endpoint_template: "https://{lang}.wikipedia.org/w/api.php".to_string(),
            timeout_secs: 10,
        }
    }
}

/// 出题流水线配置
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub expected_questions: usize,
    pub generation_timeout_secs: u64,
    pub store_timeout_secs: u64,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            expected_questions: 10,
            generation_timeout_secs: 120,
            store_timeout_secs: 15,
        }
    }
}

impl PipelineConfig {
    pub fn generation_timeout(&self) -> Duration {
        Duration::from_secs(self.generation_timeout_secs)
    }

    pub fn store_timeout(&self) -> Duration {
        Duration::from_secs(self.store_timeout_secs)
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            llm: LlmConfig::default(),
            store: StoreConfig::default(),
            reference: ReferenceConfig::default(),
            pipeline: PipelineConfig::default(),
            log_level: default_log_level(),
        }
    }
}

impl AppConfig {
    /// 从默认值、配置文件和环境变量加载
    pub fn load() -> Result<Self> {
        let file = std::env::var_os("QUIZ_CONFIG")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE));
        Self::load_from(&file)
    }

    /// 先读取 `.env` 再加载，找不到 `.env` 时静默跳过
    pub fn load_with_dotenv() -> Result<Self> {
        if let Ok(path) = dotenvy::dotenv() {
            log::debug!("Loaded environment from {}", path.display());
        }
        Self::load()
    }

    pub fn load_from(file: &Path) -> Result<Self> {
        Ok(Self::figment(file).extract()?)
    }

    pub fn figment(file: &Path) -> Figment {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        if file.exists() {
            figment = figment.merge(Toml::file(file));
        }

        figment
            .merge(Env::raw().only(&["OPENAI_API_KEY"]).map(|_| "llm.api_key".into()))
            .merge(Env::prefixed("QUIZ_").ignore(&["CONFIG"]).split("__"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use figment::Jail;

    #[test]
    fn test_defaults() {
        let config = AppConfig::default();

        assert_eq!(config.pipeline.expected_questions, 10);
        assert_eq!(config.pipeline.generation_timeout(), Duration::from_secs(120));
        assert_eq!(config.llm.quiz_model, "gpt-4o");
        assert!(config.reference.endpoint_template.contains("{lang}"));
    }

    #[test]
    fn test_file_and_env_layers() {
        Jail::expect_with(|jail| {
            jail.create_file(
                "quiz.toml",
                r#"
                log_level = "debug"

                [llm]
                quiz_model = "from-file"
                fact_model = "from-file"

                [pipeline]
                expected_questions = 5
                "#,
            )?;
            jail.set_env("QUIZ_LLM__FACT_MODEL", "from-env");
            jail.set_env("OPENAI_API_KEY", "sk-test");

            let config: AppConfig = AppConfig::figment(Path::new("quiz.toml")).extract()?;

            assert_eq!(config.log_level, "debug");
            assert_eq!(config.llm.quiz_model, "from-file");
            assert_eq!(config.llm.fact_model, "from-env");
            assert_eq!(config.llm.api_key, "sk-test");
            assert_eq!(config.pipeline.expected_questions, 5);
            assert_eq!(config.pipeline.store_timeout_secs, 15);
            Ok(())
        });
    }

    #[test]
    fn test_missing_file_uses_defaults() {
        Jail::expect_with(|_jail| {
            let config: AppConfig = AppConfig::figment(Path::new("absent.toml")).extract()?;
            assert_eq!(config.log_level, "info");
            Ok(())
        });
    }
}
