//! 百科参考资料
//! 为出题提供事实依据；获取失败时返回固定占位文本，不中断出题

use async_trait::async_trait;
use serde_json::Value;
use std::time::Duration;

use crate::config::ReferenceConfig;

/// 页面没有摘要
pub const NO_EXTRACT: &str = "No extract found.";

/// 请求或解析失败
pub const FETCH_FAILED: &str = "Error occurred while fetching extract.";

#[async_trait]
pub trait ReferenceFetcher: Send + Sync {
    /// 永不失败，出错时返回占位文本
    async fn fetch(&self, topic: &str, language_code: &str) -> String;
}

/// Wikipedia 摘要获取
pub struct WikipediaFetcher {
    endpoint_template: String,
    enabled: bool,
    http_client: reqwest::Client,
}

impl WikipediaFetcher {
    pub fn new(config: &ReferenceConfig) -> Self {
        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .unwrap_or_else(|e| {
                log::warn!("Falling back to default HTTP client: {}", e);
                reqwest::Client::new()
            });

        Self {
            endpoint_template: config.endpoint_template.clone(),
            enabled: config.enabled,
            http_client,
        }
    }

    /// `{lang}` 替换为语言代码；只接受字母和连字符，避免拼出任意主机名
    pub fn endpoint(&self, language_code: &str) -> Option<String> {
        let valid = !language_code.is_empty()
            && language_code
                .chars()
                .all(|c| c.is_ascii_alphabetic() || c == '-');
        valid.then(|| self.endpoint_template.replace("{lang}", language_code))
    }

    async fn request_extract(&self, url: &str, topic: &str) -> Result<Value, reqwest::Error> {
        self.http_client
            .get(url)
            .query(&[
                ("action", "query"),
                ("prop", "extracts"),
                ("format", "json"),
                ("titles", topic),
                ("explaintext", "false"),
                ("exintro", ""),
                ("exsectionformat", "plain"),
                ("origin", "*"),
            ])
            .send()
            .await?
            .error_for_status()?
            .json::<Value>()
            .await
    }
}

#[async_trait]
impl ReferenceFetcher for WikipediaFetcher {
    async fn fetch(&self, topic: &str, language_code: &str) -> String {
        if !self.enabled {
            return NO_EXTRACT.to_string();
        }

        let Some(url) = self.endpoint(language_code) else {
            log::warn!("Unsupported language code for reference lookup: {:?}", language_code);
            return FETCH_FAILED.to_string();
        };

        log::info!("Requesting reference extract for '{}' from {}", topic, url);
        match self.request_extract(&url, topic).await {
            Ok(body) => extract_from_response(&body).unwrap_or_else(|| NO_EXTRACT.to_string()),
            Err(e) => {
                log::error!("Error fetching extract for '{}': {}", topic, e);
                FETCH_FAILED.to_string()
            }
        }
    }
}

/// 取 query.pages 中第一页的 extract
pub fn extract_from_response(body: &Value) -> Option<String> {
    body.get("query")?
        .get("pages")?
        .as_object()?
        .values()
        .next()?
        .get("extract")?
        .as_str()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}
