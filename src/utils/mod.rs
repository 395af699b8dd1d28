use std::future::Future;
use std::path::PathBuf;
use std::time::Duration;

use crate::error::{QuizError, Result};

pub fn get_app_data_dir() -> PathBuf {
    dirs::data_local_dir()
        .map(|dir| dir.join("trivia-quiz"))
        .unwrap_or_else(|| PathBuf::from("data"))
}

pub fn get_database_path() -> PathBuf {
    get_app_data_dir().join("quiz.db")
}

/// 初始化日志，进程内只应调用一次
pub fn init_logging(level: &str) -> Result<()> {
    let level = level
        .parse::<log::LevelFilter>()
        .map_err(|e| QuizError::Config(format!("invalid log level {:?}: {}", level, e)))?;

    fern::Dispatch::new()
        .format(|out, message, record| {
            out.finish(format_args!(
                "{} [{}] {}: {}",
                chrono::Local::now().format("%Y-%m-%d %H:%M:%S%.3f"),
                record.level(),
                record.target(),
                message
            ))
        })
        .level(level)
        .level_for("reqwest", log::LevelFilter::Warn)
        .level_for("hyper", log::LevelFilter::Warn)
        .chain(std::io::stderr())
        .apply()
        .map_err(|e| QuizError::Config(format!("logger already set: {}", e)))
}

/// 给外部调用加超时，超时转为 `QuizError::Timeout`
pub async fn with_timeout<T, F>(operation: &'static str, after: Duration, fut: F) -> Result<T>
where
    F: Future<Output = Result<T>>,
{
    match tokio::time::timeout(after, fut).await {
        Ok(result) => result,
        Err(_) => {
            log::warn!("{} timed out after {:?}", operation, after);
            Err(QuizError::Timeout { operation, after })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_with_timeout_passes_result_through() {
        let value = with_timeout("quick", Duration::from_secs(1), async { Ok(7) })
            .await
            .unwrap();
        assert_eq!(value, 7);
    }

    #[tokio::test]
    async fn test_with_timeout_reports_operation() {
        let err = with_timeout("slow call", Duration::from_millis(10), async {
            tokio::time::sleep(Duration::from_secs(60)).await;
            Ok(())
        })
        .await
        .unwrap_err();

        match err {
            QuizError::Timeout { operation, .. } => assert_eq!(operation, "slow call"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_database_path_lives_in_data_dir() {
        assert!(get_database_path().starts_with(get_app_data_dir()));
    }
}
