use anyhow::{anyhow, Context};
use clap::{Parser, Subcommand};
use serde::Serialize;
use std::path::PathBuf;

use trivia_quiz::commands::{self, AppState};
use trivia_quiz::utils;
use trivia_quiz::AppConfig;

#[derive(Parser)]
#[command(name = "trivia-quiz", version, about = "AI 趣味问答：出题、趣味知识、答案解析")]
struct Cli {
    /// 配置文件路径，默认读取当前目录的 quiz.toml
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// 注册用户
    Register {
        #[arg(long)]
        name: String,
        #[arg(long)]
        email: String,
    },
    /// 获取一组题目
    Quiz {
        #[arg(long)]
        email: String,
        #[arg(long)]
        topic: String,
        /// 0 入门、1 进阶、2 高阶
        #[arg(long, default_value_t = 0)]
        difficulty: i64,
        #[arg(long, default_value = "en")]
        language: String,
    },
    /// 主题趣味知识
    FunFacts {
        #[arg(long)]
        topic: String,
        #[arg(long, default_value = "en")]
        language: String,
    },
    /// 主题表情
    Emoji {
        #[arg(long)]
        topic: String,
    },
    /// 解释正确答案
    Explain {
        #[arg(long)]
        question: String,
        #[arg(long)]
        answer: String,
        #[arg(long)]
        user_answer: String,
        #[arg(long, default_value = "en")]
        language: String,
    },
    /// 标记题目已解答
    Solve {
        #[arg(long)]
        email: String,
        #[arg(long)]
        quiz_id: i64,
    },
    Like {
        #[arg(long)]
        email: String,
        #[arg(long)]
        quiz_id: i64,
    },
    Dislike {
        #[arg(long)]
        email: String,
        #[arg(long)]
        quiz_id: i64,
    },
}

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => {
            let _ = dotenvy::dotenv();
            AppConfig::load_from(path)
        }
        None => AppConfig::load_with_dotenv(),
    }
    .context("Failed to load configuration")?;

    utils::init_logging(&config.log_level).context("Failed to initialize logging")?;

    let state = AppState::from_config(&config).context("Failed to open question store")?;

    match cli.command {
        Command::Register { name, email } => {
            print_json(&commands::register(&state, &name, &email).await.map_err(|e| anyhow!(e))?)
        }
        Command::Quiz {
            email,
            topic,
            difficulty,
            language,
        } => print_json(
            &commands::quiz(&state, &email, &topic, difficulty, &language)
                .await
                .map_err(|e| anyhow!(e))?,
        ),
        Command::FunFacts { topic, language } => print_json(
            &commands::fun_facts(&state, &topic, &language)
                .await
                .map_err(|e| anyhow!(e))?,
        ),
        Command::Emoji { topic } => {
            print_json(&commands::emoji(&state, &topic).await.map_err(|e| anyhow!(e))?)
        }
        Command::Explain {
            question,
            answer,
            user_answer,
            language,
        } => print_json(
            &commands::explain(&state, &question, &answer, &user_answer, &language)
                .await
                .map_err(|e| anyhow!(e))?,
        ),
        Command::Solve { email, quiz_id } => {
            commands::solve(&state, &email, quiz_id)
                .await
                .map_err(|e| anyhow!(e))?;
            print_json(&serde_json::json!({ "quiz_id": quiz_id, "solved": true }))
        }
        Command::Like { email, quiz_id } => print_json(
            &commands::like(&state, &email, quiz_id)
                .await
                .map_err(|e| anyhow!(e))?,
        ),
        Command::Dislike { email, quiz_id } => print_json(
            &commands::dislike(&state, &email, quiz_id)
                .await
                .map_err(|e| anyhow!(e))?,
        ),
    }
}
