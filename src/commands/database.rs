// 用户与题目状态命令
// 注册、解题记录、点赞点踩

use serde::{Deserialize, Serialize};

use super::AppState;
use crate::models::User;
use crate::services::Vote;

/// 用户传输对象
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserDto {
    pub id: i64,
    pub name: String,
    pub email: String,
}

impl From<User> for UserDto {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            name: user.name,
            email: user.email,
        }
    }
}

/// 点赞点踩计数
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct VoteCountsDto {
    pub quiz_id: i64,
    pub likes: i64,
    pub dislikes: i64,
}

/// 注册用户
pub async fn register(state: &AppState, name: &str, email: &str) -> Result<UserDto, String> {
    let id = state
        .store
        .register_user(name, email)
        .await
        .map_err(|e| e.to_string())?;

    log::info!("Registered user {} <{}>", id, email);

    Ok(User {
        id,
        name: name.to_string(),
        email: email.to_string(),
    }
    .into())
}

/// 标记题目已解答
pub async fn solve(state: &AppState, email: &str, quiz_id: i64) -> Result<(), String> {
    let user_id = state
        .store
        .user_id_for_email(email)
        .await
        .map_err(|e| e.to_string())?;

    state
        .store
        .solve(user_id, quiz_id)
        .await
        .map_err(|e| e.to_string())
}

pub async fn like(state: &AppState, email: &str, quiz_id: i64) -> Result<VoteCountsDto, String> {
    cast_vote(state, email, quiz_id, Vote::Like).await
}

pub async fn dislike(state: &AppState, email: &str, quiz_id: i64) -> Result<VoteCountsDto, String> {
    cast_vote(state, email, quiz_id, Vote::Dislike).await
}

async fn cast_vote(
    state: &AppState,
    email: &str,
    quiz_id: i64,
    vote: Vote,
) -> Result<VoteCountsDto, String> {
    let user_id = state
        .store
        .user_id_for_email(email)
        .await
        .map_err(|e| e.to_string())?;

    match vote {
        Vote::Like => state.store.like(user_id, quiz_id).await,
        Vote::Dislike => state.store.dislike(user_id, quiz_id).await,
    }
    .map_err(|e| e.to_string())?;

    let likes = state.store.likes(quiz_id).await.map_err(|e| e.to_string())?;
    let dislikes = state.store.dislikes(quiz_id).await.map_err(|e| e.to_string())?;

    Ok(VoteCountsDto {
        quiz_id,
        likes,
        dislikes,
    })
}
