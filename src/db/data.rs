//! The bundled fixture set loaded by `seed`.

use chrono::{DateTime, NaiveDateTime};
use serde::Deserialize;

use super::{ErrorKind, Result};

#[derive(Debug, Clone, Deserialize)]
pub struct TopicData {
    pub slug: String,
    pub description: String,
    pub img_url: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UserData {
    pub username: String,
    pub name: String,
    pub avatar_url: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ArticleData {
    pub title: String,
    pub topic: String,
    pub author: String,
    pub body: String,
    /// Milliseconds since the epoch.
    pub created_at: i64,
    #[serde(default)]
    pub votes: i64,
    pub article_img_url: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CommentData {
    pub article_title: String,
    pub body: String,
    #[serde(default)]
    pub votes: i64,
    pub author: String,
    /// Milliseconds since the epoch.
    pub created_at: i64,
}

#[derive(Debug, Clone)]
pub struct SeedData {
    pub topics: Vec<TopicData>,
    pub users: Vec<UserData>,
    pub articles: Vec<ArticleData>,
    pub comments: Vec<CommentData>,
}

pub fn test_data() -> Result<SeedData> {
    Ok(SeedData {
        topics: serde_json::from_str(include_str!("../../data/test/topics.json"))?,
        users: serde_json::from_str(include_str!("../../data/test/users.json"))?,
        articles: serde_json::from_str(include_str!("../../data/test/articles.json"))?,
        comments: serde_json::from_str(include_str!("../../data/test/comments.json"))?,
    })
}

pub fn timestamp_to_datetime(millis: i64) -> Result<NaiveDateTime> {
    DateTime::from_timestamp_millis(millis)
        .map(|date| date.naive_utc())
        .ok_or_else(|| ErrorKind::Msg(format!("timestamp out of range: {}", millis)).into())
}
