use serde::{Deserialize, Serialize};
use chrono::{DateTime, Utc};

use super::GuruSummary;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sender {
    User,
    Guru,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    pub sender: Sender,
    pub content: String,
    pub timestamp: DateTime<Utc>,
}

/// List-view chat record, without message bodies.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatSession {
    #[serde(rename = "_id")]
    pub id: String,
    pub title: String,
    pub guru: GuruSummary,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub message_count: usize,
    pub last_activity: DateTime<Utc>,
    #[serde(default)]
    pub is_active: bool,
}

/// Full chat thread as returned by the single-chat and send-message
/// endpoints.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Conversation {
    #[serde(rename = "_id")]
    pub id: String,
    pub title: String,
    pub guru: GuruSummary,
    pub created_at: DateTime<Utc>,
    pub last_activity: DateTime<Utc>,
    #[serde(default)]
    pub messages: Vec<Message>,
}

impl From<&Conversation> for ChatSession {
    fn from(conversation: &Conversation) -> Self {
        Self {
            id: conversation.id.clone(),
            title: conversation.title.clone(),
            guru: conversation.guru.clone(),
            created_at: conversation.created_at,
            message_count: conversation.messages.len(),
            last_activity: conversation.last_activity,
            is_active: true,
        }
    }
}
