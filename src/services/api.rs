use std::path::Path;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::ApiError;
use crate::models::{ChatSession, Conversation, Guru, User};

/// Payload returned by every successful auth call.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthResponse {
    pub token: String,
    pub id: String,
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub navigate_url: Option<String>,
}

impl AuthResponse {
    pub fn user(&self) -> User {
        User {
            id: self.id.clone(),
            name: self.name.clone(),
            email: self.email.clone(),
        }
    }
}

/// Fields accepted by the chat update endpoint; `None` fields are omitted
/// from the request body.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_archived: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_active: Option<bool>,
}

/// The backend contract the state containers are written against.
///
/// `ApiClient` is the HTTP implementation; tests substitute an in-memory
/// fake so the containers can be driven without a network.
#[async_trait]
pub trait Api: Send + Sync {
    // User auth
    async fn login(&self, email: &str, password: &str) -> Result<AuthResponse, ApiError>;
    async fn signup(&self, name: &str, email: &str, password: &str)
        -> Result<AuthResponse, ApiError>;
    async fn auth_status(&self) -> Result<AuthResponse, ApiError>;
    async fn logout(&self) -> Result<(), ApiError>;
    async fn google_exchange(&self, code: &str) -> Result<AuthResponse, ApiError>;
    async fn google_token_login(&self, id_token: &str) -> Result<AuthResponse, ApiError>;

    // Gurus
    async fn fetch_gurus(&self) -> Result<Vec<Guru>, ApiError>;
    async fn create_guru(
        &self,
        user_id: &str,
        name: &str,
        subject: &str,
        description: &str,
    ) -> Result<Guru, ApiError>;
    async fn create_custom_guru(
        &self,
        user_id: &str,
        name: &str,
        subject: &str,
        description: &str,
    ) -> Result<Guru, ApiError>;
    async fn delete_guru(&self, guru_id: &str) -> Result<(), ApiError>;

    // Chats
    async fn create_chat(&self, guru_id: &str, title: Option<&str>)
        -> Result<ChatSession, ApiError>;
    async fn list_chats(&self) -> Result<Vec<ChatSession>, ApiError>;
    async fn list_chats_with_data(&self) -> Result<Vec<Conversation>, ApiError>;
    async fn fetch_chat(&self, chat_id: &str) -> Result<Conversation, ApiError>;
    async fn update_chat(&self, chat_id: &str, update: &ChatUpdate)
        -> Result<ChatSession, ApiError>;
    async fn delete_chat(&self, chat_id: &str) -> Result<(), ApiError>;
    async fn send_message(
        &self,
        message: &str,
        guru_id: &str,
        user_id: &str,
        chat_id: Option<&str>,
    ) -> Result<Conversation, ApiError>;

    // File features (multipart uploads)
    async fn pdf_read(&self, file: &Path) -> Result<String, ApiError>;
    async fn pdf_translate(&self, file: &Path, language: &str) -> Result<String, ApiError>;
    async fn pdf_chat(&self, file: &Path, question: &str) -> Result<String, ApiError>;
    async fn image_search(&self, file: &Path) -> Result<String, ApiError>;
    async fn image_explain(&self, file: &Path) -> Result<String, ApiError>;
}
