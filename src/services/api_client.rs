use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::multipart;
use reqwest::{Client, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::error::ApiError;
use crate::models::{ChatSession, Conversation, Guru};
use crate::services::api::{Api, AuthResponse, ChatUpdate};
use crate::services::storage::{LocalStore, KEY_AUTH_TOKEN};

pub const DEFAULT_BASE_URL: &str = "https://api.uniguru.in/api/v1";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);
const GENERIC_ERROR: &str = "Something went wrong. Please try again.";

#[derive(Debug, Deserialize)]
struct ServerError {
    #[serde(default)]
    message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GuruList {
    #[serde(default)]
    chatbots: Vec<Guru>,
}

#[derive(Debug, Deserialize)]
struct ChatList {
    #[serde(default)]
    chats: Vec<ChatSession>,
}

#[derive(Debug, Deserialize)]
struct ConversationList {
    #[serde(default)]
    chats: Vec<Conversation>,
}

#[derive(Debug, Deserialize)]
struct FeatureResult {
    #[serde(default)]
    result: Option<String>,
    #[serde(default)]
    message: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct CreateChatBody<'a> {
    chatbot_id: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    title: Option<&'a str>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SendMessageBody<'a> {
    message: &'a str,
    chatbot_id: &'a str,
    user_id: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    chat_id: Option<&'a str>,
}

/// HTTP implementation of the backend contract.
///
/// Reads the bearer token from the local store before every request, and
/// drops it whenever the server answers 401 so a stale session cannot keep
/// sending a dead token. No retries: a failed request surfaces immediately.
pub struct ApiClient {
    http: Client,
    base_url: String,
    store: Arc<LocalStore>,
}

impl ApiClient {
    pub fn new(base_url: impl Into<String>, store: Arc<LocalStore>) -> Self {
        let http = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .expect("Failed to create HTTP client");

        Self {
            http,
            base_url: base_url.into(),
            store,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        match self.store.get_or_default::<String>(KEY_AUTH_TOKEN) {
            Some(token) => request.header(
                reqwest::header::AUTHORIZATION,
                format!("Bearer {}", token),
            ),
            None => request,
        }
    }

    async fn handle<T: DeserializeOwned>(&self, response: Response) -> Result<T, ApiError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response.json::<T>().await?);
        }
        let body = response.text().await.unwrap_or_default();
        Err(self.normalize_error(status.as_u16(), &body))
    }

    async fn handle_empty(&self, response: Response) -> Result<(), ApiError> {
        let status = response.status();
        if status.is_success() {
            return Ok(());
        }
        let body = response.text().await.unwrap_or_default();
        Err(self.normalize_error(status.as_u16(), &body))
    }

    /// Turn a failure response into an `ApiError::Server`, preferring the
    /// server's own `{ message }` field. A 401 also drops the stored token.
    fn normalize_error(&self, status: u16, body: &str) -> ApiError {
        if status == 401 {
            self.store.remove_quiet(KEY_AUTH_TOKEN);
        }
        let message = serde_json::from_str::<ServerError>(body)
            .ok()
            .and_then(|e| e.message)
            .filter(|m| !m.trim().is_empty())
            .unwrap_or_else(|| GENERIC_ERROR.to_string());
        ApiError::Server { status, message }
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        let response = self.authorized(self.http.get(self.url(path))).send().await?;
        self.handle(response).await
    }

    async fn post_json<T: DeserializeOwned, B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, ApiError> {
        let response = self
            .authorized(self.http.post(self.url(path)).json(body))
            .send()
            .await?;
        self.handle(response).await
    }

    async fn put_json<T: DeserializeOwned, B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, ApiError> {
        let response = self
            .authorized(self.http.put(self.url(path)).json(body))
            .send()
            .await?;
        self.handle(response).await
    }

    async fn delete_empty(&self, path: &str) -> Result<(), ApiError> {
        let response = self
            .authorized(self.http.delete(self.url(path)))
            .send()
            .await?;
        self.handle_empty(response).await
    }

    /// Upload one file part named `file` plus optional text fields, and pull
    /// the text result out of the response.
    async fn upload(
        &self,
        path: &str,
        file: &Path,
        extra: &[(&str, &str)],
    ) -> Result<String, ApiError> {
        let bytes = tokio::fs::read(file).await.map_err(|err| {
            ApiError::validation(format!("Could not read {}: {}", file.display(), err))
        })?;
        let file_name = file
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("upload")
            .to_string();

        let mut form = multipart::Form::new()
            .part("file", multipart::Part::bytes(bytes).file_name(file_name));
        for (key, value) in extra {
            form = form.text(key.to_string(), value.to_string());
        }

        let response = self
            .authorized(self.http.post(self.url(path)).multipart(form))
            .send()
            .await?;
        let result: FeatureResult = self.handle(response).await?;
        Ok(result.result.or(result.message).unwrap_or_default())
    }
}

#[async_trait]
impl Api for ApiClient {
    async fn login(&self, email: &str, password: &str) -> Result<AuthResponse, ApiError> {
        self.post_json(
            "/user/login",
            &json!({ "email": email, "password": password }),
        )
        .await
    }

    async fn signup(
        &self,
        name: &str,
        email: &str,
        password: &str,
    ) -> Result<AuthResponse, ApiError> {
        self.post_json(
            "/user/signup",
            &json!({ "name": name, "email": email, "password": password }),
        )
        .await
    }

    async fn auth_status(&self) -> Result<AuthResponse, ApiError> {
        self.get_json("/user/auth-status").await
    }

    async fn logout(&self) -> Result<(), ApiError> {
        let response = self
            .authorized(self.http.get(self.url("/user/logout")))
            .send()
            .await?;
        self.handle_empty(response).await
    }

    async fn google_exchange(&self, code: &str) -> Result<AuthResponse, ApiError> {
        self.post_json("/auth/google", &json!({ "code": code })).await
    }

    async fn google_token_login(&self, id_token: &str) -> Result<AuthResponse, ApiError> {
        self.post_json("/auth/google/token", &json!({ "token": id_token }))
            .await
    }

    async fn fetch_gurus(&self) -> Result<Vec<Guru>, ApiError> {
        let list: GuruList = self.get_json("/guru/g-g").await?;
        Ok(list.chatbots)
    }

    async fn create_guru(
        &self,
        user_id: &str,
        name: &str,
        subject: &str,
        description: &str,
    ) -> Result<Guru, ApiError> {
        self.post_json(
            &format!("/guru/n-g/{}", user_id),
            &json!({ "name": name, "subject": subject, "description": description }),
        )
        .await
    }

    async fn create_custom_guru(
        &self,
        user_id: &str,
        name: &str,
        subject: &str,
        description: &str,
    ) -> Result<Guru, ApiError> {
        self.post_json(
            &format!("/guru/custom-guru/{}", user_id),
            &json!({ "name": name, "subject": subject, "description": description }),
        )
        .await
    }

    async fn delete_guru(&self, guru_id: &str) -> Result<(), ApiError> {
        self.delete_empty(&format!("/guru/g-d/{}", guru_id)).await
    }

    async fn create_chat(
        &self,
        guru_id: &str,
        title: Option<&str>,
    ) -> Result<ChatSession, ApiError> {
        self.post_json(
            "/chat/create",
            &CreateChatBody {
                chatbot_id: guru_id,
                title,
            },
        )
        .await
    }

    async fn list_chats(&self) -> Result<Vec<ChatSession>, ApiError> {
        let list: ChatList = self.get_json("/chat/list").await?;
        Ok(list.chats)
    }

    async fn list_chats_with_data(&self) -> Result<Vec<Conversation>, ApiError> {
        let list: ConversationList = self.get_json("/chat/all-with-data").await?;
        Ok(list.chats)
    }

    async fn fetch_chat(&self, chat_id: &str) -> Result<Conversation, ApiError> {
        self.get_json(&format!("/chat/chat/{}", chat_id)).await
    }

    async fn update_chat(
        &self,
        chat_id: &str,
        update: &ChatUpdate,
    ) -> Result<ChatSession, ApiError> {
        self.put_json(&format!("/chat/chat/{}", chat_id), update).await
    }

    async fn delete_chat(&self, chat_id: &str) -> Result<(), ApiError> {
        self.delete_empty(&format!("/chat/chat/{}", chat_id)).await
    }

    async fn send_message(
        &self,
        message: &str,
        guru_id: &str,
        user_id: &str,
        chat_id: Option<&str>,
    ) -> Result<Conversation, ApiError> {
        self.post_json(
            "/chat/new",
            &SendMessageBody {
                message,
                chatbot_id: guru_id,
                user_id,
                chat_id,
            },
        )
        .await
    }

    async fn pdf_read(&self, file: &Path) -> Result<String, ApiError> {
        self.upload("/feature/pdf/r", file, &[]).await
    }

    async fn pdf_translate(&self, file: &Path, language: &str) -> Result<String, ApiError> {
        self.upload("/feature/pdf/t", file, &[("language", language)])
            .await
    }

    async fn pdf_chat(&self, file: &Path, question: &str) -> Result<String, ApiError> {
        self.upload("/feature/pdf/c", file, &[("question", question)])
            .await
    }

    async fn image_search(&self, file: &Path) -> Result<String, ApiError> {
        self.upload("/feature/image/s", file, &[]).await
    }

    async fn image_explain(&self, file: &Path) -> Result<String, ApiError> {
        self.upload("/feature/image/e", file, &[]).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client_with_store() -> (tempfile::TempDir, ApiClient, Arc<LocalStore>) {
        let dir = tempfile::tempdir().unwrap();
        let store = Arc::new(LocalStore::open(dir.path()).unwrap());
        let client = ApiClient::new(DEFAULT_BASE_URL, store.clone());
        (dir, client, store)
    }

    #[test]
    fn server_message_is_preferred() {
        let (_dir, client, _store) = client_with_store();
        let err = client.normalize_error(400, r#"{"message":"Email already in use"}"#);
        assert_eq!(err.to_string(), "Email already in use");
    }

    #[test]
    fn missing_message_falls_back_to_generic() {
        let (_dir, client, _store) = client_with_store();
        for body in ["", "{}", r#"{"message":"  "}"#, "<html>oops</html>"] {
            let err = client.normalize_error(500, body);
            assert_eq!(err.to_string(), GENERIC_ERROR);
        }
    }

    #[test]
    fn unauthorized_clears_stored_token() {
        let (_dir, client, store) = client_with_store();
        store.set(KEY_AUTH_TOKEN, &"stale".to_string()).unwrap();

        let err = client.normalize_error(401, "");
        assert!(err.is_unauthorized());
        assert_eq!(store.get_or_default::<String>(KEY_AUTH_TOKEN), None);
    }

    #[test]
    fn other_statuses_keep_the_token() {
        let (_dir, client, store) = client_with_store();
        store.set(KEY_AUTH_TOKEN, &"fine".to_string()).unwrap();

        client.normalize_error(500, "");
        assert_eq!(
            store.get_or_default::<String>(KEY_AUTH_TOKEN),
            Some("fine".to_string())
        );
    }
}
