//! In-memory `Api` fake for driving the state containers in tests.

use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::Utc;

use crate::error::ApiError;
use crate::models::{ChatSession, Conversation, Guru, GuruSummary, Message, Sender};
use crate::services::api::{Api, AuthResponse, ChatUpdate};

pub(crate) fn guru(id: &str, user: &str) -> Guru {
    Guru {
        id: id.to_string(),
        name: format!("Guru {}", id),
        subject: "general".to_string(),
        description: String::new(),
        user: user.to_string(),
    }
}

pub(crate) fn summary(guru_id: &str) -> GuruSummary {
    GuruSummary {
        id: guru_id.to_string(),
        name: format!("Guru {}", guru_id),
        subject: "general".to_string(),
        description: String::new(),
    }
}

pub(crate) fn session(id: &str, guru_id: &str) -> ChatSession {
    let now = Utc::now();
    ChatSession {
        id: id.to_string(),
        title: format!("Chat {}", id),
        guru: summary(guru_id),
        created_at: now,
        message_count: 0,
        last_activity: now,
        is_active: true,
    }
}

/// Records every call, can be told to fail the next one, and keeps a small
/// server-side view of gurus and sessions so list calls stay coherent.
#[derive(Default)]
pub(crate) struct FakeApi {
    gurus: Mutex<Vec<Guru>>,
    sessions: Mutex<Vec<ChatSession>>,
    calls: Mutex<Vec<String>>,
    fail: Mutex<Option<(u16, String)>>,
    fail_on: Mutex<Option<(String, u16, String)>>,
    next_id: AtomicUsize,
}

impl FakeApi {
    pub fn put_gurus(&self, gurus: Vec<Guru>) {
        *self.gurus.lock().unwrap() = gurus;
    }

    pub fn put_sessions(&self, sessions: Vec<ChatSession>) {
        *self.sessions.lock().unwrap() = sessions;
    }

    pub fn fail_next(&self, status: u16, message: &str) {
        *self.fail.lock().unwrap() = Some((status, message.to_string()));
    }

    /// Fail the next call with the given name, letting earlier calls pass.
    pub fn fail_on(&self, call: &str, status: u16, message: &str) {
        *self.fail_on.lock().unwrap() = Some((call.to_string(), status, message.to_string()));
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, call: &str) -> Result<(), ApiError> {
        self.calls.lock().unwrap().push(call.to_string());
        if let Some((status, message)) = self.fail.lock().unwrap().take() {
            return Err(ApiError::Server { status, message });
        }
        let mut fail_on = self.fail_on.lock().unwrap();
        if fail_on.as_ref().is_some_and(|(name, _, _)| name == call) {
            let (_, status, message) = fail_on.take().expect("checked above");
            return Err(ApiError::Server { status, message });
        }
        Ok(())
    }

    fn fresh_id(&self, prefix: &str) -> String {
        format!("{}{}", prefix, self.next_id.fetch_add(1, Ordering::Relaxed) + 1)
    }

    fn auth_response(&self, name: &str, email: &str) -> AuthResponse {
        AuthResponse {
            token: self.fresh_id("token-"),
            id: self.fresh_id("u"),
            name: name.to_string(),
            email: email.to_string(),
            navigate_url: None,
        }
    }
}

#[async_trait]
impl Api for FakeApi {
    async fn login(&self, email: &str, _password: &str) -> Result<AuthResponse, ApiError> {
        self.record("login")?;
        let name = email.split('@').next().unwrap_or("user");
        Ok(self.auth_response(name, email))
    }

    async fn signup(
        &self,
        name: &str,
        email: &str,
        _password: &str,
    ) -> Result<AuthResponse, ApiError> {
        self.record("signup")?;
        Ok(self.auth_response(name, email))
    }

    async fn auth_status(&self) -> Result<AuthResponse, ApiError> {
        self.record("auth_status")?;
        Ok(self.auth_response("Restored", "restored@example.com"))
    }

    async fn logout(&self) -> Result<(), ApiError> {
        self.record("logout")
    }

    async fn google_exchange(&self, _code: &str) -> Result<AuthResponse, ApiError> {
        self.record("google_exchange")?;
        Ok(self.auth_response("Google", "google@example.com"))
    }

    async fn google_token_login(&self, _id_token: &str) -> Result<AuthResponse, ApiError> {
        self.record("google_token_login")?;
        Ok(self.auth_response("Google", "google@example.com"))
    }

    async fn fetch_gurus(&self) -> Result<Vec<Guru>, ApiError> {
        self.record("fetch_gurus")?;
        Ok(self.gurus.lock().unwrap().clone())
    }

    async fn create_guru(
        &self,
        user_id: &str,
        name: &str,
        subject: &str,
        description: &str,
    ) -> Result<Guru, ApiError> {
        self.record("create_guru")?;
        let created = Guru {
            id: self.fresh_id("g"),
            name: name.to_string(),
            subject: subject.to_string(),
            description: description.to_string(),
            user: user_id.to_string(),
        };
        self.gurus.lock().unwrap().push(created.clone());
        Ok(created)
    }

    async fn create_custom_guru(
        &self,
        user_id: &str,
        name: &str,
        subject: &str,
        description: &str,
    ) -> Result<Guru, ApiError> {
        self.record("create_custom_guru")?;
        let created = Guru {
            id: self.fresh_id("g"),
            name: name.to_string(),
            subject: subject.to_string(),
            description: description.to_string(),
            user: user_id.to_string(),
        };
        self.gurus.lock().unwrap().push(created.clone());
        Ok(created)
    }

    async fn delete_guru(&self, guru_id: &str) -> Result<(), ApiError> {
        self.record("delete_guru")?;
        self.gurus.lock().unwrap().retain(|g| g.id != guru_id);
        Ok(())
    }

    async fn create_chat(
        &self,
        guru_id: &str,
        title: Option<&str>,
    ) -> Result<ChatSession, ApiError> {
        self.record("create_chat")?;
        let now = Utc::now();
        let created = ChatSession {
            id: self.fresh_id("c"),
            title: title.unwrap_or("New Chat").to_string(),
            guru: summary(guru_id),
            created_at: now,
            message_count: 0,
            last_activity: now,
            is_active: true,
        };
        self.sessions.lock().unwrap().insert(0, created.clone());
        Ok(created)
    }

    async fn list_chats(&self) -> Result<Vec<ChatSession>, ApiError> {
        self.record("list_chats")?;
        Ok(self.sessions.lock().unwrap().clone())
    }

    async fn list_chats_with_data(&self) -> Result<Vec<Conversation>, ApiError> {
        self.record("list_chats_with_data")?;
        let sessions = self.sessions.lock().unwrap();
        Ok(sessions
            .iter()
            .map(|s| Conversation {
                id: s.id.clone(),
                title: s.title.clone(),
                guru: s.guru.clone(),
                created_at: s.created_at,
                last_activity: s.last_activity,
                messages: Vec::new(),
            })
            .collect())
    }

    async fn fetch_chat(&self, chat_id: &str) -> Result<Conversation, ApiError> {
        self.record("fetch_chat")?;
        let sessions = self.sessions.lock().unwrap();
        let session = sessions
            .iter()
            .find(|s| s.id == chat_id)
            .ok_or_else(|| ApiError::Server {
                status: 404,
                message: "Chat not found".to_string(),
            })?;
        Ok(Conversation {
            id: session.id.clone(),
            title: session.title.clone(),
            guru: session.guru.clone(),
            created_at: session.created_at,
            last_activity: session.last_activity,
            messages: Vec::new(),
        })
    }

    async fn update_chat(
        &self,
        chat_id: &str,
        update: &ChatUpdate,
    ) -> Result<ChatSession, ApiError> {
        self.record("update_chat")?;
        let mut sessions = self.sessions.lock().unwrap();
        let session = sessions
            .iter_mut()
            .find(|s| s.id == chat_id)
            .ok_or_else(|| ApiError::Server {
                status: 404,
                message: "Chat not found".to_string(),
            })?;
        if let Some(title) = &update.title {
            session.title = title.clone();
        }
        if let Some(is_active) = update.is_active {
            session.is_active = is_active;
        }
        Ok(session.clone())
    }

    async fn delete_chat(&self, chat_id: &str) -> Result<(), ApiError> {
        self.record("delete_chat")?;
        self.sessions.lock().unwrap().retain(|s| s.id != chat_id);
        Ok(())
    }

    async fn send_message(
        &self,
        message: &str,
        guru_id: &str,
        _user_id: &str,
        chat_id: Option<&str>,
    ) -> Result<Conversation, ApiError> {
        self.record("send_message")?;
        let now = Utc::now();
        let messages = vec![
            Message {
                sender: Sender::User,
                content: message.to_string(),
                timestamp: now,
            },
            Message {
                sender: Sender::Guru,
                content: format!("Echo: {}", message),
                timestamp: now,
            },
        ];

        let mut sessions = self.sessions.lock().unwrap();
        let existing = chat_id.and_then(|id| sessions.iter().position(|s| s.id == id));
        let (id, title, created_at) = match existing {
            Some(pos) => {
                let session = &mut sessions[pos];
                session.message_count += 2;
                session.last_activity = now;
                (session.id.clone(), session.title.clone(), session.created_at)
            }
            None => {
                let id = chat_id
                    .map(str::to_string)
                    .unwrap_or_else(|| self.fresh_id("c"));
                let created = ChatSession {
                    id: id.clone(),
                    title: "New Chat".to_string(),
                    guru: summary(guru_id),
                    created_at: now,
                    message_count: 2,
                    last_activity: now,
                    is_active: true,
                };
                sessions.insert(0, created);
                (id, "New Chat".to_string(), now)
            }
        };

        Ok(Conversation {
            id,
            title,
            guru: summary(guru_id),
            created_at,
            last_activity: now,
            messages,
        })
    }

    async fn pdf_read(&self, _file: &Path) -> Result<String, ApiError> {
        self.record("pdf_read")?;
        Ok("extracted text".to_string())
    }

    async fn pdf_translate(&self, _file: &Path, _language: &str) -> Result<String, ApiError> {
        self.record("pdf_translate")?;
        Ok("translated text".to_string())
    }

    async fn pdf_chat(&self, _file: &Path, _question: &str) -> Result<String, ApiError> {
        self.record("pdf_chat")?;
        Ok("answer".to_string())
    }

    async fn image_search(&self, _file: &Path) -> Result<String, ApiError> {
        self.record("image_search")?;
        Ok("matches".to_string())
    }

    async fn image_explain(&self, _file: &Path) -> Result<String, ApiError> {
        self.record("image_explain")?;
        Ok("explanation".to_string())
    }
}
