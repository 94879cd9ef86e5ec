use std::sync::Arc;

use crate::error::{ApiError, StoreError};
use crate::models::{ChatSession, Guru, User};
use crate::services::api::Api;
use crate::services::api_client::{ApiClient, DEFAULT_BASE_URL};
use crate::services::auth_service::AuthService;
use crate::services::chat_service::ChatService;
use crate::services::guru_service::GuruService;
use crate::services::storage::LocalStore;

/// Composition root: one instance per running client.
///
/// Owns the three state containers and wires the flows that cross them —
/// login pulls gurus and chats, a guru selection change re-points the chat
/// container, logout tears everything down. The presentation layer reads
/// the containers directly and mutates only through the operations here and
/// on the containers themselves.
pub struct App {
    pub auth: AuthService,
    pub gurus: GuruService,
    pub chats: ChatService,
}

impl App {
    pub fn new(api: Arc<dyn Api>, store: Arc<LocalStore>) -> Self {
        Self {
            auth: AuthService::new(api.clone(), store.clone()),
            gurus: GuruService::new(api.clone(), store.clone()),
            chats: ChatService::new(api, store),
        }
    }

    /// Wire everything against the production backend and the platform data
    /// dir.
    pub fn connect() -> Result<Self, StoreError> {
        Self::connect_to(DEFAULT_BASE_URL)
    }

    pub fn connect_to(base_url: &str) -> Result<Self, StoreError> {
        let store = Arc::new(LocalStore::open_default()?);
        let api: Arc<dyn Api> = Arc::new(ApiClient::new(base_url, store.clone()));
        Ok(Self::new(api, store))
    }

    /// Silent startup: restore the session when the persisted token is still
    /// good, then pull gurus and chats. Returns whether a user was restored.
    /// Never fails — startup must not block on a transient error.
    pub async fn bootstrap(&mut self) -> bool {
        if self.auth.check_status().await.is_none() {
            return false;
        }
        self.sync_after_login().await;
        true
    }

    pub async fn login(&mut self, email: &str, password: &str) -> Result<User, ApiError> {
        let user = self.auth.login(email, password).await?;
        self.sync_after_login().await;
        Ok(user)
    }

    pub async fn signup(
        &mut self,
        name: &str,
        email: &str,
        password: &str,
    ) -> Result<User, ApiError> {
        let user = self.auth.signup(name, email, password).await?;
        self.sync_after_login().await;
        Ok(user)
    }

    pub async fn google_login(&mut self, id_token: &str) -> Result<User, ApiError> {
        let user = self.auth.google_login(id_token).await?;
        self.sync_after_login().await;
        Ok(user)
    }

    /// Sign-in URL for the shell to open in a browser.
    pub fn google_signin_url(&mut self) -> String {
        self.auth.google_auth_url()
    }

    /// Finish the Google flow from the callback URL the shell receives.
    /// Expected shape: `uniguru://auth/callback?code=...&state=...`
    pub async fn handle_auth_callback(&mut self, callback_url: &str) -> Result<User, ApiError> {
        let parsed = url::Url::parse(callback_url)
            .map_err(|_| ApiError::validation("Malformed callback URL"))?;

        let mut code = None;
        let mut state = None;
        for (key, value) in parsed.query_pairs() {
            match key.as_ref() {
                "code" => code = Some(value.to_string()),
                "state" => state = Some(value.to_string()),
                _ => {}
            }
        }
        let (Some(code), Some(state)) = (code, state) else {
            return Err(ApiError::validation("Callback is missing code or state"));
        };

        let user = self.auth.google_exchange(&code, &state).await?;
        self.sync_after_login().await;
        Ok(user)
    }

    /// Make `guru` the selection and, when that changed anything, run the
    /// chat container's reaction so the current chat follows the guru.
    pub fn select_guru(&mut self, guru: Guru) {
        let changed = self.gurus.selected().map(|g| g.id.as_str()) != Some(guru.id.as_str());
        let guru_id = guru.id.clone();
        self.gurus.select_guru(guru);
        if changed {
            self.chats.on_guru_changed(Some(&guru_id));
        }
    }

    pub async fn create_guru(
        &mut self,
        name: &str,
        subject: &str,
        description: &str,
    ) -> Result<Guru, ApiError> {
        let user_id = self
            .auth
            .user()
            .map(|u| u.id.clone())
            .ok_or_else(|| ApiError::validation("You need to be signed in"))?;
        self.gurus
            .create_guru(&user_id, name, subject, description)
            .await
    }

    /// Remove a guru; if that moved the selection, the chat container reacts
    /// to the new one.
    pub async fn remove_guru(&mut self, guru_id: &str) -> Result<(), ApiError> {
        let before = self.gurus.selected().map(|g| g.id.clone());
        self.gurus.remove_guru(guru_id).await?;
        let after = self.gurus.selected().map(|g| g.id.clone());
        if before != after {
            self.chats.on_guru_changed(after.as_deref());
        }
        Ok(())
    }

    /// Manual chat creation for the currently selected guru. Rejects before
    /// any request when nothing is selected.
    pub async fn new_chat(&mut self) -> Result<ChatSession, ApiError> {
        let guru_id = self
            .gurus
            .selected()
            .map(|g| g.id.clone())
            .ok_or_else(|| ApiError::validation("Select a guru before starting a chat"))?;
        self.chats.create_chat(&guru_id, None).await
    }

    /// Send a message in the current chat (the server opens a thread when
    /// there is none).
    pub async fn send_message(&mut self, content: &str) -> Result<(), ApiError> {
        let user_id = self
            .auth
            .user()
            .map(|u| u.id.clone())
            .ok_or_else(|| ApiError::validation("You need to be signed in to chat"))?;
        let guru_id = self
            .gurus
            .selected()
            .map(|g| g.id.clone())
            .ok_or_else(|| ApiError::validation("Select a guru before sending a message"))?;
        self.chats.send_message(content, &guru_id, &user_id).await
    }

    /// Sign out and tear down every container, removing the resume keys.
    pub async fn logout(&mut self) {
        self.auth.logout().await;
        self.gurus.clear();
        self.chats.clear();
    }

    async fn sync_after_login(&mut self) {
        // A failed refresh must not undo a successful login; the shell can
        // retry from an empty list.
        if let Err(err) = self.gurus.refresh().await {
            tracing::warn!(error = %err, "guru refresh after login failed");
        }
        self.chats.initialize().await;
    }
}
