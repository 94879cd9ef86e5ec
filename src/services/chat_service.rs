use std::sync::Arc;
use std::time::Duration;

use crate::error::ApiError;
use crate::models::{ChatSession, Conversation};
use crate::services::api::{Api, ChatUpdate};
use crate::services::fence::FetchFence;
use crate::services::storage::{LocalStore, KEY_CURRENT_CHAT};

// Coalesces the burst of initialize calls the shell can produce right after
// a user becomes available.
const INIT_DEBOUNCE: Duration = Duration::from_millis(100);

/// Chat State: every chat session of the signed-in user (most-recent-first),
/// the current-chat pointer, and the messages of the currently open thread.
///
/// The pointer is mirrored to the local store; session data is always
/// re-fetched from the server. Messages are held only for the open chat.
pub struct ChatService {
    api: Arc<dyn Api>,
    store: Arc<LocalStore>,
    sessions: Vec<ChatSession>,
    current_chat_id: Option<String>,
    conversation: Option<Conversation>,
    initialized: bool,
    fence: FetchFence,
}

impl ChatService {
    /// Seeds the current-chat pointer from the local store; it is validated
    /// against the server's list during `initialize`.
    pub fn new(api: Arc<dyn Api>, store: Arc<LocalStore>) -> Self {
        let current_chat_id = store.get_or_default::<String>(KEY_CURRENT_CHAT);
        Self {
            api,
            store,
            sessions: Vec::new(),
            current_chat_id,
            conversation: None,
            initialized: false,
            fence: FetchFence::default(),
        }
    }

    pub fn sessions(&self) -> &[ChatSession] {
        &self.sessions
    }

    pub fn current_chat_id(&self) -> Option<&str> {
        self.current_chat_id.as_deref()
    }

    /// Messages of the currently open chat, if one has been loaded.
    pub fn conversation(&self) -> Option<&Conversation> {
        self.conversation.as_ref()
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    /// The session the current pointer refers to, or `None`.
    pub fn current_chat(&self) -> Option<&ChatSession> {
        let id = self.current_chat_id.as_deref()?;
        self.sessions.iter().find(|s| s.id == id)
    }

    /// The subset of sessions belonging to one guru, in list order.
    pub fn chats_by_guru(&self, guru_id: &str) -> Vec<&ChatSession> {
        self.sessions.iter().filter(|s| s.guru.id == guru_id).collect()
    }

    /// One-time list fetch once a user is available. A stored chat id that
    /// the server no longer knows is dropped; if no chat is current after
    /// that, the most recent one is selected and persisted. Failures are
    /// logged and leave the container uninitialized so a later call retries.
    pub async fn initialize(&mut self) {
        if self.initialized {
            return;
        }
        tokio::time::sleep(INIT_DEBOUNCE).await;

        let ticket = self.fence.begin();
        let sessions = match self.api.list_chats().await {
            Ok(sessions) => sessions,
            Err(err) => {
                tracing::warn!(error = %err, "chat list fetch failed");
                return;
            }
        };
        if !self.fence.commit(ticket) {
            tracing::debug!("discarding stale chat list response");
            return;
        }

        self.sessions = sessions;
        self.initialized = true;

        if let Some(id) = self.current_chat_id.clone() {
            if !self.sessions.iter().any(|s| s.id == id) {
                self.set_current(None);
            }
        }
        if self.current_chat_id.is_none() {
            let most_recent = self.sessions.first().map(|s| s.id.clone());
            if let Some(id) = most_recent {
                self.set_current(Some(id));
            }
        }
    }

    /// Reactive transition for guru selection changes: point at the most
    /// recent session of the newly selected guru, or clear the pointer (and
    /// its stored key) when that guru has no sessions. Never creates a chat.
    pub fn on_guru_changed(&mut self, guru_id: Option<&str>) {
        let Some(guru_id) = guru_id else {
            self.set_current(None);
            return;
        };

        let most_recent = self
            .sessions
            .iter()
            .find(|s| s.guru.id == guru_id)
            .map(|s| s.id.clone());
        self.set_current(most_recent);
    }

    /// Server-confirmed creation; nothing is touched locally before the API
    /// succeeds. The new session is prepended (most-recent-first) and made
    /// current.
    pub async fn create_chat(
        &mut self,
        guru_id: &str,
        title: Option<&str>,
    ) -> Result<ChatSession, ApiError> {
        if guru_id.trim().is_empty() {
            return Err(ApiError::validation("A guru is required to start a chat"));
        }

        let session = self.api.create_chat(guru_id, title).await?;
        self.sessions.insert(0, session.clone());
        self.set_current(Some(session.id.clone()));
        Ok(session)
    }

    /// Set the pointer without validating the id exists in the list; that is
    /// the caller's responsibility.
    pub fn select_chat(&mut self, chat_id: &str) {
        self.set_current(Some(chat_id.to_string()));
    }

    /// Rename on the server, then patch the title locally; no re-fetch. The
    /// local list is untouched when the call fails. Renaming to the current
    /// title still issues the call.
    pub async fn rename_chat(&mut self, chat_id: &str, new_title: &str) -> Result<(), ApiError> {
        let title = new_title.trim();
        if title.is_empty() {
            return Err(ApiError::validation("Chat title cannot be empty"));
        }

        let update = ChatUpdate {
            title: Some(title.to_string()),
            ..ChatUpdate::default()
        };
        self.api.update_chat(chat_id, &update).await?;

        if let Some(session) = self.sessions.iter_mut().find(|s| s.id == chat_id) {
            session.title = title.to_string();
        }
        if let Some(conversation) = self.conversation.as_mut() {
            if conversation.id == chat_id {
                conversation.title = title.to_string();
            }
        }
        Ok(())
    }

    /// Delete on the server first; the local list is only touched on
    /// success. Deleting the current chat falls back to the most recent
    /// remaining session, whichever guru it belongs to, or clears.
    pub async fn delete_chat(&mut self, chat_id: &str) -> Result<(), ApiError> {
        self.api.delete_chat(chat_id).await?;

        self.sessions.retain(|s| s.id != chat_id);
        if self.current_chat_id.as_deref() == Some(chat_id) {
            let next = self.sessions.first().map(|s| s.id.clone());
            self.set_current(next);
        }
        Ok(())
    }

    /// Fetch the full thread for one chat and make it the open conversation.
    pub async fn load_conversation(&mut self, chat_id: &str) -> Result<(), ApiError> {
        let conversation = self.api.fetch_chat(chat_id).await?;
        self.conversation = Some(conversation);
        Ok(())
    }

    /// Send a message in the current chat. With no current chat the server
    /// opens a new thread; its id is adopted and the session list re-synced.
    /// On success the returned thread replaces the open conversation and the
    /// matching session's counters are patched from it.
    pub async fn send_message(
        &mut self,
        content: &str,
        guru_id: &str,
        user_id: &str,
    ) -> Result<(), ApiError> {
        let content = content.trim();
        if content.is_empty() {
            return Err(ApiError::validation("Message cannot be empty"));
        }

        let chat_id = self.current_chat_id.clone();
        let conversation = self
            .api
            .send_message(content, guru_id, user_id, chat_id.as_deref())
            .await?;

        if chat_id.is_none() {
            self.set_current(Some(conversation.id.clone()));
            match self.api.list_chats().await {
                Ok(sessions) => self.sessions = sessions,
                Err(err) => {
                    // Keep the pointer valid until the next successful sync.
                    tracing::warn!(error = %err, "chat list re-sync failed");
                    self.sessions.insert(0, ChatSession::from(&conversation));
                }
            }
        } else if let Some(session) =
            self.sessions.iter_mut().find(|s| s.id == conversation.id)
        {
            session.message_count = conversation.messages.len();
            session.last_activity = conversation.last_activity;
        }

        self.conversation = Some(conversation);
        Ok(())
    }

    /// Logout teardown.
    pub fn clear(&mut self) {
        self.sessions.clear();
        self.initialized = false;
        self.set_current(None);
    }

    fn set_current(&mut self, chat_id: Option<String>) {
        match &chat_id {
            Some(id) => self.store.set_quiet(KEY_CURRENT_CHAT, id),
            None => self.store.remove_quiet(KEY_CURRENT_CHAT),
        }
        // Loaded messages belong to the previous pointer.
        let keep = matches!(
            (&self.conversation, &chat_id),
            (Some(conversation), Some(id)) if conversation.id == *id
        );
        if !keep {
            self.conversation = None;
        }
        self.current_chat_id = chat_id;
    }
}
