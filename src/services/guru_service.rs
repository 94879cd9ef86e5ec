use std::sync::Arc;

use crate::error::ApiError;
use crate::models::Guru;
use crate::services::api::Api;
use crate::services::fence::FetchFence;
use crate::services::storage::{LocalStore, KEY_SELECTED_GURU};

/// Guru State: the user's persona list and the current selection.
///
/// The selection is mirrored to the local store so it survives a restart;
/// the list itself is always re-fetched from the server.
pub struct GuruService {
    api: Arc<dyn Api>,
    store: Arc<LocalStore>,
    gurus: Vec<Guru>,
    selected: Option<Guru>,
    fence: FetchFence,
}

impl GuruService {
    /// Seeds the selection from the local store; corrupt or absent data
    /// yields no selection.
    pub fn new(api: Arc<dyn Api>, store: Arc<LocalStore>) -> Self {
        let selected = store.get_or_default::<Guru>(KEY_SELECTED_GURU);
        Self {
            api,
            store,
            gurus: Vec::new(),
            selected,
            fence: FetchFence::default(),
        }
    }

    pub fn gurus(&self) -> &[Guru] {
        &self.gurus
    }

    pub fn selected(&self) -> Option<&Guru> {
        self.selected.as_ref()
    }

    /// Replace the list with the server's. Fenced: a response that lost the
    /// race to a newer refresh is discarded instead of overwriting fresher
    /// state. Afterwards the selection is reconciled so it always points at
    /// a guru in the list, auto-selecting the first entry when nothing is
    /// selected.
    pub async fn refresh(&mut self) -> Result<(), ApiError> {
        let ticket = self.fence.begin();
        let gurus = self.api.fetch_gurus().await?;
        if !self.fence.commit(ticket) {
            tracing::debug!("discarding stale guru list response");
            return Ok(());
        }

        self.gurus = gurus;
        self.reconcile_selection();
        Ok(())
    }

    /// Local cache append for a creation the caller has already confirmed
    /// with the server. Does not call the API. The first guru in the list is
    /// auto-selected.
    pub fn add_guru(&mut self, guru: Guru) {
        let first = self.gurus.is_empty();
        self.gurus.push(guru.clone());
        if first {
            self.set_selected(Some(guru));
        }
    }

    /// Server-confirmed creation, then the cache append above.
    pub async fn create_guru(
        &mut self,
        user_id: &str,
        name: &str,
        subject: &str,
        description: &str,
    ) -> Result<Guru, ApiError> {
        let name = name.trim();
        let subject = subject.trim();
        if name.is_empty() || subject.is_empty() {
            return Err(ApiError::validation("Guru name and subject are required"));
        }

        let guru = self
            .api
            .create_custom_guru(user_id, name, subject, description.trim())
            .await?;
        self.add_guru(guru.clone());
        Ok(guru)
    }

    /// Delete on the server first; the local list is only touched on
    /// success. If the removed guru was selected, selection falls to the new
    /// first entry, or clears.
    pub async fn remove_guru(&mut self, guru_id: &str) -> Result<(), ApiError> {
        self.api.delete_guru(guru_id).await?;

        self.gurus.retain(|g| g.id != guru_id);
        if self.selected.as_ref().is_some_and(|s| s.id == guru_id) {
            let next = self.gurus.first().cloned();
            self.set_selected(next);
        }
        Ok(())
    }

    pub fn select_guru(&mut self, guru: Guru) {
        self.set_selected(Some(guru));
    }

    /// Update the selection and mirror it to the local store (JSON write, or
    /// key removal when cleared). The id is not validated against the list
    /// outside `refresh`; that is the caller's responsibility.
    pub fn set_selected(&mut self, guru: Option<Guru>) {
        match &guru {
            Some(g) => self.store.set_quiet(KEY_SELECTED_GURU, g),
            None => self.store.remove_quiet(KEY_SELECTED_GURU),
        }
        self.selected = guru;
    }

    /// Logout teardown.
    pub fn clear(&mut self) {
        self.gurus.clear();
        self.set_selected(None);
    }

    fn reconcile_selection(&mut self) {
        let current = self
            .selected
            .as_ref()
            .and_then(|sel| self.gurus.iter().find(|g| g.id == sel.id))
            .cloned();
        match current {
            // Re-point at the fetched copy in case the record changed.
            Some(guru) => self.set_selected(Some(guru)),
            None => self.set_selected(self.gurus.first().cloned()),
        }
    }
}
