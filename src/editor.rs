//! Buffered editing of one mask's extended fields.
//!
//! The buffer stages free-form edits (title, description, source URLs,
//! credential keys) without touching the list store; nothing becomes visible
//! elsewhere until a save commits it through the gateway. Each list has a
//! pending-input staging slot that is validated on `add_*` and cleared only
//! when the value is accepted.

use std::sync::Arc;

use crate::gateway::{GatewayError, MaskGateway};
use crate::model::{MaskId, MaskRecord, MaskSubmission};
use crate::session::SessionContext;

pub struct DetailEditor {
    gateway: Arc<dyn MaskGateway>,
    session: SessionContext,
    mask_id: Option<MaskId>,
    title: String,
    description: String,
    source_urls: Vec<String>,
    credential_keys: Vec<String>,
    pending_url: String,
    pending_key: String,
}

#[derive(Debug, thiserror::Error)]
pub enum EditorError {
    #[error("title must not be empty")]
    EmptyTitle,

    #[error("a session user is required to create a mask")]
    MissingOwner,

    #[error("not a well-formed absolute URL: {0}")]
    MalformedUrl(String),

    #[error("source URL already listed: {0}")]
    DuplicateUrl(String),

    #[error("credential key must not be empty")]
    EmptyKey,

    /// The mask is known to be gone on the backend, as opposed to the
    /// backend being unreachable with its state unknown.
    #[error("mask {0} does not exist on the server")]
    MaskMissing(MaskId),

    #[error(transparent)]
    Gateway(#[from] GatewayError),
}

/// What a successful save did, so the caller can navigate accordingly.
#[derive(Clone, Debug, PartialEq)]
pub enum SaveOutcome {
    Created(MaskRecord),
    Updated,
}

impl DetailEditor {
    /// An empty buffer in create mode: no bound id, a save will create.
    pub fn create(gateway: Arc<dyn MaskGateway>, session: SessionContext) -> Self {
        Self {
            gateway,
            session,
            mask_id: None,
            title: String::new(),
            description: String::new(),
            source_urls: Vec::new(),
            credential_keys: Vec::new(),
            pending_url: String::new(),
            pending_key: String::new(),
        }
    }

    /// Seeds a buffer from the mask's full record. Credential keys are
    /// write-only on the backend and always start out empty here.
    pub fn load(
        gateway: Arc<dyn MaskGateway>,
        session: SessionContext,
        id: MaskId,
    ) -> Result<Self, EditorError> {
        let detail = gateway.load_detail(&id).map_err(|err| match err {
            GatewayError::Missing => EditorError::MaskMissing(id.clone()),
            other => EditorError::Gateway(other),
        })?;

        Ok(Self {
            gateway,
            session,
            mask_id: Some(id),
            title: detail.title.unwrap_or_default(),
            description: detail.description.unwrap_or_default(),
            source_urls: detail.site_url,
            credential_keys: Vec::new(),
            pending_url: String::new(),
            pending_key: String::new(),
        })
    }

    pub fn mask_id(&self) -> Option<&MaskId> {
        self.mask_id.as_ref()
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn set_title(&mut self, title: impl Into<String>) {
        self.title = title.into();
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn set_description(&mut self, description: impl Into<String>) {
        self.description = description.into();
    }

    pub fn source_urls(&self) -> &[String] {
        &self.source_urls
    }

    pub fn credential_keys(&self) -> &[String] {
        &self.credential_keys
    }

    pub fn pending_url(&self) -> &str {
        &self.pending_url
    }

    pub fn pending_key(&self) -> &str {
        &self.pending_key
    }

    pub fn stage_url(&mut self, candidate: impl Into<String>) {
        self.pending_url = candidate.into();
    }

    pub fn stage_key(&mut self, candidate: impl Into<String>) {
        self.pending_key = candidate.into();
    }

    /// Commits the staged URL. Accepted only if it parses as an absolute URL
    /// and is not already listed (string equality); rejections leave both the
    /// list and the staging slot unchanged.
    pub fn add_url(&mut self) -> Result<(), EditorError> {
        let candidate = self.pending_url.trim().to_string();
        if url::Url::parse(&candidate).is_err() {
            return Err(EditorError::MalformedUrl(candidate));
        }
        if self.source_urls.iter().any(|u| u == &candidate) {
            return Err(EditorError::DuplicateUrl(candidate));
        }
        self.source_urls.push(candidate);
        self.pending_url.clear();
        Ok(())
    }

    /// Commits the staged credential key. Must be non-empty; a duplicate is
    /// silently dropped (no error, no state change).
    pub fn add_key(&mut self) -> Result<(), EditorError> {
        let candidate = self.pending_key.trim().to_string();
        if candidate.is_empty() {
            return Err(EditorError::EmptyKey);
        }
        if self.credential_keys.iter().any(|k| k == &candidate) {
            return Ok(());
        }
        self.credential_keys.push(candidate);
        self.pending_key.clear();
        Ok(())
    }

    /// Removes by value; no-op if absent.
    pub fn remove_url(&mut self, value: &str) {
        self.source_urls.retain(|u| u != value);
    }

    /// Removes by value; no-op if absent.
    pub fn remove_key(&mut self, value: &str) {
        self.credential_keys.retain(|k| k != value);
    }

    /// Commits the buffer: create when no id is bound, detail-update
    /// otherwise. Repeated fields are submitted in buffer order. On failure
    /// the buffer (including staged values) is left intact for a retry.
    pub fn save(&mut self) -> Result<SaveOutcome, EditorError> {
        let title = self.title.trim().to_string();
        if title.is_empty() {
            return Err(EditorError::EmptyTitle);
        }

        // The display title doubles as the mask's list name.
        let submission = MaskSubmission {
            mask_name: title.clone(),
            title: Some(title),
            description: Some(self.description.trim().to_string()),
            site_urls: self.source_urls.clone(),
            api_keys: self.credential_keys.clone(),
        };

        match &self.mask_id {
            Some(id) => {
                self.gateway.update_detail(id, &submission)?;
                Ok(SaveOutcome::Updated)
            }
            None => {
                let owner = self
                    .session
                    .user_id()
                    .ok_or(EditorError::MissingOwner)?
                    .clone();
                let created = self.gateway.create_mask(&owner, &submission)?;
                self.mask_id = Some(created.id.clone());
                Ok(SaveOutcome::Created(created))
            }
        }
    }
}

#[cfg(test)]
#[path = "tests/editor_tests.rs"]
mod tests;
