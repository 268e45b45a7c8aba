//! Optimistic lifecycle of the mask collection.
//!
//! Every create/rename/delete applies to the local [`MaskStore`] first, then
//! confirms against the backend. The snapshot captured before the apply is
//! the affected row and its position; on failure it is restored verbatim, so
//! the store never stays inconsistent with the backend for longer than one
//! failed round-trip.

use std::collections::HashSet;
use std::sync::{Arc, Mutex};

use crate::gateway::{GatewayError, MaskGateway};
use crate::model::{MaskId, MaskRecord, MaskSubmission};
use crate::session::SessionContext;
use crate::store::MaskStore;

pub struct MaskRoster {
    gateway: Arc<dyn MaskGateway>,
    session: SessionContext,
    store: MaskStore,
    in_flight: Mutex<HashSet<MaskId>>,
}

#[derive(Debug, thiserror::Error)]
pub enum RosterError {
    #[error("mask name must not be empty")]
    EmptyName,

    #[error("a session user is required to create a mask")]
    MissingOwner,

    #[error("mask {0} is not in the local list")]
    Unknown(MaskId),

    /// Another mutation for the same identity is still in flight. Mutations
    /// on one id never interleave; distinct ids proceed independently.
    #[error("an operation for mask {0} is already in flight")]
    Busy(MaskId),

    #[error("could not mint a placeholder id: {0}")]
    PlaceholderId(String),

    #[error(transparent)]
    Gateway(#[from] GatewayError),
}

impl MaskRoster {
    pub fn new(gateway: Arc<dyn MaskGateway>, session: SessionContext) -> Self {
        Self {
            gateway,
            session,
            store: MaskStore::new(),
            in_flight: Mutex::new(HashSet::new()),
        }
    }

    pub fn store(&self) -> &MaskStore {
        &self.store
    }

    pub fn session(&self) -> &SessionContext {
        &self.session
    }

    /// Full refresh from the boundary; replaces the store wholesale.
    pub fn refresh(&self) -> Result<(), RosterError> {
        let rows = self.gateway.list_masks()?;
        self.store.replace_all(rows);
        Ok(())
    }

    /// Creates a mask. A locally minted placeholder row appears at the head
    /// immediately; on confirmation it is swapped for the server row (ids
    /// already re-stamped as exact strings by the model layer), on failure it
    /// is dropped. There is no prior state to restore for a create.
    pub fn create(&self, name: &str) -> Result<MaskRecord, RosterError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(RosterError::EmptyName);
        }
        let owner = self
            .session
            .user_id()
            .ok_or(RosterError::MissingOwner)?
            .clone();

        let placeholder = MaskRecord {
            id: MaskId(format!("local-{}", mint_local_id()?)),
            user_id: owner.clone(),
            mask_name: name.to_string(),
            api_key: None,
            title: None,
            description: None,
            site_url: Vec::new(),
            created_at: String::new(),
        };

        let _guard = self.begin(placeholder.id.clone())?;
        self.store.upsert_front(placeholder.clone());

        let submission = MaskSubmission {
            mask_name: name.to_string(),
            ..MaskSubmission::default()
        };
        match self.gateway.create_mask(&owner, &submission) {
            Ok(created) => {
                self.store.remove(&placeholder.id);
                self.store.upsert_front(created.clone());
                Ok(created)
            }
            Err(err) => {
                self.store.remove(&placeholder.id);
                log::debug!("create rolled back: {}", err);
                Err(err.into())
            }
        }
    }

    /// Renames a mask optimistically; restores the prior row on failure.
    pub fn rename(&self, id: &MaskId, new_name: &str) -> Result<(), RosterError> {
        let new_name = new_name.trim();
        if new_name.is_empty() {
            return Err(RosterError::EmptyName);
        }

        let _guard = self.begin(id.clone())?;
        let (_, prior) = self
            .store
            .snapshot(id)
            .ok_or_else(|| RosterError::Unknown(id.clone()))?;

        let mut renamed = prior.clone();
        renamed.mask_name = new_name.to_string();
        self.store.replace(id, renamed);

        if let Err(err) = self.gateway.rename_mask(id, new_name) {
            self.store.replace(id, prior);
            log::debug!("rename of {} rolled back: {}", id, err);
            return Err(err.into());
        }
        Ok(())
    }

    /// Deletes a mask optimistically; the row reappears at its prior position
    /// on failure. Callers are expected to have completed a destructive-action
    /// confirmation step before invoking this.
    pub fn delete(&self, id: &MaskId) -> Result<(), RosterError> {
        let _guard = self.begin(id.clone())?;
        let (index, prior) = self
            .store
            .snapshot(id)
            .ok_or_else(|| RosterError::Unknown(id.clone()))?;

        self.store.remove(id);

        if let Err(err) = self.gateway.delete_mask(id) {
            self.store.restore_at(index, prior);
            log::debug!("delete of {} rolled back: {}", id, err);
            return Err(err.into());
        }
        Ok(())
    }

    fn begin(&self, id: MaskId) -> Result<InFlightGuard<'_>, RosterError> {
        let mut set = self.in_flight.lock().unwrap_or_else(|e| e.into_inner());
        if !set.insert(id.clone()) {
            return Err(RosterError::Busy(id));
        }
        Ok(InFlightGuard { roster: self, id })
    }
}

struct InFlightGuard<'a> {
    roster: &'a MaskRoster,
    id: MaskId,
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        let mut set = self
            .roster
            .in_flight
            .lock()
            .unwrap_or_else(|e| e.into_inner());
        set.remove(&self.id);
    }
}

fn mint_local_id() -> Result<String, RosterError> {
    let mut bytes = [0u8; 8];
    getrandom::getrandom(&mut bytes)
        .map_err(|e| RosterError::PlaceholderId(format!("{:?}", e)))?;
    let mut out = String::with_capacity(16);
    for b in &bytes {
        out.push_str(&format!("{:02x}", b));
    }
    Ok(out)
}

#[cfg(test)]
#[path = "tests/roster_tests.rs"]
mod tests;
