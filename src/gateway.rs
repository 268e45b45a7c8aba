//! The one component allowed to talk to the backend.
//!
//! Everything else depends on the [`MaskGateway`] trait, so engines can be
//! exercised against scripted in-process doubles while the production path
//! goes through [`HttpGateway`].

use crate::model::{JobArtifact, MaskDetail, MaskId, MaskRecord, MaskSubmission, UserId, UserProfile};

mod http;
pub use self::http::HttpGateway;

#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    /// The backend reported the resource does not exist. Distinct from a
    /// transport failure: the resource is known to be gone.
    #[error("not found")]
    Missing,

    /// The backend answered with a non-success status.
    #[error("server rejected request ({status}): {message}")]
    Rejected { status: u16, message: String },

    /// The request never completed; remote state is unknown.
    #[error("transport failure: {0}")]
    Transport(String),
}

pub trait MaskGateway: Send + Sync {
    fn list_masks(&self) -> Result<Vec<MaskRecord>, GatewayError>;

    fn create_mask(
        &self,
        owner: &UserId,
        submission: &MaskSubmission,
    ) -> Result<MaskRecord, GatewayError>;

    fn rename_mask(&self, id: &MaskId, mask_name: &str) -> Result<(), GatewayError>;

    fn delete_mask(&self, id: &MaskId) -> Result<(), GatewayError>;

    fn load_detail(&self, id: &MaskId) -> Result<MaskDetail, GatewayError>;

    fn update_detail(&self, id: &MaskId, submission: &MaskSubmission)
    -> Result<(), GatewayError>;

    /// Polls the latest rendering artifact. A boundary 404 is mapped to
    /// [`JobArtifact::Processing`], not an error.
    fn poll_job(&self, id: &MaskId) -> Result<JobArtifact, GatewayError>;

    fn resolve_profile(&self, user_id: &UserId) -> Result<UserProfile, GatewayError>;
}
