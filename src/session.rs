use crate::gateway::{GatewayError, MaskGateway};
use crate::model::{UserId, UserProfile};

/// Explicit session identity, passed into the engines at construction.
///
/// Replaces the original client's ambient storage: the acting user is a value
/// with session lifetime, and the profile is re-resolved through the gateway
/// on demand instead of being read from the environment.
#[derive(Clone, Debug, Default)]
pub struct SessionContext {
    user_id: Option<UserId>,
}

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("no user identity bound to this session")]
    Anonymous,

    #[error(transparent)]
    Gateway(#[from] GatewayError),
}

impl SessionContext {
    pub fn anonymous() -> Self {
        Self::default()
    }

    pub fn for_user(user_id: UserId) -> Self {
        Self {
            user_id: Some(user_id),
        }
    }

    pub fn user_id(&self) -> Option<&UserId> {
        self.user_id.as_ref()
    }

    /// Resolves the bound user's profile. When the backend echoes an id it
    /// wins over the locally held one (re-stamped as an exact string by the
    /// model layer).
    pub fn resolve_profile(
        &self,
        gateway: &dyn MaskGateway,
    ) -> Result<UserProfile, SessionError> {
        let user_id = self.user_id.as_ref().ok_or(SessionError::Anonymous)?;
        Ok(gateway.resolve_profile(user_id)?)
    }
}
