mod ids;
mod job;
mod mask;

pub use self::ids::{MaskId, UserId};
pub use self::job::JobArtifact;
pub use self::mask::{MaskDetail, MaskRecord, MaskSubmission, UserProfile};
