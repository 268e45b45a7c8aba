/// Outcome of one job-artifact poll.
///
/// The artifact is backend-owned: the client never creates one, it only
/// observes the latest completed render. Each poll replaces the previous
/// snapshot wholesale.
#[derive(Clone, Debug, PartialEq)]
pub enum JobArtifact {
    /// No completed job yet (boundary 404). Not an error.
    Processing,
    /// A completed render with its markup.
    Ready { html: String },
    /// A completed job that carried no usable markup.
    Failed,
}

impl JobArtifact {
    pub fn html(&self) -> Option<&str> {
        match self {
            JobArtifact::Ready { html } => Some(html),
            _ => None,
        }
    }
}
