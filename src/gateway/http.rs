use serde::Deserialize;

use super::{GatewayError, MaskGateway};
use crate::model::{JobArtifact, MaskDetail, MaskId, MaskRecord, MaskSubmission, UserId, UserProfile};

/// Blocking HTTP implementation of the boundary contract.
///
/// Bodies are form-encoded with repeated keys for list fields, which is what
/// the existing backend parses. Identifiers travel as their exact string
/// form in both path segments and form fields.
pub struct HttpGateway {
    base_url: String,
    client: reqwest::blocking::Client,
}

impl HttpGateway {
    pub fn new(base_url: &str) -> Result<Self, GatewayError> {
        let client = reqwest::blocking::Client::builder()
            .user_agent("maskdeck")
            .build()
            .map_err(|e| GatewayError::Transport(e.to_string()))?;
        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn ensure_ok(
        &self,
        resp: reqwest::blocking::Response,
    ) -> Result<reqwest::blocking::Response, GatewayError> {
        let status = resp.status();
        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(GatewayError::Missing);
        }
        if !status.is_success() {
            let body = resp.text().unwrap_or_default();
            return Err(GatewayError::Rejected {
                status: status.as_u16(),
                message: error_detail(&body),
            });
        }
        Ok(resp)
    }
}

impl MaskGateway for HttpGateway {
    fn list_masks(&self) -> Result<Vec<MaskRecord>, GatewayError> {
        let resp = self
            .client
            .get(self.url("/masks/"))
            .send()
            .map_err(transport)?;
        self.ensure_ok(resp)?
            .json()
            .map_err(|e| GatewayError::Transport(format!("parse mask list: {}", e)))
    }

    fn create_mask(
        &self,
        owner: &UserId,
        submission: &MaskSubmission,
    ) -> Result<MaskRecord, GatewayError> {
        let fields = submission_fields(submission, Some(owner));
        let resp = self
            .client
            .post(self.url("/masks/add/"))
            .form(&fields)
            .send()
            .map_err(transport)?;
        self.ensure_ok(resp)?
            .json()
            .map_err(|e| GatewayError::Transport(format!("parse created mask: {}", e)))
    }

    fn rename_mask(&self, id: &MaskId, mask_name: &str) -> Result<(), GatewayError> {
        let resp = self
            .client
            .put(self.url(&format!("/masks/update/{}", id)))
            .form(&[("mask_name", mask_name)])
            .send()
            .map_err(transport)?;
        self.ensure_ok(resp)?;
        Ok(())
    }

    fn delete_mask(&self, id: &MaskId) -> Result<(), GatewayError> {
        let resp = self
            .client
            .delete(self.url(&format!("/masks/delete/{}", id)))
            .send()
            .map_err(transport)?;
        self.ensure_ok(resp)?;
        Ok(())
    }

    fn load_detail(&self, id: &MaskId) -> Result<MaskDetail, GatewayError> {
        let resp = self
            .client
            .get(self.url(&format!("/describing/{}", id)))
            .send()
            .map_err(transport)?;
        self.ensure_ok(resp)?
            .json()
            .map_err(|e| GatewayError::Transport(format!("parse mask detail: {}", e)))
    }

    fn update_detail(
        &self,
        id: &MaskId,
        submission: &MaskSubmission,
    ) -> Result<(), GatewayError> {
        let fields = submission_fields(submission, None);
        let resp = self
            .client
            .put(self.url(&format!("/describing/update/{}", id)))
            .form(&fields)
            .send()
            .map_err(transport)?;
        self.ensure_ok(resp)?;
        Ok(())
    }

    fn poll_job(&self, id: &MaskId) -> Result<JobArtifact, GatewayError> {
        let resp = self
            .client
            .get(self.url(&format!("/jobs/by-mask/{}", id)))
            .send()
            .map_err(transport)?;

        // The job not existing yet is a normal outcome, not a failure.
        if resp.status() == reqwest::StatusCode::NOT_FOUND {
            return Ok(JobArtifact::Processing);
        }

        #[derive(Deserialize)]
        struct Body {
            #[serde(default)]
            html_code: Option<String>,
        }

        let body: Body = self
            .ensure_ok(resp)?
            .json()
            .map_err(|e| GatewayError::Transport(format!("parse job artifact: {}", e)))?;

        match body.html_code {
            Some(html) if !html.is_empty() => Ok(JobArtifact::Ready { html }),
            _ => Ok(JobArtifact::Failed),
        }
    }

    fn resolve_profile(&self, user_id: &UserId) -> Result<UserProfile, GatewayError> {
        let resp = self
            .client
            .get(self.url("/users/profile/"))
            .query(&[("user_id", user_id.as_str())])
            .send()
            .map_err(transport)?;
        self.ensure_ok(resp)?
            .json()
            .map_err(|e| GatewayError::Transport(format!("parse profile: {}", e)))
    }
}

fn transport(err: reqwest::Error) -> GatewayError {
    GatewayError::Transport(err.to_string())
}

// Flattens the submission into form pairs. Scalars first, then the repeated
// list fields in buffer order, which the backend reassembles positionally.
fn submission_fields(
    submission: &MaskSubmission,
    owner: Option<&UserId>,
) -> Vec<(&'static str, String)> {
    let mut fields = vec![("mask_name", submission.mask_name.clone())];
    if let Some(owner) = owner {
        fields.push(("user_id", owner.as_str().to_string()));
    }
    if let Some(title) = &submission.title {
        fields.push(("title", title.clone()));
    }
    if let Some(description) = &submission.description {
        fields.push(("description", description.clone()));
    }
    for url in &submission.site_urls {
        fields.push(("site_url", url.clone()));
    }
    for key in &submission.api_keys {
        fields.push(("api_keys", key.clone()));
    }
    fields
}

// The backend wraps error text as {"detail": "..."}; fall back to the raw
// body when it isn't JSON.
fn error_detail(body: &str) -> String {
    if let Ok(v) = serde_json::from_str::<serde_json::Value>(body)
        && let Some(detail) = v.get("detail").and_then(|d| d.as_str())
    {
        return detail.to_string();
    }
    body.trim().to_string()
}

#[cfg(test)]
#[path = "../tests/gateway/http_tests.rs"]
mod tests;
