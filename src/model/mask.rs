use serde::{Deserialize, Deserializer, Serialize};

use super::ids::{MaskId, UserId};

/// One mask row as the list endpoint delivers it.
///
/// Field names mirror the wire shape. `api_key` is the backend's stored
/// credential column and may be null; staged credential keys are write-only
/// and never come back through this record.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MaskRecord {
    pub id: MaskId,
    pub user_id: UserId,
    pub mask_name: String,

    #[serde(default)]
    pub api_key: Option<String>,

    #[serde(default)]
    pub title: Option<String>,

    #[serde(default)]
    pub description: Option<String>,

    #[serde(default, deserialize_with = "null_as_empty")]
    pub site_url: Vec<String>,

    #[serde(default)]
    pub created_at: String,
}

/// The extended record behind the detail endpoint.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MaskDetail {
    pub id: MaskId,
    pub user_id: UserId,

    #[serde(default)]
    pub title: Option<String>,

    #[serde(default)]
    pub description: Option<String>,

    #[serde(default, deserialize_with = "null_as_empty")]
    pub site_url: Vec<String>,

    #[serde(default)]
    pub created_at: String,
}

/// Outbound create/update payload. Serialized as repeated form fields with
/// `site_urls` and `api_keys` order preserved.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct MaskSubmission {
    pub mask_name: String,
    pub title: Option<String>,
    pub description: Option<String>,
    pub site_urls: Vec<String>,
    pub api_keys: Vec<String>,
}

/// Resolved session identity. The backend does not always echo the id back.
#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct UserProfile {
    #[serde(default)]
    pub id: Option<UserId>,
    pub username: String,
}

fn null_as_empty<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<String>, D::Error> {
    let value: Option<Vec<String>> = Option::deserialize(deserializer)?;
    Ok(value.unwrap_or_default())
}
