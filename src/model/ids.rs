use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};

/// Backend-assigned mask identifier.
///
/// Always held as the exact string form. The boundary may deliver the value
/// as a JSON number (64-bit database ids); deserialization converts it to its
/// exact decimal string, never the reverse, so large ids survive untouched.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize)]
pub struct MaskId(pub String);

impl MaskId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for MaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for MaskId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Ok(MaskId(exact_string(deserializer)?))
    }
}

/// Owning-user identifier. Same exact-string rule as [`MaskId`].
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize)]
pub struct UserId(pub String);

impl UserId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for UserId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Ok(UserId(exact_string(deserializer)?))
    }
}

// Accepts a string or an integer; floats are refused rather than rounded.
fn exact_string<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Text(String),
        Unsigned(u64),
        Signed(i64),
    }

    Ok(match Raw::deserialize(deserializer)? {
        Raw::Text(s) => s,
        Raw::Unsigned(n) => n.to_string(),
        Raw::Signed(n) => n.to_string(),
    })
}

#[cfg(test)]
#[path = "../tests/model/ids_tests.rs"]
mod tests;
