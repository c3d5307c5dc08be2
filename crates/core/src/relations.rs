//! Value types held in entity list relationships.

use serde::{Deserialize, Serialize};

use crate::types::DbId;

/// An external link attached to a performer, studio or scene.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Url {
    pub url: String,
    pub site: String,
}

impl Url {
    pub fn new(url: impl Into<String>, site: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            site: site.into(),
        }
    }
}

/// A tattoo or piercing. Two modifications are the same only when both
/// location and description match.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BodyModification {
    pub location: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// A performer credited in a scene, optionally under a different name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PerformerAppearance {
    pub performer_id: DbId,
    #[serde(rename = "as", default, skip_serializing_if = "Option::is_none")]
    pub alias: Option<String>,
}

impl PerformerAppearance {
    pub fn new(performer_id: DbId, alias: Option<&str>) -> Self {
        Self {
            performer_id,
            alias: alias.map(str::to_string),
        }
    }
}
