use serde::{Deserialize, Serialize};

use crate::edit::TargetType;
use crate::types::DbId;

/// Longest redirect chain followed before resolution gives up.
pub const MAX_REDIRECT_DEPTH: usize = 32;

/// A merged-away entity id pointing at the id that absorbed it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Redirect {
    pub target_type: TargetType,
    pub source_id: DbId,
    pub target_id: DbId,
}
