//! Zero-sized query structs, one per table family.
//!
//! Every function takes `&mut PgConnection` so it can run on a pooled
//! connection or inside a transaction (`&mut *tx`).

pub mod edit_repo;
pub mod lists;
pub mod notification_repo;
pub mod performer_repo;
pub mod redirect_repo;
pub mod scene_repo;
pub mod studio_repo;
pub mod tag_repo;

pub use edit_repo::{CommentRepo, EditRepo, VoteRepo};
pub use notification_repo::NotificationRepo;
pub use performer_repo::PerformerRepo;
pub use redirect_repo::RedirectRepo;
pub use scene_repo::SceneRepo;
pub use studio_repo::StudioRepo;
pub use tag_repo::TagRepo;

use catalog_core::edit::TargetType;

/// Per-kind join table linking an edit to the entity it targets.
pub(crate) fn edit_target_table(target_type: TargetType) -> (&'static str, &'static str) {
    match target_type {
        TargetType::Tag => ("tag_edits", "tag_id"),
        TargetType::Performer => ("performer_edits", "performer_id"),
        TargetType::Studio => ("studio_edits", "studio_id"),
        TargetType::Scene => ("scene_edits", "scene_id"),
    }
}

/// Per-kind redirect table.
pub(crate) fn redirect_table(target_type: TargetType) -> &'static str {
    match target_type {
        TargetType::Tag => "tag_redirects",
        TargetType::Performer => "performer_redirects",
        TargetType::Studio => "studio_redirects",
        TargetType::Scene => "scene_redirects",
    }
}
