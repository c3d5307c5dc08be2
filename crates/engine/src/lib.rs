//! Edit and consensus application engine.
//!
//! - [`EditService`]: submit, amend, vote on, comment on, cancel and close
//!   edits, plus read queries and redirect resolution.
//! - [`EditCloser`]: single-flight periodic closing of resolved edits.
//!
//! The engine is generic over a [`CatalogStore`](catalog_core::store::CatalogStore)
//! and an [`EditNotifier`](catalog_core::notify::EditNotifier).

mod apply;
mod performer;
mod scene;
mod studio;
mod tag;

pub mod closer;
pub mod error;
pub mod redirect;
pub mod service;
pub mod submission;

pub use closer::{CloserRun, EditCloser};
pub use error::{EngineError, EngineResult};
pub use service::{CloseSummary, EditPage, EditService};
pub use submission::{EditDetails, EditSubmission};
