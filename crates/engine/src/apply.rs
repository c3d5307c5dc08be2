//! Dispatch of an edit's changes to its entity kind.

use catalog_core::edit::{Edit, TargetType};
use catalog_core::error::CoreError;
use catalog_core::store::CatalogTx;
use catalog_core::types::DbId;

use crate::error::EngineResult;
use crate::{performer, scene, studio, tag};

/// Write the edit's changes into the catalog inside `tx`.
///
/// Returns the id of the entity acted on. A Create records the new entity
/// as the edit's target.
pub(crate) async fn apply_changes<T: CatalogTx>(tx: &mut T, edit: &Edit) -> EngineResult<DbId> {
    let target_id = if edit.operation.requires_target() {
        let id = tx
            .find_edit_target(edit.id, edit.target_type)
            .await?
            .ok_or_else(|| {
                CoreError::Internal(format!("Edit {} has no {} target", edit.id, edit.target_type))
            })?;
        Some(id)
    } else {
        None
    };

    let entity_id = match edit.target_type {
        TargetType::Tag => tag::apply(tx, edit, target_id).await?,
        TargetType::Performer => performer::apply(tx, edit, target_id).await?,
        TargetType::Studio => studio::apply(tx, edit, target_id).await?,
        TargetType::Scene => scene::apply(tx, edit, target_id).await?,
    };

    if target_id.is_none() {
        tx.create_edit_target(edit.id, edit.target_type, entity_id)
            .await?;
    }
    Ok(entity_id)
}
