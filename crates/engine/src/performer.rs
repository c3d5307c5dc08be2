//! Performer edits: submission diffing and application.
//!
//! Besides the shared Create/Modify/Merge/Destroy flow, performers carry
//! credit aliases: when a rename or merge asks for it, scene appearances
//! keep the performer's previous name as their "as" credit.

use catalog_core::edit::{Edit, Operation, TargetType};
use catalog_core::error::CoreError;
use catalog_core::performer::{Performer, PerformerEditData, PerformerEditDetails, PerformerRelations};
use catalog_core::store::CatalogTx;
use catalog_core::types::DbId;

use crate::error::EngineResult;
use crate::redirect::redirect_merged;
use crate::submission::{ensure_changes, required_target};

pub(crate) async fn live_performer<T: CatalogTx>(tx: &mut T, id: DbId) -> EngineResult<Performer> {
    require_live(tx.find_performer(id).await?, id)
}

/// Like `live_performer`, but the row stays locked until the transaction ends.
pub(crate) async fn locked_performer<T: CatalogTx>(tx: &mut T, id: DbId) -> EngineResult<Performer> {
    require_live(tx.lock_performer(id).await?, id)
}

fn require_live(performer: Option<Performer>, id: DbId) -> EngineResult<Performer> {
    let performer = performer.ok_or(CoreError::NotFound { entity: "Performer", id })?;
    if performer.deleted {
        return Err(CoreError::EntityDeleted { entity: "Performer", id }.into());
    }
    Ok(performer)
}

pub(crate) async fn prepare<T: CatalogTx>(
    tx: &mut T,
    operation: Operation,
    target_id: Option<DbId>,
    merge_sources: &[DbId],
    details: &PerformerEditDetails,
) -> EngineResult<PerformerEditData> {
    match operation {
        Operation::Create => {
            details.validate_create()?;
            Ok(details.create_data())
        }
        Operation::Modify => {
            details.validate()?;
            let id = required_target(target_id)?;
            let performer = live_performer(tx, id).await?;
            let relations = tx.performer_relations(id).await?;
            let data = details.diff(&performer, &relations);
            ensure_changes(data.has_changes())?;
            Ok(data)
        }
        Operation::Merge => {
            details.validate()?;
            let id = required_target(target_id)?;
            let performer = live_performer(tx, id).await?;
            for source in merge_sources {
                live_performer(tx, *source).await?;
            }
            let relations = tx.performer_relations(id).await?;
            let mut data = details.diff(&performer, &relations);
            data.merge_sources = merge_sources.to_vec();
            Ok(data)
        }
        Operation::Destroy => {
            live_performer(tx, required_target(target_id)?).await?;
            Ok(PerformerEditData::default())
        }
    }
}

/// Apply a performer edit. Returns the id of the performer it acted on.
pub(crate) async fn apply<T: CatalogTx>(
    tx: &mut T,
    edit: &Edit,
    target_id: Option<DbId>,
) -> EngineResult<DbId> {
    let data: PerformerEditData = edit.data_as()?;
    match edit.operation {
        Operation::Create => {
            let mut performer = Performer::default();
            performer.apply_edit(&data);
            let created = tx.create_performer(&performer).await?;
            let mut relations = PerformerRelations::default();
            relations.apply(&data.new);
            tx.save_performer_relations(created.id, &relations).await?;
            Ok(created.id)
        }
        Operation::Modify => {
            let id = required_target(target_id)?;
            modify(tx, id, &data).await?;
            Ok(id)
        }
        Operation::Merge => {
            let id = required_target(target_id)?;
            let target = modify(tx, id, &data).await?;
            for source in &data.merge_sources {
                merge_into(tx, *source, &target, data.set_merge_aliases).await?;
            }
            Ok(id)
        }
        Operation::Destroy => {
            let id = required_target(target_id)?;
            let performer = locked_performer(tx, id).await?;
            soft_delete(tx, performer).await?;
            tx.delete_scene_performers(id).await?;
            Ok(id)
        }
    }
}

async fn modify<T: CatalogTx>(
    tx: &mut T,
    id: DbId,
    data: &PerformerEditData,
) -> EngineResult<Performer> {
    let mut performer = locked_performer(tx, id).await?;
    performer.validate_modify(&data.old)?;
    performer.apply_edit(data);
    let performer = tx.update_performer(&performer).await?;

    let mut relations = tx.performer_relations(id).await?;
    relations.apply(&data.new);
    tx.save_performer_relations(id, &relations).await?;

    if data.set_modify_aliases {
        if let (Some(old_name), Some(new_name)) = (&data.old.name, &data.new.name) {
            tx.set_scene_performer_alias(id, old_name).await?;
            tx.clear_scene_performer_alias(id, new_name).await?;
        }
    }
    Ok(performer)
}

async fn merge_into<T: CatalogTx>(
    tx: &mut T,
    source: DbId,
    target: &Performer,
    keep_credits: bool,
) -> EngineResult<()> {
    if source == target.id {
        return Err(CoreError::Validation(format!(
            "Cannot merge performer {source} into itself"
        ))
        .into());
    }
    let performer = locked_performer(tx, source).await?;
    let source_name = performer.name.clone();
    soft_delete(tx, performer).await?;
    redirect_merged(tx, TargetType::Performer, source, target.id).await?;

    if keep_credits {
        tx.reassign_scene_performers(source, target.id, Some(&source_name))
            .await?;
        tx.clear_scene_performer_alias(target.id, &target.name).await?;
    } else {
        tx.reassign_scene_performers(source, target.id, None).await?;
    }
    // Appearances left on the source were duplicates of the target's.
    tx.delete_scene_performers(source).await?;
    Ok(())
}

async fn soft_delete<T: CatalogTx>(tx: &mut T, mut performer: Performer) -> EngineResult<()> {
    performer.deleted = true;
    tx.update_performer(&performer).await?;
    tx.save_performer_relations(performer.id, &PerformerRelations::default())
        .await?;
    Ok(())
}
