//! Studio edits: submission diffing and application.

use catalog_core::edit::{Edit, Operation, TargetType};
use catalog_core::error::CoreError;
use catalog_core::store::CatalogTx;
use catalog_core::studio::{Studio, StudioEditData, StudioEditDetails, StudioRelations};
use catalog_core::types::DbId;

use crate::error::EngineResult;
use crate::redirect::redirect_merged;
use crate::submission::{ensure_changes, required_target};

pub(crate) async fn live_studio<T: CatalogTx>(tx: &mut T, id: DbId) -> EngineResult<Studio> {
    require_live(tx.find_studio(id).await?, id)
}

/// Like `live_studio`, but the row stays locked until the transaction ends.
pub(crate) async fn locked_studio<T: CatalogTx>(tx: &mut T, id: DbId) -> EngineResult<Studio> {
    require_live(tx.lock_studio(id).await?, id)
}

fn require_live(studio: Option<Studio>, id: DbId) -> EngineResult<Studio> {
    let studio = studio.ok_or(CoreError::NotFound { entity: "Studio", id })?;
    if studio.deleted {
        return Err(CoreError::EntityDeleted { entity: "Studio", id }.into());
    }
    Ok(studio)
}

/// A proposed parent must be a live studio other than the one edited.
async fn check_parent<T: CatalogTx>(
    tx: &mut T,
    target_id: Option<DbId>,
    details: &StudioEditDetails,
) -> EngineResult<()> {
    let Some(Some(parent_id)) = details.parent_id else {
        return Ok(());
    };
    if Some(parent_id) == target_id {
        return Err(CoreError::Validation("A studio cannot be its own parent".to_string()).into());
    }
    live_studio(tx, parent_id).await?;
    Ok(())
}

pub(crate) async fn prepare<T: CatalogTx>(
    tx: &mut T,
    operation: Operation,
    target_id: Option<DbId>,
    merge_sources: &[DbId],
    details: &StudioEditDetails,
) -> EngineResult<StudioEditData> {
    match operation {
        Operation::Create => {
            details.validate_create()?;
            check_parent(tx, None, details).await?;
            Ok(details.create_data())
        }
        Operation::Modify => {
            details.validate()?;
            let id = required_target(target_id)?;
            check_parent(tx, Some(id), details).await?;
            let studio = live_studio(tx, id).await?;
            let relations = tx.studio_relations(id).await?;
            let data = details.diff(&studio, &relations);
            ensure_changes(data.has_changes())?;
            Ok(data)
        }
        Operation::Merge => {
            details.validate()?;
            let id = required_target(target_id)?;
            check_parent(tx, Some(id), details).await?;
            let studio = live_studio(tx, id).await?;
            for source in merge_sources {
                live_studio(tx, *source).await?;
            }
            let relations = tx.studio_relations(id).await?;
            let mut data = details.diff(&studio, &relations);
            data.merge_sources = merge_sources.to_vec();
            Ok(data)
        }
        Operation::Destroy => {
            live_studio(tx, required_target(target_id)?).await?;
            Ok(StudioEditData::default())
        }
    }
}

/// Apply a studio edit. Returns the id of the studio it acted on.
pub(crate) async fn apply<T: CatalogTx>(
    tx: &mut T,
    edit: &Edit,
    target_id: Option<DbId>,
) -> EngineResult<DbId> {
    let data: StudioEditData = edit.data_as()?;
    match edit.operation {
        Operation::Create => {
            if let Some(parent_id) = data.new.parent_id {
                locked_studio(tx, parent_id).await?;
            }
            let mut studio = Studio::default();
            studio.apply_edit(&data);
            let created = tx.create_studio(&studio).await?;
            let mut relations = StudioRelations::default();
            relations.apply(&data.new);
            tx.save_studio_relations(created.id, &relations).await?;
            Ok(created.id)
        }
        Operation::Modify => {
            let id = required_target(target_id)?;
            modify(tx, id, &data).await?;
            Ok(id)
        }
        Operation::Merge => {
            let id = required_target(target_id)?;
            modify(tx, id, &data).await?;
            for source in &data.merge_sources {
                merge_into(tx, *source, id).await?;
            }
            Ok(id)
        }
        Operation::Destroy => {
            let id = required_target(target_id)?;
            let studio = locked_studio(tx, id).await?;
            soft_delete(tx, studio).await?;
            tx.detach_studio_references(id).await?;
            Ok(id)
        }
    }
}

async fn modify<T: CatalogTx>(tx: &mut T, id: DbId, data: &StudioEditData) -> EngineResult<()> {
    let mut studio = locked_studio(tx, id).await?;
    studio.validate_modify(&data.old)?;
    if let Some(parent_id) = data.new.parent_id {
        locked_studio(tx, parent_id).await?;
    }
    studio.apply_edit(data);
    tx.update_studio(&studio).await?;

    let mut relations = tx.studio_relations(id).await?;
    relations.apply(&data.new);
    tx.save_studio_relations(id, &relations).await?;
    Ok(())
}

async fn merge_into<T: CatalogTx>(tx: &mut T, source: DbId, target: DbId) -> EngineResult<()> {
    if source == target {
        return Err(CoreError::Validation(format!("Cannot merge studio {source} into itself")).into());
    }
    let studio = locked_studio(tx, source).await?;
    soft_delete(tx, studio).await?;
    redirect_merged(tx, TargetType::Studio, source, target).await?;
    tx.reassign_studio_references(source, target).await?;
    Ok(())
}

async fn soft_delete<T: CatalogTx>(tx: &mut T, mut studio: Studio) -> EngineResult<()> {
    studio.deleted = true;
    tx.update_studio(&studio).await?;
    tx.save_studio_relations(studio.id, &StudioRelations::default())
        .await?;
    Ok(())
}
