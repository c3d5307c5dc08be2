//! Tag edits: submission diffing and application.

use catalog_core::edit::{Edit, Operation, TargetType};
use catalog_core::error::CoreError;
use catalog_core::store::CatalogTx;
use catalog_core::tag::{Tag, TagEditData, TagEditDetails, TagRelations};
use catalog_core::types::DbId;

use crate::error::EngineResult;
use crate::redirect::redirect_merged;
use crate::submission::{ensure_changes, required_target};

pub(crate) async fn live_tag<T: CatalogTx>(tx: &mut T, id: DbId) -> EngineResult<Tag> {
    require_live(tx.find_tag(id).await?, id)
}

/// Like `live_tag`, but the row stays locked until the transaction ends.
pub(crate) async fn locked_tag<T: CatalogTx>(tx: &mut T, id: DbId) -> EngineResult<Tag> {
    require_live(tx.lock_tag(id).await?, id)
}

fn require_live(tag: Option<Tag>, id: DbId) -> EngineResult<Tag> {
    let tag = tag.ok_or(CoreError::NotFound { entity: "Tag", id })?;
    if tag.deleted {
        return Err(CoreError::EntityDeleted { entity: "Tag", id }.into());
    }
    Ok(tag)
}

pub(crate) async fn prepare<T: CatalogTx>(
    tx: &mut T,
    operation: Operation,
    target_id: Option<DbId>,
    merge_sources: &[DbId],
    details: &TagEditDetails,
) -> EngineResult<TagEditData> {
    match operation {
        Operation::Create => {
            details.validate_create()?;
            Ok(details.create_data())
        }
        Operation::Modify => {
            details.validate()?;
            let id = required_target(target_id)?;
            let tag = live_tag(tx, id).await?;
            let relations = tx.tag_relations(id).await?;
            let data = details.diff(&tag, &relations);
            ensure_changes(data.has_changes())?;
            Ok(data)
        }
        Operation::Merge => {
            details.validate()?;
            let id = required_target(target_id)?;
            let tag = live_tag(tx, id).await?;
            for source in merge_sources {
                live_tag(tx, *source).await?;
            }
            let relations = tx.tag_relations(id).await?;
            let mut data = details.diff(&tag, &relations);
            data.merge_sources = merge_sources.to_vec();
            Ok(data)
        }
        Operation::Destroy => {
            live_tag(tx, required_target(target_id)?).await?;
            Ok(TagEditData::default())
        }
    }
}

/// Apply a tag edit. Returns the id of the tag it acted on.
pub(crate) async fn apply<T: CatalogTx>(
    tx: &mut T,
    edit: &Edit,
    target_id: Option<DbId>,
) -> EngineResult<DbId> {
    let data: TagEditData = edit.data_as()?;
    match edit.operation {
        Operation::Create => {
            let mut tag = Tag::default();
            tag.apply_edit(&data);
            let created = tx.create_tag(&tag).await?;
            let mut relations = TagRelations::default();
            relations.apply(&data.new);
            tx.save_tag_relations(created.id, &relations).await?;
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
            let tag = locked_tag(tx, id).await?;
            soft_delete(tx, tag).await?;
            tx.delete_scene_tags(id).await?;
            Ok(id)
        }
    }
}

async fn modify<T: CatalogTx>(tx: &mut T, id: DbId, data: &TagEditData) -> EngineResult<()> {
    let mut tag = locked_tag(tx, id).await?;
    tag.validate_modify(&data.old)?;
    tag.apply_edit(data);
    tx.update_tag(&tag).await?;

    let mut relations = tx.tag_relations(id).await?;
    relations.apply(&data.new);
    tx.save_tag_relations(id, &relations).await?;
    Ok(())
}

async fn merge_into<T: CatalogTx>(tx: &mut T, source: DbId, target: DbId) -> EngineResult<()> {
    if source == target {
        return Err(CoreError::Validation(format!("Cannot merge tag {source} into itself")).into());
    }
    let tag = locked_tag(tx, source).await?;
    soft_delete(tx, tag).await?;
    redirect_merged(tx, TargetType::Tag, source, target).await?;
    tx.reassign_scene_tags(source, target).await?;
    Ok(())
}

async fn soft_delete<T: CatalogTx>(tx: &mut T, mut tag: Tag) -> EngineResult<()> {
    tag.deleted = true;
    tx.update_tag(&tag).await?;
    tx.save_tag_relations(tag.id, &TagRelations::default()).await?;
    Ok(())
}
