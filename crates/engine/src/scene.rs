//! Scene edits: submission diffing and application.

use catalog_core::edit::{Edit, Operation, TargetType};
use catalog_core::error::CoreError;
use catalog_core::scene::{Scene, SceneEdit, SceneEditData, SceneEditDetails, SceneRelations};
use catalog_core::store::CatalogTx;
use catalog_core::types::DbId;

use crate::error::EngineResult;
use crate::performer::locked_performer;
use crate::redirect::redirect_merged;
use crate::studio::locked_studio;
use crate::submission::{ensure_changes, required_target};
use crate::tag::locked_tag;

pub(crate) async fn live_scene<T: CatalogTx>(tx: &mut T, id: DbId) -> EngineResult<Scene> {
    require_live(tx.find_scene(id).await?, id)
}

/// Like `live_scene`, but the row stays locked until the transaction ends.
pub(crate) async fn locked_scene<T: CatalogTx>(tx: &mut T, id: DbId) -> EngineResult<Scene> {
    require_live(tx.lock_scene(id).await?, id)
}

fn require_live(scene: Option<Scene>, id: DbId) -> EngineResult<Scene> {
    let scene = scene.ok_or(CoreError::NotFound { entity: "Scene", id })?;
    if scene.deleted {
        return Err(CoreError::EntityDeleted { entity: "Scene", id }.into());
    }
    Ok(scene)
}

/// Newly referenced studios, tags and performers must be live. Their rows
/// stay locked so a concurrent destroy cannot orphan the references.
async fn check_references<T: CatalogTx>(tx: &mut T, new: &SceneEdit) -> EngineResult<()> {
    if let Some(studio_id) = new.studio_id {
        locked_studio(tx, studio_id).await?;
    }
    for tag_id in &new.added_tags {
        locked_tag(tx, *tag_id).await?;
    }
    for appearance in &new.added_performers {
        locked_performer(tx, appearance.performer_id).await?;
    }
    Ok(())
}

pub(crate) async fn prepare<T: CatalogTx>(
    tx: &mut T,
    operation: Operation,
    target_id: Option<DbId>,
    merge_sources: &[DbId],
    details: &SceneEditDetails,
) -> EngineResult<SceneEditData> {
    match operation {
        Operation::Create => {
            details.validate_create()?;
            let data = details.create_data();
            check_references(tx, &data.new).await?;
            Ok(data)
        }
        Operation::Modify => {
            details.validate()?;
            let id = required_target(target_id)?;
            let scene = live_scene(tx, id).await?;
            let relations = tx.scene_relations(id).await?;
            let data = details.diff(&scene, &relations);
            ensure_changes(data.has_changes())?;
            check_references(tx, &data.new).await?;
            Ok(data)
        }
        Operation::Merge => {
            details.validate()?;
            let id = required_target(target_id)?;
            let scene = live_scene(tx, id).await?;
            for source in merge_sources {
                live_scene(tx, *source).await?;
            }
            let relations = tx.scene_relations(id).await?;
            let mut data = details.diff(&scene, &relations);
            check_references(tx, &data.new).await?;
            data.merge_sources = merge_sources.to_vec();
            Ok(data)
        }
        Operation::Destroy => {
            live_scene(tx, required_target(target_id)?).await?;
            Ok(SceneEditData::default())
        }
    }
}

/// Apply a scene edit. Returns the id of the scene it acted on.
pub(crate) async fn apply<T: CatalogTx>(
    tx: &mut T,
    edit: &Edit,
    target_id: Option<DbId>,
) -> EngineResult<DbId> {
    let data: SceneEditData = edit.data_as()?;
    match edit.operation {
        Operation::Create => {
            check_references(tx, &data.new).await?;
            let mut scene = Scene::default();
            scene.apply_edit(&data);
            let created = tx.create_scene(&scene).await?;
            let mut relations = SceneRelations::default();
            relations.apply(&data.new);
            tx.save_scene_relations(created.id, &relations).await?;
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
                if *source == id {
                    return Err(CoreError::Validation(format!(
                        "Cannot merge scene {source} into itself"
                    ))
                    .into());
                }
                let scene = locked_scene(tx, *source).await?;
                soft_delete(tx, scene).await?;
                redirect_merged(tx, TargetType::Scene, *source, id).await?;
            }
            Ok(id)
        }
        Operation::Destroy => {
            let id = required_target(target_id)?;
            let scene = locked_scene(tx, id).await?;
            soft_delete(tx, scene).await?;
            Ok(id)
        }
    }
}

async fn modify<T: CatalogTx>(tx: &mut T, id: DbId, data: &SceneEditData) -> EngineResult<()> {
    let mut scene = locked_scene(tx, id).await?;
    scene.validate_modify(&data.old)?;
    check_references(tx, &data.new).await?;
    scene.apply_edit(data);
    tx.update_scene(&scene).await?;

    let mut relations = tx.scene_relations(id).await?;
    relations.apply(&data.new);
    tx.save_scene_relations(id, &relations).await?;
    Ok(())
}

/// Mark the scene deleted and drop its tags, appearances, urls and images.
async fn soft_delete<T: CatalogTx>(tx: &mut T, mut scene: Scene) -> EngineResult<()> {
    scene.deleted = true;
    tx.update_scene(&scene).await?;
    tx.save_scene_relations(scene.id, &SceneRelations::default())
        .await?;
    Ok(())
}
