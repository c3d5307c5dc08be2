//! PostgreSQL implementation of the `catalog_core::store` traits.
//!
//! A [`PgTx`] wraps one `sqlx::Transaction`. Dropping it without calling
//! `commit` rolls every write back.

use async_trait::async_trait;
use catalog_core::edit::{Edit, EditComment, EditVote, NewEdit, TargetType, VoteType};
use catalog_core::notification::{NewNotification, Notification};
use catalog_core::performer::{Performer, PerformerRelations};
use catalog_core::query::EditFilter;
use catalog_core::redirect::Redirect;
use catalog_core::scene::{Scene, SceneRelations};
use catalog_core::store::{
    CatalogStore, CatalogTx, EditRepository, NotificationRepository, PerformerRepository,
    RedirectRepository, SceneRepository, StoreError, StoreResult, StudioRepository, TagRepository,
};
use catalog_core::studio::{Studio, StudioRelations};
use catalog_core::tag::{Tag, TagRelations};
use catalog_core::types::{DbId, Page, Timestamp};
use sqlx::{Postgres, Transaction};

use crate::repositories::{
    CommentRepo, EditRepo, NotificationRepo, PerformerRepo, RedirectRepo, SceneRepo, StudioRepo,
    TagRepo, VoteRepo,
};
use crate::DbPool;

fn db_err(e: sqlx::Error) -> StoreError {
    StoreError::Database(e.to_string())
}

fn found<T>(row: Option<T>, entity: &'static str, id: DbId) -> StoreResult<T> {
    row.ok_or(StoreError::RowNotFound { entity, id })
}

#[derive(Debug, Clone)]
pub struct PgStore {
    pool: DbPool,
}

impl PgStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &DbPool {
        &self.pool
    }
}

#[async_trait]
impl CatalogStore for PgStore {
    type Tx = PgTx;

    async fn begin(&self) -> StoreResult<PgTx> {
        let tx = self.pool.begin().await.map_err(db_err)?;
        Ok(PgTx { tx })
    }
}

pub struct PgTx {
    tx: Transaction<'static, Postgres>,
}

#[async_trait]
impl CatalogTx for PgTx {
    async fn commit(self) -> StoreResult<()> {
        self.tx.commit().await.map_err(db_err)
    }

    async fn rollback(self) -> StoreResult<()> {
        self.tx.rollback().await.map_err(db_err)
    }
}

// ---------------------------------------------------------------------------
// Edits
// ---------------------------------------------------------------------------

#[async_trait]
impl EditRepository for PgTx {
    async fn create_edit(&mut self, edit: &NewEdit) -> StoreResult<Edit> {
        EditRepo::create(&mut self.tx, edit).await.map_err(db_err)?.try_into()
    }

    async fn find_edit(&mut self, id: DbId) -> StoreResult<Option<Edit>> {
        EditRepo::find_by_id(&mut self.tx, id)
            .await
            .map_err(db_err)?
            .map(Edit::try_from)
            .transpose()
    }

    async fn lock_edit(&mut self, id: DbId) -> StoreResult<Option<Edit>> {
        EditRepo::find_by_id_for_update(&mut self.tx, id)
            .await
            .map_err(db_err)?
            .map(Edit::try_from)
            .transpose()
    }

    async fn update_edit(&mut self, edit: &Edit) -> StoreResult<Edit> {
        let row = EditRepo::update(&mut self.tx, edit).await.map_err(db_err)?;
        found(row, "Edit", edit.id)?.try_into()
    }

    async fn create_edit_target(
        &mut self,
        edit_id: DbId,
        target_type: TargetType,
        target_id: DbId,
    ) -> StoreResult<()> {
        EditRepo::create_target(&mut self.tx, edit_id, target_type, target_id)
            .await
            .map_err(db_err)
    }

    async fn find_edit_target(
        &mut self,
        edit_id: DbId,
        target_type: TargetType,
    ) -> StoreResult<Option<DbId>> {
        EditRepo::find_target(&mut self.tx, edit_id, target_type)
            .await
            .map_err(db_err)
    }

    async fn query_edits(&mut self, filter: &EditFilter) -> StoreResult<Vec<Edit>> {
        EditRepo::query(&mut self.tx, filter)
            .await
            .map_err(db_err)?
            .into_iter()
            .map(Edit::try_from)
            .collect()
    }

    async fn count_edits(&mut self, filter: &EditFilter) -> StoreResult<i64> {
        EditRepo::count(&mut self.tx, filter).await.map_err(db_err)
    }

    async fn list_closing_candidates(&mut self, created_before: Timestamp) -> StoreResult<Vec<Edit>> {
        EditRepo::list_closing_candidates(&mut self.tx, created_before)
            .await
            .map_err(db_err)?
            .into_iter()
            .map(Edit::try_from)
            .collect()
    }

    async fn upsert_vote(
        &mut self,
        edit_id: DbId,
        user_id: DbId,
        vote: VoteType,
    ) -> StoreResult<EditVote> {
        VoteRepo::upsert(&mut self.tx, edit_id, user_id, vote)
            .await
            .map_err(db_err)?
            .try_into()
    }

    async fn list_votes(&mut self, edit_id: DbId) -> StoreResult<Vec<EditVote>> {
        VoteRepo::list_for_edit(&mut self.tx, edit_id)
            .await
            .map_err(db_err)?
            .into_iter()
            .map(EditVote::try_from)
            .collect()
    }

    async fn delete_votes(&mut self, edit_id: DbId) -> StoreResult<u64> {
        VoteRepo::delete_for_edit(&mut self.tx, edit_id).await.map_err(db_err)
    }

    async fn create_comment(
        &mut self,
        edit_id: DbId,
        user_id: Option<DbId>,
        text: &str,
    ) -> StoreResult<EditComment> {
        let row = CommentRepo::create(&mut self.tx, edit_id, user_id, text)
            .await
            .map_err(db_err)?;
        Ok(row.into())
    }

    async fn list_comments(&mut self, edit_id: DbId) -> StoreResult<Vec<EditComment>> {
        let rows = CommentRepo::list_for_edit(&mut self.tx, edit_id)
            .await
            .map_err(db_err)?;
        Ok(rows.into_iter().map(EditComment::from).collect())
    }
}

// ---------------------------------------------------------------------------
// Entities
// ---------------------------------------------------------------------------

#[async_trait]
impl TagRepository for PgTx {
    async fn find_tag(&mut self, id: DbId) -> StoreResult<Option<Tag>> {
        let row = TagRepo::find_by_id(&mut self.tx, id).await.map_err(db_err)?;
        Ok(row.map(Tag::from))
    }

    async fn lock_tag(&mut self, id: DbId) -> StoreResult<Option<Tag>> {
        let row = TagRepo::find_by_id_for_update(&mut self.tx, id).await.map_err(db_err)?;
        Ok(row.map(Tag::from))
    }

    async fn create_tag(&mut self, tag: &Tag) -> StoreResult<Tag> {
        Ok(TagRepo::create(&mut self.tx, tag).await.map_err(db_err)?.into())
    }

    async fn update_tag(&mut self, tag: &Tag) -> StoreResult<Tag> {
        let row = TagRepo::update(&mut self.tx, tag).await.map_err(db_err)?;
        Ok(found(row, "Tag", tag.id)?.into())
    }

    async fn tag_relations(&mut self, id: DbId) -> StoreResult<TagRelations> {
        TagRepo::relations(&mut self.tx, id).await.map_err(db_err)
    }

    async fn save_tag_relations(&mut self, id: DbId, relations: &TagRelations) -> StoreResult<()> {
        TagRepo::save_relations(&mut self.tx, id, relations)
            .await
            .map_err(db_err)
    }

    async fn reassign_scene_tags(&mut self, source: DbId, target: DbId) -> StoreResult<u64> {
        TagRepo::reassign_scene_tags(&mut self.tx, source, target)
            .await
            .map_err(db_err)
    }

    async fn delete_scene_tags(&mut self, tag_id: DbId) -> StoreResult<u64> {
        TagRepo::delete_scene_tags(&mut self.tx, tag_id).await.map_err(db_err)
    }
}

#[async_trait]
impl PerformerRepository for PgTx {
    async fn find_performer(&mut self, id: DbId) -> StoreResult<Option<Performer>> {
        PerformerRepo::find_by_id(&mut self.tx, id)
            .await
            .map_err(db_err)?
            .map(Performer::try_from)
            .transpose()
    }

    async fn lock_performer(&mut self, id: DbId) -> StoreResult<Option<Performer>> {
        PerformerRepo::find_by_id_for_update(&mut self.tx, id)
            .await
            .map_err(db_err)?
            .map(Performer::try_from)
            .transpose()
    }

    async fn create_performer(&mut self, performer: &Performer) -> StoreResult<Performer> {
        PerformerRepo::create(&mut self.tx, performer)
            .await
            .map_err(db_err)?
            .try_into()
    }

    async fn update_performer(&mut self, performer: &Performer) -> StoreResult<Performer> {
        let row = PerformerRepo::update(&mut self.tx, performer)
            .await
            .map_err(db_err)?;
        found(row, "Performer", performer.id)?.try_into()
    }

    async fn performer_relations(&mut self, id: DbId) -> StoreResult<PerformerRelations> {
        PerformerRepo::relations(&mut self.tx, id).await.map_err(db_err)
    }

    async fn save_performer_relations(
        &mut self,
        id: DbId,
        relations: &PerformerRelations,
    ) -> StoreResult<()> {
        PerformerRepo::save_relations(&mut self.tx, id, relations)
            .await
            .map_err(db_err)
    }

    async fn reassign_scene_performers(
        &mut self,
        source: DbId,
        target: DbId,
        alias: Option<&str>,
    ) -> StoreResult<u64> {
        PerformerRepo::reassign_scene_performers(&mut self.tx, source, target, alias)
            .await
            .map_err(db_err)
    }

    async fn set_scene_performer_alias(&mut self, performer_id: DbId, alias: &str) -> StoreResult<u64> {
        PerformerRepo::set_scene_alias(&mut self.tx, performer_id, alias)
            .await
            .map_err(db_err)
    }

    async fn clear_scene_performer_alias(
        &mut self,
        performer_id: DbId,
        alias: &str,
    ) -> StoreResult<u64> {
        PerformerRepo::clear_scene_alias(&mut self.tx, performer_id, alias)
            .await
            .map_err(db_err)
    }

    async fn delete_scene_performers(&mut self, performer_id: DbId) -> StoreResult<u64> {
        PerformerRepo::delete_scene_performers(&mut self.tx, performer_id)
            .await
            .map_err(db_err)
    }
}

#[async_trait]
impl StudioRepository for PgTx {
    async fn find_studio(&mut self, id: DbId) -> StoreResult<Option<Studio>> {
        let row = StudioRepo::find_by_id(&mut self.tx, id).await.map_err(db_err)?;
        Ok(row.map(Studio::from))
    }

    async fn lock_studio(&mut self, id: DbId) -> StoreResult<Option<Studio>> {
        let row = StudioRepo::find_by_id_for_update(&mut self.tx, id).await.map_err(db_err)?;
        Ok(row.map(Studio::from))
    }

    async fn create_studio(&mut self, studio: &Studio) -> StoreResult<Studio> {
        Ok(StudioRepo::create(&mut self.tx, studio).await.map_err(db_err)?.into())
    }

    async fn update_studio(&mut self, studio: &Studio) -> StoreResult<Studio> {
        let row = StudioRepo::update(&mut self.tx, studio).await.map_err(db_err)?;
        Ok(found(row, "Studio", studio.id)?.into())
    }

    async fn studio_relations(&mut self, id: DbId) -> StoreResult<StudioRelations> {
        StudioRepo::relations(&mut self.tx, id).await.map_err(db_err)
    }

    async fn save_studio_relations(&mut self, id: DbId, relations: &StudioRelations) -> StoreResult<()> {
        StudioRepo::save_relations(&mut self.tx, id, relations)
            .await
            .map_err(db_err)
    }

    async fn reassign_studio_references(&mut self, source: DbId, target: DbId) -> StoreResult<u64> {
        StudioRepo::reassign_references(&mut self.tx, source, target)
            .await
            .map_err(db_err)
    }

    async fn detach_studio_references(&mut self, studio_id: DbId) -> StoreResult<u64> {
        StudioRepo::detach_references(&mut self.tx, studio_id)
            .await
            .map_err(db_err)
    }
}

#[async_trait]
impl SceneRepository for PgTx {
    async fn find_scene(&mut self, id: DbId) -> StoreResult<Option<Scene>> {
        SceneRepo::find_by_id(&mut self.tx, id)
            .await
            .map_err(db_err)?
            .map(Scene::try_from)
            .transpose()
    }

    async fn lock_scene(&mut self, id: DbId) -> StoreResult<Option<Scene>> {
        SceneRepo::find_by_id_for_update(&mut self.tx, id)
            .await
            .map_err(db_err)?
            .map(Scene::try_from)
            .transpose()
    }

    async fn create_scene(&mut self, scene: &Scene) -> StoreResult<Scene> {
        SceneRepo::create(&mut self.tx, scene).await.map_err(db_err)?.try_into()
    }

    async fn update_scene(&mut self, scene: &Scene) -> StoreResult<Scene> {
        let row = SceneRepo::update(&mut self.tx, scene).await.map_err(db_err)?;
        found(row, "Scene", scene.id)?.try_into()
    }

    async fn scene_relations(&mut self, id: DbId) -> StoreResult<SceneRelations> {
        SceneRepo::relations(&mut self.tx, id).await.map_err(db_err)
    }

    async fn save_scene_relations(&mut self, id: DbId, relations: &SceneRelations) -> StoreResult<()> {
        SceneRepo::save_relations(&mut self.tx, id, relations)
            .await
            .map_err(db_err)
    }
}

// ---------------------------------------------------------------------------
// Redirects and notifications
// ---------------------------------------------------------------------------

#[async_trait]
impl RedirectRepository for PgTx {
    async fn find_redirect(
        &mut self,
        target_type: TargetType,
        source_id: DbId,
    ) -> StoreResult<Option<Redirect>> {
        let target = RedirectRepo::find_target(&mut self.tx, target_type, source_id)
            .await
            .map_err(db_err)?;
        Ok(target.map(|target_id| Redirect {
            target_type,
            source_id,
            target_id,
        }))
    }

    async fn create_redirect(&mut self, redirect: &Redirect) -> StoreResult<()> {
        RedirectRepo::create(
            &mut self.tx,
            redirect.target_type,
            redirect.source_id,
            redirect.target_id,
        )
        .await
        .map_err(db_err)
    }

    async fn retarget_redirects(
        &mut self,
        target_type: TargetType,
        from: DbId,
        to: DbId,
    ) -> StoreResult<u64> {
        RedirectRepo::retarget(&mut self.tx, target_type, from, to)
            .await
            .map_err(db_err)
    }
}

#[async_trait]
impl NotificationRepository for PgTx {
    async fn create_notifications(&mut self, notifications: &[NewNotification]) -> StoreResult<u64> {
        NotificationRepo::create_batch(&mut self.tx, notifications)
            .await
            .map_err(db_err)
    }

    async fn list_notifications(
        &mut self,
        user_id: DbId,
        unread_only: bool,
        page: Page,
    ) -> StoreResult<Vec<Notification>> {
        NotificationRepo::list_for_user(&mut self.tx, user_id, unread_only, page)
            .await
            .map_err(db_err)?
            .into_iter()
            .map(Notification::try_from)
            .collect()
    }

    async fn count_unread_notifications(&mut self, user_id: DbId) -> StoreResult<i64> {
        NotificationRepo::count_unread(&mut self.tx, user_id)
            .await
            .map_err(db_err)
    }

    async fn mark_notifications_read(&mut self, user_id: DbId, now: Timestamp) -> StoreResult<u64> {
        NotificationRepo::mark_all_read(&mut self.tx, user_id, now)
            .await
            .map_err(db_err)
    }

    async fn delete_notifications_before(&mut self, cutoff: Timestamp) -> StoreResult<u64> {
        NotificationRepo::delete_before(&mut self.tx, cutoff)
            .await
            .map_err(db_err)
    }
}
