//! In-process implementation of the `catalog_core::store` traits.
//!
//! `begin` snapshots the whole catalog; `commit` swaps the snapshot back
//! in. Dropping a [`MemoryTx`] discards its writes. Concurrent transactions
//! do not see each other and the last commit wins, which is enough for
//! tests and single-process local runs.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use catalog_core::edit::{Edit, EditComment, EditStatus, EditVote, NewEdit, TargetType, VoteType};
use catalog_core::notification::{NewNotification, Notification};
use catalog_core::performer::{Performer, PerformerRelations};
use catalog_core::query::{EditFilter, EditSort, SortDirection};
use catalog_core::redirect::Redirect;
use catalog_core::scene::{Scene, SceneRelations};
use catalog_core::store::{
    CatalogStore, CatalogTx, EditRepository, NotificationRepository, PerformerRepository,
    RedirectRepository, SceneRepository, StoreError, StoreResult, StudioRepository, TagRepository,
};
use catalog_core::studio::{Studio, StudioRelations};
use catalog_core::tag::{Tag, TagRelations};
use catalog_core::types::{DbId, Page, Timestamp};
use chrono::Utc;

#[derive(Debug, Clone, Default)]
struct MemoryState {
    next_id: DbId,
    edits: BTreeMap<DbId, Edit>,
    edit_targets: BTreeMap<(TargetType, DbId), DbId>,
    votes: BTreeMap<(DbId, DbId), EditVote>,
    comments: Vec<EditComment>,
    tags: BTreeMap<DbId, Tag>,
    tag_relations: BTreeMap<DbId, TagRelations>,
    performers: BTreeMap<DbId, Performer>,
    performer_relations: BTreeMap<DbId, PerformerRelations>,
    studios: BTreeMap<DbId, Studio>,
    studio_relations: BTreeMap<DbId, StudioRelations>,
    scenes: BTreeMap<DbId, Scene>,
    scene_relations: BTreeMap<DbId, SceneRelations>,
    redirects: BTreeMap<(TargetType, DbId), DbId>,
    notifications: Vec<Notification>,
}

impl MemoryState {
    fn allocate_id(&mut self) -> DbId {
        self.next_id += 1;
        self.next_id
    }

    fn matches(&self, edit: &Edit, filter: &EditFilter) -> bool {
        if filter.user_id.is_some_and(|id| id != edit.user_id)
            || filter.status.is_some_and(|s| s != edit.status)
            || filter.operation.is_some_and(|o| o != edit.operation)
            || filter.target_type.is_some_and(|t| t != edit.target_type)
            || filter.applied.is_some_and(|a| a != edit.applied)
        {
            return false;
        }
        if let (Some(target_type), Some(target_id)) = (filter.target_type, filter.target_id) {
            if self.edit_targets.get(&(target_type, edit.id)) != Some(&target_id) {
                return false;
            }
        }
        if let Some((user_id, vote)) = filter.voted {
            if self.votes.get(&(edit.id, user_id)).map(|v| v.vote) != Some(vote) {
                return false;
            }
        }
        true
    }

    fn filtered(&self, filter: &EditFilter) -> Vec<Edit> {
        self.edits
            .values()
            .filter(|edit| self.matches(edit, filter))
            .cloned()
            .collect()
    }
}

fn sort_key(edit: &Edit, sort: EditSort) -> Option<Timestamp> {
    match sort {
        EditSort::CreatedAt => Some(edit.created_at),
        EditSort::UpdatedAt => Some(edit.updated_at),
        EditSort::ClosedAt => edit.closed_at,
    }
}

fn not_found(entity: &'static str, id: DbId) -> StoreError {
    StoreError::RowNotFound { entity, id }
}

type WriteFailures = Arc<Mutex<BTreeSet<(TargetType, DbId)>>>;

/// Shared in-process catalog.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    shared: Arc<Mutex<MemoryState>>,
    write_failures: WriteFailures,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> StoreResult<MutexGuard<'_, MemoryState>> {
        self.shared
            .lock()
            .map_err(|_| StoreError::Database("memory store lock poisoned".to_string()))
    }

    /// Rewrite an edit's creation time, e.g. to simulate an elapsed voting
    /// period.
    pub fn backdate_edit(&self, edit_id: DbId, created_at: Timestamp) -> StoreResult<()> {
        let mut state = self.lock()?;
        let edit = state
            .edits
            .get_mut(&edit_id)
            .ok_or_else(|| not_found("Edit", edit_id))?;
        edit.created_at = created_at;
        Ok(())
    }

    /// Make every later update of the entity fail with
    /// `StoreError::Database`, as a dropped connection would.
    pub fn fail_writes_to(&self, target_type: TargetType, id: DbId) -> StoreResult<()> {
        lock_failures(&self.write_failures)?.insert((target_type, id));
        Ok(())
    }

    pub fn clear_write_failures(&self) -> StoreResult<()> {
        lock_failures(&self.write_failures)?.clear();
        Ok(())
    }
}

fn lock_failures(
    failures: &WriteFailures,
) -> StoreResult<MutexGuard<'_, BTreeSet<(TargetType, DbId)>>> {
    failures
        .lock()
        .map_err(|_| StoreError::Database("memory store lock poisoned".to_string()))
}

#[async_trait]
impl CatalogStore for MemoryStore {
    type Tx = MemoryTx;

    async fn begin(&self) -> StoreResult<MemoryTx> {
        let state = self.lock()?.clone();
        Ok(MemoryTx {
            shared: Arc::clone(&self.shared),
            write_failures: Arc::clone(&self.write_failures),
            state,
        })
    }
}

/// A snapshot of the catalog that replaces the shared one on commit.
pub struct MemoryTx {
    shared: Arc<Mutex<MemoryState>>,
    write_failures: WriteFailures,
    state: MemoryState,
}

impl MemoryTx {
    fn check_writable(&self, target_type: TargetType, id: DbId) -> StoreResult<()> {
        if lock_failures(&self.write_failures)?.contains(&(target_type, id)) {
            return Err(StoreError::Database(format!(
                "injected write failure for {target_type} {id}"
            )));
        }
        Ok(())
    }
}

#[async_trait]
impl CatalogTx for MemoryTx {
    async fn commit(self) -> StoreResult<()> {
        let mut shared = self
            .shared
            .lock()
            .map_err(|_| StoreError::Database("memory store lock poisoned".to_string()))?;
        *shared = self.state;
        Ok(())
    }

    async fn rollback(self) -> StoreResult<()> {
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Edits
// ---------------------------------------------------------------------------

#[async_trait]
impl EditRepository for MemoryTx {
    async fn create_edit(&mut self, input: &NewEdit) -> StoreResult<Edit> {
        let now = Utc::now();
        let edit = Edit {
            id: self.state.allocate_id(),
            user_id: input.user_id,
            target_type: input.target_type,
            operation: input.operation,
            status: EditStatus::Pending,
            data: input.data.clone(),
            vote_count: 0,
            applied: false,
            update_count: 0,
            created_at: now,
            updated_at: now,
            closed_at: None,
        };
        self.state.edits.insert(edit.id, edit.clone());
        Ok(edit)
    }

    async fn find_edit(&mut self, id: DbId) -> StoreResult<Option<Edit>> {
        Ok(self.state.edits.get(&id).cloned())
    }

    async fn lock_edit(&mut self, id: DbId) -> StoreResult<Option<Edit>> {
        Ok(self.state.edits.get(&id).cloned())
    }

    async fn update_edit(&mut self, edit: &Edit) -> StoreResult<Edit> {
        let stored = self
            .state
            .edits
            .get_mut(&edit.id)
            .ok_or_else(|| not_found("Edit", edit.id))?;
        let created_at = stored.created_at;
        *stored = Edit {
            created_at,
            updated_at: Utc::now(),
            ..edit.clone()
        };
        Ok(stored.clone())
    }

    async fn create_edit_target(
        &mut self,
        edit_id: DbId,
        target_type: TargetType,
        target_id: DbId,
    ) -> StoreResult<()> {
        self.state
            .edit_targets
            .insert((target_type, edit_id), target_id);
        Ok(())
    }

    async fn find_edit_target(
        &mut self,
        edit_id: DbId,
        target_type: TargetType,
    ) -> StoreResult<Option<DbId>> {
        Ok(self.state.edit_targets.get(&(target_type, edit_id)).copied())
    }

    async fn query_edits(&mut self, filter: &EditFilter) -> StoreResult<Vec<Edit>> {
        let mut edits = self.state.filtered(filter);
        edits.sort_by(|a, b| {
            let (ka, kb) = (sort_key(a, filter.sort), sort_key(b, filter.sort));
            // Missing timestamps sort last in both directions.
            let by_key = match (ka, kb) {
                (Some(x), Some(y)) => match filter.direction {
                    SortDirection::Asc => x.cmp(&y),
                    SortDirection::Desc => y.cmp(&x),
                },
                (Some(_), None) => std::cmp::Ordering::Less,
                (None, Some(_)) => std::cmp::Ordering::Greater,
                (None, None) => std::cmp::Ordering::Equal,
            };
            let by_id = match filter.direction {
                SortDirection::Asc => a.id.cmp(&b.id),
                SortDirection::Desc => b.id.cmp(&a.id),
            };
            by_key.then(by_id)
        });
        Ok(edits
            .into_iter()
            .skip(filter.page.offset() as usize)
            .take(filter.page.limit() as usize)
            .collect())
    }

    async fn count_edits(&mut self, filter: &EditFilter) -> StoreResult<i64> {
        Ok(self.state.filtered(filter).len() as i64)
    }

    async fn list_closing_candidates(&mut self, created_before: Timestamp) -> StoreResult<Vec<Edit>> {
        let state = &self.state;
        let mut edits: Vec<Edit> = state
            .edits
            .values()
            .filter(|edit| edit.is_pending())
            .filter(|edit| {
                edit.created_at <= created_before
                    || state
                        .votes
                        .values()
                        .any(|v| v.edit_id == edit.id && v.vote.is_immediate())
            })
            .cloned()
            .collect();
        edits.sort_by_key(|edit| (edit.created_at, edit.id));
        Ok(edits)
    }

    async fn upsert_vote(
        &mut self,
        edit_id: DbId,
        user_id: DbId,
        vote: VoteType,
    ) -> StoreResult<EditVote> {
        let row = EditVote {
            edit_id,
            user_id,
            vote,
            created_at: Utc::now(),
        };
        self.state.votes.insert((edit_id, user_id), row.clone());
        Ok(row)
    }

    async fn list_votes(&mut self, edit_id: DbId) -> StoreResult<Vec<EditVote>> {
        let mut votes: Vec<EditVote> = self
            .state
            .votes
            .values()
            .filter(|v| v.edit_id == edit_id)
            .cloned()
            .collect();
        votes.sort_by_key(|v| v.created_at);
        Ok(votes)
    }

    async fn delete_votes(&mut self, edit_id: DbId) -> StoreResult<u64> {
        let before = self.state.votes.len();
        self.state.votes.retain(|(id, _), _| *id != edit_id);
        Ok((before - self.state.votes.len()) as u64)
    }

    async fn create_comment(
        &mut self,
        edit_id: DbId,
        user_id: Option<DbId>,
        text: &str,
    ) -> StoreResult<EditComment> {
        let comment = EditComment {
            id: self.state.allocate_id(),
            edit_id,
            user_id,
            text: text.to_string(),
            created_at: Utc::now(),
        };
        self.state.comments.push(comment.clone());
        Ok(comment)
    }

    async fn list_comments(&mut self, edit_id: DbId) -> StoreResult<Vec<EditComment>> {
        Ok(self
            .state
            .comments
            .iter()
            .filter(|c| c.edit_id == edit_id)
            .cloned()
            .collect())
    }
}

// ---------------------------------------------------------------------------
// Entities
// ---------------------------------------------------------------------------

#[async_trait]
impl TagRepository for MemoryTx {
    async fn find_tag(&mut self, id: DbId) -> StoreResult<Option<Tag>> {
        Ok(self.state.tags.get(&id).cloned())
    }

    async fn lock_tag(&mut self, id: DbId) -> StoreResult<Option<Tag>> {
        self.find_tag(id).await
    }

    async fn create_tag(&mut self, tag: &Tag) -> StoreResult<Tag> {
        let now = Utc::now();
        let tag = Tag {
            id: self.state.allocate_id(),
            created_at: now,
            updated_at: now,
            ..tag.clone()
        };
        self.state.tags.insert(tag.id, tag.clone());
        Ok(tag)
    }

    async fn update_tag(&mut self, tag: &Tag) -> StoreResult<Tag> {
        self.check_writable(TargetType::Tag, tag.id)?;
        let stored = self
            .state
            .tags
            .get_mut(&tag.id)
            .ok_or_else(|| not_found("Tag", tag.id))?;
        *stored = Tag {
            created_at: stored.created_at,
            updated_at: Utc::now(),
            ..tag.clone()
        };
        Ok(stored.clone())
    }

    async fn tag_relations(&mut self, id: DbId) -> StoreResult<TagRelations> {
        Ok(self.state.tag_relations.get(&id).cloned().unwrap_or_default())
    }

    async fn save_tag_relations(&mut self, id: DbId, relations: &TagRelations) -> StoreResult<()> {
        self.state.tag_relations.insert(id, relations.clone());
        Ok(())
    }

    async fn reassign_scene_tags(&mut self, source: DbId, target: DbId) -> StoreResult<u64> {
        let mut moved = 0;
        for relations in self.state.scene_relations.values_mut() {
            if !relations.tags.contains(&source) {
                continue;
            }
            if relations.tags.contains(&target) {
                relations.tags.retain(|t| *t != source);
            } else {
                for tag in relations.tags.iter_mut().filter(|t| **t == source) {
                    *tag = target;
                }
                moved += 1;
            }
        }
        Ok(moved)
    }

    async fn delete_scene_tags(&mut self, tag_id: DbId) -> StoreResult<u64> {
        let mut removed = 0;
        for relations in self.state.scene_relations.values_mut() {
            let before = relations.tags.len();
            relations.tags.retain(|t| *t != tag_id);
            removed += (before - relations.tags.len()) as u64;
        }
        Ok(removed)
    }
}

#[async_trait]
impl PerformerRepository for MemoryTx {
    async fn find_performer(&mut self, id: DbId) -> StoreResult<Option<Performer>> {
        Ok(self.state.performers.get(&id).cloned())
    }

    async fn lock_performer(&mut self, id: DbId) -> StoreResult<Option<Performer>> {
        self.find_performer(id).await
    }

    async fn create_performer(&mut self, performer: &Performer) -> StoreResult<Performer> {
        let now = Utc::now();
        let performer = Performer {
            id: self.state.allocate_id(),
            created_at: now,
            updated_at: now,
            ..performer.clone()
        };
        self.state.performers.insert(performer.id, performer.clone());
        Ok(performer)
    }

    async fn update_performer(&mut self, performer: &Performer) -> StoreResult<Performer> {
        self.check_writable(TargetType::Performer, performer.id)?;
        let stored = self
            .state
            .performers
            .get_mut(&performer.id)
            .ok_or_else(|| not_found("Performer", performer.id))?;
        *stored = Performer {
            created_at: stored.created_at,
            updated_at: Utc::now(),
            ..performer.clone()
        };
        Ok(stored.clone())
    }

    async fn performer_relations(&mut self, id: DbId) -> StoreResult<PerformerRelations> {
        Ok(self
            .state
            .performer_relations
            .get(&id)
            .cloned()
            .unwrap_or_default())
    }

    async fn save_performer_relations(
        &mut self,
        id: DbId,
        relations: &PerformerRelations,
    ) -> StoreResult<()> {
        self.state.performer_relations.insert(id, relations.clone());
        Ok(())
    }

    async fn reassign_scene_performers(
        &mut self,
        source: DbId,
        target: DbId,
        alias: Option<&str>,
    ) -> StoreResult<u64> {
        let mut moved = 0;
        for relations in self.state.scene_relations.values_mut() {
            let has_target = relations.performers.iter().any(|p| p.performer_id == target);
            if has_target {
                relations.performers.retain(|p| p.performer_id != source);
                continue;
            }
            for appearance in relations
                .performers
                .iter_mut()
                .filter(|p| p.performer_id == source)
            {
                appearance.performer_id = target;
                if appearance.alias.is_none() {
                    appearance.alias = alias.map(str::to_string);
                }
                moved += 1;
            }
        }
        Ok(moved)
    }

    async fn set_scene_performer_alias(&mut self, performer_id: DbId, alias: &str) -> StoreResult<u64> {
        let mut updated = 0;
        for relations in self.state.scene_relations.values_mut() {
            for appearance in relations.performers.iter_mut() {
                if appearance.performer_id == performer_id && appearance.alias.is_none() {
                    appearance.alias = Some(alias.to_string());
                    updated += 1;
                }
            }
        }
        Ok(updated)
    }

    async fn clear_scene_performer_alias(
        &mut self,
        performer_id: DbId,
        alias: &str,
    ) -> StoreResult<u64> {
        let mut updated = 0;
        for relations in self.state.scene_relations.values_mut() {
            for appearance in relations.performers.iter_mut() {
                if appearance.performer_id == performer_id
                    && appearance.alias.as_deref() == Some(alias)
                {
                    appearance.alias = None;
                    updated += 1;
                }
            }
        }
        Ok(updated)
    }

    async fn delete_scene_performers(&mut self, performer_id: DbId) -> StoreResult<u64> {
        let mut removed = 0;
        for relations in self.state.scene_relations.values_mut() {
            let before = relations.performers.len();
            relations.performers.retain(|p| p.performer_id != performer_id);
            removed += (before - relations.performers.len()) as u64;
        }
        Ok(removed)
    }
}

#[async_trait]
impl StudioRepository for MemoryTx {
    async fn find_studio(&mut self, id: DbId) -> StoreResult<Option<Studio>> {
        Ok(self.state.studios.get(&id).cloned())
    }

    async fn lock_studio(&mut self, id: DbId) -> StoreResult<Option<Studio>> {
        self.find_studio(id).await
    }

    async fn create_studio(&mut self, studio: &Studio) -> StoreResult<Studio> {
        let now = Utc::now();
        let studio = Studio {
            id: self.state.allocate_id(),
            created_at: now,
            updated_at: now,
            ..studio.clone()
        };
        self.state.studios.insert(studio.id, studio.clone());
        Ok(studio)
    }

    async fn update_studio(&mut self, studio: &Studio) -> StoreResult<Studio> {
        self.check_writable(TargetType::Studio, studio.id)?;
        let stored = self
            .state
            .studios
            .get_mut(&studio.id)
            .ok_or_else(|| not_found("Studio", studio.id))?;
        *stored = Studio {
            created_at: stored.created_at,
            updated_at: Utc::now(),
            ..studio.clone()
        };
        Ok(stored.clone())
    }

    async fn studio_relations(&mut self, id: DbId) -> StoreResult<StudioRelations> {
        Ok(self.state.studio_relations.get(&id).cloned().unwrap_or_default())
    }

    async fn save_studio_relations(&mut self, id: DbId, relations: &StudioRelations) -> StoreResult<()> {
        self.state.studio_relations.insert(id, relations.clone());
        Ok(())
    }

    async fn reassign_studio_references(&mut self, source: DbId, target: DbId) -> StoreResult<u64> {
        let mut moved = 0;
        for scene in self.state.scenes.values_mut() {
            if scene.studio_id == Some(source) {
                scene.studio_id = Some(target);
                moved += 1;
            }
        }
        for studio in self.state.studios.values_mut() {
            if studio.parent_id == Some(source) && studio.id != target {
                studio.parent_id = Some(target);
                moved += 1;
            }
        }
        Ok(moved)
    }

    async fn detach_studio_references(&mut self, studio_id: DbId) -> StoreResult<u64> {
        let mut detached = 0;
        for scene in self.state.scenes.values_mut() {
            if scene.studio_id == Some(studio_id) {
                scene.studio_id = None;
                detached += 1;
            }
        }
        for studio in self.state.studios.values_mut() {
            if studio.parent_id == Some(studio_id) {
                studio.parent_id = None;
                detached += 1;
            }
        }
        Ok(detached)
    }
}

#[async_trait]
impl SceneRepository for MemoryTx {
    async fn find_scene(&mut self, id: DbId) -> StoreResult<Option<Scene>> {
        Ok(self.state.scenes.get(&id).cloned())
    }

    async fn lock_scene(&mut self, id: DbId) -> StoreResult<Option<Scene>> {
        self.find_scene(id).await
    }

    async fn create_scene(&mut self, scene: &Scene) -> StoreResult<Scene> {
        let now = Utc::now();
        let scene = Scene {
            id: self.state.allocate_id(),
            created_at: now,
            updated_at: now,
            ..scene.clone()
        };
        self.state.scenes.insert(scene.id, scene.clone());
        Ok(scene)
    }

    async fn update_scene(&mut self, scene: &Scene) -> StoreResult<Scene> {
        self.check_writable(TargetType::Scene, scene.id)?;
        let stored = self
            .state
            .scenes
            .get_mut(&scene.id)
            .ok_or_else(|| not_found("Scene", scene.id))?;
        *stored = Scene {
            created_at: stored.created_at,
            updated_at: Utc::now(),
            ..scene.clone()
        };
        Ok(stored.clone())
    }

    async fn scene_relations(&mut self, id: DbId) -> StoreResult<SceneRelations> {
        Ok(self.state.scene_relations.get(&id).cloned().unwrap_or_default())
    }

    async fn save_scene_relations(&mut self, id: DbId, relations: &SceneRelations) -> StoreResult<()> {
        self.state.scene_relations.insert(id, relations.clone());
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Redirects and notifications
// ---------------------------------------------------------------------------

#[async_trait]
impl RedirectRepository for MemoryTx {
    async fn find_redirect(
        &mut self,
        target_type: TargetType,
        source_id: DbId,
    ) -> StoreResult<Option<Redirect>> {
        Ok(self
            .state
            .redirects
            .get(&(target_type, source_id))
            .map(|target_id| Redirect {
                target_type,
                source_id,
                target_id: *target_id,
            }))
    }

    async fn create_redirect(&mut self, redirect: &Redirect) -> StoreResult<()> {
        self.state
            .redirects
            .insert((redirect.target_type, redirect.source_id), redirect.target_id);
        Ok(())
    }

    async fn retarget_redirects(
        &mut self,
        target_type: TargetType,
        from: DbId,
        to: DbId,
    ) -> StoreResult<u64> {
        let mut updated = 0;
        for ((kind, _), target) in self.state.redirects.iter_mut() {
            if *kind == target_type && *target == from {
                *target = to;
                updated += 1;
            }
        }
        Ok(updated)
    }
}

#[async_trait]
impl NotificationRepository for MemoryTx {
    async fn create_notifications(&mut self, notifications: &[NewNotification]) -> StoreResult<u64> {
        let now = Utc::now();
        for n in notifications {
            let id = self.state.allocate_id();
            self.state.notifications.push(Notification {
                id,
                user_id: n.user_id,
                kind: n.kind,
                edit_id: n.edit_id,
                read_at: None,
                created_at: now,
            });
        }
        Ok(notifications.len() as u64)
    }

    async fn list_notifications(
        &mut self,
        user_id: DbId,
        unread_only: bool,
        page: Page,
    ) -> StoreResult<Vec<Notification>> {
        let mut rows: Vec<Notification> = self
            .state
            .notifications
            .iter()
            .filter(|n| n.user_id == user_id && (!unread_only || n.read_at.is_none()))
            .cloned()
            .collect();
        rows.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(rows
            .into_iter()
            .skip(page.offset() as usize)
            .take(page.limit() as usize)
            .collect())
    }

    async fn count_unread_notifications(&mut self, user_id: DbId) -> StoreResult<i64> {
        Ok(self
            .state
            .notifications
            .iter()
            .filter(|n| n.user_id == user_id && n.read_at.is_none())
            .count() as i64)
    }

    async fn mark_notifications_read(&mut self, user_id: DbId, now: Timestamp) -> StoreResult<u64> {
        let mut updated = 0;
        for n in self.state.notifications.iter_mut() {
            if n.user_id == user_id && n.read_at.is_none() {
                n.read_at = Some(now);
                updated += 1;
            }
        }
        Ok(updated)
    }

    async fn delete_notifications_before(&mut self, cutoff: Timestamp) -> StoreResult<u64> {
        let before = self.state.notifications.len();
        self.state.notifications.retain(|n| n.created_at >= cutoff);
        Ok((before - self.state.notifications.len()) as u64)
    }
}

#[cfg(test)]
mod tests {
    use catalog_core::relations::PerformerAppearance;
    use serde_json::json;

    use super::*;

    async fn seeded_scene(tx: &mut MemoryTx, relations: SceneRelations) -> Scene {
        let scene = tx
            .create_scene(&Scene {
                title: Some("Scene".to_string()),
                ..Default::default()
            })
            .await
            .unwrap();
        tx.save_scene_relations(scene.id, &relations).await.unwrap();
        scene
    }

    #[tokio::test]
    async fn dropped_transaction_discards_writes() {
        let store = MemoryStore::new();
        {
            let mut tx = store.begin().await.unwrap();
            tx.create_tag(&Tag {
                name: "Gone".to_string(),
                ..Default::default()
            })
            .await
            .unwrap();
        }
        let mut tx = store.begin().await.unwrap();
        assert_eq!(tx.find_tag(1).await.unwrap(), None);
    }

    #[tokio::test]
    async fn committed_transaction_is_visible() {
        let store = MemoryStore::new();
        let mut tx = store.begin().await.unwrap();
        let tag = tx
            .create_tag(&Tag {
                name: "Kept".to_string(),
                ..Default::default()
            })
            .await
            .unwrap();
        tx.commit().await.unwrap();

        let mut tx = store.begin().await.unwrap();
        assert_eq!(tx.find_tag(tag.id).await.unwrap().map(|t| t.name), Some("Kept".to_string()));
    }

    #[tokio::test]
    async fn upsert_vote_keeps_one_vote_per_user() {
        let store = MemoryStore::new();
        let mut tx = store.begin().await.unwrap();
        let edit = tx
            .create_edit(&NewEdit {
                user_id: 1,
                target_type: TargetType::Tag,
                operation: catalog_core::edit::Operation::Create,
                data: json!({}),
            })
            .await
            .unwrap();
        tx.upsert_vote(edit.id, 2, VoteType::Accept).await.unwrap();
        tx.upsert_vote(edit.id, 2, VoteType::Reject).await.unwrap();
        let votes = tx.list_votes(edit.id).await.unwrap();
        assert_eq!(votes.len(), 1);
        assert_eq!(votes[0].vote, VoteType::Reject);
    }

    #[tokio::test]
    async fn reassign_scene_performers_drops_duplicates() {
        let store = MemoryStore::new();
        let mut tx = store.begin().await.unwrap();
        let shared = seeded_scene(
            &mut tx,
            SceneRelations {
                performers: vec![
                    PerformerAppearance::new(10, None),
                    PerformerAppearance::new(20, None),
                ],
                ..Default::default()
            },
        )
        .await;
        let solo = seeded_scene(
            &mut tx,
            SceneRelations {
                performers: vec![PerformerAppearance::new(10, None)],
                ..Default::default()
            },
        )
        .await;

        let moved = tx.reassign_scene_performers(10, 20, Some("Old Name")).await.unwrap();
        assert_eq!(moved, 1);

        let shared = tx.scene_relations(shared.id).await.unwrap();
        assert_eq!(shared.performers, vec![PerformerAppearance::new(20, None)]);
        let solo = tx.scene_relations(solo.id).await.unwrap();
        assert_eq!(solo.performers, vec![PerformerAppearance::new(20, Some("Old Name"))]);
    }
}
