//! Redirects left behind by merges, and resolution of stale ids.

use catalog_core::edit::TargetType;
use catalog_core::error::CoreError;
use catalog_core::redirect::{Redirect, MAX_REDIRECT_DEPTH};
use catalog_core::store::{CatalogTx, StoreResult};
use catalog_core::types::DbId;

use crate::error::EngineResult;

/// Point `source` at `target`, carrying over every redirect that already
/// pointed at `source` so chains stay one hop long.
pub(crate) async fn redirect_merged<T: CatalogTx>(
    tx: &mut T,
    target_type: TargetType,
    source: DbId,
    target: DbId,
) -> StoreResult<()> {
    tx.retarget_redirects(target_type, source, target).await?;
    tx.create_redirect(&Redirect {
        target_type,
        source_id: source,
        target_id: target,
    })
    .await
}

/// `Some(deleted)` for an existing entity, `None` when there is no row.
async fn deleted_flag<T: CatalogTx>(
    tx: &mut T,
    target_type: TargetType,
    id: DbId,
) -> StoreResult<Option<bool>> {
    Ok(match target_type {
        TargetType::Tag => tx.find_tag(id).await?.map(|e| e.deleted),
        TargetType::Performer => tx.find_performer(id).await?.map(|e| e.deleted),
        TargetType::Studio => tx.find_studio(id).await?.map(|e| e.deleted),
        TargetType::Scene => tx.find_scene(id).await?.map(|e| e.deleted),
    })
}

/// Follow redirects from `id` until reaching a live entity.
pub async fn resolve<T: CatalogTx>(tx: &mut T, target_type: TargetType, id: DbId) -> EngineResult<DbId> {
    let entity = target_type.entity_name();
    let mut current = id;
    for _ in 0..=MAX_REDIRECT_DEPTH {
        let flag = deleted_flag(tx, target_type, current).await?;
        if flag == Some(false) {
            return Ok(current);
        }
        match tx.find_redirect(target_type, current).await? {
            Some(redirect) => current = redirect.target_id,
            None if flag.is_some() => {
                return Err(CoreError::EntityDeleted { entity, id: current }.into());
            }
            None => return Err(CoreError::NotFound { entity, id: current }.into()),
        }
    }
    Err(CoreError::Conflict(format!(
        "{entity} {id} redirects more than {MAX_REDIRECT_DEPTH} times"
    ))
    .into())
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;
    use catalog_core::store::{CatalogStore, RedirectRepository, TagRepository};
    use catalog_core::tag::Tag;
    use catalog_db::MemoryStore;

    use super::*;
    use crate::error::EngineError;

    async fn tag(tx: &mut impl CatalogTx, name: &str, deleted: bool) -> DbId {
        let tag = Tag {
            name: name.to_string(),
            deleted,
            ..Tag::default()
        };
        tx.create_tag(&tag).await.unwrap().id
    }

    #[tokio::test]
    async fn live_entity_resolves_to_itself() {
        let store = MemoryStore::new();
        let mut tx = store.begin().await.unwrap();
        let id = tag(&mut tx, "Outdoor", false).await;
        assert_eq!(resolve(&mut tx, TargetType::Tag, id).await.unwrap(), id);
    }

    #[tokio::test]
    async fn retargeting_keeps_chains_resolvable() {
        let store = MemoryStore::new();
        let mut tx = store.begin().await.unwrap();
        let a = tag(&mut tx, "A", true).await;
        let b = tag(&mut tx, "B", true).await;
        let c = tag(&mut tx, "C", false).await;

        redirect_merged(&mut tx, TargetType::Tag, a, b).await.unwrap();
        redirect_merged(&mut tx, TargetType::Tag, b, c).await.unwrap();

        let hop = tx.find_redirect(TargetType::Tag, a).await.unwrap().unwrap();
        assert_eq!(hop.target_id, c);
        assert_eq!(resolve(&mut tx, TargetType::Tag, a).await.unwrap(), c);
        assert_eq!(resolve(&mut tx, TargetType::Tag, b).await.unwrap(), c);
    }

    #[tokio::test]
    async fn deleted_entity_without_redirect_is_reported() {
        let store = MemoryStore::new();
        let mut tx = store.begin().await.unwrap();
        let id = tag(&mut tx, "Gone", true).await;
        assert_matches!(
            resolve(&mut tx, TargetType::Tag, id).await,
            Err(EngineError::Core(CoreError::EntityDeleted { .. }))
        );
        assert_matches!(
            resolve(&mut tx, TargetType::Tag, 999).await,
            Err(EngineError::Core(CoreError::NotFound { .. }))
        );
    }

    #[tokio::test]
    async fn redirect_cycle_is_bounded() {
        let store = MemoryStore::new();
        let mut tx = store.begin().await.unwrap();
        let a = tag(&mut tx, "A", true).await;
        let b = tag(&mut tx, "B", true).await;
        for (source_id, target_id) in [(a, b), (b, a)] {
            tx.create_redirect(&Redirect {
                target_type: TargetType::Tag,
                source_id,
                target_id,
            })
            .await
            .unwrap();
        }
        assert_matches!(
            resolve(&mut tx, TargetType::Tag, a).await,
            Err(EngineError::Core(CoreError::Conflict(_)))
        );
    }
}
