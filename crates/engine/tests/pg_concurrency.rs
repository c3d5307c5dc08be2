//! Concurrent application against PostgreSQL. Requires a `DATABASE_URL`.

use catalog_core::edit::{EditStatus, Operation};
use catalog_core::notify::NoopNotifier;
use catalog_core::roles::{Actor, Role};
use catalog_core::store::{CatalogStore, CatalogTx, TagRepository};
use catalog_core::tag::{Tag, TagEditDetails};
use catalog_core::voting::VotingConfig;
use catalog_db::PgStore;
use catalog_engine::{EditDetails, EditService, EditSubmission};
use sqlx::PgPool;

async fn insert_user(pool: &PgPool, name: &str) -> i64 {
    let (id,): (i64,) = sqlx::query_as("INSERT INTO users (name) VALUES ($1) RETURNING id")
        .bind(name)
        .fetch_one(pool)
        .await
        .unwrap();
    id
}

fn rename_tag(name: &str) -> EditDetails {
    EditDetails::Tag(TagEditDetails {
        name: Some(Some(name.to_string())),
        ..Default::default()
    })
}

#[sqlx::test(migrations = "../../db/migrations")]
#[ignore = "requires DATABASE_URL"]
async fn conflicting_renames_applied_together_accept_only_one(pool: PgPool) {
    let author = Actor::new(insert_user(&pool, "author").await, Role::Edit);
    let admin = Actor::new(insert_user(&pool, "admin").await, Role::Admin);
    let store = PgStore::new(pool);

    let mut tx = store.begin().await.unwrap();
    let tag = tx
        .create_tag(&Tag {
            name: "Outdoor".to_string(),
            ..Tag::default()
        })
        .await
        .unwrap();
    tx.commit().await.unwrap();

    let service = EditService::new(store.clone(), NoopNotifier, VotingConfig::default());
    let first = service
        .submit_edit(
            &author,
            EditSubmission::new(Operation::Modify, rename_tag("Outdoors")).with_target(tag.id),
        )
        .await
        .unwrap();
    let second = service
        .submit_edit(
            &author,
            EditSubmission::new(Operation::Modify, rename_tag("Outside")).with_target(tag.id),
        )
        .await
        .unwrap();

    let (a, b) = tokio::join!(
        service.apply_edit(&admin, first.id),
        service.apply_edit(&admin, second.id)
    );
    let (a, b) = (a.unwrap(), b.unwrap());

    let mut statuses = vec![a.status, b.status];
    statuses.sort_by_key(|status| status.to_string());
    assert_eq!(statuses, vec![EditStatus::Failed, EditStatus::ImmediateAccepted]);

    let winner = if a.status == EditStatus::Failed { &b } else { &a };
    let loser = if a.status == EditStatus::Failed { &a } else { &b };
    let mut tx = store.begin().await.unwrap();
    let stored = tx.find_tag(tag.id).await.unwrap().unwrap();
    assert_eq!(stored.name, winner.data["new"]["name"]);

    let comments = service.comments(loser.id).await.unwrap();
    assert_eq!(comments.len(), 1);
    assert!(comments[0].user_id.is_none());
    assert!(comments[0].text.starts_with("Prerequisite failed"));
}
