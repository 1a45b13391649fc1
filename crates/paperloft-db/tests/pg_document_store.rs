//! PostgreSQL document store tests.
//!
//! These need a live database and only run when `RUN_DB_TESTS=1`; the URL
//! comes from `DATABASE_URL` (or `.env`), defaulting to the local test instance.

use chrono::Utc;
use paperloft_core::{
    new_artifact_id, Artifact, ArtifactCore, ArtifactData, ArtifactType, DocumentStore,
    PrivateSettingsDoc, StoreChange,
};
use paperloft_db::{create_pool, PgDocumentStore, PoolConfig, DEFAULT_TEST_DATABASE_URL};
use serde_json::json;

async fn connect() -> Option<PgDocumentStore> {
    dotenvy::dotenv().ok();
    if std::env::var("RUN_DB_TESTS").ok().as_deref() != Some("1") {
        eprintln!("skipping: RUN_DB_TESTS not set");
        return None;
    }
    let url = std::env::var("DATABASE_URL")
        .unwrap_or_else(|_| DEFAULT_TEST_DATABASE_URL.to_string());
    let pool = create_pool(&url, PoolConfig::default().max_connections(2))
        .await
        .expect("connect to test database");
    let store = PgDocumentStore::new(pool);
    store.migrate().await.expect("run migrations");
    Some(store)
}

fn artifact(owner: &str, original_id: &str) -> Artifact {
    Artifact {
        id: new_artifact_id(),
        artifact_type: ArtifactType::Bookmark,
        title: "Test paper".to_string(),
        owner: owner.to_string(),
        acl: Default::default(),
        visibility: "private".to_string(),
        primary_project_id: None,
        project_ids: vec![],
        tags: vec![],
        status: "active".to_string(),
        schema_version: 1,
        created_at: Utc::now(),
        updated_at: Utc::now(),
        refs: Default::default(),
        data: ArtifactData {
            core: ArtifactCore {
                meta: json!({"originalId": original_id}),
                ..Default::default()
            },
            research_loader: json!({"note": ""}),
        },
        extra_attributes: Default::default(),
    }
}

#[tokio::test]
async fn test_artifact_crud_and_change_feed() {
    let Some(store) = connect().await else { return };
    let owner = format!("test-owner-{}", uuid::Uuid::new_v4());
    let mut rx = store.subscribe();

    let a = artifact(&owner, "W1");
    store.put_artifact(&a).await.unwrap();

    let listed = store.list_artifacts(&owner).await.unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].original_id(), Some("W1"));

    assert!(!store.delete_artifact("someone-else", &a.id).await.unwrap());
    assert_eq!(store.list_artifacts(&owner).await.unwrap().len(), 1);
    assert!(store.delete_artifact(&owner, &a.id).await.unwrap());
    assert!(store.list_artifacts(&owner).await.unwrap().is_empty());

    assert!(matches!(
        rx.recv().await.unwrap(),
        StoreChange::ArtifactUpserted { .. }
    ));
    assert!(matches!(
        rx.recv().await.unwrap(),
        StoreChange::ArtifactDeleted { .. }
    ));
}

#[tokio::test]
async fn test_private_settings_upsert() {
    let Some(store) = connect().await else { return };
    let user = format!("test-user-{}", uuid::Uuid::new_v4());

    let first = PrivateSettingsDoc {
        encrypted_settings: "first".to_string(),
        updated_at: Utc::now(),
        schema_version: 1,
    };
    store.put_private_settings(&user, &first).await.unwrap();
    let second = PrivateSettingsDoc {
        encrypted_settings: "second".to_string(),
        ..first.clone()
    };
    store.put_private_settings(&user, &second).await.unwrap();

    let loaded = store.get_private_settings(&user).await.unwrap().unwrap();
    assert_eq!(loaded.encrypted_settings, "second");
}
