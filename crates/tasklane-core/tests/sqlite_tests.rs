use std::sync::Arc;
use tasklane_core::config::StoreConfig;
use tasklane_core::db::establish_connection;
use tasklane_core::gateway::SqliteGateway;
use tasklane_core::models::*;
use tasklane_core::store::TaskStore;
use tasklane_core::tags::OTHER_TAG;
use chrono::NaiveDate;
use tempfile::TempDir;

/// Helper function to create a test database
async fn setup_test_db() -> (String, TempDir) {
    let temp_dir = tempfile::tempdir().expect("Failed to create temp directory");
    let db_path = temp_dir.path().join("nested").join("tasks.db");
    (db_path.to_string_lossy().into_owned(), temp_dir)
}

async fn open_store(db_path: &str, user: &str) -> TaskStore {
    let pool = establish_connection(db_path)
        .await
        .expect("Failed to establish test database connection");
    let store = TaskStore::new(Arc::new(SqliteGateway::new(pool)), StoreConfig::default());
    store
        .init(UserSession::new(user))
        .await
        .expect("Failed to open session");
    store
}

#[tokio::test]
async fn test_state_survives_reopen() {
    let (db_path, _temp_dir) = setup_test_db().await;

    let store = open_store(&db_path, "alice").await;
    store.add_tag("gym").await.unwrap();
    let lift = store
        .add_task(NewTaskData {
            title: "Deadlift".to_string(),
            tag: "gym".to_string(),
            priority: Priority::High,
            deadline: NaiveDate::from_ymd_opt(2024, 5, 1),
            notification_time: chrono::NaiveTime::from_hms_opt(7, 30, 0),
            ..Default::default()
        })
        .await
        .unwrap();
    let report = store
        .add_task(NewTaskData {
            title: "Report".to_string(),
            tag: "work".to_string(),
            ..Default::default()
        })
        .await
        .unwrap();
    store.toggle_completion(report.id).await.unwrap();
    store
        .update_task(
            lift.id,
            UpdateTaskData {
                deadline: Some(None),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    let removal = store.remove_tag("gym").await.unwrap();
    assert_eq!(removal.reassigned_task_ids, vec![lift.id]);
    let expected = store.snapshot();
    let expected_tags = store.list_tags();
    store.teardown();

    let reopened = open_store(&db_path, "alice").await;
    assert_eq!(reopened.list_tags(), expected_tags);
    assert_eq!(reopened.snapshot(), expected);

    let lift = reopened.task(lift.id).unwrap();
    assert_eq!(lift.tag, OTHER_TAG);
    assert_eq!(lift.deadline, None);
    assert!(reopened.task(report.id).unwrap().completed);
}

#[tokio::test]
async fn test_users_are_isolated() {
    let (db_path, _temp_dir) = setup_test_db().await;

    let alice = open_store(&db_path, "alice").await;
    alice.add_tag("chess").await.unwrap();
    alice
        .add_task(NewTaskData {
            title: "Openings".to_string(),
            tag: "chess".to_string(),
            ..Default::default()
        })
        .await
        .unwrap();

    let bob = open_store(&db_path, "bob").await;
    assert!(bob.snapshot().is_empty());
    assert!(!bob.list_tags().contains(&"chess".to_string()));
}

#[tokio::test]
async fn test_delete_is_persisted() {
    let (db_path, _temp_dir) = setup_test_db().await;

    let store = open_store(&db_path, "alice").await;
    let task = store
        .add_task(NewTaskData {
            title: "Temporary".to_string(),
            tag: "home".to_string(),
            ..Default::default()
        })
        .await
        .unwrap();
    store.delete_task(task.id).await.unwrap();

    let reopened = open_store(&db_path, "alice").await;
    assert!(reopened.task(task.id).is_none());
}
