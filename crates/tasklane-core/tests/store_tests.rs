use std::sync::Arc;
use std::time::Duration;
use tasklane_core::config::StoreConfig;
use tasklane_core::error::CoreError;
use tasklane_core::filter::{DateBucket, FilterCriteria, PriorityFilter, TagFilter};
use tasklane_core::gateway::memory::{GatewayCall, Outcome};
use tasklane_core::gateway::{GatewayError, MemoryGateway, TaskRecord};
use tasklane_core::models::*;
use tasklane_core::store::TaskStore;
use tasklane_core::tags::{OTHER_TAG, STARTER_TAGS};
use chrono::NaiveDate;
use rstest::rstest;
use uuid::Uuid;

fn user() -> UserSession {
    UserSession::new("user-1")
}

/// Helper function to open a store with a fresh in-memory remote
async fn setup_store() -> (Arc<MemoryGateway>, TaskStore) {
    setup_store_with(StoreConfig::default()).await
}

async fn setup_store_with(config: StoreConfig) -> (Arc<MemoryGateway>, TaskStore) {
    let gateway = Arc::new(MemoryGateway::new());
    let store = TaskStore::new(gateway.clone(), config);
    store.init(user()).await.expect("Failed to open session");
    (gateway, store)
}

/// Helper function to create a test task
async fn create_test_task(store: &TaskStore, title: &str, tag: &str) -> Task {
    store
        .add_task(NewTaskData {
            title: title.to_string(),
            tag: tag.to_string(),
            ..Default::default()
        })
        .await
        .expect("Failed to create test task")
}

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

#[tokio::test]
async fn test_new_user_gets_starter_tags() {
    let (gateway, store) = setup_store().await;

    assert_eq!(store.list_tags(), STARTER_TAGS.to_vec());
    assert_eq!(gateway.tags(&user()), STARTER_TAGS.to_vec());
    assert!(store.snapshot().is_empty());
}

#[tokio::test]
async fn test_init_repairs_remote_state() {
    let gateway = Arc::new(MemoryGateway::new());
    gateway.seed_tags(&user(), ["work", "Gym"]);

    let template = Task::from_new(NewTaskData {
        title: "Chess club".to_string(),
        tag: "chess".to_string(),
        ..Default::default()
    });
    gateway.seed_task(TaskRecord::from_task(&template, &user()));
    let mut blank = TaskRecord::from_task(
        &Task::from_new(NewTaskData {
            title: "x".to_string(),
            tag: "work".to_string(),
            ..Default::default()
        }),
        &user(),
    );
    blank.title = "  ".to_string();
    gateway.seed_task(blank);

    let store = TaskStore::new(gateway.clone(), StoreConfig::default());
    store.init(user()).await.unwrap();

    assert_eq!(store.list_tags(), vec!["work", "gym", OTHER_TAG]);
    assert!(gateway.tags(&user()).contains(&OTHER_TAG.to_string()));

    // The malformed row is skipped; the unknown tag is moved to the sentinel.
    let tasks = store.snapshot();
    assert_eq!(tasks.len(), 1);
    assert_eq!(tasks[0].tag, OTHER_TAG);
    assert_eq!(gateway.record(&user(), template.id).unwrap().tag, OTHER_TAG);
}

#[tokio::test]
async fn test_init_accepts_sentinel_in_any_case() {
    let gateway = Arc::new(MemoryGateway::new());
    gateway.seed_tags(&user(), ["Work", " Other "]);

    let store = TaskStore::new(gateway.clone(), StoreConfig::default());
    store.init(user()).await.unwrap();

    assert_eq!(store.list_tags(), vec!["work", OTHER_TAG]);
    assert!(!gateway
        .calls()
        .iter()
        .any(|call| matches!(call, GatewayCall::InsertTag(_))));
    assert_eq!(gateway.tags(&user()).len(), 2);
}

#[tokio::test]
async fn test_init_sorts_most_recent_first() {
    let gateway = Arc::new(MemoryGateway::new());
    gateway.seed_tags(&user(), STARTER_TAGS);
    let mut older = Task::from_new(NewTaskData {
        title: "older".to_string(),
        tag: "work".to_string(),
        ..Default::default()
    });
    older.created_at -= chrono::Duration::days(1);
    let newer = Task::from_new(NewTaskData {
        title: "newer".to_string(),
        tag: "work".to_string(),
        ..Default::default()
    });
    gateway.seed_task(TaskRecord::from_task(&older, &user()));
    gateway.seed_task(TaskRecord::from_task(&newer, &user()));

    let store = TaskStore::new(gateway, StoreConfig::default());
    store.init(user()).await.unwrap();

    let titles: Vec<String> = store.snapshot().into_iter().map(|t| t.title).collect();
    assert_eq!(titles, vec!["newer", "older"]);
}

#[tokio::test]
async fn test_teardown_and_reopen() {
    let (gateway, store) = setup_store().await;
    let task = create_test_task(&store, "Pay rent", "finance").await;

    store.teardown();
    assert!(!store.is_open());
    assert!(store.snapshot().is_empty());
    assert!(matches!(
        store.toggle_completion(task.id).await,
        Err(CoreError::NoSession)
    ));

    store.init(user()).await.unwrap();
    assert_eq!(store.session(), Some(user()));
    assert_eq!(store.task(task.id), Some(task));
    // Tags were already stored, so no starter tags are inserted again.
    let inserts = gateway
        .calls()
        .into_iter()
        .filter(|c| matches!(c, GatewayCall::InsertTag(_)))
        .count();
    assert_eq!(inserts, STARTER_TAGS.len());
}

#[tokio::test]
async fn test_remove_tag_reassigns_tasks() {
    let (gateway, store) = setup_store().await;

    assert_eq!(store.add_tag("gym").await.unwrap(), TagAddition::Added("gym".to_string()));
    let a = create_test_task(&store, "Deadlift", "gym").await;
    let b = create_test_task(&store, "Report", "work").await;
    let today = date(2024, 1, 10);
    let by_tag = |tag: &str| {
        store.select(
            &FilterCriteria::pending().with_tag(TagFilter::only(tag).unwrap()),
            today,
        )
    };
    assert_eq!(by_tag("gym"), vec![a.clone()]);

    let result = store.remove_tag("gym").await.unwrap();
    assert!(result.tag_removed);
    assert_eq!(result.reassigned_task_ids, vec![a.id]);

    assert_eq!(store.task(a.id).unwrap().tag, OTHER_TAG);
    assert_eq!(store.task(b.id).unwrap().tag, "work");
    assert!(!store.list_tags().contains(&"gym".to_string()));
    assert!(by_tag("gym").is_empty());
    let moved: Vec<Uuid> = by_tag(OTHER_TAG).into_iter().map(|t| t.id).collect();
    assert_eq!(moved, vec![a.id]);

    assert_eq!(gateway.record(&user(), a.id).unwrap().tag, OTHER_TAG);
    assert!(!gateway.tags(&user()).contains(&"gym".to_string()));
}

#[tokio::test]
async fn test_tag_names_are_normalized() {
    let (_, store) = setup_store().await;

    assert_eq!(
        store.add_tag("  Gym ").await.unwrap(),
        TagAddition::Added("gym".to_string())
    );
    assert_eq!(
        store.add_tag("GYM").await.unwrap(),
        TagAddition::AlreadyPresent("gym".to_string())
    );
    let task = create_test_task(&store, "Swim", " GYM").await;
    assert_eq!(task.tag, "gym");
    assert!(matches!(store.add_tag("   ").await, Err(CoreError::InvalidInput(_))));
}

#[tokio::test]
async fn test_sentinel_tag_is_protected() {
    let (gateway, store) = setup_store().await;
    let before = store.list_tags();
    let calls = gateway.calls().len();

    let err = store.remove_tag("Other").await.unwrap_err();
    assert!(matches!(err, CoreError::ProtectedTag(_)));
    assert_eq!(store.list_tags(), before);
    assert_eq!(gateway.calls().len(), calls);
}

#[tokio::test]
async fn test_removing_unknown_tag_is_a_no_op() {
    let (gateway, store) = setup_store().await;
    let calls = gateway.calls().len();

    let result = store.remove_tag("chess").await.unwrap();
    assert!(!result.tag_removed);
    assert!(result.reassigned_task_ids.is_empty());
    assert_eq!(gateway.calls().len(), calls);
}

#[tokio::test]
async fn test_failed_tag_removal_rolls_back_cascade() {
    let (gateway, store) = setup_store().await;
    let task = create_test_task(&store, "Budget", "finance").await;
    let tags = store.list_tags();

    gateway.fail_next();
    let err = store.remove_tag("finance").await.unwrap_err();
    assert!(err.is_remote());

    assert_eq!(store.list_tags(), tags);
    assert_eq!(store.task(task.id).unwrap().tag, "finance");
}

#[tokio::test]
async fn test_failed_tag_addition_leaves_registry_unchanged() {
    let (gateway, store) = setup_store().await;
    let tags = store.list_tags();

    gateway.fail_next();
    assert!(store.add_tag("chess").await.unwrap_err().is_remote());
    assert_eq!(store.list_tags(), tags);
    assert!(matches!(
        store
            .add_task(NewTaskData {
                title: "Opening prep".to_string(),
                tag: "chess".to_string(),
                ..Default::default()
            })
            .await,
        Err(CoreError::InvalidTag(_))
    ));
}

#[tokio::test]
async fn test_toggle_twice_restores_value() {
    let (gateway, store) = setup_store().await;
    let task = create_test_task(&store, "Stretch", "health").await;

    assert!(store.toggle_completion(task.id).await.unwrap().completed);
    assert!(!store.toggle_completion(task.id).await.unwrap().completed);
    assert!(!gateway.record(&user(), task.id).unwrap().completed);
}

#[tokio::test]
async fn test_failed_update_rolls_back() {
    let (gateway, store) = setup_store().await;
    let task = create_test_task(&store, "Dentist", "health").await;

    gateway.fail_next();
    let err = store
        .update_task(
            task.id,
            UpdateTaskData {
                priority: Some(Priority::High),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();

    assert!(matches!(err, CoreError::Remote(GatewayError::Rejected(_))));
    assert_eq!(store.task(task.id).unwrap().priority, Priority::Medium);
    assert_eq!(store.pending_operations(), 0);
}

#[derive(Debug, Clone, Copy)]
enum Mutation {
    Toggle,
    Retitle,
    Retag,
    Delete,
    RemoveTag,
}

#[rstest]
#[case::toggle(Mutation::Toggle)]
#[case::retitle(Mutation::Retitle)]
#[case::retag(Mutation::Retag)]
#[case::delete(Mutation::Delete)]
#[case::remove_tag(Mutation::RemoveTag)]
#[tokio::test]
async fn test_failed_mutation_restores_state(#[case] mutation: Mutation) {
    let (gateway, store) = setup_store().await;
    let task = create_test_task(&store, "Groceries", "home").await;
    let tasks = store.snapshot();
    let tags = store.list_tags();

    gateway.fail_next();
    let failed = match mutation {
        Mutation::Toggle => store.toggle_completion(task.id).await.map(|_| ()),
        Mutation::Retitle => store
            .update_task(
                task.id,
                UpdateTaskData {
                    title: Some("Shopping".to_string()),
                    ..Default::default()
                },
            )
            .await
            .map(|_| ()),
        Mutation::Retag => store
            .update_task(task.id, UpdateTaskData::tag("work"))
            .await
            .map(|_| ()),
        Mutation::Delete => store.delete_task(task.id).await,
        Mutation::RemoveTag => store.remove_tag("home").await.map(|_| ()),
    };

    assert!(failed.unwrap_err().is_remote());
    assert_eq!(store.snapshot(), tasks);
    assert_eq!(store.list_tags(), tags);
    assert_eq!(store.pending_operations(), 0);
}

#[tokio::test]
async fn test_update_validation() {
    let (gateway, store) = setup_store().await;
    let task = create_test_task(&store, "Dentist", "health").await;
    let calls = gateway.calls().len();

    let blank_title = UpdateTaskData {
        title: Some("  ".to_string()),
        ..Default::default()
    };
    assert!(store.update_task(task.id, blank_title).await.unwrap_err().is_validation());
    assert!(matches!(
        store.update_task(task.id, UpdateTaskData::tag("chess")).await,
        Err(CoreError::InvalidTag(_))
    ));
    assert!(matches!(
        store.update_task(Uuid::now_v7(), UpdateTaskData::completed(true)).await,
        Err(CoreError::NotFound(_))
    ));
    // An empty update is a no-op.
    assert_eq!(
        store.update_task(task.id, UpdateTaskData::default()).await.unwrap(),
        task
    );
    assert_eq!(gateway.calls().len(), calls);
}

#[tokio::test]
async fn test_failed_create_removes_task() {
    let (gateway, store) = setup_store().await;

    gateway.fail_next();
    let err = store
        .add_task(NewTaskData {
            title: "Ghost".to_string(),
            tag: "work".to_string(),
            ..Default::default()
        })
        .await
        .unwrap_err();

    assert!(err.is_remote());
    assert!(store.snapshot().is_empty());
    assert!(gateway.records(&user()).is_empty());
}

#[tokio::test]
async fn test_delete_and_failed_delete() {
    let (gateway, store) = setup_store().await;
    let keep = create_test_task(&store, "Keep", "home").await;
    let drop = create_test_task(&store, "Drop", "home").await;

    store.delete_task(drop.id).await.unwrap();
    assert!(store.task(drop.id).is_none());
    assert!(gateway.record(&user(), drop.id).is_none());
    assert!(matches!(store.delete_task(drop.id).await, Err(CoreError::NotFound(_))));

    gateway.fail_next();
    assert!(store.delete_task(keep.id).await.unwrap_err().is_remote());
    assert_eq!(store.task(keep.id), Some(keep));
}

#[tokio::test]
async fn test_later_change_survives_earlier_failure() {
    let (gateway, store) = setup_store().await;
    let task = create_test_task(&store, "Essay", "education").await;

    gateway.close_gate();
    gateway.script([Outcome::Fail, Outcome::Succeed]);

    let raise = store.update_task(
        task.id,
        UpdateTaskData {
            priority: Some(Priority::High),
            ..Default::default()
        },
    );
    let rename = store.update_task(
        task.id,
        UpdateTaskData {
            title: Some("Essay draft".to_string()),
            ..Default::default()
        },
    );
    let driver = async {
        tokio::task::yield_now().await;
        // Both changes are visible while their calls are held.
        let shown = store.task(task.id).unwrap();
        assert_eq!(shown.priority, Priority::High);
        assert_eq!(shown.title, "Essay draft");
        assert_eq!(store.pending_operations(), 2);
        gateway.release(2);
    };

    let (raised, renamed, ()) = tokio::join!(raise, rename, driver);
    assert!(raised.unwrap_err().is_remote());
    let renamed = renamed.unwrap();

    assert_eq!(renamed.priority, Priority::Medium);
    assert_eq!(renamed.title, "Essay draft");
    assert_eq!(store.task(task.id), Some(renamed));
    let record = gateway.record(&user(), task.id).unwrap();
    assert_eq!(record.priority, Priority::Medium);
    assert_eq!(record.title, "Essay draft");
}

#[tokio::test]
async fn test_rapid_toggles_with_first_failing() {
    let (gateway, store) = setup_store().await;
    let task = create_test_task(&store, "Meditate", "health").await;

    gateway.close_gate();
    gateway.script([Outcome::Fail, Outcome::Succeed]);

    let driver = async {
        tokio::task::yield_now().await;
        assert!(!store.task(task.id).unwrap().completed);
        gateway.release(2);
    };
    let (first, second, ()) = tokio::join!(
        store.toggle_completion(task.id),
        store.toggle_completion(task.id),
        driver
    );

    assert!(first.unwrap_err().is_remote());
    // The second toggle was issued against `true` and asked for `false`.
    assert!(!second.unwrap().completed);
    assert!(!store.task(task.id).unwrap().completed);
    assert!(!gateway.record(&user(), task.id).unwrap().completed);

    // Remote calls went out in issue order.
    let updates: Vec<Option<bool>> = gateway
        .calls()
        .into_iter()
        .filter_map(|c| match c {
            GatewayCall::UpdateTask(_, changes) => Some(changes.completed),
            _ => None,
        })
        .collect();
    assert_eq!(updates, vec![Some(true), Some(false)]);
}

#[tokio::test]
async fn test_failed_create_aborts_queued_update() {
    let (gateway, store) = setup_store().await;

    gateway.close_gate();
    gateway.fail_next();

    let create = store.add_task(NewTaskData {
        title: "Doomed".to_string(),
        tag: "work".to_string(),
        ..Default::default()
    });
    let follow_up = async {
        tokio::task::yield_now().await;
        let id = store.snapshot()[0].id;
        let release = async {
            tokio::task::yield_now().await;
            gateway.release(1);
        };
        let (_, updated) = tokio::join!(release, store.toggle_completion(id));
        updated
    };

    let (created, updated) = tokio::join!(create, follow_up);
    assert!(created.unwrap_err().is_remote());
    assert!(matches!(updated, Err(CoreError::NotFound(_))));
    assert!(store.snapshot().is_empty());
    assert_eq!(store.pending_operations(), 0);
    assert!(!gateway
        .calls()
        .iter()
        .any(|c| matches!(c, GatewayCall::UpdateTask(..))));
}

#[tokio::test]
async fn test_remote_timeout_rolls_back() {
    let config = StoreConfig::default().with_remote_timeout(Duration::from_millis(50));
    let (gateway, store) = setup_store_with(config).await;
    let task = create_test_task(&store, "Call bank", "finance").await;

    gateway.script([Outcome::Hang]);
    let err = store.toggle_completion(task.id).await.unwrap_err();
    assert!(matches!(err, CoreError::Remote(GatewayError::Timeout(_))));
    assert!(!store.task(task.id).unwrap().completed);

    // The queue keeps moving after a timeout.
    assert!(store.toggle_completion(task.id).await.unwrap().completed);
}

#[tokio::test]
async fn test_cancelled_operation_rolls_back() {
    let (gateway, store) = setup_store().await;
    let task = create_test_task(&store, "Plan trip", "personal").await;

    gateway.script([Outcome::Hang]);
    let cancelled = tokio::time::timeout(
        Duration::from_millis(20),
        store.toggle_completion(task.id),
    )
    .await;
    assert!(cancelled.is_err());
    assert!(!store.task(task.id).unwrap().completed);
    assert_eq!(store.pending_operations(), 0);

    assert!(store.toggle_completion(task.id).await.unwrap().completed);
}

#[tokio::test]
async fn test_queued_operation_fails_after_teardown() {
    let (gateway, store) = setup_store().await;
    let task = create_test_task(&store, "Laundry", "home").await;

    gateway.close_gate();
    let driver = async {
        tokio::task::yield_now().await;
        store.teardown();
        gateway.open_gate();
    };
    let (first, second, ()) = tokio::join!(
        store.toggle_completion(task.id),
        store.toggle_completion(task.id),
        driver
    );

    // The first call was already at the remote store; the second never left.
    assert!(matches!(first, Err(CoreError::NoSession)));
    assert!(matches!(second, Err(CoreError::NoSession)));
    assert!(gateway.record(&user(), task.id).unwrap().completed);
    assert_eq!(
        gateway
            .calls()
            .iter()
            .filter(|c| matches!(c, GatewayCall::UpdateTask(..)))
            .count(),
        1
    );
}

#[tokio::test]
async fn test_filtering_through_the_store() {
    let (_, store) = setup_store().await;
    let today = date(2024, 1, 10);

    let tomorrow = store
        .add_task(NewTaskData {
            title: "Submit form".to_string(),
            tag: "work".to_string(),
            priority: Priority::High,
            deadline: Some(date(2024, 1, 11)),
            ..Default::default()
        })
        .await
        .unwrap();
    let overdue = store
        .add_task(NewTaskData {
            title: "Return book".to_string(),
            tag: "education".to_string(),
            deadline: Some(date(2024, 1, 5)),
            ..Default::default()
        })
        .await
        .unwrap();
    let done = create_test_task(&store, "Old chore", "home").await;
    store.toggle_completion(done.id).await.unwrap();

    let next_day = store.select(&FilterCriteria::pending().with_date(DateBucket::NextDay), today);
    assert_eq!(next_day, vec![tomorrow.clone()]);

    let past = store.select(&FilterCriteria::pending().with_date(DateBucket::AllPast), today);
    assert_eq!(past, vec![overdue]);

    let high = store.select(
        &FilterCriteria::pending().with_priority(PriorityFilter::Only(Priority::High)),
        today,
    );
    assert_eq!(high, vec![tomorrow]);

    let completed_home = store.select(
        &FilterCriteria::completed().with_tag(TagFilter::only("HOME").unwrap()),
        today,
    );
    assert_eq!(completed_home.len(), 1);
    assert_eq!(store.tasks_by_status(true).len(), 1);
    assert_eq!(store.tasks_by_status(false).len(), 2);
}

#[tokio::test]
async fn test_notifications_and_summary() {
    let (_, store) = setup_store().await;
    let day = date(2024, 3, 1);

    store
        .add_task(NewTaskData {
            title: "Standup".to_string(),
            tag: "work".to_string(),
            scheduled_date: Some(day),
            notifications_enabled: true,
            email_notification: Some("me@example.com".to_string()),
            notification_time: chrono::NaiveTime::from_hms_opt(9, 0, 0),
            ..Default::default()
        })
        .await
        .unwrap();
    store
        .add_task(NewTaskData {
            title: "Silent".to_string(),
            tag: "work".to_string(),
            scheduled_date: Some(day),
            ..Default::default()
        })
        .await
        .unwrap();

    let due = store.notifications_due(day);
    assert_eq!(due.len(), 1);
    assert_eq!(due[0].task_title, "Standup");
    assert!(store.notifications_due(date(2024, 3, 2)).is_empty());

    let summary = store.summary();
    assert_eq!(summary.total, 2);
    assert_eq!(summary.by_tag["work"], 2);
}

#[tokio::test]
async fn test_create_from_assistant_candidate() {
    let (_, store) = setup_store().await;
    let candidate = serde_json::from_str(
        r#"{"title": "Study GNN", "priority": "high", "tag": "Education", "deadline": "2024-01-20"}"#,
    )
    .unwrap();

    let task = store.create_task(candidate).await.unwrap();
    assert_eq!(task.priority, Priority::High);
    assert_eq!(task.tag, "education");
    assert_eq!(task.deadline, Some(date(2024, 1, 20)));

    let unknown_tag = serde_json::from_str(r#"{"title": "Gym", "tag": "fitness"}"#).unwrap();
    assert!(matches!(
        store.create_task(unknown_tag).await,
        Err(CoreError::InvalidTag(_))
    ));
}
