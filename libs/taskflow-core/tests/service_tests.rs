//! Entity service behaviour against the in-memory record service

use proptest::prelude::*;
use serde_json::json;
use std::sync::Arc;
use taskflow_core::test_utils::{CallKind, InMemoryRecordClient, InjectedFailure};
use taskflow_core::{
    FetchOptions, NaiveDate, PagingInfo, ProjectDraft, ProjectService, RecordClient, TaskDraft,
    TaskPriority, TaskService, TaskStatus, TaskflowError,
};

fn services(client: &Arc<InMemoryRecordClient>) -> (TaskService, ProjectService) {
    let shared: Arc<dyn RecordClient> = Arc::clone(client) as Arc<dyn RecordClient>;
    (
        TaskService::new(Arc::clone(&shared)),
        ProjectService::new(shared),
    )
}

// ============================================================================
// Fetch
// ============================================================================

#[tokio::test]
async fn test_fetch_normalizes_records() {
    let client = Arc::new(InMemoryRecordClient::new());
    let id = client.insert(
        "task",
        json!({"title": "X", "Tags": "a,b", "due_date": "2024-01-01"}),
    );
    let (tasks, _) = services(&client);

    let fetched = tasks.fetch_all(FetchOptions::default()).await.unwrap();

    assert_eq!(fetched.len(), 1);
    let task = &fetched[0];
    assert_eq!(task.id, id.to_string());
    assert_eq!(task.tags, vec!["a", "b"]);
    assert_eq!(task.due_date, NaiveDate::from_ymd_opt(2024, 1, 1));
    assert_eq!(task.status, TaskStatus::Todo);
    assert_eq!(task.priority, TaskPriority::Medium);
}

#[tokio::test]
async fn test_fetch_sends_default_params() {
    let client = Arc::new(InMemoryRecordClient::new());
    let (tasks, projects) = services(&client);

    tasks.fetch_all(FetchOptions::default()).await.unwrap();
    projects.fetch_all(FetchOptions::default()).await.unwrap();

    let fetches = client.calls_of(CallKind::Fetch);
    assert_eq!(fetches[0].table, "task");
    assert_eq!(
        fetches[0].payload["orderBy"],
        json!([{"fieldName": "CreatedOn", "SortType": "DESC"}])
    );
    assert_eq!(
        fetches[0].payload["pagingInfo"],
        json!({"limit": 100, "offset": 0})
    );
    assert_eq!(fetches[1].table, "project");
    assert_eq!(fetches[1].payload["pagingInfo"]["limit"], 50);
}

#[tokio::test]
async fn test_fetch_paging_override() {
    let client = Arc::new(InMemoryRecordClient::with_sample_data());
    let (tasks, _) = services(&client);

    let page = tasks
        .fetch_all(FetchOptions {
            paging_info: Some(PagingInfo {
                limit: 2,
                offset: 1,
            }),
            ..FetchOptions::default()
        })
        .await
        .unwrap();

    assert_eq!(page.len(), 2);
    assert_eq!(page[0].title, "Implement push notifications");
}

#[tokio::test]
async fn test_fetch_failure_propagates() {
    let client = Arc::new(InMemoryRecordClient::new());
    let (tasks, _) = services(&client);

    client.fail_next(InjectedFailure::Transport("dns failure".to_string()));
    let error = tasks.fetch_all(FetchOptions::default()).await.unwrap_err();
    assert!(matches!(error, TaskflowError::Transport(_)));

    client.fail_next(InjectedFailure::Unsuccessful("no such table".to_string()));
    let error = tasks.fetch_all(FetchOptions::default()).await.unwrap_err();
    assert_eq!(error.to_string(), "Remote service error: no such table");
}

#[tokio::test]
async fn test_list_by_project() {
    let client = Arc::new(InMemoryRecordClient::with_sample_data());
    let (tasks, _) = services(&client);

    let website = tasks.list_by_project("1").await.unwrap();
    assert_eq!(website.len(), 2);
    assert!(website.iter().all(|t| t.project_id.as_deref() == Some("1")));

    client.clear_calls();
    assert!(matches!(
        tasks.list_by_project("website").await,
        Err(TaskflowError::Validation { .. })
    ));
    assert_eq!(client.call_count(), 0);
}

#[tokio::test]
async fn test_get_by_id() {
    let client = Arc::new(InMemoryRecordClient::with_sample_data());
    let (_, projects) = services(&client);

    let project = projects.require("2").await.unwrap();
    assert_eq!(project.name, "Mobile App");
    assert_eq!(project.color.as_deref(), Some("#10b981"));

    assert!(projects
        .get_by_id("404", FetchOptions::default())
        .await
        .unwrap()
        .is_none());
    assert!(matches!(
        projects.require("404").await,
        Err(TaskflowError::ProjectNotFound { .. })
    ));
}

#[tokio::test]
async fn test_get_by_id_refusal_is_none() {
    let client = Arc::new(InMemoryRecordClient::with_sample_data());
    let (tasks, _) = services(&client);

    client.fail_next(InjectedFailure::Unsuccessful("invalid public key".to_string()));
    let task = tasks.get_by_id("4", FetchOptions::default()).await.unwrap();
    assert!(task.is_none());

    client.fail_next(InjectedFailure::Transport("offline".to_string()));
    assert!(tasks.get_by_id("4", FetchOptions::default()).await.is_err());

    assert!(tasks.get_by_id("4", FetchOptions::default()).await.unwrap().is_some());
}

// ============================================================================
// Writes
// ============================================================================

#[tokio::test]
async fn test_create_drops_non_numeric_lookups() {
    let client = Arc::new(InMemoryRecordClient::new());
    let (tasks, _) = services(&client);

    let created = tasks
        .create(&TaskDraft {
            title: "Lookups".to_string(),
            project_id: Some("abc".to_string()),
            owner: Some("12".to_string()),
            ..TaskDraft::default()
        })
        .await
        .unwrap()
        .unwrap();

    let payload = &client.calls_of(CallKind::Create)[0].payload[0];
    assert!(payload.get("project_id").is_none());
    assert_eq!(payload["Owner"], 12);
    assert!(created.project_id.is_none());
}

#[tokio::test]
async fn test_create_partial_failure_is_error() {
    let client = Arc::new(InMemoryRecordClient::new());
    let (_, projects) = services(&client);

    client.fail_next(InjectedFailure::RecordErrors(vec![
        ("Name".to_string(), "is required".to_string()),
        ("color".to_string(), "invalid".to_string()),
    ]));
    let error = projects.create(&ProjectDraft::default()).await.unwrap_err();

    match error {
        TaskflowError::BatchFailure {
            operation,
            failures,
        } => {
            assert_eq!(operation, "create project");
            assert_eq!(failures[0].summary(), "Name: is required; color: invalid");
        }
        other => panic!("Expected BatchFailure, got {other:?}"),
    }
}

#[tokio::test]
async fn test_update_missing_record_is_batch_failure() {
    let client = Arc::new(InMemoryRecordClient::new());
    let (tasks, _) = services(&client);

    let error = tasks
        .update(
            "41",
            &TaskDraft {
                title: "Ghost".to_string(),
                ..TaskDraft::default()
            },
        )
        .await
        .unwrap_err();

    match error {
        TaskflowError::BatchFailure { failures, .. } => {
            assert_eq!(failures[0].record_id, Some(41));
            assert_eq!(failures[0].summary(), "Record does not exist");
        }
        other => panic!("Expected BatchFailure, got {other:?}"),
    }
}

#[tokio::test]
async fn test_invalid_id_is_rejected_before_sending() {
    let client = Arc::new(InMemoryRecordClient::new());
    let (tasks, _) = services(&client);

    assert!(matches!(
        tasks.delete("task-1").await,
        Err(TaskflowError::InvalidId { .. })
    ));
    assert_eq!(client.call_count(), 0);
}

#[tokio::test]
async fn test_delete_single() {
    let client = Arc::new(InMemoryRecordClient::new());
    let id = client.insert("task", json!({"title": "bye"})).to_string();
    let (tasks, _) = services(&client);

    assert!(tasks.delete(&id).await.unwrap());
    assert_eq!(client.record_count("task"), 0);

    let error = tasks.delete(&id).await.unwrap_err();
    assert!(matches!(error, TaskflowError::BatchFailure { .. }));
}

#[tokio::test]
async fn test_delete_many_whole_call_failure_raises() {
    let client = Arc::new(InMemoryRecordClient::new());
    let (tasks, _) = services(&client);

    client.fail_next(InjectedFailure::Unsuccessful("maintenance".to_string()));
    let result = tasks.delete_many(&["1".to_string()]).await;
    assert!(matches!(result, Err(TaskflowError::Remote { .. })));
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn prop_delete_many_counts_individual_successes(
        existing in 0usize..6,
        missing in 0usize..6,
    ) {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap();

        runtime.block_on(async {
            let client = Arc::new(InMemoryRecordClient::new());
            let mut ids: Vec<String> = (0..existing)
                .map(|i| client.insert("task", json!({"title": format!("t{i}")})).to_string())
                .collect();
            ids.extend((0..missing).map(|i| (10_000 + i).to_string()));

            let (tasks, _) = services(&client);
            let result = tasks.delete_many(&ids).await.unwrap();

            prop_assert!(result.count() <= ids.len());
            prop_assert_eq!(result.count(), existing);
            prop_assert_eq!(result.failed.len(), missing);
            prop_assert_eq!(client.record_count("task"), 0);
            Ok(())
        })?;
    }
}
