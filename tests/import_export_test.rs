//! Bulk import of work logs and the data export.

mod helpers;

use helpers::database::{setup_test_db, teardown_test_db};
use helpers::{build_services, clock_at, create_user, date};
use tallybot::DomainError;

#[tokio::test]
async fn test_import_replaces_only_the_named_dates() {
    let pool = setup_test_db().await;
    let services = build_services(&pool, clock_at(date(2023, 6, 10)));
    let user = create_user(&services, 100).await;

    let task = services.tasks.create_task(&user, "Work", 30).await.unwrap();
    services.tasks.complete_task(&user, task.id).await.unwrap();

    services
        .tasks
        .import_work_logs(
            &user,
            r#"{
                "2023-06-09": [{"name": "Imported", "reward": 50}],
                "2023-06-10": [{"name": "Rewritten", "reward": 80}]
            }"#,
        )
        .await
        .unwrap();

    // The completion on the 10th was replaced by the imported entry.
    let entries = services.tasks.work_logs_for_selected_date(&user).await.unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].name, "Rewritten");
    assert_eq!(entries[0].reward, 80);

    let stats = services.tasks.day_stats(&user).await.unwrap();
    assert_eq!(stats.day_score, 80);

    teardown_test_db(pool).await;
}

#[tokio::test]
async fn test_import_rejects_malformed_payloads() {
    let pool = setup_test_db().await;
    let services = build_services(&pool, clock_at(date(2023, 6, 10)));
    let user = create_user(&services, 100).await;

    for payload in [
        "not json at all",
        r#"{"2023-06-10": "not a list"}"#,
        r#"{"tenth of june": [{"name": "x", "reward": 1}]}"#,
        r#"{"2023-06-10": [{"name": "x"}]}"#,
    ] {
        let err = services.tasks.import_work_logs(&user, payload).await.unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)), "payload: {payload}");
    }

    // Nothing was written by any of the rejected attempts.
    assert!(services.tasks.work_logs_for_selected_date(&user).await.unwrap().is_empty());

    teardown_test_db(pool).await;
}

#[tokio::test]
async fn test_export_contains_tasks_and_logs_by_date() {
    let pool = setup_test_db().await;
    let services = build_services(&pool, clock_at(date(2023, 6, 10)));
    let user = create_user(&services, 100).await;

    let task = services.tasks.create_task(&user, "Work", 140).await.unwrap();
    services.tasks.complete_task(&user, task.id).await.unwrap();

    let files = services.tasks.export_data(&user).await.unwrap();
    assert_eq!(files.len(), 2);

    let tasks_json: serde_json::Value = serde_json::from_str(&files[0].content).unwrap();
    assert_eq!(tasks_json, serde_json::json!([{"name": "Work", "reward": 140}]));

    let logs_json: serde_json::Value = serde_json::from_str(&files[1].content).unwrap();
    assert_eq!(logs_json["2023-06-10"][0]["name"], "Work");
    assert_eq!(logs_json["2023-06-10"][0]["reward"], 140);
    // The derived bonus is exported under its display name.
    assert_eq!(logs_json["2023-06-11"][0]["reward"], 20);

    teardown_test_db(pool).await;
}

#[tokio::test]
async fn test_work_logs_survive_task_deletion_with_snapshot() {
    let pool = setup_test_db().await;
    let services = build_services(&pool, clock_at(date(2023, 6, 10)));
    let user = create_user(&services, 100).await;

    let task = services.tasks.create_task(&user, "Ephemeral", 30).await.unwrap();
    services.tasks.complete_task(&user, task.id).await.unwrap();
    services.tasks.delete_task(&user, task.id).await.unwrap();

    let entries = services.tasks.work_logs_for_selected_date(&user).await.unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].name, "Ephemeral");
    assert_eq!(entries[0].reward, 30);
    assert_eq!(entries[0].task_id, None);

    teardown_test_db(pool).await;
}
