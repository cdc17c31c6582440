//! Dense-unique task position maintenance under create/delete/move/rewrite.

mod helpers;

use helpers::database::{setup_test_db, teardown_test_db};
use helpers::{build_services, clock_at, create_user, date, positions};
use tallybot::DomainError;

#[tokio::test]
async fn test_create_assigns_next_position() {
    let pool = setup_test_db().await;
    let services = build_services(&pool, clock_at(date(2023, 6, 10)));
    let user = create_user(&services, 100).await;

    let first = services.tasks.create_task(&user, "Read", 20).await.unwrap();
    let second = services.tasks.create_task(&user, "Walk", 30).await.unwrap();

    assert_eq!(first.position, 1);
    assert_eq!(second.position, 2);

    teardown_test_db(pool).await;
}

#[tokio::test]
async fn test_create_duplicate_name_rejected() {
    let pool = setup_test_db().await;
    let services = build_services(&pool, clock_at(date(2023, 6, 10)));
    let user = create_user(&services, 100).await;

    services.tasks.create_task(&user, "Read", 20).await.unwrap();
    let err = services.tasks.create_task(&user, "Read", 30).await.unwrap_err();

    assert!(matches!(err, DomainError::Validation(_)));
    assert_eq!(positions(&services, &user).await, vec![1]);

    teardown_test_db(pool).await;
}

#[tokio::test]
async fn test_same_name_allowed_for_different_owners() {
    let pool = setup_test_db().await;
    let services = build_services(&pool, clock_at(date(2023, 6, 10)));
    let alice = create_user(&services, 100).await;
    let bob = create_user(&services, 200).await;

    services.tasks.create_task(&alice, "Read", 20).await.unwrap();
    services.tasks.create_task(&bob, "Read", 20).await.unwrap();

    assert_eq!(positions(&services, &alice).await, vec![1]);
    assert_eq!(positions(&services, &bob).await, vec![1]);

    teardown_test_db(pool).await;
}

#[tokio::test]
async fn test_delete_closes_the_gap() {
    let pool = setup_test_db().await;
    let services = build_services(&pool, clock_at(date(2023, 6, 10)));
    let user = create_user(&services, 100).await;

    services.tasks.create_task(&user, "a", 10).await.unwrap();
    let b = services.tasks.create_task(&user, "b", 10).await.unwrap();
    services.tasks.create_task(&user, "c", 10).await.unwrap();

    services.tasks.delete_task(&user, b.id).await.unwrap();

    let tasks = services.tasks.tasks(&user).await.unwrap();
    assert_eq!(
        tasks.iter().map(|t| (t.name.as_str(), t.position)).collect::<Vec<_>>(),
        vec![("a", 1), ("c", 2)]
    );

    // Deleting again is a quiet no-op: the button was simply stale.
    services.tasks.delete_task(&user, b.id).await.unwrap();
    assert_eq!(positions(&services, &user).await, vec![1, 2]);

    teardown_test_db(pool).await;
}

#[tokio::test]
async fn test_move_last_to_front() {
    let pool = setup_test_db().await;
    let services = build_services(&pool, clock_at(date(2023, 6, 10)));
    let user = create_user(&services, 100).await;

    let task1 = services.tasks.create_task(&user, "one", 10).await.unwrap();
    let task2 = services.tasks.create_task(&user, "two", 10).await.unwrap();
    let task3 = services.tasks.create_task(&user, "three", 10).await.unwrap();

    services.tasks.move_task(&user, task3.id, 1).await.unwrap();

    let tasks = services.tasks.tasks(&user).await.unwrap();
    let by_id = |id: i64| tasks.iter().find(|t| t.id == id).unwrap().position;
    assert_eq!(by_id(task3.id), 1);
    assert_eq!(by_id(task1.id), 2);
    assert_eq!(by_id(task2.id), 3);

    teardown_test_db(pool).await;
}

#[tokio::test]
async fn test_move_to_later_position() {
    let pool = setup_test_db().await;
    let services = build_services(&pool, clock_at(date(2023, 6, 10)));
    let user = create_user(&services, 100).await;

    let a = services.tasks.create_task(&user, "a", 10).await.unwrap();
    let _b = services.tasks.create_task(&user, "b", 10).await.unwrap();
    let _c = services.tasks.create_task(&user, "c", 10).await.unwrap();

    services.tasks.move_task(&user, a.id, 3).await.unwrap();

    let tasks = services.tasks.tasks(&user).await.unwrap();
    assert_eq!(
        tasks.iter().map(|t| t.name.as_str()).collect::<Vec<_>>(),
        vec!["b", "c", "a"]
    );
    assert_eq!(positions(&services, &user).await, vec![1, 2, 3]);

    teardown_test_db(pool).await;
}

#[tokio::test]
async fn test_move_to_n_plus_one_means_the_end() {
    let pool = setup_test_db().await;
    let services = build_services(&pool, clock_at(date(2023, 6, 10)));
    let user = create_user(&services, 100).await;

    let a = services.tasks.create_task(&user, "a", 10).await.unwrap();
    let _b = services.tasks.create_task(&user, "b", 10).await.unwrap();
    let _c = services.tasks.create_task(&user, "c", 10).await.unwrap();

    services.tasks.move_task(&user, a.id, 4).await.unwrap();

    let tasks = services.tasks.tasks(&user).await.unwrap();
    assert_eq!(
        tasks.iter().map(|t| (t.name.as_str(), t.position)).collect::<Vec<_>>(),
        vec![("b", 1), ("c", 2), ("a", 3)]
    );

    teardown_test_db(pool).await;
}

#[tokio::test]
async fn test_move_rejects_out_of_range_positions() {
    let pool = setup_test_db().await;
    let services = build_services(&pool, clock_at(date(2023, 6, 10)));
    let user = create_user(&services, 100).await;

    let a = services.tasks.create_task(&user, "a", 10).await.unwrap();
    services.tasks.create_task(&user, "b", 10).await.unwrap();

    for bad in [0, -1, 4] {
        let err = services.tasks.move_task(&user, a.id, bad).await.unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)), "position {bad}");
    }
    assert_eq!(positions(&services, &user).await, vec![1, 2]);

    teardown_test_db(pool).await;
}

#[tokio::test]
async fn test_move_to_own_position_is_a_noop() {
    let pool = setup_test_db().await;
    let services = build_services(&pool, clock_at(date(2023, 6, 10)));
    let user = create_user(&services, 100).await;

    let a = services.tasks.create_task(&user, "a", 10).await.unwrap();
    services.tasks.create_task(&user, "b", 10).await.unwrap();

    services.tasks.move_task(&user, a.id, 1).await.unwrap();

    let tasks = services.tasks.tasks(&user).await.unwrap();
    assert_eq!(
        tasks.iter().map(|t| t.name.as_str()).collect::<Vec<_>>(),
        vec!["a", "b"]
    );

    teardown_test_db(pool).await;
}

#[tokio::test]
async fn test_bulk_rewrite_replaces_the_set() {
    let pool = setup_test_db().await;
    let services = build_services(&pool, clock_at(date(2023, 6, 10)));
    let user = create_user(&services, 100).await;

    let keep = services.tasks.create_task(&user, "keep", 10).await.unwrap();
    services.tasks.create_task(&user, "drop", 10).await.unwrap();

    services
        .tasks
        .bulk_rewrite(
            &user,
            r#"[{"name": "new", "reward": 5}, {"name": "keep", "reward": 40}]"#,
        )
        .await
        .unwrap();

    let tasks = services.tasks.tasks(&user).await.unwrap();
    assert_eq!(
        tasks.iter().map(|t| (t.name.as_str(), t.position, t.reward)).collect::<Vec<_>>(),
        vec![("new", 1, 5), ("keep", 2, 40)]
    );

    // Matching by name preserved the retained task's identity.
    let kept = tasks.iter().find(|t| t.name == "keep").unwrap();
    assert_eq!(kept.id, keep.id);

    teardown_test_db(pool).await;
}

#[tokio::test]
async fn test_bulk_rewrite_duplicate_name_rejected_and_nothing_changes() {
    let pool = setup_test_db().await;
    let services = build_services(&pool, clock_at(date(2023, 6, 10)));
    let user = create_user(&services, 100).await;

    services.tasks.create_task(&user, "original", 10).await.unwrap();

    let err = services
        .tasks
        .bulk_rewrite(
            &user,
            r#"[{"name": "twin", "reward": 5}, {"name": "twin", "reward": 6}]"#,
        )
        .await
        .unwrap_err();
    assert!(matches!(err, DomainError::Validation(_)));

    let tasks = services.tasks.tasks(&user).await.unwrap();
    assert_eq!(
        tasks.iter().map(|t| (t.name.as_str(), t.position, t.reward)).collect::<Vec<_>>(),
        vec![("original", 1, 10)]
    );

    teardown_test_db(pool).await;
}

#[tokio::test]
async fn test_bulk_rewrite_invalid_json_rejected() {
    let pool = setup_test_db().await;
    let services = build_services(&pool, clock_at(date(2023, 6, 10)));
    let user = create_user(&services, 100).await;

    let err = services.tasks.bulk_rewrite(&user, "not json").await.unwrap_err();
    assert!(matches!(err, DomainError::Validation(_)));

    teardown_test_db(pool).await;
}

mod position_invariant_property {
    use super::helpers::database::setup_test_db;
    use super::helpers::{build_services, clock_at, create_user, date};
    use proptest::prelude::*;

    #[derive(Debug, Clone)]
    enum Op {
        Create,
        Delete(usize),
        Move { task: usize, to: i64 },
    }

    fn op_strategy() -> impl Strategy<Value = Op> {
        prop_oneof![
            3 => Just(Op::Create),
            1 => (0usize..8).prop_map(Op::Delete),
            2 => ((0usize..8), (-1i64..10)).prop_map(|(task, to)| Op::Move { task, to }),
        ]
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(32))]

        /// After any sequence of create/delete/move operations the positions
        /// are exactly `1..=N`, whatever mix of valid and invalid inputs the
        /// user threw at it.
        #[test]
        fn positions_stay_dense(ops in prop::collection::vec(op_strategy(), 0..24)) {
            let rt = tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()
                .expect("runtime");

            rt.block_on(async move {
                let pool = setup_test_db().await;
                let services = build_services(&pool, clock_at(date(2023, 6, 10)));
                let user = create_user(&services, 100).await;

                let mut created = 0usize;
                for op in ops {
                    let tasks = services.tasks.tasks(&user).await.unwrap();
                    match op {
                        Op::Create => {
                            created += 1;
                            services
                                .tasks
                                .create_task(&user, &format!("task-{created}"), 10)
                                .await
                                .unwrap();
                        }
                        Op::Delete(index) => {
                            // Out-of-range picks exercise the stale-id no-op.
                            let id = tasks.get(index).map_or(9_999, |t| t.id);
                            services.tasks.delete_task(&user, id).await.unwrap();
                        }
                        Op::Move { task, to } => {
                            let Some(task) = tasks.get(task) else { continue };
                            // Invalid targets must be rejected without damage.
                            let _ = services.tasks.move_task(&user, task.id, to).await;
                        }
                    }
                }

                let mut got: Vec<i64> = services
                    .tasks
                    .tasks(&user)
                    .await
                    .unwrap()
                    .iter()
                    .map(|t| t.position)
                    .collect();
                got.sort_unstable();
                let want: Vec<i64> = (1..=got.len() as i64).collect();
                prop_assert_eq!(got, want);

                pool.close().await;
                Ok(())
            })?;
        }
    }
}
