//! Per-user chaining: same-user order, cross-user independence, failure
//! tolerance.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use futures::future::join_all;
use tallybot::services::serializer::PerUserSerializer;

#[tokio::test]
async fn test_same_user_operations_run_in_submission_order() {
    let serializer = Arc::new(PerUserSerializer::new());
    let log = Arc::new(Mutex::new(Vec::new()));

    let mut handles = Vec::new();
    for i in 0..16u64 {
        let ticket = serializer.enqueue(1);
        let serializer = Arc::clone(&serializer);
        let log = Arc::clone(&log);
        handles.push(tokio::spawn(async move {
            serializer
                .complete(ticket, async move {
                    // Later submissions sleeping less would expose any
                    // ordering violation immediately.
                    tokio::time::sleep(Duration::from_millis(16 - i)).await;
                    log.lock().unwrap().push(i);
                })
                .await;
        }));
    }
    join_all(handles).await;

    assert_eq!(*log.lock().unwrap(), (0..16).collect::<Vec<u64>>());
    assert_eq!(serializer.active_users(), 0);
}

#[tokio::test]
async fn test_different_users_proceed_independently() {
    let serializer = Arc::new(PerUserSerializer::new());
    let log = Arc::new(Mutex::new(Vec::new()));

    let slow_ticket = serializer.enqueue(1);
    let fast_ticket = serializer.enqueue(2);

    let slow = {
        let serializer = Arc::clone(&serializer);
        let log = Arc::clone(&log);
        tokio::spawn(async move {
            serializer
                .complete(slow_ticket, async move {
                    tokio::time::sleep(Duration::from_millis(200)).await;
                    log.lock().unwrap().push("slow");
                })
                .await;
        })
    };
    let fast = {
        let serializer = Arc::clone(&serializer);
        let log = Arc::clone(&log);
        tokio::spawn(async move {
            serializer
                .complete(fast_ticket, async move {
                    log.lock().unwrap().push("fast");
                })
                .await;
        })
    };

    fast.await.unwrap();
    // User 2 finished while user 1 is still sleeping.
    assert_eq!(*log.lock().unwrap(), vec!["fast"]);
    slow.await.unwrap();
    assert_eq!(*log.lock().unwrap(), vec!["fast", "slow"]);
}

#[tokio::test]
async fn test_successor_runs_after_a_panicking_predecessor() {
    let serializer = Arc::new(PerUserSerializer::new());

    let first = serializer.enqueue(1);
    let second = serializer.enqueue(1);

    let panicking = {
        let serializer = Arc::clone(&serializer);
        tokio::spawn(async move {
            serializer
                .complete(first, async {
                    panic!("handler blew up");
                })
                .await
        })
    };
    assert!(panicking.await.is_err());

    // The chain is not poisoned: the next operation still executes.
    let ran = {
        let serializer = Arc::clone(&serializer);
        tokio::spawn(async move { serializer.complete(second, async { true }).await })
    };
    assert!(ran.await.unwrap());
    assert_eq!(serializer.active_users(), 0);
}

#[tokio::test]
async fn test_tail_table_is_evicted_when_chains_drain() {
    let serializer = PerUserSerializer::new();

    for user in 0..5 {
        serializer.run(user, async {}).await;
    }

    assert_eq!(serializer.active_users(), 0);
}
