//! Per-user operation serialization.
//!
//! All mutating operations for one user must execute in submission order and
//! never concurrently, while different users proceed independently. Each
//! user's chain is represented only by its tail: enqueueing parks a receiver
//! in the table for whoever arrives next and takes over the previous tail to
//! await. An operation that fails or is abandoned still releases its
//! successor.

use std::collections::HashMap;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

use tokio::sync::oneshot;

struct ChainTail {
    generation: u64,
    done: oneshot::Receiver<()>,
}

/// A claimed slot in one user's chain. Obtained synchronously at submission
/// time, so chain order is arrival order even when execution is spawned.
pub struct Ticket {
    user_id: i64,
    generation: u64,
    predecessor: Option<oneshot::Receiver<()>>,
    done_tx: oneshot::Sender<()>,
}

#[derive(Default)]
pub struct PerUserSerializer {
    tails: Mutex<HashMap<i64, ChainTail>>,
    generations: AtomicU64,
}

impl PerUserSerializer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Claim the next slot in `user_id`'s chain. Synchronous: the tail swap
    /// happens before this returns, which is what pins submission order.
    pub fn enqueue(&self, user_id: i64) -> Ticket {
        let (done_tx, done_rx) = oneshot::channel();
        let generation = self.generations.fetch_add(1, Ordering::Relaxed);

        let mut tails = self.tails.lock().expect("serializer lock poisoned");
        let predecessor = tails
            .insert(user_id, ChainTail { generation, done: done_rx })
            .map(|tail| tail.done);

        Ticket { user_id, generation, predecessor, done_tx }
    }

    /// Wait for the ticket's predecessor, run `op`, then release the
    /// successor. The predecessor having failed (dropped its sender) does not
    /// hold this operation back.
    pub async fn complete<F, T>(&self, ticket: Ticket, op: F) -> T
    where
        F: Future<Output = T>,
    {
        if let Some(done) = ticket.predecessor {
            let _ = done.await;
        }

        let result = op.await;

        // Evict the tail entry if nothing was chained after us, so the table
        // only holds users with in-flight work.
        {
            let mut tails = self.tails.lock().expect("serializer lock poisoned");
            if tails
                .get(&ticket.user_id)
                .is_some_and(|tail| tail.generation == ticket.generation)
            {
                tails.remove(&ticket.user_id);
            }
        }
        let _ = ticket.done_tx.send(());

        result
    }

    /// Enqueue and run in one call, for callers that await in place.
    pub async fn run<F, T>(&self, user_id: i64, op: F) -> T
    where
        F: Future<Output = T>,
    {
        let ticket = self.enqueue(user_id);
        self.complete(ticket, op).await
    }

    /// Number of users with an in-flight chain (the tail table size).
    pub fn active_users(&self) -> usize {
        self.tails.lock().expect("serializer lock poisoned").len()
    }
}
