use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

pub type BoardGuard = OwnedMutexGuard<()>;

/// In-process advisory locks, one per board id.
///
/// Mutating store operations hold the lock of every board they write to, so
/// requests served by one process never interleave their writes on a board.
/// Writers in other processes are not covered and remain last-writer-wins.
#[derive(Debug, Default)]
pub struct BoardLocks {
    locks: Mutex<HashMap<String, Arc<AsyncMutex<()>>>>,
}

impl BoardLocks {
    pub fn new() -> Self {
        Self::default()
    }

    fn handle(&self, board_id: &str) -> Arc<AsyncMutex<()>> {
        self.locks
            .lock()
            .entry(board_id.to_string())
            .or_default()
            .clone()
    }

    pub async fn lock(&self, board_id: &str) -> BoardGuard {
        self.handle(board_id).lock_owned().await
    }

    /// Drop the lock of a board that no longer exists under `board_id`.
    ///
    /// Call while holding that board's guard; the entry is kept when other
    /// tasks are still queued on it.
    pub fn forget(&self, board_id: &str) {
        let mut locks = self.locks.lock();
        if locks
            .get(board_id)
            .is_some_and(|lock| Arc::strong_count(lock) <= 2)
        {
            locks.remove(board_id);
        }
    }

    pub fn len(&self) -> usize {
        self.locks.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Lock two boards in id order so concurrent pairs cannot deadlock.
    pub async fn lock_pair(&self, a: &str, b: &str) -> (BoardGuard, Option<BoardGuard>) {
        if a == b {
            return (self.lock(a).await, None);
        }
        let (first, second) = if a < b { (a, b) } else { (b, a) };
        let first = self.lock(first).await;
        let second = self.lock(second).await;
        (first, Some(second))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn test_same_board_is_exclusive() {
        let locks = Arc::new(BoardLocks::new());
        let guard = locks.lock("alpha").await;

        let contender = {
            let locks = locks.clone();
            tokio::spawn(async move {
                let _guard = locks.lock("alpha").await;
            })
        };
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(!contender.is_finished());

        drop(guard);
        tokio::time::timeout(Duration::from_secs(1), contender)
            .await
            .unwrap()
            .unwrap();
    }

    #[tokio::test]
    async fn test_distinct_boards_do_not_block() {
        let locks = BoardLocks::new();
        let _alpha = locks.lock("alpha").await;
        let beta = tokio::time::timeout(Duration::from_millis(100), locks.lock("beta")).await;
        assert!(beta.is_ok());
    }

    #[tokio::test]
    async fn test_forget_drops_idle_entry() {
        let locks = BoardLocks::new();
        let guard = locks.lock("alpha").await;
        locks.forget("alpha");
        drop(guard);
        assert!(locks.is_empty());
    }

    #[tokio::test]
    async fn test_forget_keeps_entry_with_waiters() {
        let locks = Arc::new(BoardLocks::new());
        let guard = locks.lock("alpha").await;

        let waiter = {
            let locks = locks.clone();
            tokio::spawn(async move {
                let _guard = locks.lock("alpha").await;
            })
        };
        tokio::time::sleep(Duration::from_millis(20)).await;
        locks.forget("alpha");
        assert_eq!(locks.len(), 1);

        drop(guard);
        tokio::time::timeout(Duration::from_secs(1), waiter)
            .await
            .unwrap()
            .unwrap();
    }

    #[tokio::test]
    async fn test_lock_pair_same_board() {
        let locks = BoardLocks::new();
        let (_first, second) = locks.lock_pair("alpha", "alpha").await;
        assert!(second.is_none());
    }
}
