use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::{Mutex, OwnedMutexGuard};
use uuid::Uuid;

// ============================================================================
// Per-user Serialisation
// ============================================================================
//
// All mutations of one user's cart run one at a time. Users never wait on
// each other. Entries nobody holds are pruned once the map grows past
// `PRUNE_THRESHOLD`.
//
// ============================================================================

const PRUNE_THRESHOLD: usize = 1024;

#[derive(Debug, Clone, Default)]
pub struct UserLocks {
    locks: Arc<Mutex<HashMap<Uuid, Arc<Mutex<()>>>>>,
}

impl UserLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait for exclusive access to `user_id`'s cart. Released on drop.
    pub async fn acquire(&self, user_id: Uuid) -> OwnedMutexGuard<()> {
        let lock = {
            let mut locks = self.locks.lock().await;

            if locks.len() >= PRUNE_THRESHOLD {
                locks.retain(|id, lock| *id == user_id || Arc::strong_count(lock) > 1);
            }

            Arc::clone(locks.entry(user_id).or_default())
        };

        lock.lock_owned().await
    }

    #[cfg(test)]
    async fn tracked(&self) -> usize {
        self.locks.lock().await.len()
    }
}
