use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

/// Per-document async locks for read-modify-write sequences within this
/// process. Idle entries are dropped on the next acquisition.
#[derive(Clone, Default)]
pub(super) struct KeyedLocks {
    entries: Arc<Mutex<HashMap<String, Arc<AsyncMutex<()>>>>>,
}

impl KeyedLocks {
    pub(super) async fn lock(&self, key: &str) -> OwnedMutexGuard<()> {
        let entry = {
            let mut entries = match self.entries.lock() {
                Ok(entries) => entries,
                Err(poisoned) => poisoned.into_inner(),
            };
            entries.retain(|existing_key, lock| {
                existing_key == key || Arc::strong_count(lock) > 1
            });
            Arc::clone(entries.entry(key.to_string()).or_default())
        };

        entry.lock_owned().await
    }

    #[cfg(test)]
    fn tracked_keys(&self) -> usize {
        self.entries
            .lock()
            .expect("keyed lock mutex should not be poisoned")
            .len()
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::KeyedLocks;

    #[tokio::test]
    async fn same_key_is_serialized() {
        let locks = KeyedLocks::default();
        let guard = locks.lock("chat/U1").await;

        let contender = {
            let locks = locks.clone();
            tokio::spawn(async move {
                let _guard = locks.lock("chat/U1").await;
            })
        };

        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(!contender.is_finished());

        drop(guard);
        contender.await.expect("contender should finish");
    }

    #[tokio::test]
    async fn different_keys_do_not_block_each_other() {
        let locks = KeyedLocks::default();
        let _first = locks.lock("chat/U1").await;
        let _second = locks.lock("chat/U2").await;
    }

    #[tokio::test]
    async fn idle_keys_are_pruned() {
        let locks = KeyedLocks::default();
        drop(locks.lock("chat/U1").await);
        drop(locks.lock("chat/U2").await);
        drop(locks.lock("chat/U3").await);

        assert_eq!(locks.tracked_keys(), 1);
    }
}
