//! Per-chapter critical sections around check-then-act sequences.
//!
//! Serialises ingestion and deletion for the same chapter inside this
//! process. Replicas do not see each other's locks.

use std::collections::{BTreeSet, HashMap};
use std::sync::{Arc, Mutex};

use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

/// Held chapter locks. Released on drop.
pub struct ChapterGuard {
    _guards: Vec<OwnedMutexGuard<()>>,
}

#[derive(Default)]
pub struct ChapterLocks {
    chapters: Mutex<HashMap<String, Arc<AsyncMutex<()>>>>,
}

impl ChapterLocks {
    pub fn new() -> Self {
        Self::default()
    }

    fn handle(&self, chapter: &str) -> Arc<AsyncMutex<()>> {
        let mut chapters = self
            .chapters
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        // Entries only referenced by the map are idle.
        chapters.retain(|_, lock| Arc::strong_count(lock) > 1);
        Arc::clone(
            chapters
                .entry(chapter.to_string())
                .or_insert_with(|| Arc::new(AsyncMutex::new(()))),
        )
    }

    /// Lock every distinct chapter in `chapters`, in sorted order.
    pub async fn acquire<'a, I>(&self, chapters: I) -> ChapterGuard
    where
        I: IntoIterator<Item = &'a str>,
    {
        let ordered: BTreeSet<&str> = chapters.into_iter().collect();
        let mut guards = Vec::with_capacity(ordered.len());
        for chapter in ordered {
            guards.push(self.handle(chapter).lock_owned().await);
        }
        ChapterGuard { _guards: guards }
    }

    #[cfg(test)]
    fn tracked(&self) -> usize {
        self.chapters.lock().map(|c| c.len()).unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn test_same_chapter_is_serialised() {
        let locks = Arc::new(ChapterLocks::new());
        let guard = locks.acquire(["Intro"]).await;

        let contender = {
            let locks = Arc::clone(&locks);
            tokio::spawn(async move {
                let _guard = locks.acquire(["Intro"]).await;
            })
        };

        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(!contender.is_finished());

        drop(guard);
        contender.await.unwrap();
    }

    #[tokio::test]
    async fn test_distinct_chapters_do_not_block() {
        let locks = ChapterLocks::new();
        let _intro = locks.acquire(["Intro"]).await;
        let _setup = tokio::time::timeout(Duration::from_millis(50), locks.acquire(["Setup"]))
            .await
            .expect("independent chapter should not wait");
    }

    #[tokio::test]
    async fn test_duplicate_names_in_one_acquire() {
        let locks = ChapterLocks::new();
        let _guard = tokio::time::timeout(
            Duration::from_millis(50),
            locks.acquire(["Intro", "Intro"]),
        )
        .await
        .expect("duplicates must not self-deadlock");
    }

    #[tokio::test]
    async fn test_idle_entries_are_pruned() {
        let locks = ChapterLocks::new();
        drop(locks.acquire(["A", "B"]).await);
        let _c = locks.acquire(["C"]).await;
        assert_eq!(locks.tracked(), 1);
    }
}
