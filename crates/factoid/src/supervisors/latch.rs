//! 🔢 CompletionLatch — a countdown that every worker decrements exactly once.
//!
//! `register()` bumps the count and hands back a [`CompletionGuard`]. Dropping the
//! guard counts it back down. Dropping happens on every exit path: normal return,
//! early return, `?`, cancellation, even a panic unwinding through the task. So
//! the watcher blocked in [`CompletionLatch::wait`] always gets its zero.
//!
//! Register every guard BEFORE anyone calls `wait`. A latch that starts at zero is
//! already open.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use tokio::sync::Notify;

#[derive(Debug, Default)]
struct LatchState {
    pending: AtomicUsize,
    all_done: Notify,
}

#[derive(Debug, Clone, Default)]
pub(crate) struct CompletionLatch {
    state: Arc<LatchState>,
}

/// 🎟️ One outstanding unit of work. Drop it to report completion.
#[derive(Debug)]
#[must_use = "dropping the guard immediately reports completion"]
pub(crate) struct CompletionGuard {
    state: Arc<LatchState>,
}

impl CompletionLatch {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn register(&self) -> CompletionGuard {
        self.state.pending.fetch_add(1, Ordering::AcqRel);
        CompletionGuard {
            state: Arc::clone(&self.state),
        }
    }

    pub(crate) fn pending(&self) -> usize {
        self.state.pending.load(Ordering::Acquire)
    }

    /// ⏳ Resolves once every registered guard has been dropped.
    pub(crate) async fn wait(&self) {
        loop {
            let notified = self.state.all_done.notified();
            tokio::pin!(notified);
            // 🔒 enable before checking, so a notify_waiters() between the check and the await isn't lost
            notified.as_mut().enable();
            if self.pending() == 0 {
                return;
            }
            notified.await;
        }
    }
}

impl Drop for CompletionGuard {
    fn drop(&mut self) {
        if self.state.pending.fetch_sub(1, Ordering::AcqRel) == 1 {
            self.state.all_done.notify_waiters();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn the_one_where_an_empty_latch_is_already_open() {
        let latch = CompletionLatch::new();
        tokio::time::timeout(Duration::from_millis(100), latch.wait())
            .await
            .expect("💀 nothing registered, nothing to wait for");
    }

    #[tokio::test]
    async fn the_one_where_the_watcher_waits_for_the_last_guard() {
        let latch = CompletionLatch::new();
        let first = latch.register();
        let second = latch.register();
        assert_eq!(latch.pending(), 2);

        let watcher = tokio::spawn({
            let latch = latch.clone();
            async move { latch.wait().await }
        });

        drop(first);
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(!watcher.is_finished(), "💀 one guard is still out");

        drop(second);
        tokio::time::timeout(Duration::from_secs(1), watcher)
            .await
            .expect("💀 the last drop should release the watcher")
            .expect("💀 watcher task panicked");
        assert_eq!(latch.pending(), 0);
    }

    #[tokio::test]
    async fn the_one_where_a_panicking_task_still_counts_down() {
        let latch = CompletionLatch::new();
        let guard = latch.register();

        let doomed = tokio::spawn(async move {
            let _guard = guard;
            panic!("🧪 intentional panic, the guard should still drop");
        });
        assert!(doomed.await.is_err());

        tokio::time::timeout(Duration::from_secs(1), latch.wait())
            .await
            .expect("💀 unwinding should have dropped the guard");
    }
}
