//! Debounced derived-state passes.
//!
//! Expensive passes (renumbering, header/footer refresh, cross-references)
//! are deferred until edits settle. Scheduling a pass again before its delay
//! elapses restarts the timer, so only the last request runs. `flush` and
//! `flush_all` run pending passes right away, e.g. before an export.
//!
//! A pass that fails or panics is logged and dropped; it never takes other
//! passes down with it.

use crate::error::QuireError;
use itertools::Itertools;
use std::collections::HashMap;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::task::JoinHandle;

/// The passes an editing session registers by default.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PassKind {
    ListRenumbering,
    FootnoteLayout,
    HeaderFooter,
    PageNumbers,
    CrossReferences,
}

impl PassKind {
    pub const ALL: [PassKind; 5] = [
        PassKind::ListRenumbering,
        PassKind::FootnoteLayout,
        PassKind::HeaderFooter,
        PassKind::PageNumbers,
        PassKind::CrossReferences,
    ];

    pub fn id(&self) -> &'static str {
        match self {
            PassKind::ListRenumbering => "list-renumbering",
            PassKind::FootnoteLayout => "footnote-layout",
            PassKind::HeaderFooter => "header-footer",
            PassKind::PageNumbers => "page-numbers",
            PassKind::CrossReferences => "cross-references",
        }
    }

    pub fn default_delay(&self) -> Duration {
        Duration::from_millis(match self {
            PassKind::ListRenumbering => 100,
            PassKind::FootnoteLayout => 200,
            PassKind::HeaderFooter => 500,
            PassKind::PageNumbers => 500,
            PassKind::CrossReferences => 2000,
        })
    }

    /// Higher runs first on flush. Numbering feeds everything after it.
    pub fn default_priority(&self) -> i32 {
        match self {
            PassKind::ListRenumbering => 100,
            PassKind::FootnoteLayout => 80,
            PassKind::HeaderFooter => 60,
            PassKind::PageNumbers => 40,
            PassKind::CrossReferences => 20,
        }
    }
}

pub type PassFn = Arc<dyn Fn() -> Result<(), QuireError> + Send + Sync>;

#[derive(Clone)]
struct Registration {
    delay: Duration,
    priority: i32,
    run: PassFn,
}

struct Pending {
    generation: u64,
    timer: JoinHandle<()>,
}

#[derive(Default)]
struct Registry {
    passes: HashMap<String, Registration>,
    pending: HashMap<String, Pending>,
    generation: u64,
}

/// Debounces passes by string id on the tokio runtime.
///
/// Cloning yields another handle to the same manager.
#[derive(Clone, Default)]
pub struct PassManager {
    inner: Arc<Mutex<Registry>>,
}

impl PassManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register<F>(&self, id: impl Into<String>, delay: Duration, priority: i32, run: F)
    where
        F: Fn() -> Result<(), QuireError> + Send + Sync + 'static,
    {
        let registration = Registration {
            delay,
            priority,
            run: Arc::new(run),
        };
        self.lock().passes.insert(id.into(), registration);
    }

    pub fn register_kind<F>(&self, kind: PassKind, run: F)
    where
        F: Fn() -> Result<(), QuireError> + Send + Sync + 'static,
    {
        self.register(kind.id(), kind.default_delay(), kind.default_priority(), run);
    }

    /// Runs the pass once its delay elapses without another `schedule` call
    /// for the same id. Must be called from within a tokio runtime.
    pub fn schedule(&self, id: &str) {
        let mut registry = self.lock();
        let Some(delay) = registry.passes.get(id).map(|r| r.delay) else {
            log::warn!("Ignoring schedule of unregistered pass '{}'", id);
            return;
        };
        if let Some(previous) = registry.pending.remove(id) {
            previous.timer.abort();
        }

        registry.generation += 1;
        let generation = registry.generation;
        let manager = self.clone();
        let key = id.to_string();
        let timer = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            manager.fire(&key, generation);
        });
        registry.pending.insert(id.to_string(), Pending { generation, timer });
    }

    /// Runs a pending pass now. Returns whether anything ran.
    pub fn flush(&self, id: &str) -> bool {
        let run = {
            let mut registry = self.lock();
            match registry.pending.remove(id) {
                Some(pending) => {
                    pending.timer.abort();
                    registry.passes.get(id).map(|r| r.run.clone())
                }
                None => None,
            }
        };
        match run {
            Some(run) => {
                execute(id, &run);
                true
            }
            None => false,
        }
    }

    /// Runs every pending pass now, highest priority first. Returns how many
    /// ran.
    pub fn flush_all(&self) -> usize {
        let due: Vec<(String, PassFn)> = {
            let mut registry = self.lock();
            let pending: Vec<(String, Pending)> = registry.pending.drain().collect();
            pending
                .into_iter()
                .filter_map(|(id, pending)| {
                    pending.timer.abort();
                    let reg = registry.passes.get(&id)?;
                    Some((reg.priority, id, reg.run.clone()))
                })
                .sorted_by(|a, b| b.0.cmp(&a.0).then_with(|| a.1.cmp(&b.1)))
                .map(|(_, id, run)| (id, run))
                .collect()
        };
        for (id, run) in &due {
            execute(id, run);
        }
        due.len()
    }

    /// Drops a pending pass without running it. Returns whether one was
    /// pending.
    pub fn cancel(&self, id: &str) -> bool {
        match self.lock().pending.remove(id) {
            Some(pending) => {
                pending.timer.abort();
                true
            }
            None => false,
        }
    }

    pub fn is_pending(&self, id: &str) -> bool {
        self.lock().pending.contains_key(id)
    }

    pub fn pending_count(&self) -> usize {
        self.lock().pending.len()
    }

    fn fire(&self, id: &str, generation: u64) {
        let run = {
            let mut registry = self.lock();
            match registry.pending.get(id) {
                Some(p) if p.generation == generation => {
                    registry.pending.remove(id);
                    registry.passes.get(id).map(|r| r.run.clone())
                }
                _ => None,
            }
        };
        if let Some(run) = run {
            execute(id, &run);
        }
    }

    fn lock(&self) -> MutexGuard<'_, Registry> {
        // A pass never runs under the lock, so a poisoned registry is still
        // consistent.
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

fn execute(id: &str, run: &PassFn) {
    match catch_unwind(AssertUnwindSafe(|| run())) {
        Ok(Ok(())) => log::debug!("Pass '{}' finished", id),
        Ok(Err(e)) => log::error!("Pass '{}' failed: {}", id, e),
        Err(panic) => {
            let message = panic
                .downcast_ref::<&str>()
                .map(|s| s.to_string())
                .or_else(|| panic.downcast_ref::<String>().cloned())
                .unwrap_or_else(|| "unknown panic".to_string());
            log::error!("Pass '{}' panicked: {}", id, message);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn counter(manager: &PassManager, id: &str, delay_ms: u64, priority: i32) -> Arc<AtomicUsize> {
        let count = Arc::new(AtomicUsize::new(0));
        let c = count.clone();
        manager.register(id, Duration::from_millis(delay_ms), priority, move || {
            c.fetch_add(1, Ordering::SeqCst);
            Ok(())
        });
        count
    }

    async fn wait(ms: u64) {
        tokio::time::sleep(Duration::from_millis(ms)).await;
        tokio::task::yield_now().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_rescheduling_resets_the_timer() {
        let manager = PassManager::new();
        let count = counter(&manager, "renumber", 100, 0);

        manager.schedule("renumber");
        wait(60).await;
        manager.schedule("renumber");
        wait(60).await;
        assert_eq!(count.load(Ordering::SeqCst), 0);
        assert!(manager.is_pending("renumber"));

        wait(60).await;
        assert_eq!(count.load(Ordering::SeqCst), 1);
        assert!(!manager.is_pending("renumber"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_drops_the_pass() {
        let manager = PassManager::new();
        let count = counter(&manager, "xref", 50, 0);
        manager.schedule("xref");
        assert!(manager.cancel("xref"));
        assert!(!manager.cancel("xref"));
        wait(100).await;
        assert_eq!(count.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_flush_runs_immediately_once() {
        let manager = PassManager::new();
        let count = counter(&manager, "hf", 500, 0);
        manager.schedule("hf");
        assert!(manager.flush("hf"));
        assert_eq!(count.load(Ordering::SeqCst), 1);
        wait(600).await;
        assert_eq!(count.load(Ordering::SeqCst), 1);
        assert!(!manager.flush("hf"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_flush_all_runs_by_descending_priority() {
        let manager = PassManager::new();
        let order = Arc::new(Mutex::new(Vec::new()));
        for (id, priority) in [("low", 1), ("high", 9), ("mid", 5)] {
            let order = order.clone();
            manager.register(id, Duration::from_secs(5), priority, move || {
                order.lock().unwrap().push(id);
                Ok(())
            });
            manager.schedule(id);
        }
        assert_eq!(manager.flush_all(), 3);
        assert_eq!(*order.lock().unwrap(), vec!["high", "mid", "low"]);
        assert_eq!(manager.pending_count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_failing_pass_does_not_block_others() {
        let _ = env_logger::builder().is_test(true).try_init();
        let manager = PassManager::new();
        manager.register("broken", Duration::from_millis(10), 10, || {
            Err(QuireError::Pass("broken".into(), "boom".into()))
        });
        manager.register("panics", Duration::from_millis(10), 5, || panic!("pass exploded"));
        let count = counter(&manager, "fine", 10, 0);

        for id in ["broken", "panics", "fine"] {
            manager.schedule(id);
        }
        assert_eq!(manager.flush_all(), 3);
        assert_eq!(count.load(Ordering::SeqCst), 1);

        manager.schedule("panics");
        manager.schedule("fine");
        wait(20).await;
        assert_eq!(count.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_default_kinds() {
        let manager = PassManager::new();
        for kind in PassKind::ALL {
            manager.register_kind(kind, || Ok(()));
        }
        assert_eq!(PassKind::ListRenumbering.default_delay(), Duration::from_millis(100));
        assert_eq!(PassKind::CrossReferences.default_delay(), Duration::from_secs(2));
        manager.schedule("unknown");
        assert_eq!(manager.pending_count(), 0);
        manager.schedule(PassKind::PageNumbers.id());
        assert!(manager.is_pending("page-numbers"));
        assert!(manager.cancel("page-numbers"));
    }
}
