//! Change spans and notifications.
//!
//! Every externally visible structural edit runs inside a [`ChangeSpan`].
//! Spans nest: opening the outermost span bumps the version counter once,
//! and dropping it fires exactly one [`ChangeEvent`], no matter how many
//! nested spans the edit opened or whether it returned early.

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};

use arc_swap::ArcSwap;

/// Delivered to listeners when an outermost change span closes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ChangeEvent {
    /// The version the triangulation reached with this change.
    pub version: u64,
}

/// Callback invoked for each [`ChangeEvent`].
pub type ChangeListener = Arc<dyn Fn(&ChangeEvent) + Send + Sync>;

/// Handle returned by [`ChangeTracker::subscribe`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

struct ChangeState {
    depth: AtomicUsize,
    version: AtomicU64,
    fired: AtomicU64,
    next_listener: AtomicU64,
    listeners: ArcSwap<Vec<(ListenerId, ChangeListener)>>,
}

/// Version counter, nesting depth and listener list for one triangulation.
pub struct ChangeTracker {
    state: Arc<ChangeState>,
}

impl ChangeTracker {
    /// A tracker at version 0 with no listeners.
    #[must_use]
    pub fn new() -> Self {
        Self {
            state: Arc::new(ChangeState {
                depth: AtomicUsize::new(0),
                version: AtomicU64::new(0),
                fired: AtomicU64::new(0),
                next_listener: AtomicU64::new(0),
                listeners: ArcSwap::from_pointee(Vec::new()),
            }),
        }
    }

    /// Opens a change span.
    pub fn span(&self) -> ChangeSpan {
        if self.state.depth.fetch_add(1, Ordering::AcqRel) == 0 {
            self.state.version.fetch_add(1, Ordering::AcqRel);
        }
        ChangeSpan {
            state: Arc::clone(&self.state),
        }
    }

    /// Number of top-level changes so far.
    #[must_use]
    pub fn version(&self) -> u64 {
        self.state.version.load(Ordering::Acquire)
    }

    /// Current span nesting depth; zero outside any edit.
    #[must_use]
    pub fn depth(&self) -> usize {
        self.state.depth.load(Ordering::Acquire)
    }

    /// Number of notifications fired so far.
    #[must_use]
    pub fn notifications_fired(&self) -> u64 {
        self.state.fired.load(Ordering::Acquire)
    }

    /// Registers a listener for future change events.
    pub fn subscribe(&self, listener: ChangeListener) -> ListenerId {
        let id = ListenerId(self.state.next_listener.fetch_add(1, Ordering::AcqRel));
        self.state.listeners.rcu(|current| {
            let mut next = Vec::clone(current);
            next.push((id, Arc::clone(&listener)));
            next
        });
        id
    }

    /// Removes a listener. Returns whether it was registered.
    pub fn unsubscribe(&self, id: ListenerId) -> bool {
        let mut removed = false;
        self.state.listeners.rcu(|current| {
            let next: Vec<_> = current
                .iter()
                .filter(|(existing, _)| *existing != id)
                .cloned()
                .collect();
            removed = next.len() != current.len();
            next
        });
        removed
    }
}

impl Default for ChangeTracker {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for ChangeTracker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChangeTracker")
            .field("version", &self.version())
            .field("depth", &self.depth())
            .field("listeners", &self.state.listeners.load().len())
            .finish()
    }
}

/// Guard for one (possibly nested) change span.
///
/// Dropping the outermost guard notifies every listener once, including
/// during unwinding.
#[must_use = "a change span closes as soon as it is dropped"]
pub struct ChangeSpan {
    state: Arc<ChangeState>,
}

impl Drop for ChangeSpan {
    fn drop(&mut self) {
        if self.state.depth.fetch_sub(1, Ordering::AcqRel) != 1 {
            return;
        }
        self.state.fired.fetch_add(1, Ordering::AcqRel);
        let event = ChangeEvent {
            version: self.state.version.load(Ordering::Acquire),
        };
        let listeners = self.state.listeners.load_full();
        for (_, listener) in listeners.iter() {
            listener(&event);
        }
    }
}

impl fmt::Debug for ChangeSpan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChangeSpan")
            .field("depth", &self.state.depth.load(Ordering::Acquire))
            .finish()
    }
}
