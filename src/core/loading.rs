// src/core/loading.rs

use std::fmt;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use std::time::Duration;
use tokio::task::JoinHandle;

const PENDING: u8 = 0;
const VISIBLE: u8 = 1;
const FINISHED: u8 = 2;
const CANCELLED: u8 = 3;

/// Called with `true` when the spinner should appear and `false` when it should go away.
pub type OnLoadingChange = Arc<dyn Fn(bool) + Send + Sync>;

struct Inner {
    state: AtomicU8,
    on_change: OnLoadingChange,
    timer: Mutex<Option<JoinHandle<()>>>,
    /// Held across every state change together with its callback, so a settle
    /// never returns while a delayed `on_change(true)` is still running.
    gate: Mutex<()>,
}

/// The pending state of an item whose submenu is being resolved.
///
/// The spinner only shows once `delay` has elapsed, so fast cache hits never
/// flash. `finished` and `cancel` are synchronous and idempotent, and neither
/// has any effect once the indicator has settled.
#[derive(Clone)]
pub struct LoadingIndicator {
    inner: Arc<Inner>,
}

impl fmt::Debug for LoadingIndicator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoadingIndicator")
            .field("state", &self.inner.state.load(Ordering::Acquire))
            .finish_non_exhaustive()
    }
}

impl LoadingIndicator {
    /// Starts a pending indicator. With a zero delay it is visible immediately and
    /// `on_change(true)` runs before this returns.
    pub fn start(delay: Duration, on_change: OnLoadingChange) -> Self {
        let indicator = Self {
            inner: Arc::new(Inner {
                state: AtomicU8::new(PENDING),
                on_change,
                timer: Mutex::new(None),
                gate: Mutex::new(()),
            }),
        };

        if delay.is_zero() {
            indicator.show();
        } else {
            let weak: Weak<Inner> = Arc::downgrade(&indicator.inner);
            let timer = tokio::spawn(async move {
                tokio::time::sleep(delay).await;
                if let Some(inner) = weak.upgrade() {
                    Self { inner }.show();
                }
            });
            *indicator.timer() = Some(timer);
        }
        indicator
    }

    fn timer(&self) -> MutexGuard<'_, Option<JoinHandle<()>>> {
        self.inner.timer.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn gate(&self) -> MutexGuard<'_, ()> {
        self.inner.gate.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn show(&self) {
        let _gate = self.gate();
        if self
            .inner
            .state
            .compare_exchange(PENDING, VISIBLE, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
        {
            (self.inner.on_change)(true);
        }
    }

    /// Moves an active indicator to `to`, returning the state it left. Callers hold the gate.
    fn settle(&self, to: u8) -> Option<u8> {
        let previous = self
            .inner
            .state
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |s| {
                (s == PENDING || s == VISIBLE).then_some(to)
            })
            .ok()?;
        if let Some(timer) = self.timer().take() {
            timer.abort();
        }
        Some(previous)
    }

    /// Whether the spinner is currently shown.
    pub fn is_loading(&self) -> bool {
        self.inner.state.load(Ordering::Acquire) == VISIBLE
    }

    /// Whether the load is still outstanding (shown or not yet shown).
    pub fn is_pending(&self) -> bool {
        matches!(self.inner.state.load(Ordering::Acquire), PENDING | VISIBLE)
    }

    /// The load completed. Hides the spinner if it was shown.
    pub fn finished(&self) {
        let _gate = self.gate();
        if self.settle(FINISHED) == Some(VISIBLE) {
            (self.inner.on_change)(false);
        }
    }

    /// The load was abandoned. The owner re-renders the item itself, so no callback runs.
    ///
    /// If a delayed spinner is being shown concurrently, this waits for its
    /// callback to complete, so whatever the owner draws next lands last.
    pub fn cancel(&self) {
        let _gate = self.gate();
        self.settle(CANCELLED);
    }
}
