use std::fmt;
use std::sync::{Arc, Mutex, PoisonError};

type Observer = Box<dyn Fn(bool) + Send + Sync>;

struct Inner {
    holders: Mutex<usize>,
    observer: Option<Observer>,
}

/// The document's single scroll state, reference counted.
///
/// Scrolling is suspended while at least one [`ScrollLockGuard`] is alive.
/// The observer sees `true` when the first guard is taken and `false` when
/// the last one is dropped.
#[derive(Clone)]
pub struct ScrollLock {
    inner: Arc<Inner>,
}

impl ScrollLock {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Inner {
                holders: Mutex::new(0),
                observer: None,
            }),
        }
    }

    pub fn with_observer(observer: impl Fn(bool) + Send + Sync + 'static) -> Self {
        Self {
            inner: Arc::new(Inner {
                holders: Mutex::new(0),
                observer: Some(Box::new(observer)),
            }),
        }
    }

    pub fn acquire(&self) -> ScrollLockGuard {
        let first = {
            let mut holders = self.inner.holders.lock().unwrap_or_else(PoisonError::into_inner);
            *holders += 1;
            *holders == 1
        };
        if first {
            tracing::debug!("Page scroll locked");
            self.inner.notify(true);
        }
        ScrollLockGuard {
            inner: Arc::clone(&self.inner),
        }
    }

    pub fn is_locked(&self) -> bool {
        self.holders() > 0
    }

    pub fn holders(&self) -> usize {
        *self.inner.holders.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for ScrollLock {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for ScrollLock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScrollLock")
            .field("holders", &self.holders())
            .finish()
    }
}

impl Inner {
    fn notify(&self, locked: bool) {
        if let Some(observer) = &self.observer {
            observer(locked);
        }
    }
}

/// Holds the page scroll lock until dropped.
pub struct ScrollLockGuard {
    inner: Arc<Inner>,
}

impl fmt::Debug for ScrollLockGuard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ScrollLockGuard")
    }
}

impl Drop for ScrollLockGuard {
    fn drop(&mut self) {
        let last = {
            let mut holders = self.inner.holders.lock().unwrap_or_else(PoisonError::into_inner);
            *holders = holders.saturating_sub(1);
            *holders == 0
        };
        if last {
            tracing::debug!("Page scroll released");
            self.inner.notify(false);
        }
    }
}
