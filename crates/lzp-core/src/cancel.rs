//! Cooperative cancellation shared across pipeline stages.
//!
//! ```rust
//! use lzp_core::CancelToken;
//!
//! let token = CancelToken::new();
//! let stage = token.clone();
//! token.cancel("user abort");
//! assert!(stage.is_canceled());
//! assert_eq!(stage.cancel_reason().as_deref(), Some("user abort"));
//! ```

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

#[derive(Debug, Default)]
struct Inner {
    flag: AtomicBool,
    reason: Mutex<Option<String>>,
}

/// Shared cancel flag plus reason. Clones observe the same state.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    inner: Arc<Inner>,
}

impl CancelToken {
    /// Creates a token that is not canceled.
    pub fn new() -> Self {
        Self::default()
    }

    /// Requests cancellation. The first reason wins.
    pub fn cancel(&self, reason: impl Into<String>) {
        let mut slot = self.inner.reason.lock().unwrap_or_else(|e| e.into_inner());
        if slot.is_none() {
            *slot = Some(reason.into());
        }
        self.inner.flag.store(true, Ordering::Release);
    }

    /// Whether cancellation has been requested.
    #[inline]
    pub fn is_canceled(&self) -> bool {
        self.inner.flag.load(Ordering::Acquire)
    }

    /// Reason given to [`cancel`](Self::cancel), if canceled.
    pub fn cancel_reason(&self) -> Option<String> {
        if !self.is_canceled() {
            return None;
        }
        self.inner
            .reason
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }
}
