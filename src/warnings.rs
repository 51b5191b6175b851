//! Deduplicated warnings.

use std::collections::HashSet;
use std::sync::Mutex;

/// Emits each distinct warning message once.
///
/// Owned by the [`Engine`](crate::Engine) and shared with whatever needs to
/// report soft failures (unresolvable expansions, for example). Tests call
/// [`reset`](Self::reset) to start from a clean slate.
#[derive(Debug, Default)]
pub struct WarningLog {
    seen: Mutex<HashSet<String>>,
}

impl WarningLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Log `message` at warn level unless it was logged before.
    /// Returns `true` when the message was emitted.
    pub fn warn_once(&self, message: impl Into<String>) -> bool {
        let message = message.into();
        let Ok(mut seen) = self.seen.lock() else {
            tracing::warn!("{}", message);
            return true;
        };
        if seen.contains(&message) {
            return false;
        }
        tracing::warn!("{}", message);
        seen.insert(message);
        true
    }

    /// Number of distinct messages emitted so far.
    pub fn len(&self) -> usize {
        self.seen.lock().map(|seen| seen.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Forget every emitted message.
    pub fn reset(&self) {
        if let Ok(mut seen) = self.seen.lock() {
            seen.clear();
        }
    }
}
