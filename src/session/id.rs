//! Session identifier type.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

/// Global counter for session ID generation.
static COUNTER: AtomicU64 = AtomicU64::new(1);

/// Identifier for a shell session, unique within the process.
///
/// Displayed as `shell-N`; used in log records and default worker names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SessionId(u64);

impl SessionId {
    /// Allocate the next session ID.
    pub fn next() -> Self {
        Self(COUNTER.fetch_add(1, Ordering::Relaxed))
    }

    /// Get the raw value.
    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "shell-{}", self.0)
    }
}
