//! Basic type definitions for the chat server
//!
//! Provides the newtype wrapper for connection identity:
//! - `ConnId`: monotonically increasing connection identifier

use std::sync::atomic::{AtomicU64, Ordering};

static NEXT_CONN_ID: AtomicU64 = AtomicU64::new(1);

/// Unique connection identifier (newtype pattern)
///
/// Wraps a process-wide monotonic counter, playing the role the socket
/// descriptor plays in a poll-based server: unique while the connection
/// lives, usable as a HashMap key and as a non-owning membership handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConnId(pub u64);

impl ConnId {
    /// Allocate the next connection ID
    pub fn next() -> Self {
        Self(NEXT_CONN_ID.fetch_add(1, Ordering::Relaxed))
    }
}

impl std::fmt::Display for ConnId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Check whether a message target names a channel rather than a user.
///
/// Channel names start with the `#` sigil and are case-sensitive.
pub fn is_channel_name(target: &str) -> bool {
    target.starts_with('#')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_conn_id_unique() {
        let id1 = ConnId::next();
        let id2 = ConnId::next();
        assert_ne!(id1, id2);
        assert!(id2.0 > id1.0);
    }

    #[test]
    fn test_channel_name_sigil() {
        assert!(is_channel_name("#test"));
        assert!(!is_channel_name("alice"));
        assert!(!is_channel_name(""));
    }
}
