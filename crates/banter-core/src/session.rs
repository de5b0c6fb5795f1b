//! Session identity.

use std::fmt;

// ============================================================================
// Type-Safe Identifiers
// ============================================================================

/// Unique identifier for a connected session.
///
/// Wraps the process-unique integer the server assigns at accept time.
/// Identifiers are handed out monotonically from an atomic counter and
/// never reused within a process lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SessionId(u64);

impl SessionId {
    /// Creates a new SessionId from a raw counter value.
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    /// Returns the underlying integer.
    pub fn as_u64(&self) -> u64 {
        self.0
    }

    /// The default display name for this session.
    ///
    /// A freshly connected client is addressed by the decimal form of its
    /// id until it issues `set username`.
    pub fn default_name(&self) -> String {
        self.0.to_string()
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for SessionId {
    fn from(id: u64) -> Self {
        Self(id)
    }
}
