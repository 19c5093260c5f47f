//! Type-safe identifier wrappers.
//!
//! CDP hands out several kinds of opaque identifiers. Newtypes keep a
//! target ID from being passed where a session ID is expected.
//!
//! | Type | Origin |
//! |------|--------|
//! | [`RequestId`] | Per-connection command counter |
//! | [`TargetId`] | `Target.getTargets` / `Target.attachToTarget` |
//! | [`SessionId`] | `Target.attachToTarget` with `flatten: true` |
//! | [`ObjectId`] | `Runtime.RemoteObjectId` for page objects |

// ============================================================================
// Imports
// ============================================================================

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};

// ============================================================================
// RequestId
// ============================================================================

/// Command identifier used to correlate responses.
///
/// CDP requires ids to be unique per connection; they are allocated from an
/// increasing counter owned by the connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RequestId(u64);

impl RequestId {
    /// Wraps a raw id.
    #[inline]
    #[must_use]
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    /// Returns the raw id.
    #[inline]
    #[must_use]
    pub const fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Allocates [`RequestId`]s starting at 1.
#[derive(Debug)]
pub struct RequestIdGenerator {
    next: AtomicU64,
}

impl Default for RequestIdGenerator {
    fn default() -> Self {
        Self {
            next: AtomicU64::new(1),
        }
    }
}

impl RequestIdGenerator {
    /// Returns the next unused id.
    #[inline]
    pub fn next_id(&self) -> RequestId {
        RequestId(self.next.fetch_add(1, Ordering::Relaxed))
    }
}

// ============================================================================
// String Identifiers
// ============================================================================

macro_rules! string_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Wraps a raw identifier string.
            #[inline]
            #[must_use]
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            /// Returns the identifier as a string slice.
            #[inline]
            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }
    };
}

string_id!(
    /// Browser target (tab, worker, iframe) identifier.
    TargetId
);

string_id!(
    /// Flattened CDP session identifier bound to one attached target.
    SessionId
);

string_id!(
    /// Handle to a JavaScript object living in the page.
    ObjectId
);

// ============================================================================
// Tests
// ============================================================================
