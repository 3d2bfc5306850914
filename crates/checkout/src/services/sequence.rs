//! Latest-wins sequencing for overlapping async lookups.
//!
//! A shopper can re-trigger a locker search while a previous one is still
//! in flight. Each attempt takes a monotonically increasing sequence number
//! when it starts; a result is applied only if its number is still the
//! latest issued. Stale results are dropped, so two overlapping searches
//! can never apply out of order.
//!
//! Sequencing is scoped per search session: every session gets its own
//! [`RequestSequencer`] from a [`SessionSequencers`] registry, so concurrent
//! searches from unrelated shoppers never supersede each other.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use moka::sync::Cache;

/// How long an idle search session keeps its sequencer before eviction.
const SESSION_TTL: Duration = Duration::from_secs(30 * 60);

/// Issues sequence numbers and decides which in-flight result is current.
#[derive(Debug, Default)]
pub struct RequestSequencer {
    issued: AtomicU64,
    committed: AtomicU64,
}

impl RequestSequencer {
    /// Create a sequencer with no requests issued.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            issued: AtomicU64::new(0),
            committed: AtomicU64::new(0),
        }
    }

    /// Start a new request, superseding every earlier one.
    #[must_use]
    pub fn begin(&self) -> u64 {
        self.issued.fetch_add(1, Ordering::SeqCst) + 1
    }

    /// Try to apply the result of request `seq`.
    ///
    /// Returns `true` and records the commit when `seq` is still the latest
    /// issued request; returns `false` when a newer request has begun, in
    /// which case the caller must drop the result.
    pub fn try_commit(&self, seq: u64) -> bool {
        if self.issued.load(Ordering::SeqCst) == seq {
            self.committed.store(seq, Ordering::SeqCst);
            true
        } else {
            false
        }
    }

    /// Sequence number of the most recently applied result.
    #[cfg(test)]
    fn last_committed(&self) -> u64 {
        self.committed.load(Ordering::SeqCst)
    }
}

/// Per-session sequencer registry.
///
/// One sequencer per search session token, created on first use and evicted
/// after the session has been idle for a while. Two sessions never share a
/// sequencer, so one shopper's search cannot supersede another's.
pub struct SessionSequencers {
    sessions: Cache<String, Arc<RequestSequencer>>,
}

impl SessionSequencers {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self {
            sessions: Cache::builder()
                .max_capacity(10_000)
                .time_to_idle(SESSION_TTL)
                .build(),
        }
    }

    /// The sequencer for one search session, created on first use.
    #[must_use]
    pub fn for_session(&self, session: &str) -> Arc<RequestSequencer> {
        self.sessions
            .get_with(session.to_string(), || Arc::new(RequestSequencer::new()))
    }
}

impl Default for SessionSequencers {
    fn default() -> Self {
        Self::new()
    }
}
