//! Live session tracking and force-close fan-out.
//!
//! Mirrors the WebSocket connection manager's registration/cancellation
//! pattern: every live session gets a child of a single global
//! cancellation token, so an operator-initiated shutdown can signal all
//! in-flight sessions at once without the registry needing to know how
//! to close a session itself.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use dashmap::DashMap;
use parking_lot::RwLock;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

struct SessionState {}

/// Tracks all currently open sessions.
pub struct SessionRegistry {
    sessions: DashMap<Uuid, SessionState>,
    next_ordinal: AtomicU64,
    global_cancel: RwLock<CancellationToken>,
}

impl SessionRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self {
            sessions: DashMap::new(),
            next_ordinal: AtomicU64::new(1),
            global_cancel: RwLock::new(CancellationToken::new()),
        }
    }

    /// Registers `session_id` and returns a guard that unregisters it on
    /// drop and exposes a cancellation token scoped to this session.
    pub fn register(self: &Arc<Self>, session_id: Uuid) -> SessionGuard {
        let ordinal = self.next_ordinal.fetch_add(1, Ordering::Relaxed);
        let cancel_token = self.global_cancel.read().child_token();

        self.sessions.insert(session_id, SessionState {});
        log::info!(
            "session {session_id}: registered (ordinal {ordinal}, total: {})",
            self.sessions.len()
        );

        SessionGuard {
            session_id,
            registry: Arc::clone(self),
            cancel_token,
        }
    }

    fn unregister(&self, session_id: &Uuid) {
        if self.sessions.remove(session_id).is_some() {
            log::info!(
                "session {session_id}: unregistered (remaining: {})",
                self.sessions.len()
            );
        }
    }

    #[must_use]
    pub fn session_count(&self) -> usize {
        self.sessions.len()
    }

    /// Signals every currently-registered session to close, then issues
    /// a fresh token so sessions accepted afterwards are unaffected.
    pub fn close_all(&self) -> usize {
        let count = self.sessions.len();
        if count > 0 {
            log::info!("closing {count} live session(s)");
            let mut guard = self.global_cancel.write();
            guard.cancel();
            *guard = CancellationToken::new();
        }
        count
    }
}

impl Default for SessionRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// RAII guard returned by [`SessionRegistry::register`]. Unregisters the
/// session when dropped, including on early return or panic.
pub struct SessionGuard {
    session_id: Uuid,
    registry: Arc<SessionRegistry>,
    cancel_token: CancellationToken,
}

impl SessionGuard {
    #[must_use]
    pub fn session_id(&self) -> Uuid {
        self.session_id
    }

    /// Token that fires when this session should close: either the
    /// registry-wide shutdown signal or any future per-session cancel.
    #[must_use]
    pub fn cancel_token(&self) -> &CancellationToken {
        &self.cancel_token
    }
}

impl Drop for SessionGuard {
    fn drop(&mut self) {
        self.registry.unregister(&self.session_id);
    }
}
