//! Session registry: the source of truth for who is online.
//!
//! Maps a connection identity to its authenticated username and outbound
//! message queue. This is one of the two lock domains in the server (the
//! other is the group registry); callers never obtain references into the
//! underlying map - every operation is a single critical section. Fan-out
//! operations enqueue all their deliveries inside one lock hold, so no two
//! messages can interleave differently in different recipients' queues.

use std::{
    collections::HashMap,
    sync::{Mutex, MutexGuard, PoisonError},
};

use tokio::sync::mpsc::UnboundedSender;

/// One authenticated connection.
#[derive(Debug, Clone)]
struct Session {
    /// Username bound at authentication; immutable afterwards.
    username: String,
    /// Outbound queue drained by the connection's writer task.
    outbound: UnboundedSender<String>,
}

/// Registry of live, authenticated connections.
///
/// A connection identity appears at most once. Usernames are NOT unique
/// across sessions: two connections may authenticate as the same user, and
/// direct messages then reach whichever session a lookup scan finds first.
#[derive(Debug, Default)]
pub struct SessionRegistry {
    sessions: Mutex<HashMap<u64, Session>>,
}

impl SessionRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry operations never leave the map mid-mutation, so a poisoned
    /// lock still guards a consistent map.
    fn lock(&self) -> MutexGuard<'_, HashMap<u64, Session>> {
        self.sessions.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Register a connection under `username`.
    ///
    /// Returns `false` if the identity is already registered.
    pub fn register(&self, id: u64, username: &str, outbound: UnboundedSender<String>) -> bool {
        let mut sessions = self.lock();
        if sessions.contains_key(&id) {
            return false;
        }
        sessions.insert(id, Session { username: username.to_string(), outbound });
        true
    }

    /// Remove a connection, returning the username it was registered under.
    ///
    /// Idempotent: removing an absent identity is a no-op.
    pub fn unregister(&self, id: u64) -> Option<String> {
        self.lock().remove(&id).map(|session| session.username)
    }

    /// Username a connection authenticated as.
    pub fn username(&self, id: u64) -> Option<String> {
        self.lock().get(&id).map(|session| session.username.clone())
    }

    /// Whether the identity has a live session.
    pub fn is_registered(&self, id: u64) -> bool {
        self.lock().contains_key(&id)
    }

    /// Number of live sessions.
    pub fn session_count(&self) -> usize {
        self.lock().len()
    }

    /// Queue `line` for one connection.
    ///
    /// Returns `false` when no session exists for `id`. A send to a queue
    /// whose connection is tearing down is swallowed: delivery is
    /// fire-and-forget.
    pub fn send(&self, id: u64, line: &str) -> bool {
        match self.lock().get(&id) {
            Some(session) => {
                let _ = session.outbound.send(line.to_string());
                true
            },
            None => false,
        }
    }

    /// Queue `line` for the first session whose username matches.
    ///
    /// Returns `false` when no session has that username. With duplicate
    /// usernames the scan order decides the recipient.
    pub fn send_to_username(&self, username: &str, line: &str) -> bool {
        let sessions = self.lock();
        for session in sessions.values() {
            if session.username == username {
                let _ = session.outbound.send(line.to_string());
                return true;
            }
        }
        false
    }

    /// Queue `line` for every session except `except`.
    pub fn broadcast(&self, except: u64, line: &str) {
        let sessions = self.lock();
        for (id, session) in sessions.iter() {
            if *id == except {
                continue;
            }
            let _ = session.outbound.send(line.to_string());
        }
    }

    /// Queue `line` for every `target` with a live session, skipping
    /// `except`.
    ///
    /// Returns the targets that had no live session. The caller is expected
    /// to purge those from whatever membership set produced `targets`; the
    /// registry itself defers all mutation until this iteration completes.
    pub fn fan_out(&self, targets: &[u64], except: u64, line: &str) -> Vec<u64> {
        let sessions = self.lock();
        let mut stale = Vec::new();
        for target in targets {
            match sessions.get(target) {
                Some(session) => {
                    if *target != except {
                        let _ = session.outbound.send(line.to_string());
                    }
                },
                None => stale.push(*target),
            }
        }
        stale
    }
}
