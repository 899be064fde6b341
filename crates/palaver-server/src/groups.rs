//! Group registry: named member sets for group-scoped messages.
//!
//! Groups are created explicitly and persist once created, even when the
//! last member leaves. Membership is not eagerly synchronized with the
//! session registry: a member that disconnects without leaving stays in the
//! set until the next group message purges it via [`GroupRegistry::remove_members`].
//!
//! This is the second lock domain in the server, independent from the
//! session registry; no operation here touches both locks.

use std::{
    collections::{HashMap, HashSet},
    sync::{Mutex, MutexGuard, PoisonError},
};

use thiserror::Error;

/// Errors from group registry operations.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum GroupError {
    /// No group with this name exists.
    #[error("group {0} does not exist")]
    NotFound(String),

    /// A group with this name already exists.
    #[error("group {0} already exists")]
    AlreadyExists(String),

    /// The connection is already a member of the group.
    #[error("already a member of group {0}")]
    AlreadyMember(String),

    /// The connection is not a member of the group.
    #[error("not a member of group {0}")]
    NotMember(String),
}

/// Registry of groups and their member connection identities.
#[derive(Debug, Default)]
pub struct GroupRegistry {
    groups: Mutex<HashMap<String, HashSet<u64>>>,
}

impl GroupRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry operations never leave the map mid-mutation, so a poisoned
    /// lock still guards a consistent map.
    fn lock(&self) -> MutexGuard<'_, HashMap<String, HashSet<u64>>> {
        self.groups.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Create a group with `creator` as its sole initial member.
    pub fn create(&self, name: &str, creator: u64) -> Result<(), GroupError> {
        let mut groups = self.lock();
        if groups.contains_key(name) {
            return Err(GroupError::AlreadyExists(name.to_string()));
        }
        groups.insert(name.to_string(), HashSet::from([creator]));
        Ok(())
    }

    /// Add a connection to a group's member set.
    pub fn join(&self, name: &str, id: u64) -> Result<(), GroupError> {
        let mut groups = self.lock();
        let members = groups
            .get_mut(name)
            .ok_or_else(|| GroupError::NotFound(name.to_string()))?;
        if !members.insert(id) {
            return Err(GroupError::AlreadyMember(name.to_string()));
        }
        Ok(())
    }

    /// Remove a connection from a group's member set.
    ///
    /// The group itself survives, even when it becomes empty.
    pub fn leave(&self, name: &str, id: u64) -> Result<(), GroupError> {
        let mut groups = self.lock();
        let members = groups
            .get_mut(name)
            .ok_or_else(|| GroupError::NotFound(name.to_string()))?;
        if !members.remove(&id) {
            return Err(GroupError::NotMember(name.to_string()));
        }
        Ok(())
    }

    /// Snapshot of a group's members, for iteration outside the lock.
    ///
    /// `None` when the group does not exist.
    pub fn members(&self, name: &str) -> Option<Vec<u64>> {
        self.lock().get(name).map(|members| members.iter().copied().collect())
    }

    /// Remove several members at once (the lazy purge of stale identities).
    ///
    /// Absent members and an absent group are silently tolerated: by the
    /// time a purge runs, a racing operation may have removed them already.
    pub fn remove_members(&self, name: &str, ids: &[u64]) {
        let mut groups = self.lock();
        if let Some(members) = groups.get_mut(name) {
            for id in ids {
                members.remove(id);
            }
        }
    }

    /// Whether a group with this name exists.
    pub fn contains(&self, name: &str) -> bool {
        self.lock().contains_key(name)
    }

    /// Number of groups.
    pub fn group_count(&self) -> usize {
        self.lock().len()
    }
}
