//! Message routing: turns a parsed command from one sender into deliveries
//! and error replies.
//!
//! The router owns no state of its own - it reads and writes the two
//! registries and formats the wire text. Every operation is synchronous and
//! returns immediately; domain failures are reported to the sender as plain
//! text lines and never mutate state.
//!
//! The reply strings are part of the wire protocol and are kept byte-for-
//! byte stable, including the `"<user>has joined"` spacing in group
//! announcements.

use std::sync::Arc;

use palaver_proto::Command;

use crate::{
    groups::{GroupError, GroupRegistry},
    registry::SessionRegistry,
};

/// Stateless dispatch logic over the two registries.
#[derive(Debug, Clone)]
pub struct Router {
    sessions: Arc<SessionRegistry>,
    groups: Arc<GroupRegistry>,
}

impl Router {
    /// Create a router over the shared registries.
    pub fn new(sessions: Arc<SessionRegistry>, groups: Arc<GroupRegistry>) -> Self {
        Self { sessions, groups }
    }

    /// Route one parsed command from `sender`.
    ///
    /// `Exit` is not handled here - the connection handler intercepts it
    /// before dispatch.
    pub fn dispatch(&self, sender: u64, command: &Command) {
        match command {
            Command::Exit => {},
            Command::Broadcast { body } => self.broadcast(sender, body),
            Command::Direct { recipient, body } => self.direct_message(sender, recipient, body),
            Command::Group { group, body } => self.group_message(sender, group, body),
            Command::CreateGroup { name } => self.create_group(sender, name),
            Command::JoinGroup { name } => self.join_group(sender, name),
            Command::LeaveGroup { name } => self.leave_group(sender, name),
            Command::Syntax => {
                self.sessions.send(sender, "Error: Wrong Syntax.");
            },
            Command::Unknown => {
                self.sessions.send(sender, "Error: Unknown command.");
            },
        }
    }

    /// Deliver a broadcast to every other connection.
    pub fn broadcast(&self, sender: u64, body: &str) {
        let Some(username) = self.sessions.username(sender) else {
            return;
        };
        self.sessions.broadcast(sender, &format!("[Broadcast from {username}]: {body}"));
    }

    /// Deliver a direct message to the first connection matching
    /// `recipient`.
    ///
    /// The empty-body check runs before the recipient lookup, so an empty
    /// message to an unknown user reports "Empty msg.", not "not found".
    pub fn direct_message(&self, sender: u64, recipient: &str, body: &str) {
        if body.chars().all(|c| c == ' ') {
            self.sessions.send(sender, "Error: Empty msg.");
            return;
        }

        let Some(username) = self.sessions.username(sender) else {
            return;
        };

        if !self.sessions.send_to_username(recipient, &format!("[{username}]: {body}")) {
            self.sessions.send(sender, &format!("Error: User {recipient} not found."));
        }
    }

    /// Deliver a group message to every member except the sender.
    ///
    /// Members without a live session are collected during the fan-out and
    /// removed from the group afterwards (lazy purge) - the sender included,
    /// should it have gone stale mid-operation.
    pub fn group_message(&self, sender: u64, group: &str, body: &str) {
        let Some(members) = self.groups.members(group) else {
            self.sessions.send(sender, &format!("Error: Group {group} does not exist."));
            return;
        };

        if !members.contains(&sender) {
            self.sessions.send(sender, &format!("Error: You are not a member of group {group}."));
            return;
        }

        let stale = self.sessions.fan_out(&members, sender, &format!("[Group {group}]: {body}"));
        if !stale.is_empty() {
            self.groups.remove_members(group, &stale);
            tracing::debug!(group, purged = stale.len(), "purged stale group members");
        }
    }

    /// Create a group with the sender as its sole initial member.
    pub fn create_group(&self, sender: u64, name: &str) {
        if name.chars().all(|c| c == ' ') {
            self.sessions.send(sender, "Error: Group with no name cannot exist.");
            return;
        }

        match self.groups.create(name, sender) {
            Ok(()) => {
                self.sessions.send(sender, &format!("Group {name} created."));
                tracing::debug!(group = name, creator = sender, "group created");
            },
            Err(GroupError::AlreadyExists(_)) => {
                self.sessions.send(sender, &format!("Error: Group {name} already exist."));
            },
            Err(_) => {},
        }
    }

    /// Add the sender to a group and announce the join to the other
    /// members.
    pub fn join_group(&self, sender: u64, name: &str) {
        match self.groups.join(name, sender) {
            Ok(()) => {
                self.sessions.send(sender, &format!("You joined the group {name}."));
                if let Some(username) = self.sessions.username(sender) {
                    self.group_message(sender, name, &format!("{username}has joined the group {name}."));
                }
            },
            Err(GroupError::NotFound(_)) => {
                self.sessions.send(sender, &format!("Error: Group {name} does not exist."));
            },
            Err(GroupError::AlreadyMember(_)) => {
                self.sessions
                    .send(sender, &format!("Error: You are already a member of the group {name}."));
            },
            Err(_) => {},
        }
    }

    /// Remove the sender from a group and announce the departure to the
    /// remaining members.
    pub fn leave_group(&self, sender: u64, name: &str) {
        match self.groups.leave(name, sender) {
            Ok(()) => {
                self.sessions.send(sender, &format!("You left the group {name}."));

                // The sender is out of the member set already, so the
                // announcement fans out directly to whoever remains.
                let Some(username) = self.sessions.username(sender) else {
                    return;
                };
                if let Some(members) = self.groups.members(name) {
                    let text = format!("[Group {name}]: {username}has left the group {name}.");
                    let stale = self.sessions.fan_out(&members, sender, &text);
                    if !stale.is_empty() {
                        self.groups.remove_members(name, &stale);
                    }
                }
            },
            Err(GroupError::NotFound(_)) => {
                self.sessions.send(sender, &format!("Error: Group {name} does not exist."));
            },
            Err(GroupError::NotMember(_)) => {
                self.sessions
                    .send(sender, &format!("Error: You were not a member of the group {name}."));
            },
            Err(_) => {},
        }
    }
}
