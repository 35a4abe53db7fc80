//! Online-user presence tracking
//!
//! The server is the sole source of truth for room membership: every
//! `onlineUsers` event carries the full set, and each snapshot replaces
//! the previous one wholesale. No incremental add/remove exists, and no
//! filtering (such as hiding the local user) happens here.

use std::collections::HashSet;

use banter_protocol::UserIdentity;

/// Current set of online users, unique by id
#[derive(Debug, Default)]
pub struct PresenceTracker {
    online: Vec<UserIdentity>,
}

impl PresenceTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the presence set with a fresh snapshot.
    ///
    /// Duplicate ids within one snapshot keep their first occurrence.
    pub fn on_snapshot(&mut self, users: Vec<UserIdentity>) {
        let mut seen = HashSet::new();
        self.online = users
            .into_iter()
            .filter(|u| seen.insert(u.id.clone()))
            .collect();
    }

    pub fn online(&self) -> &[UserIdentity] {
        &self.online
    }

    pub fn len(&self) -> usize {
        self.online.len()
    }

    pub fn is_empty(&self) -> bool {
        self.online.is_empty()
    }
}
