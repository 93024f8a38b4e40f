//! Per-conversation pending state.
//!
//! When a handler needs more input it records a [`PendingEntry`] for the
//! conversation. The next plain message in that conversation is then routed
//! back to the pending command instead of being treated as chat.
//!
//! Entries expire after the configured time-to-live so an abandoned question
//! does not capture a message sent hours later.

use std::{
    collections::HashMap,
    time::{Duration, Instant},
};

use log::debug;

/// What a conversation is waiting for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingEntry<C> {
    /// Command the next message belongs to
    pub command: C,
    /// `true` when the next plain message is the argument of `command`
    pub awaiting_argument: bool,
    /// Argument of the previous run, kept for continuation questions
    pub argument: Option<String>,
    /// Page of the previous run, kept for continuation questions
    pub page: u32,
    /// Creation time, used for expiry
    pub created_at: Instant,
}

impl<C> PendingEntry<C> {
    /// Entry waiting for the argument of `command`.
    pub fn awaiting(command: C) -> Self {
        PendingEntry {
            command,
            awaiting_argument: true,
            argument: None,
            page: 1,
            created_at: Instant::now(),
        }
    }

    /// Entry remembering where a paginated answer stopped.
    pub fn continuation(command: C, argument: String, page: u32) -> Self {
        PendingEntry {
            command,
            awaiting_argument: false,
            argument: Some(argument),
            page,
            created_at: Instant::now(),
        }
    }
}

/// Map from conversation id to its pending entry.
///
/// There is at most one entry per conversation, setting a new one replaces
/// the previous one.
#[derive(Debug)]
pub struct PendingCache<C> {
    entries: HashMap<String, PendingEntry<C>>,
    /// `None` disables expiry
    ttl: Option<Duration>,
}

impl<C: Clone> PendingCache<C> {
    pub fn new(ttl: Option<Duration>) -> Self {
        PendingCache {
            entries: HashMap::new(),
            ttl,
        }
    }

    /// Returns the live entry of a conversation.
    ///
    /// An expired entry is dropped and `None` is returned.
    pub fn get(&mut self, conversation_id: &str) -> Option<PendingEntry<C>> {
        let expired = self
            .entries
            .get(conversation_id)
            .is_some_and(|entry| self.is_expired(entry, Instant::now()));

        if expired {
            debug!("pending entry of {conversation_id} expired");
            self.entries.remove(conversation_id);
            return None;
        }

        self.entries.get(conversation_id).cloned()
    }

    /// Stores `entry` for the conversation, replacing any previous one.
    pub fn set(&mut self, conversation_id: &str, entry: PendingEntry<C>) {
        debug!("set pending entry for {conversation_id}");
        self.entries.insert(conversation_id.to_owned(), entry);
    }

    /// Removes the entry of the conversation. Clearing twice is a no-op.
    pub fn clear(&mut self, conversation_id: &str) {
        if self.entries.remove(conversation_id).is_some() {
            debug!("cleared pending entry for {conversation_id}");
        }
    }

    /// Drops every expired entry.
    pub fn purge_expired(&mut self) {
        let now = Instant::now();
        let Some(ttl) = self.ttl else {
            return;
        };
        self.entries
            .retain(|_, entry| now.saturating_duration_since(entry.created_at) < ttl);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    fn is_expired(&self, entry: &PendingEntry<C>, now: Instant) -> bool {
        self.ttl
            .is_some_and(|ttl| now.saturating_duration_since(entry.created_at) >= ttl)
    }
}
