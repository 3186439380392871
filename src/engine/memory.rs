//! Bounded per-conversation memory of prior turns.
//!
//! Each conversation owns an ordered log of [`Turn`]s capped at a fixed
//! maximum; the oldest turns are evicted first once the cap is exceeded.
//! Logs are created lazily on first use and live for the process lifetime.

use std::{
    collections::{HashMap, VecDeque},
    sync::{Arc, Mutex},
};

use crate::base::types::{ConversationId, Turn};

/// Registry of conversation memories.
///
/// Each conversation's log sits behind its own async mutex so one routing
/// call can hold the log exclusively across its read-complete-append span
/// without blocking other conversations.
pub struct MemoryStore {
    cap: usize,
    conversations: Mutex<HashMap<ConversationId, Arc<tokio::sync::Mutex<ConversationMemory>>>>,
}

impl MemoryStore {
    pub fn new(cap: usize) -> Self {
        Self {
            cap,
            conversations: Mutex::new(HashMap::new()),
        }
    }

    /// The memory slot for one conversation, created lazily on first use.
    pub fn slot(&self, conversation: ConversationId) -> Arc<tokio::sync::Mutex<ConversationMemory>> {
        let mut conversations = self.conversations.lock().expect("memory registry lock poisoned");

        conversations
            .entry(conversation)
            .or_insert_with(|| Arc::new(tokio::sync::Mutex::new(ConversationMemory::new(self.cap))))
            .clone()
    }
}

/// The ordered turn log of a single conversation.
pub struct ConversationMemory {
    cap: usize,
    turns: VecDeque<Turn>,
}

impl ConversationMemory {
    fn new(cap: usize) -> Self {
        Self { cap, turns: VecDeque::new() }
    }

    /// Appends a turn, evicting from the front until within the cap.
    pub fn append(&mut self, turn: Turn) {
        self.turns.push_back(turn);

        while self.turns.len() > self.cap {
            self.turns.pop_front();
        }
    }

    /// The most recent turns, oldest first.
    ///
    /// Returns at most `cap - 1` turns so the assembled context always has
    /// room for the system prompt and the new user turn.
    pub fn recent_turns(&self) -> Vec<Turn> {
        let skip = (self.turns.len() + 1).saturating_sub(self.cap);

        self.turns.iter().skip(skip).cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }
}

// Tests.
