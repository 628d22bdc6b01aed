//! Bounded log of room chat, fed by relay broadcasts

use log::debug;
use shared::{ChatMessage, PeerId, CHAT_BACKLOG};
use std::collections::HashMap;

pub struct ChatLog {
    messages: Vec<ChatMessage>,
}

impl ChatLog {
    pub fn new() -> Self {
        Self {
            messages: Vec::new(),
        }
    }

    /// Appends a broadcast message. A redelivered id is ignored.
    pub fn push(&mut self, message: ChatMessage) {
        if self.messages.iter().any(|m| m.id == message.id) {
            debug!("Ignoring duplicate chat message {}", message.id);
            return;
        }

        self.messages.push(message);
        if self.messages.len() > CHAT_BACKLOG {
            self.messages.remove(0);
        }
    }

    /// Replaces the reaction map on a known message. An update for a
    /// message that has scrolled out of the backlog is a no-op.
    pub fn apply_reactions(&mut self, message_id: &str, reactions: HashMap<String, Vec<PeerId>>) {
        if let Some(message) = self.messages.iter_mut().find(|m| m.id == message_id) {
            message.reactions = reactions;
        }
    }

    pub fn latest(&self) -> Option<&ChatMessage> {
        self.messages.last()
    }

    /// The most recent `count` messages, oldest first.
    pub fn recent(&self, count: usize) -> &[ChatMessage] {
        let start = self.messages.len().saturating_sub(count);
        &self.messages[start..]
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}

impl Default for ChatLog {
    fn default() -> Self {
        Self::new()
    }
}
