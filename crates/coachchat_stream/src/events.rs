//! Local projection of channel events.
//!
//! The session manager applies every transport event to a [`ChannelProjection`]
//! so UI code can read the current message list and typing indicators without
//! re-querying the transport.

use coachchat_common::models::ChatMessage;
use coachchat_common::services::ChannelEvent;
use std::collections::HashSet;

/// Locally maintained view of one channel: messages newest-first plus the set
/// of currently typing users.
#[derive(Debug, Clone, Default)]
pub struct ChannelProjection {
    /// Messages, newest first.
    pub messages: Vec<ChatMessage>,
    /// Ids of users currently typing.
    pub typing: HashSet<String>,
}

impl ChannelProjection {
    /// Replace the message list, e.g. from an initial history fetch.
    pub fn replace_messages(&mut self, messages: Vec<ChatMessage>) {
        self.messages = messages;
    }

    /// Apply one transport event to the projection.
    pub fn apply(&mut self, event: &ChannelEvent) {
        match event {
            ChannelEvent::MessageNew(message) => {
                self.messages.insert(0, message.clone());
            }
            ChannelEvent::MessageUpdated(message) => {
                for existing in self.messages.iter_mut() {
                    if existing.id == message.id {
                        *existing = message.clone();
                    }
                }
            }
            ChannelEvent::MessageDeleted(message) => {
                self.messages.retain(|m| m.id != message.id);
            }
            ChannelEvent::TypingStart(user) => {
                self.typing.insert(user.id.clone());
            }
            ChannelEvent::TypingStop(user) => {
                self.typing.remove(&user.id);
            }
        }
    }
}
