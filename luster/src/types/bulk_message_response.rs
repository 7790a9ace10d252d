use serde::{Deserialize, Serialize};

use super::{
    message::Message,
    user::{Member, User},
};
use crate::state::State;

/// Bulk Message Response can be:
/// 1) An array of messages
/// 2) An object: { messages: [...], users: [...], members: [...] }
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum BulkMessageResponse {
    Messages(Vec<Message>),
    MessagesWithUsers {
        messages: Vec<Message>,
        users: Vec<User>,
        members: Option<Vec<Member>>,
    },
}

impl BulkMessageResponse {
    /// Attach the shared state to each `Message`.
    pub fn inject_state(&mut self, state: &State) {
        for m in self.messages_mut() {
            m.state = Some(state.clone());
        }
    }

    pub fn messages(&self) -> &[Message] {
        match self {
            Self::Messages(vec) => vec,
            Self::MessagesWithUsers { messages, .. } => messages,
        }
    }

    fn messages_mut(&mut self) -> &mut Vec<Message> {
        match self {
            Self::Messages(vec) => vec,
            Self::MessagesWithUsers { messages, .. } => messages,
        }
    }

    pub fn into_messages(self) -> Vec<Message> {
        match self {
            Self::Messages(vec) => vec,
            Self::MessagesWithUsers { messages, .. } => messages,
        }
    }
}
