use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{
    channel::Channel,
    enums::SocketErrorId,
    message::Message,
    server::{Emoji, Server},
    user::{Member, MemberCompositeKey, RelationshipStatus, User},
};

/// Represents every possible event the client can send to the server.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "PascalCase")]
pub enum ClientToServerEvent {
    Authenticate { token: String },
    BeginTyping { channel: String },
    EndTyping { channel: String },
    Ping { data: i64 },
    /// Ask for member presence updates of a server.
    Subscribe { server_id: String },
}

/// Every server → client event of the event socket.
///
/// Partial updates keep their `data` as raw JSON; they are merged into cached
/// entities by [`crate::cache::Cache`].
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "PascalCase")]
pub enum ServerToClientEvent {
    /// Server responded with an error on authentication or other issue.
    Error { error: SocketErrorId },
    /// Connection has been authenticated successfully.
    Authenticated,
    /// The current session has been invalidated.
    Logout,
    /// A bulk event containing multiple sub-events.
    Bulk { v: Vec<ServerToClientEvent> },
    Pong { data: i64 },

    /// Initial state of everything visible to the account.
    Ready {
        #[serde(default)]
        users: Vec<User>,
        #[serde(default)]
        servers: Vec<Server>,
        #[serde(default)]
        channels: Vec<Channel>,
        #[serde(default)]
        members: Vec<Member>,
        #[serde(default)]
        emojis: Vec<Emoji>,
    },

    // -- MESSAGE EVENTS --
    Message(Message),
    MessageUpdate {
        id: String,
        channel: String,
        data: Value,
    },
    MessageAppend {
        id: String,
        channel: String,
        append: Value,
    },
    MessageDelete {
        id: String,
        channel: String,
    },
    BulkMessageDelete {
        channel: String,
        ids: Vec<String>,
    },
    MessageReact {
        id: String,
        channel_id: String,
        user_id: String,
        emoji_id: String,
    },
    MessageUnreact {
        id: String,
        channel_id: String,
        user_id: String,
        emoji_id: String,
    },
    MessageRemoveReaction {
        id: String,
        channel_id: String,
        emoji_id: String,
    },

    // -- CHANNEL EVENTS --
    ChannelCreate(Channel),
    ChannelUpdate {
        id: String,
        data: Value,
        #[serde(default)]
        clear: Vec<String>,
    },
    ChannelDelete {
        id: String,
    },
    ChannelGroupJoin {
        id: String,
        user: String,
    },
    ChannelGroupLeave {
        id: String,
        user: String,
    },
    ChannelStartTyping {
        id: String,
        user: String,
    },
    ChannelStopTyping {
        id: String,
        user: String,
    },
    ChannelAck {
        id: String,
        user: String,
        message_id: String,
    },

    // -- SERVER EVENTS --
    ServerCreate {
        id: String,
        server: Server,
        #[serde(default)]
        channels: Vec<Channel>,
        #[serde(default)]
        emojis: Vec<Emoji>,
    },
    ServerUpdate {
        id: String,
        data: Value,
        #[serde(default)]
        clear: Vec<String>,
    },
    ServerDelete {
        id: String,
    },
    ServerMemberUpdate {
        id: MemberCompositeKey,
        data: Value,
        #[serde(default)]
        clear: Vec<String>,
    },
    ServerMemberJoin {
        id: String,
        user: String,
    },
    ServerMemberLeave {
        id: String,
        user: String,
    },
    ServerRoleUpdate {
        id: String,
        role_id: String,
        data: Value,
        #[serde(default)]
        clear: Vec<String>,
    },
    ServerRoleDelete {
        id: String,
        role_id: String,
    },

    // -- USER EVENTS --
    UserUpdate {
        id: String,
        data: Value,
        #[serde(default)]
        clear: Vec<String>,
    },
    UserRelationship {
        id: String,
        user: User,
        #[serde(default)]
        status: Option<RelationshipStatus>,
    },
    UserPlatformWipe {
        user_id: String,
        flags: i64,
    },

    // -- EMOJI EVENTS --
    EmojiCreate(Emoji),
    EmojiDelete {
        id: String,
    },

    // -- AUTHIFIER EVENTS --
    Auth {
        event_type: String,
        #[serde(flatten)]
        data: Value,
    },

    /// An event type this crate does not know about.
    #[serde(other)]
    Unknown,
}

impl ServerToClientEvent {
    /// Flatten `Bulk` events, recursively and in order.
    pub fn flatten(self) -> Vec<ServerToClientEvent> {
        let mut out = Vec::new();
        let mut stack = vec![self];
        while let Some(event) = stack.pop() {
            match event {
                Self::Bulk { v } => stack.extend(v.into_iter().rev()),
                other => out.push(other),
            }
        }
        out
    }
}
