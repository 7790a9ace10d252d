use async_trait::async_trait;
use serde_json::Value;

use crate::{
    client::Client,
    models::channels::AnyChannel,
    types::{
        channel::Channel,
        enums::SocketErrorId,
        message::Message,
        server::{Emoji, Server},
        user::{Member, MemberCompositeKey, User},
        websocket::ServerToClientEvent,
    },
};

/// Callbacks for socket events. Every method defaults to doing nothing.
///
/// The cache is updated before any callback runs, so lookups inside a
/// callback already see the event applied. Callbacks run one at a time, in
/// the order events arrived.
#[async_trait]
pub trait EventHandler: Send + Sync + 'static {
    /// Called for *every* event that the server sends.
    /// Useful if you want a single place to inspect all events.
    async fn on_event(&self, _client: &Client, _event: &ServerToClientEvent) {}

    /// Called specifically when an "Error" event is received
    /// (e.g. a failed authentication).
    async fn on_error_event(&self, _client: &Client, _error: SocketErrorId) {}

    /// The connection was authenticated.
    async fn on_authenticated(&self, _client: &Client) {}

    /// The session was invalidated server-side.
    async fn on_logout(&self, _client: &Client) {}

    /// Called when a "Ready" event is received (**includes full payload**).
    async fn on_ready(&self, _client: &Client, _ready: &ReadyEvent) {}

    async fn on_pong(&self, _client: &Client, _data: i64) {}

    // ------------------------------------------------------------------
    // Messages
    // ------------------------------------------------------------------

    async fn on_message(&self, _client: &Client, _message: &Message) {}

    /// Called when a message is updated/edited.
    async fn on_message_update(&self, _client: &Client, _update: &MessageUpdateEvent) {}

    /// Called when content is appended to a message (e.g. embeds resolved).
    async fn on_message_append(&self, _client: &Client, _append: &MessageUpdateEvent) {}

    async fn on_message_delete(&self, _client: &Client, _delete: &MessageDeleteEvent) {}

    async fn on_bulk_message_delete(&self, _client: &Client, _channel_id: &str, _ids: &[String]) {}

    async fn on_message_react(&self, _client: &Client, _react: &ReactionEvent) {}

    async fn on_message_unreact(&self, _client: &Client, _unreact: &ReactionEvent) {}

    /// Called when *all* reactions of one emoji are removed.
    async fn on_message_remove_reaction(&self, _client: &Client, _remove: &ReactionEvent) {}

    // ------------------------------------------------------------------
    // Channels
    // ------------------------------------------------------------------

    async fn on_channel_create(&self, _client: &Client, _channel: &AnyChannel) {}

    async fn on_channel_update(&self, _client: &Client, _update: &PartialUpdateEvent) {}

    /// `channel` is the cached channel before deletion, if it was cached.
    async fn on_channel_delete(&self, _client: &Client, _id: &str, _channel: Option<&Channel>) {}

    async fn on_channel_group_join(&self, _client: &Client, _event: &ChannelUserEvent) {}

    async fn on_channel_group_leave(&self, _client: &Client, _event: &ChannelUserEvent) {}

    async fn on_typing_start(&self, _client: &Client, _event: &ChannelUserEvent) {}

    async fn on_typing_stop(&self, _client: &Client, _event: &ChannelUserEvent) {}

    /// A channel was marked as read up to `message_id` by `user`.
    async fn on_channel_ack(&self, _client: &Client, _event: &ChannelUserEvent, _message_id: &str) {}

    // ------------------------------------------------------------------
    // Servers
    // ------------------------------------------------------------------

    async fn on_server_create(&self, _client: &Client, _server: &Server) {}

    async fn on_server_update(&self, _client: &Client, _update: &PartialUpdateEvent) {}

    /// `server` is the cached server before deletion, if it was cached.
    async fn on_server_delete(&self, _client: &Client, _id: &str, _server: Option<&Server>) {}

    async fn on_member_join(&self, _client: &Client, _member: &MemberCompositeKey) {}

    async fn on_member_update(&self, _client: &Client, _member: &MemberCompositeKey, _update: &PartialUpdateEvent) {}

    async fn on_member_leave(&self, _client: &Client, _member: &MemberCompositeKey) {}

    async fn on_role_update(&self, _client: &Client, _role_id: &str, _update: &PartialUpdateEvent) {}

    async fn on_role_delete(&self, _client: &Client, _server_id: &str, _role_id: &str) {}

    // ------------------------------------------------------------------
    // Users and emojis
    // ------------------------------------------------------------------

    async fn on_user_update(&self, _client: &Client, _update: &PartialUpdateEvent) {}

    async fn on_user_relationship(&self, _client: &Client, _user: &User) {}

    async fn on_emoji_create(&self, _client: &Client, _emoji: &Emoji) {}

    async fn on_emoji_delete(&self, _client: &Client, _id: &str) {}
}

/// Data for a "Ready" event.
#[derive(Debug, Clone)]
pub struct ReadyEvent {
    pub users: Vec<User>,
    pub servers: Vec<Server>,
    pub channels: Vec<Channel>,
    pub members: Vec<Member>,
    pub emojis: Vec<Emoji>,
}

/// Data for "MessageUpdate" and "MessageAppend" events.
#[derive(Debug, Clone)]
pub struct MessageUpdateEvent {
    pub id: String,
    pub channel: String,
    /// The changed fields, in JSON form.
    pub data: Value,
}

#[derive(Debug, Clone)]
pub struct MessageDeleteEvent {
    pub id: String,
    pub channel: String,
}

/// Data for reaction events. `user_id` is `None` when all reactions of one
/// emoji were removed.
#[derive(Debug, Clone)]
pub struct ReactionEvent {
    pub message_id: String,
    pub channel_id: String,
    pub user_id: Option<String>,
    pub emoji_id: String,
}

/// A partial update to a channel, server, member, role or user.
///
/// `id` is the updated entity (the server, for member and role updates).
#[derive(Debug, Clone)]
pub struct PartialUpdateEvent {
    pub id: String,
    /// The changed fields, in JSON form.
    pub data: Value,
    /// Removed fields (e.g. "Description", "Icon").
    pub clear: Vec<String>,
}

/// A user doing something in a channel: joining, leaving, typing, reading.
#[derive(Debug, Clone)]
pub struct ChannelUserEvent {
    pub channel_id: String,
    pub user_id: String,
}
