//! In-memory cache of entities seen on the event socket.
//!
//! The cache is filled by the `Ready` event and kept current by the events
//! that follow it. Lookups return clones so no lock is held by callers.

use std::collections::HashMap;

use serde_json::Value;
use tokio::sync::RwLock;
use tracing::warn;

use crate::{
    types::{
        channel::Channel,
        server::{Emoji, Role, Server},
        user::{Member, MemberCompositeKey, User},
        websocket::ServerToClientEvent,
    },
    util::apply_partial,
};

#[derive(Debug, Default)]
pub struct Cache {
    users: RwLock<HashMap<String, User>>,
    channels: RwLock<HashMap<String, Channel>>,
    servers: RwLock<HashMap<String, Server>>,
    members: RwLock<HashMap<MemberCompositeKey, Member>>,
    emojis: RwLock<HashMap<String, Emoji>>,
}

impl Cache {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn get_user(&self, id: &str) -> Option<User> {
        self.users.read().await.get(id).cloned()
    }

    pub async fn get_channel(&self, id: &str) -> Option<Channel> {
        self.channels.read().await.get(id).cloned()
    }

    pub async fn get_server(&self, id: &str) -> Option<Server> {
        self.servers.read().await.get(id).cloned()
    }

    pub async fn get_member(&self, server_id: &str, user_id: &str) -> Option<Member> {
        let key = MemberCompositeKey {
            server: server_id.to_string(),
            user: user_id.to_string(),
        };
        self.members.read().await.get(&key).cloned()
    }

    pub async fn get_emoji(&self, id: &str) -> Option<Emoji> {
        self.emojis.read().await.get(id).cloned()
    }

    /// Cached channels of a server, in the server's channel order.
    pub async fn channels_of_server(&self, server_id: &str) -> Vec<Channel> {
        let Some(server) = self.get_server(server_id).await else {
            return Vec::new();
        };
        let channels = self.channels.read().await;
        server
            .channels
            .iter()
            .filter_map(|id| channels.get(id).cloned())
            .collect()
    }

    pub async fn users(&self) -> Vec<User> {
        self.users.read().await.values().cloned().collect()
    }

    pub async fn servers(&self) -> Vec<Server> {
        self.servers.read().await.values().cloned().collect()
    }

    pub async fn insert_user(&self, user: User) {
        self.users.write().await.insert(user.id.clone(), user);
    }

    pub async fn insert_channel(&self, channel: Channel) {
        if let Some(server_id) = channel.server_id() {
            if let Some(server) = self.servers.write().await.get_mut(server_id) {
                if !server.channels.iter().any(|c| c == channel.id()) {
                    server.channels.push(channel.id().to_string());
                }
            }
        }
        self.channels
            .write()
            .await
            .insert(channel.id().to_string(), channel);
    }

    pub async fn insert_server(&self, server: Server) {
        self.servers.write().await.insert(server.id.clone(), server);
    }

    pub async fn clear(&self) {
        self.users.write().await.clear();
        self.channels.write().await.clear();
        self.servers.write().await.clear();
        self.members.write().await.clear();
        self.emojis.write().await.clear();
    }

    /// Replace the whole cache with the contents of a `Ready` event.
    pub async fn apply_ready(
        &self,
        users: &[User],
        servers: &[Server],
        channels: &[Channel],
        members: &[Member],
        emojis: &[Emoji],
    ) {
        self.clear().await;

        *self.users.write().await = users.iter().map(|u| (u.id.clone(), u.clone())).collect();
        *self.servers.write().await = servers.iter().map(|s| (s.id.clone(), s.clone())).collect();
        *self.channels.write().await = channels
            .iter()
            .map(|c| (c.id().to_string(), c.clone()))
            .collect();
        *self.members.write().await = members.iter().map(|m| (m.id.clone(), m.clone())).collect();
        *self.emojis.write().await = emojis.iter().map(|e| (e.id.clone(), e.clone())).collect();
    }

    /// Update the cache from one (non-bulk) socket event.
    pub async fn apply_event(&self, event: &ServerToClientEvent) {
        match event {
            ServerToClientEvent::Ready {
                users,
                servers,
                channels,
                members,
                emojis,
            } => {
                self.apply_ready(users, servers, channels, members, emojis)
                    .await;
            }

            ServerToClientEvent::Message(message) => {
                if let Some(channel) = self.channels.write().await.get_mut(&message.channel) {
                    channel.set_last_message_id(&message.id);
                }
                if let Some(user) = &message.user {
                    self.insert_user(user.clone()).await;
                }
            }

            ServerToClientEvent::ChannelCreate(channel) => {
                self.insert_channel(channel.clone()).await;
            }
            ServerToClientEvent::ChannelUpdate { id, data, clear } => {
                if let Some(channel) = self.channels.write().await.get_mut(id) {
                    patch("channel", id, channel, data, clear);
                }
            }
            ServerToClientEvent::ChannelDelete { id } => {
                self.remove_channel(id).await;
            }
            ServerToClientEvent::ChannelGroupJoin { id, user } => {
                if let Some(recipients) = self
                    .channels
                    .write()
                    .await
                    .get_mut(id)
                    .and_then(Channel::recipients_mut)
                {
                    if !recipients.contains(user) {
                        recipients.push(user.clone());
                    }
                }
            }
            ServerToClientEvent::ChannelGroupLeave { id, user } => {
                if let Some(recipients) = self
                    .channels
                    .write()
                    .await
                    .get_mut(id)
                    .and_then(Channel::recipients_mut)
                {
                    recipients.retain(|r| r != user);
                }
            }

            ServerToClientEvent::ServerCreate {
                server,
                channels,
                emojis,
                ..
            } => {
                self.insert_server(server.clone()).await;
                for channel in channels {
                    self.insert_channel(channel.clone()).await;
                }
                let mut cached = self.emojis.write().await;
                for emoji in emojis {
                    cached.insert(emoji.id.clone(), emoji.clone());
                }
            }
            ServerToClientEvent::ServerUpdate { id, data, clear } => {
                if let Some(server) = self.servers.write().await.get_mut(id) {
                    patch("server", id, server, data, clear);
                }
            }
            ServerToClientEvent::ServerDelete { id } => {
                self.remove_server(id).await;
            }
            ServerToClientEvent::ServerMemberUpdate { id, data, clear } => {
                if let Some(member) = self.members.write().await.get_mut(id) {
                    patch("member", &id.user, member, data, clear);
                }
            }
            ServerToClientEvent::ServerMemberLeave { id, user } => {
                let key = MemberCompositeKey {
                    server: id.clone(),
                    user: user.clone(),
                };
                self.members.write().await.remove(&key);
            }
            ServerToClientEvent::ServerRoleUpdate {
                id,
                role_id,
                data,
                clear,
            } => {
                if let Some(server) = self.servers.write().await.get_mut(id) {
                    match server.roles.get_mut(role_id) {
                        Some(role) => patch("role", role_id, role, data, clear),
                        None => match serde_json::from_value::<Role>(data.clone()) {
                            Ok(role) => {
                                server.roles.insert(role_id.clone(), role);
                            }
                            Err(e) => warn!(role_id, "could not build role from update: {e}"),
                        },
                    }
                }
            }
            ServerToClientEvent::ServerRoleDelete { id, role_id } => {
                if let Some(server) = self.servers.write().await.get_mut(id) {
                    server.roles.remove(role_id);
                }
            }

            ServerToClientEvent::UserUpdate { id, data, clear } => {
                if let Some(user) = self.users.write().await.get_mut(id) {
                    patch("user", id, user, data, clear);
                }
            }
            ServerToClientEvent::UserRelationship { user, .. } => {
                self.insert_user(user.clone()).await;
            }
            ServerToClientEvent::UserPlatformWipe { user_id, .. } => {
                self.users.write().await.remove(user_id);
            }

            ServerToClientEvent::EmojiCreate(emoji) => {
                self.emojis
                    .write()
                    .await
                    .insert(emoji.id.clone(), emoji.clone());
            }
            ServerToClientEvent::EmojiDelete { id } => {
                self.emojis.write().await.remove(id);
            }

            _ => {}
        }
    }

    async fn remove_channel(&self, id: &str) {
        let Some(channel) = self.channels.write().await.remove(id) else {
            return;
        };

        if let Some(server_id) = channel.server_id() {
            if let Some(server) = self.servers.write().await.get_mut(server_id) {
                server.channels.retain(|c| c != id);
                if let Some(categories) = &mut server.categories {
                    for category in categories {
                        category.channels.retain(|c| c != id);
                    }
                }
            }
        }
    }

    async fn remove_server(&self, id: &str) {
        let Some(server) = self.servers.write().await.remove(id) else {
            return;
        };

        let mut channels = self.channels.write().await;
        for channel_id in &server.channels {
            channels.remove(channel_id);
        }
        drop(channels);

        self.members.write().await.retain(|key, _| key.server != id);
        self.emojis
            .write()
            .await
            .retain(|_, e| e.parent.get("id").and_then(Value::as_str) != Some(id));
    }
}

fn patch<T>(kind: &str, id: &str, target: &mut T, data: &Value, clear: &[String])
where
    T: serde::Serialize + serde::de::DeserializeOwned,
{
    if let Err(e) = apply_partial(target, data, clear) {
        warn!(kind, id, "could not apply partial update: {e}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::user::RelationshipStatus;
    use serde_json::json;

    fn event(value: Value) -> ServerToClientEvent {
        serde_json::from_value(value).unwrap()
    }

    fn ready() -> ServerToClientEvent {
        event(json!({
            "type": "Ready",
            "users": [{"_id": "U1", "username": "ahmad", "discriminator": "0001",
                       "status": {"text": "coding", "presence": "Busy"}}],
            "servers": [{"_id": "S1", "owner": "U1", "name": "Luster",
                         "channels": ["C1", "C2"],
                         "categories": [{"id": "K1", "title": "Talk", "channels": ["C1", "C2"]}]}],
            "channels": [
                {"channel_type": "TextChannel", "_id": "C1", "server": "S1", "name": "general",
                 "description": "chat here"},
                {"channel_type": "VoiceChannel", "_id": "C2", "server": "S1", "name": "voice"},
                {"channel_type": "Group", "_id": "G1", "name": "pals", "owner": "U1", "recipients": ["U1"]}
            ],
            "members": [{"_id": {"server": "S1", "user": "U1"}, "joined_at": "2023-01-01T00:00:00Z"}]
        }))
    }

    #[tokio::test]
    async fn ready_fills_the_cache() {
        let cache = Cache::new();
        cache.apply_event(&ready()).await;

        assert_eq!(cache.get_user("U1").await.unwrap().username, "ahmad");
        assert_eq!(cache.get_server("S1").await.unwrap().name, "Luster");
        assert!(cache.get_member("S1", "U1").await.is_some());
        let ids: Vec<String> = cache
            .channels_of_server("S1")
            .await
            .iter()
            .map(|c| c.id().to_string())
            .collect();
        assert_eq!(ids, vec!["C1", "C2"]);
    }

    #[tokio::test]
    async fn channel_update_patches_and_clears() {
        let cache = Cache::new();
        cache.apply_event(&ready()).await;
        cache
            .apply_event(&event(json!({
                "type": "ChannelUpdate",
                "id": "C1",
                "data": {"name": "lobby", "nsfw": true},
                "clear": ["Description"]
            })))
            .await;

        let Some(Channel::TextChannel(ch)) = cache.get_channel("C1").await else {
            panic!("text channel missing");
        };
        assert_eq!(ch.name, "lobby");
        assert!(ch.nsfw);
        assert!(ch.description.is_none());
    }

    #[tokio::test]
    async fn update_for_unknown_id_is_ignored() {
        let cache = Cache::new();
        cache
            .apply_event(&event(json!({"type": "UserUpdate", "id": "nobody", "data": {"online": true}})))
            .await;
        assert!(cache.get_user("nobody").await.is_none());
    }

    #[tokio::test]
    async fn user_status_text_is_cleared_in_place() {
        let cache = Cache::new();
        cache.apply_event(&ready()).await;
        cache
            .apply_event(&event(json!({
                "type": "UserUpdate",
                "id": "U1",
                "data": {"online": true},
                "clear": ["StatusText"]
            })))
            .await;

        let user = cache.get_user("U1").await.unwrap();
        assert!(user.online);
        let status = user.status.unwrap();
        assert!(status.text.is_none());
        assert!(status.presence.is_some());
    }

    #[tokio::test]
    async fn channel_delete_unlinks_from_server() {
        let cache = Cache::new();
        cache.apply_event(&ready()).await;
        cache
            .apply_event(&event(json!({"type": "ChannelDelete", "id": "C1"})))
            .await;

        assert!(cache.get_channel("C1").await.is_none());
        let server = cache.get_server("S1").await.unwrap();
        assert_eq!(server.channels, vec!["C2"]);
        assert_eq!(server.categories.unwrap()[0].channels, vec!["C2"]);
    }

    #[tokio::test]
    async fn group_membership_events() {
        let cache = Cache::new();
        cache.apply_event(&ready()).await;
        let join = event(json!({"type": "ChannelGroupJoin", "id": "G1", "user": "U2"}));
        cache.apply_event(&join).await;
        cache.apply_event(&join).await;
        cache
            .apply_event(&event(json!({"type": "ChannelGroupLeave", "id": "G1", "user": "U1"})))
            .await;

        let Some(Channel::Group(group)) = cache.get_channel("G1").await else {
            panic!("group missing");
        };
        assert_eq!(group.recipients, vec!["U2"]);
    }

    #[tokio::test]
    async fn server_delete_drops_children() {
        let cache = Cache::new();
        cache.apply_event(&ready()).await;
        cache
            .apply_event(&event(json!({"type": "ServerDelete", "id": "S1"})))
            .await;

        assert!(cache.get_server("S1").await.is_none());
        assert!(cache.get_channel("C1").await.is_none());
        assert!(cache.get_member("S1", "U1").await.is_none());
        assert!(cache.get_channel("G1").await.is_some());
    }

    fn file(id: &str) -> Value {
        json!({"_id": id, "tag": "icons", "filename": "a.png",
               "metadata": {"type": "Image", "width": 64, "height": 64},
               "content_type": "image/png", "size": 10})
    }

    #[tokio::test]
    async fn channel_icon_is_cleared() {
        let cache = Cache::new();
        cache.apply_event(&ready()).await;
        cache
            .apply_event(&event(json!({"type": "ChannelUpdate", "id": "C1", "data": {"icon": file("I1")}})))
            .await;
        let Some(Channel::TextChannel(ch)) = cache.get_channel("C1").await else {
            panic!("text channel missing");
        };
        assert_eq!(ch.icon.map(|f| f.id).as_deref(), Some("I1"));

        cache
            .apply_event(&event(json!({"type": "ChannelUpdate", "id": "C1", "data": {}, "clear": ["Icon"]})))
            .await;
        let Some(Channel::TextChannel(ch)) = cache.get_channel("C1").await else {
            panic!("text channel missing");
        };
        assert!(ch.icon.is_none());
        assert_eq!(ch.description.as_deref(), Some("chat here"));
    }

    #[tokio::test]
    async fn server_update_clears_every_optional_field() {
        let cache = Cache::new();
        cache.apply_event(&ready()).await;
        cache
            .apply_event(&event(json!({
                "type": "ServerUpdate",
                "id": "S1",
                "data": {"description": "about", "icon": file("I1"), "banner": file("B1")}
            })))
            .await;
        let server = cache.get_server("S1").await.unwrap();
        assert_eq!(server.description.as_deref(), Some("about"));
        assert!(server.icon.is_some() && server.banner.is_some());

        cache
            .apply_event(&event(json!({
                "type": "ServerUpdate",
                "id": "S1",
                "data": {"name": "Renamed"},
                "clear": ["Description", "Icon", "Banner", "Categories"]
            })))
            .await;
        let server = cache.get_server("S1").await.unwrap();
        assert_eq!(server.name, "Renamed");
        assert!(server.description.is_none());
        assert!(server.icon.is_none());
        assert!(server.banner.is_none());
        assert!(server.categories.is_none());
        assert_eq!(server.channels, vec!["C1", "C2"]);
    }

    #[tokio::test]
    async fn user_avatar_and_display_name_are_cleared() {
        let cache = Cache::new();
        cache.apply_event(&ready()).await;
        cache
            .apply_event(&event(json!({
                "type": "UserUpdate",
                "id": "U1",
                "data": {"display_name": "Ahmad", "avatar": file("A1")}
            })))
            .await;
        let user = cache.get_user("U1").await.unwrap();
        assert_eq!(user.name(), "Ahmad");
        assert!(user.avatar.is_some());

        cache
            .apply_event(&event(json!({
                "type": "UserUpdate",
                "id": "U1",
                "data": {},
                "clear": ["Avatar", "DisplayName"]
            })))
            .await;
        let user = cache.get_user("U1").await.unwrap();
        assert_eq!(user.name(), "ahmad");
        assert!(user.avatar.is_none());
        assert_eq!(user.status.unwrap().text.as_deref(), Some("coding"));
    }

    #[tokio::test]
    async fn member_update_and_leave() {
        let cache = Cache::new();
        cache.apply_event(&ready()).await;
        cache
            .apply_event(&event(json!({
                "type": "ServerMemberUpdate",
                "id": {"server": "S1", "user": "U1"},
                "data": {"nickname": "boss", "roles": ["R1"]}
            })))
            .await;
        let member = cache.get_member("S1", "U1").await.unwrap();
        assert_eq!(member.nickname.as_deref(), Some("boss"));
        assert_eq!(member.roles, vec!["R1"]);

        cache
            .apply_event(&event(json!({
                "type": "ServerMemberUpdate",
                "id": {"server": "S1", "user": "U1"},
                "data": {},
                "clear": ["Nickname"]
            })))
            .await;
        assert!(cache.get_member("S1", "U1").await.unwrap().nickname.is_none());

        cache
            .apply_event(&event(json!({"type": "ServerMemberLeave", "id": "S1", "user": "U1"})))
            .await;
        assert!(cache.get_member("S1", "U1").await.is_none());
    }

    #[tokio::test]
    async fn role_update_creates_patches_and_deletes() {
        let cache = Cache::new();
        cache.apply_event(&ready()).await;
        cache
            .apply_event(&event(json!({
                "type": "ServerRoleUpdate",
                "id": "S1",
                "role_id": "R1",
                "data": {"name": "mods", "colour": "red", "rank": 2}
            })))
            .await;
        let role = cache.get_server("S1").await.unwrap().roles["R1"].clone();
        assert_eq!(role.name, "mods");
        assert_eq!(role.rank, 2);

        cache
            .apply_event(&event(json!({
                "type": "ServerRoleUpdate",
                "id": "S1",
                "role_id": "R1",
                "data": {"hoist": true},
                "clear": ["Colour"]
            })))
            .await;
        let role = cache.get_server("S1").await.unwrap().roles["R1"].clone();
        assert!(role.hoist);
        assert!(role.colour.is_none());
        assert_eq!(role.name, "mods");

        cache
            .apply_event(&event(json!({"type": "ServerRoleDelete", "id": "S1", "role_id": "R1"})))
            .await;
        assert!(cache.get_server("S1").await.unwrap().roles.is_empty());
    }

    #[tokio::test]
    async fn server_create_brings_channels_and_emojis() {
        let cache = Cache::new();
        cache
            .apply_event(&event(json!({
                "type": "ServerCreate",
                "id": "S2",
                "server": {"_id": "S2", "owner": "U1", "name": "New", "channels": ["C9"]},
                "channels": [{"channel_type": "TextChannel", "_id": "C9", "server": "S2", "name": "hello"}],
                "emojis": [{"_id": "E1", "parent": {"type": "Server", "id": "S2"},
                            "creator_id": "U1", "name": "wave"}]
            })))
            .await;

        assert_eq!(cache.get_server("S2").await.unwrap().name, "New");
        assert_eq!(cache.channels_of_server("S2").await.len(), 1);
        assert_eq!(cache.get_emoji("E1").await.unwrap().name, "wave");

        cache
            .apply_event(&event(json!({"type": "ServerDelete", "id": "S2"})))
            .await;
        assert!(cache.get_emoji("E1").await.is_none());
    }

    #[tokio::test]
    async fn emoji_create_and_delete() {
        let cache = Cache::new();
        cache
            .apply_event(&event(json!({
                "type": "EmojiCreate",
                "_id": "E2",
                "parent": {"type": "Detached"},
                "creator_id": "U1",
                "name": "blob"
            })))
            .await;
        assert_eq!(cache.get_emoji("E2").await.unwrap().name, "blob");

        cache
            .apply_event(&event(json!({"type": "EmojiDelete", "id": "E2"})))
            .await;
        assert!(cache.get_emoji("E2").await.is_none());
    }

    #[tokio::test]
    async fn relationship_caches_the_user() {
        let cache = Cache::new();
        cache
            .apply_event(&event(json!({
                "type": "UserRelationship",
                "id": "U1",
                "user": {"_id": "U2", "username": "friend", "discriminator": "0002",
                         "relationship": "Friend"},
                "status": "Friend"
            })))
            .await;

        let user = cache.get_user("U2").await.unwrap();
        assert_eq!(user.username, "friend");
        assert_eq!(user.relationship, RelationshipStatus::Friend);
    }

    #[tokio::test]
    async fn message_bumps_last_message_id() {
        let cache = Cache::new();
        cache.apply_event(&ready()).await;
        cache
            .apply_event(&event(json!({"type": "Message", "_id": "M5", "channel": "C1", "author": "U1"})))
            .await;

        let Some(Channel::TextChannel(ch)) = cache.get_channel("C1").await else {
            panic!("text channel missing");
        };
        assert_eq!(ch.last_message_id.as_deref(), Some("M5"));
    }
}
