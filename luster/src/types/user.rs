use serde::{Deserialize, Serialize};

use super::file::File;
use crate::state::State;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)] // Use default values for missing fields
pub struct User {
    #[serde(rename = "_id")]
    pub id: String,
    pub username: String,
    pub discriminator: String,
    pub display_name: Option<String>,
    pub avatar: Option<File>,
    pub relations: Option<Vec<Relationship>>,
    pub badges: Option<u32>,
    pub status: Option<UserStatus>,
    pub profile: Option<UserProfile>,
    pub flags: Option<u32>,
    pub privileged: bool,
    pub bot: Option<BotInformation>,
    pub relationship: RelationshipStatus,
    pub online: bool,
}

impl User {
    /// Display name when set, username otherwise.
    pub fn name(&self) -> &str {
        self.display_name.as_deref().unwrap_or(&self.username)
    }

    /// `username#discriminator`.
    pub fn tag(&self) -> String {
        format!("{}#{}", self.username, self.discriminator)
    }

    /// Markup that mentions this user in a message.
    pub fn mention(&self) -> String {
        format!("<@{}>", self.id)
    }

    pub fn is_bot(&self) -> bool {
        self.bot.is_some()
    }

    /// Avatar URL on the public Autumn instance.
    pub fn avatar_url(&self) -> Option<String> {
        self.avatar.as_ref().map(File::url)
    }

    /// Avatar URL on the Autumn instance the client is configured for.
    pub fn avatar_url_with(&self, state: &State) -> Option<String> {
        self.avatar.as_ref().map(|f| f.url_with(state))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Relationship {
    #[serde(rename = "_id")]
    pub id: String,
    pub status: RelationshipStatus,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub enum RelationshipStatus {
    #[default]
    None,
    User,
    Friend,
    Outgoing,
    Incoming,
    Blocked,
    BlockedOther,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserStatus {
    pub text: Option<String>,
    pub presence: Option<Presence>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    pub content: Option<String>,
    pub background: Option<File>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub enum Presence {
    Online,
    Idle,
    Focus,
    Busy,
    Invisible,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BotInformation {
    pub owner: String,
}

/// A server Member
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Member {
    #[serde(rename = "_id")]
    pub id: MemberCompositeKey,
    pub joined_at: String, // ISO8601
    pub nickname: Option<String>,
    pub avatar: Option<File>,
    #[serde(default)]
    pub roles: Vec<String>,
    pub timeout: Option<String>, // ISO8601
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MemberCompositeKey {
    pub server: String,
    pub user: String,
}
