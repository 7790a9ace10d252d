use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{channel::PermissionOverride, file::File};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Server {
    #[serde(rename = "_id")]
    pub id: String,
    pub owner: String,
    pub name: String,
    pub description: Option<String>,
    #[serde(default)]
    pub channels: Vec<String>,
    pub categories: Option<Vec<Category>>,
    pub system_messages: Option<Value>,
    #[serde(default)]
    pub roles: HashMap<String, Role>,
    #[serde(default)]
    pub default_permissions: i64,
    pub icon: Option<File>,
    pub banner: Option<File>,
    pub flags: Option<u32>,
    #[serde(default)]
    pub nsfw: bool,
    #[serde(default)]
    pub analytics: bool,
    #[serde(default)]
    pub discoverable: bool,
}

/// A named group of channels in a server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub channels: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Role {
    pub name: String,
    pub permissions: Option<PermissionOverride>,
    pub colour: Option<String>,
    #[serde(default)]
    pub hoist: bool,
    #[serde(default)]
    pub rank: i64,
}

/// A custom emoji, owned by a server or detached.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Emoji {
    #[serde(rename = "_id")]
    pub id: String,
    pub parent: Value,
    pub creator_id: String,
    pub name: String,
    #[serde(default)]
    pub animated: bool,
    #[serde(default)]
    pub nsfw: bool,
}
