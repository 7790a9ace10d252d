use std::collections::HashMap;

use serde::{de, ser, Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;

use super::{enums::ChannelType, file::File};

/// A channel object, as sent by the API.
///
/// Deserialization dispatches on `channel_type`. Unknown channel types are
/// kept as [`Channel::Unknown`] instead of failing.
#[derive(Debug, Clone, PartialEq)]
pub enum Channel {
    SavedMessages(SavedMessagesData),
    DirectMessage(DirectMessageData),
    Group(GroupData),
    TextChannel(ServerChannelData),
    VoiceChannel(ServerChannelData),
    Unknown(UnknownChannelData),
}

/// The personal "Saved Notes" channel of a user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SavedMessagesData {
    #[serde(rename = "_id")]
    pub id: String,
    pub user: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DirectMessageData {
    #[serde(rename = "_id")]
    pub id: String,
    /// Whether the DM is open on both sides.
    #[serde(default)]
    pub active: bool,
    #[serde(default)]
    pub recipients: Vec<String>,
    pub last_message_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupData {
    #[serde(rename = "_id")]
    pub id: String,
    pub name: String,
    pub owner: String,
    #[serde(default)]
    pub recipients: Vec<String>,
    pub description: Option<String>,
    pub icon: Option<File>,
    pub last_message_id: Option<String>,
    pub permissions: Option<i64>,
    #[serde(default)]
    pub nsfw: bool,
}

/// Shared shape of text and voice channels in a server.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServerChannelData {
    #[serde(rename = "_id")]
    pub id: String,
    pub server: String,
    pub name: String,
    pub description: Option<String>,
    pub icon: Option<File>,
    /// Only ever set on text channels.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_message_id: Option<String>,
    pub default_permissions: Option<PermissionOverride>,
    #[serde(default)]
    pub role_permissions: HashMap<String, PermissionOverride>,
    #[serde(default)]
    pub nsfw: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnknownChannelData {
    #[serde(rename = "_id")]
    pub id: String,
    pub channel_type: String,
}

/// Allow / deny permission bits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PermissionOverride {
    #[serde(rename = "a")]
    pub allow: i64,
    #[serde(rename = "d")]
    pub deny: i64,
}

impl Channel {
    pub fn from_value(value: Value) -> Result<Self, serde_json::Error> {
        let kind = value
            .get("channel_type")
            .and_then(Value::as_str)
            .map(ChannelType::from)
            .unwrap_or_else(|| ChannelType::Other(String::new()));

        Ok(match kind {
            ChannelType::SavedMessages => Self::SavedMessages(serde_json::from_value(value)?),
            ChannelType::DirectMessage => Self::DirectMessage(serde_json::from_value(value)?),
            ChannelType::Group => Self::Group(serde_json::from_value(value)?),
            ChannelType::TextChannel => Self::TextChannel(serde_json::from_value(value)?),
            ChannelType::VoiceChannel => Self::VoiceChannel(serde_json::from_value(value)?),
            ChannelType::Other(channel_type) => {
                let id = value
                    .get("_id")
                    .and_then(Value::as_str)
                    .ok_or_else(|| <serde_json::Error as de::Error>::missing_field("_id"))?;
                Self::Unknown(UnknownChannelData {
                    id: id.to_string(),
                    channel_type,
                })
            }
        })
    }

    pub fn to_value(&self) -> Result<Value, serde_json::Error> {
        let (mut value, kind) = match self {
            Self::SavedMessages(d) => (serde_json::to_value(d)?, ChannelType::SavedMessages),
            Self::DirectMessage(d) => (serde_json::to_value(d)?, ChannelType::DirectMessage),
            Self::Group(d) => (serde_json::to_value(d)?, ChannelType::Group),
            Self::TextChannel(d) => (serde_json::to_value(d)?, ChannelType::TextChannel),
            Self::VoiceChannel(d) => (serde_json::to_value(d)?, ChannelType::VoiceChannel),
            Self::Unknown(d) => return serde_json::to_value(d),
        };
        if let Value::Object(obj) = &mut value {
            obj.insert("channel_type".into(), Value::String(kind.to_string()));
        }
        Ok(value)
    }

    pub fn id(&self) -> &str {
        match self {
            Self::SavedMessages(d) => &d.id,
            Self::DirectMessage(d) => &d.id,
            Self::Group(d) => &d.id,
            Self::TextChannel(d) | Self::VoiceChannel(d) => &d.id,
            Self::Unknown(d) => &d.id,
        }
    }

    pub fn channel_type(&self) -> ChannelType {
        match self {
            Self::SavedMessages(_) => ChannelType::SavedMessages,
            Self::DirectMessage(_) => ChannelType::DirectMessage,
            Self::Group(_) => ChannelType::Group,
            Self::TextChannel(_) => ChannelType::TextChannel,
            Self::VoiceChannel(_) => ChannelType::VoiceChannel,
            Self::Unknown(d) => ChannelType::Other(d.channel_type.clone()),
        }
    }

    /// The owning server, for server channels.
    pub fn server_id(&self) -> Option<&str> {
        match self {
            Self::TextChannel(d) | Self::VoiceChannel(d) => Some(&d.server),
            _ => None,
        }
    }

    pub fn name(&self) -> Option<&str> {
        match self {
            Self::Group(d) => Some(&d.name),
            Self::TextChannel(d) | Self::VoiceChannel(d) => Some(&d.name),
            _ => None,
        }
    }

    /// Mutable recipient list of DMs and groups.
    pub fn recipients_mut(&mut self) -> Option<&mut Vec<String>> {
        match self {
            Self::DirectMessage(d) => Some(&mut d.recipients),
            Self::Group(d) => Some(&mut d.recipients),
            _ => None,
        }
    }

    pub fn set_last_message_id(&mut self, message_id: &str) {
        match self {
            Self::DirectMessage(d) => d.last_message_id = Some(message_id.to_string()),
            Self::Group(d) => d.last_message_id = Some(message_id.to_string()),
            Self::TextChannel(d) => d.last_message_id = Some(message_id.to_string()),
            _ => {}
        }
    }
}

impl<'de> Deserialize<'de> for Channel {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Value::deserialize(deserializer)?;
        Channel::from_value(value).map_err(de::Error::custom)
    }
}

impl Serialize for Channel {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        self.to_value()
            .map_err(ser::Error::custom)?
            .serialize(serializer)
    }
}

/// Optional fields that can be removed from a channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FieldsChannel {
    Description,
    Icon,
    DefaultPermissions,
}

/// Body of `PATCH /channels/{id}`.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DataEditChannel {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Autumn id of the new icon.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nsfw: Option<bool>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub remove: Vec<FieldsChannel>,
}

impl DataEditChannel {
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.description.is_none()
            && self.icon.is_none()
            && self.nsfw.is_none()
            && self.remove.is_empty()
    }

    /// Queue a field for removal; each field is listed once.
    pub fn remove_field(&mut self, field: FieldsChannel) {
        if !self.remove.contains(&field) {
            self.remove.push(field);
        }
    }
}
