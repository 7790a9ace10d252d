use std::fmt;

use serde::{Deserialize, Serialize};

/// The `channel_type` of a channel object.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ChannelType {
    SavedMessages,
    DirectMessage,
    Group,
    TextChannel,
    VoiceChannel,
    /// A channel type this crate does not know about.
    #[serde(untagged)]
    Other(String),
}

impl ChannelType {
    pub fn as_str(&self) -> &str {
        match self {
            Self::SavedMessages => "SavedMessages",
            Self::DirectMessage => "DirectMessage",
            Self::Group => "Group",
            Self::TextChannel => "TextChannel",
            Self::VoiceChannel => "VoiceChannel",
            Self::Other(s) => s,
        }
    }

    pub fn is_server_channel(&self) -> bool {
        matches!(self, Self::TextChannel | Self::VoiceChannel)
    }
}

impl From<&str> for ChannelType {
    fn from(s: &str) -> Self {
        match s {
            "SavedMessages" => Self::SavedMessages,
            "DirectMessage" => Self::DirectMessage,
            "Group" => Self::Group,
            "TextChannel" => Self::TextChannel,
            "VoiceChannel" => Self::VoiceChannel,
            other => Self::Other(other.to_string()),
        }
    }
}

impl fmt::Display for ChannelType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The Autumn bucket a file was uploaded to.
///
/// Also tells what the file is used for: an attachment, an avatar, a banner
/// and so on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileTag {
    Attachments,
    Avatars,
    Backgrounds,
    Icons,
    Banners,
    Emojis,
}

impl FileTag {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Attachments => "attachments",
            Self::Avatars => "avatars",
            Self::Backgrounds => "backgrounds",
            Self::Icons => "icons",
            Self::Banners => "banners",
            Self::Emojis => "emojis",
        }
    }
}

impl fmt::Display for FileTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error ids the event socket sends in an `Error` event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SocketErrorId {
    LabelMe,
    InternalError,
    InvalidSession,
    OnboardingNotFinished,
    AlreadyAuthenticated,
    #[serde(other)]
    Unknown,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_channel_type_is_preserved() {
        let t: ChannelType = serde_json::from_str(r#""Forum""#).unwrap();
        assert_eq!(t, ChannelType::Other("Forum".into()));
        assert_eq!(t.to_string(), "Forum");

        let t: ChannelType = serde_json::from_str(r#""TextChannel""#).unwrap();
        assert!(t.is_server_channel());
    }

    #[test]
    fn file_tag_is_lowercase_on_the_wire() {
        assert_eq!(serde_json::to_string(&FileTag::Icons).unwrap(), r#""icons""#);
        assert_eq!(FileTag::Attachments.to_string(), "attachments");
    }
}
