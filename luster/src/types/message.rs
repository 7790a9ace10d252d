use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{
    file::File,
    user::{Member, User},
};
use crate::{api::messages::MessagesApi, error::LusterError, state::State};

/// For sending a message
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DataMessageSend {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nonce: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    /// Autumn ids of uploaded attachments.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub attachments: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub replies: Option<Vec<ReplyIntent>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub embeds: Option<Vec<SendableEmbed>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub masquerade: Option<Masquerade>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub interactions: Option<Interactions>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub flags: Option<u32>,
}

impl DataMessageSend {
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            content: Some(content.into()),
            ..Default::default()
        }
    }

    pub fn reply_to(mut self, message_id: impl Into<String>, mention: bool) -> Self {
        self.replies.get_or_insert_with(Vec::new).push(ReplyIntent {
            id: message_id.into(),
            mention,
        });
        self
    }

    pub fn attachment(mut self, file_id: impl Into<String>) -> Self {
        self.attachments
            .get_or_insert_with(Vec::new)
            .push(file_id.into());
        self
    }

    pub fn embed(mut self, embed: SendableEmbed) -> Self {
        self.embeds.get_or_insert_with(Vec::new).push(embed);
        self
    }

    pub fn masquerade(mut self, masquerade: Masquerade) -> Self {
        self.masquerade = Some(masquerade);
        self
    }

    pub fn nonce(mut self, nonce: impl Into<String>) -> Self {
        self.nonce = Some(nonce.into());
        self
    }
}

/// Body of `PATCH /channels/{channel}/messages/{id}`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DataEditMessage {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub embeds: Option<Vec<SendableEmbed>>,
}

/// A full Message object as returned from the API
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    #[serde(rename = "_id")]
    pub id: String,
    pub nonce: Option<String>,
    pub channel: String,
    pub author: String,
    /// Attached after deserialization so the message can act on itself.
    #[serde(skip)]
    pub state: Option<State>,

    pub user: Option<User>,
    pub member: Option<Member>,
    pub webhook: Option<MessageWebhook>,
    pub content: Option<String>,
    pub system: Option<SystemMessage>,
    pub attachments: Option<Vec<File>>,
    pub edited: Option<String>, // ISO8601
    pub embeds: Option<Vec<Embed>>,
    pub mentions: Option<Vec<String>>,
    pub replies: Option<Vec<String>>,
    pub reactions: Option<HashMap<String, Vec<String>>>,
    pub interactions: Option<Interactions>,
    pub masquerade: Option<Masquerade>,
    pub flags: Option<u32>,
}

impl Message {
    fn state(&self) -> Result<&State, LusterError> {
        self.state
            .as_ref()
            .ok_or_else(|| LusterError::Other("State not attached to message".to_string()))
    }

    pub fn with_state(mut self, state: State) -> Self {
        self.state = Some(state);
        self
    }

    /// Send a message to the channel this message was sent in.
    pub async fn send_message(
        &self,
        content: &str,
        reply: bool,
        nonce: Option<String>,
    ) -> Result<Message, LusterError> {
        let mut data = DataMessageSend::new(content);
        if reply {
            data = data.reply_to(self.id.clone(), false);
        }
        data.nonce = nonce;

        let state = self.state()?;
        let message = state.http().send_message(&self.channel, &data, None).await?;
        Ok(message.with_state(state.clone()))
    }

    /// Reply to this message.
    pub async fn reply(&self, content: &str) -> Result<Message, LusterError> {
        self.send_message(content, true, None).await
    }

    /// Replace the content of this message. Only works on own messages.
    pub async fn edit(&self, content: &str) -> Result<Message, LusterError> {
        let state = self.state()?;
        let data = DataEditMessage {
            content: Some(content.to_string()),
            embeds: None,
        };
        let message = state
            .http()
            .edit_message(&self.channel, &self.id, &data)
            .await?;
        Ok(message.with_state(state.clone()))
    }

    pub async fn delete(&self) -> Result<(), LusterError> {
        self.state()?
            .http()
            .delete_message(&self.channel, &self.id)
            .await
    }

    pub fn is_system(&self) -> bool {
        self.system.is_some()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReplyIntent {
    pub id: String,
    pub mention: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SendableEmbed {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub icon_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Autumn id of an uploaded file.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub media: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub colour: Option<String>,
}

/// Name and avatar override for a single message.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Masquerade {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avatar: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub colour: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Interactions {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reactions: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub restrict_reactions: Option<bool>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageWebhook {
    pub name: String,
    pub avatar: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SystemMessage {
    Text { content: String },
    UserAdded { id: String, by: String },
    UserRemove { id: String, by: String },
    UserJoined { id: String },
    UserLeft { id: String },
    UserKicked { id: String },
    UserBanned { id: String },
    ChannelRenamed { name: String, by: String },
    ChannelDescriptionChanged { by: String },
    ChannelIconChanged { by: String },
    ChannelOwnershipChanged { from: String, to: String },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
#[serde(rename_all = "PascalCase")]
pub enum Embed {
    Website {
        url: Option<String>,
        original_url: Option<String>,
        /// Provider-specific embed data (YouTube, Spotify, ...).
        special: Option<Value>,
        title: Option<String>,
        description: Option<String>,
        image: Option<EmbedImage>,
        video: Option<EmbedVideo>,
        site_name: Option<String>,
        icon_url: Option<String>,
        colour: Option<String>,
    },
    Image(EmbedImage),
    Video(EmbedVideo),
    Text {
        icon_url: Option<String>,
        url: Option<String>,
        title: Option<String>,
        description: Option<String>,
        media: Option<File>,
        colour: Option<String>,
    },
    None,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub enum ImageSize {
    Large,
    Preview,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbedImage {
    pub url: String,
    pub width: u32,
    pub height: u32,
    pub size: ImageSize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbedVideo {
    pub url: String,
    pub width: u32,
    pub height: u32,
}
