//! Typed channel objects.
//!
//! [`channel_factory`] turns a wire [`Channel`] into the matching model.
//! Server channels deref to [`ServerChannel`], private channels to
//! [`PrivateChannel`], so shared operations are available on every kind.

use std::ops::Deref;

use crate::{
    api::{channels::ChannelsApi, users::UsersApi},
    error::LusterError,
    models::file::Attachment,
    state::State,
    types::{
        channel::{Channel, DataEditChannel, FieldsChannel, GroupData, ServerChannelData},
        enums::{ChannelType, FileTag},
        file::File,
        server::{self, Server},
        user::User,
    },
};

/// Any channel, narrowed to its most specific model.
#[derive(Debug, Clone)]
pub enum AnyChannel {
    Text(TextChannel),
    Voice(VoiceChannel),
    SavedMessages(SavedMessages),
    DirectMessage(DirectMessage),
    Group(Group),
    /// A channel type this crate has no model for.
    Private(PrivateChannel),
}

/// Build the model matching the channel's type. Unknown types fall back to
/// [`PrivateChannel`], the most minimal channel model.
pub fn channel_factory(data: Channel, state: State) -> AnyChannel {
    match data {
        Channel::TextChannel(d) => AnyChannel::Text(TextChannel(ServerChannel::new(
            d,
            ChannelType::TextChannel,
            state,
        ))),
        Channel::VoiceChannel(d) => AnyChannel::Voice(VoiceChannel(ServerChannel::new(
            d,
            ChannelType::VoiceChannel,
            state,
        ))),
        Channel::SavedMessages(d) => AnyChannel::SavedMessages(SavedMessages {
            base: PrivateChannel::new(d.id, ChannelType::SavedMessages, state),
            user_id: d.user,
        }),
        Channel::DirectMessage(d) => AnyChannel::DirectMessage(DirectMessage {
            base: PrivateChannel::new(d.id, ChannelType::DirectMessage, state),
            recipient_ids: d.recipients,
            active: d.active,
            last_message_id: d.last_message_id,
        }),
        Channel::Group(d) => AnyChannel::Group(Group {
            base: PrivateChannel::new(d.id.clone(), ChannelType::Group, state),
            data: d,
        }),
        Channel::Unknown(d) => AnyChannel::Private(PrivateChannel::new(
            d.id,
            ChannelType::Other(d.channel_type),
            state,
        )),
    }
}

impl AnyChannel {
    pub fn id(&self) -> &str {
        match self {
            Self::Text(c) => c.id(),
            Self::Voice(c) => c.id(),
            Self::SavedMessages(c) => c.id(),
            Self::DirectMessage(c) => c.id(),
            Self::Group(c) => c.id(),
            Self::Private(c) => c.id(),
        }
    }

    pub fn channel_type(&self) -> &ChannelType {
        match self {
            Self::Text(c) => c.channel_type(),
            Self::Voice(c) => c.channel_type(),
            Self::SavedMessages(c) => c.channel_type(),
            Self::DirectMessage(c) => c.channel_type(),
            Self::Group(c) => c.channel_type(),
            Self::Private(c) => c.channel_type(),
        }
    }

    /// Delete a server channel, leave a group or close a DM.
    pub async fn delete(&self) -> Result<(), LusterError> {
        match self {
            Self::Text(c) => c.delete().await,
            Self::Voice(c) => c.delete().await,
            Self::SavedMessages(c) => c.delete().await,
            Self::DirectMessage(c) => c.delete().await,
            Self::Group(c) => c.delete().await,
            Self::Private(c) => c.delete().await,
        }
    }

    pub fn into_server_channel(self) -> Option<ServerChannel> {
        match self {
            Self::Text(TextChannel(c)) | Self::Voice(VoiceChannel(c)) => Some(c),
            _ => None,
        }
    }
}

/// Changes to apply to a group or server channel.
///
/// Setting the description or icon to `None` removes it.
#[derive(Debug, Clone, Default)]
pub struct EditChannel {
    name: Option<String>,
    description: Option<Option<String>>,
    icon: Option<Option<Attachment>>,
    nsfw: Option<bool>,
}

impl EditChannel {
    pub fn new() -> Self {
        Self::default()
    }

    /// An empty name leaves the name unchanged.
    pub fn name(mut self, name: impl Into<String>) -> Self {
        let name = name.into();
        self.name = (!name.is_empty()).then_some(name);
        self
    }

    pub fn description(mut self, description: Option<&str>) -> Self {
        self.description = Some(description.map(str::to_string));
        self
    }

    pub fn icon(mut self, icon: Option<Attachment>) -> Self {
        self.icon = Some(icon);
        self
    }

    pub fn nsfw(mut self, nsfw: bool) -> Self {
        self.nsfw = Some(nsfw);
        self
    }

    /// Build the request body, uploading the icon into `icons` if needed.
    pub async fn into_data(self, state: &State) -> Result<DataEditChannel, LusterError> {
        let mut data = DataEditChannel {
            name: self.name,
            nsfw: self.nsfw,
            ..Default::default()
        };

        match self.description {
            Some(Some(description)) => data.description = Some(description),
            Some(None) => data.remove_field(FieldsChannel::Description),
            None => {}
        }

        match self.icon {
            Some(Some(icon)) => data.icon = Some(icon.resolve(state.http(), FileTag::Icons).await?),
            Some(None) => data.remove_field(FieldsChannel::Icon),
            None => {}
        }

        Ok(data)
    }
}

/// Send an edit, skipping the request entirely when nothing changes.
async fn edit_channel(
    state: &State,
    channel_id: &str,
    edit: EditChannel,
) -> Result<Option<AnyChannel>, LusterError> {
    let data = edit.into_data(state).await?;
    if data.is_empty() {
        return Ok(None);
    }

    let updated = state.http().edit_channel(channel_id, &data).await?;
    Ok(Some(channel_factory(updated, state.clone())))
}

/// Common base of channels that live in a server.
#[derive(Debug, Clone)]
pub struct ServerChannel {
    data: ServerChannelData,
    channel_type: ChannelType,
    state: State,
}

impl ServerChannel {
    fn new(data: ServerChannelData, channel_type: ChannelType, state: State) -> Self {
        Self {
            data,
            channel_type,
            state,
        }
    }

    pub fn id(&self) -> &str {
        &self.data.id
    }

    pub fn channel_type(&self) -> &ChannelType {
        &self.channel_type
    }

    pub fn server_id(&self) -> &str {
        &self.data.server
    }

    pub fn name(&self) -> &str {
        &self.data.name
    }

    pub fn description(&self) -> Option<&str> {
        self.data.description.as_deref()
    }

    pub fn icon(&self) -> Option<&File> {
        self.data.icon.as_ref()
    }

    pub fn nsfw(&self) -> bool {
        self.data.nsfw
    }

    pub fn data(&self) -> &ServerChannelData {
        &self.data
    }

    /// The parent server, if it is cached.
    pub async fn server(&self) -> Option<Server> {
        self.state.cache().get_server(&self.data.server).await
    }

    /// Requires the `ManageChannel` permission in the server.
    pub async fn edit(&self, edit: EditChannel) -> Result<Option<AnyChannel>, LusterError> {
        edit_channel(&self.state, &self.data.id, edit).await
    }

    /// Requires the `ManageChannel` permission in the server.
    pub async fn delete(&self) -> Result<(), LusterError> {
        self.state.http().delete_channel(&self.data.id, false).await
    }
}

#[derive(Debug, Clone)]
pub struct TextChannel(ServerChannel);

impl TextChannel {
    pub fn last_message_id(&self) -> Option<&str> {
        self.0.data.last_message_id.as_deref()
    }
}

impl Deref for TextChannel {
    type Target = ServerChannel;

    fn deref(&self) -> &ServerChannel {
        &self.0
    }
}

#[derive(Debug, Clone)]
pub struct VoiceChannel(ServerChannel);

impl Deref for VoiceChannel {
    type Target = ServerChannel;

    fn deref(&self) -> &ServerChannel {
        &self.0
    }
}

/// Common base of channels outside servers.
#[derive(Debug, Clone)]
pub struct PrivateChannel {
    id: String,
    channel_type: ChannelType,
    state: State,
}

impl PrivateChannel {
    fn new(id: String, channel_type: ChannelType, state: State) -> Self {
        Self {
            id,
            channel_type,
            state,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn channel_type(&self) -> &ChannelType {
        &self.channel_type
    }

    /// Leave a group or close a DM. Groups require `ManageChannel`.
    pub async fn delete(&self) -> Result<(), LusterError> {
        self.state.http().delete_channel(&self.id, false).await
    }
}

/// "Saved Notes": a channel only its owner can see.
#[derive(Debug, Clone)]
pub struct SavedMessages {
    base: PrivateChannel,
    pub user_id: String,
}

impl Deref for SavedMessages {
    type Target = PrivateChannel;

    fn deref(&self) -> &PrivateChannel {
        &self.base
    }
}

#[derive(Debug, Clone)]
pub struct DirectMessage {
    base: PrivateChannel,
    pub recipient_ids: Vec<String>,
    /// Open on both sides.
    pub active: bool,
    pub last_message_id: Option<String>,
}

impl Deref for DirectMessage {
    type Target = PrivateChannel;

    fn deref(&self) -> &PrivateChannel {
        &self.base
    }
}

#[derive(Debug, Clone)]
pub struct Group {
    base: PrivateChannel,
    data: GroupData,
}

impl Group {
    pub fn name(&self) -> &str {
        &self.data.name
    }

    pub fn owner_id(&self) -> &str {
        &self.data.owner
    }

    pub fn recipient_ids(&self) -> &[String] {
        &self.data.recipients
    }

    pub fn description(&self) -> Option<&str> {
        self.data.description.as_deref()
    }

    pub fn icon(&self) -> Option<&File> {
        self.data.icon.as_ref()
    }

    pub fn last_message_id(&self) -> Option<&str> {
        self.data.last_message_id.as_deref()
    }

    pub fn nsfw(&self) -> bool {
        self.data.nsfw
    }

    pub async fn fetch_owner(&self) -> Result<User, LusterError> {
        self.base.state.http().fetch_user(&self.data.owner).await
    }

    /// Requires the `ManageChannel` permission in the group.
    pub async fn edit(&self, edit: EditChannel) -> Result<Option<AnyChannel>, LusterError> {
        edit_channel(&self.base.state, &self.base.id, edit).await
    }
}

impl Deref for Group {
    type Target = PrivateChannel;

    fn deref(&self) -> &PrivateChannel {
        &self.base
    }
}

/// A titled group of channels in a server.
#[derive(Debug, Clone)]
pub struct Category {
    pub id: String,
    pub title: String,
    pub channel_ids: Vec<String>,
    state: State,
}

impl Category {
    pub fn new(data: server::Category, state: State) -> Self {
        Self {
            id: data.id,
            title: data.title,
            channel_ids: data.channels,
            state,
        }
    }

    /// Cached channels of this category; uncached ids are skipped.
    pub async fn channels(&self) -> Vec<ServerChannel> {
        let mut ret = Vec::with_capacity(self.channel_ids.len());
        for id in &self.channel_ids {
            if let Some(channel) = self.state.cache().get_channel(id).await {
                if let Some(c) = channel_factory(channel, self.state.clone()).into_server_channel() {
                    ret.push(c);
                }
            }
        }
        ret
    }
}
