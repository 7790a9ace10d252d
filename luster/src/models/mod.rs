//! High-level objects that carry a [`State`](crate::state::State) and can act
//! on themselves.

pub mod channels;
pub mod file;

pub use channels::{
    channel_factory, AnyChannel, Category, DirectMessage, EditChannel, Group, PrivateChannel,
    SavedMessages, ServerChannel, TextChannel, VoiceChannel,
};
pub use file::{Attachment, PartialUploadedFile};
