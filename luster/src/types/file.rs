use serde::{Deserialize, Serialize};

use super::enums::FileTag;
use crate::{config::DEFAULT_AUTUMN_URL, state::State, util::build_url};

/// A file stored on Autumn.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct File {
    #[serde(rename = "_id")]
    pub id: String,
    pub tag: FileTag,
    pub filename: String,
    pub metadata: Metadata,
    pub content_type: String,
    /// Size in bytes.
    pub size: u64,
    #[serde(default)]
    pub deleted: bool,
    #[serde(default)]
    pub reported: bool,
    /// Set when the file was uploaded as a message attachment.
    pub message_id: Option<String>,
    pub user_id: Option<String>,
    pub server_id: Option<String>,
    pub object_id: Option<String>,
}

impl File {
    /// URL of this file on the public Autumn instance. Use
    /// [`url_with`](Self::url_with) for a client pointed elsewhere.
    pub fn url(&self) -> String {
        self.url_on(DEFAULT_AUTUMN_URL)
    }

    /// URL of this file on the Autumn instance the client is configured for.
    pub fn url_with(&self, state: &State) -> String {
        self.url_on(&state.config().autumn_url)
    }

    /// URL of this file on the given Autumn instance.
    pub fn url_on(&self, autumn_url: &str) -> String {
        build_url(autumn_url, &[self.tag.as_str(), &self.id])
    }

    pub fn is_image(&self) -> bool {
        matches!(self.metadata, Metadata::Image { .. })
    }
}

/// What kind of file this is, as detected by Autumn.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
#[serde(rename_all = "PascalCase")]
pub enum Metadata {
    File,
    Text,
    Image { width: u32, height: u32 },
    Video { width: u32, height: u32 },
    Audio,
}

/// Body returned by Autumn after an upload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadFileResponse {
    pub id: String,
}
