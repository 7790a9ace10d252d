use crate::{
    api::files::FilesApi,
    error::LusterError,
    http::HttpHandler,
    state::State,
    types::{enums::FileTag, file::UploadFileResponse},
    util::build_url,
};

/// A file that was just uploaded: only its id and bucket are known.
#[derive(Debug, Clone)]
pub struct PartialUploadedFile {
    pub id: String,
    pub tag: FileTag,
    state: State,
}

impl PartialUploadedFile {
    pub(crate) fn new(data: UploadFileResponse, tag: FileTag, state: State) -> Self {
        Self {
            id: data.id,
            tag,
            state,
        }
    }

    /// URL on the Autumn instance the file was uploaded to.
    pub fn url(&self) -> String {
        build_url(&self.state.config().autumn_url, &[self.tag.as_str(), &self.id])
    }
}

/// An attachment parameter: either the id of a file already on Autumn, or
/// raw content that is uploaded first.
#[derive(Debug, Clone)]
pub enum Attachment {
    Id(String),
    Upload {
        filename: String,
        bytes: Vec<u8>,
        content_type: Option<String>,
    },
}

impl Attachment {
    pub fn upload(filename: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        Self::Upload {
            filename: filename.into(),
            bytes: bytes.into(),
            content_type: None,
        }
    }

    /// Read a file from disk, named after its path's file name.
    pub async fn from_path(path: impl AsRef<std::path::Path>) -> Result<Self, LusterError> {
        let path = path.as_ref();
        let bytes = tokio::fs::read(path).await?;
        let filename = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "file".to_string());
        Ok(Self::upload(filename, bytes))
    }

    /// The Autumn id of this attachment, uploading into `tag` if needed.
    pub async fn resolve(self, http: &HttpHandler, tag: FileTag) -> Result<String, LusterError> {
        match self {
            Self::Id(id) => Ok(id),
            Self::Upload {
                filename,
                bytes,
                content_type,
            } => {
                let uploaded = http
                    .upload_file(tag, &filename, bytes, content_type.as_deref())
                    .await?;
                Ok(uploaded.id)
            }
        }
    }
}

impl From<String> for Attachment {
    fn from(id: String) -> Self {
        Self::Id(id)
    }
}

impl From<&str> for Attachment {
    fn from(id: &str) -> Self {
        Self::Id(id.to_string())
    }
}
