use async_trait::async_trait;
use reqwest::multipart::{Form, Part};

use crate::{
    error::LusterError,
    http::{parse_json_if_ok, HttpHandler},
    types::{enums::FileTag, file::UploadFileResponse},
};

/// Uploads to Autumn, the file server.
#[async_trait]
pub trait FilesApi {
    /// Upload `bytes` into the `tag` bucket and return the new file id.
    async fn upload_file(
        &self,
        tag: FileTag,
        filename: &str,
        bytes: Vec<u8>,
        content_type: Option<&str>,
    ) -> Result<UploadFileResponse, LusterError>;
}

#[async_trait]
impl FilesApi for HttpHandler {
    async fn upload_file(
        &self,
        tag: FileTag,
        filename: &str,
        bytes: Vec<u8>,
        content_type: Option<&str>,
    ) -> Result<UploadFileResponse, LusterError> {
        let mut part = Part::bytes(bytes).file_name(filename.to_string());
        if let Some(mime) = content_type {
            part = part.mime_str(mime)?;
        }

        let url = self.autumn_url(&[tag.as_str()]);
        let resp = self
            .authed_post_multipart(&url, Form::new().part("file", part))
            .await?;
        parse_json_if_ok(resp).await
    }
}
