use async_trait::async_trait;
use serde::Serialize;
use ulid::Ulid;

use crate::{
    error::LusterError,
    http::{expect_success, parse_json_if_ok, HttpHandler},
    types::{
        bulk_message_response::BulkMessageResponse,
        message::{DataEditMessage, DataMessageSend, Message},
    },
    util::with_query,
};

#[derive(Debug, Default, Clone, Serialize)]
pub struct FetchMessagesOptions {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub before: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub after: Option<String>,
    /// `Relevance`, `Latest` or `Oldest`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sort: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nearby: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub include_users: Option<bool>,
}

/// Trait that holds the methods for message endpoints.
#[async_trait]
pub trait MessagesApi {
    /// Fetch multiple messages from the given channel.
    async fn fetch_messages(
        &self,
        channel_id: &str,
        opts: Option<FetchMessagesOptions>,
    ) -> Result<BulkMessageResponse, LusterError>;

    async fn fetch_message(&self, channel_id: &str, message_id: &str)
        -> Result<Message, LusterError>;

    /// Send a message to the given channel.
    ///
    /// A ULID nonce is generated when `data.nonce` is unset.
    async fn send_message(
        &self,
        channel_id: &str,
        data: &DataMessageSend,
        idempotency_key: Option<&str>,
    ) -> Result<Message, LusterError>;

    async fn edit_message(
        &self,
        channel_id: &str,
        message_id: &str,
        data: &DataEditMessage,
    ) -> Result<Message, LusterError>;

    async fn delete_message(&self, channel_id: &str, message_id: &str) -> Result<(), LusterError>;
}

#[async_trait]
impl MessagesApi for HttpHandler {
    async fn fetch_messages(
        &self,
        channel_id: &str,
        opts: Option<FetchMessagesOptions>,
    ) -> Result<BulkMessageResponse, LusterError> {
        let query = match opts {
            Some(o) => serde_urlencoded::to_string(o)
                .map_err(|e| LusterError::Other(format!("Failed to encode query: {e}")))?,
            None => String::new(),
        };
        let url = with_query(self.api_url(&["channels", channel_id, "messages"]), &query);

        let resp = self.authed_get(&url, None).await?;
        parse_json_if_ok(resp).await
    }

    async fn fetch_message(
        &self,
        channel_id: &str,
        message_id: &str,
    ) -> Result<Message, LusterError> {
        let url = self.api_url(&["channels", channel_id, "messages", message_id]);
        let resp = self.authed_get(&url, None).await?;
        parse_json_if_ok(resp).await
    }

    async fn send_message(
        &self,
        channel_id: &str,
        data: &DataMessageSend,
        idempotency_key: Option<&str>,
    ) -> Result<Message, LusterError> {
        let url = self.api_url(&["channels", channel_id, "messages"]);

        let mut body = data.clone();
        if body.nonce.is_none() {
            body.nonce = Some(Ulid::new().to_string());
        }

        let mut headers = Vec::new();
        if let Some(key) = idempotency_key {
            headers.push(("Idempotency-Key", key));
        }

        let resp = self.authed_post(&url, &body, Some(headers.as_slice())).await?;
        parse_json_if_ok(resp).await
    }

    async fn edit_message(
        &self,
        channel_id: &str,
        message_id: &str,
        data: &DataEditMessage,
    ) -> Result<Message, LusterError> {
        let url = self.api_url(&["channels", channel_id, "messages", message_id]);
        let resp = self.authed_patch(&url, data, None).await?;
        parse_json_if_ok(resp).await
    }

    async fn delete_message(&self, channel_id: &str, message_id: &str) -> Result<(), LusterError> {
        let url = self.api_url(&["channels", channel_id, "messages", message_id]);
        let resp = self.authed_delete(&url, None).await?;
        expect_success(resp).await
    }
}
