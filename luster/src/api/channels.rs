use async_trait::async_trait;

use crate::{
    error::LusterError,
    http::{expect_success, parse_json_if_ok, HttpHandler},
    types::channel::{Channel, DataEditChannel},
};

#[async_trait]
pub trait ChannelsApi {
    async fn fetch_channel(&self, channel_id: &str) -> Result<Channel, LusterError>;

    /// Edit a group or server channel.
    async fn edit_channel(
        &self,
        channel_id: &str,
        data: &DataEditChannel,
    ) -> Result<Channel, LusterError>;

    /// Delete a server channel, leave a group or close a DM.
    ///
    /// `leave_silently` only applies to groups.
    async fn delete_channel(&self, channel_id: &str, leave_silently: bool)
        -> Result<(), LusterError>;
}

#[async_trait]
impl ChannelsApi for HttpHandler {
    async fn fetch_channel(&self, channel_id: &str) -> Result<Channel, LusterError> {
        let url = self.api_url(&["channels", channel_id]);
        let resp = self.authed_get(&url, None).await?;
        parse_json_if_ok(resp).await
    }

    async fn edit_channel(
        &self,
        channel_id: &str,
        data: &DataEditChannel,
    ) -> Result<Channel, LusterError> {
        let url = self.api_url(&["channels", channel_id]);
        let resp = self.authed_patch(&url, data, None).await?;
        parse_json_if_ok(resp).await
    }

    async fn delete_channel(
        &self,
        channel_id: &str,
        leave_silently: bool,
    ) -> Result<(), LusterError> {
        let url = self.api_url(&["channels", channel_id]);
        let resp = if leave_silently {
            let query = [("leave_silently", "true")];
            self.authed_delete_with_query(&url, &query, None).await?
        } else {
            self.authed_delete(&url, None).await?
        };
        expect_success(resp).await
    }
}
