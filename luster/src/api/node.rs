use async_trait::async_trait;

use crate::{
    error::LusterError,
    http::{parse_json_if_ok, HttpHandler},
    types::node::NodeInfo,
};

#[async_trait]
pub trait NodeApi {
    /// Version and feature endpoints of the instance.
    async fn query_node(&self) -> Result<NodeInfo, LusterError>;
}

#[async_trait]
impl NodeApi for HttpHandler {
    async fn query_node(&self) -> Result<NodeInfo, LusterError> {
        let url = self.api_url(&[]);
        let resp = self.authed_get(&url, None).await?;
        parse_json_if_ok(resp).await
    }
}
