use async_trait::async_trait;

use crate::{
    error::LusterError,
    http::{parse_json_if_ok, HttpHandler},
    types::server::Server,
};

#[async_trait]
pub trait ServersApi {
    async fn fetch_server(&self, server_id: &str) -> Result<Server, LusterError>;
}

#[async_trait]
impl ServersApi for HttpHandler {
    async fn fetch_server(&self, server_id: &str) -> Result<Server, LusterError> {
        let url = self.api_url(&["servers", server_id]);
        let resp = self.authed_get(&url, None).await?;
        parse_json_if_ok(resp).await
    }
}
