use async_trait::async_trait;

use crate::{
    error::LusterError,
    http::{parse_json_if_ok, HttpHandler},
    types::user::User,
};

#[async_trait]
pub trait UsersApi {
    /// The account these credentials belong to.
    async fn fetch_self(&self) -> Result<User, LusterError>;

    async fn fetch_user(&self, user_id: &str) -> Result<User, LusterError>;
}

#[async_trait]
impl UsersApi for HttpHandler {
    async fn fetch_self(&self) -> Result<User, LusterError> {
        self.fetch_user("@me").await
    }

    async fn fetch_user(&self, user_id: &str) -> Result<User, LusterError> {
        let url = self.api_url(&["users", user_id]);
        let resp = self.authed_get(&url, None).await?;
        parse_json_if_ok(resp).await
    }
}
