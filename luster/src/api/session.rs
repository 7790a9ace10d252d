use crate::{
    config::Credentials,
    error::LusterError,
    http::{expect_success, parse_json_if_ok, HttpHandler},
    types::auth::{DataEditSession, SessionInfo},
};

#[async_trait::async_trait]
pub trait SessionApi {
    /// Fetch all sessions associated with this account.
    async fn fetch_all_sessions(&self) -> Result<Vec<SessionInfo>, LusterError>;

    /// Delete all active sessions, optionally including the current one.
    async fn delete_all_sessions(&self, revoke_self: bool) -> Result<(), LusterError>;

    /// Delete a specific active session by ID.
    async fn delete_session(&self, id: &str) -> Result<(), LusterError>;

    /// Edit a specific session by ID (e.g., change friendly name).
    async fn edit_session(&self, id: &str, new_name: &str) -> Result<SessionInfo, LusterError>;
}

#[async_trait::async_trait]
impl SessionApi for HttpHandler {
    async fn fetch_all_sessions(&self) -> Result<Vec<SessionInfo>, LusterError> {
        let url = self.api_url(&["auth", "session", "all"]);
        let resp = self.authed_get(&url, None).await?;
        parse_json_if_ok(resp).await
    }

    async fn delete_all_sessions(&self, revoke_self: bool) -> Result<(), LusterError> {
        let url = self.api_url(&["auth", "session", "all"]);
        let query = [("revoke_self", revoke_self.to_string())];
        let resp = self.authed_delete_with_query(&url, &query, None).await?;
        expect_success(resp).await?;

        // The current token died with the other sessions.
        if revoke_self {
            self.set_credentials(Credentials::User(String::new())).await;
        }
        Ok(())
    }

    async fn delete_session(&self, id: &str) -> Result<(), LusterError> {
        let url = self.api_url(&["auth", "session", id]);
        let resp = self.authed_delete(&url, None).await?;
        expect_success(resp).await
    }

    async fn edit_session(&self, id: &str, new_name: &str) -> Result<SessionInfo, LusterError> {
        let url = self.api_url(&["auth", "session", id]);
        let body = DataEditSession {
            friendly_name: new_name.to_string(),
        };
        let resp = self.authed_patch(&url, &body, None).await?;
        parse_json_if_ok(resp).await
    }
}
