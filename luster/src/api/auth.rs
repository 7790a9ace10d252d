use crate::{
    config::Credentials,
    error::LusterError,
    http::{expect_success, parse_json_if_ok, HttpHandler},
    types::auth::{DataLogin, MFAResponse, ResponseLogin},
};

/// Email/password login for user accounts.
#[async_trait::async_trait]
pub trait AuthApi {
    /// Login to an account.
    ///
    /// On `ResponseLogin::Success` the returned session token becomes this
    /// handler's credential. An MFA challenge is returned as-is and can be
    /// answered with [`AuthApi::login_mfa`].
    async fn login(
        &self,
        email: &str,
        password: &str,
        friendly_name: Option<String>,
    ) -> Result<ResponseLogin, LusterError>;

    /// Answer an MFA challenge returned by [`AuthApi::login`].
    async fn login_mfa(
        &self,
        ticket: &str,
        response: MFAResponse,
        friendly_name: Option<String>,
    ) -> Result<ResponseLogin, LusterError>;

    /// Log out of the current session.
    async fn logout(&self) -> Result<(), LusterError>;
}

impl HttpHandler {
    async fn send_login(&self, body: &DataLogin) -> Result<ResponseLogin, LusterError> {
        let url = self.api_url(&["auth", "session", "login"]);
        let resp = self.authed_post(&url, body, None).await?;
        let login_resp: ResponseLogin = parse_json_if_ok(resp).await?;

        if let ResponseLogin::Success { token, .. } = &login_resp {
            self.set_credentials(Credentials::User(token.clone())).await;
        }

        Ok(login_resp)
    }
}

#[async_trait::async_trait]
impl AuthApi for HttpHandler {
    async fn login(
        &self,
        email: &str,
        password: &str,
        friendly_name: Option<String>,
    ) -> Result<ResponseLogin, LusterError> {
        let body = DataLogin::Plain {
            email: email.to_string(),
            password: password.to_string(),
            friendly_name,
        };
        self.send_login(&body).await
    }

    async fn login_mfa(
        &self,
        ticket: &str,
        response: MFAResponse,
        friendly_name: Option<String>,
    ) -> Result<ResponseLogin, LusterError> {
        let body = DataLogin::MfaTicket {
            mfa_ticket: ticket.to_string(),
            mfa_response: Some(response),
            friendly_name,
        };
        self.send_login(&body).await
    }

    async fn logout(&self) -> Result<(), LusterError> {
        let url = self.api_url(&["auth", "session", "logout"]);
        let resp = self.authed_post_empty(&url, None).await?;
        expect_success(resp).await?;
        self.set_credentials(Credentials::User(String::new())).await;
        Ok(())
    }
}
