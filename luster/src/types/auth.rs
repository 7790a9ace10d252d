use serde::{Deserialize, Serialize};

/// Body of `POST /auth/session/login`.
///
/// Either email and password, or an MFA ticket with the answer to the
/// challenge it came with.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DataLogin {
    Plain {
        email: String,
        password: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        friendly_name: Option<String>,
    },
    MfaTicket {
        mfa_ticket: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        mfa_response: Option<MFAResponse>,
        #[serde(skip_serializing_if = "Option::is_none")]
        friendly_name: Option<String>,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "result")]
pub enum ResponseLogin {
    Success {
        #[serde(rename = "_id")]
        id: String,
        user_id: String,
        token: String,
        name: String,
        subscription: Option<WebPushSubscription>,
    },
    #[serde(rename = "MFA")]
    Mfa {
        ticket: String,
        allowed_methods: Vec<MFAMethod>,
    },
    Disabled {
        user_id: String,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MFAResponse {
    Password { password: String },
    Recovery { recovery_code: String },
    Totp { totp_code: String },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebPushSubscription {
    pub endpoint: String,
    pub p256dh: String,
    pub auth: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MFAMethod {
    Password,
    Recovery,
    Totp,
}

/// A logged-in session of the current account, as listed by
/// `GET /auth/session/all`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionInfo {
    #[serde(rename = "_id")]
    pub id: String,
    pub name: String,
}

/// Body of `PATCH /auth/session/{id}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataEditSession {
    pub friendly_name: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn login_responses_are_tagged_by_result() {
        let ok: ResponseLogin = serde_json::from_str(
            r#"{"result":"Success","_id":"S1","user_id":"U1","token":"tok","name":"cli"}"#,
        )
        .unwrap();
        assert!(matches!(ok, ResponseLogin::Success { ref token, .. } if token == "tok"));

        let mfa: ResponseLogin = serde_json::from_str(
            r#"{"result":"MFA","ticket":"T","allowed_methods":["Totp","Recovery"]}"#,
        )
        .unwrap();
        assert!(
            matches!(mfa, ResponseLogin::Mfa { ref allowed_methods, .. } if allowed_methods[0] == MFAMethod::Totp)
        );
    }

    #[test]
    fn plain_login_omits_missing_name() {
        let body = DataLogin::Plain {
            email: "a@b.c".into(),
            password: "pw".into(),
            friendly_name: None,
        };
        assert_eq!(
            serde_json::to_string(&body).unwrap(),
            r#"{"email":"a@b.c","password":"pw"}"#
        );
    }
}
