//! Connection settings and credentials.
//!
//! A [`ClientConfig`] describes *where* to talk to (REST, socket and file
//! server endpoints, optional proxy) and *how* (socket wire format, heartbeat
//! and reconnect policy). [`Credentials`] describes *who* is talking.
//!
//! Supported proxy formats:
//! * `http://USERNAME:PASSWORD@IP:PORT`
//! * `http://IP:PORT` *(user / password omitted)*
//! * `IP:PORT` *(scheme is assumed to be `http://`)*

use std::{env, fmt, str::FromStr, time::Duration};

use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::LusterError;

pub const DEFAULT_API_URL: &str = "https://api.revolt.chat";
pub const DEFAULT_WS_URL: &str = "wss://ws.revolt.chat";
pub const DEFAULT_AUTUMN_URL: &str = "https://autumn.revolt.chat";

/// Version of the event socket protocol this crate speaks.
pub const WEBSOCKET_VERSION: u8 = 1;

/// The token used to authenticate, tagged with the account kind.
#[derive(Clone, PartialEq, Eq)]
pub enum Credentials {
    /// A bot token, sent as `x-bot-token`.
    Bot(String),
    /// A user session token, sent as `x-session-token`.
    User(String),
}

impl Credentials {
    pub fn new(token: impl Into<String>, bot: bool) -> Self {
        if bot {
            Self::Bot(token.into())
        } else {
            Self::User(token.into())
        }
    }

    pub fn token(&self) -> &str {
        match self {
            Self::Bot(t) | Self::User(t) => t,
        }
    }

    pub fn is_bot(&self) -> bool {
        matches!(self, Self::Bot(_))
    }

    /// Name of the HTTP header carrying the token.
    pub fn header_name(&self) -> &'static str {
        match self {
            Self::Bot(_) => "x-bot-token",
            Self::User(_) => "x-session-token",
        }
    }
}

// Tokens never end up in logs.
impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bot(_) => f.write_str("Credentials::Bot(<redacted>)"),
            Self::User(_) => f.write_str("Credentials::User(<redacted>)"),
        }
    }
}

/// Encoding of event socket frames.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WebsocketFormat {
    #[default]
    Json,
    Msgpack,
}

impl WebsocketFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Json => "json",
            Self::Msgpack => "msgpack",
        }
    }
}

impl FromStr for WebsocketFormat {
    type Err = LusterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "json" => Ok(Self::Json),
            "msgpack" => Ok(Self::Msgpack),
            other => Err(LusterError::InvalidConfig(format!(
                "unknown websocket format `{other}` (expected `json` or `msgpack`)"
            ))),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// REST endpoint (e.g. `https://api.revolt.chat`).
    pub api_url: String,
    /// Event socket endpoint, without query string.
    pub ws_url: String,
    /// File server endpoint.
    pub autumn_url: String,
    /// Optional HTTP proxy, used for *all* HTTP requests and socket traffic.
    pub proxy: Option<String>,
    pub format: WebsocketFormat,
    pub heartbeat_interval: Duration,
    /// Consecutive failed reconnects before the socket gives up.
    pub max_reconnect_attempts: u32,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            ws_url: DEFAULT_WS_URL.to_string(),
            autumn_url: DEFAULT_AUTUMN_URL.to_string(),
            proxy: None,
            format: WebsocketFormat::Json,
            heartbeat_interval: Duration::from_secs(30),
            max_reconnect_attempts: 10,
        }
    }
}

impl ClientConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Defaults overridden by `LUSTER_API_URL`, `LUSTER_WS_URL`,
    /// `LUSTER_AUTUMN_URL`, `LUSTER_PROXY` and `LUSTER_WS_FORMAT`.
    pub fn from_env() -> Result<Self, LusterError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub(crate) fn from_lookup<F>(lookup: F) -> Result<Self, LusterError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(v) = non_empty("LUSTER_API_URL") {
            config.api_url = v;
        }
        if let Some(v) = non_empty("LUSTER_WS_URL") {
            config.ws_url = v;
        }
        if let Some(v) = non_empty("LUSTER_AUTUMN_URL") {
            config.autumn_url = v;
        }
        if let Some(v) = non_empty("LUSTER_PROXY") {
            config.proxy = Some(v);
        }
        if let Some(v) = non_empty("LUSTER_WS_FORMAT") {
            config.format = v.parse()?;
        }
        Ok(config)
    }

    pub fn api_url(mut self, url: impl Into<String>) -> Self {
        self.api_url = url.into();
        self
    }

    pub fn ws_url(mut self, url: impl Into<String>) -> Self {
        self.ws_url = url.into();
        self
    }

    pub fn autumn_url(mut self, url: impl Into<String>) -> Self {
        self.autumn_url = url.into();
        self
    }

    pub fn proxy(mut self, proxy: impl Into<String>) -> Self {
        self.proxy = Some(proxy.into());
        self
    }

    pub fn format(mut self, format: WebsocketFormat) -> Self {
        self.format = format;
        self
    }

    pub fn heartbeat_interval(mut self, interval: Duration) -> Self {
        self.heartbeat_interval = interval;
        self
    }

    pub fn max_reconnect_attempts(mut self, attempts: u32) -> Self {
        self.max_reconnect_attempts = attempts;
        self
    }

    /// The socket URL with protocol version and format in the query string.
    pub fn socket_url(&self) -> Result<Url, LusterError> {
        let mut url = Url::parse(&self.ws_url)
            .map_err(|e| LusterError::InvalidConfig(format!("invalid websocket URL: {e}")))?;
        url.query_pairs_mut()
            .append_pair("version", &WEBSOCKET_VERSION.to_string())
            .append_pair("format", self.format.as_str());
        Ok(url)
    }

    /// The proxy as a parsed URL, with `http://` assumed when no scheme was given.
    pub fn proxy_url(&self) -> Result<Option<Url>, LusterError> {
        let Some(raw) = &self.proxy else {
            return Ok(None);
        };

        let full = if raw.starts_with("http://") || raw.starts_with("https://") {
            raw.clone()
        } else {
            format!("http://{raw}")
        };

        let url = Url::parse(&full)
            .map_err(|e| LusterError::InvalidConfig(format!("invalid proxy URL `{full}`: {e}")))?;
        if url.host_str().is_none() {
            return Err(LusterError::InvalidConfig(format!(
                "proxy URL `{full}` has no host"
            )));
        }
        Ok(Some(url))
    }
}
