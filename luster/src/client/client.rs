//! The `Client` facade: one object bundling the HTTP handler, the cache, and
//! the event socket.
//!
//! All HTTP requests and socket traffic go through the proxy configured in
//! [`ClientConfig::proxy`], if any. Supported proxy formats:
//! * `http://USERNAME:PASSWORD@IP:PORT`
//! * `http://IP:PORT` *(user / password omitted)*

use std::fmt::{self, Debug, Formatter};
use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};

use tokio::{sync::Mutex, task::JoinHandle};
use tracing::{debug, info};

use crate::{
    api::{ChannelsApi, FetchMessagesOptions, FilesApi, MessagesApi, NodeApi, ServersApi, UsersApi},
    cache::Cache,
    config::{ClientConfig, Credentials},
    error::LusterError,
    http::HttpHandler,
    models::{channel_factory, AnyChannel, Category, PartialUploadedFile},
    state::State,
    types::{
        bulk_message_response::BulkMessageResponse, enums::FileTag, message::DataMessageSend,
        node::NodeInfo, server::Server, user::User, Message,
    },
    websocket::{transport::WsSink, ConnectionState, EventHandler},
};

/// Main client to interact with the Revolt API.
#[derive(Clone)]
pub struct Client {
    state: State,
    initialized: Arc<AtomicBool>,
    pub(crate) ws_tx: Arc<Mutex<Option<WsSink>>>,
    pub(crate) event_handler: Arc<Mutex<Option<Arc<dyn EventHandler>>>>,
    pub(crate) connection_state: Arc<Mutex<ConnectionState>>,
    pub(crate) heartbeat_task: Arc<Mutex<Option<JoinHandle<()>>>>,
}

impl Debug for Client {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("Client")
            .field("state", &self.state)
            .field("initialized", &self.initialized)
            .field("event_handler", &"Arc<Mutex<Option<Arc<dyn EventHandler>>>>")
            .field("connection_state", &self.connection_state)
            .finish()
    }
}

impl Client {
    /// Construct a client against the public Revolt instance.
    ///
    /// `bot` selects the credential mode: bot tokens go in `x-bot-token`,
    /// session tokens in `x-session-token`.
    pub fn new(token: impl Into<String>, bot: bool) -> Result<Self, LusterError> {
        Self::with_config(Credentials::new(token, bot), ClientConfig::default())
    }

    /// Construct a client with explicit endpoints, proxy and socket settings.
    pub fn with_config(credentials: Credentials, config: ClientConfig) -> Result<Self, LusterError> {
        let http = HttpHandler::new(config, credentials)?;
        Ok(Self {
            state: State::new(http),
            initialized: Arc::new(AtomicBool::new(false)),
            ws_tx: Arc::new(Mutex::new(None)),
            event_handler: Arc::new(Mutex::new(None)),
            connection_state: Arc::new(Mutex::new(ConnectionState::Disconnected)),
            heartbeat_task: Arc::new(Mutex::new(None)),
        })
    }

    /// The low-level endpoint surface.
    pub fn http_handler(&self) -> &HttpHandler {
        self.state.http()
    }

    pub fn state(&self) -> &State {
        &self.state
    }

    pub fn cache(&self) -> &Cache {
        self.state.cache()
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized.load(Ordering::SeqCst)
    }

    /// Prepare the client for use. Calling it again does nothing.
    ///
    /// A client that was [closed](Self::close) cannot be initialized again.
    pub async fn init(&self) -> Result<(), LusterError> {
        if self.http_handler().is_closed() {
            return Err(LusterError::Closed);
        }
        if !self.initialized.swap(true, Ordering::SeqCst) {
            let bot = self.http_handler().credentials().await.is_bot();
            info!(api = %self.state.config().api_url, bot, "client initialized");
        }
        Ok(())
    }

    /// Close the socket and the HTTP handler. Does nothing when the client
    /// was never initialized.
    pub async fn close(&self) -> Result<(), LusterError> {
        if !self.initialized.swap(false, Ordering::SeqCst) {
            debug!("close called on an uninitialized client");
            return Ok(());
        }
        self.close_ws(None).await?;
        self.http_handler().close();
        info!("client closed");
        Ok(())
    }

    /* ───────────── Convenience wrappers around the endpoints ───────────── */

    pub async fn fetch_user(&self, user_id: &str) -> Result<User, LusterError> {
        let user = self.http_handler().fetch_user(user_id).await?;
        self.cache().insert_user(user.clone()).await;
        Ok(user)
    }

    /// The account this client is logged in as.
    pub async fn fetch_self(&self) -> Result<User, LusterError> {
        let user = self.http_handler().fetch_self().await?;
        self.cache().insert_user(user.clone()).await;
        Ok(user)
    }

    /// Fetch a channel as its typed model.
    pub async fn fetch_channel(&self, channel_id: &str) -> Result<AnyChannel, LusterError> {
        let channel = self.http_handler().fetch_channel(channel_id).await?;
        self.cache().insert_channel(channel.clone()).await;
        Ok(channel_factory(channel, self.state.clone()))
    }

    pub async fn fetch_server(&self, server_id: &str) -> Result<Server, LusterError> {
        let server = self.http_handler().fetch_server(server_id).await?;
        self.cache().insert_server(server.clone()).await;
        Ok(server)
    }

    /// Send a plain text message.
    pub async fn send_message(&self, channel_id: &str, content: &str) -> Result<Message, LusterError> {
        self.send_message_with(channel_id, DataMessageSend::new(content))
            .await
    }

    /// Send a message with replies, attachments, embeds or masquerade.
    pub async fn send_message_with(
        &self,
        channel_id: &str,
        data: DataMessageSend,
    ) -> Result<Message, LusterError> {
        let message = self
            .http_handler()
            .send_message(channel_id, &data, None)
            .await?;
        Ok(message.with_state(self.state.clone()))
    }

    /// Message history of a channel. Users sent along are cached.
    pub async fn fetch_messages(
        &self,
        channel_id: &str,
        opts: Option<FetchMessagesOptions>,
    ) -> Result<Vec<Message>, LusterError> {
        let mut resp = self.http_handler().fetch_messages(channel_id, opts).await?;
        resp.inject_state(&self.state);
        if let BulkMessageResponse::MessagesWithUsers { users, .. } = &resp {
            for user in users {
                self.cache().insert_user(user.clone()).await;
            }
        }
        Ok(resp.into_messages())
    }

    /// Upload a file to Autumn under `tag`.
    pub async fn upload_file(
        &self,
        tag: FileTag,
        filename: &str,
        bytes: Vec<u8>,
        content_type: Option<&str>,
    ) -> Result<PartialUploadedFile, LusterError> {
        let data = self
            .http_handler()
            .upload_file(tag, filename, bytes, content_type)
            .await?;
        Ok(PartialUploadedFile::new(data, tag, self.state.clone()))
    }

    /// Categories of a cached server. Empty when the server is not cached.
    pub async fn categories(&self, server_id: &str) -> Vec<Category> {
        let Some(server) = self.cache().get_server(server_id).await else {
            return Vec::new();
        };
        server
            .categories
            .unwrap_or_default()
            .into_iter()
            .map(|c| Category::new(c, self.state.clone()))
            .collect()
    }

    /// Information about the Revolt instance.
    pub async fn query_node(&self) -> Result<NodeInfo, LusterError> {
        self.http_handler().query_node().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn close_before_init_is_noop() {
        let client = Client::new("token", true).unwrap();
        assert!(!client.is_initialized());
        client.close().await.unwrap();
        assert!(!client.http_handler().is_closed());
    }

    #[tokio::test]
    async fn init_is_idempotent_and_close_is_final() {
        let client = Client::new("token", true).unwrap();
        client.init().await.unwrap();
        client.init().await.unwrap();
        assert!(client.is_initialized());

        client.close().await.unwrap();
        assert!(!client.is_initialized());
        assert!(client.http_handler().is_closed());
        assert!(matches!(client.init().await, Err(LusterError::Closed)));
    }

    #[tokio::test]
    async fn socket_calls_need_a_connection() {
        let client = Client::new("token", true).unwrap();
        assert_eq!(client.connection_state().await, ConnectionState::Disconnected);
        assert!(matches!(
            client.begin_typing("C1").await,
            Err(LusterError::NotConnected)
        ));
    }

    #[tokio::test]
    async fn categories_of_unknown_server_are_empty() {
        let client = Client::new("token", false).unwrap();
        assert!(client.categories("S1").await.is_empty());
    }
}
