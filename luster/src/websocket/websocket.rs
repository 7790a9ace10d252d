//! Event socket runtime.
//!
//! The socket is opened by [`transport::connect`]; when a proxy is set in
//! [`ClientConfig`](crate::config::ClientConfig) it goes through an HTTP
//! `CONNECT` tunnel first. Frames are JSON text or MessagePack binary
//! depending on the configured format.

use std::{sync::Arc, time::Duration};

use futures::{SinkExt, StreamExt};
use tokio::time::{interval, sleep};
use tokio_tungstenite::tungstenite::protocol::{
    frame::coding::CloseCode, CloseFrame, Message as WsMessage,
};
use tracing::{debug, error, info, warn};

use super::{
    event_handler::{
        ChannelUserEvent, EventHandler, MessageDeleteEvent, MessageUpdateEvent,
        PartialUpdateEvent, ReactionEvent, ReadyEvent,
    },
    transport::{self, WsSource},
};
use crate::{
    client::Client,
    config::WebsocketFormat,
    error::LusterError,
    models::channels::channel_factory,
    types::{
        user::MemberCompositeKey,
        websocket::{ClientToServerEvent, ServerToClientEvent},
    },
};

/// Connection state for the WebSocket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConnectionState {
    #[default]
    Disconnected,
    Connecting,
    Connected,
    Closing,
    Reconnecting,
}

const INITIAL_RETRY_DELAY: Duration = Duration::from_secs(1);
const MAX_RETRY_DELAY: Duration = Duration::from_secs(60);

/// Reconnect policy: the delay doubles from one second up to a minute after
/// each failed attempt, and gives up after `max_attempts` failures in a row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Backoff {
    max_attempts: u32,
    failures: u32,
    delay: Duration,
}

impl Backoff {
    pub(crate) fn new(max_attempts: u32) -> Self {
        Self {
            max_attempts,
            failures: 0,
            delay: INITIAL_RETRY_DELAY,
        }
    }

    /// Wait before the next attempt, or `None` once the attempts are used up.
    pub(crate) fn next_delay(&self) -> Option<Duration> {
        (self.failures < self.max_attempts).then_some(self.delay)
    }

    pub(crate) fn failed(&mut self) {
        self.failures += 1;
        self.delay = (self.delay * 2).min(MAX_RETRY_DELAY);
    }

    pub(crate) fn succeeded(&mut self) {
        self.failures = 0;
        self.delay = INITIAL_RETRY_DELAY;
    }

    pub(crate) fn failures(&self) -> u32 {
        self.failures
    }
}

/// Decode one socket frame. Control frames yield `None`.
pub(crate) fn decode_frame(msg: &WsMessage) -> Option<Result<ServerToClientEvent, LusterError>> {
    match msg {
        WsMessage::Text(txt) => Some(serde_json::from_str(txt).map_err(LusterError::from)),
        WsMessage::Binary(bin) => Some(rmp_serde::from_slice(bin).map_err(LusterError::from)),
        WsMessage::Close(_) | WsMessage::Ping(_) | WsMessage::Pong(_) | WsMessage::Frame(_) => {
            None
        }
    }
}

/// Encode an outgoing event in the configured wire format.
pub(crate) fn encode_event(
    format: WebsocketFormat,
    event: &ClientToServerEvent,
) -> Result<WsMessage, LusterError> {
    Ok(match format {
        WebsocketFormat::Json => WsMessage::Text(serde_json::to_string(event)?.into()),
        WebsocketFormat::Msgpack => WsMessage::Binary(rmp_serde::to_vec_named(event)?.into()),
    })
}

impl Client {
    /// Register the handler that receives socket events.
    pub async fn event_handler<E: EventHandler>(&self, handler: E) {
        *self.event_handler.lock().await = Some(Arc::new(handler));
    }

    /// Open the event socket, authenticate, and start the heartbeat and read
    /// loop in the background.
    ///
    /// When [`close_ws`](Self::close_ws) runs while the socket is still
    /// connecting, the fresh socket is dropped and nothing is spawned.
    pub async fn start(&self) -> Result<(), LusterError> {
        self.init().await?;

        {
            let mut state = self.connection_state.lock().await;
            if *state != ConnectionState::Disconnected {
                return Err(LusterError::AlreadyRunning);
            }
            *state = ConnectionState::Connecting;
        }
        self.stop_heartbeat().await;

        let read = match self.connect_and_authenticate().await {
            Ok(Some(read)) => read,
            Ok(None) => {
                info!("event socket closed while connecting");
                *self.connection_state.lock().await = ConnectionState::Disconnected;
                return Ok(());
            }
            Err(e) => {
                *self.connection_state.lock().await = ConnectionState::Disconnected;
                return Err(e);
            }
        };
        info!("event socket connected");

        let heartbeat = tokio::spawn({
            let client = self.clone();
            async move { client.heartbeat().await }
        });
        if let Some(stale) = self.heartbeat_task.lock().await.replace(heartbeat) {
            stale.abort();
        }

        tokio::spawn({
            let client = self.clone();
            async move { client.ws_read_loop_with_reconnect(read).await }
        });

        Ok(())
    }

    /// Get the current WebSocket connection state
    pub async fn connection_state(&self) -> ConnectionState {
        *self.connection_state.lock().await
    }

    /// Connect and send `Authenticate`. `None` means the socket was closed by
    /// the user in the meantime and must not be used.
    async fn connect_and_authenticate(&self) -> Result<Option<WsSource>, LusterError> {
        let ws = transport::connect(self.state().config()).await?;
        let (mut write, read) = ws.split();

        {
            let mut state = self.connection_state.lock().await;
            if !matches!(
                *state,
                ConnectionState::Connecting | ConnectionState::Reconnecting
            ) {
                drop(state);
                if let Err(e) = write.send(WsMessage::Close(None)).await {
                    debug!(error = %e, "could not close abandoned socket");
                }
                return Ok(None);
            }
            *self.ws_tx.lock().await = Some(write);
            *state = ConnectionState::Connected;
        }

        let token = self.http_handler().credentials().await.token().to_string();
        if let Err(e) = self.send_authenticate(&token).await {
            *self.ws_tx.lock().await = None;
            if self.connection_state().await == ConnectionState::Closing {
                return Ok(None);
            }
            return Err(e);
        }
        Ok(Some(read))
    }

    /// Ping on the configured interval while the client is running. Missed
    /// ticks during a reconnect are skipped.
    async fn heartbeat(&self) {
        let mut ticker = interval(self.state().config().heartbeat_interval);
        ticker.tick().await;

        loop {
            ticker.tick().await;
            match self.connection_state().await {
                ConnectionState::Connected => {
                    if let Err(e) = self.ping(None).await {
                        warn!(error = %e, "heartbeat ping failed");
                    }
                }
                ConnectionState::Connecting | ConnectionState::Reconnecting => {}
                ConnectionState::Closing | ConnectionState::Disconnected => {
                    debug!("heartbeat stopped");
                    break;
                }
            }
        }
    }

    async fn stop_heartbeat(&self) {
        if let Some(task) = self.heartbeat_task.lock().await.take() {
            task.abort();
        }
    }

    /// Main WebSocket read loop with automatic reconnection handling
    async fn ws_read_loop_with_reconnect(&self, read: WsSource) {
        self.read_loop(read).await;

        let mut backoff = Backoff::new(self.state().config().max_reconnect_attempts);

        loop {
            let delay = {
                let mut state = self.connection_state.lock().await;
                if *state == ConnectionState::Closing {
                    info!("event socket closed");
                    *state = ConnectionState::Disconnected;
                    break;
                }
                let Some(delay) = backoff.next_delay() else {
                    error!(
                        attempts = backoff.failures(),
                        "maximum reconnection attempts reached, giving up"
                    );
                    *state = ConnectionState::Disconnected;
                    break;
                };
                *state = ConnectionState::Reconnecting;
                delay
            };
            warn!(
                attempt = backoff.failures() + 1,
                max = self.state().config().max_reconnect_attempts,
                ?delay,
                "connection lost, reconnecting"
            );

            sleep(delay).await;

            // `close_ws` may have run while sleeping.
            if self.connection_state().await == ConnectionState::Closing {
                continue;
            }

            match self.connect_and_authenticate().await {
                Ok(Some(read)) => {
                    info!("reconnected");
                    backoff.succeeded();
                    self.read_loop(read).await;
                }
                Ok(None) => {}
                Err(e) => {
                    warn!(error = %e, "reconnection attempt failed");
                    backoff.failed();
                }
            }
        }
    }

    /// Receive frames until the socket closes or errors.
    async fn read_loop(&self, mut read: WsSource) {
        while let Some(msg) = read.next().await {
            let msg = match msg {
                Ok(msg) => msg,
                Err(e) => {
                    warn!(error = %e, "error reading from event socket");
                    break;
                }
            };

            if let WsMessage::Close(frame) = &msg {
                info!(?frame, "close frame received");
                break;
            }

            match decode_frame(&msg) {
                Some(Ok(event)) => {
                    for event in event.flatten() {
                        self.handle_event(event).await;
                    }
                }
                Some(Err(e)) => warn!(error = %e, "failed to decode event"),
                None => {}
            }
        }

        *self.ws_tx.lock().await = None;
    }

    /// Apply one event to the cache, then hand it to the event handler.
    async fn handle_event(&self, event: ServerToClientEvent) {
        let cache = self.cache();

        // Snapshots of entities that the event is about to remove.
        let deleted_channel = match &event {
            ServerToClientEvent::ChannelDelete { id } => cache.get_channel(id).await,
            _ => None,
        };
        let deleted_server = match &event {
            ServerToClientEvent::ServerDelete { id } => cache.get_server(id).await,
            _ => None,
        };

        cache.apply_event(&event).await;

        match &event {
            ServerToClientEvent::Error { error } => error!(?error, "event socket error"),
            ServerToClientEvent::Authenticated => debug!("authenticated"),
            ServerToClientEvent::Logout => warn!("session invalidated by the server"),
            ServerToClientEvent::Unknown => debug!("ignoring unknown event"),
            _ => {}
        }

        let maybe_handler = self.event_handler.lock().await.clone();
        let Some(handler) = maybe_handler else {
            return;
        };

        handler.on_event(self, &event).await;

        match event {
            ServerToClientEvent::Error { error } => handler.on_error_event(self, error).await,
            ServerToClientEvent::Authenticated => handler.on_authenticated(self).await,
            ServerToClientEvent::Logout => handler.on_logout(self).await,
            ServerToClientEvent::Pong { data } => handler.on_pong(self, data).await,
            ServerToClientEvent::Ready {
                users,
                servers,
                channels,
                members,
                emojis,
            } => {
                let ready = ReadyEvent {
                    users,
                    servers,
                    channels,
                    members,
                    emojis,
                };
                handler.on_ready(self, &ready).await;
            }

            // ------------------ MESSAGE EVENTS -------------------
            ServerToClientEvent::Message(message) => {
                let message = message.with_state(self.state().clone());
                handler.on_message(self, &message).await;
            }
            ServerToClientEvent::MessageUpdate { id, channel, data } => {
                let evt = MessageUpdateEvent { id, channel, data };
                handler.on_message_update(self, &evt).await;
            }
            ServerToClientEvent::MessageAppend {
                id,
                channel,
                append,
            } => {
                let evt = MessageUpdateEvent {
                    id,
                    channel,
                    data: append,
                };
                handler.on_message_append(self, &evt).await;
            }
            ServerToClientEvent::MessageDelete { id, channel } => {
                let evt = MessageDeleteEvent { id, channel };
                handler.on_message_delete(self, &evt).await;
            }
            ServerToClientEvent::BulkMessageDelete { channel, ids } => {
                handler.on_bulk_message_delete(self, &channel, &ids).await;
            }
            ServerToClientEvent::MessageReact {
                id,
                channel_id,
                user_id,
                emoji_id,
            } => {
                let evt = ReactionEvent {
                    message_id: id,
                    channel_id,
                    user_id: Some(user_id),
                    emoji_id,
                };
                handler.on_message_react(self, &evt).await;
            }
            ServerToClientEvent::MessageUnreact {
                id,
                channel_id,
                user_id,
                emoji_id,
            } => {
                let evt = ReactionEvent {
                    message_id: id,
                    channel_id,
                    user_id: Some(user_id),
                    emoji_id,
                };
                handler.on_message_unreact(self, &evt).await;
            }
            ServerToClientEvent::MessageRemoveReaction {
                id,
                channel_id,
                emoji_id,
            } => {
                let evt = ReactionEvent {
                    message_id: id,
                    channel_id,
                    user_id: None,
                    emoji_id,
                };
                handler.on_message_remove_reaction(self, &evt).await;
            }

            // ------------------ CHANNEL EVENTS -------------------
            ServerToClientEvent::ChannelCreate(channel) => {
                let channel = channel_factory(channel, self.state().clone());
                handler.on_channel_create(self, &channel).await;
            }
            ServerToClientEvent::ChannelUpdate { id, data, clear } => {
                let evt = PartialUpdateEvent { id, data, clear };
                handler.on_channel_update(self, &evt).await;
            }
            ServerToClientEvent::ChannelDelete { id } => {
                handler
                    .on_channel_delete(self, &id, deleted_channel.as_ref())
                    .await;
            }
            ServerToClientEvent::ChannelGroupJoin { id, user } => {
                let evt = ChannelUserEvent {
                    channel_id: id,
                    user_id: user,
                };
                handler.on_channel_group_join(self, &evt).await;
            }
            ServerToClientEvent::ChannelGroupLeave { id, user } => {
                let evt = ChannelUserEvent {
                    channel_id: id,
                    user_id: user,
                };
                handler.on_channel_group_leave(self, &evt).await;
            }
            ServerToClientEvent::ChannelStartTyping { id, user } => {
                let evt = ChannelUserEvent {
                    channel_id: id,
                    user_id: user,
                };
                handler.on_typing_start(self, &evt).await;
            }
            ServerToClientEvent::ChannelStopTyping { id, user } => {
                let evt = ChannelUserEvent {
                    channel_id: id,
                    user_id: user,
                };
                handler.on_typing_stop(self, &evt).await;
            }
            ServerToClientEvent::ChannelAck {
                id,
                user,
                message_id,
            } => {
                let evt = ChannelUserEvent {
                    channel_id: id,
                    user_id: user,
                };
                handler.on_channel_ack(self, &evt, &message_id).await;
            }

            // ------------------ SERVER EVENTS --------------------
            ServerToClientEvent::ServerCreate { server, .. } => {
                handler.on_server_create(self, &server).await;
            }
            ServerToClientEvent::ServerUpdate { id, data, clear } => {
                let evt = PartialUpdateEvent { id, data, clear };
                handler.on_server_update(self, &evt).await;
            }
            ServerToClientEvent::ServerDelete { id } => {
                handler
                    .on_server_delete(self, &id, deleted_server.as_ref())
                    .await;
            }
            ServerToClientEvent::ServerMemberJoin { id, user } => {
                let key = MemberCompositeKey { server: id, user };
                handler.on_member_join(self, &key).await;
            }
            ServerToClientEvent::ServerMemberUpdate { id, data, clear } => {
                let evt = PartialUpdateEvent {
                    id: id.server.clone(),
                    data,
                    clear,
                };
                handler.on_member_update(self, &id, &evt).await;
            }
            ServerToClientEvent::ServerMemberLeave { id, user } => {
                let key = MemberCompositeKey { server: id, user };
                handler.on_member_leave(self, &key).await;
            }
            ServerToClientEvent::ServerRoleUpdate {
                id,
                role_id,
                data,
                clear,
            } => {
                let evt = PartialUpdateEvent { id, data, clear };
                handler.on_role_update(self, &role_id, &evt).await;
            }
            ServerToClientEvent::ServerRoleDelete { id, role_id } => {
                handler.on_role_delete(self, &id, &role_id).await;
            }

            // ------------------ USER / EMOJI EVENTS --------------
            ServerToClientEvent::UserUpdate { id, data, clear } => {
                let evt = PartialUpdateEvent { id, data, clear };
                handler.on_user_update(self, &evt).await;
            }
            ServerToClientEvent::UserRelationship { user, .. } => {
                handler.on_user_relationship(self, &user).await;
            }
            ServerToClientEvent::EmojiCreate(emoji) => {
                handler.on_emoji_create(self, &emoji).await;
            }
            ServerToClientEvent::EmojiDelete { id } => {
                handler.on_emoji_delete(self, &id).await;
            }

            ServerToClientEvent::Bulk { .. }
            | ServerToClientEvent::UserPlatformWipe { .. }
            | ServerToClientEvent::Auth { .. }
            | ServerToClientEvent::Unknown => {}
        }
    }

    /// Send an `Authenticate` event with the given token.
    pub async fn send_authenticate(&self, token: &str) -> Result<(), LusterError> {
        self.send_ws(ClientToServerEvent::Authenticate {
            token: token.to_string(),
        })
        .await
    }

    /// Send a Ping to the server. If `data` is None, defaults to 0.
    pub async fn ping(&self, data: Option<i64>) -> Result<(), LusterError> {
        self.send_ws(ClientToServerEvent::Ping {
            data: data.unwrap_or(0),
        })
        .await
    }

    /// Send a `BeginTyping` event.
    pub async fn begin_typing(&self, channel_id: &str) -> Result<(), LusterError> {
        self.send_ws(ClientToServerEvent::BeginTyping {
            channel: channel_id.to_string(),
        })
        .await
    }

    /// Send an `EndTyping` event.
    pub async fn end_typing(&self, channel_id: &str) -> Result<(), LusterError> {
        self.send_ws(ClientToServerEvent::EndTyping {
            channel: channel_id.to_string(),
        })
        .await
    }

    /// Send a `Subscribe` event to receive member updates of a server.
    pub async fn subscribe(&self, server_id: &str) -> Result<(), LusterError> {
        self.send_ws(ClientToServerEvent::Subscribe {
            server_id: server_id.to_string(),
        })
        .await
    }

    async fn send_ws(&self, payload: ClientToServerEvent) -> Result<(), LusterError> {
        let frame = encode_event(self.state().config().format, &payload)?;

        let mut guard = self.ws_tx.lock().await;
        let Some(writer) = guard.as_mut() else {
            return Err(LusterError::NotConnected);
        };
        writer.send(frame).await?;
        Ok(())
    }

    /// Close the event socket. The read loop stops without reconnecting.
    pub async fn close_ws(&self, reason: Option<&str>) -> Result<(), LusterError> {
        {
            let mut state = self.connection_state.lock().await;
            if *state == ConnectionState::Disconnected {
                return Ok(());
            }
            *state = ConnectionState::Closing;
        }
        self.stop_heartbeat().await;

        let mut guard = self.ws_tx.lock().await;
        if let Some(writer) = guard.as_mut() {
            let frame = CloseFrame {
                code: CloseCode::Normal,
                reason: reason.unwrap_or("Closing").into(),
            };
            if let Err(e) = writer.send(WsMessage::Close(Some(frame))).await {
                debug!(error = %e, "could not send close frame");
            }
        }
        *guard = None;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backoff_doubles_up_to_a_minute() {
        let mut backoff = Backoff::new(u32::MAX);
        let mut delays = Vec::new();
        for _ in 0..8 {
            delays.push(backoff.next_delay().unwrap().as_secs());
            backoff.failed();
        }
        assert_eq!(delays, vec![1, 2, 4, 8, 16, 32, 60, 60]);
    }

    #[test]
    fn backoff_gives_up_after_max_failures() {
        let mut backoff = Backoff::new(3);
        for _ in 0..3 {
            assert!(backoff.next_delay().is_some());
            backoff.failed();
        }
        assert_eq!(backoff.failures(), 3);
        assert_eq!(backoff.next_delay(), None);
    }

    #[test]
    fn backoff_resets_after_success() {
        let mut backoff = Backoff::new(3);
        backoff.failed();
        backoff.failed();
        backoff.succeeded();
        assert_eq!(backoff, Backoff::new(3));
        assert_eq!(backoff.next_delay(), Some(INITIAL_RETRY_DELAY));
    }

    #[test]
    fn zero_attempts_never_reconnects() {
        assert_eq!(Backoff::new(0).next_delay(), None);
    }

    #[test]
    fn text_frames_are_json() {
        let msg = WsMessage::Text(r#"{"type":"Pong","data":7}"#.into());
        let event = decode_frame(&msg).unwrap().unwrap();
        assert!(matches!(event, ServerToClientEvent::Pong { data: 7 }));
    }

    #[test]
    fn binary_frames_are_msgpack() {
        let ping = ClientToServerEvent::Ping { data: 3 };
        let WsMessage::Binary(bin) = encode_event(WebsocketFormat::Msgpack, &ping).unwrap() else {
            panic!("msgpack should encode to a binary frame");
        };
        let back: ClientToServerEvent = rmp_serde::from_slice(&bin).unwrap();
        assert_eq!(back, ping);
    }

    #[test]
    fn json_format_sends_text() {
        let frame = encode_event(
            WebsocketFormat::Json,
            &ClientToServerEvent::EndTyping {
                channel: "C1".into(),
            },
        )
        .unwrap();
        let WsMessage::Text(txt) = frame else {
            panic!("json should encode to a text frame");
        };
        assert_eq!(txt.as_str(), r#"{"type":"EndTyping","channel":"C1"}"#);
    }

    #[test]
    fn control_frames_are_skipped() {
        assert!(decode_frame(&WsMessage::Ping(Vec::new().into())).is_none());
        assert!(decode_frame(&WsMessage::Close(None)).is_none());
    }

    #[test]
    fn undecodable_text_is_an_error() {
        let msg = WsMessage::Text("not json".into());
        assert!(matches!(decode_frame(&msg), Some(Err(LusterError::SerdeError(_)))));
    }
}
