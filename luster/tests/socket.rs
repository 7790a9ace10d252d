//! Event socket lifecycle against a local WebSocket server.

use std::{
    collections::HashMap,
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc, Mutex,
    },
    time::Duration,
};

use futures::StreamExt;
use luster::{Client, ClientConfig, ConnectionState, Credentials, LusterError};
use tokio::{net::TcpListener, time::sleep};
use tokio_tungstenite::{accept_async, tungstenite::Message};

#[derive(Clone, Default)]
struct Seen {
    connections: Arc<AtomicUsize>,
    /// Pings received, per connection index.
    pings: Arc<Mutex<HashMap<usize, usize>>>,
}

impl Seen {
    fn connections(&self) -> usize {
        self.connections.load(Ordering::SeqCst)
    }

    fn pings(&self, connection: usize) -> usize {
        self.pings
            .lock()
            .unwrap()
            .get(&connection)
            .copied()
            .unwrap_or_default()
    }
}

/// Accepts sockets forever. Every handshake waits `handshake_delay`; with
/// `hang_up_first` the first connection is closed by the server right away.
async fn socket_server(handshake_delay: Duration, hang_up_first: bool) -> (String, Seen) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let url = format!("ws://{}", listener.local_addr().unwrap());
    let seen = Seen::default();

    let counters = seen.clone();
    tokio::spawn(async move {
        while let Ok((tcp, _)) = listener.accept().await {
            let seen = counters.clone();
            tokio::spawn(async move {
                sleep(handshake_delay).await;
                let Ok(mut ws) = accept_async(tcp).await else {
                    return;
                };
                let n = seen.connections.fetch_add(1, Ordering::SeqCst);
                if hang_up_first && n == 0 {
                    let _ = ws.close(None).await;
                    return;
                }
                while let Some(Ok(msg)) = ws.next().await {
                    if let Message::Text(txt) = &msg {
                        if txt.contains(r#""type":"Ping""#) {
                            *seen.pings.lock().unwrap().entry(n).or_default() += 1;
                        }
                    }
                }
            });
        }
    });

    (url, seen)
}

fn client(ws_url: &str, heartbeat: Duration) -> Client {
    let config = ClientConfig::new()
        .ws_url(ws_url)
        .heartbeat_interval(heartbeat)
        .max_reconnect_attempts(3);
    Client::with_config(Credentials::Bot("bot-token".into()), config).unwrap()
}

async fn wait_for(client: &Client, wanted: ConnectionState) {
    for _ in 0..100 {
        if client.connection_state().await == wanted {
            return;
        }
        sleep(Duration::from_millis(20)).await;
    }
    panic!(
        "state stayed {:?}, wanted {wanted:?}",
        client.connection_state().await
    );
}

#[tokio::test]
async fn close_while_connecting_keeps_the_socket_down() {
    let (url, _seen) = socket_server(Duration::from_millis(300), false).await;
    let client = client(&url, Duration::from_secs(30));

    let starting = tokio::spawn({
        let client = client.clone();
        async move { client.start().await }
    });
    sleep(Duration::from_millis(100)).await;
    client.close_ws(None).await.unwrap();
    starting.await.unwrap().unwrap();

    assert_eq!(client.connection_state().await, ConnectionState::Disconnected);
    assert!(matches!(
        client.begin_typing("C1").await,
        Err(LusterError::NotConnected)
    ));
}

#[tokio::test]
async fn close_never_reconnects() {
    let (url, seen) = socket_server(Duration::ZERO, false).await;
    let client = client(&url, Duration::from_secs(30));

    client.start().await.unwrap();
    assert_eq!(client.connection_state().await, ConnectionState::Connected);
    client.close_ws(Some("bye")).await.unwrap();
    wait_for(&client, ConnectionState::Disconnected).await;

    // Longer than the first reconnect delay.
    sleep(Duration::from_millis(1500)).await;
    assert_eq!(seen.connections(), 1);
    assert_eq!(client.connection_state().await, ConnectionState::Disconnected);
}

#[tokio::test]
async fn dropped_socket_reconnects() {
    let (url, seen) = socket_server(Duration::ZERO, true).await;
    let client = client(&url, Duration::from_secs(30));

    client.start().await.unwrap();
    sleep(Duration::from_millis(1500)).await;

    assert_eq!(seen.connections(), 2);
    wait_for(&client, ConnectionState::Connected).await;
    client.close_ws(None).await.unwrap();
}

#[tokio::test]
async fn restart_runs_a_single_heartbeat() {
    let (url, seen) = socket_server(Duration::ZERO, false).await;
    let client = client(&url, Duration::from_millis(200));

    client.start().await.unwrap();
    sleep(Duration::from_millis(100)).await;
    client.close_ws(None).await.unwrap();
    wait_for(&client, ConnectionState::Disconnected).await;

    client.start().await.unwrap();
    sleep(Duration::from_millis(1050)).await;
    client.close_ws(None).await.unwrap();

    // One pinger at 200ms sends about five in that window; two would send ten.
    let pings = seen.pings(1);
    assert!((3..=7).contains(&pings), "{pings} pings on the second socket");
}
