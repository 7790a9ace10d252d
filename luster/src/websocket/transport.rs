//! Socket setup: TCP (directly or through an HTTP `CONNECT` proxy tunnel),
//! TLS via rustls, then the WebSocket handshake.

use std::sync::Arc;

use base64::{engine::general_purpose::STANDARD as BASE64_STANDARD, Engine as _};
use futures::stream::{SplitSink, SplitStream};
use ::http::{header, HeaderValue};
use tokio::{
    io::{AsyncBufReadExt, AsyncWriteExt, BufReader},
    net::TcpStream,
};
use rustls::{pki_types::ServerName, ClientConfig as TlsConfig, RootCertStore};
use tokio_rustls::{client::TlsStream, TlsConnector};
use tokio_tungstenite::{
    tungstenite::{client::IntoClientRequest, protocol::Message as WsMessage},
    MaybeTlsStream, WebSocketStream,
};
use tracing::debug;
use url::Url;

use crate::{config::ClientConfig, error::LusterError, http::USER_AGENT};

pub(crate) type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;
pub(crate) type WsSink = SplitSink<WsStream, WsMessage>;
pub(crate) type WsSource = SplitStream<WsStream>;

/// Open the event socket described by `config`.
pub(crate) async fn connect(config: &ClientConfig) -> Result<WsStream, LusterError> {
    let url = config.socket_url()?;

    let scheme = url.scheme().to_string();
    let host = url
        .host_str()
        .ok_or_else(|| LusterError::InvalidConfig("WebSocket URL missing host".into()))?
        .to_string();
    let port = url
        .port_or_known_default()
        .ok_or_else(|| LusterError::InvalidConfig("WebSocket URL missing port".into()))?;

    let tcp = match config.proxy_url()? {
        Some(proxy) => tunnel(&proxy, &host, port).await?,
        None => TcpStream::connect((host.as_str(), port)).await?,
    };

    let stream = match scheme.as_str() {
        "ws" => MaybeTlsStream::Plain(tcp),
        "wss" => MaybeTlsStream::Rustls(tls(&host, tcp).await?),
        other => {
            return Err(LusterError::InvalidConfig(format!(
                "Unsupported WebSocket scheme: {other}"
            )))
        }
    };

    let mut request = url.as_str().into_client_request()?;
    request
        .headers_mut()
        .insert(header::USER_AGENT, HeaderValue::from_static(USER_AGENT));

    let (ws, response) = tokio_tungstenite::client_async(request, stream).await?;
    debug!(status = %response.status(), host, "websocket handshake complete");
    Ok(ws)
}

/// Wrap a TCP stream in TLS, verifying against the webpki roots.
async fn tls(host: &str, tcp: TcpStream) -> Result<TlsStream<TcpStream>, LusterError> {
    let mut root_cert_store = RootCertStore::empty();
    root_cert_store.extend(webpki_roots::TLS_SERVER_ROOTS.iter().cloned());

    let config = TlsConfig::builder()
        .with_root_certificates(root_cert_store)
        .with_no_client_auth();
    let connector = TlsConnector::from(Arc::new(config));

    let server_name = ServerName::try_from(host)
        .map_err(|e| LusterError::InvalidConfig(format!("Invalid DNS name '{host}': {e}")))?
        .to_owned();

    Ok(connector.connect(server_name, tcp).await?)
}

/// The `CONNECT` request opening a tunnel to `host:port`.
fn connect_request(proxy: &Url, host: &str, port: u16) -> String {
    let target = format!("{host}:{port}");
    let mut req = format!(
        "CONNECT {target} HTTP/1.1\r\nHost: {target}\r\nUser-Agent: {USER_AGENT}\r\n"
    );

    if !proxy.username().is_empty() {
        let creds = BASE64_STANDARD.encode(format!(
            "{}:{}",
            proxy.username(),
            proxy.password().unwrap_or_default()
        ));
        req.push_str(&format!("Proxy-Authorization: Basic {creds}\r\n"));
    }
    req.push_str("Proxy-Connection: Keep-Alive\r\n\r\n");
    req
}

/// Open a TCP stream to `host:port` through an HTTP proxy.
async fn tunnel(proxy: &Url, host: &str, port: u16) -> Result<TcpStream, LusterError> {
    let proxy_host = proxy
        .host_str()
        .ok_or_else(|| LusterError::InvalidConfig("Proxy URL missing host".into()))?;
    let proxy_port = proxy
        .port_or_known_default()
        .ok_or_else(|| LusterError::InvalidConfig("Proxy URL missing port".into()))?;

    let mut stream = TcpStream::connect((proxy_host, proxy_port)).await?;
    stream
        .write_all(connect_request(proxy, host, port).as_bytes())
        .await?;
    stream.flush().await?;

    let mut rdr = BufReader::new(stream);
    let mut status_line = String::new();
    rdr.read_line(&mut status_line).await?;

    if !is_tunnel_established(&status_line) {
        return Err(LusterError::Other(format!(
            "Proxy tunnel failed: {}",
            status_line.trim_end()
        )));
    }

    // Consume headers.
    loop {
        let mut line = String::new();
        let bytes = rdr.read_line(&mut line).await?;
        if bytes == 0 || line == "\r\n" {
            break;
        }
    }

    debug!(proxy = proxy_host, target = host, "proxy tunnel established");
    Ok(rdr.into_inner())
}

fn is_tunnel_established(status_line: &str) -> bool {
    let mut parts = status_line.split_whitespace();
    matches!(
        (parts.next(), parts.next()),
        (Some("HTTP/1.1" | "HTTP/1.0"), Some(code)) if code.starts_with('2')
    )
}
