//! Shared utilities for the integration suite.

use std::net::SocketAddr;
use std::path::Path;
use std::time::Duration;

use futures_util::StreamExt;
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};

use liveserve::ServeConfig;

pub type WsClient = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Configuration for a test run: loopback, ephemeral port, short debounce,
/// no script injection so byte-for-byte assertions hold.
pub fn test_config(root: &Path) -> ServeConfig {
    let mut config = ServeConfig::new(root);
    config.host = "127.0.0.1".to_string();
    config.port = 0;
    config.debounce_ms = 50;
    config.inject = false;
    config
}

/// Connect a live-reload client to the server at `addr`.
pub async fn connect_client(addr: SocketAddr) -> WsClient {
    let (stream, _response) = connect_async(format!("ws://{}/", addr))
        .await
        .expect("websocket handshake failed");
    stream
}

/// Wait for the next text frame, panicking after `timeout`.
pub async fn next_text(client: &mut WsClient, timeout: Duration) -> String {
    let deadline = tokio::time::sleep(timeout);
    tokio::pin!(deadline);

    loop {
        tokio::select! {
            _ = &mut deadline => panic!("no text frame within {:?}", timeout),
            frame = client.next() => match frame {
                Some(Ok(Message::Text(text))) => return text.to_string(),
                Some(Ok(_)) => continue,
                other => panic!("connection ended before a text frame: {:?}", other),
            },
        }
    }
}

/// Assert that no text frame arrives within `window`.
pub async fn assert_silent(client: &mut WsClient, window: Duration) {
    let deadline = tokio::time::sleep(window);
    tokio::pin!(deadline);

    loop {
        tokio::select! {
            _ = &mut deadline => return,
            frame = client.next() => match frame {
                Some(Ok(Message::Text(text))) => panic!("unexpected frame: {}", text),
                Some(Ok(_)) => continue,
                // Connection ending is fine; only reload frames count.
                _ => return,
            },
        }
    }
}

/// Give the OS watcher a moment to register before writing files.
pub async fn settle() {
    tokio::time::sleep(Duration::from_millis(300)).await;
}
