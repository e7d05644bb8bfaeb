use anyhow::{Context, Result};
use futures::{SinkExt, StreamExt};
use hush_core::{ClientSignal, IceServerConfig, PeerId, RelaySignal, RosterSnapshot};
use std::net::SocketAddr;
use std::time::Duration;
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};

/// Timeout for a single relay frame (ms).
pub const SIGNAL_TIMEOUT_MS: u64 = 2000;

/// Raw WebSocket participant talking the relay protocol directly.
pub struct WsTestClient {
    pub peer_id: PeerId,
    pub ice_servers: Vec<IceServerConfig>,
    stream: WebSocketStream<MaybeTlsStream<TcpStream>>,
}

impl WsTestClient {
    /// Connects and consumes the `Welcome` + `IceConfig` greeting.
    pub async fn connect(addr: SocketAddr) -> Result<Self> {
        let (stream, _) = connect_async(format!("ws://{addr}/ws"))
            .await
            .context("Failed to open WebSocket")?;

        let mut client = Self {
            peer_id: PeerId::new(),
            ice_servers: Vec::new(),
            stream,
        };

        match client.recv().await? {
            RelaySignal::Welcome { peer_id } => client.peer_id = peer_id,
            other => anyhow::bail!("Expected Welcome, got {:?}", other),
        }
        match client.recv().await? {
            RelaySignal::IceConfig { ice_servers } => client.ice_servers = ice_servers,
            other => anyhow::bail!("Expected IceConfig, got {:?}", other),
        }
        Ok(client)
    }

    pub async fn send(&mut self, signal: ClientSignal) -> Result<()> {
        let json = serde_json::to_string(&signal)?;
        self.stream
            .send(Message::text(json))
            .await
            .context("Failed to send frame")?;
        Ok(())
    }

    pub async fn send_raw(&mut self, text: &str) -> Result<()> {
        self.stream.send(Message::text(text.to_owned())).await?;
        Ok(())
    }

    /// Next relay frame, or an error after [`SIGNAL_TIMEOUT_MS`].
    pub async fn recv(&mut self) -> Result<RelaySignal> {
        let timeout = Duration::from_millis(SIGNAL_TIMEOUT_MS);
        loop {
            let frame = tokio::time::timeout(timeout, self.stream.next())
                .await
                .context("Timeout waiting for relay frame")?
                .context("Relay closed the socket")??;

            match frame {
                Message::Text(text) => return Ok(serde_json::from_str(text.as_str())?),
                Message::Close(_) => anyhow::bail!("Relay closed the socket"),
                _ => continue,
            }
        }
    }

    pub async fn next_roster(&mut self) -> Result<RosterSnapshot> {
        loop {
            if let RelaySignal::RosterUpdate { snapshot } = self.recv().await? {
                return Ok(snapshot);
            }
        }
    }

    /// True if nothing arrives within `ms`.
    pub async fn is_silent_for(&mut self, ms: u64) -> bool {
        tokio::time::timeout(Duration::from_millis(ms), self.stream.next())
            .await
            .is_err()
    }

    pub async fn close(mut self) -> Result<()> {
        self.stream.close(None).await?;
        Ok(())
    }
}
