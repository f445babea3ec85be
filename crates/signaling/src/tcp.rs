//! TCP-Listener – Bindet Socket, akzeptiert Verbindungen
//!
//! Der `RelayServer` bindet einen TCP-Socket und startet fuer jede
//! eingehende Verbindung einen eigenen tokio-Task mit einer
//! `ClientConnection`. Alle geteilten Dienste sind Send + Sync, die
//! Tasks laufen auf dem regulaeren Multi-Thread-Executor.

use futures_util::SinkExt;
use funkraum_protocol::{
    message::{ErrorCode, RelayMessage},
    wire::FrameCodec,
};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::{TcpListener, TcpStream};
use tokio_util::codec::Framed;

use crate::connection::ClientConnection;
use crate::error::SignalingError;
use crate::server_state::RelayState;

/// TCP-Relay-Server
///
/// Bindet einen TCP-Socket und akzeptiert Verbindungen in einer Loop.
pub struct RelayServer {
    state: Arc<RelayState>,
    bind_addr: SocketAddr,
}

impl RelayServer {
    /// Erstellt einen neuen RelayServer
    pub fn neu(state: Arc<RelayState>, bind_addr: SocketAddr) -> Self {
        Self { state, bind_addr }
    }

    /// Startet den TCP-Listener und akzeptiert Verbindungen
    ///
    /// Laeuft bis `shutdown_rx` ein `true`-Signal empfaengt.
    pub async fn starten(
        self,
        mut shutdown_rx: tokio::sync::watch::Receiver<bool>,
    ) -> std::io::Result<()> {
        let listener = TcpListener::bind(self.bind_addr).await?;
        let lokale_addr = listener.local_addr()?;

        tracing::info!(adresse = %lokale_addr, "TCP Relay-Server gestartet");

        loop {
            tokio::select! {
                // Neue eingehende Verbindung
                result = listener.accept() => {
                    match result {
                        Ok((stream, peer_addr)) => {
                            // Client-Limit pruefen
                            let verbunden = self.state.registry.anzahl() as u32;
                            if verbunden >= self.state.config.max_clients {
                                tracing::warn!(
                                    peer = %peer_addr,
                                    max = self.state.config.max_clients,
                                    "Server voll – Verbindung abgelehnt"
                                );
                                // Abweisung in eigenem Task, der Accept-Loop
                                // wartet nie auf einen abgelehnten Client
                                tokio::spawn(voll_abweisen(stream));
                                continue;
                            }

                            tracing::debug!(peer = %peer_addr, "Verbindung akzeptiert");

                            let verbindung = ClientConnection::neu(
                                Arc::clone(&self.state),
                                peer_addr,
                            );
                            let shutdown_rx_clone = shutdown_rx.clone();

                            tokio::spawn(async move {
                                verbindung.verarbeiten(stream, shutdown_rx_clone).await;
                            });
                        }
                        Err(e) => {
                            tracing::error!(fehler = %e, "TCP-Accept-Fehler");
                            tokio::time::sleep(std::time::Duration::from_millis(10)).await;
                        }
                    }
                }

                // Shutdown-Signal
                Ok(()) = shutdown_rx.changed() => {
                    if *shutdown_rx.borrow() {
                        tracing::info!("Relay-Server: Shutdown-Signal empfangen");
                        break;
                    }
                }
            }
        }

        tracing::info!("TCP Relay-Server gestoppt");
        Ok(())
    }

    /// Gibt die Bind-Adresse zurueck
    pub fn bind_addr(&self) -> SocketAddr {
        self.bind_addr
    }
}

/// Weist einen Client bei vollem Server ab
///
/// Sendet einen advisory `ServerFull`-Frame und schliesst danach die
/// Verbindung. Der Client bekommt damit einen Grund statt eines stummen
/// Verbindungsabbruchs.
async fn voll_abweisen(stream: TcpStream) {
    let mut framed = Framed::new(stream, FrameCodec::new());
    let ablehnung = RelayMessage::error(
        0,
        ErrorCode::ServerFull,
        SignalingError::ServerVoll.to_string(),
    );
    if let Err(e) = framed.send(ablehnung).await {
        tracing::debug!(fehler = %e, "ServerFull-Abweisung nicht zustellbar");
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
