//! Client-Connection – Verwaltet eine einzelne TCP-Verbindung
//!
//! Jede TCP-Verbindung bekommt eine `ClientConnection` in einem eigenen
//! tokio-Task. Beim Start registriert sie sich in der Registry (dort
//! entsteht die ConnectionId) und liest danach in einer Schleife:
//! eingehende Frames, ausgehende Broadcasts und den Keepalive-Timer.
//!
//! Pro Verbindung arbeitet genau ein Task sequenziell – damit sind
//! Raum-Mutationen einer Verbindung und Signale desselben Paars
//! automatisch geordnet.
//!
//! ## Keepalive
//! - Server sendet alle `keepalive_sek` einen Ping
//! - Client muss innerhalb von `verbindungs_timeout_sek` irgendetwas senden
//! - Bei Timeout wird die Verbindung getrennt

use futures_util::{SinkExt, StreamExt};
use funkraum_protocol::{
    message::{ErrorCode, RelayMessage},
    wire::FrameCodec,
};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::net::TcpStream;
use tokio_util::codec::Framed;

use crate::dispatcher::{ConnectionContext, MessageDispatcher};
use crate::server_state::RelayState;

/// Verarbeitet eine einzelne TCP-Verbindung
///
/// Liest Frames via `FrameCodec`, dispatcht an `MessageDispatcher` und
/// sendet Antworten zurueck. Laeuft in einem eigenen tokio-Task.
pub struct ClientConnection {
    state: Arc<RelayState>,
    peer_addr: SocketAddr,
}

impl ClientConnection {
    /// Erstellt eine neue ClientConnection
    pub fn neu(state: Arc<RelayState>, peer_addr: SocketAddr) -> Self {
        Self { state, peer_addr }
    }

    /// Startet die Verbindungs-Verarbeitungsschleife
    ///
    /// Laeuft bis die Verbindung getrennt wird oder ein Shutdown-Signal
    /// eingeht. Das Cleanup am Ende ist identisch zu einem expliziten
    /// Leave – ein Transport-Disconnect ist ein authoritativer Austritt.
    pub async fn verarbeiten(
        self,
        stream: TcpStream,
        mut shutdown_rx: tokio::sync::watch::Receiver<bool>,
    ) {
        let peer_addr = self.peer_addr;
        let keepalive_intervall = Duration::from_secs(self.state.config.keepalive_sek);
        let timeout_dauer = Duration::from_secs(self.state.config.verbindungs_timeout_sek);

        tracing::info!(peer = %peer_addr, "Neue Verbindung");

        let mut framed = Framed::new(stream, FrameCodec::new());

        // Registrierung vergibt die ConnectionId und liefert die
        // Send-Queue, aus der dieser Task Richtung Client schreibt
        let (connection_id, mut sende_rx) = self.state.registry.registrieren();
        let ctx = ConnectionContext {
            peer_addr,
            connection_id,
        };
        let dispatcher = MessageDispatcher::neu(Arc::clone(&self.state));

        let mut letzter_empfang = Instant::now();
        let mut naechster_ping = Instant::now() + keepalive_intervall;
        let mut ping_request_id: u32 = 0;

        loop {
            let jetzt = Instant::now();

            if jetzt.duration_since(letzter_empfang) > timeout_dauer {
                tracing::warn!(peer = %peer_addr, connection_id = %connection_id, "Verbindungs-Timeout");
                break;
            }

            let ping_verzoegerung = if jetzt < naechster_ping {
                naechster_ping.duration_since(jetzt)
            } else {
                Duration::from_millis(1)
            };

            tokio::select! {
                // Eingehende Nachricht vom Client
                frame = framed.next() => {
                    match frame {
                        Some(Ok(nachricht)) => {
                            letzter_empfang = Instant::now();
                            tracing::trace!(
                                peer = %peer_addr,
                                request_id = nachricht.request_id,
                                "Nachricht empfangen"
                            );

                            if let Some(antwort) = dispatcher.dispatch(nachricht, &ctx) {
                                if let Err(e) = framed.send(antwort).await {
                                    tracing::warn!(peer = %peer_addr, fehler = %e, "Senden fehlgeschlagen");
                                    break;
                                }
                            }
                        }
                        Some(Err(e)) => {
                            tracing::warn!(peer = %peer_addr, fehler = %e, "Frame-Lesefehler");
                            break;
                        }
                        None => {
                            tracing::info!(peer = %peer_addr, "Verbindung vom Client getrennt");
                            break;
                        }
                    }
                }

                // Ausgehende Nachricht (Broadcast oder zugestelltes Signal)
                Some(ausgehend) = sende_rx.recv() => {
                    if let Err(e) = framed.send(ausgehend).await {
                        tracing::warn!(peer = %peer_addr, fehler = %e, "Broadcast-Senden fehlgeschlagen");
                        break;
                    }
                }

                // Keepalive-Ping
                _ = tokio::time::sleep(ping_verzoegerung) => {
                    if jetzt >= naechster_ping {
                        ping_request_id = ping_request_id.wrapping_add(1);
                        let ts = std::time::SystemTime::now()
                            .duration_since(std::time::UNIX_EPOCH)
                            .unwrap_or_default()
                            .as_millis() as u64;
                        let ping = RelayMessage::ping(ping_request_id, ts);

                        if let Err(e) = framed.send(ping).await {
                            tracing::warn!(peer = %peer_addr, fehler = %e, "Ping-Senden fehlgeschlagen");
                            break;
                        }
                        naechster_ping = Instant::now() + keepalive_intervall;
                    }
                }

                // Shutdown-Signal
                Ok(()) = shutdown_rx.changed() => {
                    if *shutdown_rx.borrow() {
                        tracing::info!(peer = %peer_addr, "Shutdown-Signal – Verbindung wird getrennt");
                        let abschied = RelayMessage::error(
                            0,
                            ErrorCode::InternalError,
                            "Server wird heruntergefahren",
                        );
                        let _ = framed.send(abschied).await;
                        break;
                    }
                }
            }
        }

        // Cleanup beim Verbindungsende: impliziter Raum-Austritt plus
        // Registry-Entfernung, idempotent gegen doppelte Aufrufe
        dispatcher.client_cleanup(&connection_id);

        tracing::info!(peer = %peer_addr, connection_id = %connection_id, "Verbindungs-Task beendet");
    }
}
