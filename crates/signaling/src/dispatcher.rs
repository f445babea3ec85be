//! Message-Dispatcher – Routet RelayMessages an die richtigen Dienste
//!
//! Der Dispatcher empfaengt RelayMessages von einer ClientConnection,
//! fuehrt die Operation auf Presence bzw. Relay aus und gibt die Antwort
//! zurueck (falls eine gesendet werden soll).
//!
//! Der Verbindungszustand lebt in einem expliziten `ConnectionContext`
//! statt in Closure-Captures – Lebenszyklus und Cleanup sind dadurch
//! testbar und an genau einer Stelle sichtbar.
//!
//! Kein einzelner fehlerhafter Request fuehrt zum Verbindungsabbruch:
//! gutartige Fehler werden absorbiert und geloggt, unerwartete Payloads
//! mit einer Error-Antwort quittiert.

use std::net::SocketAddr;
use std::sync::Arc;

use funkraum_core::types::ConnectionId;
use funkraum_protocol::message::{ErrorCode, RelayMessage, RelayPayload};

use crate::server_state::RelayState;

/// Kontext einer einzelnen Verbindung
pub struct ConnectionContext {
    /// Peer-Adresse fuer Logging
    pub peer_addr: SocketAddr,
    /// Von der Registry vergebene ConnectionId
    pub connection_id: ConnectionId,
}

/// Zentraler Message-Dispatcher
pub struct MessageDispatcher {
    state: Arc<RelayState>,
}

impl MessageDispatcher {
    /// Erstellt einen neuen Dispatcher
    pub fn neu(state: Arc<RelayState>) -> Self {
        Self { state }
    }

    /// Verarbeitet eine eingehende RelayMessage und gibt die Antwort zurueck
    ///
    /// Gibt `None` zurueck wenn keine Antwort gesendet werden soll
    /// (Broadcasts laufen separat ueber die Send-Queues der Empfaenger).
    pub fn dispatch(&self, message: RelayMessage, ctx: &ConnectionContext) -> Option<RelayMessage> {
        let request_id = message.request_id;

        match message.payload {
            // -------------------------------------------------------------------
            // Raum-Lebenszyklus
            // -------------------------------------------------------------------
            RelayPayload::JoinRoom(req) => {
                match self
                    .state
                    .presence
                    .beitreten(ctx.connection_id, req.room_id, req.user_token)
                {
                    Ok(antwort) => Some(RelayMessage::new(
                        request_id,
                        RelayPayload::Created(antwort),
                    )),
                    Err(e) if e.ist_gutartig() => {
                        tracing::debug!(peer = %ctx.peer_addr, fehler = %e, "Beitritt verworfen");
                        None
                    }
                    Err(e) => {
                        tracing::warn!(peer = %ctx.peer_addr, fehler = %e, "Beitritt fehlgeschlagen");
                        Some(RelayMessage::error(
                            request_id,
                            ErrorCode::InternalError,
                            e.to_string(),
                        ))
                    }
                }
            }

            RelayPayload::LeaveRoom => {
                self.state.presence.verlassen(&ctx.connection_id);
                None
            }

            RelayPayload::ToggleMic { mic_enabled } => {
                self.state.presence.mic_setzen(&ctx.connection_id, mic_enabled);
                None
            }

            // -------------------------------------------------------------------
            // Signal-Weiterleitung
            // -------------------------------------------------------------------
            RelayPayload::Signal(req) => {
                if let Err(e) = self.state.relay.weiterleiten(ctx.connection_id, req) {
                    // Selbst-Signal und totes Ziel sind gutartig; alles
                    // andere waere ein Programmierfehler im Relay selbst
                    if e.ist_gutartig() {
                        tracing::debug!(peer = %ctx.peer_addr, fehler = %e, "Signal verworfen");
                    } else {
                        tracing::warn!(peer = %ctx.peer_addr, fehler = %e, "Signal-Weiterleitung fehlgeschlagen");
                    }
                }
                None
            }

            // -------------------------------------------------------------------
            // Keepalive
            // -------------------------------------------------------------------
            RelayPayload::Ping(ping) => {
                let server_ts = std::time::SystemTime::now()
                    .duration_since(std::time::UNIX_EPOCH)
                    .unwrap_or_default()
                    .as_millis() as u64;
                Some(RelayMessage::pong(request_id, ping.timestamp_ms, server_ts))
            }

            RelayPayload::Pong(_) => {
                // Pong-Antworten vom Client werden nur geloggt (RTT-Messung)
                tracing::trace!(peer = %ctx.peer_addr, "Pong empfangen");
                None
            }

            // -------------------------------------------------------------------
            // Server->Client-Payloads vom Client: nie gueltig
            // -------------------------------------------------------------------
            RelayPayload::Created(_)
            | RelayPayload::UserConnected { .. }
            | RelayPayload::UserDisconnected { .. }
            | RelayPayload::IncomingSignal(_)
            | RelayPayload::MicToggled { .. }
            | RelayPayload::SpeakingChanged { .. }
            | RelayPayload::Error(_) => {
                tracing::warn!(
                    peer = %ctx.peer_addr,
                    "Client hat Server-Payload gesendet"
                );
                Some(RelayMessage::error(
                    request_id,
                    ErrorCode::InvalidRequest,
                    "Nachrichtentyp nur in Richtung Server -> Client gueltig",
                ))
            }
        }
    }

    /// Raeumt eine Verbindung beim Verbindungsende auf
    ///
    /// Authoritativ und idempotent: impliziter Raum-Austritt plus
    /// Registry-Entfernung, identisch zu einem expliziten Leave.
    pub fn client_cleanup(&self, connection_id: &ConnectionId) {
        self.state.presence.verbindung_getrennt(connection_id);
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
