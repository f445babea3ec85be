//! Relay-Protokoll (TCP)
//!
//! Definiert alle Nachrichten die ueber die persistente TCP-Verbindung
//! zwischen Client und Relay ausgetauscht werden.
//!
//! ## Design
//! - Request/Response Pattern: jede Nachricht hat eine `request_id: u32`
//! - JSON-Serialisierung via serde (TCP, nicht zeitkritisch)
//! - Tagged Enums fuer typsichere Nachrichtentypen
//! - `from` in zugestellten Signalen wird immer vom Relay gestempelt,
//!   nie vom Client uebernommen

use serde::{Deserialize, Serialize};

use funkraum_core::types::{ConnectionId, RoomId, UserToken};

use crate::signal::SignalPayload;

// ---------------------------------------------------------------------------
// Fehler-Codes
// ---------------------------------------------------------------------------

/// Standardisierte Fehler-Codes fuer Error-Responses
///
/// Fehler sind rein informativ: der Relay trennt niemals eine Verbindung
/// wegen einer einzelnen fehlerhaften Nachricht.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    InternalError,
    InvalidRequest,
    ServerFull,
}

// ---------------------------------------------------------------------------
// Raum-Nachrichten
// ---------------------------------------------------------------------------

/// Raum beitreten (erstellt den Raum falls noch nicht vorhanden)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JoinRoomRequest {
    pub room_id: RoomId,
    /// Opaker Identitaets-Token aus der ausgelagerten Auth-Schicht
    pub user_token: UserToken,
}

/// Teilnehmer-Informationen innerhalb eines Raums
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParticipantInfo {
    pub connection_id: ConnectionId,
    pub user_token: UserToken,
    pub mic_enabled: bool,
    pub is_speaking: bool,
}

/// Beitritts-Snapshot – geht ausschliesslich an den Beitretenden
///
/// Die Teilnehmerliste ist der Stand zum Einfuegezeitpunkt und enthaelt
/// den Beitretenden selbst. Bestehende Raummitglieder bekommen stattdessen
/// ein `UserConnected`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreatedResponse {
    pub room_id: RoomId,
    pub participants: Vec<ParticipantInfo>,
}

// ---------------------------------------------------------------------------
// Signal-Nachrichten
// ---------------------------------------------------------------------------

/// Signal-Weiterleitung anfordern (Client -> Relay)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SignalRequest {
    /// Ziel-Verbindung
    pub to: ConnectionId,
    pub signal: SignalPayload,
}

/// Zugestelltes Signal (Relay -> Client)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IncomingSignal {
    /// Absender – vom Relay gestempelt
    pub from: ConnectionId,
    pub signal: SignalPayload,
}

// ---------------------------------------------------------------------------
// Keepalive
// ---------------------------------------------------------------------------

/// Ping (Client -> Relay oder Relay -> Client)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PingMessage {
    /// Unix-Timestamp in Millisekunden fuer RTT-Messung
    pub timestamp_ms: u64,
}

/// Pong-Antwort (spiegelt Timestamp zurueck)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PongMessage {
    /// Originaler Timestamp aus dem Ping
    pub echo_timestamp_ms: u64,
    /// Timestamp der antwortenden Seite
    pub server_timestamp_ms: u64,
}

// ---------------------------------------------------------------------------
// Haupt-Enum: RelayPayload
// ---------------------------------------------------------------------------

/// Alle moeglichen Relay-Nachrichten (typsicher via Tagged Enum)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RelayPayload {
    // Client -> Relay
    JoinRoom(JoinRoomRequest),
    LeaveRoom,
    Signal(SignalRequest),
    ToggleMic { mic_enabled: bool },

    // Relay -> Client
    Created(CreatedResponse),
    UserConnected {
        connection_id: ConnectionId,
        user_token: UserToken,
    },
    UserDisconnected {
        connection_id: ConnectionId,
    },
    IncomingSignal(IncomingSignal),
    MicToggled {
        connection_id: ConnectionId,
        mic_enabled: bool,
    },
    SpeakingChanged {
        connection_id: ConnectionId,
        is_speaking: bool,
    },

    // Keepalive
    Ping(PingMessage),
    Pong(PongMessage),

    // Error
    Error(ErrorResponse),
}

/// Standardisierte Fehler-Antwort
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub code: ErrorCode,
    pub message: String,
}

// ---------------------------------------------------------------------------
// Relay-Frame (Umschlag fuer alle Nachrichten)
// ---------------------------------------------------------------------------

/// Relay-Protokoll-Nachricht mit Request/Response-Zuordnung
///
/// Jede Nachricht traegt eine `request_id` die der Client vergibt.
/// Der Relay kopiert die ID in die Antwort; asynchrone Broadcasts
/// (UserConnected, IncomingSignal, ...) tragen `request_id = 0`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RelayMessage {
    /// Nachrichten-ID fuer Request/Response-Zuordnung
    pub request_id: u32,
    /// Inhalt der Nachricht
    pub payload: RelayPayload,
}

impl RelayMessage {
    /// Erstellt eine neue Relay-Nachricht
    pub fn new(request_id: u32, payload: RelayPayload) -> Self {
        Self {
            request_id,
            payload,
        }
    }

    /// Erstellt einen asynchronen Broadcast (request_id = 0)
    pub fn broadcast(payload: RelayPayload) -> Self {
        Self::new(0, payload)
    }

    /// Erstellt eine Ping-Nachricht
    pub fn ping(request_id: u32, timestamp_ms: u64) -> Self {
        Self::new(request_id, RelayPayload::Ping(PingMessage { timestamp_ms }))
    }

    /// Erstellt eine Pong-Antwort
    pub fn pong(request_id: u32, echo_timestamp_ms: u64, server_timestamp_ms: u64) -> Self {
        Self::new(
            request_id,
            RelayPayload::Pong(PongMessage {
                echo_timestamp_ms,
                server_timestamp_ms,
            }),
        )
    }

    /// Erstellt eine Fehler-Antwort
    pub fn error(request_id: u32, code: ErrorCode, message: impl Into<String>) -> Self {
        Self::new(
            request_id,
            RelayPayload::Error(ErrorResponse {
                code,
                message: message.into(),
            }),
        )
    }

    /// Serialisiert die Nachricht als JSON
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }

    /// Deserialisiert eine Nachricht aus JSON
    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
