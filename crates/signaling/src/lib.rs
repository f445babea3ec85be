//! funkraum-signaling – TCP Signaling-Relay und Raum-Presence
//!
//! Dieser Crate implementiert die Serverseite von Funkraum: er verwaltet
//! TCP-Verbindungen, Raum-Mitgliedschaft und leitet WebRTC-Verhandlungs-
//! Signale zwischen Verbindungen weiter, ohne deren Inhalt zu
//! interpretieren. Medien fliessen peer-to-peer, nie durch diesen Prozess.
//!
//! ## Architektur
//!
//! ```text
//! TCP Listener (RelayServer)
//!     |
//!     v
//! ClientConnection (pro Verbindung ein Task)
//!     |
//!     v
//! MessageDispatcher
//!     |
//!     +-- PresenceCoordinator (JoinRoom, LeaveRoom, ToggleMic, Speaking)
//!     +-- SignalRelay         (Offer, Answer, Candidate)
//!
//! ConnectionRegistry – Lebende Verbindungen + Send-Queues (ID-Autoritaet)
//! RoomDirectory      – Raumname -> Teilnehmerliste (ephemer)
//! ```

pub mod connection;
pub mod dispatcher;
pub mod error;
pub mod presence;
pub mod registry;
pub mod relay;
pub mod rooms;
pub mod server_state;
pub mod tcp;

// Bequeme Re-Exporte
pub use connection::ClientConnection;
pub use dispatcher::{ConnectionContext, MessageDispatcher};
pub use error::{SignalingError, SignalingResult};
pub use presence::PresenceCoordinator;
pub use registry::ConnectionRegistry;
pub use relay::SignalRelay;
pub use rooms::{Participant, RoomDirectory};
pub use server_state::{RelayConfig, RelayState};
pub use tcp::RelayServer;
