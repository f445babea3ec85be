//! funkraum-protocol – Netzwerkprotokoll-Definitionen
//!
//! Dieses Crate definiert alle Nachrichtentypen, Enums und Strukturen
//! die zwischen Client und Relay ausgetauscht werden.

pub mod message;
pub mod signal;
pub mod wire;

pub use message::{ErrorCode, ParticipantInfo, RelayMessage, RelayPayload};
pub use signal::SignalPayload;
pub use wire::FrameCodec;
