//! funkraum-core – Gemeinsame Typen und Konfiguration
//!
//! Dieses Crate stellt die fundamentalen Bausteine bereit, die von allen
//! anderen Funkraum-Crates gemeinsam genutzt werden.

pub mod config;
pub mod types;

// Re-Exporte fuer bequemen Zugriff
pub use config::IceServer;
pub use types::{ConnectionId, RoomId, UserToken};
