//! Durchgereichte Konfigurationstypen
//!
//! ICE-Server werden von der ausgelagerten Infrastruktur-Schicht
//! bereitgestellt und unveraendert an die Peer-Verhandlung durchgereicht.
//! Funkraum prueft nur die Anwesenheit der Felder, nie deren Semantik.

use serde::{Deserialize, Serialize};

/// Ein STUN- oder TURN-Server fuer die ICE-Verhandlung
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IceServer {
    /// Server-URLs (z.B. "stun:stun.example.org:3478")
    pub urls: Vec<String>,
    /// Benutzername (nur TURN)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    /// Zugangsdaten (nur TURN)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub credential: Option<String>,
}

impl IceServer {
    /// Erstellt einen STUN-Eintrag ohne Zugangsdaten
    pub fn stun(url: impl Into<String>) -> Self {
        Self {
            urls: vec![url.into()],
            username: None,
            credential: None,
        }
    }
}
