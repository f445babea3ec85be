//! Verhandlungs-Signale (Offer/Answer/Candidate)
//!
//! Getaggte Union statt eines dynamischen `{to, type, ...rest}`-Objekts:
//! welches Feld zu welcher Signalart gehoert ist damit zur Compilezeit
//! eindeutig. Die Inhalte (SDP, ICE-Kandidat) bleiben fuer den Relay
//! opak und werden nie interpretiert.

use serde::{Deserialize, Serialize};

/// Ein einzelnes WebRTC-Verhandlungs-Signal
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SignalPayload {
    /// Session-Beschreibung des Initiators
    Offer { sdp: String },
    /// Session-Beschreibung der Gegenseite
    Answer { sdp: String },
    /// Einzelner ICE-Kandidat
    Candidate { candidate: String },
}

impl SignalPayload {
    /// Gibt den Signalart-Namen fuer Logging zurueck
    pub fn art(&self) -> &'static str {
        match self {
            Self::Offer { .. } => "offer",
            Self::Answer { .. } => "answer",
            Self::Candidate { .. } => "candidate",
        }
    }
}
