//! Zustaende einer Peer-Verbindung
//!
//! Zwei symmetrische Pfade durch die Verhandlung:
//!
//! ```text
//! ausgehend: Idle -> Offering -> AnswerPending -> Connected -> Closed
//! eingehend: Idle -> OfferReceived -> Answering -> Connected -> Closed
//! ```
//!
//! `Connected` wird optimistisch erreicht sobald die Beschreibungen
//! ausgetauscht sind – ICE verhandelt danach ggf. noch weiter, aber aus
//! Sicht der Zustandsmaschine ist die Verhandlung abgeschlossen.

/// Zustand einer Peer-Verbindung
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PeerZustand {
    /// Frisch angelegt, noch keine Verhandlung
    Idle,
    /// Lokales Offer wird erstellt
    Offering,
    /// Offer gesendet, Answer steht aus
    AnswerPending,
    /// Remote-Offer empfangen
    OfferReceived,
    /// Lokales Answer wird erstellt
    Answering,
    /// Verhandlung abgeschlossen
    Connected,
    /// Abgebaut – terminal
    Closed,
}

impl PeerZustand {
    /// Terminal: keine weiteren Uebergaenge moeglich
    pub fn ist_terminal(&self) -> bool {
        matches!(self, Self::Closed)
    }

    /// Verhandlung abgeschlossen
    pub fn ist_verbunden(&self) -> bool {
        matches!(self, Self::Connected)
    }
}

impl std::fmt::Display for PeerZustand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Idle => "idle",
            Self::Offering => "offering",
            Self::AnswerPending => "answer_pending",
            Self::OfferReceived => "offer_received",
            Self::Answering => "answering",
            Self::Connected => "connected",
            Self::Closed => "closed",
        };
        write!(f, "{name}")
    }
}
