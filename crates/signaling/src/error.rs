//! Fehlertypen fuer den Signaling-Relay
//!
//! Die Taxonomie unterscheidet gutartige Fehlschlaege (Peer schon weg,
//! Selbst-Signal, doppelter Beitritt) von echten Fehlern. Gutartige
//! Fehler werden an der Dispatch-Grenze absorbiert und hoechstens
//! geloggt – kein einzelner fehlerhafter Request darf eine Verbindung
//! oder gar den Prozess beenden.

use thiserror::Error;

/// Fehlertyp fuer den Signaling-Relay
#[derive(Debug, Error)]
pub enum SignalingError {
    /// IO-Fehler (TCP, Socket)
    #[error("IO-Fehler: {0}")]
    Io(#[from] std::io::Error),

    /// Lookup-Fehlschlag auf ConnectionId oder RoomId
    #[error("Nicht gefunden: {0}")]
    NichtGefunden(String),

    /// Ungueltige Operation (Selbst-Signal, doppelter Beitritt)
    #[error("Ungueltige Operation: {0}")]
    UngueltigeOperation(String),

    /// Zustellung fehlgeschlagen (Queue voll oder Verbindung tot)
    #[error("Zustellung fehlgeschlagen: {0}")]
    Zustellung(String),

    /// Server ist voll
    #[error("Server ist voll")]
    ServerVoll,

    /// Interner Fehler
    #[error("Interner Fehler: {0}")]
    Intern(String),
}

impl SignalingError {
    /// Erstellt einen internen Fehler
    pub fn intern(msg: impl Into<String>) -> Self {
        Self::Intern(msg.into())
    }

    /// Gibt true zurueck wenn der Fehler still absorbiert werden darf
    ///
    /// Zustellung zaehlt dazu: ein toter Empfaenger ist aus Sicht des
    /// Senders dasselbe wie ein unbekannter.
    pub fn ist_gutartig(&self) -> bool {
        matches!(
            self,
            Self::NichtGefunden(_) | Self::UngueltigeOperation(_) | Self::Zustellung(_)
        )
    }
}

/// Result-Typ fuer den Signaling-Relay
pub type SignalingResult<T> = Result<T, SignalingError>;
