//! Fehlertypen fuer die Peer-Verhandlung

use thiserror::Error;

/// Fehlertyp fuer Peer-Verbindungen
#[derive(Debug, Error)]
pub enum PeerError {
    /// Signal passt nicht zum aktuellen Zustand (z.B. Answer ohne
    /// ausstehendes Offer). Wird an der Event-Grenze verworfen und
    /// geloggt, nie weitergeworfen.
    #[error("Zustandskonflikt: {0}")]
    ZustandsKonflikt(String),

    /// Die Plattform-Session hat einen Fehler gemeldet
    #[error("Session-Fehler: {0}")]
    Session(String),

    /// Operation auf einer bereits geschlossenen Peer-Verbindung
    #[error("Peer-Verbindung geschlossen")]
    Geschlossen,
}

impl PeerError {
    /// Erstellt einen Zustandskonflikt
    pub fn konflikt(msg: impl Into<String>) -> Self {
        Self::ZustandsKonflikt(msg.into())
    }
}

/// Result-Typ fuer die Peer-Verhandlung
pub type PeerResult<T> = Result<T, PeerError>;
