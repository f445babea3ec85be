//! funkraum-peer – Clientseitige Peer-Verbindungs-Zustandsmaschine
//!
//! Haelt pro Raum-Teilnehmer eine Verhandlungs-Zustandsmaschine und
//! uebersetzt Presence- und Relay-Ereignisse in Offer/Answer/Candidate-
//! Ablaeufe. Die konkrete WebRTC-Implementierung haengt ueber die
//! Traits in [`session`] an der Plattform.

pub mod error;
pub mod manager;
pub mod peer;
pub mod session;
pub mod state;

// Bequeme Re-Exporte
pub use error::{PeerError, PeerResult};
pub use manager::{PeerEvent, PeerManager};
pub use peer::PeerVerbindung;
pub use session::{NegotiationSession, SessionFactory, SignalAusgang};
pub use state::PeerZustand;
