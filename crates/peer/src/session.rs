//! Abstraktion ueber die Plattform-Session (RTCPeerConnection o.ae.)
//!
//! Die Zustandsmaschine kennt die konkrete WebRTC-Implementierung nicht.
//! Sie spricht ausschliesslich ueber diese Traits mit der Plattform und
//! dem Signal-Ausgang – Tests haengen Mocks an denselben Naehten ein.

use funkraum_core::config::IceServer;
use funkraum_core::types::ConnectionId;
use funkraum_protocol::SignalPayload;

use crate::error::PeerResult;

/// Eine laufende Verhandlungs-Session mit der Plattform
///
/// Kandidaten werden als opake Strings durchgereicht, genau wie sie
/// ueber das Relay transportiert werden.
pub trait NegotiationSession: Send {
    /// Erstellt ein lokales Offer (SDP)
    fn offer_erstellen(&mut self) -> PeerResult<String>;

    /// Erstellt ein lokales Answer (SDP), setzt ein Remote-Offer voraus
    fn answer_erstellen(&mut self) -> PeerResult<String>;

    /// Setzt die Remote-Beschreibung (Offer oder Answer)
    fn remote_beschreibung_setzen(&mut self, sdp: &str) -> PeerResult<()>;

    /// Fuegt einen Remote-ICE-Kandidaten hinzu
    fn kandidat_hinzufuegen(&mut self, kandidat: &str) -> PeerResult<()>;

    /// Ob eine Remote-Beschreibung gesetzt wurde
    fn hat_remote_beschreibung(&self) -> bool;

    /// Baut die Session ab, idempotent
    fn schliessen(&mut self);
}

/// Erzeugt neue Sessions, eine pro Peer-Verbindung
pub trait SessionFactory: Send + Sync {
    fn neue_session(&self, ice_server: &[IceServer]) -> Box<dyn NegotiationSession>;
}

/// Ausgang fuer Signale Richtung Relay
///
/// Fire-and-forget: die Zustellung haengt an der Relay-Verbindung,
/// nicht am Aufrufer.
pub trait SignalAusgang: Send + Sync {
    fn senden(&self, to: ConnectionId, signal: SignalPayload);
}

// ---------------------------------------------------------------------------
// Testhilfen
// ---------------------------------------------------------------------------

#[cfg(test)]
pub(crate) mod testhilfe {
    use super::*;
    use parking_lot::Mutex;
    use std::sync::Arc;

    /// Protokoll einer Mock-Session, von Tests inspizierbar
    #[derive(Default)]
    pub struct SessionProtokoll {
        pub offers_erstellt: usize,
        pub answers_erstellt: usize,
        pub remote_beschreibungen: Vec<String>,
        pub kandidaten: Vec<String>,
        pub geschlossen: bool,
    }

    /// Mock-Session, zeichnet alle Aufrufe auf
    pub struct MockSession {
        pub protokoll: Arc<Mutex<SessionProtokoll>>,
        hat_remote: bool,
    }

    impl MockSession {
        pub fn neu() -> (Self, Arc<Mutex<SessionProtokoll>>) {
            let protokoll = Arc::new(Mutex::new(SessionProtokoll::default()));
            (
                Self {
                    protokoll: Arc::clone(&protokoll),
                    hat_remote: false,
                },
                protokoll,
            )
        }
    }

    impl NegotiationSession for MockSession {
        fn offer_erstellen(&mut self) -> PeerResult<String> {
            let mut p = self.protokoll.lock();
            p.offers_erstellt += 1;
            Ok(format!("mock-offer-{}", p.offers_erstellt))
        }

        fn answer_erstellen(&mut self) -> PeerResult<String> {
            let mut p = self.protokoll.lock();
            p.answers_erstellt += 1;
            Ok(format!("mock-answer-{}", p.answers_erstellt))
        }

        fn remote_beschreibung_setzen(&mut self, sdp: &str) -> PeerResult<()> {
            self.hat_remote = true;
            self.protokoll.lock().remote_beschreibungen.push(sdp.to_string());
            Ok(())
        }

        fn kandidat_hinzufuegen(&mut self, kandidat: &str) -> PeerResult<()> {
            self.protokoll.lock().kandidaten.push(kandidat.to_string());
            Ok(())
        }

        fn hat_remote_beschreibung(&self) -> bool {
            self.hat_remote
        }

        fn schliessen(&mut self) {
            self.protokoll.lock().geschlossen = true;
        }
    }

    /// Mock-Factory, sammelt die Protokolle aller erzeugten Sessions
    #[derive(Default)]
    pub struct MockFactory {
        pub protokolle: Mutex<Vec<Arc<Mutex<SessionProtokoll>>>>,
    }

    impl SessionFactory for MockFactory {
        fn neue_session(&self, _ice_server: &[IceServer]) -> Box<dyn NegotiationSession> {
            let (session, protokoll) = MockSession::neu();
            self.protokolle.lock().push(protokoll);
            Box::new(session)
        }
    }

    /// Mock-Ausgang, sammelt gesendete Signale
    #[derive(Default)]
    pub struct MockAusgang {
        pub gesendet: Mutex<Vec<(ConnectionId, SignalPayload)>>,
    }

    impl SignalAusgang for MockAusgang {
        fn senden(&self, to: ConnectionId, signal: SignalPayload) {
            self.gesendet.lock().push((to, signal));
        }
    }
}
