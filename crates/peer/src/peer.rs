//! Einzelne Peer-Verbindung mit Verhandlungs-Zustandsmaschine
//!
//! Eine `PeerVerbindung` kapselt die Session zu genau einem Remote-Peer.
//! Kandidaten, die vor der Remote-Beschreibung eintreffen, werden
//! gepuffert und nach dem Setzen der Beschreibung in Empfangsreihenfolge
//! nachgezogen.

use funkraum_core::types::ConnectionId;
use funkraum_protocol::SignalPayload;

use crate::error::{PeerError, PeerResult};
use crate::session::{NegotiationSession, SignalAusgang};
use crate::state::PeerZustand;

/// Peer-Verbindung zu einem Remote-Teilnehmer
pub struct PeerVerbindung {
    remote: ConnectionId,
    zustand: PeerZustand,
    session: Box<dyn NegotiationSession>,
    // Kandidaten, die vor der Remote-Beschreibung ankamen
    wartende_kandidaten: Vec<String>,
}

impl PeerVerbindung {
    /// Erstellt eine neue Peer-Verbindung im Zustand `Idle`
    pub fn neu(remote: ConnectionId, session: Box<dyn NegotiationSession>) -> Self {
        Self {
            remote,
            zustand: PeerZustand::Idle,
            session,
            wartende_kandidaten: Vec::new(),
        }
    }

    /// ConnectionId des Remote-Peers
    pub fn remote(&self) -> &ConnectionId {
        &self.remote
    }

    /// Aktueller Verhandlungszustand
    pub fn zustand(&self) -> PeerZustand {
        self.zustand
    }

    /// Startet die ausgehende Verhandlung: Offer erstellen und senden
    ///
    /// Idempotent – ist die Verhandlung bereits angelaufen oder
    /// abgeschlossen, passiert nichts.
    pub fn verhandlung_starten(&mut self, ausgang: &dyn SignalAusgang) -> PeerResult<()> {
        if self.zustand != PeerZustand::Idle {
            tracing::debug!(
                remote = %self.remote,
                zustand = %self.zustand,
                "Verhandlung laeuft bereits, Start ignoriert"
            );
            return Ok(());
        }

        self.zustand = PeerZustand::Offering;
        let sdp = match self.session.offer_erstellen() {
            Ok(sdp) => sdp,
            Err(e) => {
                self.zustand = PeerZustand::Idle;
                return Err(e);
            }
        };

        ausgang.senden(self.remote.clone(), SignalPayload::Offer { sdp });
        self.zustand = PeerZustand::AnswerPending;

        tracing::debug!(remote = %self.remote, "Offer gesendet, warte auf Answer");
        Ok(())
    }

    /// Verarbeitet ein eingehendes Offer: Answer erstellen und senden
    pub fn offer_empfangen(&mut self, sdp: &str, ausgang: &dyn SignalAusgang) -> PeerResult<()> {
        if self.zustand.ist_terminal() {
            return Err(PeerError::Geschlossen);
        }
        if self.zustand != PeerZustand::Idle {
            return Err(PeerError::konflikt(format!(
                "Offer im Zustand {} empfangen",
                self.zustand
            )));
        }

        self.zustand = PeerZustand::OfferReceived;
        self.session.remote_beschreibung_setzen(sdp)?;
        self.wartende_kandidaten_nachziehen();

        self.zustand = PeerZustand::Answering;
        let answer = self.session.answer_erstellen()?;
        ausgang.senden(self.remote.clone(), SignalPayload::Answer { sdp: answer });

        self.zustand = PeerZustand::Connected;
        tracing::debug!(remote = %self.remote, "Answer gesendet, Verhandlung abgeschlossen");
        Ok(())
    }

    /// Verarbeitet ein eingehendes Answer auf unser Offer
    pub fn answer_empfangen(&mut self, sdp: &str) -> PeerResult<()> {
        if self.zustand.ist_terminal() {
            return Err(PeerError::Geschlossen);
        }
        if self.zustand != PeerZustand::AnswerPending {
            return Err(PeerError::konflikt(format!(
                "Answer im Zustand {} empfangen",
                self.zustand
            )));
        }

        self.session.remote_beschreibung_setzen(sdp)?;
        self.wartende_kandidaten_nachziehen();

        self.zustand = PeerZustand::Connected;
        tracing::debug!(remote = %self.remote, "Answer angewendet, Verhandlung abgeschlossen");
        Ok(())
    }

    /// Verarbeitet einen eingehenden ICE-Kandidaten
    ///
    /// Vor der Remote-Beschreibung wird gepuffert statt angewendet.
    pub fn kandidat_empfangen(&mut self, kandidat: &str) -> PeerResult<()> {
        if self.zustand.ist_terminal() {
            return Err(PeerError::Geschlossen);
        }

        if self.session.hat_remote_beschreibung() {
            self.session.kandidat_hinzufuegen(kandidat)?;
        } else {
            tracing::trace!(remote = %self.remote, "Kandidat gepuffert");
            self.wartende_kandidaten.push(kandidat.to_string());
        }
        Ok(())
    }

    /// Baut die Verbindung ab, idempotent
    pub fn schliessen(&mut self) {
        if self.zustand.ist_terminal() {
            return;
        }
        self.session.schliessen();
        self.wartende_kandidaten.clear();
        self.zustand = PeerZustand::Closed;
        tracing::debug!(remote = %self.remote, "Peer-Verbindung geschlossen");
    }

    // Wendet gepufferte Kandidaten in Empfangsreihenfolge an. Einzelne
    // Fehler werden geloggt, die uebrigen Kandidaten trotzdem angewendet.
    fn wartende_kandidaten_nachziehen(&mut self) {
        for kandidat in self.wartende_kandidaten.drain(..) {
            if let Err(e) = self.session.kandidat_hinzufuegen(&kandidat) {
                tracing::warn!(remote = %self.remote, fehler = %e, "Gepufferter Kandidat verworfen");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::testhilfe::{MockAusgang, MockSession};

    fn neue_verbindung() -> (
        PeerVerbindung,
        std::sync::Arc<parking_lot::Mutex<crate::session::testhilfe::SessionProtokoll>>,
    ) {
        let (session, protokoll) = MockSession::neu();
        (
            PeerVerbindung::neu(ConnectionId::new(), Box::new(session)),
            protokoll,
        )
    }

    #[test]
    fn verhandlung_starten_sendet_offer() {
        let (mut peer, protokoll) = neue_verbindung();
        let ausgang = MockAusgang::default();

        peer.verhandlung_starten(&ausgang).unwrap();

        assert_eq!(peer.zustand(), PeerZustand::AnswerPending);
        assert_eq!(protokoll.lock().offers_erstellt, 1);
        let gesendet = ausgang.gesendet.lock();
        assert_eq!(gesendet.len(), 1);
        assert!(matches!(gesendet[0].1, SignalPayload::Offer { .. }));
    }

    #[test]
    fn verhandlung_starten_ist_idempotent() {
        let (mut peer, protokoll) = neue_verbindung();
        let ausgang = MockAusgang::default();

        peer.verhandlung_starten(&ausgang).unwrap();
        peer.verhandlung_starten(&ausgang).unwrap();
        peer.verhandlung_starten(&ausgang).unwrap();

        // Nur ein Offer, kein Neustart der Verhandlung
        assert_eq!(protokoll.lock().offers_erstellt, 1);
        assert_eq!(ausgang.gesendet.lock().len(), 1);
    }

    #[test]
    fn eingehendes_offer_erzeugt_answer() {
        let (mut peer, protokoll) = neue_verbindung();
        let ausgang = MockAusgang::default();

        peer.offer_empfangen("remote-offer", &ausgang).unwrap();

        assert_eq!(peer.zustand(), PeerZustand::Connected);
        let p = protokoll.lock();
        assert_eq!(p.remote_beschreibungen, vec!["remote-offer".to_string()]);
        assert_eq!(p.answers_erstellt, 1);
        drop(p);
        let gesendet = ausgang.gesendet.lock();
        assert!(matches!(gesendet[0].1, SignalPayload::Answer { .. }));
    }

    #[test]
    fn answer_im_falschen_zustand_ist_konflikt() {
        let (mut peer, protokoll) = neue_verbindung();

        let err = peer.answer_empfangen("unerwartet").unwrap_err();

        assert!(matches!(err, PeerError::ZustandsKonflikt(_)));
        // Beschreibung wurde nicht angewendet
        assert!(protokoll.lock().remote_beschreibungen.is_empty());
        assert_eq!(peer.zustand(), PeerZustand::Idle);
    }

    #[test]
    fn answer_schliesst_verhandlung_ab() {
        let (mut peer, _) = neue_verbindung();
        let ausgang = MockAusgang::default();

        peer.verhandlung_starten(&ausgang).unwrap();
        peer.answer_empfangen("remote-answer").unwrap();

        assert_eq!(peer.zustand(), PeerZustand::Connected);
    }

    #[test]
    fn kandidaten_vor_beschreibung_werden_gepuffert() {
        let (mut peer, protokoll) = neue_verbindung();
        let ausgang = MockAusgang::default();

        peer.verhandlung_starten(&ausgang).unwrap();
        peer.kandidat_empfangen("kandidat-1").unwrap();
        peer.kandidat_empfangen("kandidat-2").unwrap();

        // Noch nichts angewendet, Remote-Beschreibung fehlt
        assert!(protokoll.lock().kandidaten.is_empty());

        peer.answer_empfangen("remote-answer").unwrap();

        // Puffer in Empfangsreihenfolge nachgezogen
        assert_eq!(
            protokoll.lock().kandidaten,
            vec!["kandidat-1".to_string(), "kandidat-2".to_string()]
        );

        // Spaetere Kandidaten gehen direkt durch
        peer.kandidat_empfangen("kandidat-3").unwrap();
        assert_eq!(protokoll.lock().kandidaten.len(), 3);
    }

    #[test]
    fn schliessen_ist_idempotent_und_terminal() {
        let (mut peer, protokoll) = neue_verbindung();

        peer.schliessen();
        peer.schliessen();

        assert_eq!(peer.zustand(), PeerZustand::Closed);
        assert!(protokoll.lock().geschlossen);

        // Jede weitere Operation wird abgewiesen
        assert!(matches!(
            peer.kandidat_empfangen("zu-spaet"),
            Err(PeerError::Geschlossen)
        ));
        assert!(matches!(
            peer.answer_empfangen("zu-spaet"),
            Err(PeerError::Geschlossen)
        ));
    }
}
