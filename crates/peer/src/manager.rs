//! Verwaltung aller Peer-Verbindungen eines Raums
//!
//! Der `PeerManager` haelt pro Remote-Teilnehmer genau eine
//! `PeerVerbindung` und uebersetzt Presence- und Signal-Ereignisse in
//! Zustandsmaschinen-Aufrufe. Fehler aus eingehenden Signalen werden
//! hier absorbiert und geloggt, nie an den Aufrufer weitergereicht –
//! ein fehlgeleitetes Signal darf den Client nicht zum Absturz bringen.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::broadcast;

use funkraum_core::config::IceServer;
use funkraum_core::types::ConnectionId;
use funkraum_protocol::SignalPayload;

use crate::error::PeerError;
use crate::peer::PeerVerbindung;
use crate::session::{SessionFactory, SignalAusgang};
use crate::state::PeerZustand;

const EVENT_KANAL_GROESSE: usize = 64;

/// Ereignis ueber den Zustand einer Peer-Verbindung
#[derive(Debug, Clone)]
pub enum PeerEvent {
    /// Der Verhandlungszustand eines Peers hat sich geaendert
    ZustandGeaendert {
        remote: ConnectionId,
        zustand: PeerZustand,
    },
    /// Die Peer-Verbindung wurde abgebaut und entfernt
    Entfernt { remote: ConnectionId },
}

struct Inner {
    peers: Mutex<HashMap<ConnectionId, PeerVerbindung>>,
    factory: Arc<dyn SessionFactory>,
    ausgang: Arc<dyn SignalAusgang>,
    ice_server: Vec<IceServer>,
    event_tx: broadcast::Sender<PeerEvent>,
}

/// Verwaltet alle Peer-Verbindungen, Clone teilt den Zustand
#[derive(Clone)]
pub struct PeerManager {
    inner: Arc<Inner>,
}

impl PeerManager {
    /// Erstellt einen neuen PeerManager
    pub fn neu(
        factory: Arc<dyn SessionFactory>,
        ausgang: Arc<dyn SignalAusgang>,
        ice_server: Vec<IceServer>,
    ) -> Self {
        let (event_tx, _) = broadcast::channel(EVENT_KANAL_GROESSE);
        Self {
            inner: Arc::new(Inner {
                peers: Mutex::new(HashMap::new()),
                factory,
                ausgang,
                ice_server,
                event_tx,
            }),
        }
    }

    /// Abonniert Peer-Ereignisse
    pub fn events_abonnieren(&self) -> broadcast::Receiver<PeerEvent> {
        self.inner.event_tx.subscribe()
    }

    /// Anzahl der verwalteten Peer-Verbindungen
    pub fn anzahl(&self) -> usize {
        self.inner.peers.lock().len()
    }

    /// Aktueller Zustand eines Peers, falls vorhanden
    pub fn zustand_von(&self, remote: &ConnectionId) -> Option<PeerZustand> {
        self.inner.peers.lock().get(remote).map(|p| p.zustand())
    }

    /// Ein neuer Teilnehmer ist dem Raum beigetreten: Verhandlung starten
    ///
    /// Existiert bereits eine Peer-Verbindung zu diesem Remote, ist der
    /// Aufruf ein No-Op – doppelte Presence-Ereignisse starten keine
    /// zweite Verhandlung.
    pub fn benutzer_verbunden(&self, remote: ConnectionId) {
        let mut peers = self.inner.peers.lock();

        let peer = peers.entry(remote.clone()).or_insert_with(|| {
            let session = self.inner.factory.neue_session(&self.inner.ice_server);
            PeerVerbindung::neu(remote.clone(), session)
        });
        let vorher = peer.zustand();

        if let Err(e) = peer.verhandlung_starten(self.inner.ausgang.as_ref()) {
            tracing::warn!(remote = %remote, fehler = %e, "Verhandlungsstart fehlgeschlagen");
            return;
        }
        let nachher = peer.zustand();
        drop(peers);

        // Flankengesteuert: ein doppeltes Presence-Ereignis ohne
        // Zustandswechsel erzeugt kein Event
        if nachher != vorher {
            self.zustand_melden(remote, nachher);
        }
    }

    /// Ein Teilnehmer hat den Raum verlassen: Verbindung abbauen
    ///
    /// Idempotent, ein unbekannter Remote ist ein No-Op.
    pub fn benutzer_getrennt(&self, remote: &ConnectionId) {
        let entfernt = {
            let mut peers = self.inner.peers.lock();
            match peers.remove(remote) {
                Some(mut peer) => {
                    peer.schliessen();
                    true
                }
                None => false,
            }
        };

        if entfernt {
            let _ = self.inner.event_tx.send(PeerEvent::Entfernt {
                remote: remote.clone(),
            });
        }
    }

    /// Verarbeitet ein vom Relay zugestelltes Signal
    ///
    /// Ein Offer von einem unbekannten Remote legt den Peer an
    /// (eingehender Pfad). Answer und Kandidaten ohne Peer werden
    /// verworfen, typischerweise Nachzuegler nach einem Abbau.
    pub fn signal_empfangen(&self, from: ConnectionId, signal: SignalPayload) {
        let mut peers = self.inner.peers.lock();
        let vorher = peers.get(&from).map(|p| p.zustand());

        let ergebnis = match &signal {
            SignalPayload::Offer { sdp } => {
                let peer = peers.entry(from.clone()).or_insert_with(|| {
                    let session = self.inner.factory.neue_session(&self.inner.ice_server);
                    PeerVerbindung::neu(from.clone(), session)
                });
                peer.offer_empfangen(sdp, self.inner.ausgang.as_ref())
            }
            SignalPayload::Answer { sdp } => match peers.get_mut(&from) {
                Some(peer) => peer.answer_empfangen(sdp),
                None => {
                    tracing::debug!(from = %from, "Answer ohne Peer-Verbindung verworfen");
                    return;
                }
            },
            SignalPayload::Candidate { candidate } => match peers.get_mut(&from) {
                Some(peer) => peer.kandidat_empfangen(candidate),
                None => {
                    tracing::debug!(from = %from, "Kandidat ohne Peer-Verbindung verworfen");
                    return;
                }
            },
        };

        match ergebnis {
            Ok(()) => {
                let nachher = peers.get(&from).map(|p| p.zustand());
                drop(peers);
                // Gepufferte Kandidaten oder angewandte Kandidaten lassen
                // den Zustand unveraendert, dann gibt es auch kein Event
                if let Some(nachher) = nachher {
                    if Some(nachher) != vorher {
                        self.zustand_melden(from, nachher);
                    }
                }
            }
            Err(PeerError::ZustandsKonflikt(grund)) => {
                tracing::warn!(from = %from, art = signal.art(), grund, "Signal verworfen");
            }
            Err(e) => {
                tracing::warn!(from = %from, art = signal.art(), fehler = %e, "Signal fehlgeschlagen");
            }
        }
    }

    /// Baut alle Peer-Verbindungen ab, z.B. beim Verlassen des Raums
    pub fn alle_schliessen(&self) {
        let entfernte: Vec<ConnectionId> = {
            let mut peers = self.inner.peers.lock();
            let ids: Vec<ConnectionId> = peers.keys().cloned().collect();
            for (_, peer) in peers.iter_mut() {
                peer.schliessen();
            }
            peers.clear();
            ids
        };

        for remote in entfernte {
            let _ = self.inner.event_tx.send(PeerEvent::Entfernt { remote });
        }
        tracing::debug!("Alle Peer-Verbindungen abgebaut");
    }

    fn zustand_melden(&self, remote: ConnectionId, zustand: PeerZustand) {
        let _ = self
            .inner
            .event_tx
            .send(PeerEvent::ZustandGeaendert { remote, zustand });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::testhilfe::{MockAusgang, MockFactory};

    fn neuer_manager() -> (PeerManager, Arc<MockFactory>, Arc<MockAusgang>) {
        let factory = Arc::new(MockFactory::default());
        let ausgang = Arc::new(MockAusgang::default());
        let manager = PeerManager::neu(
            Arc::clone(&factory) as Arc<dyn SessionFactory>,
            Arc::clone(&ausgang) as Arc<dyn SignalAusgang>,
            vec![IceServer::stun("stun:stun.l.google.com:19302")],
        );
        (manager, factory, ausgang)
    }

    #[test]
    fn benutzer_verbunden_startet_verhandlung() {
        let (manager, factory, ausgang) = neuer_manager();
        let remote = ConnectionId::new();

        manager.benutzer_verbunden(remote.clone());

        assert_eq!(manager.anzahl(), 1);
        assert_eq!(manager.zustand_von(&remote), Some(PeerZustand::AnswerPending));
        assert_eq!(factory.protokolle.lock().len(), 1);
        let gesendet = ausgang.gesendet.lock();
        assert!(matches!(gesendet[0].1, SignalPayload::Offer { .. }));
    }

    #[test]
    fn doppeltes_verbunden_startet_keine_zweite_verhandlung() {
        let (manager, factory, ausgang) = neuer_manager();
        let remote = ConnectionId::new();

        manager.benutzer_verbunden(remote.clone());
        manager.benutzer_verbunden(remote.clone());

        assert_eq!(manager.anzahl(), 1);
        assert_eq!(factory.protokolle.lock().len(), 1);
        assert_eq!(ausgang.gesendet.lock().len(), 1);
    }

    #[test]
    fn zustandsereignisse_nur_auf_flanke() {
        let (manager, _, _) = neuer_manager();
        let remote = ConnectionId::new();
        let mut events = manager.events_abonnieren();

        manager.benutzer_verbunden(remote.clone());
        // Doppelte Presence und ein Kandidat ohne Zustandswechsel
        manager.benutzer_verbunden(remote.clone());
        manager.signal_empfangen(
            remote.clone(),
            SignalPayload::Candidate {
                candidate: "gepuffert".into(),
            },
        );

        // Genau ein ZustandGeaendert (Idle -> AnswerPending), sonst nichts
        assert!(matches!(
            events.try_recv().unwrap(),
            PeerEvent::ZustandGeaendert {
                zustand: PeerZustand::AnswerPending,
                ..
            }
        ));
        assert!(events.try_recv().is_err(), "Kein Event ohne Zustandswechsel");
    }

    #[test]
    fn eingehendes_offer_legt_peer_an() {
        let (manager, _, ausgang) = neuer_manager();
        let remote = ConnectionId::new();

        manager.signal_empfangen(
            remote.clone(),
            SignalPayload::Offer {
                sdp: "remote-offer".into(),
            },
        );

        assert_eq!(manager.zustand_von(&remote), Some(PeerZustand::Connected));
        let gesendet = ausgang.gesendet.lock();
        assert_eq!(gesendet.len(), 1);
        assert_eq!(gesendet[0].0, remote);
        assert!(matches!(gesendet[0].1, SignalPayload::Answer { .. }));
    }

    #[test]
    fn answer_ohne_peer_wird_verworfen() {
        let (manager, factory, _) = neuer_manager();

        manager.signal_empfangen(
            ConnectionId::new(),
            SignalPayload::Answer {
                sdp: "nachzuegler".into(),
            },
        );

        // Kein Peer angelegt, nichts passiert
        assert_eq!(manager.anzahl(), 0);
        assert!(factory.protokolle.lock().is_empty());
    }

    #[test]
    fn answer_im_falschen_zustand_wird_absorbiert() {
        let (manager, factory, _) = neuer_manager();
        let remote = ConnectionId::new();

        // Eingehender Pfad bis Connected
        manager.signal_empfangen(
            remote.clone(),
            SignalPayload::Offer {
                sdp: "remote-offer".into(),
            },
        );
        // Unerwartetes Answer darf den Zustand nicht veraendern
        manager.signal_empfangen(
            remote.clone(),
            SignalPayload::Answer {
                sdp: "unerwartet".into(),
            },
        );

        assert_eq!(manager.zustand_von(&remote), Some(PeerZustand::Connected));
        let protokolle = factory.protokolle.lock();
        assert_eq!(
            protokolle[0].lock().remote_beschreibungen,
            vec!["remote-offer".to_string()]
        );
    }

    #[test]
    fn getrennt_entfernt_und_schliesst() {
        let (manager, factory, _) = neuer_manager();
        let remote = ConnectionId::new();
        let mut events = manager.events_abonnieren();

        manager.benutzer_verbunden(remote.clone());
        manager.benutzer_getrennt(&remote);

        assert_eq!(manager.anzahl(), 0);
        assert!(factory.protokolle.lock()[0].lock().geschlossen);

        // ZustandGeaendert vom Verbindungsaufbau, dann Entfernt
        assert!(matches!(
            events.try_recv().unwrap(),
            PeerEvent::ZustandGeaendert { .. }
        ));
        match events.try_recv().unwrap() {
            PeerEvent::Entfernt { remote: r } => assert_eq!(r, remote),
            andere => panic!("unerwartetes Ereignis: {andere:?}"),
        }

        // Zweiter Abbau ist ein No-Op ohne weiteres Ereignis
        manager.benutzer_getrennt(&remote);
        assert!(events.try_recv().is_err());
    }

    #[test]
    fn kandidat_wird_gepuffert_und_nachgezogen() {
        let (manager, factory, _) = neuer_manager();
        let remote = ConnectionId::new();

        manager.benutzer_verbunden(remote.clone());
        manager.signal_empfangen(
            remote.clone(),
            SignalPayload::Candidate {
                candidate: "frueh".into(),
            },
        );

        // Vor dem Answer nur gepuffert
        assert!(factory.protokolle.lock()[0].lock().kandidaten.is_empty());

        manager.signal_empfangen(
            remote.clone(),
            SignalPayload::Answer {
                sdp: "remote-answer".into(),
            },
        );

        assert_eq!(manager.zustand_von(&remote), Some(PeerZustand::Connected));
        assert_eq!(
            factory.protokolle.lock()[0].lock().kandidaten,
            vec!["frueh".to_string()]
        );
    }

    #[test]
    fn alle_schliessen_raeumt_auf() {
        let (manager, factory, _) = neuer_manager();

        manager.benutzer_verbunden(ConnectionId::new());
        manager.benutzer_verbunden(ConnectionId::new());
        manager.alle_schliessen();

        assert_eq!(manager.anzahl(), 0);
        for protokoll in factory.protokolle.lock().iter() {
            assert!(protokoll.lock().geschlossen);
        }
    }
}
