//! Raum-Verzeichnis – Bildet Raumnamen auf ihre Teilnehmerlisten ab
//!
//! Raeume sind ephemer: sie entstehen implizit beim ersten Beitritt und
//! verschwinden atomar mit dem letzten Austritt. Es gibt kein Zeitfenster
//! in dem ein leerer Raum abfragbar waere.
//!
//! Alle Mutationen an einem Raum serialisieren sich auf dessen
//! DashMap-Eintrag; Operationen auf verschiedenen Raeumen laufen
//! vollstaendig parallel.

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use funkraum_core::types::{ConnectionId, RoomId, UserToken};
use funkraum_protocol::message::ParticipantInfo;
use std::sync::Arc;

// ---------------------------------------------------------------------------
// Participant
// ---------------------------------------------------------------------------

/// Presence eines Teilnehmers innerhalb seines Raums
///
/// Gehoert exklusiv dem Raum-Eintrag; Mitgliedschaft und Mic-Flag mutiert
/// nur der PresenceCoordinator, das Sprech-Flag nur die VAD-Pipeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Participant {
    pub connection_id: ConnectionId,
    pub user_token: UserToken,
    pub mic_enabled: bool,
    pub is_speaking: bool,
}

impl Participant {
    /// Erstellt einen frischen Teilnehmer (Mic an, nicht sprechend)
    pub fn neu(connection_id: ConnectionId, user_token: UserToken) -> Self {
        Self {
            connection_id,
            user_token,
            mic_enabled: true,
            is_speaking: false,
        }
    }
}

impl From<&Participant> for ParticipantInfo {
    fn from(t: &Participant) -> Self {
        Self {
            connection_id: t.connection_id,
            user_token: t.user_token.clone(),
            mic_enabled: t.mic_enabled,
            is_speaking: t.is_speaking,
        }
    }
}

// ---------------------------------------------------------------------------
// RoomDirectory
// ---------------------------------------------------------------------------

/// Verzeichnis aller existierenden Raeume
///
/// Thread-safe via Arc + DashMap. Clone teilt den inneren Zustand.
#[derive(Clone)]
pub struct RoomDirectory {
    inner: Arc<RoomDirectoryInner>,
}

struct RoomDirectoryInner {
    raeume: DashMap<RoomId, Vec<Participant>>,
}

impl RoomDirectory {
    /// Erstellt ein neues, leeres RoomDirectory
    pub fn neu() -> Self {
        Self {
            inner: Arc::new(RoomDirectoryInner {
                raeume: DashMap::new(),
            }),
        }
    }

    /// Fuegt einen Teilnehmer einem Raum hinzu (create-or-get)
    ///
    /// Doppelter Beitritt derselben ConnectionId ist ein No-Op und erzeugt
    /// keinen zweiten Eintrag. Gibt den Snapshot zum Einfuegezeitpunkt
    /// zurueck – inklusive des Beitretenden selbst – sowie ob der
    /// Teilnehmer tatsaechlich neu eingefuegt wurde. Der Aufrufer
    /// benachrichtigt den Raum nur bei echtem Einfuegen.
    pub fn beitreten(&self, room_id: RoomId, teilnehmer: Participant) -> (Vec<Participant>, bool) {
        let mut eintrag = self.inner.raeume.entry(room_id).or_default();
        let schon_drin = eintrag
            .iter()
            .any(|t| t.connection_id == teilnehmer.connection_id);
        if !schon_drin {
            eintrag.push(teilnehmer);
        }
        (eintrag.clone(), !schon_drin)
    }

    /// Entfernt einen Teilnehmer aus einem Raum
    ///
    /// Wird der Raum dabei leer, verschwindet er im selben Schritt aus
    /// dem Verzeichnis. Gibt `true` zurueck wenn der Teilnehmer entfernt
    /// wurde, `false` bei unbekanntem Raum oder Teilnehmer.
    pub fn verlassen(&self, room_id: &RoomId, connection_id: &ConnectionId) -> bool {
        match self.inner.raeume.entry(room_id.clone()) {
            Entry::Occupied(mut eintrag) => {
                let vorher = eintrag.get().len();
                eintrag
                    .get_mut()
                    .retain(|t| &t.connection_id != connection_id);
                let entfernt = eintrag.get().len() < vorher;
                if eintrag.get().is_empty() {
                    eintrag.remove();
                }
                entfernt
            }
            Entry::Vacant(_) => false,
        }
    }

    /// Gibt die aktuelle Teilnehmerliste eines Raums zurueck
    pub fn mitglieder(&self, room_id: &RoomId) -> Vec<Participant> {
        self.inner
            .raeume
            .get(room_id)
            .map(|t| t.clone())
            .unwrap_or_default()
    }

    /// Setzt das Mic-Flag eines Teilnehmers
    ///
    /// Gibt `true` zurueck wenn der Teilnehmer gefunden wurde.
    pub fn mic_setzen(
        &self,
        room_id: &RoomId,
        connection_id: &ConnectionId,
        mic_enabled: bool,
    ) -> bool {
        match self.inner.raeume.get_mut(room_id) {
            Some(mut teilnehmer) => {
                match teilnehmer
                    .iter_mut()
                    .find(|t| &t.connection_id == connection_id)
                {
                    Some(t) => {
                        t.mic_enabled = mic_enabled;
                        true
                    }
                    None => false,
                }
            }
            None => false,
        }
    }

    /// Setzt das Sprech-Flag eines Teilnehmers (flankengesteuert)
    ///
    /// Gibt nur dann `true` zurueck wenn sich der Wert tatsaechlich
    /// geaendert hat – der Aufrufer broadcastet ausschliesslich auf
    /// Flanken, nie pro Sample.
    pub fn sprechen_setzen(
        &self,
        room_id: &RoomId,
        connection_id: &ConnectionId,
        is_speaking: bool,
    ) -> bool {
        match self.inner.raeume.get_mut(room_id) {
            Some(mut teilnehmer) => {
                match teilnehmer
                    .iter_mut()
                    .find(|t| &t.connection_id == connection_id)
                {
                    Some(t) if t.is_speaking != is_speaking => {
                        t.is_speaking = is_speaking;
                        true
                    }
                    _ => false,
                }
            }
            None => false,
        }
    }

    /// Prueft ob ein Raum existiert
    pub fn existiert(&self, room_id: &RoomId) -> bool {
        self.inner.raeume.contains_key(room_id)
    }

    /// Gibt die Anzahl existierender Raeume zurueck
    pub fn raum_anzahl(&self) -> usize {
        self.inner.raeume.len()
    }
}

impl Default for RoomDirectory {
    fn default() -> Self {
        Self::neu()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn teilnehmer(cid: ConnectionId) -> Participant {
        Participant::neu(cid, UserToken::neu("tok"))
    }

    #[test]
    fn beitreten_erstellt_raum_implizit() {
        let dir = RoomDirectory::neu();
        let raum = RoomId::neu("42");
        let cid = ConnectionId::new();

        assert!(!dir.existiert(&raum));
        let (snapshot, neu) = dir.beitreten(raum.clone(), teilnehmer(cid));
        assert!(dir.existiert(&raum));
        assert!(neu);

        // Snapshot enthaelt den Beitretenden selbst
        assert_eq!(snapshot.len(), 1);
        assert_eq!(snapshot[0].connection_id, cid);
        assert!(snapshot[0].mic_enabled);
        assert!(!snapshot[0].is_speaking);
    }

    #[test]
    fn doppelter_beitritt_erzeugt_keinen_duplikat_eintrag() {
        let dir = RoomDirectory::neu();
        let raum = RoomId::neu("42");
        let cid = ConnectionId::new();

        let (_, neu) = dir.beitreten(raum.clone(), teilnehmer(cid));
        assert!(neu);
        let (snapshot, neu) = dir.beitreten(raum.clone(), teilnehmer(cid));
        assert_eq!(snapshot.len(), 1, "Doppelter Beitritt ist No-Op");
        assert!(!neu, "Doppelter Beitritt meldet kein Einfuegen");
    }

    #[test]
    fn letzter_austritt_loescht_raum_atomar() {
        let dir = RoomDirectory::neu();
        let raum = RoomId::neu("42");
        let a = ConnectionId::new();
        let b = ConnectionId::new();

        dir.beitreten(raum.clone(), teilnehmer(a));
        dir.beitreten(raum.clone(), teilnehmer(b));

        assert!(dir.verlassen(&raum, &a));
        assert!(dir.existiert(&raum), "Raum mit Restmitglied bleibt");

        assert!(dir.verlassen(&raum, &b));
        assert!(!dir.existiert(&raum), "Leerer Raum existiert nicht");
        assert_eq!(dir.raum_anzahl(), 0);
    }

    #[test]
    fn verlassen_unbekannter_raum_oder_teilnehmer_ist_noop() {
        let dir = RoomDirectory::neu();
        let raum = RoomId::neu("42");
        let cid = ConnectionId::new();

        assert!(!dir.verlassen(&raum, &cid));

        dir.beitreten(raum.clone(), teilnehmer(cid));
        assert!(!dir.verlassen(&raum, &ConnectionId::new()));
        assert_eq!(dir.mitglieder(&raum).len(), 1);
    }

    #[test]
    fn n_beitritte_und_n_austritte_lassen_kein_verzeichnis_residuum() {
        let dir = RoomDirectory::neu();
        let raum = RoomId::neu("lobby");
        let ids: Vec<ConnectionId> = (0..5).map(|_| ConnectionId::new()).collect();

        for cid in &ids {
            dir.beitreten(raum.clone(), teilnehmer(*cid));
        }
        // Verschachtelte Reihenfolge
        for cid in ids.iter().rev() {
            dir.verlassen(&raum, cid);
        }
        assert!(!dir.existiert(&raum));
    }

    #[test]
    fn mitgliedschaft_folgt_netto_effekt() {
        let dir = RoomDirectory::neu();
        let raum = RoomId::neu("42");
        let cid = ConnectionId::new();

        dir.beitreten(raum.clone(), teilnehmer(cid));
        dir.verlassen(&raum, &cid);
        dir.beitreten(raum.clone(), teilnehmer(cid));

        let mitglieder = dir.mitglieder(&raum);
        assert!(mitglieder.iter().any(|t| t.connection_id == cid));
    }

    #[test]
    fn mic_setzen_mutiert_in_place() {
        let dir = RoomDirectory::neu();
        let raum = RoomId::neu("42");
        let cid = ConnectionId::new();

        dir.beitreten(raum.clone(), teilnehmer(cid));
        assert!(dir.mic_setzen(&raum, &cid, false));
        assert!(!dir.mitglieder(&raum)[0].mic_enabled);

        assert!(!dir.mic_setzen(&raum, &ConnectionId::new(), false));
    }

    #[test]
    fn sprechen_setzen_nur_auf_flanke() {
        let dir = RoomDirectory::neu();
        let raum = RoomId::neu("42");
        let cid = ConnectionId::new();

        dir.beitreten(raum.clone(), teilnehmer(cid));

        assert!(dir.sprechen_setzen(&raum, &cid, true), "false -> true ist Flanke");
        assert!(!dir.sprechen_setzen(&raum, &cid, true), "true -> true ist keine");
        assert!(dir.sprechen_setzen(&raum, &cid, false), "true -> false ist Flanke");
        assert!(!dir.sprechen_setzen(&raum, &cid, false));
    }

    #[test]
    fn participant_info_konvertierung() {
        let cid = ConnectionId::new();
        let t = teilnehmer(cid);
        let info = ParticipantInfo::from(&t);
        assert_eq!(info.connection_id, cid);
        assert!(info.mic_enabled);
    }
}
