//! Presence-Coordinator – Orchestriert Beitritt, Austritt und Status
//!
//! Einzige Schreibstelle fuer Raum-Mitgliedschaft: alle Mutationen am
//! RoomDirectory laufen hier durch, inklusive der Benachrichtigungen an
//! die uebrigen Raummitglieder.
//!
//! ## Asymmetrische Benachrichtigung
//! Der Beitretende bekommt den Snapshot zum Einfuegezeitpunkt (inklusive
//! sich selbst) als Antwort; die bestehenden Mitglieder bekommen statt
//! eines erneuten Snapshots ein einzelnes `UserConnected`.
//!
//! Alle Benachrichtigungen sind fire-and-forget ueber die Send-Queues der
//! Registry – ein langsamer Peer stallt niemals die Verarbeitung anderer.

use funkraum_core::types::{ConnectionId, RoomId, UserToken};
use funkraum_protocol::message::{CreatedResponse, ParticipantInfo, RelayMessage, RelayPayload};

use crate::error::{SignalingError, SignalingResult};
use crate::registry::ConnectionRegistry;
use crate::rooms::{Participant, RoomDirectory};

/// Orchestriert den Presence-Lebenszyklus aller Verbindungen
///
/// Clone teilt Registry und Verzeichnis.
#[derive(Clone)]
pub struct PresenceCoordinator {
    registry: ConnectionRegistry,
    rooms: RoomDirectory,
}

impl PresenceCoordinator {
    /// Erstellt einen neuen PresenceCoordinator
    pub fn neu(registry: ConnectionRegistry, rooms: RoomDirectory) -> Self {
        Self { registry, rooms }
    }

    /// Fuehrt einen Raum-Beitritt durch
    ///
    /// Erstellt den Raum bei Bedarf, benachrichtigt die bestehenden
    /// Mitglieder und gibt den Beitritts-Snapshot fuer den Beitretenden
    /// zurueck. Haengt die Verbindung noch in einem anderen Raum, wird
    /// dieser zuerst implizit verlassen.
    ///
    /// Ist die Verbindung bereits abgeraeumt (Disconnect hat den Beitritt
    /// ueberholt), wird der Beitritt verworfen statt angewendet.
    pub fn beitreten(
        &self,
        connection_id: ConnectionId,
        room_id: RoomId,
        user_token: UserToken,
    ) -> SignalingResult<CreatedResponse> {
        if !self.registry.ist_registriert(&connection_id) {
            return Err(SignalingError::NichtGefunden(format!(
                "Beitritt fuer bereits getrennte Verbindung {connection_id}"
            )));
        }

        // Raumwechsel: alten Raum zuerst verlassen
        if let Some(alter_raum) = self.registry.raum_von(&connection_id) {
            if alter_raum != room_id {
                self.verlassen(&connection_id);
            }
        }

        self.registry.token_setzen(&connection_id, user_token.clone());

        let teilnehmer = Participant::neu(connection_id, user_token.clone());
        let (snapshot, neu) = self.rooms.beitreten(room_id.clone(), teilnehmer);
        self.registry.raum_setzen(&connection_id, Some(room_id.clone()));

        // Bestehende Mitglieder benachrichtigen, nie den Beitretenden.
        // Ein doppelter Beitritt in denselben Raum liefert nur den
        // Snapshot erneut, ohne zweiten UserConnected-Broadcast.
        if neu {
            tracing::info!(
                connection_id = %connection_id,
                room_id = %room_id,
                teilnehmer = snapshot.len(),
                "Raum beigetreten"
            );
            let benachrichtigung = RelayMessage::broadcast(RelayPayload::UserConnected {
                connection_id,
                user_token,
            });
            self.an_raum_senden(&room_id, benachrichtigung, Some(&connection_id));
        }

        Ok(CreatedResponse {
            room_id,
            participants: snapshot.iter().map(ParticipantInfo::from).collect(),
        })
    }

    /// Entfernt eine Verbindung aus ihrem aktuellen Raum
    ///
    /// No-Op wenn die Verbindung in keinem Raum ist. Wird der Raum leer,
    /// verschwindet er im selben Schritt; andernfalls bekommen die
    /// verbleibenden Mitglieder ein `UserDisconnected`.
    pub fn verlassen(&self, connection_id: &ConnectionId) {
        let room_id = match self.registry.raum_von(connection_id) {
            Some(r) => r,
            None => return,
        };

        let entfernt = self.rooms.verlassen(&room_id, connection_id);
        self.registry.raum_setzen(connection_id, None);

        if entfernt {
            tracing::info!(
                connection_id = %connection_id,
                room_id = %room_id,
                "Raum verlassen"
            );
            let benachrichtigung = RelayMessage::broadcast(RelayPayload::UserDisconnected {
                connection_id: *connection_id,
            });
            self.an_raum_senden(&room_id, benachrichtigung, Some(connection_id));
        }
    }

    /// Raeumt eine getrennte Verbindung auf (authoritativ, idempotent)
    ///
    /// Identisch zu einem expliziten Austritt plus Registry-Entfernung.
    /// Spaeter eintreffende Requests der Verbindung laufen danach ins
    /// Leere statt angewendet zu werden.
    pub fn verbindung_getrennt(&self, connection_id: &ConnectionId) {
        self.verlassen(connection_id);
        self.registry.entfernen(connection_id);
    }

    /// Setzt das Mic-Flag und broadcastet die Aenderung an den Raum
    ///
    /// No-Op wenn die Verbindung in keinem Raum ist.
    pub fn mic_setzen(&self, connection_id: &ConnectionId, mic_enabled: bool) {
        let room_id = match self.registry.raum_von(connection_id) {
            Some(r) => r,
            None => {
                tracing::debug!(connection_id = %connection_id, "Mic-Toggle ohne Raum");
                return;
            }
        };

        if self.rooms.mic_setzen(&room_id, connection_id, mic_enabled) {
            let benachrichtigung = RelayMessage::broadcast(RelayPayload::MicToggled {
                connection_id: *connection_id,
                mic_enabled,
            });
            // Ganzer Raum inklusive Ausloeser: der Broadcast ist zugleich
            // die Bestaetigung fuer den Client
            self.an_raum_senden(&room_id, benachrichtigung, None);
        }
    }

    /// Setzt das Sprech-Flag (flankengesteuert, von der VAD-Pipeline)
    ///
    /// Broadcastet nur wenn sich der Wert tatsaechlich geaendert hat.
    pub fn sprechen_setzen(&self, connection_id: &ConnectionId, is_speaking: bool) {
        let room_id = match self.registry.raum_von(connection_id) {
            Some(r) => r,
            None => return,
        };

        if self.rooms.sprechen_setzen(&room_id, connection_id, is_speaking) {
            let benachrichtigung = RelayMessage::broadcast(RelayPayload::SpeakingChanged {
                connection_id: *connection_id,
                is_speaking,
            });
            self.an_raum_senden(&room_id, benachrichtigung, None);
        }
    }

    // -----------------------------------------------------------------------
    // Interne Hilfsmethoden
    // -----------------------------------------------------------------------

    /// Sendet an alle Raummitglieder, optional einen ausgenommen
    ///
    /// Gibt die Anzahl erfolgreicher Einreihungen zurueck; Fehlschlaege
    /// pro Empfaenger sind gutartig und werden in der Registry geloggt.
    fn an_raum_senden(
        &self,
        room_id: &RoomId,
        nachricht: RelayMessage,
        ausser: Option<&ConnectionId>,
    ) -> usize {
        let mut gesendet = 0;
        for teilnehmer in self.rooms.mitglieder(room_id) {
            if ausser == Some(&teilnehmer.connection_id) {
                continue;
            }
            if self
                .registry
                .senden(&teilnehmer.connection_id, nachricht.clone())
            {
                gesendet += 1;
            }
        }
        gesendet
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
