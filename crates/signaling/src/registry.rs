//! Connection-Registry – Verwaltet alle lebenden Client-Verbindungen
//!
//! Die Registry ist die alleinige Autoritaet fuer ConnectionIds: Clients
//! bringen niemals eigene IDs mit. Pro Verbindung haelt sie den opaken
//! User-Token, die aktuelle Raum-Zugehoerigkeit und die Send-Queue in
//! Richtung Client.
//!
//! Ein Lookup-Fehlschlag ist ein normaler Miss ("Peer schon weg"),
//! nie ein Fehler.

use dashmap::DashMap;
use funkraum_core::types::{ConnectionId, RoomId, UserToken};
use funkraum_protocol::message::RelayMessage;
use std::sync::Arc;
use tokio::sync::mpsc;

// ---------------------------------------------------------------------------
// Konfiguration
// ---------------------------------------------------------------------------

/// Groesse der Send-Queue pro Client
const SEND_QUEUE_GROESSE: usize = 64;

// ---------------------------------------------------------------------------
// ConnectionInfo
// ---------------------------------------------------------------------------

/// Oeffentliche Sicht auf eine registrierte Verbindung (ohne Send-Queue)
#[derive(Debug, Clone)]
pub struct ConnectionInfo {
    pub connection_id: ConnectionId,
    /// Wird beim Raum-Beitritt gesetzt, davor None
    pub user_token: Option<UserToken>,
    /// Aktueller Raum (hoechstens einer pro Verbindung)
    pub room_id: Option<RoomId>,
}

/// Interner Eintrag inklusive Send-Queue
struct Verbindung {
    info: ConnectionInfo,
    tx: mpsc::Sender<RelayMessage>,
}

// ---------------------------------------------------------------------------
// ConnectionRegistry
// ---------------------------------------------------------------------------

/// Verwaltet alle lebenden Verbindungen
///
/// Thread-safe via Arc + DashMap. Clone der Registry teilt den inneren Zustand.
#[derive(Clone)]
pub struct ConnectionRegistry {
    inner: Arc<ConnectionRegistryInner>,
}

struct ConnectionRegistryInner {
    verbindungen: DashMap<ConnectionId, Verbindung>,
}

impl ConnectionRegistry {
    /// Erstellt eine neue ConnectionRegistry
    pub fn neu() -> Self {
        Self {
            inner: Arc::new(ConnectionRegistryInner {
                verbindungen: DashMap::new(),
            }),
        }
    }

    /// Registriert eine neue Verbindung und vergibt ihre ConnectionId
    ///
    /// Gibt die ID und die Empfangs-Queue zurueck. Die `ClientConnection`
    /// liest aus dieser Queue und sendet via TCP.
    pub fn registrieren(&self) -> (ConnectionId, mpsc::Receiver<RelayMessage>) {
        let connection_id = ConnectionId::new();
        let (tx, rx) = mpsc::channel(SEND_QUEUE_GROESSE);
        self.inner.verbindungen.insert(
            connection_id,
            Verbindung {
                info: ConnectionInfo {
                    connection_id,
                    user_token: None,
                    room_id: None,
                },
                tx,
            },
        );
        tracing::debug!(connection_id = %connection_id, "Verbindung registriert");
        (connection_id, rx)
    }

    /// Entfernt eine Verbindung (idempotent)
    ///
    /// Gibt die letzte bekannte Info zurueck, damit der Aufrufer den
    /// impliziten Raum-Austritt durchfuehren kann.
    pub fn entfernen(&self, connection_id: &ConnectionId) -> Option<ConnectionInfo> {
        let entfernt = self
            .inner
            .verbindungen
            .remove(connection_id)
            .map(|(_, v)| v.info);
        if entfernt.is_some() {
            tracing::debug!(connection_id = %connection_id, "Verbindung entfernt");
        }
        entfernt
    }

    /// Schlaegt eine Verbindung nach
    pub fn suchen(&self, connection_id: &ConnectionId) -> Option<ConnectionInfo> {
        self.inner
            .verbindungen
            .get(connection_id)
            .map(|v| v.info.clone())
    }

    /// Setzt den User-Token einer Verbindung (beim Raum-Beitritt)
    pub fn token_setzen(&self, connection_id: &ConnectionId, token: UserToken) {
        if let Some(mut v) = self.inner.verbindungen.get_mut(connection_id) {
            v.info.user_token = Some(token);
        }
    }

    /// Setzt oder loescht die Raum-Zugehoerigkeit einer Verbindung
    pub fn raum_setzen(&self, connection_id: &ConnectionId, room_id: Option<RoomId>) {
        if let Some(mut v) = self.inner.verbindungen.get_mut(connection_id) {
            v.info.room_id = room_id;
        }
    }

    /// Gibt den aktuellen Raum einer Verbindung zurueck
    pub fn raum_von(&self, connection_id: &ConnectionId) -> Option<RoomId> {
        self.inner.verbindungen.get(connection_id)?.info.room_id.clone()
    }

    /// Sendet eine Nachricht nicht-blockierend an eine Verbindung
    ///
    /// Gibt `false` zurueck wenn die Verbindung unbekannt, die Queue voll
    /// oder geschlossen ist. Ein langsamer oder toter Peer darf den
    /// Aufrufer niemals blockieren.
    pub fn senden(&self, connection_id: &ConnectionId, nachricht: RelayMessage) -> bool {
        let eintrag = match self.inner.verbindungen.get(connection_id) {
            Some(v) => v,
            None => {
                tracing::debug!(connection_id = %connection_id, "Senden an unbekannte Verbindung");
                return false;
            }
        };
        match eintrag.tx.try_send(nachricht) {
            Ok(()) => true,
            Err(mpsc::error::TrySendError::Full(_)) => {
                tracing::warn!(connection_id = %connection_id, "Send-Queue voll – Nachricht verworfen");
                false
            }
            Err(mpsc::error::TrySendError::Closed(_)) => {
                tracing::debug!(connection_id = %connection_id, "Send-Queue geschlossen (Client getrennt)");
                false
            }
        }
    }

    /// Prueft ob eine Verbindung registriert ist
    pub fn ist_registriert(&self, connection_id: &ConnectionId) -> bool {
        self.inner.verbindungen.contains_key(connection_id)
    }

    /// Gibt die Anzahl der registrierten Verbindungen zurueck
    pub fn anzahl(&self) -> usize {
        self.inner.verbindungen.len()
    }
}

impl Default for ConnectionRegistry {
    fn default() -> Self {
        Self::neu()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
