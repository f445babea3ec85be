//! Gemeinsame Identifikationstypen fuer Funkraum
//!
//! Alle IDs verwenden das Newtype-Pattern um Verwechslungen zwischen
//! verschiedenen ID-Arten zur Compilezeit auszuschliessen.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Eindeutige Verbindungs-ID
///
/// Wird ausschliesslich vom ConnectionRegistry vergeben; Clients duerfen
/// niemals eigene IDs mitbringen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ConnectionId(pub Uuid);

impl ConnectionId {
    /// Erstellt eine neue zufaellige ConnectionId
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Gibt die innere UUID zurueck
    pub fn inner(&self) -> Uuid {
        self.0
    }
}

impl Default for ConnectionId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "conn:{}", self.0)
    }
}

/// Raum-Bezeichner
///
/// Raeume werden vom Client benannt (opaker String) und bei Bedarf
/// implizit erstellt. Kein UUID-Zwang: "42" ist ein gueltiger Raumname.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RoomId(pub String);

impl RoomId {
    /// Erstellt eine RoomId aus einem beliebigen Namen
    pub fn neu(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// Gibt den inneren Namen zurueck
    pub fn inner(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for RoomId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "raum:{}", self.0)
    }
}

impl From<&str> for RoomId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Opaker Identitaets-Token des Benutzers
///
/// Wird von der ausgelagerten Auth-Schicht vergeben und hier nur
/// durchgereicht, niemals interpretiert oder validiert.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UserToken(pub String);

impl UserToken {
    pub fn neu(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn inner(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for UserToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn connection_id_eindeutig() {
        let a = ConnectionId::new();
        let b = ConnectionId::new();
        assert_ne!(a, b, "Zwei neue ConnectionIds muessen verschieden sein");
    }

    #[test]
    fn connection_id_display() {
        let id = ConnectionId(Uuid::nil());
        assert!(id.to_string().starts_with("conn:"));
    }

    #[test]
    fn room_id_aus_beliebigem_namen() {
        let raum = RoomId::neu("42");
        assert_eq!(raum.inner(), "42");
        assert_eq!(raum, RoomId::from("42"));
    }

    #[test]
    fn ids_sind_serde_kompatibel() {
        let cid = ConnectionId::new();
        let json = serde_json::to_string(&cid).unwrap();
        let cid2: ConnectionId = serde_json::from_str(&json).unwrap();
        assert_eq!(cid, cid2);

        let raum = RoomId::neu("lobby");
        let json = serde_json::to_string(&raum).unwrap();
        assert_eq!(json, "\"lobby\"", "RoomId serialisiert als nackter String");
    }
}
