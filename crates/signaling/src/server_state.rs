//! Gemeinsamer Relay-Zustand
//!
//! Haelt Registry, Raum-Verzeichnis, Presence-Coordinator und Signal-Relay
//! als geteilte Handles. Wird einmal beim Prozessstart konstruiert und als
//! `Arc` an alle Verbindungs-Tasks gereicht – kein ambienter globaler
//! Zustand.

use std::sync::Arc;
use std::time::Instant;

use crate::presence::PresenceCoordinator;
use crate::registry::ConnectionRegistry;
use crate::relay::SignalRelay;
use crate::rooms::RoomDirectory;

/// Konfiguration fuer den Relay
#[derive(Debug, Clone)]
pub struct RelayConfig {
    /// Anzeigename des Servers
    pub server_name: String,
    /// Maximale gleichzeitige Verbindungen
    pub max_clients: u32,
    /// Keepalive-Intervall in Sekunden
    pub keepalive_sek: u64,
    /// Timeout fuer inaktive Verbindungen in Sekunden
    pub verbindungs_timeout_sek: u64,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            server_name: "Funkraum Relay".to_string(),
            max_clients: 512,
            keepalive_sek: 30,
            verbindungs_timeout_sek: 90,
        }
    }
}

/// Gemeinsamer Relay-Zustand (thread-safe, Arc-geteilt)
pub struct RelayState {
    /// Relay-Konfiguration
    pub config: Arc<RelayConfig>,
    /// Verbindungs-Registry (alleinige ID-Autoritaet)
    pub registry: ConnectionRegistry,
    /// Raum-Verzeichnis
    pub rooms: RoomDirectory,
    /// Presence-Coordinator (Beitritt, Austritt, Mic, Sprechen)
    pub presence: PresenceCoordinator,
    /// Signal-Relay (Offer/Answer/Candidate-Weiterleitung)
    pub relay: SignalRelay,
    /// Startzeitpunkt des Servers (fuer Uptime-Berechnung)
    pub start_time: Instant,
}

impl RelayState {
    /// Erstellt einen neuen RelayState
    pub fn neu(config: RelayConfig) -> Arc<Self> {
        let registry = ConnectionRegistry::neu();
        let rooms = RoomDirectory::neu();
        let presence = PresenceCoordinator::neu(registry.clone(), rooms.clone());
        let relay = SignalRelay::neu(registry.clone());

        Arc::new(Self {
            config: Arc::new(config),
            registry,
            rooms,
            presence,
            relay,
            start_time: Instant::now(),
        })
    }

    /// Gibt die Uptime in Sekunden zurueck
    pub fn uptime_sek(&self) -> u64 {
        self.start_time.elapsed().as_secs()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn state_teilt_registry_zwischen_diensten() {
        let state = RelayState::neu(RelayConfig::default());
        let (cid, _rx) = state.registry.registrieren();

        // Presence und Relay sehen dieselbe Registry
        state.presence.verbindung_getrennt(&cid);
        assert!(!state.registry.ist_registriert(&cid));
    }

    #[test]
    fn standard_config() {
        let cfg = RelayConfig::default();
        assert_eq!(cfg.max_clients, 512);
        assert_eq!(cfg.keepalive_sek, 30);
    }
}
