//! funkraum-server – Bibliotheks-Root
//!
//! Verdrahtet Konfiguration, Relay-Zustand und TCP-Listener und stellt
//! den Einstiegspunkt fuer Integrationstests bereit.

pub mod config;

use std::net::SocketAddr;

use anyhow::{Context, Result};

use config::ServerConfig;
use funkraum_signaling::{RelayConfig, RelayServer, RelayState};

/// Haelt den laufenden Server-Zustand zusammen
pub struct Server {
    pub config: ServerConfig,
}

impl Server {
    /// Erstellt einen neuen Server aus der gegebenen Konfiguration
    pub fn neu(config: ServerConfig) -> Self {
        Self { config }
    }

    /// Startet den Relay und laeuft bis zum Shutdown-Signal
    pub async fn starten(self) -> Result<()> {
        let bind_addr: SocketAddr = self
            .config
            .tcp_bind_adresse()
            .parse()
            .with_context(|| format!("Ungueltige Bind-Adresse '{}'", self.config.tcp_bind_adresse()))?;

        tracing::info!(
            server_name = %self.config.server.name,
            tcp = %bind_addr,
            max_clients = self.config.server.max_clients,
            "Server startet"
        );

        let relay_config = RelayConfig {
            server_name: self.config.server.name.clone(),
            max_clients: self.config.server.max_clients,
            keepalive_sek: self.config.grenzen.keepalive_sek,
            verbindungs_timeout_sek: self.config.grenzen.verbindungs_timeout_sek,
        };
        let state = RelayState::neu(relay_config);

        let (shutdown_tx, shutdown_rx) = tokio::sync::watch::channel(false);

        let relay = RelayServer::neu(state, bind_addr);
        let relay_task = tokio::spawn(relay.starten(shutdown_rx));

        tracing::info!("Server laeuft. Warte auf Shutdown-Signal (Ctrl-C)...");
        tokio::signal::ctrl_c().await?;
        tracing::info!("Shutdown-Signal empfangen, Server wird beendet");

        // Alle Verbindungs-Tasks und der Listener beenden sich daraufhin
        let _ = shutdown_tx.send(true);
        relay_task.await?.context("Relay-Server-Fehler")?;

        Ok(())
    }
}
