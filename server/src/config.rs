//! Server-Konfiguration
//!
//! Wird beim Start aus einer TOML-Datei geladen. Alle Felder haben
//! sinnvolle Standardwerte, sodass der Relay ohne Konfigurationsdatei
//! lauffaehig ist.

use serde::{Deserialize, Serialize};

/// Vollstaendige Server-Konfiguration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
#[derive(Default)]
pub struct ServerConfig {
    /// Allgemeine Server-Einstellungen
    pub server: ServerEinstellungen,
    /// Netzwerk-Einstellungen
    pub netzwerk: NetzwerkEinstellungen,
    /// Verbindungs-Grenzen
    pub grenzen: GrenzenEinstellungen,
    /// Logging-Einstellungen
    pub logging: LoggingEinstellungen,
}

/// Allgemeine Server-Einstellungen
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerEinstellungen {
    /// Anzeigename des Servers
    pub name: String,
    /// Maximale Anzahl gleichzeitiger Clients
    pub max_clients: u32,
}

impl Default for ServerEinstellungen {
    fn default() -> Self {
        Self {
            name: "Funkraum Relay".into(),
            max_clients: 512,
        }
    }
}

/// Netzwerk-Einstellungen
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NetzwerkEinstellungen {
    /// Bind-Adresse fuer den TCP-Listener
    pub bind_adresse: String,
    /// Port fuer den TCP-Listener
    pub tcp_port: u16,
}

impl Default for NetzwerkEinstellungen {
    fn default() -> Self {
        Self {
            bind_adresse: "0.0.0.0".into(),
            tcp_port: 9443,
        }
    }
}

/// Verbindungs-Grenzen
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GrenzenEinstellungen {
    /// Keepalive-Intervall in Sekunden
    pub keepalive_sek: u64,
    /// Inaktivitaets-Timeout in Sekunden, danach wird getrennt
    pub verbindungs_timeout_sek: u64,
}

impl Default for GrenzenEinstellungen {
    fn default() -> Self {
        Self {
            keepalive_sek: 30,
            verbindungs_timeout_sek: 90,
        }
    }
}

/// Logging-Einstellungen
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingEinstellungen {
    /// Log-Level: "trace", "debug", "info", "warn", "error"
    pub level: String,
    /// Format: "json" oder "text"
    pub format: String,
}

impl Default for LoggingEinstellungen {
    fn default() -> Self {
        Self {
            level: "info".into(),
            format: "text".into(),
        }
    }
}

impl ServerConfig {
    /// Laedt die Konfiguration aus einer TOML-Datei.
    /// Gibt die Standardkonfiguration zurueck wenn die Datei nicht existiert.
    pub fn laden(pfad: &str) -> anyhow::Result<Self> {
        match std::fs::read_to_string(pfad) {
            Ok(inhalt) => {
                let config: Self = toml::from_str(&inhalt)
                    .map_err(|e| anyhow::anyhow!("Konfigurationsfehler in '{pfad}': {e}"))?;
                Ok(config)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::warn!(
                    pfad = pfad,
                    "Konfigurationsdatei nicht gefunden, verwende Standardwerte"
                );
                Ok(Self::default())
            }
            Err(e) => Err(anyhow::anyhow!(
                "Konfigurationsdatei '{pfad}' nicht lesbar: {e}"
            )),
        }
    }

    /// Gibt die vollstaendige Bind-Adresse fuer TCP zurueck
    pub fn tcp_bind_adresse(&self) -> String {
        format!("{}:{}", self.netzwerk.bind_adresse, self.netzwerk.tcp_port)
    }
}
