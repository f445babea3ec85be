//! Sprachaktivitaets-Erkennung (VAD)
//!
//! Klassifiziert ein kontinuierliches Pegel-Signal (0..100) in diskrete
//! Spricht/Spricht-nicht-Zustaende. Effektiv ein Schmitt-Trigger mit
//! Mindest-Einschaltdauer und Abfallverzoegerung:
//!
//! - Aktivierung erst, wenn der Pegel laenger als `min_sprech_dauer_ms`
//!   ueber der Schwelle liegt (entprellt kurze Spitzen).
//! - Deaktivierung erst, wenn der Pegel laenger als `stille_timeout_ms`
//!   unter der Schwelle liegt (kurze Atempausen zerhacken keine Woerter).
//!
//! Alle Konstanten sind konfigurierbare Vertraege, keine festen Werte.

use std::collections::VecDeque;
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};

/// Konfiguration der Sprachaktivitaets-Erkennung
///
/// Wird als opakes Konfigurationsobjekt von der Aufruferschicht
/// durchgereicht; fehlende Felder fallen auf die Defaults zurueck.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct VadConfig {
    /// Pegel-Schwelle auf der 0..100-Skala
    pub schwelle: f32,
    /// Abfallverzoegerung: so lange bleibt der Zustand nach dem letzten
    /// Ueberschreiten der Schwelle noch aktiv
    pub stille_timeout_ms: u64,
    /// Mindestdauer ueber der Schwelle bevor aktiviert wird
    pub min_sprech_dauer_ms: u64,
    /// Exponentieller Glaettungsfaktor (0.0 = keine Glaettung)
    pub glaettung: f32,
    /// Groesse des gleitenden Pegel-Fensters
    pub fenster_groesse: usize,
}

impl Default for VadConfig {
    fn default() -> Self {
        Self {
            schwelle: 10.0,
            stille_timeout_ms: 1000,
            min_sprech_dauer_ms: 250,
            glaettung: 0.75,
            fenster_groesse: 10,
        }
    }
}

impl VadConfig {
    pub fn stille_timeout(&self) -> Duration {
        Duration::from_millis(self.stille_timeout_ms)
    }

    pub fn min_sprech_dauer(&self) -> Duration {
        Duration::from_millis(self.min_sprech_dauer_ms)
    }
}

/// Zustand der Erkennung fuer eine einzelne Quelle
///
/// Die Zeit wird vom Aufrufer injiziert, damit die Hysterese
/// deterministisch testbar bleibt.
pub struct Vad {
    config: VadConfig,
    fenster: VecDeque<f32>,
    geglaettet: f32,
    // Zeitpunkt der letzten Aufwaerts-Kreuzung der Schwelle
    kreuzung_bei: Option<Instant>,
    // Zeitpunkt des letzten Samples ueber der Schwelle
    zuletzt_ueber_bei: Option<Instant>,
    war_ueber: bool,
    aktiv: bool,
}

impl Vad {
    pub fn neu(config: VadConfig) -> Self {
        let fenster = VecDeque::with_capacity(config.fenster_groesse.max(1));
        Self {
            config,
            fenster,
            geglaettet: 0.0,
            kreuzung_bei: None,
            zuletzt_ueber_bei: None,
            war_ueber: false,
            aktiv: false,
        }
    }

    /// Ob die Quelle aktuell als sprechend gilt
    pub fn ist_aktiv(&self) -> bool {
        self.aktiv
    }

    /// Geglaetteter Pegel nach Fenster-Durchschnitt und Glaettung
    pub fn geglaetteter_pegel(&self) -> f32 {
        self.geglaettet
    }

    /// Verarbeitet ein Pegel-Sample zum Zeitpunkt `jetzt`
    ///
    /// Gibt `Some(neuer_zustand)` genau dann zurueck, wenn der boolesche
    /// Zustand gewechselt hat; sonst `None`. Nie ein Ereignis pro Sample.
    pub fn verarbeiten(&mut self, volumen: f32, jetzt: Instant) -> Option<bool> {
        // Gleitendes Fenster, aeltestes Sample faellt heraus
        if self.fenster.len() >= self.config.fenster_groesse.max(1) {
            self.fenster.pop_front();
        }
        self.fenster.push_back(volumen);
        let durchschnitt = self.fenster.iter().sum::<f32>() / self.fenster.len() as f32;

        self.geglaettet = self.geglaettet * self.config.glaettung
            + durchschnitt * (1.0 - self.config.glaettung);

        let ueber = self.geglaettet > self.config.schwelle;
        if ueber {
            if !self.war_ueber {
                self.kreuzung_bei = Some(jetzt);
            }
            self.zuletzt_ueber_bei = Some(jetzt);
        }
        self.war_ueber = ueber;

        let vorher = self.aktiv;
        if !self.aktiv {
            // Entprellung: erst aktiv, wenn die Kreuzung lange genug her ist
            if ueber {
                if let Some(kreuzung) = self.kreuzung_bei {
                    if jetzt.duration_since(kreuzung) >= self.config.min_sprech_dauer() {
                        self.aktiv = true;
                    }
                }
            }
        } else if !ueber {
            // Abfallverzoegerung: aktiv bis zum Stille-Timeout
            if let Some(zuletzt) = self.zuletzt_ueber_bei {
                if jetzt.duration_since(zuletzt) >= self.config.stille_timeout() {
                    self.aktiv = false;
                }
            }
        }

        if self.aktiv != vorher {
            Some(self.aktiv)
        } else {
            None
        }
    }

    /// Setzt den Erkennungszustand zurueck
    pub fn zuruecksetzen(&mut self) {
        self.fenster.clear();
        self.geglaettet = 0.0;
        self.kreuzung_bei = None;
        self.zuletzt_ueber_bei = None;
        self.war_ueber = false;
        self.aktiv = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Deterministische Konfiguration ohne Glaettungs-Traegheit, damit
    // die Zeit-Hysterese isoliert getestet werden kann
    fn sofort_config() -> VadConfig {
        VadConfig {
            schwelle: 10.0,
            stille_timeout_ms: 1000,
            min_sprech_dauer_ms: 250,
            glaettung: 0.0,
            fenster_groesse: 1,
        }
    }

    fn ms(basis: Instant, millis: u64) -> Instant {
        basis + Duration::from_millis(millis)
    }

    #[test]
    fn nur_nullen_aktivieren_nie() {
        let mut vad = Vad::neu(VadConfig::default());
        let basis = Instant::now();
        for i in 0..200 {
            assert_eq!(vad.verarbeiten(0.0, ms(basis, i * 50)), None);
        }
        assert!(!vad.ist_aktiv());
    }

    #[test]
    fn dauerpegel_erzeugt_genau_einen_uebergang() {
        let mut vad = Vad::neu(sofort_config());
        let basis = Instant::now();

        let mut uebergaenge = 0;
        // Schwelle + 1 ueber deutlich mehr als min_sprech_dauer
        for i in 0..20 {
            if vad.verarbeiten(11.0, ms(basis, i * 50)).is_some() {
                uebergaenge += 1;
            }
        }

        assert!(vad.ist_aktiv());
        assert_eq!(uebergaenge, 1, "Ein Uebergang, nicht einer pro Sample");
    }

    #[test]
    fn kurze_spitze_wird_entprellt() {
        let mut vad = Vad::neu(sofort_config());
        let basis = Instant::now();

        // 100ms ueber der Schwelle, dann wieder still
        assert_eq!(vad.verarbeiten(50.0, ms(basis, 0)), None);
        assert_eq!(vad.verarbeiten(50.0, ms(basis, 100)), None);
        assert_eq!(vad.verarbeiten(0.0, ms(basis, 200)), None);
        assert!(!vad.ist_aktiv(), "Spitze unter min_sprech_dauer aktiviert nicht");
    }

    #[test]
    fn stille_timeout_haelt_aktiv_bis_zur_grenze() {
        let mut vad = Vad::neu(sofort_config());
        let basis = Instant::now();

        // Aktivieren
        vad.verarbeiten(50.0, ms(basis, 0));
        assert_eq!(vad.verarbeiten(50.0, ms(basis, 300)), Some(true));

        // Stille: eine Millisekunde vor dem Timeout noch aktiv
        assert_eq!(vad.verarbeiten(0.0, ms(basis, 300 + 999)), None);
        assert!(vad.ist_aktiv());

        // Eine Millisekunde nach dem Timeout inaktiv
        assert_eq!(vad.verarbeiten(0.0, ms(basis, 300 + 1001)), Some(false));
        assert!(!vad.ist_aktiv());
    }

    #[test]
    fn atempause_zerhackt_nicht() {
        let mut vad = Vad::neu(sofort_config());
        let basis = Instant::now();

        vad.verarbeiten(50.0, ms(basis, 0));
        assert_eq!(vad.verarbeiten(50.0, ms(basis, 300)), Some(true));

        // Kurze Pause unterhalb des Timeouts, dann wieder Sprache
        assert_eq!(vad.verarbeiten(0.0, ms(basis, 600)), None);
        assert_eq!(vad.verarbeiten(50.0, ms(basis, 800)), None);
        assert!(vad.ist_aktiv(), "Kurze Pause darf nicht deaktivieren");
    }

    #[test]
    fn glaettung_daempft_einzelne_spitze() {
        let mut vad = Vad::neu(VadConfig::default());
        let basis = Instant::now();

        // Eine einzelne laute Spitze in sonst leisem Signal
        vad.verarbeiten(100.0, basis);
        // Fenster-Durchschnitt 100, aber Glaettung 0.75 ab Startwert 0:
        // geglaettet = 25 – erst die Folge-Samples entscheiden
        for i in 1..10 {
            vad.verarbeiten(0.0, ms(basis, i * 50));
        }
        assert!(
            vad.geglaetteter_pegel() < 50.0,
            "Glaettung muss Einzelspitzen daempfen"
        );
    }

    #[test]
    fn zuruecksetzen_loescht_zustand() {
        let mut vad = Vad::neu(sofort_config());
        let basis = Instant::now();
        vad.verarbeiten(50.0, ms(basis, 0));
        vad.verarbeiten(50.0, ms(basis, 300));
        assert!(vad.ist_aktiv());

        vad.zuruecksetzen();
        assert!(!vad.ist_aktiv());
        assert_eq!(vad.geglaetteter_pegel(), 0.0);
    }

    #[test]
    fn config_aus_json_mit_defaults() {
        let config: VadConfig = serde_json::from_str(r#"{"schwelle": 15.0}"#).unwrap();
        assert_eq!(config.schwelle, 15.0);
        assert_eq!(config.stille_timeout_ms, 1000);
        assert_eq!(config.fenster_groesse, 10);
    }
}
