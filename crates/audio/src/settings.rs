//! Audio-Constraints der Aufruferschicht
//!
//! Opakes Durchreich-Objekt mit den anerkannten Optionen. Die Semantik
//! wird hier nicht validiert, nur die Struktur – die Plattform-Schicht
//! entscheidet, was sie davon umsetzen kann.

use serde::{Deserialize, Serialize};

/// Constraints fuer die Capture-Konfiguration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct AudioConstraints {
    pub echo_cancellation: bool,
    pub noise_suppression: bool,
    pub auto_gain_control: bool,
    pub sample_rate: u32,
    pub sample_size: u16,
    pub channel_count: u16,
}

impl Default for AudioConstraints {
    fn default() -> Self {
        Self {
            echo_cancellation: true,
            noise_suppression: true,
            auto_gain_control: true,
            sample_rate: 48_000,
            sample_size: 16,
            channel_count: 1,
        }
    }
}
