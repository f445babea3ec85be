//! VAD-Engine – Sprachaktivitaet fuer mehrere Quellen gleichzeitig
//!
//! Verwaltet pro ueberwachter Quelle einen eigenen [`Vad`]-Zustand und
//! meldet Zustandswechsel ueber einen crossbeam-Kanal. Quellen sind
//! unabhaengig voneinander; das Stoppen einer Quelle beendet ihre
//! Ereignisse deterministisch, auch wenn Samples von einem anderen
//! Thread eintreffen.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

use chrono::{DateTime, Utc};
use crossbeam_channel::{unbounded, Receiver, Sender};
use parking_lot::Mutex;

use funkraum_core::types::ConnectionId;

use crate::vad::{Vad, VadConfig};

/// Bezeichnet eine ueberwachte Audio-Quelle
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum QuellenId {
    /// Das lokale Mikrofon
    Lokal,
    /// Der Remote-Stream eines Raum-Teilnehmers
    Verbindung(ConnectionId),
}

impl std::fmt::Display for QuellenId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Lokal => write!(f, "lokal"),
            Self::Verbindung(id) => write!(f, "{id}"),
        }
    }
}

/// Zustandswechsel-Ereignis einer Quelle
///
/// Wird nur bei einem booleschen Uebergang emittiert, nie pro Sample.
#[derive(Debug, Clone)]
pub struct SprechEvent {
    pub quelle: QuellenId,
    pub aktiv: bool,
    pub volumen: f32,
    pub zeitstempel: DateTime<Utc>,
}

struct Inner {
    config: VadConfig,
    quellen: Mutex<HashMap<QuellenId, Vad>>,
    event_tx: Sender<SprechEvent>,
}

/// Engine fuer Sprachaktivitaets-Erkennung, Clone teilt den Zustand
#[derive(Clone)]
pub struct VadEngine {
    inner: Arc<Inner>,
}

impl VadEngine {
    /// Erstellt eine Engine samt Event-Empfaenger
    pub fn neu(config: VadConfig) -> (Self, Receiver<SprechEvent>) {
        let (event_tx, event_rx) = unbounded();
        (
            Self {
                inner: Arc::new(Inner {
                    config,
                    quellen: Mutex::new(HashMap::new()),
                    event_tx,
                }),
            },
            event_rx,
        )
    }

    /// Beginnt die Ueberwachung einer Quelle
    ///
    /// Eine bereits ueberwachte Quelle behaelt ihren Zustand (No-Op).
    pub fn quelle_starten(&self, quelle: QuellenId) {
        let mut quellen = self.inner.quellen.lock();
        quellen
            .entry(quelle.clone())
            .or_insert_with(|| Vad::neu(self.inner.config.clone()));
        tracing::debug!(quelle = %quelle, "VAD-Ueberwachung gestartet");
    }

    /// Beendet die Ueberwachung einer Quelle und verwirft ihren Zustand
    ///
    /// Nach der Rueckkehr emittiert die Quelle keine Ereignisse mehr.
    pub fn quelle_stoppen(&self, quelle: &QuellenId) {
        if self.inner.quellen.lock().remove(quelle).is_some() {
            tracing::debug!(quelle = %quelle, "VAD-Ueberwachung gestoppt");
        }
    }

    /// Anzahl der aktuell ueberwachten Quellen
    pub fn quellen_anzahl(&self) -> usize {
        self.inner.quellen.lock().len()
    }

    /// Ob eine Quelle aktuell als sprechend gilt
    pub fn ist_aktiv(&self, quelle: &QuellenId) -> bool {
        self.inner
            .quellen
            .lock()
            .get(quelle)
            .map(|vad| vad.ist_aktiv())
            .unwrap_or(false)
    }

    /// Meldet ein Pegel-Sample (0..100) fuer eine Quelle
    pub fn pegel_melden(&self, quelle: &QuellenId, volumen: f32) {
        self.pegel_melden_um(quelle, volumen, Instant::now());
    }

    /// Wie [`pegel_melden`](Self::pegel_melden), mit injiziertem Zeitpunkt
    pub fn pegel_melden_um(&self, quelle: &QuellenId, volumen: f32, jetzt: Instant) {
        let uebergang = {
            let mut quellen = self.inner.quellen.lock();
            match quellen.get_mut(quelle) {
                Some(vad) => vad.verarbeiten(volumen, jetzt),
                // Nicht ueberwachte Quelle, Sample verwerfen
                None => return,
            }
        };

        if let Some(aktiv) = uebergang {
            let event = SprechEvent {
                quelle: quelle.clone(),
                aktiv,
                volumen,
                zeitstempel: Utc::now(),
            };
            tracing::trace!(quelle = %quelle, aktiv, "Sprechzustand gewechselt");
            // Empfaenger weg heisst niemand hoert mehr zu, kein Fehler
            let _ = self.inner.event_tx.send(event);
        }
    }

    /// Beendet die Ueberwachung aller Quellen
    pub fn alle_stoppen(&self) {
        self.inner.quellen.lock().clear();
        tracing::debug!("Alle VAD-Quellen gestoppt");
    }
}
