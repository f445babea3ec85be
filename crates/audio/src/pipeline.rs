//! Lineare Audio-Pipeline: Quelle -> [Prozessor] -> Senke
//!
//! Abstrahiert den plattformspezifischen Audio-Graphen als explizit
//! verbindbare Kette. Verbinden, Trennen und Abbau sind eigene
//! Operationen, damit Lebenszyklus und Aufraeumen testbar bleiben –
//! derselbe Vertrag laesst sich mit jeder Plattform-Audio-API erfuellen.

use crate::error::{AudioError, AudioResult};

/// Liefert Frames, z.B. ein Mikrofon oder ein Remote-Stream
pub trait AudioSource: Send {
    /// Fuellt den Puffer mit Samples, gibt die gelesene Anzahl zurueck
    ///
    /// 0 bedeutet: aktuell keine Daten, die Quelle lebt aber weiter.
    fn lesen(&mut self, puffer: &mut [f32]) -> usize;
}

/// Verarbeitet Samples in-place, rein analytische Stufen lassen sie
/// unveraendert
pub trait AudioProcessor: Send {
    fn process(&mut self, samples: &mut [f32]);

    /// Setzt den internen Zustand zurueck (z.B. Filter-Historie)
    fn reset(&mut self);

    fn is_enabled(&self) -> bool;

    fn set_enabled(&mut self, enabled: bool);
}

/// Nimmt verarbeitete Frames entgegen, z.B. ein Lautsprecher oder
/// ein Encoder
pub trait AudioSink: Send {
    fn schreiben(&mut self, samples: &[f32]);
}

/// Lineare Verarbeitungskette mit explizitem Lebenszyklus
pub struct AudioPipeline {
    quelle: Option<Box<dyn AudioSource>>,
    prozessoren: Vec<Box<dyn AudioProcessor>>,
    senke: Option<Box<dyn AudioSink>>,
}

impl AudioPipeline {
    /// Erstellt eine unverbundene Pipeline mit der gegebenen
    /// Prozessor-Kette
    pub fn neu(prozessoren: Vec<Box<dyn AudioProcessor>>) -> Self {
        Self {
            quelle: None,
            prozessoren,
            senke: None,
        }
    }

    /// Leere Pipeline ohne Prozessoren
    pub fn leer() -> Self {
        Self::neu(Vec::new())
    }

    /// Verbindet Quelle und Senke mit der Kette
    pub fn verbinden(
        &mut self,
        quelle: Box<dyn AudioSource>,
        senke: Box<dyn AudioSink>,
    ) -> AudioResult<()> {
        if self.ist_verbunden() {
            return Err(AudioError::BereitsVerbunden);
        }
        self.quelle = Some(quelle);
        self.senke = Some(senke);
        tracing::debug!(stufen = self.prozessoren.len(), "Pipeline verbunden");
        Ok(())
    }

    /// Trennt Quelle und Senke, die Prozessor-Kette bleibt bestehen
    pub fn trennen(&mut self) {
        self.quelle = None;
        self.senke = None;
    }

    /// Baut die Pipeline vollstaendig ab: trennen und alle Prozessoren
    /// zuruecksetzen, idempotent
    pub fn abbauen(&mut self) {
        self.trennen();
        for p in self.prozessoren.iter_mut() {
            p.reset();
        }
        tracing::debug!("Pipeline abgebaut");
    }

    /// Ob Quelle und Senke verbunden sind
    pub fn ist_verbunden(&self) -> bool {
        self.quelle.is_some() && self.senke.is_some()
    }

    /// Pumpt einen Frame von der Quelle durch die Kette in die Senke
    ///
    /// Gibt die Anzahl verarbeiteter Samples zurueck; 0 wenn die Quelle
    /// gerade nichts liefert.
    pub fn pumpen(&mut self, puffer: &mut [f32]) -> AudioResult<usize> {
        let (Some(quelle), Some(senke)) = (self.quelle.as_mut(), self.senke.as_mut()) else {
            return Err(AudioError::NichtVerbunden);
        };

        let gelesen = quelle.lesen(puffer);
        if gelesen == 0 {
            return Ok(0);
        }

        let frame = &mut puffer[..gelesen];
        for prozessor in self.prozessoren.iter_mut() {
            if prozessor.is_enabled() {
                prozessor.process(frame);
            }
        }

        senke.schreiben(frame);
        Ok(gelesen)
    }

    /// Fuegt einen Prozessor am Ende der Kette ein
    pub fn anfuegen(&mut self, prozessor: Box<dyn AudioProcessor>) {
        self.prozessoren.push(prozessor);
    }

    /// Anzahl der Prozessoren in der Kette
    pub fn stufen(&self) -> usize {
        self.prozessoren.len()
    }

    /// Aktiviert oder deaktiviert alle Prozessoren
    pub fn alle_aktivieren(&mut self, enabled: bool) {
        for p in self.prozessoren.iter_mut() {
            p.set_enabled(enabled);
        }
    }
}
