//! Pegel-Messung auf der 0..100-Skala
//!
//! Verbindet die Sample-Welt der Pipeline (f32, -1.0..1.0) mit der
//! Pegel-Welt der VAD-Engine (0..100).

use crate::pipeline::AudioProcessor;

/// Berechnet den Pegel eines Frames als RMS, skaliert auf 0..100
pub fn pegel_aus_samples(samples: &[f32]) -> f32 {
    if samples.is_empty() {
        return 0.0;
    }
    let quadratsumme: f32 = samples.iter().map(|s| s * s).sum();
    let rms = (quadratsumme / samples.len() as f32).sqrt();
    (rms * 100.0).clamp(0.0, 100.0)
}

/// Pegel-Sonde fuer die Pipeline
///
/// Rein analytischer Prozessor: misst den Pegel jedes Frames und
/// meldet ihn an einen Konsumenten (typisch die VAD-Engine), ohne
/// die Samples zu veraendern.
pub struct PegelSonde {
    meldung: Box<dyn FnMut(f32) + Send>,
    letzter_pegel: f32,
    enabled: bool,
}

impl PegelSonde {
    pub fn neu(meldung: impl FnMut(f32) + Send + 'static) -> Self {
        Self {
            meldung: Box::new(meldung),
            letzter_pegel: 0.0,
            enabled: true,
        }
    }

    /// Pegel des zuletzt verarbeiteten Frames
    pub fn letzter_pegel(&self) -> f32 {
        self.letzter_pegel
    }
}

impl AudioProcessor for PegelSonde {
    fn process(&mut self, samples: &mut [f32]) {
        if !self.enabled {
            return;
        }
        self.letzter_pegel = pegel_aus_samples(samples);
        (self.meldung)(self.letzter_pegel);
    }

    fn reset(&mut self) {
        self.letzter_pegel = 0.0;
    }

    fn is_enabled(&self) -> bool {
        self.enabled
    }

    fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }
}
