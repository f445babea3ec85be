//! funkraum-audio – Sprachaktivitaets-Erkennung und Pipeline-Vertrag
//!
//! Clientseitige Audio-Schicht von Funkraum:
//! - VAD: klassifiziert Pegel-Signale in Spricht/Spricht-nicht, mit
//!   Entprellung und Abfallverzoegerung
//! - VadEngine: mehrere Quellen (lokal + Remote-Teilnehmer) parallel
//! - Lineare Pipeline Quelle -> [Prozessor] -> Senke mit explizitem
//!   Lebenszyklus
//! - Pegel-Messung und Durchreich-Constraints fuer die Plattform-Schicht
//!
//! Medientransport und Geraete-I/O liegen ausserhalb dieses Crates.

pub mod engine;
pub mod error;
pub mod pegel;
pub mod pipeline;
pub mod settings;
pub mod vad;

// Bequeme Re-Exporte der wichtigsten Typen
pub use engine::{QuellenId, SprechEvent, VadEngine};
pub use error::{AudioError, AudioResult};
pub use pegel::{pegel_aus_samples, PegelSonde};
pub use pipeline::{AudioPipeline, AudioProcessor, AudioSink, AudioSource};
pub use settings::AudioConstraints;
pub use vad::{Vad, VadConfig};
