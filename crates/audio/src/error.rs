//! Fehlertypen fuer die Audio-Schicht

use thiserror::Error;

/// Alle moeglichen Fehler der Audio-Schicht
#[derive(Debug, Error)]
pub enum AudioError {
    #[error("Pipeline nicht verbunden")]
    NichtVerbunden,

    #[error("Pipeline bereits verbunden")]
    BereitsVerbunden,
}

pub type AudioResult<T> = Result<T, AudioError>;
