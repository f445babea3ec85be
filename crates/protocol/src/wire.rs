//! Wire-Format fuer TCP-Verbindungen
//!
//! Frame-basiertes Protokoll: Length(u32 big-endian) + JSON-Payload.
//!
//! ## Frame-Format
//!
//! ```text
//! +--------+--------+--------+--------+----...----+
//! | Laenge (u32 BE) | 4 Bytes        | Payload    |
//! +--------+--------+--------+--------+----...----+
//! ```
//!
//! Die Laenge gibt die Anzahl der Payload-Bytes an (ohne die 4 Laengen-Bytes).
//! Maximale Frame-Groesse ist konfigurierbar (Standard: 256 KB – Signale
//! sind klein, grosse Frames deuten auf einen fehlerhaften Client hin).

use bytes::{Buf, BufMut, BytesMut};
use std::io;
use tokio_util::codec::{Decoder, Encoder};

use crate::message::RelayMessage;

// ---------------------------------------------------------------------------
// Konstanten
// ---------------------------------------------------------------------------

/// Standard-maximale Frame-Groesse (256 KB)
pub const DEFAULT_MAX_FRAME_SIZE: usize = 256 * 1024;

/// Groesse des Laengen-Felds in Bytes
pub const LENGTH_FIELD_SIZE: usize = 4;

// ---------------------------------------------------------------------------
// FrameCodec
// ---------------------------------------------------------------------------

/// tokio-util Codec fuer frame-basierte TCP-Verbindungen
///
/// Implementiert `Encoder<RelayMessage>` und `Decoder` fuer nahtlose
/// Integration mit `tokio_util::codec::Framed`.
#[derive(Debug, Clone)]
pub struct FrameCodec {
    /// Maximale erlaubte Frame-Groesse in Bytes
    max_frame_size: usize,
}

impl FrameCodec {
    /// Erstellt einen neuen `FrameCodec` mit Standard-Limits
    pub fn new() -> Self {
        Self {
            max_frame_size: DEFAULT_MAX_FRAME_SIZE,
        }
    }

    /// Erstellt einen `FrameCodec` mit benutzerdefinierter maximaler Frame-Groesse
    pub fn with_max_size(max_frame_size: usize) -> Self {
        Self { max_frame_size }
    }

    /// Gibt die konfigurierte maximale Frame-Groesse zurueck
    pub fn max_frame_size(&self) -> usize {
        self.max_frame_size
    }
}

impl Default for FrameCodec {
    fn default() -> Self {
        Self::new()
    }
}

// ---------------------------------------------------------------------------
// Decoder-Implementierung
// ---------------------------------------------------------------------------

impl Decoder for FrameCodec {
    type Item = RelayMessage;
    type Error = io::Error;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        // Warte auf mindestens 4 Bytes fuer das Laengen-Feld
        if src.len() < LENGTH_FIELD_SIZE {
            return Ok(None);
        }

        // Laenge lesen (big-endian u32) ohne den Buffer zu veraendern
        let length = u32::from_be_bytes([src[0], src[1], src[2], src[3]]) as usize;

        // Maximale Frame-Groesse pruefen
        if length > self.max_frame_size {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                format!(
                    "Frame zu gross: {} Bytes (Maximum: {} Bytes)",
                    length, self.max_frame_size
                ),
            ));
        }

        // Pruefen ob der vollstaendige Frame bereits im Buffer ist
        let total_size = LENGTH_FIELD_SIZE + length;
        if src.len() < total_size {
            // Speicher vorbelegen um Reallocations zu vermeiden
            src.reserve(total_size - src.len());
            return Ok(None);
        }

        // Laengen-Feld verbrauchen
        src.advance(LENGTH_FIELD_SIZE);

        // Payload-Bytes extrahieren
        let payload = src.split_to(length);

        // JSON deserialisieren
        let message: RelayMessage = serde_json::from_slice(&payload).map_err(|e| {
            io::Error::new(
                io::ErrorKind::InvalidData,
                format!("JSON-Deserialisierung fehlgeschlagen: {}", e),
            )
        })?;

        Ok(Some(message))
    }
}

// ---------------------------------------------------------------------------
// Encoder-Implementierung
// ---------------------------------------------------------------------------

impl Encoder<RelayMessage> for FrameCodec {
    type Error = io::Error;

    fn encode(&mut self, item: RelayMessage, dst: &mut BytesMut) -> Result<(), Self::Error> {
        // JSON serialisieren
        let json = serde_json::to_vec(&item).map_err(|e| {
            io::Error::new(
                io::ErrorKind::InvalidData,
                format!("JSON-Serialisierung fehlgeschlagen: {}", e),
            )
        })?;

        // Groesse pruefen
        if json.len() > self.max_frame_size {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                format!(
                    "Nachricht zu gross: {} Bytes (Maximum: {} Bytes)",
                    json.len(),
                    self.max_frame_size
                ),
            ));
        }

        // Laengen-Feld + Payload schreiben
        dst.reserve(LENGTH_FIELD_SIZE + json.len());
        dst.put_u32(json.len() as u32);
        dst.put_slice(&json);

        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
