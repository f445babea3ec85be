//! Signal-Relay – Leitet Verhandlungs-Signale zwischen Verbindungen weiter
//!
//! Der Relay interpretiert Signalinhalte nie: SDP und ICE-Kandidaten sind
//! opake Nutzlast. Er stempelt lediglich den Absender (`from` kommt immer
//! vom Relay, nie vom Client) und stellt ueber die Send-Queue des Ziels zu.
//!
//! ## Zustell-Semantik
//! - Unbekanntes Ziel: Signal wird stillschweigend verworfen. Der Sender
//!   wird nicht benachrichtigt; der wartende Peer laeuft clientseitig in
//!   seinen Timeout.
//! - Selbst-Signal: immer ungueltig, als No-Op behandelt.
//! - Reihenfolge: Signale desselben (from, to)-Paars kommen in Sendereihenfolge
//!   an, da der Handler pro Verbindung sequenziell arbeitet und pro Ziel in
//!   eine FIFO-Queue einreiht. Zwischen verschiedenen Paaren gibt es keine
//!   Garantie.

use funkraum_core::types::ConnectionId;
use funkraum_protocol::message::{IncomingSignal, RelayMessage, RelayPayload, SignalRequest};

use crate::error::{SignalingError, SignalingResult};
use crate::registry::ConnectionRegistry;

/// Leitet Signale anhand der Ziel-ConnectionId weiter
#[derive(Clone)]
pub struct SignalRelay {
    registry: ConnectionRegistry,
}

impl SignalRelay {
    /// Erstellt einen neuen SignalRelay
    pub fn neu(registry: ConnectionRegistry) -> Self {
        Self { registry }
    }

    /// Stellt ein Signal vom Absender an das angefragte Ziel zu
    ///
    /// Alle Fehlschlaege sind gutartig (`ist_gutartig`) und werden vom
    /// Aufrufer absorbiert, nie an die Socket-Schicht weitergereicht.
    pub fn weiterleiten(
        &self,
        from: ConnectionId,
        request: SignalRequest,
    ) -> SignalingResult<()> {
        if request.to == from {
            tracing::debug!(connection_id = %from, "Selbst-Signal verworfen");
            return Err(SignalingError::UngueltigeOperation(
                "Signal an die eigene Verbindung".into(),
            ));
        }

        let art = request.signal.art();
        let nachricht = RelayMessage::broadcast(RelayPayload::IncomingSignal(IncomingSignal {
            from,
            signal: request.signal,
        }));

        if self.registry.senden(&request.to, nachricht) {
            tracing::trace!(from = %from, to = %request.to, art, "Signal zugestellt");
            Ok(())
        } else {
            // Ziel weg oder Queue tot: aus Sendersicht dasselbe
            tracing::debug!(from = %from, to = %request.to, art, "Signal-Ziel nicht erreichbar – verworfen");
            Err(SignalingError::Zustellung(format!(
                "Signal-Ziel {} nicht erreichbar",
                request.to
            )))
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use funkraum_protocol::signal::SignalPayload;

    fn offer(sdp: &str) -> SignalPayload {
        SignalPayload::Offer { sdp: sdp.into() }
    }

    #[tokio::test]
    async fn zustellung_stempelt_absender() {
        let registry = ConnectionRegistry::neu();
        let relay = SignalRelay::neu(registry.clone());
        let (a, _rx_a) = registry.registrieren();
        let (b, mut rx_b) = registry.registrieren();

        relay
            .weiterleiten(
                a,
                SignalRequest {
                    to: b,
                    signal: offer("v=0"),
                },
            )
            .unwrap();

        let empfangen = rx_b.try_recv().expect("B muss das Signal erhalten");
        match empfangen.payload {
            RelayPayload::IncomingSignal(s) => {
                assert_eq!(s.from, a, "from ist vom Relay gestempelt");
                assert_eq!(s.signal, offer("v=0"));
            }
            other => panic!("Erwartet IncomingSignal, erhalten: {:?}", other),
        }
    }

    #[tokio::test]
    async fn fifo_pro_paar() {
        let registry = ConnectionRegistry::neu();
        let relay = SignalRelay::neu(registry.clone());
        let (a, _rx_a) = registry.registrieren();
        let (b, mut rx_b) = registry.registrieren();

        for i in 0..10 {
            relay
                .weiterleiten(
                    a,
                    SignalRequest {
                        to: b,
                        signal: SignalPayload::Candidate {
                            candidate: format!("candidate-{i}"),
                        },
                    },
                )
                .unwrap();
        }

        for i in 0..10 {
            let msg = rx_b.try_recv().unwrap();
            match msg.payload {
                RelayPayload::IncomingSignal(s) => match s.signal {
                    SignalPayload::Candidate { candidate } => {
                        assert_eq!(candidate, format!("candidate-{i}"), "Sendereihenfolge erhalten");
                    }
                    other => panic!("Erwartet Candidate, erhalten: {:?}", other),
                },
                other => panic!("Erwartet IncomingSignal, erhalten: {:?}", other),
            }
        }
    }

    #[tokio::test]
    async fn selbst_signal_ist_noop() {
        let registry = ConnectionRegistry::neu();
        let relay = SignalRelay::neu(registry.clone());
        let (a, mut rx_a) = registry.registrieren();

        let result = relay.weiterleiten(
            a,
            SignalRequest {
                to: a,
                signal: offer("v=0"),
            },
        );

        assert!(matches!(
            result,
            Err(SignalingError::UngueltigeOperation(_))
        ));
        assert!(result.unwrap_err().ist_gutartig());
        assert!(rx_a.try_recv().is_err(), "Nichts darf bei A ankommen");
    }

    #[tokio::test]
    async fn unbekanntes_ziel_wird_still_verworfen() {
        let registry = ConnectionRegistry::neu();
        let relay = SignalRelay::neu(registry.clone());
        let (a, mut rx_a) = registry.registrieren();

        let result = relay.weiterleiten(
            a,
            SignalRequest {
                to: ConnectionId::new(),
                signal: offer("v=0"),
            },
        );

        let fehler = result.unwrap_err();
        assert!(fehler.ist_gutartig(), "Zustellungsfehler ist gutartig");
        assert!(rx_a.try_recv().is_err(), "Sender wird nicht benachrichtigt");
    }
}
