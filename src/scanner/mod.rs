// SPDX-License-Identifier: GPL-3.0-only

//! Frame analysis: barcode observations and the QR symbology filter
//!
//! The detector produces [`Observation`]s tagged with a [`Symbology`];
//! only QR observations with a non-empty payload survive [`filter_qr`]
//! and reach the prompt controller. Payloads are frame-scoped and not
//! deduplicated, so the same code can surface on every frame until the
//! user responds.

pub mod detector;

pub use detector::QrDetector;

use crate::backend::CameraFrame;
use crate::errors::DetectError;

/// Encoding standard of a scanned barcode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Symbology {
    /// QR two-dimensional code
    Qr,
    /// EAN-13 linear barcode
    Ean13,
    /// Code 128 linear barcode
    Code128,
}

/// A decoded barcode observation from one frame
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Observation {
    pub symbology: Symbology,
    /// Decoded string payload; None when the symbol was located but the
    /// payload could not be extracted as text
    pub payload: Option<String>,
}

/// A QR payload that passed the symbology filter
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Detection {
    pub payload: String,
}

/// Barcode detection capability
///
/// Accepts a frame and returns zero or more observations. Detector errors
/// surface as a single error value; the caller logs and drops the frame.
pub trait BarcodeScanner {
    fn scan(&self, frame: &CameraFrame) -> Result<Vec<Observation>, DetectError>;
}

/// Keep only QR observations with a non-empty decoded payload
pub fn filter_qr(observations: Vec<Observation>) -> Vec<Detection> {
    observations
        .into_iter()
        .filter(|obs| obs.symbology == Symbology::Qr)
        .filter_map(|obs| obs.payload)
        .filter(|payload| !payload.is_empty())
        .map(|payload| Detection { payload })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filter_keeps_only_qr() {
        let observations = vec![
            Observation {
                symbology: Symbology::Qr,
                payload: Some("HELLO".to_string()),
            },
            Observation {
                symbology: Symbology::Ean13,
                payload: Some("123456".to_string()),
            },
        ];

        let detections = filter_qr(observations);
        assert_eq!(detections.len(), 1);
        assert_eq!(detections[0].payload, "HELLO");
    }

    #[test]
    fn test_filter_drops_empty_payloads() {
        let observations = vec![
            Observation {
                symbology: Symbology::Qr,
                payload: Some(String::new()),
            },
            Observation {
                symbology: Symbology::Qr,
                payload: None,
            },
        ];

        assert!(filter_qr(observations).is_empty());
    }
}
