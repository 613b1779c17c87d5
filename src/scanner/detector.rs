// SPDX-License-Identifier: GPL-3.0-only

//! QR code detection
//!
//! Converts camera frames to greyscale, downscales them for real-time
//! processing, and runs rqrr grid detection. Detection is synchronous and
//! runs inside the caller's loop iteration.

use super::{BarcodeScanner, Observation, Symbology};
use crate::backend::{CameraFrame, PixelFormat};
use crate::constants::detector;
use crate::errors::DetectError;
use tracing::{debug, trace};

/// QR code detector
///
/// Frames larger than `max_dimension` on either axis are downscaled
/// before detection; QR finder patterns survive aggressive downscaling
/// and smaller inputs keep per-frame cost low.
pub struct QrDetector {
    max_dimension: u32,
}

impl Default for QrDetector {
    fn default() -> Self {
        Self::new()
    }
}

impl QrDetector {
    /// Create a new detector with the default processing dimension
    pub fn new() -> Self {
        Self {
            max_dimension: detector::MAX_DIMENSION,
        }
    }

    /// Create a detector with a custom max processing dimension
    pub fn with_max_dimension(max_dimension: u32) -> Self {
        Self {
            max_dimension: max_dimension.max(1),
        }
    }
}

impl BarcodeScanner for QrDetector {
    fn scan(&self, frame: &CameraFrame) -> Result<Vec<Observation>, DetectError> {
        let start = std::time::Instant::now();

        // A structurally empty frame is dropped silently; a nonempty
        // buffer that stops short of the claimed dimensions is malformed
        // and surfaced to the caller
        let Some(luma) = LumaImage::from_frame(frame, self.max_dimension) else {
            if frame.width == 0 || frame.height == 0 || frame.data.is_empty() {
                debug!(
                    width = frame.width,
                    height = frame.height,
                    "Frame has no pixel data, dropping"
                );
                return Ok(Vec::new());
            }
            return Err(DetectError::DetectionFailed(format!(
                "frame buffer truncated: {} bytes for {}x{} (stride {})",
                frame.data.len(),
                frame.width,
                frame.height,
                frame.stride,
            )));
        };

        let conversion_time = start.elapsed();

        let mut prepared = rqrr::PreparedImage::prepare_from_greyscale(
            luma.width as usize,
            luma.height as usize,
            |x, y| luma.data[y * luma.width as usize + x],
        );

        let grids = prepared.detect_grids();
        trace!(
            count = grids.len(),
            proc_width = luma.width,
            proc_height = luma.height,
            conversion_us = conversion_time.as_micros(),
            detect_us = (start.elapsed() - conversion_time).as_micros(),
            "Grid detection complete"
        );

        let mut observations = Vec::with_capacity(grids.len());
        for grid in grids {
            match grid.decode() {
                Ok((_meta, content)) => {
                    debug!(content = %content, "Decoded QR code");
                    observations.push(Observation {
                        symbology: Symbology::Qr,
                        payload: Some(content),
                    });
                }
                Err(e) => {
                    // Located a grid but could not decode it; skip this
                    // symbol, keep the rest of the frame's results
                    debug!(error = %e, "Failed to decode QR grid");
                }
            }
        }

        Ok(observations)
    }
}

/// Greyscale image extracted from a camera frame
struct LumaImage {
    data: Vec<u8>,
    width: u32,
    height: u32,
}

impl LumaImage {
    /// Convert a frame to greyscale, downscaling to `max_dimension`
    ///
    /// Returns None when the buffer does not cover the full image extent
    /// implied by the frame's dimensions and stride.
    fn from_frame(frame: &CameraFrame, max_dimension: u32) -> Option<Self> {
        if frame.width == 0 || frame.height == 0 {
            return None;
        }
        let row_len = (frame.width * frame.format.bytes_per_pixel()) as usize;
        let required = (frame.stride * (frame.height - 1)) as usize + row_len;
        if frame.data.len() < required {
            return None;
        }

        let (dst_width, dst_height) = if frame.width > max_dimension
            || frame.height > max_dimension
        {
            let scale = (frame.width as f32 / max_dimension as f32)
                .max(frame.height as f32 / max_dimension as f32);
            (
                ((frame.width as f32 / scale) as u32).max(1),
                ((frame.height as f32 / scale) as u32).max(1),
            )
        } else {
            (frame.width, frame.height)
        };

        let x_ratio = frame.width as f32 / dst_width as f32;
        let y_ratio = frame.height as f32 / dst_height as f32;

        let mut data = Vec::with_capacity((dst_width * dst_height) as usize);
        for y in 0..dst_height {
            let src_y = (y as f32 * y_ratio) as u32;
            for x in 0..dst_width {
                let src_x = (x as f32 * x_ratio) as u32;
                data.push(luma_at(frame, src_x, src_y));
            }
        }

        Some(Self {
            data,
            width: dst_width,
            height: dst_height,
        })
    }
}

/// BT.601 luma for a single pixel
fn luma_at(frame: &CameraFrame, x: u32, y: u32) -> u8 {
    match frame.format {
        PixelFormat::Gray8 => {
            let idx = (y * frame.stride + x) as usize;
            frame.data.get(idx).copied().unwrap_or(0)
        }
        PixelFormat::RGBA | PixelFormat::RGB24 => {
            let (r, g, b) = frame.sample_rgb(x, y);
            ((r as u32 * 299 + g as u32 * 587 + b as u32 * 114) / 1000) as u8
        }
    }
}
