// SPDX-License-Identifier: GPL-3.0-only

//! Photo capture pipeline and lifecycle sink
//!
//! A confirmed scan produces exactly one capture request. The pipeline
//! drives an ordered sequence of lifecycle notifications on a
//! [`PhotoSink`] (begin, will-capture, did-capture, finish), then
//! encodes the frame snapshot to JPEG and saves it. Every stage is
//! observational; a finish-stage error is logged by the sink and nothing
//! is retried or surfaced to the user.

use crate::backend::CameraFrame;
use crate::errors::PhotoError;
use crate::storage;
use std::path::{Path, PathBuf};
use tracing::{debug, error, info};

/// Receiver of photo-capture lifecycle notifications
pub trait PhotoSink {
    /// The capture request was accepted
    fn capture_began(&mut self);
    /// The frame snapshot is about to be taken
    fn will_capture(&mut self);
    /// The frame was captured and encoded
    fn did_capture(&mut self);
    /// The capture finished, successfully or not
    fn capture_finished(&mut self, result: Result<&Path, &PhotoError>);
}

/// Photo sink that logs each lifecycle stage
#[derive(Debug, Default)]
pub struct LoggingPhotoSink;

impl PhotoSink for LoggingPhotoSink {
    fn capture_began(&mut self) {
        info!("Photo capture: begin");
    }

    fn will_capture(&mut self) {
        debug!("Photo capture: will capture");
    }

    fn did_capture(&mut self) {
        debug!("Photo capture: did capture");
    }

    fn capture_finished(&mut self, result: Result<&Path, &PhotoError>) {
        match result {
            Ok(path) => info!(path = %path.display(), "Photo capture: finished"),
            Err(e) => error!(error = %e, "Photo capture: finished with error"),
        }
    }
}

/// Photo capture pipeline: snapshot → encode → save
pub struct PhotoPipeline {
    save_dir: PathBuf,
    quality: u8,
}

impl PhotoPipeline {
    /// Create a pipeline saving JPEGs into `save_dir`
    pub fn new(save_dir: PathBuf, quality: u8) -> Self {
        Self { save_dir, quality }
    }

    /// Create a pipeline with the default save directory and quality
    pub fn with_defaults() -> Self {
        Self::new(
            storage::default_photo_dir(),
            crate::constants::photo::DEFAULT_JPEG_QUALITY,
        )
    }

    /// Run one capture request to completion
    ///
    /// Encoding runs on a blocking task; the caller blocks on the future,
    /// which is the intended behavior for the single consumer loop.
    pub async fn capture_and_save(
        &self,
        frame: Option<CameraFrame>,
        sink: &mut dyn PhotoSink,
    ) -> Result<PathBuf, PhotoError> {
        sink.capture_began();

        let Some(frame) = frame else {
            let err = PhotoError::NoFrameAvailable;
            sink.capture_finished(Err(&err));
            return Err(err);
        };

        sink.will_capture();

        let quality = self.quality;
        let encode_result = match tokio::task::spawn_blocking(move || encode_jpeg(&frame, quality))
            .await
        {
            Ok(result) => result,
            Err(e) => Err(PhotoError::EncodingFailed(format!(
                "encode task failed: {}",
                e
            ))),
        };
        let encoded = match encode_result {
            Ok(data) => data,
            Err(e) => {
                sink.capture_finished(Err(&e));
                return Err(e);
            }
        };

        sink.did_capture();

        let save_result = self.save(&encoded).await;
        match &save_result {
            Ok(path) => sink.capture_finished(Ok(path)),
            Err(e) => sink.capture_finished(Err(e)),
        }
        save_result
    }

    async fn save(&self, encoded: &[u8]) -> Result<PathBuf, PhotoError> {
        tokio::fs::create_dir_all(&self.save_dir)
            .await
            .map_err(|e| PhotoError::SaveFailed(e.to_string()))?;

        let path = storage::timestamped_photo_path(&self.save_dir);
        tokio::fs::write(&path, encoded)
            .await
            .map_err(|e| PhotoError::SaveFailed(e.to_string()))?;

        Ok(path)
    }
}

/// Encode a frame as JPEG, removing row stride padding
fn encode_jpeg(frame: &CameraFrame, quality: u8) -> Result<Vec<u8>, PhotoError> {
    let width = frame.width;
    let height = frame.height;
    if width == 0 || height == 0 {
        return Err(PhotoError::EncodingFailed("empty frame".to_string()));
    }

    let mut rgb_data = Vec::with_capacity((width * height * 3) as usize);
    for y in 0..height {
        for x in 0..width {
            let (r, g, b) = frame.sample_rgb(x, y);
            rgb_data.push(r);
            rgb_data.push(g);
            rgb_data.push(b);
        }
    }

    let img: image::RgbImage = image::ImageBuffer::from_raw(width, height, rgb_data)
        .ok_or_else(|| PhotoError::EncodingFailed("pixel data does not match dimensions".to_string()))?;

    let mut buf = Vec::new();
    let mut cursor = std::io::Cursor::new(&mut buf);
    let encoder =
        image::codecs::jpeg::JpegEncoder::new_with_quality(&mut cursor, quality);
    img.write_with_encoder(encoder)
        .map_err(|e| PhotoError::EncodingFailed(e.to_string()))?;

    Ok(buf)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::PixelFormat;
    use std::sync::Arc;
    use std::time::Instant;

    /// Sink that records the order of lifecycle notifications
    #[derive(Default)]
    struct RecordingSink {
        stages: Vec<String>,
    }

    impl PhotoSink for RecordingSink {
        fn capture_began(&mut self) {
            self.stages.push("begin".to_string());
        }

        fn will_capture(&mut self) {
            self.stages.push("will-capture".to_string());
        }

        fn did_capture(&mut self) {
            self.stages.push("did-capture".to_string());
        }

        fn capture_finished(&mut self, result: Result<&Path, &PhotoError>) {
            self.stages
                .push(format!("finish:{}", if result.is_ok() { "ok" } else { "err" }));
        }
    }

    fn test_frame() -> CameraFrame {
        CameraFrame {
            width: 4,
            height: 4,
            data: Arc::from(vec![128u8; 4 * 4 * 4].as_slice()),
            format: PixelFormat::RGBA,
            stride: 16,
            captured_at: Instant::now(),
        }
    }

    fn temp_dir(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!("qrsnap-test-{}-{}", name, std::process::id()))
    }

    #[test]
    fn test_encode_jpeg_produces_data() {
        let data = encode_jpeg(&test_frame(), 92).unwrap();
        assert!(!data.is_empty());
        // JPEG SOI marker
        assert_eq!(&data[..2], &[0xFF, 0xD8]);
    }

    #[test]
    fn test_encode_rejects_empty_frame() {
        let frame = CameraFrame {
            width: 0,
            height: 0,
            data: Arc::from(Vec::new().as_slice()),
            format: PixelFormat::RGBA,
            stride: 0,
            captured_at: Instant::now(),
        };
        assert!(encode_jpeg(&frame, 92).is_err());
    }

    #[tokio::test]
    async fn test_lifecycle_stage_ordering() {
        let dir = temp_dir("lifecycle");
        let pipeline = PhotoPipeline::new(dir.clone(), 92);
        let mut sink = RecordingSink::default();

        let path = pipeline
            .capture_and_save(Some(test_frame()), &mut sink)
            .await
            .unwrap();
        assert!(path.exists());

        assert_eq!(
            sink.stages,
            vec!["begin", "will-capture", "did-capture", "finish:ok"]
        );

        let _ = std::fs::remove_dir_all(dir);
    }

    #[tokio::test]
    async fn test_missing_frame_finishes_with_error() {
        let pipeline = PhotoPipeline::new(temp_dir("noframe"), 92);
        let mut sink = RecordingSink::default();

        let result = pipeline.capture_and_save(None, &mut sink).await;
        assert!(matches!(result, Err(PhotoError::NoFrameAvailable)));
        // No will-capture or did-capture stage when there is no frame
        assert_eq!(sink.stages, vec!["begin", "finish:err"]);
    }
}
