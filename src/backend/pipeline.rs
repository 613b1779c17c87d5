// SPDX-License-Identifier: GPL-3.0-only

//! GStreamer capture pipeline
//!
//! Builds a v4l2src pipeline that delivers RGBA frames to the session
//! through a bounded channel. `decodebin` handles both raw sensor formats
//! (YUYV, NV12) and encoded ones (MJPEG) without explicit decoder
//! selection. When the channel is full new frames are dropped at the
//! source; nothing queues behind the consumer.

use super::types::{CameraDevice, CameraFormat, CameraFrame, FrameSender, PixelFormat};
use crate::constants::{pipeline, timing};
use crate::errors::CameraError;
use gstreamer::prelude::*;
use gstreamer_app::AppSink;
use gstreamer_video::VideoInfo;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;
use tracing::{debug, error, info, warn};

static FRAME_COUNTER: AtomicU64 = AtomicU64::new(0);

/// gst-launch description for a device and requested capture format
///
/// The caps filter carries the full requested format, framerate included,
/// so the camera negotiates the configured rate rather than its default.
fn launch_description(device: &CameraDevice, format: &CameraFormat) -> String {
    format!(
        "v4l2src device={} ! decodebin ! videoconvert n-threads={} ! videoscale ! \
         video/x-raw,format={},width={},height={},framerate={} ! \
         appsink name=sink",
        device.path,
        pipeline::videoconvert_threads(),
        pipeline::OUTPUT_FORMAT,
        format.width,
        format.height,
        format.framerate.as_gst_fraction(),
    )
}

/// Camera capture pipeline
///
/// Built in the NULL state; frame delivery starts with [`play`] and stops
/// with [`shutdown`]. There is no restart after shutdown.
///
/// [`play`]: CameraPipeline::play
/// [`shutdown`]: CameraPipeline::shutdown
pub struct CameraPipeline {
    pipeline: gstreamer::Pipeline,
    appsink: AppSink,
}

impl CameraPipeline {
    /// Build the pipeline for a device without starting frame delivery
    pub fn build(
        device: &CameraDevice,
        format: &CameraFormat,
        frame_sender: FrameSender,
    ) -> Result<Self, CameraError> {
        info!(device = %device.name, format = %format, "Building capture pipeline");

        gstreamer::init().map_err(|e| CameraError::InitializationFailed(e.to_string()))?;

        let launch = launch_description(device, format);
        debug!(launch = %launch, "Pipeline description");

        let element = gstreamer::parse::launch(&launch)
            .map_err(|e| CameraError::InitializationFailed(e.to_string()))?;
        let gst_pipeline = element.downcast::<gstreamer::Pipeline>().map_err(|_| {
            CameraError::InitializationFailed("Parsed element is not a pipeline".to_string())
        })?;

        let appsink = gst_pipeline
            .by_name("sink")
            .ok_or_else(|| CameraError::InitializationFailed("Failed to get appsink".to_string()))?
            .dynamic_cast::<AppSink>()
            .map_err(|_| CameraError::InitializationFailed("Failed to cast appsink".to_string()))?;

        // Low-latency appsink: keep at most a couple of buffers and drop
        // old frames when the consumer falls behind
        appsink.set_property("sync", false);
        appsink.set_property("max-buffers", pipeline::MAX_BUFFERS);
        appsink.set_property("drop", true);
        appsink.set_property("enable-last-sample", false);

        appsink.set_callbacks(
            gstreamer_app::AppSinkCallbacks::builder()
                .new_sample(move |appsink| {
                    let frame_start = Instant::now();
                    let frame_num = FRAME_COUNTER.fetch_add(1, Ordering::Relaxed);

                    let sample = match appsink.pull_sample() {
                        Ok(s) => s,
                        Err(e) => {
                            if frame_num % timing::FRAME_LOG_INTERVAL == 0 {
                                error!(frame = frame_num, error = ?e, "Failed to pull sample");
                            }
                            return Err(gstreamer::FlowError::Eos);
                        }
                    };

                    let buffer = sample.buffer().ok_or_else(|| {
                        if frame_num % timing::FRAME_LOG_INTERVAL == 0 {
                            error!(frame = frame_num, "No buffer in sample");
                        }
                        gstreamer::FlowError::Error
                    })?;

                    let caps = sample.caps().ok_or_else(|| {
                        if frame_num % timing::FRAME_LOG_INTERVAL == 0 {
                            error!(frame = frame_num, "No caps in sample");
                        }
                        gstreamer::FlowError::Error
                    })?;

                    let video_info = VideoInfo::from_caps(caps).map_err(|e| {
                        if frame_num % timing::FRAME_LOG_INTERVAL == 0 {
                            error!(frame = frame_num, error = ?e, "Failed to get video info");
                        }
                        gstreamer::FlowError::Error
                    })?;

                    let map = buffer.map_readable().map_err(|e| {
                        if frame_num % timing::FRAME_LOG_INTERVAL == 0 {
                            error!(frame = frame_num, error = ?e, "Failed to map buffer");
                        }
                        gstreamer::FlowError::Error
                    })?;

                    let frame = CameraFrame {
                        width: video_info.width(),
                        height: video_info.height(),
                        data: Arc::from(map.as_slice()),
                        format: PixelFormat::RGBA,
                        stride: video_info.stride()[0] as u32,
                        captured_at: frame_start,
                    };

                    let mut sender = frame_sender.clone();
                    match sender.try_send(frame) {
                        Ok(_) => {
                            if frame_num % timing::FRAME_LOG_INTERVAL == 0 {
                                debug!(
                                    frame = frame_num,
                                    total_us = frame_start.elapsed().as_micros(),
                                    width = video_info.width(),
                                    height = video_info.height(),
                                    "Frame delivered"
                                );
                            }
                        }
                        Err(e) => {
                            if frame_num % timing::FRAME_LOG_INTERVAL == 0 {
                                debug!(frame = frame_num, error = ?e, "Frame dropped (channel full)");
                            }
                        }
                    }

                    Ok(gstreamer::FlowSuccess::Ok)
                })
                .build(),
        );

        Ok(Self {
            pipeline: gst_pipeline,
            appsink,
        })
    }

    /// Start frame delivery
    pub fn play(&self) -> Result<(), CameraError> {
        debug!("Setting pipeline to PLAYING state");
        self.pipeline
            .set_state(gstreamer::State::Playing)
            .map_err(|e| CameraError::BackendError(format!("Failed to start pipeline: {}", e)))?;

        let (result, state, pending) = self.pipeline.state(gstreamer::ClockTime::from_seconds(
            timing::START_TIMEOUT_SECS,
        ));
        debug!(result = ?result, state = ?state, pending = ?pending, "Pipeline state");
        if state != gstreamer::State::Playing {
            warn!("Pipeline is not in PLAYING state");
        }

        info!("Capture pipeline started");
        Ok(())
    }

    /// Halt frame delivery and release the camera
    pub fn shutdown(self) {
        info!("Stopping capture pipeline");

        // Clear appsink callbacks to release the frame sender
        self.appsink
            .set_callbacks(gstreamer_app::AppSinkCallbacks::builder().build());

        if let Err(e) = self.pipeline.set_state(gstreamer::State::Null) {
            debug!(error = ?e, "Failed to set pipeline to NULL");
            return;
        }

        let (result, state, _) = self.pipeline.state(gstreamer::ClockTime::from_seconds(
            timing::STOP_TIMEOUT_SECS,
        ));
        match result {
            Ok(_) => info!(state = ?state, "Capture pipeline stopped"),
            Err(e) => debug!(error = ?e, state = ?state, "Pipeline state change had issues"),
        }
    }
}

impl Drop for CameraPipeline {
    fn drop(&mut self) {
        // Release the device immediately even when shutdown() was not called
        self.appsink
            .set_callbacks(gstreamer_app::AppSinkCallbacks::builder().build());
        let _ = self.pipeline.set_state(gstreamer::State::Null);
    }
}
