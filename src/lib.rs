// SPDX-License-Identifier: GPL-3.0-only

//! qrsnap - a terminal QR code scanner
//!
//! This library provides the core functionality for the qrsnap scanner,
//! including camera capture, per-frame QR detection, the confirmation
//! prompt flow, and photo capture.
//!
//! # Architecture
//!
//! The crate is organized into several modules:
//!
//! - [`backend`]: GStreamer capture pipeline and V4L2 device handling
//! - [`session`]: Owned capture session lifecycle
//! - [`scanner`]: Barcode detection and QR filtering
//! - [`prompt`]: Detection prompt state machine
//! - [`photo`]: Photo capture pipeline and lifecycle callbacks
//! - [`config`]: User configuration handling
//! - [`storage`]: Photo file naming and save locations
//! - [`terminal`]: The interactive scanner UI

pub mod backend;
pub mod cli;
pub mod config;
pub mod constants;
pub mod errors;
pub mod photo;
pub mod prompt;
pub mod scanner;
pub mod session;
pub mod storage;
pub mod terminal;

// Re-export commonly used types
pub use backend::{CameraDevice, CameraFormat, CameraFrame, PixelFormat};
pub use config::Config;
pub use photo::{PhotoPipeline, PhotoSink};
pub use prompt::{PromptChoice, PromptController, PromptOutcome, PromptState};
pub use scanner::{BarcodeScanner, Detection, Observation, QrDetector, Symbology};
pub use session::{CaptureSession, FrameSource, SessionState};
