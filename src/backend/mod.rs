// SPDX-License-Identifier: GPL-3.0-only

//! Camera backend: device discovery, controls, and the capture pipeline

pub mod pipeline;
pub mod types;
pub mod v4l2;

pub use pipeline::CameraPipeline;
pub use types::{CameraDevice, CameraFormat, CameraFrame, FrameReceiver, FrameSender, PixelFormat};
pub use v4l2::{FocusOutcome, apply_continuous_autofocus, enumerate_devices};
