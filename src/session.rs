// SPDX-License-Identifier: GPL-3.0-only

//! Capture session lifecycle
//!
//! One session exists per program run and owns the camera device, the
//! focus configuration, and the capture pipeline as a single aggregate.
//! The lifecycle is strictly one-way:
//!
//! ```text
//! unconfigured → configured → running → stopped
//! ```
//!
//! There is no reconfiguration, no restart after stop, and no handling of
//! camera hot-unplug; a stopped session stays stopped.

use crate::backend::types::FrameReceiver;
use crate::backend::{
    CameraDevice, CameraFormat, CameraFrame, CameraPipeline, FocusOutcome,
    apply_continuous_autofocus, enumerate_devices,
};
use crate::constants::pipeline::FRAME_CHANNEL_CAPACITY;
use crate::errors::{AppError, CameraError, SessionError};
use futures::channel::mpsc;
use tracing::{info, warn};

/// Session lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Unconfigured,
    Configured,
    Running,
    Stopped,
}

/// Source of camera frames for the consumer loop
pub trait FrameSource {
    /// Non-blocking fetch of the next delivered frame, if any
    fn try_frame(&mut self) -> Option<CameraFrame>;
}

/// Owned capture session aggregate
pub struct CaptureSession {
    state: SessionState,
    format: CameraFormat,
    device: Option<CameraDevice>,
    focus: Option<FocusOutcome>,
    pipeline: Option<CameraPipeline>,
    receiver: Option<FrameReceiver>,
}

impl CaptureSession {
    /// Create an unconfigured session for the given capture format
    pub fn new(format: CameraFormat) -> Self {
        Self {
            state: SessionState::Unconfigured,
            format,
            device: None,
            focus: None,
            pipeline: None,
            receiver: None,
        }
    }

    /// Acquire a camera, request continuous autofocus, and build the
    /// capture pipeline
    ///
    /// `preferred_device` selects a device path when present; otherwise
    /// the platform default (first enumerated device) is used. On failure
    /// the session stays unconfigured and the caller decides whether to
    /// continue with a bare preview.
    pub fn configure(&mut self, preferred_device: Option<&str>) -> Result<(), AppError> {
        match self.state {
            SessionState::Unconfigured => {}
            SessionState::Stopped => return Err(SessionError::Stopped.into()),
            _ => return Err(SessionError::AlreadyConfigured.into()),
        }

        let devices = enumerate_devices();
        let device = match preferred_device {
            Some(path) => devices.into_iter().find(|d| d.path == path),
            None => devices.into_iter().next(),
        };
        let Some(device) = device else {
            warn!("No camera devices found");
            return Err(CameraError::NoCameraFound.into());
        };

        // Focus mode is set once, best-effort, before the pipeline exists
        // and is never re-asserted
        let focus = apply_continuous_autofocus(&device.path);
        info!(device = %device.name, focus = ?focus, "Configuring capture session");

        let (sender, receiver) = mpsc::channel(FRAME_CHANNEL_CAPACITY);
        let pipeline = CameraPipeline::build(&device, &self.format, sender)?;

        self.device = Some(device);
        self.focus = Some(focus);
        self.pipeline = Some(pipeline);
        self.receiver = Some(receiver);
        self.state = SessionState::Configured;
        Ok(())
    }

    /// Begin asynchronous frame delivery
    pub fn start(&mut self) -> Result<(), AppError> {
        match self.state {
            SessionState::Configured => {}
            SessionState::Unconfigured => return Err(SessionError::NotConfigured.into()),
            SessionState::Running => return Err(SessionError::AlreadyRunning.into()),
            SessionState::Stopped => return Err(SessionError::Stopped.into()),
        }

        if let Some(pipeline) = &self.pipeline {
            pipeline.play()?;
        }
        self.state = SessionState::Running;
        Ok(())
    }

    /// Halt frame delivery and release the camera; the session cannot be
    /// restarted afterwards
    pub fn stop(&mut self) -> Result<(), SessionError> {
        if self.state != SessionState::Running {
            return Err(SessionError::NotRunning);
        }

        if let Some(pipeline) = self.pipeline.take() {
            pipeline.shutdown();
        }
        self.receiver = None;
        self.state = SessionState::Stopped;
        info!("Capture session stopped");
        Ok(())
    }

    /// Current lifecycle state
    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Whether frames are currently being delivered
    pub fn is_running(&self) -> bool {
        self.state == SessionState::Running
    }

    /// The acquired camera device, once configured
    pub fn device(&self) -> Option<&CameraDevice> {
        self.device.as_ref()
    }

    /// Outcome of the one-time autofocus request, once configured
    pub fn focus_outcome(&self) -> Option<FocusOutcome> {
        self.focus
    }
}

impl FrameSource for CaptureSession {
    fn try_frame(&mut self) -> Option<CameraFrame> {
        if self.state != SessionState::Running {
            return None;
        }
        self.receiver
            .as_mut()
            .and_then(|rx| rx.try_next().ok())
            .flatten()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session() -> CaptureSession {
        CaptureSession::new(CameraFormat::default())
    }

    #[test]
    fn test_new_session_is_unconfigured() {
        let session = session();
        assert_eq!(session.state(), SessionState::Unconfigured);
        assert!(!session.is_running());
        assert!(session.device().is_none());
        assert!(session.focus_outcome().is_none());
    }

    #[test]
    fn test_start_before_configure_is_rejected() {
        let mut session = session();
        match session.start() {
            Err(AppError::Session(SessionError::NotConfigured)) => {}
            other => panic!("expected NotConfigured, got {:?}", other),
        }
        assert_eq!(session.state(), SessionState::Unconfigured);
    }

    #[test]
    fn test_stop_before_start_is_rejected() {
        let mut session = session();
        assert_eq!(session.stop(), Err(SessionError::NotRunning));
    }

    #[test]
    fn test_stopped_session_stays_stopped() {
        let mut session = session();
        // Drive the state machine directly; pipeline-backed transitions
        // need camera hardware
        session.state = SessionState::Running;
        session.stop().unwrap();
        assert_eq!(session.state(), SessionState::Stopped);

        // No restart, no reconfigure
        match session.start() {
            Err(AppError::Session(SessionError::Stopped)) => {}
            other => panic!("expected Stopped, got {:?}", other),
        }
        match session.configure(None) {
            Err(AppError::Session(SessionError::Stopped)) => {}
            other => panic!("expected Stopped, got {:?}", other),
        }
        assert_eq!(session.state(), SessionState::Stopped);
    }

    #[test]
    fn test_running_session_rejects_reconfigure() {
        let mut session = session();
        session.state = SessionState::Running;
        match session.configure(None) {
            Err(AppError::Session(SessionError::AlreadyConfigured)) => {}
            other => panic!("expected AlreadyConfigured, got {:?}", other),
        }
    }

    #[test]
    fn test_no_frames_outside_running_state() {
        let mut session = session();
        assert!(session.try_frame().is_none());
        session.state = SessionState::Stopped;
        assert!(session.try_frame().is_none());
    }
}
