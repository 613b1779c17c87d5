// SPDX-License-Identifier: GPL-3.0-only

//! Application-wide constants

/// GStreamer pipeline constants
pub mod pipeline {
    /// Maximum buffer queue size (keep small for low latency)
    pub const MAX_BUFFERS: u32 = 2;

    /// Frame channel capacity between the pipeline and the session
    pub const FRAME_CHANNEL_CAPACITY: usize = 10;

    /// Output pixel format for appsink
    /// RGBA uses 4 bytes/pixel - native RGB for simplified processing
    pub const OUTPUT_FORMAT: &str = "RGBA";

    /// Get number of threads for videoconvert based on available CPU threads
    pub fn videoconvert_threads() -> u32 {
        std::thread::available_parallelism()
            .map(|n| n.get() as u32)
            .unwrap_or(4) // Fallback to 4 if detection fails
    }
}

/// Timing constants
pub mod timing {
    /// Frame counter modulo for periodic logging
    pub const FRAME_LOG_INTERVAL: u64 = 30;

    /// Pipeline playing state timeout on start
    pub const START_TIMEOUT_SECS: u64 = 5;

    /// Pipeline state change timeout on stop
    pub const STOP_TIMEOUT_SECS: u64 = 2;

    /// Terminal input poll interval in milliseconds (~60Hz)
    pub const POLL_INTERVAL_MS: u64 = 16;
}

/// Capture format defaults
pub mod capture {
    /// Default capture width; QR codes do not need high resolution and
    /// lower resolutions keep per-frame detection fast
    pub const DEFAULT_WIDTH: u32 = 640;

    /// Default capture height
    pub const DEFAULT_HEIGHT: u32 = 480;

    /// Default framerate
    pub const DEFAULT_FRAMERATE: u32 = 30;
}

/// Detector constants
pub mod detector {
    /// Maximum dimension for detection; larger frames are downscaled first
    pub const MAX_DIMENSION: u32 = 640;
}

/// Photo capture constants
pub mod photo {
    /// Default JPEG quality (0-100)
    pub const DEFAULT_JPEG_QUALITY: u8 = 92;

    /// Folder name under the pictures directory for saved captures
    pub const SAVE_FOLDER: &str = "QRSnap";
}
