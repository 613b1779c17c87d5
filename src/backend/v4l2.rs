// SPDX-License-Identifier: GPL-3.0-only

//! V4L2 device enumeration and camera controls
//!
//! Provides camera discovery by scanning `/dev/video*` nodes and a small
//! control interface used to request continuous autofocus before capture.
//!
//! Inspired by [cameractrls](https://github.com/soyersoyer/cameractrls).

use super::types::CameraDevice;
use std::fs::File;
use std::os::unix::io::{AsRawFd, RawFd};
use tracing::{debug, warn};

// ===== V4L2 Control Class Bases =====
const V4L2_CTRL_CLASS_CAMERA: u32 = 0x009a0000;
const V4L2_CID_CAMERA_CLASS_BASE: u32 = V4L2_CTRL_CLASS_CAMERA | 0x900;

/// Auto focus enable; on UVC cameras this is the continuous autofocus mode
pub const V4L2_CID_FOCUS_AUTO: u32 = V4L2_CID_CAMERA_CLASS_BASE + 12;

// ===== V4L2 Capability Flags =====
const V4L2_CAP_VIDEO_CAPTURE: u32 = 0x0000_0001;
const V4L2_CAP_DEVICE_CAPS: u32 = 0x8000_0000;

// ===== V4L2 Control Flags =====
const V4L2_CTRL_FLAG_DISABLED: u32 = 0x0001;

// ===== V4L2 ioctl Numbers =====
// Calculated as: (dir << 30) | (size << 16) | ('V' << 8) | nr
// where dir: 2=READ, 1=WRITE, 3=READ|WRITE

/// Query device capabilities (v4l2_capability: 104 bytes)
const VIDIOC_QUERYCAP: libc::c_ulong = 0x80685600;
/// Set control value (v4l2_control: 8 bytes)
const VIDIOC_S_CTRL: libc::c_ulong = 0xC008561C;
/// Query control info (v4l2_queryctrl: 68 bytes)
const VIDIOC_QUERYCTRL: libc::c_ulong = 0xC0445624;

// ===== V4L2 ioctl Structures =====

/// V4L2 capability structure for VIDIOC_QUERYCAP
#[repr(C)]
struct V4l2Capability {
    driver: [u8; 16],
    card: [u8; 32],
    bus_info: [u8; 32],
    version: u32,
    capabilities: u32,
    device_caps: u32,
    reserved: [u32; 3],
}

/// V4L2 control get/set structure
#[repr(C)]
struct V4l2Control {
    id: u32,
    value: i32,
}

/// V4L2 query control structure
#[repr(C)]
struct V4l2Queryctrl {
    id: u32,
    ctrl_type: u32,
    name: [u8; 32],
    minimum: i32,
    maximum: i32,
    step: i32,
    default_value: i32,
    flags: u32,
    reserved: [u32; 2],
}

// ===== Helper Functions =====

/// Extract a null-terminated string from a fixed-size byte array
fn extract_name(bytes: &[u8]) -> String {
    let name_len = bytes.iter().position(|&c| c == 0).unwrap_or(bytes.len());
    String::from_utf8_lossy(&bytes[..name_len]).to_string()
}

/// Query V4L2 capabilities for an open file descriptor
fn query_v4l2_cap(fd: RawFd) -> Option<V4l2Capability> {
    let mut cap: V4l2Capability = unsafe { std::mem::zeroed() };
    let result = unsafe { libc::ioctl(fd, VIDIOC_QUERYCAP as _, &mut cap as *mut V4l2Capability) };
    if result < 0 { None } else { Some(cap) }
}

/// Effective capabilities for the opened node
fn effective_caps(cap: &V4l2Capability) -> u32 {
    if cap.capabilities & V4L2_CAP_DEVICE_CAPS != 0 {
        cap.device_caps
    } else {
        cap.capabilities
    }
}

// ===== Public Functions =====

/// Enumerate video capture devices by scanning /dev/video* nodes
///
/// Metadata-only nodes (no capture capability) are skipped, so each
/// physical camera typically appears once. Devices are returned in
/// node-number order; the first entry is the platform default.
pub fn enumerate_devices() -> Vec<CameraDevice> {
    let mut nodes: Vec<(u32, String)> = Vec::new();

    if let Ok(entries) = std::fs::read_dir("/dev") {
        for entry in entries.flatten() {
            let name = entry.file_name();
            let name = name.to_string_lossy();
            if let Some(num) = name.strip_prefix("video")
                && let Ok(num) = num.parse::<u32>()
            {
                nodes.push((num, format!("/dev/{}", name)));
            }
        }
    }

    nodes.sort_by_key(|(num, _)| *num);

    let mut devices = Vec::new();
    for (_, path) in nodes {
        let file = match File::open(&path) {
            Ok(f) => f,
            Err(e) => {
                debug!(path = %path, error = %e, "Cannot open device node");
                continue;
            }
        };

        let Some(cap) = query_v4l2_cap(file.as_raw_fd()) else {
            debug!(path = %path, "VIDIOC_QUERYCAP failed, skipping");
            continue;
        };

        if effective_caps(&cap) & V4L2_CAP_VIDEO_CAPTURE == 0 {
            debug!(path = %path, "Node has no capture capability, skipping");
            continue;
        }

        let card = extract_name(&cap.card);
        let driver = extract_name(&cap.driver);
        debug!(path = %path, card = %card, driver = %driver, "Found capture device");

        devices.push(CameraDevice {
            name: if card.is_empty() {
                path.clone()
            } else {
                card
            },
            path,
            driver: if driver.is_empty() { None } else { Some(driver) },
        });
    }

    devices
}

/// Whether the focus control was applied
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FocusOutcome {
    /// Continuous autofocus was requested and accepted
    Applied,
    /// The device does not expose the control, or setting it failed;
    /// the focus mode is left unchanged
    Unsupported,
}

/// Request continuous autofocus on the device, best-effort
///
/// Queries `V4L2_CID_FOCUS_AUTO` and enables it when present. Unsupported
/// or locked devices are reported as [`FocusOutcome::Unsupported`]; this
/// function never returns an error.
pub fn apply_continuous_autofocus(device_path: &str) -> FocusOutcome {
    let file = match File::open(device_path) {
        Ok(f) => f,
        Err(e) => {
            debug!(device_path, error = %e, "Cannot open device for focus control");
            return FocusOutcome::Unsupported;
        }
    };
    let fd = file.as_raw_fd();

    let mut qctrl = V4l2Queryctrl {
        id: V4L2_CID_FOCUS_AUTO,
        ctrl_type: 0,
        name: [0; 32],
        minimum: 0,
        maximum: 0,
        step: 0,
        default_value: 0,
        flags: 0,
        reserved: [0; 2],
    };

    let result = unsafe { libc::ioctl(fd, VIDIOC_QUERYCTRL, &mut qctrl as *mut V4l2Queryctrl) };
    if result < 0 || qctrl.flags & V4L2_CTRL_FLAG_DISABLED != 0 {
        debug!(device_path, "Continuous autofocus not supported");
        return FocusOutcome::Unsupported;
    }

    let mut ctrl = V4l2Control {
        id: V4L2_CID_FOCUS_AUTO,
        value: 1,
    };

    let result = unsafe { libc::ioctl(fd, VIDIOC_S_CTRL, &mut ctrl as *mut V4l2Control) };
    if result < 0 {
        let errno = std::io::Error::last_os_error();
        warn!(device_path, ?errno, "Failed to enable continuous autofocus");
        return FocusOutcome::Unsupported;
    }

    debug!(device_path, "Continuous autofocus enabled");
    FocusOutcome::Applied
}
