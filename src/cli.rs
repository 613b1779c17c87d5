// SPDX-License-Identifier: GPL-3.0-only

//! CLI subcommand handlers

use crate::backend::v4l2;

/// List available camera devices
pub fn list_cameras() {
    let devices = v4l2::enumerate_devices();

    if devices.is_empty() {
        println!("No cameras found");
        return;
    }

    println!("Available cameras:");
    for device in devices {
        match device.driver {
            Some(driver) => println!("  {} ({}) [{}]", device.name, device.path, driver),
            None => println!("  {} ({})", device.name, device.path),
        }
    }
}
