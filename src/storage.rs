// SPDX-License-Identifier: GPL-3.0-only

//! Storage helpers for saved captures

use crate::constants::photo;
use std::path::{Path, PathBuf};

/// Default directory for saved photos
pub fn default_photo_dir() -> PathBuf {
    dirs::picture_dir()
        .unwrap_or_else(|| dirs::home_dir().unwrap_or_else(|| PathBuf::from(".")))
        .join(photo::SAVE_FOLDER)
}

/// Timestamped output path for a new photo
pub fn timestamped_photo_path(dir: &Path) -> PathBuf {
    let timestamp = chrono::Local::now().format("%Y%m%d_%H%M%S");
    dir.join(format!("IMG_{}.jpg", timestamp))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_photo_filename_pattern() {
        let path = timestamped_photo_path(Path::new("/tmp/photos"));
        let name = path.file_name().unwrap().to_string_lossy();
        assert!(name.starts_with("IMG_"));
        assert!(name.ends_with(".jpg"));
        assert!(path.starts_with("/tmp/photos"));
    }
}
