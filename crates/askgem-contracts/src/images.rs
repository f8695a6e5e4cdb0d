use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

pub const IMAGE_EXTENSION: &str = "png";

/// Most recently modified `.png` in `directory`, or `None`.
///
/// Unreadable directories are logged and treated as empty.
pub fn find_latest_image(directory: &Path) -> Option<PathBuf> {
    match latest_image_in(directory) {
        Ok(found) => found,
        Err(err) => {
            tracing::warn!(
                directory = %directory.display(),
                error = %err,
                "failed scanning image directory"
            );
            None
        }
    }
}

pub fn latest_image_in(directory: &Path) -> io::Result<Option<PathBuf>> {
    let mut latest: Option<(SystemTime, PathBuf)> = None;
    for entry in fs::read_dir(directory)? {
        let Ok(entry) = entry else {
            continue;
        };
        let path = entry.path();
        if !has_image_extension(&path) {
            continue;
        }
        let Ok(metadata) = entry.metadata() else {
            continue;
        };
        if !metadata.is_file() {
            continue;
        }
        let Ok(modified) = metadata.modified() else {
            continue;
        };
        let newer = latest
            .as_ref()
            .map(|(current, _)| modified > *current)
            .unwrap_or(true);
        if newer {
            latest = Some((modified, directory.join(entry.file_name())));
        }
    }
    Ok(latest.map(|(_, path)| path))
}

fn has_image_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|value| value.to_str())
        .map(|value| value.eq_ignore_ascii_case(IMAGE_EXTENSION))
        .unwrap_or(false)
}
