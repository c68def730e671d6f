//! Hands a rendered image to the desktop's default image viewer.

use anyhow::{Context, Result};
use ecb_vision::core_modules::utils::image_helper::image_helper::IndexedImage;
use std::path::{Path, PathBuf};
use std::process::Command;

const PREVIEW_FILE_NAME: &str = "ecb-viewer-preview.png";

/// Temporary file the preview is written to before the viewer opens it.
///
/// Every run overwrites the same file, so previews do not pile up in the temp dir.
pub fn preview_path() -> PathBuf {
    std::env::temp_dir().join(PREVIEW_FILE_NAME)
}

fn opener(path: &Path) -> Command {
    if cfg!(target_os = "windows") {
        let mut command = Command::new("cmd");
        command.args(["/C", "start", ""]).arg(path);
        command
    } else if cfg!(target_os = "macos") {
        let mut command = Command::new("open");
        command.arg(path);
        command
    } else {
        let mut command = Command::new("xdg-open");
        command.arg(path);
        command
    }
}

/// Writes the image to a temporary PNG and launches the viewer without waiting.
pub fn show(image: &IndexedImage) -> Result<()> {
    let path = preview_path();
    image
        .save(&path)
        .with_context(|| format!("Could not write preview to {}", path.display()))?;
    log::debug!("Opening preview {}", path.display());
    opener(&path)
        .spawn()
        .with_context(|| format!("Could not launch an image viewer for {}", path.display()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn preview_lands_in_the_temp_dir() {
        let path = preview_path();
        assert!(path.starts_with(std::env::temp_dir()));
        assert_eq!(path.extension().and_then(|e| e.to_str()), Some("png"));
    }

    #[test]
    fn runs_reuse_one_preview_file() {
        assert_eq!(preview_path(), preview_path());
        assert_eq!(preview_path().file_name().and_then(|n| n.to_str()), Some(PREVIEW_FILE_NAME));
    }

    #[test]
    fn opener_receives_the_path() {
        let path = Path::new("/tmp/preview.png");
        let command = opener(path);
        assert!(command.get_args().any(|arg| arg == path.as_os_str()));
    }
}
