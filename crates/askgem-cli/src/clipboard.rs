use anyhow::{Context, Result};
use arboard::Clipboard;

/// Current clipboard text. Failures are logged and read as empty.
pub fn read_text() -> Option<String> {
    match Clipboard::new().and_then(|mut clipboard| clipboard.get_text()) {
        Ok(text) => Some(text),
        Err(arboard::Error::ContentNotAvailable) => None,
        Err(err) => {
            tracing::warn!(error = %err, "failed reading clipboard");
            None
        }
    }
}

pub fn copy_text(text: &str) -> Result<()> {
    let mut clipboard = Clipboard::new().context("clipboard unavailable")?;
    clipboard
        .set_text(text.to_string())
        .context("failed writing clipboard")?;
    Ok(())
}
