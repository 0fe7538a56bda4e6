use std::fs;
use std::path::{Path, PathBuf};

use tracing::info;

use super::SessionFile;

/// Suffix every session file carries so the open dialog can filter on it.
pub const FILE_SUFFIX: &str = "-pcbcam.txt";

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("session file I/O failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("session file is not valid JSON: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Appends the session suffix unless the chosen name already ends with it.
pub fn conventional_path(chosen: &Path) -> PathBuf {
    let name = chosen.file_name().and_then(|n| n.to_str()).unwrap_or("");
    if name.ends_with(FILE_SUFFIX) {
        chosen.to_path_buf()
    } else {
        let mut s = chosen.as_os_str().to_os_string();
        s.push(FILE_SUFFIX);
        PathBuf::from(s)
    }
}

pub fn load(path: &Path) -> Result<SessionFile, StoreError> {
    let raw = fs::read_to_string(path)?;
    let session = serde_json::from_str(&raw)?;
    info!("loaded session from {}", path.display());
    Ok(session)
}

/// Writes to a sibling `.tmp` file first and renames it over the target,
/// so a crash mid-write never leaves a truncated session behind.
pub fn save(path: &Path, session: &SessionFile) -> Result<(), StoreError> {
    let json = serde_json::to_string_pretty(session)?;
    let tmp = path.with_extension("tmp");
    fs::write(&tmp, json)?;
    fs::rename(&tmp, path)?;
    info!("saved session to {}", path.display());
    Ok(())
}
