use crate::errors::SetupError;
use crate::platform::{PathUpdate, PlatformOps};
use std::path::{Path, PathBuf};

pub static UNIX_PLATFORM: Unix = Unix;

pub struct Unix;

impl PlatformOps for Unix {
    fn install_dir(&self) -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("platform-tools")
    }
    fn final_binary_name(&self, base: &str) -> String {
        base.to_string()
    }
    fn persist_path_entry(&self, _dir: &Path) -> Result<PathUpdate, SetupError> {
        Err(SetupError::EnvironmentUpdate(
            "persistent user PATH updates are only supported on Windows".to_string(),
        ))
    }
}
