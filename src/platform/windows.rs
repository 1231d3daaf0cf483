use crate::errors::SetupError;
use crate::platform::{append_with_command, PathUpdate, PlatformOps};
use std::path::{Path, PathBuf};

pub static WINDOWS_PLATFORM: Windows = Windows;

pub struct Windows;

impl PlatformOps for Windows {
    fn install_dir(&self) -> PathBuf {
        PathBuf::from("C:\\Platform-tools")
    }
    fn final_binary_name(&self, base: &str) -> String {
        if base.ends_with(".exe") {
            base.to_string()
        } else {
            format!("{base}.exe")
        }
    }
    fn persist_path_entry(&self, dir: &Path) -> Result<PathUpdate, SetupError> {
        // setx returns 0 on success even when it prints warnings; the exit
        // status is the only reliable signal.
        append_with_command("setx", dir)
    }
}
