use crate::platform::platform;
use std::path::PathBuf;

/// Google's evergreen platform-tools bundle for Windows.
pub const DOWNLOAD_URL: &str =
    "https://dl.google.com/android/repository/platform-tools-latest-windows.zip";

/// Top-level directory expected inside the downloaded zip.
pub const ARCHIVE_ROOT: &str = "platform-tools";

/// Base name of the executable we probe for and verify after install.
pub const TOOL_NAME: &str = "adb";

/// Where the archive contents land. Fixed on Windows; home-relative
/// elsewhere so the flow stays exercisable on dev machines.
pub fn install_dir() -> PathBuf {
    platform().install_dir()
}

/// File that must exist directly under the install dir for the install to
/// count as successful (`adb.exe` on Windows).
pub fn marker_file_name() -> String {
    platform().final_binary_name(TOOL_NAME)
}
