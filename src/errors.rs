use thiserror::Error;

/// Everything that can go wrong between clicking "install" and a usable adb.
/// The `Display` text is shown to the user verbatim, so messages stay
/// self-contained.
#[derive(Debug, Error)]
pub enum SetupError {
    #[error("download failed: {0}")]
    Network(String),

    #[error("downloaded file is not a valid zip archive: {0}")]
    ArchiveFormat(String),

    #[error("{0}")]
    ArchiveLayout(String),

    #[error("extraction failed: {0}")]
    Verification(String),

    #[error("could not update user PATH: {0}")]
    EnvironmentUpdate(String),
}
