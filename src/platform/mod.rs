use crate::errors::SetupError;
use std::path::{Path, PathBuf};

/// Outcome of a successful persistent PATH append. The raw command output is
/// kept for display; `setx` prints a confirmation line on success.
#[derive(Debug, Clone)]
pub struct PathUpdate {
    pub output: String,
}

pub trait PlatformOps: Sync + Send {
    fn install_dir(&self) -> PathBuf;
    fn final_binary_name(&self, base: &str) -> String;
    /// Append `dir` to the current user's persistent PATH. Success is judged
    /// by the invoked command's exit status only; the change is not visible
    /// to this process or its children until a new session starts.
    fn persist_path_entry(&self, dir: &Path) -> Result<PathUpdate, SetupError>;
}

#[cfg(unix)]
mod unix;
#[cfg(unix)]
pub use unix::UNIX_PLATFORM as ConcretePlatform;

#[cfg(windows)]
mod windows;
#[cfg(windows)]
pub use windows::WINDOWS_PLATFORM as ConcretePlatform;

pub fn platform() -> &'static dyn PlatformOps {
    &ConcretePlatform
}

/// Shared invocation of the PATH-append mechanism: `<program> PATH "<value>"`
/// where `<value>` is the current PATH with `dir` appended (read-and-append,
/// never replace). Split out so the exit-status classification is testable
/// with stand-in programs on any host.
#[cfg(any(windows, test))]
pub(crate) fn append_with_command(program: &str, dir: &Path) -> Result<PathUpdate, SetupError> {
    let current = std::env::var("PATH").unwrap_or_default();
    let value = if current.is_empty() {
        dir.display().to_string()
    } else {
        format!("{current};{}", dir.display())
    };

    let output = std::process::Command::new(program)
        .arg("PATH")
        .arg(&value)
        .output()
        .map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                SetupError::EnvironmentUpdate(format!(
                    "the '{program}' command was not found on this system"
                ))
            } else {
                SetupError::EnvironmentUpdate(format!("failed to run {program}: {e}"))
            }
        })?;

    let stdout = String::from_utf8_lossy(&output.stdout).trim().to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
    log::debug!("{program} stdout: {stdout}");
    if !stderr.is_empty() {
        log::debug!("{program} stderr: {stderr}");
    }

    if output.status.success() {
        Ok(PathUpdate { output: stdout })
    } else {
        // setx errors usually land on stderr, sometimes stdout.
        let detail = if stderr.is_empty() { stdout } else { stderr };
        Err(SetupError::EnvironmentUpdate(detail))
    }
}
