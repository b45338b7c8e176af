use std::path::PathBuf;
use thiserror::Error;

/// Errors from launching or supervising a DS9 process
#[derive(Debug, Error)]
pub enum Ds9Error {
    /// Process creation failed (missing executable, permissions, bad arguments)
    #[error("failed to launch {}: {source}", executable.display())]
    Launch {
        executable: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Polling the child's status failed
    #[error("failed to query DS9 process status: {0}")]
    Wait(#[source] std::io::Error),

    /// Killing or reaping the child failed
    #[error("failed to terminate DS9 process: {0}")]
    Terminate(#[source] std::io::Error),

    /// DS9 exited on its own before writing the export
    #[error("DS9 exited with {status} before writing {}", output.display())]
    ExitedWithoutOutput {
        status: std::process::ExitStatus,
        output: PathBuf,
    },
}
