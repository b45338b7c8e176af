//! One DS9 process from launch to termination
//!
//! DS9 has no "export finished" handshake on the command line: it keeps its
//! window open after writing the file. A session therefore waits according to
//! the configured [`SettleStrategy`] and then kills the child. The child is
//! spawned with `kill_on_drop`, so it is also terminated when the session is
//! dropped on an early return or an error path.

use super::command::CompositeJob;
use super::error::Ds9Error;
use crate::config::{SettleConfig, SettleStrategy};
use std::path::{Path, PathBuf};
use std::process::{ExitStatus, Stdio};
use std::time::SystemTime;
use tokio::process::{Child, Command};
use tokio::time::{sleep, Instant};
use tracing::debug;

/// Size and modification time of a file, used to detect a fresh export
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FileStamp {
    pub len: u64,
    pub modified: Option<SystemTime>,
}

impl FileStamp {
    /// Stamp of `path`, None if it does not exist or cannot be read
    pub async fn read(path: &Path) -> Option<FileStamp> {
        let meta = tokio::fs::metadata(path).await.ok()?;
        if !meta.is_file() {
            return None;
        }
        Some(FileStamp {
            len: meta.len(),
            modified: meta.modified().ok(),
        })
    }
}

/// How the settle wait ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SettleOutcome {
    /// A fresh, non-empty export is on disk
    Exported { bytes: u64 },
    /// The wait ended without a fresh export being observed
    Unconfirmed,
    /// Polling gave up at the timeout
    TimedOut,
    /// DS9 exited on its own without leaving a fresh export
    Exited(ExitStatus),
}

/// A running DS9 child bound to the export it is expected to write
pub struct Ds9Session {
    child: Child,
    output: PathBuf,
    baseline: Option<FileStamp>,
}

impl Ds9Session {
    /// Launch DS9 for `job`
    ///
    /// The output's stamp is taken before launch so a file left by an
    /// earlier run is not mistaken for this run's export.
    pub async fn launch(
        executable: &Path,
        job: &CompositeJob,
        quality: u32,
    ) -> Result<Self, Ds9Error> {
        let baseline = FileStamp::read(&job.output).await;

        let child = Command::new(executable)
            .args(job.ds9_args(quality))
            .stdin(Stdio::null())
            .kill_on_drop(true)
            .spawn()
            .map_err(|source| Ds9Error::Launch {
                executable: executable.to_path_buf(),
                source,
            })?;

        debug!(pid = ?child.id(), output = %job.output.display(), "DS9 launched");

        Ok(Ds9Session {
            child,
            output: job.output.clone(),
            baseline,
        })
    }

    /// Wait for DS9 to render and export, per `settle`
    pub async fn settle(&mut self, settle: &SettleConfig) -> Result<SettleOutcome, Ds9Error> {
        match settle.strategy {
            SettleStrategy::FixedDelay => {
                sleep(settle.delay()).await;
                if let Some(stamp) = self.fresh_export().await {
                    return Ok(SettleOutcome::Exported { bytes: stamp.len });
                }
                match self.child.try_wait().map_err(Ds9Error::Wait)? {
                    Some(status) => Ok(SettleOutcome::Exited(status)),
                    None => Ok(SettleOutcome::Unconfirmed),
                }
            }
            SettleStrategy::PollStable => self.poll_until_stable(settle).await,
        }
    }

    /// Ready once a fresh, non-empty export keeps the same size across two polls
    async fn poll_until_stable(
        &mut self,
        settle: &SettleConfig,
    ) -> Result<SettleOutcome, Ds9Error> {
        let deadline = Instant::now() + settle.timeout();
        let mut last_len: Option<u64> = None;

        loop {
            let exited = self.child.try_wait().map_err(Ds9Error::Wait)?;

            match self.fresh_export().await {
                Some(stamp) if exited.is_some() || last_len == Some(stamp.len) => {
                    return Ok(SettleOutcome::Exported { bytes: stamp.len });
                }
                Some(stamp) => last_len = Some(stamp.len),
                None => last_len = None,
            }

            if let Some(status) = exited {
                return Ok(SettleOutcome::Exited(status));
            }
            if Instant::now() >= deadline {
                return Ok(SettleOutcome::TimedOut);
            }
            sleep(settle.poll_interval()).await;
        }
    }

    /// Stamp of the output if it is non-empty and differs from the pre-launch one
    async fn fresh_export(&self) -> Option<FileStamp> {
        FileStamp::read(&self.output)
            .await
            .filter(|stamp| stamp.len > 0 && Some(*stamp) != self.baseline)
    }

    /// Kill the child (if still running) and reap it
    pub async fn terminate(mut self) -> Result<(), Ds9Error> {
        if let Some(status) = self.child.try_wait().map_err(Ds9Error::Wait)? {
            debug!(%status, "DS9 already exited");
            return Ok(());
        }
        self.child.kill().await.map_err(Ds9Error::Terminate)?;
        debug!(output = %self.output.display(), "DS9 terminated");
        Ok(())
    }
}
