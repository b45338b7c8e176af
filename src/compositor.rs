//! Batch image compositor
//!
//! Runs DS9 once per (survey, target) pair, strictly one process at a time.
//! A failing pair is logged and recorded in the [`CompositeReport`]; it never
//! stops the batch. Only structural problems (an output directory that cannot
//! be created, an unknown survey name) abort the run.

use crate::config::{RunConfig, SurveyConfig};
use crate::ds9::{CompositeJob, Ds9Error, Ds9Session, SettleOutcome};
use crate::error::{Error, Result};
use crate::targets::Target;
use tracing::{error, info, warn};

/// Result of one (target, survey) pair that launched successfully
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PairOutcome {
    /// A fresh export of `bytes` bytes was seen on disk
    Exported { bytes: u64 },
    /// DS9 was terminated without a fresh export being observed
    Unconfirmed,
}

/// A pair that failed, with the error rendered for the report
#[derive(Debug, Clone, PartialEq)]
pub struct PairFailure {
    pub key: String,
    pub survey: String,
    pub error: String,
}

/// Summary of a batch run
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CompositeReport {
    pub exported: usize,
    pub unconfirmed: usize,
    pub failures: Vec<PairFailure>,
}

impl CompositeReport {
    pub fn attempted(&self) -> usize {
        self.exported + self.unconfirmed + self.failures.len()
    }

    fn record(&mut self, job: &CompositeJob, result: std::result::Result<PairOutcome, Ds9Error>) {
        match result {
            Ok(PairOutcome::Exported { .. }) => self.exported += 1,
            Ok(PairOutcome::Unconfirmed) => self.unconfirmed += 1,
            Err(e) => self.failures.push(PairFailure {
                key: job.key.clone(),
                survey: job.survey.clone(),
                error: e.to_string(),
            }),
        }
    }
}

/// Resolve survey names to configured surveys; an empty selection means all
pub fn select_surveys<'a>(
    config: &'a RunConfig,
    names: &[String],
) -> Result<Vec<&'a SurveyConfig>> {
    if names.is_empty() {
        return Ok(config.surveys.iter().collect());
    }
    names
        .iter()
        .map(|name| {
            config
                .survey(name)
                .ok_or_else(|| Error::Config(format!("unknown survey '{}'", name)))
        })
        .collect()
}

/// Every job of a batch, grouped by survey in configuration order
pub fn plan_jobs(
    config: &RunConfig,
    targets: &[Target],
    surveys: &[&SurveyConfig],
) -> Vec<CompositeJob> {
    surveys
        .iter()
        .flat_map(|survey| {
            targets
                .iter()
                .map(move |target| CompositeJob::new(target, survey, &config.fits_base_dir))
        })
        .collect()
}

/// Composite every (survey, target) pair
pub async fn composite_all(
    config: &RunConfig,
    targets: &[Target],
    surveys: &[&SurveyConfig],
) -> Result<CompositeReport> {
    let mut report = CompositeReport::default();

    for survey in surveys {
        info!("Processing {} survey...", survey.name);
        tokio::fs::create_dir_all(&survey.output_dir)
            .await
            .map_err(|source| Error::Io {
                path: survey.output_dir.clone(),
                source,
            })?;

        for (i, target) in targets.iter().enumerate() {
            let job = CompositeJob::new(target, survey, &config.fits_base_dir);
            info!("  Processing {}/{}: {}", i + 1, targets.len(), job.key);

            let result = composite_pair(config, &job).await;
            if let Err(ref e) = result {
                error!("    Error processing {}: {}", job.key, e);
            }
            report.record(&job, result);
        }
    }

    info!(
        "✓ Compositing done: {} exported, {} unconfirmed, {} failed (of {})",
        report.exported,
        report.unconfirmed,
        report.failures.len(),
        report.attempted()
    );
    Ok(report)
}

/// Launch DS9 for one job, wait for it to settle, terminate it
pub async fn composite_pair(
    config: &RunConfig,
    job: &CompositeJob,
) -> std::result::Result<PairOutcome, Ds9Error> {
    let mut session =
        Ds9Session::launch(&config.ds9_executable, job, config.export_quality).await?;

    // An error here drops the session, which kills DS9
    let outcome = session.settle(&config.settle).await?;
    session.terminate().await?;

    match outcome {
        SettleOutcome::Exported { bytes } => {
            info!("    ✓ {} ({} bytes)", job.output.display(), bytes);
            Ok(PairOutcome::Exported { bytes })
        }
        SettleOutcome::Unconfirmed => {
            warn!("    ⚠ No export seen at {} after the settle delay", job.output.display());
            Ok(PairOutcome::Unconfirmed)
        }
        SettleOutcome::TimedOut => {
            warn!(
                "    ⚠ Export at {} not stable within {:.1}s",
                job.output.display(),
                config.settle.timeout_secs
            );
            Ok(PairOutcome::Unconfirmed)
        }
        SettleOutcome::Exited(status) => Err(Ds9Error::ExitedWithoutOutput {
            status,
            output: job.output.clone(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn config_in(dir: &std::path::Path, executable: PathBuf) -> RunConfig {
        let json = serde_json::json!({
            "fits_base_dir": dir.join("fits"),
            "ds9_executable": executable,
            "settle": { "strategy": "poll_stable", "poll_interval_ms": 20, "timeout_secs": 5.0 },
            "surveys": [
                { "name": "GLIMPSE", "red": "i4", "green": "i2", "blue": "i1", "output_dir": dir.join("glimpse") },
                { "name": "WISE", "red": "w4", "green": "w2", "blue": "w1", "output_dir": dir.join("wise") }
            ]
        });
        RunConfig::from_json_str(&json.to_string()).unwrap()
    }

    fn targets() -> Vec<Target> {
        vec![Target::new(83.822083, -5.391111), Target::new(266.417, -29.008)]
    }

    #[test]
    fn test_plan_jobs_order() {
        let dir = tempfile::tempdir().unwrap();
        let config = config_in(dir.path(), PathBuf::from("ds9"));
        let surveys = select_surveys(&config, &[]).unwrap();
        let jobs = plan_jobs(&config, &targets(), &surveys);

        let labels: Vec<(String, String)> = jobs
            .iter()
            .map(|j| (j.survey.clone(), j.key.clone()))
            .collect();
        assert_eq!(
            labels,
            vec![
                ("GLIMPSE".to_string(), "83.822083-5.391111".to_string()),
                ("GLIMPSE".to_string(), "266.417000-29.008000".to_string()),
                ("WISE".to_string(), "83.822083-5.391111".to_string()),
                ("WISE".to_string(), "266.417000-29.008000".to_string()),
            ]
        );
        assert!(jobs[2].output.ends_with("wise/83.822083-5.391111_wise.jpeg"));
    }

    #[test]
    fn test_select_surveys() {
        let dir = tempfile::tempdir().unwrap();
        let config = config_in(dir.path(), PathBuf::from("ds9"));

        let picked = select_surveys(&config, &["wise".to_string()]).unwrap();
        assert_eq!(picked.len(), 1);
        assert_eq!(picked[0].name, "WISE");

        assert!(select_surveys(&config, &["2MASS".to_string()]).is_err());
    }

    #[tokio::test]
    async fn test_missing_executable_does_not_abort_batch() {
        let dir = tempfile::tempdir().unwrap();
        let config = config_in(dir.path(), dir.path().join("missing-ds9"));
        let surveys = select_surveys(&config, &[]).unwrap();

        let report = composite_all(&config, &targets(), &surveys).await.unwrap();

        assert_eq!(report.attempted(), 4);
        assert_eq!(report.failures.len(), 4);
        assert_eq!(report.exported, 0);
        assert_eq!(report.failures[0].key, "83.822083-5.391111");
        assert_eq!(report.failures[3].survey, "WISE");
        // Output directories are still prepared
        assert!(dir.path().join("glimpse").is_dir());
        assert!(dir.path().join("wise").is_dir());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_batch_exports_every_pair() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let exe = dir.path().join("ds9");
        std::fs::write(
            &exe,
            "#!/bin/sh\nout=\"\"\nwhile [ $# -gt 0 ]; do\n  if [ \"$1\" = \"-export\" ]; then out=\"$2\"; fi\n  shift\ndone\nprintf 'jpeg' > \"$out\"\nexec sleep 30\n",
        )
        .unwrap();
        std::fs::set_permissions(&exe, std::fs::Permissions::from_mode(0o755)).unwrap();

        let config = config_in(dir.path(), exe);
        let surveys = select_surveys(&config, &[]).unwrap();
        let report = composite_all(&config, &targets(), &surveys).await.unwrap();

        assert_eq!(report.exported, 4, "{:?}", report.failures);
        assert!(report.failures.is_empty());
        assert!(dir
            .path()
            .join("glimpse/266.417000-29.008000_glimpse.jpeg")
            .is_file());
        assert!(dir.path().join("wise/83.822083-5.391111_wise.jpeg").is_file());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_fixed_delay_counts_failed_ds9_runs() {
        use crate::config::SettleStrategy;
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let exe = dir.path().join("ds9");
        std::fs::write(&exe, "#!/bin/sh\nexit 1\n").unwrap();
        std::fs::set_permissions(&exe, std::fs::Permissions::from_mode(0o755)).unwrap();

        let mut config = config_in(dir.path(), exe);
        config.settle.strategy = SettleStrategy::FixedDelay;
        config.settle.delay_secs = 0.2;
        let surveys = select_surveys(&config, &["GLIMPSE".to_string()]).unwrap();
        let report = composite_all(&config, &targets(), &surveys).await.unwrap();

        assert_eq!(report.failures.len(), 2);
        assert_eq!(report.unconfirmed, 0);
        assert!(
            report.failures[0].error.contains("exited with"),
            "{}",
            report.failures[0].error
        );
    }
}
