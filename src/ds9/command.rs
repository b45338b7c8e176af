//! Composite job layout and DS9 command construction
//!
//! Everything here is pure: the same target, survey, base directory and
//! quality always give the same paths and argument list.

use crate::config::SurveyConfig;
use crate::targets::Target;
use std::ffi::OsString;
use std::path::{Path, PathBuf};

/// Intensity scaling applied to every channel
const SCALE_MODE: &str = "ZScale";

/// FITS path for one band of one target
///
/// `{base}/{key}/fc_{key}_{band}_reproj.fits`
pub fn band_fits_path(base: &Path, key: &str, band: &str) -> PathBuf {
    base.join(key)
        .join(format!("fc_{}_{}_reproj.fits", key, band))
}

/// Export path for one target in one survey
///
/// `{survey.output_dir}/{key}_{survey name lowercased}.jpeg`
pub fn export_path(survey: &SurveyConfig, key: &str) -> PathBuf {
    survey
        .output_dir
        .join(format!("{}_{}.jpeg", key, survey.file_suffix()))
}

fn os_args<'a>(items: &'a [&'a str]) -> impl Iterator<Item = OsString> + 'a {
    items.iter().map(OsString::from)
}

/// All paths involved in compositing one (target, survey) pair
#[derive(Debug, Clone, PartialEq)]
pub struct CompositeJob {
    pub key: String,
    pub survey: String,
    pub red: PathBuf,
    pub green: PathBuf,
    pub blue: PathBuf,
    pub output: PathBuf,
}

impl CompositeJob {
    pub fn new(target: &Target, survey: &SurveyConfig, fits_base_dir: &Path) -> Self {
        let key = target.key();
        let [red, green, blue] = survey
            .bands()
            .map(|band| band_fits_path(fits_base_dir, &key, band));

        CompositeJob {
            output: export_path(survey, &key),
            survey: survey.name.clone(),
            key,
            red,
            green,
            blue,
        }
    }

    /// DS9 arguments: RGB frame, one FITS per channel with ZScale, zoom to
    /// fit, no colorbar, export at `quality`
    pub fn ds9_args(&self, quality: u32) -> Vec<OsString> {
        let mut args: Vec<OsString> = Vec::with_capacity(32);

        args.extend(os_args(&["-rgb"]));
        for (channel, fits) in [("red", &self.red), ("green", &self.green), ("blue", &self.blue)] {
            // The red channel is current right after -rgb
            if channel != "red" {
                args.extend(os_args(&["-rgb", "channel", channel]));
            }
            args.extend(os_args(&["-fits"]));
            args.push(fits.as_os_str().to_os_string());
            args.extend(os_args(&["-scale", SCALE_MODE]));
        }
        args.extend(os_args(&["-zoom", "to", "fit", "-colorbar", "no", "-export"]));
        args.push(self.output.as_os_str().to_os_string());
        args.push(OsString::from(quality.to_string()));

        args
    }

    /// Printable command line for logs and dry runs
    pub fn command_line(&self, executable: &Path, quality: u32) -> String {
        std::iter::once(executable.as_os_str().to_os_string())
            .chain(self.ds9_args(quality))
            .map(|arg| {
                let arg = arg.to_string_lossy().into_owned();
                if arg.contains(char::is_whitespace) {
                    format!("\"{}\"", arg)
                } else {
                    arg
                }
            })
            .collect::<Vec<_>>()
            .join(" ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn glimpse() -> SurveyConfig {
        SurveyConfig {
            name: "GLIMPSE".to_string(),
            red: "spitzer_seipirac4(2.4)".to_string(),
            green: "spitzer_seipirac2(2.4)".to_string(),
            blue: "spitzer_seipirac1(2.4)".to_string(),
            output_dir: PathBuf::from("out/GLIMPSE"),
        }
    }

    fn orion_job() -> CompositeJob {
        CompositeJob::new(
            &Target::new(83.822083, -5.391111),
            &glimpse(),
            Path::new("data"),
        )
    }

    #[test]
    fn test_job_paths() {
        let job = orion_job();
        assert_eq!(job.key, "83.822083-5.391111");
        assert_eq!(
            job.red,
            PathBuf::from("data/83.822083-5.391111/fc_83.822083-5.391111_spitzer_seipirac4(2.4)_reproj.fits")
        );
        assert_eq!(
            job.blue,
            PathBuf::from("data/83.822083-5.391111/fc_83.822083-5.391111_spitzer_seipirac1(2.4)_reproj.fits")
        );
        assert!(job.output.ends_with("83.822083-5.391111_glimpse.jpeg"));
        assert_eq!(job.output, PathBuf::from("out/GLIMPSE/83.822083-5.391111_glimpse.jpeg"));
    }

    #[test]
    fn test_args_exact_grammar() {
        let job = orion_job();
        let args: Vec<String> = job
            .ds9_args(100)
            .into_iter()
            .map(|a| a.into_string().unwrap())
            .collect();

        let red = job.red.to_string_lossy().into_owned();
        let green = job.green.to_string_lossy().into_owned();
        let blue = job.blue.to_string_lossy().into_owned();
        let output = job.output.to_string_lossy().into_owned();
        #[rustfmt::skip]
        let expected = vec![
            "-rgb", "-fits", red.as_str(), "-scale", "ZScale",
            "-rgb", "channel", "green", "-fits", green.as_str(), "-scale", "ZScale",
            "-rgb", "channel", "blue", "-fits", blue.as_str(), "-scale", "ZScale",
            "-zoom", "to", "fit", "-colorbar", "no", "-export", output.as_str(), "100",
        ];
        assert_eq!(args, expected);
    }

    #[test]
    fn test_args_fits_and_export_counts() {
        let args = orion_job().ds9_args(100);
        let fits: Vec<usize> = args
            .iter()
            .enumerate()
            .filter(|(_, a)| *a == "-fits")
            .map(|(i, _)| i)
            .collect();
        assert_eq!(fits.len(), 3);
        assert_eq!(args.iter().filter(|a| *a == "-export").count(), 1);

        // Red, green, blue order
        let job = orion_job();
        assert_eq!(args[fits[0] + 1], job.red.as_os_str());
        assert_eq!(args[fits[1] + 1], job.green.as_os_str());
        assert_eq!(args[fits[2] + 1], job.blue.as_os_str());
    }

    #[test]
    fn test_command_construction_is_pure() {
        let a = orion_job();
        let b = orion_job();
        assert_eq!(a, b);
        assert_eq!(a.ds9_args(100), b.ds9_args(100));
        assert_ne!(a.ds9_args(100), a.ds9_args(90));
    }

    #[test]
    fn test_command_line_quotes_spaces() {
        let mut job = orion_job();
        job.output = PathBuf::from("my images/out.jpeg");
        let line = job.command_line(Path::new("ds9"), 100);
        assert!(line.starts_with("ds9 -rgb -fits "));
        assert!(line.ends_with("-export \"my images/out.jpeg\" 100"));
    }
}
