//! Run configuration
//!
//! Defaults live in `ds9_grid.json`, embedded at compile time so there is a
//! single source of truth for every default value. A user configuration file
//! only needs to carry the keys it changes: it is merged over the embedded
//! document before deserialization (objects merge key by key, arrays and
//! scalars replace).

use crate::error::{Error, Result};
use image::ImageFormat;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// ds9_grid.json embedded at compile time
const DEFAULT_CONFIG_JSON: &str = include_str!("../ds9_grid.json");

/// How long to let DS9 work before it is terminated
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SettleStrategy {
    /// Sleep for `delay_secs`, then terminate
    FixedDelay,
    /// Poll the export until its size is stable, up to `timeout_secs`
    PollStable,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SettleConfig {
    pub strategy: SettleStrategy,
    pub delay_secs: f64,
    pub poll_interval_ms: u64,
    pub timeout_secs: f64,
}

impl SettleConfig {
    pub fn delay(&self) -> Duration {
        Duration::from_secs_f64(self.delay_secs)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs_f64(self.timeout_secs)
    }
}

/// One survey: three single-band identifiers mapped to red, green, blue
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SurveyConfig {
    pub name: String,
    pub red: String,
    pub green: String,
    pub blue: String,
    pub output_dir: PathBuf,
}

impl SurveyConfig {
    /// Band identifiers in channel order (red, green, blue)
    pub fn bands(&self) -> [&str; 3] {
        [&self.red, &self.green, &self.blue]
    }

    /// Lowercased survey name, used as the export file suffix
    pub fn file_suffix(&self) -> String {
        self.name.to_lowercase()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GridConfig {
    /// Name of the survey whose composites fill the grid
    pub survey: String,
    pub rows: usize,
    pub cols: usize,
    pub max_images: usize,
    /// Angular size of each panel's extent in arcseconds (both axes)
    pub panel_size_arcsec: f64,
    pub title_prefix: String,
    pub output_path: PathBuf,
    pub figure_width_in: f64,
    pub figure_height_in: f64,
    pub dpi: u32,
    pub title_font_pt: f64,
    pub label_font_pt: f64,
    /// TrueType/OpenType font for labels; the embedded DejaVu Sans when unset
    pub font_path: Option<PathBuf>,
}

impl GridConfig {
    /// Panel extent size in degrees
    pub fn panel_size_deg(&self) -> f64 {
        self.panel_size_arcsec / 3600.0
    }

    /// Resolve the figure size to pixels (inches × DPI)
    ///
    /// Returns (width, height) in pixels
    pub fn resolve_dimensions(&self) -> (u32, u32) {
        let dpi = self.dpi as f64;
        let width = (self.figure_width_in * dpi).round().max(1.0) as u32;
        let height = (self.figure_height_in * dpi).round().max(1.0) as u32;
        (width, height)
    }

    /// Convert a point size to pixels at the figure DPI
    pub fn points_to_px(&self, points: f64) -> f32 {
        (points * self.dpi as f64 / 72.0) as f32
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunConfig {
    pub input_csv: PathBuf,
    /// Root of the per-target FITS directories produced by the reprojection step
    pub fits_base_dir: PathBuf,
    pub ds9_executable: PathBuf,
    pub export_quality: u32,
    pub settle: SettleConfig,
    pub surveys: Vec<SurveyConfig>,
    pub grid: GridConfig,
}

impl RunConfig {
    /// Configuration built from the embedded defaults only
    pub fn embedded() -> Result<Self> {
        let defaults = embedded_defaults()?;
        Self::from_value(defaults)
    }

    /// Load a configuration file and merge it over the embedded defaults
    pub fn from_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|source| Error::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&text)
            .map_err(|e| Error::Config(format!("{}: {}", path.display(), e)))
    }

    /// Parse a (possibly partial) JSON document merged over the embedded defaults
    pub fn from_json_str(json: &str) -> Result<Self> {
        let overrides: Value = serde_json::from_str(json)?;
        if !overrides.is_object() {
            return Err(Error::Config(
                "configuration must be a JSON object".to_string(),
            ));
        }

        let mut merged = embedded_defaults()?;
        merge_json(&mut merged, overrides);
        Self::from_value(merged)
    }

    fn from_value(value: Value) -> Result<Self> {
        let config: RunConfig = serde_json::from_value(value)?;
        config.validate()?;
        Ok(config)
    }

    /// Find a survey by name (case-insensitive)
    pub fn survey(&self, name: &str) -> Option<&SurveyConfig> {
        self.surveys
            .iter()
            .find(|s| s.name.eq_ignore_ascii_case(name))
    }

    /// The survey whose composites fill the grid
    pub fn grid_survey(&self) -> Result<&SurveyConfig> {
        self.survey(&self.grid.survey).ok_or_else(|| {
            Error::Config(format!(
                "grid survey '{}' is not among the configured surveys",
                self.grid.survey
            ))
        })
    }

    /// Reject configurations no run could succeed with
    pub fn validate(&self) -> Result<()> {
        if self.surveys.is_empty() {
            return Err(Error::Config("at least one survey is required".into()));
        }

        let mut seen = HashSet::new();
        for survey in &self.surveys {
            if survey.name.trim().is_empty() {
                return Err(Error::Config("survey name must not be empty".into()));
            }
            if !seen.insert(survey.name.to_lowercase()) {
                return Err(Error::Config(format!(
                    "duplicate survey name '{}'",
                    survey.name
                )));
            }
        }
        self.grid_survey()?;

        let grid = &self.grid;
        if grid.rows == 0 || grid.cols == 0 {
            return Err(Error::Config(format!(
                "grid shape {}x{} must have at least one row and column",
                grid.rows, grid.cols
            )));
        }
        if grid.dpi == 0 {
            return Err(Error::Config("grid dpi must be positive".into()));
        }
        if !(grid.panel_size_arcsec.is_finite() && grid.panel_size_arcsec > 0.0) {
            return Err(Error::Config(format!(
                "panel size {} arcsec must be positive",
                grid.panel_size_arcsec
            )));
        }
        if !(grid.figure_width_in > 0.0 && grid.figure_height_in > 0.0) {
            return Err(Error::Config(format!(
                "figure size {}x{} in must be positive",
                grid.figure_width_in, grid.figure_height_in
            )));
        }
        match ImageFormat::from_path(&grid.output_path) {
            Ok(ImageFormat::Png | ImageFormat::Jpeg | ImageFormat::Tiff | ImageFormat::Bmp) => {}
            _ => {
                return Err(Error::Config(format!(
                    "figure output {} must end in .png, .jpg, .jpeg, .tif, .tiff or .bmp",
                    grid.output_path.display()
                )))
            }
        }

        let settle = &self.settle;
        if settle.poll_interval_ms == 0 {
            return Err(Error::Config("settle poll interval must be positive".into()));
        }
        for (name, secs) in [
            ("delay_secs", settle.delay_secs),
            ("timeout_secs", settle.timeout_secs),
        ] {
            if !(secs.is_finite() && secs >= 0.0) {
                return Err(Error::Config(format!(
                    "settle {} must be a non-negative number, got {}",
                    name, secs
                )));
            }
        }

        Ok(())
    }
}

fn embedded_defaults() -> Result<Value> {
    serde_json::from_str(DEFAULT_CONFIG_JSON)
        .map_err(|e| Error::Config(format!("embedded ds9_grid.json is invalid: {}", e)))
}

/// Merge `overrides` into `base`: objects key by key, everything else replaces
fn merge_json(base: &mut Value, overrides: Value) {
    match (base, overrides) {
        (Value::Object(base_map), Value::Object(override_map)) => {
            for (key, value) in override_map {
                match base_map.get_mut(&key) {
                    Some(existing) => merge_json(existing, value),
                    None => {
                        base_map.insert(key, value);
                    }
                }
            }
        }
        (slot, value) => *slot = value,
    }
}
