//! Target coordinates and the on-disk coordinate key
//!
//! The key format `{ra:.6}{dec:+.6}` is fixed by the upstream reprojection
//! pipeline that lays out the FITS directories; both the compositor and the
//! grid visualizer go through [`coordinate_key`] so their file names cannot
//! drift apart.

use crate::error::{Error, Result};
use polars::prelude::*;
use std::io::Cursor;
use std::path::Path;

/// One row of the input table: equatorial coordinates in degrees
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Target {
    pub ra: f64,
    pub dec: f64,
}

impl Target {
    pub fn new(ra: f64, dec: f64) -> Self {
        Target { ra, dec }
    }

    /// Filesystem key for this target, e.g. `83.822083-5.391111`
    pub fn key(&self) -> String {
        coordinate_key(self.ra, self.dec)
    }

    /// Coordinates rounded to the 6 decimals the key carries
    pub fn rounded(&self) -> Target {
        Target {
            ra: round_decimal6(self.ra),
            dec: round_decimal6(self.dec),
        }
    }
}

/// Format coordinates for file name matching
///
/// Right ascension as 6-decimal fixed point, declination as 6-decimal fixed
/// point with an explicit sign.
pub fn coordinate_key(ra: f64, dec: f64) -> String {
    format!("{:.6}{:+.6}", ra, dec)
}

/// Round to 6 decimal places through the decimal representation
///
/// Goes through the same formatting as [`coordinate_key`], so the rounded
/// value always prints to the same key as the raw one.
pub fn round_decimal6(value: f64) -> f64 {
    format!("{:.6}", value).parse().unwrap_or(value)
}

/// Load targets from a CSV file with a header row and `ra` / `dec` columns
pub fn load_targets(path: &Path) -> Result<Vec<Target>> {
    let bytes = std::fs::read(path).map_err(|source| Error::Io {
        path: path.to_path_buf(),
        source,
    })?;
    parse_targets(bytes)
}

/// Parse targets from CSV bytes, preserving row order
pub fn parse_targets(csv: Vec<u8>) -> Result<Vec<Target>> {
    let df = CsvReadOptions::default()
        .with_has_header(true)
        .into_reader_with_file_handle(Cursor::new(csv))
        .finish()?;

    let ra = float_column(&df, "ra")?;
    let dec = float_column(&df, "dec")?;

    ra.into_iter()
        .zip(dec)
        .enumerate()
        .map(|(row, coords)| match coords {
            (Some(ra), Some(dec)) => Ok(Target::new(ra, dec)),
            _ => Err(Error::Input(format!(
                "row {} has an empty or non-numeric ra/dec",
                row + 1
            ))),
        })
        .collect()
}

/// Read a column as floats; integer columns are widened, unparsable cells become None
fn float_column(df: &DataFrame, name: &str) -> Result<Vec<Option<f64>>> {
    let column = df
        .column(name)
        .map_err(|_| Error::Input(format!("input CSV has no '{}' column", name)))?;
    let values = column.cast(&DataType::Float64)?;
    let values = values.as_materialized_series().f64()?.into_iter().collect();
    Ok(values)
}
