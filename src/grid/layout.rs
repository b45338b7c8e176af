//! Panel planning for the grid figure
//!
//! Pure geometry and labelling: which target goes in which cell, where its
//! composite should be, what galactic extent and title it carries. Loading
//! and drawing happen in `render.rs`.

use crate::config::{GridConfig, SurveyConfig};
use crate::ds9::export_path;
use crate::sky::{equatorial_to_galactic, Galactic};
use crate::targets::Target;
use std::path::PathBuf;

pub const X_LABEL: &str = "Galactic Longitude";
pub const Y_LABEL: &str = "Galactic Latitude";

/// Axis extent of a panel in degrees: `[left, right] × [bottom, top]`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Extent {
    pub left: f64,
    pub right: f64,
    pub bottom: f64,
    pub top: f64,
}

impl Extent {
    /// Square extent of `size` degrees centered on `center`
    pub fn centered(center: Galactic, size: f64) -> Self {
        let half = size * 0.5;
        Extent {
            left: center.l - half,
            right: center.l + half,
            bottom: center.b - half,
            top: center.b + half,
        }
    }
}

/// A panel that shows (or tries to show) one target's composite
#[derive(Debug, Clone, PartialEq)]
pub struct ImagePanel {
    /// 0-based position in the grid, row-major
    pub index: usize,
    pub row: usize,
    pub col: usize,
    pub key: String,
    pub image_path: PathBuf,
    pub galactic: Galactic,
    pub extent: Extent,
    pub title: String,
}

/// Grid shape and the number of panels actually filled
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GridLayout {
    pub rows: usize,
    pub cols: usize,
    pub effective: usize,
}

impl GridLayout {
    /// `effective = min(max_images, rows × cols, n_targets)`
    pub fn new(rows: usize, cols: usize, max_images: usize, n_targets: usize) -> Self {
        GridLayout {
            rows,
            cols,
            effective: max_images.min(rows * cols).min(n_targets),
        }
    }

    pub fn capacity(&self) -> usize {
        self.rows * self.cols
    }

    /// Cell of a row-major panel index
    pub fn cell(&self, index: usize) -> (usize, usize) {
        (index / self.cols, index % self.cols)
    }

    /// Cells past the filled prefix, which stay hidden
    pub fn hidden_cells(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        (self.effective..self.capacity()).map(move |i| self.cell(i))
    }
}

/// Plan every filled panel of the grid
///
/// Coordinates are rounded to the 6 decimals of the file key before the
/// galactic conversion, so a panel's extent and title describe exactly the
/// position its file name encodes.
pub fn plan_panels(
    grid: &GridConfig,
    survey: &SurveyConfig,
    targets: &[Target],
) -> (GridLayout, Vec<ImagePanel>) {
    let layout = GridLayout::new(grid.rows, grid.cols, grid.max_images, targets.len());
    let size = grid.panel_size_deg();

    let panels = targets
        .iter()
        .take(layout.effective)
        .enumerate()
        .map(|(index, target)| {
            let rounded = target.rounded();
            let key = rounded.key();
            let galactic = equatorial_to_galactic(rounded.ra, rounded.dec);
            let (row, col) = layout.cell(index);

            ImagePanel {
                index,
                row,
                col,
                image_path: export_path(survey, &key),
                key,
                galactic,
                extent: Extent::centered(galactic, size),
                title: panel_title(&grid.title_prefix, index, galactic),
            }
        })
        .collect();

    (layout, panels)
}

/// `"{prefix} {index + 1} ({l:.4}, {b:.4})"`
pub fn panel_title(prefix: &str, index: usize, galactic: Galactic) -> String {
    let label = format!("{} ({:.4}, {:.4})", index + 1, galactic.l, galactic.b);
    if prefix.is_empty() {
        label
    } else {
        format!("{} {}", prefix, label)
    }
}
