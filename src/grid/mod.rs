//! Grid visualizer
//!
//! Structure:
//! - `layout.rs`: panel planning (cells, keys, galactic extents, titles)
//! - `render.rs`: raster figure, fonts, composite loading

pub mod layout;
pub mod render;

pub use layout::{plan_panels, Extent, GridLayout, ImagePanel};
pub use render::{load_font, load_panel_image, Figure, PanelImage};

use crate::config::RunConfig;
use crate::error::Result;
use crate::targets::Target;
use tracing::{info, warn};

/// What went into the figure
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GridSummary {
    pub rendered: usize,
    pub missing: usize,
    pub hidden: usize,
    pub width: u32,
    pub height: u32,
}

/// Draw every planned panel; composites that are absent become placeholders
pub fn build_figure(config: &RunConfig, targets: &[Target]) -> Result<(Figure, GridSummary)> {
    let survey = config.grid_survey()?;
    let (layout, panels) = plan_panels(&config.grid, survey, targets);

    let font = load_font(config.grid.font_path.as_deref())?;

    let mut figure = Figure::new(&config.grid, layout, font);
    let (width, height) = figure.dimensions();
    info!(
        "  Grid {}×{}, {} panel(s), figure {}×{} pixels",
        layout.rows, layout.cols, layout.effective, width, height
    );

    let mut rendered = 0;
    let mut missing = 0;
    for panel in &panels {
        match load_panel_image(&panel.image_path)? {
            PanelImage::Loaded(image) => {
                figure.draw_image_panel(panel, &image);
                rendered += 1;
            }
            PanelImage::Missing => {
                warn!("Image not found: {}", panel.image_path.display());
                figure.draw_placeholder(panel.row, panel.col);
                missing += 1;
            }
        }
    }

    let summary = GridSummary {
        rendered,
        missing,
        hidden: layout.hidden_cells().count(),
        width,
        height,
    };
    Ok((figure, summary))
}

/// Build the grid figure and write it to `grid.output_path`
pub fn render_grid(config: &RunConfig, targets: &[Target]) -> Result<GridSummary> {
    let (figure, summary) = build_figure(config, targets)?;
    figure.save(&config.grid.output_path)?;

    info!(
        "✓ Saved {} ({} rendered, {} missing, {} hidden)",
        config.grid.output_path.display(),
        summary.rendered,
        summary.missing,
        summary.hidden
    );
    Ok(summary)
}
