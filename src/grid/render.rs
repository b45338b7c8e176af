//! Raster rendering of the grid figure
//!
//! The figure is `figure_width_in × figure_height_in` inches at `dpi`, split
//! into `rows × cols` equal cells. Each filled cell holds a square axes box
//! (the extent is square, so equal aspect keeps it square), a title above it,
//! tick labels at both edges and the centre of each axis, and the two axis
//! labels. Text uses `grid.font_path` or the bundled DejaVu Sans.

use super::layout::{GridLayout, ImagePanel, X_LABEL, Y_LABEL};
use crate::config::GridConfig;
use crate::error::{Error, Result};
use ab_glyph::{FontArc, PxScale};
use image::buffer::ConvertBuffer;
use image::imageops::{self, FilterType};
use image::{ImageError, Rgba, RgbImage, RgbaImage};
use imageproc::drawing::{draw_hollow_rect_mut, draw_line_segment_mut, draw_text_mut, text_size};
use imageproc::rect::Rect;
use std::path::Path;

const WHITE: Rgba<u8> = Rgba([255, 255, 255, 255]);
const BLACK: Rgba<u8> = Rgba([0, 0, 0, 255]);
const TRANSPARENT: Rgba<u8> = Rgba([0, 0, 0, 0]);

/// Default label font, bundled so text never depends on the host
static DEJAVU_SANS: &[u8] = include_bytes!("../../assets/DejaVuSans.ttf");

/// Load the configured font, or the bundled DejaVu Sans when none is set
///
/// A configured font that cannot be read or parsed is an error.
pub fn load_font(configured: Option<&Path>) -> Result<FontArc> {
    let Some(path) = configured else {
        return FontArc::try_from_slice(DEJAVU_SANS)
            .map_err(|e| Error::Font(format!("bundled DejaVu Sans: {}", e)));
    };

    let bytes = std::fs::read(path).map_err(|source| Error::Io {
        path: path.to_path_buf(),
        source,
    })?;
    FontArc::try_from_vec(bytes).map_err(|e| Error::Font(format!("{}: {}", path.display(), e)))
}

/// A composite as found (or not) at panel load time
pub enum PanelImage {
    Loaded(RgbaImage),
    Missing,
}

/// Load a panel's composite; a missing file is not an error
pub fn load_panel_image(path: &Path) -> Result<PanelImage> {
    match image::open(path) {
        Ok(img) => Ok(PanelImage::Loaded(img.to_rgba8())),
        Err(ImageError::IoError(e)) if e.kind() == std::io::ErrorKind::NotFound => {
            Ok(PanelImage::Missing)
        }
        Err(e) => Err(e.into()),
    }
}

/// Pixel rectangle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PixelBox {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl PixelBox {
    fn center(&self) -> (f32, f32) {
        (
            self.x as f32 + self.width as f32 / 2.0,
            self.y as f32 + self.height as f32 / 2.0,
        )
    }
}

/// Where text is anchored relative to its (x, y) point
#[derive(Debug, Clone, Copy)]
enum Anchor {
    Center,
    /// Right edge at x, vertically centered
    Right,
}

pub struct Figure {
    canvas: RgbaImage,
    font: FontArc,
    layout: GridLayout,
    title_px: f32,
    label_px: f32,
}

impl Figure {
    pub fn new(grid: &GridConfig, layout: GridLayout, font: FontArc) -> Self {
        let (width, height) = grid.resolve_dimensions();
        Figure {
            canvas: RgbaImage::from_pixel(width, height, WHITE),
            font,
            layout,
            title_px: grid.points_to_px(grid.title_font_pt),
            label_px: grid.points_to_px(grid.label_font_pt),
        }
    }

    pub fn canvas(&self) -> &RgbaImage {
        &self.canvas
    }

    pub fn dimensions(&self) -> (u32, u32) {
        self.canvas.dimensions()
    }

    /// Cell of the grid in pixels
    pub fn cell_box(&self, row: usize, col: usize) -> PixelBox {
        let (width, height) = self.canvas.dimensions();
        let cell_w = width / self.layout.cols as u32;
        let cell_h = height / self.layout.rows as u32;
        PixelBox {
            x: col as u32 * cell_w,
            y: row as u32 * cell_h,
            width: cell_w,
            height: cell_h,
        }
    }

    /// Square axes box inside a cell, leaving room for title, ticks and labels
    pub fn axes_box(&self, row: usize, col: usize) -> PixelBox {
        let cell = self.cell_box(row, col);
        let title_band = (self.title_px * 1.8) as u32;
        let bottom_band = (self.label_px * 3.4) as u32;
        let left_band = (self.label_px * 6.0) as u32;
        let right_pad = (self.label_px * 1.5) as u32;

        let avail_w = cell.width.saturating_sub(left_band + right_pad).max(1);
        let avail_h = cell.height.saturating_sub(title_band + bottom_band).max(1);
        let side = avail_w.min(avail_h);

        PixelBox {
            x: cell.x + left_band + (avail_w - side) / 2,
            y: cell.y + title_band + (avail_h - side) / 2,
            width: side,
            height: side,
        }
    }

    /// Draw a composite with its extent ticks, title and axis labels
    pub fn draw_image_panel(&mut self, panel: &ImagePanel, image: &RgbaImage) {
        let axes = self.axes_box(panel.row, panel.col);

        let scaled = imageops::resize(image, axes.width, axes.height, FilterType::Triangle);
        imageops::overlay(&mut self.canvas, &scaled, axes.x as i64, axes.y as i64);
        self.draw_frame(axes);

        let tick_len = (self.label_px * 0.4).max(1.0);
        let label_px = self.label_px;
        let bottom = (axes.y + axes.height) as f32;
        let left = axes.x as f32;

        // x ticks at left edge, centre, right edge
        let x_values = [panel.extent.left, panel.galactic.l, panel.extent.right];
        for (i, value) in x_values.iter().enumerate() {
            let x = left + axes.width as f32 * i as f32 / 2.0;
            draw_line_segment_mut(&mut self.canvas, (x, bottom), (x, bottom + tick_len), BLACK);
            let text = format!("{:.3}", value);
            self.draw_text(&text, x, bottom + tick_len + label_px * 0.7, label_px, Anchor::Center);
        }

        // y ticks at bottom edge, centre, top edge
        let y_values = [panel.extent.bottom, panel.galactic.b, panel.extent.top];
        for (i, value) in y_values.iter().enumerate() {
            let y = bottom - axes.height as f32 * i as f32 / 2.0;
            draw_line_segment_mut(&mut self.canvas, (left - tick_len, y), (left, y), BLACK);
            let text = format!("{:.3}", value);
            self.draw_text(&text, left - tick_len * 2.0, y, label_px, Anchor::Right);
        }

        let (cx, cy) = axes.center();
        self.draw_text(
            X_LABEL,
            cx,
            bottom + tick_len + label_px * 2.2,
            label_px,
            Anchor::Center,
        );
        self.draw_vertical_text(Y_LABEL, left - label_px * 5.2, cy, label_px);
        self.draw_text(
            &panel.title,
            cx,
            axes.y as f32 - self.title_px * 0.9,
            self.title_px,
            Anchor::Center,
        );
    }

    /// Empty axes with "Image / Not Found" in the middle
    pub fn draw_placeholder(&mut self, row: usize, col: usize) {
        let axes = self.axes_box(row, col);
        self.draw_frame(axes);

        let (cx, cy) = axes.center();
        let px = self.label_px * 1.2;
        self.draw_text("Image", cx, cy - px * 0.6, px, Anchor::Center);
        self.draw_text("Not Found", cx, cy + px * 0.6, px, Anchor::Center);
    }

    fn draw_frame(&mut self, axes: PixelBox) {
        let rect = Rect::at(axes.x as i32, axes.y as i32).of_size(axes.width, axes.height);
        draw_hollow_rect_mut(&mut self.canvas, rect, BLACK);
    }

    fn draw_text(&mut self, text: &str, x: f32, y: f32, px: f32, anchor: Anchor) {
        let font = &self.font;
        let scale = PxScale::from(px);
        let (w, h) = text_size(scale, font, text);
        let left = match anchor {
            Anchor::Center => x - w as f32 / 2.0,
            Anchor::Right => x - w as f32,
        };
        let top = y - h as f32 / 2.0;
        draw_text_mut(
            &mut self.canvas,
            BLACK,
            left.round() as i32,
            top.round() as i32,
            scale,
            font,
            text,
        );
    }

    /// Text rotated 90° counter-clockwise, centered on (x, y)
    fn draw_vertical_text(&mut self, text: &str, x: f32, y: f32, px: f32) {
        let scale = PxScale::from(px);
        let (w, h) = text_size(scale, &self.font, text);
        let mut label = RgbaImage::from_pixel(w + 2, h + 2, TRANSPARENT);
        draw_text_mut(&mut label, BLACK, 1, 1, scale, &self.font, text);

        let rotated = imageops::rotate270(&label);
        let left = x - rotated.width() as f32 / 2.0;
        let top = y - rotated.height() as f32 / 2.0;
        imageops::overlay(
            &mut self.canvas,
            &rotated,
            left.round() as i64,
            top.round() as i64,
        );
    }

    /// Write the figure; the format follows the file extension
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|source| Error::Io {
                path: parent.to_path_buf(),
                source,
            })?;
        }
        let rgb: RgbImage = self.canvas.convert();
        rgb.save(path)?;
        Ok(())
    }
}
