//! Minimal raster chart rendering (line, histogram bar, scatter) to PNG.
//!
//! Charts have axes, tick marks and a light grid but no text: titles and
//! axis labels are left to the client that displays them.

use image::{Rgb, RgbImage};

use crate::error::CoreError;
use crate::imaging::encode_png;
use crate::stats::HistogramBin;

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Default chart size (10 x 6 inches at 100 dpi).
pub const DEFAULT_WIDTH: u32 = 1000;
pub const DEFAULT_HEIGHT: u32 = 600;

/// Scatter plot size (8 x 6 inches at 100 dpi).
pub const SCATTER_WIDTH: u32 = 800;
pub const SCATTER_HEIGHT: u32 = 600;

/// Number of grid divisions along each axis.
const GRID_DIVISIONS: u32 = 5;

/// Margin between the image edge and the plot area, in pixels.
const MARGIN: u32 = 60;

const TICK_LENGTH: u32 = 6;
const MARKER_RADIUS: i64 = 4;

pub const BLUE: Rgb<u8> = Rgb([31, 119, 180]);
pub const RED: Rgb<u8> = Rgb([214, 39, 40]);
pub const GREEN: Rgb<u8> = Rgb([44, 160, 44]);
const BLACK: Rgb<u8> = Rgb([0, 0, 0]);
const WHITE: Rgb<u8> = Rgb([255, 255, 255]);
const GRID: Rgb<u8> = Rgb([225, 225, 225]);

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// A polyline to draw on a line chart.
#[derive(Debug, Clone)]
pub struct Series {
    pub points: Vec<(f64, f64)>,
    pub color: Rgb<u8>,
}

impl Series {
    /// Plot `values` against their index.
    pub fn indexed(values: &[f64], color: Rgb<u8>) -> Self {
        Self {
            points: values
                .iter()
                .enumerate()
                .map(|(i, v)| (i as f64, *v))
                .collect(),
            color,
        }
    }
}

/// Data-space extent of everything drawn on a chart.
#[derive(Debug, Clone, Copy, PartialEq)]
struct Bounds {
    x_min: f64,
    x_max: f64,
    y_min: f64,
    y_max: f64,
}

impl Bounds {
    fn of(points: impl Iterator<Item = (f64, f64)>) -> Option<Self> {
        let mut bounds: Option<Bounds> = None;
        for (x, y) in points.filter(|(x, y)| x.is_finite() && y.is_finite()) {
            let b = bounds.get_or_insert(Bounds {
                x_min: x,
                x_max: x,
                y_min: y,
                y_max: y,
            });
            b.x_min = b.x_min.min(x);
            b.x_max = b.x_max.max(x);
            b.y_min = b.y_min.min(y);
            b.y_max = b.y_max.max(y);
        }
        bounds.map(Bounds::padded)
    }

    /// Widen degenerate ranges so every axis has a non-zero span.
    fn padded(mut self) -> Self {
        if self.x_min == self.x_max {
            self.x_min -= 0.5;
            self.x_max += 0.5;
        }
        if self.y_min == self.y_max {
            self.y_min -= 0.5;
            self.y_max += 0.5;
        }
        self
    }
}

/// A white canvas with a framed plot area and a data-to-pixel mapping.
struct Canvas {
    img: RgbImage,
    left: u32,
    top: u32,
    right: u32,
    bottom: u32,
    bounds: Bounds,
}

impl Canvas {
    fn new(width: u32, height: u32, bounds: Bounds) -> Result<Self, CoreError> {
        if width <= 2 * MARGIN || height <= 2 * MARGIN {
            return Err(CoreError::Validation(format!(
                "Chart must be larger than {0}x{0} pixels",
                2 * MARGIN
            )));
        }
        let mut canvas = Self {
            img: RgbImage::from_pixel(width, height, WHITE),
            left: MARGIN,
            top: MARGIN / 2,
            right: width - MARGIN / 2,
            bottom: height - MARGIN,
            bounds,
        };
        canvas.draw_frame();
        Ok(canvas)
    }

    fn to_px(&self, x: f64, y: f64) -> (i64, i64) {
        let b = &self.bounds;
        let w = f64::from(self.right - self.left);
        let h = f64::from(self.bottom - self.top);
        let px = f64::from(self.left) + (x - b.x_min) / (b.x_max - b.x_min) * w;
        let py = f64::from(self.bottom) - (y - b.y_min) / (b.y_max - b.y_min) * h;
        (px.round() as i64, py.round() as i64)
    }

    fn put(&mut self, x: i64, y: i64, color: Rgb<u8>) {
        if x >= 0 && y >= 0 && x < i64::from(self.img.width()) && y < i64::from(self.img.height()) {
            self.img.put_pixel(x as u32, y as u32, color);
        }
    }

    fn draw_frame(&mut self) {
        let (left, top, right, bottom) = (self.left, self.top, self.right, self.bottom);
        for i in 0..=GRID_DIVISIONS {
            let gx = left + (right - left) * i / GRID_DIVISIONS;
            let gy = top + (bottom - top) * i / GRID_DIVISIONS;
            self.line((gx.into(), top.into()), (gx.into(), bottom.into()), GRID);
            self.line((left.into(), gy.into()), (right.into(), gy.into()), GRID);
            // Tick marks outside the plot area.
            self.line(
                (gx.into(), bottom.into()),
                (gx.into(), (bottom + TICK_LENGTH).into()),
                BLACK,
            );
            self.line(
                ((left - TICK_LENGTH).into(), gy.into()),
                (left.into(), gy.into()),
                BLACK,
            );
        }
        self.line((left.into(), top.into()), (left.into(), bottom.into()), BLACK);
        self.line((left.into(), bottom.into()), (right.into(), bottom.into()), BLACK);
    }

    /// Bresenham line between two pixel positions.
    fn line(&mut self, from: (i64, i64), to: (i64, i64), color: Rgb<u8>) {
        let (mut x0, mut y0) = from;
        let (x1, y1) = to;
        let dx = (x1 - x0).abs();
        let dy = -(y1 - y0).abs();
        let sx = if x0 < x1 { 1 } else { -1 };
        let sy = if y0 < y1 { 1 } else { -1 };
        let mut err = dx + dy;
        loop {
            self.put(x0, y0, color);
            if x0 == x1 && y0 == y1 {
                break;
            }
            let e2 = 2 * err;
            if e2 >= dy {
                err += dy;
                x0 += sx;
            }
            if e2 <= dx {
                err += dx;
                y0 += sy;
            }
        }
    }

    /// Two-pixel-wide line for data series.
    fn thick_line(&mut self, from: (i64, i64), to: (i64, i64), color: Rgb<u8>) {
        self.line(from, to, color);
        self.line((from.0, from.1 + 1), (to.0, to.1 + 1), color);
    }

    fn fill_rect(&mut self, x0: i64, y0: i64, x1: i64, y1: i64, color: Rgb<u8>) {
        for y in y0.min(y1)..=y0.max(y1) {
            for x in x0.min(x1)..=x0.max(x1) {
                self.put(x, y, color);
            }
        }
    }

    fn outline_rect(&mut self, x0: i64, y0: i64, x1: i64, y1: i64, color: Rgb<u8>) {
        self.line((x0, y0), (x1, y0), color);
        self.line((x1, y0), (x1, y1), color);
        self.line((x1, y1), (x0, y1), color);
        self.line((x0, y1), (x0, y0), color);
    }

    fn disc(&mut self, cx: i64, cy: i64, radius: i64, color: Rgb<u8>) {
        for dy in -radius..=radius {
            for dx in -radius..=radius {
                if dx * dx + dy * dy <= radius * radius {
                    self.put(cx + dx, cy + dy, color);
                }
            }
        }
    }

    fn finish(self) -> Result<Vec<u8>, CoreError> {
        encode_png(&self.img)
    }
}

fn no_data() -> CoreError {
    CoreError::Validation("Nothing to plot: no finite data points".to_string())
}

// ---------------------------------------------------------------------------
// Chart kinds
// ---------------------------------------------------------------------------

/// Draw one or more polylines sharing the same axes.
pub fn line_chart(series: &[Series], width: u32, height: u32) -> Result<Vec<u8>, CoreError> {
    let bounds = Bounds::of(series.iter().flat_map(|s| s.points.iter().copied()))
        .ok_or_else(no_data)?;
    let mut canvas = Canvas::new(width, height, bounds)?;
    for s in series {
        let pixels: Vec<(i64, i64)> = s
            .points
            .iter()
            .filter(|(x, y)| x.is_finite() && y.is_finite())
            .map(|(x, y)| canvas.to_px(*x, *y))
            .collect();
        match pixels.as_slice() {
            [single] => canvas.disc(single.0, single.1, MARKER_RADIUS / 2, s.color),
            _ => {
                for pair in pixels.windows(2) {
                    canvas.thick_line(pair[0], pair[1], s.color);
                }
            }
        }
    }
    canvas.finish()
}

/// Draw histogram buckets as adjacent filled bars with black edges.
pub fn bar_chart(
    bins: &[HistogramBin],
    color: Rgb<u8>,
    width: u32,
    height: u32,
) -> Result<Vec<u8>, CoreError> {
    let first = bins.first().ok_or_else(no_data)?;
    let last = bins.last().ok_or_else(no_data)?;
    let max_count = bins.iter().map(|b| b.count).max().unwrap_or(0).max(1);
    let bounds = Bounds {
        x_min: first.start,
        x_max: last.end,
        y_min: 0.0,
        y_max: max_count as f64 * 1.05,
    }
    .padded();

    let mut canvas = Canvas::new(width, height, bounds)?;
    for bin in bins.iter().filter(|b| b.count > 0) {
        let (x0, y0) = canvas.to_px(bin.start, bin.count as f64);
        let (x1, y1) = canvas.to_px(bin.end, 0.0);
        canvas.fill_rect(x0, y0, x1, y1, color);
        canvas.outline_rect(x0, y0, x1, y1, BLACK);
    }
    canvas.finish()
}

/// Draw each point as a filled circular marker.
pub fn scatter_chart(
    points: &[(f64, f64)],
    color: Rgb<u8>,
    width: u32,
    height: u32,
) -> Result<Vec<u8>, CoreError> {
    let bounds = Bounds::of(points.iter().copied()).ok_or_else(no_data)?;
    // Keep markers off the frame.
    let x_pad = (bounds.x_max - bounds.x_min) * 0.05;
    let y_pad = (bounds.y_max - bounds.y_min) * 0.05;
    let bounds = Bounds {
        x_min: bounds.x_min - x_pad,
        x_max: bounds.x_max + x_pad,
        y_min: bounds.y_min - y_pad,
        y_max: bounds.y_max + y_pad,
    };

    let mut canvas = Canvas::new(width, height, bounds)?;
    for (x, y) in points.iter().filter(|(x, y)| x.is_finite() && y.is_finite()) {
        let (px, py) = canvas.to_px(*x, *y);
        canvas.disc(px, py, MARKER_RADIUS, color);
    }
    canvas.finish()
}
