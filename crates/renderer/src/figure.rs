//! Figure layout: axes in normalized figure coordinates, heatmap panels,
//! gridlines and colorbars.
//!
//! Rectangles are `[left, bottom, width, height]` in `[0, 1]`, measured from
//! the bottom-left corner of the figure.

use std::path::Path;

use eddy_grid::MaskedGrid;
use rusttype::Font;
use tracing::debug;

use crate::canvas::{text_width, Canvas, PixelRect, Segment};
use crate::colormap::{Color, Colormap};
use crate::error::{RenderError, RenderResult};
use crate::gradient::{render_masked_grid, Extent, Norm};
use crate::png;

const GRID_COLOR: Color = Color::new(176, 176, 176, 160);
const FRAME_COLOR: Color = Color::BLACK;
const TICK_LENGTH: usize = 4;
const DEFAULT_FONT_SIZE: f32 = 16.0;

/// Normalized figure rectangle `[left, bottom, width, height]`.
pub type FigureRect = [f64; 4];

/// One set of axes placed on a figure.
#[derive(Debug, Clone)]
pub struct Axes {
    pub rect: FigureRect,
    frame: PixelRect,
    pub xlim: (f64, f64),
    pub ylim: (f64, f64),
    pub equal_aspect: bool,
    pub grid_step: Option<f64>,
    pub title: Option<String>,
}

impl Axes {
    pub fn set_xlim(&mut self, xmin: f64, xmax: f64) -> &mut Self {
        self.xlim = (xmin, xmax);
        self
    }

    pub fn set_ylim(&mut self, ymin: f64, ymax: f64) -> &mut Self {
        self.ylim = (ymin, ymax);
        self
    }

    /// One data unit on x spans as many pixels as one on y.
    pub fn set_aspect_equal(&mut self) -> &mut Self {
        self.equal_aspect = true;
        self
    }

    /// Gridlines every `step` data units.
    pub fn grid(&mut self, step: f64) -> &mut Self {
        self.grid_step = (step > 0.0).then_some(step);
        self
    }

    pub fn set_title(&mut self, title: impl Into<String>) -> &mut Self {
        self.title = Some(title.into());
        self
    }

    /// Pixel rectangle given by `rect`.
    pub fn frame(&self) -> PixelRect {
        self.frame
    }

    /// Pixel rectangle actually used for data: the frame, shrunk around its
    /// centre when an equal aspect is requested.
    pub fn plot_box(&self) -> PixelRect {
        if !self.equal_aspect {
            return self.frame;
        }
        let dx = (self.xlim.1 - self.xlim.0).abs();
        let dy = (self.ylim.1 - self.ylim.0).abs();
        if dx == 0.0 || dy == 0.0 || self.frame.is_empty() {
            return self.frame;
        }
        let scale = (self.frame.width as f64 / dx).min(self.frame.height as f64 / dy);
        let width = ((dx * scale).round() as usize).clamp(1, self.frame.width);
        let height = ((dy * scale).round() as usize).clamp(1, self.frame.height);
        PixelRect {
            x: self.frame.x + (self.frame.width - width) / 2,
            y: self.frame.y + (self.frame.height - height) / 2,
            width,
            height,
        }
    }

    /// Pixel column of data `x` inside the plot box.
    pub fn x_to_px(&self, x: f64) -> f64 {
        let b = self.plot_box();
        b.x as f64 + (x - self.xlim.0) / (self.xlim.1 - self.xlim.0) * b.width as f64
    }

    /// Pixel row of data `y` inside the plot box (rows grow downward).
    pub fn y_to_px(&self, y: f64) -> f64 {
        let b = self.plot_box();
        b.y as f64 + (self.ylim.1 - y) / (self.ylim.1 - self.ylim.0) * b.height as f64
    }

    fn view(&self) -> Extent {
        Extent {
            x: self.xlim,
            y: self.ylim,
        }
    }
}

/// Colorbar orientation, derived from its rectangle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Orientation {
    Vertical,
    Horizontal,
}

#[derive(Debug, Clone)]
pub struct Colorbar {
    pub rect: FigureRect,
    frame: PixelRect,
    pub orientation: Orientation,
    pub norm: Norm,
    pub label: Option<String>,
}

impl Colorbar {
    pub fn frame(&self) -> PixelRect {
        self.frame
    }
}

/// Raster figure.
pub struct Figure {
    canvas: Canvas,
    font: Option<Font<'static>>,
    font_size: f32,
    title: Option<String>,
    panel_titles: Vec<String>,
    colorbar_labels: Vec<String>,
}

impl Figure {
    /// White figure of `width x height` pixels.
    pub fn new(width: usize, height: usize) -> RenderResult<Self> {
        Ok(Self {
            canvas: Canvas::new(width, height, Color::WHITE)?,
            font: None,
            font_size: DEFAULT_FONT_SIZE,
            title: None,
            panel_titles: Vec::new(),
            colorbar_labels: Vec::new(),
        })
    }

    pub fn width(&self) -> usize {
        self.canvas.width()
    }

    pub fn height(&self) -> usize {
        self.canvas.height()
    }

    pub fn canvas(&self) -> &Canvas {
        &self.canvas
    }

    pub fn set_title(&mut self, title: impl Into<String>) {
        self.title = Some(title.into());
    }

    pub fn panel_titles(&self) -> &[String] {
        &self.panel_titles
    }

    /// Draw titles and tick labels with `font`. Without a font, text only
    /// goes to the PNG metadata.
    pub fn set_font(&mut self, font: Font<'static>, size: f32) {
        self.font = Some(font);
        self.font_size = size;
    }

    /// Load a TrueType font from disk, see [`Figure::set_font`].
    pub fn load_font<P: AsRef<Path>>(&mut self, path: P, size: f32) -> RenderResult<()> {
        let path = path.as_ref();
        let bytes = std::fs::read(path)?;
        let font = Font::try_from_vec(bytes)
            .ok_or_else(|| RenderError::InvalidFont(path.display().to_string()))?;
        debug!(path = %path.display(), size, "Loaded font");
        self.set_font(font, size);
        Ok(())
    }

    pub fn has_font(&self) -> bool {
        self.font.is_some()
    }

    /// Convert a normalized rectangle to pixels.
    pub fn pixel_rect(&self, rect: FigureRect) -> RenderResult<PixelRect> {
        let [left, bottom, width, height] = rect;
        let inside = |v: f64| (-1e-9..=1.0 + 1e-9).contains(&v);
        if !(width > 0.0 && height > 0.0)
            || !inside(left)
            || !inside(bottom)
            || !inside(left + width)
            || !inside(bottom + height)
        {
            return Err(RenderError::InvalidLayout(format!(
                "rectangle {:?} is not inside the figure",
                rect
            )));
        }
        let (w, h) = (self.width() as f64, self.height() as f64);
        let x0 = (left * w).round() as usize;
        let x1 = ((left + width) * w).round() as usize;
        let y0 = ((1.0 - bottom - height) * h).round().max(0.0) as usize;
        let y1 = ((1.0 - bottom) * h).round() as usize;
        let px = PixelRect {
            x: x0,
            y: y0,
            width: x1.min(self.width()).saturating_sub(x0),
            height: y1.min(self.height()).saturating_sub(y0),
        };
        if px.is_empty() {
            return Err(RenderError::InvalidLayout(format!(
                "rectangle {:?} is smaller than a pixel",
                rect
            )));
        }
        Ok(px)
    }

    /// New axes at `rect`, limits `(0, 1)` on both axes.
    pub fn add_axes(&self, rect: FigureRect) -> RenderResult<Axes> {
        Ok(Axes {
            rect,
            frame: self.pixel_rect(rect)?,
            xlim: (0.0, 1.0),
            ylim: (0.0, 1.0),
            equal_aspect: false,
            grid_step: None,
            title: None,
        })
    }

    /// Paint `grid`, whose cells cover `grid_extent`, inside the axes.
    pub fn pcolormesh(
        &mut self,
        axes: &Axes,
        grid: &MaskedGrid,
        grid_extent: Extent,
        cmap: &Colormap,
        norm: &Norm,
    ) -> RenderResult<()> {
        norm.validate()?;
        if !(axes.xlim.1 > axes.xlim.0 && axes.ylim.1 > axes.ylim.0) {
            return Err(RenderError::InvalidLayout(format!(
                "empty axes limits x {:?} y {:?}",
                axes.xlim, axes.ylim
            )));
        }
        let target = axes.plot_box();
        let rgba = render_masked_grid(
            grid,
            grid_extent,
            axes.view(),
            target.width,
            target.height,
            cmap,
            norm,
        );
        self.canvas.blit(target, &rgba)?;
        debug!(
            x = target.x,
            y = target.y,
            width = target.width,
            height = target.height,
            "Painted panel"
        );
        Ok(())
    }

    /// Gridlines, frame with tick marks, tick labels and title.
    pub fn decorate(&mut self, axes: &Axes) {
        let b = axes.plot_box();
        if b.is_empty() {
            return;
        }
        let ticks_x = axes
            .grid_step
            .map(|s| multiples(axes.xlim, s))
            .unwrap_or_default();
        let ticks_y = axes
            .grid_step
            .map(|s| multiples(axes.ylim, s))
            .unwrap_or_default();
        let (right, bottom) = (b.right() - 1, b.bottom() - 1);

        let x_px: Vec<usize> = ticks_x
            .iter()
            .map(|&x| (axes.x_to_px(x).floor() as usize).min(right))
            .collect();
        let y_px: Vec<usize> = ticks_y
            .iter()
            .map(|&y| (axes.y_to_px(y).floor() as usize).min(bottom))
            .collect();

        let mut gridlines: Vec<Segment> = Vec::new();
        let mut ticks: Vec<Segment> = Vec::new();
        for &px in &x_px {
            gridlines.push(((px, b.y), (px, bottom)));
            ticks.push(((px, bottom.saturating_sub(TICK_LENGTH)), (px, bottom)));
        }
        for &py in &y_px {
            gridlines.push(((b.x, py), (right, py)));
            ticks.push(((b.x, py), ((b.x + TICK_LENGTH).min(right), py)));
        }
        self.canvas.stroke_segments(&gridlines, GRID_COLOR);
        self.canvas.stroke_segments(&ticks, FRAME_COLOR);
        self.canvas.stroke_rect(b, FRAME_COLOR);

        if let Some(font) = &self.font {
            let size = self.font_size;
            let label_size = size * 0.8;
            for (&x, &px) in ticks_x.iter().zip(&x_px) {
                let text = tick_label(x);
                let w = text_width(font, label_size, &text);
                let left = (px as f32 - w / 2.0).max(0.0);
                self.canvas
                    .draw_text(font, label_size, &text, left, (bottom + 3) as f32, FRAME_COLOR);
            }
            for (&y, &py) in ticks_y.iter().zip(&y_px) {
                let text = tick_label(y);
                let w = text_width(font, label_size, &text);
                let left = (b.x as f32 - w - 3.0).max(0.0);
                let top = (py as f32 - label_size / 2.0).max(0.0);
                self.canvas
                    .draw_text(font, label_size, &text, left, top, FRAME_COLOR);
            }
            if let Some(title) = &axes.title {
                let w = text_width(font, size, title);
                let left = (b.x as f32 + (b.width as f32 - w) / 2.0).max(0.0);
                let top = (b.y as f32 - size - 4.0).max(axes.frame.y as f32);
                self.canvas.draw_text(font, size, title, left, top, FRAME_COLOR);
            }
        }

        if let Some(title) = &axes.title {
            self.panel_titles.push(title.clone());
        }
    }

    /// Colour ramp of `cmap` through `norm` drawn in `rect`, vertical when
    /// the rectangle is taller than wide.
    pub fn colorbar(
        &mut self,
        rect: FigureRect,
        cmap: &Colormap,
        norm: Norm,
        label: Option<&str>,
    ) -> RenderResult<Colorbar> {
        norm.validate()?;
        let frame = self.pixel_rect(rect)?;
        let orientation = if frame.height >= frame.width {
            Orientation::Vertical
        } else {
            Orientation::Horizontal
        };

        match orientation {
            Orientation::Vertical => {
                for row in 0..frame.height {
                    // bottom row is the low end
                    let t = (frame.height - 1 - row) as f64 / (frame.height.max(2) - 1) as f64;
                    let band = PixelRect {
                        y: frame.y + row,
                        height: 1,
                        ..frame
                    };
                    self.canvas.fill_rect(band, cmap.at(t));
                }
            }
            Orientation::Horizontal => {
                for col in 0..frame.width {
                    let t = col as f64 / (frame.width.max(2) - 1) as f64;
                    let band = PixelRect {
                        x: frame.x + col,
                        width: 1,
                        ..frame
                    };
                    self.canvas.fill_rect(band, cmap.at(t));
                }
            }
        }

        let mut marks: Vec<(f64, Segment)> = Vec::new();
        for tick in norm.ticks() {
            let Some(t) = norm.normalize(tick) else {
                continue;
            };
            let segment = match orientation {
                Orientation::Vertical => {
                    let y = frame.y + ((1.0 - t) * (frame.height - 1) as f64).round() as usize;
                    let x = frame.right() - 1;
                    ((x, y), (x + TICK_LENGTH, y))
                }
                Orientation::Horizontal => {
                    let x = frame.x + (t * (frame.width - 1) as f64).round() as usize;
                    let y = frame.bottom() - 1;
                    ((x, y), (x, y + TICK_LENGTH))
                }
            };
            marks.push((tick, segment));
        }
        let segments: Vec<Segment> = marks.iter().map(|&(_, s)| s).collect();
        self.canvas.stroke_segments(&segments, FRAME_COLOR);
        self.canvas.stroke_rect(frame, FRAME_COLOR);

        if let Some(font) = &self.font {
            let size = self.font_size * 0.8;
            for &(tick, ((_, _), (x, y))) in &marks {
                let text = tick_label(tick);
                let (left, top) = match orientation {
                    Orientation::Vertical => ((x + 2) as f32, y as f32 - size / 2.0),
                    Orientation::Horizontal => {
                        (x as f32 - text_width(font, size, &text) / 2.0, (y + 2) as f32)
                    }
                };
                self.canvas
                    .draw_text(font, size, &text, left.max(0.0), top.max(0.0), FRAME_COLOR);
            }
        }

        if let Some(label) = label {
            self.colorbar_labels.push(label.to_string());
        }
        Ok(Colorbar {
            rect,
            frame,
            orientation,
            norm,
            label: label.map(str::to_string),
        })
    }

    /// Key/value pairs written as PNG text chunks.
    pub fn text_metadata(&self) -> Vec<(String, String)> {
        let mut text = Vec::new();
        if let Some(title) = &self.title {
            text.push(("Title".to_string(), title.clone()));
        }
        for (i, title) in self.panel_titles.iter().enumerate() {
            text.push((format!("Panel {}", i + 1), title.clone()));
        }
        for (i, label) in self.colorbar_labels.iter().enumerate() {
            text.push((format!("Colorbar {}", i + 1), label.clone()));
        }
        text.push(("Software".to_string(), "eddy-density".to_string()));
        text
    }

    pub fn to_png(&self) -> RenderResult<Vec<u8>> {
        let text = self.text_metadata();
        let text: Vec<(&str, &str)> = text.iter().map(|(k, v)| (k.as_str(), v.as_str())).collect();
        png::create_png_auto(&self.canvas.to_rgba(), self.width(), self.height(), &text)
    }

    pub fn save<P: AsRef<Path>>(&self, path: P) -> RenderResult<()> {
        let bytes = self.to_png()?;
        std::fs::write(path, bytes)?;
        Ok(())
    }
}

/// Tick value as printed next to a gridline or colorbar.
fn tick_label(value: f64) -> String {
    if (value - value.round()).abs() < 1e-9 {
        return format!("{}", value.round() as i64);
    }
    let text = format!("{:.3}", value);
    text.trim_end_matches('0').trim_end_matches('.').to_string()
}

/// Multiples of `step` inside `range`, bounds included.
fn multiples(range: (f64, f64), step: f64) -> Vec<f64> {
    let (lo, hi) = if range.0 <= range.1 {
        range
    } else {
        (range.1, range.0)
    };
    let first = (lo / step - 1e-9).ceil() as i64;
    let last = (hi / step + 1e-9).floor() as i64;
    (first..=last).map(|i| i as f64 * step).collect()
}
