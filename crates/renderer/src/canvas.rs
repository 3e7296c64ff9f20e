//! Drawing surface for figures, backed by a tiny-skia pixmap.
//!
//! Pixel coordinates have their origin at the top-left corner. Lines and
//! outlines are one pixel wide and run through pixel centres so they stay
//! crisp.

use rusttype::{point, Font, Scale};
use tiny_skia::{
    ColorU8, IntSize, LineCap, LineJoin, Paint, PathBuilder, Pixmap, PixmapPaint,
    PremultipliedColorU8, Rect, Stroke, Transform,
};

use crate::colormap::Color;
use crate::error::{RenderError, RenderResult};

/// Pixel rectangle, origin at the top-left corner.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PixelRect {
    pub x: usize,
    pub y: usize,
    pub width: usize,
    pub height: usize,
}

impl PixelRect {
    pub fn right(&self) -> usize {
        self.x + self.width
    }

    pub fn bottom(&self) -> usize {
        self.y + self.height
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    fn to_skia(self) -> Option<Rect> {
        Rect::from_xywh(
            self.x as f32,
            self.y as f32,
            self.width as f32,
            self.height as f32,
        )
    }
}

/// Segment between two pixels, both ends included.
pub type Segment = ((usize, usize), (usize, usize));

#[derive(Debug, Clone)]
pub struct Canvas {
    pixmap: Pixmap,
}

impl Canvas {
    pub fn new(width: usize, height: usize, background: Color) -> RenderResult<Self> {
        let mut pixmap = Pixmap::new(width as u32, height as u32).ok_or_else(|| {
            RenderError::InvalidLayout(format!("cannot create a {}x{} canvas", width, height))
        })?;
        pixmap.fill(tiny_skia::Color::from_rgba8(
            background.r,
            background.g,
            background.b,
            background.a,
        ));
        Ok(Self { pixmap })
    }

    pub fn width(&self) -> usize {
        self.pixmap.width() as usize
    }

    pub fn height(&self) -> usize {
        self.pixmap.height() as usize
    }

    /// Straight-alpha RGBA bytes, row-major from the top row.
    pub fn to_rgba(&self) -> Vec<u8> {
        self.pixmap
            .pixels()
            .iter()
            .flat_map(|p| {
                let c = p.demultiply();
                [c.red(), c.green(), c.blue(), c.alpha()]
            })
            .collect()
    }

    pub fn pixel(&self, x: usize, y: usize) -> Option<Color> {
        let c = self.pixmap.pixel(x as u32, y as u32)?.demultiply();
        Some(Color::new(c.red(), c.green(), c.blue(), c.alpha()))
    }

    pub fn fill_rect(&mut self, rect: PixelRect, color: Color) {
        let Some(r) = rect.to_skia() else {
            return;
        };
        self.pixmap
            .fill_rect(r, &paint(color), Transform::identity(), None);
    }

    /// Draw straight one pixel wide segments.
    pub fn stroke_segments(&mut self, segments: &[Segment], color: Color) {
        let mut pb = PathBuilder::new();
        for &((x0, y0), (x1, y1)) in segments {
            pb.move_to(x0 as f32 + 0.5, y0 as f32 + 0.5);
            pb.line_to(x1 as f32 + 0.5, y1 as f32 + 0.5);
        }
        let Some(path) = pb.finish() else {
            return;
        };
        let stroke = Stroke {
            width: 1.0,
            line_cap: LineCap::Square,
            ..Stroke::default()
        };
        self.pixmap
            .stroke_path(&path, &paint(color), &stroke, Transform::identity(), None);
    }

    /// One pixel wide outline just inside `rect`.
    pub fn stroke_rect(&mut self, rect: PixelRect, color: Color) {
        if rect.is_empty() {
            return;
        }
        if rect.width < 3 || rect.height < 3 {
            self.fill_rect(rect, color);
            return;
        }
        let outline = Rect::from_xywh(
            rect.x as f32 + 0.5,
            rect.y as f32 + 0.5,
            rect.width as f32 - 1.0,
            rect.height as f32 - 1.0,
        );
        let Some(outline) = outline else {
            return;
        };
        let path = PathBuilder::from_rect(outline);
        let stroke = Stroke {
            width: 1.0,
            line_join: LineJoin::Miter,
            ..Stroke::default()
        };
        self.pixmap
            .stroke_path(&path, &paint(color), &stroke, Transform::identity(), None);
    }

    /// Composite a straight-alpha RGBA buffer of `rect.width x rect.height`
    /// at `rect`.
    pub fn blit(&mut self, rect: PixelRect, rgba: &[u8]) -> RenderResult<()> {
        let Some(size) = IntSize::from_wh(rect.width as u32, rect.height as u32) else {
            return Ok(());
        };
        let data: Vec<u8> = rgba
            .chunks_exact(4)
            .flat_map(|p| {
                let c = ColorU8::from_rgba(p[0], p[1], p[2], p[3]).premultiply();
                [c.red(), c.green(), c.blue(), c.alpha()]
            })
            .collect();
        let layer = Pixmap::from_vec(data, size).ok_or_else(|| {
            RenderError::InvalidLayout(format!(
                "{} bytes do not fill a {}x{} layer",
                rgba.len(),
                rect.width,
                rect.height
            ))
        })?;
        self.pixmap.draw_pixmap(
            rect.x as i32,
            rect.y as i32,
            layer.as_ref(),
            &PixmapPaint::default(),
            Transform::identity(),
            None,
        );
        Ok(())
    }

    /// Render `text` with its top-left corner at (`x`, `y`).
    pub fn draw_text(&mut self, font: &Font<'_>, size: f32, text: &str, x: f32, y: f32, color: Color) {
        let scale = Scale::uniform(size);
        let ascent = font.v_metrics(scale).ascent;
        let glyphs: Vec<_> = font.layout(text, scale, point(0.0, ascent)).collect();

        let boxes: Vec<_> = glyphs.iter().filter_map(|g| g.pixel_bounding_box()).collect();
        let (Some(min_x), Some(min_y)) = (
            boxes.iter().map(|b| b.min.x).min(),
            boxes.iter().map(|b| b.min.y).min(),
        ) else {
            return;
        };
        let max_x = boxes.iter().map(|b| b.max.x).max().unwrap_or(min_x);
        let max_y = boxes.iter().map(|b| b.max.y).max().unwrap_or(min_y);
        let (w, h) = ((max_x - min_x) as u32, (max_y - min_y) as u32);
        let Some(mut layer) = Pixmap::new(w, h) else {
            return;
        };

        let stride = w as usize;
        let pixels = layer.pixels_mut();
        for glyph in &glyphs {
            let Some(bb) = glyph.pixel_bounding_box() else {
                continue;
            };
            glyph.draw(|gx, gy, coverage| {
                let lx = (bb.min.x - min_x) as usize + gx as usize;
                let ly = (bb.min.y - min_y) as usize + gy as usize;
                let alpha = (coverage.clamp(0.0, 1.0) * color.a as f32).round() as u8;
                let Some(dst) = pixels.get_mut(ly * stride + lx) else {
                    return;
                };
                if alpha > dst.alpha() {
                    *dst = premultiplied(color, alpha);
                }
            });
        }

        self.pixmap.draw_pixmap(
            (x.round() as i32) + min_x,
            (y.round() as i32) + min_y,
            layer.as_ref(),
            &PixmapPaint::default(),
            Transform::identity(),
            None,
        );
    }
}

/// Advance width of `text` in pixels.
pub fn text_width(font: &Font<'_>, size: f32, text: &str) -> f32 {
    let scale = Scale::uniform(size);
    font.layout(text, scale, point(0.0, 0.0))
        .last()
        .map(|g| g.position().x + g.unpositioned().h_metrics().advance_width)
        .unwrap_or(0.0)
}

fn paint(color: Color) -> Paint<'static> {
    let mut paint = Paint::default();
    paint.set_color_rgba8(color.r, color.g, color.b, color.a);
    paint.anti_alias = false;
    paint
}

fn premultiplied(color: Color, alpha: u8) -> PremultipliedColorU8 {
    ColorU8::from_rgba(color.r, color.g, color.b, alpha).premultiply()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dark(c: Option<Color>) -> bool {
        c.map_or(false, |c| c.r < 64 && c.g < 64 && c.b < 64)
    }

    #[test]
    fn test_new_fills_background() {
        let canvas = Canvas::new(3, 2, Color::WHITE).unwrap();
        assert_eq!(canvas.to_rgba().len(), 24);
        assert!(canvas.to_rgba().iter().all(|&b| b == 255));
    }

    #[test]
    fn test_empty_canvas_is_error() {
        assert!(Canvas::new(0, 10, Color::WHITE).is_err());
    }

    #[test]
    fn test_stroke_rect() {
        let mut canvas = Canvas::new(6, 6, Color::WHITE).unwrap();
        let rect = PixelRect { x: 1, y: 1, width: 4, height: 4 };
        canvas.stroke_rect(rect, Color::BLACK);
        assert!(dark(canvas.pixel(1, 1)));
        assert!(dark(canvas.pixel(4, 4)));
        assert!(dark(canvas.pixel(4, 2)));
        assert_eq!(canvas.pixel(2, 2), Some(Color::WHITE));
        assert_eq!(canvas.pixel(0, 0), Some(Color::WHITE));
        assert_eq!(canvas.pixel(5, 5), Some(Color::WHITE));
    }

    #[test]
    fn test_segments_cover_their_ends() {
        let mut canvas = Canvas::new(8, 3, Color::WHITE).unwrap();
        canvas.stroke_segments(&[((2, 1), (5, 1))], Color::BLACK);
        assert!(dark(canvas.pixel(2, 1)));
        assert!(dark(canvas.pixel(5, 1)));
        assert_eq!(canvas.pixel(1, 1), Some(Color::WHITE));
        assert_eq!(canvas.pixel(3, 0), Some(Color::WHITE));
    }

    #[test]
    fn test_fill_rect_half_alpha() {
        let mut canvas = Canvas::new(2, 1, Color::WHITE).unwrap();
        canvas.fill_rect(PixelRect { x: 0, y: 0, width: 1, height: 1 }, Color::new(0, 0, 0, 128));
        let p = canvas.pixel(0, 0).unwrap();
        assert!((125..=129).contains(&p.r));
        assert_eq!(p.a, 255);
        assert_eq!(canvas.pixel(1, 0), Some(Color::WHITE));
    }

    #[test]
    fn test_blit_skips_transparent() {
        let mut canvas = Canvas::new(2, 1, Color::WHITE).unwrap();
        let rgba = [255, 0, 0, 255, 0, 0, 0, 0];
        canvas
            .blit(PixelRect { x: 0, y: 0, width: 2, height: 1 }, &rgba)
            .unwrap();
        assert_eq!(canvas.pixel(0, 0), Some(Color::rgb(255, 0, 0)));
        assert_eq!(canvas.pixel(1, 0), Some(Color::WHITE));
    }

    #[test]
    fn test_blit_rejects_short_buffer() {
        let mut canvas = Canvas::new(2, 2, Color::WHITE).unwrap();
        let rect = PixelRect { x: 0, y: 0, width: 2, height: 2 };
        assert!(canvas.blit(rect, &[0; 8]).is_err());
    }
}
