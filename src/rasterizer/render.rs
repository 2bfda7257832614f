//! Framebuffer and triangle rasterization
//!
//! The color buffer holds packed ARGB. The depth buffer holds inverse depth
//! (`1/w`), cleared to 0.0; a larger value is closer to the camera.

use super::error::RenderError;
use super::math::Vec2;
use super::types::{Color, ScreenTriangle, Texture};

/// Framebuffer for software rendering
pub struct Framebuffer {
    pub pixels: Vec<u32>,  // ARGB
    pub depth: Vec<f32>,   // inverse depth
    pub width: usize,
    pub height: usize,
}

/// How the interior of a triangle is colored
#[derive(Debug, Clone, Copy)]
pub enum Fill<'a> {
    /// The triangle's shaded color
    Flat,
    /// Perspective-correct texture lookup
    Texture(&'a Texture),
    /// Inverse depth as a gray level
    Depth,
}

/// Interpolated attributes at one pixel
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TexelSample {
    pub u: f32,
    pub v: f32,
    pub inv_depth: f32,
}

/// Perspective-correct interpolation at screen point `p`.
///
/// `u/w`, `v/w` and `1/w` are linear in screen space; the interpolated
/// `1/w` is clamped to [0, 1] and divided back out. Returns `None` when the
/// clamped inverse depth is zero.
pub fn interpolate(tri: &ScreenTriangle, p: Vec2) -> Option<TexelSample> {
    let w = tri.barycentric_weights(p);
    let weights = [w.x, w.y, w.z];

    let mut u = 0.0;
    let mut v = 0.0;
    let mut inv_depth = 0.0;
    for i in 0..3 {
        u += tri.tex_coords[i].u * tri.inv_depth[i] * weights[i];
        v += tri.tex_coords[i].v * tri.inv_depth[i] * weights[i];
        inv_depth += tri.inv_depth[i] * weights[i];
    }

    let inv_depth = inv_depth.clamp(0.0, 1.0);
    if inv_depth <= 0.0 || !inv_depth.is_finite() {
        return None;
    }

    Some(TexelSample {
        u: u / inv_depth,
        v: v / inv_depth,
        inv_depth,
    })
}

/// Vertices sorted by increasing y
fn sort_by_y(points: [Vec2; 3]) -> [Vec2; 3] {
    let [mut a, mut b, mut c] = points;
    if a.y > b.y {
        std::mem::swap(&mut a, &mut b);
    }
    if b.y > c.y {
        std::mem::swap(&mut b, &mut c);
    }
    if a.y > b.y {
        std::mem::swap(&mut a, &mut b);
    }
    [a, b, c]
}

impl Framebuffer {
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            pixels: vec![0; width * height],
            depth: vec![0.0; width * height],
            width,
            height,
        }
    }

    pub fn clear(&mut self, color: Color) {
        self.pixels.fill(color.to_argb());
    }

    pub fn clear_depth(&mut self) {
        self.depth.fill(0.0);
    }

    fn index(&self, x: i32, y: i32) -> Option<usize> {
        if x >= 0 && y >= 0 && (x as usize) < self.width && (y as usize) < self.height {
            Some(y as usize * self.width + x as usize)
        } else {
            None
        }
    }

    /// Out-of-range writes are ignored
    pub fn set_pixel(&mut self, x: i32, y: i32, color: Color) {
        if let Some(idx) = self.index(x, y) {
            self.pixels[idx] = color.to_argb();
        }
    }

    pub fn get_pixel(&self, x: i32, y: i32) -> Option<Color> {
        self.index(x, y).map(|idx| Color::from_argb(self.pixels[idx]))
    }

    pub fn get_depth(&self, x: i32, y: i32) -> Option<f32> {
        self.index(x, y).map(|idx| self.depth[idx])
    }

    /// Draw a line from (x0, y0) to (x1, y1) using Bresenham's algorithm
    pub fn draw_line(&mut self, x0: i32, y0: i32, x1: i32, y1: i32, color: Color) {
        let dx = (x1 - x0).abs();
        let dy = -(y1 - y0).abs();
        let sx = if x0 < x1 { 1 } else { -1 };
        let sy = if y0 < y1 { 1 } else { -1 };
        let mut err = dx + dy;
        let mut x = x0;
        let mut y = y0;

        loop {
            self.set_pixel(x, y, color);

            if x == x1 && y == y1 {
                break;
            }

            let e2 = 2 * err;
            if e2 >= dy {
                err += dy;
                x += sx;
            }
            if e2 <= dx {
                err += dx;
                y += sy;
            }
        }
    }

    pub fn draw_rect(&mut self, x: i32, y: i32, w: i32, h: i32, color: Color) {
        for j in y..y + h {
            for i in x..x + w {
                self.set_pixel(i, j, color);
            }
        }
    }

    /// Grid lines every 10 px
    pub fn draw_grid(&mut self, color: Color) {
        for y in 1..self.height as i32 {
            for x in 1..self.width as i32 {
                if x % 10 == 0 || y % 10 == 0 {
                    self.set_pixel(x, y, color);
                }
            }
        }
    }

    pub fn draw_triangle_edges(&mut self, tri: &ScreenTriangle, color: Color) {
        let [a, b, c] = tri.points;
        for (p, q) in [(a, b), (b, c), (c, a)] {
            self.draw_line(p.x as i32, p.y as i32, q.x as i32, q.y as i32, color);
        }
    }

    /// 4x4 marker centered on each corner
    pub fn draw_triangle_vertices(&mut self, tri: &ScreenTriangle, color: Color) {
        for p in tri.points {
            let x = p.x.round() as i32;
            let y = p.y.round() as i32;
            self.draw_rect(x - 2, y - 2, 4, 4, color);
        }
    }

    fn draw_span(&mut self, x0: i32, x1: i32, y: i32, color: Color) {
        if y < 0 || y >= self.height as i32 {
            return;
        }
        let (lo, hi) = if x0 <= x1 { (x0, x1) } else { (x1, x0) };
        let (lo, hi) = (lo.max(0), hi.min(self.width as i32 - 1));
        for x in lo..=hi {
            self.set_pixel(x, y, color);
        }
    }

    /// Solid fill without depth testing.
    ///
    /// Splits at the middle vertex into a flat-bottom half (rows from the
    /// top vertex down to the middle) and a flat-top half (rows from the
    /// bottom vertex up to the middle).
    pub fn fill_triangle(&mut self, points: [Vec2; 3], color: Color) {
        let [a, b, c] = sort_by_y(points);

        if c.y == a.y {
            let lo = a.x.min(b.x).min(c.x);
            let hi = a.x.max(b.x).max(c.x);
            self.draw_span(lo as i32, hi as i32, a.y as i32, color);
            return;
        }

        // point on the long edge level with b
        let m = Vec2::new((b.y - a.y) * (c.x - a.x) / (c.y - a.y) + a.x, b.y);

        if b.y != a.y {
            for y in a.y as i32..=b.y as i32 {
                let alpha = (y as f32 - a.y) / (b.y - a.y);
                let x0 = a.x + alpha * (b.x - a.x);
                let x1 = a.x + alpha * (m.x - a.x);
                self.draw_span(x0 as i32, x1 as i32, y, color);
            }
        }

        if c.y != m.y {
            for y in (m.y as i32..=c.y as i32).rev() {
                let alpha = (y as f32 - c.y) / (m.y - c.y);
                let x0 = c.x + alpha * (m.x - c.x);
                let x1 = c.x + alpha * (b.x - c.x);
                self.draw_span(x0 as i32, x1 as i32, y, color);
            }
        }
    }

    /// Resolve one pixel of a filled triangle: interpolate, depth test,
    /// color by `fill`. With `depth_test` off the pixel always wins.
    pub fn draw_texel(&mut self, x: i32, y: i32, tri: &ScreenTriangle, fill: Fill, depth_test: bool) {
        let Some(idx) = self.index(x, y) else {
            return;
        };
        let Some(sample) = interpolate(tri, Vec2::new(x as f32, y as f32)) else {
            return;
        };

        if depth_test && sample.inv_depth <= self.depth[idx] {
            return;
        }
        self.depth[idx] = sample.inv_depth;

        let color = match fill {
            Fill::Flat => tri.color,
            Fill::Texture(texture) => texture.sample(sample.u, sample.v),
            Fill::Depth => Color::depth_gray(sample.inv_depth),
        };
        self.pixels[idx] = color.to_argb();
    }

    /// Scan-convert a triangle through the texel resolver, upper half
    /// (rows `a.y..b.y`) then lower half (rows `b.y..=c.y`)
    pub fn draw_textured_triangle(&mut self, tri: &ScreenTriangle, fill: Fill, depth_test: bool) {
        let [a, b, c] = sort_by_y(tri.points);

        let slope = |from: Vec2, to: Vec2| {
            if to.y - from.y != 0.0 {
                (to.x - from.x) / (to.y - from.y).abs()
            } else {
                0.0
            }
        };

        let long = slope(a, c);

        if b.y - a.y != 0.0 {
            let short = slope(a, b);
            for y in a.y as i32..b.y as i32 {
                let x0 = (b.x + short * (y as f32 - b.y)) as i32;
                let x1 = (a.x + long * (y as f32 - a.y)) as i32;
                self.draw_row(y, x0, x1, tri, fill, depth_test);
            }
        }

        if c.y - b.y != 0.0 {
            let short = slope(b, c);
            for y in b.y as i32..=c.y as i32 {
                let x0 = (b.x + short * (y as f32 - b.y)) as i32;
                let x1 = (a.x + long * (y as f32 - a.y)) as i32;
                self.draw_row(y, x0, x1, tri, fill, depth_test);
            }
        }
    }

    fn draw_row(&mut self, y: i32, x0: i32, x1: i32, tri: &ScreenTriangle, fill: Fill, depth_test: bool) {
        if y < 0 || y >= self.height as i32 {
            return;
        }
        let (lo, hi) = if x1 < x0 { (x1, x0) } else { (x0, x1) };
        // clamp to the buffer before walking the row
        let lo = lo.max(0);
        let hi = hi.min(self.width as i32);
        for x in lo..hi {
            self.draw_texel(x, y, tri, fill, depth_test);
        }
    }

    /// Copy out as RGBA bytes, mirrored horizontally
    pub fn write_rgba_flipped(&self, out: &mut Vec<u8>) {
        out.clear();
        out.reserve(self.width * self.height * 4);
        for row in self.pixels.chunks(self.width.max(1)) {
            for &argb in row.iter().rev() {
                out.extend_from_slice(&Color::from_argb(argb).to_bytes());
            }
        }
    }

    /// Save the presented (flipped) image as PNG
    pub fn save_png<P: AsRef<std::path::Path>>(&self, path: P) -> Result<(), RenderError> {
        let mut bytes = Vec::new();
        self.write_rgba_flipped(&mut bytes);
        let img = image::RgbaImage::from_raw(self.width as u32, self.height as u32, bytes)
            .ok_or_else(|| RenderError::Image("framebuffer size mismatch".to_string()))?;
        img.save(path.as_ref())
            .map_err(|e| RenderError::Image(format!("{}: {}", path.as_ref().display(), e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rasterizer::math::TexCoord;

    fn screen_tri(points: [(f32, f32); 3], inv_depth: [f32; 3], color: Color) -> ScreenTriangle {
        ScreenTriangle {
            points: points.map(|(x, y)| Vec2::new(x, y)),
            tex_coords: [TexCoord::new(0.0, 0.0), TexCoord::new(1.0, 0.0), TexCoord::new(0.0, 1.0)],
            inv_depth,
            color,
        }
    }

    #[test]
    fn test_interpolation_reproduces_corner_tex_coords() {
        let tri = ScreenTriangle {
            points: [Vec2::new(10.0, 5.0), Vec2::new(90.0, 20.0), Vec2::new(30.0, 70.0)],
            tex_coords: [TexCoord::new(0.1, 0.9), TexCoord::new(0.8, 0.2), TexCoord::new(0.5, 0.5)],
            inv_depth: [1.0 / 2.0, 1.0 / 7.0, 1.0 / 30.0],
            color: Color::WHITE,
        };
        for i in 0..3 {
            let s = interpolate(&tri, tri.points[i]).unwrap();
            assert!((s.u - tri.tex_coords[i].u).abs() < 1e-4);
            assert!((s.v - tri.tex_coords[i].v).abs() < 1e-4);
            assert!((s.inv_depth - tri.inv_depth[i]).abs() < 1e-6);
        }
    }

    #[test]
    fn test_interpolation_is_perspective_correct() {
        // edge from depth 1 to depth 3: the screen midpoint maps to u = 0.25
        let tri = ScreenTriangle {
            points: [Vec2::new(0.0, 0.0), Vec2::new(100.0, 0.0), Vec2::new(0.0, 100.0)],
            tex_coords: [TexCoord::new(0.0, 0.0), TexCoord::new(1.0, 0.0), TexCoord::new(0.0, 1.0)],
            inv_depth: [1.0, 1.0 / 3.0, 1.0],
            color: Color::WHITE,
        };
        let s = interpolate(&tri, Vec2::new(50.0, 0.0)).unwrap();
        assert!((s.u - 0.25).abs() < 1e-5);
    }

    #[test]
    fn test_depth_test_keeps_nearest_in_any_order() {
        let red = Color::new(255, 0, 0);
        let blue = Color::new(0, 0, 255);
        let near = screen_tri([(10.0, 10.0), (60.0, 10.0), (10.0, 60.0)], [0.5; 3], red);
        let far = screen_tri([(5.0, 5.0), (70.0, 8.0), (8.0, 70.0)], [0.2; 3], blue);

        for order in [[near, far], [far, near]] {
            let mut fb = Framebuffer::new(80, 80);
            fb.clear(Color::BLACK);
            fb.clear_depth();
            for t in &order {
                fb.draw_textured_triangle(t, Fill::Flat, true);
            }
            // overlap: near wins
            for (x, y) in [(20, 20), (15, 30), (40, 15)] {
                assert_eq!(fb.get_pixel(x, y), Some(red), "pixel {} {}", x, y);
                assert!((fb.get_depth(x, y).unwrap() - 0.5).abs() < 1e-5);
            }
            // only the far triangle reaches here
            assert_eq!(fb.get_pixel(65, 9), Some(blue));
        }
    }

    #[test]
    fn test_textured_fill_samples_texture() {
        let mut tex = Texture::new(2, 2);
        tex.pixels = vec![Color::GREEN; 4];
        let tri = screen_tri([(0.0, 0.0), (20.0, 0.0), (0.0, 20.0)], [1.0; 3], Color::WHITE);
        let mut fb = Framebuffer::new(32, 32);
        fb.clear(Color::BLACK);
        fb.draw_textured_triangle(&tri, Fill::Texture(&tex), true);
        assert_eq!(fb.get_pixel(4, 4), Some(Color::GREEN));
        assert_eq!(fb.get_pixel(25, 25), Some(Color::BLACK));
    }

    #[test]
    fn test_depth_fill_maps_inverse_depth_to_gray() {
        let tri = screen_tri([(0.0, 0.0), (20.0, 0.0), (0.0, 20.0)], [0.5; 3], Color::WHITE);
        let mut fb = Framebuffer::new(32, 32);
        fb.draw_textured_triangle(&tri, Fill::Depth, true);
        assert_eq!(fb.get_pixel(3, 3), Some(Color::new(127, 127, 127)));
    }

    #[test]
    fn test_offscreen_triangle_is_clipped_to_buffer() {
        let tri = screen_tri([(-50.0, -50.0), (500.0, -20.0), (-20.0, 500.0)], [0.5; 3], Color::WHITE);
        let mut fb = Framebuffer::new(16, 16);
        fb.draw_textured_triangle(&tri, Fill::Flat, true);
        fb.fill_triangle(tri.points, Color::GREEN);
        fb.draw_triangle_edges(&tri, Color::GREEN);
        assert_eq!(fb.get_pixel(8, 8), Some(Color::GREEN));
    }

    #[test]
    fn test_fill_triangle_covers_interior() {
        let mut fb = Framebuffer::new(40, 40);
        fb.fill_triangle([Vec2::new(20.0, 2.0), Vec2::new(2.0, 30.0), Vec2::new(38.0, 36.0)], Color::WHITE);
        assert_eq!(fb.get_pixel(20, 20), Some(Color::WHITE));
        assert_eq!(fb.get_pixel(20, 30), Some(Color::WHITE));
        assert_eq!(fb.get_pixel(2, 2), Some(Color::from_argb(0)));
        assert_eq!(fb.get_pixel(38, 10), Some(Color::from_argb(0)));
    }

    #[test]
    fn test_flat_bottom_triangle_fill() {
        let mut fb = Framebuffer::new(20, 20);
        fb.fill_triangle([Vec2::new(10.0, 0.0), Vec2::new(0.0, 10.0), Vec2::new(19.0, 10.0)], Color::WHITE);
        for x in 0..20 {
            assert_eq!(fb.get_pixel(x, 10), Some(Color::WHITE));
        }
    }

    #[test]
    fn test_line_endpoints() {
        let mut fb = Framebuffer::new(10, 10);
        fb.draw_line(1, 1, 8, 5, Color::WHITE);
        assert_eq!(fb.get_pixel(1, 1), Some(Color::WHITE));
        assert_eq!(fb.get_pixel(8, 5), Some(Color::WHITE));
        // writes past the edge are dropped
        fb.draw_line(-5, -5, 20, 20, Color::GREEN);
        assert_eq!(fb.get_pixel(9, 9), Some(Color::GREEN));
    }

    #[test]
    fn test_rgba_output_is_mirrored() {
        let mut fb = Framebuffer::new(3, 1);
        fb.set_pixel(0, 0, Color::new(1, 2, 3));
        let mut out = Vec::new();
        fb.write_rgba_flipped(&mut out);
        assert_eq!(&out[8..12], &[1, 2, 3, 255]);
    }
}
