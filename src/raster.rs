//! Fixed-size monochrome pixel buffers.
//!
//! [`RasterGlyph`] is the dense side of the pipeline: glyphs are decoded
//! into it, traced graphs are rendered back onto it, and the simplifier
//! compares instances pixel for pixel to prove a collapse changed nothing.
//! The line rasterizer is the classic integer Bresenham algorithm; its
//! exact stepping (including tie-breaks) is load-bearing, because two
//! renders are only considered equivalent when every pixel matches.

use std::fmt;

use crate::error::RasterError;
use crate::vector::VectorGlyph;

/// A dense 2D boolean pixel buffer, mutable in place.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RasterGlyph {
    width: i32,
    height: i32,
    data: Vec<bool>,
}

impl RasterGlyph {
    /// New blank raster of the given dimensions.
    pub fn new(width: i32, height: i32) -> Self {
        RasterGlyph {
            width,
            height,
            data: vec![false; (width.max(0) * height.max(0)) as usize],
        }
    }

    pub(crate) fn from_pixels(width: i32, height: i32, data: Vec<bool>) -> Self {
        debug_assert_eq!(data.len(), (width * height) as usize);
        RasterGlyph {
            width,
            height,
            data,
        }
    }

    pub fn width(&self) -> i32 {
        self.width
    }

    pub fn height(&self) -> i32 {
        self.height
    }

    fn index(&self, x: i32, y: i32) -> Result<usize, RasterError> {
        if x < 0 || x >= self.width || y < 0 || y >= self.height {
            return Err(RasterError::OutOfBounds {
                x,
                y,
                width: self.width,
                height: self.height,
            });
        }
        Ok((y * self.width + x) as usize)
    }

    pub fn get(&self, x: i32, y: i32) -> Result<bool, RasterError> {
        Ok(self.data[self.index(x, y)?])
    }

    pub fn set(&mut self, x: i32, y: i32, value: bool) -> Result<(), RasterError> {
        let i = self.index(x, y)?;
        self.data[i] = value;
        Ok(())
    }

    /// Clears every pixel.
    pub fn clear(&mut self) {
        self.data.fill(false);
    }

    /// Flips every pixel.
    pub fn invert(&mut self) {
        for px in &mut self.data {
            *px = !*px;
        }
    }

    /// Draws the exact integer Bresenham line from (x0, y0) to (x1, y1).
    ///
    /// The "low" variant iterates over x when |dx| >= |dy|, the "high"
    /// variant iterates over y otherwise; both normalize so the iteration
    /// variable increases, which makes `line(a, b)` and `line(b, a)` set
    /// identical pixels.
    pub fn line(&mut self, x0: i32, y0: i32, x1: i32, y1: i32) -> Result<(), RasterError> {
        if (y1 - y0).abs() < (x1 - x0).abs() {
            if x0 > x1 {
                self.line_low(x1, y1, x0, y0)
            } else {
                self.line_low(x0, y0, x1, y1)
            }
        } else if y0 > y1 {
            self.line_high(x1, y1, x0, y0)
        } else {
            self.line_high(x0, y0, x1, y1)
        }
    }

    fn line_low(&mut self, x0: i32, y0: i32, x1: i32, y1: i32) -> Result<(), RasterError> {
        let dx = x1 - x0;
        let mut dy = y1 - y0;
        let mut yi = 1;
        if dy < 0 {
            yi = -1;
            dy = -dy;
        }
        // Error term doubled to stay in integer arithmetic.
        let mut d = 2 * dy - dx;
        let mut y = y0;
        for x in x0..=x1 {
            self.set(x, y, true)?;
            if d > 0 {
                y += yi;
                d -= 2 * dx;
            }
            d += 2 * dy;
        }
        Ok(())
    }

    fn line_high(&mut self, x0: i32, y0: i32, x1: i32, y1: i32) -> Result<(), RasterError> {
        let mut dx = x1 - x0;
        let dy = y1 - y0;
        let mut xi = 1;
        if dx < 0 {
            xi = -1;
            dx = -dx;
        }
        let mut d = 2 * dx - dy;
        let mut x = x0;
        for y in y0..=y1 {
            self.set(x, y, true)?;
            if d > 0 {
                x += xi;
                d -= 2 * dy;
            }
            d += 2 * dx;
        }
        Ok(())
    }

    /// Serializes to the packed binary monochrome format (PBM "P4"): a
    /// text header, then row-major MSB-first bit rows, each row padded to
    /// a whole number of bytes.
    pub fn serialize(&self) -> Vec<u8> {
        let mut out = format!("P4\n{} {}\n", self.width, self.height).into_bytes();
        let row_bytes = ((self.width + 7) / 8) as usize;
        for y in 0..self.height {
            let mut row = vec![0u8; row_bytes];
            for x in 0..self.width {
                if self.data[(y * self.width + x) as usize] {
                    row[(x / 8) as usize] |= 1 << (7 - (x % 8));
                }
            }
            out.extend_from_slice(&row);
        }
        out
    }

    /// Converts to a vector graph: one isolated vertex per set pixel.
    pub fn to_vector_glyph(&self) -> VectorGlyph {
        let mut glyph = VectorGlyph::new(self.width, self.height);
        for y in 0..self.height {
            for x in 0..self.width {
                if self.data[(y * self.width + x) as usize] {
                    glyph.add_vertex(x, y);
                }
            }
        }
        glyph
    }
}

impl fmt::Display for RasterGlyph {
    /// ASCII rendering: '#' for set, '-' for clear, one row per line.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for y in 0..self.height {
            for x in 0..self.width {
                let c = if self.data[(y * self.width + x) as usize] {
                    '#'
                } else {
                    '-'
                };
                write!(f, "{}", c)?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_out_of_bounds_access() {
        let mut glyph = RasterGlyph::new(4, 4);
        assert!(glyph.set(4, 0, true).is_err());
        assert!(glyph.set(0, -1, true).is_err());
        assert!(glyph.get(-1, 2).is_err());
        assert_eq!(glyph.get(3, 3), Ok(false));
    }

    #[test]
    fn line_vertical() {
        let mut glyph = RasterGlyph::new(8, 8);
        glyph.line(0, 0, 0, 7).unwrap();
        glyph.line(6, 7, 6, 0).unwrap();
        assert_eq!(
            glyph.to_string(),
            "#-----#-\n\
             #-----#-\n\
             #-----#-\n\
             #-----#-\n\
             #-----#-\n\
             #-----#-\n\
             #-----#-\n\
             #-----#-\n"
        );
    }

    #[test]
    fn line_horizontal() {
        let mut glyph = RasterGlyph::new(8, 8);
        glyph.line(0, 0, 7, 0).unwrap();
        glyph.line(7, 6, 0, 6).unwrap();
        assert_eq!(
            glyph.to_string(),
            "########\n\
             --------\n\
             --------\n\
             --------\n\
             --------\n\
             --------\n\
             ########\n\
             --------\n"
        );
    }

    #[test]
    fn line_diagonal_down() {
        let mut glyph = RasterGlyph::new(8, 8);
        // Increasing y, increasing x; then increasing y, decreasing x.
        glyph.line(0, 0, 7, 7).unwrap();
        glyph.line(6, 0, 0, 6).unwrap();
        assert_eq!(
            glyph.to_string(),
            "#-----#-\n\
             -#---#--\n\
             --#-#---\n\
             ---#----\n\
             --#-#---\n\
             -#---#--\n\
             #-----#-\n\
             -------#\n"
        );
    }

    #[test]
    fn line_diagonal_up() {
        let mut glyph = RasterGlyph::new(8, 8);
        // Decreasing y, decreasing x; then decreasing y, increasing x.
        glyph.line(7, 7, 0, 0).unwrap();
        glyph.line(0, 6, 6, 0).unwrap();
        assert_eq!(
            glyph.to_string(),
            "#-----#-\n\
             -#---#--\n\
             --#-#---\n\
             ---#----\n\
             --#-#---\n\
             -#---#--\n\
             #-----#-\n\
             -------#\n"
        );
    }

    #[test]
    fn line_steep() {
        let mut glyph = RasterGlyph::new(8, 16);
        glyph.line(2, 9, 1, 12).unwrap();
        assert_eq!(
            glyph.to_string(),
            "--------\n\
             --------\n\
             --------\n\
             --------\n\
             --------\n\
             --------\n\
             --------\n\
             --------\n\
             --------\n\
             --#-----\n\
             --#-----\n\
             -#------\n\
             -#------\n\
             --------\n\
             --------\n\
             --------\n"
        );
    }

    #[test]
    fn line_is_symmetric() {
        let cases = [(1, 2, 7, 5), (0, 0, 3, 9), (5, 1, 1, 6), (2, 2, 9, 2)];
        for (x0, y0, x1, y1) in cases {
            let mut forward = RasterGlyph::new(10, 10);
            forward.line(x0, y0, x1, y1).unwrap();
            let mut backward = RasterGlyph::new(10, 10);
            backward.line(x1, y1, x0, y0).unwrap();
            assert_eq!(forward, backward, "line ({x0},{y0})-({x1},{y1})");
        }
    }

    #[test]
    fn line_sets_major_axis_plus_one_pixels() {
        let cases = [(1, 2, 7, 5), (0, 0, 3, 9), (4, 4, 4, 4), (0, 9, 9, 0)];
        for (x0, y0, x1, y1) in cases {
            let mut glyph = RasterGlyph::new(10, 10);
            glyph.line(x0, y0, x1, y1).unwrap();
            let expected = (x1 - x0).abs().max((y1 - y0).abs()) + 1;
            let count = glyph.data.iter().filter(|&&px| px).count() as i32;
            assert_eq!(count, expected, "line ({x0},{y0})-({x1},{y1})");
        }
    }

    #[test]
    fn equality_requires_matching_dimensions_and_pixels() {
        let mut a = RasterGlyph::new(8, 8);
        let b = RasterGlyph::new(8, 8);
        let c = RasterGlyph::new(8, 4);
        assert_eq!(a, b);
        assert_ne!(a, c);
        a.set(3, 3, true).unwrap();
        assert_ne!(a, b);
        a.clear();
        assert_eq!(a, b);
    }

    #[test]
    fn serializes_packed_pbm() {
        let mut glyph = RasterGlyph::new(8, 2);
        glyph.set(0, 0, true).unwrap();
        glyph.set(7, 1, true).unwrap();
        assert_eq!(glyph.serialize(), b"P4\n8 2\n\x80\x01");
    }

    #[test]
    fn serializes_rows_byte_aligned() {
        let mut glyph = RasterGlyph::new(10, 2);
        glyph.set(0, 0, true).unwrap();
        glyph.set(9, 0, true).unwrap();
        glyph.set(8, 1, true).unwrap();
        // Each row is padded to 2 bytes; no bits cross rows.
        assert_eq!(glyph.serialize(), b"P4\n10 2\n\x80\x40\x00\x80");
    }

    #[test]
    fn converts_set_pixels_to_isolated_vertices() {
        let mut glyph = RasterGlyph::new(4, 4);
        glyph.set(1, 1, true).unwrap();
        glyph.set(2, 3, true).unwrap();
        let vector = glyph.to_vector_glyph();
        assert_eq!(vector.vertex_count(), 2);
        assert!(vector.vertex_at(1, 1).is_some());
        assert!(vector.vertex_at(2, 3).is_some());
        assert!(vector.vertex_at(0, 0).is_none());
    }
}
