//! Rectangular regions and the coordinate mapping between them.
//!
//! A [`Geometry`] is a sub-rectangle (size plus offset) used as the domain
//! or range of the linear interpolation that rescales a traced glyph. The
//! spec string grammar is `WxH` or `WxH+OX+OY`, offsets defaulting to 0.

use std::fmt;
use std::str::FromStr;

use crate::error::GeometryError;

/// A discrete point on the pixel grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

/// A rectangular region: size plus offset into some enclosing canvas.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Geometry {
    width: i32,
    height: i32,
    offset_x: i32,
    offset_y: i32,
}

impl Geometry {
    pub fn new(width: i32, height: i32) -> Self {
        Self::with_offset(width, height, 0, 0)
    }

    pub fn with_offset(width: i32, height: i32, offset_x: i32, offset_y: i32) -> Self {
        Geometry {
            width,
            height,
            offset_x,
            offset_y,
        }
    }

    pub fn width(&self) -> i32 {
        self.width
    }

    pub fn height(&self) -> i32 {
        self.height
    }

    pub fn offset_x(&self) -> i32 {
        self.offset_x
    }

    pub fn offset_y(&self) -> i32 {
        self.offset_y
    }

    /// Maps a point expressed relative to this geometry into `dst`'s space.
    ///
    /// Each axis is interpolated linearly so that 0 maps to 0 and
    /// `old_size - 1` maps to `new_size - 1`. The division truncates toward
    /// zero (this matters for rounding at non-exact ratios and for
    /// intermediate values outside the domain).
    pub fn transform_point(&self, x: i32, y: i32, dst: &Geometry) -> Point {
        let new_x = lerp_axis(x - self.offset_x, self.width, dst.width) + dst.offset_x;
        let new_y = lerp_axis(y - self.offset_y, self.height, dst.height) + dst.offset_y;
        Point { x: new_x, y: new_y }
    }
}

fn lerp_axis(val: i32, old_size: i32, new_size: i32) -> i32 {
    // A 1-wide axis has a single sample; everything lands on it.
    if old_size == 1 {
        return 0;
    }
    val * (new_size - 1) / (old_size - 1)
}

impl fmt::Display for Geometry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}x{}+{}+{}",
            self.width, self.height, self.offset_x, self.offset_y
        )
    }
}

impl FromStr for Geometry {
    type Err = GeometryError;

    fn from_str(spec: &str) -> Result<Self, Self::Err> {
        let malformed = || GeometryError::Malformed {
            spec: spec.to_string(),
        };
        let number = |s: &str| {
            s.parse::<i32>().map_err(|source| GeometryError::BadNumber {
                spec: spec.to_string(),
                source,
            })
        };
        let (width, rest) = spec.split_once('x').ok_or_else(malformed)?;
        // Offsets may be negative; '+' only ever separates fields.
        let mut parts = rest.split('+');
        let height = parts.next().ok_or_else(malformed)?;
        let offset_x = parts.next().map(number).transpose()?.unwrap_or(0);
        let offset_y = parts.next().map(number).transpose()?.unwrap_or(0);
        if parts.next().is_some() {
            return Err(malformed());
        }
        Ok(Geometry {
            width: number(width)?,
            height: number(height)?,
            offset_x,
            offset_y,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_plain_size() {
        let g: Geometry = "8x16".parse().unwrap();
        assert_eq!(g, Geometry::new(8, 16));
        assert_eq!(g.offset_x(), 0);
        assert_eq!(g.offset_y(), 0);
    }

    #[test]
    fn parses_offsets() {
        let g: Geometry = "11x20+0+1".parse().unwrap();
        assert_eq!(g, Geometry::with_offset(11, 20, 0, 1));
    }

    #[test]
    fn parses_negative_offsets() {
        let g: Geometry = "16x16+-2+-3".parse().unwrap();
        assert_eq!(g, Geometry::with_offset(16, 16, -2, -3));
    }

    #[test]
    fn rejects_malformed_specs() {
        assert!("16".parse::<Geometry>().is_err());
        assert!("ax b".parse::<Geometry>().is_err());
        assert!("8x16+1+2+3".parse::<Geometry>().is_err());
        assert!("8x".parse::<Geometry>().is_err());
    }

    #[test]
    fn display_round_trips() {
        let g = Geometry::with_offset(12, 24, 3, 4);
        assert_eq!(g.to_string(), "12x24+3+4");
        assert_eq!(g.to_string().parse::<Geometry>().unwrap(), g);
        assert_eq!(Geometry::new(8, 16).to_string(), "8x16+0+0");
    }

    #[test]
    fn maps_corners_to_corners() {
        let src = Geometry::new(8, 16);
        let dst = Geometry::new(24, 48);
        assert_eq!(src.transform_point(0, 0, &dst), Point { x: 0, y: 0 });
        assert_eq!(src.transform_point(7, 15, &dst), Point { x: 23, y: 47 });
    }

    #[test]
    fn maps_corners_with_offsets() {
        let src = Geometry::with_offset(6, 6, 2, 3);
        let dst = Geometry::with_offset(12, 12, 10, 20);
        assert_eq!(src.transform_point(2, 3, &dst), Point { x: 10, y: 20 });
        assert_eq!(src.transform_point(7, 8, &dst), Point { x: 21, y: 31 });
    }

    #[test]
    fn degenerate_axis_maps_to_destination_offset() {
        let src = Geometry::new(1, 1);
        let dst = Geometry::with_offset(10, 10, 4, 5);
        assert_eq!(src.transform_point(0, 0, &dst), Point { x: 4, y: 5 });
    }

    #[test]
    fn division_truncates_toward_zero() {
        let src = Geometry::new(4, 4);
        let dst = Geometry::new(3, 3);
        // 2 * 2 / 3 = 1 (1.33 truncated)
        assert_eq!(src.transform_point(2, 0, &dst).x, 1);
        // Out-of-domain negative intermediate: -1 * 2 / 3 = 0, not -1.
        assert_eq!(src.transform_point(-1, 0, &dst).x, 0);
    }
}
