//! Fontscale library crate.
//!
//! Converts fixed-resolution monochrome bitmap glyphs (packed hex format)
//! into simplified vector line graphs, rescales those graphs to arbitrary
//! canvases, and rasterizes them back. This exposes the internal modules
//! for testing and library usage; the `fontscale` binary wires them into
//! the `scale` and `debug` commands.

pub mod config;
pub mod error;
pub mod geometry;
pub mod raster;
pub mod unifont;
pub mod vector;

pub use config::TraceConfig;
pub use error::{DecodeError, GeometryError, RasterError};
pub use geometry::{Geometry, Point};
pub use raster::RasterGlyph;
pub use vector::{RenderFlags, TraceSink, VectorGlyph};
