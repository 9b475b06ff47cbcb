//! Command-line front end for the fontscale library.
//!
//! Thin orchestration only: decodes a hex glyph, runs the tracing
//! pipeline, rescales through a geometry pair, and writes the artifacts.

use std::fs;
use std::path::Path;

use anyhow::{bail, Context};
use log::{info, warn};

use fontscale::geometry::Geometry;
use fontscale::unifont;
use fontscale::vector::{RenderFlags, TraceSink, VectorGlyph};

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    match args.first().map(String::as_str) {
        Some("scale") => {
            let [_, hex, src_spec, dimensions, dst_spec, out] = args.as_slice() else {
                bail!("usage: fontscale scale <hex> <src-geometry|full|detect> <WxH> <dst-geometry|full> <out.pbm>");
            };
            scale(hex, src_spec, dimensions, dst_spec, out)
        }
        Some("debug") => {
            let [_, hex, out] = args.as_slice() else {
                bail!("usage: fontscale debug <hex> <out.svg>");
            };
            debug(hex, out)
        }
        _ => bail!("usage: fontscale <scale|debug> ..."),
    }
}

/// Decodes and traces a glyph up to the point where geometry work starts.
fn trace(hex: &str) -> anyhow::Result<VectorGlyph> {
    let raster = unifont::decode(hex).context("Failed to decode hex glyph")?;
    info!(
        "Decoded {}x{} glyph, {} set pixels become vertices",
        raster.width(),
        raster.height(),
        raster.to_vector_glyph().vertex_count()
    );
    let mut vector = raster.to_vector_glyph();
    vector.join_adjacent_vertices();
    vector.disconnect_dotted_outline();
    vector.disconnect_filled_areas();
    Ok(vector)
}

fn scale(
    hex: &str,
    src_spec: &str,
    dimensions: &str,
    dst_spec: &str,
    out: &str,
) -> anyhow::Result<()> {
    let mut vector = trace(hex)?;
    vector
        .combine_edges()
        .context("Failed to simplify the traced glyph")?;
    info!("Simplified down to {} vertices", vector.vertex_count());

    let src_geometry = match src_spec {
        "full" => vector.geometry(),
        "detect" => vector.internal_geometry(),
        spec => spec
            .parse::<Geometry>()
            .context("Bad source geometry spec")?,
    };
    let dst_canvas: Geometry = dimensions
        .parse()
        .context("Bad destination canvas dimensions")?;
    let dst_geometry = match dst_spec {
        "full" => dst_canvas,
        spec => spec
            .parse::<Geometry>()
            .context("Bad destination geometry spec")?,
    };
    info!("Mapping {} onto {}", src_geometry, dst_geometry);

    let mut scaled = VectorGlyph::new(dst_canvas.width(), dst_canvas.height());
    scaled.copy_from(&vector, &src_geometry, &dst_geometry);
    let raster = scaled
        .to_raster_glyph(RenderFlags::ALL)
        .context("Failed to rasterize the scaled glyph")?;

    let unscaled_svg = vector.to_svg().context("Failed to render source SVG")?;
    let scaled_svg = scaled.to_svg().context("Failed to render scaled SVG")?;
    fs::write(format!("{out}-unscaled.svg"), unscaled_svg)
        .with_context(|| format!("Failed to write {out}-unscaled.svg"))?;
    fs::write(format!("{out}-scaled.svg"), scaled_svg)
        .with_context(|| format!("Failed to write {out}-scaled.svg"))?;
    fs::write(format!("{out}-scaled.txt"), raster.to_string())
        .with_context(|| format!("Failed to write {out}-scaled.txt"))?;
    fs::write(out, raster.serialize()).with_context(|| format!("Failed to write {out}"))?;
    info!("Wrote {}", out);
    Ok(())
}

/// Writes numbered SVG snapshots next to the final output as the
/// simplifier accepts collapses.
struct SvgTrace {
    prefix: String,
}

impl TraceSink for SvgTrace {
    fn snapshot(&mut self, revision: u32, svg: &str) {
        let path = format!("{}-{:03}.svg", self.prefix, revision);
        if let Err(e) = fs::write(&path, svg) {
            warn!("Failed to write trace snapshot {}: {}", path, e);
        }
    }
}

fn debug(hex: &str, out: &str) -> anyhow::Result<()> {
    let mut vector = trace(hex)?;
    let prefix = Path::new(out)
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or(out)
        .to_string();
    let mut sink = SvgTrace { prefix };
    vector
        .combine_edges_traced(&mut sink)
        .context("Failed to simplify the traced glyph")?;
    let svg = vector.to_svg().context("Failed to render SVG")?;
    fs::write(out, svg).with_context(|| format!("Failed to write {out}"))?;
    info!("Wrote {}", out);
    Ok(())
}
