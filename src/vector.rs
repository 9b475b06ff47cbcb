//! The vector glyph graph and its tracing/simplification engine.
//!
//! A [`VectorGlyph`] starts as one vertex per set pixel of a raster. The
//! pipeline then joins grid-adjacent vertices, severs a couple of known
//! non-stroke patterns, and repeatedly collapses chains of vertices into
//! single straight edges. Collapsing is only accepted when rendering the
//! straight replacement produces exactly the same pixels as rendering the
//! original chain, so the simplified graph always rasterizes back to the
//! source glyph.
//!
//! Vertices live in a `BTreeMap` keyed by `y * width + x`, which both
//! guarantees at most one vertex per coordinate and makes every iteration
//! deterministic in (y, x) order. Neighbour sets hold keys, ordered the
//! same way. Edges are undirected and always inserted and removed on both
//! sides together.

use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::fmt::Write as _;

use bitflags::bitflags;
use log::warn;

use crate::config::{TraceConfig, CONFIG};
use crate::error::RasterError;
use crate::geometry::Geometry;
use crate::raster::RasterGlyph;

/// Stable vertex identity within one graph: `y * width + x`.
pub type VertexKey = i32;

bitflags! {
    /// What `to_raster_glyph` renders.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct RenderFlags: u8 {
        /// One pixel per vertex.
        const DOTS = 1 << 0;
        /// A Bresenham line per edge.
        const LINES = 1 << 1;
        const ALL = Self::DOTS.bits() | Self::LINES.bits();
    }
}

/// A graph node bound to one pixel coordinate.
#[derive(Debug, Clone)]
pub struct Vertex {
    x: i32,
    y: i32,
    /// Transient highlight used by the debug SVG while a path collapses.
    marked: bool,
    neighbours: BTreeSet<VertexKey>,
}

impl Vertex {
    fn new(x: i32, y: i32) -> Self {
        Vertex {
            x,
            y,
            marked: false,
            neighbours: BTreeSet::new(),
        }
    }

    pub fn x(&self) -> i32 {
        self.x
    }

    pub fn y(&self) -> i32 {
        self.y
    }

    /// Neighbour keys in (y, x) order. A disconnected vertex holds a
    /// single self-loop.
    pub fn neighbours(&self) -> &BTreeSet<VertexKey> {
        &self.neighbours
    }
}

/// Receives debug snapshots as `combine_edges_traced` accepts collapses.
///
/// Keeps artifact writing out of the core: the CLI implements this to dump
/// numbered SVG files, the default sink discards everything.
pub trait TraceSink {
    /// Whether snapshots should be produced at all.
    fn active(&self) -> bool {
        true
    }
    fn snapshot(&mut self, revision: u32, svg: &str);
}

/// The do-nothing sink used by `combine_edges`.
struct NoTrace;

impl TraceSink for NoTrace {
    fn active(&self) -> bool {
        false
    }
    fn snapshot(&mut self, _revision: u32, _svg: &str) {}
}

/// A sparse graph with one vertex per set pixel and symmetric edges.
#[derive(Debug, Clone)]
pub struct VectorGlyph {
    width: i32,
    height: i32,
    vertices: BTreeMap<VertexKey, Vertex>,
    limits: TraceConfig,
    revision: u32,
}

impl VectorGlyph {
    pub fn new(width: i32, height: i32) -> Self {
        Self::with_config(width, height, CONFIG.clone())
    }

    /// Like [`VectorGlyph::new`] with explicit trace limits, so cap
    /// behavior can be exercised deterministically.
    pub fn with_config(width: i32, height: i32, limits: TraceConfig) -> Self {
        VectorGlyph {
            width,
            height,
            vertices: BTreeMap::new(),
            limits,
            revision: 0,
        }
    }

    pub fn width(&self) -> i32 {
        self.width
    }

    pub fn height(&self) -> i32 {
        self.height
    }

    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    /// Vertices in (y, x) order.
    pub fn vertices(&self) -> impl Iterator<Item = (VertexKey, &Vertex)> {
        self.vertices.iter().map(|(&k, v)| (k, v))
    }

    pub fn vertex(&self, key: VertexKey) -> Option<&Vertex> {
        self.vertices.get(&key)
    }

    /// Number of undirected edges, self-loops counted once.
    pub fn edge_count(&self) -> usize {
        let mut ends = 0;
        let mut loops = 0;
        for (key, v) in &self.vertices {
            ends += v.neighbours.len();
            if v.neighbours.contains(key) {
                loops += 1;
            }
        }
        (ends - loops) / 2 + loops
    }

    fn key_of(&self, x: i32, y: i32) -> VertexKey {
        y * self.width + x
    }

    /// Inserts a vertex at (x, y), replacing any existing one there.
    pub fn add_vertex(&mut self, x: i32, y: i32) {
        let key = self.key_of(x, y);
        self.vertices.insert(key, Vertex::new(x, y));
    }

    /// Key of the vertex at (x, y), if the coordinate is on the canvas and
    /// occupied.
    pub fn vertex_at(&self, x: i32, y: i32) -> Option<VertexKey> {
        if x < 0 || x >= self.width || y < 0 || y >= self.height {
            return None;
        }
        let key = self.key_of(x, y);
        self.vertices.contains_key(&key).then_some(key)
    }

    /// Adds the undirected edge a-b (both sides).
    pub fn join(&mut self, a: VertexKey, b: VertexKey) {
        if let Some(v) = self.vertices.get_mut(&a) {
            v.neighbours.insert(b);
        }
        if let Some(v) = self.vertices.get_mut(&b) {
            v.neighbours.insert(a);
        }
    }

    /// Removes the undirected edge a-b (both sides).
    pub fn unjoin(&mut self, a: VertexKey, b: VertexKey) {
        if let Some(v) = self.vertices.get_mut(&a) {
            v.neighbours.remove(&b);
        }
        if let Some(v) = self.vertices.get_mut(&b) {
            v.neighbours.remove(&a);
        }
    }

    /// Severs every edge of `key` and leaves a self-loop in their place.
    pub fn disconnect(&mut self, key: VertexKey) {
        let Some(v) = self.vertices.get(&key) else {
            return;
        };
        let neighbours: Vec<VertexKey> = v.neighbours.iter().copied().collect();
        for n in neighbours {
            self.unjoin(key, n);
        }
        self.join(key, key);
    }

    /// Connects every vertex to every existing vertex among its 8
    /// grid-adjacent coordinates; an isolated vertex gets a self-loop.
    pub fn join_adjacent_vertices(&mut self) {
        let keys: Vec<VertexKey> = self.vertices.keys().copied().collect();
        for key in keys {
            let (x, y) = match self.vertices.get(&key) {
                Some(v) => (v.x, v.y),
                None => continue,
            };
            let mut adjacent = Vec::new();
            for dy in -1..=1 {
                for dx in -1..=1 {
                    if dx == 0 && dy == 0 {
                        continue;
                    }
                    if let Some(n) = self.vertex_at(x + dx, y + dy) {
                        adjacent.push(n);
                    }
                }
            }
            if adjacent.is_empty() {
                self.join(key, key);
            } else {
                for n in adjacent {
                    self.join(key, n);
                }
            }
        }
    }

    /// Severs the decorative border of 16x16 placeholder glyphs so it is
    /// not traced as strokes.
    ///
    /// The pattern check is deliberately narrow: a vertex at (0, 0) and
    /// (15, 15) with none at (15, 0). Every border vertex off the corners
    /// is then disconnected.
    pub fn disconnect_dotted_outline(&mut self) {
        if self.width != 16 || self.height != 16 {
            return;
        }
        if self.vertex_at(0, 0).is_none()
            || self.vertex_at(15, 15).is_none()
            || self.vertex_at(15, 0).is_some()
        {
            return;
        }
        for i in 1..15 {
            if let Some(k) = self.vertex_at(i, 0) {
                self.disconnect(k);
            }
            if let Some(k) = self.vertex_at(15, i) {
                self.disconnect(k);
            }
            if let Some(k) = self.vertex_at(15 - i, 15) {
                self.disconnect(k);
            }
            if let Some(k) = self.vertex_at(0, 15 - i) {
                self.disconnect(k);
            }
        }
    }

    /// Isolates every fully surrounded vertex (degree >= 8) so solid
    /// filled blobs are not traced as line segments.
    pub fn disconnect_filled_areas(&mut self) {
        let keys: Vec<VertexKey> = self.vertices.keys().copied().collect();
        for key in keys {
            let degree = match self.vertices.get(&key) {
                Some(v) => v.neighbours.len(),
                None => continue,
            };
            if degree >= 8 {
                self.disconnect(key);
            }
        }
    }

    /// Runs collapse passes until a full pass no longer reduces the
    /// vertex count.
    ///
    /// Terminates because the count is monotonically non-increasing.
    pub fn combine_edges(&mut self) -> Result<(), RasterError> {
        self.combine_edges_traced(&mut NoTrace)
    }

    /// [`VectorGlyph::combine_edges`] with per-collapse debug snapshots
    /// delivered to `sink`.
    pub fn combine_edges_traced(&mut self, sink: &mut dyn TraceSink) -> Result<(), RasterError> {
        loop {
            let len = self.vertices.len();
            self.combine_pass(sink)?;
            self.revision += 1;
            if len == self.vertices.len() {
                return Ok(());
            }
        }
    }

    /// One pass: enumerate candidates, rank them, collapse the first one
    /// that provably leaves the raster output unchanged. Returns after the
    /// first collapse that reduces the vertex count.
    fn combine_pass(&mut self, sink: &mut dyn TraceSink) -> Result<(), RasterError> {
        let size = self.vertices.len();
        let mut paths = self.all_candidates();
        // Longest chain first; stable sort keeps emission order as the
        // final tie-break.
        paths.sort_by(|lhs, rhs| {
            rhs.len()
                .cmp(&lhs.len())
                .then_with(|| self.candidate_score(rhs).total_cmp(&self.candidate_score(lhs)))
        });
        for path in &paths {
            let (first, last) = (path[0], path[path.len() - 1]);
            let (fx, fy) = self.coords(first);
            let (lx, ly) = self.coords(last);
            if self.is_diagonal(path) {
                // A diagonal that spans less than 2 pixels on either axis
                // is not a real 45 degree stroke; collapsing it claims
                // pixels in unintuitive ways.
                if (fx - lx).abs() < 2 || (fy - ly).abs() < 2 {
                    continue;
                }
            }
            // The straight replacement and the original chain must render
            // pixel-identically, otherwise the candidate is skipped.
            let mut single = RasterGlyph::new(self.width, self.height);
            single.line(fx, fy, lx, ly)?;
            let mut chain = RasterGlyph::new(self.width, self.height);
            for pair in path.windows(2) {
                let (ax, ay) = self.coords(pair[0]);
                let (bx, by) = self.coords(pair[1]);
                chain.line(ax, ay, bx, by)?;
            }
            if single != chain {
                continue;
            }
            if sink.active() {
                if self.revision == 0 {
                    let svg = self.to_svg()?;
                    sink.snapshot(0, &svg);
                }
                self.set_marks(path, true);
            }
            self.collapse(path)?;
            if sink.active() {
                let svg = self.to_svg()?;
                sink.snapshot(self.revision + 1, &svg);
                self.set_marks(path, false);
            }
            if size != self.vertices.len() {
                return Ok(());
            }
        }
        Ok(())
    }

    fn set_marks(&mut self, path: &[VertexKey], value: bool) {
        for key in path {
            if let Some(v) = self.vertices.get_mut(key) {
                v.marked = value;
            }
        }
    }

    /// Every path worth considering for a collapse, from every vertex as
    /// a root.
    ///
    /// Depth-bounded backtracking over neighbours with an explicit frame
    /// stack and a visited set local to each root. Paths only extend to
    /// neighbours strictly farther from the root than the current tip
    /// (monotonic distance, so a path cannot fold back on itself), capped
    /// at `max_path_len` vertices. Every explored path longer than 2 is
    /// emitted, in post-order like the recursion it replaces.
    ///
    /// Dense glyphs can explode combinatorially; past `max_candidates`
    /// the search stops expanding and keeps what it has.
    fn all_candidates(&self) -> Vec<Vec<VertexKey>> {
        let mut out = Vec::new();
        let mut warned = false;
        for &root in self.vertices.keys() {
            self.candidates_from(root, &mut out, &mut warned);
        }
        out
    }

    fn candidates_from(
        &self,
        root: VertexKey,
        out: &mut Vec<Vec<VertexKey>>,
        warned: &mut bool,
    ) {
        struct Frame {
            key: VertexKey,
            base_dist: f64,
            neighbours: Vec<VertexKey>,
            next: usize,
        }

        let capped = |out: &Vec<Vec<VertexKey>>, warned: &mut bool| {
            if out.len() <= self.limits.max_candidates {
                return false;
            }
            if !*warned {
                warn!(
                    "glyph has over {} candidate paths, trace quality degrades; \
                     consider inverting it or thinning the strokes",
                    self.limits.max_candidates
                );
                *warned = true;
            }
            true
        };

        if capped(out, warned) {
            return;
        }
        let frame = |key: VertexKey, base_dist: f64| Frame {
            key,
            base_dist,
            neighbours: self
                .vertices
                .get(&key)
                .map(|v| v.neighbours.iter().copied().collect())
                .unwrap_or_default(),
            next: 0,
        };
        let mut path = vec![root];
        let mut visited: HashSet<VertexKey> = HashSet::from([root]);
        let mut stack = vec![frame(root, 0.0)];
        while !stack.is_empty() {
            let top = stack.len() - 1;
            let step = {
                let f = &mut stack[top];
                if f.next < f.neighbours.len() {
                    let n = f.neighbours[f.next];
                    f.next += 1;
                    Some((n, f.base_dist))
                } else {
                    None
                }
            };
            match step {
                Some((n, base_dist)) => {
                    if visited.contains(&n) {
                        continue;
                    }
                    let n_dist = self.distance(root, n);
                    if n_dist > base_dist && path.len() < self.limits.max_path_len {
                        if capped(out, warned) {
                            continue;
                        }
                        visited.insert(n);
                        path.push(n);
                        stack.push(frame(n, n_dist));
                    }
                }
                None => {
                    if path.len() > 2 {
                        out.push(path.clone());
                    }
                    if let Some(f) = stack.pop() {
                        visited.remove(&f.key);
                    }
                    path.pop();
                }
            }
        }
    }

    /// Endpoint distance, with diagonals handicapped by 1 so axis-aligned
    /// collapses win at near-equal lengths.
    fn candidate_score(&self, path: &[VertexKey]) -> f64 {
        let len = self.distance(path[0], path[path.len() - 1]);
        if self.is_diagonal(path) {
            len - 1.0
        } else {
            len
        }
    }

    fn is_diagonal(&self, path: &[VertexKey]) -> bool {
        let (fx, fy) = self.coords(path[0]);
        let (lx, ly) = self.coords(path[path.len() - 1]);
        fx != lx && fy != ly
    }

    fn coords(&self, key: VertexKey) -> (i32, i32) {
        match self.vertices.get(&key) {
            Some(v) => (v.x, v.y),
            // Keys encode their coordinate, so a removed vertex still
            // resolves (only reachable transiently during a collapse).
            None => (key.rem_euclid(self.width), key.div_euclid(self.width)),
        }
    }

    fn distance(&self, a: VertexKey, b: VertexKey) -> f64 {
        let (ax, ay) = self.coords(a);
        let (bx, by) = self.coords(b);
        let dx = (ax - bx) as f64;
        let dy = (ay - by) as f64;
        (dx * dx + dy * dy).sqrt()
    }

    /// Collapses an accepted path: drop the redundant interior vertices
    /// and join the survivors into a single chain.
    ///
    /// The whole graph is rendered before and after; if the output
    /// drifted (diagonals crossing other strokes can do this), the partial
    /// collapse is abandoned for the lossy full collapse and a warning is
    /// logged so the result can be reviewed.
    fn collapse(&mut self, path: &[VertexKey]) -> Result<(), RasterError> {
        let before = self.to_raster_glyph(RenderFlags::ALL)?;
        let mut kept = Vec::new();
        let mut doomed = Vec::new();
        for &key in path {
            if self.is_redundant(key, path) {
                doomed.push(key);
            } else {
                kept.push(key);
            }
        }
        for &key in &doomed {
            let neighbours: Vec<VertexKey> = match self.vertices.get(&key) {
                Some(v) => v.neighbours.iter().copied().collect(),
                None => continue,
            };
            for n in neighbours {
                self.unjoin(key, n);
            }
        }
        for key in &doomed {
            self.vertices.remove(key);
        }
        for pair in kept.windows(2) {
            self.join(pair[0], pair[1]);
        }
        let after = self.to_raster_glyph(RenderFlags::ALL)?;
        if after != before {
            warn!("trace drifted while collapsing a path; forcing a full collapse, review the result manually");
            self.collapse_fully(&kept);
        }
        Ok(())
    }

    /// Lossy fallback: delete every interior vertex of the chain and join
    /// the two endpoints directly.
    fn collapse_fully(&mut self, chain: &[VertexKey]) {
        if chain.len() < 2 {
            return;
        }
        let (first, last) = (chain[0], chain[chain.len() - 1]);
        for &key in &chain[1..chain.len() - 1] {
            let neighbours: Vec<VertexKey> = match self.vertices.get(&key) {
                Some(v) => v.neighbours.iter().copied().collect(),
                None => continue,
            };
            for n in neighbours {
                self.unjoin(key, n);
            }
            self.vertices.remove(&key);
        }
        self.join(first, last);
    }

    /// Whether an interior path vertex can be removed without losing a
    /// connection point for some external neighbour.
    fn is_redundant(&self, key: VertexKey, path: &[VertexKey]) -> bool {
        if key == path[0] || key == path[path.len() - 1] {
            // Ends are never redundant.
            return false;
        }
        let Some(v) = self.vertices.get(&key) else {
            return false;
        };
        if v.neighbours.iter().all(|n| path.contains(n)) {
            // Joined only to other chain members.
            return true;
        }
        for &n in &v.neighbours {
            if path.contains(&n) {
                continue;
            }
            if self.should_connect(key, n, path) {
                return false;
            }
        }
        true
    }

    /// Whether `key` is the designated connection point on `path` for the
    /// external neighbour `external`.
    ///
    /// Works on the maximal contiguous run of path vertices around `key`
    /// that are all adjacent to `external`: a single-member run wins
    /// outright, an odd run selects its middle, an even run touching
    /// exactly one path endpoint selects that endpoint. An even run
    /// touching both or neither endpoint falls back to keeping the
    /// current vertex; no principled winner exists for that case and the
    /// post-collapse raster check backstops it.
    fn should_connect(&self, key: VertexKey, external: VertexKey, path: &[VertexKey]) -> bool {
        let Some(this_index) = path.iter().position(|&k| k == key) else {
            return false;
        };
        let last_index = path.len() - 1;
        let adjacent = |k: VertexKey| {
            self.vertices
                .get(&k)
                .is_some_and(|v| v.neighbours.contains(&external))
        };
        let mut start = this_index;
        while start > 0 && adjacent(path[start - 1]) {
            start -= 1;
        }
        let mut end = this_index;
        while end < last_index && adjacent(path[end + 1]) {
            end += 1;
        }
        let run = end - start + 1;
        if run == 1 {
            return true;
        }
        if run % 2 == 1 {
            return start + run / 2 == this_index;
        }
        let contains_first = start == 0;
        let contains_last = end == last_index;
        if contains_first ^ contains_last {
            if contains_first {
                return this_index == 0;
            }
            return this_index == last_index;
        }
        // Even run touching both or neither endpoint: keep the current
        // vertex. No principled winner is known for this case.
        true
    }

    /// Rebuilds this graph from `source`, remapping every vertex and edge
    /// through the geometry pair. Topology is preserved, coordinates are
    /// interpolated; this is the rescale step.
    pub fn copy_from(&mut self, source: &VectorGlyph, src: &Geometry, dst: &Geometry) {
        // Start clean in case this graph was populated before.
        self.vertices.clear();
        for v in source.vertices.values() {
            let p = src.transform_point(v.x, v.y, dst);
            self.add_vertex(p.x, p.y);
        }
        for v in source.vertices.values() {
            for &n in &v.neighbours {
                let Some(o) = source.vertices.get(&n) else {
                    continue;
                };
                let a = src.transform_point(v.x, v.y, dst);
                let b = src.transform_point(o.x, o.y, dst);
                let (ka, kb) = (self.key_of(a.x, a.y), self.key_of(b.x, b.y));
                self.join(ka, kb);
            }
        }
    }

    /// Full-canvas geometry of this graph.
    pub fn geometry(&self) -> Geometry {
        Geometry::new(self.width, self.height)
    }

    /// Tight bounding box over all vertices, or the full canvas when the
    /// graph is empty.
    pub fn internal_geometry(&self) -> Geometry {
        if self.vertices.is_empty() {
            return self.geometry();
        }
        let mut min_x = i32::MAX;
        let mut min_y = i32::MAX;
        let mut max_x = i32::MIN;
        let mut max_y = i32::MIN;
        for v in self.vertices.values() {
            min_x = min_x.min(v.x);
            min_y = min_y.min(v.y);
            max_x = max_x.max(v.x);
            max_y = max_y.max(v.y);
        }
        Geometry::with_offset(max_x - min_x + 1, max_y - min_y + 1, min_x, min_y)
    }

    /// Renders the graph to a raster: vertices as pixels, edges as
    /// Bresenham lines, per `flags`.
    pub fn to_raster_glyph(&self, flags: RenderFlags) -> Result<RasterGlyph, RasterError> {
        let mut out = RasterGlyph::new(self.width, self.height);
        for v in self.vertices.values() {
            if flags.contains(RenderFlags::DOTS) {
                out.set(v.x, v.y, true)?;
            }
            if flags.contains(RenderFlags::LINES) {
                for n in &v.neighbours {
                    if let Some(o) = self.vertices.get(n) {
                        out.line(v.x, v.y, o.x, o.y)?;
                    }
                }
            }
        }
        Ok(out)
    }

    /// Debug rendering: the line raster as gray backing squares at 10
    /// units per pixel, edges in blue, vertices in red (yellow while
    /// marked). Informational only.
    pub fn to_svg(&self) -> Result<String, RasterError> {
        let mut svg = String::new();
        svg.push_str("<?xml version=\"1.0\" standalone=\"no\"?>\n");
        let _ = writeln!(
            svg,
            "<svg width=\"{}\" height=\"{}\" version=\"1.1\" xmlns=\"http://www.w3.org/2000/svg\">",
            self.width * 10,
            self.height * 10
        );
        let backing = self.to_raster_glyph(RenderFlags::LINES)?;
        for y in 0..self.height {
            for x in 0..self.width {
                if !backing.get(x, y)? {
                    continue;
                }
                let _ = writeln!(
                    svg,
                    "    <rect x=\"{}\" y=\"{}\" width=\"8\" height=\"8\" stroke=\"none\" fill=\"#ccc\" stroke-width=\"0\"/>",
                    x * 10 + 1,
                    y * 10 + 1
                );
            }
        }
        for v in self.vertices.values() {
            for n in &v.neighbours {
                if let Some(o) = self.vertices.get(n) {
                    let _ = writeln!(
                        svg,
                        "    <line x1=\"{}\" x2=\"{}\" y1=\"{}\" y2=\"{}\" stroke=\"blue\" stroke-width=\"1\"/>",
                        v.x * 10 + 5,
                        o.x * 10 + 5,
                        v.y * 10 + 5,
                        o.y * 10 + 5
                    );
                }
            }
        }
        for v in self.vertices.values() {
            let color = if v.marked { "yellow" } else { "red" };
            let _ = writeln!(
                svg,
                "    <circle cx=\"{}\" cy=\"{}\" r=\"1\" stroke=\"{}\" fill=\"{}\" stroke-width=\"1\"/>",
                v.x * 10 + 5,
                v.y * 10 + 5,
                color,
                color
            );
        }
        svg.push_str("</svg>\n");
        Ok(svg)
    }
}
