//! Primitive assembly and draw dispatch
//!
//! A draw call runs every primitive through the same fixed sequence:
//!
//! ```text
//! fetch -> vertex unit -> clip -> project -> fill -> fragment unit -> write_pixel
//! ```
//!
//! Projection maps clip space to window space: `x, y, z` are divided by `w`,
//! `x` and `y` are scaled onto the viewport with `y` pointing down, `z` is
//! remapped from `[-1, 1]` to `[0, 1]` and clamped, and `w` is replaced by
//! `1/w`. Float varyings are premultiplied by that `1/w` at the same time so
//! the fillers can interpolate linearly in screen space and recover
//! perspective-correct values per fragment.
//!
//! All scratch buffers live in [`Rasterizer`] and are reused across vertices,
//! primitives and draws; they are only re-laid out when the program or the
//! vertex source changes shape.

mod line;
mod triangle;

use crate::clip::{self, ClipPolygon};
use crate::error::Result;
use crate::shader::{ShaderProgram, ShaderStatus, ShaderUnit};
use crate::shader_buffer::ShaderBuffer;
use crate::surface::{Capability, RenderTarget, Viewport};
use crate::vertex::{VertexSource, VertexWords};
use prism_core::graphics::ColorOps;
use prism_core::logging::{log, LogCategory, LogLevel};
use serde::{Deserialize, Serialize};
use std::ops::AddAssign;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DrawMode {
    Points,
    Lines,
    LineStrip,
    LineLoop,
    Triangles,
    TriangleStrip,
    TriangleFan,
}

/// Counters for one draw call
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DrawStats {
    pub vertices_shaded: u64,
    pub primitives_in: u64,
    /// Back faces plus degenerate (zero-area or zero-`w`) primitives
    pub primitives_culled: u64,
    pub primitives_clipped_away: u64,
    pub fragments_shaded: u64,
    /// Fragments that passed the depth test and reached the color plane
    pub fragments_written: u64,
}

impl AddAssign for DrawStats {
    fn add_assign(&mut self, rhs: Self) {
        self.vertices_shaded += rhs.vertices_shaded;
        self.primitives_in += rhs.primitives_in;
        self.primitives_culled += rhs.primitives_culled;
        self.primitives_clipped_away += rhs.primitives_clipped_away;
        self.fragments_shaded += rhs.fragments_shaded;
        self.fragments_written += rhs.fragments_written;
    }
}

/// Pixel rectangle fragments may land in: viewport ∩ surface, high side
/// exclusive
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Bounds {
    pub x0: i64,
    pub y0: i64,
    pub x1: i64,
    pub y1: i64,
}

impl Bounds {
    fn new(viewport: &Viewport, width: u32, height: u32) -> Self {
        let (x0, y0, x1, y1) = viewport.clip_to(width, height);
        Self { x0, y0, x1, y1 }
    }

    fn is_empty(&self) -> bool {
        self.x0 >= self.x1 || self.y0 >= self.y1
    }

    #[inline]
    pub fn contains(&self, x: i64, y: i64) -> bool {
        x >= self.x0 && x < self.x1 && y >= self.y0 && y < self.y1
    }
}

/// Surface state sampled once at the start of a draw
#[derive(Debug, Clone, Copy)]
struct DrawState {
    viewport: Viewport,
    bounds: Bounds,
    depth_clamp: bool,
    cull_back_faces: bool,
}

/// Fragment shader input/output scratch plus the per-fragment tail of the
/// pipeline
#[derive(Debug, Clone)]
pub(crate) struct FragmentStage {
    pub input: ShaderBuffer,
    output: ShaderBuffer,
}

impl FragmentStage {
    fn new() -> Self {
        Self {
            input: ShaderBuffer::new(&[]),
            output: ShaderBuffer::new(&[]),
        }
    }

    /// Shade and write one fragment whose varyings are already in `input`
    ///
    /// Varyings arrive premultiplied by `1/w`; `inv_w` is the interpolated
    /// `1/w` used to undo that.
    #[allow(clippy::too_many_arguments)]
    pub fn emit<T: RenderTarget + ?Sized>(
        &mut self,
        target: &mut T,
        fragment: &mut dyn ShaderUnit,
        x: i64,
        y: i64,
        z: f32,
        inv_w: f32,
        stats: &mut DrawStats,
    ) -> Result<()> {
        self.input
            .set_vec4_at(0, [x as f32 + 0.5, y as f32 + 0.5, z, inv_w]);
        clip::perspective_recover(&mut self.input, inv_w);
        self.input.flip();
        self.output.clear();

        let status = fragment.execute(&mut self.input, &mut self.output)?;
        stats.fragments_shaded += 1;
        if status == ShaderStatus::Discard {
            return Ok(());
        }

        self.output.flip();
        let color = ColorOps::pack(self.output.read_vec4()?);
        if target.write_pixel(x, y, z, color)? {
            stats.fragments_written += 1;
        }
        Ok(())
    }
}

/// Clip space to window space; `None` when `w` is zero
///
/// Returns `[x, y, z, 1/w]`.
#[inline]
pub fn project(p: [f32; 4], viewport: &Viewport) -> Option<[f32; 4]> {
    if p[3] == 0.0 {
        return None;
    }
    let inv_w = 1.0 / p[3];
    let (nx, ny, nz) = (p[0] * inv_w, p[1] * inv_w, p[2] * inv_w);
    Some([
        (nx + 1.0) * 0.5 * viewport.width as f32 + viewport.x as f32,
        (1.0 - ny) * 0.5 * viewport.height as f32 + viewport.y as f32,
        ((nz + 1.0) * 0.5).clamp(0.0, 1.0),
        inv_w,
    ])
}

/// Twice the signed NDC area of a clip-space triangle, positive when
/// counter-clockwise
#[inline]
fn ndc_area(p: [[f32; 4]; 3]) -> f32 {
    let ndc = p.map(|v| [v[0] / v[3], v[1] / v[3]]);
    (ndc[1][0] - ndc[0][0]) * (ndc[2][1] - ndc[0][1])
        - (ndc[2][0] - ndc[0][0]) * (ndc[1][1] - ndc[0][1])
}

/// Where a clipped vertex takes its varyings from
#[derive(Debug, Clone, Copy)]
enum Varyings {
    /// Copy of one shaded vertex
    Vertex(usize),
    /// Parametric position between `shaded[0]` and `shaded[1]`
    Line(f32),
    /// Barycentric weights over all three shaded vertices
    Triangle([f32; 3]),
}

/// Software pipeline driver
#[derive(Debug, Clone)]
pub struct Rasterizer {
    vertices: VertexWords,
    input: ShaderBuffer,
    /// Vertex unit outputs in clip space, one per primitive vertex
    shaded: [ShaderBuffer; 3],
    /// Clipped vertices in window space, varyings premultiplied by `1/w`
    clipped: [ShaderBuffer; 3],
    fragments: FragmentStage,
    polygon: ClipPolygon,
    point_size: u32,
    stats: DrawStats,
}

impl Default for Rasterizer {
    fn default() -> Self {
        Self::new()
    }
}

impl Rasterizer {
    pub fn new() -> Self {
        let empty = || ShaderBuffer::new(&[]);
        Self {
            vertices: VertexWords::new(),
            input: empty(),
            shaded: [empty(), empty(), empty()],
            clipped: [empty(), empty(), empty()],
            fragments: FragmentStage::new(),
            polygon: ClipPolygon::new(),
            point_size: 1,
            stats: DrawStats::default(),
        }
    }

    pub fn point_size(&self) -> u32 {
        self.point_size
    }

    /// Edge length in pixels of the square drawn per point; at least 1
    pub fn set_point_size(&mut self, size: u32) {
        self.point_size = size.max(1);
    }

    /// Counters of the most recent draw call
    pub fn last_stats(&self) -> DrawStats {
        self.stats
    }

    /// Draw `count` indices starting at `offset` of `source`'s index buffer
    ///
    /// Any error aborts the draw; pixels written before it stay written.
    pub fn draw<T: RenderTarget + ?Sized>(
        &mut self,
        target: &mut T,
        program: &mut ShaderProgram,
        source: &VertexSource,
        mode: DrawMode,
        offset: usize,
        count: usize,
    ) -> Result<DrawStats> {
        self.stats = DrawStats::default();
        let indices = source.index_range(offset, count)?;
        self.vertices.load(source)?;
        self.prepare(program, source);

        let viewport = target.viewport();
        let state = DrawState {
            viewport,
            bounds: Bounds::new(&viewport, target.width(), target.height()),
            depth_clamp: target.is_enabled(Capability::DepthClamp),
            cull_back_faces: target.is_enabled(Capability::CullBackFace),
        };
        if state.bounds.is_empty() {
            log(LogCategory::Pipeline, LogLevel::Debug, || {
                format!("viewport {:?} does not overlap the surface", viewport)
            });
            return Ok(self.stats);
        }

        match mode {
            DrawMode::Points => {
                for &index in indices {
                    self.draw_point(target, program, index, &state)?;
                }
            }
            DrawMode::Lines => {
                for pair in indices.chunks_exact(2) {
                    self.draw_line(target, program, [pair[0], pair[1]], &state)?;
                }
            }
            DrawMode::LineStrip | DrawMode::LineLoop => {
                for pair in indices.windows(2) {
                    self.draw_line(target, program, [pair[0], pair[1]], &state)?;
                }
                if mode == DrawMode::LineLoop && indices.len() > 2 {
                    let closing = [indices[indices.len() - 1], indices[0]];
                    self.draw_line(target, program, closing, &state)?;
                }
            }
            DrawMode::Triangles => {
                for tri in indices.chunks_exact(3) {
                    self.draw_triangle(target, program, [tri[0], tri[1], tri[2]], &state)?;
                }
            }
            DrawMode::TriangleStrip => {
                for (i, tri) in indices.windows(3).enumerate() {
                    // Odd triangles swap their first two vertices to keep winding
                    let tri = if i % 2 == 0 {
                        [tri[0], tri[1], tri[2]]
                    } else {
                        [tri[1], tri[0], tri[2]]
                    };
                    self.draw_triangle(target, program, tri, &state)?;
                }
            }
            DrawMode::TriangleFan => {
                if let Some((&first, rest)) = indices.split_first() {
                    for pair in rest.windows(2) {
                        self.draw_triangle(target, program, [first, pair[0], pair[1]], &state)?;
                    }
                }
            }
        }

        log(LogCategory::Pipeline, LogLevel::Debug, || {
            format!("draw {:?} x{}: {:?}", mode, count, self.stats)
        });
        Ok(self.stats)
    }

    /// Re-lay out scratch buffers if the program or source changed shape
    fn prepare(&mut self, program: &ShaderProgram, source: &VertexSource) {
        let inputs = source.input_formats();
        if self.input.formats() != inputs.as_slice() {
            self.input.set_formats(&inputs);
        }
        let varyings = program.vertex().output_format();
        for buffer in self
            .shaded
            .iter_mut()
            .chain(self.clipped.iter_mut())
            .chain(std::iter::once(&mut self.fragments.input))
        {
            if buffer.formats() != varyings {
                buffer.set_formats(varyings);
            }
        }
        let outputs = program.fragment().output_format();
        if self.fragments.output.formats() != outputs {
            self.fragments.output.set_formats(outputs);
        }
    }

    /// Run the vertex unit for `index` into `shaded[slot]`
    ///
    /// Returns `false` if the unit discarded the vertex.
    fn shade_vertex(
        &mut self,
        vertex: &mut dyn ShaderUnit,
        index: u32,
        slot: usize,
    ) -> Result<bool> {
        self.vertices.fetch(index, &mut self.input)?;
        let output = &mut self.shaded[slot];
        output.clear();
        let status = vertex.execute(&mut self.input, output)?;
        output.flip();
        self.stats.vertices_shaded += 1;
        if status == ShaderStatus::Discard {
            log(LogCategory::Stubs, LogLevel::Warn, || {
                format!("vertex discard is not supported, dropping primitive at index {}", index)
            });
            return Ok(false);
        }
        Ok(true)
    }

    /// Build `clipped[slot]` from a clip-space position and the shaded
    /// vertices it was derived from
    ///
    /// Only the shaded buffers of the current primitive are read. Returns
    /// `false` when the position cannot be projected.
    fn emit_clipped(
        &mut self,
        slot: usize,
        position: [f32; 4],
        varyings: Varyings,
        viewport: &Viewport,
    ) -> bool {
        let Some(window) = project(position, viewport) else {
            return false;
        };
        let out = &mut self.clipped[slot];
        let [a, b, c] = &self.shaded;
        match varyings {
            Varyings::Vertex(i) => out.copy_from(&self.shaded[i]),
            Varyings::Line(t) if t == 0.0 => out.copy_from(a),
            Varyings::Line(t) if t == 1.0 => out.copy_from(b),
            Varyings::Line(t) => clip::lerp(a, b, t, out),
            Varyings::Triangle(w) => match w.iter().position(|&x| x == 1.0) {
                Some(i) => out.copy_from(&self.shaded[i]),
                None => clip::bary_lerp(a, b, c, w[0], w[1], w[2], out),
            },
        }
        out.set_vec4_at(0, window);
        clip::perspective_premultiply(out, window[3]);
        true
    }

    fn draw_point<T: RenderTarget + ?Sized>(
        &mut self,
        target: &mut T,
        program: &mut ShaderProgram,
        index: u32,
        state: &DrawState,
    ) -> Result<()> {
        self.stats.primitives_in += 1;
        let (vertex, fragment) = program.units_mut();
        if !self.shade_vertex(vertex, index, 0)? {
            return Ok(());
        }
        let position = self.shaded[0].vec4_at(0);
        if !clip::clip_point(position, state.depth_clamp) {
            self.stats.primitives_clipped_away += 1;
            log(LogCategory::Clip, LogLevel::Trace, || {
                format!("point {} outside clip volume", index)
            });
            return Ok(());
        }
        if !self.emit_clipped(0, position, Varyings::Vertex(0), &state.viewport) {
            self.stats.primitives_culled += 1;
            return Ok(());
        }

        let [x, y, z, inv_w] = self.clipped[0].vec4_at(0);
        let half = self.point_size as f32 * 0.5;
        let x0 = ((x - half - 0.5).ceil() as i64).max(state.bounds.x0);
        let y0 = ((y - half - 0.5).ceil() as i64).max(state.bounds.y0);
        let x1 = (x0 + self.point_size as i64).min(state.bounds.x1);
        let y1 = (y0 + self.point_size as i64).min(state.bounds.y1);

        for py in y0..y1 {
            for px in x0..x1 {
                self.fragments.input.copy_from(&self.clipped[0]);
                self.fragments
                    .emit(target, fragment, px, py, z, inv_w, &mut self.stats)?;
            }
        }
        Ok(())
    }

    fn draw_line<T: RenderTarget + ?Sized>(
        &mut self,
        target: &mut T,
        program: &mut ShaderProgram,
        indices: [u32; 2],
        state: &DrawState,
    ) -> Result<()> {
        self.stats.primitives_in += 1;
        let (vertex, fragment) = program.units_mut();
        for (slot, &index) in indices.iter().enumerate() {
            if !self.shade_vertex(vertex, index, slot)? {
                return Ok(());
            }
        }
        let p0 = self.shaded[0].vec4_at(0);
        let p1 = self.shaded[1].vec4_at(0);
        let Some((t0, t1)) = clip::clip_line(p0, p1, state.depth_clamp) else {
            self.stats.primitives_clipped_away += 1;
            log(LogCategory::Clip, LogLevel::Trace, || {
                format!("line {:?} outside clip volume", indices)
            });
            return Ok(());
        };

        for (slot, t) in [(0, t0), (1, t1)] {
            let position = clip::lerp4(p0, p1, t);
            if !self.emit_clipped(slot, position, Varyings::Line(t), &state.viewport) {
                self.stats.primitives_culled += 1;
                return Ok(());
            }
        }

        let [a, b, _] = &self.clipped;
        line::draw(
            target,
            fragment,
            [a, b],
            &mut self.fragments,
            state.bounds,
            &mut self.stats,
        )
    }

    fn draw_triangle<T: RenderTarget + ?Sized>(
        &mut self,
        target: &mut T,
        program: &mut ShaderProgram,
        indices: [u32; 3],
        state: &DrawState,
    ) -> Result<()> {
        self.stats.primitives_in += 1;
        let (vertex, fragment) = program.units_mut();
        for (slot, &index) in indices.iter().enumerate() {
            if !self.shade_vertex(vertex, index, slot)? {
                return Ok(());
            }
        }
        let positions = [
            self.shaded[0].vec4_at(0),
            self.shaded[1].vec4_at(0),
            self.shaded[2].vec4_at(0),
        ];
        clip::clip_polygon(positions, state.depth_clamp, &mut self.polygon);
        if self.polygon.is_empty() {
            self.stats.primitives_clipped_away += 1;
            log(LogCategory::Clip, LogLevel::Trace, || {
                format!("triangle {:?} outside clip volume", indices)
            });
            return Ok(());
        }
        if self.polygon.len() > 3 {
            log(LogCategory::Clip, LogLevel::Trace, || {
                format!(
                    "triangle {:?} clipped to {} vertices",
                    indices,
                    self.polygon.len()
                )
            });
        }

        let mut culled = false;
        for i in 1..self.polygon.len() - 1 {
            let verts = [
                self.polygon.vertices()[0],
                self.polygon.vertices()[i],
                self.polygon.vertices()[i + 1],
            ];
            let area = ndc_area(verts.map(|v| v.position));
            if state.cull_back_faces && area <= 0.0 {
                culled = true;
                continue;
            }

            let mut projected = true;
            for (slot, v) in verts.iter().enumerate() {
                projected &= self.emit_clipped(
                    slot,
                    v.position,
                    Varyings::Triangle(v.weights),
                    &state.viewport,
                );
            }
            if !projected {
                culled = true;
                continue;
            }

            let filled = triangle::fill(
                target,
                fragment,
                &self.clipped,
                &mut self.fragments,
                state.bounds,
                &mut self.stats,
            )?;
            if !filled {
                log(LogCategory::Raster, LogLevel::Trace, || {
                    format!("triangle {:?} has zero area", indices)
                });
                culled = true;
            }
        }
        if culled {
            self.stats.primitives_culled += 1;
        }
        Ok(())
    }
}
