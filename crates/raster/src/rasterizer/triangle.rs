//! Half-space triangle filler
//!
//! Vertices are snapped to 28.4 fixed point with the half-pixel offset
//! folded in, so integer grid points are pixel centers. Each edge defines a
//! linear function that is positive inside the triangle; a pixel is covered
//! when all three are. The bounding box is walked in 8×8 blocks: a block
//! whose four corners are all outside one edge is skipped, a block whose
//! corners are all inside every edge is filled without per-pixel tests, and
//! anything else is tested pixel by pixel.
//!
//! Fill convention is top-left: pixel centers exactly on a top or left edge
//! belong to the triangle, centers on other edges do not. Two triangles
//! sharing an edge therefore never both cover a pixel on it.

use super::{Bounds, DrawStats, FragmentStage};
use crate::error::Result;
use crate::shader::ShaderUnit;
use crate::shader_buffer::ShaderBuffer;
use crate::surface::RenderTarget;

const SUBPIXEL_BITS: u32 = 4;
const SUBPIXEL_ONE: f32 = (1 << SUBPIXEL_BITS) as f32;
const SUBPIXEL_MASK: i64 = (1 << SUBPIXEL_BITS) - 1;
const BLOCK: i64 = 8;

/// Window coordinate to 28.4 fixed point relative to pixel centers
#[inline]
fn to_fixed(v: f32) -> i64 {
    ((v - 0.5) * SUBPIXEL_ONE).round() as i64
}

/// Smallest pixel whose center is at or past a fixed-point coordinate
#[inline]
fn ceil_pixel(v: i64) -> i64 {
    (v + SUBPIXEL_MASK) >> SUBPIXEL_BITS
}

/// `E(x, y) = dx·(y − y1) − dy·(x − x1)` for the directed edge 1 → 2
#[derive(Debug, Clone, Copy)]
struct Edge {
    dx: i64,
    dy: i64,
    c: i64,
    /// 1 on top and left edges so that `E == 0` still counts as inside
    bias: i64,
}

impl Edge {
    fn new(x1: i64, y1: i64, x2: i64, y2: i64) -> Self {
        let dx = x1 - x2;
        let dy = y1 - y2;
        let top_left = dy < 0 || (dy == 0 && dx > 0);
        Self {
            dx,
            dy,
            c: dy * x1 - dx * y1,
            bias: top_left as i64,
        }
    }

    #[inline]
    fn eval(&self, x: i64, y: i64) -> i64 {
        self.c + self.dx * y - self.dy * x
    }

    #[inline]
    fn covers(&self, value: i64) -> bool {
        value + self.bias > 0
    }

    /// Coverage bitmask of a block's four corners
    #[inline]
    fn corners(&self, x0: i64, y0: i64, x1: i64, y1: i64) -> u8 {
        (self.covers(self.eval(x0, y0)) as u8)
            | (self.covers(self.eval(x1, y0)) as u8) << 1
            | (self.covers(self.eval(x0, y1)) as u8) << 2
            | (self.covers(self.eval(x1, y1)) as u8) << 3
    }
}

/// Rasterize one window-space triangle
///
/// `verts` hold `[x, y, z, 1/w]` in their position slot and varyings
/// premultiplied by `1/w`. Returns `false` if the triangle has zero area
/// after snapping.
pub(crate) fn fill<T: RenderTarget + ?Sized>(
    target: &mut T,
    fragment: &mut dyn ShaderUnit,
    verts: &[ShaderBuffer; 3],
    stage: &mut FragmentStage,
    bounds: Bounds,
    stats: &mut DrawStats,
) -> Result<bool> {
    let p = [verts[0].vec4_at(0), verts[1].vec4_at(0), verts[2].vec4_at(0)];
    let xs = p.map(|v| to_fixed(v[0]));
    let ys = p.map(|v| to_fixed(v[1]));

    let area = (xs[1] - xs[0]) * (ys[2] - ys[0]) - (ys[1] - ys[0]) * (xs[2] - xs[0]);
    if area == 0 {
        return Ok(false);
    }
    // Edge functions assume one winding; visit the other one in reverse
    let [a, b, c] = if area > 0 { [0, 2, 1] } else { [0, 1, 2] };

    let e_ab = Edge::new(xs[a], ys[a], xs[b], ys[b]);
    let e_bc = Edge::new(xs[b], ys[b], xs[c], ys[c]);
    let e_ca = Edge::new(xs[c], ys[c], xs[a], ys[a]);
    // The three edge functions always sum to twice the area
    let det = (e_ab.c + e_bc.c + e_ca.c) as f32;

    let min_x = ceil_pixel(xs[0].min(xs[1]).min(xs[2])).max(bounds.x0);
    let min_y = ceil_pixel(ys[0].min(ys[1]).min(ys[2])).max(bounds.y0);
    let max_x = ceil_pixel(xs[0].max(xs[1]).max(xs[2])).min(bounds.x1);
    let max_y = ceil_pixel(ys[0].max(ys[1]).max(ys[2])).min(bounds.y1);
    if min_x >= max_x || min_y >= max_y {
        return Ok(true);
    }

    let z = p.map(|v| v[2]);
    let inv_w = p.map(|v| v[3]);
    let mut weights = [0.0f32; 3];

    let block_x0 = min_x & !(BLOCK - 1);
    let block_y0 = min_y & !(BLOCK - 1);
    for by in (block_y0..max_y).step_by(BLOCK as usize) {
        for bx in (block_x0..max_x).step_by(BLOCK as usize) {
            let x0 = bx << SUBPIXEL_BITS;
            let y0 = by << SUBPIXEL_BITS;
            let x1 = (bx + BLOCK - 1) << SUBPIXEL_BITS;
            let y1 = (by + BLOCK - 1) << SUBPIXEL_BITS;

            let m_ab = e_ab.corners(x0, y0, x1, y1);
            let m_bc = e_bc.corners(x0, y0, x1, y1);
            let m_ca = e_ca.corners(x0, y0, x1, y1);
            if m_ab == 0 || m_bc == 0 || m_ca == 0 {
                continue;
            }
            let full = m_ab == 0xF && m_bc == 0xF && m_ca == 0xF;

            for py in by.max(min_y)..(by + BLOCK).min(max_y) {
                let fy = py << SUBPIXEL_BITS;
                for px in bx.max(min_x)..(bx + BLOCK).min(max_x) {
                    let fx = px << SUBPIXEL_BITS;
                    let v_ab = e_ab.eval(fx, fy);
                    let v_bc = e_bc.eval(fx, fy);
                    let v_ca = e_ca.eval(fx, fy);
                    if !full && !(e_ab.covers(v_ab) && e_bc.covers(v_bc) && e_ca.covers(v_ca)) {
                        continue;
                    }

                    // Each vertex is weighted by the edge opposite it
                    weights[a] = v_bc as f32 / det;
                    weights[b] = v_ca as f32 / det;
                    weights[c] = v_ab as f32 / det;

                    crate::clip::bary_lerp(
                        &verts[0],
                        &verts[1],
                        &verts[2],
                        weights[0],
                        weights[1],
                        weights[2],
                        &mut stage.input,
                    );
                    let frag_z = weights[0] * z[0] + weights[1] * z[1] + weights[2] * z[2];
                    let frag_inv_w =
                        weights[0] * inv_w[0] + weights[1] * inv_w[1] + weights[2] * inv_w[2];
                    stage.emit(
                        target,
                        fragment,
                        px,
                        py,
                        frag_z.clamp(0.0, 1.0),
                        frag_inv_w,
                        stats,
                    )?;
                }
            }
        }
    }
    Ok(true)
}
