//! Homogeneous clipping and varying interpolation
//!
//! Clip space is the vertex shader's output space. A point is visible when
//! `-w <= x <= w`, `-w <= y <= w` and `-w <= z <= w`. With depth clamp enabled
//! the two depth planes are skipped; depth is clamped after projection
//! instead.
//!
//! Nothing in here allocates: polygon clipping works on fixed-size arrays
//! owned by [`ClipPolygon`], and interpolation writes into caller-provided
//! [`ShaderBuffer`]s.

use crate::error::{RasterError, Result};
use crate::shader_buffer::ShaderBuffer;
use prism_core::logging::{log, LogCategory, LogLevel};

/// Most vertices a triangle can have after clipping: each plane adds at most one
pub const MAX_CLIP_VERTICES: usize = 3 + 6;

/// Storage per polygon; float noise on near-degenerate input can briefly
/// exceed the convex bound, extra vertices are dropped
const CLIP_CAPACITY: usize = 16;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClipPlane {
    Left,
    Right,
    Bottom,
    Top,
    Near,
    Far,
}

impl ClipPlane {
    pub const ALL: [ClipPlane; 6] = [
        ClipPlane::Left,
        ClipPlane::Right,
        ClipPlane::Bottom,
        ClipPlane::Top,
        ClipPlane::Near,
        ClipPlane::Far,
    ];

    pub fn from_index(index: usize) -> Result<Self> {
        Self::ALL
            .get(index)
            .copied()
            .ok_or(RasterError::UnknownClipPlane(index))
    }

    /// Component compared against `w`
    #[inline]
    pub fn axis(self) -> usize {
        match self {
            ClipPlane::Left | ClipPlane::Right => 0,
            ClipPlane::Bottom | ClipPlane::Top => 1,
            ClipPlane::Near | ClipPlane::Far => 2,
        }
    }

    pub fn is_depth(self) -> bool {
        self.axis() == 2
    }

    /// Signed distance, non-negative on the visible side
    ///
    /// Left/Bottom/Near are `w + c`, Right/Top/Far are `w - c`.
    #[inline]
    pub fn distance(self, p: [f32; 4]) -> f32 {
        match self {
            ClipPlane::Left | ClipPlane::Bottom | ClipPlane::Near => p[3] + p[self.axis()],
            ClipPlane::Right | ClipPlane::Top | ClipPlane::Far => p[3] - p[self.axis()],
        }
    }
}

/// Planes tested for the current depth clamp setting
#[inline]
pub fn active_planes(depth_clamp: bool) -> &'static [ClipPlane] {
    if depth_clamp {
        &ClipPlane::ALL[..4]
    } else {
        &ClipPlane::ALL
    }
}

#[inline]
pub fn is_inside(p: [f32; 4], depth_clamp: bool) -> bool {
    active_planes(depth_clamp)
        .iter()
        .all(|plane| plane.distance(p) >= 0.0)
}

/// Whether a point primitive survives clipping
///
/// `w` must also be positive: a point at `w == 0` has no projection.
pub fn clip_point(p: [f32; 4], depth_clamp: bool) -> bool {
    p[3] > 0.0 && is_inside(p, depth_clamp)
}

/// Clip a segment, returning the visible parameter range `(t0, t1)`
///
/// `t0` is how far the first endpoint moves toward the second, `t1` where the
/// second endpoint ends up, both along the original segment. Varyings are
/// recovered by interpolating the endpoint outputs at those parameters.
/// Returns `None` when both endpoints are outside the same plane or the
/// visible range is empty.
pub fn clip_line(p0: [f32; 4], p1: [f32; 4], depth_clamp: bool) -> Option<(f32, f32)> {
    let mut t0 = 0.0f32;
    let mut t1 = 1.0f32;
    for plane in active_planes(depth_clamp) {
        let d0 = plane.distance(p0);
        let d1 = plane.distance(p1);
        if d0 < 0.0 && d1 < 0.0 {
            return None;
        }
        if d0 < 0.0 {
            t0 = t0.max(d0 / (d0 - d1));
        } else if d1 < 0.0 {
            t1 = t1.min(d0 / (d0 - d1));
        }
        if t0 > t1 {
            return None;
        }
    }
    Some((t0, t1))
}

/// Componentwise `a + (b - a) * t` for positions
#[inline]
pub fn lerp4(a: [f32; 4], b: [f32; 4], t: f32) -> [f32; 4] {
    [
        a[0] + (b[0] - a[0]) * t,
        a[1] + (b[1] - a[1]) * t,
        a[2] + (b[2] - a[2]) * t,
        a[3] + (b[3] - a[3]) * t,
    ]
}

/// A polygon vertex in clip space
///
/// `weights` are the barycentric weights of this vertex with respect to the
/// three vertices of the triangle that was clipped, so varyings can be
/// rebuilt with [`bary_lerp`].
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ClipVertex {
    pub position: [f32; 4],
    pub weights: [f32; 3],
}

impl ClipVertex {
    fn lerp(&self, other: &ClipVertex, t: f32) -> ClipVertex {
        ClipVertex {
            position: lerp4(self.position, other.position, t),
            weights: [
                self.weights[0] + (other.weights[0] - self.weights[0]) * t,
                self.weights[1] + (other.weights[1] - self.weights[1]) * t,
                self.weights[2] + (other.weights[2] - self.weights[2]) * t,
            ],
        }
    }
}

/// Reusable output of [`clip_polygon`]
#[derive(Debug, Clone)]
pub struct ClipPolygon {
    vertices: [ClipVertex; CLIP_CAPACITY],
    scratch: [ClipVertex; CLIP_CAPACITY],
    len: usize,
}

impl Default for ClipPolygon {
    fn default() -> Self {
        Self::new()
    }
}

impl ClipPolygon {
    pub fn new() -> Self {
        Self {
            vertices: [ClipVertex::default(); CLIP_CAPACITY],
            scratch: [ClipVertex::default(); CLIP_CAPACITY],
            len: 0,
        }
    }

    pub fn vertices(&self) -> &[ClipVertex] {
        &self.vertices[..self.len]
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Triangles produced by fanning from vertex 0: `n - 2` for an n-gon
    pub fn fan(&self) -> impl Iterator<Item = [usize; 3]> + '_ {
        (1..self.len.saturating_sub(1)).map(|i| [0, i, i + 1])
    }

    fn load(&mut self, triangle: [[f32; 4]; 3]) {
        const IDENTITY: [[f32; 3]; 3] = [[1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 1.0]];
        for (i, position) in triangle.into_iter().enumerate() {
            self.vertices[i] = ClipVertex {
                position,
                weights: IDENTITY[i],
            };
        }
        self.len = 3;
    }

    /// One Sutherland–Hodgman pass
    fn clip_against(&mut self, plane: ClipPlane) {
        let mut out = 0;
        let mut overflow = false;
        for i in 0..self.len {
            let current = self.vertices[i];
            let next = self.vertices[(i + 1) % self.len];
            let dc = plane.distance(current.position);
            let dn = plane.distance(next.position);

            if dc >= 0.0 {
                overflow |= !push(&mut self.scratch, &mut out, current);
            }
            // An endpoint on the plane is already emitted as a vertex itself
            if (dc >= 0.0) != (dn >= 0.0) && dc != 0.0 && dn != 0.0 {
                let t = dc / (dc - dn);
                overflow |= !push(&mut self.scratch, &mut out, current.lerp(&next, t));
            }
        }
        if overflow {
            log(LogCategory::Clip, LogLevel::Warn, || {
                format!("clip polygon overflow against {:?}, dropping vertices", plane)
            });
        }
        std::mem::swap(&mut self.vertices, &mut self.scratch);
        self.len = out;
    }
}

#[inline]
fn push(dst: &mut [ClipVertex; CLIP_CAPACITY], len: &mut usize, v: ClipVertex) -> bool {
    if *len < CLIP_CAPACITY {
        dst[*len] = v;
        *len += 1;
        true
    } else {
        false
    }
}

/// Clip a triangle against the active planes into `out`
///
/// A triangle entirely inside comes back unchanged as three vertices with
/// identity weights. One entirely outside any plane comes back empty.
pub fn clip_polygon(triangle: [[f32; 4]; 3], depth_clamp: bool, out: &mut ClipPolygon) {
    out.load(triangle);
    if triangle.iter().all(|&p| is_inside(p, depth_clamp)) {
        return;
    }
    for &plane in active_planes(depth_clamp) {
        if out.len < 3 {
            out.len = 0;
            return;
        }
        out.clip_against(plane);
    }
    if out.len < 3 {
        out.len = 0;
    }
}

// -- varying interpolation -----------------------------------------------

/// Interpolate every slot after the position: `out = a + (b - a) * t`
///
/// Float slots are interpolated word by word; int slots take `a`'s words
/// (flat). The position slot of `out` is left for the caller.
pub fn lerp(a: &ShaderBuffer, b: &ShaderBuffer, t: f32, out: &mut ShaderBuffer) {
    let (aw, bw) = (a.words(), b.words());
    for slot in 1..a.slot_count() {
        let range = a.slot_range(slot);
        let float = a.formats()[slot].is_float();
        let dst = &mut out.words_mut()[range.clone()];
        for (d, i) in dst.iter_mut().zip(range) {
            *d = if float {
                let x = f32::from_bits(aw[i]);
                (x + (f32::from_bits(bw[i]) - x) * t).to_bits()
            } else {
                aw[i]
            };
        }
    }
}

/// Barycentric combination of every slot after the position:
/// `out = a*u + b*v + c*w`
///
/// Int slots take `a`'s words. The position slot of `out` is left for the
/// caller.
#[allow(clippy::too_many_arguments)]
pub fn bary_lerp(
    a: &ShaderBuffer,
    b: &ShaderBuffer,
    c: &ShaderBuffer,
    u: f32,
    v: f32,
    w: f32,
    out: &mut ShaderBuffer,
) {
    let (aw, bw, cw) = (a.words(), b.words(), c.words());
    for slot in 1..a.slot_count() {
        let range = a.slot_range(slot);
        let float = a.formats()[slot].is_float();
        let dst = &mut out.words_mut()[range.clone()];
        for (d, i) in dst.iter_mut().zip(range) {
            *d = if float {
                (f32::from_bits(aw[i]) * u + f32::from_bits(bw[i]) * v + f32::from_bits(cw[i]) * w)
                    .to_bits()
            } else {
                aw[i]
            };
        }
    }
}

/// Multiply every float varying by `inv_w`
///
/// Applied once per vertex at projection so that screen-space interpolation
/// of `varying / w` followed by [`perspective_recover`] is perspective-correct.
pub fn perspective_premultiply(buffer: &mut ShaderBuffer, inv_w: f32) {
    scale_float_varyings(buffer, inv_w);
}

/// Undo [`perspective_premultiply`] using the interpolated `1/w`
pub fn perspective_recover(buffer: &mut ShaderBuffer, interpolated_inv_w: f32) {
    if interpolated_inv_w != 0.0 {
        scale_float_varyings(buffer, 1.0 / interpolated_inv_w);
    }
}

fn scale_float_varyings(buffer: &mut ShaderBuffer, factor: f32) {
    for slot in 1..buffer.slot_count() {
        if !buffer.formats()[slot].is_float() {
            continue;
        }
        let range = buffer.slot_range(slot);
        for word in &mut buffer.words_mut()[range] {
            *word = (f32::from_bits(*word) * factor).to_bits();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::format::DataFormat;

    const EPS: f32 = 1e-5;

    fn approx(a: f32, b: f32) -> bool {
        (a - b).abs() < EPS
    }

    #[test]
    fn test_plane_lookup() {
        assert_eq!(ClipPlane::from_index(0), Ok(ClipPlane::Left));
        assert_eq!(ClipPlane::from_index(5), Ok(ClipPlane::Far));
        assert_eq!(
            ClipPlane::from_index(6),
            Err(RasterError::UnknownClipPlane(6))
        );
        assert!(ClipPlane::Near.is_depth());
        assert!(!ClipPlane::Top.is_depth());
    }

    #[test]
    fn test_plane_distances() {
        let p = [0.5, -2.0, 0.0, 1.0];
        assert!(approx(ClipPlane::Left.distance(p), 1.5));
        assert!(approx(ClipPlane::Right.distance(p), 0.5));
        assert!(approx(ClipPlane::Bottom.distance(p), -1.0));
        assert!(approx(ClipPlane::Top.distance(p), 3.0));
        assert!(!is_inside(p, false));
    }

    #[test]
    fn test_depth_clamp_skips_z_planes() {
        let behind_far = [0.0, 0.0, 5.0, 1.0];
        assert!(!is_inside(behind_far, false));
        assert!(is_inside(behind_far, true));
        assert!(!clip_point(behind_far, false));
        assert!(clip_point(behind_far, true));
    }

    #[test]
    fn test_point_at_w_zero_is_dropped() {
        assert!(!clip_point([0.0, 0.0, 0.0, 0.0], false));
        assert!(clip_point([0.0, 0.0, 0.0, 1.0], false));
    }

    #[test]
    fn test_inside_triangle_is_unchanged() {
        let tri = [
            [0.0, 0.0, 0.0, 1.0],
            [1.0, 0.0, 0.0, 1.0],
            [0.0, 1.0, 0.0, 1.0],
        ];
        let mut poly = ClipPolygon::new();
        clip_polygon(tri, false, &mut poly);
        assert_eq!(poly.len(), 3);
        for (i, v) in poly.vertices().iter().enumerate() {
            assert_eq!(v.position, tri[i]);
            assert_eq!(v.weights[i], 1.0);
        }
        assert_eq!(poly.fan().collect::<Vec<_>>(), vec![[0, 1, 2]]);
    }

    #[test]
    fn test_triangle_outside_one_plane_is_empty() {
        let tri = [
            [-2.0, 0.0, 0.0, 1.0],
            [-3.0, 1.0, 0.0, 1.0],
            [-5.0, -1.0, 0.5, 1.0],
        ];
        let mut poly = ClipPolygon::new();
        clip_polygon(tri, false, &mut poly);
        assert!(poly.is_empty());
        assert_eq!(poly.fan().count(), 0);
    }

    #[test]
    fn test_partial_clip_produces_quad() {
        // One vertex past the right plane cuts off a corner
        let tri = [
            [0.0, 0.0, 0.0, 1.0],
            [2.0, 0.0, 0.0, 1.0],
            [0.0, 0.5, 0.0, 1.0],
        ];
        let mut poly = ClipPolygon::new();
        clip_polygon(tri, false, &mut poly);
        assert_eq!(poly.len(), 4);
        assert_eq!(poly.fan().count(), 2);
        for v in poly.vertices() {
            assert!(is_inside(v.position, false));
            assert!(approx(v.weights.iter().sum(), 1.0));
        }
    }

    #[test]
    fn test_clip_weights_reconstruct_positions() {
        let tri = [
            [-3.0, -0.5, 0.2, 1.0],
            [3.0, -0.5, 0.1, 1.0],
            [0.0, 4.0, -0.3, 2.0],
        ];
        let mut poly = ClipPolygon::new();
        clip_polygon(tri, false, &mut poly);
        assert!(poly.len() >= 3 && poly.len() <= MAX_CLIP_VERTICES);
        for v in poly.vertices() {
            for axis in 0..4 {
                let rebuilt: f32 = (0..3).map(|k| v.weights[k] * tri[k][axis]).sum();
                assert!((rebuilt - v.position[axis]).abs() < 1e-4);
            }
        }
    }

    #[test]
    fn test_clip_against_all_planes_stays_bounded() {
        // Large triangle crossing every side plane and both depth planes
        let tri = [
            [-10.0, -10.0, -10.0, 1.0],
            [10.0, -10.0, 10.0, 1.0],
            [0.0, 20.0, 0.0, 1.0],
        ];
        let mut poly = ClipPolygon::new();
        clip_polygon(tri, false, &mut poly);
        assert!(poly.len() >= 3);
        assert!(poly.len() <= MAX_CLIP_VERTICES);
        assert_eq!(poly.fan().count(), poly.len() - 2);
    }

    #[test]
    fn test_vertex_on_plane_is_not_duplicated() {
        // Second vertex sits exactly on x = w, third is outside it
        let triangle = [[0.0, 0.0, 0.0, 1.0], [1.0, 0.0, 0.0, 1.0], [2.0, 0.5, 0.0, 1.0]];
        let mut polygon = ClipPolygon::new();
        clip_polygon(triangle, false, &mut polygon);
        let positions: Vec<[f32; 4]> = polygon.vertices().iter().map(|v| v.position).collect();
        assert_eq!(positions.len(), 3);
        assert_eq!(positions[0], triangle[0]);
        assert_eq!(positions[1], triangle[1]);
        assert!((positions[2][0] - 1.0).abs() < 1e-6);
        assert!((positions[2][1] - 0.25).abs() < 1e-6);

        // Same when the on-plane vertex follows the outside one
        let reordered = [triangle[2], triangle[0], triangle[1]];
        clip_polygon(reordered, false, &mut polygon);
        assert_eq!(polygon.len(), 3);
        let v = polygon.vertices();
        for i in 0..v.len() {
            assert_ne!(v[i].position, v[(i + 1) % v.len()].position);
        }
    }

    #[test]
    fn test_line_inside_is_untouched() {
        let range = clip_line([-0.5, 0.0, 0.0, 1.0], [0.5, 0.5, 0.0, 1.0], false);
        assert_eq!(range, Some((0.0, 1.0)));
    }

    #[test]
    fn test_line_outside_one_plane_is_discarded() {
        let range = clip_line([-2.0, 0.0, 0.0, 1.0], [-1.5, 0.5, 0.0, 1.0], false);
        assert_eq!(range, None);
    }

    #[test]
    fn test_line_crossing_two_planes() {
        // x from -2 to 2 at w = 1: visible between t = 0.25 and 0.75
        let (t0, t1) = clip_line([-2.0, 0.0, 0.0, 1.0], [2.0, 0.0, 0.0, 1.0], false).unwrap();
        assert!(approx(t0, 0.25));
        assert!(approx(t1, 0.75));
    }

    #[test]
    fn test_line_missing_the_corner() {
        // Crosses the x and y planes in an order that leaves nothing visible
        let range = clip_line([1.5, 0.0, 0.0, 1.0], [0.0, 1.5, 0.0, 1.0], false);
        assert_eq!(range, None);
    }

    fn varyings() -> ShaderBuffer {
        ShaderBuffer::new(&[DataFormat::VEC4, DataFormat::VEC2, DataFormat::INT])
    }

    fn filled(pos: f32, uv: [f32; 2], id: i32) -> ShaderBuffer {
        let mut b = varyings();
        b.write_vec4([pos; 4]).unwrap();
        b.write_vec2(uv).unwrap();
        b.write_int(id).unwrap();
        b.flip();
        b
    }

    #[test]
    fn test_lerp_skips_position_and_keeps_ints_flat() {
        let a = filled(1.0, [0.0, 10.0], 7);
        let b = filled(2.0, [1.0, 20.0], 9);
        let mut out = varyings();
        lerp(&a, &b, 0.25, &mut out);

        assert_eq!(out.vec4_at(0), [0.0; 4]);
        out.advance();
        assert_eq!(out.read_vec2().unwrap(), [0.25, 12.5]);
        assert_eq!(out.read_int().unwrap(), 7);
    }

    #[test]
    fn test_bary_lerp() {
        let a = filled(0.0, [1.0, 0.0], 1);
        let b = filled(0.0, [0.0, 1.0], 2);
        let c = filled(0.0, [0.0, 0.0], 3);
        let mut out = varyings();
        bary_lerp(&a, &b, &c, 0.5, 0.25, 0.25, &mut out);
        out.advance();
        assert_eq!(out.read_vec2().unwrap(), [0.5, 0.25]);
        assert_eq!(out.read_int().unwrap(), 1);
    }

    #[test]
    fn test_perspective_correct_interpolation_matches_clip_space() {
        let formats = [DataFormat::VEC4, DataFormat::FLOAT];
        let p0 = [-1.0, 0.0, 0.0, 1.0];
        let p1 = [2.0, 0.0, 0.0, 4.0];

        let endpoint = |attr: f32, w: f32| {
            let mut b = ShaderBuffer::new(&formats);
            b.advance();
            b.write_float(attr).unwrap();
            perspective_premultiply(&mut b, 1.0 / w);
            b
        };
        let a = endpoint(0.0, p0[3]);
        let b = endpoint(1.0, p1[3]);

        let x0 = p0[0] / p0[3];
        let x1 = p1[0] / p1[3];
        for step in 0..=10 {
            let t = step as f32 / 10.0;
            // Reference: interpolate in clip space, then project
            let p = lerp4(p0, p1, t);
            let screen = (p[0] / p[3] - x0) / (x1 - x0);

            let mut out = ShaderBuffer::new(&formats);
            lerp(&a, &b, screen, &mut out);
            let inv_w = 1.0 / p0[3] + (1.0 / p1[3] - 1.0 / p0[3]) * screen;
            perspective_recover(&mut out, inv_w);
            out.advance();
            let attr = out.read_float().unwrap();
            assert!((attr - t).abs() < 1e-4, "t={} got {}", t, attr);
        }
    }
}
