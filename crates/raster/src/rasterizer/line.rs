//! Major-axis line stepper
//!
//! Steps one pixel at a time along whichever axis the line spans further,
//! from the pixel holding one endpoint to the pixel holding the other. The
//! minor coordinate, depth and varyings come from the line parameter at each
//! step's pixel center.

use super::{Bounds, DrawStats, FragmentStage};
use crate::clip;
use crate::error::Result;
use crate::shader::ShaderUnit;
use crate::shader_buffer::ShaderBuffer;
use crate::surface::RenderTarget;

/// Rasterize one window-space segment
///
/// `verts` hold `[x, y, z, 1/w]` in their position slot and varyings
/// premultiplied by `1/w`.
pub(crate) fn draw<T: RenderTarget + ?Sized>(
    target: &mut T,
    fragment: &mut dyn ShaderUnit,
    verts: [&ShaderBuffer; 2],
    stage: &mut FragmentStage,
    bounds: Bounds,
    stats: &mut DrawStats,
) -> Result<()> {
    let p0 = verts[0].vec4_at(0);
    let p1 = verts[1].vec4_at(0);
    let dx = p1[0] - p0[0];
    let dy = p1[1] - p0[1];

    if dx == 0.0 && dy == 0.0 {
        // Collapsed by clipping or projection: keep the nearer endpoint
        let near = if p0[2] <= p1[2] { 0 } else { 1 };
        let p = if near == 0 { p0 } else { p1 };
        let (px, py) = (p[0].floor() as i64, p[1].floor() as i64);
        if bounds.contains(px, py) {
            stage.input.copy_from(verts[near]);
            stage.emit(target, fragment, px, py, p[2], p[3], stats)?;
        }
        return Ok(());
    }

    let x_major = dx.abs() >= dy.abs();
    let (origin, delta, lo, hi) = if x_major {
        (p0[0], dx, bounds.x0, bounds.x1)
    } else {
        (p0[1], dy, bounds.y0, bounds.y1)
    };
    let (a, b) = if x_major { (p0[0], p1[0]) } else { (p0[1], p1[1]) };
    let start = (a.min(b).floor() as i64).max(lo);
    let end = (a.max(b).floor() as i64).min(hi - 1);

    for major in start..=end {
        let t = ((major as f32 + 0.5 - origin) / delta).clamp(0.0, 1.0);
        let (px, py) = if x_major {
            (major, (p0[1] + dy * t).floor() as i64)
        } else {
            ((p0[0] + dx * t).floor() as i64, major)
        };
        if !bounds.contains(px, py) {
            continue;
        }

        clip::lerp(verts[0], verts[1], t, &mut stage.input);
        let z = p0[2] + (p1[2] - p0[2]) * t;
        let inv_w = p0[3] + (p1[3] - p0[3]) * t;
        stage.emit(target, fragment, px, py, z, inv_w, stats)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::format::DataFormat;
    use crate::shader::{FnShader, ShaderStatus};
    use crate::surface::SoftwareSurface;

    const FORMATS: [DataFormat; 2] = [DataFormat::VEC4, DataFormat::FLOAT];

    /// Window-space vertex carrying one float varying
    fn vert(x: f32, y: f32, z: f32, value: f32) -> ShaderBuffer {
        let mut b = ShaderBuffer::new(&FORMATS);
        b.write_vec4([x, y, z, 1.0]).unwrap();
        b.write_float(value).unwrap();
        b
    }

    /// Writes the varying into the red channel
    fn shade_varying() -> FnShader {
        FnShader::fragment(vec![DataFormat::VEC4], |_, input, output| {
            input.advance();
            let v = input.read_float()?;
            output.write_vec4([v, 0.0, 0.0, 1.0])?;
            Ok(ShaderStatus::Emit)
        })
    }

    fn stage() -> FragmentStage {
        let mut stage = FragmentStage::new();
        stage.input.set_formats(&FORMATS);
        stage.output.set_formats(&[DataFormat::VEC4]);
        stage
    }

    fn bounds(width: i64, height: i64) -> Bounds {
        Bounds {
            x0: 0,
            y0: 0,
            x1: width,
            y1: height,
        }
    }

    fn lit(surface: &SoftwareSurface) -> Vec<(u32, u32)> {
        let clear = surface.clear_color();
        let mut out = Vec::new();
        for y in 0..4 {
            for x in 0..8 {
                if surface.pixel(x, y) != Some(clear) {
                    out.push((x, y));
                }
            }
        }
        out
    }

    #[test]
    fn test_horizontal_line_steps_along_x() {
        let mut surface = SoftwareSurface::with_size(8, 4);
        let mut shader = shade_varying();
        let mut stats = DrawStats::default();
        let (a, b) = (vert(0.5, 1.5, 0.5, 1.0), vert(5.5, 1.5, 0.5, 1.0));
        draw(
            &mut surface,
            &mut shader,
            [&a, &b],
            &mut stage(),
            bounds(8, 4),
            &mut stats,
        )
        .unwrap();
        assert_eq!(lit(&surface), (0..6).map(|x| (x, 1)).collect::<Vec<_>>());
        assert_eq!(stats.fragments_written, 6);
    }

    #[test]
    fn test_steep_line_steps_along_y() {
        let mut surface = SoftwareSurface::with_size(8, 4);
        let mut shader = shade_varying();
        let mut stats = DrawStats::default();
        let (a, b) = (vert(2.5, 0.5, 0.5, 1.0), vert(3.5, 3.5, 0.5, 1.0));
        draw(
            &mut surface,
            &mut shader,
            [&a, &b],
            &mut stage(),
            bounds(8, 4),
            &mut stats,
        )
        .unwrap();
        // One pixel per row
        assert_eq!(stats.fragments_written, 4);
        let pixels = lit(&surface);
        for row in 0..4 {
            assert_eq!(pixels.iter().filter(|p| p.1 == row).count(), 1);
        }
    }

    #[test]
    fn test_varying_is_interpolated_along_the_line() {
        let mut surface = SoftwareSurface::with_size(8, 4);
        let mut shader = shade_varying();
        let mut stats = DrawStats::default();
        let (a, b) = (vert(0.5, 0.5, 0.5, 0.0), vert(4.5, 0.5, 0.5, 1.0));
        draw(
            &mut surface,
            &mut shader,
            [&a, &b],
            &mut stage(),
            bounds(8, 4),
            &mut stats,
        )
        .unwrap();
        // Red channel ramps 0, 0.25, 0.5, 0.75, 1.0
        let reds: Vec<u32> = (0..5)
            .map(|x| (surface.pixel(x, 0).unwrap() >> 16) & 0xFF)
            .collect();
        assert!(reds.windows(2).all(|w| w[0] < w[1]), "{:?}", reds);
        assert_eq!(reds[0], 0);
        assert_eq!(reds[4], 0xFF);
    }

    #[test]
    fn test_zero_length_line_draws_nearer_endpoint() {
        let mut surface = SoftwareSurface::with_size(8, 4);
        let mut shader = shade_varying();
        let mut stats = DrawStats::default();
        let far = vert(3.25, 2.75, 0.8, 0.0);
        let near = vert(3.25, 2.75, 0.2, 1.0);
        draw(
            &mut surface,
            &mut shader,
            [&far, &near],
            &mut stage(),
            bounds(8, 4),
            &mut stats,
        )
        .unwrap();
        assert_eq!(stats.fragments_written, 1);
        assert_eq!(surface.pixel(3, 2), Some(0xFFFF0000));
    }

    #[test]
    fn test_pixels_outside_bounds_are_skipped() {
        let mut surface = SoftwareSurface::with_size(8, 4);
        let mut shader = shade_varying();
        let mut stats = DrawStats::default();
        // Endpoint sits exactly on the right edge of the surface
        let (a, b) = (vert(4.5, 0.5, 0.5, 1.0), vert(8.0, 0.5, 0.5, 1.0));
        draw(
            &mut surface,
            &mut shader,
            [&a, &b],
            &mut stage(),
            bounds(8, 4),
            &mut stats,
        )
        .unwrap();
        assert_eq!(lit(&surface), vec![(4, 0), (5, 0), (6, 0), (7, 0)]);
    }
}
