//! Built-in demo scenes
//!
//! Every scene uses the vertex color program: a `vec3` position attribute
//! transformed by the `mvp` binding and a `vec3` color attribute.

use clap::ValueEnum;
use prism_core::graphics::Mat4;
use prism_raster::builtin_shaders::{self, MVP};
use prism_raster::{
    Binding, DataFormat, DrawMode, DrawStats, PipelineRenderer, Result, ShaderProgram,
    VertexAttribute, VertexSource,
};
use std::f32::consts::{FRAC_PI_3, TAU};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum SceneKind {
    /// One RGB triangle spinning in the image plane
    Triangle,
    /// Perspective cube with one color per face
    Cube,
    /// Seven-pointed star drawn as a line loop
    Lines,
    /// Grid of colored points
    Points,
}

pub struct Scene {
    kind: SceneKind,
    program: ShaderProgram,
    source: VertexSource,
    mode: DrawMode,
}

fn build_source(positions: &[[f32; 3]], colors: &[[f32; 3]], indices: Vec<u32>) -> VertexSource {
    let positions: Vec<f32> = positions.iter().flatten().copied().collect();
    let colors: Vec<f32> = colors.iter().flatten().copied().collect();
    VertexSource::new()
        .with_attribute(VertexAttribute::from_f32(
            "position",
            DataFormat::VEC3,
            &positions,
        ))
        .with_attribute(VertexAttribute::from_f32("color", DataFormat::VEC3, &colors))
        .with_indices(indices)
}

fn triangle() -> VertexSource {
    build_source(
        &[[-0.8, -0.7, 0.0], [0.8, -0.7, 0.0], [0.0, 0.8, 0.0]],
        &[[1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 1.0]],
        vec![0, 1, 2],
    )
}

fn cube() -> VertexSource {
    // (normal, u, v) with u x v = normal so every face winds counter-clockwise
    // seen from outside
    const FACES: [([f32; 3], [f32; 3], [f32; 3]); 6] = [
        ([1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 1.0]),
        ([-1.0, 0.0, 0.0], [0.0, 0.0, 1.0], [0.0, 1.0, 0.0]),
        ([0.0, 1.0, 0.0], [0.0, 0.0, 1.0], [1.0, 0.0, 0.0]),
        ([0.0, -1.0, 0.0], [1.0, 0.0, 0.0], [0.0, 0.0, 1.0]),
        ([0.0, 0.0, 1.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]),
        ([0.0, 0.0, -1.0], [0.0, 1.0, 0.0], [1.0, 0.0, 0.0]),
    ];
    const COLORS: [[f32; 3]; 6] = [
        [1.0, 0.2, 0.2],
        [0.2, 1.0, 0.2],
        [0.2, 0.2, 1.0],
        [1.0, 1.0, 0.2],
        [1.0, 0.2, 1.0],
        [0.2, 1.0, 1.0],
    ];

    let mut positions = Vec::with_capacity(24);
    let mut colors = Vec::with_capacity(24);
    let mut indices = Vec::with_capacity(36);
    for (face, (n, u, v)) in FACES.iter().enumerate() {
        let base = positions.len() as u32;
        for (su, sv) in [(-1.0, -1.0), (1.0, -1.0), (1.0, 1.0), (-1.0, 1.0)] {
            positions.push([
                0.5 * (n[0] + su * u[0] + sv * v[0]),
                0.5 * (n[1] + su * u[1] + sv * v[1]),
                0.5 * (n[2] + su * u[2] + sv * v[2]),
            ]);
            colors.push(COLORS[face]);
        }
        indices.extend_from_slice(&[base, base + 1, base + 2, base, base + 2, base + 3]);
    }
    build_source(&positions, &colors, indices)
}

fn star() -> VertexSource {
    let mut positions = Vec::new();
    let mut colors = Vec::new();
    for i in 0..7 {
        let angle = (i * 3) as f32 * TAU / 7.0;
        positions.push([0.85 * angle.sin(), 0.85 * angle.cos(), 0.0]);
        let t = i as f32 / 6.0;
        colors.push([1.0, t, 1.0 - t]);
    }
    build_source(&positions, &colors, (0..7).collect())
}

fn point_grid() -> VertexSource {
    const COLUMNS: u32 = 8;
    const ROWS: u32 = 6;
    let mut positions = Vec::new();
    let mut colors = Vec::new();
    for row in 0..ROWS {
        for col in 0..COLUMNS {
            let s = col as f32 / (COLUMNS - 1) as f32;
            let t = row as f32 / (ROWS - 1) as f32;
            positions.push([-0.8 + 1.6 * s, -0.8 + 1.6 * t, 0.0]);
            colors.push([s, t, 0.5]);
        }
    }
    build_source(&positions, &colors, (0..COLUMNS * ROWS).collect())
}

impl Scene {
    pub fn new(kind: SceneKind) -> Result<Self> {
        let (source, mode) = match kind {
            SceneKind::Triangle => (triangle(), DrawMode::Triangles),
            SceneKind::Cube => (cube(), DrawMode::Triangles),
            SceneKind::Lines => (star(), DrawMode::LineLoop),
            SceneKind::Points => (point_grid(), DrawMode::Points),
        };
        Ok(Self {
            kind,
            program: builtin_shaders::vertex_color_program(DataFormat::VEC3)?,
            source,
            mode,
        })
    }

    pub fn kind(&self) -> SceneKind {
        self.kind
    }

    /// Model-view-projection for animation step `frame`
    pub fn mvp(&self, frame: u32, aspect: f32) -> Mat4 {
        let t = frame as f32;
        match self.kind {
            SceneKind::Triangle => Mat4::rotation_z(t * 0.1),
            SceneKind::Cube => {
                Mat4::perspective(FRAC_PI_3, aspect, 0.1, 10.0)
                    * Mat4::translation(0.0, 0.0, -2.5)
                    * Mat4::rotation_y(0.6 + t * 0.05)
                    * Mat4::rotation_x(0.45)
            }
            SceneKind::Lines => Mat4::rotation_z(t * 0.05),
            SceneKind::Points => Mat4::IDENTITY,
        }
    }

    /// Draw animation step `frame` into `renderer`
    pub fn render<R: PipelineRenderer>(
        &mut self,
        renderer: &mut R,
        frame: u32,
        aspect: f32,
    ) -> Result<DrawStats> {
        let mvp = self.mvp(frame, aspect);
        self.program.bind(MVP, Binding::Mat4(mvp));
        renderer.draw_all(&mut self.program, &self.source, self.mode)
    }
}
