//! Software renderer - CPU rasterization into a [`SoftwareSurface`]

use crate::config::RenderConfig;
use crate::error::Result;
use crate::rasterizer::{DrawMode, DrawStats, Rasterizer};
use crate::renderer::PipelineRenderer;
use crate::shader::ShaderProgram;
use crate::surface::{Capability, RenderTarget, SoftwareSurface, Viewport};
use crate::vertex::VertexSource;
use prism_core::logging::{log, LogCategory, LogLevel};
use prism_core::renderer::Renderer;
use prism_core::types::Frame;

pub struct SoftwareRenderer {
    config: RenderConfig,
    surface: SoftwareSurface,
    rasterizer: Rasterizer,
    frame_stats: DrawStats,
}

impl SoftwareRenderer {
    pub fn new(config: RenderConfig) -> Self {
        let mut rasterizer = Rasterizer::new();
        rasterizer.set_point_size(config.point_size);
        Self {
            surface: SoftwareSurface::new(&config),
            config,
            rasterizer,
            frame_stats: DrawStats::default(),
        }
    }

    pub fn with_size(width: u32, height: u32) -> Self {
        Self::new(RenderConfig {
            width,
            height,
            ..RenderConfig::default()
        })
    }

    pub fn config(&self) -> &RenderConfig {
        &self.config
    }

    pub fn surface(&self) -> &SoftwareSurface {
        &self.surface
    }

    pub fn set_point_size(&mut self, size: u32) {
        self.rasterizer.set_point_size(size);
    }
}

impl Renderer for SoftwareRenderer {
    fn get_frame(&self) -> &Frame {
        self.surface.frame()
    }

    fn clear(&mut self, color: u32) {
        self.surface.set_clear_color(color);
        self.surface.clear();
        self.frame_stats = DrawStats::default();
    }

    fn reset(&mut self) {
        *self = Self::new(self.config.clone());
    }

    fn name(&self) -> &str {
        "Software Rasterizer"
    }

    fn resize(&mut self, width: u32, height: u32) {
        self.config.width = width;
        self.config.height = height;
        self.surface.resize(width, height);
    }
}

impl PipelineRenderer for SoftwareRenderer {
    fn draw(
        &mut self,
        program: &mut ShaderProgram,
        source: &VertexSource,
        mode: DrawMode,
        offset: usize,
        count: usize,
    ) -> Result<DrawStats> {
        let result = self
            .rasterizer
            .draw(&mut self.surface, program, source, mode, offset, count);
        match result {
            Ok(stats) => {
                self.frame_stats += stats;
                Ok(stats)
            }
            Err(e) => {
                // Partial work still landed on the surface
                self.frame_stats += self.rasterizer.last_stats();
                log(LogCategory::Pipeline, LogLevel::Error, || {
                    format!("draw {:?} aborted: {}", mode, e)
                });
                Err(e)
            }
        }
    }

    fn set_capability(&mut self, capability: Capability, enabled: bool) {
        self.surface.set_enabled(capability, enabled);
    }

    fn is_enabled(&self, capability: Capability) -> bool {
        self.surface.is_enabled(capability)
    }

    fn set_viewport(&mut self, viewport: Viewport) {
        self.surface.set_viewport(viewport);
    }

    fn frame_stats(&self) -> DrawStats {
        self.frame_stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builtin_shaders;
    use crate::format::DataFormat;
    use crate::vertex::VertexAttribute;

    fn triangle() -> VertexSource {
        VertexSource::new()
            .with_attribute(VertexAttribute::from_f32(
                "position",
                DataFormat::VEC3,
                &[-1.0, -1.0, 0.0, 1.0, -1.0, 0.0, -1.0, 1.0, 0.0],
            ))
            .with_sequential_indices()
    }

    #[test]
    fn test_software_renderer_creation() {
        let renderer = SoftwareRenderer::with_size(320, 240);
        assert_eq!(renderer.name(), "Software Rasterizer");
        assert!(!renderer.is_hardware_accelerated());
        assert_eq!(renderer.get_frame().width, 320);
        assert_eq!(renderer.get_frame().height, 240);
    }

    #[test]
    fn test_software_renderer_clear() {
        let mut renderer = SoftwareRenderer::with_size(16, 16);
        renderer.clear(0xFF00FF00);
        assert!(renderer.get_frame().pixels.iter().all(|&p| p == 0xFF00FF00));
    }

    #[test]
    fn test_frame_stats_accumulate_until_clear() {
        let mut renderer = SoftwareRenderer::with_size(16, 16);
        let mut program = builtin_shaders::flat_program([1.0, 1.0, 1.0, 1.0]).unwrap();
        let source = triangle();

        let first = renderer
            .draw_all(&mut program, &source, DrawMode::Triangles)
            .unwrap();
        assert!(first.fragments_written > 0);
        // Same depth, so the second draw fails every depth test
        let second = renderer
            .draw_all(&mut program, &source, DrawMode::Triangles)
            .unwrap();
        assert_eq!(second.fragments_written, 0);
        assert_eq!(renderer.frame_stats().primitives_in, 2);
        assert_eq!(
            renderer.frame_stats().fragments_written,
            first.fragments_written
        );

        renderer.clear(0xFF000000);
        assert_eq!(renderer.frame_stats(), DrawStats::default());
    }

    #[test]
    fn test_resize_and_reset() {
        let mut renderer = SoftwareRenderer::with_size(8, 8);
        renderer.set_capability(Capability::CullBackFace, true);
        renderer.resize(32, 16);
        assert_eq!(renderer.get_frame().pixels.len(), 32 * 16);
        assert_eq!(renderer.config().width, 32);
        assert!(renderer.is_enabled(Capability::CullBackFace));

        renderer.reset();
        assert_eq!(renderer.get_frame().width, 32);
        assert!(!renderer.is_enabled(Capability::CullBackFace));
    }

    #[test]
    fn test_draw_error_is_reported() {
        let mut renderer = SoftwareRenderer::with_size(8, 8);
        let mut program = builtin_shaders::flat_program([1.0; 4]).unwrap();
        let source = triangle();
        assert!(renderer
            .draw(&mut program, &source, DrawMode::Triangles, 2, 3)
            .is_err());
    }
}
