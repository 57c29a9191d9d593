//! Draw-call side of a rendering backend
//!
//! Extends the backend-neutral [`Renderer`] with the operations that depend
//! on this crate's shader and vertex types:
//!
//! ```text
//! caller -> PipelineRenderer (draw, capabilities, viewport)
//!               |
//!               +-- Renderer (frame access, clear, resize)
//! ```
//!
//! [`SoftwareRenderer`](crate::renderer_software::SoftwareRenderer) is the
//! implementation here; a GPU backend would implement the same trait.

use crate::error::Result;
use crate::rasterizer::{DrawMode, DrawStats};
use crate::shader::ShaderProgram;
use crate::surface::{Capability, Viewport};
use crate::vertex::VertexSource;
use prism_core::renderer::Renderer;

pub trait PipelineRenderer: Renderer {
    /// Draw `count` indices from `offset` of the source's index buffer
    fn draw(
        &mut self,
        program: &mut ShaderProgram,
        source: &VertexSource,
        mode: DrawMode,
        offset: usize,
        count: usize,
    ) -> Result<DrawStats>;

    /// Draw the whole index buffer
    fn draw_all(
        &mut self,
        program: &mut ShaderProgram,
        source: &VertexSource,
        mode: DrawMode,
    ) -> Result<DrawStats> {
        self.draw(program, source, mode, 0, source.indices().len())
    }

    fn set_capability(&mut self, capability: Capability, enabled: bool);

    fn is_enabled(&self, capability: Capability) -> bool;

    fn set_viewport(&mut self, viewport: Viewport);

    /// Counters summed over every draw since the last clear
    fn frame_stats(&self) -> DrawStats;
}
