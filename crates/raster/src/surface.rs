//! Color and depth planes the rasterizer writes into

use crate::config::RenderConfig;
use crate::error::{RasterError, Result};
use prism_core::graphics::DepthBuffer;
use prism_core::logging::{log, LogCategory, LogLevel};
use prism_core::types::Frame;
use serde::{Deserialize, Serialize};

/// Per-surface pipeline switches queried during a draw
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Capability {
    DepthTest,
    DepthWrite,
    /// Skip near/far clipping and clamp window depth to `[0, 1]` instead
    DepthClamp,
    CullBackFace,
}

impl Capability {
    pub const ALL: [Capability; 4] = [
        Capability::DepthTest,
        Capability::DepthWrite,
        Capability::DepthClamp,
        Capability::CullBackFace,
    ];

    #[inline]
    const fn bit(self) -> u8 {
        1 << self as u8
    }
}

/// Window-space rectangle NDC is mapped onto
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Viewport {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

impl Viewport {
    pub fn full(width: u32, height: u32) -> Self {
        Self {
            x: 0,
            y: 0,
            width,
            height,
        }
    }

    /// Pixel bounds `(x0, y0, x1, y1)` of the viewport clipped to a surface,
    /// exclusive on the high side; empty when they do not overlap
    pub fn clip_to(&self, width: u32, height: u32) -> (i64, i64, i64, i64) {
        let x0 = (self.x as i64).max(0);
        let y0 = (self.y as i64).max(0);
        let x1 = (self.x as i64 + self.width as i64).min(width as i64);
        let y1 = (self.y as i64 + self.height as i64).min(height as i64);
        (x0, y0, x1.max(x0), y1.max(y0))
    }
}

/// What the rasterizer needs from a surface
pub trait RenderTarget {
    fn width(&self) -> u32;

    fn height(&self) -> u32;

    fn viewport(&self) -> Viewport;

    fn is_enabled(&self, capability: Capability) -> bool;

    /// Write one fragment
    ///
    /// `depth` is window depth in `[0, 1]`. Returns `Ok(false)` when the
    /// depth test rejects the fragment and an error when `(x, y)` is outside
    /// the surface.
    fn write_pixel(&mut self, x: i64, y: i64, depth: f32, color: u32) -> Result<bool>;
}

/// CPU-side render target: an ARGB8888 [`Frame`] plus a 16-bit depth plane
#[derive(Debug, Clone)]
pub struct SoftwareSurface {
    frame: Frame,
    depth: DepthBuffer,
    viewport: Viewport,
    capabilities: u8,
    clear_color: u32,
}

impl SoftwareSurface {
    pub fn new(config: &RenderConfig) -> Self {
        let mut surface = Self {
            frame: Frame::new(config.width, config.height),
            depth: DepthBuffer::new(config.width, config.height),
            viewport: config
                .viewport
                .unwrap_or_else(|| Viewport::full(config.width, config.height)),
            capabilities: 0,
            clear_color: config.clear_color,
        };
        surface.set_enabled(Capability::DepthTest, config.depth_test);
        surface.set_enabled(Capability::DepthWrite, config.depth_write);
        surface.set_enabled(Capability::DepthClamp, config.depth_clamp);
        surface.set_enabled(Capability::CullBackFace, config.cull_back_faces);
        surface.clear();
        surface
    }

    /// Surface of the given size with default settings
    pub fn with_size(width: u32, height: u32) -> Self {
        Self::new(&RenderConfig {
            width,
            height,
            ..RenderConfig::default()
        })
    }

    /// Recreate both planes and reset the viewport to cover the new size
    pub fn resize(&mut self, width: u32, height: u32) {
        log(LogCategory::Surface, LogLevel::Info, || {
            format!(
                "resize {}x{} -> {}x{}",
                self.frame.width, self.frame.height, width, height
            )
        });
        self.frame = Frame::new(width, height);
        self.depth.resize(width, height);
        self.viewport = Viewport::full(width, height);
        self.frame.fill(self.clear_color);
    }

    /// Fill color with the clear color and depth with the far plane
    pub fn clear(&mut self) {
        self.frame.fill(self.clear_color);
        self.depth.clear();
    }

    pub fn clear_color(&self) -> u32 {
        self.clear_color
    }

    pub fn set_clear_color(&mut self, color: u32) {
        self.clear_color = color;
    }

    pub fn enable(&mut self, capability: Capability) {
        self.capabilities |= capability.bit();
    }

    pub fn disable(&mut self, capability: Capability) {
        self.capabilities &= !capability.bit();
    }

    pub fn set_enabled(&mut self, capability: Capability, enabled: bool) {
        if enabled {
            self.enable(capability);
        } else {
            self.disable(capability);
        }
    }

    pub fn set_viewport(&mut self, viewport: Viewport) {
        self.viewport = viewport;
    }

    pub fn frame(&self) -> &Frame {
        &self.frame
    }

    pub fn depth_at(&self, x: u32, y: u32) -> Option<u16> {
        self.depth.read(x, y)
    }

    pub fn pixel(&self, x: u32, y: u32) -> Option<u32> {
        self.frame.get(x, y)
    }
}

impl RenderTarget for SoftwareSurface {
    fn width(&self) -> u32 {
        self.frame.width
    }

    fn height(&self) -> u32 {
        self.frame.height
    }

    fn viewport(&self) -> Viewport {
        self.viewport
    }

    #[inline]
    fn is_enabled(&self, capability: Capability) -> bool {
        self.capabilities & capability.bit() != 0
    }

    fn write_pixel(&mut self, x: i64, y: i64, depth: f32, color: u32) -> Result<bool> {
        let (width, height) = (self.frame.width, self.frame.height);
        if x < 0 || y < 0 || x >= width as i64 || y >= height as i64 {
            return Err(RasterError::PixelOutOfBounds {
                x,
                y,
                width,
                height,
            });
        }
        let (x, y) = (x as u32, y as u32);

        if self.is_enabled(Capability::DepthTest) {
            let z = DepthBuffer::quantize(depth);
            if !self.depth.test(x, y, z) {
                return Ok(false);
            }
            if self.is_enabled(Capability::DepthWrite) {
                self.depth.store(x, y, z);
            }
        }
        self.frame.pixels[(y * width + x) as usize] = color;
        Ok(true)
    }
}
