//! Textures and samplers for fragment shaders
//!
//! Single-level ARGB8888 images with nearest or bilinear filtering; there is
//! no mip chain.

use prism_core::graphics::ColorOps;
use std::sync::Arc;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Texture {
    width: u32,
    height: u32,
    texels: Vec<u32>,
}

impl Texture {
    /// Build from ARGB8888 texels, row-major with the first row at `v = 0`
    ///
    /// Returns `None` if the texel count does not match the dimensions or a
    /// dimension is zero.
    pub fn from_argb(width: u32, height: u32, texels: Vec<u32>) -> Option<Self> {
        if width == 0 || height == 0 || texels.len() != (width * height) as usize {
            return None;
        }
        Some(Self {
            width,
            height,
            texels,
        })
    }

    /// Two-color checkerboard with square cells of `cell` texels
    pub fn checkerboard(width: u32, height: u32, cell: u32, a: u32, b: u32) -> Self {
        let (width, height, cell) = (width.max(1), height.max(1), cell.max(1));
        let texels = (0..height)
            .flat_map(|y| (0..width).map(move |x| (x / cell + y / cell) % 2))
            .map(|parity| if parity == 0 { a } else { b })
            .collect();
        Self {
            width,
            height,
            texels,
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    #[inline]
    pub fn texel(&self, x: u32, y: u32) -> u32 {
        self.texels[(y * self.width + x) as usize]
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Filter {
    #[default]
    Nearest,
    Bilinear,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Wrap {
    #[default]
    Repeat,
    Clamp,
}

/// A texture plus the state used to read it
#[derive(Debug, Clone)]
pub struct Sampler {
    texture: Arc<Texture>,
    pub filter: Filter,
    pub wrap: Wrap,
}

impl Sampler {
    pub fn new(texture: Arc<Texture>) -> Self {
        Self {
            texture,
            filter: Filter::default(),
            wrap: Wrap::default(),
        }
    }

    pub fn with_filter(mut self, filter: Filter) -> Self {
        self.filter = filter;
        self
    }

    pub fn with_wrap(mut self, wrap: Wrap) -> Self {
        self.wrap = wrap;
        self
    }

    pub fn texture(&self) -> &Texture {
        &self.texture
    }

    #[inline]
    fn wrap_coord(&self, i: i64, size: u32) -> u32 {
        match self.wrap {
            Wrap::Repeat => i.rem_euclid(size as i64) as u32,
            Wrap::Clamp => i.clamp(0, size as i64 - 1) as u32,
        }
    }

    #[inline]
    fn fetch(&self, x: i64, y: i64) -> u32 {
        let t = &self.texture;
        t.texel(self.wrap_coord(x, t.width), self.wrap_coord(y, t.height))
    }

    /// Sample at normalized coordinates, returning normalized RGBA
    pub fn sample(&self, uv: [f32; 2]) -> [f32; 4] {
        let w = self.texture.width as f32;
        let h = self.texture.height as f32;
        // Texel centers sit at half-integer coordinates
        let x = uv[0] * w - 0.5;
        let y = uv[1] * h - 0.5;

        match self.filter {
            Filter::Nearest => {
                ColorOps::unpack(self.fetch(x.round() as i64, y.round() as i64))
            }
            Filter::Bilinear => {
                let x0 = x.floor();
                let y0 = y.floor();
                let fx = x - x0;
                let fy = y - y0;
                let (x0, y0) = (x0 as i64, y0 as i64);
                let top = ColorOps::lerp(self.fetch(x0, y0), self.fetch(x0 + 1, y0), fx);
                let bottom = ColorOps::lerp(self.fetch(x0, y0 + 1), self.fetch(x0 + 1, y0 + 1), fx);
                ColorOps::unpack(ColorOps::lerp(top, bottom, fy))
            }
        }
    }
}
