//! Depth plane for hidden surface removal
//!
//! Depth is stored as unsigned 16-bit values covering the normalized window
//! depth range:
//! - 0x0000 = near plane (`z = 0.0`)
//! - 0xFFFF = far plane (`z = 1.0`), the cleared state
//!
//! ```
//! use prism_core::graphics::DepthBuffer;
//!
//! let mut depth = DepthBuffer::new(320, 240);
//! let z = DepthBuffer::quantize(0.25);
//! if depth.test(100, 100, z) {
//!     depth.store(100, 100, z);
//! }
//! ```

/// Farthest representable depth, used when clearing
pub const DEPTH_FAR: u16 = 0xFFFF;

/// Row-major 16-bit depth plane
#[derive(Debug, Clone)]
pub struct DepthBuffer {
    width: u32,
    height: u32,
    buffer: Vec<u16>,
}

impl DepthBuffer {
    /// Create a depth plane with every sample at the far plane
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            buffer: vec![DEPTH_FAR; (width * height) as usize],
        }
    }

    /// Map a normalized depth in `[0, 1]` onto the full 16-bit range
    ///
    /// Values outside the range are clamped; NaN maps to the far plane so it
    /// never wins a depth test.
    #[inline]
    pub fn quantize(z: f32) -> u16 {
        if z.is_nan() {
            return DEPTH_FAR;
        }
        (z.clamp(0.0, 1.0) * DEPTH_FAR as f32).round() as u16
    }

    /// Reset every sample to the far plane
    pub fn clear(&mut self) {
        self.buffer.fill(DEPTH_FAR);
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    #[inline]
    fn index(&self, x: u32, y: u32) -> Option<usize> {
        if x < self.width && y < self.height {
            Some((y * self.width + x) as usize)
        } else {
            None
        }
    }

    /// Depth test without side effects: nearer (smaller) values pass
    ///
    /// Out-of-bounds samples always fail.
    #[inline]
    pub fn test(&self, x: u32, y: u32, depth: u16) -> bool {
        match self.index(x, y) {
            Some(idx) => depth < self.buffer[idx],
            None => false,
        }
    }

    /// Unconditionally store a depth sample; out-of-bounds writes are ignored
    #[inline]
    pub fn store(&mut self, x: u32, y: u32, depth: u16) {
        if let Some(idx) = self.index(x, y) {
            self.buffer[idx] = depth;
        }
    }

    /// Combined depth test and write, returning whether the sample passed
    #[inline]
    pub fn test_and_update(&mut self, x: u32, y: u32, depth: u16) -> bool {
        match self.index(x, y) {
            Some(idx) if depth < self.buffer[idx] => {
                self.buffer[idx] = depth;
                true
            }
            _ => false,
        }
    }

    /// Read a depth sample; `None` when out of bounds
    pub fn read(&self, x: u32, y: u32) -> Option<u16> {
        self.index(x, y).map(|idx| self.buffer[idx])
    }

    /// Resize and clear to the far plane
    pub fn resize(&mut self, width: u32, height: u32) {
        self.width = width;
        self.height = height;
        self.buffer = vec![DEPTH_FAR; (width * height) as usize];
    }
}
