//! Core rendering primitives shared by every prism backend.

pub mod graphics;
pub mod logging;
pub mod renderer;

pub mod types {
    use crate::graphics::ColorOps;
    use serde::{Deserialize, Serialize};

    /// Row-major ARGB8888 color plane
    #[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
    pub struct Frame {
        pub width: u32,
        pub height: u32,
        pub pixels: Vec<u32>,
    }

    impl Frame {
        pub fn new(width: u32, height: u32) -> Self {
            Self {
                width,
                height,
                pixels: vec![0; (width * height) as usize],
            }
        }

        pub fn fill(&mut self, color: u32) {
            self.pixels.fill(color);
        }

        pub fn get(&self, x: u32, y: u32) -> Option<u32> {
            if x < self.width && y < self.height {
                Some(self.pixels[(y * self.width + x) as usize])
            } else {
                None
            }
        }

        /// Pixels as `[r, g, b, a]` bytes, top row first
        pub fn to_rgba_bytes(&self) -> Vec<u8> {
            self.pixels
                .iter()
                .flat_map(|&p| ColorOps::to_rgba_bytes(p))
                .collect()
        }
    }
}
