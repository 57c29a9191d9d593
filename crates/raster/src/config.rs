//! Surface and pipeline settings, persisted as JSON

use crate::surface::Viewport;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read or write config: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    pub width: u32,
    pub height: u32,
    /// ARGB8888
    pub clear_color: u32,
    pub depth_test: bool,
    pub depth_write: bool,
    pub depth_clamp: bool,
    pub cull_back_faces: bool,
    /// Edge length of the square drawn for each point primitive
    pub point_size: u32,
    /// `None` covers the whole surface
    pub viewport: Option<Viewport>,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            width: 320,
            height: 240,
            clear_color: 0xFF000000,
            depth_test: true,
            depth_write: true,
            depth_clamp: false,
            cull_back_faces: false,
            point_size: 1,
            viewport: None,
        }
    }
}

impl RenderConfig {
    /// Load from a JSON file; missing fields take their defaults
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&contents)?)
    }

    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let contents = serde_json::to_string_pretty(self)?;
        fs::write(path, contents)?;
        Ok(())
    }
}
