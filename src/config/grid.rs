use serde::Deserialize;

use super::parse_env;
use crate::core::{AppError, Result};

/// Grid rendering tunables
#[derive(Debug, Clone, Deserialize)]
pub struct GridConfig {
    /// Row count above which grids switch to windowed rendering
    pub virtualize_threshold: usize,
    pub row_height: u32,
    pub viewport_height: u32,
    pub overscan: usize,
    pub skeleton_rows: usize,
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            virtualize_threshold: 50,
            row_height: 52,
            viewport_height: 600,
            overscan: 5,
            skeleton_rows: 5,
        }
    }
}

impl GridConfig {
    pub fn from_env() -> Result<Self> {
        Ok(GridConfig {
            virtualize_threshold: parse_env("GRID_VIRTUALIZE_THRESHOLD", "50")?,
            row_height: parse_env("GRID_ROW_HEIGHT", "52")?,
            viewport_height: parse_env("GRID_VIEWPORT_HEIGHT", "600")?,
            overscan: parse_env("GRID_OVERSCAN", "5")?,
            skeleton_rows: parse_env("GRID_SKELETON_ROWS", "5")?,
        })
    }

    pub fn validate(&self) -> Result<()> {
        if self.virtualize_threshold == 0 {
            return Err(AppError::Configuration(
                "Virtualize threshold must be greater than 0".to_string(),
            ));
        }

        if self.row_height == 0 {
            return Err(AppError::Configuration(
                "Row height must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }
}
