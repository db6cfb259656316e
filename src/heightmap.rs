use std::path::Path;

use anyhow::{Context, Result};
use image::DynamicImage;
use log::info;

use crate::error::TerrainError;
use crate::heightfield::ElevationGrid;

/// 8-bit gray levels of a heightmap image, row-major.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GrayLevels {
    width: usize,
    height: usize,
    levels: Vec<u8>,
}

impl GrayLevels {
    pub fn open(path: &Path) -> Result<Self> {
        let image = image::open(path)
            .with_context(|| format!("failed to load heightmap {}", path.display()))?;
        let levels = Self::from_image(&image);
        info!(
            "loaded {}x{} heightmap from {}",
            levels.width,
            levels.height,
            path.display()
        );
        Ok(levels)
    }

    pub fn from_image(image: &DynamicImage) -> Self {
        let luma = image.to_luma8();
        Self {
            width: luma.width() as usize,
            height: luma.height() as usize,
            levels: luma.into_raw(),
        }
    }

    pub fn from_levels(width: usize, height: usize, levels: Vec<u8>) -> Result<Self, TerrainError> {
        if width < 2 || height < 2 {
            return Err(TerrainError::InvalidDimensions { width, height });
        }
        if levels.len() != width * height {
            return Err(TerrainError::SampleCountMismatch {
                expected: width * height,
                actual: levels.len(),
            });
        }
        Ok(Self {
            width,
            height,
            levels,
        })
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn level(&self, row: usize, col: usize) -> u8 {
        self.levels[row * self.width + col]
    }

    /// Maps level 0..=255 onto elevation 0..=`height_scale`.
    pub fn to_elevation(&self, height_scale: f32) -> Result<ElevationGrid, TerrainError> {
        let cells = self
            .levels
            .iter()
            .map(|&level| level as f32 / 255.0 * height_scale)
            .collect();
        ElevationGrid::from_samples(self.width, self.height, cells)
    }
}
