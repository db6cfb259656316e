use glam::Vec3;

use crate::error::TerrainError;
use crate::heightfield::ElevationGrid;

/// Elevation at world position `(x, z)` over a grid centred on the origin.
///
/// Positions outside the footprint take the elevation of the nearest boundary
/// point.
pub fn height_at(grid: &ElevationGrid, spacing: f32, x: f32, z: f32) -> f32 {
    let max_x = (grid.width() - 1) as f32;
    let max_z = (grid.height() - 1) as f32;
    let half_width = max_x * spacing * 0.5;
    let half_depth = max_z * spacing * 0.5;

    let local_x = ((x + half_width) / spacing).clamp(0.0, max_x);
    let local_z = ((z + half_depth) / spacing).clamp(0.0, max_z);

    let x0 = local_x as usize;
    let z0 = local_z as usize;
    let x1 = (x0 + 1).min(grid.width() - 1);
    let z1 = (z0 + 1).min(grid.height() - 1);

    let fx = local_x - x0 as f32;
    let fz = local_z - z0 as f32;

    let h00 = grid.get(x0, z0);
    let h10 = grid.get(x1, z0);
    let h01 = grid.get(x0, z1);
    let h11 = grid.get(x1, z1);

    let h0 = h00 + fx * (h10 - h00);
    let h1 = h01 + fx * (h11 - h01);
    h0 + fz * (h1 - h0)
}

/// A synthesized heightfield placed in world space.
#[derive(Debug, Clone)]
pub struct Terrain {
    grid: ElevationGrid,
    spacing: f32,
}

impl Terrain {
    pub fn new(grid: ElevationGrid, spacing: f32) -> Result<Self, TerrainError> {
        if !spacing.is_finite() || spacing <= 0.0 {
            return Err(TerrainError::InvalidSpacing(spacing));
        }
        Ok(Self { grid, spacing })
    }

    pub fn grid(&self) -> &ElevationGrid {
        &self.grid
    }

    pub fn spacing(&self) -> f32 {
        self.spacing
    }

    pub fn half_width(&self) -> f32 {
        (self.grid.width() - 1) as f32 * self.spacing * 0.5
    }

    pub fn half_depth(&self) -> f32 {
        (self.grid.height() - 1) as f32 * self.spacing * 0.5
    }

    pub fn height_at(&self, x: f32, z: f32) -> f32 {
        height_at(&self.grid, self.spacing, x, z)
    }

    pub fn clamp_to_footprint(&self, x: f32, z: f32) -> (f32, f32) {
        let (hw, hd) = (self.half_width(), self.half_depth());
        (x.clamp(-hw, hw), z.clamp(-hd, hd))
    }

    pub fn contains(&self, x: f32, z: f32) -> bool {
        x.abs() <= self.half_width() && z.abs() <= self.half_depth()
    }

    /// World position of grid vertex `(x, z)`.
    pub fn grid_to_world(&self, x: usize, z: usize) -> Vec3 {
        Vec3::new(
            x as f32 * self.spacing - self.half_width(),
            self.grid.get(x, z),
            z as f32 * self.spacing - self.half_depth(),
        )
    }

    /// Unit surface normal from central differences one grid spacing apart.
    pub fn surface_normal(&self, x: f32, z: f32) -> Vec3 {
        let d = self.spacing;
        let left = self.height_at(x - d, z);
        let right = self.height_at(x + d, z);
        let down = self.height_at(x, z - d);
        let up = self.height_at(x, z + d);

        Vec3::new(left - right, 2.0 * d, down - up).normalize()
    }
}
