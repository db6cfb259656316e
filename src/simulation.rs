use std::fmt;

use glam::Vec3;
use log::info;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::config::{SimulationConfig, TerrainConfig};
use crate::error::SimulationError;
use crate::heightfield::{self, DisplacementParams, ElevationGrid};
use crate::heightmap::GrayLevels;
use crate::hiker::{HikeStats, Traveller};
use crate::path::{self, AlignedPath};
use crate::traversal::Direction;
use crate::world::Terrain;

/// Terrain, aligned path and the two travellers walking it.
#[derive(Debug, Clone)]
pub struct Simulation {
    terrain: Terrain,
    path: AlignedPath,
    marker: Traveller,
    figure: Traveller,
}

impl Simulation {
    /// Random source for `config`: seeded when a seed is set, from entropy otherwise.
    pub fn rng_for(config: &TerrainConfig) -> StdRng {
        match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        }
    }

    /// Runs the whole load pipeline: gray levels to elevations, noise,
    /// midpoint displacement, then path alignment.
    pub fn build<R: Rng + ?Sized>(
        config: &SimulationConfig,
        levels: &GrayLevels,
        waypoints: &[Vec3],
        rng: &mut R,
    ) -> Result<Self, SimulationError> {
        let t = &config.terrain;
        let raw = levels.to_elevation(t.height_scale)?;
        let cropped = heightfield::crop_to_displacement_size(&raw)?;
        let seed = heightfield::jitter(&cropped, t.sample_jitter, rng)?;
        let params =
            DisplacementParams::for_grid(&seed, t.displacement_fraction, t.decay_base, t.roughness);
        let grid = heightfield::synthesize(&seed, params, rng)?;
        info!(
            "terrain {}x{} ready, elevation {:.1}..{:.1}",
            grid.width(),
            grid.height(),
            grid.min_elevation(),
            grid.max_elevation()
        );

        Self::from_grid(config, grid, waypoints)
    }

    /// Places an already synthesized grid and aligns the waypoints onto it.
    pub fn from_grid(
        config: &SimulationConfig,
        grid: ElevationGrid,
        waypoints: &[Vec3],
    ) -> Result<Self, SimulationError> {
        let terrain = Terrain::new(grid, config.terrain.horizontal_scale)?;
        let path = path::align(waypoints, &terrain, config.path.scale, config.path.offset)?;
        let marker = Traveller::new(config.marker, &path, &terrain);
        let figure = Traveller::new(config.figure, &path, &terrain);

        Ok(Self {
            terrain,
            path,
            marker,
            figure,
        })
    }

    pub fn terrain(&self) -> &Terrain {
        &self.terrain
    }

    pub fn path(&self) -> &AlignedPath {
        &self.path
    }

    pub fn marker(&self) -> &Traveller {
        &self.marker
    }

    pub fn figure(&self) -> &Traveller {
        &self.figure
    }

    /// Advances both travellers by `dt` seconds.
    pub fn tick(&mut self, dt: f32) {
        self.marker.update(dt, &self.path, &self.terrain);
        self.figure.update(dt, &self.path, &self.terrain);
    }

    pub fn steer_marker(&mut self, direction: Direction, dt: f32) {
        match direction {
            Direction::Forward => self.marker.move_forward(dt, &self.path, &self.terrain),
            Direction::Backward => self.marker.move_backward(dt, &self.path, &self.terrain),
        }
    }

    pub fn reset(&mut self) {
        self.marker.reset(&self.path, &self.terrain);
        self.figure.reset(&self.path, &self.terrain);
    }

    pub fn status(&self) -> Status {
        Status {
            marker: self.marker.position(),
            figure: self.figure.position(),
            marker_stats: self.marker.stats(&self.path),
            figure_stats: self.figure.stats(&self.path),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Status {
    pub marker: Vec3,
    pub figure: Vec3,
    pub marker_stats: HikeStats,
    pub figure_stats: HikeStats,
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "marker ({:.1}, {:.1}, {:.1}) {:.1} hiked / {:.1} left; \
             figure ({:.1}, {:.1}, {:.1}) {:.1} hiked / {:.1} left; t={:.1}s",
            self.marker.x,
            self.marker.y,
            self.marker.z,
            self.marker_stats.distance_hiked,
            self.marker_stats.distance_remaining,
            self.figure.x,
            self.figure.y,
            self.figure.z,
            self.figure_stats.distance_hiked,
            self.figure_stats.distance_remaining,
            self.figure_stats.time_elapsed,
        )
    }
}
