use glam::Vec3;
use log::trace;

use crate::config::TravellerConfig;
use crate::path::AlignedPath;
use crate::traversal::{Direction, LoopPolicy, TraversalState};
use crate::world::Terrain;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HikeStats {
    pub distance_hiked: f32,
    pub distance_remaining: f32,
    pub time_elapsed: f32,
    pub elevation_change: f32,
}

/// An entity walking an aligned path, kept on the terrain surface.
///
/// The path and terrain are borrowed per call; several travellers can share
/// them while each owns its own traversal state.
#[derive(Debug, Clone)]
pub struct Traveller {
    config: TravellerConfig,
    state: TraversalState,
    position: Vec3,
    time_elapsed: f32,
}

impl Traveller {
    pub fn new(config: TravellerConfig, path: &AlignedPath, terrain: &Terrain) -> Self {
        let mut traveller = Self {
            config,
            state: TraversalState::start(),
            position: Vec3::ZERO,
            time_elapsed: 0.0,
        };
        traveller.snap(path, terrain);
        traveller
    }

    pub fn position(&self) -> Vec3 {
        self.position
    }

    pub fn state(&self) -> TraversalState {
        self.state
    }

    pub fn policy(&self) -> LoopPolicy {
        self.config.policy
    }

    pub fn speed(&self) -> f32 {
        self.config.speed
    }

    pub fn set_speed(&mut self, speed: f32) {
        self.config.speed = speed;
    }

    pub fn time_elapsed(&self) -> f32 {
        self.time_elapsed
    }

    /// Advances one tick in the current direction.
    pub fn update(&mut self, dt: f32, path: &AlignedPath, terrain: &Terrain) {
        self.state = self
            .state
            .advance(path.points(), self.config.policy, self.config.speed, dt);
        if dt > 0.0 {
            self.time_elapsed += dt;
        }
        self.snap(path, terrain);
        trace!(
            "segment {} progress {:.3} at {:?}",
            self.state.segment_index, self.state.progress, self.position
        );
    }

    pub fn move_forward(&mut self, dt: f32, path: &AlignedPath, terrain: &Terrain) {
        self.state.direction = Direction::Forward;
        self.update(dt, path, terrain);
    }

    pub fn move_backward(&mut self, dt: f32, path: &AlignedPath, terrain: &Terrain) {
        self.state.direction = Direction::Backward;
        self.update(dt, path, terrain);
    }

    pub fn reset(&mut self, path: &AlignedPath, terrain: &Terrain) {
        self.state = TraversalState::start();
        self.time_elapsed = 0.0;
        self.snap(path, terrain);
    }

    pub fn distance_hiked(&self, path: &AlignedPath) -> f32 {
        self.state.distance_along(path.distances())
    }

    pub fn distance_remaining(&self, path: &AlignedPath) -> f32 {
        (path.total_length() - self.distance_hiked(path)).max(0.0)
    }

    pub fn stats(&self, path: &AlignedPath) -> HikeStats {
        HikeStats {
            distance_hiked: self.distance_hiked(path),
            distance_remaining: self.distance_remaining(path),
            time_elapsed: self.time_elapsed,
            elevation_change: path.elevation_change(),
        }
    }

    fn snap(&mut self, path: &AlignedPath, terrain: &Terrain) {
        if let Some(position) = self.state.position(path.points(), terrain, self.config.offset) {
            self.position = position;
        }
    }
}
