//! Progress-based movement along an aligned polyline.

use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::path::SegmentDistanceTable;
use crate::world::Terrain;

/// Smallest segment length used as a divisor; zero-length segments are crossed
/// in a single step instead of dividing by zero.
pub const SEGMENT_EPSILON: f32 = 1e-6;

/// Progress this close to a segment end counts as reaching it, so travelling
/// exactly one segment length crosses despite rounding in `speed * dt / len`.
pub const PROGRESS_EPSILON: f32 = 1e-5;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    #[default]
    Forward,
    Backward,
}

/// What happens when a traveller runs off either end of the path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LoopPolicy {
    /// Leaving the last segment restarts at the first, and vice versa.
    Wrap,
    /// Stop at the first or last point.
    ClampAtEnds,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TraversalState {
    pub segment_index: usize,
    /// Fraction of the current segment covered, in `[0, 1]`.
    pub progress: f32,
    pub direction: Direction,
}

impl Default for TraversalState {
    fn default() -> Self {
        Self::start()
    }
}

impl TraversalState {
    pub fn start() -> Self {
        Self {
            segment_index: 0,
            progress: 0.0,
            direction: Direction::Forward,
        }
    }

    /// Moves `speed * dt` world units along `path` in the current direction.
    ///
    /// Paths with fewer than two points, and non-positive travel, leave the
    /// state untouched.
    pub fn advance(self, path: &[Vec3], policy: LoopPolicy, speed: f32, dt: f32) -> Self {
        if path.len() < 2 {
            return self;
        }

        let last_segment = path.len() - 2;
        let mut next = self;
        next.segment_index = next.segment_index.min(last_segment);
        next.progress = next.progress.clamp(0.0, 1.0);

        let start = path[next.segment_index];
        let end = path[next.segment_index + 1];
        let step = speed * dt / start.distance(end).max(SEGMENT_EPSILON);
        if step.is_nan() || step <= 0.0 {
            return next;
        }

        match next.direction {
            Direction::Forward => {
                next.progress += step;
                if next.progress >= 1.0 - PROGRESS_EPSILON {
                    next.cross_forward(last_segment, policy);
                }
            }
            Direction::Backward => {
                next.progress -= step;
                if next.progress <= PROGRESS_EPSILON {
                    next.cross_backward(last_segment, policy);
                }
            }
        }
        next
    }

    pub fn move_forward(mut self, path: &[Vec3], policy: LoopPolicy, speed: f32, dt: f32) -> Self {
        self.direction = Direction::Forward;
        self.advance(path, policy, speed, dt)
    }

    pub fn move_backward(mut self, path: &[Vec3], policy: LoopPolicy, speed: f32, dt: f32) -> Self {
        self.direction = Direction::Backward;
        self.advance(path, policy, speed, dt)
    }

    fn cross_forward(&mut self, last_segment: usize, policy: LoopPolicy) {
        if self.segment_index < last_segment {
            self.segment_index += 1;
            self.progress = 0.0;
            return;
        }
        match policy {
            LoopPolicy::Wrap => {
                self.segment_index = 0;
                self.progress = 0.0;
            }
            LoopPolicy::ClampAtEnds => {
                self.segment_index = last_segment;
                self.progress = 1.0;
            }
        }
    }

    fn cross_backward(&mut self, last_segment: usize, policy: LoopPolicy) {
        if self.segment_index > 0 {
            self.segment_index -= 1;
            self.progress = 1.0;
            return;
        }
        match policy {
            LoopPolicy::Wrap => {
                self.segment_index = last_segment;
                self.progress = 1.0;
            }
            LoopPolicy::ClampAtEnds => {
                self.segment_index = 0;
                self.progress = 0.0;
            }
        }
    }

    /// World position on `path`, with the height sampled from `terrain` at the
    /// interpolated horizontal position rather than taken from the waypoints.
    pub fn position(&self, path: &[Vec3], terrain: &Terrain, offset: f32) -> Option<Vec3> {
        let horizontal = match path.len() {
            0 => return None,
            1 => path[0],
            n => {
                let index = self.segment_index.min(n - 2);
                path[index].lerp(path[index + 1], self.progress.clamp(0.0, 1.0))
            }
        };
        let height = terrain.height_at(horizontal.x, horizontal.z) + offset;
        Some(Vec3::new(horizontal.x, height, horizontal.z))
    }

    pub fn distance_along(&self, table: &SegmentDistanceTable) -> f32 {
        table.distance_along(self.segment_index, self.progress)
    }
}
