//! Procedural terrain for a hiking demo: midpoint-displacement heightfields,
//! bilinear height queries and travellers that walk a terrain-aligned path.

pub mod config;
pub mod error;
pub mod heightfield;
pub mod heightmap;
pub mod hiker;
pub mod path;
pub mod simulation;
pub mod traversal;
pub mod world;

pub use config::{SimulationConfig, TravellerConfig};
pub use error::{ConfigError, PathError, SimulationError, TerrainError};
pub use heightfield::{DisplacementParams, ElevationGrid, synthesize};
pub use heightmap::GrayLevels;
pub use hiker::{HikeStats, Traveller};
pub use path::{AlignedPath, SegmentDistanceTable, align};
pub use simulation::Simulation;
pub use traversal::{Direction, LoopPolicy, TraversalState};
pub use world::{Terrain, height_at};
