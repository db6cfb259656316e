//! Waypoint loading and terrain alignment.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use glam::Vec3;
use log::info;

use crate::error::PathError;
use crate::world::Terrain;

/// Cumulative distance from the first point to every point of a polyline.
#[derive(Debug, Clone, PartialEq)]
pub struct SegmentDistanceTable {
    cumulative: Vec<f32>,
}

impl SegmentDistanceTable {
    pub fn from_points(points: &[Vec3]) -> Self {
        let mut cumulative = Vec::with_capacity(points.len());
        let mut total = 0.0;
        for (i, point) in points.iter().enumerate() {
            if i > 0 {
                total += point.distance(points[i - 1]);
            }
            cumulative.push(total);
        }
        Self { cumulative }
    }

    pub fn len(&self) -> usize {
        self.cumulative.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cumulative.is_empty()
    }

    pub fn total_length(&self) -> f32 {
        self.cumulative.last().copied().unwrap_or(0.0)
    }

    pub fn distance_at(&self, index: usize) -> f32 {
        self.cumulative[index]
    }

    pub fn as_slice(&self) -> &[f32] {
        &self.cumulative
    }

    /// Distance travelled at `progress` through segment `segment`.
    pub fn distance_along(&self, segment: usize, progress: f32) -> f32 {
        if self.cumulative.len() < 2 {
            return 0.0;
        }
        let segment = segment.min(self.cumulative.len() - 2);
        let start = self.cumulative[segment];
        let length = self.cumulative[segment + 1] - start;
        start + length * progress.clamp(0.0, 1.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ElevationBand {
    Low,
    Mid,
    High,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BandThresholds {
    pub mid: f32,
    pub high: f32,
}

impl Default for BandThresholds {
    fn default() -> Self {
        Self {
            mid: 50.0,
            high: 70.0,
        }
    }
}

impl BandThresholds {
    pub fn classify(&self, elevation: f32) -> ElevationBand {
        if elevation > self.high {
            ElevationBand::High
        } else if elevation > self.mid {
            ElevationBand::Mid
        } else {
            ElevationBand::Low
        }
    }
}

/// A polyline snapped onto the terrain, with its distance table.
///
/// Only [`align`] builds one, so the table always describes the points.
#[derive(Debug, Clone, PartialEq)]
pub struct AlignedPath {
    points: Vec<Vec3>,
    distances: SegmentDistanceTable,
}

impl AlignedPath {
    pub fn points(&self) -> &[Vec3] {
        &self.points
    }

    pub fn distances(&self) -> &SegmentDistanceTable {
        &self.distances
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn total_length(&self) -> f32 {
        self.distances.total_length()
    }

    /// Sum of absolute height differences between consecutive points.
    pub fn elevation_change(&self) -> f32 {
        self.points
            .windows(2)
            .map(|pair| (pair[1].y - pair[0].y).abs())
            .sum()
    }

    /// Band of every segment, judged by the mean height of its endpoints.
    pub fn segment_bands(&self, thresholds: &BandThresholds) -> Vec<ElevationBand> {
        self.points
            .windows(2)
            .map(|pair| thresholds.classify((pair[0].y + pair[1].y) * 0.5))
            .collect()
    }
}

/// Scales raw waypoints into the terrain footprint and snaps them to its surface.
pub fn align(
    raw: &[Vec3],
    terrain: &Terrain,
    horizontal_scale: f32,
    vertical_offset: f32,
) -> Result<AlignedPath, PathError> {
    if raw.is_empty() {
        return Err(PathError::EmptyPath);
    }

    let points: Vec<Vec3> = raw
        .iter()
        .map(|point| {
            let (x, z) =
                terrain.clamp_to_footprint(point.x * horizontal_scale, point.z * horizontal_scale);
            Vec3::new(x, terrain.height_at(x, z) + vertical_offset, z)
        })
        .collect();
    let distances = SegmentDistanceTable::from_points(&points);

    info!(
        "aligned {} waypoints to terrain, path length {:.1}",
        points.len(),
        distances.total_length()
    );
    Ok(AlignedPath { points, distances })
}

/// Parses whitespace separated `x y z` triples, normally one per line.
pub fn parse_waypoints(text: &str) -> Result<Vec<Vec3>, PathError> {
    let mut waypoints = Vec::new();
    let mut pending = [0.0f32; 3];
    let mut filled = 0;
    let mut last_line = 0;

    for (index, line) in text.lines().enumerate() {
        let line_number = index + 1;
        for token in line.split_whitespace() {
            let value: f32 = token.parse().map_err(|_| PathError::InvalidNumber {
                line: line_number,
                token: token.to_string(),
            })?;
            pending[filled] = value;
            filled += 1;
            last_line = line_number;
            if filled == 3 {
                waypoints.push(Vec3::from_array(pending));
                filled = 0;
            }
        }
    }

    if filled != 0 {
        return Err(PathError::IncompleteWaypoint {
            line: last_line,
            values: filled,
        });
    }
    Ok(waypoints)
}

pub fn load_waypoints(path: &Path) -> Result<Vec<Vec3>> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("failed to read path file {}", path.display()))?;
    let waypoints =
        parse_waypoints(&text).with_context(|| format!("malformed path file {}", path.display()))?;
    info!("loaded {} waypoints from {}", waypoints.len(), path.display());
    Ok(waypoints)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::heightfield::ElevationGrid;

    fn sloped_terrain() -> Terrain {
        // 5x5 ramp rising along x, spacing 2: footprint [-4, 4].
        let cells = (0..25).map(|i| (i % 5) as f32 * 10.0).collect();
        Terrain::new(ElevationGrid::from_samples(5, 5, cells).unwrap(), 2.0).unwrap()
    }

    #[test]
    fn empty_input_is_rejected() {
        assert_eq!(align(&[], &sloped_terrain(), 1.0, 0.5), Err(PathError::EmptyPath));
    }

    #[test]
    fn points_are_scaled_clamped_and_snapped() {
        let terrain = sloped_terrain();
        let raw = [
            Vec3::new(0.0, 99.0, 0.0),
            Vec3::new(1.0, -3.0, 1.5),
            Vec3::new(100.0, 0.0, -100.0),
        ];
        let path = align(&raw, &terrain, 2.0, 0.5).unwrap();
        let points = path.points();

        assert_eq!(points.len(), 3);
        assert_eq!(points[0], Vec3::new(0.0, 20.5, 0.0));
        assert_eq!(points[1].x, 2.0);
        assert_eq!(points[1].z, 3.0);
        assert!((points[1].y - 30.5).abs() < 1e-5);
        assert_eq!(points[2].x, 4.0);
        assert_eq!(points[2].z, -4.0);
        assert!((points[2].y - 40.5).abs() < 1e-5);

        for p in points {
            assert!(terrain.contains(p.x, p.z));
            assert!((p.y - (terrain.height_at(p.x, p.z) + 0.5)).abs() < 1e-5);
        }
    }

    #[test]
    fn realigning_is_idempotent_in_height() {
        let terrain = sloped_terrain();
        let raw = [Vec3::new(-3.3, 0.0, 1.1), Vec3::new(0.7, 5.0, -2.9), Vec3::new(3.9, 1.0, 3.9)];
        let first = align(&raw, &terrain, 1.0, 0.25).unwrap();
        let second = align(first.points(), &terrain, 1.0, 0.25).unwrap();
        for (a, b) in first.points().iter().zip(second.points()) {
            assert_eq!(a.y, b.y);
        }
    }

    #[test]
    fn distance_table_accumulates_segment_lengths() {
        let points = [
            Vec3::ZERO,
            Vec3::new(3.0, 4.0, 0.0),
            Vec3::new(3.0, 4.0, 0.0),
            Vec3::new(3.0, 4.0, 12.0),
        ];
        let table = SegmentDistanceTable::from_points(&points);
        assert_eq!(table.as_slice(), &[0.0, 5.0, 5.0, 17.0]);
        assert_eq!(table.total_length(), 17.0);
        assert!(table.as_slice().windows(2).all(|w| w[0] <= w[1]));

        let sum: f32 = points.windows(2).map(|w| w[0].distance(w[1])).sum();
        assert_eq!(table.total_length(), sum);
        assert_eq!(table.distance_along(3, 0.5), 11.0);
        assert_eq!(table.distance_along(0, 0.5), 2.5);
    }

    #[test]
    fn distance_table_for_tiny_paths() {
        let single = SegmentDistanceTable::from_points(&[Vec3::ONE]);
        assert_eq!(single.as_slice(), &[0.0]);
        assert_eq!(single.distance_along(0, 0.5), 0.0);
        assert!(SegmentDistanceTable::from_points(&[]).is_empty());
    }

    #[test]
    fn aligned_path_carries_matching_table() {
        let terrain = sloped_terrain();
        let raw = [Vec3::new(-4.0, 0.0, 0.0), Vec3::new(0.0, 0.0, 0.0), Vec3::new(0.0, 0.0, 3.0)];
        let path = align(&raw, &terrain, 1.0, 0.0).unwrap();
        assert_eq!(path.distances(), &SegmentDistanceTable::from_points(path.points()));
        assert!((path.elevation_change() - 20.0).abs() < 1e-5);
    }

    #[test]
    fn segments_are_banded_by_mean_height() {
        let terrain = sloped_terrain();
        let raw = [Vec3::new(-4.0, 0.0, 0.0), Vec3::new(2.0, 0.0, 0.0), Vec3::new(4.0, 0.0, 0.0)];
        let path = align(&raw, &terrain, 1.0, 25.0).unwrap();
        // Heights 25, 55, 65: means 40 and 60.
        assert_eq!(
            path.segment_bands(&BandThresholds::default()),
            vec![ElevationBand::Low, ElevationBand::Mid]
        );
        assert_eq!(BandThresholds::default().classify(70.5), ElevationBand::High);
    }

    #[test]
    fn parses_one_triple_per_line() {
        let text = "0 1 2\n  -3.5 4e1 0.25\n\n7 8 9\n";
        let waypoints = parse_waypoints(text).unwrap();
        assert_eq!(
            waypoints,
            vec![Vec3::new(0.0, 1.0, 2.0), Vec3::new(-3.5, 40.0, 0.25), Vec3::new(7.0, 8.0, 9.0)]
        );
    }

    #[test]
    fn reports_bad_numbers_with_line() {
        assert_eq!(
            parse_waypoints("1 2 3\n4 five 6\n"),
            Err(PathError::InvalidNumber {
                line: 2,
                token: "five".to_string()
            })
        );
    }

    #[test]
    fn reports_trailing_incomplete_waypoint() {
        assert_eq!(
            parse_waypoints("1 2 3\n4 5\n"),
            Err(PathError::IncompleteWaypoint { line: 2, values: 2 })
        );
    }

    #[test]
    fn missing_file_is_an_error() {
        assert!(load_waypoints(Path::new("/nonexistent/hiker_path.txt")).is_err());
    }
}
