//! Trajectory shape classification.
//!
//! A standalone polyline-feature module: it consumes an ordered point
//! sequence (typically [`ContactTrack::motion_locations`]) and decides
//! whether the path matches a shape class, using a turning-angle histogram.
//! Every threshold is a config field so shapes can be recalibrated without
//! touching the algorithm.
//!
//! [`ContactTrack::motion_locations`]: crate::history::ContactTrack::motion_locations

use crate::event::Point;

#[cfg(feature = "serde")]
use serde_derive::{Deserialize, Serialize};

/// Thresholds for closed-circle detection.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct CircleConfig {
    /// Minimum point count, strict: paths with `min_points` or fewer points
    /// are rejected outright.
    pub min_points: usize,
    /// Maximum start-to-end gap in px.
    pub max_endpoint_gap: f32,
    /// Maximum variance of point distances from the centroid.
    pub max_radius_variance: f32,
    /// Turning-angle magnitude in degrees above which a point counts as a
    /// corner peak.
    pub peak_angle_deg: f32,
    /// More peaks than this is an immediate rejection.
    pub max_peaks: usize,
    /// Acceptance additionally requires strictly fewer peaks than this, so
    /// peak counts in `accept_peaks_below..=max_peaks` still reject.
    pub accept_peaks_below: usize,
}

impl Default for CircleConfig {
    fn default() -> Self {
        Self {
            min_points: 100,
            max_endpoint_gap: 40.0,
            max_radius_variance: 600.0,
            peak_angle_deg: 50.0,
            max_peaks: 4,
            accept_peaks_below: 3,
        }
    }
}

/// Thresholds for star-outline detection.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct StarConfig {
    /// Minimum point count, strict.
    pub min_points: usize,
    /// Turning-angle magnitude in degrees that qualifies as a corner peak.
    pub angle_threshold_deg: f32,
    /// Maximum start-to-end gap as a fraction of total path length.
    pub closed_distance_ratio: f32,
    /// Peaks closer than this many samples to the previous one merge into it.
    pub peak_merge_window: usize,
    pub min_peaks: usize,
    pub max_peaks: usize,
}

impl Default for StarConfig {
    fn default() -> Self {
        Self {
            min_points: 42,
            angle_threshold_deg: 60.0,
            closed_distance_ratio: 0.25,
            peak_merge_window: 5,
            min_peaks: 8,
            max_peaks: 12,
        }
    }
}

/// Signed turning angle in degrees at each interior point: the difference of
/// the `atan2` headings of the outgoing and incoming segments. Empty for
/// paths with fewer than 3 points.
pub fn turning_angles(points: &[Point]) -> Vec<f32> {
    if points.len() < 3 {
        return Vec::new();
    }
    let mut angles = Vec::with_capacity(points.len() - 2);
    for window in points.windows(3) {
        let (a, b, c) = (window[0], window[1], window[2]);
        let incoming = (b.y - a.y).atan2(b.x - a.x);
        let outgoing = (c.y - b.y).atan2(c.x - b.x);
        angles.push((outgoing - incoming).to_degrees());
    }
    angles
}

/// Accumulated segment length of the path.
pub fn path_length(points: &[Point]) -> f32 {
    points
        .windows(2)
        .map(|pair| pair[0].distance_to(pair[1]))
        .sum()
}

/// Whether the path reads as a closed, roughly round stroke: endpoints close
/// together, low radius variance around the centroid, and few sharp corners.
pub fn is_circle(points: &[Point], config: &CircleConfig) -> bool {
    if points.len() <= config.min_points {
        return false;
    }

    let gap = points[0].distance_to(points[points.len() - 1]);

    let center = centroid(points);
    let radii: Vec<f32> = points.iter().map(|p| p.distance_to(center)).collect();
    let mean = radii.iter().sum::<f32>() / radii.len() as f32;
    let variance = radii.iter().map(|r| (r - mean) * (r - mean)).sum::<f32>() / radii.len() as f32;

    let peaks = turning_angles(points)
        .iter()
        .filter(|angle| angle.abs() > config.peak_angle_deg)
        .count();
    if peaks > config.max_peaks {
        return false;
    }

    gap < config.max_endpoint_gap
        && variance < config.max_radius_variance
        && peaks < config.accept_peaks_below
}

/// Whether the path reads as a closed star outline: a near-closed stroke
/// with a de-duplicated corner-peak count in the configured band.
pub fn is_star(points: &[Point], config: &StarConfig) -> bool {
    if points.len() <= config.min_points {
        return false;
    }

    // Collapse runs of consecutive over-threshold angles into one peak each.
    let mut peaks: Vec<usize> = Vec::new();
    for (index, angle) in turning_angles(points).iter().enumerate() {
        if angle.abs() > config.angle_threshold_deg {
            if let Some(&last) = peaks.last() {
                if index - last < config.peak_merge_window {
                    continue;
                }
            }
            peaks.push(index);
        }
    }

    let gap = points[0].distance_to(points[points.len() - 1]);
    if gap > path_length(points) * config.closed_distance_ratio {
        return false;
    }

    peaks.len() >= config.min_peaks && peaks.len() <= config.max_peaks
}

fn centroid(points: &[Point]) -> Point {
    let n = points.len() as f32;
    Point {
        x: points.iter().map(|p| p.x).sum::<f32>() / n,
        y: points.iter().map(|p| p.y).sum::<f32>() / n,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::TAU;

    /// 128 points around a radius-50 circle.
    fn circle_points() -> Vec<Point> {
        (0..128)
            .map(|i| {
                let theta = TAU * i as f32 / 128.0;
                Point::new(200.0 + 50.0 * theta.cos(), 200.0 + 50.0 * theta.sin())
            })
            .collect()
    }

    /// The same 128 points traversed as a triangle outline, wrapping a step
    /// past closure so the closing corner's turn is measurable.
    fn triangle_points() -> Vec<Point> {
        let corners = [
            Point::new(200.0, 100.0),
            Point::new(120.0, 260.0),
            Point::new(280.0, 260.0),
        ];
        let mut points = Vec::new();
        for side in 0..3 {
            let from = corners[side];
            let to = corners[(side + 1) % 3];
            for step in 0..42 {
                let t = step as f32 / 42.0;
                points.push(Point::new(
                    from.x + (to.x - from.x) * t,
                    from.y + (to.y - from.y) * t,
                ));
            }
        }
        points.push(corners[0]);
        let overshoot = 1.0 / 42.0;
        points.push(Point::new(
            corners[0].x + (corners[1].x - corners[0].x) * overshoot,
            corners[0].y + (corners[1].y - corners[0].y) * overshoot,
        ));
        assert_eq!(points.len(), 128);
        points
    }

    /// Dense 5-pointed star outline: 10 corners, 6 samples per edge.
    fn star_points() -> Vec<Point> {
        let outer = 100.0f32;
        let inner = 40.0f32;
        let corners: Vec<Point> = (0..10)
            .map(|i| {
                let radius = if i % 2 == 0 { outer } else { inner };
                let theta = TAU * i as f32 / 10.0 - TAU / 4.0;
                Point::new(200.0 + radius * theta.cos(), 200.0 + radius * theta.sin())
            })
            .collect();
        let mut points = Vec::new();
        for side in 0..10 {
            let from = corners[side];
            let to = corners[(side + 1) % 10];
            for step in 0..6 {
                let t = step as f32 / 6.0;
                points.push(Point::new(
                    from.x + (to.x - from.x) * t,
                    from.y + (to.y - from.y) * t,
                ));
            }
        }
        points.push(corners[0]);
        points
    }

    #[test]
    fn turning_angles_need_three_points() {
        assert!(turning_angles(&[Point::new(0.0, 0.0), Point::new(1.0, 0.0)]).is_empty());
        let right_turn = turning_angles(&[
            Point::new(0.0, 0.0),
            Point::new(1.0, 0.0),
            Point::new(1.0, 1.0),
        ]);
        assert_eq!(right_turn.len(), 1);
        assert!((right_turn[0] - 90.0).abs() < 1e-3);
    }

    #[test]
    fn regular_polygon_reads_as_circle() {
        assert!(is_circle(&circle_points(), &CircleConfig::default()));
    }

    #[test]
    fn triangle_traversal_is_not_a_circle() {
        // Same point budget, but three sharp ~120 degree corners.
        assert!(!is_circle(&triangle_points(), &CircleConfig::default()));
    }

    #[test]
    fn short_paths_are_rejected() {
        let few: Vec<Point> = circle_points().into_iter().take(100).collect();
        assert!(!is_circle(&few, &CircleConfig::default()));
        let few: Vec<Point> = star_points().into_iter().take(42).collect();
        assert!(!is_star(&few, &StarConfig::default()));
    }

    #[test]
    fn open_circle_is_rejected_by_endpoint_gap() {
        // Drop the closing third of the stroke.
        let open: Vec<Point> = circle_points().into_iter().take(110).collect();
        assert!(!is_circle(&open, &CircleConfig::default()));
    }

    #[test]
    fn star_outline_is_accepted() {
        assert!(is_star(&star_points(), &StarConfig::default()));
    }

    #[test]
    fn circle_is_not_a_star() {
        assert!(!is_star(&circle_points(), &StarConfig::default()));
    }

    #[test]
    fn truncated_star_is_rejected() {
        let open: Vec<Point> = star_points().into_iter().take(45).collect();
        assert!(!is_star(&open, &StarConfig::default()));
    }

    #[test]
    fn path_length_sums_segments() {
        let square = [
            Point::new(0.0, 0.0),
            Point::new(10.0, 0.0),
            Point::new(10.0, 10.0),
        ];
        assert!((path_length(&square) - 20.0).abs() < 1e-4);
    }
}
