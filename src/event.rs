#[cfg(feature = "serde")]
use serde_derive::{Deserialize, Serialize};

/// A location in view-local coordinates.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn distance_to(self, other: Point) -> f32 {
        (other.x - self.x).hypot(other.y - self.y)
    }

    pub fn midpoint(self, other: Point) -> Point {
        Point {
            x: (self.x + other.x) / 2.0,
            y: (self.y + other.y) / 2.0,
        }
    }
}

/// A displacement or velocity vector.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Vec2 {
    pub x: f32,
    pub y: f32,
}

impl Vec2 {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Euclidean magnitude.
    pub fn length(self) -> f32 {
        self.x.hypot(self.y)
    }
}

/// View extents at capture time, used for in-bounds checks.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Bounds {
    pub width: f32,
    pub height: f32,
}

impl Bounds {
    pub fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    /// Whether the point lies within the view, edges inclusive.
    pub fn contains(self, point: Point) -> bool {
        point.x >= 0.0 && point.x <= self.width && point.y >= 0.0 && point.y <= self.height
    }
}

/// Opaque contact identity, stable for as long as the contact stays down.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ContactId(pub u64);

/// Platform-reported phase of a single contact.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum ContactPhase {
    Changed,
    Ended,
}

/// Timing classification of one observation.
///
/// `Heartbeat` is synthesized by the engine to re-evaluate time-dependent
/// predicates while a contact is held still; the input source only ever
/// reports `Changed` and `Ended`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Timing {
    Changed,
    Ended,
    Heartbeat,
}

impl Timing {
    /// Whether this observation came from the input source rather than the
    /// heartbeat timer.
    pub fn is_raw(self) -> bool {
        !matches!(self, Timing::Heartbeat)
    }
}

/// One contact as reported by the input source.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Contact {
    pub id: ContactId,
    pub location: Point,
    pub phase: ContactPhase,
}

/// One aggregation step fed into the engine: every simultaneous contact at
/// one instant, the view bounds at capture time, and a timing tag.
///
/// Observations are appended to the engine's log and never mutated.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Observation {
    pub contacts: Vec<Contact>,
    pub bounds: Bounds,
    pub timing: Timing,
    pub t_ms: u64,
}

impl Observation {
    pub fn contact_count(&self) -> usize {
        self.contacts.len()
    }

    pub fn locations(&self) -> Vec<Point> {
        self.contacts.iter().map(|contact| contact.location).collect()
    }

    /// Whether every contact in this observation is within the view bounds.
    pub fn all_in_bounds(&self) -> bool {
        self.contacts
            .iter()
            .all(|contact| self.bounds.contains(contact.location))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bounds_contains_is_edge_inclusive() {
        let bounds = Bounds::new(100.0, 50.0);
        assert!(bounds.contains(Point::new(0.0, 0.0)));
        assert!(bounds.contains(Point::new(100.0, 50.0)));
        assert!(!bounds.contains(Point::new(100.1, 25.0)));
        assert!(!bounds.contains(Point::new(50.0, -0.1)));
    }

    #[test]
    fn point_distance_and_midpoint() {
        let a = Point::new(0.0, 0.0);
        let b = Point::new(3.0, 4.0);
        assert!((a.distance_to(b) - 5.0).abs() < 1e-6);
        assert_eq!(a.midpoint(b), Point::new(1.5, 2.0));
    }

    #[test]
    fn heartbeat_is_not_raw() {
        assert!(Timing::Changed.is_raw());
        assert!(Timing::Ended.is_raw());
        assert!(!Timing::Heartbeat.is_raw());
    }
}
