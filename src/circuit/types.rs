//! Core types for the breadboard topology.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Identifies a placed element. Every point that belongs to the element
/// (and every waypoint of a wire drawn from it) carries the same id.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct ElementId(pub u64);

impl fmt::Display for ElementId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "E{}", self.0)
    }
}

/// Equivalence-class key of a node: every point carrying the same path id
/// is the same electrical node.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct PathId(pub u64);

impl fmt::Display for PathId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "P{}", self.0)
    }
}

/// Which physical terminal of a component a point sits on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TerminalSide {
    Left,
    Right,
}

impl TerminalSide {
    /// Parse `left` / `right` (case-insensitive).
    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "left" | "l" => Some(Self::Left),
            "right" | "r" => Some(Self::Right),
            _ => None,
        }
    }
}

impl fmt::Display for TerminalSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Left => write!(f, "left"),
            Self::Right => write!(f, "right"),
        }
    }
}

/// Position of a point within its connection.
///
/// Only `Start` and `End` points are attached to a component terminal.
/// Waypoints carry the id and side of the element the wire was drawn from
/// but are free wire bends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PointRole {
    Start,
    End,
    #[serde(alias = "point")]
    Waypoint,
}

impl PointRole {
    /// Whether a point with this role sits on a component terminal.
    pub fn is_terminal(self) -> bool {
        !matches!(self, Self::Waypoint)
    }
}

/// Polarity tag of a resolved node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Polarity {
    #[serde(rename = "+")]
    Positive,
    #[serde(rename = "-")]
    Negative,
}

impl fmt::Display for Polarity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Positive => write!(f, "+"),
            Self::Negative => write!(f, "-"),
        }
    }
}

/// Resolved electrical state of a node.
///
/// `source` names the battery the state traces back to; meters use it to
/// tell a parallel tap on one source from two sources stacked in series.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Voltage {
    pub source_id: Option<ElementId>,
    pub magnitude: f64,
    pub polarity: Option<Polarity>,
}

impl Voltage {
    /// The dead state: no source, no magnitude, no polarity.
    pub const NONE: Voltage = Voltage {
        source_id: None,
        magnitude: 0.0,
        polarity: None,
    };

    /// A voltage driven by `source`.
    pub fn driven(source: ElementId, magnitude: f64, polarity: Polarity) -> Self {
        Self {
            source_id: Some(source),
            magnitude,
            polarity: Some(polarity),
        }
    }

    /// A node is active iff it carries a polarity.
    pub fn is_active(&self) -> bool {
        self.polarity.is_some()
    }
}

impl fmt::Display for Voltage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.polarity, self.source_id) {
            (Some(p), Some(src)) => write!(f, "{}{:.2}V ({})", p, self.magnitude, src),
            (Some(p), None) => write!(f, "{}{:.2}V", p, self.magnitude),
            (None, _) => write!(f, "--"),
        }
    }
}

/// Canvas coordinates, carried through untouched for the host.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

impl Position {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_voltage_activity_follows_polarity() {
        assert!(!Voltage::NONE.is_active());
        let v = Voltage::driven(ElementId(1), 9.0, Polarity::Positive);
        assert!(v.is_active());
        assert_eq!(v.to_string(), "+9.00V (E1)");
    }

    #[test]
    fn test_polarity_wire_format() {
        let v = Voltage::driven(ElementId(7), 4.5, Polarity::Negative);
        let json = serde_json::to_string(&v).unwrap();
        assert_eq!(json, r#"{"sourceId":7,"magnitude":4.5,"polarity":"-"}"#);
    }

    #[test]
    fn test_waypoint_accepts_legacy_tag() {
        let role: PointRole = serde_json::from_str("\"point\"").unwrap();
        assert_eq!(role, PointRole::Waypoint);
        assert!(!role.is_terminal());
    }
}
