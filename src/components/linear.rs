//! Linear passives: resistors (and potentiometers) and capacitors.

use serde::{Deserialize, Serialize};

use crate::circuit::{ElementId, TerminalSide};
use crate::error::WiringFault;

use super::{across, ElementKind, Neighbour, RuleContext};

/// Two cumulative resistances closer than this are treated as equal.
const RESISTANCE_EPSILON: f64 = 1e-9;

/// A fixed resistor or a potentiometer at its current setting.
///
/// Forwards state from its powered side to its unpowered side, adding its
/// own resistance to the path total.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResistiveState {
    /// Resistance in ohms
    #[serde(rename = "resistance", alias = "ohms")]
    pub ohms: f64,
}

impl ResistiveState {
    pub const DEFAULT_OHMS: f64 = 220.0;

    /// Create a resistor; negative values clamp to zero.
    pub fn new(ohms: f64) -> Self {
        Self { ohms: ohms.max(0.0) }
    }

    /// Apply the resistor rule once.
    pub fn apply(
        &self,
        id: ElementId,
        kind: ElementKind,
        ctx: &mut RuleContext<'_>,
    ) -> Result<(), WiringFault> {
        let (Some(left), Some(right)) = (
            ctx.single(id, TerminalSide::Left),
            ctx.single(id, TerminalSide::Right),
        ) else {
            return Ok(());
        };

        match (left.node.polarity(), right.node.polarity()) {
            (Some(a), Some(b)) if a != b => {
                Err(WiringFault::ConflictingPolarity { element: id, kind })
            }
            (Some(_), Some(_)) => {
                self.shorten(left, right, ctx);
                Ok(())
            }
            (Some(_), None) => {
                ctx.propagate(right.path, left.node.through(self.ohms));
                Ok(())
            }
            (None, Some(_)) => {
                ctx.propagate(left.path, right.node.through(self.ohms));
                Ok(())
            }
            (None, None) => Ok(()),
        }
    }

    /// Both sides powered with the same polarity: keep the far side's
    /// resistance no larger than the near side's plus our own.
    fn shorten(&self, left: Neighbour, right: Neighbour, ctx: &mut RuleContext<'_>) {
        let (near, far) =
            if left.node.cumulative_resistance > right.node.cumulative_resistance {
                (right, left)
            } else {
                (left, right)
            };
        let expected = near.node.cumulative_resistance + self.ohms;
        if far.node.cumulative_resistance > expected + RESISTANCE_EPSILON {
            ctx.propagate(far.path, near.node.through(self.ohms));
        }
    }
}

impl Default for ResistiveState {
    fn default() -> Self {
        Self::new(Self::DEFAULT_OHMS)
    }
}

/// A capacitor.
///
/// DC steady state only: the capacitor is an open circuit and reports the
/// voltage across its plates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CapacitorState {
    /// Capacitance in farads
    pub capacitance: f64,
    /// Voltage across the plates at the last settle
    #[serde(default)]
    pub voltage: f64,
}

impl CapacitorState {
    pub const DEFAULT_FARADS: f64 = 1e-6;

    pub fn new(capacitance: f64) -> Self {
        Self {
            capacitance: capacitance.max(0.0),
            voltage: 0.0,
        }
    }

    /// Stored charge at the current plate voltage, in coulombs.
    pub fn charge(&self) -> f64 {
        self.capacitance * self.voltage
    }

    pub fn apply(&mut self, id: ElementId, ctx: &RuleContext<'_>) {
        let left = ctx.first_active(id, TerminalSide::Left);
        let right = ctx.first_active(id, TerminalSide::Right);
        self.voltage = match (left, right) {
            (Some(l), Some(r)) => across(&l.node, &r.node).unwrap_or(0.0),
            _ => 0.0,
        };
    }
}

impl Default for CapacitorState {
    fn default() -> Self {
        Self::new(Self::DEFAULT_FARADS)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_resistor_clamps_negative() {
        assert_eq!(ResistiveState::new(-10.0).ohms, 0.0);
        assert_eq!(ResistiveState::default().ohms, 220.0);
    }

    #[test]
    fn test_capacitor_charge() {
        let cap = CapacitorState {
            capacitance: 10e-6,
            voltage: 9.0,
        };
        assert_relative_eq!(cap.charge(), 90e-6, epsilon = 1e-12);
    }

    #[test]
    fn test_resistive_wire_format() {
        let r: ResistiveState = serde_json::from_str(r#"{"resistance":1000}"#).unwrap();
        assert_eq!(r.ohms, 1000.0);
    }
}
