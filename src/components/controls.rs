//! User-operated parts: the switch and the potentiometer.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::circuit::{ElementId, TerminalSide};
use crate::error::WiringFault;

use super::{ElementKind, ResistiveState, RuleContext};

/// Upper end of the potentiometer's travel in ohms.
pub const POTENTIOMETER_MAX_OHMS: f64 = 10_000.0;

impl ResistiveState {
    /// A potentiometer set to `ohms`, clamped to its travel.
    pub fn potentiometer(ohms: f64) -> Self {
        Self {
            ohms: ohms.clamp(0.0, POTENTIOMETER_MAX_OHMS),
        }
    }
}

/// A single-pole switch.
///
/// A closed switch is a zero-resistance bridge that copies the state of the
/// driven side onto the other. An open switch kills whichever side it last
/// drove, so downstream parts lose power when it opens.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SwitchState {
    /// Closed (conducting) or open
    #[serde(rename = "isOn", alias = "closed")]
    pub closed: bool,
    /// Side the switch last drove current out of
    #[serde(default)]
    pub out: Option<TerminalSide>,
}

impl SwitchState {
    pub fn new(closed: bool) -> Self {
        Self { closed, out: None }
    }

    /// Apply the switch rule once.
    pub fn apply(&mut self, id: ElementId, ctx: &mut RuleContext<'_>) -> Result<(), WiringFault> {
        let left = ctx.first_active(id, TerminalSide::Left);
        let right = ctx.first_active(id, TerminalSide::Right);

        if self.closed {
            match (left, right) {
                (Some(l), Some(r)) => {
                    if l.node.polarity() != r.node.polarity() {
                        return Err(WiringFault::ConflictingPolarity {
                            element: id,
                            kind: ElementKind::Switch,
                        });
                    }
                    // extra wires on either terminal join the bridged node
                    let feed = if r.node.cumulative_resistance < l.node.cumulative_resistance {
                        r.node
                    } else {
                        l.node
                    };
                    ctx.fill(id, TerminalSide::Left, feed);
                    ctx.fill(id, TerminalSide::Right, feed);
                }
                (Some(l), None) => {
                    ctx.drive(id, TerminalSide::Right, l.node);
                    self.out = Some(TerminalSide::Right);
                }
                (None, Some(r)) => {
                    ctx.drive(id, TerminalSide::Left, r.node);
                    self.out = Some(TerminalSide::Left);
                }
                (None, None) => {}
            }
        } else if let (Some(l), Some(r)) = (left, right) {
            let side = self.out.unwrap_or(
                if l.node.cumulative_resistance > r.node.cumulative_resistance {
                    TerminalSide::Left
                } else {
                    TerminalSide::Right
                },
            );
            if ctx.isolate(id, side) {
                debug!(switch = %id, %side, "open switch cut power");
            }
        }
        Ok(())
    }

    /// Open a closed switch that has no power on either side.
    ///
    /// Runs once the board has settled, never between passes.
    pub fn release_if_idle(&mut self, id: ElementId, ctx: &RuleContext<'_>) -> bool {
        if self.closed
            && ctx.first_active(id, TerminalSide::Left).is_none()
            && ctx.first_active(id, TerminalSide::Right).is_none()
        {
            self.closed = false;
            return true;
        }
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_potentiometer_travel_clamped() {
        assert_eq!(ResistiveState::potentiometer(-1.0).ohms, 0.0);
        assert_eq!(ResistiveState::potentiometer(25_000.0).ohms, POTENTIOMETER_MAX_OHMS);
        assert_eq!(ResistiveState::potentiometer(4_700.0).ohms, 4_700.0);
    }

    #[test]
    fn test_switch_wire_format() {
        let sw: SwitchState = serde_json::from_str(r#"{"isOn":true}"#).unwrap();
        assert!(sw.closed);
        assert_eq!(sw.out, None);
        let json = serde_json::to_string(&SwitchState { closed: false, out: Some(TerminalSide::Left) }).unwrap();
        assert_eq!(json, r#"{"isOn":false,"out":"left"}"#);
    }
}
