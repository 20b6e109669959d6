//! Voltmeter and ammeter.

use serde::{Deserialize, Serialize};

use crate::circuit::{ElementId, Polarity, TerminalSide};
use crate::error::WiringFault;
use crate::solver::NodeState;

use super::{ElementKind, RuleContext};

/// Resistance below which an ammeter reads zero.
const MIN_READING_RESISTANCE: f64 = 1e-9;

/// Voltage across a pair of nodes.
///
/// Defined only for a negative left node and a positive right node. The
/// same battery on both sides is a parallel tap and reads its voltage; two
/// different batteries are stacked in series and their voltages add.
pub fn across(left: &NodeState, right: &NodeState) -> Option<f64> {
    match (left.polarity(), right.polarity()) {
        (Some(Polarity::Negative), Some(Polarity::Positive)) => {
            let (l, r) = (left.voltage, right.voltage);
            if l.source_id == r.source_id {
                Some(l.magnitude.max(r.magnitude))
            } else {
                Some(l.magnitude + r.magnitude)
            }
        }
        _ => None,
    }
}

/// Readout of a meter.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MeterReading {
    /// Volts for a voltmeter, amperes for an ammeter
    #[serde(default)]
    pub value: f64,
}

impl MeterReading {
    /// Read the voltage across the voltmeter's terminals.
    pub fn apply_voltmeter(&mut self, id: ElementId, ctx: &RuleContext<'_>) {
        self.value = match (
            ctx.single(id, TerminalSide::Left),
            ctx.single(id, TerminalSide::Right),
        ) {
            (Some(l), Some(r)) => across(&l.node, &r.node).unwrap_or(0.0),
            _ => 0.0,
        };
    }

    /// Bridge both sides of the ammeter and read the loop current.
    ///
    /// The side with the larger cumulative resistance is the reference; its
    /// state is copied across, and the reading is its battery's voltage
    /// less the meter's burden voltage, over the reference resistance.
    pub fn apply_ammeter(&mut self, id: ElementId, ctx: &mut RuleContext<'_>) -> Result<(), WiringFault> {
        let (Some(left), Some(right)) = (
            ctx.single(id, TerminalSide::Left),
            ctx.single(id, TerminalSide::Right),
        ) else {
            self.value = 0.0;
            return Ok(());
        };

        let reference = match (left.is_active(), right.is_active()) {
            (false, false) => {
                self.value = 0.0;
                return Ok(());
            }
            (true, false) => {
                ctx.propagate(right.path, left.node);
                left.node
            }
            (false, true) => {
                ctx.propagate(left.path, right.node);
                right.node
            }
            (true, true) => {
                if left.node.polarity() != right.node.polarity() {
                    return Err(WiringFault::ConflictingPolarity {
                        element: id,
                        kind: ElementKind::Ammeter,
                    });
                }
                if left.node.cumulative_resistance > right.node.cumulative_resistance {
                    ctx.propagate(right.path, left.node);
                    left.node
                } else {
                    ctx.propagate(left.path, right.node);
                    right.node
                }
            }
        };

        let driving = ctx.supply(reference);
        let ohms = driving.cumulative_resistance;
        self.value = if ohms > MIN_READING_RESISTANCE {
            let amps = (driving.voltage.magnitude - ctx.config().ammeter_burden) / ohms;
            ((amps * 1000.0).round() / 1000.0).max(0.0)
        } else {
            0.0
        };
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::circuit::Voltage;

    fn node(src: u64, volts: f64, polarity: Polarity) -> NodeState {
        NodeState::new(Voltage::driven(ElementId(src), volts, polarity), 0.0)
    }

    #[test]
    fn test_across_parallel_tap() {
        let l = node(1, 9.0, Polarity::Negative);
        let r = node(1, 9.0, Polarity::Positive);
        assert_eq!(across(&l, &r), Some(9.0));
    }

    #[test]
    fn test_across_series_stack() {
        let l = node(1, 9.0, Polarity::Negative);
        let r = node(2, 9.0, Polarity::Positive);
        assert_eq!(across(&l, &r), Some(18.0));
    }

    #[test]
    fn test_across_needs_forward_orientation() {
        let l = node(1, 9.0, Polarity::Positive);
        let r = node(1, 9.0, Polarity::Negative);
        assert_eq!(across(&l, &r), None);
        assert_eq!(across(&NodeState::default(), &r), None);
    }
}
