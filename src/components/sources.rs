//! Batteries: the only producers of node state.
//!
//! A battery's right terminal is its positive pole and its left terminal is
//! its negative pole. Both terminals start with zero cumulative resistance.

use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::circuit::{Element, Polarity, TerminalSide, TopologyIndex, Voltage};
use crate::error::WiringFault;
use crate::solver::{NodeState, PathTable};

use super::Component;

/// A DC voltage source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceState {
    /// Terminal voltage in volts
    pub voltage: f64,
}

impl SourceState {
    pub const DEFAULT_VOLTS: f64 = 9.0;

    /// Create a battery; negative voltages clamp to zero.
    pub fn new(voltage: f64) -> Self {
        Self {
            voltage: voltage.max(0.0),
        }
    }

    /// Polarity a battery drives onto one of its terminals.
    pub fn polarity_of(side: TerminalSide) -> Polarity {
        match side {
            TerminalSide::Right => Polarity::Positive,
            TerminalSide::Left => Polarity::Negative,
        }
    }
}

impl Default for SourceState {
    fn default() -> Self {
        Self::new(Self::DEFAULT_VOLTS)
    }
}

/// Seed every battery terminal's path.
///
/// Fails with [`WiringFault::ShortCircuit`] when both poles of one battery
/// land on the same path.
pub fn inject_sources(
    elements: &[Element],
    index: &TopologyIndex<'_>,
    nodes: &mut PathTable,
) -> Result<(), WiringFault> {
    for element in elements {
        let Component::Battery(battery) = &element.component else {
            continue;
        };
        for side in [TerminalSide::Left, TerminalSide::Right] {
            let voltage = Voltage::driven(element.id, battery.voltage, SourceState::polarity_of(side));
            let seed = NodeState::new(voltage, 0.0);
            for path in index.terminal_paths(element.id, side) {
                trace!(battery = %element.id, %side, %path, "seeding");
                nodes.seed(path, element.id, seed)?;
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::circuit::{Breadboard, ElementId, Position};
    use crate::components::LedState;

    #[test]
    fn test_battery_poles() {
        assert_eq!(SourceState::polarity_of(TerminalSide::Right), Polarity::Positive);
        assert_eq!(SourceState::polarity_of(TerminalSide::Left), Polarity::Negative);
        assert_eq!(SourceState::new(-3.0).voltage, 0.0);
    }

    #[test]
    fn test_injection_seeds_both_poles() {
        let mut board = Breadboard::new();
        let bat = board.add_element(Component::Battery(SourceState::new(6.0)), Position::default());
        let led = board.add_element(Component::Led(LedState::default()), Position::default());
        let plus = board.add_wire((bat, TerminalSide::Right), &[], (led, TerminalSide::Right)).unwrap();
        let minus = board.add_wire((bat, TerminalSide::Left), &[], (led, TerminalSide::Left)).unwrap();

        let index = TopologyIndex::new(&board.connections);
        let mut nodes = PathTable::new();
        inject_sources(&board.elements, &index, &mut nodes).unwrap();

        let p = nodes.node(plus);
        assert_eq!(p.voltage.polarity, Some(Polarity::Positive));
        assert_eq!(p.voltage.magnitude, 6.0);
        assert_eq!(p.voltage.source_id, Some(ElementId(1)));
        assert_eq!(nodes.node(minus).voltage.polarity, Some(Polarity::Negative));
        assert!(nodes.is_source(plus));
    }
}
