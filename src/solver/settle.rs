//! Settling entry point and wiring-fault recovery.

use std::collections::BTreeMap;

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::circuit::{
    check_topology, path_states, prune_dangling, Breadboard, Connection, Element, PathId, TopologyIndex,
};
use crate::components::LedParams;
use crate::error::{Result, WiringFault};

use super::propagate::NodeState;
use super::relax::relax;
use super::{DEFAULT_AMMETER_BURDEN, DEFAULT_DIODE_DROP, DEFAULT_MAX_ITERATIONS};

/// Configuration for settling.
#[derive(Debug, Clone)]
pub struct SettleConfig {
    /// Maximum relaxation passes per attempt.
    pub max_iterations: usize,
    /// LED brightness calibration.
    pub led: LedParams,
    /// Voltage lost across an ammeter (volts).
    pub ammeter_burden: f64,
    /// Forward drop reported by a conducting diode (volts).
    pub diode_forward_drop: f64,
}

impl Default for SettleConfig {
    fn default() -> Self {
        Self {
            max_iterations: DEFAULT_MAX_ITERATIONS,
            led: LedParams::default(),
            ammeter_burden: DEFAULT_AMMETER_BURDEN,
            diode_forward_drop: DEFAULT_DIODE_DROP,
        }
    }
}

impl SettleConfig {
    /// Create a new configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the maximum relaxation passes.
    pub fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.max_iterations = max_iterations.max(1);
        self
    }

    /// Set the LED calibration.
    pub fn with_led(mut self, led: LedParams) -> Self {
        self.led = led;
        self
    }

    /// Set the ammeter burden voltage.
    pub fn with_ammeter_burden(mut self, volts: f64) -> Self {
        self.ammeter_burden = volts;
        self
    }

    /// Set the drop a conducting diode reports.
    pub fn with_diode_forward_drop(mut self, volts: f64) -> Self {
        self.diode_forward_drop = volts;
        self
    }
}

/// A drawn wire removed to recover from a wiring fault.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Rollback {
    /// What was wrong with the wiring
    #[serde(serialize_with = "fault_message")]
    pub fault: WiringFault,
    /// Path of the newest connection at the time
    pub path: PathId,
    /// Every segment on that path, in list order
    pub removed: Vec<Connection>,
}

fn fault_message<S: serde::Serializer>(fault: &WiringFault, s: S) -> std::result::Result<S::Ok, S::Error> {
    s.collect_str(fault)
}

/// Result of settling a board.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Settlement {
    /// Elements with updated readouts
    pub elements: Vec<Element>,
    /// Connections with resolved point state, minus any rolled back
    pub connections: Vec<Connection>,
    /// Faults recovered from, oldest first
    pub rollbacks: Vec<Rollback>,
    /// Relaxation passes of the final attempt
    pub iterations: usize,
}

impl Settlement {
    /// Whether the board settled without rolling anything back.
    pub fn is_clean(&self) -> bool {
        self.rollbacks.is_empty()
    }

    /// Surface the first recovered fault as an error.
    pub fn into_result(self) -> Result<Self> {
        match self.rollbacks.first() {
            Some(rollback) => Err(rollback.fault.clone().into()),
            None => Ok(self),
        }
    }

    /// Resolved state of every path.
    pub fn path_states(&self) -> BTreeMap<PathId, NodeState> {
        path_states(&self.connections)
    }

    /// The settled snapshot.
    pub fn into_board(self) -> Breadboard {
        Breadboard::from_parts(self.elements, self.connections)
    }
}

/// Settles boards with a fixed configuration.
#[derive(Debug, Clone, Default)]
pub struct Settler {
    config: SettleConfig,
}

impl Settler {
    /// Create a settler with default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a settler with custom configuration.
    pub fn with_config(config: SettleConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &SettleConfig {
        &self.config
    }

    /// Settle a board snapshot.
    pub fn settle_board(&self, board: &Breadboard) -> Settlement {
        self.settle(&board.elements, &board.connections)
    }

    /// Resolve every point's state and every element's readout.
    ///
    /// Never fails: invalid wiring is undone one drawn wire at a time,
    /// newest first, until the rest settles. Each undo is recorded in
    /// [`Settlement::rollbacks`].
    pub fn settle(&self, elements: &[Element], connections: &[Connection]) -> Settlement {
        let mut connections = prune_dangling(elements, connections);
        let mut rollbacks = Vec::new();

        loop {
            let mut settled = elements.to_vec();
            let outcome = {
                let index = TopologyIndex::new(&connections);
                check_topology(&settled, &index)
                    .and_then(|()| relax(&mut settled, &index, &self.config))
            };

            match outcome {
                Ok(relaxed) => {
                    relaxed.table.commit(&mut connections);
                    info!(
                        elements = settled.len(),
                        connections = connections.len(),
                        iterations = relaxed.iterations,
                        rollbacks = rollbacks.len(),
                        "board settled"
                    );
                    return Settlement {
                        elements: settled,
                        connections,
                        rollbacks,
                        iterations: relaxed.iterations,
                    };
                }
                Err(fault) => match take_newest_wire(&mut connections) {
                    Some((path, removed)) => {
                        warn!(%fault, %path, segments = removed.len(), "invalid wiring, removed newest wire");
                        rollbacks.push(Rollback { fault, path, removed });
                    }
                    None => {
                        debug!(%fault, "fault with no connections left, returning dead board");
                        return Settlement {
                            elements: elements.to_vec(),
                            connections,
                            rollbacks,
                            iterations: 0,
                        };
                    }
                },
            }
        }
    }
}

/// Pop the newest connection along with every segment sharing its path,
/// so a bent wire never comes back half drawn.
fn take_newest_wire(connections: &mut Vec<Connection>) -> Option<(PathId, Vec<Connection>)> {
    let newest = connections.pop()?;
    let paths = [newest.start.path_id, newest.end.path_id];
    let (mut removed, kept): (Vec<Connection>, Vec<Connection>) = connections
        .drain(..)
        .partition(|c| paths.iter().any(|&p| c.carries(p)));
    *connections = kept;
    removed.push(newest);
    Some((paths[0], removed))
}

/// Settle a snapshot with the default configuration.
pub fn settle(elements: &[Element], connections: &[Connection]) -> Settlement {
    Settler::new().settle(elements, connections)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::circuit::{Position, TerminalSide};
    use crate::components::{Component, SourceState, SwitchState};
    use crate::error::BreadboardError;

    #[test]
    fn test_config_builder() {
        let config = SettleConfig::new()
            .with_max_iterations(0)
            .with_ammeter_burden(1.5);
        assert_eq!(config.max_iterations, 1);
        assert_eq!(config.ammeter_burden, 1.5);
        assert_eq!(config.led.gain, 1000.0);
    }

    #[test]
    fn test_empty_board_settles() {
        let settlement = settle(&[], &[]);
        assert!(settlement.is_clean());
        assert!(settlement.connections.is_empty());
    }

    #[test]
    fn test_short_rolls_back_newest() {
        let mut board = Breadboard::new();
        let bat = board.add_element(Component::Battery(SourceState::default()), Position::default());
        let sw = board.add_element(Component::Switch(SwitchState::new(true)), Position::default());
        board.add_wire((bat, TerminalSide::Right), &[], (sw, TerminalSide::Left)).unwrap();
        board.add_wire((sw, TerminalSide::Right), &[], (bat, TerminalSide::Left)).unwrap();

        let settlement = Settler::new().settle_board(&board);
        assert_eq!(settlement.rollbacks.len(), 1);
        assert_eq!(settlement.connections.len(), 1);
        assert_eq!(settlement.rollbacks[0].removed, vec![board.connections[1].clone()]);
        assert_eq!(settlement.rollbacks[0].path, board.connections[1].start.path_id);
        assert!(matches!(
            settlement.clone().into_result(),
            Err(BreadboardError::InvalidWiring(WiringFault::ConflictingPolarity { .. }))
        ));
        // the surviving wire is still powered by the battery
        assert!(settlement.connections[0].start.is_active);
    }

    #[test]
    fn test_rollback_takes_every_bend_of_the_wire() {
        let mut board = Breadboard::new();
        let bat = board.add_element(Component::Battery(SourceState::default()), Position::default());
        let sw = board.add_element(Component::Switch(SwitchState::new(true)), Position::default());
        board.add_wire((bat, TerminalSide::Right), &[], (sw, TerminalSide::Left)).unwrap();
        let bent = board
            .add_wire(
                (sw, TerminalSide::Right),
                &[Position::new(0.0, 0.0), Position::new(5.0, 5.0)],
                (bat, TerminalSide::Left),
            )
            .unwrap();
        assert_eq!(board.connections.len(), 4);

        let settlement = Settler::new().settle_board(&board);
        assert_eq!(settlement.rollbacks.len(), 1);
        assert_eq!(settlement.rollbacks[0].path, bent);
        assert_eq!(settlement.rollbacks[0].removed, board.connections[1..].to_vec());
        assert_eq!(settlement.connections.len(), 1);
        assert!(settlement.connections.iter().all(|c| !c.carries(bent)));
    }
}
