//! Path-equivalence store for node state.

use std::collections::{HashMap, HashSet};

use tracing::trace;

use crate::circuit::{Connection, ElementId, PathId, Polarity, TopologyIndex, Voltage};
use crate::error::WiringFault;

/// State of one electrical node.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct NodeState {
    pub voltage: Voltage,
    /// Series resistance accumulated from the driving battery, in ohms
    pub cumulative_resistance: f64,
}

impl NodeState {
    pub fn new(voltage: Voltage, cumulative_resistance: f64) -> Self {
        Self {
            voltage,
            cumulative_resistance,
        }
    }

    pub fn is_active(&self) -> bool {
        self.voltage.is_active()
    }

    pub fn polarity(&self) -> Option<Polarity> {
        self.voltage.polarity
    }

    /// The same state seen through `ohms` of extra series resistance.
    pub fn through(&self, ohms: f64) -> Self {
        Self {
            voltage: self.voltage,
            cumulative_resistance: self.cumulative_resistance + ohms,
        }
    }
}

/// Node state keyed by path id.
///
/// Battery terminal paths are pinned once seeded, and paths killed by an
/// open switch stay dead for the rest of the attempt; neither accepts
/// writes from component rules.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PathTable {
    nodes: HashMap<PathId, NodeState>,
    sources: HashMap<PathId, ElementId>,
    isolated: HashSet<PathId>,
    emf: HashMap<ElementId, f64>,
}

impl PathTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current state of a path; unknown paths are dead.
    pub fn node(&self, path: PathId) -> NodeState {
        self.nodes.get(&path).copied().unwrap_or_default()
    }

    /// Whether a path is pinned by a battery terminal.
    pub fn is_source(&self, path: PathId) -> bool {
        self.sources.contains_key(&path)
    }

    pub fn is_isolated(&self, path: PathId) -> bool {
        self.isolated.contains(&path)
    }

    /// Number of paths currently carrying a polarity.
    pub fn active_count(&self) -> usize {
        self.nodes.values().filter(|n| n.is_active()).count()
    }

    /// Pin a battery terminal's path.
    ///
    /// When several batteries meet on one path the first to seed it keeps
    /// it. The same battery seeding both polarities onto one path is a
    /// short circuit.
    pub fn seed(&mut self, path: PathId, battery: ElementId, state: NodeState) -> Result<(), WiringFault> {
        self.emf.insert(battery, state.voltage.magnitude);
        match self.sources.get(&path) {
            Some(&owner) if owner == battery => {
                if self.node(path).polarity() != state.polarity() {
                    return Err(WiringFault::ShortCircuit { battery, path });
                }
                self.nodes.insert(path, state);
            }
            Some(_) => {}
            None => {
                self.sources.insert(path, battery);
                self.isolated.remove(&path);
                self.nodes.insert(path, state);
            }
        }
        Ok(())
    }

    /// Terminal voltage of a seeded battery.
    pub fn emf(&self, battery: ElementId) -> Option<f64> {
        self.emf.get(&battery).copied()
    }

    /// `node` with its magnitude restored to its battery's terminal voltage.
    ///
    /// Loads write their own drop onto the nodes they touch; loop current
    /// is still driven by the full supply.
    pub fn supply(&self, node: NodeState) -> NodeState {
        match node.voltage.source_id.and_then(|id| self.emf(id)) {
            Some(magnitude) => NodeState {
                voltage: Voltage {
                    magnitude,
                    ..node.voltage
                },
                ..node
            },
            None => node,
        }
    }

    /// Write `state` onto every point of `path`. Returns whether anything
    /// changed.
    pub fn propagate(&mut self, path: PathId, state: NodeState) -> bool {
        if self.sources.contains_key(&path) || self.isolated.contains(&path) {
            return false;
        }
        if self.nodes.get(&path) == Some(&state) {
            return false;
        }
        trace!(%path, voltage = %state.voltage, ohms = state.cumulative_resistance, "propagate");
        self.nodes.insert(path, state);
        true
    }

    /// Kill a path for the rest of the attempt. Battery paths are immune.
    pub fn isolate(&mut self, path: PathId) -> bool {
        if self.sources.contains_key(&path) {
            return false;
        }
        let newly = self.isolated.insert(path);
        let had_state = self.nodes.remove(&path).is_some();
        newly || had_state
    }

    /// Stamp the resolved state onto every point of every connection.
    ///
    /// Points on paths that never became active come out dead.
    pub fn commit(&self, connections: &mut [Connection]) {
        for conn in connections.iter_mut() {
            conn.start.clear();
            conn.end.clear();
        }

        let writes: Vec<(usize, PathId, NodeState)> = {
            let index = TopologyIndex::new(connections);
            self.nodes
                .iter()
                .filter(|(_, node)| node.is_active())
                .flat_map(|(&path, &node)| {
                    index
                        .path_peer_indices(path)
                        .iter()
                        .map(move |&idx| (idx, path, node))
                        .collect::<Vec<_>>()
                })
                .collect()
        };

        for (idx, path, node) in writes {
            connections[idx].stamp_path(path, node);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn plus(src: u64, volts: f64, ohms: f64) -> NodeState {
        NodeState::new(Voltage::driven(ElementId(src), volts, Polarity::Positive), ohms)
    }

    #[test]
    fn test_propagate_reports_change() {
        let mut table = PathTable::new();
        assert!(table.propagate(PathId(1), plus(1, 9.0, 220.0)));
        assert!(!table.propagate(PathId(1), plus(1, 9.0, 220.0)));
        assert!(table.propagate(PathId(1), plus(1, 9.0, 100.0)));
        assert_eq!(table.node(PathId(1)).cumulative_resistance, 100.0);
    }

    #[test]
    fn test_source_paths_are_pinned() {
        let mut table = PathTable::new();
        table.seed(PathId(1), ElementId(1), plus(1, 9.0, 0.0)).unwrap();
        assert!(!table.propagate(PathId(1), plus(2, 3.0, 50.0)));
        assert!(!table.isolate(PathId(1)));
        assert_eq!(table.node(PathId(1)).voltage.magnitude, 9.0);
    }

    #[test]
    fn test_first_battery_keeps_junction() {
        let mut table = PathTable::new();
        table.seed(PathId(1), ElementId(1), plus(1, 9.0, 0.0)).unwrap();
        let minus = NodeState::new(Voltage::driven(ElementId(2), 4.5, Polarity::Negative), 0.0);
        table.seed(PathId(1), ElementId(2), minus).unwrap();
        assert_eq!(table.node(PathId(1)).voltage.source_id, Some(ElementId(1)));
    }

    #[test]
    fn test_same_battery_both_poles_is_short() {
        let mut table = PathTable::new();
        table.seed(PathId(4), ElementId(1), plus(1, 9.0, 0.0)).unwrap();
        let minus = NodeState::new(Voltage::driven(ElementId(1), 9.0, Polarity::Negative), 0.0);
        assert_eq!(
            table.seed(PathId(4), ElementId(1), minus),
            Err(WiringFault::ShortCircuit {
                battery: ElementId(1),
                path: PathId(4)
            })
        );
    }

    #[test]
    fn test_supply_restores_battery_voltage() {
        let mut table = PathTable::new();
        table.seed(PathId(1), ElementId(1), plus(1, 9.0, 0.0)).unwrap();
        table.propagate(PathId(2), plus(1, 0.75, 220.0));

        let restored = table.supply(table.node(PathId(2)));
        assert_eq!(restored.voltage.magnitude, 9.0);
        assert_eq!(restored.cumulative_resistance, 220.0);
        assert_eq!(table.emf(ElementId(1)), Some(9.0));
        // unseeded sources are left alone
        assert_eq!(table.supply(plus(7, 3.0, 0.0)).voltage.magnitude, 3.0);
    }

    #[test]
    fn test_isolated_path_refuses_writes() {
        let mut table = PathTable::new();
        table.propagate(PathId(2), plus(1, 9.0, 0.0));
        assert!(table.isolate(PathId(2)));
        assert!(!table.isolate(PathId(2)));
        assert!(!table.propagate(PathId(2), plus(1, 9.0, 0.0)));
        assert!(!table.node(PathId(2)).is_active());
    }
}
