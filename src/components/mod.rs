//! Component models and their transfer rules.
//!
//! This module provides the state of every supported breadboard part and
//! the local rule each one applies during a relaxation pass:
//! - Sources: Battery (seeds node state)
//! - Controls: Switch, Potentiometer
//! - Linear: Resistor, Capacitor
//! - Semiconductors: LED, Diode
//! - Meters: Voltmeter, Ammeter
//!
//! A rule only looks at the nodes one wire away from the element's two
//! terminals and writes through [`RuleContext`].

mod controls;
mod diode;
mod linear;
mod meters;
mod sources;

pub use controls::{SwitchState, POTENTIOMETER_MAX_OHMS};
pub use diode::{DiodeState, LedParams, LedState};
pub use linear::{CapacitorState, ResistiveState};
pub use meters::{across, MeterReading};
pub use sources::{inject_sources, SourceState};

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::circuit::{ElementId, PathId, TerminalSide, TopologyIndex};
use crate::dsl::ElementDef;
use crate::error::{BreadboardError, Result, WiringFault};
use crate::solver::{NodeState, PathTable, SettleConfig};

/// Kinds of placeable element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ElementKind {
    Battery,
    Switch,
    Resistor,
    Potentiometer,
    Led,
    Capacitor,
    Diode,
    Voltmeter,
    Ammeter,
}

impl ElementKind {
    /// Parse a kind from a bench description keyword.
    pub fn from_keyword(keyword: &str) -> Option<Self> {
        match keyword.to_ascii_uppercase().as_str() {
            "BAT" | "BATTERY" => Some(Self::Battery),
            "SW" | "SWITCH" => Some(Self::Switch),
            "RES" | "RESISTOR" => Some(Self::Resistor),
            "POT" | "POTENTIOMETER" => Some(Self::Potentiometer),
            "LED" => Some(Self::Led),
            "CAP" | "CAPACITOR" => Some(Self::Capacitor),
            "DIODE" => Some(Self::Diode),
            "VM" | "VOLTMETER" => Some(Self::Voltmeter),
            "AM" | "AMMETER" => Some(Self::Ammeter),
            _ => None,
        }
    }

    /// Maximum wires per terminal, if limited.
    pub fn terminal_limit(&self) -> Option<usize> {
        match self {
            Self::Resistor | Self::Potentiometer | Self::Voltmeter | Self::Ammeter => Some(1),
            _ => None,
        }
    }
}

impl fmt::Display for ElementKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Battery => "battery",
            Self::Switch => "switch",
            Self::Resistor => "resistor",
            Self::Potentiometer => "potentiometer",
            Self::Led => "LED",
            Self::Capacitor => "capacitor",
            Self::Diode => "diode",
            Self::Voltmeter => "voltmeter",
            Self::Ammeter => "ammeter",
        };
        f.write_str(name)
    }
}

/// Per-kind element state, tagged on the wire by `type`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Component {
    #[serde(rename = "battery")]
    Battery(SourceState),
    #[serde(rename = "switcher", alias = "switch")]
    Switch(SwitchState),
    #[serde(rename = "rezistor", alias = "resistor")]
    Resistor(ResistiveState),
    #[serde(rename = "potentiometer")]
    Potentiometer(ResistiveState),
    #[serde(rename = "led")]
    Led(LedState),
    #[serde(rename = "capacitor")]
    Capacitor(CapacitorState),
    #[serde(rename = "diod", alias = "diode")]
    Diode(DiodeState),
    #[serde(rename = "voltmetr", alias = "voltmeter")]
    Voltmeter(MeterReading),
    #[serde(rename = "ammetr", alias = "ammeter")]
    Ammeter(MeterReading),
}

/// Order in which rule groups run inside one relaxation pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum RuleStage {
    Switch,
    Led,
    Resistive,
    Diode,
    Capacitor,
    Voltmeter,
    Ammeter,
}

impl RuleStage {
    pub const ORDER: [RuleStage; 7] = [
        RuleStage::Switch,
        RuleStage::Led,
        RuleStage::Resistive,
        RuleStage::Diode,
        RuleStage::Capacitor,
        RuleStage::Voltmeter,
        RuleStage::Ammeter,
    ];
}

impl Component {
    /// Create a component from a bench description definition.
    pub fn from_def(def: &ElementDef) -> Result<Self> {
        let value = match def.value {
            Some(v) if !v.is_finite() || v < 0.0 => {
                return Err(BreadboardError::invalid_parameter(
                    &def.name,
                    "value",
                    "must be a non-negative number",
                ));
            }
            other => other,
        };

        let component = match def.kind {
            ElementKind::Battery => {
                Component::Battery(SourceState::new(value.unwrap_or(SourceState::DEFAULT_VOLTS)))
            }
            ElementKind::Switch => {
                let closed = def.params.get("state").map(|v| *v > 0.5).unwrap_or(false);
                Component::Switch(SwitchState::new(closed))
            }
            ElementKind::Resistor => Component::Resistor(ResistiveState::new(
                value.unwrap_or(ResistiveState::DEFAULT_OHMS),
            )),
            ElementKind::Potentiometer => {
                let ohms = value.unwrap_or(ResistiveState::DEFAULT_OHMS);
                if ohms > POTENTIOMETER_MAX_OHMS {
                    return Err(BreadboardError::invalid_parameter(
                        &def.name,
                        "value",
                        format!("potentiometer range is 0..{POTENTIOMETER_MAX_OHMS} ohms"),
                    ));
                }
                Component::Potentiometer(ResistiveState::potentiometer(ohms))
            }
            ElementKind::Led => {
                Component::Led(LedState::new(value.unwrap_or(LedState::DEFAULT_RESISTANCE)))
            }
            ElementKind::Capacitor => Component::Capacitor(CapacitorState::new(
                value.unwrap_or(CapacitorState::DEFAULT_FARADS),
            )),
            ElementKind::Diode => Component::Diode(DiodeState::new(value.unwrap_or(0.0))),
            ElementKind::Voltmeter | ElementKind::Ammeter => {
                if value.is_some() {
                    return Err(BreadboardError::invalid_parameter(
                        &def.name,
                        "value",
                        "meters take no value",
                    ));
                }
                if def.kind == ElementKind::Voltmeter {
                    Component::Voltmeter(MeterReading::default())
                } else {
                    Component::Ammeter(MeterReading::default())
                }
            }
        };
        Ok(component)
    }

    pub fn kind(&self) -> ElementKind {
        match self {
            Component::Battery(_) => ElementKind::Battery,
            Component::Switch(_) => ElementKind::Switch,
            Component::Resistor(_) => ElementKind::Resistor,
            Component::Potentiometer(_) => ElementKind::Potentiometer,
            Component::Led(_) => ElementKind::Led,
            Component::Capacitor(_) => ElementKind::Capacitor,
            Component::Diode(_) => ElementKind::Diode,
            Component::Voltmeter(_) => ElementKind::Voltmeter,
            Component::Ammeter(_) => ElementKind::Ammeter,
        }
    }

    /// Own series resistance in ohms.
    pub fn resistance(&self) -> f64 {
        match self {
            Component::Resistor(r) | Component::Potentiometer(r) => r.ohms,
            Component::Led(led) => led.resistance,
            Component::Diode(d) => d.resistance,
            _ => 0.0,
        }
    }

    /// Boolean readout shown by the host.
    pub fn is_on(&self) -> bool {
        match self {
            Component::Battery(b) => b.voltage > 0.0,
            Component::Switch(sw) => sw.closed,
            Component::Led(led) => led.lit,
            Component::Diode(d) => d.conducting,
            Component::Voltmeter(m) | Component::Ammeter(m) => m.value != 0.0,
            Component::Resistor(_) | Component::Potentiometer(_) | Component::Capacitor(_) => false,
        }
    }

    /// Numeric readout of meters and capacitors.
    pub fn reading(&self) -> Option<f64> {
        match self {
            Component::Voltmeter(m) | Component::Ammeter(m) => Some(m.value),
            Component::Capacitor(c) => Some(c.voltage),
            _ => None,
        }
    }

    /// Rule group this component runs in; `None` for sources.
    pub fn stage(&self) -> Option<RuleStage> {
        match self {
            Component::Battery(_) => None,
            Component::Switch(_) => Some(RuleStage::Switch),
            Component::Led(_) => Some(RuleStage::Led),
            Component::Resistor(_) | Component::Potentiometer(_) => Some(RuleStage::Resistive),
            Component::Diode(_) => Some(RuleStage::Diode),
            Component::Capacitor(_) => Some(RuleStage::Capacitor),
            Component::Voltmeter(_) => Some(RuleStage::Voltmeter),
            Component::Ammeter(_) => Some(RuleStage::Ammeter),
        }
    }

    /// Apply this component's transfer rule once.
    pub fn apply(&mut self, id: ElementId, ctx: &mut RuleContext<'_>) -> std::result::Result<(), WiringFault> {
        match self {
            Component::Battery(_) => Ok(()),
            Component::Switch(sw) => sw.apply(id, ctx),
            Component::Resistor(r) => r.apply(id, ElementKind::Resistor, ctx),
            Component::Potentiometer(p) => p.apply(id, ElementKind::Potentiometer, ctx),
            Component::Led(led) => {
                led.apply(id, ctx);
                Ok(())
            }
            Component::Diode(d) => {
                d.apply(id, ctx);
                Ok(())
            }
            Component::Capacitor(c) => {
                c.apply(id, ctx);
                Ok(())
            }
            Component::Voltmeter(m) => {
                m.apply_voltmeter(id, ctx);
                Ok(())
            }
            Component::Ammeter(m) => m.apply_ammeter(id, ctx),
        }
    }
}

/// A node one wire away from a terminal.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Neighbour {
    pub path: PathId,
    pub node: NodeState,
}

impl Neighbour {
    pub fn is_active(&self) -> bool {
        self.node.is_active()
    }
}

/// What a rule may see and touch during a pass.
pub struct RuleContext<'a> {
    index: &'a TopologyIndex<'a>,
    nodes: &'a mut PathTable,
    config: &'a SettleConfig,
}

impl<'a> RuleContext<'a> {
    pub fn new(index: &'a TopologyIndex<'a>, nodes: &'a mut PathTable, config: &'a SettleConfig) -> Self {
        Self {
            index,
            nodes,
            config,
        }
    }

    pub fn config(&self) -> &SettleConfig {
        self.config
    }

    /// `node` as driven by the full voltage of its battery.
    pub fn supply(&self, node: NodeState) -> NodeState {
        self.nodes.supply(node)
    }

    /// Every node wired to one terminal, in connection order.
    pub fn neighbours(&self, element: ElementId, side: TerminalSide) -> Vec<Neighbour> {
        self.index
            .neighbours(element, side)
            .map(|p| Neighbour {
                path: p.path_id,
                node: self.nodes.node(p.path_id),
            })
            .collect()
    }

    /// The first active node wired to a terminal.
    pub fn first_active(&self, element: ElementId, side: TerminalSide) -> Option<Neighbour> {
        self.index
            .neighbours(element, side)
            .map(|p| Neighbour {
                path: p.path_id,
                node: self.nodes.node(p.path_id),
            })
            .find(Neighbour::is_active)
    }

    /// The node on a single-wire terminal, active or not.
    pub fn single(&self, element: ElementId, side: TerminalSide) -> Option<Neighbour> {
        self.index.neighbours(element, side).next().map(|p| Neighbour {
            path: p.path_id,
            node: self.nodes.node(p.path_id),
        })
    }

    /// Write `node` onto every node wired to a terminal.
    pub fn drive(&mut self, element: ElementId, side: TerminalSide, node: NodeState) -> bool {
        let paths: Vec<PathId> = self.index.neighbours(element, side).map(|p| p.path_id).collect();
        let mut changed = false;
        for path in paths {
            changed |= self.nodes.propagate(path, node);
        }
        changed
    }

    /// Write `node` onto the unpowered nodes wired to a terminal.
    pub fn fill(&mut self, element: ElementId, side: TerminalSide, node: NodeState) -> bool {
        let idle: Vec<PathId> = self
            .neighbours(element, side)
            .into_iter()
            .filter(|n| !n.is_active())
            .map(|n| n.path)
            .collect();
        let mut changed = false;
        for path in idle {
            changed |= self.nodes.propagate(path, node);
        }
        changed
    }

    /// Write `node` onto one path.
    pub fn propagate(&mut self, path: PathId, node: NodeState) -> bool {
        self.nodes.propagate(path, node)
    }

    /// Kill every node wired to a terminal.
    pub fn isolate(&mut self, element: ElementId, side: TerminalSide) -> bool {
        let paths: Vec<PathId> = self.index.neighbours(element, side).map(|p| p.path_id).collect();
        let mut changed = false;
        for path in paths {
            changed |= self.nodes.isolate(path);
        }
        changed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn def(kind: ElementKind, value: Option<f64>) -> ElementDef {
        ElementDef {
            kind,
            name: "X1".to_string(),
            value,
            params: HashMap::new(),
            line: 1,
        }
    }

    #[test]
    fn test_defaults_from_def() {
        let bat = Component::from_def(&def(ElementKind::Battery, None)).unwrap();
        assert_eq!(bat, Component::Battery(SourceState::new(9.0)));

        let res = Component::from_def(&def(ElementKind::Resistor, None)).unwrap();
        assert_eq!(res.resistance(), 220.0);

        let led = Component::from_def(&def(ElementKind::Led, None)).unwrap();
        assert_eq!(led.resistance(), 20.0);

        let sw = Component::from_def(&def(ElementKind::Switch, None)).unwrap();
        assert!(!sw.is_on());
    }

    #[test]
    fn test_invalid_values_rejected() {
        assert!(Component::from_def(&def(ElementKind::Resistor, Some(-5.0))).is_err());
        assert!(Component::from_def(&def(ElementKind::Potentiometer, Some(20_000.0))).is_err());
        assert!(Component::from_def(&def(ElementKind::Voltmeter, Some(3.0))).is_err());
    }

    #[test]
    fn test_stage_order() {
        assert!(RuleStage::Switch < RuleStage::Led);
        assert!(RuleStage::Led < RuleStage::Resistive);
        assert!(RuleStage::Voltmeter < RuleStage::Ammeter);
        assert_eq!(Component::Battery(SourceState::default()).stage(), None);
    }

    #[test]
    fn test_terminal_limits() {
        assert_eq!(ElementKind::Resistor.terminal_limit(), Some(1));
        assert_eq!(ElementKind::Ammeter.terminal_limit(), Some(1));
        assert_eq!(ElementKind::Led.terminal_limit(), None);
        assert_eq!(ElementKind::Battery.terminal_limit(), None);
    }
}
