//! Breadboard graph structure.

use std::collections::{BTreeMap, HashMap, HashSet};

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::types::{ElementId, PathId, PointRole, Position, TerminalSide, Voltage};
use crate::components::{Component, ElementKind, ResistiveState};
use crate::dsl::BenchAst;
use crate::error::{BreadboardError, Result};
use crate::solver::NodeState;

/// Horizontal distance between an element's left and right terminals.
pub const TERMINAL_SPAN: f64 = 100.0;

/// Vertical offset of both terminals below the element origin.
pub const TERMINAL_DROP: f64 = 50.0;

/// One electrical terminal instance: either on a component terminal or a
/// free bend of a wire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Point {
    /// Owning element (for waypoints, the element the wire was drawn from)
    #[serde(rename = "id")]
    pub element: ElementId,
    pub terminal_side: TerminalSide,
    pub role: PointRole,
    pub path_id: PathId,
    #[serde(flatten)]
    pub position: Position,
    #[serde(default)]
    pub is_active: bool,
    #[serde(default)]
    pub current_voltage: Voltage,
    #[serde(default)]
    pub cumulative_resistance: f64,
}

impl Point {
    /// Create an unresolved point.
    pub fn new(
        element: ElementId,
        terminal_side: TerminalSide,
        role: PointRole,
        path_id: PathId,
        position: Position,
    ) -> Self {
        Self {
            element,
            terminal_side,
            role,
            path_id,
            position,
            is_active: false,
            current_voltage: Voltage::NONE,
            cumulative_resistance: 0.0,
        }
    }

    /// Whether this point sits on a terminal of `element`.
    pub fn is_terminal_of(&self, element: ElementId) -> bool {
        self.role.is_terminal() && self.element == element
    }

    /// The resolved state carried by this point.
    pub fn node(&self) -> NodeState {
        NodeState::new(self.current_voltage, self.cumulative_resistance)
    }

    pub(crate) fn stamp(&mut self, node: NodeState) {
        self.current_voltage = node.voltage;
        self.is_active = node.is_active();
        self.cumulative_resistance = node.cumulative_resistance;
    }

    pub(crate) fn clear(&mut self) {
        self.stamp(NodeState::default());
    }
}

/// An undirected wire segment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Connection {
    pub start: Point,
    pub end: Point,
}

impl Connection {
    /// Create a new wire segment.
    pub fn new(start: Point, end: Point) -> Self {
        Self { start, end }
    }

    /// The point of this segment attached to a terminal of `element`.
    pub fn terminal_point(&self, element: ElementId) -> Option<&Point> {
        if self.start.is_terminal_of(element) {
            Some(&self.start)
        } else if self.end.is_terminal_of(element) {
            Some(&self.end)
        } else {
            None
        }
    }

    /// The node across this segment from `element`'s terminal.
    pub fn other_endpoint(&self, element: ElementId) -> Option<&Point> {
        if self.start.is_terminal_of(element) {
            Some(&self.end)
        } else if self.end.is_terminal_of(element) {
            Some(&self.start)
        } else {
            None
        }
    }

    /// Whether any point of this segment belongs to `element`.
    pub fn touches(&self, element: ElementId) -> bool {
        self.start.element == element || self.end.element == element
    }

    /// Whether either endpoint carries `path`.
    pub fn carries(&self, path: PathId) -> bool {
        self.start.path_id == path || self.end.path_id == path
    }

    /// Write `node` onto every endpoint that carries `path`.
    pub(crate) fn stamp_path(&mut self, path: PathId, node: NodeState) {
        if self.start.path_id == path {
            self.start.stamp(node);
        }
        if self.end.path_id == path {
            self.end.stamp(node);
        }
    }
}

/// A placed component.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Element {
    pub id: ElementId,
    #[serde(flatten)]
    pub position: Position,
    #[serde(flatten)]
    pub component: Component,
}

impl Element {
    /// Create an element at the canvas origin.
    pub fn new(id: ElementId, component: Component) -> Self {
        Self {
            id,
            position: Position::default(),
            component,
        }
    }

    /// Place the element at `position`.
    pub fn at(mut self, position: Position) -> Self {
        self.position = position;
        self
    }

    pub fn kind(&self) -> ElementKind {
        self.component.kind()
    }

    /// Own series resistance of the element in ohms.
    pub fn resistance(&self) -> f64 {
        self.component.resistance()
    }

    /// On/off readout: closed switch, lit LED, conducting diode,
    /// charged battery or a meter showing a non-zero value.
    pub fn is_on(&self) -> bool {
        self.component.is_on()
    }

    /// Numeric readout of meters and capacitors.
    pub fn reading(&self) -> Option<f64> {
        self.component.reading()
    }

    pub fn brightness(&self) -> f64 {
        match &self.component {
            Component::Led(led) => led.brightness,
            _ => 0.0,
        }
    }

    pub fn is_burned(&self) -> bool {
        matches!(&self.component, Component::Led(led) if led.burned)
    }

    /// Side a switch last drove current out of.
    pub fn out(&self) -> Option<TerminalSide> {
        match &self.component {
            Component::Switch(sw) => sw.out,
            _ => None,
        }
    }

    /// Canvas position of a terminal.
    pub fn terminal_position(&self, side: TerminalSide) -> Position {
        let x = match side {
            TerminalSide::Left => self.position.x,
            TerminalSide::Right => self.position.x + TERMINAL_SPAN,
        };
        Position::new(x, self.position.y + TERMINAL_DROP)
    }
}

/// A board built from a bench description, with the declared names.
#[derive(Debug, Clone)]
pub struct Bench {
    pub board: Breadboard,
    names: Vec<(String, ElementId)>,
}

impl Bench {
    /// Look up an element id by its declared name.
    pub fn id_of(&self, name: &str) -> Option<ElementId> {
        self.names
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, id)| *id)
    }

    /// Declared name of an element.
    pub fn name_of(&self, id: ElementId) -> Option<&str> {
        self.names
            .iter()
            .find(|(_, i)| *i == id)
            .map(|(n, _)| n.as_str())
    }

    /// All declared names in declaration order.
    pub fn names(&self) -> impl Iterator<Item = (&str, ElementId)> {
        self.names.iter().map(|(n, id)| (n.as_str(), *id))
    }
}

/// A complete topology snapshot: the unit exchanged with the host.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Breadboard {
    /// Placed elements
    pub elements: Vec<Element>,
    /// Wire segments in creation order (last = most recent)
    pub connections: Vec<Connection>,
}

impl Breadboard {
    /// Create an empty board.
    pub fn new() -> Self {
        Self::default()
    }

    /// Wrap an existing snapshot.
    pub fn from_parts(elements: Vec<Element>, connections: Vec<Connection>) -> Self {
        Self {
            elements,
            connections,
        }
    }

    /// Build a board from a parsed bench description.
    ///
    /// Elements get ids in declaration order starting at 1; every wire gets
    /// a fresh path id.
    pub fn from_ast(ast: BenchAst) -> Result<Bench> {
        let mut board = Breadboard::new();
        let mut names: Vec<(String, ElementId)> = Vec::with_capacity(ast.elements.len());
        let mut by_name: HashMap<String, ElementId> = HashMap::new();

        for def in &ast.elements {
            let key = def.name.to_ascii_uppercase();
            if by_name.contains_key(&key) {
                return Err(BreadboardError::DuplicateElement {
                    name: def.name.clone(),
                });
            }
            let component = Component::from_def(def)?;
            let id = board.add_element(component, def.position());
            by_name.insert(key, id);
            names.push((def.name.clone(), id));
        }

        for wire in &ast.wires {
            let resolve = |name: &str| {
                by_name
                    .get(&name.to_ascii_uppercase())
                    .copied()
                    .ok_or_else(|| BreadboardError::UndeclaredElement {
                        name: name.to_string(),
                        line: wire.line,
                    })
            };
            let from = resolve(&wire.from.element)?;
            let to = resolve(&wire.to.element)?;
            board.add_wire((from, wire.from.side), &wire.waypoints, (to, wire.to.side))?;
        }

        Ok(Bench { board, names })
    }

    /// Find an element by id.
    pub fn element(&self, id: ElementId) -> Option<&Element> {
        self.elements.iter().find(|e| e.id == id)
    }

    fn element_mut(&mut self, id: ElementId) -> Result<&mut Element> {
        self.elements
            .iter_mut()
            .find(|e| e.id == id)
            .ok_or(BreadboardError::ElementNotFound { id })
    }

    /// Place a new element and return its id.
    pub fn add_element(&mut self, component: Component, position: Position) -> ElementId {
        let id = ElementId(self.elements.iter().map(|e| e.id.0).max().unwrap_or(0) + 1);
        self.elements.push(Element::new(id, component).at(position));
        id
    }

    /// Remove an element together with every wire whose path touches it.
    pub fn remove_element(&mut self, id: ElementId) -> Result<Element> {
        let idx = self
            .elements
            .iter()
            .position(|e| e.id == id)
            .ok_or(BreadboardError::ElementNotFound { id })?;
        let element = self.elements.remove(idx);

        let doomed: HashSet<PathId> = self
            .connections
            .iter()
            .filter(|c| c.touches(id))
            .flat_map(|c| [c.start.path_id, c.end.path_id])
            .collect();
        let before = self.connections.len();
        self.connections
            .retain(|c| !doomed.contains(&c.start.path_id) && !doomed.contains(&c.end.path_id));
        debug!(
            element = %id,
            removed = before - self.connections.len(),
            "removed element and its wires"
        );

        Ok(element)
    }

    /// Allocate a path id not used by any existing point.
    pub fn next_path_id(&self) -> PathId {
        let max = self
            .connections
            .iter()
            .flat_map(|c| [c.start.path_id.0, c.end.path_id.0])
            .max()
            .unwrap_or(0);
        PathId(max + 1)
    }

    /// Draw a wire from one terminal through optional bends to another.
    ///
    /// All segments share one fresh path id; bends carry the starting
    /// element's id and side.
    pub fn add_wire(
        &mut self,
        from: (ElementId, TerminalSide),
        waypoints: &[Position],
        to: (ElementId, TerminalSide),
    ) -> Result<PathId> {
        if from.0 == to.0 {
            return Err(BreadboardError::DegenerateWire { id: from.0 });
        }
        let start_pos = self
            .element(from.0)
            .ok_or(BreadboardError::ElementNotFound { id: from.0 })?
            .terminal_position(from.1);
        let end_pos = self
            .element(to.0)
            .ok_or(BreadboardError::ElementNotFound { id: to.0 })?
            .terminal_position(to.1);

        let path = self.next_path_id();
        let mut previous = Point::new(from.0, from.1, PointRole::Start, path, start_pos);
        for &bend in waypoints {
            let point = Point::new(from.0, from.1, PointRole::Waypoint, path, bend);
            self.connections
                .push(Connection::new(previous, point.clone()));
            previous = point;
        }
        let end = Point::new(to.0, to.1, PointRole::End, path, end_pos);
        self.connections.push(Connection::new(previous, end));

        Ok(path)
    }

    /// Delete one drawn wire. Returns the number of segments removed.
    pub fn remove_path(&mut self, path: PathId) -> usize {
        let before = self.connections.len();
        self.connections.retain(|c| !c.carries(path));
        before - self.connections.len()
    }

    /// Open or close a switch.
    pub fn set_switch(&mut self, id: ElementId, closed: bool) -> Result<()> {
        let element = self.element_mut(id)?;
        match &mut element.component {
            Component::Switch(sw) => {
                sw.closed = closed;
                Ok(())
            }
            other => Err(wrong_kind(id, other.kind(), "switch")),
        }
    }

    /// Flip a switch and return its new state.
    pub fn toggle_switch(&mut self, id: ElementId) -> Result<bool> {
        let closed = match self.element(id).map(|e| &e.component) {
            Some(Component::Switch(sw)) => !sw.closed,
            Some(other) => return Err(wrong_kind(id, other.kind(), "switch")),
            None => return Err(BreadboardError::ElementNotFound { id }),
        };
        self.set_switch(id, closed)?;
        Ok(closed)
    }

    /// Set a battery's voltage.
    pub fn set_voltage(&mut self, id: ElementId, volts: f64) -> Result<()> {
        let element = self.element_mut(id)?;
        match &mut element.component {
            Component::Battery(battery) => {
                battery.voltage = volts.max(0.0);
                Ok(())
            }
            other => Err(wrong_kind(id, other.kind(), "battery")),
        }
    }

    /// Set the resistance of a resistor, potentiometer, LED or diode.
    pub fn set_resistance(&mut self, id: ElementId, ohms: f64) -> Result<()> {
        let element = self.element_mut(id)?;
        match &mut element.component {
            Component::Resistor(r) => *r = ResistiveState::new(ohms),
            Component::Potentiometer(p) => *p = ResistiveState::potentiometer(ohms),
            Component::Led(led) => led.resistance = ohms.max(0.0),
            Component::Diode(diode) => diode.resistance = ohms.max(0.0),
            other => return Err(wrong_kind(id, other.kind(), "resistive element")),
        }
        Ok(())
    }

    /// Set a capacitor's capacitance in farads.
    pub fn set_capacitance(&mut self, id: ElementId, farads: f64) -> Result<()> {
        let element = self.element_mut(id)?;
        match &mut element.component {
            Component::Capacitor(cap) => {
                cap.capacitance = farads.max(0.0);
                Ok(())
            }
            other => Err(wrong_kind(id, other.kind(), "capacitor")),
        }
    }

    /// Resolved state of every path, as stamped on the points.
    pub fn path_states(&self) -> BTreeMap<PathId, NodeState> {
        path_states(&self.connections)
    }
}

/// Resolved state of every path across a connection list.
pub fn path_states(connections: &[Connection]) -> BTreeMap<PathId, NodeState> {
    connections
        .iter()
        .flat_map(|c| [&c.start, &c.end])
        .map(|p| (p.path_id, p.node()))
        .collect()
}

fn wrong_kind(id: ElementId, kind: ElementKind, expected: &'static str) -> BreadboardError {
    BreadboardError::WrongElementKind { id, kind, expected }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::{LedState, SourceState, SwitchState};

    fn two_element_board() -> (Breadboard, ElementId, ElementId) {
        let mut board = Breadboard::new();
        let bat = board.add_element(
            Component::Battery(SourceState::default()),
            Position::new(0.0, 0.0),
        );
        let led = board.add_element(
            Component::Led(LedState::default()),
            Position::new(200.0, 0.0),
        );
        (board, bat, led)
    }

    #[test]
    fn test_add_wire_with_bends_shares_one_path() {
        let (mut board, bat, led) = two_element_board();
        let bends = [Position::new(50.0, 120.0), Position::new(250.0, 120.0)];
        let path = board
            .add_wire((bat, TerminalSide::Right), &bends, (led, TerminalSide::Left))
            .unwrap();

        assert_eq!(board.connections.len(), 3);
        assert!(board.connections.iter().all(|c| c.carries(path)));
        assert_eq!(board.connections[0].start.role, PointRole::Start);
        assert_eq!(board.connections[1].start.role, PointRole::Waypoint);
        assert_eq!(board.connections[1].start.element, bat);
        assert_eq!(board.connections[2].end.role, PointRole::End);
        assert_eq!(board.connections[2].end.position, Position::new(200.0, 50.0));
    }

    #[test]
    fn test_other_endpoint_ignores_waypoints() {
        let (mut board, bat, led) = two_element_board();
        board
            .add_wire(
                (bat, TerminalSide::Right),
                &[Position::new(10.0, 10.0)],
                (led, TerminalSide::Left),
            )
            .unwrap();

        let first = &board.connections[0];
        assert_eq!(first.other_endpoint(bat).map(|p| p.role), Some(PointRole::Waypoint));
        // the bend carries the battery's id but is not one of its terminals
        let second = &board.connections[1];
        assert_eq!(second.other_endpoint(bat), None);
        assert_eq!(second.other_endpoint(led).map(|p| p.element), Some(bat));
    }

    #[test]
    fn test_remove_element_cascades_to_wires() {
        let (mut board, bat, led) = two_element_board();
        let sw = board.add_element(
            Component::Switch(SwitchState::default()),
            Position::new(400.0, 0.0),
        );
        board
            .add_wire((bat, TerminalSide::Right), &[Position::new(1.0, 1.0)], (led, TerminalSide::Left))
            .unwrap();
        let keep = board
            .add_wire((bat, TerminalSide::Left), &[], (sw, TerminalSide::Left))
            .unwrap();

        board.remove_element(led).unwrap();
        assert_eq!(board.elements.len(), 2);
        assert_eq!(board.connections.len(), 1);
        assert!(board.connections[0].carries(keep));
    }

    #[test]
    fn test_degenerate_wire_rejected() {
        let (mut board, bat, _) = two_element_board();
        let err = board
            .add_wire((bat, TerminalSide::Left), &[], (bat, TerminalSide::Right))
            .unwrap_err();
        assert!(matches!(err, BreadboardError::DegenerateWire { .. }));
    }

    #[test]
    fn test_toggle_switch_and_wrong_kind() {
        let (mut board, bat, _) = two_element_board();
        let sw = board.add_element(Component::Switch(SwitchState::default()), Position::default());
        assert!(board.toggle_switch(sw).unwrap());
        assert!(!board.toggle_switch(sw).unwrap());
        assert!(matches!(
            board.toggle_switch(bat),
            Err(BreadboardError::WrongElementKind { .. })
        ));
    }

    #[test]
    fn test_element_json_uses_host_tags() {
        let element = Element::new(ElementId(3), Component::Battery(SourceState::new(4.5)))
            .at(Position::new(10.0, 20.0));
        let json = serde_json::to_value(&element).unwrap();
        assert_eq!(json["type"], "battery");
        assert_eq!(json["voltage"], 4.5);
        assert_eq!(json["x"], 10.0);

        let back: Element = serde_json::from_value(json).unwrap();
        assert_eq!(back, element);
    }
}
