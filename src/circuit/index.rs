//! Terminal and path lookups over a connection list.

use std::collections::HashMap;

use super::graph::{Connection, Point};
use super::types::{ElementId, PathId, TerminalSide};

/// Read-only index built once per settling attempt.
#[derive(Debug)]
pub struct TopologyIndex<'a> {
    connections: &'a [Connection],
    by_terminal: HashMap<(ElementId, TerminalSide), Vec<usize>>,
    by_path: HashMap<PathId, Vec<usize>>,
}

impl<'a> TopologyIndex<'a> {
    /// Index `connections` by attached terminal and by path.
    pub fn new(connections: &'a [Connection]) -> Self {
        let mut by_terminal: HashMap<(ElementId, TerminalSide), Vec<usize>> = HashMap::new();
        let mut by_path: HashMap<PathId, Vec<usize>> = HashMap::new();

        for (idx, conn) in connections.iter().enumerate() {
            for point in [&conn.start, &conn.end] {
                if point.role.is_terminal() {
                    let entry = by_terminal
                        .entry((point.element, point.terminal_side))
                        .or_default();
                    if entry.last() != Some(&idx) {
                        entry.push(idx);
                    }
                }
                let entry = by_path.entry(point.path_id).or_default();
                if entry.last() != Some(&idx) {
                    entry.push(idx);
                }
            }
        }

        Self {
            connections,
            by_terminal,
            by_path,
        }
    }

    /// Connections attached to one terminal of an element, in list order.
    pub fn terminal_connections(
        &self,
        element: ElementId,
        side: TerminalSide,
    ) -> impl Iterator<Item = &'a Connection> + '_ {
        let connections = self.connections;
        self.by_terminal
            .get(&(element, side))
            .into_iter()
            .flatten()
            .map(move |&idx| &connections[idx])
    }

    /// Number of wires on a terminal.
    pub fn terminal_count(&self, element: ElementId, side: TerminalSide) -> usize {
        self.by_terminal
            .get(&(element, side))
            .map_or(0, Vec::len)
    }

    /// Nodes one wire away from a terminal.
    pub fn neighbours(
        &self,
        element: ElementId,
        side: TerminalSide,
    ) -> impl Iterator<Item = &'a Point> + '_ {
        self.terminal_connections(element, side)
            .filter_map(move |conn| conn.other_endpoint(element))
    }

    /// Path ids carried by a terminal's own points.
    pub fn terminal_paths(&self, element: ElementId, side: TerminalSide) -> Vec<PathId> {
        let mut paths: Vec<PathId> = self
            .terminal_connections(element, side)
            .filter_map(|conn| conn.terminal_point(element))
            .map(|p| p.path_id)
            .collect();
        paths.dedup();
        paths
    }

    /// Every connection with an endpoint on `path`.
    pub fn path_peers(&self, path: PathId) -> impl Iterator<Item = &'a Connection> + '_ {
        let connections = self.connections;
        self.path_peer_indices(path)
            .iter()
            .map(move |&idx| &connections[idx])
    }

    /// Positions in the connection list of every connection on `path`.
    pub fn path_peer_indices(&self, path: PathId) -> &[usize] {
        self.by_path.get(&path).map_or(&[], Vec::as_slice)
    }

    /// Number of distinct paths.
    pub fn path_count(&self) -> usize {
        self.by_path.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::circuit::{PointRole, Position};

    fn point(element: u64, side: TerminalSide, role: PointRole, path: u64) -> Point {
        Point::new(
            ElementId(element),
            side,
            role,
            PathId(path),
            Position::default(),
        )
    }

    #[test]
    fn test_terminal_lookup_skips_waypoints() {
        let conns = vec![
            Connection::new(
                point(1, TerminalSide::Right, PointRole::Start, 10),
                point(1, TerminalSide::Right, PointRole::Waypoint, 10),
            ),
            Connection::new(
                point(1, TerminalSide::Right, PointRole::Waypoint, 10),
                point(2, TerminalSide::Left, PointRole::End, 10),
            ),
        ];
        let index = TopologyIndex::new(&conns);

        assert_eq!(index.terminal_count(ElementId(1), TerminalSide::Right), 1);
        assert_eq!(index.terminal_count(ElementId(2), TerminalSide::Left), 1);
        assert_eq!(index.terminal_count(ElementId(2), TerminalSide::Right), 0);

        let near: Vec<_> = index.neighbours(ElementId(2), TerminalSide::Left).collect();
        assert_eq!(near.len(), 1);
        assert_eq!(near[0].role, PointRole::Waypoint);
        assert_eq!(near[0].path_id, PathId(10));
    }

    #[test]
    fn test_path_peers() {
        let conns = vec![
            Connection::new(
                point(1, TerminalSide::Right, PointRole::Start, 10),
                point(2, TerminalSide::Left, PointRole::End, 10),
            ),
            Connection::new(
                point(2, TerminalSide::Right, PointRole::Start, 11),
                point(3, TerminalSide::Left, PointRole::End, 11),
            ),
            Connection::new(
                point(1, TerminalSide::Right, PointRole::Start, 10),
                point(3, TerminalSide::Right, PointRole::End, 10),
            ),
        ];
        let index = TopologyIndex::new(&conns);

        assert_eq!(index.path_peer_indices(PathId(10)), &[0, 2]);
        assert_eq!(index.path_peers(PathId(11)).count(), 1);
        assert_eq!(index.path_peers(PathId(99)).count(), 0);
        assert_eq!(index.path_count(), 2);
        assert_eq!(
            index.terminal_paths(ElementId(1), TerminalSide::Right),
            vec![PathId(10)]
        );
    }
}
