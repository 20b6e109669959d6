//! Topology checks run before relaxation.

use std::collections::HashSet;

use tracing::debug;

use super::graph::{Connection, Element};
use super::index::TopologyIndex;
use super::types::{ElementId, TerminalSide};
use crate::components::ElementKind;
use crate::error::WiringFault;

/// Drop connections whose points reference elements that no longer exist.
pub fn prune_dangling(elements: &[Element], connections: &[Connection]) -> Vec<Connection> {
    let known: HashSet<ElementId> = elements.iter().map(|e| e.id).collect();
    let kept: Vec<Connection> = connections
        .iter()
        .filter(|c| known.contains(&c.start.element) && known.contains(&c.end.element))
        .cloned()
        .collect();

    let dropped = connections.len() - kept.len();
    if dropped > 0 {
        debug!(dropped, "pruned connections to removed elements");
    }
    kept
}

/// Reject wiring no settling pass could make sense of.
///
/// Checks per-terminal wire limits and wires that loop from one terminal
/// of an element back to its other terminal. Batteries are exempt from the
/// loop check; a shorted battery is reported while injecting sources.
pub fn check_topology(elements: &[Element], index: &TopologyIndex<'_>) -> Result<(), WiringFault> {
    for element in elements {
        let kind = element.kind();

        if let Some(limit) = kind.terminal_limit() {
            for side in [TerminalSide::Left, TerminalSide::Right] {
                let count = index.terminal_count(element.id, side);
                if count > limit {
                    return Err(WiringFault::OverConnected {
                        element: element.id,
                        kind,
                        side,
                        count,
                        limit,
                    });
                }
            }
        }

        if kind == ElementKind::Battery {
            continue;
        }
        let left: HashSet<_> = index
            .neighbours(element.id, TerminalSide::Left)
            .map(|p| p.path_id)
            .collect();
        if let Some(point) = index
            .neighbours(element.id, TerminalSide::Right)
            .find(|p| left.contains(&p.path_id))
        {
            return Err(WiringFault::SelfLoop {
                element: element.id,
                kind,
                path: point.path_id,
            });
        }
    }
    Ok(())
}
