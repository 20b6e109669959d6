//! Breadboard topology.
//!
//! A board is a flat list of placed [`Element`]s and undirected wire
//! segments ([`Connection`]) between [`Point`]s. Every point carrying the
//! same [`PathId`] is one electrical node; [`TopologyIndex`] answers the
//! terminal and path queries the solver needs.

mod graph;
mod index;
mod types;
mod validate;

pub use graph::{
    path_states, Bench, Breadboard, Connection, Element, Point, TERMINAL_DROP, TERMINAL_SPAN,
};
pub use index::TopologyIndex;
pub use types::*;
pub use validate::{check_topology, prune_dangling};

pub use crate::components::ElementKind;
