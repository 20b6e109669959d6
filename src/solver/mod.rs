//! Circuit state propagation.
//!
//! Settling a board runs in three layers:
//!
//! 1. [`PathTable`] holds one [`NodeState`] per path. Writing a path writes
//!    the node every point on that path belongs to.
//! 2. Relaxation seeds the battery terminals, then applies every
//!    component's local rule in a fixed order, pass after pass, until a
//!    pass changes neither a node nor an element.
//! 3. [`Settler`] wraps relaxation with topology checks and recovery: a
//!    wiring fault rolls back the newest connection and settles again.

mod propagate;
mod relax;
mod settle;

pub use propagate::{NodeState, PathTable};
pub use settle::{settle, Rollback, SettleConfig, Settlement, Settler};

/// Default bound on relaxation passes per settling attempt.
pub const DEFAULT_MAX_ITERATIONS: usize = 64;

/// Default voltage lost across an ammeter.
pub const DEFAULT_AMMETER_BURDEN: f64 = 2.0;

/// Default forward drop reported by a conducting diode.
pub const DEFAULT_DIODE_DROP: f64 = 0.7;
