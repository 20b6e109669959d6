//! Host-facing board holder with deferred settling.
//!
//! Every edit bumps a revision counter and marks the board dirty. The host
//! calls [`Workbench::idle`] from its idle hook: at most one settle runs per
//! batch of edits, and a pass that finishes after newer edits were made is
//! thrown away instead of overwriting them.

use tracing::debug;

use crate::circuit::{Breadboard, Connection, Element};
use crate::solver::{Rollback, SettleConfig, Settlement, Settler};

/// A settle scheduled against one revision of the board.
#[derive(Debug, Clone)]
pub struct PendingSettle {
    revision: u64,
    board: Breadboard,
}

impl PendingSettle {
    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Run the pass against the snapshot taken when it was scheduled.
    pub fn run(self, settler: &Settler) -> CompletedSettle {
        CompletedSettle {
            revision: self.revision,
            settlement: settler.settle_board(&self.board),
        }
    }
}

/// A finished pass, not yet applied.
#[derive(Debug, Clone)]
pub struct CompletedSettle {
    revision: u64,
    settlement: Settlement,
}

/// Summary of an applied pass.
#[derive(Debug, Clone, PartialEq)]
pub struct SettleReport {
    pub revision: u64,
    pub iterations: usize,
    pub rollbacks: Vec<Rollback>,
}

/// A board plus the bookkeeping for when to settle it.
#[derive(Debug, Clone, Default)]
pub struct Workbench {
    board: Breadboard,
    settler: Settler,
    revision: u64,
    settled_revision: u64,
}

impl Workbench {
    /// Create an empty workbench.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty workbench with custom settling configuration.
    pub fn with_config(config: SettleConfig) -> Self {
        Self {
            settler: Settler::with_config(config),
            ..Self::default()
        }
    }

    /// Start from an existing board; it needs settling.
    pub fn from_board(board: Breadboard) -> Self {
        let mut bench = Self::new();
        bench.load(board);
        bench
    }

    /// The current board (settled or not).
    pub fn board(&self) -> &Breadboard {
        &self.board
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Whether edits were made since the last applied pass.
    pub fn is_dirty(&self) -> bool {
        self.revision != self.settled_revision
    }

    /// Replace the whole snapshot.
    pub fn load(&mut self, board: Breadboard) {
        self.board = board;
        self.revision += 1;
    }

    /// Replace the snapshot from its parts.
    pub fn load_parts(&mut self, elements: Vec<Element>, connections: Vec<Connection>) {
        self.load(Breadboard::from_parts(elements, connections));
    }

    /// Apply an edit and mark the board dirty.
    pub fn edit<R>(&mut self, f: impl FnOnce(&mut Breadboard) -> R) -> R {
        self.revision += 1;
        f(&mut self.board)
    }

    /// Snapshot the board for a pass, if it needs one.
    pub fn schedule(&self) -> Option<PendingSettle> {
        self.is_dirty().then(|| PendingSettle {
            revision: self.revision,
            board: self.board.clone(),
        })
    }

    /// Install a finished pass unless newer edits superseded it.
    pub fn apply(&mut self, completed: CompletedSettle) -> Option<SettleReport> {
        if completed.revision != self.revision {
            debug!(
                pass = completed.revision,
                current = self.revision,
                "discarding superseded settle"
            );
            return None;
        }
        let report = SettleReport {
            revision: completed.revision,
            iterations: completed.settlement.iterations,
            rollbacks: completed.settlement.rollbacks.clone(),
        };
        self.board = completed.settlement.into_board();
        self.settled_revision = completed.revision;
        Some(report)
    }

    /// Settle now if dirty; a no-op otherwise.
    pub fn idle(&mut self) -> Option<SettleReport> {
        let pending = self.schedule()?;
        let completed = pending.run(&self.settler);
        self.apply(completed)
    }
}
