//! Seams between the chain and its collaborator tasks.
//!
//! The chain does not know how the transaction pool or the event
//! listeners are implemented; it only holds these capability handles.
//! A node wires in its real tasks, a test harness wires in recording
//! doubles.

use crate::blockcfg::{Hash, Transaction};
use thiserror::Error;

/// Events the chain publishes towards interested listeners (explorer,
/// subscription endpoints).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    /// a block was loaded from storage into memory.
    BlockLoaded { hash: Hash, height: u64 },
}

#[derive(Debug, Error)]
#[error("event listener disconnected")]
pub struct EmitError;

/// Listener side of the chain events. Emission failures are never
/// fatal to the chain; callers log and move on.
pub trait EventEmitter: Send + Sync {
    fn emit(&self, event: Event) -> Result<(), EmitError>;
}

/// The pending transaction pool, as the chain sees it: the place
/// where transactions of reverted blocks are returned so they get a
/// chance to be included again.
pub trait TransactionPool: Send + Sync {
    fn return_transaction(&self, tx: Transaction);
}
