//! Consistency Checker: reconcile image rows against stored objects.
//!
//! A row is *broken* when its key is empty or absent from the store; a stored
//! key is *orphaned* when no row references it. Checking never writes. The
//! two repairs are separate calls, each gated by a [`Confirmation`].

mod checker;
mod error;
mod report;

pub use checker::{CONFIRMATION_TOKEN, Confirmation, ConsistencyChecker, RepairFailure, RepairSummary};
pub use error::ConsistencyError;
pub use report::{BrokenRow, ConsistencyReport, reconcile};
