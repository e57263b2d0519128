//! # ledger-state
//!
//! Write-ahead execution for the ledger: the versioned `WorkingState` and
//! the epoch `Session` that applies transactions, buffers receipts and logs,
//! and commits the epoch through a staged, non-atomic pipeline.

#![warn(missing_docs)]
#![warn(clippy::all)]

mod error;
mod session;
mod working;

pub use error::{CommitError, SessionError};
pub use session::{Session, SessionConfig, DEFAULT_GAS_LIMIT};
pub use working::WorkingState;
