//! # ledger-engine
//!
//! The execution seam of the ledger: the `ExecutionEngine` trait, the
//! per-message `ExecContext` with its historical-hash oracle, the epoch
//! `GasPool`, the `StateAccess` view, and the default `TransferEngine`.

#![warn(missing_docs)]
#![warn(clippy::all)]

mod context;
mod engine;
mod error;
mod gas;
mod state;
mod transfer;

pub use context::{ExecContext, HashOracle};
pub use engine::{Execution, ExecutionEngine};
pub use error::{EngineError, EngineResult};
pub use gas::{
    intrinsic_gas, GasPool, TX_DATA_NON_ZERO_GAS, TX_DATA_ZERO_GAS, TX_GAS,
    TX_GAS_CONTRACT_CREATION,
};
pub use state::StateAccess;
pub use transfer::{create_address, TransferEngine, TRANSFER_TOPIC};
