//! The execution engine seam.

use bytes::Bytes;

use crate::context::ExecContext;
use crate::error::EngineResult;
use crate::gas::GasPool;
use crate::state::StateAccess;
use ledger_types::Message;

/// Outcome of a completed execution.
///
/// A reverted execution is still a completed one: gas was consumed and the
/// caller owes the transaction a receipt with the failure flag set.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Execution {
    /// Return data
    pub output: Bytes,
    /// Gas consumed by the execution
    pub gas_used: u64,
    /// Whether the execution reverted
    pub reverted: bool,
}

/// Executes a message against mutable state.
///
/// `Err` means an engine-level fault: the call must leave the gas pool and
/// state untouched. Reverts are reported through `Execution::reverted`.
pub trait ExecutionEngine {
    /// Execute one message
    fn execute(
        &self,
        msg: &Message,
        ctx: &ExecContext,
        state: &mut dyn StateAccess,
        pool: &mut GasPool,
    ) -> EngineResult<Execution>;
}
