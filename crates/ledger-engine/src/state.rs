//! State access seam between the engine and the versioned state store.

use bytes::Bytes;
use ledger_primitives::{Address, H256};
use ledger_types::Account;

/// Mutable view of account state during execution.
///
/// Reads see the committed state overlaid with writes made earlier in the
/// epoch. Log emission is attributed by the implementor to the transaction
/// currently being executed.
pub trait StateAccess {
    /// Load an account, if it exists
    fn get_account(&self, address: &Address) -> Option<Account>;

    /// Create or overwrite an account
    fn set_account(&mut self, address: Address, account: Account);

    /// Load code by its hash
    fn get_code(&self, code_hash: &H256) -> Option<Vec<u8>>;

    /// Store code, returning its hash
    fn set_code(&mut self, code: Vec<u8>) -> H256;

    /// Emit a log attributed to the current transaction
    fn emit_log(&mut self, address: Address, topics: Vec<H256>, data: Bytes);
}
