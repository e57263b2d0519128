//! Default engine: plain value transfers with intrinsic gas accounting.

use bytes::Bytes;
use ledger_crypto::keccak256;
use ledger_primitives::{Address, H256};
use ledger_rlp::RlpStream;
use ledger_types::{Account, Message};
use tracing::debug;

use crate::context::ExecContext;
use crate::engine::{Execution, ExecutionEngine};
use crate::error::{EngineError, EngineResult};
use crate::gas::{intrinsic_gas, GasPool};
use crate::state::StateAccess;

/// keccak256("Transfer(address,address,uint256)")
pub const TRANSFER_TOPIC: H256 = H256::from_bytes([
    0xdd, 0xf2, 0x52, 0xad, 0x1b, 0xe2, 0xc8, 0x9b,
    0x69, 0xc2, 0xb0, 0x68, 0xfc, 0x37, 0x8d, 0xaa,
    0x95, 0x2b, 0xa7, 0xf1, 0x63, 0xc4, 0xa1, 0x16,
    0x28, 0xf5, 0x5a, 0x4d, 0xf5, 0x23, 0xb3, 0xef,
]);

/// Derive the address of a created account:
/// keccak256(rlp([sender, nonce]))[12..]
pub fn create_address(sender: &Address, nonce: u64) -> Address {
    let mut stream = RlpStream::new_list(2);
    stream.append(sender);
    if nonce == 0 {
        stream.append_empty_data();
    } else {
        stream.append(&nonce);
    }
    let hash = keccak256(&stream.out());
    Address::from_slice(&hash.as_bytes()[12..]).unwrap_or(Address::ZERO)
}

/// Engine that moves value between accounts and charges intrinsic gas.
/// Creation messages store their payload as account code; there is no
/// bytecode interpretation.
#[derive(Clone, Copy, Debug, Default)]
pub struct TransferEngine;

impl TransferEngine {
    /// Create a transfer engine
    pub fn new() -> Self {
        TransferEngine
    }
}

impl ExecutionEngine for TransferEngine {
    fn execute(
        &self,
        msg: &Message,
        ctx: &ExecContext,
        state: &mut dyn StateAccess,
        pool: &mut GasPool,
    ) -> EngineResult<Execution> {
        // Validation phase. Nothing below may mutate state or the pool until
        // every check has passed.
        if pool.remaining() < msg.gas_limit {
            return Err(EngineError::GasPoolDepleted {
                requested: msg.gas_limit,
                remaining: pool.remaining(),
            });
        }

        let sender = state.get_account(&msg.from).unwrap_or_default();
        if sender.nonce != msg.nonce {
            return Err(EngineError::NonceMismatch {
                expected: sender.nonce,
                got: msg.nonce,
            });
        }

        let intrinsic = intrinsic_gas(&msg.payload, msg.is_creation());
        if intrinsic > msg.gas_limit {
            return Err(EngineError::IntrinsicGas {
                required: intrinsic,
                limit: msg.gas_limit,
            });
        }

        let gas_cost = (msg.gas_limit as u128).saturating_mul(ctx.gas_price);
        if sender.balance < gas_cost {
            return Err(EngineError::InsufficientFunds {
                required: gas_cost,
                available: sender.balance,
            });
        }

        // Mutation phase: buy gas, bump the nonce.
        pool.sub_gas(msg.gas_limit)?;
        let mut sender = sender;
        sender.balance -= gas_cost;
        sender.nonce += 1;

        let gas_used = intrinsic;
        let gas_refund = msg.gas_limit - gas_used;

        if sender.balance < msg.value {
            // Not enough left after the gas purchase: revert. Gas is
            // consumed, the nonce stays bumped, no value moves.
            pool.add_gas(gas_refund);
            sender.balance += (gas_refund as u128).saturating_mul(ctx.gas_price);
            state.set_account(msg.from, sender);
            debug!(from = %msg.from, value = msg.value, "transfer reverted");
            return Ok(Execution {
                output: Bytes::new(),
                gas_used,
                reverted: true,
            });
        }

        sender.balance -= msg.value;
        pool.add_gas(gas_refund);
        sender.balance += (gas_refund as u128).saturating_mul(ctx.gas_price);
        state.set_account(msg.from, sender);

        let recipient_addr = match msg.to {
            Some(to) => to,
            None => create_address(&msg.from, msg.nonce),
        };

        // Re-read so a self-transfer sees the debited sender
        let mut recipient = state.get_account(&recipient_addr).unwrap_or_default();
        recipient.balance = recipient.balance.saturating_add(msg.value);
        if msg.is_creation() && !msg.payload.is_empty() {
            recipient.code_hash = state.set_code(msg.payload.to_vec());
        }
        state.set_account(recipient_addr, recipient);

        if msg.value > 0 {
            state.emit_log(
                recipient_addr,
                vec![
                    TRANSFER_TOPIC,
                    address_topic(&msg.from),
                    address_topic(&recipient_addr),
                ],
                value_data(msg.value),
            );
        }

        Ok(Execution {
            output: Bytes::new(),
            gas_used,
            reverted: false,
        })
    }
}

fn address_topic(address: &Address) -> H256 {
    let mut bytes = [0u8; 32];
    bytes[12..].copy_from_slice(address.as_bytes());
    H256::from_bytes(bytes)
}

fn value_data(value: u128) -> Bytes {
    let mut bytes = [0u8; 32];
    bytes[16..].copy_from_slice(&value.to_be_bytes());
    Bytes::copy_from_slice(&bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gas::{TX_GAS, TX_GAS_CONTRACT_CREATION};
    use ledger_types::EMPTY_CODE_HASH;
    use std::collections::HashMap;

    #[derive(Default)]
    struct MockState {
        accounts: HashMap<Address, Account>,
        code: HashMap<H256, Vec<u8>>,
        logs: Vec<(Address, Vec<H256>, Bytes)>,
    }

    impl StateAccess for MockState {
        fn get_account(&self, address: &Address) -> Option<Account> {
            self.accounts.get(address).cloned()
        }

        fn set_account(&mut self, address: Address, account: Account) {
            self.accounts.insert(address, account);
        }

        fn get_code(&self, code_hash: &H256) -> Option<Vec<u8>> {
            self.code.get(code_hash).cloned()
        }

        fn set_code(&mut self, code: Vec<u8>) -> H256 {
            let hash = keccak256(&code);
            self.code.insert(hash, code);
            hash
        }

        fn emit_log(&mut self, address: Address, topics: Vec<H256>, data: Bytes) {
            self.logs.push((address, topics, data));
        }
    }

    const SENDER: Address = Address::from_bytes([0x11; 20]);
    const RECIPIENT: Address = Address::from_bytes([0x22; 20]);

    fn funded_state(balance: u128) -> MockState {
        let mut state = MockState::default();
        state.set_account(SENDER, Account::with_balance(balance));
        state
    }

    fn transfer_msg(value: u128) -> Message {
        Message {
            from: SENDER,
            nonce: 0,
            gas_price: 1,
            gas_limit: 30_000,
            to: Some(RECIPIENT),
            value,
            payload: Bytes::new(),
        }
    }

    fn ctx() -> ExecContext {
        ExecContext::new(SENDER, 1, 0, H256::from_bytes([0xbb; 32]))
    }

    #[test]
    fn test_successful_transfer() {
        let mut state = funded_state(1_000_000);
        let mut pool = GasPool::new(100_000);
        let msg = transfer_msg(500);

        let result = TransferEngine::new()
            .execute(&msg, &ctx(), &mut state, &mut pool)
            .unwrap();

        assert!(!result.reverted);
        assert_eq!(result.gas_used, TX_GAS);
        // Pool gave out gas_limit, got back the unused portion
        assert_eq!(pool.remaining(), 100_000 - TX_GAS);

        let sender = state.get_account(&SENDER).unwrap();
        assert_eq!(sender.nonce, 1);
        assert_eq!(sender.balance, 1_000_000 - 500 - TX_GAS as u128);

        let recipient = state.get_account(&RECIPIENT).unwrap();
        assert_eq!(recipient.balance, 500);
    }

    #[test]
    fn test_transfer_emits_log() {
        let mut state = funded_state(1_000_000);
        let mut pool = GasPool::new(100_000);

        TransferEngine::new()
            .execute(&transfer_msg(500), &ctx(), &mut state, &mut pool)
            .unwrap();

        assert_eq!(state.logs.len(), 1);
        let (address, topics, data) = &state.logs[0];
        assert_eq!(*address, RECIPIENT);
        assert_eq!(topics[0], TRANSFER_TOPIC);
        assert_eq!(topics[1], address_topic(&SENDER));
        assert_eq!(topics[2], address_topic(&RECIPIENT));
        assert_eq!(data[31], 0xf4); // 500 = 0x01f4
        assert_eq!(data[30], 0x01);
    }

    #[test]
    fn test_zero_value_transfer_no_log() {
        let mut state = funded_state(1_000_000);
        let mut pool = GasPool::new(100_000);

        let result = TransferEngine::new()
            .execute(&transfer_msg(0), &ctx(), &mut state, &mut pool)
            .unwrap();
        assert!(!result.reverted);
        assert!(state.logs.is_empty());
    }

    #[test]
    fn test_pool_depletion_mutates_nothing() {
        let mut state = funded_state(1_000_000);
        let mut pool = GasPool::new(10_000);
        let msg = transfer_msg(500);

        let err = TransferEngine::new()
            .execute(&msg, &ctx(), &mut state, &mut pool)
            .unwrap_err();
        assert!(matches!(err, EngineError::GasPoolDepleted { .. }));

        assert_eq!(pool.remaining(), 10_000);
        let sender = state.get_account(&SENDER).unwrap();
        assert_eq!(sender.nonce, 0);
        assert_eq!(sender.balance, 1_000_000);
    }

    #[test]
    fn test_nonce_mismatch() {
        let mut state = funded_state(1_000_000);
        let mut pool = GasPool::new(100_000);
        let mut msg = transfer_msg(500);
        msg.nonce = 5;

        let err = TransferEngine::new()
            .execute(&msg, &ctx(), &mut state, &mut pool)
            .unwrap_err();
        assert_eq!(err, EngineError::NonceMismatch { expected: 0, got: 5 });
        assert_eq!(pool.remaining(), 100_000);
    }

    #[test]
    fn test_intrinsic_gas_exceeds_limit() {
        let mut state = funded_state(1_000_000);
        let mut pool = GasPool::new(100_000);
        let mut msg = transfer_msg(0);
        msg.gas_limit = TX_GAS - 1;

        let err = TransferEngine::new()
            .execute(&msg, &ctx(), &mut state, &mut pool)
            .unwrap_err();
        assert!(matches!(err, EngineError::IntrinsicGas { .. }));
        assert_eq!(pool.remaining(), 100_000);
    }

    #[test]
    fn test_cannot_afford_gas() {
        let mut state = funded_state(100);
        let mut pool = GasPool::new(100_000);
        let msg = transfer_msg(0);

        let err = TransferEngine::new()
            .execute(&msg, &ctx(), &mut state, &mut pool)
            .unwrap_err();
        assert!(matches!(err, EngineError::InsufficientFunds { .. }));
        assert_eq!(state.get_account(&SENDER).unwrap().balance, 100);
    }

    #[test]
    fn test_insufficient_value_reverts() {
        // Enough for gas, not for the value
        let mut state = funded_state(40_000);
        let mut pool = GasPool::new(100_000);
        let msg = transfer_msg(1_000_000);

        let result = TransferEngine::new()
            .execute(&msg, &ctx(), &mut state, &mut pool)
            .unwrap();
        assert!(result.reverted);
        assert_eq!(result.gas_used, TX_GAS);

        let sender = state.get_account(&SENDER).unwrap();
        // Nonce bumped, gas spent, value untouched
        assert_eq!(sender.nonce, 1);
        assert_eq!(sender.balance, 40_000 - TX_GAS as u128);
        assert!(state.get_account(&RECIPIENT).is_none());
        assert!(state.logs.is_empty());
    }

    #[test]
    fn test_creation_stores_code() {
        let mut state = funded_state(1_000_000);
        let mut pool = GasPool::new(100_000);
        let payload = vec![0x60, 0x60, 0x60];
        let msg = Message {
            from: SENDER,
            nonce: 0,
            gas_price: 1,
            gas_limit: 90_000,
            to: None,
            value: 10,
            payload: Bytes::from(payload.clone()),
        };

        let result = TransferEngine::new()
            .execute(&msg, &ctx(), &mut state, &mut pool)
            .unwrap();
        assert!(!result.reverted);
        assert_eq!(
            result.gas_used,
            TX_GAS_CONTRACT_CREATION + 3 * crate::gas::TX_DATA_NON_ZERO_GAS
        );

        let created_addr = create_address(&SENDER, 0);
        let created = state.get_account(&created_addr).unwrap();
        assert_eq!(created.balance, 10);
        assert_ne!(created.code_hash, EMPTY_CODE_HASH);
        assert_eq!(state.get_code(&created.code_hash), Some(payload));
    }

    #[test]
    fn test_self_transfer_preserves_balance() {
        let mut state = funded_state(1_000_000);
        let mut pool = GasPool::new(100_000);
        let mut msg = transfer_msg(500);
        msg.to = Some(SENDER);

        TransferEngine::new()
            .execute(&msg, &ctx(), &mut state, &mut pool)
            .unwrap();

        let sender = state.get_account(&SENDER).unwrap();
        // Only gas is lost on a self-transfer
        assert_eq!(sender.balance, 1_000_000 - TX_GAS as u128);
    }

    #[test]
    fn test_create_address_known_vector() {
        let sender = Address::from_hex("0x6ac7ea33f8831ea9dcc53393aaa88b25a785dbf0").unwrap();
        assert_eq!(
            create_address(&sender, 0).to_hex(),
            "0xcd234a471b72ba2f1ccf0a70fcaba648a5eecd8d"
        );
        assert_eq!(
            create_address(&sender, 1).to_hex(),
            "0x343c43a37d37dff08ae8c4a11544c718abb4fcf8"
        );
    }

    #[test]
    fn test_create_address_changes_with_nonce() {
        let sender = Address::from_bytes([0x42; 20]);
        assert_ne!(create_address(&sender, 0), create_address(&sender, 1));
    }
}
