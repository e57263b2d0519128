//! Deterministic binary encoding for transactions and receipts.
//!
//! The transaction wire form is also the preimage of the transaction hash;
//! the receipt form is the storage representation written at commit time.
//! Fixed-width fields are little endian, variable fields carry a u32 length
//! prefix, optional fields a one-byte flag.

use bytes::Bytes;
use ledger_primitives::{Address, H256};

use crate::bloom::Bloom;
use crate::receipt::{Log, Receipt, TxStatus};
use crate::transaction::{SignedTransaction, TxSignature};

// ============================================================================
// Transaction
// ============================================================================

/// Encode a signed transaction to its wire form.
pub fn encode_tx(tx: &SignedTransaction) -> Vec<u8> {
    let mut buf = Vec::new();
    buf.extend_from_slice(&tx.nonce.to_le_bytes());
    buf.extend_from_slice(&tx.gas_price.to_le_bytes());
    buf.extend_from_slice(&tx.gas_limit.to_le_bytes());
    if let Some(to) = &tx.to {
        buf.push(1);
        buf.extend_from_slice(to.as_bytes());
    } else {
        buf.push(0);
    }
    buf.extend_from_slice(&tx.value.to_le_bytes());
    buf.extend_from_slice(&(tx.payload.len() as u32).to_le_bytes());
    buf.extend_from_slice(&tx.payload);
    buf.extend_from_slice(&tx.signature.v.to_le_bytes());
    buf.extend_from_slice(tx.signature.r.as_bytes());
    buf.extend_from_slice(tx.signature.s.as_bytes());
    buf
}

/// Decode a signed transaction from its wire form.
pub fn decode_tx(bytes: &[u8]) -> Option<SignedTransaction> {
    let mut pos = 0;

    let nonce = read_u64(bytes, &mut pos)?;
    let gas_price = read_u128(bytes, &mut pos)?;
    let gas_limit = read_u64(bytes, &mut pos)?;
    let to = read_opt_address(bytes, &mut pos)?;
    let value = read_u128(bytes, &mut pos)?;
    let payload = read_bytes(bytes, &mut pos)?;
    let v = read_u64(bytes, &mut pos)?;
    let r = read_h256(bytes, &mut pos)?;
    let s = read_h256(bytes, &mut pos)?;

    if pos != bytes.len() {
        return None;
    }

    Some(SignedTransaction {
        nonce,
        gas_price,
        gas_limit,
        to,
        value,
        payload,
        signature: TxSignature::new(v, r, s),
    })
}

// ============================================================================
// Receipt
// ============================================================================

/// Encode a receipt to its storage form.
pub fn encode_receipt(receipt: &Receipt) -> Vec<u8> {
    let mut buf = Vec::new();
    buf.extend_from_slice(receipt.state_root.as_bytes());
    buf.push(if receipt.is_success() { 1 } else { 0 });
    buf.extend_from_slice(&receipt.cumulative_gas_used.to_le_bytes());
    buf.extend_from_slice(receipt.tx_hash.as_bytes());
    buf.extend_from_slice(&receipt.gas_used.to_le_bytes());
    if let Some(addr) = &receipt.contract_address {
        buf.push(1);
        buf.extend_from_slice(addr.as_bytes());
    } else {
        buf.push(0);
    }
    buf.extend_from_slice(&receipt.logs_bloom.0);
    buf.extend_from_slice(&(receipt.logs.len() as u32).to_le_bytes());
    for log in &receipt.logs {
        buf.extend_from_slice(log.address.as_bytes());
        buf.extend_from_slice(&(log.topics.len() as u32).to_le_bytes());
        for topic in &log.topics {
            buf.extend_from_slice(topic.as_bytes());
        }
        buf.extend_from_slice(&(log.data.len() as u32).to_le_bytes());
        buf.extend_from_slice(&log.data);
        buf.extend_from_slice(log.tx_hash.as_bytes());
        buf.extend_from_slice(log.block_hash.as_bytes());
        buf.extend_from_slice(&log.tx_index.to_le_bytes());
    }
    buf
}

/// Decode a receipt from its storage form.
pub fn decode_receipt(bytes: &[u8]) -> Option<Receipt> {
    let mut pos = 0;

    let state_root = read_h256(bytes, &mut pos)?;
    let status = if read_u8(bytes, &mut pos)? == 1 {
        TxStatus::Success
    } else {
        TxStatus::Failure
    };
    let cumulative_gas_used = read_u64(bytes, &mut pos)?;
    let tx_hash = read_h256(bytes, &mut pos)?;
    let gas_used = read_u64(bytes, &mut pos)?;
    let contract_address = read_opt_address(bytes, &mut pos)?;

    if pos + 256 > bytes.len() {
        return None;
    }
    let mut bloom_bytes = [0u8; 256];
    bloom_bytes.copy_from_slice(&bytes[pos..pos + 256]);
    pos += 256;

    let log_count = read_u32(bytes, &mut pos)? as usize;
    let mut logs = Vec::with_capacity(log_count);
    for _ in 0..log_count {
        let address = read_address(bytes, &mut pos)?;
        let topic_count = read_u32(bytes, &mut pos)? as usize;
        let mut topics = Vec::with_capacity(topic_count);
        for _ in 0..topic_count {
            topics.push(read_h256(bytes, &mut pos)?);
        }
        let data = read_bytes(bytes, &mut pos)?;
        let log_tx_hash = read_h256(bytes, &mut pos)?;
        let block_hash = read_h256(bytes, &mut pos)?;
        let tx_index = read_u64(bytes, &mut pos)?;
        logs.push(Log::new(
            address,
            topics,
            data,
            log_tx_hash,
            block_hash,
            tx_index,
        ));
    }

    if pos != bytes.len() {
        return None;
    }

    let mut receipt = Receipt::new(
        state_root,
        status,
        cumulative_gas_used,
        tx_hash,
        gas_used,
        logs,
    );
    // Stored bloom wins over the recomputed one
    receipt.logs_bloom = Bloom::from_bytes(bloom_bytes);
    if let Some(addr) = contract_address {
        receipt = receipt.with_contract_address(addr);
    }
    Some(receipt)
}

// ============================================================================
// Cursor helpers
// ============================================================================

fn read_u8(bytes: &[u8], pos: &mut usize) -> Option<u8> {
    let value = *bytes.get(*pos)?;
    *pos += 1;
    Some(value)
}

fn read_u32(bytes: &[u8], pos: &mut usize) -> Option<u32> {
    let end = pos.checked_add(4)?;
    let value = u32::from_le_bytes(bytes.get(*pos..end)?.try_into().ok()?);
    *pos = end;
    Some(value)
}

fn read_u64(bytes: &[u8], pos: &mut usize) -> Option<u64> {
    let end = pos.checked_add(8)?;
    let value = u64::from_le_bytes(bytes.get(*pos..end)?.try_into().ok()?);
    *pos = end;
    Some(value)
}

fn read_u128(bytes: &[u8], pos: &mut usize) -> Option<u128> {
    let end = pos.checked_add(16)?;
    let value = u128::from_le_bytes(bytes.get(*pos..end)?.try_into().ok()?);
    *pos = end;
    Some(value)
}

fn read_h256(bytes: &[u8], pos: &mut usize) -> Option<H256> {
    let end = pos.checked_add(32)?;
    let value = H256::from_slice(bytes.get(*pos..end)?).ok()?;
    *pos = end;
    Some(value)
}

fn read_address(bytes: &[u8], pos: &mut usize) -> Option<Address> {
    let end = pos.checked_add(20)?;
    let value = Address::from_slice(bytes.get(*pos..end)?).ok()?;
    *pos = end;
    Some(value)
}

fn read_opt_address(bytes: &[u8], pos: &mut usize) -> Option<Option<Address>> {
    match read_u8(bytes, pos)? {
        0 => Some(None),
        1 => Some(Some(read_address(bytes, pos)?)),
        _ => None,
    }
}

fn read_bytes(bytes: &[u8], pos: &mut usize) -> Option<Bytes> {
    let len = read_u32(bytes, pos)? as usize;
    let end = pos.checked_add(len)?;
    let data = Bytes::copy_from_slice(bytes.get(*pos..end)?);
    *pos = end;
    Some(data)
}
