//! Legacy Solana transaction carrying one SPL Memo instruction.
//!
//! Wire layout (all lengths compact-u16):
//!
//! ```text
//! transaction = [sig count] [signature; 64]* message
//! message     = header(3) [key count] [pubkey; 32]* blockhash(32)
//!               [ix count] ( program_idx [acct count] [acct idx]* [data len] data )*
//! ```

use super::wallet::Wallet;
use crate::error::{Error, Result};

/// SPL Memo program (v2).
pub const MEMO_PROGRAM_ID: &str = "MemoSq4gqABAXKb96qnH8TysNcWxMyWCqXgDLGmfcHr";

/// Decode a base58 public key or blockhash into 32 bytes.
pub fn decode_pubkey(value: &str) -> Result<[u8; 32]> {
    let bytes = bs58::decode(value)
        .into_vec()
        .map_err(|e| Error::Other(format!("invalid base58 {value:?}: {e}")))?;
    bytes
        .try_into()
        .map_err(|v: Vec<u8>| Error::Other(format!("{value:?} decodes to {} bytes, expected 32", v.len())))
}

/// Append `len` in Solana's compact-u16 (7 bits per byte, little end first).
pub fn encode_compact_u16(mut len: u16, out: &mut Vec<u8>) {
    loop {
        let mut byte = (len & 0x7f) as u8;
        len >>= 7;
        if len == 0 {
            out.push(byte);
            return;
        }
        byte |= 0x80;
        out.push(byte);
    }
}

fn compact_len(len: usize, out: &mut Vec<u8>) -> Result<()> {
    let len = u16::try_from(len)
        .map_err(|_| Error::Other(format!("length {len} does not fit a transaction")))?;
    encode_compact_u16(len, out);
    Ok(())
}

/// Serialized message: the payer signs, the memo program is read-only.
pub fn memo_message(payer: &[u8; 32], recent_blockhash: &[u8; 32], memo: &[u8]) -> Result<Vec<u8>> {
    let program = decode_pubkey(MEMO_PROGRAM_ID)?;
    let mut msg = Vec::with_capacity(3 + 1 + 64 + 32 + 4 + memo.len());

    // required signatures, readonly signed, readonly unsigned
    msg.extend_from_slice(&[1, 0, 1]);

    compact_len(2, &mut msg)?;
    msg.extend_from_slice(payer);
    msg.extend_from_slice(&program);

    msg.extend_from_slice(recent_blockhash);

    compact_len(1, &mut msg)?;
    msg.push(1); // program id index
    compact_len(0, &mut msg)?;
    compact_len(memo.len(), &mut msg)?;
    msg.extend_from_slice(memo);

    Ok(msg)
}

/// Fully signed transaction bytes, ready for `sendTransaction`.
pub fn signed_memo_transaction(
    wallet: &Wallet,
    recent_blockhash: &[u8; 32],
    memo: &[u8],
) -> Result<Vec<u8>> {
    let message = memo_message(&wallet.pubkey(), recent_blockhash, memo)?;
    let signature = wallet.sign(&message);

    let mut tx = Vec::with_capacity(1 + 64 + message.len());
    compact_len(1, &mut tx)?;
    tx.extend_from_slice(&signature);
    tx.extend_from_slice(&message);
    Ok(tx)
}
