// Hex/field encoding primitives
// Renders integers, addresses, and strings into the fixed-width hex words
// the UCS03 operand layouts are assembled from

use alloy_primitives::{Address, U256};

use crate::errors::TransferError;

/// Width of one operand word in bytes.
pub const WORD_BYTES: usize = 32;

/// Render a 256-bit value as a big-endian hex word, zero-padded to 32 bytes.
pub fn word(value: U256) -> String {
    format!("{value:064x}")
}

/// Convenience wrapper for small layout constants and counts.
pub fn word_u64(value: u64) -> String {
    word(U256::from(value))
}

/// Lower-case hex of a 20-byte address, left-justified into a 32-byte slot.
/// The address bytes occupy the high-order end of the slot; padding follows.
pub fn address_field(address: &Address) -> String {
    let mut out = hex::encode(address.as_slice());
    out.extend(std::iter::repeat('0').take((WORD_BYTES - Address::len_bytes()) * 2));
    out
}

/// Arbitrary bytes left-justified into a `slot_bytes`-wide slot.
pub fn raw_field(
    bytes: &[u8],
    slot_bytes: usize,
    field: &'static str,
) -> Result<String, TransferError> {
    if bytes.len() > slot_bytes {
        return Err(TransferError::FieldTooLong {
            field,
            len: bytes.len(),
            slot: slot_bytes,
        });
    }
    let mut out = String::with_capacity(slot_bytes * 2);
    out.push_str(&hex::encode(bytes));
    out.extend(std::iter::repeat('0').take((slot_bytes - bytes.len()) * 2));
    Ok(out)
}

/// UTF-8 encode `text` and right-pad with zero bytes to `slot_bytes`.
pub fn ascii_field(
    text: &str,
    slot_bytes: usize,
    field: &'static str,
) -> Result<String, TransferError> {
    raw_field(text.as_bytes(), slot_bytes, field)
}
