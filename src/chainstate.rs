use std::fmt;

use serde::{Serialize, Serializer};

use crate::amount::decompress_amount;
use crate::error::FormatError;
use crate::obfuscation::ObfuscationKey;
use crate::varint::{read_varint, read_varint_exact};

/// Key prefix of per-output coin records (`DB_COIN`).
pub const COIN_PREFIX: u8 = b'C';

/// Half-open key range holding every coin record: `['C', 'D')`.
pub const COIN_RANGE_START: &[u8] = &[COIN_PREFIX];
pub const COIN_RANGE_END: &[u8] = &[COIN_PREFIX + 1];

const TXID_LEN: usize = 32;

/// Transaction id in display (big-endian) byte order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Txid(pub [u8; 32]);

impl Txid {
    /// Build from the little-endian bytes stored on disk.
    pub fn from_internal_bytes(bytes: &[u8; 32]) -> Self {
        let mut display = *bytes;
        display.reverse();
        Txid(display)
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl fmt::Display for Txid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&hex::encode(self.0))
    }
}

impl Serialize for Txid {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Decoded coin key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OutPoint {
    pub txid: Txid,
    pub vout: u64,
}

/// Decoded coin value. The compressed script that follows the amount is not
/// interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Coin {
    pub height: u64,
    pub is_coinbase: bool,
    pub amount: u64,
}

/// One unspent output, the unit handed to sinks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UtxoRecord {
    pub txid: Txid,
    pub vout: u64,
    pub height: u64,
    pub coinbase: bool,
    pub amount: u64,
}

impl UtxoRecord {
    pub fn new(outpoint: OutPoint, coin: Coin) -> Self {
        UtxoRecord {
            txid: outpoint.txid,
            vout: outpoint.vout,
            height: coin.height,
            coinbase: coin.is_coinbase,
            amount: coin.amount,
        }
    }
}

/// Decode a coin key: `'C'` + 32-byte txid (little-endian) + VARINT(vout).
pub fn decode_key(key: &[u8]) -> Result<OutPoint, FormatError> {
    if key.len() <= 1 + TXID_LEN {
        return Err(FormatError::ShortKey { len: key.len() });
    }
    if key[0] != COIN_PREFIX {
        return Err(FormatError::UnexpectedPrefix {
            expected: COIN_PREFIX,
            found: key[0],
        });
    }

    let mut txid_bytes = [0u8; TXID_LEN];
    txid_bytes.copy_from_slice(&key[1..1 + TXID_LEN]);
    let txid = Txid::from_internal_bytes(&txid_bytes);

    let vout = read_varint_exact(&key[1 + TXID_LEN..], "coin key vout")?;

    Ok(OutPoint { txid, vout })
}

/// Decode an obfuscated coin value.
///
/// Takes the buffer by value: it is decrypted in place and dropped, so no
/// caller can see it in a half-decoded state.
///
/// Layout after decryption: VARINT(height * 2 + coinbase), VARINT(compressed
/// amount), compressed script.
pub fn decode_value(mut value: Vec<u8>, key: &ObfuscationKey) -> Result<Coin, FormatError> {
    key.apply(&mut value);

    let (code, consumed) = read_varint(&value)?;
    let (compressed_amount, _) = read_varint(&value[consumed..])?;

    Ok(Coin {
        height: code >> 1,
        is_coinbase: code & 1 == 1,
        amount: decompress_amount(compressed_amount)?,
    })
}

/// Decode one raw chainstate entry into a [`UtxoRecord`].
pub fn decode_entry(key: &[u8], value: Vec<u8>, obfuscation: &ObfuscationKey) -> Result<UtxoRecord, FormatError> {
    let outpoint = decode_key(key)?;
    let coin = decode_value(value, obfuscation)?;
    Ok(UtxoRecord::new(outpoint, coin))
}
