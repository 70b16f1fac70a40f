//! Amount compression as used by Core's coin serialization
//! (compressor.cpp `CompressAmount` / `DecompressAmount`).
//!
//! Output values are mostly round numbers, so the encoder strips up to nine
//! trailing decimal zeros into an exponent `e` and, when fewer than nine were
//! stripped, folds the last non-zero digit `d` (1..=9) into the code.

use crate::error::FormatError;

/// Expand a compressed amount code into satoshis.
pub fn decompress_amount(x: u64) -> Result<u64, FormatError> {
    if x == 0 {
        return Ok(0);
    }

    let x_dec = x - 1;
    let e = (x_dec % 10) as u32;
    let x_dec = x_dec / 10;

    let n = if e < 9 {
        let d = (x_dec % 9) + 1;
        (x_dec / 9)
            .checked_mul(10)
            .and_then(|v| v.checked_add(d))
    } else {
        x_dec.checked_add(1)
    };

    n.and_then(|n| n.checked_mul(10u64.pow(e)))
        .ok_or(FormatError::AmountOverflow(x))
}

/// Inverse of [`decompress_amount`].
///
/// Returns `None` when the code for `n` would not fit in a u64; every amount
/// up to `u64::MAX / 10` (far above the 21M BTC supply cap) compresses.
pub fn compress_amount(n: u64) -> Option<u64> {
    if n == 0 {
        return Some(0);
    }
    let mut n = n;
    let mut e = 0u64;
    while n % 10 == 0 && e < 9 {
        n /= 10;
        e += 1;
    }
    if e < 9 {
        let d = n % 10;
        n /= 10;
        n.checked_mul(9)?
            .checked_add(d - 1)?
            .checked_mul(10)?
            .checked_add(1 + e)
    } else {
        (n - 1).checked_mul(10)?.checked_add(10)
    }
}
