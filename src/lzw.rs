//! LZW stream decoder using the weezl crate.

use crate::error::Result;
use weezl::{decode::Decoder, BitOrder};

/// Decode LZW-encoded data (PDF variant: MSB first, 8-bit symbols) with the
/// default `EarlyChange` of 1.
pub fn lzwdecode(data: &[u8]) -> Result<Vec<u8>> {
    lzwdecode_with_earlychange(data, 1)
}

/// Decode LZW-encoded data honoring the `EarlyChange` decode parameter.
/// `EarlyChange=0` selects TIFF-style late code-size switching.
///
/// Corrupt input yields the output decoded so far rather than an error.
pub fn lzwdecode_with_earlychange(data: &[u8], early_change: i64) -> Result<Vec<u8>> {
    let mut decoder = if early_change == 0 {
        Decoder::with_tiff_size_switch(BitOrder::Msb, 8)
    } else {
        Decoder::new(BitOrder::Msb, 8)
    };
    let mut out = Vec::new();
    let _ = decoder.into_vec(&mut out).decode(data);
    Ok(out)
}
