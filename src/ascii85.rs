//! ASCII85 and ASCIIHex stream decoders.

use crate::error::Result;

/// Decode ASCII85-encoded data (PDF variant).
///
/// Tolerates a `<~` prefix, whitespace anywhere, the `z` shorthand for four
/// zero bytes, and a missing `~>` end marker. A trailing partial group is
/// padded with `u` and truncated per the encoding rules.
pub fn ascii85decode(data: &[u8]) -> Result<Vec<u8>> {
    let data = data.strip_prefix(b"<~").unwrap_or(data);

    let mut out = Vec::with_capacity(data.len() * 4 / 5);
    let mut group = [0u8; 5];
    let mut filled = 0;

    for &byte in data {
        match byte {
            b'~' => break,
            b'z' if filled == 0 => out.extend_from_slice(&[0, 0, 0, 0]),
            b'!'..=b'u' => {
                group[filled] = byte;
                filled += 1;
                if filled == 5 {
                    out.extend_from_slice(&decode_group(&group));
                    filled = 0;
                }
            }
            // whitespace and anything else out of range is skipped
            _ => continue,
        }
    }

    if filled > 0 {
        let mut padded = group;
        padded[filled..].fill(b'u');
        out.extend_from_slice(&decode_group(&padded)[..filled - 1]);
    }

    Ok(out)
}

fn decode_group(group: &[u8; 5]) -> [u8; 4] {
    let mut value: u32 = 0;
    for &byte in group {
        value = value.wrapping_mul(85).wrapping_add((byte - b'!') as u32);
    }
    value.to_be_bytes()
}

/// Decode ASCIIHex-encoded data. Whitespace is skipped, `>` terminates, and
/// an odd trailing digit is padded with `0`.
pub fn asciihexdecode(data: &[u8]) -> Result<Vec<u8>> {
    let mut out = Vec::with_capacity(data.len() / 2);
    let mut high: Option<u8> = None;

    for &byte in data {
        let nibble = match byte {
            b'0'..=b'9' => byte - b'0',
            b'a'..=b'f' => byte - b'a' + 10,
            b'A'..=b'F' => byte - b'A' + 10,
            b'>' => break,
            _ => continue,
        };
        match high.take() {
            Some(h) => out.push((h << 4) | nibble),
            None => high = Some(nibble),
        }
    }

    if let Some(h) = high {
        out.push(h << 4);
    }

    Ok(out)
}
