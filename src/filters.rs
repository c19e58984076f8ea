//! Stream decode filters.
//!
//! `decode_stream` is the seam the stream reader drives: one call per
//! `(Filter, DecodeParms)` pair, applied in order. Decoders are lenient
//! about corrupt input wherever a partial result is still useful; an
//! unsupported filter name is an error so the caller can stop the chain and
//! keep the bytes decoded so far.

use crate::ascii85::{ascii85decode, asciihexdecode};
use crate::error::{PdfError, Result};
use crate::lzw::lzwdecode_with_earlychange;
use crate::pdftypes::Dictionary;
use crate::runlength::rldecode;
use std::io::Read;

/// Apply a single named decode filter to `data`.
pub fn decode_stream(filter: &str, data: &[u8], parms: &Dictionary) -> Result<Vec<u8>> {
    match filter {
        "FlateDecode" | "Fl" => apply_predictor(flate_decode(data), parms),
        "LZWDecode" | "LZW" => {
            let early_change = parms.get_int("EarlyChange").unwrap_or(1);
            apply_predictor(lzwdecode_with_earlychange(data, early_change)?, parms)
        }
        "ASCII85Decode" | "A85" => ascii85decode(data),
        "ASCIIHexDecode" | "AHx" => asciihexdecode(data),
        "RunLengthDecode" | "RL" => rldecode(data),
        // a Crypt filter that was not consumed by the security handler is
        // the Identity transform
        "Crypt" => Ok(data.to_vec()),
        other => Err(PdfError::Unsupported(format!("stream filter {other}"))),
    }
}

/// Inflate zlib data, falling back to byte-at-a-time decompression that
/// keeps partial output when the stream is corrupted or truncated.
fn flate_decode(data: &[u8]) -> Vec<u8> {
    let mut decoder = flate2::read::ZlibDecoder::new(data);
    let mut out = Vec::new();
    if decoder.read_to_end(&mut out).is_ok() {
        return out;
    }
    decompress_corrupted(data)
}

/// Best-effort zlib decompression for corrupted streams: feed one byte at a
/// time and keep everything produced before the decoder gives up.
fn decompress_corrupted(data: &[u8]) -> Vec<u8> {
    use flate2::{Decompress, FlushDecompress, Status};

    let mut decoder = Decompress::new(true);
    let mut out = Vec::with_capacity(data.len() * 2);
    let mut buf = [0u8; 4096];
    let mut i = 0usize;
    while i < data.len() {
        let before_out = decoder.total_out();
        let before_in = decoder.total_in();
        let result = decoder.decompress(&data[i..i + 1], &mut buf, FlushDecompress::None);
        let produced = (decoder.total_out() - before_out) as usize;
        if produced > 0 {
            out.extend_from_slice(&buf[..produced]);
        }
        let consumed = (decoder.total_in() - before_in) as usize;
        i += consumed.max(1);
        match result {
            Ok(Status::StreamEnd) | Err(_) => break,
            Ok(_) => {}
        }
    }
    out
}

/// Reverse the predictor declared in `DecodeParms`, if any.
fn apply_predictor(data: Vec<u8>, parms: &Dictionary) -> Result<Vec<u8>> {
    let predictor = parms.get_int("Predictor").unwrap_or(1);
    if predictor <= 1 {
        return Ok(data);
    }

    let columns = parms.get_int("Columns").unwrap_or(1) as usize;
    let colors = parms.get_int("Colors").unwrap_or(1) as usize;
    let bits = parms.get_int("BitsPerComponent").unwrap_or(8) as usize;

    if predictor == 2 {
        return tiff_predictor(data, columns, colors, bits);
    }
    if predictor >= 10 {
        return png_predictor(&data, columns, colors, bits);
    }
    Err(PdfError::Unsupported(format!("predictor {predictor}")))
}

/// TIFF predictor 2: each sample is stored as a difference from the sample
/// to its left. Only 8-bit components are handled.
fn tiff_predictor(mut data: Vec<u8>, columns: usize, colors: usize, bits: usize) -> Result<Vec<u8>> {
    if bits != 8 {
        return Err(PdfError::Unsupported(format!(
            "TIFF predictor with {bits} bits per component"
        )));
    }
    let row_bytes = columns * colors;
    if row_bytes == 0 {
        return Ok(data);
    }
    for row in data.chunks_mut(row_bytes) {
        for i in colors..row.len() {
            row[i] = row[i].wrapping_add(row[i - colors]);
        }
    }
    Ok(data)
}

/// PNG predictors (types None/Sub/Up/Average/Paeth), one filter byte per row.
fn png_predictor(data: &[u8], columns: usize, colors: usize, bits: usize) -> Result<Vec<u8>> {
    let row_bytes = columns * colors * bits / 8;
    let bpp = std::cmp::max(1, colors * bits / 8);
    let row_size = row_bytes + 1;

    let mut out = Vec::with_capacity(data.len());
    let mut prev_row = vec![0u8; row_bytes];

    for row_start in (0..data.len()).step_by(row_size) {
        if row_start + row_size > data.len() {
            break;
        }

        let filter_type = data[row_start];
        let row_data = &data[row_start + 1..row_start + row_size];
        let mut row = vec![0u8; row_bytes];

        match filter_type {
            0 => row.copy_from_slice(row_data),
            1 => {
                for i in 0..row_bytes {
                    let left = if i >= bpp { row[i - bpp] } else { 0 };
                    row[i] = row_data[i].wrapping_add(left);
                }
            }
            2 => {
                for i in 0..row_bytes {
                    row[i] = row_data[i].wrapping_add(prev_row[i]);
                }
            }
            3 => {
                for i in 0..row_bytes {
                    let left = if i >= bpp { row[i - bpp] as u16 } else { 0 };
                    let above = prev_row[i] as u16;
                    row[i] = row_data[i].wrapping_add(((left + above) / 2) as u8);
                }
            }
            4 => {
                for i in 0..row_bytes {
                    let left = if i >= bpp { row[i - bpp] } else { 0 };
                    let above = prev_row[i];
                    let upper_left = if i >= bpp { prev_row[i - bpp] } else { 0 };
                    row[i] = row_data[i].wrapping_add(paeth(left, above, upper_left));
                }
            }
            _ => row.copy_from_slice(row_data),
        }

        out.extend_from_slice(&row);
        prev_row = row;
    }

    Ok(out)
}

fn paeth(left: u8, above: u8, upper_left: u8) -> u8 {
    let (a, b, c) = (left as i32, above as i32, upper_left as i32);
    let p = a + b - c;
    let pa = (p - a).abs();
    let pb = (p - b).abs();
    let pc = (p - c).abs();

    if pa <= pb && pa <= pc {
        left
    } else if pb <= pc {
        above
    } else {
        upper_left
    }
}
