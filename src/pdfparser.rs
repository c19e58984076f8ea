//! PDF object syntax parser.
//!
//! A recursive descent parser over a buffered byte source. Damaged input is
//! the normal case: every production returns whatever it accumulated before
//! the input ran out, and composite readers stop on the first parse error
//! instead of bubbling it up. Strings are decrypted inline through the
//! `Decryptor` threaded into every string-reading path; `Decryptor::Identity`
//! is the sentinel for unencrypted content.

use crate::error::{PdfError, Result};
use crate::filters::decode_stream;
use crate::pdftypes::{Array, Dictionary, Keyword, Object, Reference};
use crate::reader::ByteReader;
use crate::security::Decryptor;
use std::io::{Read, Seek};

pub(crate) const WHITESPACE: &[u8] = b"\x00\t\n\x0c\r ";
pub(crate) const DELIMITERS: &[u8] = b"()<>[]/%";

pub(crate) fn is_whitespace(b: u8) -> bool {
    WHITESPACE.contains(&b)
}

pub(crate) fn is_delimiter(b: u8) -> bool {
    DELIMITERS.contains(&b)
}

fn hex_value(b: u8) -> Option<u8> {
    match b {
        b'0'..=b'9' => Some(b - b'0'),
        b'a'..=b'f' => Some(b - b'a' + 10),
        b'A'..=b'F' => Some(b - b'A' + 10),
        _ => None,
    }
}

/// Parser over a seekable byte source.
pub struct PdfParser<R> {
    reader: ByteReader<R>,
}

impl<R: Read + Seek> PdfParser<R> {
    pub fn new(source: R) -> Self {
        Self {
            reader: ByteReader::new(source),
        }
    }

    /// Current logical offset in the source.
    pub fn offset(&self) -> u64 {
        self.reader.offset()
    }

    pub fn seek(&mut self, offset: u64) -> Result<u64> {
        self.reader.seek(offset)
    }

    pub fn seek_end(&mut self) -> Result<u64> {
        self.reader.seek_end()
    }

    pub fn read(&mut self, out: &mut [u8]) -> Result<usize> {
        self.reader.read(out)
    }

    /// Skip any mix of whitespace and `%` comments.
    pub fn consume_whitespace(&mut self) {
        loop {
            let Ok(b) = self.reader.read_byte() else {
                return;
            };
            if b == b'%' {
                self.consume_comment();
            } else if !is_whitespace(b) {
                self.reader.unread_byte();
                return;
            }
        }
    }

    /// Skip to the end of a comment line (`\n`, `\r`, or `\r\n`).
    fn consume_comment(&mut self) {
        loop {
            let Ok(b) = self.reader.read_byte() else {
                return;
            };
            if b == b'\n' {
                return;
            }
            if b == b'\r' {
                match self.reader.read_byte() {
                    Ok(b'\n') => {}
                    Ok(_) => self.reader.unread_byte(),
                    Err(_) => {}
                }
                return;
            }
        }
    }

    /// Read an unsigned integer. No sign handling; the position is restored
    /// to the offending byte on mismatch.
    pub fn read_int(&mut self) -> Result<i64> {
        self.consume_whitespace();

        let b = match self.reader.read_byte() {
            Ok(b) => b,
            Err(_) => return Err(PdfError::expected("int")),
        };
        if !b.is_ascii_digit() {
            self.reader.unread_byte();
            return Err(PdfError::expected("int"));
        }

        let mut value = (b - b'0') as i64;
        loop {
            let Ok(b) = self.reader.read_byte() else {
                break;
            };
            if !b.is_ascii_digit() {
                self.reader.unread_byte();
                break;
            }
            value = value.wrapping_mul(10).wrapping_add((b - b'0') as i64);
        }
        Ok(value)
    }

    /// Read a number: optional `+`/`-`, digits around at most one `.`. The
    /// value is accumulated in floats; integers are a representable subset.
    pub fn read_number(&mut self) -> Result<f64> {
        self.consume_whitespace();

        let mut value = 0.0f64;
        let mut is_real = false;
        let mut is_negative = false;

        let b = self.reader.read_byte().map_err(|_| PdfError::Read)?;
        match b {
            b'-' => is_negative = true,
            b'0'..=b'9' => value = (b - b'0') as f64,
            b'.' => is_real = true,
            b'+' => {}
            _ => {
                self.reader.unread_byte();
                return Err(PdfError::expected("number"));
            }
        }

        while !is_real {
            let Ok(b) = self.reader.read_byte() else {
                break;
            };
            match b {
                b'0'..=b'9' => value = value * 10.0 + (b - b'0') as f64,
                b'.' => is_real = true,
                _ => {
                    self.reader.unread_byte();
                    break;
                }
            }
        }

        if is_real {
            let mut divisor = 10.0f64;
            loop {
                let Ok(b) = self.reader.read_byte() else {
                    break;
                };
                if b.is_ascii_digit() {
                    value += (b - b'0') as f64 / divisor;
                    divisor *= 10.0;
                } else {
                    self.reader.unread_byte();
                    break;
                }
            }
        }

        Ok(if is_negative { -value } else { value })
    }

    /// Read a keyword: a run of non-whitespace, non-delimiter bytes. Text
    /// outside the keyword set yields the `Null` sentinel.
    pub fn read_keyword(&mut self) -> Keyword {
        self.consume_whitespace();

        let mut keyword = Vec::new();
        loop {
            let Ok(b) = self.reader.read_byte() else {
                break;
            };
            if is_whitespace(b) || is_delimiter(b) {
                self.reader.unread_byte();
                break;
            }
            keyword.push(b);
        }

        Keyword::from_bytes(&keyword)
    }

    /// Read a name. `#HH` escapes resolve to a single byte; missing hex
    /// digits default to `0`. An unterminated name yields the bytes
    /// accumulated so far.
    pub fn read_name(&mut self) -> Result<String> {
        self.consume_whitespace();

        let mut name = Vec::new();
        let b = self.reader.read_byte().map_err(|_| PdfError::Read)?;
        if b != b'/' {
            return Err(PdfError::expected("/"));
        }

        loop {
            let Ok(mut b) = self.reader.read_byte() else {
                break;
            };
            if is_whitespace(b) || is_delimiter(b) {
                self.reader.unread_byte();
                break;
            }

            if b == b'#' {
                let mut code = [b'0', b'0'];
                for slot in code.iter_mut() {
                    let Ok(digit) = self.reader.read_byte() else {
                        break;
                    };
                    if hex_value(digit).is_none() {
                        self.reader.unread_byte();
                        break;
                    }
                    *slot = digit;
                }
                b = hex_value(code[0]).unwrap() * 16 + hex_value(code[1]).unwrap();
            }

            name.push(b);
        }

        Ok(String::from_utf8_lossy(&name).into_owned())
    }

    /// Read a literal string, decrypting the accumulated bytes. Unterminated
    /// strings return what was collected without error.
    pub fn read_string(&mut self, decryptor: &Decryptor) -> Result<Vec<u8>> {
        self.consume_whitespace();

        let mut s = Vec::new();
        let b = self.reader.read_byte().map_err(|_| PdfError::Read)?;
        if b != b'(' {
            return Err(PdfError::expected("("));
        }

        let mut open_parens = 1;
        loop {
            let Ok(b) = self.reader.read_byte() else {
                return Ok(decryptor.decrypt(&s));
            };

            if b == b'\\' {
                let Ok(mut b) = self.reader.read_byte() else {
                    s.push(b'\\');
                    return Ok(decryptor.decrypt(&s));
                };

                // escaped line breaks produce nothing
                if b == b'\n' {
                    continue;
                }
                if b == b'\r' {
                    match self.reader.read_byte() {
                        Ok(b'\n') => {}
                        Ok(_) => self.reader.unread_byte(),
                        Err(_) => return Ok(decryptor.decrypt(&s)),
                    }
                    continue;
                }

                b = match b {
                    b'n' => b'\n',
                    b'r' => b'\r',
                    b't' => b'\t',
                    b'b' => 0x08,
                    b'f' => 0x0c,
                    other => other,
                };

                if (b'0'..=b'7').contains(&b) {
                    let mut code = vec![b];
                    for _ in 0..2 {
                        let Ok(digit) = self.reader.read_byte() else {
                            break;
                        };
                        if !(b'0'..=b'7').contains(&digit) {
                            self.reader.unread_byte();
                            break;
                        }
                        code.push(digit);
                    }
                    let mut value: u32 = 0;
                    for &digit in &code {
                        value = value * 8 + (digit - b'0') as u32;
                    }
                    // overflow drops the last digit, which returns to the input
                    if value > 0xff {
                        self.reader.unread_byte();
                        value = 0;
                        for &digit in &code[..code.len() - 1] {
                            value = value * 8 + (digit - b'0') as u32;
                        }
                    }
                    b = value as u8;
                }

                s.push(b);
                continue;
            }

            if b == b'(' {
                open_parens += 1;
            } else if b == b')' {
                open_parens -= 1;
                if open_parens == 0 {
                    break;
                }
            }

            s.push(b);
        }

        Ok(decryptor.decrypt(&s))
    }

    /// Read a hex string, decrypting the accumulated bytes. An odd trailing
    /// digit is right-padded with `0`; non-hex bytes are skipped.
    pub fn read_hex_string(&mut self, decryptor: &Decryptor) -> Result<Vec<u8>> {
        self.consume_whitespace();

        let mut s = Vec::new();
        let b = self.reader.read_byte().map_err(|_| PdfError::Read)?;
        if b != b'<' {
            return Err(PdfError::expected("<"));
        }

        loop {
            let mut code = [b'0', b'0'];
            let mut filled = 0;
            while filled < 2 {
                self.consume_whitespace();
                let b = match self.reader.read_byte() {
                    Ok(b'>') | Err(_) => {
                        if filled > 0 {
                            s.push(hex_value(code[0]).unwrap() * 16 + hex_value(code[1]).unwrap());
                        }
                        return Ok(decryptor.decrypt(&s));
                    }
                    Ok(b) => b,
                };
                if hex_value(b).is_none() {
                    continue;
                }
                code[filled] = b;
                filled += 1;
            }
            s.push(hex_value(code[0]).unwrap() * 16 + hex_value(code[1]).unwrap());
        }
    }

    /// Read the next object value, dispatching on the next two bytes.
    ///
    /// A closing `]` or `>>` surfaces as the matching end-of-composite
    /// sentinel; end of input surfaces as `Read`. `N G R` sequences become
    /// references via a speculative probe that rewinds on a miss.
    pub fn read_object(&mut self, decryptor: &Decryptor) -> Result<Object> {
        self.consume_whitespace();

        let b = self.reader.peek(2).to_vec();
        if b.is_empty() {
            return Err(PdfError::Read);
        }

        if b[0] == b'/' {
            return self.read_name().map(Object::Name);
        }

        if b[0] == b'[' {
            return self.read_array(decryptor).map(Object::Array);
        }
        if b[0] == b']' {
            self.reader.discard(1);
            return Err(PdfError::EndOfArray);
        }

        if b[0] == b'(' {
            return self.read_string(decryptor).map(Object::String);
        }

        if b.starts_with(b"<<") {
            return self.read_dictionary(decryptor).map(Object::Dictionary);
        }
        if b.starts_with(b">>") {
            self.reader.discard(2);
            return Err(PdfError::EndOfDictionary);
        }

        if b[0] == b'<' {
            return self.read_hex_string(decryptor).map(Object::String);
        }

        if b[0].is_ascii_digit() || b[0] == b'+' || b[0] == b'-' || b[0] == b'.' {
            let number = self.read_number()?;

            // speculative reference probe: an integer and the keyword R must
            // follow, otherwise rewind to just after the number
            let checkpoint = self.reader.offset();
            if let Ok(generation) = self.read_int() {
                if self.read_keyword() == Keyword::R {
                    return Ok(Object::Reference(Reference::new(
                        number as i64,
                        generation,
                    )));
                }
            }
            self.reader.seek(checkpoint)?;
            return Ok(Object::Number(number));
        }

        let keyword = self.read_keyword_making_progress()?;
        Ok(match keyword {
            Keyword::True => Object::Boolean(true),
            Keyword::False => Object::Boolean(false),
            Keyword::Null => Object::Null,
            other => Object::Keyword(other),
        })
    }

    /// Keyword fallback for `read_object`. A stray delimiter would make the
    /// keyword reader consume nothing; discard it and fail so composite
    /// loops terminate.
    fn read_keyword_making_progress(&mut self) -> Result<Keyword> {
        let before = self.reader.offset();
        let keyword = self.read_keyword();
        if self.reader.offset() == before {
            self.reader.discard(1);
            return Err(PdfError::expected("object"));
        }
        Ok(keyword)
    }

    /// Read an array. Elements accumulate until `]`, end of input, or a
    /// parse error; all three return the elements collected so far.
    pub fn read_array(&mut self, decryptor: &Decryptor) -> Result<Array> {
        self.consume_whitespace();

        let mut array = Array::new();
        let b = self.reader.read_byte().map_err(|_| PdfError::Read)?;
        if b != b'[' {
            return Err(PdfError::expected("["));
        }

        loop {
            match self.read_object(decryptor) {
                Ok(element) => array.push(element),
                Err(_) => break,
            }
        }

        Ok(array)
    }

    /// Read a dictionary. Non-name keys are dropped while scanning
    /// continues; a key whose value parse hits end of input or `>>` is still
    /// inserted (as null) to preserve partial information from truncated
    /// files.
    pub fn read_dictionary(&mut self, decryptor: &Decryptor) -> Result<Dictionary> {
        self.consume_whitespace();

        let mut dictionary = Dictionary::new();
        let mut marker = [0u8; 2];
        if self.reader.read(&mut marker)? != 2 {
            return Err(PdfError::Read);
        }
        if &marker != b"<<" {
            return Err(PdfError::expected("<<"));
        }

        loop {
            let key = match self.read_object(decryptor) {
                Ok(Object::Name(name)) => name,
                Ok(_) => continue,
                Err(_) => break,
            };

            match self.read_object(decryptor) {
                Ok(value) => {
                    dictionary.insert(key, value);
                }
                Err(PdfError::EndOfArray) => {
                    dictionary.insert(key, Object::Null);
                }
                Err(_) => {
                    dictionary.insert(key, Object::Null);
                    break;
                }
            }
        }

        Ok(dictionary)
    }

    /// Read an object header (`N G obj`), returning the object number and
    /// generation.
    pub fn read_object_header(&mut self) -> Result<(i64, i64)> {
        let number = self.read_int()?;
        let generation = self.read_int()?;
        if self.read_keyword() != Keyword::Obj {
            return Err(PdfError::expected("obj keyword"));
        }
        Ok((number, generation))
    }

    /// Read raw stream bytes following the `stream` keyword, decrypt them,
    /// and apply the decode filter chain.
    ///
    /// The raw bytes run to the literal `endstream` marker, found with a
    /// 9-byte rolling window; the line terminator preceding the marker is
    /// trimmed. A failing decoder stops the chain and the partially decoded
    /// bytes are returned.
    pub fn read_stream(
        &mut self,
        decryptor: &Decryptor,
        filters: &[(String, Dictionary)],
    ) -> Vec<u8> {
        let mut data = Vec::new();

        // skip the line terminator after the stream keyword
        loop {
            let Ok(b) = self.reader.read_byte() else {
                return data;
            };
            if b == b'\n' {
                break;
            }
            if b == b'\r' {
                match self.reader.read_byte() {
                    Ok(b'\n') => {}
                    Ok(_) => self.reader.unread_byte(),
                    Err(_) => return data,
                }
                break;
            }
        }

        // 9-byte window: bytes shift out of the window into the payload
        // until the window spells endstream
        let mut window = [0u8; 9];
        let filled = self.read(&mut window).unwrap_or(0);
        let mut window = window[..filled].to_vec();

        loop {
            if window == b"endstream" {
                if data.ends_with(b"\r\n") {
                    data.truncate(data.len() - 2);
                } else if data.ends_with(b"\n") || data.ends_with(b"\r") {
                    data.truncate(data.len() - 1);
                }
                break;
            }

            if window.is_empty() {
                break;
            }
            data.push(window.remove(0));

            match self.reader.read_byte() {
                Ok(b) => window.push(b),
                Err(_) => {
                    data.extend_from_slice(&window);
                    break;
                }
            }
        }

        let mut data = decryptor.decrypt(&data);

        for (filter, parms) in filters {
            match decode_stream(filter, &data, parms) {
                Ok(decoded) => data = decoded,
                Err(err) => {
                    log::debug!("failed to decode stream: {err}");
                    return data;
                }
            }
        }

        data
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn parser(data: &[u8]) -> PdfParser<Cursor<Vec<u8>>> {
        PdfParser::new(Cursor::new(data.to_vec()))
    }

    fn parse_one(data: &[u8]) -> Result<Object> {
        parser(data).read_object(&Decryptor::Identity)
    }

    #[test]
    fn test_comments_are_whitespace() {
        let obj = parse_one(b"% leading comment\n  42").unwrap();
        assert_eq!(obj, Object::Number(42.0));
    }

    #[test]
    fn test_comment_inside_string_is_content() {
        let obj = parse_one(b"(%this is not a comment)").unwrap();
        assert_eq!(obj, Object::String(b"%this is not a comment".to_vec()));
    }

    #[test]
    fn test_empty_composites() {
        assert_eq!(parse_one(b"[]").unwrap(), Object::Array(Array::new()));
        assert_eq!(
            parse_one(b"<<>>").unwrap(),
            Object::Dictionary(Dictionary::new())
        );
    }

    #[test]
    fn test_numbers() {
        assert_eq!(parse_one(b"123").unwrap(), Object::Number(123.0));
        assert_eq!(parse_one(b"+17").unwrap(), Object::Number(17.0));
        assert_eq!(parse_one(b"-98").unwrap(), Object::Number(-98.0));
        assert_eq!(parse_one(b"34.5").unwrap(), Object::Number(34.5));
        assert_eq!(parse_one(b"-.002").unwrap(), Object::Number(-0.002));
        assert_eq!(parse_one(b"4.").unwrap(), Object::Number(4.0));
    }

    #[test]
    fn test_number_precision_drift_is_bounded() {
        let Object::Number(n) = parse_one(b"0.1234567").unwrap() else {
            panic!("expected number");
        };
        assert!((n - 0.1234567).abs() < 1e-9);
    }

    #[test]
    fn test_name_hex_escapes() {
        // #20 is an escaped space, #2F an escaped slash, #00 a NUL
        assert_eq!(
            parse_one(b"/Hello#20#2FWorld!#00#7Aqz ").unwrap(),
            Object::Name("Hello /World!\x00zqz".into())
        );
    }

    #[test]
    fn test_name_partial_hex_escape() {
        // one hex digit then EOF: right-padded with 0
        assert_eq!(parse_one(b"/#3").unwrap(), Object::Name("0".into()));
        // bare # then EOF: both digits default
        assert_eq!(parse_one(b"/#").unwrap(), Object::Name("\x00".into()));
    }

    #[test]
    fn test_unclosed_name_at_eof() {
        assert_eq!(parse_one(b"/Foo").unwrap(), Object::Name("Foo".into()));
        assert_eq!(parse_one(b"/").unwrap(), Object::Name("".into()));
    }

    #[test]
    fn test_string_escapes() {
        assert_eq!(
            parse_one(b"(tab\\there)").unwrap(),
            Object::String(b"tab\there".to_vec())
        );
        assert_eq!(
            parse_one(b"(\\(balanced\\))").unwrap(),
            Object::String(b"(balanced)".to_vec())
        );
        // unknown escapes keep the literal byte
        assert_eq!(parse_one(b"(\\q)").unwrap(), Object::String(b"q".to_vec()));
    }

    #[test]
    fn test_string_nested_parens() {
        assert_eq!(
            parse_one(b"(a(b(c))d)").unwrap(),
            Object::String(b"a(b(c))d".to_vec())
        );
    }

    #[test]
    fn test_string_octal_escapes() {
        assert_eq!(
            parse_one(b"(\\101\\102)").unwrap(),
            Object::String(b"AB".to_vec())
        );
        // short code terminated by a non-octal byte
        assert_eq!(
            parse_one(b"(\\12x)").unwrap(),
            Object::String(b"\nx".to_vec())
        );
        // overflow drops the last digit, which becomes content
        assert_eq!(
            parse_one(b"(\\777)").unwrap(),
            Object::String(b"\x3f7".to_vec())
        );
    }

    #[test]
    fn test_string_line_continuations() {
        assert_eq!(
            parse_one(b"(one\\\ntwo)").unwrap(),
            Object::String(b"onetwo".to_vec())
        );
        assert_eq!(
            parse_one(b"(one\\\r\ntwo)").unwrap(),
            Object::String(b"onetwo".to_vec())
        );
        assert_eq!(
            parse_one(b"(one\\\rtwo)").unwrap(),
            Object::String(b"onetwo".to_vec())
        );
    }

    #[test]
    fn test_unclosed_string_returns_partial() {
        assert_eq!(parse_one(b"(").unwrap(), Object::String(Vec::new()));
        assert_eq!(
            parse_one(b"(partial").unwrap(),
            Object::String(b"partial".to_vec())
        );
        // trailing backslash at EOF is kept literally
        assert_eq!(
            parse_one(b"(\\").unwrap(),
            Object::String(b"\\".to_vec())
        );
    }

    #[test]
    fn test_hex_strings() {
        assert_eq!(
            parse_one(b"<48656C6C6F>").unwrap(),
            Object::String(b"Hello".to_vec())
        );
        assert_eq!(
            parse_one(b"<48 65 6c 6c 6f>").unwrap(),
            Object::String(b"Hello".to_vec())
        );
        // odd digit right-padded with zero
        assert_eq!(
            parse_one(b"<48656C6C6F7>").unwrap(),
            Object::String(b"Hellop".to_vec())
        );
        // non-hex bytes skipped
        assert_eq!(
            parse_one(b"<48g65!6cZ6c 6f>").unwrap(),
            Object::String(b"Hello".to_vec())
        );
        assert_eq!(parse_one(b"<>").unwrap(), Object::String(Vec::new()));
        // unterminated at EOF
        assert_eq!(parse_one(b"<4865").unwrap(), Object::String(b"He".to_vec()));
    }

    #[test]
    fn test_reference_probe() {
        assert_eq!(
            parse_one(b"12 0 R").unwrap(),
            Object::Reference(Reference::new(12, 0))
        );
        // multi-digit generation
        assert_eq!(
            parse_one(b"3 65535 R").unwrap(),
            Object::Reference(Reference::new(3, 65535))
        );
    }

    #[test]
    fn test_probe_rewinds_on_miss() {
        // N G keyword-other-than-R: the first number stands alone and the
        // cursor is restored right after it
        let mut p = parser(b"612 792 true");
        assert_eq!(
            p.read_object(&Decryptor::Identity).unwrap(),
            Object::Number(612.0)
        );
        assert_eq!(
            p.read_object(&Decryptor::Identity).unwrap(),
            Object::Number(792.0)
        );
        assert_eq!(
            p.read_object(&Decryptor::Identity).unwrap(),
            Object::Boolean(true)
        );
    }

    #[test]
    fn test_probe_rewinds_without_second_int() {
        let mut p = parser(b"45/Hidden");
        assert_eq!(
            p.read_object(&Decryptor::Identity).unwrap(),
            Object::Number(45.0)
        );
        assert_eq!(
            p.read_object(&Decryptor::Identity).unwrap(),
            Object::Name("Hidden".into())
        );
    }

    #[test]
    fn test_keywords() {
        assert_eq!(parse_one(b"true").unwrap(), Object::Boolean(true));
        assert_eq!(parse_one(b"false").unwrap(), Object::Boolean(false));
        assert_eq!(parse_one(b"null").unwrap(), Object::Null);
        // unknown keyword text maps to the null sentinel
        assert_eq!(parse_one(b"garbage").unwrap(), Object::Null);
        assert_eq!(
            parse_one(b"endstream").unwrap(),
            Object::Keyword(Keyword::EndStream)
        );
    }

    #[test]
    fn test_array_contents() {
        let Object::Array(array) = parse_one(b"[1 (two) /Three 4 0 R [5]]").unwrap() else {
            panic!("expected array");
        };
        assert_eq!(array.len(), 5);
        assert_eq!(array.get_int(0).unwrap(), 1);
        assert_eq!(array.get_bytes(1).unwrap(), b"two");
        assert_eq!(array.get_name(2).unwrap(), "Three");
        assert_eq!(array.get_reference(3).unwrap(), Reference::new(4, 0));
        assert_eq!(array.get_array(4).unwrap().get_int(0).unwrap(), 5);
    }

    #[test]
    fn test_unclosed_array_terminates() {
        let Object::Array(array) = parse_one(b"[1 2").unwrap() else {
            panic!("expected array");
        };
        assert_eq!(array.len(), 2);
        assert_eq!(parse_one(b"[").unwrap(), Object::Array(Array::new()));
    }

    #[test]
    fn test_dictionary_contents() {
        let Object::Dictionary(dict) = parse_one(b"<</Type /Page /Count 3>>").unwrap() else {
            panic!("expected dictionary");
        };
        assert_eq!(dict.get_name("Type").unwrap(), "Page");
        assert_eq!(dict.get_int("Count").unwrap(), 3);
    }

    #[test]
    fn test_dictionary_drops_malformed_key() {
        // the number 45 in key position is dropped, scanning continues
        let Object::Dictionary(dict) =
            parse_one(b"<</MalformedReference 45/HiddenObject (Hello World)>>").unwrap()
        else {
            panic!("expected dictionary");
        };
        assert_eq!(dict.get_int("MalformedReference").unwrap(), 45);
        assert_eq!(dict.get_bytes("HiddenObject").unwrap(), b"Hello World");
        assert_eq!(dict.len(), 2);
    }

    #[test]
    fn test_unclosed_dictionary_key_keeps_pair() {
        let Object::Dictionary(dict) = parse_one(b"<</Size").unwrap() else {
            panic!("expected dictionary");
        };
        assert_eq!(dict.len(), 1);
        assert!(dict.get("Size").unwrap().is_null());
    }

    #[test]
    fn test_unclosed_dictionary_terminates() {
        assert_eq!(
            parse_one(b"<<").unwrap(),
            Object::Dictionary(Dictionary::new())
        );
    }

    #[test]
    fn test_read_object_positions_cursor_after_value() {
        let mut p = parser(b"/First(second)[3]<</F 4>>five");
        assert_eq!(
            p.read_object(&Decryptor::Identity).unwrap(),
            Object::Name("First".into())
        );
        assert_eq!(
            p.read_object(&Decryptor::Identity).unwrap(),
            Object::String(b"second".to_vec())
        );
        assert!(matches!(
            p.read_object(&Decryptor::Identity).unwrap(),
            Object::Array(_)
        ));
        assert!(matches!(
            p.read_object(&Decryptor::Identity).unwrap(),
            Object::Dictionary(_)
        ));
        assert_eq!(p.read_object(&Decryptor::Identity).unwrap(), Object::Null);
    }

    #[test]
    fn test_object_header() {
        let mut p = parser(b"10 0 obj\n<<>>");
        assert_eq!(p.read_object_header().unwrap(), (10, 0));
        let mut p = parser(b"10 0 xyz");
        assert!(p.read_object_header().is_err());
    }

    #[test]
    fn test_stream_reader_basic() {
        let mut p = parser(b"stream\nHello World\nendstream");
        p.read_keyword();
        let data = p.read_stream(&Decryptor::Identity, &[]);
        assert_eq!(data, b"Hello World");
    }

    #[test]
    fn test_stream_terminator_variants() {
        // payload followed immediately by \r + endstream
        let mut p = parser(b"stream\nHello\rendstream");
        p.read_keyword();
        assert_eq!(p.read_stream(&Decryptor::Identity, &[]), b"Hello");

        let mut p = parser(b"stream\r\nHello\r\nendstream");
        p.read_keyword();
        assert_eq!(p.read_stream(&Decryptor::Identity, &[]), b"Hello");

        // a \r not followed by \n after the stream keyword leaves content
        let mut p = parser(b"stream\rXY\nendstream");
        p.read_keyword();
        assert_eq!(p.read_stream(&Decryptor::Identity, &[]), b"XY");
    }

    #[test]
    fn test_stream_without_terminator_runs_to_eof() {
        let mut p = parser(b"stream\ntruncated payload");
        p.read_keyword();
        assert_eq!(
            p.read_stream(&Decryptor::Identity, &[]),
            b"truncated payload"
        );
    }

    #[test]
    fn test_stream_shorter_than_window() {
        let mut p = parser(b"stream\nab");
        p.read_keyword();
        assert_eq!(p.read_stream(&Decryptor::Identity, &[]), b"ab");
    }

    #[test]
    fn test_stream_containing_endstream_like_text() {
        let mut p = parser(b"stream\nendstrea_\nendstream");
        p.read_keyword();
        assert_eq!(p.read_stream(&Decryptor::Identity, &[]), b"endstrea_");
    }
}
