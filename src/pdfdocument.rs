//! PDF document facade.
//!
//! Owns the byte source, the cross-reference map, the merged trailer, and
//! the optional security handler. Opening locates and loads the xref chain
//! (tables and streams), validates that entries point at real object
//! headers, and falls back to a full-file scan when anything goes wrong;
//! a document opens successfully as long as at least one object is
//! discoverable. Objects are then read on demand and never cached.

use crate::error::{PdfError, Result};
use crate::pdfparser::PdfParser;
use crate::pdftypes::{Dictionary, IndirectObject, Keyword, Object};
use crate::security::{Decryptor, SecurityHandler};
use once_cell::sync::Lazy;
use regex::bytes::Regex;
use rustc_hash::{FxHashMap, FxHashSet};
use std::fs::File;
use std::io::{Read, Seek};
use std::path::Path;

/// How many trailing bytes are searched for the startxref marker.
const START_XREF_SCAN_SIZE: u64 = 256;

static START_XREF_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?-u)startxref\s*(\d+)\s*%%EOF").unwrap());

/// Object header pattern for xref repair. Whitespace, NULs, and whole
/// `%` comments may separate the two integers and the obj keyword.
static OBJ_HEADER_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?-u)(\d+)(?:[\s\x00]|%[^\n]*\n)+(\d+)(?:[\s\x00]|%[^\n]*\n)+obj").unwrap()
});

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum XrefType {
    /// Slot not in use.
    Free,
    /// Indirect object located at `offset`.
    InUse,
    /// Object packed inside another object's stream; `offset` holds the
    /// container object number and `generation` the index within it.
    Compressed,
}

/// Location of an object in the file.
#[derive(Debug, Clone)]
pub struct XrefEntry {
    pub offset: i64,
    pub generation: i64,
    pub kind: XrefType,
    /// Cleared for xref-stream carriers and the Encrypt dictionary itself.
    pub is_encrypted: bool,
    /// Set by the collaborator walking EmbeddedFiles so the embedded-file
    /// crypt filter applies.
    pub is_embedded_file: bool,
}

impl XrefEntry {
    fn new(offset: i64, generation: i64, kind: XrefType) -> Self {
        Self {
            offset,
            generation,
            kind,
            is_encrypted: true,
            is_embedded_file: false,
        }
    }
}

/// PDF document: access to every indirect object the file contains.
pub struct PdfDocument<R> {
    parser: PdfParser<R>,
    xref: FxHashMap<i64, XrefEntry>,
    trailer: Dictionary,
    security_handler: Option<SecurityHandler>,
}

impl PdfDocument<File> {
    /// Open a PDF file. The empty password means "try the default empty
    /// password"; a wrong password is a fatal open error.
    pub fn open(path: impl AsRef<Path>, password: &str) -> Result<Self> {
        Self::new(File::open(path)?, password)
    }
}

impl<R: Read + Seek> PdfDocument<R> {
    /// Open a PDF from any seekable byte source.
    pub fn new(source: R, password: &str) -> Result<Self> {
        let mut document = Self {
            parser: PdfParser::new(source),
            xref: FxHashMap::default(),
            trailer: Dictionary::new(),
            security_handler: None,
        };
        document.load(password)?;
        Ok(document)
    }

    fn load(&mut self, password: &str) -> Result<()> {
        let mut loaded = false;
        match self.start_xref_offset() {
            Ok(offset) => {
                log::debug!("startxref at {offset}");
                let mut visited = FxHashSet::default();
                match self.load_xref(offset, &mut visited) {
                    Ok(()) => {
                        if self.validate_xref() {
                            loaded = true;
                        } else {
                            log::debug!("xref entries do not point at objects");
                        }
                    }
                    Err(err) => log::debug!("failed to load xref: {err}"),
                }
            }
            Err(err) => log::debug!("startxref not found: {err}"),
        }

        if !loaded || self.xref.is_empty() {
            self.repair_xref()?;
            if self.xref.is_empty() {
                return Err(PdfError::corrupt("no objects found"));
            }
        }
        log::debug!("loaded {} xref entries", self.xref.len());

        if let Some(encrypt) = self.trailer.get("Encrypt").cloned() {
            log::debug!("document is encrypted");
            // the Encrypt dictionary itself is stored plaintext
            if let Object::Reference(reference) = &encrypt {
                if let Some(entry) = self.xref.get_mut(&reference.number) {
                    entry.is_encrypted = false;
                }
            }

            let doc_id: Vec<u8> = self
                .trailer
                .get_array("ID")
                .ok()
                .and_then(|ids| ids.get_bytes(0).ok().map(<[u8]>::to_vec))
                .ok_or_else(|| PdfError::corrupt("trailer missing ID"))?;

            let encrypt = self.resolve(&encrypt);
            let encrypt = encrypt
                .as_dict()
                .map_err(|_| PdfError::corrupt("Encrypt dictionary not found"))?;
            self.security_handler =
                Some(SecurityHandler::new(encrypt, &doc_id, password.as_bytes())?);
        }

        Ok(())
    }

    /// Find the startxref offset: the last `startxref N %%EOF` marker in
    /// the final bytes of the file.
    fn start_xref_offset(&mut self) -> Result<u64> {
        let file_len = self.parser.seek_end()?;
        let scan_start = file_len.saturating_sub(START_XREF_SCAN_SIZE);
        self.parser.seek(scan_start)?;

        let mut buffer = vec![0u8; START_XREF_SCAN_SIZE as usize];
        let have = self.parser.read(&mut buffer)?;
        let captures = START_XREF_RE
            .captures_iter(&buffer[..have])
            .last()
            .ok_or_else(|| PdfError::corrupt("startxref marker not found"))?;

        parse_digits(&captures[1])
            .try_into()
            .map_err(|_| PdfError::corrupt("startxref offset is not an offset"))
    }

    /// Load the xref section at `offset`, following `Prev` chains. The
    /// visited set breaks cycles on malformed chains.
    fn load_xref(&mut self, offset: u64, visited: &mut FxHashSet<u64>) -> Result<()> {
        if !visited.insert(offset) {
            return Ok(());
        }

        self.parser.seek(offset)?;
        if self.parser.read_keyword() == Keyword::Xref {
            return self.load_xref_table(visited);
        }

        self.parser.seek(offset)?;
        if let Ok((number, generation)) = self.parser.read_object_header() {
            return self.load_xref_stream(offset, number, generation, visited);
        }

        Err(PdfError::corrupt(format!(
            "expected xref table or stream at offset {offset}"
        )))
    }

    fn load_xref_table(&mut self, visited: &mut FxHashSet<u64>) -> Result<()> {
        let mut section: Vec<(i64, XrefEntry)> = Vec::new();
        loop {
            let subsection_start = match self.parser.read_int() {
                Ok(start) => start,
                Err(_) => {
                    if self.parser.read_keyword() == Keyword::Trailer {
                        break;
                    }
                    return Err(PdfError::expected("int or trailer keyword"));
                }
            };
            let count = self.parser.read_int()?;

            for i in 0..count {
                let offset = self.parser.read_int()?;
                let generation = self.parser.read_int()?;
                let kind = if self.parser.read_keyword() == Keyword::N {
                    XrefType::InUse
                } else {
                    XrefType::Free
                };
                section.push((subsection_start + i, XrefEntry::new(offset, generation, kind)));
            }
        }

        let trailer = self.parser.read_dictionary(&Decryptor::Identity)?;

        for (number, entry) in section {
            self.merge_entry(number, entry);
        }
        self.merge_trailer(&trailer);

        if let Ok(prev) = trailer.get_i64("Prev") {
            if let Ok(prev) = u64::try_from(prev) {
                return self.load_xref(prev, visited);
            }
        }
        Ok(())
    }

    fn load_xref_stream(
        &mut self,
        offset: u64,
        number: i64,
        generation: i64,
        visited: &mut FxHashSet<u64>,
    ) -> Result<()> {
        // the carrier holds the xref itself and must never be decrypted
        let mut own_entry = XrefEntry::new(offset as i64, generation, XrefType::InUse);
        own_entry.is_encrypted = false;
        self.xref.insert(number, own_entry);

        let trailer = self.parser.read_dictionary(&Decryptor::Identity)?;
        if self.parser.read_keyword() != Keyword::Stream {
            return Err(PdfError::expected("stream keyword"));
        }
        let filters = stream_filters(&trailer);
        let data = self.parser.read_stream(&Decryptor::Identity, &filters);

        self.merge_trailer(&trailer);

        if let Ok(prev) = trailer.get_i64("Prev") {
            if let Ok(prev) = u64::try_from(prev) {
                self.load_xref(prev, visited)?;
            }
        }

        let widths = trailer
            .get_array("W")
            .map_err(|_| PdfError::corrupt("xref stream missing W"))?;
        let type_width = field_width(widths.get_int(0))?;
        let offset_width = field_width(widths.get_int(1))?;
        let generation_width = field_width(widths.get_int(2))?;

        let index: Vec<(i64, i64)> = match trailer.get_array("Index") {
            Ok(index) => {
                let mut pairs = Vec::new();
                let mut i = 0;
                while i + 1 < index.len() {
                    pairs.push((index.get_int(i)?, index.get_int(i + 1)?));
                    i += 2;
                }
                pairs
            }
            Err(_) => {
                let size = trailer
                    .get_number("Size")
                    .map_err(|_| PdfError::corrupt("xref stream missing Size"))?;
                vec![(0, size as i64)]
            }
        };

        let mut pos = 0usize;
        for (subsection_start, count) in index {
            for j in 0..count {
                let entry_type = read_field(&data, &mut pos, type_width, 1)?;
                let field2 = read_field(&data, &mut pos, offset_width, 0)? as i64;
                let field3 = read_field(&data, &mut pos, generation_width, 0)? as i64;

                let kind = match entry_type {
                    1 => XrefType::InUse,
                    2 => XrefType::Compressed,
                    _ => XrefType::Free,
                };
                self.merge_entry(subsection_start + j, XrefEntry::new(field2, field3, kind));
            }
        }

        Ok(())
    }

    /// Replace an existing entry only when the incoming generation is
    /// strictly greater; sections are loaded newest-first.
    fn merge_entry(&mut self, number: i64, entry: XrefEntry) {
        match self.xref.get(&number) {
            Some(existing) if entry.generation <= existing.generation => {}
            _ => {
                self.xref.insert(number, entry);
            }
        }
    }

    /// Merge a section trailer into the document trailer; existing (newer)
    /// keys win.
    fn merge_trailer(&mut self, trailer: &Dictionary) {
        for (key, value) in trailer.iter() {
            if !self.trailer.contains(key) {
                self.trailer.insert(key.clone(), value.clone());
            }
        }
    }

    /// Verify every InUse entry points at a matching object header.
    fn validate_xref(&mut self) -> bool {
        let entries: Vec<(i64, i64)> = self
            .xref
            .iter()
            .filter(|(_, entry)| entry.kind == XrefType::InUse)
            .map(|(number, entry)| (*number, entry.offset))
            .collect();

        for (number, offset) in entries {
            let Ok(offset) = u64::try_from(offset) else {
                return false;
            };
            if self.parser.seek(offset).is_err() {
                return false;
            }
            match self.parser.read_object_header() {
                Ok((n, _)) if n == number => {}
                _ => return false,
            }
        }
        true
    }

    /// Rebuild the xref by scanning the whole file for object headers.
    /// Trailer fragments loaded before the failure are kept; `Prev` chains
    /// are never followed from here.
    fn repair_xref(&mut self) -> Result<()> {
        log::debug!("repairing xref");
        self.xref.clear();

        self.parser.seek(0)?;
        let mut data = Vec::new();
        let mut buf = [0u8; 64 * 1024];
        loop {
            let n = self.parser.read(&mut buf)?;
            if n == 0 {
                break;
            }
            data.extend_from_slice(&buf[..n]);
        }

        for captures in OBJ_HEADER_RE.captures_iter(&data) {
            let number = parse_digits(&captures[1]);
            let generation = parse_digits(&captures[2]);
            let offset = captures.get(0).unwrap().start() as i64;
            self.xref
                .insert(number, XrefEntry::new(offset, generation, XrefType::InUse));
        }

        log::debug!("repair found {} objects", self.xref.len());
        Ok(())
    }

    /// Read indirect object `number`. Free, compressed, and missing entries
    /// yield a synthetic object with a null value; parse failures inside
    /// the object degrade to partial values rather than errors.
    pub fn read_object(&mut self, number: i64) -> IndirectObject {
        log::debug!("reading object {number}");
        let mut object = IndirectObject::new(number);

        let Some(entry) = self.xref.get(&number).cloned() else {
            return object;
        };
        object.generation = entry.generation;
        if entry.kind != XrefType::InUse {
            return object;
        }

        let Ok(offset) = u64::try_from(entry.offset) else {
            return object;
        };
        if self.parser.seek(offset).is_err() {
            return object;
        }

        // header discrepancies are tolerated, the xref entry wins
        let _ = self.parser.read_object_header();

        let string_decryptor = match &self.security_handler {
            Some(handler) if entry.is_encrypted => {
                handler.string_decryptor(number, entry.generation)
            }
            _ => Decryptor::Identity,
        };
        object.value = self
            .parser
            .read_object(&string_decryptor)
            .unwrap_or(Object::Null);

        if self.parser.read_keyword() == Keyword::Stream {
            let dictionary = match &object.value {
                Object::Dictionary(dictionary) => dictionary.clone(),
                _ => Dictionary::new(),
            };
            let mut filters = stream_filters(&dictionary);

            let stream_decryptor = match &self.security_handler {
                Some(handler) if entry.is_encrypted => {
                    let mut filter = if entry.is_embedded_file {
                        handler.file_filter()
                    } else {
                        handler.stream_filter()
                    };
                    // a leading Crypt filter overrides the default and is
                    // consumed before decoding
                    if filters.first().is_some_and(|(name, _)| name == "Crypt") {
                        let (_, parms) = filters.remove(0);
                        let name = parms.get_name("Name").unwrap_or("Identity");
                        if let Some(named) = handler.crypt_filter(name) {
                            filter = named;
                        }
                    }
                    filter.decryptor(number, entry.generation)
                }
                _ => Decryptor::Identity,
            };

            object.stream = Some(self.parser.read_stream(&stream_decryptor, &filters));
        }

        object
    }

    /// Resolve an object, following references. A reference chain that
    /// revisits a node yields null; the visited set is fresh per call.
    pub fn resolve(&mut self, object: &Object) -> Object {
        let mut visited = FxHashSet::default();
        self.resolve_with(object, &mut visited)
    }

    fn resolve_with(
        &mut self,
        object: &Object,
        visited: &mut FxHashSet<(i64, i64)>,
    ) -> Object {
        match object {
            Object::Reference(reference) => {
                if !visited.insert((reference.number, reference.generation)) {
                    return Object::Null;
                }
                let indirect = self.read_object(reference.number);
                self.resolve_with(&indirect.value, visited)
            }
            other => other.clone(),
        }
    }

    /// Resolve an object down to decoded stream bytes. Objects without a
    /// stream (and cyclic chains) yield no bytes.
    pub fn resolve_stream(&mut self, object: &Object) -> Vec<u8> {
        let mut visited = FxHashSet::default();
        let mut current = object.clone();
        while let Object::Reference(reference) = current {
            if !visited.insert((reference.number, reference.generation)) {
                return Vec::new();
            }
            let indirect = self.read_object(reference.number);
            if let Some(stream) = indirect.stream {
                return stream;
            }
            current = indirect.value;
        }
        Vec::new()
    }

    /// All object numbers in the xref, sorted.
    pub fn object_numbers(&self) -> Vec<i64> {
        let mut numbers: Vec<i64> = self.xref.keys().copied().collect();
        numbers.sort_unstable();
        numbers
    }

    pub fn xref_len(&self) -> usize {
        self.xref.len()
    }

    pub fn xref_entry(&self, number: i64) -> Option<&XrefEntry> {
        self.xref.get(&number)
    }

    /// Collaborator hook: mark an object as an embedded file so the
    /// embedded-file crypt filter applies to its stream.
    pub fn set_embedded_file(&mut self, number: i64) {
        if let Some(entry) = self.xref.get_mut(&number) {
            entry.is_embedded_file = true;
        }
    }

    pub fn trailer(&self) -> &Dictionary {
        &self.trailer
    }

    pub fn is_encrypted(&self) -> bool {
        self.security_handler.is_some()
    }
}

/// Normalize `Filter`/`DecodeParms` into (filter, parms) pairs: either a
/// single name with an optional dictionary, or two parallel arrays.
fn stream_filters(dictionary: &Dictionary) -> Vec<(String, Dictionary)> {
    let filters: Vec<String> = match dictionary.get("Filter") {
        Some(Object::Name(name)) => vec![name.clone()],
        Some(Object::Array(names)) => names
            .iter()
            .filter_map(|object| object.as_name().ok().map(str::to_string))
            .collect(),
        _ => Vec::new(),
    };

    let parms: Vec<Dictionary> = match dictionary.get("DecodeParms") {
        Some(Object::Dictionary(parms)) => vec![parms.clone()],
        Some(Object::Array(list)) => list
            .iter()
            .map(|object| object.as_dict().cloned().unwrap_or_default())
            .collect(),
        _ => Vec::new(),
    };

    filters
        .into_iter()
        .enumerate()
        .map(|(i, filter)| (filter, parms.get(i).cloned().unwrap_or_default()))
        .collect()
}

fn field_width(width: Result<i64>) -> Result<usize> {
    let width = width.map_err(|_| PdfError::corrupt("xref stream W needs 3 elements"))?;
    if !(0..=8).contains(&width) {
        return Err(PdfError::corrupt(format!("xref stream field width {width}")));
    }
    Ok(width as usize)
}

/// Read a big-endian unsigned field of `width` bytes. Zero-width fields
/// take the column default (type=1, others 0).
fn read_field(data: &[u8], pos: &mut usize, width: usize, default: u64) -> Result<u64> {
    if width == 0 {
        return Ok(default);
    }
    if *pos + width > data.len() {
        return Err(PdfError::corrupt("xref stream data truncated"));
    }
    let mut value = 0u64;
    for &byte in &data[*pos..*pos + width] {
        value = (value << 8) | byte as u64;
    }
    *pos += width;
    Ok(value)
}

fn parse_digits(digits: &[u8]) -> i64 {
    std::str::from_utf8(digits)
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pdftypes::Array;

    #[test]
    fn test_merge_entry_generation_precedence() {
        let mut document = PdfDocument {
            parser: PdfParser::new(std::io::Cursor::new(Vec::new())),
            xref: FxHashMap::default(),
            trailer: Dictionary::new(),
            security_handler: None,
        };

        document.merge_entry(5, XrefEntry::new(100, 1, XrefType::InUse));
        // equal generation loaded later does not replace
        document.merge_entry(5, XrefEntry::new(200, 1, XrefType::InUse));
        assert_eq!(document.xref[&5].offset, 100);
        // strictly greater generation wins
        document.merge_entry(5, XrefEntry::new(300, 2, XrefType::InUse));
        assert_eq!(document.xref[&5].offset, 300);
        // lower generation never replaces
        document.merge_entry(5, XrefEntry::new(400, 0, XrefType::InUse));
        assert_eq!(document.xref[&5].offset, 300);
    }

    #[test]
    fn test_stream_filters_single_name() {
        let mut dict = Dictionary::new();
        dict.insert("Filter".into(), Object::Name("FlateDecode".into()));
        let filters = stream_filters(&dict);
        assert_eq!(filters.len(), 1);
        assert_eq!(filters[0].0, "FlateDecode");
        assert!(filters[0].1.is_empty());
    }

    #[test]
    fn test_stream_filters_parallel_arrays() {
        let mut parms = Dictionary::new();
        parms.insert("Predictor".into(), Object::Number(12.0));

        let mut dict = Dictionary::new();
        dict.insert(
            "Filter".into(),
            Object::Array(Array(vec![
                Object::Name("ASCII85Decode".into()),
                Object::Name("FlateDecode".into()),
            ])),
        );
        dict.insert(
            "DecodeParms".into(),
            Object::Array(Array(vec![
                Object::Null,
                Object::Dictionary(parms),
            ])),
        );

        let filters = stream_filters(&dict);
        assert_eq!(filters.len(), 2);
        assert_eq!(filters[0].0, "ASCII85Decode");
        assert!(filters[0].1.is_empty());
        assert_eq!(filters[1].0, "FlateDecode");
        assert_eq!(filters[1].1.get_int("Predictor").unwrap(), 12);
    }

    #[test]
    fn test_read_field_defaults_and_widths() {
        let data = [0x01, 0x02, 0x03];
        let mut pos = 0;
        assert_eq!(read_field(&data, &mut pos, 0, 1).unwrap(), 1);
        assert_eq!(read_field(&data, &mut pos, 2, 0).unwrap(), 0x0102);
        assert_eq!(read_field(&data, &mut pos, 1, 0).unwrap(), 3);
        assert!(read_field(&data, &mut pos, 1, 0).is_err());
    }
}
