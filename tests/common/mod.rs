//! In-memory PDF fixture builder.
//!
//! Tests assemble minimal PDFs programmatically so xref offsets are always
//! exact, then open them through a `Cursor`.
#![allow(dead_code)]

use pdfsift::PdfDocument;
use std::io::Cursor;

pub struct PdfBuilder {
    data: Vec<u8>,
    offsets: Vec<(i64, u64)>,
}

impl PdfBuilder {
    pub fn new() -> Self {
        Self {
            data: b"%PDF-1.4\n".to_vec(),
            offsets: Vec::new(),
        }
    }

    pub fn pos(&self) -> u64 {
        self.data.len() as u64
    }

    /// Append raw bytes without recording an object offset.
    pub fn push(&mut self, bytes: &[u8]) {
        self.data.extend_from_slice(bytes);
    }

    /// Record `number` at the current position and append `bytes` verbatim.
    pub fn raw_object(&mut self, number: i64, bytes: &[u8]) -> u64 {
        let offset = self.pos();
        self.offsets.push((number, offset));
        self.push(bytes);
        offset
    }

    /// Append `N 0 obj <body> endobj`, recording its offset.
    pub fn object(&mut self, number: i64, body: &[u8]) -> u64 {
        self.object_with_generation(number, 0, body)
    }

    pub fn object_with_generation(&mut self, number: i64, generation: i64, body: &[u8]) -> u64 {
        let offset = self.pos();
        self.offsets.push((number, offset));
        self.push(format!("{number} {generation} obj\n").as_bytes());
        self.push(body);
        self.push(b"\nendobj\n");
        offset
    }

    /// Append a stream object, recording its offset.
    pub fn stream_object(&mut self, number: i64, dict: &str, payload: &[u8]) -> u64 {
        let offset = self.pos();
        self.offsets.push((number, offset));
        self.push(format!("{number} 0 obj\n{dict}\nstream\n").as_bytes());
        self.push(payload);
        self.push(b"\nendstream\nendobj\n");
        offset
    }

    /// Append an xref table covering objects `0..size` (recorded objects in
    /// use, everything else free), a trailer, and the startxref marker.
    /// `extra_trailer` is spliced into the trailer dictionary.
    pub fn xref_and_trailer(&mut self, size: i64, extra_trailer: &str) {
        let xref_offset = self.pos();
        self.push(format!("xref\n0 {size}\n").as_bytes());
        self.push(b"0000000000 65535 f \n");
        for number in 1..size {
            match self.offset_of(number) {
                Some(offset) => self.push(format!("{offset:010} 00000 n \n").as_bytes()),
                None => self.push(b"0000000000 65535 f \n"),
            }
        }
        self.push(format!("trailer\n<</Size {size}{extra_trailer}>>\n").as_bytes());
        self.push(format!("startxref\n{xref_offset}\n%%EOF").as_bytes());
    }

    pub fn offset_of(&self, number: i64) -> Option<u64> {
        self.offsets
            .iter()
            .rev()
            .find(|(n, _)| *n == number)
            .map(|(_, offset)| *offset)
    }

    pub fn build(self) -> Vec<u8> {
        self.data
    }

    pub fn open(self) -> pdfsift::Result<PdfDocument<Cursor<Vec<u8>>>> {
        PdfDocument::new(Cursor::new(self.data), "")
    }

    pub fn open_with_password(
        self,
        password: &str,
    ) -> pdfsift::Result<PdfDocument<Cursor<Vec<u8>>>> {
        PdfDocument::new(Cursor::new(self.data), password)
    }
}

pub fn open_bytes(data: Vec<u8>) -> pdfsift::Result<PdfDocument<Cursor<Vec<u8>>>> {
    PdfDocument::new(Cursor::new(data), "")
}
