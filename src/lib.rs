//! pdfsift - sift indirect objects out of damaged, truncated, and encrypted
//! PDF files.
//!
//! The document facade loads the cross-reference chain (repairing it by
//! scanning the whole file when it is broken), sets up the standard security
//! handler when the trailer demands one, and then serves `read_object`
//! calls: each returns the object's value and, where present, its decrypted
//! and decoded stream bytes. Damage to one object never aborts the rest.

pub mod aes;
pub mod arcfour;
pub mod ascii85;
pub mod error;
pub mod filters;
pub mod lzw;
pub mod md5;
pub mod pdfdocument;
pub mod pdfparser;
pub mod pdftypes;
pub mod reader;
pub mod runlength;
pub mod security;

pub use error::{PdfError, Result};
pub use pdfdocument::{PdfDocument, XrefEntry, XrefType};
pub use pdftypes::{Array, Dictionary, IndirectObject, Keyword, Object, Reference};
