//! PDF object model.
//!
//! A single tagged `Object` value replaces the interface-style polymorphism
//! of other PDF readers. Dictionaries and arrays expose typed getters that
//! return `NotFound` for a missing key and for a key holding the wrong
//! variant alike; callers that care about the difference do not exist.

use crate::error::{PdfError, Result};
use std::collections::HashMap;
use std::fmt;

/// Grammar keywords. Unrecognized keyword text maps to the `Null` sentinel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Keyword {
    Obj,
    EndObj,
    Stream,
    EndStream,
    Trailer,
    Xref,
    N,
    F,
    R,
    Null,
    True,
    False,
}

impl Keyword {
    pub fn from_bytes(bytes: &[u8]) -> Keyword {
        match bytes {
            b"obj" => Keyword::Obj,
            b"endobj" => Keyword::EndObj,
            b"stream" => Keyword::Stream,
            b"endstream" => Keyword::EndStream,
            b"trailer" => Keyword::Trailer,
            b"xref" => Keyword::Xref,
            b"n" => Keyword::N,
            b"f" => Keyword::F,
            b"R" => Keyword::R,
            b"null" => Keyword::Null,
            b"true" => Keyword::True,
            b"false" => Keyword::False,
            _ => Keyword::Null,
        }
    }
}

impl fmt::Display for Keyword {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Keyword::Obj => "obj",
            Keyword::EndObj => "endobj",
            Keyword::Stream => "stream",
            Keyword::EndStream => "endstream",
            Keyword::Trailer => "trailer",
            Keyword::Xref => "xref",
            Keyword::N => "n",
            Keyword::F => "f",
            Keyword::R => "R",
            Keyword::Null => "null",
            Keyword::True => "true",
            Keyword::False => "false",
        };
        f.write_str(text)
    }
}

/// A deferred pointer to an indirect object. Resolution is a document
/// method; the pair itself is plain data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Reference {
    pub number: i64,
    pub generation: i64,
}

impl Reference {
    pub fn new(number: i64, generation: i64) -> Self {
        Self { number, generation }
    }
}

impl fmt::Display for Reference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} R", self.number, self.generation)
    }
}

/// A parsed PDF object value.
#[derive(Debug, Clone, PartialEq)]
pub enum Object {
    Null,
    Boolean(bool),
    Number(f64),
    String(Vec<u8>),
    Name(String),
    Array(Array),
    Dictionary(Dictionary),
    Reference(Reference),
    Keyword(Keyword),
}

impl Object {
    pub fn is_null(&self) -> bool {
        matches!(self, Object::Null)
    }

    pub fn as_dict(&self) -> Result<&Dictionary> {
        match self {
            Object::Dictionary(d) => Ok(d),
            _ => Err(PdfError::Expected("dictionary")),
        }
    }

    pub fn as_array(&self) -> Result<&Array> {
        match self {
            Object::Array(a) => Ok(a),
            _ => Err(PdfError::Expected("array")),
        }
    }

    pub fn as_name(&self) -> Result<&str> {
        match self {
            Object::Name(n) => Ok(n),
            _ => Err(PdfError::Expected("name")),
        }
    }

    pub fn as_bytes(&self) -> Result<&[u8]> {
        match self {
            Object::String(s) => Ok(s),
            _ => Err(PdfError::Expected("string")),
        }
    }

    pub fn as_number(&self) -> Result<f64> {
        match self {
            Object::Number(n) => Ok(*n),
            _ => Err(PdfError::Expected("number")),
        }
    }

    pub fn as_i64(&self) -> Result<i64> {
        self.as_number().map(|n| n as i64)
    }

    pub fn as_reference(&self) -> Result<Reference> {
        match self {
            Object::Reference(r) => Ok(*r),
            _ => Err(PdfError::Expected("reference")),
        }
    }
}

impl fmt::Display for Object {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Object::Null => f.write_str("null"),
            Object::Boolean(true) => f.write_str("true"),
            Object::Boolean(false) => f.write_str("false"),
            Object::Number(n) => {
                if n.fract() == 0.0 && n.abs() < 1e15 {
                    write!(f, "{}", *n as i64)
                } else {
                    write!(f, "{}", n)
                }
            }
            Object::String(s) => write!(f, "({})", String::from_utf8_lossy(s)),
            Object::Name(n) => write!(f, "/{}", n),
            Object::Array(a) => fmt::Display::fmt(a, f),
            Object::Dictionary(d) => fmt::Display::fmt(d, f),
            Object::Reference(r) => fmt::Display::fmt(r, f),
            Object::Keyword(k) => fmt::Display::fmt(k, f),
        }
    }
}

/// An ordered, possibly heterogeneous sequence of objects.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Array(pub Vec<Object>);

impl Array {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn push(&mut self, object: Object) {
        self.0.push(object);
    }

    pub fn get(&self, index: usize) -> Option<&Object> {
        self.0.get(index)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Object> {
        self.0.iter()
    }

    fn entry(&self, index: usize) -> Result<&Object> {
        self.0
            .get(index)
            .ok_or_else(|| PdfError::NotFound(index.to_string()))
    }

    pub fn get_number(&self, index: usize) -> Result<f64> {
        self.entry(index)?
            .as_number()
            .map_err(|_| PdfError::NotFound(index.to_string()))
    }

    pub fn get_int(&self, index: usize) -> Result<i64> {
        self.get_number(index).map(|n| n as i64)
    }

    pub fn get_name(&self, index: usize) -> Result<&str> {
        self.entry(index)?
            .as_name()
            .map_err(|_| PdfError::NotFound(index.to_string()))
    }

    pub fn get_bytes(&self, index: usize) -> Result<&[u8]> {
        self.entry(index)?
            .as_bytes()
            .map_err(|_| PdfError::NotFound(index.to_string()))
    }

    pub fn get_array(&self, index: usize) -> Result<&Array> {
        self.entry(index)?
            .as_array()
            .map_err(|_| PdfError::NotFound(index.to_string()))
    }

    pub fn get_dictionary(&self, index: usize) -> Result<&Dictionary> {
        self.entry(index)?
            .as_dict()
            .map_err(|_| PdfError::NotFound(index.to_string()))
    }

    pub fn get_reference(&self, index: usize) -> Result<Reference> {
        self.entry(index)?
            .as_reference()
            .map_err(|_| PdfError::NotFound(index.to_string()))
    }
}

impl FromIterator<Object> for Array {
    fn from_iter<T: IntoIterator<Item = Object>>(iter: T) -> Self {
        Array(iter.into_iter().collect())
    }
}

impl fmt::Display for Array {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[")?;
        for (i, element) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(" ")?;
            }
            fmt::Display::fmt(element, f)?;
        }
        f.write_str("]")
    }
}

/// An unordered mapping from name to object. Keys are unique; insertion
/// order carries no meaning (display output sorts keys for determinism).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Dictionary(HashMap<String, Object>);

impl Dictionary {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn insert(&mut self, key: String, value: Object) {
        self.0.insert(key, value);
    }

    pub fn get(&self, key: &str) -> Option<&Object> {
        self.0.get(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    pub fn iter(&self) -> std::collections::hash_map::Iter<'_, String, Object> {
        self.0.iter()
    }

    fn entry(&self, key: &str) -> Result<&Object> {
        self.0
            .get(key)
            .ok_or_else(|| PdfError::NotFound(key.to_string()))
    }

    pub fn get_number(&self, key: &str) -> Result<f64> {
        self.entry(key)?
            .as_number()
            .map_err(|_| PdfError::NotFound(key.to_string()))
    }

    pub fn get_int(&self, key: &str) -> Result<i64> {
        self.get_number(key).map(|n| n as i64)
    }

    pub fn get_i64(&self, key: &str) -> Result<i64> {
        self.get_number(key).map(|n| n as i64)
    }

    pub fn get_bool(&self, key: &str) -> Result<bool> {
        match self.entry(key)? {
            Object::Boolean(b) => Ok(*b),
            _ => Err(PdfError::NotFound(key.to_string())),
        }
    }

    pub fn get_name(&self, key: &str) -> Result<&str> {
        self.entry(key)?
            .as_name()
            .map_err(|_| PdfError::NotFound(key.to_string()))
    }

    pub fn get_bytes(&self, key: &str) -> Result<&[u8]> {
        self.entry(key)?
            .as_bytes()
            .map_err(|_| PdfError::NotFound(key.to_string()))
    }

    pub fn get_string(&self, key: &str) -> Result<String> {
        self.get_bytes(key)
            .map(|bytes| String::from_utf8_lossy(bytes).into_owned())
    }

    pub fn get_array(&self, key: &str) -> Result<&Array> {
        self.entry(key)?
            .as_array()
            .map_err(|_| PdfError::NotFound(key.to_string()))
    }

    pub fn get_dictionary(&self, key: &str) -> Result<&Dictionary> {
        self.entry(key)?
            .as_dict()
            .map_err(|_| PdfError::NotFound(key.to_string()))
    }

    pub fn get_reference(&self, key: &str) -> Result<Reference> {
        self.entry(key)?
            .as_reference()
            .map_err(|_| PdfError::NotFound(key.to_string()))
    }
}

impl fmt::Display for Dictionary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut keys: Vec<&String> = self.0.keys().collect();
        keys.sort();
        f.write_str("<<")?;
        for key in keys {
            write!(f, "/{} {}", key, self.0[key])?;
        }
        f.write_str(">>")
    }
}

/// An indirect object: the `(number, generation, value)` triple plus the
/// decoded stream bytes when the object carries a stream.
#[derive(Debug, Clone)]
pub struct IndirectObject {
    pub number: i64,
    pub generation: i64,
    pub value: Object,
    pub stream: Option<Vec<u8>>,
}

impl IndirectObject {
    /// A synthetic null-valued object, as returned for free or missing
    /// xref entries.
    pub fn new(number: i64) -> Self {
        Self {
            number,
            generation: 0,
            value: Object::Null,
            stream: None,
        }
    }
}

impl fmt::Display for IndirectObject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{} {} obj", self.number, self.generation)?;
        writeln!(f, "{}", self.value)?;
        if let Some(stream) = &self.stream {
            writeln!(f, "stream")?;
            writeln!(f, "{}", String::from_utf8_lossy(stream))?;
            writeln!(f, "endstream")?;
        }
        write!(f, "endobj")
    }
}
