//! Standard security handler: password-based key derivation and per-object
//! crypt filters for encryption versions 1, 2, and 4 (revisions 2-4).
//!
//! The handler is built once at open time from the Encrypt dictionary and
//! the first element of the trailer's ID array. Each object gets a fresh
//! `Decryptor` carrying its salted key; `Decryptor::Identity` is the no-op
//! used for unencrypted documents and xref carriers.

use crate::aes::aes_cbc_decrypt;
use crate::arcfour::rc4;
use crate::error::{PdfError, Result};
use crate::md5;
use crate::pdftypes::{Dictionary, Object};
use std::collections::HashMap;

/// The 32-byte password padding string from the PDF specification.
pub const PADDING: [u8; 32] = [
    0x28, 0xBF, 0x4E, 0x5E, 0x4E, 0x75, 0x8A, 0x41, 0x64, 0x00, 0x4E, 0x56, 0xFF, 0xFA, 0x01,
    0x08, 0x2E, 0x2E, 0x00, 0xB6, 0xD0, 0x68, 0x3E, 0x80, 0x2F, 0x0C, 0xA9, 0xFE, 0x64, 0x53,
    0x69, 0x7A,
];

/// A named crypt algorithm plus its file-level key. Object-level keys are
/// derived on demand.
#[derive(Debug, Clone)]
pub enum CryptFilter {
    /// No encryption (the built-in Identity filter and CFM None).
    None,
    /// RC4 (encryption version 1/2 and CFM V2).
    Rc4 { key: Vec<u8> },
    /// AES-128-CBC (CFM AESV2).
    Aes { key: Vec<u8> },
}

impl CryptFilter {
    /// Algorithm 1: instantiate a decryptor for object `(number,
    /// generation)` with the salted per-object key.
    pub fn decryptor(&self, number: i64, generation: i64) -> Decryptor {
        match self {
            CryptFilter::None => Decryptor::Identity,
            CryptFilter::Rc4 { key } => Decryptor::Rc4 {
                key: object_key(key, number, generation, false),
            },
            CryptFilter::Aes { key } => Decryptor::Aes {
                key: object_key(key, number, generation, true),
            },
        }
    }
}

/// A per-object decryptor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decryptor {
    Identity,
    Rc4 { key: Vec<u8> },
    Aes { key: Vec<u8> },
}

impl Decryptor {
    pub fn decrypt(&self, data: &[u8]) -> Vec<u8> {
        match self {
            Decryptor::Identity => data.to_vec(),
            Decryptor::Rc4 { key } => rc4(key, data),
            Decryptor::Aes { key } => {
                // the first block is the initialization vector
                if data.len() <= 16 {
                    return Vec::new();
                }
                aes_cbc_decrypt(key, &data[..16], &data[16..])
            }
        }
    }
}

/// Salt the file key with the object number (3 bytes LE) and generation
/// (2 bytes LE), plus `sAlT` for AES, and hash. The object key keeps the
/// first `len + 5` bytes of the digest, capped at 16.
fn object_key(file_key: &[u8], number: i64, generation: i64, aes: bool) -> Vec<u8> {
    let mut salt = file_key.to_vec();
    salt.extend_from_slice(&(number as u32).to_le_bytes()[..3]);
    salt.extend_from_slice(&(generation as u32).to_le_bytes()[..2]);
    if aes {
        salt.extend_from_slice(b"sAlT");
    }
    let digest = md5::digest(&salt);
    let len = (file_key.len() + 5).min(16);
    digest[..len].to_vec()
}

/// The standard security handler's filter assignments.
pub struct SecurityHandler {
    stream_filter: CryptFilter,
    string_filter: CryptFilter,
    file_filter: CryptFilter,
    crypt_filters: HashMap<String, CryptFilter>,
}

impl SecurityHandler {
    /// Build a handler from a resolved Encrypt dictionary, the document ID
    /// (`ID[0]` from the trailer), and the user password.
    ///
    /// Fails with `Unsupported` for filters other than Standard and for
    /// encryption versions/revisions outside {1,2,4}/{2,3,4}, with
    /// `Corrupt` for missing required entries, and with `Password` when
    /// the password fails validation.
    pub fn new(encrypt: &Dictionary, doc_id: &[u8], password: &[u8]) -> Result<Self> {
        let filter = encrypt
            .get_name("Filter")
            .map_err(|_| PdfError::corrupt("Encrypt dictionary missing Filter"))?;
        if filter != "Standard" {
            return Err(PdfError::Unsupported(format!(
                "encryption filter {filter}"
            )));
        }

        let version = encrypt.get_int("V").unwrap_or(0);
        if !matches!(version, 1 | 2 | 4) {
            return Err(PdfError::Unsupported(format!(
                "encryption version {version}"
            )));
        }

        let revision = encrypt
            .get_int("R")
            .map_err(|_| PdfError::corrupt("Encrypt dictionary missing R"))?;
        if !(2..=4).contains(&revision) {
            return Err(PdfError::Unsupported(format!(
                "encryption revision {revision}"
            )));
        }

        // key length in bits, default 40, clamped to 5..16 bytes
        let bits = if version == 1 {
            40
        } else {
            encrypt.get_int("Length").unwrap_or(40)
        };
        let length = ((bits / 8).clamp(5, 16)) as usize;

        let o = encrypt
            .get_bytes("O")
            .map_err(|_| PdfError::corrupt("Encrypt dictionary missing O"))?;
        let u = encrypt
            .get_bytes("U")
            .map_err(|_| PdfError::corrupt("Encrypt dictionary missing U"))?;
        let p = encrypt
            .get_int("P")
            .map_err(|_| PdfError::corrupt("Encrypt dictionary missing P"))?;
        let p_bytes = (p as u32).to_le_bytes();
        let encrypt_metadata = encrypt.get_bool("EncryptMetadata").unwrap_or(true);

        let derive = |key_length: usize| {
            compute_encryption_key(
                password,
                o,
                &p_bytes,
                doc_id,
                revision,
                encrypt_metadata,
                key_length,
            )
        };
        let file_key = derive(length);

        // Algorithm 4 (revision 2) / Algorithm 5 (revision 3+)
        if revision == 2 {
            if rc4(&file_key, &PADDING) != u {
                return Err(PdfError::Password);
            }
        } else {
            if u.len() < 16 {
                return Err(PdfError::Password);
            }
            let mut salted = PADDING.to_vec();
            salted.extend_from_slice(doc_id);
            let mut check = md5::digest(&salted).to_vec();
            for round in 0u8..20 {
                let round_key: Vec<u8> = file_key.iter().map(|&b| b ^ round).collect();
                check = rc4(&round_key, &check);
            }
            if check[..16] != u[..16] {
                return Err(PdfError::Password);
            }
        }

        let default_filter = CryptFilter::Rc4 {
            key: file_key.clone(),
        };
        let mut handler = Self {
            stream_filter: default_filter.clone(),
            string_filter: default_filter.clone(),
            file_filter: default_filter,
            crypt_filters: HashMap::from([("Identity".to_string(), CryptFilter::None)]),
        };

        if revision == 4 {
            if let Ok(cf) = encrypt.get_dictionary("CF") {
                for (name, entry) in cf.iter() {
                    let Object::Dictionary(entry) = entry else {
                        continue;
                    };
                    let Ok(method) = entry.get_name("CFM") else {
                        continue;
                    };
                    // a crypt filter's Length is nominally bytes, but some
                    // producers write bits
                    let cf_length = match entry.get_int("Length") {
                        Ok(l) if l > 16 => (l / 8).clamp(5, 16) as usize,
                        Ok(l) => l.clamp(5, 16) as usize,
                        Err(_) => length,
                    };
                    let filter = match method {
                        "None" => CryptFilter::None,
                        "V2" => CryptFilter::Rc4 {
                            key: derive(cf_length),
                        },
                        "AESV2" => CryptFilter::Aes {
                            key: derive(cf_length),
                        },
                        _ => continue,
                    };
                    handler.crypt_filters.insert(name.clone(), filter);
                }
            }

            if let Ok(name) = encrypt.get_name("StmF") {
                if let Some(filter) = handler.crypt_filters.get(name) {
                    handler.stream_filter = filter.clone();
                }
            }
            if let Ok(name) = encrypt.get_name("StrF") {
                if let Some(filter) = handler.crypt_filters.get(name) {
                    handler.string_filter = filter.clone();
                }
            }
            if let Ok(name) = encrypt.get_name("EEF") {
                if let Some(filter) = handler.crypt_filters.get(name) {
                    handler.file_filter = filter.clone();
                }
            }
        }

        Ok(handler)
    }

    pub fn string_decryptor(&self, number: i64, generation: i64) -> Decryptor {
        self.string_filter.decryptor(number, generation)
    }

    /// Look up a named crypt filter (for `Crypt` decode-filter overrides).
    pub fn crypt_filter(&self, name: &str) -> Option<&CryptFilter> {
        self.crypt_filters.get(name)
    }

    pub fn stream_filter(&self) -> &CryptFilter {
        &self.stream_filter
    }

    pub fn file_filter(&self) -> &CryptFilter {
        &self.file_filter
    }
}

/// Algorithm 2: derive the file encryption key from the padded password and
/// the Encrypt dictionary state. `key_length` is in bytes.
fn compute_encryption_key(
    password: &[u8],
    o: &[u8],
    p: &[u8; 4],
    doc_id: &[u8],
    revision: i64,
    encrypt_metadata: bool,
    key_length: usize,
) -> Vec<u8> {
    let mut padded = password.to_vec();
    if padded.len() < 32 {
        let fill = 32 - padded.len();
        padded.extend_from_slice(&PADDING[..fill]);
    } else {
        padded.truncate(32);
    }

    let mut input = padded;
    input.extend_from_slice(o);
    input.extend_from_slice(p);
    input.extend_from_slice(doc_id);
    if revision >= 4 && !encrypt_metadata {
        input.extend_from_slice(&[0xff, 0xff, 0xff, 0xff]);
    }

    let mut key = md5::digest(&input)[..key_length].to_vec();
    if revision >= 3 {
        for _ in 0..50 {
            key = md5::digest(&key)[..key_length].to_vec();
        }
    }
    key
}
