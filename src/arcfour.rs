//! Arcfour (RC4) stream cipher used by the V2 crypt filter and by the
//! password validation algorithms.

/// RC4 cipher state. Decryption and encryption are the same operation.
pub struct Arcfour {
    state: [u8; 256],
    i: u8,
    j: u8,
}

impl Arcfour {
    pub fn new(key: &[u8]) -> Self {
        let mut state = [0u8; 256];
        for (i, slot) in state.iter_mut().enumerate() {
            *slot = i as u8;
        }

        let mut j = 0u8;
        for i in 0..256 {
            j = j
                .wrapping_add(state[i])
                .wrapping_add(key[i % key.len()]);
            state.swap(i, j as usize);
        }

        Self { state, i: 0, j: 0 }
    }

    /// XOR `data` with the keystream.
    pub fn process(&mut self, data: &[u8]) -> Vec<u8> {
        let mut out = Vec::with_capacity(data.len());
        for &byte in data {
            self.i = self.i.wrapping_add(1);
            self.j = self.j.wrapping_add(self.state[self.i as usize]);
            self.state.swap(self.i as usize, self.j as usize);
            let k = self.state[self.state[self.i as usize]
                .wrapping_add(self.state[self.j as usize])
                as usize];
            out.push(byte ^ k);
        }
        out
    }
}

/// One-shot RC4 over `data` with a fresh cipher.
pub fn rc4(key: &[u8], data: &[u8]) -> Vec<u8> {
    Arcfour::new(key).process(data)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_ciphertexts() {
        assert_eq!(rc4(b"a", &[0x68]), b"x");
        assert_eq!(rc4(b"key", &[0x7F, 0x09, 0x47, 0x99]), b"test");
        assert_eq!(rc4(b"hello", &[0x78, 0x3E, 0xCD, 0x96, 0xCF]), b"world");
        assert_eq!(rc4(b"\x01\x02", &[0x0C, 0x74, 0xB9]), b"Hi!");
        assert_eq!(
            rc4(
                b"encryption",
                &[0x8A, 0x36, 0x3F, 0x85, 0xDB, 0x9A, 0x62, 0x7C, 0x6C, 0x56, 0x81, 0x89]
            ),
            b"Hello World!"
        );
    }

    #[test]
    fn test_classic_vector() {
        // RFC 6229 style vector: RC4("Key", "Plaintext")
        assert_eq!(
            rc4(b"Key", b"Plaintext"),
            hex::decode("bbf316e8d940af0ad3").unwrap()
        );
    }

    #[test]
    fn test_symmetric() {
        let key = b"salted-object-key";
        let plaintext = b"stream payload with arbitrary bytes \x00\x01\xfe";
        let ciphertext = rc4(key, plaintext);
        assert_ne!(ciphertext, plaintext);
        assert_eq!(rc4(key, &ciphertext), plaintext);
    }

    #[test]
    fn test_keystream_continues_across_calls() {
        let mut one_shot = Arcfour::new(b"k");
        let whole = one_shot.process(b"abcdef");

        let mut split = Arcfour::new(b"k");
        let mut parts = split.process(b"abc");
        parts.extend(split.process(b"def"));
        assert_eq!(whole, parts);
    }
}
