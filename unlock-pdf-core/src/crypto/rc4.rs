//! RC4 stream cipher.
//!
//! The standard security handler re-keys a single cipher handle up to twenty
//! times per password check, so the permutation state is owned by the handle
//! and [`Rc4::reset_key`] re-runs the key schedule in place.

/// RC4 cipher state.
pub struct Rc4 {
    /// State array
    s: [u8; 256],
    /// Index i
    i: usize,
    /// Index j
    j: usize,
}

impl Rc4 {
    /// Create a new RC4 cipher with the given key.
    ///
    /// The key must be non-empty; the handlers derive keys of 5-16 bytes.
    pub fn new(key: &[u8]) -> Self {
        let mut cipher = Self {
            s: [0u8; 256],
            i: 0,
            j: 0,
        };
        cipher.reset_key(key);
        cipher
    }

    /// Re-run the key scheduling algorithm with a new key, resetting the
    /// stream position.
    pub fn reset_key(&mut self, key: &[u8]) {
        debug_assert!(!key.is_empty());

        for (i, byte) in self.s.iter_mut().enumerate() {
            *byte = i as u8;
        }

        let mut j = 0usize;
        for i in 0..256 {
            j = (j + self.s[i] as usize + key[i % key.len()] as usize) % 256;
            self.s.swap(i, j);
        }

        self.i = 0;
        self.j = 0;
    }

    /// XOR the keystream over `data`, returning the result.
    ///
    /// Encryption and decryption are the same operation. Consecutive calls
    /// continue the keystream.
    pub fn process(&mut self, data: &[u8]) -> Vec<u8> {
        let mut output = data.to_vec();
        self.process_in_place(&mut output);
        output
    }

    /// XOR the keystream over `data` in place.
    pub fn process_in_place(&mut self, data: &mut [u8]) {
        for byte in data.iter_mut() {
            // PRGA
            self.i = (self.i + 1) % 256;
            self.j = (self.j + self.s[self.i] as usize) % 256;
            self.s.swap(self.i, self.j);

            let k = self.s[(self.s[self.i] as usize + self.s[self.j] as usize) % 256];
            *byte ^= k;
        }
    }
}
