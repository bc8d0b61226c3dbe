//! A small hand-rolled, cursor-based reader/writer over 32-byte ABI-style
//! words. None of the catalogue's methods share one fixed interface worth
//! generating a `sol!` codec for, and these calls are only ever produced
//! and consumed by this engine itself (never by a separately-compiled
//! Solidity caller), so dynamic values are written length-prefixed and
//! inline rather than through the standard offset/tail indirection a
//! cross-compiled caller would expect — simpler, and just as unambiguous
//! for a single producer/consumer pair (see DESIGN.md's Open Question
//! resolution for this deviation).

use txexec_primitives::{Address, U256};

pub struct WordReader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> WordReader<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    fn take_word(&mut self) -> Option<[u8; 32]> {
        let slice = self.data.get(self.pos..self.pos + 32)?;
        self.pos += 32;
        let mut word = [0u8; 32];
        word.copy_from_slice(slice);
        Some(word)
    }

    pub fn read_address(&mut self) -> Option<Address> {
        let word = self.take_word()?;
        Some(Address::from_slice(&word[12..32]))
    }

    pub fn read_u256(&mut self) -> Option<U256> {
        Some(U256::from_be_bytes(self.take_word()?))
    }

    pub fn read_bool(&mut self) -> Option<bool> {
        Some(self.read_u256()? != U256::ZERO)
    }

    pub fn read_bytes32(&mut self) -> Option<[u8; 32]> {
        self.take_word()
    }

    /// A length word followed by `ceil(len / 32)` data words.
    pub fn read_dynamic(&mut self) -> Option<Vec<u8>> {
        let len: usize = self.read_u256()?.try_into().ok()?;
        let word_count = len.div_ceil(32);
        let mut out = Vec::with_capacity(len);
        for _ in 0..word_count {
            out.extend_from_slice(&self.take_word()?);
        }
        out.truncate(len);
        Some(out)
    }

    pub fn read_string(&mut self) -> Option<String> {
        self.read_dynamic().and_then(|bytes| String::from_utf8(bytes).ok())
    }
}

/// Accumulates ABI-style word output. Not a general encoder: precompiled
/// results are small, fixed-shape tuples, so each caller writes exactly the
/// words its return type needs, in order.
#[derive(Default)]
pub struct WordWriter {
    words: Vec<[u8; 32]>,
}

impl WordWriter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_address(&mut self, address: Address) -> &mut Self {
        let mut word = [0u8; 32];
        word[12..32].copy_from_slice(address.as_slice());
        self.words.push(word);
        self
    }

    pub fn push_u256(&mut self, value: U256) -> &mut Self {
        self.words.push(value.to_be_bytes());
        self
    }

    pub fn push_bool(&mut self, value: bool) -> &mut Self {
        self.push_u256(if value { U256::from(1u64) } else { U256::ZERO })
    }

    pub fn push_bytes32(&mut self, value: [u8; 32]) -> &mut Self {
        self.words.push(value);
        self
    }

    pub fn push_dynamic(&mut self, bytes: &[u8]) -> &mut Self {
        self.push_u256(U256::from(bytes.len() as u64));
        for chunk in bytes.chunks(32) {
            let mut word = [0u8; 32];
            word[..chunk.len()].copy_from_slice(chunk);
            self.words.push(word);
        }
        self
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.words.into_iter().flatten().collect()
    }
}
