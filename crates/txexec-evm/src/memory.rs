use crate::gas;

/// Byte-addressable, word-growing scratch space. Growth is charged once per
/// newly touched word and never shrinks, matching EVM memory semantics.
#[derive(Debug, Default)]
pub struct Memory {
    bytes: Vec<u8>,
}

fn words(len: usize) -> usize {
    len.div_ceil(32)
}

impl Memory {
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /// Grows the buffer to cover `offset + len` if needed, returning the gas
    /// cost of the newly touched words (0 if already covered).
    pub fn charge_expansion(&mut self, offset: usize, len: usize) -> i64 {
        if len == 0 {
            return 0;
        }
        let required = offset.saturating_add(len);
        let required_words = words(required);
        let current_words = words(self.bytes.len());
        if required_words <= current_words {
            return 0;
        }
        self.bytes.resize(required_words * 32, 0);
        (required_words - current_words) as i64 * gas::MEMORY_WORD
    }

    pub fn load32(&self, offset: usize) -> [u8; 32] {
        let mut out = [0u8; 32];
        let end = (offset + 32).min(self.bytes.len());
        if offset < end {
            out[..end - offset].copy_from_slice(&self.bytes[offset..end]);
        }
        out
    }

    pub fn store(&mut self, offset: usize, data: &[u8]) {
        self.bytes[offset..offset + data.len()].copy_from_slice(data);
    }

    pub fn slice(&self, offset: usize, len: usize) -> Vec<u8> {
        if len == 0 {
            return Vec::new();
        }
        let end = (offset + len).min(self.bytes.len());
        let mut out = vec![0u8; len];
        if offset < end {
            out[..end - offset].copy_from_slice(&self.bytes[offset..end]);
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn expansion_is_only_charged_once_per_word() {
        let mut memory = Memory::default();
        let first = memory.charge_expansion(0, 32);
        let second = memory.charge_expansion(0, 32);
        assert_eq!(first, gas::MEMORY_WORD);
        assert_eq!(second, 0);
    }

    #[test]
    fn store_then_load_round_trips() {
        let mut memory = Memory::default();
        memory.charge_expansion(0, 32);
        memory.store(0, &[7u8; 32]);
        assert_eq!(memory.load32(0), [7u8; 32]);
    }
}
