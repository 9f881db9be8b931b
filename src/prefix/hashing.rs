//! Chained block fingerprinting of prompt text.
//!
//! A prompt maps to an ordered fingerprint sequence: the chain is seeded
//! from the model name, and each link hashes the previous value's decimal
//! form followed by the block text. Two prompts therefore share a chain
//! prefix exactly where they share the identical leading text on block
//! boundaries, and sequences from different models never match at all.

use std::fmt::Write as _;

use xxhash_rust::xxh64::xxh64;

/// Computes chained xxHash64 fingerprints over fixed-size prompt blocks.
///
/// The scheme is wire-stable: `fingerprint[i] = xxh64(decimal(prev) ++ block)`
/// with `prev` seeded from `xxh64(model)`. Existing cache contents depend on
/// the exact concatenation order and digest, so neither may change.
#[derive(Debug, Clone, Copy)]
pub struct BlockHasher {
    block_size: usize,
    max_blocks: usize,
}

impl BlockHasher {
    pub fn new(block_size: usize, max_blocks: usize) -> Self {
        Self {
            block_size,
            max_blocks,
        }
    }

    /// Fingerprint sequence for one prompt.
    ///
    /// Blocks are `block_size` characters each; a shorter trailing block is
    /// hashed as the final link. At most `max_blocks` fingerprints are
    /// produced; text past the cap is not hashed at all. An empty prompt
    /// yields an empty sequence. Pure and safe for unsynchronized concurrent
    /// use.
    pub fn hash_prompt(&self, model: &str, prompt: &str) -> Vec<u64> {
        // Zero bounds are rejected at config validation; guard rather than
        // panic if a caller bypasses that.
        if prompt.is_empty() || self.block_size == 0 || self.max_blocks == 0 {
            return Vec::new();
        }

        let mut fingerprints = Vec::with_capacity(
            (prompt.len() / self.block_size + 1).min(self.max_blocks),
        );
        let mut prev = xxh64(model.as_bytes(), 0);
        let mut buf = String::with_capacity(self.block_size * 4 + 20);

        let mut start = 0;
        let mut chars_in_block = 0;
        for (idx, ch) in prompt.char_indices() {
            chars_in_block += 1;
            if chars_in_block == self.block_size {
                let end = idx + ch.len_utf8();
                prev = chain_link(&mut buf, prev, &prompt[start..end]);
                fingerprints.push(prev);
                if fingerprints.len() == self.max_blocks {
                    return fingerprints;
                }
                start = end;
                chars_in_block = 0;
            }
        }
        if start < prompt.len() {
            prev = chain_link(&mut buf, prev, &prompt[start..]);
            fingerprints.push(prev);
        }
        fingerprints
    }

    pub fn block_size(&self) -> usize {
        self.block_size
    }

    pub fn max_blocks(&self) -> usize {
        self.max_blocks
    }
}

/// One chain step: `xxh64(decimal(prev) ++ block)`.
fn chain_link(buf: &mut String, prev: u64, block: &str) -> u64 {
    buf.clear();
    let _ = write!(buf, "{prev}");
    buf.push_str(block);
    xxh64(buf.as_bytes(), 0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_prompt_yields_empty_sequence() {
        let hasher = BlockHasher::new(64, 128);
        assert!(hasher.hash_prompt("test-model", "").is_empty());
    }

    #[test]
    fn short_prompt_yields_single_fingerprint() {
        // 11 chars against a 64-char block: one trailing block, one link.
        let hasher = BlockHasher::new(64, 128);
        let got = hasher.hash_prompt("m", "Hello World");
        let seed = xxh64(b"m", 0);
        let expected = xxh64(format!("{seed}Hello World").as_bytes(), 0);
        assert_eq!(got, vec![expected]);
    }

    #[test]
    fn hashing_is_deterministic() {
        let hasher = BlockHasher::new(8, 16);
        let prompt = "a deterministic prompt spanning several blocks";
        assert_eq!(
            hasher.hash_prompt("model-a", prompt),
            hasher.hash_prompt("model-a", prompt)
        );
    }

    #[test]
    fn models_never_share_fingerprints() {
        let hasher = BlockHasher::new(8, 16);
        let prompt = "identical prompt text for both models";
        let a = hasher.hash_prompt("model-a", prompt);
        let b = hasher.hash_prompt("model-b", prompt);
        assert_eq!(a.len(), b.len());
        for (fa, fb) in a.iter().zip(&b) {
            assert_ne!(fa, fb);
        }
    }

    #[test]
    fn shared_textual_prefix_shares_chain_prefix() {
        let hasher = BlockHasher::new(10, 16);
        let a = hasher.hash_prompt("m", "0123456789abcdefghij tail one");
        let b = hasher.hash_prompt("m", "0123456789abcdefghij other tail");
        // First two complete blocks are identical text.
        assert_eq!(a[..2], b[..2]);
        assert_ne!(a[2..], b[2..]);
    }

    #[test]
    fn max_blocks_caps_the_sequence() {
        let hasher = BlockHasher::new(4, 3);
        let got = hasher.hash_prompt("m", "aaaabbbbccccddddeeee");
        assert_eq!(got.len(), 3);
    }

    #[test]
    fn multibyte_text_never_splits_a_codepoint() {
        // Blocks count characters, not bytes.
        let hasher = BlockHasher::new(2, 8);
        let got = hasher.hash_prompt("m", "héllo wörld");
        assert_eq!(got.len(), 6);
    }
}
