//! Fuzz target for chained block hashing.
//!
//! Arbitrary prompts and block parameters must never panic, and the hasher
//! invariants (determinism, sequence-length bound) must hold for all inputs.

#![no_main]

use libfuzzer_sys::fuzz_target;
use prefix_affinity::BlockHasher;

fuzz_target!(|input: (String, String, u8, u8)| {
    let (model, prompt, block_size, max_blocks) = input;
    let hasher = BlockHasher::new(block_size as usize, max_blocks as usize);

    let first = hasher.hash_prompt(&model, &prompt);
    let second = hasher.hash_prompt(&model, &prompt);
    assert_eq!(first, second);
    assert!(first.len() <= max_blocks as usize);
    if prompt.is_empty() {
        assert!(first.is_empty());
    }
});
