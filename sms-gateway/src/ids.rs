//! Monotonic 128-bit message identifiers (C4).
//!
//! Textual form is the 26-char Crockford base32 ULID encoding: a millisecond
//! timestamp prefix followed by an 80-bit random/monotonic tail, so IDs
//! generated within the same process sort lexicographically in generation
//! order even within the same millisecond.

use std::sync::Mutex;
use ulid::{Generator, Ulid};

/// Wraps `ulid::Generator` behind a mutex so a single process-wide generator
/// can be shared across request tasks without each caller reasoning about
/// monotonic-tail bookkeeping.
pub struct IdGenerator {
    inner: Mutex<Generator>,
}

impl IdGenerator {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(Generator::new()),
        }
    }

    /// Generate the next monotonic ULID as its 26-char string form.
    pub fn next(&self) -> String {
        let mut gen = self.inner.lock().expect("ulid generator mutex poisoned");
        let id: Ulid = gen
            .generate()
            .expect("ulid generator exhausted monotonic tail for this millisecond");
        id.to_string()
    }
}

impl Default for IdGenerator {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generates_26_char_ids() {
        let gen = IdGenerator::new();
        let id = gen.next();
        assert_eq!(id.len(), 26);
    }

    #[test]
    fn ids_are_monotonically_increasing_within_a_process() {
        let gen = IdGenerator::new();
        let mut prev = gen.next();
        for _ in 0..1000 {
            let next = gen.next();
            assert!(next > prev, "expected {next} > {prev}");
            prev = next;
        }
    }
}
