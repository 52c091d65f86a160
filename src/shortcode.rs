//! Counter-driven short code generation
//!
//! Codes are the base-62 rendering of a monotonically increasing counter,
//! emitted least-significant digit first. Uniqueness depends entirely on the
//! counter never moving backwards, so it must be seeded from the true number
//! of stored rows at startup.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

const ALPHABET_LEN: u64 = 62;
const ALPHABET: &[u8; ALPHABET_LEN as usize] =
    b"abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

/// Encode a value with the fixed base-62 alphabet, least-significant digit first.
///
/// Zero encodes to an empty string; the generator never hands out zero.
pub fn encode(mut value: u64) -> String {
    let mut code = String::with_capacity(11);
    while value > 0 {
        code.push(ALPHABET[(value % ALPHABET_LEN) as usize] as char);
        value /= ALPHABET_LEN;
    }
    code
}

/// Hands out short codes from a shared atomic counter.
#[derive(Debug, Clone)]
pub struct CodeGenerator {
    counter: Arc<AtomicU64>,
}

impl CodeGenerator {
    pub fn new(counter: Arc<AtomicU64>) -> Self {
        Self { counter }
    }

    /// Increment the counter and encode the post-increment value
    pub fn next(&self) -> String {
        let value = self.counter.fetch_add(1, Ordering::SeqCst) + 1;
        encode(value)
    }

    /// Reset the counter, normally to the stored row count at startup
    pub fn seed(&self, value: u64) {
        self.counter.store(value, Ordering::SeqCst);
    }

    pub fn current(&self) -> u64 {
        self.counter.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn fresh() -> CodeGenerator {
        CodeGenerator::new(Arc::new(AtomicU64::new(0)))
    }

    #[test]
    fn test_alphabet_is_distinct() {
        let unique: HashSet<u8> = ALPHABET.iter().copied().collect();
        assert_eq!(unique.len(), ALPHABET.len());
    }

    #[test]
    fn test_encode_known_values() {
        assert_eq!(encode(0), "");
        assert_eq!(encode(1), "b");
        assert_eq!(encode(61), "9");
        // least-significant digit first
        assert_eq!(encode(62), "ab");
        assert_eq!(encode(63), "bb");
        assert_eq!(encode(62 * 62), "aab");
    }

    #[test]
    fn test_first_code_from_zero() {
        let generator = fresh();
        assert_eq!(generator.next(), "b");
        assert_eq!(generator.current(), 1);
    }

    #[test]
    fn test_codes_are_distinct() {
        let generator = fresh();
        let mut seen = HashSet::new();
        for _ in 0..10_000 {
            let code = generator.next();
            assert!(!code.is_empty());
            assert!(seen.insert(code), "duplicate code generated");
        }
    }

    #[test]
    fn test_reseed_replays_codes() {
        let generator = fresh();
        let issued: Vec<String> = (0..5).map(|_| generator.next()).collect();

        generator.seed(2);
        assert_eq!(generator.next(), issued[2]);
    }

    #[test]
    fn test_concurrent_generation_is_unique() {
        let generator = fresh();
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let generator = generator.clone();
                std::thread::spawn(move || (0..1_000).map(|_| generator.next()).collect::<Vec<_>>())
            })
            .collect();

        let mut seen = HashSet::new();
        for handle in handles {
            for code in handle.join().unwrap() {
                assert!(seen.insert(code));
            }
        }
        assert_eq!(seen.len(), 8_000);
        assert_eq!(generator.current(), 8_000);
    }
}
