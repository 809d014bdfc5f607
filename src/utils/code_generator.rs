//! Short code generation and validation utilities.
//!
//! Codes are rendered in a 58-symbol alphabet that drops the visually ambiguous
//! `0`, `O`, `l` and `I`. Two generation strategies share it:
//!
//! - [`RandomCodeGenerator`] draws uniform random symbols
//! - [`HashCodeGenerator`] derives the code from a SHA-256 digest of the long URL,
//!   salted on retries so each attempt is independent

use crate::domain::entities::Tier;
use crate::domain::errors::CoreError;
use rand::Rng;
use sha2::{Digest, Sha256};
use std::str::FromStr;
use std::sync::Arc;

/// Symbols used for generated codes, in digit order.
pub const ALPHABET: &[u8] = b"123456789abcdefghijkmnopqrstuvwxyzABCDEFGHJKLMNPQRSTUVWXYZ";

const BASE: u64 = ALPHABET.len() as u64;

/// Hard upper bound on any short code.
pub const MAX_CODE_LENGTH: usize = 8;

/// Reserved codes that cannot be used as short links.
///
/// These collide with service routes.
const RESERVED_CODES: &[&str] = &["api", "health", "admin", "static", "short", "stats"];

/// Returns true if `code` collides with a service route, ignoring case.
pub fn is_reserved_code(code: &str) -> bool {
    RESERVED_CODES
        .iter()
        .any(|reserved| reserved.eq_ignore_ascii_case(code))
}

/// Renders `value` as exactly `width` symbols, left-padded with the zero digit.
///
/// Values that do not fit in `width` symbols are reduced modulo `58^width`.
pub fn encode(value: u64, width: usize) -> String {
    let mut n = match u32::try_from(width).ok().and_then(|w| BASE.checked_pow(w)) {
        Some(modulus) => value % modulus,
        None => value,
    };

    let mut digits = vec![ALPHABET[0]; width];
    for slot in digits.iter_mut().rev() {
        *slot = ALPHABET[(n % BASE) as usize];
        n /= BASE;
    }

    String::from_utf8(digits).unwrap_or_default()
}

/// Parses a code produced by [`encode`] back into its numeric value.
///
/// Returns `None` for symbols outside the alphabet or on overflow.
pub fn decode(code: &str) -> Option<u64> {
    code.bytes().try_fold(0u64, |acc, b| {
        let digit = ALPHABET.iter().position(|&c| c == b)? as u64;
        acc.checked_mul(BASE)?.checked_add(digit)
    })
}

/// Input to a code generator.
#[derive(Debug, Clone, Copy)]
pub struct CodeInput<'a> {
    pub long_url: &'a str,
    pub length: usize,
    /// Absent on the first attempt; set on retries to decorrelate candidates.
    pub salt: Option<u64>,
}

/// Produces short code candidates. Implementations never touch storage.
pub trait CodeGenerator: Send + Sync {
    fn generate(&self, input: &CodeInput<'_>) -> String;
}

/// Uniformly random codes.
#[derive(Debug, Clone, Copy, Default)]
pub struct RandomCodeGenerator;

impl CodeGenerator for RandomCodeGenerator {
    fn generate(&self, input: &CodeInput<'_>) -> String {
        let mut rng = rand::rng();
        (0..input.length)
            .map(|_| ALPHABET[rng.random_range(0..ALPHABET.len())] as char)
            .collect()
    }
}

/// Content-derived codes: the same URL and salt always yield the same code.
#[derive(Debug, Clone, Copy, Default)]
pub struct HashCodeGenerator;

impl CodeGenerator for HashCodeGenerator {
    fn generate(&self, input: &CodeInput<'_>) -> String {
        let mut hasher = Sha256::new();
        hasher.update(input.long_url.as_bytes());
        if let Some(salt) = input.salt {
            hasher.update(salt.to_be_bytes());
        }
        let digest = hasher.finalize();

        let mut prefix = [0u8; 8];
        prefix.copy_from_slice(&digest[..8]);

        encode(u64::from_be_bytes(prefix), input.length)
    }
}

/// Selects the generation strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CodeStrategy {
    Random,
    Hash,
}

impl CodeStrategy {
    pub fn generator(&self) -> Arc<dyn CodeGenerator> {
        match self {
            Self::Random => Arc::new(RandomCodeGenerator),
            Self::Hash => Arc::new(HashCodeGenerator),
        }
    }
}

impl FromStr for CodeStrategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "random" => Ok(Self::Random),
            "hash" => Ok(Self::Hash),
            other => Err(format!("unknown code strategy '{other}'")),
        }
    }
}

/// Per-tier code lengths.
///
/// Anonymous callers get the longest generated codes since they are only limited
/// by IP. Premium callers may pick the shortest custom codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CodePolicy {
    pub anonymous_length: usize,
    pub authenticated_length: usize,
    pub premium_length: usize,
    pub anonymous_custom_min: usize,
    pub authenticated_custom_min: usize,
    pub premium_custom_min: usize,
}

impl CodePolicy {
    /// Length of generated codes for `tier`.
    pub fn length_for(&self, tier: Tier) -> usize {
        match tier {
            Tier::Anonymous => self.anonymous_length,
            Tier::Authenticated => self.authenticated_length,
            Tier::Premium => self.premium_length,
        }
    }

    /// Minimum length of caller-chosen codes for `tier`.
    pub fn custom_min_for(&self, tier: Tier) -> usize {
        match tier {
            Tier::Anonymous => self.anonymous_custom_min,
            Tier::Authenticated => self.authenticated_custom_min,
            Tier::Premium => self.premium_custom_min,
        }
    }

    /// Validates a caller-chosen short code.
    ///
    /// # Rules
    ///
    /// - Length: tier minimum up to [`MAX_CODE_LENGTH`]
    /// - Allowed characters: ASCII letters and digits
    /// - Cannot be a reserved route name
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidCode`] if any rule is violated.
    pub fn validate_custom_code(&self, code: &str, tier: Tier) -> Result<(), CoreError> {
        let min = self.custom_min_for(tier);

        if code.len() < min || code.len() > MAX_CODE_LENGTH {
            return Err(CoreError::InvalidCode(format!(
                "custom code must be {min}-{MAX_CODE_LENGTH} characters for {tier} callers"
            )));
        }

        if !code.chars().all(|c| c.is_ascii_alphanumeric()) {
            return Err(CoreError::InvalidCode(
                "custom code can only contain letters and digits".to_string(),
            ));
        }

        if is_reserved_code(code) {
            return Err(CoreError::InvalidCode(format!("'{code}' is reserved")));
        }

        Ok(())
    }
}

impl Default for CodePolicy {
    fn default() -> Self {
        Self {
            anonymous_length: 8,
            authenticated_length: 6,
            premium_length: 6,
            anonymous_custom_min: 8,
            authenticated_custom_min: 6,
            premium_custom_min: 4,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn input(length: usize, salt: Option<u64>) -> CodeInput<'static> {
        CodeInput {
            long_url: "https://example.com/a",
            length,
            salt,
        }
    }

    #[test]
    fn test_alphabet_has_no_ambiguous_symbols() {
        for c in [b'0', b'O', b'l', b'I'] {
            assert!(!ALPHABET.contains(&c));
        }
        assert_eq!(ALPHABET.len(), 58);
        assert_eq!(ALPHABET.iter().collect::<HashSet<_>>().len(), 58);
    }

    #[test]
    fn test_encode_pads_to_width() {
        assert_eq!(encode(0, 4), "1111");
        assert_eq!(encode(1, 4), "1112");
        assert_eq!(encode(57, 2), "1Z");
    }

    #[test]
    fn test_encode_decode_round_trip() {
        for value in [0u64, 1, 123, 987_654, BASE, BASE.pow(6) - 1] {
            let code = encode(value, 6);
            assert_eq!(code.len(), 6);
            assert_eq!(decode(&code), Some(value), "code {code}");
        }
    }

    #[test]
    fn test_encode_reduces_oversized_values() {
        let code = encode(u64::MAX, 4);
        assert_eq!(code.len(), 4);
        assert_eq!(decode(&code), Some(u64::MAX % BASE.pow(4)));
    }

    #[test]
    fn test_decode_rejects_foreign_symbols() {
        assert_eq!(decode("ab0c"), None);
        assert_eq!(decode("I"), None);
    }

    #[test]
    fn test_random_generator_length_and_alphabet() {
        let code = RandomCodeGenerator.generate(&input(8, None));
        assert_eq!(code.len(), 8);
        assert!(code.bytes().all(|b| ALPHABET.contains(&b)));
    }

    #[test]
    fn test_random_generator_produces_unique_codes() {
        let codes: HashSet<_> = (0..1000)
            .map(|_| RandomCodeGenerator.generate(&input(8, None)))
            .collect();

        assert_eq!(codes.len(), 1000);
    }

    #[test]
    fn test_hash_generator_is_deterministic() {
        let a = HashCodeGenerator.generate(&input(6, None));
        let b = HashCodeGenerator.generate(&input(6, None));
        assert_eq!(a, b);
        assert_eq!(a.len(), 6);
    }

    #[test]
    fn test_hash_generator_salt_changes_code() {
        let unsalted = HashCodeGenerator.generate(&input(8, None));
        let salted = HashCodeGenerator.generate(&input(8, Some(1)));
        let resalted = HashCodeGenerator.generate(&input(8, Some(2)));

        assert_ne!(unsalted, salted);
        assert_ne!(salted, resalted);
    }

    #[test]
    fn test_strategy_parse() {
        assert_eq!("HASH".parse::<CodeStrategy>(), Ok(CodeStrategy::Hash));
        assert_eq!("random".parse::<CodeStrategy>(), Ok(CodeStrategy::Random));
        assert!("uuid".parse::<CodeStrategy>().is_err());
    }

    #[test]
    fn test_lengths_by_tier() {
        let policy = CodePolicy::default();
        assert!(policy.length_for(Tier::Anonymous) > policy.length_for(Tier::Authenticated));
        assert!(policy.custom_min_for(Tier::Premium) < policy.custom_min_for(Tier::Authenticated));
    }

    #[test]
    fn test_validate_premium_short_code() {
        let policy = CodePolicy::default();
        assert!(policy.validate_custom_code("go42", Tier::Premium).is_ok());
        assert!(policy.validate_custom_code("go42", Tier::Authenticated).is_err());
    }

    #[test]
    fn test_validate_too_long() {
        let policy = CodePolicy::default();
        let result = policy.validate_custom_code("abcdefghi", Tier::Premium);

        assert!(matches!(result, Err(CoreError::InvalidCode(_))));
    }

    #[test]
    fn test_validate_rejects_symbols() {
        let policy = CodePolicy::default();
        let err = policy
            .validate_custom_code("my-link", Tier::Authenticated)
            .unwrap_err();

        assert!(err.to_string().contains("letters and digits"));
    }

    #[test]
    fn test_validate_reserved_codes() {
        let policy = CodePolicy::default();
        assert!(policy.validate_custom_code("Health", Tier::Premium).is_err());
        assert!(policy.validate_custom_code("stats", Tier::Premium).is_err());
    }

    #[test]
    fn test_validate_empty_string() {
        let policy = CodePolicy::default();
        assert!(policy.validate_custom_code("", Tier::Premium).is_err());
    }
}
