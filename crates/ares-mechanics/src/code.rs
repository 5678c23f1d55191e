//! Hexadecimal code generation under a shared-prefix constraint.
//!
//! Every code issued by one [`CodeGenerator`] starts with the same hex digit
//! and differs from every other code it issued. Draws are rejected and
//! retried until unique, up to a fixed budget.

use rand::Rng;
use rand::rngs::StdRng;

use crate::error::{MechError, MechResult};

/// Digits a code is made of.
pub const HEX_DIGITS: [char; 16] = [
    '0', '1', '2', '3', '4', '5', '6', '7', '8', '9', 'A', 'B', 'C', 'D', 'E', 'F',
];

/// Shortest supported code.
pub const MIN_LENGTH: usize = 1;

/// Longest supported code.
pub const MAX_LENGTH: usize = 16;

/// Draws attempted for one code before giving up.
pub const DEFAULT_MAX_DRAWS: u32 = 1_000;

/// Issues unique fixed-length hex codes sharing one leading digit.
#[derive(Debug, Clone)]
pub struct CodeGenerator {
    length: usize,
    prefix: char,
    issued: Vec<String>,
}

impl CodeGenerator {
    /// Create a generator with a randomly chosen leading digit.
    pub fn new(length: usize, rng: &mut StdRng) -> MechResult<Self> {
        let prefix = random_digit(rng);
        Self::with_prefix(length, prefix)
    }

    /// Create a generator with a fixed leading digit.
    pub fn with_prefix(length: usize, prefix: char) -> MechResult<Self> {
        if !(MIN_LENGTH..=MAX_LENGTH).contains(&length) {
            return Err(MechError::InvalidCodeLength {
                length,
                min: MIN_LENGTH,
                max: MAX_LENGTH,
            });
        }
        Ok(Self {
            length,
            prefix: prefix.to_ascii_uppercase(),
            issued: Vec::new(),
        })
    }

    /// The digit every code starts with.
    pub fn prefix(&self) -> char {
        self.prefix
    }

    /// Length of every code.
    pub fn length(&self) -> usize {
        self.length
    }

    /// Codes issued so far, in issue order.
    pub fn issued(&self) -> &[String] {
        &self.issued
    }

    /// Draw a fresh code distinct from everything issued before.
    pub fn next_code(&mut self, rng: &mut StdRng) -> MechResult<String> {
        for _ in 0..DEFAULT_MAX_DRAWS {
            let mut code = String::with_capacity(self.length);
            code.push(self.prefix);
            for _ in 1..self.length {
                code.push(random_digit(rng));
            }
            if self.accept(&code) {
                return Ok(code);
            }
        }
        Err(MechError::GenerationExhausted {
            attempts: DEFAULT_MAX_DRAWS,
        })
    }

    /// Derive a near-miss of `base`: one digit other than the leading one
    /// replaced at random, retried until distinct from everything issued.
    pub fn next_variant(&mut self, base: &str, rng: &mut StdRng) -> MechResult<String> {
        let digits: Vec<char> = base.chars().collect();
        if digits.len() < 2 {
            return Err(MechError::InvalidCodeLength {
                length: digits.len(),
                min: 2,
                max: MAX_LENGTH,
            });
        }
        for _ in 0..DEFAULT_MAX_DRAWS {
            let mut mutated = digits.clone();
            let position = rng.random_range(1..mutated.len());
            mutated[position] = random_digit(rng);
            let code: String = mutated.into_iter().collect();
            if self.accept(&code) {
                return Ok(code);
            }
        }
        Err(MechError::GenerationExhausted {
            attempts: DEFAULT_MAX_DRAWS,
        })
    }

    fn accept(&mut self, code: &str) -> bool {
        if self.issued.iter().any(|existing| existing == code) {
            return false;
        }
        self.issued.push(code.to_string());
        true
    }
}

fn random_digit(rng: &mut StdRng) -> char {
    HEX_DIGITS[rng.random_range(0..HEX_DIGITS.len())]
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rand::SeedableRng;

    #[test]
    fn codes_share_prefix_and_length() {
        let mut rng = StdRng::seed_from_u64(11);
        let mut generator = CodeGenerator::new(8, &mut rng).unwrap();
        for _ in 0..10 {
            let code = generator.next_code(&mut rng).unwrap();
            assert_eq!(code.len(), 8);
            assert!(code.starts_with(generator.prefix()));
            assert!(code.chars().all(|c| HEX_DIGITS.contains(&c)));
        }
    }

    #[test]
    fn codes_are_unique() {
        let mut rng = StdRng::seed_from_u64(5);
        let mut generator = CodeGenerator::with_prefix(3, 'a').unwrap();
        assert_eq!(generator.prefix(), 'A');
        for _ in 0..50 {
            generator.next_code(&mut rng).unwrap();
        }
        let mut issued = generator.issued().to_vec();
        issued.sort();
        issued.dedup();
        assert_eq!(issued.len(), 50);
    }

    #[test]
    fn exhausted_space_is_reported() {
        let mut rng = StdRng::seed_from_u64(1);
        let mut generator = CodeGenerator::with_prefix(1, '7').unwrap();
        assert_eq!(generator.next_code(&mut rng).unwrap(), "7");
        assert_eq!(
            generator.next_code(&mut rng),
            Err(MechError::GenerationExhausted {
                attempts: DEFAULT_MAX_DRAWS
            })
        );
    }

    #[test]
    fn invalid_lengths_rejected() {
        assert!(CodeGenerator::with_prefix(0, '0').is_err());
        assert!(CodeGenerator::with_prefix(17, '0').is_err());
    }

    #[test]
    fn variant_differs_in_exactly_one_trailing_digit() {
        let mut rng = StdRng::seed_from_u64(21);
        let mut generator = CodeGenerator::new(6, &mut rng).unwrap();
        let base = generator.next_code(&mut rng).unwrap();
        for _ in 0..5 {
            let variant = generator.next_variant(&base, &mut rng).unwrap();
            assert_ne!(variant, base);
            assert_eq!(variant.chars().next(), base.chars().next());
            let differences = variant
                .chars()
                .zip(base.chars())
                .filter(|(a, b)| a != b)
                .count();
            assert_eq!(differences, 1);
        }
    }

    #[test]
    fn variant_of_single_digit_is_rejected() {
        let mut rng = StdRng::seed_from_u64(2);
        let mut generator = CodeGenerator::with_prefix(1, 'B').unwrap();
        assert!(matches!(
            generator.next_variant("B", &mut rng),
            Err(MechError::InvalidCodeLength { .. })
        ));
    }

    proptest! {
        #[test]
        fn issued_codes_stay_distinct(seed in any::<u64>(), length in 4usize..=16) {
            let mut rng = StdRng::seed_from_u64(seed);
            let mut generator = CodeGenerator::new(length, &mut rng).unwrap();
            let base = generator.next_code(&mut rng).unwrap();
            for _ in 0..4 {
                generator.next_variant(&base, &mut rng).unwrap();
                generator.next_code(&mut rng).unwrap();
            }
            let mut issued = generator.issued().to_vec();
            prop_assert!(issued.iter().all(|c| c.starts_with(generator.prefix())));
            issued.sort();
            issued.dedup();
            prop_assert_eq!(issued.len(), 9);
        }
    }
}
