//! Prime generation for NTT-friendly coefficient moduli.
//!
//! Enumerates primes `p` of a requested bit size with `p ≡ 1 (mod 2N)`, the
//! congruence that guarantees a primitive `2N`-th root of unity exists mod
//! `p` (required for the negacyclic NTT in [`crate::util::ntt`]).

use crate::error::{Error, Result};
use crate::util::small_modulus::is_prime;

/// Finds one prime of exactly `bit_size` bits congruent to `1 mod 2n`,
/// searching downward from the largest candidate of that bit size (matching
/// the convention the source's `CoeffModulus::Create` factory uses so that
/// repeated calls for decreasing bit sizes never collide).
pub fn generate_prime(n: u64, bit_size: u32) -> Result<u64> {
	generate_primes(n, bit_size, 1)?
		.into_iter()
		.next()
		.ok_or_else(|| Error::PrimeGenerationFailed(format!("no {bit_size}-bit prime found for n={n}")))
}

/// Finds `count` distinct primes of `bit_size` bits, each congruent to
/// `1 mod 2n`, searching downward from the top of the bit range and
/// skipping any the caller has already produced for a different bit size
/// (distinctness across calls is the caller's responsibility; within one
/// call the returned primes are pairwise distinct).
pub fn generate_primes(n: u64, bit_size: u32, count: usize) -> Result<Vec<u64>> {
	if bit_size < 2 || bit_size > 61 {
		return Err(Error::PrimeGenerationFailed(format!(
			"bit_size {bit_size} out of supported range [2, 61]"
		)));
	}
	let modulus = 2 * n;
	let upper = (1u64 << bit_size) - 1;
	let lower = 1u64 << (bit_size - 1);

	// Largest candidate <= upper congruent to 1 mod modulus.
	let mut candidate = upper - ((upper - 1) % modulus);
	let mut found = Vec::with_capacity(count);

	while candidate >= lower {
		if is_prime(candidate) {
			found.push(candidate);
			if found.len() == count {
				return Ok(found);
			}
		}
		if candidate < modulus {
			break;
		}
		candidate -= modulus;
	}

	Err(Error::PrimeGenerationFailed(format!(
		"found only {}/{count} primes of {bit_size} bits congruent to 1 mod {modulus}",
		found.len()
	)))
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn generated_primes_satisfy_the_ntt_congruence() {
		let n = 4096u64;
		let primes = generate_primes(n, 30, 3).unwrap();
		assert_eq!(primes.len(), 3);
		for p in &primes {
			assert!(is_prime(*p));
			assert_eq!((p - 1) % (2 * n), 0);
			assert!((1u64 << 29..1u64 << 30).contains(p));
		}
	}

	#[test]
	fn generate_prime_is_deterministic() {
		let n = 8192u64;
		let first = generate_prime(n, 30).unwrap();
		let second = generate_prime(n, 30).unwrap();
		assert_eq!(first, second);
		assert_eq!((first - 1) % (2 * n), 0);
	}

	#[test]
	fn rejects_out_of_range_bit_sizes() {
		assert!(generate_primes(1024, 1, 1).is_err());
		assert!(generate_primes(1024, 62, 1).is_err());
	}
}
