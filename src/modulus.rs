//! Security-level standard table and the `CoefficientModulus`/`PlainModulus`
//! factories that turn a `(poly_modulus_degree, security_level)` or a bit-size
//! recipe into an actual list of NTT-friendly primes.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::util::primes::{generate_prime, generate_primes};
use crate::util::small_modulus::SmallModulus;

/// The standard security levels from the HomomorphicEncryption.org security
/// standard, keyed by `poly_modulus_degree` in [`SecurityLevel::max_bit_count`].
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum SecurityLevel {
	/// No security check is performed; `insecure-params` must be enabled for
	/// a context to accept parameters at this level.
	None,
	/// 128-bit classical security.
	Tc128,
	/// 192-bit classical security.
	Tc192,
	/// 256-bit classical security.
	Tc256,
}

impl Default for SecurityLevel {
	fn default() -> Self {
		SecurityLevel::Tc128
	}
}

/// `(poly_modulus_degree, max_bits_128, max_bits_192, max_bits_256)` rows of
/// the standard table, literal data rather than a computed formula (matching
/// how the original FFI-bound `SecurityLevel` is treated as an opaque lookup
/// by its own callers).
const STANDARD_TABLE: &[(u64, u32, u32, u32)] = &[
	(1024, 27, 19, 14),
	(2048, 54, 37, 29),
	(4096, 109, 75, 58),
	(8192, 218, 152, 118),
	(16384, 438, 305, 237),
	(32768, 881, 611, 476),
];

impl SecurityLevel {
	/// The maximum total coefficient-modulus bit count this level permits for
	/// `poly_modulus_degree`, or `None` if `n` isn't one of the standard's
	/// tabulated power-of-two degrees (callers outside that table should fall
	/// back to `SecurityLevel::None` plus the `insecure-params` feature).
	pub fn max_bit_count(&self, n: u64) -> Option<u32> {
		if matches!(self, SecurityLevel::None) {
			return None;
		}
		STANDARD_TABLE.iter().find(|row| row.0 == n).map(|&(_, b128, b192, b256)| match self {
			SecurityLevel::Tc128 => b128,
			SecurityLevel::Tc192 => b192,
			SecurityLevel::Tc256 => b256,
			SecurityLevel::None => unreachable!(),
		})
	}
}

/// Largest bit size a single coefficient-modulus prime may have (SEAL's own
/// convention, one bit under [`SmallModulus::MAX_BITS`] to leave Barrett
/// reduction headroom during NTT butterflies).
const MAX_PRIME_BITS: u32 = 60;
const MIN_PRIME_BITS: u32 = 2;

/// Factory for coefficient-modulus prime chains.
pub struct CoefficientModulus;

impl CoefficientModulus {
	/// Builds a coefficient modulus chain matching `bit_sizes` exactly: one
	/// prime per entry, each of the requested bit size and congruent to `1
	/// mod 2n`.
	///
	/// Equal bit sizes never collide: every distinct bit size in `bit_sizes`
	/// is expanded into its own descending-value pool (searching downward
	/// from the top of that bit range) on first encounter, walking
	/// `bit_sizes` from the end backward; primes are popped off the front of
	/// their pool in that same backward order. Read back in the caller's
	/// original order, this means a run of equal bit sizes comes out
	/// strictly *increasing*, not decreasing — the largest prime in a pool
	/// always lands at that bit size's last (rightmost) occurrence.
	pub fn create(n: crate::parameters::DegreeType, bit_sizes: &[u32]) -> Result<Vec<SmallModulus>> {
		let n: u64 = n.into();
		if bit_sizes.is_empty() {
			return Err(Error::InvalidCoeffModulus("bit_sizes must not be empty".into()));
		}
		for &bits in bit_sizes {
			if !(MIN_PRIME_BITS..=MAX_PRIME_BITS).contains(&bits) {
				return Err(Error::InvalidCoeffModulus(format!(
					"bit size {bits} out of supported range [{MIN_PRIME_BITS}, {MAX_PRIME_BITS}]"
				)));
			}
		}

		use std::collections::HashMap;
		let mut pools: HashMap<u32, Vec<u64>> = HashMap::new();
		let mut assigned = vec![0u64; bit_sizes.len()];

		for (i, &bits) in bit_sizes.iter().enumerate().rev() {
			let pool = match pools.get_mut(&bits) {
				Some(p) => p,
				None => {
					let count = bit_sizes.iter().filter(|&&b| b == bits).count();
					let generated = generate_primes(n, bits, count)?;
					pools.entry(bits).or_insert(generated)
				}
			};
			let prime = pool.remove(0);
			assigned[i] = prime;
		}

		assigned.into_iter().map(SmallModulus::new).collect()
	}

	/// The default coefficient modulus for `n` at `security_level`: splits
	/// that level's total bit budget (from [`SecurityLevel::max_bit_count`])
	/// into as few primes as possible (each at most [`MAX_PRIME_BITS`] bits,
	/// sized as evenly as the remainder allows) and calls [`create`](Self::create).
	pub fn bfv_default(n: crate::parameters::DegreeType, security_level: SecurityLevel) -> Result<Vec<SmallModulus>> {
		let degree: u64 = n.into();
		let total_bits = security_level
			.max_bit_count(degree)
			.ok_or_else(|| Error::InsecureParameters(security_level))?;

		Self::create(n, &split_bit_budget(total_bits))
	}
}

/// Splits `total_bits` into a list of near-equal chunks, each within
/// `[MIN_PRIME_BITS, MAX_PRIME_BITS]`, summing to `total_bits`.
fn split_bit_budget(total_bits: u32) -> Vec<u32> {
	let chunk_count = total_bits.div_ceil(MAX_PRIME_BITS).max(1);
	let base = total_bits / chunk_count;
	let remainder = total_bits % chunk_count;
	(0..chunk_count)
		.map(|i| if i < remainder { base + 1 } else { base })
		.collect()
}

/// Factory for plaintext-modulus primes.
pub struct PlainModulus;

impl PlainModulus {
	/// A plaintext modulus suitable for batching at degree `n`: a prime of
	/// `bit_size` bits congruent to `1 mod 2n`.
	pub fn batching(n: crate::parameters::DegreeType, bit_size: u32) -> Result<SmallModulus> {
		let degree: u64 = n.into();
		let prime = generate_prime(degree, bit_size)?;
		SmallModulus::new(prime)
	}

	/// Several distinct batching-capable plaintext moduli of `bit_size` bits.
	pub fn batching_multi(n: crate::parameters::DegreeType, bit_size: u32, count: usize) -> Result<Vec<SmallModulus>> {
		let degree: u64 = n.into();
		generate_primes(degree, bit_size, count)?
			.into_iter()
			.map(SmallModulus::new)
			.collect()
	}

	/// A fixed plaintext modulus value, with no batching congruence
	/// requirement.
	pub fn constant(value: u64) -> Result<SmallModulus> {
		SmallModulus::new(value)
	}
}
