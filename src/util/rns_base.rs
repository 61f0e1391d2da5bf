//! Residue Number System support: a base of pairwise-coprime
//! [`SmallModulus`] primes, CRT decomposition/composition over that base,
//! fast base conversion between two bases, and the modulus-switching
//! "divide and round the last modulus" primitive.
//!
//! A ciphertext coefficient modulus `q = q_0 * q_1 * ... * q_{k-1}` is never
//! materialized as one big integer during ring arithmetic; instead every
//! ring element is stored as `k` parallel residues, one per `q_i`. This
//! module is the bridge between that representation and the handful of
//! places (serialization, decryption-adjacent bookkeeping, rescaling) where
//! the actual big integer value is needed. [`sm_mrq`] is the one case that
//! needs neither: it reduces a residue vector straight down to a single
//! small modulus `t`, which is what BFV decryption uses to recover a
//! plaintext coefficient without ever composing the full ciphertext-modulus
//! integer.

use crate::error::{Error, Result};
use crate::util::big_uint::BigUInt;
use crate::util::small_modulus::{dot_product_mod, mul_mod, sub_mod, try_invert_mod, SmallModulus};

/// A base of pairwise-coprime primes together with the CRT constants needed
/// to decompose a big integer into residues and recompose residues back
/// into a big integer.
#[derive(Debug, Clone)]
pub struct RnsBase {
	primes: Vec<SmallModulus>,
	/// `base_prod = product(primes)`.
	base_prod: BigUInt,
	/// `punctured_prod[i] = base_prod / primes[i].value()`.
	punctured_prod: Vec<BigUInt>,
	/// `inv_punctured_prod_mod_self[i] = (punctured_prod[i] mod primes[i])^-1
	/// mod primes[i]`.
	inv_punctured_prod_mod_self: Vec<u64>,
}

impl RnsBase {
	/// Builds an RNS base from `primes`. Every entry must be nonzero and the
	/// primes must be pairwise coprime (verified via a pairwise gcd check,
	/// since this is construction-time and not a hot path).
	pub fn new(primes: &[SmallModulus]) -> Result<Self> {
		if primes.is_empty() {
			return Err(Error::InvalidCoeffModulus("RNS base must have at least one prime".into()));
		}
		for p in primes {
			if p.is_zero() {
				return Err(Error::InvalidCoeffModulus("RNS base prime must be nonzero".into()));
			}
		}
		for i in 0..primes.len() {
			for j in (i + 1)..primes.len() {
				if gcd(primes[i].value(), primes[j].value()) != 1 {
					return Err(Error::InvalidCoeffModulus(format!(
						"RNS base primes {} and {} are not coprime",
						primes[i].value(),
						primes[j].value()
					)));
				}
			}
		}

		let k = primes.len();
		let limb_count = k + 1;
		let mut base_prod = BigUInt::from_limbs(vec![1]);
		for p in primes {
			base_prod = base_prod.mul(&BigUInt::from_limbs(vec![p.value()]));
		}

		let mut punctured_prod = Vec::with_capacity(k);
		let mut inv_punctured_prod_mod_self = Vec::with_capacity(k);
		for (i, p) in primes.iter().enumerate() {
			let mut product = BigUInt::from_limbs(vec![1]);
			for (j, other) in primes.iter().enumerate() {
				if i != j {
					product = product.mul(&BigUInt::from_limbs(vec![other.value()]));
				}
			}
			let mut divisor = BigUInt::zero(product.limb_count());
			divisor.as_mut().limbs_mut()[0] = p.value();
			let (_, remainder) = product.divide(&divisor)?;
			let residue_mod = remainder.limbs().first().copied().unwrap_or(0) % p.value();
			let inv = try_invert_mod(residue_mod, p)?;

			let mut padded = product;
			padded.resize(limb_count);
			punctured_prod.push(padded);
			inv_punctured_prod_mod_self.push(inv);
		}

		let mut base_prod_padded = base_prod;
		base_prod_padded.resize(limb_count);

		Ok(Self {
			primes: primes.to_vec(),
			base_prod: base_prod_padded,
			punctured_prod,
			inv_punctured_prod_mod_self,
		})
	}

	/// The primes making up this base, in order.
	pub fn primes(&self) -> &[SmallModulus] {
		&self.primes
	}

	/// Number of primes in the base.
	pub fn len(&self) -> usize {
		self.primes.len()
	}

	/// `true` if the base has no primes (never constructible via [`new`](Self::new),
	/// kept for API symmetry with other collection types).
	pub fn is_empty(&self) -> bool {
		self.primes.is_empty()
	}

	/// The product of every prime in the base.
	pub fn base_prod(&self) -> &BigUInt {
		&self.base_prod
	}

	fn reduce_big_uint(&self, value: &BigUInt, p: &SmallModulus) -> Result<u64> {
		let mut divisor = BigUInt::zero(value.limb_count());
		divisor.as_mut().limbs_mut()[0] = p.value();
		let (_, remainder) = value.divide(&divisor)?;
		Ok(remainder.limbs().first().copied().unwrap_or(0) % p.value())
	}

	/// Decomposes a big integer `value` into one residue per prime in the
	/// base.
	pub fn decompose(&self, value: &BigUInt) -> Result<Vec<u64>> {
		self.primes.iter().map(|p| self.reduce_big_uint(value, p)).collect()
	}

	/// Decomposes every entry of `values` into a `[prime][coefficient]`
	/// residue matrix, flattened row-major (`count = values.len()`).
	pub fn decompose_array(&self, values: &[BigUInt]) -> Result<Vec<u64>> {
		let count = values.len();
		let mut out = vec![0u64; count * self.primes.len()];
		for (c, value) in values.iter().enumerate() {
			let residues = self.decompose(value)?;
			for (i, r) in residues.into_iter().enumerate() {
				out[i * count + c] = r;
			}
		}
		Ok(out)
	}

	/// Recomposes a residue vector (one entry per prime, in base order) back
	/// into a big integer via CRT: `sum(r_i * inv_i * punctured_i) mod
	/// base_prod`.
	pub fn compose(&self, residues: &[u64]) -> Result<BigUInt> {
		if residues.len() != self.primes.len() {
			return Err(Error::LengthMismatch {
				expected: self.primes.len(),
				actual: residues.len(),
			});
		}

		// Headroom beyond base_prod's own limb count: summing `k` terms each
		// roughly base_prod-sized adds at most `log2(k)` bits, comfortably
		// under one extra 64-bit limb for any chain length this engine
		// supports, so the accumulator never needs to truncate before the
		// final reduction below.
		let acc_limbs = self.base_prod.limb_count() + 2;
		let mut acc = BigUInt::zero(acc_limbs);
		for i in 0..self.primes.len() {
			let scaled_residue = mul_mod(residues[i], self.inv_punctured_prod_mod_self[i], &self.primes[i]);
			let mut term = self.punctured_prod[i].mul(&BigUInt::from_limbs(vec![scaled_residue]));
			term.resize(acc_limbs);
			let mut next = acc.add(&term);
			next.resize(acc_limbs);
			acc = next;
		}
		let (_, remainder) = acc.divide(&self.base_prod)?;
		Ok(remainder)
	}

	/// Computes `(base_prod mod t)` for a plaintext-ish modulus `t`, the
	/// scalar needed by modulus-switching's "how far above the plaintext
	/// range is this ciphertext" bookkeeping.
	pub fn base_prod_mod(&self, t: &SmallModulus) -> Result<u64> {
		self.reduce_big_uint(&self.base_prod, t)
	}
}

/// Converts residue arrays from one RNS base to another using the "fast"
/// (approximate) base-conversion algorithm: for each output prime `p_j`,
/// computes `sum_i(r_i * inv_i mod q_i) * punctured_i mod p_j`, i.e. avoids
/// ever materializing the full composed integer.
pub struct FastBaseConverter {
	from: RnsBase,
	to: RnsBase,
	/// `punctured_mod_to[i][j] = (from.punctured_prod[i] mod to.primes[j])`.
	punctured_mod_to: Vec<Vec<u64>>,
}

impl FastBaseConverter {
	/// Builds a converter from `from` to `to`, precomputing the cross-base
	/// reduction table.
	pub fn new(from: RnsBase, to: RnsBase) -> Result<Self> {
		let mut punctured_mod_to = Vec::with_capacity(from.len());
		for punctured in &from.punctured_prod {
			let mut row = Vec::with_capacity(to.len());
			for p in to.primes() {
				row.push(from.reduce_big_uint(punctured, p)?);
			}
			punctured_mod_to.push(row);
		}
		Ok(Self { from, to, punctured_mod_to })
	}

	/// The source base.
	pub fn from(&self) -> &RnsBase {
		&self.from
	}

	/// The destination base.
	pub fn to(&self) -> &RnsBase {
		&self.to
	}

	/// Converts one residue vector (`from.len()` entries) into a residue
	/// vector over `to`.
	pub fn fast_convert(&self, input: &[u64]) -> Result<Vec<u64>> {
		if input.len() != self.from.len() {
			return Err(Error::LengthMismatch {
				expected: self.from.len(),
				actual: input.len(),
			});
		}

		// v_i = r_i * inv_punctured_prod_mod_self[i] mod q_i; this is the
		// per-prime "CRT coefficient" independent of the destination base.
		let v: Vec<u64> = (0..self.from.len())
			.map(|i| mul_mod(input[i], self.from.inv_punctured_prod_mod_self[i], &self.from.primes[i]))
			.collect();

		Ok(self
			.to
			.primes
			.iter()
			.enumerate()
			.map(|(j, p)| {
				let punctured_col: Vec<u64> = self.punctured_mod_to.iter().map(|row| row[j]).collect();
				dot_product_mod(&v, &punctured_col, p)
			})
			.collect())
	}

	/// Converts an entire `[prime][coefficient]` residue array (row-major,
	/// `count` coefficients per row) from `from`'s layout to `to`'s layout.
	pub fn fast_convert_array(&self, input: &[u64], count: usize) -> Result<Vec<u64>> {
		if input.len() != count * self.from.len() {
			return Err(Error::LengthMismatch {
				expected: count * self.from.len(),
				actual: input.len(),
			});
		}
		let mut out = vec![0u64; count * self.to.len()];
		for c in 0..count {
			let residues: Vec<u64> = (0..self.from.len()).map(|i| input[i * count + c]).collect();
			let converted = self.fast_convert(&residues)?;
			for (j, v) in converted.into_iter().enumerate() {
				out[j * count + c] = v;
			}
		}
		Ok(out)
	}
}

/// Reduces an RNS residue vector (over `base`) mod a small modulus `t`, the
/// small-modulus analogue of a Montgomery reduction BFV decryption uses to
/// recover a plaintext coefficient from a ciphertext's per-prime residues.
/// Built on the same approximate fast base conversion as
/// [`FastBaseConverter::fast_convert`] (§4.4), specialized to a singleton
/// destination base `{t}`.
pub fn sm_mrq(base: &RnsBase, residues: &[u64], t: &SmallModulus) -> Result<u64> {
	let to = RnsBase::new(std::slice::from_ref(t))?;
	let converter = FastBaseConverter::new(base.clone(), to)?;
	Ok(converter.fast_convert(residues)?[0])
}

/// Drops the last prime of an RNS array, rounding each remaining residue to
/// compensate: for each coefficient, converts the last prime's residue
/// (shifted by half the prime to turn truncation into rounding) into the
/// remaining base, then subtracts the shift back out and divides by the
/// dropped modulus. This is the modulus-switching step that maps a
/// ciphertext from a `k`-prime chain level down to the `k-1`-prime level.
///
/// `array` is a `[k][count]` row-major residue matrix over `base`'s primes;
/// returns a `[k-1][count]` matrix over the first `k-1` primes.
pub fn divide_and_round_q_last_inplace(base: &RnsBase, array: &[u64], count: usize) -> Result<Vec<u64>> {
	let k = base.len();
	if k < 2 {
		return Err(Error::InvalidCoeffModulus(
			"cannot drop the last modulus of a single-prime RNS base".into(),
		));
	}
	if array.len() != k * count {
		return Err(Error::LengthMismatch {
			expected: k * count,
			actual: array.len(),
		});
	}

	let last = &base.primes()[k - 1];
	let half = last.value() / 2;
	let remaining = RnsBase::new(&base.primes()[..k - 1])?;
	let last_base = RnsBase::new(&base.primes()[k - 1..])?;
	let converter = FastBaseConverter::new(last_base, remaining.clone())?;

	// last_residues[c] = r_last[c] + half, so truncating division below
	// rounds to nearest instead of toward zero.
	let last_residues: Vec<u64> = (0..count)
		.map(|c| {
			let r = array[(k - 1) * count + c];
			(r + half) % last.value()
		})
		.collect();
	let shifted_in_remaining_base = converter.fast_convert_array(&last_residues, count)?;

	let half_mod_remaining: Vec<u64> = remaining.primes().iter().map(|p| half % p.value()).collect();
	let last_inv_mod_remaining: Vec<u64> = remaining
		.primes()
		.iter()
		.map(|p| try_invert_mod(last.value() % p.value(), p))
		.collect::<Result<Vec<_>>>()?;

	let mut out = vec![0u64; (k - 1) * count];
	for (i, p) in remaining.primes().iter().enumerate() {
		for c in 0..count {
			let r_i = array[i * count + c];
			let shifted = shifted_in_remaining_base[i * count + c];
			// (r_i - (shifted - half_mod_p)) * last^{-1} mod p
			let unshifted = sub_mod(shifted, half_mod_remaining[i], p);
			let numerator = sub_mod(r_i, unshifted, p);
			out[i * count + c] = mul_mod(numerator, last_inv_mod_remaining[i], p);
		}
	}
	Ok(out)
}

fn gcd(mut a: u64, mut b: u64) -> u64 {
	while b != 0 {
		let t = b;
		b = a % b;
		a = t;
	}
	a
}

#[cfg(test)]
mod tests {
	use super::*;

	fn base3() -> RnsBase {
		RnsBase::new(&[
			SmallModulus::new(3).unwrap(),
			SmallModulus::new(5).unwrap(),
			SmallModulus::new(7).unwrap(),
		])
		.unwrap()
	}

	#[test]
	fn decompose_then_compose_is_identity() {
		let base = base3();
		for value in 0u64..105 {
			let big = BigUInt::from_limbs(vec![value]);
			let residues = base.decompose(&big).unwrap();
			let composed = base.compose(&residues).unwrap();
			assert_eq!(composed.limbs().first().copied().unwrap_or(0), value);
		}
	}

	#[test]
	fn rejects_non_coprime_primes() {
		let primes = [SmallModulus::new(6).unwrap(), SmallModulus::new(9).unwrap()];
		assert!(RnsBase::new(&primes).is_err());
	}

	#[test]
	fn fast_convert_matches_direct_decomposition() {
		let from = base3();
		let to = RnsBase::new(&[SmallModulus::new(11).unwrap(), SmallModulus::new(13).unwrap()]).unwrap();
		let converter = FastBaseConverter::new(from.clone(), to.clone()).unwrap();

		for value in [0u64, 1, 41, 104] {
			let big = BigUInt::from_limbs(vec![value]);
			let residues = from.decompose(&big).unwrap();
			let converted = converter.fast_convert(&residues).unwrap();
			let expected = to.decompose(&big).unwrap();
			assert_eq!(converted, expected);
		}
	}

	#[test]
	fn sm_mrq_matches_direct_reduction_mod_t() {
		let base = base3();
		let t = SmallModulus::new(11).unwrap();
		for value in [0u64, 1, 4, 26, 41, 104] {
			let big = BigUInt::from_limbs(vec![value]);
			let residues = base.decompose(&big).unwrap();
			let reduced = sm_mrq(&base, &residues, &t).unwrap();
			assert_eq!(reduced, value % 11);
		}
	}

	#[test]
	fn divide_and_round_drops_one_prime_and_rounds() {
		// base = {3,5,7}, value=104 -> drop 7: expect round(104/7)=15, stored mod {3,5}.
		let base = base3();
		let value = BigUInt::from_limbs(vec![104]);
		let residues = base.decompose(&value).unwrap();
		let reduced = divide_and_round_q_last_inplace(&base, &residues, 1).unwrap();

		let remaining = RnsBase::new(&base.primes()[..2]).unwrap();
		let expected = remaining.decompose(&BigUInt::from_limbs(vec![15])).unwrap();
		assert_eq!(reduced, expected);
	}
}
