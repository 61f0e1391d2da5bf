//! Galois automorphism tool: substitution `X -> X^elt` on ring elements,
//! both in coefficient form and directly in the NTT domain.
//!
//! The Galois group of `Z[X]/(X^N+1)` is `(Z/2NZ)^*`, generated by `3`.
//! A "step" `k` (used by callers to mean "rotate plaintext slots by `k`")
//! maps to a Galois element `3^k mod 2N`; `elt_from_step` performs that
//! mapping and `get_elts_all` enumerates the elements needed to realize
//! every slot rotation.

use crate::error::{Error, Result};
use crate::util::bit_reverse;

/// Computes the Galois element corresponding to rotating by `step` slots,
/// for a ring of degree `n` (`n` a power of two, `2n` the group order).
///
/// `step` may be negative (rotate the other way) or zero, in which case the
/// result is the row-swap (column rotation) element `2n - 1`, not the
/// identity `1`. The result is always an odd residue mod `2n`.
pub fn elt_from_step(step: i32, n: usize) -> Result<u32> {
	if n == 0 || !n.is_power_of_two() {
		return Err(Error::InvalidPolyModulusDegree(n as u64));
	}
	let m = (2 * n) as u32;
	if step == 0 {
		// the zero step is the row-swap (column rotation), not the identity.
		return Ok(m - 1);
	}
	let n_half = (n / 2) as i32;
	// Slot rotations only make sense in the range of an n/2-slot batching
	// matrix; reduce step into that range before exponentiating.
	let reduced = ((step % n_half as i32) + n_half) % n_half;
	let exponent = reduced as u32;
	Ok(pow_mod_u32(3, exponent, m))
}

/// Enumerates the Galois elements needed to realize every slot rotation of
/// an `n`-slot batching layout.
///
/// Pushes the row-swap element `2n - 1` first, then for `i in 0..log2(n)-1`
/// pushes `3^(2^i) mod 2n` followed by its inverse mod `2n` — the same
/// "power of 3 and its inverse, doubling the exponent each round" generating
/// set SEAL's `galois.cpp` builds, which realizes every rotation step with a
/// logarithmic number of stored Galois keys rather than one key per step.
pub fn get_elts_all(n: usize) -> Result<Vec<u32>> {
	if n == 0 || !n.is_power_of_two() {
		return Err(Error::InvalidPolyModulusDegree(n as u64));
	}
	let m = (2 * n) as u32;
	let log_n = n.trailing_zeros();
	let mut elts = Vec::with_capacity(2 * log_n as usize + 1);
	elts.push(m - 1);
	let mut cur = 3u32 % m;
	for _ in 0..log_n.saturating_sub(1) {
		elts.push(cur);
		elts.push(inv_mod_u32(cur, m));
		cur = ((cur as u64 * cur as u64) % m as u64) as u32;
	}
	Ok(elts)
}

/// Modular inverse of `a` mod `m` via the extended Euclidean algorithm.
/// `a` and `m` are assumed coprime (callers only ever pass odd `a` against
/// a power-of-two `m`).
fn inv_mod_u32(a: u32, m: u32) -> u32 {
	let (mut old_r, mut r) = (a as i64, m as i64);
	let (mut old_s, mut s) = (1i64, 0i64);
	while r != 0 {
		let q = old_r / r;
		let tmp_r = old_r - q * r;
		old_r = r;
		r = tmp_r;
		let tmp_s = old_s - q * s;
		old_s = s;
		s = tmp_s;
	}
	let m_i = m as i64;
	(((old_s % m_i) + m_i) % m_i) as u32
}

/// Applies the substitution `X -> X^elt` to `values` (coefficient form, one
/// `SmallModulus`-reduced coefficient per entry), writing the result into
/// `destination`. `elt` must be odd and in `[1, 2n)`.
pub fn apply(values: &[u64], elt: u32, modulus: u64, destination: &mut [u64]) -> Result<()> {
	let n = values.len();
	if destination.len() != n {
		return Err(Error::LengthMismatch {
			expected: n,
			actual: destination.len(),
		});
	}
	if n == 0 || !n.is_power_of_two() {
		return Err(Error::InvalidPolyModulusDegree(n as u64));
	}
	if elt % 2 == 0 || elt as usize >= 2 * n {
		return Err(Error::InvalidForContext("galois element must be odd and < 2n".into()));
	}

	let mask = (n - 1) as u32;
	for i in 0..n {
		// index_raw = i * elt mod 2n; negacyclic reduction folds the high
		// half back with a sign flip.
		let index_raw = (i as u64 * elt as u64) % (2 * n) as u64;
		let index_raw = index_raw as u32;
		let dest_index = (index_raw & mask) as usize;
		let negate = index_raw & (n as u32) != 0;
		let v = values[i];
		destination[dest_index] = if negate {
			if v == 0 {
				0
			} else {
				modulus - v
			}
		} else {
			v
		};
	}
	Ok(())
}

/// Applies the substitution `X -> X^elt` directly to an NTT-domain vector
/// (bit-reversed point-value order), writing the result into `destination`.
///
/// Unlike [`apply`], this needs no sign flips: permuting NTT evaluation
/// points by the automorphism's action on the bit-reversed index is exactly
/// equivalent to transforming the coefficient-form substitution result.
pub fn apply_ntt(values: &[u64], elt: u32, destination: &mut [u64]) -> Result<()> {
	let n = values.len();
	if destination.len() != n {
		return Err(Error::LengthMismatch {
			expected: n,
			actual: destination.len(),
		});
	}
	if n == 0 || !n.is_power_of_two() {
		return Err(Error::InvalidPolyModulusDegree(n as u64));
	}
	if elt % 2 == 0 || elt as usize >= 2 * n {
		return Err(Error::InvalidForContext("galois element must be odd and < 2n".into()));
	}

	let log_n = n.trailing_zeros();
	let two_n = (2 * n) as u32;
	for p in 0..n {
		let br = bit_reverse(p as u32, log_n);
		let raw = (elt as u64 * (2 * br as u64 + 1)) % two_n as u64;
		let j_prime = ((raw as u32 - 1) / 2) as u32;
		let mapped = bit_reverse(j_prime, log_n) as usize;
		destination[p] = values[mapped];
	}
	Ok(())
}

fn pow_mod_u32(base: u32, exponent: u32, modulus: u32) -> u32 {
	let mut result = 1u64;
	let mut b = base as u64 % modulus as u64;
	let mut e = exponent;
	let m = modulus as u64;
	while e > 0 {
		if e & 1 == 1 {
			result = (result * b) % m;
		}
		b = (b * b) % m;
		e >>= 1;
	}
	result as u32
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn elt_from_step_matches_expected_generator_powers() {
		// S3: N=8, g=3 -> step 0 is the row-swap element 2N-1=15, step i
		// (i != 0) maps to 3^i mod 16; negative steps mirror their
		// positive counterpart mod n/2.
		assert_eq!(elt_from_step(0, 8).unwrap(), 15);
		assert_eq!(elt_from_step(1, 8).unwrap(), 3);
		assert_eq!(elt_from_step(-3, 8).unwrap(), 3);
		assert_eq!(elt_from_step(2, 8).unwrap(), 9);
		assert_eq!(elt_from_step(-2, 8).unwrap(), 9);
		assert_eq!(elt_from_step(3, 8).unwrap(), 11);
		assert_eq!(elt_from_step(-1, 8).unwrap(), 11);
	}

	#[test]
	fn get_elts_all_matches_s3() {
		// S3: N=8 -> [15, 3, 11, 9, 9].
		let elts = get_elts_all(8).unwrap();
		assert_eq!(elts, vec![15, 3, 11, 9, 9]);
	}

	#[test]
	fn apply_matches_s2_expected_output() {
		// S2: N=8, q=17, k=3 (the Galois element itself, not a rotation
		// step), input=[0..7] -> expected [0,14,6,1,13,7,2,12].
		let q = 17u64;
		let elt = 3u32;
		let values: Vec<u64> = (0..8).collect();
		let mut out = vec![0u64; 8];
		apply(&values, elt, q, &mut out).unwrap();
		assert_eq!(out, vec![0, 14, 6, 1, 13, 7, 2, 12]);
	}

	#[test]
	fn apply_ntt_matches_s2_expected_output() {
		// S2: N=8, k=3 (element), input=[0..7] -> expected [4,5,7,6,1,0,2,3].
		let elt = 3u32;
		let values: Vec<u64> = (0..8).collect();
		let mut out = vec![0u64; 8];
		apply_ntt(&values, elt, &mut out).unwrap();
		assert_eq!(out, vec![4, 5, 7, 6, 1, 0, 2, 3]);
	}

	#[test]
	fn apply_ntt_identity_element_is_identity() {
		let values: Vec<u64> = (0..8).collect();
		let mut out = vec![0u64; 8];
		apply_ntt(&values, 1, &mut out).unwrap();
		assert_eq!(out, values);
	}

	#[test]
	fn rejects_even_element() {
		let values = vec![0u64; 8];
		let mut out = vec![0u64; 8];
		assert!(apply(&values, 2, 17, &mut out).is_err());
		assert!(apply_ntt(&values, 2, &mut out).is_err());
	}
}
