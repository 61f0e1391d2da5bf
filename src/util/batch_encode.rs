//! Batching index map: the coefficient permutation a CRT-batched plaintext
//! encoder needs to lay out `N` scalar slots as a `2 x (N/2)` matrix.
//!
//! Only the index map itself is in scope here — the encoder that consumes
//! it (turning a slot vector into polynomial coefficients via an inverse
//! NTT over `Z_t`) is outside this crate, but the map is pure combinatorics
//! over `(N, t)` and is cheap to own independently.

use crate::error::{Error, Result};
use crate::util::bit_reverse;
use crate::util::small_modulus::SmallModulus;

/// Computes the matrix-representation index map for an `n`-coefficient
/// ring batched under plaintext modulus `t`.
///
/// Requires `t ≡ 1 (mod 2n)` (the same congruence NTT support needs) so
/// that the Galois group element `3` has order `2n`, which is what makes
/// slot `i` land at coefficient index `matrix_reps_index_map[i]`. Returns
/// one entry per coefficient: `result[i]` is the slot index whose value
/// ends up at polynomial coefficient `i`.
pub fn matrix_reps_index_map(n: usize, t: &SmallModulus) -> Result<Vec<usize>> {
	if n == 0 || !n.is_power_of_two() {
		return Err(Error::InvalidPolyModulusDegree(n as u64));
	}
	if t.value() < 2 || (t.value() - 1) % (2 * n as u64) != 0 {
		return Err(Error::InvalidPlainModulus(format!(
			"plain modulus {} does not support batching for n={}",
			t.value(),
			n
		)));
	}

	let log_n = n.trailing_zeros();
	let n_half = n / 2;
	let m = (2 * n) as u32;
	let gen = 3u32;

	let mut index_map = vec![0usize; n];
	let mut pos = 1u32;
	for i in 0..n_half {
		let index1 = (pos - 1) / 2;
		let index2 = (m - pos - 1) / 2;
		index_map[i] = bit_reverse(index1, log_n) as usize;
		index_map[i + n_half] = bit_reverse(index2, log_n) as usize;
		pos = (pos * gen) % m;
	}

	Ok(index_map)
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn index_map_is_a_permutation() {
		let t = SmallModulus::new(17).unwrap();
		let map = matrix_reps_index_map(8, &t).unwrap();
		let mut sorted = map.clone();
		sorted.sort_unstable();
		assert_eq!(sorted, (0..8).collect::<Vec<_>>());
	}

	#[test]
	fn rejects_plain_modulus_without_batching_support() {
		// 2*8 = 16 must divide t - 1; 5 - 1 = 4 does not.
		let t = SmallModulus::new(5).unwrap();
		assert!(matrix_reps_index_map(8, &t).is_err());
	}

	#[test]
	fn first_slot_maps_to_constant_coefficient() {
		let t = SmallModulus::new(17).unwrap();
		let map = matrix_reps_index_map(8, &t).unwrap();
		assert_eq!(map[0], 0);
	}
}
