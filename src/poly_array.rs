//! RNS ring-element coefficient store.
//!
//! A [`PolyArray`] holds `poly_count` polynomials, each represented as
//! `coeff_modulus_size` parallel residue rows of `poly_modulus_degree`
//! coefficients — the RNS representation described in §3/§4 of the data
//! model. [`Plaintext`](crate::plaintext::Plaintext) wraps one with
//! `poly_count == 1`; [`Ciphertext`](crate::ciphertext::Ciphertext) wraps
//! one with `poly_count >= 2` (one polynomial per ciphertext component).
//!
//! Storage is row-major `[poly][prime][coeff]`, flattened into one `Vec<u64>`
//! so the whole array is one contiguous allocation regardless of shape.
//! [`PolyArrayView`]/[`PolyArrayViewMut`] borrow an existing buffer (a
//! caller-owned scratch, or another `PolyArray`'s storage) without copying,
//! mirroring the owned/aliased split [`crate::util::big_uint::BigUInt`] uses
//! for the same reason: an aliased view has no way to resize, so that
//! invariant is enforced by the type rather than a runtime flag.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Owned coefficient storage for a fixed-shape array of RNS polynomials.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PolyArray {
	data: Vec<u64>,
	poly_count: usize,
	coeff_modulus_size: usize,
	poly_modulus_degree: usize,
}

impl PolyArray {
	/// Allocates a zero-initialized array of `poly_count` polynomials, each
	/// `coeff_modulus_size` residue rows of `poly_modulus_degree`
	/// coefficients.
	pub fn new(poly_count: usize, coeff_modulus_size: usize, poly_modulus_degree: usize) -> Self {
		Self {
			data: vec![0u64; poly_count * coeff_modulus_size * poly_modulus_degree],
			poly_count,
			coeff_modulus_size,
			poly_modulus_degree,
		}
	}

	/// Number of polynomials (ciphertext size, or 1 for a plaintext).
	pub fn poly_count(&self) -> usize {
		self.poly_count
	}

	/// Number of RNS primes each polynomial is decomposed over.
	pub fn coeff_modulus_size(&self) -> usize {
		self.coeff_modulus_size
	}

	/// Ring degree `N`.
	pub fn poly_modulus_degree(&self) -> usize {
		self.poly_modulus_degree
	}

	/// The full flattened backing buffer.
	pub fn data(&self) -> &[u64] {
		&self.data
	}

	/// The full flattened backing buffer, mutably.
	pub fn data_mut(&mut self) -> &mut [u64] {
		&mut self.data
	}

	/// The coefficient row for polynomial `poly_index`'s `rns_index`-th
	/// prime.
	pub fn component(&self, poly_index: usize, rns_index: usize) -> Result<&[u64]> {
		let start = self.component_offset(poly_index, rns_index)?;
		Ok(&self.data[start..start + self.poly_modulus_degree])
	}

	/// The coefficient row for polynomial `poly_index`'s `rns_index`-th
	/// prime, mutably.
	pub fn component_mut(&mut self, poly_index: usize, rns_index: usize) -> Result<&mut [u64]> {
		let start = self.component_offset(poly_index, rns_index)?;
		let degree = self.poly_modulus_degree;
		Ok(&mut self.data[start..start + degree])
	}

	fn component_offset(&self, poly_index: usize, rns_index: usize) -> Result<usize> {
		if poly_index >= self.poly_count || rns_index >= self.coeff_modulus_size {
			return Err(Error::LengthMismatch {
				expected: self.poly_count * self.coeff_modulus_size,
				actual: poly_index * self.coeff_modulus_size + rns_index,
			});
		}
		Ok((poly_index * self.coeff_modulus_size + rns_index) * self.poly_modulus_degree)
	}

	/// Grows or shrinks the polynomial count in place, zero-extending new
	/// polynomials or truncating trailing ones. Used by key-switching
	/// machinery (out of this crate's scope) to grow a ciphertext before
	/// relinearization; kept here since it is purely a shape operation on
	/// the backing store.
	pub fn resize_poly_count(&mut self, new_poly_count: usize) {
		self.data
			.resize(new_poly_count * self.coeff_modulus_size * self.poly_modulus_degree, 0);
		self.poly_count = new_poly_count;
	}

	/// Borrows this array's storage as an immutable view.
	pub fn as_view(&self) -> PolyArrayView<'_> {
		PolyArrayView {
			data: &self.data,
			poly_count: self.poly_count,
			coeff_modulus_size: self.coeff_modulus_size,
			poly_modulus_degree: self.poly_modulus_degree,
		}
	}

	/// Borrows this array's storage as a mutable view.
	pub fn as_view_mut(&mut self) -> PolyArrayViewMut<'_> {
		PolyArrayViewMut {
			data: &mut self.data,
			poly_count: self.poly_count,
			coeff_modulus_size: self.coeff_modulus_size,
			poly_modulus_degree: self.poly_modulus_degree,
		}
	}
}

/// An immutable, non-owning view over someone else's RNS polynomial
/// storage.
#[derive(Debug, Clone, Copy)]
pub struct PolyArrayView<'a> {
	data: &'a [u64],
	poly_count: usize,
	coeff_modulus_size: usize,
	poly_modulus_degree: usize,
}

impl<'a> PolyArrayView<'a> {
	/// Wraps an existing flattened `[poly][prime][coeff]` buffer without
	/// copying. `data.len()` must equal `poly_count * coeff_modulus_size *
	/// poly_modulus_degree`.
	pub fn new(data: &'a [u64], poly_count: usize, coeff_modulus_size: usize, poly_modulus_degree: usize) -> Result<Self> {
		let expected = poly_count * coeff_modulus_size * poly_modulus_degree;
		if data.len() != expected {
			return Err(Error::LengthMismatch {
				expected,
				actual: data.len(),
			});
		}
		Ok(Self {
			data,
			poly_count,
			coeff_modulus_size,
			poly_modulus_degree,
		})
	}

	/// Number of polynomials.
	pub fn poly_count(&self) -> usize {
		self.poly_count
	}

	/// Number of RNS primes.
	pub fn coeff_modulus_size(&self) -> usize {
		self.coeff_modulus_size
	}

	/// Ring degree.
	pub fn poly_modulus_degree(&self) -> usize {
		self.poly_modulus_degree
	}

	/// The coefficient row for polynomial `poly_index`'s `rns_index`-th
	/// prime.
	pub fn component(&self, poly_index: usize, rns_index: usize) -> Result<&'a [u64]> {
		if poly_index >= self.poly_count || rns_index >= self.coeff_modulus_size {
			return Err(Error::LengthMismatch {
				expected: self.poly_count * self.coeff_modulus_size,
				actual: poly_index * self.coeff_modulus_size + rns_index,
			});
		}
		let start = (poly_index * self.coeff_modulus_size + rns_index) * self.poly_modulus_degree;
		Ok(&self.data[start..start + self.poly_modulus_degree])
	}
}

/// A mutable, non-owning view over someone else's RNS polynomial storage;
/// has no resize method, so it cannot express growing the array it borrows.
#[derive(Debug)]
pub struct PolyArrayViewMut<'a> {
	data: &'a mut [u64],
	poly_count: usize,
	coeff_modulus_size: usize,
	poly_modulus_degree: usize,
}

impl<'a> PolyArrayViewMut<'a> {
	/// Number of polynomials.
	pub fn poly_count(&self) -> usize {
		self.poly_count
	}

	/// The coefficient row for polynomial `poly_index`'s `rns_index`-th
	/// prime, mutably.
	pub fn component_mut(&mut self, poly_index: usize, rns_index: usize) -> Result<&mut [u64]> {
		if poly_index >= self.poly_count || rns_index >= self.coeff_modulus_size {
			return Err(Error::LengthMismatch {
				expected: self.poly_count * self.coeff_modulus_size,
				actual: poly_index * self.coeff_modulus_size + rns_index,
			});
		}
		let start = (poly_index * self.coeff_modulus_size + rns_index) * self.poly_modulus_degree;
		let degree = self.poly_modulus_degree;
		Ok(&mut self.data[start..start + degree])
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn new_array_is_zeroed_and_correctly_shaped() {
		let array = PolyArray::new(2, 3, 8);
		assert_eq!(array.poly_count(), 2);
		assert_eq!(array.coeff_modulus_size(), 3);
		assert_eq!(array.poly_modulus_degree(), 8);
		assert_eq!(array.data().len(), 2 * 3 * 8);
		assert!(array.data().iter().all(|&c| c == 0));
	}

	#[test]
	fn component_writes_are_isolated_per_poly_and_prime() {
		let mut array = PolyArray::new(2, 2, 4);
		array.component_mut(0, 0).unwrap().copy_from_slice(&[1, 2, 3, 4]);
		array.component_mut(1, 1).unwrap().copy_from_slice(&[5, 6, 7, 8]);

		assert_eq!(array.component(0, 0).unwrap(), &[1, 2, 3, 4]);
		assert_eq!(array.component(0, 1).unwrap(), &[0, 0, 0, 0]);
		assert_eq!(array.component(1, 0).unwrap(), &[0, 0, 0, 0]);
		assert_eq!(array.component(1, 1).unwrap(), &[5, 6, 7, 8]);
	}

	#[test]
	fn out_of_range_component_is_rejected() {
		let array = PolyArray::new(2, 2, 4);
		assert!(array.component(2, 0).is_err());
		assert!(array.component(0, 2).is_err());
	}

	#[test]
	fn resize_poly_count_preserves_existing_polynomials() {
		let mut array = PolyArray::new(2, 1, 2);
		array.component_mut(1, 0).unwrap().copy_from_slice(&[9, 9]);
		array.resize_poly_count(3);
		assert_eq!(array.poly_count(), 3);
		assert_eq!(array.component(1, 0).unwrap(), &[9, 9]);
		assert_eq!(array.component(2, 0).unwrap(), &[0, 0]);
	}

	#[test]
	fn view_matches_owned_array() {
		let mut array = PolyArray::new(2, 2, 4);
		array.component_mut(1, 0).unwrap().copy_from_slice(&[1, 2, 3, 4]);
		let view = PolyArrayView::new(array.data(), 2, 2, 4).unwrap();
		assert_eq!(view.component(1, 0).unwrap(), &[1, 2, 3, 4]);
	}
}
