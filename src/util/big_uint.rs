//! Owned and borrowed multi-precision integers.
//!
//! The original source distinguishes owned from "alias" buffers at runtime
//! and forbids resizing an alias. Here that is two distinct types instead:
//! [`BigUInt`] owns its limbs and may resize; [`BigUIntRef`]/[`BigUIntMut`]
//! borrow someone else's limbs and simply have no resize method to call.

use crate::error::{Error, Result};
use crate::util::uint_arith;

/// An owned little-endian limb array.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct BigUInt {
	limbs: Vec<u64>,
}

/// An immutable borrowed view over someone else's limbs.
#[derive(Debug, Clone, Copy)]
pub struct BigUIntRef<'a> {
	limbs: &'a [u64],
}

/// A mutable borrowed view over someone else's limbs; arithmetic that would
/// need to grow has no way to express it, which is the point.
#[derive(Debug)]
pub struct BigUIntMut<'a> {
	limbs: &'a mut [u64],
}

impl BigUInt {
	/// An all-zero value with the given limb count.
	pub fn zero(limb_count: usize) -> Self {
		Self {
			limbs: vec![0u64; limb_count],
		}
	}

	/// Wraps an existing owned limb vector.
	pub fn from_limbs(limbs: Vec<u64>) -> Self {
		Self { limbs }
	}

	/// Declared limb count (including high zero limbs).
	pub fn limb_count(&self) -> usize {
		self.limbs.len()
	}

	/// Bit length, ignoring high zero limbs.
	pub fn bit_count(&self) -> u32 {
		uint_arith::bit_count(&self.limbs)
	}

	/// `true` when every limb is zero.
	pub fn is_zero(&self) -> bool {
		uint_arith::is_zero(&self.limbs)
	}

	/// Grows or shrinks the declared limb count in place, zero-extending or
	/// truncating (truncation is only legal when the dropped limbs are
	/// already zero, enforced in debug builds).
	pub fn resize(&mut self, new_limb_count: usize) {
		if new_limb_count < self.limbs.len() {
			debug_assert!(
				self.limbs[new_limb_count..].iter().all(|&l| l == 0),
				"truncating away nonzero limbs"
			);
		}
		self.limbs.resize(new_limb_count, 0);
	}

	/// Borrows an immutable view of this value.
	pub fn as_ref(&self) -> BigUIntRef<'_> {
		BigUIntRef { limbs: &self.limbs }
	}

	/// Borrows a mutable view of this value.
	pub fn as_mut(&mut self) -> BigUIntMut<'_> {
		BigUIntMut {
			limbs: &mut self.limbs,
		}
	}

	/// Raw limb slice.
	pub fn limbs(&self) -> &[u64] {
		&self.limbs
	}

	/// `self + other`, widened to fit the larger operand plus one carry
	/// limb.
	pub fn add(&self, other: &BigUInt) -> BigUInt {
		let n = self.limbs.len().max(other.limbs.len()) + 1;
		let mut result = vec![0u64; n];
		uint_arith::add(&self.limbs, &other.limbs, &mut result);
		BigUInt { limbs: result }
	}

	/// `self - other`. Returns [`Error::InvalidModulus`]-free subtraction;
	/// callers needing to detect underflow should compare with
	/// [`uint_arith::is_less_than`] first since this kernel never raises for
	/// arithmetic overflow/underflow (only for malformed lengths elsewhere).
	pub fn sub(&self, other: &BigUInt) -> BigUInt {
		let n = self.limbs.len().max(other.limbs.len());
		let mut result = vec![0u64; n];
		uint_arith::sub(&self.limbs, &other.limbs, &mut result);
		BigUInt { limbs: result }
	}

	/// `self * other`.
	pub fn mul(&self, other: &BigUInt) -> BigUInt {
		let n = self.limbs.len() + other.limbs.len();
		let mut result = vec![0u64; n];
		uint_arith::multiply(&self.limbs, &other.limbs, &mut result);
		BigUInt { limbs: result }
	}

	/// `(quotient, remainder)` of `self / other`.
	pub fn divide(&self, other: &BigUInt) -> Result<(BigUInt, BigUInt)> {
		if other.is_zero() {
			return Err(Error::InvalidModulus(0));
		}
		let n = self.limbs.len();
		let mut quotient = vec![0u64; n];
		let mut remainder = vec![0u64; n];
		uint_arith::divide(&self.limbs, &other.limbs, &mut quotient, &mut remainder);
		Ok((BigUInt { limbs: quotient }, BigUInt { limbs: remainder }))
	}

	/// Left shift by `shift` bits, in place.
	pub fn shl(&mut self, shift: u32) {
		uint_arith::shift_left_inplace(&mut self.limbs, shift);
	}

	/// Right shift by `shift` bits, in place.
	pub fn shr(&mut self, shift: u32) {
		uint_arith::shift_right_inplace(&mut self.limbs, shift);
	}

	/// Parses a hex string into a value with the given limb count.
	pub fn from_hex_string(hex: &str, limb_count: usize) -> Self {
		let mut limbs = vec![0u64; limb_count];
		uint_arith::from_hex_string(hex, &mut limbs);
		Self { limbs }
	}

	/// Renders as an uppercase hex string.
	pub fn to_hex_string(&self) -> String {
		uint_arith::to_hex_string(&self.limbs)
	}

	/// Renders as a decimal string.
	pub fn to_decimal_string(&self) -> String {
		uint_arith::to_decimal_string(&self.limbs)
	}
}

impl<'a> BigUIntRef<'a> {
	/// Wraps an existing limb slice without copying.
	pub fn new(limbs: &'a [u64]) -> Self {
		Self { limbs }
	}

	/// Raw limb slice.
	pub fn limbs(&self) -> &[u64] {
		self.limbs
	}

	/// Bit length, ignoring high zero limbs.
	pub fn bit_count(&self) -> u32 {
		uint_arith::bit_count(self.limbs)
	}

	/// `true` when every limb is zero.
	pub fn is_zero(&self) -> bool {
		uint_arith::is_zero(self.limbs)
	}

	/// Copies this view into a new owned value.
	pub fn to_owned_big_uint(&self) -> BigUInt {
		BigUInt::from_limbs(self.limbs.to_vec())
	}
}

impl<'a> BigUIntMut<'a> {
	/// Wraps an existing mutable limb slice without copying.
	pub fn new(limbs: &'a mut [u64]) -> Self {
		Self { limbs }
	}

	/// Raw limb slice.
	pub fn limbs(&self) -> &[u64] {
		self.limbs
	}

	/// Raw mutable limb slice.
	pub fn limbs_mut(&mut self) -> &mut [u64] {
		self.limbs
	}

	/// Adds `other` into this buffer in place, returning the final carry;
	/// unlike [`BigUInt::add`] this cannot grow, so a nonzero carry means
	/// the true sum did not fit and was truncated.
	pub fn add_assign(&mut self, other: &[u64]) -> u64 {
		let src = self.limbs.to_vec();
		uint_arith::add(&src, other, self.limbs)
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn owned_add_widens() {
		let a = BigUInt::from_limbs(vec![u64::MAX]);
		let b = BigUInt::from_limbs(vec![1]);
		let sum = a.add(&b);
		assert_eq!(sum.limbs(), &[0, 1]);
	}

	#[test]
	fn divide_rejects_zero_denominator() {
		let a = BigUInt::from_limbs(vec![10]);
		let zero = BigUInt::zero(1);
		assert!(a.divide(&zero).is_err());
	}

	#[test]
	fn ref_view_matches_owned() {
		let owned = BigUInt::from_limbs(vec![42, 0]);
		let view = owned.as_ref();
		assert_eq!(view.bit_count(), owned.bit_count());
		assert!(!view.is_zero());
	}

	#[test]
	fn mut_view_add_assign_in_place() {
		let mut limbs = [1u64, 0];
		let mut view = BigUIntMut::new(&mut limbs);
		let carry = view.add_assign(&[2]);
		assert_eq!(carry, 0);
		assert_eq!(view.limbs(), &[3, 0]);
	}

	#[test]
	fn hex_and_decimal_strings() {
		let v = BigUInt::from_hex_string("FF", 1);
		assert_eq!(v.to_decimal_string(), "255");
		assert_eq!(v.to_hex_string(), "FF");
	}
}
