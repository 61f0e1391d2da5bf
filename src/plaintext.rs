//! The plaintext data model: a BFV/BGV coefficient vector mod `t`, or a
//! CKKS RNS-residue vector living at one chain level.
//!
//! A `Plaintext` is unassigned (its `parms_id` is [`PARMS_ID_NONE`]) when it
//! is a raw BFV/BGV coefficient vector that has not yet been encrypted or
//! added into ciphertext space. Once it is tied to a chain level — every
//! CKKS plaintext, and any BFV/BGV plaintext produced by "fast plain lift"
//! into NTT form — its `parms_id` names that level and its coefficient
//! count follows that level's shape (`coeff_modulus_size * poly_modulus_degree`
//! residues rather than a bare length-`N` coefficient vector).

use serde::{Deserialize, Serialize};

use crate::context::Context;
use crate::context_data::ContextData;
use crate::error::{Error, Result};
use crate::parameters::PARMS_ID_NONE;
use crate::serialization::{frame, unframe, ByteReader, ByteWriter, CompressionMode, FromBytes, ToBytes};
use crate::util::blake2xb::ParmsId;
use crate::util::small_modulus::SmallModulus;

/// Scale carried by a plaintext that has no CKKS scaling factor.
const UNSCALED: f64 = 1.0;

/// A plaintext value: either an unassigned BFV/BGV coefficient vector, or a
/// CKKS (or fast-plain-lifted BFV/BGV) residue vector anchored to a chain
/// level.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Plaintext {
	data: Vec<u64>,
	parms_id: ParmsId,
	scale: f64,
	is_ntt_form: bool,
}

impl Plaintext {
	/// An empty, unassigned plaintext.
	pub fn new() -> Self {
		Self {
			data: Vec::new(),
			parms_id: PARMS_ID_NONE,
			scale: UNSCALED,
			is_ntt_form: false,
		}
	}

	/// Builds an unassigned BFV/BGV plaintext from its coefficient vector
	/// mod `t`.
	pub fn from_coefficients(coefficients: Vec<u64>) -> Self {
		Self {
			data: coefficients,
			parms_id: PARMS_ID_NONE,
			scale: UNSCALED,
			is_ntt_form: false,
		}
	}

	/// Builds a CKKS plaintext from its RNS residues at `parms_id`, carrying
	/// `scale`.
	pub fn from_rns(data: Vec<u64>, parms_id: ParmsId, scale: f64) -> Self {
		Self {
			data,
			parms_id,
			scale,
			is_ntt_form: true,
		}
	}

	/// The plaintext's coefficient (or residue) data.
	pub fn data(&self) -> &[u64] {
		&self.data
	}

	/// The plaintext's coefficient (or residue) data, mutably.
	pub fn data_mut(&mut self) -> &mut [u64] {
		&mut self.data
	}

	/// Number of entries in [`Self::data`].
	pub fn coeff_count(&self) -> usize {
		self.data.len()
	}

	/// `true` if this plaintext carries no coefficients.
	pub fn is_empty(&self) -> bool {
		self.data.is_empty()
	}

	/// Reads coefficient `index`.
	pub fn get_coefficient(&self, index: usize) -> Result<u64> {
		self.data.get(index).copied().ok_or(Error::LengthMismatch {
			expected: self.data.len(),
			actual: index,
		})
	}

	/// Writes coefficient `index`.
	pub fn set_coefficient(&mut self, index: usize, value: u64) -> Result<()> {
		let len = self.data.len();
		let slot = self.data.get_mut(index).ok_or(Error::LengthMismatch { expected: len, actual: index })?;
		*slot = value;
		Ok(())
	}

	/// Grows or shrinks the coefficient vector, zero-extending or truncating.
	pub fn resize(&mut self, count: usize) {
		self.data.resize(count, 0);
	}

	/// The chain level this plaintext is anchored to, or [`PARMS_ID_NONE`]
	/// if it is an unassigned BFV/BGV coefficient vector.
	pub fn parms_id(&self) -> ParmsId {
		self.parms_id
	}

	/// The CKKS scaling factor (meaningless for an unassigned BFV/BGV
	/// plaintext, which always carries `1.0`).
	pub fn scale(&self) -> f64 {
		self.scale
	}

	/// Sets the CKKS scaling factor.
	pub fn set_scale(&mut self, scale: f64) {
		self.scale = scale;
	}

	/// `true` if this plaintext's data is stored in NTT (evaluation) form.
	pub fn is_ntt_form(&self) -> bool {
		self.is_ntt_form
	}

	/// Validates this plaintext's shape against `context`.
	///
	/// An unassigned plaintext (`parms_id == PARMS_ID_NONE`) always passes:
	/// it has no level to check against. An assigned plaintext must name a
	/// level that actually belongs to `context`, and, if it is in NTT form,
	/// must carry exactly `coeff_modulus_size * poly_modulus_degree`
	/// residues for that level.
	pub fn is_valid_for(&self, context: &Context) -> Result<()> {
		if self.parms_id == PARMS_ID_NONE {
			return Ok(());
		}
		let level = context.get_context_data(self.parms_id)?;
		if self.is_ntt_form {
			let expected = level.rns_base().len() * level.parms().poly_modulus_degree() as usize;
			if self.data.len() != expected {
				return Err(Error::InvalidSerializedField {
					field: "data".into(),
					reason: format!("expected {expected} residues at this level, got {}", self.data.len()),
				});
			}
		}
		Ok(())
	}

	/// Encodes this plaintext to its framed byte representation, applying
	/// `mode`'s compression.
	pub fn to_bytes_with_mode(&self, mode: CompressionMode) -> Result<Vec<u8>> {
		let mut w = ByteWriter::new();
		w.write_parms_id(self.parms_id);
		w.write_u64(self.data.len() as u64);
		w.write_f64(self.scale);
		w.write_u8(self.is_ntt_form as u8);
		w.write_u64_array(&self.data);
		frame(&w.into_vec(), mode)
	}
}

/// The CKKS scale bookkeeping a rescale (drop the last modulus, divide the
/// residues by it) needs on its scalar side: `scale / dropped_modulus`.
/// The ring arithmetic itself is the out-of-scope Evaluator's job; this only
/// tracks the scalar a `Plaintext`/`Ciphertext` carries alongside its data.
pub fn rescale_scale(scale: f64, dropped_modulus: &SmallModulus) -> f64 {
	scale / dropped_modulus.value() as f64
}

/// Checks that `scale` is usable at `level`: finite, positive, and small
/// enough that `log2(scale)` still fits under the level's total
/// coefficient-modulus bit count. Mirrors the bound a CKKS rescale must
/// respect to leave any noise budget after dividing out a prime.
pub fn check_scale_bounds(scale: f64, level: &ContextData) -> Result<()> {
	if !(scale.is_finite() && scale > 0.0) {
		return Err(Error::InvalidScale(format!("scale must be finite and positive, got {scale}")));
	}
	if scale.log2() >= level.total_coeff_modulus_bit_count() as f64 {
		return Err(Error::InvalidScale(format!(
			"scale 2^{:.2} does not fit under the level's {}-bit coefficient modulus",
			scale.log2(),
			level.total_coeff_modulus_bit_count()
		)));
	}
	Ok(())
}

impl Default for Plaintext {
	fn default() -> Self {
		Self::new()
	}
}

impl ToBytes for Plaintext {
	fn as_bytes(&self) -> Result<Vec<u8>> {
		self.to_bytes_with_mode(CompressionMode::None)
	}
}

impl FromBytes for Plaintext {
	type State = Context;

	fn from_bytes(context: &Context, bytes: &[u8]) -> Result<Self> {
		let body = unframe(bytes)?;
		let mut r = ByteReader::new(&body);
		let parms_id = r.read_parms_id()?;
		let coeff_count = r.read_u64()? as usize;
		let scale = r.read_f64()?;
		let is_ntt_form = r.read_u8()? != 0;
		let data = r.read_u64_array()?;
		if data.len() != coeff_count {
			return Err(Error::InvalidSerializedField {
				field: "coeff_count".into(),
				reason: format!("declared {coeff_count}, but data carries {} entries", data.len()),
			});
		}
		let plaintext = Self {
			data,
			parms_id,
			scale,
			is_ntt_form,
		};
		plaintext.is_valid_for(context)?;
		Ok(plaintext)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::modulus::{CoefficientModulus, SecurityLevel};
	use crate::parameters::{BfvEncryptionParametersBuilder, DegreeType};

	fn bfv_context() -> Context {
		let modulus_chain = CoefficientModulus::create(DegreeType::D4096, &[36, 36]).unwrap();
		let parms = BfvEncryptionParametersBuilder::new()
			.set_poly_modulus_degree(DegreeType::D4096)
			.set_coefficient_modulus(modulus_chain)
			.set_plain_modulus_u64(65537)
			.unwrap()
			.build()
			.unwrap();
		Context::new(parms, true, SecurityLevel::Tc128).unwrap()
	}

	#[test]
	fn unassigned_plaintext_is_valid_for_any_context() {
		let pt = Plaintext::from_coefficients(vec![1, 2, 3]);
		assert_eq!(pt.parms_id(), PARMS_ID_NONE);
		assert!(pt.is_valid_for(&bfv_context()).is_ok());
	}

	#[test]
	fn coefficient_accessors_round_trip() {
		let mut pt = Plaintext::from_coefficients(vec![0, 0, 0]);
		pt.set_coefficient(1, 42).unwrap();
		assert_eq!(pt.get_coefficient(1).unwrap(), 42);
		assert!(pt.set_coefficient(5, 0).is_err());
	}

	#[test]
	fn resize_zero_extends() {
		let mut pt = Plaintext::from_coefficients(vec![1, 2]);
		pt.resize(4);
		assert_eq!(pt.data(), &[1, 2, 0, 0]);
	}

	#[test]
	fn as_bytes_round_trips_through_from_bytes() {
		let ctx = bfv_context();
		let pt = Plaintext::from_coefficients(vec![5, 6, 7]);
		let bytes = pt.as_bytes().unwrap();
		let decoded = Plaintext::from_bytes(&ctx, &bytes).unwrap();
		assert_eq!(decoded, pt);
	}

	#[test]
	fn rns_plaintext_rejects_wrong_residue_count_for_its_level() {
		let ctx = bfv_context();
		let level = ctx.first_context_data();
		let bad = Plaintext::from_rns(vec![1, 2, 3], level.parms_id(), 1.0);
		assert!(matches!(bad.is_valid_for(&ctx), Err(Error::InvalidSerializedField { .. })));
	}

	#[test]
	fn rns_plaintext_accepts_correctly_shaped_residues() {
		let ctx = bfv_context();
		let level = ctx.first_context_data();
		let n = level.parms().poly_modulus_degree() as usize;
		let k = level.rns_base().len();
		let good = Plaintext::from_rns(vec![0; n * k], level.parms_id(), 1.0);
		assert!(good.is_valid_for(&ctx).is_ok());
	}

	#[test]
	fn rescale_scale_divides_by_dropped_modulus() {
		let q = crate::util::small_modulus::SmallModulus::new(97).unwrap();
		assert_eq!(rescale_scale(970.0, &q), 10.0);
	}

	#[test]
	fn check_scale_bounds_accepts_scale_under_modulus_bits() {
		let ctx = bfv_context();
		let level = ctx.first_context_data();
		assert!(check_scale_bounds(1024.0, level).is_ok());
	}

	#[test]
	fn check_scale_bounds_rejects_non_positive_and_too_large_scales() {
		let ctx = bfv_context();
		let level = ctx.first_context_data();
		assert!(matches!(check_scale_bounds(0.0, level), Err(Error::InvalidScale(_))));
		assert!(matches!(check_scale_bounds(-1.0, level), Err(Error::InvalidScale(_))));
		assert!(matches!(check_scale_bounds(f64::NAN, level), Err(Error::InvalidScale(_))));
		let too_large = 2f64.powi(level.total_coeff_modulus_bit_count() as i32 + 1);
		assert!(matches!(check_scale_bounds(too_large, level), Err(Error::InvalidScale(_))));
	}

	#[test]
	fn from_bytes_rejects_unknown_parms_id() {
		let ctx = bfv_context();
		let mut w = ByteWriter::new();
		w.write_parms_id([9, 9, 9, 9]);
		w.write_u64(0);
		w.write_f64(1.0);
		w.write_u8(1);
		w.write_u64_array(&[0, 0]);
		let framed = frame(&w.into_vec(), CompressionMode::None).unwrap();
		assert!(matches!(Plaintext::from_bytes(&ctx, &framed), Err(Error::UnknownParmsId)));
	}
}
